use clap::{Parser, Subcommand};
use gridmerge::imaging::{Quality, save_canvas};
use gridmerge::output::{self, IdentifyReport};
use gridmerge::{GridDescriptor, MergeJob, config};
use image::Rgba;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridmerge")]
#[command(about = "Merge images into a single grid image")]
#[command(long_about = "\
Merge images into a single grid image

Each source (a local file or an http(s) URL) fills one cell of a
columns x rows grid, row by row. Cells share one size: the first image's,
a fixed size, or the size of image N. Larger images are clipped, never scaled.

If any source is a URL, every source is downloaded concurrently under one
deadline. Local .jpg/.jpeg files are read as JPEG, everything else as PNG.

Run 'gridmerge gen-job' to generate a documented job file.")]
#[command(version)]
struct Cli {
    /// Log progress (sets RUST_LOG=debug unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a TOML job file
    Merge {
        /// Job file
        job: PathBuf,
        /// Override the job's output path
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Merge sources given on the command line
    Grid(GridArgs),
    /// Report format, size and aspect ratio of image files
    Identify {
        files: Vec<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a stock job file with all options documented
    GenJob,
}

#[derive(clap::Args)]
struct GridArgs {
    /// Local paths or http(s) URLs, in row-major order
    #[arg(required = true)]
    sources: Vec<String>,

    #[arg(long, short)]
    columns: u32,

    #[arg(long, short)]
    rows: u32,

    /// Output file (.jpg, .jpeg or .png)
    #[arg(long, short)]
    output: PathBuf,

    /// Directory prepended to local sources
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Fixed cell size, e.g. 200x150
    #[arg(long, value_parser = parse_cell_size, conflicts_with = "size_from")]
    cell_size: Option<(u32, u32)>,

    /// Size cells like the Nth source (0-based)
    #[arg(long)]
    size_from: Option<usize>,

    /// Cell background, #rrggbb or #rrggbbaa
    #[arg(long, value_parser = parse_background)]
    background: Option<Rgba<u8>>,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    quality: u32,

    /// Deadline in seconds for downloading remote sources
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

fn parse_cell_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let w = w.parse::<u32>().map_err(|e| format!("width: {e}"))?;
    let h = h.parse::<u32>().map_err(|e| format!("height: {e}"))?;
    Ok((w, h))
}

fn parse_background(value: &str) -> Result<Rgba<u8>, String> {
    config::parse_color(value).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Merge { job, output } => {
            let job_config = config::load_job(&job)?;
            let job_dir = job.parent().unwrap_or(Path::new("."));
            let merge_job = job_config.to_job(job_dir)?;
            let out_path = output
                .or_else(|| job_config.output_path(job_dir))
                .ok_or("no output path: set [output] path in the job file or pass --output")?;
            run_merge(&merge_job, &out_path, job_config.quality())?;
        }
        Command::Grid(args) => {
            let mut grids: Vec<GridDescriptor> =
                args.sources.iter().map(GridDescriptor::from_path).collect();
            if let Some(bg) = args.background {
                grids = grids.into_iter().map(|g| g.with_background(bg)).collect();
            }
            let mut job = MergeJob::new(grids, args.columns, args.rows)
                .with_fetch_timeout(Duration::from_secs(args.timeout));
            if let Some(dir) = args.base_dir {
                job = job.with_base_dir(dir);
            }
            if let Some((w, h)) = args.cell_size {
                job = job.with_fixed_size(w, h);
            } else if let Some(n) = args.size_from {
                job = job.with_size_from_nth(n);
            }
            run_merge(&job, &args.output, Quality::new(args.quality))?;
        }
        Command::Identify { files, json } => {
            let reports = files
                .iter()
                .map(|path| {
                    let bytes = std::fs::read(path)?;
                    Ok(IdentifyReport::from_bytes(&path.to_string_lossy(), &bytes))
                })
                .collect::<Result<Vec<_>, std::io::Error>>()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                output::print_identify(&reports);
            }
        }
        Command::GenJob => {
            print!("{}", config::stock_job_toml());
        }
    }

    Ok(())
}

fn run_merge(job: &MergeJob, out_path: &Path, quality: Quality) -> Result<(), Box<dyn std::error::Error>> {
    let canvas = job.merge()?;
    save_canvas(&canvas, out_path, quality)?;
    output::print_merge_summary(job, canvas.dimensions(), Some(out_path));
    Ok(())
}
