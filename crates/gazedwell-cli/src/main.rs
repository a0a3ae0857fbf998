use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gazedwell_core::{pipeline, region, report, MalformedPolicy};
use gazedwell_vision::ScrfdDetector;
use std::path::{Path, PathBuf};

mod batch;
mod config;

#[derive(Parser)]
#[command(name = "gazedwell", about = "Attribute eye-tracking gaze samples to detected faces")]
struct Cli {
    /// TOML config file (overrides GAZEDWELL_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Fail a gaze file on the first malformed row instead of skipping it
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect faces in every image and aggregate matching gaze files
    Batch {
        /// Directory of .jpg/.jpeg/.png images
        #[arg(long, default_value = "PrimaryData/images")]
        images: PathBuf,
        /// Directory of gaze files named <image stem>.csv
        #[arg(long, default_value = "PrimaryData/excel")]
        gaze: PathBuf,
        /// Output directory (images/ and excel/ are created inside)
        #[arg(short, long, default_value = "GeneratedData")]
        output: PathBuf,
        /// Minimum detector confidence for a face to count
        #[arg(long)]
        min_confidence: Option<f32>,
        /// Resize factor applied to each image before detection
        #[arg(long)]
        scale_factor: Option<f32>,
        /// Pixels added around each detected face box
        #[arg(long)]
        margin: Option<f64>,
    },
    /// Aggregate one gaze file against face regions given as JSON
    Attribute {
        /// Gaze data file (tab- or comma-delimited)
        #[arg(long)]
        gaze: PathBuf,
        /// JSON array of regions, each [x1, y1, x2, y2] or [x, y]
        #[arg(long)]
        regions: PathBuf,
        /// Image to draw the dwell overlay on (requires --output)
        #[arg(long)]
        image: Option<PathBuf>,
        /// Write the summary CSV (and overlay) under this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load(cli.config.as_deref())?;
    if cli.strict {
        config.input.on_malformed = MalformedPolicy::Fail;
    }

    match cli.command {
        Commands::Batch {
            images,
            gaze,
            output,
            min_confidence,
            scale_factor,
            margin,
        } => {
            if let Some(v) = min_confidence {
                config.face_pass.min_confidence = v;
            }
            if let Some(v) = scale_factor {
                config.face_pass.scale_factor = v;
            }
            if let Some(v) = margin {
                config.face_pass.margin = v;
            }

            let model_path = config.scrfd_model_path();
            let mut detector = ScrfdDetector::load(&model_path)
                .with_context(|| format!("loading detector from {model_path}"))?;
            tracing::info!(path = %model_path, "SCRFD detector loaded");

            let paths = batch::BatchPaths {
                images,
                gaze,
                output,
            };
            let summary = batch::run_batch(&mut detector, &paths, &config)?;
            println!(
                "{} images: {} analyzed, {} without gaze data, {} failed",
                summary.images, summary.analyzed, summary.missing_gaze, summary.failed
            );
            if summary.images > 0 && summary.failed == summary.images {
                bail!("every image failed");
            }
        }
        Commands::Attribute {
            gaze,
            regions,
            image,
            output,
            json,
        } => {
            run_attribute(&config, &gaze, &regions, image.as_deref(), output.as_deref(), json)?;
        }
    }

    Ok(())
}

fn run_attribute(
    config: &config::Config,
    gaze: &Path,
    regions_path: &Path,
    image_path: Option<&Path>,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(regions_path)
        .with_context(|| format!("reading regions {}", regions_path.display()))?;
    let boxes: Vec<Vec<f64>> = serde_json::from_str(&text)
        .with_context(|| format!("parsing regions {}", regions_path.display()))?;
    let regions = region::normalize_all(&boxes)
        .with_context(|| format!("invalid region in {}", regions_path.display()))?;

    let analysis = pipeline::analyze_file(gaze, &config.input, &regions)
        .with_context(|| format!("analyzing {}", gaze.display()))?;
    let rows = report::build(&analysis.report);

    if json {
        let out = serde_json::json!({
            "rows": rows,
            "report": analysis.report,
            "skipped": analysis.skipped,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for row in &rows {
            println!("{:<10} {:>12.1} ms", row.face, row.time_ms);
        }
        println!(
            "{} of {} samples inside a face, {} rows skipped",
            analysis.report.attributed_samples,
            analysis.report.total_samples,
            analysis.skipped.len()
        );
    }

    if let Some(output) = output {
        let stem = gaze
            .file_stem()
            .and_then(|s| s.to_str())
            .context("gaze file name is not valid UTF-8")?;
        let base = match image_path {
            Some(path) => Some(
                image::open(path)
                    .with_context(|| format!("decoding {}", path.display()))?
                    .to_rgb8(),
            ),
            None => None,
        };
        batch::write_outputs(&analysis, &regions, base.as_ref(), output, stem)?;
    } else if image_path.is_some() {
        tracing::warn!("--image has no effect without --output");
    }

    Ok(())
}
