//! Directory orchestration: detection pass per image, then gaze analysis
//! when a matching gaze file exists. One bad image never stops the batch.

use crate::config::Config;
use anyhow::{Context, Result};
use gazedwell_core::{pipeline, report, Analysis, FaceDetector, Region};
use gazedwell_vision::{faces, overlay};
use image::RgbImage;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const GAZE_EXTENSION: &str = "csv";

/// Input and output directories for a batch run.
#[derive(Debug, Clone)]
pub struct BatchPaths {
    pub images: PathBuf,
    pub gaze: PathBuf,
    pub output: PathBuf,
}

impl BatchPaths {
    fn images_out(&self) -> PathBuf {
        self.output.join("images")
    }

    fn excel_out(&self) -> PathBuf {
        self.output.join("excel")
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub images: usize,
    pub analyzed: usize,
    pub missing_gaze: usize,
    pub failed: usize,
}

enum Outcome {
    Analyzed,
    NoGazeData,
}

/// Process every image in `paths.images`.
pub fn run_batch<D>(detector: &mut D, paths: &BatchPaths, config: &Config) -> Result<BatchSummary>
where
    D: FaceDetector<Image = RgbImage>,
{
    let images = list_images(&paths.images)?;
    std::fs::create_dir_all(paths.images_out())
        .with_context(|| format!("creating {}", paths.images_out().display()))?;

    tracing::info!(dir = %paths.images.display(), count = images.len(), "starting batch");

    let mut summary = BatchSummary {
        images: images.len(),
        ..BatchSummary::default()
    };

    for path in &images {
        match process_image(detector, path, paths, config) {
            Ok(Outcome::Analyzed) => summary.analyzed += 1,
            Ok(Outcome::NoGazeData) => summary.missing_gaze += 1,
            Err(e) => {
                summary.failed += 1;
                let message = format!("{e:#}");
                tracing::error!(image = %path.display(), error = %message, "image failed");
            }
        }
    }

    tracing::info!(
        images = summary.images,
        analyzed = summary.analyzed,
        missing_gaze = summary.missing_gaze,
        failed = summary.failed,
        "batch complete"
    );
    Ok(summary)
}

/// Image files in `dir`, sorted by name. Extension match is case-insensitive.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading image directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    images.sort();
    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn process_image<D>(
    detector: &mut D,
    path: &Path,
    paths: &BatchPaths,
    config: &Config,
) -> Result<Outcome>
where
    D: FaceDetector<Image = RgbImage>,
{
    let file_name = path
        .file_name()
        .context("image path has no file name")?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("image file name is not valid UTF-8")?;

    tracing::info!(image = %path.display(), "processing image");
    let image = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgb8();

    let pass = faces::run_face_pass(detector, &image, &config.face_pass)
        .map_err(anyhow::Error::new)
        .with_context(|| format!("detecting faces in {}", path.display()))?;
    tracing::info!(image = %path.display(), faces = pass.regions.len(), "faces found");

    let annotated_path = paths.images_out().join(file_name);
    pass.annotated
        .save(&annotated_path)
        .with_context(|| format!("writing {}", annotated_path.display()))?;
    tracing::info!(path = %annotated_path.display(), "annotated image saved");

    let gaze_path = paths.gaze.join(format!("{stem}.{GAZE_EXTENSION}"));
    if !gaze_path.exists() {
        tracing::warn!(image = %path.display(), gaze = %gaze_path.display(), "no gaze data for image");
        return Ok(Outcome::NoGazeData);
    }

    let analysis = pipeline::analyze_file(&gaze_path, &config.input, &pass.regions)
        .with_context(|| format!("analyzing {}", gaze_path.display()))?;
    write_outputs(&analysis, &pass.regions, Some(&pass.annotated), &paths.output, stem)?;
    Ok(Outcome::Analyzed)
}

/// Write `<out>/excel/<stem>_processed.csv` and, with a base image,
/// `<out>/images/<stem>_processed.png`.
pub fn write_outputs(
    analysis: &Analysis,
    regions: &[Region],
    base_image: Option<&RgbImage>,
    output_dir: &Path,
    stem: &str,
) -> Result<()> {
    let excel_dir = output_dir.join("excel");
    std::fs::create_dir_all(&excel_dir)
        .with_context(|| format!("creating {}", excel_dir.display()))?;

    let csv_path = excel_dir.join(format!("{stem}_processed.csv"));
    let rows = report::build(&analysis.report);
    std::fs::write(&csv_path, report::to_csv(&rows))
        .with_context(|| format!("writing {}", csv_path.display()))?;
    tracing::info!(path = %csv_path.display(), "dwell summary saved");

    if let Some(base) = base_image {
        let images_dir = output_dir.join("images");
        std::fs::create_dir_all(&images_dir)
            .with_context(|| format!("creating {}", images_dir.display()))?;

        let items = report::overlay(&analysis.report, regions);
        let rendered = overlay::render_dwell_overlay(base, &items);
        let overlay_path = images_dir.join(format!("{stem}_processed.png"));
        rendered
            .save(&overlay_path)
            .with_context(|| format!("writing {}", overlay_path.display()))?;
        tracing::info!(path = %overlay_path.display(), "dwell overlay saved");
    }

    Ok(())
}
