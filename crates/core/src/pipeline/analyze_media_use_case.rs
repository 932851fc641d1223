use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::inspection::domain::combined_report::CombinedReport;
use crate::inspection::domain::inspection_aggregator::{
    AggregatedAnalysis, InspectionAggregator, PendingAnalysis,
};
use crate::inspection::domain::inspection_provider::ProviderFailure;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::sampling::domain::chunk::{Chunk, Composite};
use crate::sampling::domain::composite_builder::CompositeBuilder;
use crate::sampling::domain::frame_sampler::FrameSampler;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::inspection_error::{InspectionError, SourceFailure};
use crate::video::domain::video_reader::VideoReader;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// What one inspection run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionOutcome {
    pub source: PathBuf,
    pub report: CombinedReport,
    /// Raw answers that could not be decoded, in chunk order.
    pub overflow: Vec<String>,
    pub failures: Vec<ProviderFailure>,
    pub composites: usize,
    pub frames_sampled: usize,
    /// `None` for still images.
    pub fps: Option<u32>,
    pub duration_secs: Option<f64>,
    pub truncated: bool,
}

/// Inspects one media file and returns its outcome.
pub trait MediaInspector {
    fn inspect(&self, path: &Path) -> Result<InspectionOutcome, InspectionError>;
}

/// Media analysis pipeline: sample → composite → aggregate, one chunk at
/// a time.
pub struct AnalyzeMediaUseCase {
    sampler: FrameSampler,
    builder: CompositeBuilder,
    aggregator: InspectionAggregator,
    composites_dir: Option<PathBuf>,
}

impl AnalyzeMediaUseCase {
    pub fn new(
        sampler: FrameSampler,
        aggregator: InspectionAggregator,
        composites_dir: Option<PathBuf>,
    ) -> Result<Self, InspectionError> {
        let builder = CompositeBuilder::new(sampler.tile_size())?;
        Ok(Self {
            sampler,
            builder,
            aggregator,
            composites_dir,
        })
    }

    /// Samples the video at `path` and sends each chunk's composite for
    /// analysis as soon as the chunk is complete, so only one chunk's
    /// frames are held at a time.
    ///
    /// Fails only when the source is unusable or a composite cannot be
    /// built. Provider failures and unparseable answers end up in the
    /// outcome.
    pub fn analyze_video(
        &self,
        reader: &mut dyn VideoReader,
        path: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<InspectionOutcome, InspectionError> {
        let save_dir = self.composites_dir();
        logger.info(&format!(
            "Analyzing {} with {}",
            path.display(),
            self.aggregator.provider_name()
        ));

        let mut pending = self.aggregator.start();
        let mut built = 0;
        let summary = self.sampler.sample_each(reader, path, logger, |chunk, logger| {
            let t0 = Instant::now();
            let composite = self.builder.build(chunk)?;
            logger.timing("composite", t0.elapsed().as_secs_f64() * 1000.0);
            built += 1;
            logger.progress("composite", built, 0);
            if let Some(dir) = save_dir {
                save_composite(dir, &composite);
            }
            pending.submit(composite, logger);
            Ok(())
        })?;

        let analysis = finish(pending, logger);
        Ok(outcome(
            path,
            analysis,
            summary.chunks,
            summary.frames_decoded,
            Some(summary.fps),
            Some(summary.duration_secs),
            summary.truncated,
        ))
    }

    /// Treats a still image as a one-frame video.
    pub fn analyze_image(
        &self,
        path: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<InspectionOutcome, InspectionError> {
        let image = image::open(path)
            .map_err(|e| InspectionError::unavailable(path, SourceFailure::Open(e.to_string())))?
            .to_rgb8();
        let chunk = Chunk::new(0, vec![image])
            .ok_or_else(|| InspectionError::Composite("empty image chunk".into()))?;
        let composite = self.builder.build(chunk)?;
        logger.info(&format!(
            "Loaded image {} ({}x{}), analyzing with {}",
            path.display(),
            composite.image.width(),
            composite.image.height(),
            self.aggregator.provider_name()
        ));
        if let Some(dir) = self.composites_dir() {
            save_composite(dir, &composite);
        }

        let mut pending = self.aggregator.start();
        pending.submit(composite, logger);
        let analysis = finish(pending, logger);
        Ok(outcome(path, analysis, 1, 1, None, None, false))
    }

    /// The composites directory, created on first use; `None` when not
    /// configured or not creatable.
    fn composites_dir(&self) -> Option<&Path> {
        let dir = self.composites_dir.as_deref()?;
        match std::fs::create_dir_all(dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                log::warn!("Cannot create composites directory {}: {e}", dir.display());
                None
            }
        }
    }
}

fn finish(pending: PendingAnalysis, logger: &mut dyn PipelineLogger) -> AggregatedAnalysis {
    let analysis = pending.finish(logger);
    logger.metric("overflow_responses", analysis.overflow.len() as f64);
    logger.metric("failed_requests", analysis.failures.len() as f64);
    analysis
}

impl MediaInspector for AnalyzeMediaUseCase {
    fn inspect(&self, path: &Path) -> Result<InspectionOutcome, InspectionError> {
        let mut logger = NullPipelineLogger;
        if is_image_path(path) {
            self.analyze_image(path, &mut logger)
        } else {
            let mut reader = FfmpegReader::new();
            self.analyze_video(&mut reader, path, &mut logger)
        }
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn outcome(
    path: &Path,
    analysis: AggregatedAnalysis,
    composites: usize,
    frames_sampled: usize,
    fps: Option<u32>,
    duration_secs: Option<f64>,
    truncated: bool,
) -> InspectionOutcome {
    InspectionOutcome {
        source: path.to_path_buf(),
        report: analysis.report,
        overflow: analysis.overflow,
        failures: analysis.failures,
        composites,
        frames_sampled,
        fps,
        duration_secs,
        truncated,
    }
}

fn save_composite(dir: &Path, composite: &Composite) {
    let path = dir.join(format!("composite_{:03}.png", composite.chunk_index));
    match composite.save(&path) {
        Ok(()) => log::debug!("Saved {}", path.display()),
        Err(e) => log::warn!("Failed to save {}: {e}", path.display()),
    }
}
