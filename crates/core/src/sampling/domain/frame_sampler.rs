use std::path::Path;
use std::time::Instant;

use image::RgbImage;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::sampling::domain::chunk::Chunk;
use crate::sampling::domain::resize::downsample;
use crate::shared::inspection_error::{InspectionError, SourceFailure};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Totals of one sampled video.
#[derive(Debug, Clone)]
pub struct SampleSummary {
    /// Whole frames per second, never zero.
    pub fps: u32,
    pub duration_secs: f64,
    pub frames_decoded: usize,
    pub chunks: usize,
    /// True when decoding broke off before the reported frame count.
    pub truncated: bool,
    pub metadata: VideoMetadata,
}

/// A sampled video with every chunk kept in memory.
#[derive(Debug)]
pub struct SampledVideo {
    pub chunks: Vec<Chunk>,
    /// Whole frames per second, never zero.
    pub fps: u32,
    pub duration_secs: f64,
    pub frames_decoded: usize,
    /// True when decoding broke off before the reported frame count.
    pub truncated: bool,
    pub metadata: VideoMetadata,
}

/// Decodes a video into consecutive chunks of downsampled frames.
pub struct FrameSampler {
    chunk_size: usize,
    tile_size: u32,
}

impl FrameSampler {
    pub fn new(chunk_size: usize, tile_size: u32) -> Result<Self, InspectionError> {
        if chunk_size == 0 {
            return Err(InspectionError::InvalidConfig(
                "chunk_size must be at least 1".into(),
            ));
        }
        if tile_size == 0 {
            return Err(InspectionError::InvalidConfig(
                "tile_size must be at least 1".into(),
            ));
        }
        Ok(Self {
            chunk_size,
            tile_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Decodes the whole video and collects its chunks.
    ///
    /// Holds every downsampled frame at once; prefer
    /// [`FrameSampler::sample_each`] for long videos.
    pub fn sample(
        &self,
        reader: &mut dyn VideoReader,
        path: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<SampledVideo, InspectionError> {
        let mut chunks = Vec::new();
        let summary = self.sample_each(reader, path, logger, |chunk, _| {
            chunks.push(chunk);
            Ok(())
        })?;
        Ok(SampledVideo {
            chunks,
            fps: summary.fps,
            duration_secs: summary.duration_secs,
            frames_decoded: summary.frames_decoded,
            truncated: summary.truncated,
            metadata: summary.metadata,
        })
    }

    /// Opens `path` with `reader` and hands each chunk to `on_chunk` as
    /// soon as its last frame is decoded, before the next frame is read.
    /// The reader is closed on every exit path.
    ///
    /// A decode error mid-stream keeps everything read so far. Fails when
    /// the source cannot be opened, reports a zero frame rate, or
    /// `on_chunk` fails.
    pub fn sample_each<F>(
        &self,
        reader: &mut dyn VideoReader,
        path: &Path,
        logger: &mut dyn PipelineLogger,
        mut on_chunk: F,
    ) -> Result<SampleSummary, InspectionError>
    where
        F: FnMut(Chunk, &mut dyn PipelineLogger) -> Result<(), InspectionError>,
    {
        let metadata = match reader.open(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                reader.close();
                return Err(InspectionError::unavailable(
                    path,
                    SourceFailure::Open(e.to_string()),
                ));
            }
        };

        let result = self.read_chunks(reader, metadata, path, logger, &mut on_chunk);
        reader.close();
        result
    }

    fn read_chunks(
        &self,
        reader: &mut dyn VideoReader,
        metadata: VideoMetadata,
        path: &Path,
        logger: &mut dyn PipelineLogger,
        on_chunk: &mut dyn FnMut(Chunk, &mut dyn PipelineLogger) -> Result<(), InspectionError>,
    ) -> Result<SampleSummary, InspectionError> {
        let fps = metadata.whole_fps();
        if fps == 0 {
            return Err(InspectionError::unavailable(
                path,
                SourceFailure::ZeroFrameRate,
            ));
        }

        // A zero count means the container did not say; read to end of stream.
        let frame_limit = match metadata.total_frames {
            0 => usize::MAX,
            n => n,
        };

        let mut chunks = 0;
        let mut pending: Vec<RgbImage> = Vec::with_capacity(self.chunk_size);
        let mut frames_decoded = 0;
        let mut truncated = false;

        let mut frames = reader.frames();
        while frames_decoded < frame_limit {
            let started = Instant::now();
            let Some(next) = frames.next() else {
                break;
            };
            let image = match next.map(|frame| frame.into_rgb_image()) {
                Ok(Some(image)) => image,
                Ok(None) => {
                    log::warn!("Frame {frames_decoded} has an inconsistent buffer; stopping");
                    truncated = true;
                    break;
                }
                Err(e) => {
                    log::warn!("Stopped decoding after {frames_decoded} frames: {e}");
                    truncated = true;
                    break;
                }
            };

            pending.push(downsample(image, self.tile_size));
            frames_decoded += 1;
            logger.timing("decode", started.elapsed().as_secs_f64() * 1000.0);
            logger.progress("decode", frames_decoded, metadata.total_frames);

            if pending.len() == self.chunk_size {
                let full = std::mem::replace(&mut pending, Vec::with_capacity(self.chunk_size));
                emit_chunk(chunks, full, logger, on_chunk)?;
                chunks += 1;
            }
        }
        drop(frames);
        if !pending.is_empty() {
            emit_chunk(chunks, pending, logger, on_chunk)?;
            chunks += 1;
        }

        let frame_count = match metadata.total_frames {
            0 => frames_decoded,
            n => n,
        };
        let duration_secs = frame_count as f64 / fps as f64;

        logger.info(&format!(
            "Sampled {frames_decoded} frames into {chunks} chunks ({duration_secs:.1}s at {fps} fps)"
        ));

        Ok(SampleSummary {
            fps,
            duration_secs,
            frames_decoded,
            chunks,
            truncated,
            metadata,
        })
    }
}

fn emit_chunk(
    index: usize,
    frames: Vec<RgbImage>,
    logger: &mut dyn PipelineLogger,
    on_chunk: &mut dyn FnMut(Chunk, &mut dyn PipelineLogger) -> Result<(), InspectionError>,
) -> Result<(), InspectionError> {
    match Chunk::new(index, frames) {
        Some(chunk) => {
            logger.metric("frames_per_chunk", chunk.len() as f64);
            on_chunk(chunk, logger)
        }
        None => Ok(()),
    }
}
