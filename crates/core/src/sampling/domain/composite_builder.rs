use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ImageResult, RgbImage};

use crate::sampling::domain::chunk::{Chunk, Composite};
use crate::sampling::domain::resize::downsample;
use crate::shared::inspection_error::InspectionError;

/// Smallest `g` with `g * g >= len`.
pub fn grid_dim(len: usize) -> usize {
    let mut g = (len as f64).sqrt() as usize;
    while g * g < len {
        g += 1;
    }
    while g > 0 && (g - 1) * (g - 1) >= len {
        g -= 1;
    }
    g
}

/// Lays out a chunk's frames on a square grid so one inference call covers
/// the whole chunk.
///
/// Frame `i` goes to column `i % grid_dim`, row `i / grid_dim`, at pixel
/// offset `(col * tile_size, row * tile_size)`. Cells a frame does not fill
/// stay black.
pub struct CompositeBuilder {
    tile_size: u32,
}

impl CompositeBuilder {
    pub fn new(tile_size: u32) -> Result<Self, InspectionError> {
        if tile_size == 0 {
            return Err(InspectionError::InvalidConfig(
                "tile_size must be at least 1".into(),
            ));
        }
        Ok(Self { tile_size })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn build(&self, chunk: Chunk) -> Result<Composite, InspectionError> {
        let chunk_index = chunk.index();
        let frame_count = chunk.len();
        let dim = grid_dim(frame_count);

        let mut frames = chunk.into_frames();
        if frame_count == 1 {
            let image = downsample(frames.remove(0), self.tile_size);
            return Ok(Composite {
                chunk_index,
                frame_count,
                grid_dim: 1,
                image,
            });
        }

        let side = u32::try_from(dim)
            .ok()
            .and_then(|d| d.checked_mul(self.tile_size))
            .ok_or_else(|| {
                InspectionError::Composite(format!(
                    "{dim}x{dim} grid of {}px tiles is too large",
                    self.tile_size
                ))
            })?;

        let mut canvas = RgbImage::new(side, side);
        let tile = self.tile_size as i64;
        for (i, frame) in frames.into_iter().enumerate() {
            let frame = downsample(frame, self.tile_size);
            let col = (i % dim) as i64;
            let row = (i / dim) as i64;
            imageops::replace(&mut canvas, &frame, col * tile, row * tile);
        }

        Ok(Composite {
            chunk_index,
            frame_count,
            grid_dim: dim,
            image: canvas,
        })
    }
}

impl Composite {
    /// JPEG bytes for upload to a vision provider.
    pub fn encode_jpeg(&self, quality: u8) -> ImageResult<Vec<u8>> {
        encode_jpeg(&self.image, quality)
    }

    /// Writes the composite as an image file; format follows the extension.
    pub fn save(&self, path: &Path) -> ImageResult<()> {
        self.image.save(path)
    }
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality).encode_image(image)?;
    Ok(buffer.into_inner())
}
