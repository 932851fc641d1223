use image::RgbImage;

/// A contiguous, non-empty run of downsampled frames from one video.
#[derive(Clone, Debug)]
pub struct Chunk {
    index: usize,
    frames: Vec<RgbImage>,
}

impl Chunk {
    /// Returns `None` for an empty frame list.
    pub fn new(index: usize, frames: Vec<RgbImage>) -> Option<Self> {
        if frames.is_empty() {
            None
        } else {
            Some(Self { index, frames })
        }
    }

    /// Position of this chunk within its video, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn frames(&self) -> &[RgbImage] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// A chunk is never empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<RgbImage> {
        self.frames
    }
}

/// One image standing in for a whole chunk: a frame grid, or the lone frame
/// of a single-frame chunk.
#[derive(Clone, Debug)]
pub struct Composite {
    pub chunk_index: usize,
    pub frame_count: usize,
    /// Cells per side; 1 for a single-frame composite.
    pub grid_dim: usize,
    pub image: RgbImage,
}
