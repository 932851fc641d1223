use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frame count reported by the container; 0 when unknown.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Whole frames per second, truncated. Zero means the duration is undefined.
    pub fn whole_fps(&self) -> u32 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps.floor() as u32
        } else {
            0
        }
    }
}
