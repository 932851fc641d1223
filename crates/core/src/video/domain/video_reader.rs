use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("no video stream found")]
    NoVideoStream,
    #[error("failed to decode frame {index}: {reason}")]
    Decode { index: usize, reason: String },
    #[error("reader is not open")]
    NotOpened,
}

/// Reads frames from a video source.
///
/// Implementations handle codec and container details; callers only see
/// RGB [`Frame`]s and [`VideoMetadata`]. A reader is opened once, read to
/// completion or failure, then closed.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, ReadError>;

    /// Returns an iterator over frames in decode order.
    ///
    /// End of stream ends the iterator; an `Err` item means decoding broke
    /// off before the end.
    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, ReadError>> + '_>;

    /// Releases any resources held by the reader. Safe to call repeatedly.
    fn close(&mut self);
}
