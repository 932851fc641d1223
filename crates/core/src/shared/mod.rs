pub mod config;
pub mod constants;
pub mod frame;
pub mod inspection_error;
pub mod video_metadata;
