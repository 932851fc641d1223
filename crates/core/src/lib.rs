pub mod inspection;
pub mod pipeline;
pub mod sampling;
pub mod session;
pub mod shared;
pub mod video;
