pub mod chunk;
pub mod composite_builder;
pub mod frame_sampler;
pub mod resize;
