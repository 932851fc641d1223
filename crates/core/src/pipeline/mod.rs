pub mod analysis_executor;
pub mod analyze_media_use_case;
pub mod infrastructure;
pub mod pipeline_logger;
