pub mod analysis_result;
pub mod combined_report;
pub mod inspection_aggregator;
pub mod inspection_provider;
pub mod response_parser;
