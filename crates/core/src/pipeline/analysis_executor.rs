use std::sync::Arc;

use crate::inspection::domain::inspection_provider::{InspectionProvider, ProviderError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::sampling::domain::chunk::Composite;

/// A provider answer tagged with the chunk it belongs to.
pub type ChunkResponse = (usize, Result<String, ProviderError>);

/// Abstracts how composites are dispatched to a provider.
///
/// This is a port. Infrastructure provides concrete implementations
/// (sequential, bounded worker pool).
pub trait AnalysisExecutor: Send {
    /// Starts a run that accepts composites one at a time as they are built.
    fn start(&self, provider: Arc<dyn InspectionProvider>, prompt: &str) -> Box<dyn AnalysisRun>;
}

/// One in-progress run of an [`AnalysisExecutor`].
pub trait AnalysisRun {
    /// Hands over one composite. May block until the executor has room for it.
    fn submit(&mut self, composite: Composite, logger: &mut dyn PipelineLogger);

    /// Waits for outstanding calls and returns exactly one response per
    /// submitted composite, in submission order.
    fn finish(self: Box<Self>, logger: &mut dyn PipelineLogger) -> Vec<ChunkResponse>;
}
