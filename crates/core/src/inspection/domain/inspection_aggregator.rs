use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::inspection::domain::combined_report::CombinedReport;
use crate::inspection::domain::inspection_provider::{
    InspectionProvider, ProviderError, ProviderFailure,
};
use crate::inspection::domain::response_parser::parse_response;
use crate::pipeline::analysis_executor::{AnalysisExecutor, AnalysisRun};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::sampling::domain::chunk::Composite;
use crate::shared::constants::ANALYSIS_PROMPT;

/// Everything one run produced: the merged report, the raw answers that
/// could not be decoded, and the composites whose provider call failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedAnalysis {
    pub report: CombinedReport,
    pub overflow: Vec<String>,
    pub failures: Vec<ProviderFailure>,
}

/// Sends composites to an [`InspectionProvider`] and folds the answers into
/// one [`CombinedReport`].
///
/// Partial success is not an error: failed calls and unparseable answers
/// are recorded in the [`AggregatedAnalysis`] and the run continues.
pub struct InspectionAggregator {
    provider: Arc<dyn InspectionProvider>,
    executor: Box<dyn AnalysisExecutor>,
    prompt: String,
}

impl InspectionAggregator {
    pub fn new(
        provider: Arc<dyn InspectionProvider>,
        executor: Box<dyn AnalysisExecutor>,
        prompt: Option<String>,
    ) -> Self {
        Self {
            provider,
            executor,
            prompt: prompt.unwrap_or_else(|| ANALYSIS_PROMPT.to_string()),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Starts an analysis that takes composites as they are built.
    pub fn start(&self) -> PendingAnalysis {
        PendingAnalysis {
            run: self.executor.start(self.provider.clone(), &self.prompt),
        }
    }

    pub fn analyze<I>(&self, composites: I, logger: &mut dyn PipelineLogger) -> AggregatedAnalysis
    where
        I: IntoIterator<Item = Composite>,
    {
        let mut pending = self.start();
        for composite in composites {
            pending.submit(composite, logger);
        }
        pending.finish(logger)
    }
}

/// An analysis in progress; see [`InspectionAggregator::start`].
pub struct PendingAnalysis {
    run: Box<dyn AnalysisRun>,
}

impl PendingAnalysis {
    pub fn submit(&mut self, composite: Composite, logger: &mut dyn PipelineLogger) {
        self.run.submit(composite, logger);
    }

    /// Waits for every submitted composite and merges the answers in
    /// chunk order.
    pub fn finish(self, logger: &mut dyn PipelineLogger) -> AggregatedAnalysis {
        fold_responses(self.run.finish(logger))
    }
}

/// Folds `(chunk_index, response)` pairs, in the order given, into an
/// [`AggregatedAnalysis`].
pub fn fold_responses<I>(responses: I) -> AggregatedAnalysis
where
    I: IntoIterator<Item = (usize, Result<String, ProviderError>)>,
{
    let mut analysis = AggregatedAnalysis::default();
    for (chunk_index, response) in responses {
        match response {
            Ok(text) => match parse_response(&text) {
                Ok(parsed) => analysis.report.merge(parsed),
                Err(e) => {
                    log::debug!("Chunk {chunk_index} answer kept as raw text: {e}");
                    analysis.overflow.push(text);
                }
            },
            Err(e) => {
                log::warn!("Skipping chunk {chunk_index}: {e}");
                analysis.failures.push(ProviderFailure {
                    chunk_index,
                    message: e.to_string(),
                });
            }
        }
    }
    analysis
}
