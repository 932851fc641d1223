use std::sync::Arc;
use std::time::Instant;

use crate::inspection::domain::inspection_provider::InspectionProvider;
use crate::pipeline::analysis_executor::{AnalysisExecutor, AnalysisRun, ChunkResponse};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::sampling::domain::chunk::Composite;

/// One provider call at a time, made as soon as a composite is submitted.
///
/// `submit` returns only after the provider answered, so the caller does
/// not decode the next chunk while a request is outstanding.
pub struct SequentialAnalysisExecutor;

impl AnalysisExecutor for SequentialAnalysisExecutor {
    fn start(&self, provider: Arc<dyn InspectionProvider>, prompt: &str) -> Box<dyn AnalysisRun> {
        Box::new(SequentialRun {
            provider,
            prompt: prompt.to_string(),
            responses: Vec::new(),
        })
    }
}

struct SequentialRun {
    provider: Arc<dyn InspectionProvider>,
    prompt: String,
    responses: Vec<ChunkResponse>,
}

impl AnalysisRun for SequentialRun {
    fn submit(&mut self, composite: Composite, logger: &mut dyn PipelineLogger) {
        let t0 = Instant::now();
        let result = self.provider.analyze(&self.prompt, &composite.image);
        logger.timing("inference", t0.elapsed().as_secs_f64() * 1000.0);
        self.responses.push((composite.chunk_index, result));
        logger.progress("inference", self.responses.len(), 0);
    }

    fn finish(self: Box<Self>, _logger: &mut dyn PipelineLogger) -> Vec<ChunkResponse> {
        self.responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::domain::inspection_provider::ProviderError;
    use crate::pipeline::pipeline_logger::StdoutPipelineLogger;
    use image::RgbImage;
    use std::sync::Mutex;

    struct CountingProvider {
        calls: Mutex<Vec<usize>>,
    }

    impl InspectionProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn analyze(&self, _prompt: &str, image: &RgbImage) -> Result<String, ProviderError> {
            let width = image.width() as usize;
            self.calls.lock().unwrap().push(width);
            Ok(width.to_string())
        }
    }

    fn composite(chunk_index: usize, width: u32) -> Composite {
        Composite {
            chunk_index,
            frame_count: 1,
            grid_dim: 1,
            image: RgbImage::new(width, 2),
        }
    }

    #[test]
    fn test_each_submit_calls_provider_immediately() {
        let provider = Arc::new(CountingProvider {
            calls: Mutex::new(Vec::new()),
        });
        let mut logger = StdoutPipelineLogger::new(1);
        let mut run = SequentialAnalysisExecutor.start(provider.clone(), "p");

        run.submit(composite(0, 3), &mut logger);
        assert_eq!(*provider.calls.lock().unwrap(), vec![3]);
        run.submit(composite(1, 5), &mut logger);
        run.submit(composite(2, 7), &mut logger);
        assert_eq!(*provider.calls.lock().unwrap(), vec![3, 5, 7]);

        let responses = run.finish(&mut logger);
        let texts: Vec<_> = responses
            .into_iter()
            .map(|(i, r)| (i, r.unwrap()))
            .collect();
        assert_eq!(
            texts,
            vec![(0, "3".to_string()), (1, "5".to_string()), (2, "7".to_string())]
        );
        assert_eq!(logger.timings_for("inference").unwrap().len(), 3);
    }

    #[test]
    fn test_no_composites_no_calls() {
        let provider = Arc::new(CountingProvider {
            calls: Mutex::new(Vec::new()),
        });
        let mut logger = StdoutPipelineLogger::new(1);
        let run = SequentialAnalysisExecutor.start(provider.clone(), "p");
        assert!(run.finish(&mut logger).is_empty());
        assert!(provider.calls.lock().unwrap().is_empty());
    }
}
