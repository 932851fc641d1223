use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::inspection::domain::inspection_provider::{InspectionProvider, ProviderError};
use crate::pipeline::analysis_executor::{AnalysisExecutor, AnalysisRun, ChunkResponse};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::sampling::domain::chunk::Composite;

/// `(slot, chunk_index, result, elapsed_ms)`
type Completed = (usize, usize, Result<String, ProviderError>, f64);

/// Dispatches provider calls from a bounded pool of worker threads.
///
/// Layout: `submit → jobs [bounded] → workers [provider.analyze] → main [log/slot]`
///
/// At most `max_in_flight` calls run at once and at most `max_in_flight`
/// composites wait in the queue; `submit` blocks when the queue is full.
/// Results are slotted back by submission order, so completion order does
/// not affect the returned order.
pub struct ThreadedAnalysisExecutor {
    max_in_flight: usize,
}

impl ThreadedAnalysisExecutor {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }
}

impl AnalysisExecutor for ThreadedAnalysisExecutor {
    fn start(&self, provider: Arc<dyn InspectionProvider>, prompt: &str) -> Box<dyn AnalysisRun> {
        let (job_tx, job_rx) = crossbeam_channel::bounded::<(usize, Composite)>(self.max_in_flight);
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<Completed>();
        let prompt: Arc<str> = Arc::from(prompt);

        let workers = (0..self.max_in_flight)
            .map(|_| spawn_worker(provider.clone(), prompt.clone(), job_rx.clone(), done_tx.clone()))
            .collect();

        Box::new(ThreadedRun {
            job_tx: Some(job_tx),
            done_rx,
            workers,
            slots: Vec::new(),
            completed: 0,
        })
    }
}

fn spawn_worker(
    provider: Arc<dyn InspectionProvider>,
    prompt: Arc<str>,
    job_rx: Receiver<(usize, Composite)>,
    done_tx: Sender<Completed>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for (slot, composite) in job_rx {
            let t0 = Instant::now();
            let result = provider.analyze(&prompt, &composite.image);
            let elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
            if done_tx
                .send((slot, composite.chunk_index, result, elapsed_ms))
                .is_err()
            {
                break;
            }
        }
    })
}

struct ThreadedRun {
    job_tx: Option<Sender<(usize, Composite)>>,
    done_rx: Receiver<Completed>,
    workers: Vec<JoinHandle<()>>,
    slots: Vec<(usize, Option<Result<String, ProviderError>>)>,
    completed: usize,
}

impl ThreadedRun {
    fn record(&mut self, done: Completed, logger: &mut dyn PipelineLogger) {
        let (slot, _, result, elapsed_ms) = done;
        self.completed += 1;
        logger.timing("inference", elapsed_ms);
        logger.progress("inference", self.completed, 0);
        if let Some(entry) = self.slots.get_mut(slot) {
            entry.1 = Some(result);
        }
    }

    fn drain_ready(&mut self, logger: &mut dyn PipelineLogger) {
        while let Ok(done) = self.done_rx.try_recv() {
            self.record(done, logger);
        }
    }
}

impl AnalysisRun for ThreadedRun {
    fn submit(&mut self, composite: Composite, logger: &mut dyn PipelineLogger) {
        let slot = self.slots.len();
        let chunk_index = composite.chunk_index;
        self.slots.push((chunk_index, None));

        let sent = match &self.job_tx {
            Some(tx) => tx.send((slot, composite)).is_ok(),
            None => false,
        };
        if !sent {
            self.slots[slot].1 = Some(Err(ProviderError::Request(
                format!("worker pool stopped before chunk {chunk_index}").into(),
            )));
        }
        self.drain_ready(logger);
    }

    fn finish(mut self: Box<Self>, logger: &mut dyn PipelineLogger) -> Vec<ChunkResponse> {
        // Closing the queue lets workers exit once it is drained.
        self.job_tx = None;
        while let Ok(done) = self.done_rx.recv() {
            self.record(done, logger);
        }
        for worker in std::mem::take(&mut self.workers) {
            if worker.join().is_err() {
                log::error!("Analysis worker panicked");
            }
        }

        std::mem::take(&mut self.slots)
            .into_iter()
            .map(|(chunk_index, result)| {
                let result = result.unwrap_or_else(|| {
                    Err(ProviderError::Request(
                        format!("no result for chunk {chunk_index}").into(),
                    ))
                });
                (chunk_index, result)
            })
            .collect()
    }
}
