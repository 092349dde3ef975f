use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::verify::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Caps how many verification runs are in flight at once.
    pub run_gate: Arc<Semaphore>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, max_concurrent_runs: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            run_gate: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
        }
    }
}
