use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use ndarray::{Array4, ArrayD};

/// Synchronous detector binding: fixed-shape input tensor in, raw detection
/// output out. Blocking for the duration of the call; any backend failure
/// surfaces as a single error.
pub trait ModelRunner {
    fn run(&mut self, input: Array4<f32>) -> Result<ArrayD<f32>>;
}

/// Process-wide serialization for a runner that is not documented as safe
/// for concurrent invocation. Streams sharing one backend wrap it in
/// `Arc<Mutex<_>>`; each call takes the lock for the whole inference.
impl<R: ModelRunner> ModelRunner for Arc<Mutex<R>> {
    fn run(&mut self, input: Array4<f32>) -> Result<ArrayD<f32>> {
        let mut runner = self
            .lock()
            .map_err(|_| anyhow!("shared model runner lock poisoned"))?;
        runner.run(input)
    }
}
