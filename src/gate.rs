use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-frame admission decision.
#[derive(Debug)]
pub enum ProcessingDecision {
    /// The frame may enter the inference chain; the permit must be held for
    /// the whole attempt.
    Process(InferencePermit),
    /// A previous frame is still in flight; forward this one untouched.
    PassThrough,
}

/// Single-flight gate: admits at most one concurrent inference per stream.
///
/// The detector's latency is usually far larger than the inter-frame
/// interval, so frames arriving while one is in flight are passed through
/// rather than queued (latest-effort, drop-on-busy). The flag is flipped with
/// an atomic test-and-set so the invariant holds under real parallelism, not
/// just under a cooperative scheduler.
#[derive(Debug, Clone, Default)]
pub struct InferenceGate {
    busy: Arc<AtomicBool>,
}

impl InferenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tries to admit one frame for processing. Never blocks, never fails.
    pub fn admit(&self) -> ProcessingDecision {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            ProcessingDecision::Process(InferencePermit {
                busy: Arc::clone(&self.busy),
            })
        } else {
            ProcessingDecision::PassThrough
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.busy.load(Ordering::Acquire)
    }
}

/// Holds the gate in the "processing" state. Dropping the permit reverts the
/// gate to idle on every exit path, including panics inside the chain.
#[derive(Debug)]
pub struct InferencePermit {
    busy: Arc<AtomicBool>,
}

impl Drop for InferencePermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn second_admission_passes_through() {
        let gate = InferenceGate::new();
        let permit = match gate.admit() {
            ProcessingDecision::Process(p) => p,
            ProcessingDecision::PassThrough => panic!("idle gate must admit"),
        };
        assert!(matches!(gate.admit(), ProcessingDecision::PassThrough));
        assert!(!gate.is_idle());

        drop(permit);
        assert!(gate.is_idle());
        assert!(matches!(gate.admit(), ProcessingDecision::Process(_)));
    }

    #[test]
    fn permit_releases_on_panic() {
        let gate = InferenceGate::new();
        let inner = gate.clone();
        let result = thread::spawn(move || {
            let _permit = match inner.admit() {
                ProcessingDecision::Process(p) => p,
                ProcessingDecision::PassThrough => unreachable!(),
            };
            panic!("inference blew up");
        })
        .join();
        assert!(result.is_err());
        assert!(gate.is_idle());
    }

    #[test]
    fn at_most_one_in_flight_under_contention() {
        let gate = InferenceGate::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    if let ProcessingDecision::Process(permit) = gate.admit() {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        drop(permit);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(gate.is_idle());
    }
}
