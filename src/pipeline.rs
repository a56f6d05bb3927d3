use std::thread::{self, JoinHandle};

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::codec::FrameCodec;
use crate::decoder::DetectionDecoder;
use crate::emitter::{epoch_ms, FrameResult, ResultEmitter};
use crate::error::TransportError;
use crate::frame::Frame;
use crate::gate::{InferenceGate, InferencePermit, ProcessingDecision};
use crate::model::ModelRunner;

/// Inbound media boundary. `recv` suspends until the next frame is
/// available; an error is fatal to the stream.
pub trait VideoSource {
    fn recv(&mut self) -> Result<Frame, TransportError>;
}

/// Outbound media boundary. Always receives the original, unmodified frame.
pub trait VideoSink {
    fn send(&mut self, frame: Frame) -> Result<(), TransportError>;
}

struct InferenceJob {
    // Held for the whole attempt; dropping it reopens the gate.
    permit: InferencePermit,
    frame: Frame,
    capture_ts: i64,
}

/// Per-stream processing core.
///
/// Frame arrivals drive the loop: every frame is forwarded to the outbound
/// track, and when the gate is idle a cheap clone of the frame is handed to
/// a dedicated inference worker. The worker runs codec -> model -> decoder
/// -> emitter while the stream loop keeps forwarding; frames arriving in the
/// meantime are passed through without side effects. Per-frame faults are
/// logged and contained; only transport faults terminate the stream.
pub struct StreamProcessor {
    gate: InferenceGate,
    job_tx: Option<Sender<InferenceJob>>,
    worker: Option<JoinHandle<()>>,
}

impl StreamProcessor {
    pub fn new<R>(
        runner: R,
        codec: FrameCodec,
        decoder: DetectionDecoder,
        emitter: ResultEmitter,
    ) -> Self
    where
        R: ModelRunner + Send + 'static,
    {
        // The gate guarantees at most one job in flight, so capacity 1 is
        // never exceeded.
        let (job_tx, job_rx) = bounded::<InferenceJob>(1);
        let worker = thread::Builder::new()
            .name("inference".into())
            .spawn(move || inference_worker(job_rx, runner, codec, decoder, emitter))
            .expect("failed to spawn inference worker");

        Self {
            gate: InferenceGate::new(),
            job_tx: Some(job_tx),
            worker: Some(worker),
        }
    }

    /// True when no frame is inside the inference chain.
    pub fn is_idle(&self) -> bool {
        self.gate.is_idle()
    }

    /// Admits one frame: either dispatches it to the inference worker or
    /// decides pass-through. Never blocks and never fails; the caller
    /// forwards the original frame regardless.
    pub fn admit(&self, frame: &Frame) {
        match self.gate.admit() {
            ProcessingDecision::PassThrough => {}
            ProcessingDecision::Process(permit) => {
                let job = InferenceJob {
                    permit,
                    frame: frame.clone(),
                    capture_ts: epoch_ms(),
                };
                if let Some(tx) = &self.job_tx {
                    // Sending cannot block: the gate was idle, so the
                    // channel is empty. A disconnected worker drops the job
                    // (and its permit) and the frame degrades to
                    // pass-through.
                    if tx.try_send(job).is_err() {
                        warn!("inference worker unavailable, frame passed through");
                    }
                }
            }
        }
    }

    /// Drives a whole stream: recv, admit, forward, until the source closes
    /// or the transport fails.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<(), TransportError>
    where
        S: VideoSource,
        K: VideoSink,
    {
        loop {
            let frame = match source.recv() {
                Ok(frame) => frame,
                Err(TransportError::Closed) => return Ok(()),
                Err(err) => return Err(err),
            };
            self.admit(&frame);
            sink.send(frame)?;
        }
    }
}

impl Drop for StreamProcessor {
    fn drop(&mut self) {
        // Closing the channel stops the worker after any in-flight job.
        self.job_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn inference_worker<R: ModelRunner>(
    job_rx: Receiver<InferenceJob>,
    mut runner: R,
    codec: FrameCodec,
    decoder: DetectionDecoder,
    emitter: ResultEmitter,
) {
    debug!("inference worker started");
    while let Ok(job) = job_rx.recv() {
        if let Err(err) = process_frame(&mut runner, &codec, &decoder, &emitter, &job) {
            // Codec and model faults are contained to this frame; the
            // outbound stream already carries the original frame.
            warn!(error = %err, "frame processing failed");
        }
        // `job.permit` drops here, reopening the gate.
    }
    debug!("inference worker stopped");
}

fn process_frame<R: ModelRunner>(
    runner: &mut R,
    codec: &FrameCodec,
    decoder: &DetectionDecoder,
    emitter: &ResultEmitter,
    job: &InferenceJob,
) -> Result<()> {
    let input = codec.encode(&job.frame)?;
    let recv_ts = epoch_ms();

    let raw = runner.run(input)?;
    let detections = decoder.decode(&raw)?;
    let inference_ts = epoch_ms();

    emitter.emit(&FrameResult::new(
        job.capture_ts,
        recv_ts,
        inference_ts,
        detections,
    ));
    Ok(())
}
