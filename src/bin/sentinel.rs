//! Offline smoke run: streams still images through the full detection
//! pipeline and prints the telemetry JSON to stdout, one object per line.

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rtc_sentinel::{
    Args, DetectionDecoder, Frame, FrameCodec, OrtBackend, OrtConfig, OrtEP, PixelFormat,
    ResultEmitter, SideChannel, SideChannelCell, StreamProcessor, TransportError, VideoSink,
    VideoSource,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Side channel that writes each payload as one line on stdout.
struct StdoutChannel;

impl SideChannel for StdoutChannel {
    fn is_open(&self) -> bool {
        true
    }

    fn send(&self, payload: &[u8]) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(payload)?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Delivers each image file as one RGB frame, then reports the stream closed.
struct ImageFileSource {
    paths: std::vec::IntoIter<String>,
}

impl ImageFileSource {
    fn new(paths: Vec<String>) -> Self {
        Self {
            paths: paths.into_iter(),
        }
    }
}

impl VideoSource for ImageFileSource {
    fn recv(&mut self) -> Result<Frame, TransportError> {
        let Some(path) = self.paths.next() else {
            return Err(TransportError::Closed);
        };
        let img = image::open(&path)
            .map_err(|err| TransportError::Failed(format!("{path}: {err}")))?
            .into_rgb8();
        let (width, height) = img.dimensions();
        Ok(Frame::new(width, height, PixelFormat::Rgb8, img.into_raw()))
    }
}

/// Outbound track stand-in; counts the frames it would have sent.
#[derive(Default)]
struct CountingSink {
    forwarded: u64,
}

impl VideoSink for CountingSink {
    fn send(&mut self, _frame: Frame) -> Result<(), TransportError> {
        self.forwarded += 1;
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let ep = if args.trt {
        OrtEP::Trt(args.device_id)
    } else if args.cuda {
        OrtEP::Cuda(args.device_id)
    } else {
        OrtEP::Cpu
    };
    let backend = OrtBackend::build(OrtConfig {
        model_path: args.model.clone(),
        ep,
    })?;

    let channel = SideChannelCell::new();
    channel.attach(Arc::new(StdoutChannel));

    let processor = StreamProcessor::new(
        backend,
        FrameCodec::new(args.size),
        DetectionDecoder::new(args.conf, args.size),
        ResultEmitter::new(channel),
    );

    let mut source = ImageFileSource::new(args.source);
    let mut sink = CountingSink::default();

    loop {
        let frame = match source.recv() {
            Ok(frame) => frame,
            Err(TransportError::Closed) => break,
            Err(err) => return Err(err.into()),
        };
        processor.admit(&frame);
        sink.send(frame)?;

        // Offline run: pace the source so every image gets analyzed instead
        // of passing through while the previous one is still in flight.
        while !processor.is_idle() {
            thread::sleep(Duration::from_millis(2));
        }
    }

    info!(forwarded = sink.forwarded, "stream finished");
    Ok(())
}
