//! In-crate fakes shared by the unit tests of several contexts.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::camera::domain::camera_device::{CameraDevice, FrameSource};
use crate::camera::domain::device_error::DeviceError;
use crate::shared::frame::{Frame, Resolution};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FakeOutcome {
    Ready,
    /// Acquisition succeeds but the stream never produces a frame.
    NoFrames,
    PermissionDenied,
    Unavailable,
}

/// Camera double that counts acquisitions and live streams.
///
/// Refuses a second acquisition while a stream is live, like a real
/// capture device held by another consumer.
pub(crate) struct FakeCamera {
    outcome: Mutex<FakeOutcome>,
    acquisitions: AtomicUsize,
    live: Arc<AtomicUsize>,
    max_live: Arc<AtomicUsize>,
    resolutions: Mutex<Vec<Resolution>>,
    last_source: Mutex<Option<Arc<FakeFrameSource>>>,
}

impl FakeCamera {
    pub(crate) fn ready() -> Arc<Self> {
        Self::with_outcome(FakeOutcome::Ready)
    }

    pub(crate) fn failing(outcome: FakeOutcome) -> Arc<Self> {
        Self::with_outcome(outcome)
    }

    pub(crate) fn with_outcome(outcome: FakeOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            acquisitions: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
            max_live: Arc::new(AtomicUsize::new(0)),
            resolutions: Mutex::new(Vec::new()),
            last_source: Mutex::new(None),
        })
    }

    pub(crate) fn set_outcome(&self, outcome: FakeOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub(crate) fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub(crate) fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub(crate) fn max_concurrent_streams(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub(crate) fn requested_resolutions(&self) -> Vec<Resolution> {
        self.resolutions.lock().unwrap().clone()
    }

    pub(crate) fn last_source(&self) -> Option<Arc<FakeFrameSource>> {
        self.last_source.lock().unwrap().clone()
    }
}

impl CameraDevice for FakeCamera {
    fn name(&self) -> &str {
        "fake-camera"
    }

    fn acquire(&self, resolution: Resolution) -> Result<Arc<dyn FrameSource>, DeviceError> {
        self.resolutions.lock().unwrap().push(resolution);
        let outcome = *self.outcome.lock().unwrap();
        match outcome {
            FakeOutcome::PermissionDenied => {
                return Err(DeviceError::permission_denied("fake-camera", "denied"))
            }
            FakeOutcome::Unavailable => {
                return Err(DeviceError::unavailable("fake-camera", "not connected"))
            }
            FakeOutcome::Ready | FakeOutcome::NoFrames => {}
        }
        if self.live.load(Ordering::SeqCst) > 0 {
            return Err(DeviceError::unavailable("fake-camera", "device busy"));
        }

        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        let now_live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now_live, Ordering::SeqCst);

        let frame = (outcome == FakeOutcome::Ready).then(|| Frame::solid(32, 24, [90, 120, 150], 0));
        let source = Arc::new(FakeFrameSource {
            frame,
            live: AtomicBool::new(true),
            paused: AtomicBool::new(false),
            camera_live: self.live.clone(),
        });
        *self.last_source.lock().unwrap() = Some(source.clone());
        Ok(source)
    }
}

pub(crate) struct FakeFrameSource {
    frame: Option<Frame>,
    live: AtomicBool,
    paused: AtomicBool,
    camera_live: Arc<AtomicUsize>,
}

impl FakeFrameSource {
    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }
}

impl FrameSource for FakeFrameSource {
    fn current_frame(&self) -> Option<Frame> {
        if !self.is_live() {
            return None;
        }
        self.frame.clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst) && !self.paused.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.camera_live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Serves exactly one HTTP response on a loopback port.
///
/// Returns the base URL and a handle yielding the raw request body the
/// client sent.
pub(crate) fn serve_once(
    status: u16,
    body: &str,
) -> (String, std::thread::JoinHandle<String>) {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let response = format!(
            "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8(request_body).unwrap()
    });

    (url, handle)
}

/// A loopback URL nothing listens on.
pub(crate) fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}
