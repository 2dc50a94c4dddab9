use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::camera::domain::camera_device::{CameraDevice, FrameSource};
use crate::camera::domain::device_error::DeviceError;
use crate::shared::frame::{Frame, Resolution};

const EPERM: i32 = 1;
const EACCES: i32 = 13;

const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Capture device opened through libavdevice (v4l2, avfoundation, dshow).
///
/// With no input format the device string is handed to ffmpeg's probe,
/// which also accepts video files and stream URLs; handy for running the
/// pipeline without camera hardware.
pub struct FfmpegCamera {
    device: String,
    input_format: Option<String>,
    busy: Arc<AtomicBool>,
}

impl FfmpegCamera {
    pub fn new(device: impl Into<String>, input_format: Option<String>) -> Self {
        Self {
            device: device.into(),
            input_format,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The platform's first camera through its native capture backend.
    pub fn platform_default() -> Self {
        Self::new(
            default_device(),
            default_input_format().map(str::to_string),
        )
    }

    pub fn input_format(&self) -> Option<&str> {
        self.input_format.as_deref()
    }
}

pub fn default_input_format() -> Option<&'static str> {
    if cfg!(target_os = "linux") {
        Some("v4l2")
    } else if cfg!(target_os = "macos") {
        Some("avfoundation")
    } else if cfg!(target_os = "windows") {
        Some("dshow")
    } else {
        None
    }
}

pub fn default_device() -> &'static str {
    if cfg!(target_os = "macos") {
        "0"
    } else if cfg!(target_os = "windows") {
        "video=Integrated Camera"
    } else {
        "/dev/video0"
    }
}

/// Names of the video capture backends compiled into the linked ffmpeg.
pub fn available_input_formats() -> Vec<String> {
    if ffmpeg_next::init().is_err() {
        return Vec::new();
    }
    ffmpeg_next::device::register_all();
    ffmpeg_next::device::input::video()
        .map(|format| format.name().to_string())
        .collect()
}

impl CameraDevice for FfmpegCamera {
    fn name(&self) -> &str {
        &self.device
    }

    fn acquire(&self, resolution: Resolution) -> Result<Arc<dyn FrameSource>, DeviceError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DeviceError::unavailable(&self.device, "device busy"));
        }

        let shared = Arc::new(StreamShared::default());
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), DeviceError>>(1);

        let device = self.device.clone();
        let format = self.input_format.clone();
        let worker_shared = shared.clone();
        let handle = thread::spawn(move || {
            run_capture(&device, format.as_deref(), resolution, &worker_shared, ready_tx)
        });

        let opened = ready_rx.recv().unwrap_or_else(|_| {
            Err(DeviceError::unavailable(
                &self.device,
                "capture thread exited before opening the device",
            ))
        });

        match opened {
            Ok(()) => Ok(Arc::new(FfmpegFrameSource {
                shared,
                worker: Mutex::new(Some(handle)),
                busy: self.busy.clone(),
            })),
            Err(e) => {
                let _ = handle.join();
                self.busy.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}

#[derive(Default)]
struct StreamShared {
    latest: Mutex<Option<Frame>>,
    stopped: AtomicBool,
    ended: AtomicBool,
}

struct FfmpegFrameSource {
    shared: Arc<StreamShared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    busy: Arc<AtomicBool>,
}

impl FrameSource for FfmpegFrameSource {
    fn current_frame(&self) -> Option<Frame> {
        if !self.is_live() {
            return None;
        }
        self.shared
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn is_live(&self) -> bool {
        !self.shared.stopped.load(Ordering::SeqCst) && !self.shared.ended.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // The input context closes when the capture thread returns.
            if handle.join().is_err() {
                log::error!("Camera capture thread panicked");
            }
            self.busy.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

struct OpenedInput {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    stream_index: usize,
}

fn run_capture(
    device: &str,
    format: Option<&str>,
    resolution: Resolution,
    shared: &StreamShared,
    ready_tx: crossbeam_channel::Sender<Result<(), DeviceError>>,
) {
    let input = match open_input(device, format, resolution) {
        Ok(input) => {
            let _ = ready_tx.send(Ok(()));
            input
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    drop(ready_tx);

    let OpenedInput {
        mut ictx,
        mut decoder,
        stream_index,
    } = input;
    let mut scaler: Option<(ffmpeg_next::software::scaling::Context, u32, u32)> = None;
    let mut sequence: u64 = 0;

    pump_packets(
        device,
        &shared.stopped,
        || {
            let mut packet = ffmpeg_next::Packet::empty();
            packet.read(&mut ictx).map(|()| packet)
        },
        |packet| {
            if packet.stream() != stream_index || decoder.send_packet(&packet).is_err() {
                return;
            }

            let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
            while decoder.receive_frame(&mut decoded).is_ok() {
                let (width, height) = (decoded.width(), decoded.height());
                let needs_scaler = !matches!(scaler, Some((_, w, h)) if w == width && h == height);
                if needs_scaler {
                    match ffmpeg_next::software::scaling::Context::get(
                        decoded.format(),
                        width,
                        height,
                        ffmpeg_next::format::Pixel::RGB24,
                        width,
                        height,
                        ffmpeg_next::software::scaling::Flags::BILINEAR,
                    ) {
                        Ok(ctx) => scaler = Some((ctx, width, height)),
                        Err(e) => {
                            log::warn!("Cannot convert camera pixel format: {e}");
                            continue;
                        }
                    }
                }
                let Some((ctx, _, _)) = scaler.as_mut() else {
                    continue;
                };

                let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
                if let Err(e) = ctx.run(&decoded, &mut rgb_frame) {
                    log::debug!("Dropping camera frame: {e}");
                    continue;
                }
                let pixels = extract_rgb_pixels(&rgb_frame, width, height);
                *shared.latest.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(Frame::new(pixels, width, height, 3, sequence));
                sequence += 1;
            }
        },
    );

    shared.ended.store(true, Ordering::SeqCst);
    log::debug!("Camera stream {device} closed after {sequence} frames");
}

/// Reads packets until the stream ends, a read fails, or `stopped` is set.
///
/// The stop flag is checked before every read. Only "try again" errors are
/// retried; anything else (a vanished device, a broken pipe) ends the stream.
fn pump_packets<P>(
    device: &str,
    stopped: &AtomicBool,
    mut read: impl FnMut() -> Result<P, ffmpeg_next::Error>,
    mut handle: impl FnMut(P),
) {
    while !stopped.load(Ordering::SeqCst) {
        match read() {
            Ok(packet) => handle(packet),
            Err(e) if is_retryable(&e) => thread::sleep(READ_RETRY_DELAY),
            Err(ffmpeg_next::Error::Eof) => break,
            Err(e) => {
                log::warn!("Camera stream {device} failed: {e}");
                break;
            }
        }
    }
}

fn is_retryable(error: &ffmpeg_next::Error) -> bool {
    matches!(error, ffmpeg_next::Error::Other { errno } if *errno == ffmpeg_next::error::EAGAIN)
}

fn open_input(
    device: &str,
    format: Option<&str>,
    resolution: Resolution,
) -> Result<OpenedInput, DeviceError> {
    ffmpeg_next::init().map_err(|e| DeviceError::unavailable(device, e.to_string()))?;
    ffmpeg_next::device::register_all();

    let mut options = ffmpeg_next::Dictionary::new();
    if format.is_some() {
        options.set("video_size", &resolution.to_string());
    }

    let ictx = match format {
        Some(name) => {
            let input_format = ffmpeg_next::device::input::video()
                .find(|f| f.name() == name)
                .ok_or_else(|| {
                    DeviceError::unavailable(device, format!("capture backend {name} not available"))
                })?;
            let context = ffmpeg_next::format::open_with(device, &input_format, options)
            .map_err(|e| classify_open_error(device, &e))?;
            match context {
                ffmpeg_next::format::context::Context::Input(ictx) => ictx,
                ffmpeg_next::format::context::Context::Output(_) => {
                    return Err(DeviceError::unavailable(device, "not a capture input"))
                }
            }
        }
        None => ffmpeg_next::format::input_with_dictionary(device, options)
            .map_err(|e| classify_open_error(device, &e))?,
    };

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| DeviceError::unavailable(device, "no video stream"))?;
    let stream_index = stream.index();
    let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .and_then(|ctx| ctx.decoder().video())
        .map_err(|e| DeviceError::unavailable(device, e.to_string()))?;

    Ok(OpenedInput {
        ictx,
        decoder,
        stream_index,
    })
}

/// Maps an ffmpeg open failure onto the device error taxonomy.
fn classify_open_error(device: &str, error: &ffmpeg_next::Error) -> DeviceError {
    let message = error.to_string();
    let denied = matches!(error, ffmpeg_next::Error::Other { errno } if *errno == EACCES || *errno == EPERM)
        || message.to_lowercase().contains("permission denied");
    if denied {
        DeviceError::permission_denied(device, message)
    } else {
        DeviceError::unavailable(device, message)
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// stripping per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
