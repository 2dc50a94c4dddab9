mod settings;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use facegate_core::camera::domain::camera_device::CameraDevice;
use facegate_core::camera::infrastructure::ffmpeg_camera::{
    available_input_formats, default_device, default_input_format, FfmpegCamera,
};
use facegate_core::directory::domain::attendance_entry::{AttendanceEntry, AttendanceSummary};
use facegate_core::directory::domain::directory::Directory;
use facegate_core::directory::domain::identity::{Identity, IdentitySummary};
use facegate_core::directory::domain::listing::{paginate, search};
use facegate_core::directory::infrastructure::http_directory::HttpDirectory;
use facegate_core::enrollment::domain::enrollment_error::EnrollmentErrorKind;
use facegate_core::enrollment::domain::enrollment_state::EnrollmentState;
use facegate_core::enrollment::enrollment_workflow::{
    CaptureOutcome, CommitOutcome, EnrollmentWorkflow,
};
use facegate_core::enrollment::infrastructure::http_enrollment_gateway::HttpEnrollmentGateway;
use facegate_core::monitor::camera_owner::CameraOwner;
use facegate_core::monitor::live_monitor::MonitorConfig;
use facegate_core::recognition::infrastructure::http_recognizer::HttpRecognizer;
use facegate_core::recognition::overlay::RecognitionOverlayMapper;
use facegate_core::sampling::frame_sampler::FrameSampler;
use facegate_core::shared::constants::{ENROLLMENT_SHOT_COUNT, LOGS_PER_PAGE, USERS_PER_PAGE};

use settings::Settings;

/// Consecutive failed shots tolerated in automatic enrollment capture.
const MAX_AUTO_CAPTURE_FAILURES: usize = 20;

/// Live face recognition and enrollment for the attendance service.
#[derive(Parser)]
#[command(name = "facegate", version)]
struct Cli {
    /// Recognition service base URL (overrides settings).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Capture device, e.g. /dev/video0 or 0 (overrides settings).
    #[arg(long, global = true)]
    device: Option<String>,

    /// ffmpeg capture input format, e.g. v4l2, avfoundation, dshow.
    #[arg(long, global = true)]
    format: Option<String>,

    /// Settings file to use instead of the per-user one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run live recognition and print each new overlay.
    Monitor {
        /// Stop after this many seconds (runs until interrupted otherwise).
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Capture five shots of a person and enroll them.
    Enroll {
        /// Display name.
        #[arg(long)]
        name: String,

        /// Employee or student id.
        #[arg(long)]
        id: String,

        /// Department.
        #[arg(long)]
        dept: String,

        /// Capture automatically every N milliseconds instead of on Enter.
        #[arg(long)]
        auto_interval_ms: Option<u64>,
    },
    /// List enrolled identities.
    Users {
        /// Case-insensitive filter on name or id.
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// List recent attendance check-ins.
    Logs {
        /// Case-insensitive filter on name or id.
        #[arg(long)]
        search: Option<String>,

        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// List the capture backends available in this ffmpeg build.
    Devices,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let settings = resolve_settings(&cli);

    match cli.command {
        Command::Monitor { seconds } => run_monitor(&settings, seconds),
        Command::Enroll {
            name,
            id,
            dept,
            auto_interval_ms,
        } => run_enroll(&settings, &name, &id, &dept, auto_interval_ms),
        Command::Users { search, page } => run_users(&settings, search.as_deref(), page),
        Command::Logs { search, page } => run_logs(&settings, search.as_deref(), page),
        Command::Devices => {
            run_devices(&settings);
            Ok(())
        }
    }
}

fn resolve_settings(cli: &Cli) -> Settings {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    if let Some(url) = &cli.api_url {
        settings.api_base_url = url.clone();
    }
    if let Some(device) = &cli.device {
        settings.camera_device = device.clone();
    }
    if let Some(format) = &cli.format {
        settings.camera_format = Some(format.clone());
    }
    settings
}

fn build_owner(settings: &Settings) -> Result<CameraOwner, Box<dyn std::error::Error>> {
    let camera: Arc<dyn CameraDevice> = Arc::new(FfmpegCamera::new(
        settings.camera_device.clone(),
        settings.camera_format.clone(),
    ));
    let recognizer = Arc::new(HttpRecognizer::new(
        &settings.api_base_url,
        settings.request_timeout(),
    )?);
    let gateway = Arc::new(HttpEnrollmentGateway::new(
        &settings.api_base_url,
        settings.request_timeout(),
    )?);

    let monitor_config = MonitorConfig {
        resolution: settings.live_resolution(),
        cadence: settings.cadence(),
        sampler: FrameSampler::new(settings.live_jpeg_quality),
        mapper: RecognitionOverlayMapper::new(true, settings.source_orientation()),
    };
    Ok(CameraOwner::new(camera, recognizer, gateway)
        .with_monitor_config(monitor_config)
        .with_enrollment_capture(
            FrameSampler::new(settings.enrollment_jpeg_quality),
            settings.enrollment_resolution(),
        ))
}

fn run_monitor(settings: &Settings, seconds: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let mut owner = build_owner(settings)?;
    owner.open_monitor()?;
    let monitor = owner.monitor().ok_or("live monitor did not open")?;
    log::info!(
        "Monitoring {} via {}",
        settings.camera_device,
        settings.api_base_url
    );

    let updates = monitor.updates();
    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if !monitor.is_stream_live() {
            eprintln!("Camera stream ended");
            break;
        }
        match updates.recv_timeout(Duration::from_millis(250)) {
            Ok(result) => match monitor.map(&result) {
                Some(overlay) => println!("{overlay}"),
                None => println!("[no face] {}", result.subject_label),
            },
            Err(e) if e.is_disconnected() => break,
            Err(_) => {}
        }
    }

    let stats = monitor.stats();
    owner.close();
    log::info!(
        "Rounds: {} dispatched, {} published, {} failed, {} ticks skipped",
        stats.dispatched,
        stats.published,
        stats.failed,
        stats.skipped_in_flight + stats.skipped_not_ready
    );
    Ok(())
}

fn run_enroll(
    settings: &Settings,
    name: &str,
    id: &str,
    dept: &str,
    auto_interval_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut owner = build_owner(settings)?;
    owner.open_enrollment()?;
    let workflow = owner.enrollment().ok_or("enrollment did not open")?;
    workflow.set_display_name(name)?;
    workflow.set_external_id(id)?;
    workflow.set_department(dept)?;

    let outcome = match auto_interval_ms {
        Some(ms) => enroll_automatically(workflow, Duration::from_millis(ms))?,
        None => enroll_interactively(workflow)?,
    };
    owner.close();

    match outcome {
        Some(CommitOutcome::Enrolled {
            external_id,
            message,
        }) => {
            println!("Enrolled {external_id}");
            if let Some(message) = message {
                println!("{message}");
            }
            let directory = HttpDirectory::new(&settings.api_base_url, settings.request_timeout())?;
            let identities = directory.identities()?;
            print_identities(&identities, None, 1);
        }
        None => eprintln!("Enrollment cancelled"),
    }
    Ok(())
}

/// Falls back to the interactive prompt when the backend rejects the
/// submission, so the profile can be corrected without recapturing.
fn enroll_automatically(
    workflow: &mut EnrollmentWorkflow,
    interval: Duration,
) -> Result<Option<CommitOutcome>, Box<dyn std::error::Error>> {
    let mut failures = 0;
    while workflow.state() != EnrollmentState::ReadyToCommit {
        std::thread::sleep(interval);
        match workflow.capture_frame() {
            Ok(CaptureOutcome::Captured { count }) => {
                failures = 0;
                eprintln!("Shot {count}/{ENROLLMENT_SHOT_COUNT}");
            }
            Ok(CaptureOutcome::Ignored) => break,
            Err(e) if e.kind() == EnrollmentErrorKind::Sample => {
                failures += 1;
                log::warn!("Shot failed: {e}");
                if failures >= MAX_AUTO_CAPTURE_FAILURES {
                    return Err(e.into());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    match workflow.commit() {
        Ok(outcome) => Ok(Some(outcome)),
        Err(e) if e.kind() == EnrollmentErrorKind::SubmissionRejected => {
            eprintln!("Enrollment failed: {e}");
            enroll_interactively(workflow)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ProfileField {
    Name,
    Id,
    Dept,
}

impl ProfileField {
    fn label(&self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Id => "id",
            ProfileField::Dept => "dept",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PromptCommand {
    /// Enter: capture the next shot, or commit once all are taken.
    Advance,
    Reset,
    Cancel,
    Edit(ProfileField, String),
    Unknown(String),
}

fn parse_prompt(line: &str) -> PromptCommand {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let value = rest.trim().to_string();
    match word {
        "" => PromptCommand::Advance,
        "r" => PromptCommand::Reset,
        "q" => PromptCommand::Cancel,
        "name" if !value.is_empty() => PromptCommand::Edit(ProfileField::Name, value),
        "id" if !value.is_empty() => PromptCommand::Edit(ProfileField::Id, value),
        "dept" if !value.is_empty() => PromptCommand::Edit(ProfileField::Dept, value),
        _ => PromptCommand::Unknown(line.to_string()),
    }
}

/// Returns `None` when the operator cancels.
fn enroll_interactively(
    workflow: &mut EnrollmentWorkflow,
) -> Result<Option<CommitOutcome>, Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        let ready = workflow.state() == EnrollmentState::ReadyToCommit;
        if ready {
            eprint!(
                "All {ENROLLMENT_SHOT_COUNT} shots taken. [Enter] commit, [name|id|dept <value>] edit, [r] retake, [q] cancel: "
            );
        } else {
            eprint!(
                "Shot {}/{ENROLLMENT_SHOT_COUNT}. [Enter] capture, [name|id|dept <value>] edit, [r] reset, [q] cancel: ",
                workflow.shot_count() + 1
            );
        }
        io::stderr().flush()?;

        let Some(line) = lines.next() else {
            return Ok(None);
        };
        match parse_prompt(&line?) {
            PromptCommand::Cancel => return Ok(None),
            PromptCommand::Reset => {
                workflow.reset()?;
                eprintln!("Shots cleared");
            }
            PromptCommand::Edit(field, value) => {
                eprintln!("Updated {} to '{value}'", field.label());
                match field {
                    ProfileField::Name => workflow.set_display_name(value)?,
                    ProfileField::Id => workflow.set_external_id(value)?,
                    ProfileField::Dept => workflow.set_department(value)?,
                }
            }
            PromptCommand::Advance if ready => match workflow.commit() {
                Ok(outcome) => return Ok(Some(outcome)),
                Err(e) => eprintln!("Enrollment failed: {e}"),
            },
            PromptCommand::Advance => match workflow.capture_frame() {
                Ok(_) => {}
                Err(e) if e.kind() == EnrollmentErrorKind::Sample => eprintln!("{e}"),
                Err(e) => return Err(e.into()),
            },
            PromptCommand::Unknown(other) => eprintln!("Unknown command '{other}'"),
        }
    }
}

fn run_users(
    settings: &Settings,
    term: Option<&str>,
    page: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let directory = HttpDirectory::new(&settings.api_base_url, settings.request_timeout())?;
    let identities = directory.identities()?;
    print_identities(&identities, term, page);
    Ok(())
}

fn print_identities(identities: &[Identity], term: Option<&str>, page: usize) {
    let summary = IdentitySummary::of(identities);
    let matches: Vec<Identity> = search(identities, term.unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();
    let page = paginate(&matches, page, USERS_PER_PAGE);

    println!("{:<12} {:<28} {:<16} VERIFIED", "ID", "NAME", "DEPT");
    for identity in page.items {
        println!(
            "{:<12} {:<28} {:<16} {}",
            identity.id,
            identity.name,
            identity.dept,
            if identity.is_verified { "yes" } else { "no" }
        );
    }
    println!(
        "Page {}/{} ({} shown of {} matching; {} enrolled, {} verified)",
        page.page,
        page.total_pages,
        page.items.len(),
        page.total_items,
        summary.total,
        summary.verified
    );
}

fn run_logs(
    settings: &Settings,
    term: Option<&str>,
    page: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let directory = HttpDirectory::new(&settings.api_base_url, settings.request_timeout())?;
    let entries = directory.attendance_logs()?;
    let summary = AttendanceSummary::of(&entries);
    let matches: Vec<AttendanceEntry> = search(&entries, term.unwrap_or_default())
        .into_iter()
        .cloned()
        .collect();
    let page = paginate(&matches, page, LOGS_PER_PAGE);

    println!(
        "{:<10} {:<12} {:<28} {:<16} {:>6} STATUS",
        "TIME", "ID", "NAME", "DEPT", "CONF"
    );
    for entry in page.items {
        let conf = entry
            .conf
            .map(|c| format!("{:.0}%", c * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<12} {:<28} {:<16} {:>6} {}",
            entry.time, entry.id, entry.user, entry.dept, conf, entry.status
        );
    }
    println!(
        "Page {}/{} ({} check-ins, {} matched, {} alerts)",
        page.page, page.total_pages, summary.total, summary.matched, summary.alerts
    );
    Ok(())
}

fn run_devices(settings: &Settings) {
    let formats = available_input_formats();
    if formats.is_empty() {
        println!("No capture backends found in the linked ffmpeg");
    }
    for format in &formats {
        let marker = if Some(format.as_str()) == default_input_format() {
            " (platform default)"
        } else {
            ""
        };
        println!("{format}{marker}");
    }
    println!(
        "Configured: {} via {} (platform default device: {})",
        settings.camera_device,
        settings.camera_format.as_deref().unwrap_or("auto"),
        default_device()
    );
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Users { page, .. } | Command::Logs { page, .. } if *page == 0 => {
            Err("Page numbers start at 1".into())
        }
        Command::Enroll {
            name,
            id,
            dept,
            auto_interval_ms,
        } => {
            for (flag, value) in [("--name", name), ("--id", id), ("--dept", dept)] {
                if value.trim().is_empty() {
                    return Err(format!("{flag} must not be empty").into());
                }
            }
            if *auto_interval_ms == Some(0) {
                return Err("--auto-interval-ms must be greater than 0".into());
            }
            Ok(())
        }
        Command::Monitor { seconds: Some(0) } => Err("--seconds must be greater than 0".into()),
        _ => Ok(()),
    }
}
