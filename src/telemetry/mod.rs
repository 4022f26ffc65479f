mod ingest;
mod notices;
mod supervisor;

pub use notices::StreamNotice;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::process::Child;
use tokio::task::JoinHandle;

/// Name of the frame-time exporter executable, expected beside our binary.
pub const TOOL_EXE: &str = "PresentMon.exe";

/// Game process the exporter filters to when no override is given.
pub const DEFAULT_PROCESS: &str = "Warframe.x64.exe";

/// State shared between the ingest task (append) and `get_rate` (drain).
/// Both fields are always touched together, so one lock covers them jointly.
#[derive(Default)]
pub(crate) struct Shared {
    pub(crate) frame_times: Vec<f64>,
    pub(crate) last_fps: u32,
}

pub(crate) fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Supervises one PresentMon session and turns its per-frame latency stream
/// into a polled frames-per-second reading.
///
/// At most one session is active per tracker; `start` while running is a
/// no-op. Callers never see an error from this type: a missing exporter or a
/// dead pipe only shows up as `get_rate` returning 0 or a stale value.
pub struct FrameTracker {
    /// Path to the exporter executable
    tool_path: PathBuf,
    /// Process name the exporter filters its capture to
    process_name: String,
    /// Continuation flag for the ingest loop, checked once per line
    running: Arc<AtomicBool>,
    shared: Arc<Mutex<Shared>>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
}

impl FrameTracker {
    /// Tracker for `process_name`, with the exporter located next to the
    /// current executable.
    pub fn new(process_name: impl Into<String>) -> Self {
        let tool_path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|dir| dir.join(TOOL_EXE)))
            .unwrap_or_else(|| PathBuf::from(TOOL_EXE));
        Self::with_tool_path(tool_path, process_name)
    }

    /// Tracker with an explicit exporter location.
    pub fn with_tool_path(tool_path: impl Into<PathBuf>, process_name: impl Into<String>) -> Self {
        Self {
            tool_path: tool_path.into(),
            process_name: process_name.into(),
            running: Arc::new(AtomicBool::new(false)),
            shared: Arc::new(Mutex::new(Shared::default())),
            child: None,
            reader: None,
        }
    }

    /// Whether a session is currently active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current frames-per-second reading.
    ///
    /// Drains the samples gathered since the previous poll and converts
    /// their mean latency to a rate. With no new samples the last value is
    /// returned unchanged, so a poll during a lull (or after the exporter
    /// died) still gets a sensible answer. 0 until the first valid samples
    /// arrive and again after `stop`.
    pub fn get_rate(&self) -> u32 {
        let mut shared = lock(&self.shared);
        if shared.frame_times.is_empty() {
            return shared.last_fps;
        }

        let avg_ms = shared.frame_times.iter().sum::<f64>() / shared.frame_times.len() as f64;
        shared.frame_times.clear();

        if avg_ms > 0.0 {
            shared.last_fps = (1000.0 / avg_ms).round() as u32;
        }
        shared.last_fps
    }
}
