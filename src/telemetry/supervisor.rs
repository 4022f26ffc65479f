use std::process::Stdio;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::time::timeout;
use tracing::{info, warn};

use super::{ingest, lock, notices, FrameTracker, TOOL_EXE};

/// OS kill facility, by absolute path so this keeps working when PATH is
/// stripped by an embedding environment.
#[cfg(windows)]
const KILL_TOOL: &str = r"C:\Windows\System32\taskkill.exe";
#[cfg(not(windows))]
const KILL_TOOL: &str = "/usr/bin/pkill";

/// How long `stop` waits for the ingest task before abandoning it.
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// CREATE_NO_WINDOW: keep the exporter from flashing a console.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

impl FrameTracker {
    /// Launch the exporter and begin collecting samples.
    ///
    /// No-op if a session is already running. A missing exporter executable
    /// is logged and leaves the tracker inert rather than failing the
    /// caller; so does any launch error. Stray exporter instances are
    /// force-killed by name first so two sessions never fight over the same
    /// trace.
    pub async fn start(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            return;
        }

        if !self.tool_path.exists() {
            warn!(
                path = %self.tool_path.display(),
                "{TOOL_EXE} not found; frame-time tracking unavailable"
            );
            return;
        }

        kill_stray().await;

        let mut child = match self.spawn_exporter() {
            Ok(child) => child,
            Err(e) => {
                warn!("failed to launch {TOOL_EXE}: {e:#}");
                return;
            }
        };

        // Diagnostic text goes through our log channel instead of being
        // lost; the classifier picks the level.
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr));
        }

        let Some(stdout) = child.stdout.take() else {
            // Cannot happen with a piped stdout, but don't pretend to run.
            let _ = child.start_kill();
            return;
        };

        self.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        self.reader = Some(tokio::spawn(async move {
            ingest::run(BufReader::new(stdout), shared, running).await;
        }));
        self.child = Some(child);

        info!(process = %self.process_name, "frame-time tracker started");
    }

    /// Tear the session down. Idempotent.
    ///
    /// Clears the continuation flag, terminates the exporter (best effort,
    /// twice: by handle and by name), waits briefly for the ingest task and
    /// abandons it if it is stuck in a pipe read, then resets the sample
    /// buffer and the cached rate to their initial state.
    pub async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
        kill_stray().await;

        if let Some(mut reader) = self.reader.take() {
            if timeout(READER_JOIN_TIMEOUT, &mut reader).await.is_err() {
                reader.abort();
            }
        }

        let mut shared = lock(&self.shared);
        shared.frame_times.clear();
        shared.last_fps = 0;
        drop(shared);

        info!("frame-time tracker stopped");
    }

    fn spawn_exporter(&self) -> Result<Child> {
        let mut cmd = Command::new(&self.tool_path);
        cmd.arg("--stop_existing_session")
            .arg("--no_top")
            .arg("--process_name")
            .arg(&self.process_name)
            .arg("--output_stdout")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = self.tool_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }
        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        cmd.spawn()
            .with_context(|| format!("spawning {}", self.tool_path.display()))
    }
}

/// Force-kill any stray exporter instance by executable name. Failure is
/// the common case (none running) and is ignored.
async fn kill_stray() {
    let mut cmd = Command::new(KILL_TOOL);
    #[cfg(windows)]
    {
        cmd.args(["/F", "/IM", TOOL_EXE]);
        cmd.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(windows))]
    cmd.args(["-x", TOOL_EXE]);

    let _ = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
}

async fn log_stderr(stderr: ChildStderr) {
    let mut segments = BufReader::new(stderr).split(b'\n');
    while let Ok(Some(raw)) = segments.next_segment().await {
        let line = ingest::decode_dropping_invalid(&raw);
        let line = line.trim();
        if !line.is_empty() {
            notices::log_line(line);
        }
    }
}
