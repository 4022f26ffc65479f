use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

mod actions;
mod app;

use actions::Action;
use app::App;
use frametap::telemetry::{FrameTracker, DEFAULT_PROCESS, TOOL_EXE};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Target process can be overridden from the command line
    let process_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PROCESS.to_string());

    let mut tracker = FrameTracker::new(process_name.clone());

    // Create event channel
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    // Initialize terminal
    let mut terminal = ratatui::init();

    // Spawn input handler
    let input_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(evt) = event::read() {
                    if let Event::Key(key) = evt {
                        if key.kind == KeyEventKind::Press {
                            let _ = input_tx.send(Action::KeyPress(key));
                        }
                    }
                }
            }
        }
    });

    // Create app state
    let mut app = App::new(process_name);
    let mut poll = tokio::time::interval(Duration::from_secs(1));

    // Main event loop
    let result = loop {
        // Render
        terminal.draw(|f| app.render(f))?;

        // Process any pending actions from the app
        for pending_action in app.take_pending_actions() {
            match pending_action {
                Action::ToggleTracking => {
                    if tracker.is_running() {
                        tracker.stop().await;
                        app.status = Some("tracker stopped".to_string());
                    } else {
                        tracker.start().await;
                        if !tracker.is_running() {
                            app.status =
                                Some(format!("{} not found next to frametap", TOOL_EXE));
                        }
                    }
                    app.tracking = tracker.is_running();
                }
                _ => {}
            }
        }

        // Handle events from channel, polling the tracker once per second
        tokio::select! {
            Some(action) = rx.recv() => {
                match app.handle_action(action) {
                    Ok(should_quit) => {
                        if should_quit {
                            break Ok(());
                        }
                    }
                    Err(e) => {
                        break Err(e);
                    }
                }
            }
            _ = poll.tick() => {
                let rate = tracker.get_rate();
                let _ = app.handle_action(Action::RateUpdated(rate));
            }
        }
    };

    // Restore terminal and tear the session down
    tracker.stop().await;
    ratatui::restore();
    result
}
