use crossterm::event::KeyEvent;

/// Actions dispatched through the dashboard
#[derive(Debug, Clone)]
pub enum Action {
    /// A key was pressed
    KeyPress(KeyEvent),
    /// A fresh frames-per-second reading arrived from the tracker poll
    RateUpdated(u32),
    /// Start the tracker if stopped, stop it if running
    ToggleTracking,
    /// Request to quit the application
    Quit,
}
