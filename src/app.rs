use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::actions::Action;

/// Dashboard colors
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub success: Color,
    pub warning: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(97, 175, 239),
            dim: Color::Rgb(100, 100, 100),
            success: Color::Rgb(80, 200, 120),
            warning: Color::Rgb(255, 193, 7),
        }
    }
}

/// Main application state
pub struct App {
    /// Latest frames-per-second reading (0 = unknown)
    pub rate: u32,
    /// Whether the tracker currently has an active session
    pub tracking: bool,
    /// Process the exporter filters to
    pub process_name: String,
    /// Current message to display in the footer
    pub status: Option<String>,
    /// Theme
    pub theme: Theme,
    /// Pending action queue
    pub pending_actions: Vec<Action>,
}

impl App {
    pub fn new(process_name: String) -> Self {
        Self {
            rate: 0,
            tracking: false,
            process_name,
            status: None,
            theme: Theme::default(),
            pending_actions: Vec::new(),
        }
    }

    /// Take pending actions (drains the queue)
    pub fn take_pending_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }

    /// Handle an action and return whether to quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::KeyPress(key) => self.handle_key(key),
            Action::RateUpdated(rate) => {
                self.rate = rate;
                Ok(false)
            }
            Action::Quit => Ok(true),
            _ => Ok(false),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Clear the status message on any key press
        if self.status.is_some() {
            self.status = None;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true);
            }
            KeyCode::Char('s') => {
                self.pending_actions.push(Action::ToggleTracking);
            }
            _ => {}
        }
        Ok(false)
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Readout
                Constraint::Length(3), // Footer/status
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_readout(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                " frametap ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "│ frame-time telemetry readout",
                Style::default().fg(self.theme.dim),
            ),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(title, area);
    }

    fn render_readout(&self, frame: &mut Frame, area: Rect) {
        let (indicator, indicator_style) = if self.tracking {
            ("● tracking", Style::default().fg(self.theme.success))
        } else {
            ("○ stopped", Style::default().fg(self.theme.dim))
        };

        let (value, value_style) = if !self.tracking {
            (
                "press 's' to start".to_string(),
                Style::default().fg(self.theme.dim),
            )
        } else if self.rate == 0 {
            (
                "waiting for samples".to_string(),
                Style::default().fg(self.theme.warning),
            )
        } else {
            (
                format!("{} FPS", self.rate),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        };

        let content = vec![
            Line::from(""),
            Line::from(Span::styled(indicator, indicator_style)),
            Line::from(""),
            Line::from(Span::styled(value, value_style)),
            Line::from(""),
            Line::from(vec![
                Span::styled("target: ", Style::default().fg(self.theme.dim)),
                Span::styled(&self.process_name, Style::default().fg(self.theme.fg)),
            ]),
        ];

        let readout = Paragraph::new(content).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(readout, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let content = if let Some(ref msg) = self.status {
            Line::from(Span::styled(
                format!(" {} ", msg),
                Style::default().fg(self.theme.warning),
            ))
        } else {
            Line::from(Span::styled(
                " q: Quit │ s: Start/Stop ",
                Style::default().fg(self.theme.dim),
            ))
        };

        let footer = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(footer, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_key_queues_a_toggle() {
        let mut app = App::new("game.exe".to_string());
        let quit = app
            .handle_action(Action::KeyPress(KeyEvent::from(KeyCode::Char('s'))))
            .unwrap();
        assert!(!quit);
        assert!(matches!(
            app.take_pending_actions().as_slice(),
            [Action::ToggleTracking]
        ));
    }

    #[test]
    fn q_key_quits() {
        let mut app = App::new("game.exe".to_string());
        let quit = app
            .handle_action(Action::KeyPress(KeyEvent::from(KeyCode::Char('q'))))
            .unwrap();
        assert!(quit);
    }

    #[test]
    fn rate_updates_land_in_state() {
        let mut app = App::new("game.exe".to_string());
        app.handle_action(Action::RateUpdated(144)).unwrap();
        assert_eq!(app.rate, 144);
    }
}
