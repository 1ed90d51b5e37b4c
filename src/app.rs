use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::discovery::Discovery;
use crate::layout::HitRegion;
use crate::panel::{NavKey, Panel};
use crate::session::SessionRecord;
use crate::tmux::Multiplexer;

/// Minimum spacing between forced discovery passes on the tick path.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(2);

/// Session action queued by input handling; the host drains it between
/// events so terminal suspension happens outside the event handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Activate,
    Resume,
    Kill,
}

pub struct App {
    pub panel: Panel,
    pub discovery: Discovery,
    pub sessions: Vec<SessionRecord>,
    /// Clickable rows from the last drawn frame.
    pub regions: Vec<HitRegion>,
    pub should_quit: bool,
    pub pending: Option<PendingAction>,
    pub status_message: Option<String>,
    last_probe: Option<Instant>,
}

impl App {
    pub fn new(discovery: Discovery) -> Self {
        Self {
            panel: Panel::new(),
            discovery,
            sessions: Vec::new(),
            regions: Vec::new(),
            should_quit: false,
            pending: None,
            status_message: None,
            last_probe: None,
        }
    }

    /// Forced discovery pass; the panel is only marked dirty when the
    /// session list actually changed.
    pub async fn refresh(&mut self, mux: &dyn Multiplexer) {
        let sessions = self.discovery.discover(mux, true).await;
        if sessions != self.sessions {
            self.sessions = sessions;
            self.panel.redraw = true;
        }
        self.last_probe = Some(Instant::now());
    }

    /// Tick handler: probes at most once per `PROBE_INTERVAL`.
    pub async fn on_tick(&mut self, mux: &dyn Multiplexer) {
        let due = match self.last_probe {
            Some(at) => at.elapsed() >= PROBE_INTERVAL,
            None => true,
        };
        if due {
            self.refresh(mux).await;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.panel.focused {
                    self.panel.toggle_focus();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab => self.panel.toggle_focus(),
            KeyCode::Enter => {
                if self.panel.focused {
                    self.pending = Some(PendingAction::Activate);
                }
            }
            KeyCode::Char('r') => {
                if self.panel.focused {
                    self.pending = Some(PendingAction::Resume);
                }
            }
            KeyCode::Char('x') => {
                if self.panel.focused {
                    self.pending = Some(PendingAction::Kill);
                }
            }
            other => {
                if let Some(nav) = nav_key(other) {
                    self.panel.handle_nav_key(nav);
                }
            }
        }
    }

    /// Left presses only; a hit selects the row and a double-click queues
    /// an activate.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return;
        }
        let hit = self
            .regions
            .iter()
            .find(|r| r.contains(mouse.column, mouse.row))
            .map(|r| r.session_id.clone());
        if let Some(session_id) = hit {
            self.status_message = None;
            if self.panel.register_click(&session_id) {
                self.pending = Some(PendingAction::Activate);
            }
        }
    }
}

fn nav_key(code: KeyCode) -> Option<NavKey> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(NavKey::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(NavKey::Down),
        KeyCode::PageUp => Some(NavKey::PageUp),
        KeyCode::PageDown => Some(NavKey::PageDown),
        KeyCode::Home => Some(NavKey::Home),
        KeyCode::End => Some(NavKey::End),
        _ => None,
    }
}
