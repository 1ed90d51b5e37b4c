use std::time::{Duration, Instant};

use crate::layout::{self, ColumnWidths, HitRegion, PanelRow, RenderedFrame, RowKind};
use crate::session::{SessionRecord, SESSION_ID_PREFIX};
use crate::tmux::Multiplexer;

/// Two clicks on the same session within this window count as one
/// double-click.
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(500);

const EMPTY_NOTICE: &str = "No agent sessions found";

/// Symbolic navigation keys the panel understands. Anything else never
/// reaches the panel (the host's key map returns unhandled first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

/// The session panel: geometry the host reads/writes, plus long-lived
/// navigation state (selection, scroll, focus, click tracking) that is
/// re-clamped against each new session list.
///
/// `draw` is the sole rendering entry point; it consumes the reconciled
/// list and emits a frame plus this frame's click regions.
pub struct Panel {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub shown: bool,
    pub redraw: bool,
    pub focused: bool,

    selected_index: usize,
    scroll_offset: usize,
    last_visible_rows: usize,
    /// Last rendered list, in display (newest-first) order. Selection and
    /// click indices refer to this ordering.
    last_sessions: Vec<SessionRecord>,
    last_click: Option<(Instant, String)>,
}

impl Panel {
    pub const MIN_WIDTH: u16 = 32;
    pub const MIN_HEIGHT: u16 = 6;

    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            shown: true,
            redraw: true,
            focused: false,
            selected_index: 0,
            scroll_offset: 0,
            last_visible_rows: 0,
            last_sessions: Vec::new(),
            last_click: None,
        }
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Record a click on a session row. Returns true when this completes a
    /// double-click (same session, within the window). Clicking always
    /// focuses the panel and moves selection to the clicked row.
    pub fn register_click(&mut self, session_id: &str) -> bool {
        self.register_click_at(session_id, Instant::now())
    }

    fn register_click_at(&mut self, session_id: &str, now: Instant) -> bool {
        let is_double = self
            .last_click
            .as_ref()
            .is_some_and(|(at, id)| id == session_id && now.duration_since(*at) < DOUBLE_CLICK_WINDOW);
        self.last_click = Some((now, session_id.to_string()));
        self.focused = true;
        if let Some(idx) = self
            .last_sessions
            .iter()
            .position(|s| s.session_id == session_id)
        {
            self.selected_index = idx;
        }
        self.redraw = true;
        is_double
    }

    /// Flip panel focus without touching the selection.
    pub fn toggle_focus(&mut self) {
        self.focused = !self.focused;
        self.redraw = true;
    }

    /// Move the selection. No-op (false) unless the panel is focused, the
    /// list is non-empty, and a viewport has been rendered. Recognized
    /// keys are handled even when the selection is already at the edge.
    pub fn handle_nav_key(&mut self, key: NavKey) -> bool {
        if !self.focused || self.last_sessions.is_empty() || self.last_visible_rows == 0 {
            return false;
        }
        let last = self.last_sessions.len() - 1;
        match key {
            NavKey::Up => {
                if self.selected_index > 0 {
                    self.selected_index -= 1;
                }
            }
            NavKey::Down => {
                if self.selected_index < last {
                    self.selected_index += 1;
                }
            }
            NavKey::PageUp => {
                self.selected_index = self.selected_index.saturating_sub(self.last_visible_rows);
            }
            NavKey::PageDown => {
                self.selected_index = (self.selected_index + self.last_visible_rows).min(last);
            }
            NavKey::Home => self.selected_index = 0,
            NavKey::End => self.selected_index = last,
        }
        self.redraw = true;
        true
    }

    fn clamp_selection(&mut self) {
        if self.last_sessions.is_empty() {
            self.selected_index = 0;
            self.scroll_offset = 0;
        } else if self.selected_index >= self.last_sessions.len() {
            self.selected_index = self.last_sessions.len() - 1;
        }
    }

    /// The currently selected record, with the index clamped first.
    pub fn selected_session(&mut self) -> Option<&SessionRecord> {
        self.clamp_selection();
        self.last_sessions.get(self.selected_index)
    }

    /// Re-attach or re-create the selected session, then attach to it.
    /// Only declared (`agent-`) sessions with a known command qualify.
    pub async fn resume_selected(&mut self, mux: &dyn Multiplexer) -> bool {
        let Some(entry) = self.selected_session().cloned() else {
            return false;
        };
        if !entry.session_id.starts_with(SESSION_ID_PREFIX) || entry.command.is_empty() {
            return false;
        }
        if mux.has_session(&entry.session_id).await {
            attach_session(mux, &entry.session_id).await;
            return true;
        }
        if mux.create_detached(&entry.session_id, &entry.command).await.is_err() {
            return false;
        }
        attach_session(mux, &entry.session_id).await;
        true
    }

    /// Attach when the selected session is already running, otherwise fall
    /// back to resuming it.
    pub async fn activate_selected(&mut self, mux: &dyn Multiplexer) -> bool {
        let Some(entry) = self.selected_session().cloned() else {
            return false;
        };
        if entry.running {
            attach_session(mux, &entry.session_id).await;
            return true;
        }
        self.resume_selected(mux).await
    }

    /// Kill the selected session. Only running, declared sessions qualify.
    pub async fn kill_selected(&mut self, mux: &dyn Multiplexer) -> bool {
        let Some(entry) = self.selected_session().cloned() else {
            return false;
        };
        if !entry.running || !entry.session_id.starts_with(SESSION_ID_PREFIX) {
            return false;
        }
        mux.kill_session(&entry.session_id).await.is_ok()
    }

    /// Render one frame for the current geometry. The redraw flag is
    /// cleared unconditionally, even when the viewport has collapsed.
    ///
    /// `force_redraw`/`no_update` belong to the host contract: the host
    /// uses them to decide when to call draw at all; the frame itself is
    /// rebuilt deterministically on every call.
    pub fn draw(
        &mut self,
        sessions: &[SessionRecord],
        _force_redraw: bool,
        _no_update: bool,
    ) -> RenderedFrame {
        let mut frame = RenderedFrame::default();
        let inner_width = self.width.saturating_sub(2) as usize;
        let rows = self.height.saturating_sub(2) as usize;
        if inner_width == 0 || rows == 0 {
            self.redraw = false;
            return frame;
        }

        let widths = ColumnWidths::for_inner_width(inner_width);
        frame.rows.push(PanelRow {
            y: self.y + 1,
            text: widths.header_row(inner_width),
            kind: RowKind::Header,
        });

        let max_entries = rows - 1;
        self.last_visible_rows = max_entries;

        // Newest entries first; the reconciler's cache keeps append order.
        let mut display = sessions.to_vec();
        display.reverse();
        self.last_sessions = display;
        self.clamp_selection();

        // Adjust, don't recompute: scroll follows the selection just far
        // enough to keep it visible.
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        }
        if max_entries > 0 && self.selected_index >= self.scroll_offset + max_entries {
            self.scroll_offset = self.selected_index + 1 - max_entries;
        }

        let end = (self.scroll_offset + max_entries).min(self.last_sessions.len());
        let mut line = 0usize;
        for i in self.scroll_offset..end {
            let entry = &self.last_sessions[i];
            let status = entry.status_label();
            let pid = entry
                .pid
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            let y = self.y + 2 + line as u16;
            frame.rows.push(PanelRow {
                y,
                text: widths.build_row(
                    inner_width,
                    &entry.session_id,
                    &entry.agent_type,
                    &pid,
                    status.as_str(),
                    &entry.time_label,
                    &entry.command,
                ),
                kind: RowKind::Data {
                    selected: self.focused && i == self.selected_index,
                    status: status.as_str(),
                    status_offset: widths.status_offset(),
                },
            });
            frame.regions.push(HitRegion {
                session_id: entry.session_id.clone(),
                x: self.x + 1,
                y,
                width: inner_width as u16,
                height: 1,
            });
            line += 1;
        }

        if self.last_sessions.is_empty() && max_entries > 0 {
            frame.rows.push(PanelRow {
                y: self.y + 2,
                text: layout::ljust(EMPTY_NOTICE, inner_width),
                kind: RowKind::EmptyNotice,
            });
            line = 1;
        }

        for blank in line..max_entries {
            frame.rows.push(PanelRow {
                y: self.y + 2 + blank as u16,
                text: " ".repeat(inner_width),
                kind: RowKind::Blank,
            });
        }

        self.redraw = false;
        frame
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach to an existing declared session. Returns false when the id has
/// the wrong prefix, the session is gone, or the attach command failed.
pub async fn attach_session(mux: &dyn Multiplexer, session_id: &str) -> bool {
    if !session_id.starts_with(SESSION_ID_PREFIX) {
        return false;
    }
    if !mux.has_session(session_id).await {
        return false;
    }
    mux.attach(session_id).await.is_ok()
}
