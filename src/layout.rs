//! Deterministic column layout for the session panel.
//!
//! All widths are derived from the inner width alone, so a given terminal
//! size always produces the same frame. Columns degrade in two fixed
//! steps when the command column would drop below a readable minimum.

/// Narrowest useful command column; below this, columns start dropping.
const MIN_COMMAND_WIDTH: isize = 8;

/// Per-column character widths. A width of zero hides the column (and its
/// header label) entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidths {
    pub session: usize,
    pub agent: usize,
    pub pid: usize,
    pub status: usize,
    pub time: usize,
    pub command: usize,
}

impl ColumnWidths {
    /// Derive widths for a panel inner width, degrading gracefully:
    /// first the pid and time columns go, then the agent type column.
    pub fn for_inner_width(inner_width: usize) -> Self {
        let session = (inner_width / 4).clamp(10, 18);
        let mut agent = 6usize;
        let mut pid = 6usize;
        let status = 7usize;
        let mut time = 8usize;

        let mut command =
            inner_width as isize - (session + agent + pid + status + time + 4) as isize;
        if command < MIN_COMMAND_WIDTH {
            pid = 0;
            time = 0;
            command = inner_width as isize - (session + agent + status + 2) as isize;
        }
        if command < MIN_COMMAND_WIDTH {
            agent = 0;
            command = inner_width as isize - (session + status + 1) as isize;
        }

        Self {
            session,
            agent,
            pid,
            status,
            time,
            command: command.max(0) as usize,
        }
    }

    /// Character offset of the status field within a built row, used to
    /// overlay the colored status badge.
    pub fn status_offset(&self) -> usize {
        let mut offset = self.session + 1;
        if self.agent > 0 {
            offset += self.agent + 1;
        }
        if self.pid > 0 {
            offset += self.pid + 1;
        }
        offset
    }

    /// Build one row: fields justified to their columns, single-space
    /// separated, padded and truncated to the inner width.
    pub fn build_row(
        &self,
        inner_width: usize,
        session: &str,
        agent: &str,
        pid: &str,
        status: &str,
        time: &str,
        command: &str,
    ) -> String {
        let mut row = String::with_capacity(inner_width + 8);
        row.push_str(&ljust(session, self.session));
        row.push(' ');
        if self.agent > 0 {
            row.push_str(&ljust(agent, self.agent));
            row.push(' ');
        }
        if self.pid > 0 {
            row.push_str(&rjust(pid, self.pid));
            row.push(' ');
        }
        row.push_str(&ljust(status, self.status));
        if self.time > 0 {
            row.push(' ');
            row.push_str(&ljust(time, self.time));
        }
        if self.command > 0 {
            row.push(' ');
            row.push_str(&ljust(command, self.command));
        }
        ljust(&row, inner_width)
    }

    /// The header row uses the same layout as data rows, so hidden
    /// columns lose their labels too.
    pub fn header_row(&self, inner_width: usize) -> String {
        self.build_row(inner_width, "Session:", "Type:", "Pid:", "Status:", "Time:", "Command:")
    }
}

/// Left-justify and truncate to an exact character width.
pub(crate) fn ljust(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let used = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

/// Right-justify and truncate to an exact character width.
fn rjust(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    let used = truncated.chars().count();
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(' ').take(width - used));
    out.push_str(&truncated);
    out
}

/// Kind of a rendered panel row, with enough detail for styled drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Data {
        selected: bool,
        status: &'static str,
        status_offset: usize,
    },
    EmptyNotice,
    Blank,
}

/// One screen row of the rendered panel, positioned in absolute terminal
/// coordinates (the panel's border row is above `y` for the header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelRow {
    pub y: u16,
    pub text: String,
    pub kind: RowKind,
}

/// Clickable screen rectangle registered for one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitRegion {
    pub session_id: String,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl HitRegion {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        row >= self.y
            && row < self.y + self.height
            && column >= self.x
            && column < self.x + self.width
    }
}

/// Output of one panel draw: ordered rows plus this frame's hit regions.
/// Regions fully replace the previous frame's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFrame {
    pub rows: Vec<PanelRow>,
    pub regions: Vec<HitRegion>,
}
