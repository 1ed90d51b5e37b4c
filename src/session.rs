use std::fmt;

/// Session ids declared through the log file carry this prefix; everything
/// after it (up to the next `-`) names the agent that owns the session.
pub const SESSION_ID_PREFIX: &str = "agent-";

/// Known agent keywords, in match priority order. First hit wins when a
/// process command line mentions more than one.
pub const AGENT_KEYWORDS: &[&str] = &["claude", "codex", "gemini"];

/// One logical agent session, merged from the declared-session log, live
/// tmux sessions, and the orphan process scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Externally assigned id (`agent-…`) or `proc-<pid>` for orphans.
    pub session_id: String,
    /// Display/capability hint only, never a security decision.
    pub agent_type: String,
    /// `HH:MM:SS`-shaped label, or the literal `live` for orphans.
    pub time_label: String,
    /// Best-known command line; may be empty.
    pub command: String,
    pub pid: Option<u32>,
    pub running: bool,
    pub waiting: bool,
}

impl SessionRecord {
    pub fn status_label(&self) -> StatusLabel {
        if self.running {
            if self.waiting {
                StatusLabel::Waiting
            } else {
                StatusLabel::Running
            }
        } else {
            StatusLabel::Stopped
        }
    }
}

/// Display status derived from the `running`/`waiting` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Running,
    Waiting,
    Stopped,
}

impl StatusLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusLabel::Running => "Running",
            StatusLabel::Waiting => "Waiting",
            StatusLabel::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the agent type from a declared session id.
///
/// `agent-claude-42` → `claude`; `agent-foo` → `foo`; anything without the
/// `agent-` prefix → `unknown`.
pub fn extract_agent_type(session_id: &str) -> String {
    let Some(rest) = session_id.strip_prefix(SESSION_ID_PREFIX) else {
        return "unknown".to_string();
    };
    match rest.split_once('-') {
        Some((agent, _)) => agent.to_string(),
        None => rest.to_string(),
    }
}

/// Turn a declared timestamp into an 8-character time-of-day label.
///
/// Prefers the 8 characters after an ISO-8601 `T`; falls back to the
/// trailing 8 characters, then to the raw timestamp verbatim.
pub fn format_time_label(timestamp: &str) -> String {
    if let Some(t) = timestamp.find('T') {
        if let Some(tail) = timestamp.get(t + 1..t + 9) {
            return tail.to_string();
        }
    }
    if timestamp.len() >= 8 {
        if let Some(tail) = timestamp.get(timestamp.len() - 8..) {
            return tail.to_string();
        }
    }
    timestamp.to_string()
}

/// Case-insensitive agent keyword match over free-form text (a command line
/// or a short process name). Check order is fixed by `AGENT_KEYWORDS`.
pub fn match_agent_keyword(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    AGENT_KEYWORDS.iter().find(|kw| lower.contains(**kw)).copied()
}
