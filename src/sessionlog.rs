use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment override for the declared-session log location.
pub const LOG_PATH_ENV: &str = "AGENT_SESSIONS_LOG";

/// Default log location under the user's home directory.
pub const DEFAULT_LOG_PATH: &str = "~/.agent_sessions.log";

/// Field separator in the declared-session log. The command field is
/// everything after the second occurrence and may contain the separator.
const SEPARATOR: &str = " :: ";

/// One line of the declared-session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSession {
    pub timestamp: String,
    pub session_id: String,
    pub command: String,
}

/// Resolve the log path: env override, else the default, with `~` expanded.
pub fn resolve_log_path() -> PathBuf {
    let raw = std::env::var(LOG_PATH_ENV).unwrap_or_else(|_| DEFAULT_LOG_PATH.to_string());
    expand_home(&raw)
}

/// Expand a leading `~` or `~/` against the user's home directory. Paths
/// like `~other/…` are left untouched.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            if rest.is_empty() {
                return home;
            }
            if let Some(rel) = rest.strip_prefix('/') {
                return home.join(rel);
            }
        }
    }
    PathBuf::from(path)
}

/// Parse one log line of the shape `<timestamp> :: <session_id> :: <command>`.
/// Returns `None` for lines that don't match; the command keeps any further
/// ` :: ` occurrences verbatim.
pub fn parse_log_line(line: &str) -> Option<DeclaredSession> {
    let (timestamp, rest) = line.split_once(SEPARATOR)?;
    let (session_id, command) = rest.split_once(SEPARATOR)?;
    Some(DeclaredSession {
        timestamp: timestamp.to_string(),
        session_id: session_id.to_string(),
        command: command.to_string(),
    })
}

/// Read every well-formed record from the log, in file order. Malformed
/// lines are skipped silently; an unreadable file is an `Err` so the
/// reconciler can distinguish "no log" from "empty log".
pub fn read_declared_sessions(path: &Path) -> io::Result<Vec<DeclaredSession>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.lines().filter_map(parse_log_line).collect())
}

/// Append one declared-session record. Producer side of the same format,
/// used by the `log` subcommand.
pub fn append_session(path: &Path, record: &DeclaredSession) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open session log at {}", path.display()))?;
    writeln!(
        file,
        "{}{SEPARATOR}{}{SEPARATOR}{}",
        record.timestamp, record.session_id, record.command
    )
    .context("failed to append session record")?;
    Ok(())
}
