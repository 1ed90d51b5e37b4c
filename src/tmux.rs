use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::process::Command;

/// Default timeout for read-only tmux probes (2 seconds).
const CMD_TIMEOUT: Duration = Duration::from_secs(2);

/// Longer timeout for pane capture.
const CMD_TIMEOUT_LONG: Duration = Duration::from_secs(5);

/// Run a Command with a timeout, returning its Output.
/// On timeout or spawn failure, returns an anyhow error.
pub async fn run_cmd_timeout(cmd: &mut Command, timeout: Duration) -> Result<std::process::Output> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.context("subprocess failed to execute"),
        Err(_) => bail!("subprocess timed out after {}s", timeout.as_secs()),
    }
}

/// A live multiplexer session: the active pane's pid and its recent output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivePane {
    pub pid: u32,
    pub last_output: String,
}

/// Narrow seam over the terminal multiplexer so the reconciler and panel
/// can be tested against a fake. Attach/create/kill intentionally carry no
/// timeout: they block until the external command finishes.
#[async_trait::async_trait]
pub trait Multiplexer: Send + Sync {
    /// All live sessions with their pane pid and recent output. Best
    /// effort: listing or capture failures yield an empty map or empty
    /// output text, never an error.
    async fn list_sessions(&self) -> HashMap<String, LivePane>;
    async fn has_session(&self, session_id: &str) -> bool;
    async fn attach(&self, session_id: &str) -> Result<()>;
    /// Create a detached session running `command` under `bash -lc`.
    async fn create_detached(&self, session_id: &str, command: &str) -> Result<()>;
    async fn kill_session(&self, session_id: &str) -> Result<()>;
}

/// Real tmux implementation over `tokio::process::Command`.
#[derive(Debug, Default)]
pub struct TmuxMultiplexer;

impl TmuxMultiplexer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Multiplexer for TmuxMultiplexer {
    async fn list_sessions(&self) -> HashMap<String, LivePane> {
        let output = run_cmd_timeout(
            Command::new("tmux").args(["list-sessions", "-F", "#{session_name}:#{pane_pid}"]),
            CMD_TIMEOUT,
        )
        .await;

        let output = match output {
            Ok(o) => o,
            Err(_) => return HashMap::new(),
        };

        // tmux exits non-zero when no server is running - that's just "no
        // sessions", not an error.
        if !output.status.success() {
            return HashMap::new();
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let named: Vec<(String, u32)> = stdout.lines().filter_map(parse_session_line).collect();

        let captures = futures::future::join_all(
            named.iter().map(|(name, _)| capture_recent_output(name)),
        )
        .await;

        named
            .into_iter()
            .zip(captures)
            .map(|((name, pid), last_output)| (name, LivePane { pid, last_output }))
            .collect()
    }

    async fn has_session(&self, session_id: &str) -> bool {
        let output = run_cmd_timeout(
            Command::new("tmux").args(["has-session", "-t", session_id]),
            CMD_TIMEOUT,
        )
        .await;
        matches!(output, Ok(o) if o.status.success())
    }

    async fn attach(&self, session_id: &str) -> Result<()> {
        // Blocks until the user detaches; inherits the terminal.
        let status = Command::new("tmux")
            .args(["attach", "-t", session_id])
            .status()
            .await
            .context("failed to run tmux attach")?;
        if !status.success() {
            bail!("tmux attach failed for '{session_id}'");
        }
        Ok(())
    }

    async fn create_detached(&self, session_id: &str, command: &str) -> Result<()> {
        let pane_command = format!("bash -lc {}", shell_quote(command));
        let status = Command::new("tmux")
            .args(["new-session", "-d", "-s", session_id, &pane_command])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .context("failed to run tmux new-session")?;
        if !status.success() {
            bail!("tmux new-session failed for '{session_id}'");
        }
        Ok(())
    }

    async fn kill_session(&self, session_id: &str) -> Result<()> {
        let status = Command::new("tmux")
            .args(["kill-session", "-t", session_id])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .context("failed to run tmux kill-session")?;
        if !status.success() {
            bail!("tmux kill-session failed for '{session_id}'");
        }
        Ok(())
    }
}

/// Parse one `name:pid` listing line. The split is on the first `:`;
/// malformed or empty fields skip the line only.
fn parse_session_line(line: &str) -> Option<(String, u32)> {
    let (name, pid) = line.split_once(':')?;
    if name.is_empty() {
        return None;
    }
    let pid: u32 = pid.trim().parse().ok()?;
    Some((name.to_string(), pid))
}

/// Capture the last ~10 lines of a session's active pane. Best effort:
/// any failure yields an empty string.
async fn capture_recent_output(session_id: &str) -> String {
    let output = run_cmd_timeout(
        Command::new("tmux").args(["capture-pane", "-t", session_id, "-p", "-J", "-S", "-10"]),
        CMD_TIMEOUT_LONG,
    )
    .await;
    match output {
        Ok(o) if o.status.success() => String::from_utf8_lossy(&o.stdout).into_owned(),
        _ => String::new(),
    }
}

/// Single-quote a value for embedding in a shell command line. Embedded
/// single quotes use the `'"'"'` escape.
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push_str("'\"'\"'");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

/// In-memory multiplexer for tests: sessions live in a map, and every
/// attach/create/kill call is recorded.
#[cfg(test)]
pub struct FakeMultiplexer {
    panes: std::sync::Mutex<HashMap<String, LivePane>>,
    pub fail_create: bool,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl FakeMultiplexer {
    pub fn new() -> Self {
        Self {
            panes: std::sync::Mutex::new(HashMap::new()),
            fail_create: false,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_pane(self, session_id: &str, pid: u32, last_output: &str) -> Self {
        self.panes.lock().unwrap().insert(
            session_id.to_string(),
            LivePane {
                pid,
                last_output: last_output.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl Multiplexer for FakeMultiplexer {
    async fn list_sessions(&self) -> HashMap<String, LivePane> {
        self.panes.lock().unwrap().clone()
    }

    async fn has_session(&self, session_id: &str) -> bool {
        self.panes.lock().unwrap().contains_key(session_id)
    }

    async fn attach(&self, session_id: &str) -> Result<()> {
        self.record(format!("attach:{session_id}"));
        if self.panes.lock().unwrap().contains_key(session_id) {
            Ok(())
        } else {
            bail!("no such session '{session_id}'")
        }
    }

    async fn create_detached(&self, session_id: &str, command: &str) -> Result<()> {
        self.record(format!("create:{session_id}:{command}"));
        if self.fail_create {
            bail!("refused to create '{session_id}'");
        }
        self.panes.lock().unwrap().insert(
            session_id.to_string(),
            LivePane {
                pid: 1,
                last_output: String::new(),
            },
        );
        Ok(())
    }

    async fn kill_session(&self, session_id: &str) -> Result<()> {
        self.record(format!("kill:{session_id}"));
        match self.panes.lock().unwrap().remove(session_id) {
            Some(_) => Ok(()),
            None => bail!("no such session '{session_id}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_session_line ────────────────────────────────────────────

    #[test]
    fn parses_name_pid_pair() {
        assert_eq!(
            parse_session_line("agent-claude-1:4242"),
            Some(("agent-claude-1".to_string(), 4242))
        );
    }

    #[test]
    fn splits_on_first_colon_only() {
        // A stray colon in the pid field makes the pid unparsable → skip.
        assert_eq!(parse_session_line("name:12:34"), None);
    }

    #[test]
    fn skips_malformed_lines() {
        assert_eq!(parse_session_line(""), None);
        assert_eq!(parse_session_line("no-colon"), None);
        assert_eq!(parse_session_line(":123"), None);
        assert_eq!(parse_session_line("name:"), None);
        assert_eq!(parse_session_line("name:not-a-pid"), None);
    }

    // ── shell_quote ───────────────────────────────────────────────────

    #[test]
    fn quotes_plain_value() {
        assert_eq!(shell_quote("claude --code"), "'claude --code'");
    }

    #[test]
    fn quotes_empty_value() {
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn escapes_embedded_single_quotes() {
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote("''"), r#"''"'"''"'"''"#);
    }

    // ── FakeMultiplexer ───────────────────────────────────────────────

    #[tokio::test]
    async fn fake_tracks_create_and_kill() {
        let fake = FakeMultiplexer::new();
        assert!(!fake.has_session("agent-x").await);

        fake.create_detached("agent-x", "claude").await.unwrap();
        assert!(fake.has_session("agent-x").await);

        fake.kill_session("agent-x").await.unwrap();
        assert!(!fake.has_session("agent-x").await);
        assert!(fake.kill_session("agent-x").await.is_err());

        assert_eq!(
            fake.calls(),
            ["create:agent-x:claude", "kill:agent-x", "kill:agent-x"]
        );
    }
}
