use std::collections::HashSet;
use std::path::PathBuf;

use crate::procscan;
use crate::session::{extract_agent_type, format_time_label, SessionRecord};
use crate::sessionlog;
use crate::tmux::Multiplexer;
use crate::waiting::is_waiting_for_input;

/// Reconciled lists keep only the most recently appended entries.
pub const MAX_SESSIONS: usize = 25;

/// Merges the declared-session log, live multiplexer sessions, and the
/// orphan process scan into one de-duplicated session list, memoized
/// between forced refreshes.
pub struct Discovery {
    /// Fixed log path override; `None` resolves env/default per pass.
    log_path: Option<PathBuf>,
    proc_root: PathBuf,
    cache: Vec<SessionRecord>,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery {
    pub fn new() -> Self {
        Self {
            log_path: None,
            proc_root: PathBuf::from("/proc"),
            cache: Vec::new(),
        }
    }

    /// Discovery against explicit data-source locations (tests, tooling).
    pub fn with_paths(log_path: PathBuf, proc_root: PathBuf) -> Self {
        Self {
            log_path: Some(log_path),
            proc_root,
            cache: Vec::new(),
        }
    }

    /// One discovery pass. When not forced and a non-empty cached result
    /// exists, the cache is returned unchanged; otherwise the list is
    /// rebuilt from scratch.
    ///
    /// An unreadable log is the normal "no data" outcome: the cache is
    /// cleared and an empty list returned, never an error.
    pub async fn discover(&mut self, mux: &dyn Multiplexer, force_refresh: bool) -> Vec<SessionRecord> {
        if !force_refresh && !self.cache.is_empty() {
            return self.cache.clone();
        }

        let log_path = self
            .log_path
            .clone()
            .unwrap_or_else(sessionlog::resolve_log_path);
        let declared = match sessionlog::read_declared_sessions(&log_path) {
            Ok(entries) => entries,
            Err(_) => {
                self.cache.clear();
                return Vec::new();
            }
        };

        let live = mux.list_sessions().await;

        let mut sessions = Vec::with_capacity(declared.len());
        let mut claimed_pids: HashSet<u32> = HashSet::new();
        for entry in declared {
            let mut record = SessionRecord {
                agent_type: extract_agent_type(&entry.session_id),
                time_label: format_time_label(&entry.timestamp),
                session_id: entry.session_id,
                command: entry.command,
                pid: None,
                running: false,
                waiting: false,
            };
            if let Some(pane) = live.get(&record.session_id) {
                record.running = true;
                record.pid = Some(pane.pid);
                claimed_pids.insert(pane.pid);
                record.waiting = is_waiting_for_input(&pane.last_output);
            }
            sessions.push(record);
        }

        sessions.extend(procscan::scan_orphans(&self.proc_root, &claimed_pids));

        // Cap after concatenation, dropping from the front. Declared
        // entries beyond the cap fall away before newer orphans do.
        if sessions.len() > MAX_SESSIONS {
            sessions.drain(..sessions.len() - MAX_SESSIONS);
        }

        self.cache = sessions;
        self.cache.clone()
    }
}
