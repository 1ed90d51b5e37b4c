use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::session::{match_agent_keyword, SessionRecord};

/// Processes whose command line contains this token are the dashboard
/// itself (or a child of it) and are never reported as agents.
pub const SELF_MARKER: &str = "agentdeck";

/// Scan a `/proc`-shaped directory for agent processes not already claimed
/// by a declared session. This is a filter, not a general process lister:
/// only entries matching an agent keyword are returned.
///
/// Every read is best effort; unreadable entries are skipped.
pub fn scan_orphans(proc_root: &Path, exclude_pids: &HashSet<u32>) -> Vec<SessionRecord> {
    let mut found = Vec::new();
    let Ok(entries) = fs::read_dir(proc_root) else {
        return found;
    };

    for entry in entries.flatten() {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        let Ok(pid) = name.parse::<u32>() else { continue };
        if exclude_pids.contains(&pid) {
            continue;
        }

        let dir = entry.path();
        let cmdline = read_proc_text(&dir.join("cmdline"));
        let comm = read_proc_text(&dir.join("comm"));

        if cmdline.contains(SELF_MARKER) {
            continue;
        }

        let Some(agent_type) =
            match_agent_keyword(&cmdline).or_else(|| match_agent_keyword(&comm))
        else {
            continue;
        };

        let command = if cmdline.is_empty() { comm } else { cmdline };
        found.push(SessionRecord {
            session_id: format!("proc-{pid}"),
            agent_type: agent_type.to_string(),
            time_label: "live".to_string(),
            command,
            pid: Some(pid),
            running: true,
            waiting: false,
        });
    }

    found
}

/// Read a proc text file, mapping the NUL separators of `cmdline` to
/// spaces. Missing or unreadable files read as empty.
fn read_proc_text(path: &Path) -> String {
    let Ok(bytes) = fs::read(path) else {
        return String::new();
    };
    let text: String = String::from_utf8_lossy(&bytes)
        .chars()
        .map(|c| if c == '\0' { ' ' } else { c })
        .collect();
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build a fake proc entry: a numeric dir with cmdline/comm files.
    fn add_process(root: &TempDir, pid: u32, cmdline: &[u8], comm: &str) {
        let dir = root.path().join(pid.to_string());
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("cmdline"), cmdline).unwrap();
        fs::write(dir.join("comm"), format!("{comm}\n")).unwrap();
    }

    #[test]
    fn finds_agent_processes_by_cmdline() {
        let root = TempDir::new().unwrap();
        add_process(&root, 101, b"/usr/bin/claude\0--code\0", "node");
        add_process(&root, 102, b"bash\0-lc\0sleep 5\0", "bash");

        let found = scan_orphans(root.path(), &HashSet::new());
        assert_eq!(found.len(), 1);
        let rec = &found[0];
        assert_eq!(rec.session_id, "proc-101");
        assert_eq!(rec.agent_type, "claude");
        assert_eq!(rec.time_label, "live");
        assert_eq!(rec.command, "/usr/bin/claude --code");
        assert_eq!(rec.pid, Some(101));
        assert!(rec.running);
        assert!(!rec.waiting);
    }

    #[test]
    fn falls_back_to_comm_when_cmdline_is_empty() {
        let root = TempDir::new().unwrap();
        add_process(&root, 200, b"", "gemini");

        let found = scan_orphans(root.path(), &HashSet::new());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].agent_type, "gemini");
        assert_eq!(found[0].command, "gemini");
    }

    #[test]
    fn skips_excluded_pids() {
        let root = TempDir::new().unwrap();
        add_process(&root, 300, b"codex\0run\0", "codex");
        add_process(&root, 301, b"codex\0run\0", "codex");

        let exclude: HashSet<u32> = [300].into();
        let found = scan_orphans(root.path(), &exclude);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pid, Some(301));
    }

    #[test]
    fn skips_own_marker() {
        let root = TempDir::new().unwrap();
        add_process(&root, 400, b"agentdeck\0--watch\0claude\0", "agentdeck");

        assert!(scan_orphans(root.path(), &HashSet::new()).is_empty());
    }

    #[test]
    fn skips_non_numeric_entries() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("self");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("cmdline"), b"claude\0").unwrap();
        fs::write(dir.join("comm"), "claude\n").unwrap();
        // Sign prefixes parse as u32 but are not proc pids.
        let dir = root.path().join("+12");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("cmdline"), b"claude\0").unwrap();

        assert!(scan_orphans(root.path(), &HashSet::new()).is_empty());
    }

    #[test]
    fn tolerates_missing_proc_files() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("500")).unwrap();

        assert!(scan_orphans(root.path(), &HashSet::new()).is_empty());
    }

    #[test]
    fn missing_root_yields_empty() {
        let root = TempDir::new().unwrap();
        let gone = root.path().join("nope");
        assert!(scan_orphans(&gone, &HashSet::new()).is_empty());
    }

    #[test]
    fn keyword_priority_applies_to_cmdline_before_comm() {
        let root = TempDir::new().unwrap();
        add_process(&root, 600, b"wrapper\0", "codex");

        let found = scan_orphans(root.path(), &HashSet::new());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].agent_type, "codex");
    }
}
