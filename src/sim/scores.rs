/// Persistent top-score list.
///
/// ## File format:
///   A JSON array of integers, best first, e.g. `[120, 95, 40]`.
///
/// Reading is forgiving: a missing, unreadable or malformed file yields an
/// empty list (with a warning in the log). Writing happens synchronously on
/// every recorded score.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode scores: {0}")]
    Encode(#[from] serde_json::Error),
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Directory for the score file and the log.
pub fn data_dir() -> PathBuf {
    // 1. Exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // Check if writable (system installs like /usr/games/ won't be)
            let probe = parent.join(".write_test_rickquiz");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    // 2. Per-user data dir (~/.local/share/rickquiz on Linux)
    if let Some(dir) = dirs::data_dir().map(|d| d.join("rickquiz")) {
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Score board
// ══════════════════════════════════════════════════════════════

pub struct ScoreBoard {
    path: PathBuf,
    capacity: usize,
    scores: Vec<u32>,
}

impl ScoreBoard {
    /// Open the board at `path`, tolerating a missing or corrupt file.
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let capacity = capacity.max(1);
        let mut scores = read_scores(&path);
        normalize(&mut scores, capacity);
        ScoreBoard { path, capacity, scores }
    }

    /// Best first, at most `capacity` entries.
    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    /// Record a final score and persist the list.
    /// Zero scores are not recorded; returns whether the list changed.
    pub fn record(&mut self, score: u32) -> Result<bool, ScoreError> {
        if score == 0 {
            return Ok(false);
        }
        let before = self.scores.clone();
        self.scores.push(score);
        normalize(&mut self.scores, self.capacity);
        if self.scores == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&self) -> Result<(), ScoreError> {
        let body = serde_json::to_string(&self.scores)?;
        std::fs::write(&self.path, body).map_err(|source| ScoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn normalize(scores: &mut Vec<u32>, capacity: usize) {
    scores.sort_unstable_by(|a, b| b.cmp(a));
    scores.truncate(capacity);
}

fn read_scores(path: &Path) -> Vec<u32> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!("could not read {}: {e}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<u32>>(&text) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("ignoring malformed score file {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_in(dir: &tempfile::TempDir, capacity: usize) -> ScoreBoard {
        ScoreBoard::open(dir.path().join("top_scores.json"), capacity)
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(board_in(&dir, 5).scores().is_empty());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top_scores.json");
        for junk in ["", "not json", "{\"a\":1}", "[1, -4]", "[\"10\"]"] {
            std::fs::write(&path, junk).unwrap();
            assert!(ScoreBoard::open(&path, 5).scores().is_empty(), "{junk:?}");
        }
    }

    #[test]
    fn keeps_best_scores_descending() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = board_in(&dir, 3);
        for s in [30, 10, 50, 20] {
            board.record(s).unwrap();
        }
        assert_eq!(board.scores(), &[50, 30, 20]);
        // too low to place
        assert!(!board.record(5).unwrap());
        assert!(board.record(40).unwrap());
        assert_eq!(board.scores(), &[50, 40, 30]);
    }

    #[test]
    fn zero_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = board_in(&dir, 5);
        assert!(!board.record(0).unwrap());
        assert!(board.scores().is_empty());
        assert!(!dir.path().join("top_scores.json").exists());
    }

    #[test]
    fn persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let mut board = board_in(&dir, 5);
        board.record(25).unwrap();
        board.record(75).unwrap();

        let text = std::fs::read_to_string(dir.path().join("top_scores.json")).unwrap();
        assert_eq!(text, "[75,25]");
        assert_eq!(board_in(&dir, 5).scores(), &[75, 25]);
    }

    #[test]
    fn oversized_file_is_trimmed_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("top_scores.json");
        std::fs::write(&path, "[1,2,3,4,5,6,7]").unwrap();
        assert_eq!(ScoreBoard::open(&path, 3).scores(), &[7, 6, 5]);
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("top_scores.json");
        let mut board = ScoreBoard::open(&path, 5);
        assert!(matches!(board.record(10), Err(ScoreError::Write { .. })));
    }
}
