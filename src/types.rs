use shakmaty::Move;

pub type Score = i32;

/// Upper/lower bound that no real score can reach.
pub const INFINITE_SCORE: Score = 30_000;

/// Base score for checkmate; a mate found at search ply `p` scores
/// `CHECKMATE - p`, so shorter mates score higher.
pub const CHECKMATE: Score = 29_000;

/// Scores at or above this are mate scores.
pub const FORCED_MATE: Score = CHECKMATE - 2 * MAX_PLY as Score;

/// Score for a tablebase-proven win, before ply adjustment.
pub const TABLEBASE_WIN: Score = 20_000;

/// Threshold above which a score is treated as a decided game.
pub const KNOWN_WIN: Score = 19_000;

pub const MAX_PLY: usize = 128;
pub const MAX_SEARCH_DEPTH: i32 = 100;
pub const MAX_HISTORY_SCORE: Score = 8_000;

pub const DEFAULT_HASH_MB: usize = 64;
pub const DEFAULT_THREADS: usize = 1;

/// Aspiration window sizes. On a root fail low/high the window is widened
/// to the next size in order; the last entry must stay infinite.
pub const ASPIRATION_WINDOW: [Score; 6] = [25, 50, 100, 200, 400, INFINITE_SCORE];

/// True for mate-in-N / mated-in-N scores.
pub fn is_mate_score(score: Score) -> bool {
    score.abs() >= FORCED_MATE
}

/// Engine-wide options set over UCI.
pub struct EngineConfig {
    pub hash_mb: usize,
    pub threads: usize,
    pub syzygy_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: DEFAULT_HASH_MB,
            threads: DEFAULT_THREADS,
            syzygy_path: None,
        }
    }
}

/// Outcome of one `go` command.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub ponder_move: Option<Move>,
    pub score: Score,
    pub depth: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_ladder_is_ordered() {
        assert!(KNOWN_WIN < TABLEBASE_WIN);
        assert!(TABLEBASE_WIN < FORCED_MATE);
        assert!(FORCED_MATE < CHECKMATE);
        assert!(CHECKMATE < INFINITE_SCORE);
    }

    #[test]
    fn mate_scores_recognized() {
        assert!(is_mate_score(CHECKMATE - 3));
        assert!(is_mate_score(-(CHECKMATE - 7)));
        assert!(!is_mate_score(TABLEBASE_WIN - 10));
        assert!(!is_mate_score(250));
    }

    #[test]
    fn aspiration_windows_widen() {
        for pair in ASPIRATION_WINDOW.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(ASPIRATION_WINDOW[5], INFINITE_SCORE);
    }
}
