use std::path::Path;

use shakmaty::Chess;
use shakmaty_syzygy::{SyzygyError, Tablebase, Wdl};
use tracing::{info, warn};

use crate::position::Position;
use crate::types::{Score, TABLEBASE_WIN};

pub struct SyzygyProber {
    tablebase: Tablebase<Chess>,
}

impl SyzygyProber {
    /// Load tablebases from a directory. Returns `None` if the path does
    /// not exist or holds no usable tables.
    pub fn new(path: &str) -> Option<Self> {
        if !Path::new(path).is_dir() {
            warn!("syzygy path {path} is not a directory");
            return None;
        }

        let mut tablebase = Tablebase::new();
        match tablebase.add_directory(path) {
            Ok(n) if n > 0 => {
                info!("loaded {n} syzygy tables from {path}");
                Some(Self { tablebase })
            }
            Ok(_) => {
                warn!("no syzygy tables found in {path}");
                None
            }
            Err(err) => {
                warn!("failed to read syzygy directory {path}: {err}");
                None
            }
        }
    }

    /// Largest piece count covered by the loaded tables.
    pub fn max_pieces(&self) -> usize {
        self.tablebase.max_pieces()
    }

    /// WDL probe for the side to move, ply-adjusted so nearer conversions
    /// score higher. `None` means no information; the search continues
    /// normally.
    pub fn probe_wdl(&self, pos: &Position) -> Option<Score> {
        match self.tablebase.probe_wdl_after_zeroing(pos.board()) {
            Ok(Wdl::Win) => Some(TABLEBASE_WIN - pos.sply() as Score),
            Ok(Wdl::Loss) => Some(-TABLEBASE_WIN + pos.sply() as Score),
            Ok(Wdl::Draw | Wdl::CursedWin | Wdl::BlessedLoss) => Some(0),
            Err(SyzygyError::MissingTable { .. }) => None,
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_yields_no_prober() {
        assert!(SyzygyProber::new("/nonexistent/path").is_none());
    }

    #[test]
    fn empty_directory_yields_no_prober() {
        let dir = std::env::temp_dir().join("vesper-empty-tb");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(SyzygyProber::new(dir.to_str().unwrap()).is_none());
    }
}
