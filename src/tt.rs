//! Shared transposition table. Entries are two `AtomicU64` words with an
//! XOR check word, so concurrent readers either see a whole entry or
//! reject it; no locks anywhere on the probe/store path.
//!
//! Word layout:
//!
//! ```text
//! word0: [63:32] key (upper hash bits) | [31:27] generation
//!        [26:24] flag | [23:16] depth | [15:0] packed move
//! word1: [63:32] check = key ^ lower32(word0) | [31:16] score | [15:0] unused
//! ```

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use shakmaty::Move;

use crate::types::{Score, FORCED_MATE};

/// Bound kind of a stored score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TtFlag {
    /// Score was at most alpha (upper bound).
    Alpha = 1,
    /// Score was at least beta (lower bound).
    Beta = 2,
    /// Score is exact.
    Exact = 3,
}

impl TtFlag {
    fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            1 => Some(TtFlag::Alpha),
            2 => Some(TtFlag::Beta),
            3 => Some(TtFlag::Exact),
            _ => None,
        }
    }
}

/// A move squeezed into 16 bits for TT storage: from, to, promotion role.
/// Resolved back to a real `Move` by matching against generated moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedMove(u16);

impl PackedMove {
    pub const NONE: PackedMove = PackedMove(0);

    pub fn pack(m: Move) -> PackedMove {
        let from = m.from().map_or(0u16, |sq| sq as u16);
        let to = m.to() as u16;
        let promo = m.promotion().map_or(0u16, |r| r as u16);
        PackedMove(from | (to << 6) | (promo << 12))
    }

    pub fn matches(self, m: Move) -> bool {
        self != Self::NONE && Self::pack(m) == self
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Lookup outcome: a move hint whenever the entry matched, plus a cutoff
/// score when the stored bound proves the caller's window.
#[derive(Debug, Clone, Copy)]
pub struct TtLookup {
    pub hint: PackedMove,
    pub cutoff: Option<Score>,
}

impl TtLookup {
    const MISS: TtLookup = TtLookup {
        hint: PackedMove::NONE,
        cutoff: None,
    };
}

/// Mate scores are stored relative to the node they were found at, so a
/// hit at a different ply still reports the right mate distance.
fn score_to_tt(score: Score, sply: usize) -> i16 {
    let adjusted = if score >= FORCED_MATE {
        score + sply as Score
    } else if score <= -FORCED_MATE {
        score - sply as Score
    } else {
        score
    };
    adjusted as i16
}

fn score_from_tt(raw: i16, sply: usize) -> Score {
    let score = raw as Score;
    if score >= FORCED_MATE {
        score - sply as Score
    } else if score <= -FORCED_MATE {
        score + sply as Score
    } else {
        score
    }
}

struct AtomicEntry {
    word0: AtomicU64,
    word1: AtomicU64,
}

impl AtomicEntry {
    const fn empty() -> Self {
        Self {
            word0: AtomicU64::new(0),
            word1: AtomicU64::new(0),
        }
    }

    fn pack_word0(key32: u32, generation: u8, flag: TtFlag, depth: u8, m: PackedMove) -> u64 {
        ((key32 as u64) << 32)
            | (((generation & 0x1F) as u64) << 27)
            | (((flag as u8) as u64) << 24)
            | ((depth as u64) << 16)
            | (m.0 as u64)
    }

    fn pack_word1(w0: u64, score: i16) -> u64 {
        let check = ((w0 >> 32) as u32) ^ (w0 as u32);
        ((check as u64) << 32) | (((score as u16) as u64) << 16)
    }

    /// Load and validate; `None` on key mismatch or torn write.
    fn load(&self, hash: u64) -> Option<(u64, u64)> {
        let w0 = self.word0.load(Ordering::Relaxed);
        let w1 = self.word1.load(Ordering::Relaxed);
        let check = ((w0 >> 32) as u32) ^ (w0 as u32);
        if check != (w1 >> 32) as u32 {
            return None;
        }
        if (w0 >> 32) as u32 != (hash >> 32) as u32 {
            return None;
        }
        Some((w0, w1))
    }
}

pub struct TranspositionTable {
    entries: Box<[AtomicEntry]>,
    mask: u64,
    generation: AtomicU8,
}

impl TranspositionTable {
    /// Size in megabytes, rounded down to a power-of-two entry count.
    pub fn new(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        let count = (bytes / std::mem::size_of::<AtomicEntry>())
            .next_power_of_two()
            >> 1;
        let count = count.max(1024);
        let entries: Box<[AtomicEntry]> = (0..count).map(|_| AtomicEntry::empty()).collect();
        Self {
            entries,
            mask: (count - 1) as u64,
            generation: AtomicU8::new(0),
        }
    }

    /// Advance the aging generation; call once per `go`.
    pub fn new_generation(&self) {
        let g = self.generation.load(Ordering::Relaxed);
        self.generation
            .store(g.wrapping_add(1) & 0x1F, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        for entry in self.entries.iter() {
            entry.word0.store(0, Ordering::Relaxed);
            entry.word1.store(0, Ordering::Relaxed);
        }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Probe for `hash`. A stored entry cuts when its depth covers the
    /// request and its bound proves the `(alpha, beta)` window: exact
    /// always, lower bounds at `score >= beta`, upper bounds at
    /// `score <= alpha`. The move hint is returned either way.
    pub fn lookup(
        &self,
        hash: u64,
        depth: i32,
        alpha: Score,
        beta: Score,
        sply: usize,
    ) -> TtLookup {
        let entry = &self.entries[(hash & self.mask) as usize];
        let Some((w0, w1)) = entry.load(hash) else {
            return TtLookup::MISS;
        };
        let Some(flag) = TtFlag::from_bits((w0 >> 24) as u8) else {
            return TtLookup::MISS;
        };

        let hint = PackedMove((w0 & 0xFFFF) as u16);
        let stored_depth = ((w0 >> 16) & 0xFF) as i32;
        let score = score_from_tt(((w1 >> 16) & 0xFFFF) as u16 as i16, sply);

        let cutoff = if stored_depth >= depth {
            match flag {
                TtFlag::Exact => Some(score),
                TtFlag::Beta if score >= beta => Some(score),
                TtFlag::Alpha if score <= alpha => Some(score),
                _ => None,
            }
        } else {
            None
        };

        TtLookup { hint, cutoff }
    }

    /// Store with depth-preferred replacement and aging: empty slots,
    /// stale generations, and shallower entries are overwritten; a deeper
    /// entry from the current generation survives unless the new bound is
    /// exact.
    pub fn store(
        &self,
        hash: u64,
        m: PackedMove,
        depth: i32,
        score: Score,
        flag: TtFlag,
        sply: usize,
    ) {
        let entry = &self.entries[(hash & self.mask) as usize];
        let generation = self.generation.load(Ordering::Relaxed);

        let existing = entry.word0.load(Ordering::Relaxed);
        let existing_flag = TtFlag::from_bits((existing >> 24) as u8);
        let existing_generation = ((existing >> 27) & 0x1F) as u8;
        let existing_depth = ((existing >> 16) & 0xFF) as i32;

        let replace = existing_flag.is_none()
            || existing_generation != generation
            || depth >= existing_depth
            || flag == TtFlag::Exact;
        if !replace {
            return;
        }

        let depth = depth.clamp(0, u8::MAX as i32) as u8;
        let w0 = AtomicEntry::pack_word0((hash >> 32) as u32, generation, flag, depth, m);
        let w1 = AtomicEntry::pack_word1(w0, score_to_tt(score, sply));
        entry.word0.store(w0, Ordering::Relaxed);
        entry.word1.store(w1, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}
