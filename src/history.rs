//! Per-worker move-ordering heuristics: history, killer, and counter-move
//! tables. Workers never share these; the ordering quality lost to
//! duplication is cheaper than cross-thread traffic on every cutoff.

use shakmaty::{Color, Move};

use crate::position::Position;
use crate::see::see_ge;
use crate::types::{Score, MAX_HISTORY_SCORE, MAX_PLY};

fn side_index(color: Color) -> usize {
    match color {
        Color::White => 0,
        Color::Black => 1,
    }
}

fn from_to(m: Move) -> Option<(usize, usize)> {
    m.from().map(|from| (from as usize, m.to() as usize))
}

pub struct Heuristics {
    /// `[side][from][to]`, depth-weighted quiet-move scores.
    history: Box<[[[Score; 64]; 64]; 2]>,
    killers: [[Option<Move>; 2]; MAX_PLY],
    /// Refutation of the previous move, indexed by its `(piece, to)`.
    counters: [[Option<Move>; 64]; 6],
}

impl Heuristics {
    pub fn new() -> Self {
        Self {
            history: Box::new([[[0; 64]; 64]; 2]),
            killers: [[None; 2]; MAX_PLY],
            counters: [[None; 64]; 6],
        }
    }

    pub fn clear(&mut self) {
        self.history = Box::new([[[0; 64]; 64]; 2]);
        self.killers = [[None; 2]; MAX_PLY];
        self.counters = [[None; 64]; 6];
    }

    /// Update history after an improvement at a node. `quiets` holds every
    /// quiet move tried there, in order; the last one is the move that
    /// improved the score and gets rewarded, the rest are penalized.
    /// Captures and en passants are ignored entirely.
    pub fn history_update(&mut self, side: Color, quiets: &[Move], depth: i32) {
        let Some((&good, rest)) = quiets.split_last() else {
            return;
        };
        let s = side_index(side);
        let mut overflow = false;

        for &m in rest {
            if m.is_capture() {
                continue;
            }
            if let Some((from, to)) = from_to(m) {
                self.history[s][from][to] -= depth;
                overflow |= self.history[s][from][to].abs() > MAX_HISTORY_SCORE;
            }
        }

        if !good.is_capture()
            && let Some((from, to)) = from_to(good)
        {
            self.history[s][from][to] += depth;
            overflow |= self.history[s][from][to].abs() > MAX_HISTORY_SCORE;
        }

        if overflow {
            self.rescale();
        }
    }

    /// Halve every entry. Keeps scores bounded while preserving ordering.
    fn rescale(&mut self) {
        for side in self.history.iter_mut() {
            for from in side.iter_mut() {
                for entry in from.iter_mut() {
                    *entry /= 2;
                }
            }
        }
    }

    pub fn history_score(&self, side: Color, m: Move) -> Score {
        match from_to(m) {
            Some((from, to)) => self.history[side_index(side)][from][to],
            None => 0,
        }
    }

    /// Record a killer. Captures that do not lose material are excluded:
    /// they are already ordered early by the capture stages, so a killer
    /// slot would be wasted on them.
    pub fn killer_add(&mut self, pos: &Position, m: Move) {
        if m.is_capture() && see_ge(pos, m, 0) {
            return;
        }
        let sply = pos.sply();
        if sply >= MAX_PLY {
            return;
        }
        if self.killers[sply][0] == Some(m) {
            return;
        }
        self.killers[sply][1] = self.killers[sply][0];
        self.killers[sply][0] = Some(m);
    }

    pub fn killers(&self, sply: usize) -> [Option<Move>; 2] {
        if sply < MAX_PLY {
            self.killers[sply]
        } else {
            [None; 2]
        }
    }

    pub fn is_killer(&self, sply: usize, m: Move) -> bool {
        let k = self.killers(sply);
        k[0] == Some(m) || k[1] == Some(m)
    }

    pub fn counter_add(&mut self, prev: Move, m: Move) {
        self.counters[prev.role() as usize - 1][prev.to() as usize] = Some(m);
    }

    pub fn counter_move(&self, prev: Move) -> Option<Move> {
        self.counters[prev.role() as usize - 1][prev.to() as usize]
    }
}

impl Default for Heuristics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(pos: &Position, uci: &str) -> Move {
        pos.legal_moves()
            .into_iter()
            .find(|m| crate::uci::format_move(m) == uci)
            .unwrap_or_else(|| panic!("no move {uci}"))
    }

    #[test]
    fn history_rewards_last_and_penalizes_rest() {
        let pos = Position::startpos();
        let mut heur = Heuristics::new();
        let a = quiet(&pos, "e2e4");
        let b = quiet(&pos, "d2d4");
        let c = quiet(&pos, "g1f3");

        heur.history_update(Color::White, &[a, b, c], 6);
        assert_eq!(heur.history_score(Color::White, c), 6);
        assert_eq!(heur.history_score(Color::White, a), -6);
        assert_eq!(heur.history_score(Color::White, b), -6);
        assert_eq!(heur.history_score(Color::Black, c), 0);
    }

    #[test]
    fn history_rescales_on_overflow() {
        let pos = Position::startpos();
        let mut heur = Heuristics::new();
        let good = quiet(&pos, "e2e4");
        let bad = quiet(&pos, "d2d4");

        for _ in 0..200 {
            heur.history_update(Color::White, &[bad, good], 50);
        }
        let g = heur.history_score(Color::White, good);
        let b = heur.history_score(Color::White, bad);
        assert!(g <= MAX_HISTORY_SCORE, "score {g} above cap");
        assert!(b >= -MAX_HISTORY_SCORE, "score {b} below cap");
        assert!(g > 0 && b < 0);
    }

    #[test]
    fn killer_slots_shift_without_duplicates() {
        let mut pos = Position::startpos();
        let mut heur = Heuristics::new();
        let a = quiet(&pos, "e2e4");
        let b = quiet(&pos, "d2d4");

        heur.killer_add(&pos, a);
        heur.killer_add(&pos, a);
        let k = heur.killers(0);
        assert_eq!(k[0], Some(a));
        assert_eq!(k[1], None);

        heur.killer_add(&pos, b);
        let k = heur.killers(0);
        assert_eq!(k[0], Some(b));
        assert_eq!(k[1], Some(a));
        assert_ne!(k[0], k[1]);

        // A different ply is independent.
        pos.make_move(a);
        assert!(!heur.is_killer(1, b));
    }

    #[test]
    fn winning_capture_never_becomes_killer() {
        // Queen can take a free pawn on e5.
        let pos = Position::from_fen("4k3/8/8/4p3/8/8/4Q3/4K3 w - - 0 1").unwrap();
        let mut heur = Heuristics::new();
        let capture = quiet(&pos, "e2e5");
        assert!(capture.is_capture());
        heur.killer_add(&pos, capture);
        assert_eq!(heur.killers(0), [None, None]);
    }

    #[test]
    fn counter_move_roundtrip() {
        let mut pos = Position::startpos();
        let mut heur = Heuristics::new();
        let first = quiet(&pos, "e2e4");
        pos.make_move(first);
        let reply = quiet(&pos, "d7d5");

        let prev = pos.previous_move().unwrap();
        heur.counter_add(prev, reply);
        assert_eq!(heur.counter_move(prev), Some(reply));
    }
}
