//! Staged move selection. Moves are generated once per node, then handed
//! out in phases: TT move, winning captures, killers, counter-move,
//! history-ordered quiets, losing captures. Quiescence mode keeps only
//! the capture phases unless the side to move is in check, in which case
//! the whole evasion set is searched.

use arrayvec::ArrayVec;
use shakmaty::Move;

use crate::history::Heuristics;
use crate::position::Position;
use crate::pst::MVV_VALUE;
use crate::see::see_ge;
use crate::tt::PackedMove;
use crate::types::Score;

const MAX_MOVES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    TtMove,
    GoodCaptures,
    KillerOne,
    KillerTwo,
    Counter,
    Quiets,
    BadCaptures,
    Done,
}

struct ScoredMove {
    mv: Move,
    score: Score,
    yielded: bool,
}

pub struct MovePicker {
    phase: Phase,
    quiescence: bool,
    in_check: bool,
    tt_move: Option<Move>,
    tt_yielded: bool,
    killers: [Option<Move>; 2],
    counter: Option<Move>,
    good_captures: ArrayVec<ScoredMove, MAX_MOVES>,
    quiets: ArrayVec<ScoredMove, MAX_MOVES>,
    bad_captures: ArrayVec<ScoredMove, MAX_MOVES>,
}

fn mvv_lva(m: Move) -> Score {
    let victim = m.capture().map_or(0, |r| MVV_VALUE[r as usize - 1]);
    let attacker = m.role() as Score;
    let promo_bonus = if m.is_promotion() { 9_000 } else { 0 };
    victim * 10 - attacker + promo_bonus
}

impl MovePicker {
    /// Build the selector for one node. In quiescence mode only captures
    /// are considered out of check; in check, all evasions.
    pub fn init_node(
        pos: &Position,
        heur: &Heuristics,
        quiescence: bool,
        in_check: bool,
    ) -> Self {
        let stm = pos.side_to_move();
        let sply = pos.sply();
        let counter = pos.previous_move().and_then(|prev| heur.counter_move(prev));

        let mut picker = Self {
            phase: Phase::TtMove,
            quiescence,
            in_check,
            tt_move: None,
            tt_yielded: false,
            killers: heur.killers(sply),
            counter,
            good_captures: ArrayVec::new(),
            quiets: ArrayVec::new(),
            bad_captures: ArrayVec::new(),
        };

        let keep_quiets = !quiescence || in_check;
        for m in pos.legal_moves() {
            if m.is_capture() {
                if see_ge(pos, m, 0) {
                    picker.good_captures.push(ScoredMove {
                        mv: m,
                        score: mvv_lva(m),
                        yielded: false,
                    });
                } else {
                    picker.bad_captures.push(ScoredMove {
                        mv: m,
                        score: mvv_lva(m),
                        yielded: false,
                    });
                }
            } else if keep_quiets {
                picker.quiets.push(ScoredMove {
                    mv: m,
                    score: heur.history_score(stm, m),
                    yielded: false,
                });
            }
        }
        picker
    }

    /// Resolve a TT move hint against this node's legal moves.
    pub fn set_tt_move(&mut self, hint: PackedMove) {
        if hint.is_none() {
            return;
        }
        self.tt_move = self
            .good_captures
            .iter()
            .chain(self.quiets.iter())
            .chain(self.bad_captures.iter())
            .map(|sm| sm.mv)
            .find(|&m| hint.matches(m));
    }

    pub fn tt_move(&self) -> Option<Move> {
        self.tt_move
    }

    /// Phase the most recent move came from.
    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    fn pick_best(list: &mut ArrayVec<ScoredMove, MAX_MOVES>, skip: &[Option<Move>]) -> Option<Move> {
        let mut best: Option<usize> = None;
        for (i, sm) in list.iter().enumerate() {
            if sm.yielded || skip.contains(&Some(sm.mv)) {
                continue;
            }
            if best.is_none_or(|b| sm.score > list[b].score) {
                best = Some(i);
            }
        }
        best.map(|i| {
            list[i].yielded = true;
            list[i].mv
        })
    }

    /// Yield the next move. `current_phase` names the stage the returned
    /// move came from until the next call.
    pub fn next_move(&mut self) -> Option<Move> {
        loop {
            match self.phase {
                Phase::TtMove => {
                    if !self.tt_yielded {
                        self.tt_yielded = true;
                        if let Some(m) = self.tt_move {
                            return Some(m);
                        }
                    }
                    self.phase = Phase::GoodCaptures;
                }
                Phase::GoodCaptures => {
                    if let Some(m) = Self::pick_best(&mut self.good_captures, &[self.tt_move]) {
                        return Some(m);
                    }
                    self.phase = if self.quiescence && !self.in_check {
                        Phase::BadCaptures
                    } else {
                        Phase::KillerOne
                    };
                }
                Phase::KillerOne => {
                    let k = self.killers[0];
                    if k != self.tt_move
                        && let Some(m) = self.take_quiet(k)
                    {
                        return Some(m);
                    }
                    self.phase = Phase::KillerTwo;
                }
                Phase::KillerTwo => {
                    let k = self.killers[1];
                    if k != self.tt_move
                        && k != self.killers[0]
                        && let Some(m) = self.take_quiet(k)
                    {
                        return Some(m);
                    }
                    self.phase = Phase::Counter;
                }
                Phase::Counter => {
                    let c = self.counter;
                    if c != self.tt_move
                        && c != self.killers[0]
                        && c != self.killers[1]
                        && let Some(m) = self.take_quiet(c)
                    {
                        return Some(m);
                    }
                    self.phase = Phase::Quiets;
                }
                Phase::Quiets => {
                    if let Some(m) = Self::pick_best(&mut self.quiets, &[self.tt_move]) {
                        return Some(m);
                    }
                    self.phase = Phase::BadCaptures;
                }
                Phase::BadCaptures => {
                    if let Some(m) = Self::pick_best(&mut self.bad_captures, &[self.tt_move]) {
                        return Some(m);
                    }
                    self.phase = Phase::Done;
                }
                Phase::Done => return None,
            }
        }
    }

    /// Quiescence iteration; same machine, kept as a separate entry point
    /// so call sites read like what they search.
    pub fn next_qmove(&mut self) -> Option<Move> {
        self.next_move()
    }

    /// Mark a quiet move yielded and return it, if it is legal here.
    fn take_quiet(&mut self, wanted: Option<Move>) -> Option<Move> {
        let wanted = wanted?;
        let sm = self
            .quiets
            .iter_mut()
            .find(|sm| !sm.yielded && sm.mv == wanted)?;
        sm.yielded = true;
        Some(wanted)
    }
}

/// The externally provided root move list. Reordered between iterations
/// so the previous best line is searched first.
#[derive(Clone)]
pub struct RootMoves {
    moves: Vec<RootMove>,
}

#[derive(Clone, Copy)]
pub struct RootMove {
    pub mv: Move,
    pub score: Score,
}

impl RootMoves {
    /// All legal moves, or the `searchmoves` subset when given.
    pub fn new(pos: &Position, filter: Option<&[Move]>) -> Self {
        let moves = pos
            .legal_moves()
            .into_iter()
            .filter(|m| filter.is_none_or(|f| f.contains(m)))
            .map(|mv| RootMove {
                mv,
                score: 0,
            })
            .collect();
        Self { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn get(&self, i: usize) -> Move {
        self.moves[i].mv
    }

    pub fn set_score(&mut self, i: usize, score: Score) {
        self.moves[i].score = score;
    }

    /// Sort by last iteration's scores, best first; `best` is pinned to
    /// the front regardless.
    pub fn update_scores(&mut self, best: Option<Move>) {
        self.moves.sort_by_key(|rm| std::cmp::Reverse(rm.score));
        if let Some(best) = best
            && let Some(idx) = self.moves.iter().position(|rm| rm.mv == best)
        {
            self.moves[..=idx].rotate_right(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn find_move(pos: &Position, uci: &str) -> Move {
        pos.legal_moves()
            .into_iter()
            .find(|m| crate::uci::format_move(m) == uci)
            .unwrap_or_else(|| panic!("no move {uci}"))
    }

    #[test]
    fn yields_every_legal_move_exactly_once() {
        let pos =
            Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
                .unwrap();
        let heur = Heuristics::new();
        let mut picker = MovePicker::init_node(&pos, &heur, false, pos.in_check());

        let mut seen = HashSet::new();
        while let Some(m) = picker.next_move() {
            assert!(seen.insert(m), "duplicate move from picker");
        }
        assert_eq!(seen.len(), pos.legal_moves().len());
    }

    #[test]
    fn tt_move_comes_first() {
        let pos = Position::startpos();
        let heur = Heuristics::new();
        let tt = find_move(&pos, "b1c3");

        let mut picker = MovePicker::init_node(&pos, &heur, false, false);
        picker.set_tt_move(PackedMove::pack(tt));
        assert_eq!(picker.next_move(), Some(tt));
        assert_eq!(picker.current_phase(), Phase::TtMove);

        // And it is not yielded a second time.
        let mut rest = Vec::new();
        while let Some(m) = picker.next_move() {
            rest.push(m);
        }
        assert!(!rest.contains(&tt));
        assert_eq!(rest.len(), 19);
    }

    #[test]
    fn winning_capture_before_quiets_before_losing_capture() {
        // White can win a pawn with the queen (defended: losing) or with
        // the pawn (winning).
        let pos = Position::from_fen("4k3/8/3p4/4p3/3P4/8/4Q3/4K3 w - - 0 1").unwrap();
        let heur = Heuristics::new();
        let mut picker = MovePicker::init_node(&pos, &heur, false, false);

        let first = picker.next_move().unwrap();
        assert_eq!(crate::uci::format_move(&first), "d4e5");
        assert_eq!(picker.current_phase(), Phase::GoodCaptures);

        let mut phases = Vec::new();
        let mut moves = vec![first];
        loop {
            let Some(m) = picker.next_move() else { break };
            phases.push(picker.current_phase());
            moves.push(m);
        }
        let qxe5 = find_move(&pos, "e2e5");
        assert_eq!(moves.last(), Some(&qxe5), "losing capture must come last");
        assert_eq!(phases.last(), Some(&Phase::BadCaptures));
    }

    #[test]
    fn killer_yielded_in_killer_phase() {
        let pos = Position::startpos();
        let mut heur = Heuristics::new();
        let killer = find_move(&pos, "g2g3");
        heur.killer_add(&pos, killer);

        let mut picker = MovePicker::init_node(&pos, &heur, false, false);
        let first = picker.next_move().unwrap();
        assert_eq!(first, killer);
        assert_eq!(picker.current_phase(), Phase::KillerOne);
    }

    #[test]
    fn quiescence_keeps_captures_only() {
        let pos = Position::from_fen("4k3/8/3p4/4p3/3P4/8/4Q3/4K3 w - - 0 1").unwrap();
        let heur = Heuristics::new();
        let mut picker = MovePicker::init_node(&pos, &heur, true, false);

        let mut count = 0;
        while let Some(m) = picker.next_qmove() {
            assert!(m.is_capture());
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn quiescence_in_check_searches_all_evasions() {
        let pos = Position::from_fen("4k3/8/8/8/7b/8/3P4/4K3 w - - 0 1").unwrap();
        assert!(pos.in_check());
        let heur = Heuristics::new();
        let mut picker = MovePicker::init_node(&pos, &heur, true, true);

        let mut count = 0;
        while let Some(_m) = picker.next_qmove() {
            count += 1;
        }
        assert_eq!(count, pos.legal_moves().len());
    }

    #[test]
    fn root_moves_reorder_pins_best_first() {
        let pos = Position::startpos();
        let mut roots = RootMoves::new(&pos, None);
        let e4 = find_move(&pos, "e2e4");
        let d4 = find_move(&pos, "d2d4");

        for i in 0..roots.len() {
            let m = roots.get(i);
            roots.set_score(i, if m == d4 { 500 } else { 0 });
        }
        roots.update_scores(Some(e4));
        assert_eq!(roots.get(0), e4);
        assert_eq!(roots.get(1), d4);
    }

    #[test]
    fn searchmoves_filter_restricts_roots() {
        let pos = Position::startpos();
        let e4 = find_move(&pos, "e2e4");
        let roots = RootMoves::new(&pos, Some(&[e4]));
        assert_eq!(roots.len(), 1);
        assert_eq!(roots.get(0), e4);
    }
}
