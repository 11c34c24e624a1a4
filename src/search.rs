//! The search core: quiescence, principal-variation search with the
//! pruning pipeline, root search, and the iterative-deepening driver
//! each worker runs.

use std::sync::Arc;

use arrayvec::ArrayVec;
use shakmaty::{Color, Move, Rank, Role};

use crate::evaluation::evaluate;
use crate::movepick::{MovePicker, Phase, RootMoves};
use crate::position::Position;
use crate::see::{see_ge, see_post_ge};
use crate::smp::SharedState;
use crate::tt::{PackedMove, TranspositionTable, TtFlag};
use crate::types::{
    Score, ASPIRATION_WINDOW, CHECKMATE, FORCED_MATE, INFINITE_SCORE, KNOWN_WIN, MAX_PLY,
};
use crate::uci;

const NULLMOVE_DEPTH: i32 = 3;
const NULLMOVE_BASE_REDUCTION: i32 = 2;
const NULLMOVE_DIVISOR: i32 = 6;

const FUTILITY_DEPTH: i32 = 3;
const FUTILITY_MARGIN: [Score; 4] = [0, 300, 500, 900];

const RAZORING_DEPTH: i32 = 3;
const RAZORING_MARGIN: [Score; 4] = [0, 100, 200, 400];

const LMP_DEPTH: i32 = 6;
const LMP_COUNTS: [i32; 6] = [0, 5, 10, 20, 35, 55];

const PROBCUT_DEPTH: i32 = 5;
const PROBCUT_MARGIN: Score = 210;

const SEE_PRUNE_DEPTH: i32 = 5;
const SEE_PRUNE_MARGIN: [Score; 5] = [0, -100, -200, -300, -400];

/// Why a search unwound early. Raised only by [`Worker::checkup`] and
/// caught only by the deepening loop; it never reaches the caller of
/// [`Worker::find_best_move`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchAbort {
    Stop,
    Timeout,
    Command,
}

type SearchResult = Result<Score, SearchAbort>;

/// Triangular principal-variation table, one line per search ply.
pub struct PvTable {
    moves: [[Option<Move>; MAX_PLY]; MAX_PLY],
    len: [usize; MAX_PLY],
}

impl PvTable {
    fn new() -> Box<Self> {
        Box::new(Self {
            moves: [[None; MAX_PLY]; MAX_PLY],
            len: [0; MAX_PLY],
        })
    }

    fn clear(&mut self, sply: usize) {
        if sply < MAX_PLY {
            self.len[sply] = 0;
        }
    }

    /// Set `m` as the best move at `sply` and pull up the line found one
    /// ply deeper.
    fn update(&mut self, sply: usize, m: Move) {
        if sply >= MAX_PLY {
            return;
        }
        self.moves[sply][0] = Some(m);
        let child = sply + 1;
        if child < MAX_PLY {
            let child_len = self.len[child].min(MAX_PLY - 1);
            let (head, tail) = self.moves.split_at_mut(child);
            head[sply][1..=child_len].copy_from_slice(&tail[0][..child_len]);
            self.len[sply] = child_len + 1;
        } else {
            self.len[sply] = 1;
        }
    }

    fn line(&self, sply: usize) -> Vec<Move> {
        self.moves[sply][..self.len[sply]]
            .iter()
            .flatten()
            .copied()
            .collect()
    }
}

/// A pawn advancing to the sixth rank or beyond (side-relative); such
/// moves are exempt from late-move pruning.
fn is_pawn_push(m: Move, stm: Color) -> bool {
    if m.role() != Role::Pawn {
        return false;
    }
    match stm {
        Color::White => m.to().rank() >= Rank::Sixth,
        Color::Black => m.to().rank() <= Rank::Third,
    }
}

/// One search thread: private position, PV, and heuristic tables, plus a
/// handle to the shared state.
pub struct Worker {
    pub id: usize,
    pub pos: Position,
    heur: Box<crate::history::Heuristics>,
    pv: Box<PvTable>,
    roots: RootMoves,
    shared: Arc<SharedState>,

    pub depth: i32,
    pub seldepth: i32,
    pub nodes: u64,
    pub qnodes: u64,
    pub currmove: Option<Move>,
    pub currmovenumber: usize,
    pub best_move: Option<Move>,
    pub ponder_move: Option<Move>,
    resolving_root_fail: bool,
}

impl Worker {
    pub fn new(id: usize, pos: Position, roots: RootMoves, shared: Arc<SharedState>) -> Self {
        Self {
            id,
            pos,
            heur: Box::new(crate::history::Heuristics::new()),
            pv: PvTable::new(),
            roots,
            shared,
            depth: 0,
            seldepth: 0,
            nodes: 0,
            qnodes: 0,
            currmove: None,
            currmovenumber: 0,
            best_move: None,
            ponder_move: None,
            resolving_root_fail: false,
        }
    }

    pub fn pv_line(&self, sply: usize) -> Vec<Move> {
        self.pv.line(sply)
    }

    /// Poll external state. The stop flag is checked on every entry; the
    /// clock and (for worker 0) pending input only every 1024 nodes. A
    /// plain stop spares a worker that is still resolving a root fail so
    /// it never publishes from a half-widened window.
    fn checkup(&mut self) -> Result<(), SearchAbort> {
        let (stop, abort) = self.shared.should_stop();
        if stop && (abort || !self.resolving_root_fail) {
            return Err(SearchAbort::Stop);
        }

        if self.nodes & 1023 != 0 {
            return Ok(());
        }
        self.shared.flush_nodes(self.id, self.nodes);

        if !self.shared.time.check_time() {
            self.shared.stop_all(false);
            return Err(SearchAbort::Timeout);
        }
        if self.id == 0 && self.shared.command_pending() {
            self.shared.stop_all(true);
            return Err(SearchAbort::Command);
        }
        Ok(())
    }

    /// Captures-only search (all evasions while in check) with stand-pat,
    /// run below the nominal horizon.
    fn quiescence(&mut self, depth: i32, mut alpha: Score, beta: Score) -> SearchResult {
        if depth < 0 {
            self.nodes += 1;
            self.qnodes += 1;
        }
        self.checkup()?;

        let sply = self.pos.sply();
        self.pv.clear(sply);

        if self.pos.is_repetition() || self.pos.fifty() >= 100 {
            return Ok(0);
        }

        let static_score = evaluate(&self.pos);
        if sply >= MAX_PLY {
            return Ok(static_score);
        }

        // Standing pat: out of check the side to move may decline every
        // capture, so the static score bounds the node from below. In
        // check there is no such option and all evasions are searched.
        let in_check = self.pos.in_check();
        let mut best_score = -INFINITE_SCORE;
        if !in_check {
            best_score = static_score;
            if static_score >= beta {
                return Ok(static_score);
            }
            if static_score > alpha {
                alpha = static_score;
            }
        }

        let hit = self.shared.tt.lookup(self.pos.key(), 0, alpha, beta, sply);
        if let Some(score) = hit.cutoff {
            return Ok(score);
        }

        let mut picker = MovePicker::init_node(&self.pos, &self.heur, true, in_check);
        picker.set_tt_move(hit.hint);

        let mut found_move = false;
        while let Some(m) = picker.next_qmove() {
            // Captures that lose material cannot beat the stand-pat.
            if !in_check && m.is_capture() && picker.current_phase() == Phase::BadCaptures {
                continue;
            }

            self.pos.make_move(m);
            found_move = true;
            let r = self.quiescence(depth - 1, -beta, -alpha);
            self.pos.unmake_move();
            let score = -r?;

            if score > best_score {
                best_score = score;
                if score > alpha {
                    if score >= beta {
                        break;
                    }
                    alpha = score;
                    self.pv.update(sply, m);
                }
            }
        }

        if in_check && !found_move {
            return Ok(-CHECKMATE + sply as Score);
        }
        Ok(best_score)
    }

    /// Recurse into an already-made move with the PVS window dance: the
    /// first move gets the full window, later moves a reduced null-window
    /// probe with re-searches on improvement. Returns the child score
    /// already negated; the caller unmakes.
    fn pvs_child(
        &mut self,
        new_depth: i32,
        reduction: i32,
        alpha: Score,
        beta: Score,
        first: bool,
        pv_node: bool,
    ) -> SearchResult {
        if first {
            return Ok(-self.search(new_depth - 1, -beta, -alpha, true)?);
        }

        let mut score = -self.search(new_depth - reduction - 1, -alpha - 1, -alpha, true)?;
        if score > alpha && reduction > 0 {
            score = -self.search(new_depth - 1, -alpha - 1, -alpha, true)?;
        }
        if pv_node && score > alpha {
            score = -self.search(new_depth - 1, -beta, -alpha, true)?;
        }
        Ok(score)
    }

    /// Negamax alpha-beta with the pruning pipeline: reverse futility,
    /// razoring, null move, probcut, futility, LMP, SEE pruning, check
    /// extension, and late-move reductions.
    fn search(&mut self, depth: i32, mut alpha: Score, beta: Score, try_null: bool) -> SearchResult {
        let pv_node = beta - alpha > 1;
        self.nodes += 1;

        let in_check = self.pos.in_check();
        if depth <= 0 {
            return self.quiescence(0, alpha, beta);
        }

        self.checkup()?;

        let sply = self.pos.sply();
        if sply as i32 > self.seldepth {
            self.seldepth = sply as i32;
        }
        self.pv.clear(sply);

        // Ceiling for runaway check-extension lines.
        if sply >= MAX_PLY {
            return Ok(evaluate(&self.pos));
        }

        if self.pos.is_repetition() || self.pos.fifty() >= 100 {
            return Ok(0);
        }

        let key = self.pos.key();
        let hit = self.shared.tt.lookup(key, depth, alpha, beta, sply);
        if let Some(score) = hit.cutoff {
            return Ok(score);
        }

        if self.shared.probe_wdl
            && let Some(tb) = &self.shared.tb
            && self.pos.piece_count() <= tb.max_pieces()
            && let Some(score) = tb.probe_wdl(&self.pos)
        {
            return Ok(score);
        }

        let stm = self.pos.side_to_move();
        let static_score = evaluate(&self.pos);

        // Reverse futility: a static score comfortably over beta in a
        // shallow non-PV node is very unlikely to come back down.
        if depth <= FUTILITY_DEPTH
            && !in_check
            && !pv_node
            && self.pos.has_non_pawn(stm)
            && static_score - FUTILITY_MARGIN[depth as usize] >= beta
        {
            return Ok(static_score);
        }

        // Razoring: far below alpha with no TT move, drop to quiescence
        // and trust it unless tactics rescue the position.
        if !in_check
            && !pv_node
            && hit.hint.is_none()
            && depth <= RAZORING_DEPTH
            && static_score + RAZORING_MARGIN[depth as usize] <= alpha
        {
            if depth == 1 {
                return self.quiescence(0, alpha, beta);
            }
            let threshold = alpha - RAZORING_MARGIN[depth as usize];
            let score = self.quiescence(0, threshold, threshold + 1)?;
            if score <= threshold {
                return Ok(score);
            }
        }

        // Null move: give the opponent a free shot; if they still cannot
        // reach beta the real position is good enough to cut. Disabled
        // without non-pawn material, where zugzwang breaks the argument.
        if try_null
            && !in_check
            && depth > NULLMOVE_DEPTH
            && self.pos.has_non_pawn(stm)
            && self.pos.make_null_move()
        {
            let reduction = NULLMOVE_BASE_REDUCTION + depth / NULLMOVE_DIVISOR;
            let r = self.search(depth - reduction - 1, -beta, -beta + 1, false);
            self.pos.unmake_null_move();
            let score = -r?;
            if score >= beta {
                // A mate score through a null move is not a proven mate.
                return Ok(if score < FORCED_MATE { score } else { beta });
            }
        }

        // Probcut: a capture whose reduced search already clears
        // beta + margin is safe to cut on.
        if !pv_node && !in_check && depth >= PROBCUT_DEPTH && self.pos.has_non_pawn(stm) {
            let threshold = beta + PROBCUT_MARGIN;
            let mut qpicker = MovePicker::init_node(&self.pos, &self.heur, true, in_check);
            qpicker.set_tt_move(hit.hint);

            while let Some(m) = qpicker.next_qmove() {
                if !m.is_capture() {
                    continue;
                }
                if !see_ge(&self.pos, m, threshold - static_score) {
                    continue;
                }
                self.pos.make_move(m);
                let r = self.search(depth - PROBCUT_DEPTH + 1, -threshold, -threshold + 1, true);
                self.pos.unmake_move();
                let score = -r?;
                if score >= threshold {
                    return Ok(score);
                }
            }
        }

        let mut picker = MovePicker::init_node(&self.pos, &self.heur, false, in_check);
        picker.set_tt_move(hit.hint);
        let tt_move = picker.tt_move();

        // Futility: hopelessly below alpha at shallow depth, so only
        // tactical moves (and at least one move) get searched.
        let futility_pruning = depth <= FUTILITY_DEPTH
            && static_score + FUTILITY_MARGIN[depth as usize] <= alpha;

        let mut best_score = -INFINITE_SCORE;
        let mut best_move: Option<Move> = None;
        let mut tt_flag = TtFlag::Alpha;
        let mut movenumber = 0i32;
        let mut found_move = false;
        let mut quiets_tried: ArrayVec<Move, 64> = ArrayVec::new();

        while let Some(m) = picker.next_move() {
            let pawn_push = is_pawn_push(m, stm);
            let killer = self.heur.is_killer(sply, m);
            let hist = self.heur.history_score(stm, m);

            self.pos.make_move(m);
            let gives_check = self.pos.in_check();
            let tactical = m.is_capture() || m.is_promotion() || in_check || gives_check;
            movenumber += 1;
            found_move = true;
            let mut new_depth = depth;

            if futility_pruning && movenumber > 1 && !tactical {
                self.pos.unmake_move();
                continue;
            }

            // Late move pruning: quiet, late, historically fruitless and
            // tactic-free moves are dropped wholesale at low depth.
            if !pv_node
                && depth < LMP_DEPTH
                && movenumber > LMP_COUNTS[depth as usize]
                && movenumber > 1
                && !tactical
                && !pawn_push
                && !killer
                && alpha.abs() < KNOWN_WIN
                && hist == 0
            {
                self.pos.unmake_move();
                continue;
            }

            // Drop moves that lose too much material outright.
            if !pv_node
                && Some(m) != tt_move
                && !in_check
                && !gives_check
                && depth < SEE_PRUNE_DEPTH
                && !see_post_ge(&self.pos, m, SEE_PRUNE_MARGIN[depth as usize])
            {
                self.pos.unmake_move();
                continue;
            }

            if gives_check {
                new_depth += 1;
            }

            // Late move reductions for quiet, unexceptional moves.
            let mut reduction = if movenumber > 3 && depth > 3 && !tactical {
                1
            } else {
                0
            };
            if reduction > 0 && movenumber > 6 {
                reduction += 1;
            }

            if !m.is_capture() && !quiets_tried.is_full() {
                quiets_tried.push(m);
            }

            let first = best_score == -INFINITE_SCORE;
            let r = self.pvs_child(new_depth, reduction, alpha, beta, first, pv_node);
            self.pos.unmake_move();
            let score = r?;

            if score > best_score {
                best_score = score;
                best_move = Some(m);

                if score > alpha {
                    if score >= beta {
                        self.heur.killer_add(&self.pos, m);
                        if !m.is_capture() {
                            if let Some(prev) = self.pos.previous_move() {
                                self.heur.counter_add(prev, m);
                            }
                            self.heur.history_update(stm, &quiets_tried, depth);
                        }
                        tt_flag = TtFlag::Beta;
                        break;
                    }

                    tt_flag = TtFlag::Exact;
                    alpha = score;
                    self.pv.update(sply, m);
                    if !m.is_capture() {
                        self.heur.history_update(stm, &quiets_tried, depth);
                    }
                }
            }
        }

        // No legal move: mate if in check, stalemate otherwise. The ply
        // offset makes nearer mates score higher.
        if !found_move {
            tt_flag = TtFlag::Exact;
            best_score = if in_check {
                -CHECKMATE + sply as Score
            } else {
                0
            };
        }

        self.shared.tt.store(
            key,
            best_move.map_or(PackedMove::NONE, PackedMove::pack),
            depth,
            best_score,
            tt_flag,
            sply,
        );

        Ok(best_score)
    }

    /// Root search: iterates the externally provided root move list with
    /// check extensions and the PVS window dance, but no pruning. Best
    /// and ponder moves are published only for scores strictly inside
    /// the aspiration window.
    fn search_root(&mut self, depth: i32, mut alpha: Score, beta: Score) -> SearchResult {
        self.checkup()?;
        self.pv.clear(0);

        let pv_node = beta - alpha > 1;
        let key = self.pos.key();
        // Root probes only for the move hint; the move list is searched
        // in full regardless of what the table claims.
        let hit = self.shared.tt.lookup(key, depth, alpha, beta, 0);

        self.roots.update_scores(self.best_move);

        let mut best_score = -INFINITE_SCORE;
        let mut best_move = (0..self.roots.len())
            .map(|i| self.roots.get(i))
            .find(|&m| hit.hint.matches(m));
        let mut tt_flag = TtFlag::Alpha;
        let mut quiets_tried: ArrayVec<Move, 64> = ArrayVec::new();
        let stm = self.pos.side_to_move();
        self.currmovenumber = 0;

        for i in 0..self.roots.len() {
            let m = self.roots.get(i);
            self.currmove = Some(m);
            self.currmovenumber += 1;
            if self.id == 0
                && !self.shared.silent
                && self.depth > self.shared.completed_depth()
            {
                uci::send_move_info(self.depth, m, self.currmovenumber);
            }

            self.pos.make_move(m);
            let mut new_depth = depth;
            if self.pos.in_check() {
                new_depth += 1;
            }
            if !m.is_capture() && !quiets_tried.is_full() {
                quiets_tried.push(m);
            }

            let first = best_score == -INFINITE_SCORE;
            let r = self.pvs_child(new_depth, 0, alpha, beta, first, pv_node);
            self.pos.unmake_move();
            let score = r?;
            self.roots.set_score(i, score);

            if score > best_score {
                best_score = score;
                best_move = Some(m);

                if score > alpha {
                    // Beyond beta the aspiration driver re-searches with
                    // a wider window anyway, so stop here.
                    if score >= beta {
                        self.heur.killer_add(&self.pos, m);
                        tt_flag = TtFlag::Beta;
                        break;
                    }

                    tt_flag = TtFlag::Exact;
                    alpha = score;
                    self.pv.update(0, m);
                    if !m.is_capture() {
                        self.heur.history_update(stm, &quiets_tried, depth);
                    }

                    // Only scores strictly inside the window are
                    // trustworthy enough to publish.
                    self.best_move = Some(m);
                    let line = self.pv.line(0);
                    self.ponder_move = line.get(1).copied();
                    self.shared
                        .update(self.depth, score, m, self.ponder_move, &line);
                }
            }
        }

        self.shared.tt.store(
            key,
            best_move.map_or(PackedMove::NONE, PackedMove::pack),
            depth,
            best_score,
            tt_flag,
            0,
        );

        Ok(best_score)
    }

    /// Iterative deepening with aspiration windows. Runs until stopped,
    /// out of time, past the depth ceiling, or a forced result is proven.
    pub fn find_best_move(&mut self) {
        let mut depth = 1 + (self.id % 2) as i32;
        let mut alpha = -INFINITE_SCORE;
        let mut beta = INFINITE_SCORE;
        let mut awindex = 0usize;
        let mut bwindex = 0usize;
        self.shared.claim_depth(self.id, depth);

        loop {
            self.depth = depth;
            self.seldepth = 0;
            let a = alpha.max(-INFINITE_SCORE);
            let b = beta.min(INFINITE_SCORE);

            let score = match self.search_root(depth, a, b) {
                Ok(score) => score,
                // Timeout and command broadcasts already happened inside
                // checkup; nothing is left to do but unwind.
                Err(_) => break,
            };

            // Fail low: widen downward and repeat the same depth. The
            // resolving flag keeps a plain stop from interrupting until
            // the score stabilizes.
            if score <= a {
                awindex = (awindex + 1).min(ASPIRATION_WINDOW.len() - 1);
                alpha = score - ASPIRATION_WINDOW[awindex];
                self.resolving_root_fail = true;
                continue;
            }
            // Fail high: widen upward and repeat.
            if score >= b {
                bwindex = (bwindex + 1).min(ASPIRATION_WINDOW.len() - 1);
                beta = score + ASPIRATION_WINDOW[bwindex];
                continue;
            }
            self.resolving_root_fail = false;

            if self.id == 0 && !self.shared.silent {
                self.send_pv_info(score);
            }

            depth = self.shared.complete_iteration(self.id, depth);

            if self.shared.exit_on_mate
                && !self.shared.is_pondering()
                && score.abs() > KNOWN_WIN
            {
                self.shared.stop_all(true);
                break;
            }

            // Narrow windows only pay off once the search is deep enough
            // for the previous score to be a good guess.
            awindex = 0;
            bwindex = 0;
            if depth > 5 {
                alpha = score - ASPIRATION_WINDOW[awindex];
                beta = score + ASPIRATION_WINDOW[bwindex];
            } else {
                alpha = -INFINITE_SCORE;
                beta = INFINITE_SCORE;
            }

            if !self.shared.time.new_iteration() {
                self.shared.stop_all(false);
                break;
            }
            if depth > self.shared.sd {
                self.shared.stop_all(true);
                break;
            }
        }

        self.shared.flush_nodes(self.id, self.nodes);

        // If the ceiling was hit while pondering, hold the result until
        // the ponder state resolves so bestmove is not sent early.
        while self.id == 0 && self.shared.is_pondering() && !self.shared.should_stop().0 {
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
    }

    fn send_pv_info(&self, score: Score) {
        let nodes = self.shared.total_nodes().max(self.nodes);
        let elapsed = self.shared.time.elapsed_time();
        uci::send_pv_info(
            self.depth,
            self.seldepth,
            score,
            nodes,
            elapsed,
            &self.pv.line(0),
        );
    }
}

/// Stand-alone quiescence evaluation of a position: fresh hash, silent,
/// no tablebases. Returns the score and the tactical line behind it.
pub fn quiescence_score(pos: &Position) -> (Score, Vec<Move>) {
    let tt = Arc::new(TranspositionTable::new(1));
    let shared = Arc::new(SharedState::analysis(tt));
    let roots = RootMoves::new(pos, None);
    let mut worker = Worker::new(0, pos.clone(), roots, shared);
    let score = worker
        .quiescence(0, -INFINITE_SCORE, INFINITE_SCORE)
        .unwrap_or(0);
    let line = worker.pv_line(0);
    (score, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pv_table_prepends_moves() {
        let pos = Position::startpos();
        let m0 = pos.legal_moves()[0];
        let m1 = pos.legal_moves()[1];

        let mut pv = PvTable::new();
        pv.update(1, m1);
        pv.update(0, m0);
        assert_eq!(pv.line(0), vec![m0, m1]);

        pv.clear(1);
        pv.update(0, m1);
        assert_eq!(pv.line(0), vec![m1]);
    }

    #[test]
    fn pawn_push_is_side_relative() {
        let white = Position::from_fen("4k3/8/8/2P5/8/8/8/4K3 w - - 0 1").unwrap();
        let push = white.legal_moves()
            .into_iter()
            .find(|m| m.role() == Role::Pawn)
            .unwrap();
        assert!(is_pawn_push(push, Color::White));

        let black = Position::from_fen("4k3/8/8/8/2p5/8/8/4K3 b - - 0 1").unwrap();
        let push = black.legal_moves()
            .into_iter()
            .find(|m| m.role() == Role::Pawn)
            .unwrap();
        assert!(is_pawn_push(push, Color::Black));
    }

    #[test]
    fn quiescence_is_deterministic() {
        let pos = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        )
        .unwrap();
        let (a, _) = quiescence_score(&pos);
        let (b, _) = quiescence_score(&pos);
        assert_eq!(a, b);
    }

    #[test]
    fn quiescence_sees_hanging_queen() {
        // White queen can take a free black queen on d5.
        let pos = Position::from_fen("4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1").unwrap();
        let (score, line) = quiescence_score(&pos);
        assert!(score > 500, "free queen capture should win, got {score}");
        assert!(!line.is_empty());
        assert_eq!(crate::uci::format_move(&line[0]), "d1d5");
    }

    #[test]
    fn quiescence_mate_when_checked_with_no_escape() {
        // Fool's mate: white is checkmated.
        let pos = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        let (score, _) = quiescence_score(&pos);
        assert_eq!(score, -CHECKMATE);
    }
}
