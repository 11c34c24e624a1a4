//! Lazy SMP: N workers run their own iterative deepening against one
//! shared transposition table. Coordination is limited to a stop/abort
//! broadcast, a monotone completed-depth counter, depth claims for the
//! stagger, and the best line published so far.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use shakmaty::Move;

use crate::movepick::RootMoves;
use crate::position::Position;
use crate::search::Worker;
use crate::syzygy::SyzygyProber;
use crate::time::TimeManager;
use crate::tt::TranspositionTable;
use crate::types::{Score, SearchReport, CHECKMATE, INFINITE_SCORE, MAX_SEARCH_DEPTH};

const WORKER_STACK_BYTES: usize = 8 * 1024 * 1024;

/// Per-search flags, reset by the protocol layer before every `go`.
pub struct SearchOptions {
    pub exit_on_mate: bool,
    pub silent: bool,
    /// Absolute depth ceiling for iterative deepening.
    pub sd: i32,
    pub probe_wdl: bool,
    pub pondering: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            exit_on_mate: true,
            silent: false,
            sd: MAX_SEARCH_DEPTH,
            probe_wdl: true,
            pondering: false,
        }
    }
}

/// Best line found so far across all workers.
#[derive(Clone)]
pub struct BestLine {
    pub mv: Option<Move>,
    pub ponder: Option<Move>,
    pub score: Score,
    pub depth: i32,
    pub pv: Vec<Move>,
}

impl Default for BestLine {
    fn default() -> Self {
        Self {
            mv: None,
            ponder: None,
            score: -INFINITE_SCORE,
            depth: 0,
            pv: Vec::new(),
        }
    }
}

/// State shared by every worker of one search.
pub struct SharedState {
    pub tt: Arc<TranspositionTable>,
    pub tb: Option<Arc<SyzygyProber>>,
    pub time: TimeManager,
    pub exit_on_mate: bool,
    pub silent: bool,
    pub sd: i32,
    pub probe_wdl: bool,

    stop: AtomicBool,
    abort: AtomicBool,
    command: AtomicBool,
    pondering: AtomicBool,
    completed_depth: AtomicI32,
    claimed: Vec<AtomicI32>,
    node_counts: Vec<AtomicU64>,
    best: Mutex<BestLine>,
}

impl SharedState {
    pub fn new(
        tt: Arc<TranspositionTable>,
        tb: Option<Arc<SyzygyProber>>,
        time: TimeManager,
        workers: usize,
        opts: SearchOptions,
    ) -> Self {
        let workers = workers.max(1);
        Self {
            tt,
            tb,
            time,
            exit_on_mate: opts.exit_on_mate,
            silent: opts.silent,
            sd: opts.sd,
            probe_wdl: opts.probe_wdl,
            stop: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            command: AtomicBool::new(false),
            pondering: AtomicBool::new(opts.pondering),
            completed_depth: AtomicI32::new(0),
            claimed: (0..workers).map(|_| AtomicI32::new(0)).collect(),
            node_counts: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            best: Mutex::new(BestLine::default()),
        }
    }

    /// Single-worker state for silent analysis entry points.
    pub fn analysis(tt: Arc<TranspositionTable>) -> Self {
        Self::new(
            tt,
            None,
            TimeManager::infinite(),
            1,
            SearchOptions {
                silent: true,
                sd: 0,
                probe_wdl: false,
                ..SearchOptions::default()
            },
        )
    }

    /// `(stop, abort)`: `abort` demands an immediate exit; a plain stop
    /// lets a worker that is resolving a root fail finish stabilizing.
    pub fn should_stop(&self) -> (bool, bool) {
        (
            self.stop.load(Ordering::SeqCst),
            self.abort.load(Ordering::SeqCst),
        )
    }

    /// Broadcast stop to every worker. After this returns no further
    /// best-move publication is observable.
    pub fn stop_all(&self, abort: bool) {
        if abort {
            self.abort.store(true, Ordering::SeqCst);
        }
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Protocol layer signals that fresh input is waiting; worker 0 turns
    /// this into a stop broadcast at its next checkup.
    pub fn note_command(&self) {
        self.command.store(true, Ordering::SeqCst);
    }

    pub fn command_pending(&self) -> bool {
        self.command.load(Ordering::SeqCst)
    }

    pub fn set_pondering(&self, value: bool) {
        self.pondering.store(value, Ordering::SeqCst);
    }

    pub fn is_pondering(&self) -> bool {
        self.pondering.load(Ordering::SeqCst)
    }

    pub fn completed_depth(&self) -> i32 {
        self.completed_depth.load(Ordering::SeqCst)
    }

    pub fn claim_depth(&self, worker: usize, depth: i32) {
        self.claimed[worker].store(depth, Ordering::SeqCst);
    }

    /// Record a finished iteration and pick the worker's next depth: the
    /// smallest depth past the shared completed depth that no other
    /// worker currently claims.
    pub fn complete_iteration(&self, worker: usize, depth: i32) -> i32 {
        let prev = self.completed_depth.fetch_max(depth, Ordering::SeqCst);
        let completed = prev.max(depth);

        let mut next = completed + 1;
        loop {
            let taken = self
                .claimed
                .iter()
                .enumerate()
                .any(|(i, c)| i != worker && c.load(Ordering::SeqCst) == next);
            if !taken {
                break;
            }
            next += 1;
        }
        self.claimed[worker].store(next, Ordering::SeqCst);
        next
    }

    /// Publish a new best line. Deeper iterations win; at equal depth the
    /// better score wins.
    pub fn update(
        &self,
        depth: i32,
        score: Score,
        mv: Move,
        ponder: Option<Move>,
        pv: &[Move],
    ) {
        let mut best = self.best.lock().expect("best-line mutex poisoned");
        if depth > best.depth || (depth == best.depth && score > best.score) {
            best.depth = depth;
            best.score = score;
            best.mv = Some(mv);
            best.ponder = ponder;
            best.pv = pv.to_vec();
        }
    }

    pub fn best_line(&self) -> BestLine {
        self.best.lock().expect("best-line mutex poisoned").clone()
    }

    pub fn flush_nodes(&self, worker: usize, nodes: u64) {
        self.node_counts[worker].store(nodes, Ordering::Relaxed);
    }

    pub fn total_nodes(&self) -> u64 {
        self.node_counts
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    pub fn workers(&self) -> usize {
        self.claimed.len()
    }
}

/// Run a search on `threads` workers and collect the final report once
/// they have all wound down. Worker 0 owns all protocol output.
pub fn run(shared: &Arc<SharedState>, pos: &Position, roots: &RootMoves) -> SearchReport {
    shared.tt.new_generation();

    if roots.is_empty() {
        // Mate or stalemate at the root; there is nothing to search.
        let score = if pos.in_check() { -CHECKMATE } else { 0 };
        return SearchReport {
            best_move: None,
            ponder_move: None,
            score,
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
        };
    }

    let threads = shared.workers();
    std::thread::scope(|s| {
        for id in 0..threads {
            let shared = Arc::clone(shared);
            let pos = pos.clone();
            let roots = roots.clone();
            // Each node frame carries a move picker, so deep searches
            // need more than the default thread stack.
            std::thread::Builder::new()
                .stack_size(WORKER_STACK_BYTES)
                .spawn_scoped(s, move || {
                    Worker::new(id, pos, roots, shared).find_best_move();
                })
                .expect("failed to spawn search worker");
        }
    });

    let best = shared.best_line();
    SearchReport {
        // A search stopped before any publication still answers with the
        // first root move rather than nothing.
        best_move: best.mv.or_else(|| Some(roots.get(0))),
        ponder_move: best.ponder,
        score: best.score,
        depth: best.depth,
        nodes: shared.total_nodes(),
        pv: best.pv,
    }
}

/// Fixed-depth convenience entry: fresh hash, silent, no clock.
pub fn search_to_depth(pos: &Position, depth: i32, threads: usize) -> SearchReport {
    let tt = Arc::new(TranspositionTable::new(16));
    let shared = Arc::new(SharedState::new(
        tt,
        None,
        TimeManager::infinite(),
        threads,
        SearchOptions {
            silent: true,
            sd: depth,
            ..SearchOptions::default()
        },
    ));
    let roots = RootMoves::new(pos, None);
    run(&shared, pos, &roots)
}
