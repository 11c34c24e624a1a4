//! Search time control. The hard limit aborts mid-iteration through
//! checkup; the soft limit only refuses to start another iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How a search is limited. Depth-only and infinite searches carry no
/// clock at all.
#[derive(Debug, Clone, Copy)]
pub enum TimeMode {
    Infinite,
    /// Exact time per move, no soft limit.
    MoveTime(Duration),
    /// Remaining clock time plus increment.
    Clock {
        time_left: Duration,
        increment: Duration,
        movestogo: Option<u32>,
    },
}

pub struct TimeManager {
    start: Mutex<Option<Instant>>,
    /// Clock inactive while pondering; `activate` starts it on ponderhit.
    clock_active: AtomicBool,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
}

impl TimeManager {
    pub fn infinite() -> Self {
        Self {
            start: Mutex::new(Some(Instant::now())),
            clock_active: AtomicBool::new(false),
            soft_limit: None,
            hard_limit: None,
        }
    }

    /// Configure for one `go`. `ponder` leaves the clock inactive until
    /// [`activate`](Self::activate).
    pub fn configure(mode: TimeMode, ponder: bool) -> Self {
        let (soft, hard) = match mode {
            TimeMode::Infinite => (None, None),
            TimeMode::MoveTime(t) => (None, Some(t)),
            TimeMode::Clock {
                time_left,
                increment,
                movestogo,
            } => {
                // Budget an even split plus most of the increment, but
                // never more than 80% of what is on the clock.
                let moves = movestogo.unwrap_or(30).max(1);
                let base = time_left / moves + increment * 3 / 4;
                let cap = time_left * 4 / 5;
                let allocated = base.min(cap);
                (Some(allocated), Some((allocated * 2).min(cap)))
            }
        };
        Self {
            start: Mutex::new(Some(Instant::now())),
            clock_active: AtomicBool::new(!ponder),
            soft_limit: soft,
            hard_limit: hard,
        }
    }

    /// Start the clock (ponderhit).
    pub fn activate(&self) {
        *self.start.lock().expect("start mutex poisoned") = Some(Instant::now());
        self.clock_active.store(true, Ordering::Release);
    }

    pub fn elapsed_time(&self) -> Duration {
        self.start
            .lock()
            .expect("start mutex poisoned")
            .map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// False once the hard deadline has passed.
    pub fn check_time(&self) -> bool {
        if !self.clock_active.load(Ordering::Acquire) {
            return true;
        }
        match self.hard_limit {
            Some(hard) => self.elapsed_time() < hard,
            None => true,
        }
    }

    /// May another deepening iteration start? Half the soft budget spent
    /// means the next iteration would likely not finish.
    pub fn new_iteration(&self) -> bool {
        if !self.clock_active.load(Ordering::Acquire) {
            return true;
        }
        match self.soft_limit {
            Some(soft) => self.elapsed_time() <= soft / 2,
            None => self.check_time(),
        }
    }
}
