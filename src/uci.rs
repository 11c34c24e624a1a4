//! UCI protocol adapter. The engine searches on a worker thread while
//! this loop keeps reading stdin, so `stop`, `ponderhit`, and `quit`
//! land immediately.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use shakmaty::{File, Move, Square};
use tracing::warn;

use crate::movepick::RootMoves;
use crate::position::Position;
use crate::search;
use crate::smp::{self, SearchOptions, SharedState};
use crate::syzygy::SyzygyProber;
use crate::time::{TimeManager, TimeMode};
use crate::tt::TranspositionTable;
use crate::types::{
    EngineConfig, Score, CHECKMATE, FORCED_MATE, MAX_PLY, MAX_SEARCH_DEPTH,
};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("malformed position command: missing startpos or fen keyword")]
    MalformedPosition,

    #[error("invalid FEN: {fen}")]
    InvalidFen { fen: String },

    #[error("invalid move: {uci_move}")]
    InvalidMove { uci_move: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Format a move as coordinate notation (`e2e4`, `e7e8q`, `e1g1`).
pub fn format_move(m: &Move) -> String {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook > king {
                File::G
            } else {
                File::C
            };
            let to = Square::from_coords(file, king.rank());
            format!("{king}{to}")
        }
        _ => {
            let from = m.from().expect("chess moves always have an origin");
            let to = m.to();
            match m.promotion() {
                Some(role) => format!("{from}{to}{}", role.char()),
                None => format!("{from}{to}"),
            }
        }
    }
}

fn format_score(score: Score) -> String {
    if score.abs() >= FORCED_MATE {
        let plies = CHECKMATE - score.abs();
        let moves = (plies + 1) / 2;
        if score > 0 {
            format!("score mate {moves}")
        } else {
            format!("score mate -{moves}")
        }
    } else {
        format!("score cp {score}")
    }
}

/// Per-iteration search summary for the GUI.
pub fn send_pv_info(
    depth: i32,
    seldepth: i32,
    score: Score,
    nodes: u64,
    elapsed: Duration,
    pv: &[Move],
) {
    let ms = elapsed.as_millis().max(1) as u64;
    let nps = nodes * 1000 / ms;
    let pv_str = pv.iter().map(format_move).collect::<Vec<_>>().join(" ");
    println!(
        "info depth {depth} seldepth {seldepth} {} nodes {nodes} time {ms} nps {nps} pv {pv_str}",
        format_score(score)
    );
}

/// Root move progress, emitted once a worker searches past the depth
/// already completed elsewhere.
pub fn send_move_info(depth: i32, m: Move, movenumber: usize) {
    println!(
        "info depth {depth} currmove {} currmovenumber {movenumber}",
        format_move(&m)
    );
}

struct GoParams {
    depth: Option<i32>,
    movetime: Option<u64>,
    wtime: Option<u64>,
    btime: Option<u64>,
    winc: Option<u64>,
    binc: Option<u64>,
    movestogo: Option<u32>,
    infinite: bool,
    ponder: bool,
    searchmoves: Vec<String>,
}

impl GoParams {
    fn parse(tokens: &[&str]) -> Self {
        let mut p = Self {
            depth: None,
            movetime: None,
            wtime: None,
            btime: None,
            winc: None,
            binc: None,
            movestogo: None,
            infinite: false,
            ponder: false,
            searchmoves: Vec::new(),
        };

        let mut i = 1;
        while i < tokens.len() {
            let value = tokens.get(i + 1).copied();
            match tokens[i] {
                "depth" => {
                    p.depth = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "movetime" => {
                    p.movetime = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "wtime" => {
                    p.wtime = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "btime" => {
                    p.btime = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "winc" => {
                    p.winc = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "binc" => {
                    p.binc = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "movestogo" => {
                    p.movestogo = value.and_then(|v| v.parse().ok());
                    i += 1;
                }
                "infinite" => p.infinite = true,
                "ponder" => p.ponder = true,
                "searchmoves" => {
                    for &t in &tokens[i + 1..] {
                        p.searchmoves.push(t.to_string());
                    }
                    i = tokens.len();
                }
                _ => {}
            }
            i += 1;
        }
        p
    }

    fn time_mode(&self, white_to_move: bool) -> TimeMode {
        if self.infinite {
            return TimeMode::Infinite;
        }
        if let Some(mt) = self.movetime {
            return TimeMode::MoveTime(Duration::from_millis(mt));
        }

        let (time, inc) = if white_to_move {
            (self.wtime, self.winc.unwrap_or(0))
        } else {
            (self.btime, self.binc.unwrap_or(0))
        };
        match time {
            Some(ms) if ms > 0 => TimeMode::Clock {
                time_left: Duration::from_millis(ms),
                increment: Duration::from_millis(inc),
                movestogo: self.movestogo,
            },
            // No clock given: depth-limited or infinite.
            _ => TimeMode::Infinite,
        }
    }
}

/// Resolve a coordinate-notation move against the current position.
fn parse_uci_move(pos: &Position, token: &str) -> Option<Move> {
    pos.legal_moves()
        .into_iter()
        .find(|m| format_move(m) == token)
}

fn parse_position(tokens: &[&str], pos: &mut Position) -> Result<(), UciError> {
    let mut idx = 1;
    match tokens.get(idx) {
        Some(&"startpos") => {
            *pos = Position::startpos();
            idx += 1;
        }
        Some(&"fen") => {
            idx += 1;
            let mut fen_parts = Vec::new();
            while idx < tokens.len() && tokens[idx] != "moves" && fen_parts.len() < 6 {
                fen_parts.push(tokens[idx]);
                idx += 1;
            }
            let fen = fen_parts.join(" ");
            *pos = Position::from_fen(&fen).map_err(|_| UciError::InvalidFen { fen })?;
        }
        _ => return Err(UciError::MalformedPosition),
    }

    if tokens.get(idx) == Some(&"moves") {
        for &token in &tokens[idx + 1..] {
            let m = parse_uci_move(pos, token).ok_or_else(|| UciError::InvalidMove {
                uci_move: token.to_string(),
            })?;
            pos.play_root_move(m);
        }
    }
    Ok(())
}

/// A search running on its worker thread.
struct ActiveSearch {
    shared: Arc<SharedState>,
    handle: JoinHandle<()>,
}

struct Engine {
    config: EngineConfig,
    tt: Arc<TranspositionTable>,
    tb: Option<Arc<SyzygyProber>>,
    position: Position,
    active: Option<ActiveSearch>,
}

impl Engine {
    fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            tt: Arc::new(TranspositionTable::new(config.hash_mb)),
            tb: None,
            position: Position::startpos(),
            active: None,
            config,
        }
    }

    fn search_running(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.handle.is_finished())
    }

    /// Tell the running search that input arrived, then wait it out.
    fn interrupt_and_join(&mut self) {
        if let Some(active) = self.active.take() {
            active.shared.note_command();
            active.shared.stop_all(true);
            if active.handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }

    fn go(&mut self, tokens: &[&str]) {
        self.interrupt_and_join();

        let params = GoParams::parse(tokens);
        let searchmoves: Vec<Move> = params
            .searchmoves
            .iter()
            .filter_map(|t| parse_uci_move(&self.position, t))
            .collect();
        let roots = RootMoves::new(
            &self.position,
            (!searchmoves.is_empty()).then_some(&searchmoves[..]),
        );

        let white_to_move = self.position.side_to_move() == shakmaty::Color::White;
        let time = TimeManager::configure(params.time_mode(white_to_move), params.ponder);
        let opts = SearchOptions {
            sd: params.depth.unwrap_or(MAX_SEARCH_DEPTH).clamp(1, MAX_PLY as i32),
            pondering: params.ponder,
            ..SearchOptions::default()
        };

        let shared = Arc::new(SharedState::new(
            Arc::clone(&self.tt),
            self.tb.clone(),
            time,
            self.config.threads,
            opts,
        ));

        let thread_shared = Arc::clone(&shared);
        let pos = self.position.clone();
        let handle = std::thread::spawn(move || {
            let report = smp::run(&thread_shared, &pos, &roots);
            match report.best_move {
                Some(best) => match report.ponder_move {
                    Some(ponder) => println!(
                        "bestmove {} ponder {}",
                        format_move(&best),
                        format_move(&ponder)
                    ),
                    None => println!("bestmove {}", format_move(&best)),
                },
                None => println!("bestmove 0000"),
            }
        });

        self.active = Some(ActiveSearch { shared, handle });
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.shared.set_pondering(false);
            active.shared.stop_all(true);
            if active.handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }

    fn ponderhit(&mut self) {
        if let Some(active) = &self.active {
            active.shared.time.activate();
            active.shared.set_pondering(false);
        }
    }

    fn setoption(&mut self, tokens: &[&str]) {
        self.interrupt_and_join();

        let name_idx = tokens.iter().position(|&t| t == "name");
        let value_idx = tokens.iter().position(|&t| t == "value");
        let (Some(ni), Some(vi)) = (name_idx, value_idx) else {
            return;
        };
        if ni + 1 > vi {
            return;
        }
        let name = tokens[ni + 1..vi].join(" ").to_lowercase();
        let value = tokens[vi + 1..].join(" ");

        match name.as_str() {
            "hash" => {
                if let Ok(mb) = value.parse::<usize>() {
                    self.config.hash_mb = mb.clamp(1, 4096);
                    self.tt = Arc::new(TranspositionTable::new(self.config.hash_mb));
                }
            }
            "threads" => {
                if let Ok(n) = value.parse::<usize>() {
                    self.config.threads = n.clamp(1, 256);
                }
            }
            "syzygypath" => {
                if value.is_empty() || value == "<empty>" {
                    self.config.syzygy_path = None;
                    self.tb = None;
                } else {
                    self.config.syzygy_path = Some(value.clone());
                    self.tb = SyzygyProber::new(&value).map(Arc::new);
                }
            }
            _ => {}
        }
    }
}

pub fn run() -> Result<(), UciError> {
    let stdin = io::stdin();
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = tokens.first() else {
            continue;
        };

        match command {
            "uci" => {
                println!("id name vesper");
                println!("id author vesper authors");
                println!("option name Hash type spin default 64 min 1 max 4096");
                println!("option name Threads type spin default 1 min 1 max 256");
                println!("option name SyzygyPath type string default <empty>");
                println!("option name Ponder type check default false");
                println!("uciok");
            }
            "isready" => println!("readyok"),
            "ucinewgame" => {
                engine.interrupt_and_join();
                engine.position = Position::startpos();
                engine.tt.clear();
            }
            "position" => {
                engine.interrupt_and_join();
                if let Err(err) = parse_position(&tokens, &mut engine.position) {
                    warn!("{err}");
                }
            }
            "go" => engine.go(&tokens),
            "stop" => engine.stop(),
            "ponderhit" => engine.ponderhit(),
            "setoption" => engine.setoption(&tokens),
            "eval" => {
                let (score, pv) = search::quiescence_score(&engine.position);
                let pv_str = pv.iter().map(format_move).collect::<Vec<_>>().join(" ");
                println!("info string qscore {score} pv {pv_str}");
            }
            "quit" => {
                engine.stop();
                break;
            }
            _ => {
                if engine.search_running() {
                    // Unknown input during a search is still input; the
                    // search notices at its next checkup.
                    if let Some(active) = &engine.active {
                        active.shared.note_command();
                    }
                } else {
                    warn!("unknown command: {command}");
                }
            }
        }
    }

    engine.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position_startpos_with_moves() {
        let mut pos = Position::startpos();
        let tokens = vec!["position", "startpos", "moves", "e2e4", "e7e5"];
        parse_position(&tokens, &mut pos).unwrap();
        assert_eq!(pos.ply(), 2);
    }

    #[test]
    fn parse_position_fen() {
        let mut pos = Position::startpos();
        let tokens = vec![
            "position",
            "fen",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR",
            "b",
            "KQkq",
            "e3",
            "0",
            "1",
        ];
        parse_position(&tokens, &mut pos).unwrap();
        assert_eq!(pos.side_to_move(), shakmaty::Color::Black);
    }

    #[test]
    fn parse_position_rejects_garbage() {
        let mut pos = Position::startpos();
        assert!(parse_position(&["position", "fen", "junk"], &mut pos).is_err());
        assert!(parse_position(&["position"], &mut pos).is_err());
        assert!(
            parse_position(&["position", "startpos", "moves", "e2e5"], &mut pos).is_err()
        );
    }

    #[test]
    fn parse_go_clock_and_depth() {
        let p = GoParams::parse(&["go", "wtime", "60000", "btime", "59000", "winc", "1000"]);
        assert_eq!(p.wtime, Some(60000));
        assert_eq!(p.btime, Some(59000));
        assert_eq!(p.winc, Some(1000));
        assert!(matches!(p.time_mode(true), TimeMode::Clock { .. }));

        let p = GoParams::parse(&["go", "depth", "9"]);
        assert_eq!(p.depth, Some(9));
        assert!(matches!(p.time_mode(true), TimeMode::Infinite));
    }

    #[test]
    fn parse_go_searchmoves_collects_tail() {
        let p = GoParams::parse(&["go", "depth", "5", "searchmoves", "e2e4", "d2d4"]);
        assert_eq!(p.searchmoves, vec!["e2e4", "d2d4"]);
    }

    #[test]
    fn move_formatting_covers_promotions_and_castling() {
        let pos = Position::from_fen("8/P7/8/8/8/8/8/K6k w - - 0 1").unwrap();
        let promo = parse_uci_move(&pos, "a7a8q");
        assert!(promo.is_some());
        assert!(promo.unwrap().is_promotion());

        let pos = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        )
        .unwrap();
        let castle = parse_uci_move(&pos, "e1g1");
        assert!(castle.is_some());
        assert_eq!(format_move(&castle.unwrap()), "e1g1");
    }

    #[test]
    fn mate_scores_format_as_mate_distance() {
        assert_eq!(format_score(CHECKMATE - 1), "score mate 1");
        assert_eq!(format_score(CHECKMATE - 3), "score mate 2");
        assert_eq!(format_score(-(CHECKMATE - 2)), "score mate -1");
        assert_eq!(format_score(120), "score cp 120");
    }

    #[test]
    fn illegal_uci_move_is_rejected() {
        let pos = Position::startpos();
        assert!(parse_uci_move(&pos, "e2e5").is_none());
        assert!(parse_uci_move(&pos, "e2e4").is_some());
    }
}
