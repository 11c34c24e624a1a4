use shakmaty::fen::Fen;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Position as _, Role};

/// Mutable search position: a `shakmaty::Chess` plus the undo and key
/// history the search needs for unmake and repetition detection.
///
/// Moves come from `legal_moves()`, so every move handed to
/// [`make_move`](Position::make_move) is legal by construction. Every
/// successful make is undone by exactly one matching unmake.
#[derive(Clone)]
pub struct Position {
    board: Chess,
    /// Zobrist key of the current position, kept in step with `board`.
    key: u64,
    /// Pre-move snapshots for unmake, search frames only.
    undo: Vec<Chess>,
    /// Zobrist keys of every earlier position (game history + search path).
    keys: Vec<u64>,
    /// Moves that produced the current position; `None` marks a null move.
    played: Vec<Option<Move>>,
}

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

impl Position {
    pub fn startpos() -> Self {
        Self::from_board(Chess::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let parsed: Fen = fen
            .parse()
            .map_err(|_| PositionError::InvalidFen(fen.to_string()))?;
        let board: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|_| PositionError::InvalidFen(fen.to_string()))?;
        Ok(Self::from_board(board))
    }

    fn from_board(board: Chess) -> Self {
        let key = Self::compute_key(&board);
        Self {
            board,
            key,
            undo: Vec::with_capacity(crate::types::MAX_PLY),
            keys: Vec::with_capacity(256),
            played: Vec::with_capacity(256),
        }
    }

    fn compute_key(board: &Chess) -> u64 {
        board.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
    }

    pub fn board(&self) -> &Chess {
        &self.board
    }

    /// Position before the most recent make, if any.
    pub fn previous(&self) -> Option<&Chess> {
        self.undo.last()
    }

    pub fn previous_move(&self) -> Option<Move> {
        self.played.last().copied().flatten()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.turn()
    }

    /// Half-moves since the last capture or pawn move.
    pub fn fifty(&self) -> u32 {
        self.board.halfmoves()
    }

    /// Search ply: make-frames since the search root.
    pub fn sply(&self) -> usize {
        self.undo.len()
    }

    /// Half-moves played from game start.
    pub fn ply(&self) -> usize {
        self.played.len()
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn in_check(&self) -> bool {
        self.board.is_check()
    }

    pub fn legal_moves(&self) -> MoveList {
        self.board.legal_moves()
    }

    pub fn piece_count(&self) -> usize {
        self.board.board().occupied().count()
    }

    /// Does `side` have anything besides pawns and king? Gates null-move
    /// pruning in zugzwang-prone endgames.
    pub fn has_non_pawn(&self, side: Color) -> bool {
        let board = self.board.board();
        let pieces = board.by_color(side)
            & !(board.by_role(Role::Pawn) | board.by_role(Role::King));
        !pieces.is_empty()
    }

    /// A position already counts as repeated at its first re-occurrence,
    /// so the search never plays into a hidden repetition just beyond the
    /// horizon. Only positions within the fifty-move window can repeat.
    pub fn is_repetition(&self) -> bool {
        let lookback = (self.fifty() as usize).min(self.keys.len());
        if lookback == 0 {
            return false;
        }
        let key = self.key;
        self.keys[self.keys.len() - lookback..]
            .iter()
            .rev()
            .any(|&k| k == key)
    }

    /// Apply a game move from the protocol layer. No undo frame is kept;
    /// the resulting position becomes the new search root.
    pub fn play_root_move(&mut self, m: Move) {
        self.keys.push(self.key);
        self.played.push(Some(m));
        self.board.play_unchecked(m);
        self.key = Self::compute_key(&self.board);
    }

    pub fn make_move(&mut self, m: Move) {
        self.undo.push(self.board.clone());
        self.keys.push(self.key);
        self.played.push(Some(m));
        self.board.play_unchecked(m);
        self.key = Self::compute_key(&self.board);
    }

    pub fn unmake_move(&mut self) {
        self.board = self.undo.pop().expect("unmake without matching make");
        self.key = self.keys.pop().expect("unmake without matching make");
        self.played.pop();
    }

    /// Pass the move to the opponent. Fails (and makes no frame) when the
    /// side to move is in check.
    pub fn make_null_move(&mut self) -> bool {
        match self.board.clone().swap_turn() {
            Ok(next) => {
                self.undo.push(self.board.clone());
                self.keys.push(self.key);
                self.played.push(None);
                self.board = next;
                self.key = Self::compute_key(&self.board);
                true
            }
            Err(_) => false,
        }
    }

    pub fn unmake_null_move(&mut self) {
        self.unmake_move();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_move(pos: &Position, uci: &str) -> Move {
        pos.legal_moves()
            .into_iter()
            .find(|m| crate::uci::format_move(m) == uci)
            .unwrap_or_else(|| panic!("no move {uci}"))
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let pos = Position::startpos();
        assert_eq!(pos.legal_moves().len(), 20);
        assert!(!pos.in_check());
        assert_eq!(pos.sply(), 0);
    }

    #[test]
    fn make_unmake_restores_key() {
        let mut pos = Position::startpos();
        let key = pos.key();
        let m = find_move(&pos, "e2e4");
        pos.make_move(m);
        assert_eq!(pos.sply(), 1);
        assert_ne!(pos.key(), key);
        pos.unmake_move();
        assert_eq!(pos.sply(), 0);
        assert_eq!(pos.key(), key);
    }

    #[test]
    fn repetition_detected_at_first_reoccurrence() {
        let mut pos = Position::startpos();
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            assert!(!pos.is_repetition());
            let m = find_move(&pos, uci);
            pos.make_move(m);
        }
        assert!(pos.is_repetition());
    }

    #[test]
    fn null_move_swaps_side() {
        let mut pos = Position::startpos();
        let stm = pos.side_to_move();
        assert!(pos.make_null_move());
        assert_eq!(pos.side_to_move(), !stm);
        pos.unmake_null_move();
        assert_eq!(pos.side_to_move(), stm);
    }

    #[test]
    fn null_move_rejected_in_check() {
        let pos =
            Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2")
                .unwrap();
        let mut pos = pos;
        let m = find_move(&pos, "d8h4");
        pos.make_move(m);
        assert!(pos.in_check());
        assert!(!pos.make_null_move());
    }

    #[test]
    fn has_non_pawn_in_pawn_endgame() {
        let pos = Position::from_fen("8/8/8/8/8/4k3/4P3/4K3 w - - 0 1").unwrap();
        assert!(!pos.has_non_pawn(shakmaty::Color::White));
        assert!(!pos.has_non_pawn(shakmaty::Color::Black));

        let pos = Position::from_fen("8/8/8/8/8/4k3/4P3/4K2R w - - 0 1").unwrap();
        assert!(pos.has_non_pawn(shakmaty::Color::White));
    }

    #[test]
    fn invalid_fen_is_rejected() {
        assert!(Position::from_fen("not a fen").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    }
}
