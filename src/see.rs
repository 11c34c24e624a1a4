//! Static exchange evaluation: swap-based capture-sequence estimate
//! without making any moves.

use shakmaty::{attacks, Bitboard, Chess, Color, Move, Position as _, Role, Square};

use crate::position::Position;
use crate::types::Score;

/// Exchange values; the king value keeps the swap loop from ever trading
/// it profitably.
const SEE_VALUE: [Score; 6] = [100, 325, 325, 500, 1000, 20_000];

fn value(role: Role) -> Score {
    SEE_VALUE[role as usize - 1]
}

fn attackers_to(board: &shakmaty::Board, sq: Square, occupied: Bitboard) -> Bitboard {
    board.attacks_to(sq, Color::White, occupied) | board.attacks_to(sq, Color::Black, occupied)
}

fn least_attacker(board: &shakmaty::Board, set: Bitboard) -> Option<(Square, Role)> {
    for role in [
        Role::Pawn,
        Role::Knight,
        Role::Bishop,
        Role::Rook,
        Role::Queen,
        Role::King,
    ] {
        if let Some(sq) = (set & board.by_role(role)).first() {
            return Some((sq, role));
        }
    }
    None
}

/// Does playing `m` keep the exchange on its target square at or above
/// `threshold` (in centipawns), assuming both sides capture greedily with
/// their least valuable attacker?
pub fn see_ge(pos: &Position, m: Move, threshold: Score) -> bool {
    see_ge_on(pos.board(), m, threshold)
}

/// Same as [`see_ge`], callable after `m` has already been made: evaluates
/// against the pre-move position on the undo stack.
pub fn see_post_ge(pos: &Position, m: Move, threshold: Score) -> bool {
    let before = pos
        .previous()
        .expect("post-move SEE without a made move");
    see_ge_on(before, m, threshold)
}

fn see_ge_on(chess: &Chess, m: Move, threshold: Score) -> bool {
    let board = chess.board();
    let Some(from) = m.from() else {
        return 0 >= threshold;
    };
    let to = m.to();

    let mut balance = match m.capture() {
        Some(victim) => value(victim) - threshold,
        None => -threshold,
    };
    if balance < 0 {
        return false;
    }

    // Worst case: our piece is taken for free after the capture.
    balance -= value(m.role());
    if balance >= 0 {
        return true;
    }

    let mut occupied =
        (board.occupied() ^ Bitboard::from_square(from)) | Bitboard::from_square(to);
    let mut attackers = attackers_to(board, to, occupied) & occupied;

    let diagonal = board.by_role(Role::Bishop) | board.by_role(Role::Queen);
    let straight = board.by_role(Role::Rook) | board.by_role(Role::Queen);

    let mut stm = !chess.turn();

    loop {
        attackers &= occupied;
        let ours = attackers & board.by_color(stm);
        if ours.is_empty() {
            break;
        }

        let (sq, role) = least_attacker(board, ours).expect("non-empty attacker set");

        // Reveal x-ray attackers behind the piece that just captured.
        occupied ^= Bitboard::from_square(sq);
        if matches!(role, Role::Pawn | Role::Bishop | Role::Queen) {
            attackers |= attacks::bishop_attacks(to, occupied) & diagonal;
        }
        if matches!(role, Role::Rook | Role::Queen) {
            attackers |= attacks::rook_attacks(to, occupied) & straight;
        }

        stm = !stm;
        balance = -balance - 1 - value(role);
        if balance >= 0 {
            // A king capture into remaining enemy attackers is illegal,
            // so the exchange ends one step earlier.
            if role == Role::King && !(attackers & occupied & board.by_color(stm)).is_empty() {
                stm = !stm;
            }
            break;
        }
    }

    stm != chess.turn()
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
    fn free_pawn_capture_is_winning() {
        // Queen takes an undefended pawn.
        let pos = Position::from_fen("4k3/8/8/4p3/8/8/4Q3/4K3 w - - 0 1").unwrap();
        let m = find_move(&pos, "e2e5");
        assert!(see_ge(&pos, m, 0));
        assert!(see_ge(&pos, m, 100));
        assert!(!see_ge(&pos, m, 200));
    }

    #[test]
    fn queen_takes_defended_pawn_loses_material() {
        let pos = Position::from_fen("4k3/8/3p4/4p3/8/8/4Q3/4K3 w - - 0 1").unwrap();
        let m = find_move(&pos, "e2e5");
        assert!(!see_ge(&pos, m, 0));
        // Still above the value of losing a whole queen for nothing.
        assert!(see_ge(&pos, m, -1000));
    }

    #[test]
    fn rook_takes_defended_rook_is_even() {
        let pos = Position::from_fen("r3k3/8/8/r7/8/8/8/R3K3 w - - 0 1").unwrap();
        let m = find_move(&pos, "a1a5");
        assert!(!see_ge(&pos, m, 1));
        assert!(see_ge(&pos, m, 0));
    }

    #[test]
    fn quiet_move_into_defended_square_fails() {
        // Rook steps onto a square covered by a pawn.
        let pos = Position::from_fen("4k3/8/2p5/8/3R4/8/8/4K3 w - - 0 1").unwrap();
        let m = find_move(&pos, "d4d5");
        assert!(!see_ge(&pos, m, 0));
    }

    #[test]
    fn xray_recapture_counts() {
        // Rxe5 is met by Rxe5, but our queen behind the rook recaptures.
        let pos = Position::from_fen("4k3/4r3/8/4p3/8/8/4R3/4Q1K1 w - - 0 1").unwrap();
        let m = find_move(&pos, "e2e5");
        assert!(see_ge(&pos, m, 0));
    }

    #[test]
    fn post_move_variant_matches_pre_move() {
        let mut pos = Position::from_fen("4k3/8/3p4/4p3/8/8/4Q3/4K3 w - - 0 1").unwrap();
        let m = find_move(&pos, "e2e5");
        let before = see_ge(&pos, m, 0);
        pos.make_move(m);
        assert_eq!(see_post_ge(&pos, m, 0), before);
        pos.unmake_move();
    }
}
