// =============================================================================
// Fallback move generator
//
// Supplies a move whenever the oracle's reply cannot be parsed, resolved or
// validated. The strategies are tried in a fixed order and each one scans the
// board in a fixed order, so the same position always yields the same move:
//
//   1. push a pawn one square forward into an empty square
//   2. bring a knight or bishop to an empty centre square
//   3. move any non-pawn piece to the first empty square on the board
//   4. pawn push again
//   5. the default e-pawn double step
//
// Step 5 is reached only on contrived boards (no empty square anywhere useful).
// Its source square may not even hold a piece; callers must check.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::board::{Board, Square};
use crate::moves::ResolvedMove;
use crate::piece::{Piece, PieceKind, Side};

/// Centre squares in the order they are tried: d5, e5, d4, e4, then the
/// diagonal neighbours c6, f6, c3, f3.
const CENTRE_SQUARES: [(usize, usize); 8] = [
    (3, 3), (3, 4), (4, 3), (4, 4),
    (2, 2), (2, 5), (5, 2), (5, 5),
];

/// File of the pawn used by the default move.
const DEFAULT_FILE: usize = 4;

/// Which step of the priority list produced a fallback move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FallbackStrategy {
    PawnPush,
    CentralizeMinor,
    AnyPiece,
    PawnRescan,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackMove {
    pub mv: ResolvedMove,
    pub strategy: FallbackStrategy,
}

/// Always returns a move for `side`. See the module header for the order.
pub fn fallback(board: &Board, side: Side) -> ResolvedMove {
    fallback_with_strategy(board, side).mv
}

pub fn fallback_with_strategy(board: &Board, side: Side) -> FallbackMove {
    let (mv, strategy) = if let Some(mv) = pawn_push(board, side) {
        (mv, FallbackStrategy::PawnPush)
    } else if let Some(mv) = centralize_minor(board, side) {
        (mv, FallbackStrategy::CentralizeMinor)
    } else if let Some(mv) = any_piece(board, side) {
        (mv, FallbackStrategy::AnyPiece)
    } else if let Some(mv) = pawn_push(board, side) {
        (mv, FallbackStrategy::PawnRescan)
    } else {
        (default_move(board, side), FallbackStrategy::Default)
    };
    debug!(?side, ?strategy, from = %mv.from, to = %mv.to, "fallback move");
    FallbackMove { mv, strategy }
}

fn quiet(from: Square, to: Square, piece: Piece) -> ResolvedMove {
    ResolvedMove {
        from,
        to,
        piece,
        captured: None,
    }
}

/// First pawn (ascending row, then column) with an empty square ahead.
fn pawn_push(board: &Board, side: Side) -> Option<ResolvedMove> {
    board
        .pieces(side)
        .filter(|(_, p)| p.kind == PieceKind::Pawn)
        .find_map(|(from, piece)| {
            let to = from.offset(side.forward(), 0)?;
            board.is_empty(to).then(|| quiet(from, to, piece))
        })
}

fn centralize_minor(board: &Board, side: Side) -> Option<ResolvedMove> {
    board
        .pieces(side)
        .filter(|(_, p)| matches!(p.kind, PieceKind::Knight | PieceKind::Bishop))
        .find_map(|(from, piece)| {
            CENTRE_SQUARES
                .iter()
                .map(|&sq| Square::from(sq))
                .find(|&to| board.is_empty(to))
                .map(|to| quiet(from, to, piece))
        })
}

/// First non-pawn piece to the first empty square, both in row-major order.
fn any_piece(board: &Board, side: Side) -> Option<ResolvedMove> {
    let (from, piece) = board
        .pieces(side)
        .find(|(_, p)| p.kind != PieceKind::Pawn)?;
    let to = Board::all_squares().find(|&sq| board.is_empty(sq))?;
    Some(quiet(from, to, piece))
}

/// The e-pawn double step: e7-e5 for Black, e2-e4 for White. The board is
/// only read to fill in whatever actually stands on the two squares.
fn default_move(board: &Board, side: Side) -> ResolvedMove {
    let pawn_row = (side.back_rank() as i32 + side.forward()) as usize;
    let target_row = (pawn_row as i32 + 2 * side.forward()) as usize;
    let from = Square::new(pawn_row, DEFAULT_FILE);
    let to = Square::new(target_row, DEFAULT_FILE);
    ResolvedMove {
        from,
        to,
        piece: board
            .get(from)
            .unwrap_or(Piece::new(PieceKind::Pawn, side)),
        captured: board.get(to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn starting_position_pushes_the_a_pawn() {
        let board = Board::new();
        let black = fallback_with_strategy(&board, Side::Black);
        assert_eq!(black.strategy, FallbackStrategy::PawnPush);
        assert_eq!(black.mv.from, Square::new(1, 0));
        assert_eq!(black.mv.to, Square::new(2, 0));

        let white = fallback(&board, Side::White);
        assert_eq!(white.from, sq("a2"));
        assert_eq!(white.to, sq("a3"));
    }

    #[test]
    fn blocked_pawns_are_skipped() {
        let mut board = Board::new();
        // Block a7 and b7 with white pieces.
        board.place(sq("a6"), Piece::new(PieceKind::Knight, Side::White));
        board.place(sq("b6"), Piece::new(PieceKind::Knight, Side::White));
        let mv = fallback(&board, Side::Black);
        assert_eq!(mv.from, sq("c7"));
        assert_eq!(mv.to, sq("c6"));
    }

    #[test]
    fn minor_piece_goes_to_first_free_centre_square() {
        let mut board = Board::empty();
        board.place(sq("a8"), Piece::new(PieceKind::Rook, Side::Black));
        board.place(sq("c8"), Piece::new(PieceKind::Bishop, Side::Black));
        board.place(sq("g8"), Piece::new(PieceKind::Knight, Side::Black));
        board.place(sq("d5"), Piece::new(PieceKind::Pawn, Side::White));
        board.place(sq("e5"), Piece::new(PieceKind::Pawn, Side::White));

        let got = fallback_with_strategy(&board, Side::Black);
        assert_eq!(got.strategy, FallbackStrategy::CentralizeMinor);
        // c8 is found before g8; d5 and e5 are taken, d4 is next.
        assert_eq!(got.mv.from, sq("c8"));
        assert_eq!(got.mv.to, sq("d4"));
        assert_eq!(got.mv.captured, None);
    }

    #[test]
    fn any_piece_moves_to_first_empty_square() {
        let mut board = Board::empty();
        board.place(sq("h1"), Piece::new(PieceKind::King, Side::Black));
        board.place(sq("a8"), Piece::new(PieceKind::Pawn, Side::White));
        let got = fallback_with_strategy(&board, Side::Black);
        assert_eq!(got.strategy, FallbackStrategy::AnyPiece);
        assert_eq!(got.mv.from, sq("h1"));
        assert_eq!(got.mv.to, sq("b8"));
    }

    #[test]
    fn full_board_gets_the_default_move() {
        let mut board = Board::empty();
        for sq in Board::all_squares() {
            let side = if sq.row < 4 { Side::Black } else { Side::White };
            let kind = if sq.row == 1 || sq.row == 6 {
                PieceKind::Pawn
            } else {
                PieceKind::Rook
            };
            board.place(sq, Piece::new(kind, side));
        }

        let black = fallback_with_strategy(&board, Side::Black);
        assert_eq!(black.strategy, FallbackStrategy::Default);
        assert_eq!(black.mv.from, sq("e7"));
        assert_eq!(black.mv.to, sq("e5"));

        let white = fallback_with_strategy(&board, Side::White);
        assert_eq!(white.strategy, FallbackStrategy::Default);
        assert_eq!(white.mv.from, sq("e2"));
        assert_eq!(white.mv.to, sq("e4"));
    }

    #[test]
    fn fallback_is_deterministic() {
        let mut board = Board::new();
        board.relocate(sq("e2"), sq("e4"));
        for side in [Side::White, Side::Black] {
            assert_eq!(fallback(&board, side), fallback(&board, side));
        }
    }

    /// Random positions that keep a king for `side` and at least one empty
    /// square must always get a move of one of `side`'s own pieces.
    #[test]
    fn fallback_moves_an_own_piece_on_random_boards() {
        let mut rng = StdRng::seed_from_u64(7);
        let kinds = [
            PieceKind::Pawn,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ];

        for _ in 0..500 {
            let side = if rng.gen_bool(0.5) { Side::White } else { Side::Black };
            let mut board = Board::empty();
            for sq in Board::all_squares() {
                if rng.gen_bool(0.4) {
                    let kind = kinds[rng.gen_range(0..kinds.len())];
                    let owner = if rng.gen_bool(0.5) { Side::White } else { Side::Black };
                    board.place(sq, Piece::new(kind, owner));
                }
            }
            let king = Square::new(rng.gen_range(0..8), rng.gen_range(0..8));
            board.place(king, Piece::new(PieceKind::King, side));
            let hole = Board::all_squares().find(|&s| s != king).unwrap();
            board.remove(hole);

            let got = fallback_with_strategy(&board, side);
            assert_ne!(got.strategy, FallbackStrategy::Default);
            let mover = board.get(got.mv.from).expect("source square is occupied");
            assert_eq!(mover.side, side);
            assert_eq!(mover, got.mv.piece);
            assert!(board.is_empty(got.mv.to), "fallback never captures");
        }
    }
}
