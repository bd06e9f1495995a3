// =============================================================================
// Candidate resolution
//
// Finds the source square for a parsed move. This is a heuristic search, not
// move generation: pawns are matched by file and direction, every other piece
// by kind and distance alone. The scan order is part of the contract; when
// several pieces qualify equally, the first one found wins.
// =============================================================================

use tracing::debug;

use crate::board::{Board, Square};
use crate::moves::ParsedMove;
use crate::piece::{PieceKind, Side};

/// The king's file, the source of every castling move.
const KING_FILE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no {side:?} {kind:?} can be matched to {destination}")]
pub struct UnresolvedMove {
    pub kind: PieceKind,
    pub side: Side,
    pub destination: Square,
}

/// Source square for `parsed`, or `None` when no piece of `side` fits.
pub fn resolve(parsed: &ParsedMove, board: &Board, side: Side) -> Option<Square> {
    let from = if parsed.is_castle() {
        Some(Square::new(side.back_rank(), KING_FILE))
    } else {
        match parsed.kind {
            PieceKind::Pawn => resolve_pawn(parsed, board, side),
            kind => resolve_piece(
                kind,
                parsed.disambiguator_file,
                parsed.destination,
                board,
                side,
            ),
        }
    };
    debug!(?parsed, ?side, ?from, "resolved source square");
    from
}

/// Like [`resolve`], but reports a miss as an error for `?` chaining.
pub fn resolve_source(
    parsed: &ParsedMove,
    board: &Board,
    side: Side,
) -> Result<Square, UnresolvedMove> {
    resolve(parsed, board, side).ok_or(UnresolvedMove {
        kind: parsed.kind,
        side,
        destination: parsed.target(side),
    })
}

fn file_index(file: char) -> Option<usize> {
    ('a'..='h').position(|f| f == file)
}

fn is_own_pawn(board: &Board, sq: Square, side: Side) -> bool {
    board
        .get(sq)
        .map(|p| p.kind == PieceKind::Pawn && p.side == side)
        .unwrap_or(false)
}

/// Whether a pawn of `side` on `row` still has to move forward to reach `dest_row`.
fn is_behind(row: usize, dest_row: usize, side: Side) -> bool {
    match side {
        Side::Black => row < dest_row,
        Side::White => row > dest_row,
    }
}

fn resolve_pawn(parsed: &ParsedMove, board: &Board, side: Side) -> Option<Square> {
    let dest = parsed.destination;
    let file = match parsed.disambiguator_file {
        Some(f) => file_index(f)?,
        None => dest.col,
    };

    // Exact file, scanning from the side's own end of the board.
    if parsed.is_capture || board.is_empty(dest) {
        let rows: Vec<usize> = match side {
            Side::Black => (0..8).collect(),
            Side::White => (0..8).rev().collect(),
        };
        let hit = rows
            .into_iter()
            .map(|row| Square::new(row, file))
            .find(|&sq| is_own_pawn(board, sq, side) && is_behind(sq.row, dest.row, side));
        if hit.is_some() {
            return hit;
        }
    }

    // Any pawn in row-major order: same file behind the destination, or one
    // diagonal step away from it.
    Board::all_squares().find(|&sq| {
        if !is_own_pawn(board, sq, side) {
            return false;
        }
        let same_file = sq.col == dest.col && is_behind(sq.row, dest.row, side);
        let diagonal = sq.col.abs_diff(dest.col) == 1
            && sq.row as i32 + side.forward() == dest.row as i32;
        same_file || diagonal
    })
}

/// King-step distance between two squares.
fn distance(a: Square, b: Square) -> usize {
    a.row.abs_diff(b.row).max(a.col.abs_diff(b.col))
}

/// Nearest piece of `kind` to the destination; row-major order breaks ties.
/// Whether the piece can actually get there is never checked.
fn resolve_piece(
    kind: PieceKind,
    disambiguator_file: Option<char>,
    dest: Square,
    board: &Board,
    side: Side,
) -> Option<Square> {
    let file = match disambiguator_file {
        Some(f) => Some(file_index(f)?),
        None => None,
    };
    let mut best: Option<Square> = None;
    for (sq, piece) in board.pieces(side) {
        if piece.kind != kind || file.map_or(false, |f| sq.col != f) {
            continue;
        }
        // Strict comparison keeps the earliest square on equal distance.
        if best.map_or(true, |b| distance(sq, dest) < distance(b, dest)) {
            best = Some(sq);
        }
    }
    best
}
