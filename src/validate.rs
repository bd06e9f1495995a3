use crate::board::{Board, Square};
use crate::moves::ResolvedMove;
use crate::piece::{Piece, Side};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    #[error("no piece on {0}")]
    EmptySource(Square),
    #[error("{piece:?} on {square} does not belong to {side:?}")]
    WrongSide {
        square: Square,
        piece: Piece,
        side: Side,
    },
    #[error("{square} is occupied by {side:?}'s own {piece:?}")]
    SelfCapture {
        square: Square,
        piece: Piece,
        side: Side,
    },
}

/// Check that `side` may move the piece on `from` to `to`.
///
/// Only ownership is checked: the source must hold a piece of `side` and the
/// destination must not. Geometry, paths and check are ignored.
pub fn validate(
    from: Square,
    to: Square,
    board: &Board,
    side: Side,
) -> Result<ResolvedMove, InvalidMove> {
    let piece = board.get(from).ok_or(InvalidMove::EmptySource(from))?;
    if piece.side != side {
        return Err(InvalidMove::WrongSide {
            square: from,
            piece,
            side,
        });
    }

    let captured = board.get(to);
    if let Some(target) = captured {
        if target.side == side {
            return Err(InvalidMove::SelfCapture {
                square: to,
                piece: target,
                side,
            });
        }
    }

    Ok(ResolvedMove {
        from,
        to,
        piece,
        captured,
    })
}
