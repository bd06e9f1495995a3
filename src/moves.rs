use serde::{Deserialize, Serialize};

use crate::board::Square;
use crate::notation;
use crate::piece::{Piece, PieceKind, Side};

/// Structured form of an algebraic move string. Produced only by
/// [`notation::parse`]; carries no board knowledge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ParsedMove {
    pub kind: PieceKind,
    pub disambiguator_file: Option<char>,
    /// For castling tokens this is the White-relative king target (g1 or c1);
    /// use [`ParsedMove::target`] to get the square for the moving side.
    pub destination: Square,
    pub is_capture: bool,
    pub is_castle_kingside: bool,
    pub is_castle_queenside: bool,
}

impl ParsedMove {
    pub fn is_castle(&self) -> bool {
        self.is_castle_kingside || self.is_castle_queenside
    }

    /// Destination square for `side`. Castling targets are mirrored onto the
    /// side's back rank; everything else is the parsed destination.
    pub fn target(&self, side: Side) -> Square {
        if self.is_castle() {
            Square::new(side.back_rank(), self.destination.col)
        } else {
            self.destination
        }
    }
}

/// A move whose source square has been found and checked against the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMove {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
}

impl ResolvedMove {
    pub fn notation(&self) -> String {
        notation::describe(self.piece, self.from, self.to, self.captured)
    }

    /// Coordinate form, e.g. "e2e4".
    pub fn to_uci(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

/// One applied move in the session history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub side: Side,
}

impl MoveRecord {
    pub fn new(mv: ResolvedMove, side: Side) -> Self {
        MoveRecord {
            from: mv.from,
            to: mv.to,
            piece: mv.piece,
            captured: mv.captured,
            side,
        }
    }

    pub fn notation(&self) -> String {
        notation::describe(self.piece, self.from, self.to, self.captured)
    }
}

/// Parse coordinate notation such as "e2e4" or "e2-e4" into a square pair.
pub fn parse_coordinates(s: &str) -> Option<(Square, Square)> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();
    if cleaned.len() != 4 || !cleaned.is_ascii() {
        return None;
    }
    let from = cleaned[0..2].parse().ok()?;
    let to = cleaned[2..4].parse().ok()?;
    Some((from, to))
}
