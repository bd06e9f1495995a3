use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::piece::{Piece, PieceKind, Side};

const FILES: &[u8; 8] = b"abcdefgh";

/// A board coordinate. Row 0 is rank 8 (Black's back rank), col 0 is file a.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub row: usize,
    pub col: usize,
}

impl Square {
    pub const fn new(row: usize, col: usize) -> Self {
        Square { row, col }
    }

    /// Build a square from a file letter `a..h` and a rank digit `1..8`.
    pub fn from_chars(file: char, rank: char) -> Option<Square> {
        let col = FILES.iter().position(|&f| f as char == file)?;
        let rank = rank.to_digit(10)? as usize;
        if !(1..=8).contains(&rank) {
            return None;
        }
        Some(Square::new(8 - rank, col))
    }

    pub fn file_char(self) -> char {
        FILES[self.col] as char
    }

    pub fn rank_char(self) -> char {
        (b'8' - self.row as u8) as char
    }

    /// The square `dr` rows and `dc` columns away, if it is on the board.
    pub fn offset(self, dr: i32, dc: i32) -> Option<Square> {
        let r = self.row as i32 + dr;
        let c = self.col as i32 + dc;
        if Board::in_bounds(r, c) {
            Some(Square::new(r as usize, c as usize))
        } else {
            None
        }
    }
}

impl From<(usize, usize)> for Square {
    fn from((row, col): (usize, usize)) -> Self {
        Square::new(row, col)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid square `{0}`")]
pub struct SquareParseError(pub String);

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => Square::from_chars(file.to_ascii_lowercase(), rank)
                .ok_or_else(|| SquareParseError(s.to_string())),
            _ => Err(SquareParseError(s.to_string())),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Board {
    pub squares: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with no pieces. Useful for setting up test positions.
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// The standard starting position.
    pub fn new() -> Self {
        let mut board = Board::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for side in [Side::White, Side::Black] {
            let back_rank = side.back_rank();
            let pawn_rank = (back_rank as i32 + side.forward()) as usize;
            for (col, kind) in back.iter().enumerate() {
                board.squares[back_rank][col] = Some(Piece::new(*kind, side));
                board.squares[pawn_rank][col] = Some(Piece::new(PieceKind::Pawn, side));
            }
        }

        board
    }

    pub fn in_bounds(row: i32, col: i32) -> bool {
        (0..8).contains(&row) && (0..8).contains(&col)
    }

    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row][sq.col]
    }

    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// Put `piece` on `sq`, returning whatever stood there.
    pub fn place(&mut self, sq: Square, piece: Piece) -> Option<Piece> {
        self.squares[sq.row][sq.col].replace(piece)
    }

    pub fn remove(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.row][sq.col].take()
    }

    /// Move the piece on `from` to `to` and return the piece it displaced.
    /// Does nothing when `from` is empty.
    pub fn relocate(&mut self, from: Square, to: Square) -> Option<Piece> {
        match self.remove(from) {
            Some(piece) => self.place(to, piece),
            None => None,
        }
    }

    /// All squares in row-major order (a8, b8, ..., h1).
    pub fn all_squares() -> impl Iterator<Item = Square> {
        (0..8).flat_map(|r| (0..8).map(move |c| Square::new(r, c)))
    }

    /// Pieces of `side` in row-major order.
    pub fn pieces(&self, side: Side) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Self::all_squares().filter_map(move |sq| match self.get(sq) {
            Some(p) if p.side == side => Some((sq, p)),
            _ => None,
        })
    }

    pub fn piece_count(&self) -> usize {
        Self::all_squares().filter(|&sq| !self.is_empty(sq)).count()
    }
}

/// Text snapshot handed to the oracle: rank 8 first, `.` for empty squares.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.squares.iter().enumerate() {
            write!(f, "{} ", 8 - r)?;
            for sq in row {
                write!(f, " {}", sq.map(|p| p.fen_char()).unwrap_or('.'))?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}
