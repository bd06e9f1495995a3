// =============================================================================
// Game session
//
// Owns the board, the side to move and the move history. White is the human
// and always arrives with a concrete (from, to) pair; Black is the oracle and
// arrives as raw text that goes through parse -> resolve -> validate. Any
// failure on the oracle's side is replaced by the fallback move, so every
// oracle turn ends with Black having moved (or, on a degenerate board, with
// the turn passed) and White to play.
// =============================================================================

use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::board::{Board, Square};
use crate::fallback::{fallback_with_strategy, FallbackStrategy};
use crate::moves::{MoveRecord, ResolvedMove};
use crate::notation::{self, MalformedNotation};
use crate::oracle::{Oracle, OracleConfig, OracleError, OracleRequest};
use crate::piece::Side;
use crate::resolve::{resolve_source, UnresolvedMove};
use crate::validate::{validate, InvalidMove};

pub const HUMAN_SIDE: Side = Side::White;
pub const ORACLE_SIDE: Side = Side::Black;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    AwaitingHumanMove,
    AwaitingOracleMove,
}

impl Phase {
    fn for_side(side: Side) -> Phase {
        if side == HUMAN_SIDE {
            Phase::AwaitingHumanMove
        } else {
            Phase::AwaitingOracleMove
        }
    }
}

/// Why the oracle's reply was not used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Malformed(#[from] MalformedNotation),
    #[error(transparent)]
    Unresolved(#[from] UnresolvedMove),
    #[error(transparent)]
    Invalid(#[from] InvalidMove),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("move not accepted while {phase:?}")]
    OutOfTurn { phase: Phase },
    #[error(transparent)]
    Invalid(#[from] InvalidMove),
}

fn serialize_reason<S: Serializer>(reason: &ResolutionError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

/// Where the move played on an oracle turn came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveSource {
    Oracle,
    Fallback {
        #[serde(serialize_with = "serialize_reason")]
        reason: ResolutionError,
        strategy: FallbackStrategy,
    },
    /// Not even the fallback produced a playable move; the turn was passed.
    Degenerate {
        #[serde(serialize_with = "serialize_reason")]
        reason: ResolutionError,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OracleTurn {
    /// The oracle's reply, if it produced one.
    pub raw: Option<String>,
    pub source: MoveSource,
    pub record: Option<MoveRecord>,
}

impl OracleTurn {
    pub fn used_fallback(&self) -> bool {
        !matches!(self.source, MoveSource::Oracle)
    }

    /// Notation of the move actually played, if any.
    pub fn notation(&self) -> Option<String> {
        self.record.map(|r| r.notation())
    }
}

/// Read-only view of the session for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameState {
    pub board: Board,
    pub side: Side,
    pub phase: Phase,
    pub history: Vec<MoveRecord>,
    pub notation: Vec<String>,
    pub last_move: Option<String>,
}

/// One human move followed by the oracle's answer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundReport {
    pub human: MoveRecord,
    pub human_notation: String,
    pub oracle: OracleTurn,
    pub state: GameState,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    board: Board,
    side: Side,
    phase: Phase,
    history: Vec<MoveRecord>,
    transcript: Vec<String>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        GameSession {
            board: Board::new(),
            side: HUMAN_SIDE,
            phase: Phase::AwaitingHumanMove,
            history: Vec::new(),
            transcript: Vec::new(),
        }
    }

    /// Start from an arbitrary position with `side` to move.
    pub fn with_board(board: Board, side: Side) -> Self {
        GameSession {
            board,
            side,
            phase: Phase::for_side(side),
            history: Vec::new(),
            transcript: Vec::new(),
        }
    }

    /// Back to the starting position, whatever state the session was in.
    pub fn initialize(&mut self) {
        *self = GameSession::new();
        info!("new game");
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn notation_history(&self) -> Vec<String> {
        self.history.iter().map(|r| r.notation()).collect()
    }

    pub fn state(&self) -> GameState {
        GameState {
            board: self.board.clone(),
            side: self.side,
            phase: self.phase,
            history: self.history.clone(),
            notation: self.notation_history(),
            last_move: self.history.last().map(|r| r.notation()),
        }
    }

    fn expect_phase(&self, phase: Phase) -> Result<(), SessionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SessionError::OutOfTurn { phase: self.phase })
        }
    }

    fn apply(&mut self, mv: ResolvedMove) -> MoveRecord {
        self.board.relocate(mv.from, mv.to);
        let record = MoveRecord::new(mv, self.side);
        self.history.push(record);
        record
    }

    fn pass_turn(&mut self) {
        self.side = self.side.opposite();
        self.phase = Phase::for_side(self.side);
    }

    /// Apply the human's move. The board is untouched on error.
    pub fn play_human(&mut self, from: Square, to: Square) -> Result<MoveRecord, SessionError> {
        self.expect_phase(Phase::AwaitingHumanMove)?;
        let mv = validate(from, to, &self.board, self.side)?;
        let record = self.apply(mv);
        info!(side = ?record.side, notation = %record.notation(), "human move");
        self.pass_turn();
        Ok(record)
    }

    /// What the oracle is shown for the coming turn.
    pub fn oracle_request(&self, config: &OracleConfig) -> OracleRequest {
        let skip = self.transcript.len().saturating_sub(config.transcript_window);
        OracleRequest {
            side: self.side,
            board: self.board.to_string(),
            last_move: self.history.last().map(|r| r.notation()),
            history: self.notation_history(),
            transcript: self.transcript[skip..].to_vec(),
            config: config.clone(),
        }
    }

    fn resolve_reply(
        &self,
        reply: Result<String, OracleError>,
    ) -> Result<ResolvedMove, ResolutionError> {
        let raw = reply?;
        if raw.trim().is_empty() {
            return Err(OracleError::EmptyReply.into());
        }
        let parsed = notation::parse(&raw)?;
        let from = resolve_source(&parsed, &self.board, self.side)?;
        Ok(validate(from, parsed.target(self.side), &self.board, self.side)?)
    }

    /// Play the oracle's turn from its reply. Never fails once it is the
    /// oracle's turn: a bad reply is swapped for the fallback move.
    pub fn apply_oracle_reply(
        &mut self,
        reply: Result<String, OracleError>,
    ) -> Result<OracleTurn, SessionError> {
        self.expect_phase(Phase::AwaitingOracleMove)?;
        let raw = reply.as_ref().ok().cloned();

        let (mv, source) = match self.resolve_reply(reply) {
            Ok(mv) => (Some(mv), MoveSource::Oracle),
            Err(reason) => {
                let fb = fallback_with_strategy(&self.board, self.side);
                match validate(fb.mv.from, fb.mv.to, &self.board, self.side) {
                    Ok(mv) => {
                        warn!(
                            %reason,
                            strategy = ?fb.strategy,
                            "oracle move rejected, using fallback"
                        );
                        (
                            Some(mv),
                            MoveSource::Fallback {
                                reason,
                                strategy: fb.strategy,
                            },
                        )
                    }
                    Err(err) => {
                        warn!(%reason, %err, "no playable fallback, passing the turn");
                        (None, MoveSource::Degenerate { reason })
                    }
                }
            }
        };

        let human_move = self.history.last().map(|r| r.notation());
        let record = mv.map(|mv| self.apply(mv));
        if let (Some(r), MoveSource::Oracle) = (&record, &source) {
            info!(raw = raw.as_deref().unwrap_or(""), notation = %r.notation(), "oracle move");
        }

        self.transcript.push(format!(
            "Human: {} -> AI: {}{}",
            human_move.as_deref().unwrap_or("-"),
            record.map(|r| r.notation()).unwrap_or_else(|| "-".to_string()),
            if matches!(source, MoveSource::Oracle) { "" } else { " (fallback)" },
        ));
        self.pass_turn();

        Ok(OracleTurn {
            raw,
            source,
            record,
        })
    }

    /// Ask `oracle` for a move and play it (or the fallback).
    pub fn play_oracle_turn<O: Oracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        config: &OracleConfig,
    ) -> Result<OracleTurn, SessionError> {
        self.expect_phase(Phase::AwaitingOracleMove)?;
        let request = self.oracle_request(config);
        let reply = oracle.suggest_move(&request);
        self.apply_oracle_reply(reply)
    }

    /// A full exchange: the human's move, then the oracle's answer.
    pub fn play_round<O: Oracle + ?Sized>(
        &mut self,
        from: Square,
        to: Square,
        oracle: &mut O,
        config: &OracleConfig,
    ) -> Result<RoundReport, SessionError> {
        let human = self.play_human(from, to)?;
        let oracle = self.play_oracle_turn(oracle, config)?;
        Ok(RoundReport {
            human,
            human_notation: human.notation(),
            oracle,
            state: self.state(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ScriptedOracle;
    use crate::piece::{Piece, PieceKind};

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn black_to_move() -> GameSession {
        GameSession::with_board(Board::new(), Side::Black)
    }

    fn reply(s: &str) -> Result<String, OracleError> {
        Ok(s.to_string())
    }

    #[test]
    fn oracle_pawn_move_is_played() {
        let mut game = black_to_move();
        let turn = game.apply_oracle_reply(reply("e5")).unwrap();
        assert_eq!(turn.source, MoveSource::Oracle);
        let record = turn.record.unwrap();
        assert_eq!(record.from, Square::new(1, 4));
        assert_eq!(record.to, Square::new(3, 4));
        assert_eq!(record.side, Side::Black);
        assert_eq!(game.side(), Side::White);
        assert_eq!(game.phase(), Phase::AwaitingHumanMove);
    }

    #[test]
    fn oracle_knight_move_is_played() {
        let mut game = black_to_move();
        let record = game.apply_oracle_reply(reply("Nf6")).unwrap().record.unwrap();
        assert_eq!(record.from, Square::new(0, 6));
        assert_eq!(record.to, Square::new(2, 5));
        assert_eq!(
            game.board().get(sq("f6")),
            Some(Piece::new(PieceKind::Knight, Side::Black))
        );
    }

    #[test]
    fn malformed_reply_falls_back_to_first_pawn_push() {
        let mut game = black_to_move();
        let turn = game.apply_oracle_reply(reply("Zz9")).unwrap();
        assert!(turn.used_fallback());
        assert!(matches!(
            turn.source,
            MoveSource::Fallback {
                reason: ResolutionError::Malformed(_),
                strategy: FallbackStrategy::PawnPush,
            }
        ));
        let record = turn.record.unwrap();
        assert_eq!(record.from, Square::new(1, 0));
        assert_eq!(record.to, Square::new(2, 0));
        assert_eq!(turn.raw.as_deref(), Some("Zz9"));
    }

    /// Play one oracle turn from the starting position and return why the
    /// reply was replaced.
    fn fallback_reason(input: Result<String, OracleError>) -> ResolutionError {
        let mut game = black_to_move();
        let turn = game.apply_oracle_reply(input).unwrap();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.side(), Side::White);
        match turn.source {
            MoveSource::Fallback { reason, .. } => reason,
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn every_failure_kind_still_advances_the_game() {
        assert!(matches!(
            fallback_reason(Err(OracleError::Unavailable("timeout".to_string()))),
            ResolutionError::Oracle(OracleError::Unavailable(_))
        ));
        assert!(matches!(
            fallback_reason(reply("   ")),
            ResolutionError::Oracle(OracleError::EmptyReply)
        ));
        assert!(matches!(
            fallback_reason(reply("x")),
            ResolutionError::Malformed(MalformedNotation::TooShort(_))
        ));
        // The a8 rook is nearest to a7, which holds Black's own pawn.
        assert!(matches!(
            fallback_reason(reply("Ra7")),
            ResolutionError::Invalid(InvalidMove::SelfCapture { .. })
        ));
    }

    #[test]
    fn phantom_piece_is_unresolved() {
        let mut board = Board::new();
        board.remove(sq("d8"));
        let mut game = GameSession::with_board(board, Side::Black);
        let turn = game.apply_oracle_reply(reply("Qh4")).unwrap();
        assert!(matches!(
            turn.source,
            MoveSource::Fallback {
                reason: ResolutionError::Unresolved(_),
                ..
            }
        ));
    }

    #[test]
    fn castle_moves_only_the_king() {
        let mut game = GameSession::new();
        game.play_human(sq("e2"), sq("e4")).unwrap();
        let mut board = game.board().clone();
        board.remove(sq("f8"));
        board.remove(sq("g8"));
        let mut game = GameSession::with_board(board, Side::Black);

        let record = game.apply_oracle_reply(reply("o-o")).unwrap().record.unwrap();
        assert_eq!(record.from, Square::new(0, 4));
        assert_eq!(record.to, Square::new(0, 6));
        assert_eq!(record.notation(), "O-O");
        assert_eq!(
            game.board().get(sq("h8")),
            Some(Piece::new(PieceKind::Rook, Side::Black))
        );
    }

    #[test]
    fn castle_into_own_knight_falls_back() {
        let mut game = GameSession::new();
        game.play_human(sq("e2"), sq("e4")).unwrap();
        let turn = game.apply_oracle_reply(reply("O-O")).unwrap();
        assert!(matches!(
            turn.source,
            MoveSource::Fallback {
                reason: ResolutionError::Invalid(InvalidMove::SelfCapture { .. }),
                ..
            }
        ));
    }

    #[test]
    fn default_fallback_is_played_when_legal_enough() {
        let mut board = Board::empty();
        board.place(sq("e7"), Piece::new(PieceKind::Pawn, Side::Black));
        board.place(sq("e6"), Piece::new(PieceKind::Knight, Side::White));
        let mut game = GameSession::with_board(board, Side::Black);

        let turn = game.apply_oracle_reply(reply("Qd5")).unwrap();
        assert!(matches!(
            turn.source,
            MoveSource::Fallback {
                strategy: FallbackStrategy::Default,
                ..
            }
        ));
        assert_eq!(turn.record.map(|r| (r.from, r.to)), Some((sq("e7"), sq("e5"))));
    }

    #[test]
    fn degenerate_board_passes_the_turn() {
        let mut board = Board::empty();
        for s in Board::all_squares() {
            board.place(s, Piece::new(PieceKind::Rook, Side::Black));
        }
        let before = board.clone();
        let mut game = GameSession::with_board(board, Side::Black);

        let turn = game.apply_oracle_reply(reply("e5")).unwrap();
        assert!(matches!(turn.source, MoveSource::Degenerate { .. }));
        assert_eq!(turn.record, None);
        assert_eq!(game.board(), &before);
        assert!(game.history().is_empty());
        assert_eq!(game.side(), Side::White);
    }

    #[test]
    fn human_moves_are_validated() {
        let mut game = GameSession::new();
        assert!(matches!(
            game.play_human(sq("e7"), sq("e5")),
            Err(SessionError::Invalid(InvalidMove::WrongSide { .. }))
        ));
        assert!(matches!(
            game.play_human(sq("a1"), sq("a2")),
            Err(SessionError::Invalid(InvalidMove::SelfCapture { .. }))
        ));
        assert_eq!(game.board(), &Board::new());
        assert!(game.history().is_empty());
        assert_eq!(game.phase(), Phase::AwaitingHumanMove);
    }

    #[test]
    fn turns_must_alternate() {
        let mut game = GameSession::new();
        assert_eq!(
            game.apply_oracle_reply(reply("e5")),
            Err(SessionError::OutOfTurn {
                phase: Phase::AwaitingHumanMove
            })
        );
        game.play_human(sq("d2"), sq("d4")).unwrap();
        assert_eq!(
            game.play_human(sq("e2"), sq("e4")),
            Err(SessionError::OutOfTurn {
                phase: Phase::AwaitingOracleMove
            })
        );
    }

    #[test]
    fn oracle_is_not_consulted_out_of_turn() {
        let mut game = GameSession::new();
        let mut oracle = ScriptedOracle::new(["e5"]);
        assert!(game.play_oracle_turn(&mut oracle, &OracleConfig::default()).is_err());
        assert_eq!(oracle.remaining(), 1);
    }

    #[test]
    fn rounds_build_history_and_transcript() {
        let mut game = GameSession::new();
        let mut oracle = ScriptedOracle::new(["e5", "banana"]);
        let config = OracleConfig::default();

        let first = game.play_round(sq("e2"), sq("e4"), &mut oracle, &config).unwrap();
        assert_eq!(first.human_notation, "e4");
        assert_eq!(first.oracle.notation().as_deref(), Some("e5"));
        assert!(!first.oracle.used_fallback());

        let second = game.play_round(sq("g1"), sq("f3"), &mut oracle, &config).unwrap();
        assert!(second.oracle.used_fallback());
        assert_eq!(second.state.notation, vec!["e4", "e5", "Nf3", "a6"]);
        assert_eq!(second.state.last_move.as_deref(), Some("a6"));

        assert_eq!(
            game.transcript(),
            &["Human: e4 -> AI: e5", "Human: Nf3 -> AI: a6 (fallback)"]
        );

        let request = game.oracle_request(&config);
        assert_eq!(request.last_move.as_deref(), Some("a6"));
        assert_eq!(request.history.len(), 4);
    }

    #[test]
    fn request_keeps_only_recent_transcript() {
        let mut game = GameSession::new();
        let mut oracle = ScriptedOracle::default();
        let config = OracleConfig {
            transcript_window: 2,
            ..OracleConfig::default()
        };
        let human = [("a2", "a3"), ("b2", "b3"), ("c2", "c3")];
        for (from, to) in human {
            game.play_round(sq(from), sq(to), &mut oracle, &config).unwrap();
        }
        game.play_human(sq("d2"), sq("d3")).unwrap();

        let request = game.oracle_request(&config);
        assert_eq!(request.transcript.len(), 2);
        assert!(request.transcript[0].starts_with("Human: b3"));
        assert_eq!(request.side, Side::Black);
    }

    #[test]
    fn initialize_resets_everything() {
        let mut game = GameSession::new();
        game.play_human(sq("e2"), sq("e4")).unwrap();
        game.apply_oracle_reply(reply("e5")).unwrap();
        game.play_human(sq("d2"), sq("d4")).unwrap();

        game.initialize();
        assert_eq!(game.board(), &Board::new());
        assert_eq!(game.side(), Side::White);
        assert_eq!(game.phase(), Phase::AwaitingHumanMove);
        assert!(game.history().is_empty());
        assert!(game.transcript().is_empty());
    }

    #[test]
    fn state_serializes_for_the_presentation_layer() {
        let mut game = black_to_move();
        let turn = game.apply_oracle_reply(reply("Zz9")).unwrap();
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["source"]["kind"], "fallback");
        assert_eq!(json["source"]["strategy"], "PawnPush");
        assert!(json["source"]["reason"].as_str().unwrap().contains("Zz9"));

        let state = serde_json::to_value(game.state()).unwrap();
        assert_eq!(state["side"], "White");
        assert_eq!(state["phase"], "AwaitingHumanMove");
        assert_eq!(state["notation"][0], "a6");
    }
}
