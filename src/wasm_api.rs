use crate::board::Square;
use crate::game::{GameSession, MoveSource, OracleTurn, SessionError};
use crate::oracle::{Oracle, OracleConfig, OracleError, OracleRequest};
use crate::piece::{PieceKind, Side};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct SquarePiece {
    piece_type: String,
    color: String,
    symbol: String,
}

#[derive(Serialize)]
struct MoveJson {
    from: [usize; 2],
    to: [usize; 2],
    notation: String,
    side: String,
}

#[derive(Serialize)]
struct BoardState {
    squares: Vec<Vec<Option<SquarePiece>>>,
    current_turn: String,
    awaiting_human: bool,
    history: Vec<MoveJson>,
    last_move: Option<String>,
}

#[derive(Serialize)]
struct MoveResult {
    #[serde(flatten)]
    board_state: Option<BoardState>,
    error: Option<String>,
    move_notation: Option<String>,
    ai_move: Option<String>,
    ai_response: Option<String>,
}

#[derive(Serialize)]
struct OraclePrompt {
    system: String,
    user: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

fn piece_type_to_string(kind: PieceKind) -> String {
    match kind {
        PieceKind::King => "King".to_string(),
        PieceKind::Queen => "Queen".to_string(),
        PieceKind::Rook => "Rook".to_string(),
        PieceKind::Bishop => "Bishop".to_string(),
        PieceKind::Knight => "Knight".to_string(),
        PieceKind::Pawn => "Pawn".to_string(),
    }
}

fn side_to_string(side: Side) -> String {
    match side {
        Side::White => "White".to_string(),
        Side::Black => "Black".to_string(),
    }
}

fn build_board_state(session: &GameSession) -> BoardState {
    let board = session.board();
    let squares: Vec<Vec<Option<SquarePiece>>> = (0..8)
        .map(|r| {
            (0..8)
                .map(|c| {
                    board.get(Square::new(r, c)).map(|p| SquarePiece {
                        piece_type: piece_type_to_string(p.kind),
                        color: side_to_string(p.side),
                        symbol: p.symbol().to_string(),
                    })
                })
                .collect()
        })
        .collect();

    let history: Vec<MoveJson> = session
        .history()
        .iter()
        .map(|m| MoveJson {
            from: [m.from.row, m.from.col],
            to: [m.to.row, m.to.col],
            notation: m.notation(),
            side: side_to_string(m.side),
        })
        .collect();

    BoardState {
        squares,
        current_turn: side_to_string(session.side()),
        awaiting_human: session.phase() == crate::game::Phase::AwaitingHumanMove,
        last_move: history.last().map(|m| m.notation.clone()),
        history,
    }
}

/// Describe the oracle's turn the way the move panel shows it.
fn describe_turn(turn: &OracleTurn) -> String {
    let played = turn.notation().unwrap_or_else(|| "no move".to_string());
    match &turn.source {
        MoveSource::Oracle => format!("AI responds with {played}"),
        MoveSource::Fallback { .. } => format!("AI responds with {played} (fallback)"),
        MoveSource::Degenerate { .. } => "AI has no move; turn passed".to_string(),
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

fn error_result(err: SessionError) -> JsValue {
    to_js(&MoveResult {
        board_state: None,
        error: Some(err.to_string()),
        move_notation: None,
        ai_move: None,
        ai_response: None,
    })
}

/// Oracle backed by a JS function `(system, user) => string`. A thrown
/// exception or a non-string return value counts as an oracle failure.
struct JsOracle<'a> {
    callback: &'a js_sys::Function,
}

impl Oracle for JsOracle<'_> {
    fn suggest_move(&mut self, request: &OracleRequest) -> Result<String, OracleError> {
        let system = JsValue::from_str(&request.system_prompt());
        let user = JsValue::from_str(&request.user_prompt());
        match self.callback.call2(&JsValue::NULL, &system, &user) {
            Ok(value) => value
                .as_string()
                .ok_or_else(|| OracleError::Unavailable("callback returned a non-string".to_string())),
            Err(err) => Err(OracleError::Unavailable(format!("{err:?}"))),
        }
    }
}

#[wasm_bindgen]
pub struct Game {
    session: GameSession,
    config: OracleConfig,
}

#[wasm_bindgen]
impl Game {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Game {
        Game {
            session: GameSession::new(),
            config: OracleConfig::default(),
        }
    }

    pub fn initialize(&mut self) -> JsValue {
        self.session.initialize();
        self.get_state()
    }

    pub fn set_transcript_window(&mut self, window: usize) {
        self.config.transcript_window = window;
    }

    pub fn get_state(&self) -> JsValue {
        to_js(&build_board_state(&self.session))
    }

    /// Apply the human's move. Returns the new state, or `{ error }`.
    pub fn make_move(&mut self, from_row: usize, from_col: usize, to_row: usize, to_col: usize) -> JsValue {
        if from_row > 7 || from_col > 7 || to_row > 7 || to_col > 7 {
            return to_js(&MoveResult {
                board_state: None,
                error: Some("square off the board".to_string()),
                move_notation: None,
                ai_move: None,
                ai_response: None,
            });
        }

        match self
            .session
            .play_human(Square::new(from_row, from_col), Square::new(to_row, to_col))
        {
            Ok(record) => to_js(&MoveResult {
                board_state: Some(build_board_state(&self.session)),
                error: None,
                move_notation: Some(record.notation()),
                ai_move: None,
                ai_response: None,
            }),
            Err(err) => error_result(err),
        }
    }

    /// The prompt the page should send to the model for the oracle's turn.
    pub fn oracle_request(&self) -> JsValue {
        let request = self.session.oracle_request(&self.config);
        to_js(&OraclePrompt {
            system: request.system_prompt(),
            user: request.user_prompt(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        })
    }

    /// Feed back the model's reply (`undefined` when the request failed).
    pub fn apply_oracle_reply(&mut self, reply: Option<String>) -> JsValue {
        let reply = reply.ok_or_else(|| OracleError::Unavailable("no reply".to_string()));
        let result = self.session.apply_oracle_reply(reply);
        self.turn_result(result)
    }

    /// Run the oracle's turn through a synchronous JS callback.
    pub fn play_oracle_turn(&mut self, callback: &js_sys::Function) -> JsValue {
        let mut oracle = JsOracle { callback };
        let result = self.session.play_oracle_turn(&mut oracle, &self.config);
        self.turn_result(result)
    }

    fn turn_result(&self, result: Result<OracleTurn, SessionError>) -> JsValue {
        match result {
            Ok(turn) => to_js(&MoveResult {
                board_state: Some(build_board_state(&self.session)),
                error: None,
                move_notation: None,
                ai_response: Some(describe_turn(&turn)),
                ai_move: turn.raw,
            }),
            Err(err) => error_result(err),
        }
    }
}
