pub mod board;
pub mod fallback;
pub mod game;
pub mod moves;
pub mod notation;
pub mod oracle;
pub mod piece;
pub mod resolve;
pub mod validate;

#[cfg(target_arch = "wasm32")]
mod wasm_api;
