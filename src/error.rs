//! Error types for the engine, the position adapter and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::engine::Engine`].
#[derive(Error, Debug)]
pub enum EngineError {
    /// The caller asked for a move in a position that is already over.
    #[error("no legal moves in the current position")]
    NoLegalMoves,
}

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    Fen(#[from] shakmaty::fen::ParseFenError),

    #[error("illegal position: {0}")]
    Illegal(String),

    #[error("invalid UCI move `{0}`")]
    Uci(String),

    #[error("move `{0}` is not legal in the current position")]
    IllegalMove(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
