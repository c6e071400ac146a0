pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod oracle;
pub mod ordering;
pub mod search;
pub mod time;
pub mod tt;

pub use config::EngineConfig;
pub use engine::{Engine, SearchReport};
pub use error::{ConfigError, EngineError, PositionError};
pub use oracle::{GameState, PositionOracle};
pub use time::{TimeSource, TurnClock, Unlimited};
