//! Tuning table for the engine.
//!
//! Every heuristic constant lives here so tuning never touches the search or
//! evaluation code. All sections deserialize from TOML with per-field
//! defaults, so a config file only needs the values it changes.

use std::path::Path;

use serde::Deserialize;
use shakmaty::Role;

use crate::constants::{MAX_DEPTH, Score};
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of transposition table slots.
    pub tt_entries: usize,
    /// Own-perspective score drop (vs. five turns earlier) that triggers a warning.
    pub eval_swing_warning: Score,
    pub eval: EvalConfig,
    pub search: SearchConfig,
    pub time: TimeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tt_entries: 1 << 22,
            eval_swing_warning: 1000,
            eval: EvalConfig::default(),
            search: SearchConfig::default(),
            time: TimeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tt_entries == 0 {
            return Err(invalid("tt_entries", "must be at least 1"));
        }
        if self.search.max_depth == 0 || self.search.max_depth > MAX_DEPTH {
            return Err(invalid(
                "search.max_depth",
                format!("must be within 1..={MAX_DEPTH}"),
            ));
        }
        if self.search.quiescence_floor >= 0 {
            return Err(invalid("search.quiescence_floor", "must be negative"));
        }
        if self.search.null_move_reduction <= 0 {
            return Err(invalid("search.null_move_reduction", "must be positive"));
        }
        if self.time.hard_divisor == 0
            || self.time.soft_divisor == 0
            || self.time.budget_divisor == 0
        {
            return Err(invalid("time", "divisors must be non-zero"));
        }
        if self.time.soft_divisor < self.time.hard_divisor {
            return Err(invalid(
                "time.soft_divisor",
                "must not be smaller than hard_divisor (the soft cutoff has to come first)",
            ));
        }
        if self.time.base_branching < 1.0 || self.time.unit_cost_micros <= 0.0 {
            return Err(invalid("time", "cost model must grow with depth"));
        }
        if self.eval.trade_down_scale <= 0.0 {
            return Err(invalid("eval.trade_down_scale", "must be positive"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PieceValues {
    pub pawn: Score,
    pub knight: Score,
    pub bishop: Score,
    pub rook: Score,
    pub queen: Score,
    pub king: Score,
}

impl Default for PieceValues {
    fn default() -> Self {
        Self {
            pawn: 100,
            knight: 300,
            bishop: 310,
            rook: 500,
            queen: 900,
            king: 10_000,
        }
    }
}

impl PieceValues {
    pub fn of(&self, role: Role) -> Score {
        match role {
            Role::Pawn => self.pawn,
            Role::Knight => self.knight,
            Role::Bishop => self.bishop,
            Role::Rook => self.rook,
            Role::Queen => self.queen,
            Role::King => self.king,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvalConfig {
    pub piece_values: PieceValues,
    /// Per rank a pawn has travelled from its own back rank.
    pub pawn_advancement: f64,
    /// Per square attacked.
    pub mobility: f64,
    /// Per attacked or defended square that holds a piece of either colour.
    pub contact: f64,
    /// Knights and bishops still on their home rank.
    pub back_rank_penalty: f64,
    /// Mop-up kicks in once a side has fewer pieces (king included) than this.
    pub endgame_piece_threshold: u32,
    pub mop_up_center_weight: f64,
    pub mop_up_proximity_base: f64,
    /// Mop-up is multiplied by `taper / (taper + winner_pieces)`.
    pub mop_up_taper: f64,
    /// Whole score is multiplied by `scale / (scale + total_pieces)`.
    pub trade_down_scale: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            piece_values: PieceValues::default(),
            pawn_advancement: 1.0,
            mobility: 0.5,
            contact: 1.5,
            back_rank_penalty: 5.0,
            endgame_piece_threshold: 2,
            mop_up_center_weight: 3.0,
            mop_up_proximity_base: 14.0,
            mop_up_taper: 16.0,
            trade_down_scale: 40.0,
        }
    }
}

/// Depths here are in search units (fifths of a ply) unless noted.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Iterative deepening limit, in plies.
    pub max_depth: u32,
    pub null_move: bool,
    pub null_move_min_depth: i32,
    pub null_move_reduction: i32,
    /// Null move needs strictly more pieces than this on both sides.
    pub null_move_min_pieces: u32,
    pub check_extension: bool,
    pub quiescence: bool,
    pub quiescence_floor: i32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            null_move: true,
            null_move_min_depth: 3,
            null_move_reduction: 15,
            null_move_min_pieces: 2,
            check_extension: true,
            quiescence: true,
            quiescence_floor: -100,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeConfig {
    /// Abort the running search once `elapsed * hard_divisor >= remaining`.
    pub hard_divisor: u32,
    /// Do not start another depth once `elapsed * soft_divisor >= remaining`.
    pub soft_divisor: u32,
    /// Planned depth must be predicted to finish within `remaining / budget_divisor`.
    pub budget_divisor: u32,
    pub base_branching: f64,
    pub branching_per_piece: f64,
    pub unit_cost_micros: f64,
    /// Number of past turns averaged into the overshoot factor.
    pub overshoot_window: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            hard_divisor: 15,
            soft_divisor: 100,
            budget_divisor: 30,
            base_branching: 1.5,
            branching_per_piece: 0.15,
            unit_cost_micros: 20.0,
            overshoot_window: 3,
        }
    }
}
