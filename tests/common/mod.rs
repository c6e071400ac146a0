//! Shared helpers for the integration tests.
#![allow(dead_code)]

use chronofish::config::EngineConfig;
use chronofish::constants::Score;
use chronofish::evaluation::evaluate;
use chronofish::{Engine, GameState, PositionOracle};
use shakmaty::{Move, MoveList};

pub fn state(fen: &str) -> GameState {
    GameState::from_fen(fen).unwrap_or_else(|err| panic!("bad test FEN {fen}: {err}"))
}

pub fn legal_moves(pos: &GameState) -> Vec<Move> {
    let mut moves = MoveList::new();
    pos.legal_moves(&mut moves);
    moves.into_iter().collect()
}

/// A small-table config so tests don't allocate the full default table.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        tt_entries: 1 << 16,
        ..EngineConfig::default()
    }
}

/// Config for comparing against plain minimax: no pruning that changes the
/// searched tree's value.
pub fn exact_config() -> EngineConfig {
    let mut config = test_config();
    config.search.null_move = false;
    config.search.quiescence = false;
    config.search.check_extension = false;
    config
}

pub fn engine() -> Engine {
    Engine::new(test_config())
}

/// Exhaustive negamax with the engine's own evaluation at the leaves.
pub fn minimax(pos: &mut GameState, depth: u32, root: bool, config: &EngineConfig) -> Score {
    if !root && pos.is_draw() {
        return 0;
    }
    if depth == 0 {
        return evaluate(pos, &config.eval);
    }
    let moves = legal_moves(pos);
    if moves.is_empty() {
        return evaluate(pos, &config.eval);
    }
    let mut best = Score::MIN;
    for mv in &moves {
        pos.make_move(mv);
        let score = -minimax(pos, depth - 1, false, config);
        pos.undo();
        best = best.max(score);
    }
    best
}

/// Standard test positions with known properties
pub mod positions {
    pub const STARTING: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    pub const ITALIAN: &str = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
    pub const BACK_RANK_MATE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1"; // Ra8#
    pub const QUEEN_MATE: &str = "k7/8/1K6/8/8/8/8/6Q1 w - - 0 1"; // Qg8#
    pub const HANGING_QUEEN: &str = "4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1"; // exd5
    pub const SINGLE_REPLY: &str = "k7/8/1K6/8/8/8/8/8 b - - 0 1"; // Kb8 only
    pub const CHECKMATED: &str = "R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1";
    pub const STALEMATED: &str = "k7/8/1Q6/8/8/8/8/7K b - - 0 1";
    pub const KING_PAWN: &str = "8/8/8/4k3/8/8/2K1P3/8 w - - 0 1";
    pub const ROOK_ENDGAME: &str = "8/5k2/8/3r4/8/2R5/5K2/8 b - - 0 1";
    // endgames where passing would mislead the search
    pub const BISHOP_PAWN_ENDGAME: &str = "8/8/5k1P/8/5K2/7B/8/8 w - - 1 75";
    pub const ROOK_VS_KNIGHT_PAWN: &str = "8/1K6/6p1/5k2/R3n3/8/8/8 w - - 4 86";
    pub const KNIGHTS: &str = "4k3/8/2n5/8/8/5N2/8/4K3 w - - 0 1";
}
