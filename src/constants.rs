pub type Score = i32;

pub const DRAW: Score = 0;
pub const INFINITY: Score = 1_000_000_000;

/// Score of being checkmated at ply 0. Each ply of game length shaves off
/// `MATE_PLY_PENALTY`, so shorter mates rank higher for the winner and later
/// mates rank higher for the loser.
pub const MATE: Score = 100_000_000;
pub const MATE_PLY_PENALTY: Score = 10_000;
pub const MATE_THRESHOLD: Score = 10_000_000;

/// Search depth is counted in fifths of a ply so a check can be extended by
/// less than a full ply.
pub const ONE_PLY: i32 = 5;
pub const CHECK_PLY_COST: i32 = 1;

/// Absolute cap on iterative deepening; `MAX_DEPTH * ONE_PLY` must fit an `i8`.
pub const MAX_DEPTH: u32 = 25;

pub const MAX_PLY: usize = 256;

pub fn is_mate_score(score: Score) -> bool {
    score.abs() >= MATE_THRESHOLD
}

pub fn mated_score(ply: u32) -> Score {
    -(MATE - MATE_PLY_PENALTY * ply.min(5_000) as Score)
}
