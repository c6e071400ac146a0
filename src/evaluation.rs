use shakmaty::{Color, Role, Square};

use crate::config::EvalConfig;
use crate::constants::{DRAW, Score, mated_score};
use crate::oracle::{PieceCounts, PositionOracle};

fn sign(color: Color) -> f64 {
    if color == Color::White { 1.0 } else { -1.0 }
}

/// Ranks travelled from the piece's own back rank.
fn relative_rank(color: Color, square: Square) -> i32 {
    let rank = square.rank() as i32;
    if color == Color::White { rank } else { 7 - rank }
}

/// Score of `pos` for the side to move. Terminal positions first: being
/// mated scores worse the earlier it happens, draws score zero.
pub fn evaluate<P: PositionOracle>(pos: &P, config: &EvalConfig) -> Score {
    if pos.is_checkmate() {
        return mated_score(pos.ply());
    }
    if pos.is_draw() {
        return DRAW;
    }
    static_eval(pos, config)
}

/// Heuristic part of [`evaluate`], without the mate and draw checks.
pub fn static_eval<P: PositionOracle>(pos: &P, config: &EvalConfig) -> Score {
    let board = pos.board();
    let occupied = board.occupied();
    let counts = pos.piece_counts();

    // white's point of view until the very end
    let mut score = 0.0;

    for square in occupied {
        let Some(piece) = board.piece_at(square) else { continue };
        let attacks = pos.attacks_from(square);
        let rank = relative_rank(piece.color, square);

        let mut val = config.piece_values.of(piece.role) as f64;
        val += config.mobility * attacks.count() as f64;
        val += config.contact * (attacks & occupied).count() as f64;

        match piece.role {
            Role::Pawn => val += config.pawn_advancement * rank as f64,
            Role::Knight | Role::Bishop if rank == 0 => val -= config.back_rank_penalty,
            _ => {}
        }

        score += sign(piece.color) * val;
    }

    score += mop_up(pos, counts, config);
    score *= config.trade_down_scale / (config.trade_down_scale + counts.total() as f64);

    if pos.turn() == Color::Black {
        score = -score;
    }
    score.round() as Score
}

/// Endgame drive against a bare king: push it to the edge and bring the
/// winning king closer. Fades as the winning side keeps more material.
fn mop_up<P: PositionOracle>(pos: &P, counts: PieceCounts, config: &EvalConfig) -> f64 {
    if counts.white == counts.black || counts.fewest() >= config.endgame_piece_threshold {
        return 0.0;
    }
    let winner = if counts.white > counts.black { Color::White } else { Color::Black };
    let board = pos.board();
    let (Some(winning_king), Some(losing_king)) = (board.king_of(winner), board.king_of(!winner))
    else {
        return 0.0;
    };

    let rank = |sq: Square| sq.rank() as i32 as f64;
    let file = |sq: Square| sq.file() as i32 as f64;

    let center_distance = (rank(losing_king) - 3.5).abs() + (file(losing_king) - 3.5).abs();
    let king_distance = (rank(losing_king) - rank(winning_king)).abs()
        + (file(losing_king) - file(winning_king)).abs();

    let bonus = config.mop_up_center_weight * center_distance + config.mop_up_proximity_base
        - king_distance;
    let taper = config.mop_up_taper / (config.mop_up_taper + counts.of(winner) as f64);
    sign(winner) * bonus * taper
}
