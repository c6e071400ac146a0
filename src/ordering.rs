//! Move ordering.
//!
//! Alpha-beta prunes most when the best move comes first. Every move gets a
//! sort key (lower is tried earlier):
//!
//! 1. the transposition table's best move for this position
//! 2. killer moves of the current ply
//! 3. promotions, queen first
//! 4. captures, most valuable victim / least valuable attacker first
//! 5. castling
//! 6. everything else, in generation order

use shakmaty::{Move, MoveList};

use crate::config::PieceValues;
use crate::constants::MAX_PLY;
use crate::tt::PackedMove;

const HASH_MOVE: i32 = -1_000_000;
const KILLER: [i32; 2] = [-500_000, -400_000];
const PROMOTION: i32 = -300_000;
const CAPTURE: i32 = -100_000;
const CASTLE: i32 = -10_000;

/// Quiet moves that caused a beta cutoff, two per ply from the search root.
/// Cleared at the start of every turn.
pub struct KillerTable {
    slots: Vec<[Option<Move>; 2]>,
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: vec![[None, None]; MAX_PLY],
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill([None, None]);
    }

    pub fn record(&mut self, ply: usize, mv: &Move) {
        let Some(slot) = self.slots.get_mut(ply) else { return };
        if slot[0].as_ref() == Some(mv) {
            return;
        }
        slot[1] = slot[0].take();
        slot[0] = Some(mv.clone());
    }

    /// Which killer slot at `ply` holds `mv`, if any.
    pub fn rank(&self, ply: usize, mv: &Move) -> Option<usize> {
        let slot = self.slots.get(ply)?;
        slot.iter().position(|k| k.as_ref() == Some(mv))
    }
}

pub fn move_priority(
    mv: &Move,
    hash_move: PackedMove,
    killers: &KillerTable,
    ply: usize,
    values: &PieceValues,
) -> i32 {
    if hash_move.matches(mv) {
        return HASH_MOVE;
    }
    if let Some(rank) = killers.rank(ply, mv) {
        return KILLER[rank];
    }
    if let Some(role) = mv.promotion() {
        return PROMOTION - values.of(role);
    }
    if let Some(victim) = mv.capture() {
        return CAPTURE - (values.of(victim) - values.of(mv.role()));
    }
    if mv.is_castle() {
        return CASTLE;
    }
    0
}

/// Sorts `moves` best-first. The sort is stable, so ties keep generation order.
pub fn order_moves(
    moves: &mut MoveList,
    hash_move: PackedMove,
    killers: &KillerTable,
    ply: usize,
    values: &PieceValues,
) {
    moves.sort_by_cached_key(|m| move_priority(m, hash_move, killers, ply, values));
}
