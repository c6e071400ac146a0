//! Negamax alpha-beta search.
//!
//! One [`Searcher`] is the whole mutable context of a turn's search: the
//! transposition and killer tables it writes, the clock it polls and its node
//! counters. Depth is counted in fifths of a ply (see [`ONE_PLY`]). When the
//! remaining depth runs out the same routine turns into a quiescence search
//! over captures and promotions, or over all evasions while in check.

use shakmaty::{Move, MoveList};

use crate::config::EngineConfig;
use crate::constants::{CHECK_PLY_COST, DRAW, INFINITY, ONE_PLY, Score, is_mate_score};
use crate::evaluation::evaluate;
use crate::oracle::{PositionOracle, ScopedMove};
use crate::ordering::{KillerTable, order_moves};
use crate::time::{Cutoffs, TimeSource};
use crate::tt::{Bound, PackedMove, TranspositionTable};

/// The clock ran out; the search that returned this must be discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

pub type SearchResult = Result<Score, Cancelled>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub tt_probes: u64,
    pub tt_hits: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootResult {
    pub best_move: Option<Move>,
    pub score: Score,
}

pub struct Searcher<'a, C: TimeSource> {
    config: &'a EngineConfig,
    tt: &'a mut TranspositionTable,
    killers: &'a mut KillerTable,
    clock: &'a C,
    cutoffs: Cutoffs,
    stats: SearchStats,
    root_best: Option<Move>,
}

impl<'a, C: TimeSource> Searcher<'a, C> {
    pub fn new(
        config: &'a EngineConfig,
        tt: &'a mut TranspositionTable,
        killers: &'a mut KillerTable,
        clock: &'a C,
        cutoffs: Cutoffs,
    ) -> Self {
        Self {
            config,
            tt,
            killers,
            clock,
            cutoffs,
            stats: SearchStats::default(),
            root_best: None,
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Full-window search of the root to `depth` plies.
    pub fn search_root<P: PositionOracle>(
        &mut self,
        pos: &mut P,
        depth: u32,
    ) -> Result<RootResult, Cancelled> {
        self.root_best = None;
        let score = self.negamax(pos, depth as i32 * ONE_PLY, -INFINITY, INFINITY, 0, true)?;
        Ok(RootResult {
            best_move: self.root_best.take(),
            score,
        })
    }

    fn negamax<P: PositionOracle>(
        &mut self,
        pos: &mut P,
        depth: i32,
        mut alpha: Score,
        beta: Score,
        ply: usize,
        allow_null: bool,
    ) -> SearchResult {
        if self.cutoffs.hard_expired(self.clock) {
            return Err(Cancelled);
        }
        self.stats.nodes += 1;

        let config = self.config;
        let root = ply == 0;

        // the root always needs a move, even in a drawn position
        if !root && pos.is_draw() {
            return Ok(DRAW);
        }

        let key = pos.fingerprint();
        let entry = self.tt.probe(key);
        self.stats.tt_probes += 1;
        if entry.is_some() {
            self.stats.tt_hits += 1;
        }
        if !root {
            if let Some(score) = entry.and_then(|e| e.cutoff(depth, alpha, beta)) {
                return Ok(score);
            }
        }
        let hash_move = entry.map_or(PackedMove::NONE, |e| e.best_move);

        let static_eval = evaluate(pos, &config.eval);
        if depth <= config.search.quiescence_floor || (depth <= 0 && !config.search.quiescence) {
            return Ok(static_eval);
        }

        let in_check = pos.is_check();
        let horizon = depth <= 0 && !in_check;
        let alpha_orig = alpha;
        let mut best = -INFINITY;

        if horizon {
            // stand pat: the side to move may decline every capture
            best = static_eval;
            if best >= beta {
                self.tt.store(key, best, depth, Bound::Lower, PackedMove::NONE);
                return Ok(best);
            }
            alpha = alpha.max(best);
        }

        if allow_null
            && !root
            && !in_check
            && config.search.null_move
            && depth >= config.search.null_move_min_depth
            && static_eval >= beta
            && pos.piece_counts().fewest() > config.search.null_move_min_pieces
        {
            if let Some(mut passed) = ScopedMove::pass(pos) {
                let score = -self.negamax(
                    &mut *passed,
                    depth - config.search.null_move_reduction,
                    -beta,
                    -beta + 1,
                    ply + 1,
                    false,
                )?;
                if score >= beta {
                    return Ok(if is_mate_score(score) { beta } else { score });
                }
            }
        }

        let mut moves = MoveList::new();
        if horizon {
            pos.tactical_moves(&mut moves);
        } else {
            pos.legal_moves(&mut moves);
        }
        if moves.is_empty() {
            // quiet horizon keeps its stand pat; otherwise this is mate
            return Ok(if horizon { best } else { static_eval });
        }

        order_moves(&mut moves, hash_move, &*self.killers, ply, &config.eval.piece_values);

        let mut best_move = PackedMove::NONE;
        for mv in &moves {
            let score = {
                let mut child = ScopedMove::play(pos, mv);
                let cost = if config.search.check_extension && child.is_check() {
                    CHECK_PLY_COST
                } else {
                    ONE_PLY
                };
                -self.negamax(&mut *child, depth - cost, -beta, -alpha, ply + 1, true)?
            };

            if score > best {
                best = score;
                best_move = PackedMove::new(mv);
                if root {
                    self.root_best = Some(mv.clone());
                }
                // publish the new best move right away; only sound as a lower bound
                if best > alpha_orig {
                    self.tt.store(key, best, depth, Bound::Lower, best_move);
                }
                alpha = alpha.max(best);
                if alpha >= beta {
                    if !mv.is_capture() {
                        self.killers.record(ply, mv);
                    }
                    break;
                }
            }
        }

        let bound = if best <= alpha_orig {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(key, best, depth, bound, best_move);
        Ok(best)
    }
}
