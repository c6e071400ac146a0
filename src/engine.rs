use std::collections::VecDeque;
use std::time::Duration;

use shakmaty::{CastlingMode, Color, Move, MoveList};

use crate::config::EngineConfig;
use crate::constants::{MATE_THRESHOLD, MAX_DEPTH, Score, is_mate_score};
use crate::error::EngineError;
use crate::oracle::PositionOracle;
use crate::ordering::{KillerTable, order_moves};
use crate::search::{Cancelled, RootResult, Searcher};
use crate::time::{TimeManager, TimeSource, Unlimited};
use crate::tt::{PackedMove, TranspositionTable};

/// What one turn of thinking produced.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchReport {
    pub best_move: Move,
    /// Score of the deepest completed iteration, for the side to move.
    /// `None` when the move was forced or no iteration completed.
    pub score: Option<Score>,
    /// Deepest fully completed iteration in plies; 0 if none.
    pub depth: u32,
    pub nodes: u64,
    pub tt_probes: u64,
    pub tt_hits: u64,
    pub elapsed: Duration,
    /// Only one legal move; nothing was searched.
    pub forced: bool,
}

impl SearchReport {
    pub fn tt_hit_rate(&self) -> f64 {
        if self.tt_probes == 0 {
            0.0
        } else {
            self.tt_hits as f64 / self.tt_probes as f64
        }
    }
}

const TREND_LOOKBACK: usize = 5;

/// Remembers our own score over the last turns, white's point of view.
struct EvalTrend {
    history: VecDeque<Score>,
}

impl EvalTrend {
    fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(TREND_LOOKBACK + 1),
        }
    }

    fn clear(&mut self) {
        self.history.clear();
    }

    /// Records `white_score` and returns the score from `TREND_LOOKBACK`
    /// turns ago, if there is one.
    fn push(&mut self, white_score: Score) -> Option<Score> {
        self.history.push_back(white_score);
        if self.history.len() > TREND_LOOKBACK + 1 {
            self.history.pop_front();
        }
        if self.history.len() == TREND_LOOKBACK + 1 {
            self.history.front().copied()
        } else {
            None
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    tt: TranspositionTable,
    killers: KillerTable,
    time: TimeManager,
    trend: EvalTrend,
    total_nodes: u64,
    last_report: Option<SearchReport>,
}

/// Deepest iteration the engine will run; at least one ply even for a
/// config that never went through `validate`.
fn depth_cap(config: &EngineConfig) -> u32 {
    config.search.max_depth.clamp(1, MAX_DEPTH)
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let max_depth = depth_cap(&config);
        Self {
            tt: TranspositionTable::new(config.tt_entries),
            killers: KillerTable::new(),
            time: TimeManager::new(config.time.clone(), max_depth),
            trend: EvalTrend::new(),
            total_nodes: 0,
            last_report: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last_report.as_ref()
    }

    pub fn new_game(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.time.reset();
        self.trend.clear();
        self.total_nodes = 0;
        self.last_report = None;
    }

    /// Picks a move for the side to move within the time `clock` allows.
    pub fn think<P, C>(&mut self, pos: &mut P, clock: &C) -> Result<Move, EngineError>
    where
        P: PositionOracle,
        C: TimeSource,
    {
        let pieces = pos.piece_counts().total();
        let plan = self.time.plan(pieces, clock.remaining());
        log::debug!(
            "planning depth {} (predicted {:?}, {:?} left)",
            plan.target_depth,
            plan.predicted,
            clock.remaining()
        );

        let report = self.run(pos, clock, plan.target_depth)?;
        if !report.forced && report.depth > 0 {
            self.time.record(report.depth, pieces, report.elapsed);
        }
        self.total_nodes += report.nodes;
        self.log_turn(pos, &report);

        let best_move = report.best_move.clone();
        self.last_report = Some(report);
        Ok(best_move)
    }

    /// Searches to exactly `depth` plies (capped at the configured maximum)
    /// with no clock.
    pub fn search_depth<P: PositionOracle>(
        &mut self,
        pos: &mut P,
        depth: u32,
    ) -> Result<SearchReport, EngineError> {
        let depth = depth.clamp(1, depth_cap(&self.config));
        let report = self.run(pos, &Unlimited, depth)?;
        self.total_nodes += report.nodes;
        self.last_report = Some(report.clone());
        Ok(report)
    }

    fn run<P, C>(
        &mut self,
        pos: &mut P,
        clock: &C,
        max_depth: u32,
    ) -> Result<SearchReport, EngineError>
    where
        P: PositionOracle,
        C: TimeSource,
    {
        let started = clock.elapsed();
        self.killers.clear();

        let mut moves = MoveList::new();
        pos.legal_moves(&mut moves);
        if moves.is_empty() {
            return Err(EngineError::NoLegalMoves);
        }
        if moves.len() == 1 {
            log::debug!("only one legal move, not searching");
            return Ok(SearchReport {
                best_move: moves[0].clone(),
                score: None,
                depth: 0,
                nodes: 0,
                tt_probes: 0,
                tt_hits: 0,
                elapsed: clock.elapsed().saturating_sub(started),
                forced: true,
            });
        }

        let hash_move = self
            .tt
            .probe(pos.fingerprint())
            .map_or(PackedMove::NONE, |e| e.best_move);
        order_moves(&mut moves, hash_move, &self.killers, 0, &self.config.eval.piece_values);

        // kept unless an iteration completes
        let mut best_move = moves[0].clone();
        let mut score = None;
        let mut completed = 0;

        let cutoffs = self.time.cutoffs();
        let mut searcher =
            Searcher::new(&self.config, &mut self.tt, &mut self.killers, clock, cutoffs);

        for depth in 1..=max_depth {
            if depth > 1 && cutoffs.soft_expired(clock) {
                break;
            }
            match searcher.search_root(pos, depth) {
                Ok(RootResult { best_move: Some(mv), score: s }) => {
                    best_move = mv;
                    score = Some(s);
                    completed = depth;

                    let stats = searcher.stats();
                    log::debug!(
                        "depth {depth}: {} score {s} nodes {} tt hits {}/{}",
                        best_move.to_uci(CastlingMode::Standard),
                        stats.nodes,
                        stats.tt_hits,
                        stats.tt_probes
                    );
                    if s >= MATE_THRESHOLD {
                        break;
                    }
                }
                Ok(RootResult { best_move: None, .. }) => break,
                Err(Cancelled) => {
                    log::trace!(
                        "depth {depth} cancelled after {:?}",
                        clock.elapsed().saturating_sub(started)
                    );
                    break;
                }
            }
        }

        let stats = searcher.stats();
        Ok(SearchReport {
            best_move,
            score,
            depth: completed,
            nodes: stats.nodes,
            tt_probes: stats.tt_probes,
            tt_hits: stats.tt_hits,
            elapsed: clock.elapsed().saturating_sub(started),
            forced: false,
        })
    }

    fn log_turn<P: PositionOracle>(&mut self, pos: &P, report: &SearchReport) {
        let us = pos.turn();
        let white_score = report.score.map(|s| if us == Color::White { s } else { -s });

        log::info!(
            "move {}: {} eval {} depth {} tt hits {:.2} searched {:.2}M",
            pos.ply() / 2 + 1,
            report.best_move.to_uci(CastlingMode::Standard),
            white_score.map_or_else(|| "-".to_string(), |s| s.to_string()),
            report.depth,
            report.tt_hit_rate(),
            self.total_nodes as f64 / 1_000_000.0
        );

        let Some(white_score) = white_score else { return };
        if is_mate_score(white_score) {
            return;
        }
        if let Some(earlier) = self.trend.push(white_score) {
            let sign = if us == Color::White { 1 } else { -1 };
            let drop = (earlier - white_score) * sign;
            if !is_mate_score(earlier) && drop > self.config.eval_swing_warning {
                log::warn!(
                    "eval dropped by {drop} over the last {TREND_LOOKBACK} turns \
                     ({earlier} -> {white_score}, white's view)"
                );
            }
        }
    }
}
