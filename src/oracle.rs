//! The board the search runs on.
//!
//! The search only needs a handful of queries and a strictly stack-shaped
//! make/undo. [`PositionOracle`] names that contract, [`GameState`] provides it
//! on top of `shakmaty`, and [`ScopedMove`] ties every make to its undo.

use std::ops::{Deref, DerefMut};

use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{
    Bitboard, Board, CastlingMode, Chess, Color, EnPassantMode, Move, MoveList, Position, Square,
    attacks,
};

use crate::error::PositionError;

pub trait PositionOracle {
    fn legal_moves(&self, moves: &mut MoveList);

    /// Captures and promotions only.
    fn tactical_moves(&self, moves: &mut MoveList) {
        self.legal_moves(moves);
        moves.retain(|m| m.is_capture() || m.is_promotion());
    }

    fn make_move(&mut self, mv: &Move);

    /// Hands the turn to the opponent. Returns false when passing is not
    /// possible (side to move in check); nothing is pushed in that case.
    fn make_null_move(&mut self) -> bool;

    /// Reverts the most recent `make_move` or successful `make_null_move`.
    fn undo(&mut self);

    fn is_check(&self) -> bool;
    fn is_checkmate(&self) -> bool;

    /// Stalemate, repetition, fifty-move rule or insufficient material.
    fn is_draw(&self) -> bool;

    fn turn(&self) -> Color;

    /// Plies since the start of the game.
    fn ply(&self) -> u32;

    fn board(&self) -> &Board;

    /// 64-bit position hash; equal for transpositions.
    fn fingerprint(&self) -> u64;

    fn attacks_from(&self, square: Square) -> Bitboard {
        let board = self.board();
        board
            .piece_at(square)
            .map_or(Bitboard(0), |piece| attacks::attacks(square, piece, board.occupied()))
    }

    fn piece_counts(&self) -> PieceCounts {
        let board = self.board();
        PieceCounts {
            white: board.by_color(Color::White).count() as u32,
            black: board.by_color(Color::Black).count() as u32,
        }
    }
}

/// Pieces on the board per side, kings and pawns included.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceCounts {
    pub white: u32,
    pub black: u32,
}

impl PieceCounts {
    pub fn total(self) -> u32 {
        self.white + self.black
    }

    pub fn fewest(self) -> u32 {
        self.white.min(self.black)
    }

    pub fn of(self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// A make (or pass) whose undo runs when the guard is dropped.
pub struct ScopedMove<'a, P: PositionOracle> {
    pos: &'a mut P,
}

impl<'a, P: PositionOracle> ScopedMove<'a, P> {
    pub fn play(pos: &'a mut P, mv: &Move) -> Self {
        pos.make_move(mv);
        Self { pos }
    }

    pub fn pass(pos: &'a mut P) -> Option<Self> {
        if pos.make_null_move() {
            Some(Self { pos })
        } else {
            None
        }
    }
}

impl<P: PositionOracle> Deref for ScopedMove<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.pos
    }
}

impl<P: PositionOracle> DerefMut for ScopedMove<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.pos
    }
}

impl<P: PositionOracle> Drop for ScopedMove<'_, P> {
    fn drop(&mut self) {
        self.pos.undo();
    }
}

#[derive(Clone, Debug)]
struct Snapshot {
    position: Chess,
    fingerprint: u64,
    null: bool,
}

/// A game in progress: the current `shakmaty` position plus everything
/// needed to undo moves and spot repetitions.
#[derive(Clone, Debug)]
pub struct GameState {
    position: Chess,
    fingerprint: u64,
    ply: u32,
    // one snapshot per earlier position, oldest first
    snapshots: Vec<Snapshot>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Chess) -> Self {
        let ply = (position.fullmoves().get() - 1) * 2 + u32::from(position.turn() == Color::Black);
        Self {
            fingerprint: hash(&position),
            position,
            ply,
            snapshots: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let fen: Fen = fen.trim().parse()?;
        let position: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|err| PositionError::Illegal(err.to_string()))?;
        Ok(Self::from_position(position))
    }

    /// Plays a move given in UCI notation and keeps it in the game history.
    pub fn play_uci(&mut self, uci: &str) -> Result<Move, PositionError> {
        let uci_move: UciMove = uci.parse().map_err(|_| PositionError::Uci(uci.to_string()))?;
        let mv = uci_move
            .to_move(&self.position)
            .map_err(|_| PositionError::IllegalMove(uci.to_string()))?;
        self.make_move(&mv);
        Ok(mv)
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Same board with the other side to move; `None` if that is not a legal
    /// position (the side that just moved would be in check).
    pub fn with_turn_swapped(&self) -> Option<Self> {
        self.position.clone().swap_turn().ok().map(Self::from_position)
    }

    /// True if the current position already occurred with the same side to
    /// move since the last irreversible move. The first recurrence counts.
    pub fn is_repetition(&self) -> bool {
        let window = self.position.halfmoves() as usize;
        for (back, snapshot) in self.snapshots.iter().rev().enumerate() {
            let plies_back = back + 1;
            if plies_back > window || snapshot.null {
                break;
            }
            if plies_back % 2 == 0 && snapshot.fingerprint == self.fingerprint {
                return true;
            }
        }
        false
    }

    fn push_snapshot(&mut self, null: bool) {
        self.snapshots.push(Snapshot {
            position: self.position.clone(),
            fingerprint: self.fingerprint,
            null,
        });
    }
}

fn hash(position: &Chess) -> u64 {
    position.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
}

impl PositionOracle for GameState {
    fn legal_moves(&self, moves: &mut MoveList) {
        *moves = self.position.legal_moves();
    }

    fn make_move(&mut self, mv: &Move) {
        self.push_snapshot(false);
        self.position.play_unchecked(mv);
        self.fingerprint = hash(&self.position);
        self.ply += 1;
    }

    fn make_null_move(&mut self) -> bool {
        if self.position.is_check() {
            return false;
        }
        match self.position.clone().swap_turn() {
            Ok(passed) => {
                self.push_snapshot(true);
                self.position = passed;
                self.fingerprint = hash(&self.position);
                self.ply += 1;
                true
            }
            Err(_) => false,
        }
    }

    fn undo(&mut self) {
        if let Some(snapshot) = self.snapshots.pop() {
            self.position = snapshot.position;
            self.fingerprint = snapshot.fingerprint;
            self.ply -= 1;
        }
    }

    fn is_check(&self) -> bool {
        self.position.is_check()
    }

    fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    fn is_draw(&self) -> bool {
        self.position.halfmoves() >= 100
            || self.position.is_insufficient_material()
            || self.is_repetition()
            || self.position.is_stalemate()
    }

    fn turn(&self) -> Color {
        self.position.turn()
    }

    fn ply(&self) -> u32 {
        self.ply
    }

    fn board(&self) -> &Board {
        self.position.board()
    }

    fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_all(state: &mut GameState, moves: &[&str]) {
        for m in moves {
            state.play_uci(m).unwrap_or_else(|err| panic!("{m}: {err}"));
        }
    }

    #[test]
    fn undo_restores_position_and_fingerprint() {
        let mut state = GameState::new();
        let start = state.fingerprint();
        let mut moves = MoveList::new();
        state.legal_moves(&mut moves);
        assert_eq!(moves.len(), 20);

        for mv in &moves {
            state.make_move(mv);
            assert_ne!(state.fingerprint(), start);
            assert_eq!(state.ply(), 1);
            state.undo();
            assert_eq!(state.fingerprint(), start);
            assert_eq!(state.ply(), 0);
        }
    }

    #[test]
    fn transpositions_share_fingerprint() {
        let mut a = GameState::new();
        play_all(&mut a, &["g1f3", "g8f6", "b1c3"]);
        let mut b = GameState::new();
        play_all(&mut b, &["b1c3", "g8f6", "g1f3"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.ply(), b.ply());
    }

    #[test]
    fn scoped_move_undoes_on_early_exit() {
        fn probe(pos: &mut GameState, mv: &Move) -> Option<u64> {
            let child = ScopedMove::play(pos, mv);
            if child.is_check() {
                return None;
            }
            Some(child.fingerprint())
        }

        let mut state = GameState::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let before = state.fingerprint();
        let mut moves = MoveList::new();
        state.legal_moves(&mut moves);
        for mv in &moves {
            let _ = probe(&mut state, mv);
            assert_eq!(state.fingerprint(), before);
        }
    }

    #[test]
    fn pass_is_refused_in_check() {
        let mut state = GameState::from_fen("4k3/8/8/8/8/8/8/4R1K1 b - - 0 1").unwrap();
        assert!(state.is_check());
        assert!(ScopedMove::pass(&mut state).is_none());
        assert_eq!(state.ply(), 1);

        let mut quiet = GameState::from_fen("4k3/8/8/8/8/8/8/R5K1 b - - 0 1").unwrap();
        let before = quiet.fingerprint();
        {
            let passed = ScopedMove::pass(&mut quiet).expect("quiet position can pass");
            assert_eq!(passed.turn(), Color::White);
        }
        assert_eq!(quiet.fingerprint(), before);
        assert_eq!(quiet.turn(), Color::Black);
    }

    #[test]
    fn repetition_is_a_draw() {
        let mut state = GameState::from_fen("7k/8/8/8/8/8/8/1Q5K w - - 0 1").unwrap();
        assert!(!state.is_draw());
        play_all(&mut state, &["h1g1", "h8g8", "g1h1"]);
        assert!(!state.is_draw());
        play_all(&mut state, &["g8h8"]);
        assert!(state.is_repetition());
        assert!(state.is_draw());
    }

    #[test]
    fn repetition_window_stops_at_irreversible_moves() {
        let mut state = GameState::from_fen("7k/8/8/8/8/8/P7/1Q5K w - - 0 1").unwrap();
        play_all(&mut state, &["h1g1", "h8g8", "g1h1", "g8h8", "a2a3"]);
        assert!(!state.is_repetition());
    }

    #[test]
    fn ply_follows_fen_move_counters() {
        let state = GameState::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 3 10").unwrap();
        assert_eq!(state.ply(), 19);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(GameState::from_fen("not a fen"), Err(PositionError::Fen(_))));
        assert!(matches!(
            GameState::from_fen("8/8/8/8/8/8/8/8 w - - 0 1"),
            Err(PositionError::Illegal(_))
        ));

        let mut state = GameState::new();
        assert!(matches!(state.play_uci("zz99"), Err(PositionError::Uci(_))));
        assert!(matches!(state.play_uci("e2e5"), Err(PositionError::IllegalMove(_))));
        assert_eq!(state.ply(), 0);
    }

    #[test]
    fn attack_sets_and_counts() {
        let state = GameState::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        // rook on a1: seven squares up the file, b1..d1 and the king on e1
        assert_eq!(state.attacks_from(Square::A1).count(), 11);
        assert_eq!(state.attacks_from(Square::H5).count(), 0);
        assert_eq!(state.piece_counts(), PieceCounts { white: 2, black: 1 });
    }
}
