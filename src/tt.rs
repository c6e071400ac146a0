use shakmaty::Move;

use crate::constants::Score;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// Search failed high; the true score is at least the stored one.
    Lower,
    /// Search failed low; the true score is at most the stored one.
    Upper,
}

/// A move squeezed into 16 bits: from (6) | to (6) | promotion role (3).
/// Zero never encodes a real move, so it doubles as "no move".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedMove(u16);

impl PackedMove {
    pub const NONE: PackedMove = PackedMove(0);

    pub fn new(mv: &Move) -> Self {
        let to = mv.to() as u16;
        let from = mv.from().map_or(to, |sq| sq as u16);
        let promotion = mv.promotion().map_or(0, |role| role as u16);
        PackedMove(from | (to << 6) | (promotion << 12))
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn matches(self, mv: &Move) -> bool {
        !self.is_none() && self == Self::new(mv)
    }
}

impl From<&Move> for PackedMove {
    fn from(mv: &Move) -> Self {
        Self::new(mv)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    /// Full fingerprint of the stored position; 0 marks an empty slot.
    pub key: u64,
    pub score: Score,
    pub best_move: PackedMove,
    pub depth: i8,
    pub bound: Bound,
}

impl TtEntry {
    pub const EMPTY: TtEntry = TtEntry {
        key: 0,
        score: 0,
        best_move: PackedMove::NONE,
        depth: i8::MIN,
        bound: Bound::Upper,
    };

    pub fn is_empty(&self) -> bool {
        self.key == 0
    }

    /// Whether this entry settles a node searched to `depth` with window
    /// `(alpha, beta)` without looking at any move.
    pub fn cutoff(&self, depth: i32, alpha: Score, beta: Score) -> Option<Score> {
        if (self.depth as i32) < depth {
            return None;
        }
        match self.bound {
            Bound::Exact => Some(self.score),
            Bound::Lower if self.score >= beta => Some(self.score),
            Bound::Upper if self.score <= alpha => Some(self.score),
            _ => None,
        }
    }
}

/// Fixed-size, always-replace hash table of search results. A slot is only
/// trusted when its stored key equals the probed fingerprint, so index
/// collisions just read as misses.
pub struct TranspositionTable {
    entries: Vec<TtEntry>,
}

impl TranspositionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![TtEntry::EMPTY; capacity.max(1)],
        }
    }

    pub fn from_megabytes(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TtEntry>();
        Self::new((size_mb * 1024 * 1024) / entry_size)
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        let entry = self.entries[self.index(key)];
        (!entry.is_empty() && entry.key == key).then_some(entry)
    }

    /// Overwrites the slot for `key`. Without a move, a move already stored
    /// for the same position is kept as an ordering hint.
    pub fn store(
        &mut self,
        key: u64,
        score: Score,
        depth: i32,
        bound: Bound,
        best_move: PackedMove,
    ) {
        let idx = self.index(key);
        let slot = &mut self.entries[idx];
        let best_move = if best_move.is_none() && slot.key == key {
            slot.best_move
        } else {
            best_move
        };
        *slot = TtEntry {
            key,
            score,
            best_move,
            depth: depth.clamp(i8::MIN as i32, i8::MAX as i32) as i8,
            bound,
        };
    }

    pub fn clear(&mut self) {
        self.entries.fill(TtEntry::EMPTY);
    }

    /// Filled slots per mille, sampled from the front of the table.
    pub fn occupancy(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| !e.is_empty()).count();
        used * 1000 / sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shakmaty::{Role, Square};

    fn quiet(from: Square, to: Square) -> Move {
        Move::Normal {
            role: Role::Knight,
            from,
            capture: None,
            to,
            promotion: None,
        }
    }

    #[test]
    fn store_and_probe() {
        let mut tt = TranspositionTable::new(1024);
        let key = 123_456_789;
        let mv = quiet(Square::G1, Square::F3);

        tt.store(key, 100, 20, Bound::Exact, PackedMove::new(&mv));
        let entry = tt.probe(key).expect("stored entry");

        assert_eq!(entry.key, key);
        assert_eq!(entry.score, 100);
        assert_eq!(entry.depth, 20);
        assert_eq!(entry.bound, Bound::Exact);
        assert!(entry.best_move.matches(&mv));
        assert!(!entry.best_move.matches(&quiet(Square::B1, Square::C3)));
    }

    #[test]
    fn collisions_read_as_misses() {
        let mut tt = TranspositionTable::new(16);
        tt.store(5, 40, 10, Bound::Exact, PackedMove::NONE);
        // same slot, different fingerprint
        assert!(tt.probe(21).is_none());
        assert!(tt.probe(5).is_some());

        tt.store(21, -7, 3, Bound::Lower, PackedMove::NONE);
        assert!(tt.probe(5).is_none(), "always-replace evicts the older entry");
        assert_eq!(tt.probe(21).map(|e| e.score), Some(-7));
    }

    #[test]
    fn empty_table_never_hits() {
        let tt = TranspositionTable::new(64);
        assert!(tt.probe(0).is_none());
        assert!(tt.probe(64).is_none());
        assert_eq!(tt.occupancy(), 0);
    }

    #[test]
    fn moveless_store_keeps_hint_for_same_position() {
        let mut tt = TranspositionTable::new(64);
        let mv = quiet(Square::G1, Square::F3);
        tt.store(7, 10, 5, Bound::Lower, PackedMove::new(&mv));
        tt.store(7, 30, 0, Bound::Lower, PackedMove::NONE);
        assert!(tt.probe(7).unwrap().best_move.matches(&mv));

        tt.store(71, 30, 0, Bound::Lower, PackedMove::NONE);
        assert!(tt.probe(71).unwrap().best_move.is_none());
    }

    #[test]
    fn bound_rules() {
        let entry = |score, bound| TtEntry {
            key: 1,
            score,
            best_move: PackedMove::NONE,
            depth: 10,
            bound,
        };

        assert_eq!(entry(50, Bound::Exact).cutoff(10, -100, 100), Some(50));
        assert_eq!(entry(50, Bound::Exact).cutoff(11, -100, 100), None, "too shallow");

        assert_eq!(entry(150, Bound::Lower).cutoff(5, -100, 100), Some(150));
        assert_eq!(entry(50, Bound::Lower).cutoff(5, -100, 100), None);

        assert_eq!(entry(-150, Bound::Upper).cutoff(5, -100, 100), Some(-150));
        assert_eq!(entry(-50, Bound::Upper).cutoff(5, -100, 100), None);
    }

    #[test]
    fn depth_is_clamped_into_entry() {
        let mut tt = TranspositionTable::new(8);
        tt.store(3, 0, -500, Bound::Exact, PackedMove::NONE);
        assert_eq!(tt.probe(3).unwrap().depth, i8::MIN);
    }

    #[test]
    fn promotions_pack_differently() {
        let promote = |role| Move::Normal {
            role: Role::Pawn,
            from: Square::A7,
            capture: None,
            to: Square::A8,
            promotion: Some(role),
        };
        assert_ne!(PackedMove::new(&promote(Role::Queen)), PackedMove::new(&promote(Role::Knight)));
        assert!(!PackedMove::new(&promote(Role::Queen)).is_none());
    }

    #[test]
    fn sized_from_megabytes() {
        let tt = TranspositionTable::from_megabytes(1);
        assert_eq!(tt.capacity(), 1024 * 1024 / std::mem::size_of::<TtEntry>());
    }
}
