//! Random message selection that avoids immediate repeats.

use crate::types::{Record, RecordId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Memory of the last record surfaced by a selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectorState {
    last_shown: Option<RecordId>,
}

impl SelectorState {
    /// A state that has shown nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_shown(id: RecordId) -> Self {
        Self {
            last_shown: Some(id),
        }
    }

    pub fn last_shown(&self) -> Option<RecordId> {
        self.last_shown
    }
}

/// Pick a record uniformly at random, skipping the one picked last time.
///
/// Falls back to the whole candidate list when excluding the last pick
/// leaves nothing. Returns `None` for an empty list without touching
/// `state`.
pub fn pick_avoiding<'a, R: Rng + ?Sized>(
    candidates: &'a [Record],
    state: &mut SelectorState,
    rng: &mut R,
) -> Option<&'a Record> {
    if candidates.is_empty() {
        return None;
    }

    let mut pool: Vec<&Record> = candidates
        .iter()
        .filter(|r| Some(r.id) != state.last_shown)
        .collect();
    if pool.is_empty() {
        pool = candidates.iter().collect();
    }

    let picked = pool[rng.gen_range(0..pool.len())];
    state.last_shown = Some(picked.id);
    Some(picked)
}

/// A [`SelectorState`] paired with its random source.
pub struct AntiRepeatSelector<R = StdRng> {
    state: SelectorState,
    rng: R,
}

impl AntiRepeatSelector<StdRng> {
    /// Fresh state, entropy-seeded generator.
    pub fn new() -> Self {
        Self::with_rng(SelectorState::new(), StdRng::from_entropy())
    }

    /// Fresh state, deterministic generator.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SelectorState::new(), StdRng::seed_from_u64(seed))
    }
}

impl Default for AntiRepeatSelector<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> AntiRepeatSelector<R> {
    pub fn with_rng(state: SelectorState, rng: R) -> Self {
        Self { state, rng }
    }

    /// Pick from `candidates`, see [`pick_avoiding`].
    pub fn pick<'a>(&mut self, candidates: &'a [Record]) -> Option<&'a Record> {
        pick_avoiding(candidates, &mut self.state, &mut self.rng)
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn records(ids: &[i64]) -> Vec<Record> {
        ids.iter()
            .map(|&id| Record::new(RecordId(id), format!("m{}", id), "anon"))
            .collect()
    }

    #[test]
    fn test_empty_candidates() {
        let before = SelectorState::with_last_shown(RecordId(4));
        let mut selector = AntiRepeatSelector::with_rng(before, StdRng::seed_from_u64(1));

        assert!(selector.pick(&[]).is_none());
        assert_eq!(selector.state(), before);
    }

    #[test]
    fn test_single_candidate_always_returned() {
        let mut selector = AntiRepeatSelector::seeded(7);
        let candidates = records(&[42]);
        for _ in 0..20 {
            assert_eq!(selector.pick(&candidates).unwrap().id, RecordId(42));
        }
        assert_eq!(selector.state().last_shown(), Some(RecordId(42)));
    }

    #[test]
    fn test_duplicate_rows_of_one_id() {
        let mut selector = AntiRepeatSelector::seeded(3);
        let candidates = records(&[5, 5, 5]);
        for _ in 0..10 {
            assert_eq!(selector.pick(&candidates).unwrap().id, RecordId(5));
        }
    }

    #[test]
    fn test_never_repeats_with_two() {
        let mut selector = AntiRepeatSelector::seeded(11);
        let candidates = records(&[1, 2]);
        let mut last = selector.pick(&candidates).unwrap().id;
        for _ in 0..200 {
            let next = selector.pick(&candidates).unwrap().id;
            assert_ne!(next, last);
            last = next;
        }
    }

    #[test]
    fn test_stale_last_shown_is_ignored() {
        let mut state = SelectorState::with_last_shown(RecordId(999));
        let mut rng = StdRng::seed_from_u64(5);
        let candidates = records(&[1]);

        let picked = pick_avoiding(&candidates, &mut state, &mut rng).unwrap();
        assert_eq!(picked.id, RecordId(1));
        assert_eq!(state.last_shown(), Some(RecordId(1)));
    }

    #[test]
    fn test_every_other_candidate_reachable() {
        let mut rng = StdRng::seed_from_u64(99);
        let candidates = records(&[1, 2, 3, 4]);
        let mut seen = HashSet::new();

        for _ in 0..500 {
            let mut state = SelectorState::with_last_shown(RecordId(1));
            seen.insert(pick_avoiding(&candidates, &mut state, &mut rng).unwrap().id);
        }

        let expected: HashSet<_> = [2, 3, 4].into_iter().map(RecordId).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_independent_states() {
        let candidates = records(&[1, 2, 3]);
        let mut a = AntiRepeatSelector::seeded(1);
        let b = AntiRepeatSelector::seeded(1);

        a.pick(&candidates);
        assert!(a.state().last_shown().is_some());
        assert_eq!(b.state().last_shown(), None);
    }
}
