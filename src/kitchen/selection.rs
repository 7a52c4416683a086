use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use tracing::warn;

use crate::dataset::{Catalogue, SymbolId};
use super::resolver::PairResolver;

/// Maximum number of picks a session holds.
pub const SELECTION_CAPACITY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    Empty,
    OnePicked,
    TwoPicked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("symbol {0} is not in the catalogue")]
    UnknownSymbol(SymbolId),
    #[error("no catalogue entry has a known combination")]
    NoPairsAvailable,
    #[error("invalid share link: {0}")]
    InvalidLink(String),
}

/// A session's current picks, oldest first. New picks go to the back and the
/// front is evicted once the buffer exceeds its capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    picks: Vec<SymbolId>,
}

impl Selection {
    pub fn new() -> Self {
        Self { picks: Vec::with_capacity(SELECTION_CAPACITY + 1) }
    }

    /// Builds a selection from an ordered list, keeping only the most recent
    /// picks when the list is too long.
    pub fn from_ids(ids: impl IntoIterator<Item = SymbolId>) -> Self {
        let mut picks: Vec<SymbolId> = ids.into_iter().collect();
        if picks.len() > SELECTION_CAPACITY {
            warn!("Clamping selection of {} picks to the latest {}", picks.len(), SELECTION_CAPACITY);
            picks.drain(..picks.len() - SELECTION_CAPACITY);
        }
        Self { picks }
    }

    pub fn picks(&self) -> &[SymbolId] {
        &self.picks
    }

    pub fn state(&self) -> SelectionState {
        match self.picks.len() {
            0 => SelectionState::Empty,
            1 => SelectionState::OnePicked,
            2 => SelectionState::TwoPicked,
            n => {
                debug_assert!(n <= SELECTION_CAPACITY, "selection holds {} picks", n);
                warn!("Selection holds {} picks; treating it as full", n);
                SelectionState::TwoPicked
            }
        }
    }

    pub fn first(&self) -> Option<&SymbolId> {
        self.picks.first()
    }

    /// Both picks, only once the selection is complete.
    pub fn pair(&self) -> Option<(&SymbolId, &SymbolId)> {
        match self.picks.as_slice() {
            [a, b] => Some((a, b)),
            _ => None,
        }
    }

    pub fn select(&mut self, id: SymbolId) {
        self.picks.push(id);
        if self.picks.len() > SELECTION_CAPACITY {
            self.picks.remove(0);
        }
        debug_assert!(self.picks.len() <= SELECTION_CAPACITY);
    }

    pub fn clear(&mut self) {
        self.picks.clear();
    }

    /// Jumps straight to a resolvable pair: a uniform first pick among
    /// catalogue entries with at least one catalogued partner, then a uniform
    /// catalogued partner. Both picks stay selectable, so the share link
    /// reopens.
    pub fn pick_random<R: Rng + ?Sized>(
        &mut self,
        catalogue: &Catalogue,
        resolver: &PairResolver,
        rng: &mut R,
    ) -> Result<(), SelectionError> {
        let candidates: Vec<&SymbolId> = catalogue
            .ids()
            .iter()
            .filter(|id| has_catalogued_partner(catalogue, resolver, id))
            .collect();

        let first = *candidates.choose(rng).ok_or(SelectionError::NoPairsAvailable)?;
        let partners: Vec<&SymbolId> = catalogued_partners(catalogue, resolver, first).collect();
        let second = *partners.choose(rng).ok_or(SelectionError::NoPairsAvailable)?;

        self.picks = vec![first.clone(), second.clone()];
        Ok(())
    }
}

fn catalogued_partners<'a>(
    catalogue: &'a Catalogue,
    resolver: &'a PairResolver,
    id: &SymbolId,
) -> impl Iterator<Item = &'a SymbolId> {
    resolver
        .compatible_partners(id)
        .iter()
        .filter(move |partner| catalogue.contains(partner))
}

/// True when `id` combines with at least one selectable symbol.
pub fn has_catalogued_partner(catalogue: &Catalogue, resolver: &PairResolver, id: &SymbolId) -> bool {
    catalogued_partners(catalogue, resolver, id).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{PairRecord, PairTable};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn id(raw: &str) -> SymbolId {
        SymbolId::parse(raw).unwrap()
    }

    fn fixtures() -> (Catalogue, PairResolver) {
        let catalogue = Catalogue::new(vec![id("1f600"), id("1f602"), id("1f605"), id("1f4a9")]);
        let resolver = PairResolver::new(PairTable::new(vec![
            PairRecord { left: id("1f600"), right: id("1f602"), date: "20210831".into() },
            PairRecord { left: id("1f605"), right: id("1f605"), date: "20201001".into() },
        ]));
        (catalogue, resolver)
    }

    #[test]
    fn walks_through_states() {
        let mut selection = Selection::new();
        assert_eq!(selection.state(), SelectionState::Empty);
        assert!(selection.pair().is_none());

        selection.select(id("1f600"));
        assert_eq!(selection.state(), SelectionState::OnePicked);
        assert_eq!(selection.picks(), &[id("1f600")]);

        selection.select(id("1f602"));
        assert_eq!(selection.state(), SelectionState::TwoPicked);
        assert_eq!(selection.pair(), Some((&id("1f600"), &id("1f602"))));
    }

    #[test]
    fn third_pick_evicts_the_oldest() {
        let mut selection = Selection::new();
        selection.select(id("1f600"));
        selection.select(id("1f602"));
        selection.select(id("1f605"));

        assert_eq!(selection.picks(), &[id("1f602"), id("1f605")]);

        selection.select(id("1f600"));
        assert_eq!(selection.picks(), &[id("1f605"), id("1f600")]);
    }

    #[test]
    fn clear_returns_to_empty_from_any_state() {
        for count in 0..=3 {
            let mut selection = Selection::new();
            for raw in ["1f600", "1f602", "1f605"].iter().take(count) {
                selection.select(id(raw));
            }
            selection.clear();
            assert_eq!(selection.state(), SelectionState::Empty);
        }
    }

    #[test]
    fn from_ids_keeps_the_latest_two() {
        let selection = Selection::from_ids(vec![id("1f600"), id("1f602"), id("1f605")]);
        assert_eq!(selection.picks(), &[id("1f602"), id("1f605")]);
    }

    #[test]
    fn random_pick_always_resolves() {
        let (catalogue, resolver) = fixtures();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let mut selection = Selection::new();
            selection.pick_random(&catalogue, &resolver, &mut rng).unwrap();
            let (a, b) = selection.pair().expect("random pick fills both slots");
            assert!(resolver.resolve_pair(a, b).is_found());
            // 1f4a9 has no partners and must never be drawn
            assert_ne!(a, &id("1f4a9"));
            assert!(catalogue.contains(a) && catalogue.contains(b));
        }
    }

    #[test]
    fn random_pick_skips_partners_outside_the_catalogue() {
        let catalogue = Catalogue::new(vec![id("1f600"), id("1f602")]);
        let resolver = PairResolver::new(PairTable::new(vec![
            PairRecord { left: id("1f600"), right: id("1f4a9"), date: "20201001".into() },
            PairRecord { left: id("1f4a9"), right: id("1f602"), date: "20201001".into() },
            PairRecord { left: id("1f602"), right: id("1f600"), date: "20210831".into() },
        ]));
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let mut selection = Selection::new();
            selection.pick_random(&catalogue, &resolver, &mut rng).unwrap();
            assert!(selection.picks().iter().all(|pick| catalogue.contains(pick)));
        }

        let lonely = Catalogue::new(vec![id("1f600")]);
        let err = Selection::new()
            .pick_random(&lonely, &resolver, &mut rng)
            .unwrap_err();
        assert_eq!(err, SelectionError::NoPairsAvailable);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "selection holds 3 picks")]
    fn overfull_selection_is_caught_in_debug_builds() {
        let selection = Selection { picks: vec![id("1f600"), id("1f602"), id("1f605")] };
        selection.state();
    }

    #[test]
    fn random_pick_without_pairs_fails_and_keeps_state() {
        let catalogue = Catalogue::new(vec![id("1f600")]);
        let resolver = PairResolver::new(PairTable::default());
        let mut selection = Selection::from_ids(vec![id("1f600")]);

        let err = selection
            .pick_random(&catalogue, &resolver, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(err, SelectionError::NoPairsAvailable);
        assert_eq!(selection.picks(), &[id("1f600")]);
    }
}
