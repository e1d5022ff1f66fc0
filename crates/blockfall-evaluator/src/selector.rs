//! Choosing a landing for the piece to place.
//!
//! [`PlacementSelector`] is a greedy one-step search: every landing from the
//! [`PlacementEnumerator`] is locked into a copy of the grid, the copy is scored by a
//! [`PlacementEvaluator`], and the strictly highest score wins. Full rows are left in
//! place on the copy so that the evaluator can count them. Equal scores keep the
//! earliest landing in enumeration order, which makes the choice deterministic.
//!
//! [`RandomPolicy`] picks uniformly among legal landings and serves as a baseline.

use blockfall_engine::{Grid, Landing, PieceCatalog, PieceKind};
use rand::{Rng, seq::IndexedRandom as _};

use crate::{placement::PlacementEnumerator, placement_evaluator::PlacementEvaluator};

/// Something that decides where each piece goes.
pub trait MovePolicy {
    /// Picks a landing for `kind` on `grid`, or `None` when there is no legal landing.
    fn choose(&mut self, kind: PieceKind, grid: &Grid) -> Option<Landing>;
}

#[derive(Debug)]
pub struct PlacementSelector<'a> {
    enumerator: PlacementEnumerator<'a>,
    placement_evaluator: Box<dyn PlacementEvaluator + 'a>,
}

impl<'a> PlacementSelector<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a PieceCatalog,
        placement_evaluator: Box<dyn PlacementEvaluator + 'a>,
    ) -> Self {
        Self {
            enumerator: PlacementEnumerator::new(catalog),
            placement_evaluator,
        }
    }

    /// Returns the best landing of `kind` on `grid` with its score.
    #[must_use]
    pub fn select(&self, kind: PieceKind, grid: &Grid) -> Option<(Landing, f32)> {
        let catalog = self.enumerator.catalog();
        let mut best: Option<(Landing, f32)> = None;

        for landing in self.enumerator.landings(kind, grid) {
            let mut simulated = grid.clone();
            simulated.lock(landing.cells(catalog));
            let score = self.placement_evaluator.evaluate_board(&simulated);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((landing, score));
            }
        }

        best
    }
}

impl MovePolicy for PlacementSelector<'_> {
    fn choose(&mut self, kind: PieceKind, grid: &Grid) -> Option<Landing> {
        self.select(kind, grid).map(|(landing, _score)| landing)
    }
}

/// Chooses uniformly among legal landings.
#[derive(Debug)]
pub struct RandomPolicy<'a, R> {
    enumerator: PlacementEnumerator<'a>,
    rng: R,
}

impl<'a, R> RandomPolicy<'a, R>
where
    R: Rng,
{
    #[must_use]
    pub fn new(catalog: &'a PieceCatalog, rng: R) -> Self {
        Self {
            enumerator: PlacementEnumerator::new(catalog),
            rng,
        }
    }
}

impl<R> MovePolicy for RandomPolicy<'_, R>
where
    R: Rng,
{
    fn choose(&mut self, kind: PieceKind, grid: &Grid) -> Option<Landing> {
        self.enumerator
            .enumerate(kind, grid)
            .choose(&mut self.rng)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use blockfall_engine::Placement;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{board_feature::WeightVector, placement_evaluator::WeightedFeatureEvaluator};

    #[derive(Debug)]
    struct ConstantEvaluator;

    impl PlacementEvaluator for ConstantEvaluator {
        fn evaluate_board(&self, _grid: &Grid) -> f32 {
            1.0
        }
    }

    fn weighted(weights: Vec<f32>) -> Box<dyn PlacementEvaluator> {
        Box::new(WeightedFeatureEvaluator::new(
            WeightVector::new(weights).unwrap(),
        ))
    }

    #[test]
    fn test_ties_resolve_to_first_landing() {
        let catalog = PieceCatalog::standard();
        let selector = PlacementSelector::new(catalog, Box::new(ConstantEvaluator));
        let grid = Grid::standard();
        for kind in PieceKind::ALL {
            let (landing, score) = selector.select(kind, &grid).unwrap();
            let first = PlacementEnumerator::new(catalog).enumerate(kind, &grid)[0];
            assert_eq!(landing, first);
            assert_eq!(score, 1.0);
        }
    }

    #[test]
    fn test_prefers_completing_a_line() {
        let catalog = PieceCatalog::standard();
        let grid = Grid::from_ascii(
            "
            ..........
            ..........
            ..........
            ..........
            ####.#####
            ",
        );
        // reward lines, punish holes and height
        let selector = PlacementSelector::new(catalog, weighted(vec![-4.0, -0.2, 10.0, -0.5]));
        let (landing, _score) = selector.select(PieceKind::I, &grid).unwrap();
        assert_eq!(landing.placement.x, 4);
        assert_eq!(landing.placement.rotation % 2, 0);
    }

    #[test]
    fn test_simulated_board_is_not_cleared() {
        let catalog = PieceCatalog::standard();
        let grid = Grid::from_ascii(
            "
            ....
            ....
            ##..
            ",
        );
        // only count lines: an O filling the gap leaves one full row on the copy
        let selector = PlacementSelector::new(catalog, weighted(vec![0.0, 0.0, 1.0, 0.0]));
        let (landing, score) = selector.select(PieceKind::O, &grid).unwrap();
        assert_eq!(landing.placement, Placement::new(0, 2));
        assert_eq!(score, 1.0);
        // the input grid is untouched
        assert_eq!(grid.full_row_count(), 0);
    }

    #[test]
    fn test_no_landing_returns_none() {
        let catalog = PieceCatalog::standard();
        let grid = Grid::from_ascii(
            "
            ####
            ####
            ",
        );
        let mut selector = PlacementSelector::new(catalog, weighted(vec![0.0; 8]));
        assert!(selector.select(PieceKind::T, &grid).is_none());
        assert!(selector.choose(PieceKind::T, &grid).is_none());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let catalog = PieceCatalog::standard();
        let grid = Grid::from_ascii(
            "
            ..........
            ..........
            #.........
            ##...#..##
            ###.###.##
            ",
        );
        let weights = vec![-3.0, -0.4, 2.5, -0.6, -0.2, -0.3, -0.1, -0.4];
        let selector1 = PlacementSelector::new(catalog, weighted(weights.clone()));
        let selector2 = PlacementSelector::new(catalog, weighted(weights));
        for kind in PieceKind::ALL {
            assert_eq!(selector1.select(kind, &grid), selector2.select(kind, &grid));
        }
    }

    #[test]
    fn test_random_policy_picks_legal_landings() {
        let catalog = PieceCatalog::standard();
        let grid = Grid::standard();
        let legal = PlacementEnumerator::new(catalog).enumerate(PieceKind::L, &grid);
        let mut policy = RandomPolicy::new(catalog, Pcg32::seed_from_u64(3));
        for _ in 0..20 {
            let landing = policy.choose(PieceKind::L, &grid).unwrap();
            assert!(legal.contains(&landing));
        }

        let full = Grid::from_ascii("###\n###\n");
        assert!(policy.choose(PieceKind::L, &full).is_none());
    }
}
