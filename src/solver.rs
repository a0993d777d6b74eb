use std::time::Instant;

use tracing::info;

use crate::anneal::Annealer;
use crate::config::{Algorithm, SolverConfig};
use crate::error::PackError;
use crate::greedy::greedy;
use crate::search::{Search, precheck};
use crate::types::{Demand, Placement, Solution, Status};

pub struct Solver {
    width: u32,
    demands: Vec<Demand>,
    config: SolverConfig,
}

impl Solver {
    pub fn new(width: u32, demands: Vec<Demand>, config: SolverConfig) -> Self {
        Self {
            width,
            demands,
            config,
        }
    }

    pub fn total_items(&self) -> u64 {
        self.demands.iter().map(|d| d.qty as u64).sum()
    }

    pub fn solve(&self) -> Result<Solution, PackError> {
        precheck(self.width, &self.demands)?;
        let start = Instant::now();

        let solution = match self.config.algorithm {
            Algorithm::Exhaustive => {
                let outcome = Search::new(
                    self.width,
                    &self.demands,
                    self.config.limits,
                    self.config.prune,
                )
                .run(self.demands.clone())?;
                let status = if outcome.stats.truncated {
                    Status::Truncated
                } else {
                    Status::Complete
                };
                let mut solution = self.solution(outcome.length, outcome.placements, status, start);
                solution.stats = Some(outcome.stats);
                solution
            }
            Algorithm::Greedy => {
                let (length, placements) = greedy(self.width, &self.demands);
                self.solution(length, placements, Status::Heuristic, start)
            }
            Algorithm::Annealing => {
                let annealer =
                    Annealer::new(self.width, self.config.anneal.clone(), self.config.limits);
                let outcome = annealer.run(&self.demands);
                self.solution(outcome.length, outcome.placements, Status::Heuristic, start)
            }
        };

        info!(
            algorithm = %self.config.algorithm,
            items = self.total_items(),
            length = solution.length,
            status = %solution.status,
            elapsed_secs = solution.elapsed_secs,
            "packing done"
        );
        Ok(solution)
    }

    fn solution(
        &self,
        length: u32,
        placements: Vec<Placement>,
        status: Status,
        start: Instant,
    ) -> Solution {
        Solution {
            width: self.width,
            length,
            placements,
            status,
            elapsed_secs: start.elapsed().as_secs_f64(),
            stats: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnnealConfig, SearchLimits};

    /// Validates a complete solution:
    /// 1. Every placement lies inside the roll width
    /// 2. No two placements overlap
    /// 3. Every demanded copy is placed with a demanded shape
    /// 4. The length is the lowest bottom edge
    fn assert_solution_valid(sol: &Solution, demands: &[Demand]) {
        let expected: u64 = demands.iter().map(|d| d.qty as u64).sum();
        assert_eq!(
            sol.placed_count() as u64,
            expected,
            "expected {} pieces placed, got {}",
            expected,
            sol.placed_count()
        );

        let mut per_item = vec![0u32; demands.len()];
        for (pi, p) in sol.placements.iter().enumerate() {
            assert!(
                p.right() <= sol.width,
                "piece {pi} ({}) exceeds roll width: x={} + w={} > {}",
                p.rect,
                p.x,
                p.rect.w,
                sol.width
            );
            let shape = demands[p.item].rect;
            assert!(
                p.rect == shape || p.rect == shape.rotated(),
                "piece {pi} is {} but item {} is {}",
                p.rect,
                p.item,
                shape
            );
            per_item[p.item] += 1;
        }
        for (item, d) in demands.iter().enumerate() {
            assert_eq!(per_item[item], d.qty, "item {item} placed the wrong number of times");
        }

        assert_no_overlaps(&sol.placements);

        let max_bottom = sol.placements.iter().map(Placement::bottom).max().unwrap_or(0);
        assert_eq!(sol.length, max_bottom);
    }

    fn assert_no_overlaps(placements: &[Placement]) {
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                let a = &placements[i];
                let b = &placements[j];
                assert!(
                    !a.overlaps(b),
                    "piece {i} ({} @ ({},{})) overlaps piece {j} ({} @ ({},{}))",
                    a.rect,
                    a.x,
                    a.y,
                    b.rect,
                    b.x,
                    b.y
                );
            }
        }
    }

    fn solve_with(algorithm: Algorithm, width: u32, demands: &[Demand]) -> Solution {
        let config = SolverConfig::default()
            .with_algorithm(algorithm)
            .with_anneal(AnnealConfig::default().with_seed(17).with_iterations(3_000));
        Solver::new(width, demands.to_vec(), config).solve().unwrap()
    }

    const ALL: [Algorithm; 3] = [Algorithm::Exhaustive, Algorithm::Greedy, Algorithm::Annealing];

    #[test]
    fn test_single_piece() {
        let demands = vec![Demand::new(5, 5, 1)];
        for algorithm in ALL {
            let sol = solve_with(algorithm, 10, &demands);
            assert_solution_valid(&sol, &demands);
            assert_eq!(sol.length, 5);
        }
    }

    #[test]
    fn test_no_demands() {
        for algorithm in ALL {
            let sol = solve_with(algorithm, 10, &[]);
            assert_solution_valid(&sol, &[]);
            assert_eq!(sol.length, 0);
            assert!((sol.waste_percent() - 0.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_rotation_helps() {
        // Roll width 5, piece 10x5 only fits lying across the roll as 5x10.
        let demands = vec![Demand::new(10, 5, 1)];
        for algorithm in ALL {
            let sol = solve_with(algorithm, 5, &demands);
            assert_solution_valid(&sol, &demands);
            assert_eq!(sol.length, 10);
            assert!(sol.placements[0].rotated);
        }
    }

    #[test]
    fn test_status_per_algorithm() {
        let demands = vec![
            Demand::new(3, 2, 2),
            Demand::new(2, 1, 2),
            Demand::new(4, 1, 1),
        ];
        let exact = solve_with(Algorithm::Exhaustive, 5, &demands);
        let greedy = solve_with(Algorithm::Greedy, 5, &demands);
        assert_solution_valid(&exact, &demands);
        assert_solution_valid(&greedy, &demands);
        assert!(exact.length >= 4 && greedy.length >= 4);
        assert_eq!(exact.status, Status::Complete);
        assert_eq!(greedy.status, Status::Heuristic);
        assert!(exact.stats.is_some());
        assert!(greedy.stats.is_none());
    }

    #[test]
    fn test_infeasible_piece_is_rejected_by_every_algorithm() {
        let demands = vec![Demand::new(6, 7, 1)];
        for algorithm in ALL {
            let config = SolverConfig::default().with_algorithm(algorithm);
            let err = Solver::new(5, demands.clone(), config).solve().unwrap_err();
            assert!(matches!(err, PackError::Infeasible { item: 0, .. }));
        }
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let err = Solver::new(0, vec![], SolverConfig::default()).solve().unwrap_err();
        assert_eq!(err, PackError::InvalidWidth(0));
    }

    #[test]
    fn test_node_budget_marks_truncated() {
        let demands = vec![Demand::new(2, 1, 3), Demand::new(1, 3, 2)];
        let config = SolverConfig::default()
            .with_limits(SearchLimits::unbounded().with_node_limit(6));
        let sol = Solver::new(3, demands.clone(), config).solve().unwrap();
        assert_eq!(sol.status, Status::Truncated);
        assert_solution_valid(&sol, &demands);
        assert!(sol.stats.is_some_and(|s| s.truncated));
    }

    /// 30 pieces, 6 different sizes.
    /// Verifies all pieces are placed and nothing overlaps or leaves the roll.
    #[test]
    fn test_heuristics_on_mixed_sizes() {
        let demands = vec![
            Demand::new(8, 6, 5),
            Demand::new(4, 3, 8),
            Demand::new(6, 4, 4),
            Demand::new(12, 6, 3),
            Demand::new(3, 2, 6),
            Demand::new(5, 5, 4),
        ];
        assert_eq!(demands.iter().map(|d| d.qty).sum::<u32>(), 30);

        for algorithm in [Algorithm::Greedy, Algorithm::Annealing] {
            let sol = solve_with(algorithm, 24, &demands);
            assert_solution_valid(&sol, &demands);

            let area: u64 = demands.iter().map(Demand::remaining_area).sum();
            assert!(sol.length as u64 >= area.div_ceil(24));
            assert!(sol.waste_percent() >= 0.0 && sol.waste_percent() < 100.0);
        }
    }

    #[test]
    fn test_total_items() {
        let solver = Solver::new(
            4,
            vec![Demand::new(1, 1, 3), Demand::new(2, 1, 4)],
            SolverConfig::default(),
        );
        assert_eq!(solver.total_items(), 7);
    }
}
