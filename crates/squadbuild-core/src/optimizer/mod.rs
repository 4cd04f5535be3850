// Exact 0/1 squad selection.
//
// Maximise total predicted score subject to exact per-category quotas, a
// budget cap and forced membership. Ties are broken by lower total cost,
// then by the lexicographically smallest sorted id sequence.

mod bounds;
mod grid;
mod search;

use serde::Serialize;
use tracing::debug;

use crate::category::Category;
use crate::constraints::ConstraintSpec;
use crate::error::{ForcedConflict, InfeasibleError};
use crate::pool::CandidatePool;

use self::grid::CostGrid;
use self::search::Search;

/// Absolute tolerance for comparing accumulated scores and costs.
pub const TOLERANCE: f64 = 1e-9;

/// Solver counters, useful for diagnosing slow pools. The cost grid counts
/// cell relaxations as nodes and reachable final costs as leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SolveStats {
    pub nodes: u64,
    pub pruned: u64,
    pub leaves: u64,
    pub improvements: u64,
}

/// The optimal selection for one solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Selected candidate ids, ascending.
    pub ids: Vec<String>,
    pub total_score: f64,
    pub total_cost: f64,
    #[serde(skip)]
    pub stats: SolveStats,
}

impl Selection {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.binary_search_by(|held| held.as_str().cmp(id)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A free candidate as the search sees it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Item {
    pub pool_index: usize,
    pub score: f64,
    pub cost: f64,
}

/// The free candidates of one category that still has places to fill.
#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub category: Category,
    pub need: usize,
    /// Sorted by score desc, cost asc, id asc.
    pub items: Vec<Item>,
    /// For each item, the index just past its run of interchangeable twins
    /// (identical score and cost).
    pub run_end: Vec<usize>,
}

impl Block {
    fn new(category: Category, need: usize, mut items: Vec<Item>) -> Self {
        items.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.cost.total_cmp(&b.cost))
                .then_with(|| a.pool_index.cmp(&b.pool_index))
        });

        let mut run_end = vec![items.len(); items.len()];
        for j in (0..items.len().saturating_sub(1)).rev() {
            let same = items[j].score == items[j + 1].score && items[j].cost == items[j + 1].cost;
            run_end[j] = if same { run_end[j + 1] } else { j + 1 };
        }

        Block {
            category,
            need,
            items,
            run_end,
        }
    }

    /// Cost of the `need` cheapest items.
    fn cheapest_fill(&self) -> f64 {
        let mut costs: Vec<f64> = self.items.iter().map(|it| it.cost).collect();
        costs.sort_unstable_by(f64::total_cmp);
        costs.iter().take(self.need).sum()
    }
}

/// How the optimum is found once the problem is known to be feasible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    /// Cost grid when costs share a decimal unit, search otherwise.
    Auto,
    /// Always branch-and-bound.
    Search,
}

/// Solve the selection problem for a validated pool and constraint set.
///
/// Returns the unique optimal selection under the tie-breaking rules, or the
/// first violated constraint family: forced selection, then category
/// shortage, then budget.
pub fn optimize(pool: &CandidatePool, spec: &ConstraintSpec) -> Result<Selection, InfeasibleError> {
    optimize_with(pool, spec, Method::Auto)
}

pub(crate) fn optimize_with(
    pool: &CandidatePool,
    spec: &ConstraintSpec,
    method: Method,
) -> Result<Selection, InfeasibleError> {
    let budget = spec.budget();
    let roster_size = spec.roster_size();

    // Forced members, in id order.
    let forced: Vec<usize> = spec
        .must_include()
        .iter()
        .filter_map(|id| pool.index_of(id))
        .collect();
    if forced.len() > roster_size {
        return Err(InfeasibleError::ForcedSelection(
            ForcedConflict::TooManyForced {
                forced: forced.len(),
                roster_size,
            },
        ));
    }

    let candidates = pool.candidates();
    let mut blocks = Vec::new();
    let mut shortage = None;

    for (category, quota) in spec.quotas() {
        let forced_here = forced
            .iter()
            .filter(|&&i| candidates[i].category == category)
            .count();
        if forced_here > quota {
            return Err(InfeasibleError::ForcedSelection(
                ForcedConflict::CategoryOverfilled {
                    category,
                    forced: forced_here,
                    quota,
                },
            ));
        }

        let free: Vec<Item> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.category == category && !spec.is_included(&c.id) && !spec.is_excluded(&c.id)
            })
            .map(|(i, c)| Item {
                pool_index: i,
                score: c.predicted_score,
                cost: c.cost,
            })
            .collect();

        let need = quota - forced_here;
        if free.len() < need && shortage.is_none() {
            shortage = Some(InfeasibleError::CategoryShortage {
                category,
                required: quota,
                available: forced_here + free.len(),
            });
        }
        if need > 0 {
            blocks.push(Block::new(category, need, free));
        }
    }

    let forced_score: f64 = forced.iter().map(|&i| candidates[i].predicted_score).sum();
    let forced_cost: f64 = forced.iter().map(|&i| candidates[i].cost).sum();
    if forced_cost > budget + TOLERANCE {
        return Err(InfeasibleError::ForcedSelection(
            ForcedConflict::ForcedOverBudget {
                forced_cost,
                budget,
            },
        ));
    }
    if let Some(err) = shortage {
        return Err(err);
    }

    let minimum_cost = forced_cost + blocks.iter().map(Block::cheapest_fill).sum::<f64>();
    if minimum_cost > budget + TOLERANCE {
        return Err(InfeasibleError::Budget {
            budget,
            minimum_cost,
        });
    }

    for block in &blocks {
        debug!(
            category = %block.category,
            need = block.need,
            free = block.items.len(),
            "category block"
        );
    }

    let forced_costs: Vec<f64> = forced.iter().map(|&i| candidates[i].cost).collect();
    let grid = match method {
        Method::Auto => CostGrid::fit(&blocks, &forced_costs, budget, candidates.len()),
        Method::Search => None,
    };

    let (members, stats) = match grid {
        Some(grid) => {
            debug!(
                candidates = pool.len(),
                roster_size,
                scale = grid.scale,
                step = grid.step,
                capacity = grid.capacity,
                "solving on cost grid"
            );
            let (free, stats) = grid.solve(&blocks, candidates.len());
            let members = free.map(|mut free| {
                free.extend_from_slice(&forced);
                free.sort_unstable();
                free
            });
            (members, stats)
        }
        None => {
            let multiplier = bounds::tune_multiplier(&blocks, budget + TOLERANCE - forced_cost);
            let lambdas = bounds::multiplier_ladder(multiplier);
            debug!(
                candidates = pool.len(),
                roster_size,
                blocks = blocks.len(),
                multiplier,
                "starting squad search"
            );
            let (best, stats) =
                Search::new(&blocks, &lambdas, budget).run(forced, forced_score, forced_cost);
            (best.map(|b| b.members), stats)
        }
    };
    debug!(
        nodes = stats.nodes,
        pruned = stats.pruned,
        leaves = stats.leaves,
        improvements = stats.improvements,
        "squad selection finished"
    );

    // The cheapest fill is feasible, so a selection always exists unless
    // rounding put that fill a hair over the budget.
    let Some(members) = members else {
        return Err(InfeasibleError::Budget {
            budget,
            minimum_cost,
        });
    };

    let ids: Vec<String> = members.iter().map(|&i| candidates[i].id.clone()).collect();
    let total_score = members.iter().map(|&i| candidates[i].predicted_score).sum();
    let total_cost = members.iter().map(|&i| candidates[i].cost).sum();

    Ok(Selection {
        ids,
        total_score,
        total_cost,
        stats,
    })
}
