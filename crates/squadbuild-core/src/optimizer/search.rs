// Depth-first branch-and-bound over the free candidates.
//
// Blocks are visited in category order; inside a block candidates are
// ordered by score (descending) so the include-first branch reaches strong
// incumbents early. Each block's quota is enforced structurally: a block is
// left as soon as its remaining need hits zero.

use super::bounds::SuffixTopK;
use super::{Block, SolveStats, TOLERANCE};

/// Extra margin applied when pruning, so that rounding in accumulated sums
/// never discards a selection that would win a tolerance-level tie.
const PRUNE_SLACK: f64 = 2.0 * TOLERANCE;

/// Best selection found so far. `members` are pool indices, ascending.
#[derive(Debug, Clone)]
pub(crate) struct Incumbent {
    pub score: f64,
    pub cost: f64,
    pub members: Vec<usize>,
}

impl Incumbent {
    /// Higher score, then lower cost, then the smaller id sequence.
    ///
    /// Pool indices follow id order, so comparing sorted index vectors is the
    /// same as comparing sorted id sequences.
    fn is_beaten_by(&self, score: f64, cost: f64, members: &[usize]) -> bool {
        if score > self.score + TOLERANCE {
            return true;
        }
        if score < self.score - TOLERANCE {
            return false;
        }
        if cost < self.cost - TOLERANCE {
            return true;
        }
        if cost > self.cost + TOLERANCE {
            return false;
        }
        members < self.members.as_slice()
    }
}

pub(crate) struct Search<'a> {
    blocks: &'a [Block],
    lambdas: &'a [f64],
    adj: Vec<Vec<SuffixTopK>>,
    cheap: Vec<SuffixTopK>,
    later_adj: Vec<Vec<f64>>,
    later_cheap: Vec<f64>,
    budget: f64,
    chosen: Vec<usize>,
    best: Option<Incumbent>,
    stats: SolveStats,
}

impl<'a> Search<'a> {
    pub(crate) fn new(blocks: &'a [Block], lambdas: &'a [f64], budget: f64) -> Self {
        let adj: Vec<Vec<SuffixTopK>> = blocks
            .iter()
            .map(|block| {
                lambdas
                    .iter()
                    .map(|&lambda| {
                        let values: Vec<f64> = block
                            .items
                            .iter()
                            .map(|it| it.score - lambda * it.cost)
                            .collect();
                        SuffixTopK::build(&values, block.need)
                    })
                    .collect()
            })
            .collect();

        // Cheapest fill = negated best fill over negated costs.
        let cheap: Vec<SuffixTopK> = blocks
            .iter()
            .map(|block| {
                let values: Vec<f64> = block.items.iter().map(|it| -it.cost).collect();
                SuffixTopK::build(&values, block.need)
            })
            .collect();

        let mut later_adj = vec![vec![0.0; lambdas.len()]; blocks.len()];
        let mut later_cheap = vec![0.0; blocks.len()];
        for b in (0..blocks.len().saturating_sub(1)).rev() {
            let next = b + 1;
            let need = blocks[next].need;
            for l in 0..lambdas.len() {
                later_adj[b][l] = later_adj[next][l] + adj[next][l].get(0, need);
            }
            later_cheap[b] = later_cheap[next] - cheap[next].get(0, need);
        }

        Search {
            blocks,
            lambdas,
            adj,
            cheap,
            later_adj,
            later_cheap,
            budget,
            chosen: Vec::new(),
            best: None,
            stats: SolveStats::default(),
        }
    }

    /// Run the search starting from the forced members and their totals.
    pub(crate) fn run(
        mut self,
        forced: Vec<usize>,
        score: f64,
        cost: f64,
    ) -> (Option<Incumbent>, SolveStats) {
        self.chosen = forced;
        match self.blocks.first() {
            Some(first) => self.dfs(0, 0, first.need, score, cost),
            None => self.offer(score, cost),
        }
        (self.best, self.stats)
    }

    fn dfs(&mut self, b: usize, j: usize, need: usize, score: f64, cost: f64) {
        self.stats.nodes += 1;
        let blocks = self.blocks;

        if need == 0 {
            match blocks.get(b + 1) {
                Some(next) => self.dfs(b + 1, 0, next.need, score, cost),
                None => self.offer(score, cost),
            }
            return;
        }

        let block = &blocks[b];
        if block.items.len() - j < need {
            return;
        }
        if !self.promising(b, j, need, score, cost) {
            self.stats.pruned += 1;
            return;
        }

        let item = &block.items[j];
        self.chosen.push(item.pool_index);
        self.dfs(b, j + 1, need - 1, score + item.score, cost + item.cost);
        self.chosen.pop();

        // Skipping a candidate also skips its interchangeable successors:
        // any selection that takes a later twin instead is beaten on id order.
        self.dfs(b, block.run_end[j], need, score, cost);
    }

    fn promising(&self, b: usize, j: usize, need: usize, score: f64, cost: f64) -> bool {
        let cost_lb = cost - self.cheap[b].get(j, need) + self.later_cheap[b];
        if cost_lb > self.budget + PRUNE_SLACK {
            return false;
        }

        let Some(best) = &self.best else {
            return true;
        };

        let upper = self.upper_bound(b, j, need, score, cost);
        if upper < best.score - PRUNE_SLACK {
            return false;
        }
        // Cannot beat the score, so it must win on cost or id order.
        if upper <= best.score && cost_lb > best.cost + PRUNE_SLACK {
            return false;
        }
        true
    }

    /// Tightest Lagrangian bound on any completion of this node. The budget
    /// carries the same tolerance `offer` accepts.
    fn upper_bound(&self, b: usize, j: usize, need: usize, score: f64, cost: f64) -> f64 {
        let budget_left = self.budget + TOLERANCE - cost;
        self.lambdas
            .iter()
            .enumerate()
            .map(|(l, &lambda)| {
                score + lambda * budget_left + self.adj[b][l].get(j, need) + self.later_adj[b][l]
            })
            .fold(f64::INFINITY, f64::min)
    }

    fn offer(&mut self, score: f64, cost: f64) {
        self.stats.leaves += 1;
        if cost > self.budget + TOLERANCE {
            return;
        }
        let mut members = self.chosen.clone();
        members.sort_unstable();

        let improves = match &self.best {
            None => true,
            Some(best) => best.is_beaten_by(score, cost, &members),
        };
        if improves {
            self.stats.improvements += 1;
            self.best = Some(Incumbent {
                score,
                cost,
                members,
            });
        }
    }
}
