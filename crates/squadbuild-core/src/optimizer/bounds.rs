// Bound tables for the branch-and-bound search.
//
// The upper bound relaxes the budget with a Lagrange multiplier: for any
// lambda >= 0 and any feasible completion x,
//
//   score(x) <= lambda * budget_left + sum((s_i - lambda * c_i) * x_i)
//
// and the right-hand side is maximised exactly by taking the best `need`
// adjusted values in each category. Every multiplier yields a valid bound;
// the search evaluates a small ladder of them and keeps the tightest.

use super::Block;

/// Largest sum of `k` values among the suffix starting at `j`, for every
/// `j` in `0..=len` and `k` in `0..=k_max`.
///
/// Entries where fewer than `k` values remain are `NEG_INFINITY`.
#[derive(Debug, Clone)]
pub(crate) struct SuffixTopK {
    width: usize,
    sums: Vec<f64>,
}

impl SuffixTopK {
    pub(crate) fn build(values: &[f64], k_max: usize) -> Self {
        let width = k_max + 1;
        let len = values.len();
        let mut sums = vec![f64::NEG_INFINITY; (len + 1) * width];
        let mut top: Vec<f64> = Vec::with_capacity(width);

        for j in (0..=len).rev() {
            if j < len {
                let v = values[j];
                let pos = top.partition_point(|&t| t >= v);
                if pos < k_max {
                    top.insert(pos, v);
                    top.truncate(k_max);
                }
            }
            let row = &mut sums[j * width..(j + 1) * width];
            row[0] = 0.0;
            let mut acc = 0.0;
            for (k, &t) in top.iter().enumerate() {
                acc += t;
                row[k + 1] = acc;
            }
        }

        SuffixTopK { width, sums }
    }

    #[inline]
    pub(crate) fn get(&self, j: usize, k: usize) -> f64 {
        self.sums[j * self.width + k]
    }
}

/// Sum of the `k` largest values (all of them if fewer than `k`).
fn top_sum(values: &mut [f64], k: usize) -> f64 {
    values.sort_unstable_by(|a, b| b.total_cmp(a));
    values.iter().take(k).sum()
}

/// Lagrangian dual value at the root for multiplier `lambda`, excluding the
/// forced candidates' fixed score.
pub(crate) fn dual_value(blocks: &[Block], budget_left: f64, lambda: f64) -> f64 {
    let mut total = lambda * budget_left;
    let mut scratch = Vec::new();
    for block in blocks {
        scratch.clear();
        scratch.extend(block.items.iter().map(|it| it.score - lambda * it.cost));
        total += top_sum(&mut scratch, block.need);
    }
    total
}

/// Find the multiplier minimising the root dual value.
///
/// The dual is convex and piecewise linear in lambda, so a ternary search
/// over a range that covers every breakpoint converges to a minimiser.
pub(crate) fn tune_multiplier(blocks: &[Block], budget_left: f64) -> f64 {
    let mut costs: Vec<f64> = blocks
        .iter()
        .flat_map(|b| b.items.iter().map(|it| it.cost))
        .collect();
    costs.sort_unstable_by(f64::total_cmp);
    let min_gap = costs
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d > 0.0)
        .fold(f64::INFINITY, f64::min);
    if !min_gap.is_finite() {
        // All costs equal: the budget never changes which candidates rank best.
        return 0.0;
    }

    let (min_s, max_s) = blocks
        .iter()
        .flat_map(|b| b.items.iter().map(|it| it.score))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s), hi.max(s))
        });
    let mut lo = 0.0;
    let mut hi = (max_s - min_s).max(1.0) / min_gap;

    for _ in 0..100 {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if dual_value(blocks, budget_left, m1) <= dual_value(blocks, budget_left, m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    let lambda = (lo + hi) / 2.0;

    // Never return a multiplier worse than the budget-free bound.
    if dual_value(blocks, budget_left, lambda) <= dual_value(blocks, budget_left, 0.0) {
        lambda
    } else {
        0.0
    }
}

/// Multipliers evaluated at every node, always including zero.
pub(crate) fn multiplier_ladder(best: f64) -> Vec<f64> {
    if best <= 0.0 {
        return vec![0.0];
    }
    vec![0.0, best * 0.5, best, best * 1.5, best * 2.0]
}
