// Exact dynamic program over whole cost units.
//
// When every cost is a whole multiple of a decimal unit (FPL prices are in
// tenths), the budget becomes a small integer capacity and each category is
// a knapsack with an exact item count. Categories are folded in one after
// another: the frontier holds, for every exact cost, the best selection of
// the categories done so far. Cells compare by score, then by the smaller
// id sequence; cost is the cell index, so the final scan settles cost ties.
//
// Within one cell every selection has the same size, and adding the same
// candidates to two such sets never changes which one holds the smallest id
// of their symmetric difference. That keeps the per-cell choice consistent
// with the global tie-break.

use super::{Block, SolveStats, TOLERANCE};

/// Decimal scales tried, smallest first.
const UNIT_SCALES: [f64; 5] = [1.0, 10.0, 100.0, 1_000.0, 10_000.0];

/// How far a scaled cost may sit from a whole number and still count as one.
const UNIT_SLACK: f64 = 1e-6;

/// Largest table (cells times bitset words) the grid allocates per category.
const MAX_TABLE_WORDS: usize = 8_000_000;

/// Largest number of cell relaxations the grid will perform.
const MAX_WORK: u64 = 200_000_000;

/// Integer view of the free candidates' costs and the budget left for them.
#[derive(Debug, Clone)]
pub(crate) struct CostGrid {
    /// Multiplier that turns costs into whole units.
    pub scale: f64,
    /// Common divisor of the free costs, in units. One grid column.
    pub step: u64,
    /// Per block, per item: cost in columns.
    weights: Vec<Vec<usize>>,
    /// Columns available to the free candidates.
    pub capacity: usize,
}

fn to_units(cost: f64, scale: f64) -> Option<u64> {
    let x = cost * scale;
    let r = x.round();
    if (x - r).abs() <= UNIT_SLACK && (0.0..9.0e15).contains(&r) {
        Some(r as u64)
    } else {
        None
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn words_for(pool_len: usize) -> usize {
    pool_len.div_ceil(64).max(1)
}

impl CostGrid {
    /// Build a grid if all costs share a decimal unit and the tables stay
    /// small. `None` means the caller should fall back to the search.
    pub(crate) fn fit(
        blocks: &[Block],
        forced_costs: &[f64],
        budget: f64,
        pool_len: usize,
    ) -> Option<Self> {
        UNIT_SCALES
            .iter()
            .find_map(|&scale| Self::fit_scale(blocks, forced_costs, budget, pool_len, scale))
    }

    fn fit_scale(
        blocks: &[Block],
        forced_costs: &[f64],
        budget: f64,
        pool_len: usize,
        scale: f64,
    ) -> Option<Self> {
        let units: Vec<Vec<u64>> = blocks
            .iter()
            .map(|b| {
                b.items
                    .iter()
                    .map(|it| to_units(it.cost, scale))
                    .collect::<Option<Vec<u64>>>()
            })
            .collect::<Option<_>>()?;
        let forced_units = forced_costs
            .iter()
            .map(|&c| to_units(c, scale))
            .try_fold(0u64, |acc, u| acc.checked_add(u?))?;

        let budget_units = ((budget + TOLERANCE) * scale).floor();
        if !(0.0..9.0e15).contains(&budget_units) {
            return None;
        }
        let mut left = (budget_units as u64).checked_sub(forced_units)?;

        // Spending beyond the dearest possible fill buys nothing.
        let dearest: u64 = units
            .iter()
            .zip(blocks)
            .map(|(u, b)| {
                let mut sorted = u.clone();
                sorted.sort_unstable_by(|a, b| b.cmp(a));
                sorted.iter().take(b.need).sum::<u64>()
            })
            .sum();
        left = left.min(dearest);

        let step = units.iter().flatten().fold(0, |g, &u| gcd(g, u)).max(1);
        let capacity = usize::try_from(left / step).ok()?;

        let max_need = blocks.iter().map(|b| b.need).max().unwrap_or(0);
        let cells = (max_need + 1).checked_mul(capacity + 1)?;
        if cells.checked_mul(words_for(pool_len))? > MAX_TABLE_WORDS {
            return None;
        }
        let work: u64 = blocks
            .iter()
            .map(|b| (b.items.len() * b.need) as u64 * (capacity as u64 + 1))
            .sum();
        if work > MAX_WORK {
            return None;
        }

        let weights = units
            .iter()
            .map(|u| u.iter().map(|&x| (x / step) as usize).collect())
            .collect();
        Some(CostGrid {
            scale,
            step,
            weights,
            capacity,
        })
    }

    /// Best free members (pool indices, ascending) under the tie-break rules,
    /// or `None` if nothing fits.
    pub(crate) fn solve(&self, blocks: &[Block], pool_len: usize) -> (Option<Vec<usize>>, SolveStats) {
        let width = self.capacity + 1;
        let words = words_for(pool_len);
        let mut stats = SolveStats::default();

        let mut frontier = Table::new(1, width, words);
        frontier.score[0] = 0.0;

        for (block, weights) in blocks.iter().zip(&self.weights) {
            let mut table = Table::new(block.need + 1, width, words);
            table.load_row(0, &frontier);
            for (item, &w) in block.items.iter().zip(weights) {
                for k in (1..=block.need).rev() {
                    for c in (w..width).rev() {
                        stats.nodes += 1;
                        if table.relax((k, c), (k - 1, c - w), item.score, item.pool_index) {
                            stats.improvements += 1;
                        }
                    }
                }
            }
            frontier = table.row(block.need);
        }

        // Columns are scanned cheapest first, so a later column only wins on
        // a strictly higher score.
        let mut best: Option<usize> = None;
        for c in 0..width {
            let s = frontier.score[c];
            if s == f64::NEG_INFINITY {
                continue;
            }
            stats.leaves += 1;
            match best {
                Some(b) if s <= frontier.score[b] + TOLERANCE => {}
                _ => best = Some(c),
            }
        }

        (best.map(|c| frontier.members(0, c)), stats)
    }
}

/// Rows of (score, member bitset) cells, one row per item count.
struct Table {
    width: usize,
    words: usize,
    score: Vec<f64>,
    sets: Vec<u64>,
}

impl Table {
    fn new(rows: usize, width: usize, words: usize) -> Self {
        Table {
            width,
            words,
            score: vec![f64::NEG_INFINITY; rows * width],
            sets: vec![0; rows * width * words],
        }
    }

    fn cell(&self, k: usize, c: usize) -> usize {
        k * self.width + c
    }

    /// Copy the single row of `from` into row `k`.
    fn load_row(&mut self, k: usize, from: &Table) {
        let start = self.cell(k, 0);
        self.score[start..start + self.width].copy_from_slice(&from.score[..self.width]);
        let w = self.words;
        self.sets[start * w..(start + self.width) * w]
            .copy_from_slice(&from.sets[..self.width * w]);
    }

    /// Row `k` as a one-row table.
    fn row(&self, k: usize) -> Table {
        let start = self.cell(k, 0);
        let w = self.words;
        Table {
            width: self.width,
            words: w,
            score: self.score[start..start + self.width].to_vec(),
            sets: self.sets[start * w..(start + self.width) * w].to_vec(),
        }
    }

    /// Offer `src ∪ {bit}` with score `src + gain` to cell `dst`.
    fn relax(&mut self, dst: (usize, usize), src: (usize, usize), gain: f64, bit: usize) -> bool {
        let src = self.cell(src.0, src.1);
        let dst = self.cell(dst.0, dst.1);
        let base = self.score[src];
        if base == f64::NEG_INFINITY {
            return false;
        }

        let cand = base + gain;
        let cur = self.score[dst];
        let take = if cur == f64::NEG_INFINITY || cand > cur + TOLERANCE {
            true
        } else if cand < cur - TOLERANCE {
            false
        } else {
            self.smaller_with(src, bit, dst)
        };

        if take {
            let w = self.words;
            self.score[dst] = cand;
            self.sets.copy_within(src * w..(src + 1) * w, dst * w);
            self.sets[dst * w + bit / 64] |= 1u64 << (bit % 64);
        }
        take
    }

    /// Whether `src ∪ {bit}` holds the smallest element of its symmetric
    /// difference with `dst`.
    fn smaller_with(&self, src: usize, bit: usize, dst: usize) -> bool {
        let w = self.words;
        for i in 0..w {
            let mut a = self.sets[src * w + i];
            if i == bit / 64 {
                a |= 1u64 << (bit % 64);
            }
            let diff = a ^ self.sets[dst * w + i];
            if diff != 0 {
                return a & (1u64 << diff.trailing_zeros()) != 0;
            }
        }
        false
    }

    fn members(&self, k: usize, c: usize) -> Vec<usize> {
        let w = self.words;
        let at = self.cell(k, c) * w;
        let mut out = Vec::new();
        for (i, &word) in self.sets[at..at + w].iter().enumerate() {
            let mut bits = word;
            while bits != 0 {
                let tz = bits.trailing_zeros() as usize;
                out.push(i * 64 + tz);
                bits &= bits - 1;
            }
        }
        out
    }
}
