// End-to-end tests for the selection engine through its public API.
//
// Small pools are checked against exhaustive enumeration; larger generated
// pools are checked for feasibility and reproducibility.

use proptest::prelude::*;

use squadbuild_core::{
    solve, solve_pool, AssembledRoster, CandidatePool, Category, InfeasibleError,
    InfeasibleReason, OptimizationError, RawCandidate, RawConstraints,
};

// ===========================================================================
// Helpers
// ===========================================================================

fn abc() -> Vec<RawCandidate> {
    vec![
        RawCandidate::new("A", "MID", 10.0, 5.0),
        RawCandidate::new("B", "MID", 8.0, 3.0),
        RawCandidate::new("C", "FWD", 6.0, 4.0),
    ]
}

fn ids(roster: &AssembledRoster) -> Vec<String> {
    let mut ids: Vec<String> = roster.entries().map(|e| e.id.clone()).collect();
    ids.sort();
    ids
}

fn infeasible_reason(err: &OptimizationError) -> InfeasibleReason {
    match err {
        OptimizationError::Infeasible(e) => e.reason(),
        other => panic!("expected Infeasible, got: {other}"),
    }
}

/// Deterministic generator so large-pool tests need no extra dependencies.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next() % (hi - lo)
    }
}

/// A synthetic FPL-sized pool: costs in tenths, scores loosely tied to cost.
fn generated_pool(n: usize, seed: u64) -> Vec<RawCandidate> {
    let mut rng = Lcg(seed);
    let cats = ["GKP", "DEF", "MID", "FWD"];
    (0..n)
        .map(|i| {
            let cat = cats[i % 4];
            let cost = rng.range(40, 131) as f64;
            let noise = rng.range(0, 400) as f64 / 100.0;
            let score = cost / 20.0 + noise;
            RawCandidate::new(&format!("P{i:03}"), cat, score, cost)
        })
        .collect()
}

fn fpl_quotas(budget: f64) -> RawConstraints {
    RawConstraints::new(&[("GKP", 2), ("DEF", 5), ("MID", 5), ("FWD", 3)], budget)
}

/// Exhaustive reference: best feasible subset under the same ordering
/// (score desc, cost asc, sorted ids asc), or None.
fn brute_force(rows: &[RawCandidate], raw: &RawConstraints) -> Option<Vec<String>> {
    let quota = |cat: Category| -> usize {
        raw.quotas
            .iter()
            .find(|(k, _)| Category::from_str_pos(k) == Some(cat))
            .map(|(_, &v)| v as usize)
            .unwrap_or(0)
    };

    let n = rows.len();
    let mut best: Option<(f64, f64, Vec<String>)> = None;
    for mask in 0u32..(1 << n) {
        let members: Vec<&RawCandidate> = (0..n)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| &rows[i])
            .collect();

        let ok_counts = Category::ALL.iter().all(|&cat| {
            members
                .iter()
                .filter(|m| Category::from_str_pos(&m.category) == Some(cat))
                .count()
                == quota(cat)
        });
        if !ok_counts {
            continue;
        }
        if raw.must_include.iter().any(|id| !members.iter().any(|m| &m.id == id)) {
            continue;
        }
        if raw.must_exclude.iter().any(|id| members.iter().any(|m| &m.id == id)) {
            continue;
        }
        let cost: f64 = members.iter().map(|m| m.cost).sum();
        if cost > raw.budget {
            continue;
        }
        let score: f64 = members.iter().map(|m| m.predicted_score).sum();
        let mut member_ids: Vec<String> = members.iter().map(|m| m.id.clone()).collect();
        member_ids.sort();

        let better = match &best {
            None => true,
            Some((bs, bc, bids)) => {
                score > *bs || (score == *bs && (cost < *bc || (cost == *bc && member_ids < *bids)))
            }
        };
        if better {
            best = Some((score, cost, member_ids));
        }
    }
    best.map(|(_, _, ids)| ids)
}

// ===========================================================================
// Worked scenarios
// ===========================================================================

#[test]
fn scenario_full_budget_takes_best_pair() {
    let roster = solve(abc(), &RawConstraints::new(&[("MID", 1), ("FWD", 1)], 9.0)).unwrap();
    assert_eq!(ids(&roster), vec!["A", "C"]);
    assert!((roster.total_predicted - 16.0).abs() < 1e-9);
    assert!((roster.total_cost - 9.0).abs() < 1e-9);
}

#[test]
fn scenario_budget_seven_takes_cheaper_pair() {
    let roster = solve(abc(), &RawConstraints::new(&[("MID", 1), ("FWD", 1)], 7.0)).unwrap();
    assert_eq!(ids(&roster), vec!["B", "C"]);
    assert!((roster.total_predicted - 14.0).abs() < 1e-9);
    assert!((roster.total_cost - 7.0).abs() < 1e-9);
}

#[test]
fn scenario_exclusion_forces_alternative() {
    let raw = RawConstraints::new(&[("MID", 1), ("FWD", 1)], 9.0).exclude("A");
    let roster = solve(abc(), &raw).unwrap();
    assert_eq!(ids(&roster), vec!["B", "C"]);
}

// ===========================================================================
// Boundary and diagnosis
// ===========================================================================

#[test]
fn budget_exactly_met_is_accepted_one_less_is_rejected() {
    let rows = vec![
        RawCandidate::new("G1", "GKP", 3.0, 45.0),
        RawCandidate::new("D1", "DEF", 4.0, 50.0),
        RawCandidate::new("D2", "DEF", 3.5, 50.0),
    ];
    let raw = RawConstraints::new(&[("GKP", 1), ("DEF", 2)], 145.0);
    let roster = solve(rows.clone(), &raw).unwrap();
    assert!((roster.total_cost - 145.0).abs() < 1e-9);

    let err = solve(rows, &RawConstraints::new(&[("GKP", 1), ("DEF", 2)], 144.0)).unwrap_err();
    assert_eq!(infeasible_reason(&err), InfeasibleReason::Budget);
    assert_eq!(err.code(), "budget");
}

#[test]
fn category_shortage_is_reported_with_category() {
    let err = solve(abc(), &RawConstraints::new(&[("MID", 1), ("FWD", 2)], 100.0)).unwrap_err();
    assert_eq!(infeasible_reason(&err), InfeasibleReason::CategoryShortage);
    match err {
        OptimizationError::Infeasible(InfeasibleError::CategoryShortage {
            category,
            required,
            available,
        }) => {
            assert_eq!(category, Category::Forward);
            assert_eq!(required, 2);
            assert_eq!(available, 1);
        }
        other => panic!("expected CategoryShortage, got: {other}"),
    }
}

#[test]
fn unfillable_huge_quotas_are_a_shortage() {
    let rows = vec![RawCandidate::new("A", "MID", 1.0, 1.0)];
    let raw = RawConstraints::new(
        &[("GKP", i64::MAX), ("DEF", i64::MAX), ("MID", i64::MAX), ("FWD", i64::MAX)],
        10.0,
    );
    let err = solve(rows, &raw).unwrap_err();
    assert_eq!(err.code(), "category_shortage");
    match err {
        OptimizationError::Infeasible(InfeasibleError::CategoryShortage {
            category,
            available,
            ..
        }) => {
            assert_eq!(category, Category::Goalkeeper);
            assert_eq!(available, 0);
        }
        other => panic!("expected CategoryShortage, got: {other}"),
    }
}

#[test]
fn forced_conflicts_are_classified() {
    let raw = RawConstraints::new(&[("MID", 1), ("FWD", 1)], 100.0)
        .include("A")
        .include("B");
    let err = solve(abc(), &raw).unwrap_err();
    assert_eq!(infeasible_reason(&err), InfeasibleReason::ForcedSelection);
    assert_eq!(err.code(), "category_overfilled");
    assert_eq!(err.report().subject.as_deref(), Some("MID"));
}

#[test]
fn validation_errors_precede_solving() {
    let err = solve(
        abc(),
        &RawConstraints::new(&[("MID", 1)], 9.0).include("A").exclude("A"),
    )
    .unwrap_err();
    assert_eq!(err.kind(), "invalid_constraint");

    let mut rows = abc();
    rows.push(RawCandidate::new("A", "FWD", 1.0, 1.0));
    let err = solve(rows, &RawConstraints::new(&[("MID", 1)], 9.0)).unwrap_err();
    assert_eq!(err.kind(), "data_integrity");
    assert_eq!(err.code(), "duplicate_id");
}

#[test]
fn error_report_serializes_machine_readable_fields() {
    let err = solve(abc(), &RawConstraints::new(&[("MID", 1), ("FWD", 1)], 1.0)).unwrap_err();
    let json = serde_json::to_value(err.report()).unwrap();
    assert_eq!(json["kind"], "infeasible");
    assert_eq!(json["code"], "budget");
    assert_eq!(json["reason"], "budget");
    assert_eq!(json["subject"], "budget");
}

// ===========================================================================
// Determinism
// ===========================================================================

#[test]
fn tied_optima_resolve_identically_regardless_of_input_order() {
    // Four ways to reach score 10 at cost 10; id order must decide.
    let rows = vec![
        RawCandidate::new("m4", "MID", 6.0, 6.0),
        RawCandidate::new("m2", "MID", 5.0, 5.0),
        RawCandidate::new("m3", "MID", 4.0, 4.0),
        RawCandidate::new("m1", "MID", 5.0, 5.0),
        RawCandidate::new("m5", "MID", 1.0, 1.0),
    ];
    let raw = RawConstraints::new(&[("MID", 2)], 10.0);

    let first = solve(rows.clone(), &raw).unwrap();
    assert_eq!(ids(&first), vec!["m1", "m2"]);

    let mut reversed = rows.clone();
    reversed.reverse();
    let second = solve(reversed, &raw).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn equal_score_prefers_cheaper_squad() {
    let rows = vec![
        RawCandidate::new("a", "DEF", 5.0, 6.0),
        RawCandidate::new("b", "DEF", 5.0, 4.0),
    ];
    let roster = solve(rows, &RawConstraints::new(&[("DEF", 1)], 10.0)).unwrap();
    assert_eq!(ids(&roster), vec!["b"]);
}

#[test]
fn concurrent_solves_agree() {
    let rows = generated_pool(120, 7);
    let pool = CandidatePool::new(rows).unwrap();
    let raw = fpl_quotas(1000.0);
    let expected = serde_json::to_string(&solve_pool(&pool, &raw).unwrap()).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| serde_json::to_string(&solve_pool(&pool, &raw).unwrap()).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

// ===========================================================================
// Larger pools
// ===========================================================================

#[test]
fn fpl_sized_pool_respects_quotas_budget_and_forced_sets() {
    let rows = generated_pool(200, 42);
    let raw = fpl_quotas(1000.0).include("P001").exclude("P002");
    let roster = solve(rows, &raw).unwrap();

    assert_eq!(roster.len(), 15);
    assert!(roster.total_cost <= 1000.0 + 1e-9);
    for (cat, n) in [
        (Category::Goalkeeper, 2),
        (Category::Defender, 5),
        (Category::Midfielder, 5),
        (Category::Forward, 3),
    ] {
        assert_eq!(roster.group(cat).map(|g| g.players.len()), Some(n));
    }
    let members = ids(&roster);
    assert!(members.contains(&"P001".to_string()));
    assert!(!members.contains(&"P002".to_string()));
}

#[test]
fn loosening_the_budget_never_lowers_the_score() {
    let rows = generated_pool(80, 3);
    let pool = CandidatePool::new(rows).unwrap();
    let mut last = f64::NEG_INFINITY;
    for budget in [850.0, 900.0, 1000.0, 1200.0] {
        let roster = solve_pool(&pool, &fpl_quotas(budget)).unwrap();
        assert!(roster.total_predicted >= last - 1e-9);
        last = roster.total_predicted;
    }
}

#[test]
fn cost_proportional_pool_solves_exactly() {
    // Scores track cost to within 0.009, so nearly every full squad is within
    // a point of every other and only the exact budget split decides.
    let mut rng = Lcg(2024);
    let cats = ["GKP", "DEF", "MID", "FWD"];
    let rows: Vec<RawCandidate> = (0..600)
        .map(|i| {
            let cost = rng.range(40, 150) as f64;
            let score = cost / 10.0 + rng.range(0, 10) as f64 / 1000.0;
            RawCandidate::new(&format!("Q{i:03}"), cats[i % 4], score, cost)
        })
        .collect();
    let pool = CandidatePool::new(rows).unwrap();
    let raw = fpl_quotas(1000.0);

    let roster = solve_pool(&pool, &raw).unwrap();
    assert_eq!(roster.len(), 15);
    assert!(roster.total_cost <= 1000.0 + 1e-9);
    // Leaving two tenths unspent forfeits 0.2 points, more than any noise
    // fifteen players can add back.
    assert!(roster.total_cost >= 998.0);

    let again = solve_pool(&pool, &raw).unwrap();
    assert_eq!(ids(&again), ids(&roster));
}

// ===========================================================================
// Exhaustive comparison
// ===========================================================================

fn small_pool() -> impl Strategy<Value = Vec<RawCandidate>> {
    prop::collection::vec((0usize..4, 0i32..40, 0i32..40), 1..=10).prop_map(|rows| {
        let cats = ["GKP", "DEF", "MID", "FWD"];
        rows.into_iter()
            .enumerate()
            .map(|(i, (cat, score, cost))| {
                // Quarter steps are exact in binary, so brute-force sums match.
                RawCandidate::new(
                    &format!("c{i:02}"),
                    cats[cat],
                    score as f64 / 4.0 - 2.0,
                    cost as f64 / 4.0,
                )
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn matches_exhaustive_search(
        rows in small_pool(),
        quotas in prop::array::uniform4(0i64..3),
        budget_quarters in 0i32..120,
        include_mask in 0u32..1024,
        exclude_mask in 0u32..1024,
    ) {
        let mut raw = RawConstraints::new(
            &[("GKP", quotas[0]), ("DEF", quotas[1]), ("MID", quotas[2]), ("FWD", quotas[3])],
            budget_quarters as f64 / 4.0,
        );
        for (i, row) in rows.iter().enumerate() {
            // Keep forced sets sparse so most cases stay feasible.
            if include_mask & (1 << i) != 0 && i % 3 == 0 {
                raw.must_include.push(row.id.clone());
            } else if exclude_mask & (1 << i) != 0 && i % 2 == 1 {
                raw.must_exclude.push(row.id.clone());
            }
        }

        let expected = brute_force(&rows, &raw);
        match (solve(rows.clone(), &raw), expected) {
            (Ok(roster), Some(want)) => {
                prop_assert_eq!(ids(&roster), want);
            }
            (Err(OptimizationError::Infeasible(_)), None) => {}
            (got, want) => {
                prop_assert!(false, "solver returned {:?}, exhaustive search {:?}", got, want);
            }
        }
    }

    #[test]
    fn repeated_solves_are_identical(rows in small_pool(), budget_quarters in 0i32..160) {
        let raw = RawConstraints::new(&[("DEF", 1), ("MID", 1), ("FWD", 1)], budget_quarters as f64 / 4.0);
        let a = solve(rows.clone(), &raw).map(|r| serde_json::to_string(&r).unwrap());
        let b = solve(rows, &raw).map(|r| serde_json::to_string(&r).unwrap());
        prop_assert_eq!(a, b);
    }
}
