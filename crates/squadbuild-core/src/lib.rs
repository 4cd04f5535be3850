// Squad selection engine: pick a fixed-size roster from a candidate pool
// that maximises predicted score under a budget cap and per-category quotas.
//
// Every call is a pure function of its inputs; nothing is shared between
// solves, so concurrent callers need no locking.

pub mod category;
pub mod constraints;
pub mod error;
pub mod optimizer;
pub mod pool;
pub mod roster;

pub use category::Category;
pub use constraints::{ConstraintSpec, RawConstraints};
pub use error::{
    DataIntegrityError, ErrorReport, ForcedConflict, InfeasibleError, InfeasibleReason,
    InvalidConstraintError, OptimizationError,
};
pub use optimizer::{optimize, Selection, SolveStats};
pub use pool::{Candidate, CandidatePool, RawCandidate};
pub use roster::{AssembledRoster, CategoryGroup, RosterEntry};

/// Validate the inputs, solve, and assemble the ordered roster.
///
/// Errors surface in pipeline order: pool integrity, then constraint
/// validity, then feasibility.
pub fn solve<I>(candidates: I, constraints: &RawConstraints) -> Result<AssembledRoster, OptimizationError>
where
    I: IntoIterator<Item = RawCandidate>,
{
    let pool = CandidatePool::new(candidates)?;
    solve_pool(&pool, constraints)
}

/// Like [`solve`], for callers that already hold a validated pool and want
/// to run several constraint sets against it.
pub fn solve_pool(
    pool: &CandidatePool,
    constraints: &RawConstraints,
) -> Result<AssembledRoster, OptimizationError> {
    let spec = ConstraintSpec::new(constraints, pool)?;
    let selection = optimize(pool, &spec)?;
    Ok(AssembledRoster::assemble(&selection, pool))
}
