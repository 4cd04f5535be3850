// Request handling: merges a request with configuration, builds the pool,
// solves and shapes the response.

use tracing::{info, warn};

use crate::config::Config;
use crate::report::SquadResponse;
use crate::request::SquadRequest;
use squadbuild_core::{
    optimize, AssembledRoster, CandidatePool, ConstraintSpec, OptimizationError, RawCandidate,
};

/// Command-line values that win over both the request file and config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub budget: Option<f64>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub top: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, request: &mut SquadRequest) {
        if let Some(budget) = self.budget {
            request.budget = Some(budget);
        }
        request.must_include.extend(self.include.iter().cloned());
        request.must_exclude.extend(self.exclude.iter().cloned());
    }
}

/// Solve one request against the given prediction rows.
pub fn handle_request(
    config: &Config,
    rows: Vec<RawCandidate>,
    mut request: SquadRequest,
    overrides: &Overrides,
) -> Result<SquadResponse, OptimizationError> {
    overrides.apply(&mut request);

    let pool = CandidatePool::new(rows)?;
    info!("candidate pool ready: {} players", pool.len());

    let raw = request.into_constraints(&config.squad);
    let spec = ConstraintSpec::new(&raw, &pool)?;
    info!(
        "solving for {} places, budget {}, {} forced in, {} forced out",
        spec.roster_size(),
        spec.budget(),
        spec.must_include().len(),
        spec.must_exclude().len()
    );

    let selection = match optimize(&pool, &spec) {
        Ok(selection) => selection,
        Err(e) => {
            warn!("no feasible squad: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "selected {} players: predicted {:.2}, cost {:.1} ({} nodes explored)",
        selection.len(),
        selection.total_score,
        selection.total_cost,
        selection.stats.nodes
    );

    let roster = AssembledRoster::assemble(&selection, &pool);
    let top = overrides.top.or(config.output.top_per_category);
    Ok(SquadResponse::build(&pool, roster, |cat| {
        top.unwrap_or_else(|| spec.quota(cat))
    }))
}
