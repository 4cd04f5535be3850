// JSON responses written to stdout.

use serde::Serialize;

use squadbuild_core::{AssembledRoster, CandidatePool, Category, ErrorReport, OptimizationError};

/// Successful squad response.
///
/// `topPlayers` and `optimizedTeam` are `[name, predicted]` pairs, the shape
/// the front-end renders directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadResponse {
    pub top_players: Vec<(String, f64)>,
    pub optimized_team: Vec<(String, f64)>,
    pub roster: AssembledRoster,
    pub total_predicted: f64,
    pub total_cost: f64,
}

impl SquadResponse {
    /// `top_counts` gives, per category, how many best-predicted candidates
    /// to list in `topPlayers`.
    pub fn build(
        pool: &CandidatePool,
        roster: AssembledRoster,
        top_counts: impl Fn(Category) -> usize,
    ) -> Self {
        let top_players = Category::ALL
            .iter()
            .flat_map(|&cat| pool.top_candidates(cat, top_counts(cat)))
            .map(|c| (c.id.clone(), c.predicted_score))
            .collect();

        SquadResponse {
            top_players,
            optimized_team: roster.score_pairs(),
            total_predicted: roster.total_predicted,
            total_cost: roster.total_cost,
            roster,
        }
    }
}

/// Failure response: `{"error": {...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorReport,
}

impl From<&OptimizationError> for ErrorResponse {
    fn from(err: &OptimizationError) -> Self {
        ErrorResponse {
            error: err.report(),
        }
    }
}

pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
