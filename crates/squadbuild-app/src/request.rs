// Squad requests: the per-call overrides layered on top of configured
// defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::config::SquadConfig;
use squadbuild_core::{Category, RawConstraints};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read request {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A custom squad request. Anything left out falls back to configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadRequest {
    #[serde(default)]
    pub num_goalkeepers: Option<i64>,
    #[serde(default)]
    pub num_defenders: Option<i64>,
    #[serde(default)]
    pub num_midfielders: Option<i64>,
    #[serde(default)]
    pub num_forwards: Option<i64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub must_exclude: Vec<String>,
}

/// Requests arrive either bare or wrapped as `{"input": {...}}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { input: SquadRequest },
    Bare(SquadRequest),
}

impl SquadRequest {
    pub fn from_json(text: &str) -> Result<Self, RequestError> {
        let request = match serde_json::from_str::<Envelope>(text) {
            Ok(Envelope::Wrapped { input }) => input,
            Ok(Envelope::Bare(request)) => request,
            // Re-parse bare so the caller gets serde's positioned message.
            Err(_) => serde_json::from_str::<SquadRequest>(text)?,
        };
        Ok(request)
    }

    pub fn load(path: &Path) -> Result<Self, RequestError> {
        let text = std::fs::read_to_string(path).map_err(|e| RequestError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&text)
    }

    fn count_for(&self, category: Category) -> Option<i64> {
        match category {
            Category::Goalkeeper => self.num_goalkeepers,
            Category::Defender => self.num_defenders,
            Category::Midfielder => self.num_midfielders,
            Category::Forward => self.num_forwards,
        }
    }

    /// Merge with configured defaults into constraints for the core.
    ///
    /// A count given in the request replaces the configured quota for that
    /// category; configured quota keys are re-keyed to canonical names so an
    /// alias like `GK` and a request count never collide.
    pub fn into_constraints(self, defaults: &SquadConfig) -> RawConstraints {
        let mut raw = RawConstraints {
            quotas: Default::default(),
            budget: self.budget.unwrap_or(defaults.budget),
            must_include: Vec::new(),
            must_exclude: Vec::new(),
        };

        for category in Category::ALL {
            let count = self
                .count_for(category)
                .or_else(|| defaults.quota(category));
            if let Some(count) = count {
                raw.quotas.insert(category.display_str().to_string(), count);
            }
        }

        // Unknown keys are left in so the core reports them.
        for (key, &count) in &defaults.quotas {
            if Category::from_str_pos(key).is_none() {
                raw.quotas.insert(key.clone(), count);
            }
        }

        raw.must_include = self.must_include;
        raw.must_exclude = self.must_exclude;
        raw
    }
}
