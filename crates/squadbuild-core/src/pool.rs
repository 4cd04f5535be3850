// Candidate pool: the validated, immutable table of selectable players.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::DataIntegrityError;

/// One unvalidated row of the prediction table.
///
/// Field aliases accept the column names produced by the prediction
/// pipeline (`name`, `position`, `predicted_points`, `now_cost`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(alias = "name")]
    pub id: String,
    #[serde(alias = "position")]
    pub category: String,
    #[serde(alias = "predicted_points")]
    pub predicted_score: f64,
    #[serde(alias = "now_cost")]
    pub cost: f64,
}

impl RawCandidate {
    pub fn new(id: &str, category: &str, predicted_score: f64, cost: f64) -> Self {
        RawCandidate {
            id: id.to_string(),
            category: category.to_string(),
            predicted_score,
            cost,
        }
    }
}

/// A validated candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: String,
    pub category: Category,
    pub predicted_score: f64,
    pub cost: f64,
}

/// Validated view of the available candidates.
///
/// Candidates are stored in ascending id order regardless of input order, so
/// every index-based walk over the pool is deterministic.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    index: HashMap<String, usize>,
}

impl CandidatePool {
    /// Build a pool from raw rows. The whole table is rejected on the first
    /// malformed row; nothing is partially accepted.
    pub fn new<I>(rows: I) -> Result<Self, DataIntegrityError>
    where
        I: IntoIterator<Item = RawCandidate>,
    {
        let mut candidates = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (i, raw) in rows.into_iter().enumerate() {
            let candidate = validate_row(i + 1, raw)?;
            if !seen.insert(candidate.id.clone()) {
                return Err(DataIntegrityError::DuplicateId { id: candidate.id });
            }
            candidates.push(candidate);
        }

        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        let index = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        Ok(CandidatePool { candidates, index })
    }

    pub fn get(&self, id: &str) -> Option<&Candidate> {
        self.index.get(id).map(|&i| &self.candidates[i])
    }

    /// Position of `id` in the pool's id-ordered storage.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All candidates in ascending id order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Candidate> + '_ {
        self.candidates
            .iter()
            .filter(move |c| c.category == category)
    }

    pub fn count_in(&self, category: Category) -> usize {
        self.in_category(category).count()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// The `n` highest predicted scores in a category, ties broken by id.
    pub fn top_candidates(&self, category: Category, n: usize) -> Vec<&Candidate> {
        let mut in_cat: Vec<&Candidate> = self.in_category(category).collect();
        in_cat.sort_by(|a, b| {
            b.predicted_score
                .total_cmp(&a.predicted_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        in_cat.truncate(n);
        in_cat
    }
}

fn validate_row(row: usize, raw: RawCandidate) -> Result<Candidate, DataIntegrityError> {
    let id = raw.id.trim().to_string();
    if id.is_empty() {
        return Err(DataIntegrityError::EmptyId { row });
    }
    if !raw.predicted_score.is_finite() {
        return Err(DataIntegrityError::NonFiniteValue {
            id,
            field: "predicted_score",
        });
    }
    if !raw.cost.is_finite() {
        return Err(DataIntegrityError::NonFiniteValue { id, field: "cost" });
    }
    if raw.cost < 0.0 {
        return Err(DataIntegrityError::NegativeCost { id, cost: raw.cost });
    }
    let Some(category) = Category::from_str_pos(&raw.category) else {
        return Err(DataIntegrityError::UnknownCategory {
            id,
            category: raw.category,
        });
    };

    Ok(Candidate {
        id,
        category,
        predicted_score: raw.predicted_score,
        cost: raw.cost,
    })
}
