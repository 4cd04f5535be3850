// Selection rules: per-category quotas, budget cap and forced membership.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{ForcedList, InvalidConstraintError};
use crate::pool::CandidatePool;

/// Unvalidated selection rules as supplied by the caller.
///
/// Quota keys are category names ("GKP", "DEF", ...); categories that are
/// not mentioned get a quota of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConstraints {
    pub quotas: BTreeMap<String, i64>,
    pub budget: f64,
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub must_exclude: Vec<String>,
}

impl RawConstraints {
    pub fn new(quotas: &[(&str, i64)], budget: f64) -> Self {
        RawConstraints {
            quotas: quotas.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            budget,
            must_include: Vec::new(),
            must_exclude: Vec::new(),
        }
    }

    pub fn include<S: Into<String>>(mut self, id: S) -> Self {
        self.must_include.push(id.into());
        self
    }

    pub fn exclude<S: Into<String>>(mut self, id: S) -> Self {
        self.must_exclude.push(id.into());
        self
    }
}

/// Validated selection rules.
///
/// Structural checks only: whether the rules can be met by the pool is
/// decided by the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    quotas: BTreeMap<Category, usize>,
    budget: f64,
    must_include: BTreeSet<String>,
    must_exclude: BTreeSet<String>,
}

impl ConstraintSpec {
    pub fn new(raw: &RawConstraints, pool: &CandidatePool) -> Result<Self, InvalidConstraintError> {
        let mut quotas: BTreeMap<Category, usize> =
            Category::ALL.iter().map(|&c| (c, 0)).collect();
        let mut seen = BTreeSet::new();

        for (name, &count) in &raw.quotas {
            let Some(category) = Category::from_str_pos(name) else {
                return Err(InvalidConstraintError::UnknownCategory {
                    category: name.clone(),
                });
            };
            if !seen.insert(category) {
                return Err(InvalidConstraintError::DuplicateQuota {
                    category: name.clone(),
                });
            }
            if count < 0 {
                return Err(InvalidConstraintError::NegativeQuota {
                    category: name.clone(),
                    count,
                });
            }
            quotas.insert(category, usize::try_from(count).unwrap_or(usize::MAX));
        }

        if !raw.budget.is_finite() || raw.budget < 0.0 {
            return Err(InvalidConstraintError::InvalidBudget { budget: raw.budget });
        }

        let must_include = resolve_ids(&raw.must_include, ForcedList::MustInclude, pool)?;
        let must_exclude = resolve_ids(&raw.must_exclude, ForcedList::MustExclude, pool)?;

        if let Some(id) = must_include.intersection(&must_exclude).next() {
            return Err(InvalidConstraintError::IncludeExcludeOverlap { id: id.clone() });
        }

        Ok(ConstraintSpec {
            quotas,
            budget: raw.budget,
            must_include,
            must_exclude,
        })
    }

    pub fn quota(&self, category: Category) -> usize {
        self.quotas.get(&category).copied().unwrap_or(0)
    }

    /// Quotas for every category, in stable category order.
    pub fn quotas(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.quotas.iter().map(|(&c, &n)| (c, n))
    }

    /// Required roster size: the sum of all quotas, saturating at
    /// `usize::MAX`. Quotas that large can never be filled and are reported
    /// as a category shortage by the optimizer.
    pub fn roster_size(&self) -> usize {
        self.quotas
            .values()
            .fold(0usize, |total, &n| total.saturating_add(n))
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn must_include(&self) -> &BTreeSet<String> {
        &self.must_include
    }

    pub fn must_exclude(&self) -> &BTreeSet<String> {
        &self.must_exclude
    }

    pub fn is_included(&self, id: &str) -> bool {
        self.must_include.contains(id)
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        self.must_exclude.contains(id)
    }
}

fn resolve_ids(
    ids: &[String],
    list: ForcedList,
    pool: &CandidatePool,
) -> Result<BTreeSet<String>, InvalidConstraintError> {
    let mut out = BTreeSet::new();
    for raw_id in ids {
        let id = raw_id.trim();
        if !pool.contains(id) {
            return Err(InvalidConstraintError::UnknownCandidate {
                id: id.to_string(),
                list,
            });
        }
        out.insert(id.to_string());
    }
    Ok(out)
}
