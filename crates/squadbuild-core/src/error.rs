// Error taxonomy for squad selection.
//
// Three families, all deterministic functions of the input:
// - DataIntegrityError: the candidate table itself is malformed.
// - InvalidConstraintError: the selection rules are malformed.
// - InfeasibleError: well-formed inputs with no satisfying selection.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::category::Category;

// ---------------------------------------------------------------------------
// Candidate pool errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataIntegrityError {
    #[error("duplicate candidate id `{id}`")]
    DuplicateId { id: String },

    #[error("candidate `{id}` has negative cost {cost}")]
    NegativeCost { id: String, cost: f64 },

    #[error("candidate `{id}` has unknown category `{category}`")]
    UnknownCategory { id: String, category: String },

    #[error("candidate `{id}` has a non-finite {field}")]
    NonFiniteValue { id: String, field: &'static str },

    #[error("row {row} has an empty id")]
    EmptyId { row: usize },
}

impl DataIntegrityError {
    pub fn code(&self) -> &'static str {
        match self {
            DataIntegrityError::DuplicateId { .. } => "duplicate_id",
            DataIntegrityError::NegativeCost { .. } => "negative_cost",
            DataIntegrityError::UnknownCategory { .. } => "unknown_category",
            DataIntegrityError::NonFiniteValue { .. } => "non_finite_value",
            DataIntegrityError::EmptyId { .. } => "empty_id",
        }
    }

    /// The offending candidate id, if the row had one.
    pub fn subject(&self) -> Option<String> {
        match self {
            DataIntegrityError::DuplicateId { id }
            | DataIntegrityError::NegativeCost { id, .. }
            | DataIntegrityError::UnknownCategory { id, .. }
            | DataIntegrityError::NonFiniteValue { id, .. } => Some(id.clone()),
            DataIntegrityError::EmptyId { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Constraint errors
// ---------------------------------------------------------------------------

/// Which forced-membership list an id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedList {
    MustInclude,
    MustExclude,
}

impl fmt::Display for ForcedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForcedList::MustInclude => write!(f, "must_include"),
            ForcedList::MustExclude => write!(f, "must_exclude"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidConstraintError {
    #[error("{list} references unknown candidate `{id}`")]
    UnknownCandidate { id: String, list: ForcedList },

    #[error("candidate `{id}` is in both must_include and must_exclude")]
    IncludeExcludeOverlap { id: String },

    #[error("quota for `{category}` is negative ({count})")]
    NegativeQuota { category: String, count: i64 },

    #[error("quota references unknown category `{category}`")]
    UnknownCategory { category: String },

    #[error("quota for `{category}` is given more than once")]
    DuplicateQuota { category: String },

    #[error("budget must be a non-negative finite number, got {budget}")]
    InvalidBudget { budget: f64 },
}

impl InvalidConstraintError {
    pub fn code(&self) -> &'static str {
        match self {
            InvalidConstraintError::UnknownCandidate { .. } => "unknown_candidate",
            InvalidConstraintError::IncludeExcludeOverlap { .. } => "include_exclude_overlap",
            InvalidConstraintError::NegativeQuota { .. } => "negative_quota",
            InvalidConstraintError::UnknownCategory { .. } => "unknown_category",
            InvalidConstraintError::DuplicateQuota { .. } => "duplicate_quota",
            InvalidConstraintError::InvalidBudget { .. } => "invalid_budget",
        }
    }

    pub fn subject(&self) -> Option<String> {
        match self {
            InvalidConstraintError::UnknownCandidate { id, .. }
            | InvalidConstraintError::IncludeExcludeOverlap { id } => Some(id.clone()),
            InvalidConstraintError::NegativeQuota { category, .. }
            | InvalidConstraintError::UnknownCategory { category }
            | InvalidConstraintError::DuplicateQuota { category } => Some(category.clone()),
            InvalidConstraintError::InvalidBudget { .. } => Some("budget".into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Infeasibility
// ---------------------------------------------------------------------------

/// The constraint family that made a selection impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InfeasibleReason {
    Budget,
    CategoryShortage,
    ForcedSelection,
}

impl InfeasibleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InfeasibleReason::Budget => "budget",
            InfeasibleReason::CategoryShortage => "category_shortage",
            InfeasibleReason::ForcedSelection => "forced_selection",
        }
    }
}

/// Conflicts caused by must_include on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForcedConflict {
    #[error("{forced} candidates are forced in but the roster only has {roster_size} places")]
    TooManyForced { forced: usize, roster_size: usize },

    #[error("{forced} forced {category} candidates exceed the {category} quota of {quota}")]
    CategoryOverfilled {
        category: Category,
        forced: usize,
        quota: usize,
    },

    #[error("forced candidates cost {forced_cost}, over the budget of {budget}")]
    ForcedOverBudget { forced_cost: f64, budget: f64 },
}

impl ForcedConflict {
    pub fn code(&self) -> &'static str {
        match self {
            ForcedConflict::TooManyForced { .. } => "too_many_forced",
            ForcedConflict::CategoryOverfilled { .. } => "category_overfilled",
            ForcedConflict::ForcedOverBudget { .. } => "forced_over_budget",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InfeasibleError {
    #[error("forced selection conflict: {0}")]
    ForcedSelection(ForcedConflict),

    #[error("category {category} needs {required} candidates but only {available} are available")]
    CategoryShortage {
        category: Category,
        required: usize,
        available: usize,
    },

    #[error("cheapest squad meeting the quotas costs {minimum_cost}, over the budget of {budget}")]
    Budget { budget: f64, minimum_cost: f64 },
}

impl InfeasibleError {
    pub fn reason(&self) -> InfeasibleReason {
        match self {
            InfeasibleError::ForcedSelection(_) => InfeasibleReason::ForcedSelection,
            InfeasibleError::CategoryShortage { .. } => InfeasibleReason::CategoryShortage,
            InfeasibleError::Budget { .. } => InfeasibleReason::Budget,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            InfeasibleError::ForcedSelection(conflict) => conflict.code(),
            InfeasibleError::CategoryShortage { .. } => "category_shortage",
            InfeasibleError::Budget { .. } => "budget",
        }
    }

    pub fn subject(&self) -> Option<String> {
        match self {
            InfeasibleError::ForcedSelection(ForcedConflict::CategoryOverfilled {
                category, ..
            })
            | InfeasibleError::CategoryShortage { category, .. } => Some(category.to_string()),
            InfeasibleError::ForcedSelection(ForcedConflict::ForcedOverBudget { .. })
            | InfeasibleError::Budget { .. } => Some("budget".into()),
            InfeasibleError::ForcedSelection(ForcedConflict::TooManyForced { .. }) => {
                Some("must_include".into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizationError {
    #[error("data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("invalid constraint: {0}")]
    InvalidConstraint(#[from] InvalidConstraintError),

    #[error("infeasible: {0}")]
    Infeasible(#[from] InfeasibleError),
}

/// Machine-readable rendering of an [`OptimizationError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InfeasibleReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub detail: String,
}

impl OptimizationError {
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizationError::DataIntegrity(_) => "data_integrity",
            OptimizationError::InvalidConstraint(_) => "invalid_constraint",
            OptimizationError::Infeasible(_) => "infeasible",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            OptimizationError::DataIntegrity(e) => e.code(),
            OptimizationError::InvalidConstraint(e) => e.code(),
            OptimizationError::Infeasible(e) => e.code(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        let (reason, subject, detail) = match self {
            OptimizationError::DataIntegrity(e) => (None, e.subject(), e.to_string()),
            OptimizationError::InvalidConstraint(e) => (None, e.subject(), e.to_string()),
            OptimizationError::Infeasible(e) => (Some(e.reason()), e.subject(), e.to_string()),
        };
        ErrorReport {
            kind: self.kind(),
            code: self.code(),
            reason,
            subject,
            detail,
        }
    }
}
