// Roster assembly: turns a raw selection into the ordered squad handed to
// callers.

use serde::Serialize;

use crate::category::Category;
use crate::optimizer::Selection;
use crate::pool::{Candidate, CandidatePool};

/// A selected player as presented to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub id: String,
    pub category: Category,
    pub predicted_score: f64,
    pub cost: f64,
}

impl From<&Candidate> for RosterEntry {
    fn from(c: &Candidate) -> Self {
        RosterEntry {
            id: c.id.clone(),
            category: c.category,
            predicted_score: c.predicted_score,
            cost: c.cost,
        }
    }
}

/// The selected players of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub players: Vec<RosterEntry>,
}

/// The final squad, grouped by category.
///
/// Groups follow `Category::sort_order()`; inside a group players are sorted
/// by predicted score (descending), ties by id. The ordering never depends on
/// the order in which the solver visited candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledRoster {
    pub groups: Vec<CategoryGroup>,
    pub total_predicted: f64,
    pub total_cost: f64,
}

impl AssembledRoster {
    /// Build the ordered roster for `selection`, looking each id up in the
    /// pool it was solved against.
    pub fn assemble(selection: &Selection, pool: &CandidatePool) -> Self {
        let mut entries: Vec<RosterEntry> = selection
            .ids
            .iter()
            .filter_map(|id| pool.get(id))
            .map(RosterEntry::from)
            .collect();

        entries.sort_by(|a, b| {
            a.category
                .sort_order()
                .cmp(&b.category.sort_order())
                .then_with(|| b.predicted_score.total_cmp(&a.predicted_score))
                .then_with(|| a.id.cmp(&b.id))
        });

        let total_predicted = entries.iter().map(|e| e.predicted_score).sum();
        let total_cost = entries.iter().map(|e| e.cost).sum();

        let mut groups: Vec<CategoryGroup> = Vec::new();
        for entry in entries {
            match groups.last_mut() {
                Some(group) if group.category == entry.category => group.players.push(entry),
                _ => groups.push(CategoryGroup {
                    category: entry.category,
                    players: vec![entry],
                }),
            }
        }

        AssembledRoster {
            groups,
            total_predicted,
            total_cost,
        }
    }

    /// All players in roster order.
    pub fn entries(&self) -> impl Iterator<Item = &RosterEntry> {
        self.groups.iter().flat_map(|g| g.players.iter())
    }

    pub fn group(&self, category: Category) -> Option<&CategoryGroup> {
        self.groups.iter().find(|g| g.category == category)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.players.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(id, predicted_score)` pairs in roster order.
    pub fn score_pairs(&self) -> Vec<(String, f64)> {
        self.entries()
            .map(|e| (e.id.clone(), e.predicted_score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::SolveStats;
    use crate::pool::RawCandidate;

    fn pool() -> CandidatePool {
        CandidatePool::new(vec![
            RawCandidate::new("Watkins", "FWD", 5.0, 90.0),
            RawCandidate::new("Saka", "MID", 6.0, 100.0),
            RawCandidate::new("Raya", "GKP", 4.0, 55.0),
            RawCandidate::new("Palmer", "MID", 6.0, 105.0),
            RawCandidate::new("Salah", "MID", 7.5, 130.0),
            RawCandidate::new("Gabriel", "DEF", 4.5, 60.0),
        ])
        .unwrap()
    }

    fn selection(ids: &[&str]) -> Selection {
        let mut ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        ids.sort();
        Selection {
            ids,
            total_score: 0.0,
            total_cost: 0.0,
            stats: SolveStats::default(),
        }
    }

    #[test]
    fn groups_follow_category_order_and_scores_descend() {
        let roster = AssembledRoster::assemble(
            &selection(&["Watkins", "Saka", "Raya", "Palmer", "Salah", "Gabriel"]),
            &pool(),
        );
        let cats: Vec<Category> = roster.groups.iter().map(|g| g.category).collect();
        assert_eq!(
            cats,
            vec![
                Category::Goalkeeper,
                Category::Defender,
                Category::Midfielder,
                Category::Forward
            ]
        );
        let mids: Vec<&str> = roster
            .group(Category::Midfielder)
            .unwrap()
            .players
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        // Palmer and Saka tie on score: id order decides.
        assert_eq!(mids, vec!["Salah", "Palmer", "Saka"]);
        assert_eq!(roster.len(), 6);
    }

    #[test]
    fn totals_are_summed() {
        let roster = AssembledRoster::assemble(&selection(&["Raya", "Salah"]), &pool());
        assert!((roster.total_predicted - 11.5).abs() < 1e-9);
        assert!((roster.total_cost - 185.0).abs() < 1e-9);
        assert!(roster.group(Category::Forward).is_none());
    }

    #[test]
    fn score_pairs_in_roster_order() {
        let roster = AssembledRoster::assemble(&selection(&["Watkins", "Raya"]), &pool());
        assert_eq!(
            roster.score_pairs(),
            vec![("Raya".to_string(), 4.0), ("Watkins".to_string(), 5.0)]
        );
    }

    #[test]
    fn empty_selection_gives_empty_roster() {
        let roster = AssembledRoster::assemble(&selection(&[]), &pool());
        assert!(roster.is_empty());
        assert_eq!(roster.total_predicted, 0.0);
    }
}
