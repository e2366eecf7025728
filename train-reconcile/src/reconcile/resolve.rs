//! Turning a trip's combined votes into a decision.

use serde::Serialize;

use super::edges::EdgeTrip;
use super::index::{EdgeVoteIndex, VoteTally};
use crate::config::VoteConfig;
use crate::domain::TrainLabel;

/// Why a trip with votes was not assigned a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityReason {
    /// The leading label has fewer votes than required
    LowSupport,
    /// Another label has as many votes as the leader
    Tie,
    /// The leader's share of all votes is too small
    LowRatio,
}

impl AmbiguityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbiguityReason::LowSupport => "low_support",
            AmbiguityReason::Tie => "tie",
            AmbiguityReason::LowRatio => "low_ratio",
        }
    }
}

/// Decision for one target trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    Matched { label: TrainLabel },
    Ambiguous { reason: AmbiguityReason, top_label: TrainLabel },
    /// No authoritative edge voted at all
    Unmatched,
}

/// A decision plus the vote counts behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkResolution {
    pub outcome: BulkOutcome,
    pub top_votes: u32,
    pub second_votes: u32,
    pub total_votes: u32,
    /// `top_votes / total_votes`, 0 without votes
    pub ratio: f64,
    /// Every label that received votes, most first.
    pub candidates: Vec<(TrainLabel, u32)>,
}

impl BulkResolution {
    pub fn status(&self) -> &'static str {
        match self.outcome {
            BulkOutcome::Matched { .. } => "matched",
            BulkOutcome::Ambiguous { .. } => "ambiguous",
            BulkOutcome::Unmatched => "unmatched",
        }
    }

    pub fn reason(&self) -> &'static str {
        match &self.outcome {
            BulkOutcome::Matched { .. } => "matched",
            BulkOutcome::Ambiguous { reason, .. } => reason.as_str(),
            BulkOutcome::Unmatched => "no_candidates",
        }
    }

    /// The assigned label, only when matched.
    pub fn label(&self) -> Option<&TrainLabel> {
        match &self.outcome {
            BulkOutcome::Matched { label } => Some(label),
            _ => None,
        }
    }

    /// The label with the most votes, whatever the outcome.
    pub fn top_label(&self) -> Option<&TrainLabel> {
        self.candidates.first().map(|(label, _)| label)
    }
}

/// Apply the vote thresholds to a tally.
///
/// ```
/// use train_reconcile::config::VoteConfig;
/// use train_reconcile::domain::TrainLabel;
/// use train_reconcile::reconcile::{VoteTally, resolve_votes};
///
/// let a = TrainLabel::parse("Os 1").unwrap();
/// let b = TrainLabel::parse("Os 2").unwrap();
/// let votes: VoteTally = [(a.clone(), 3), (b, 2)].into_iter().collect();
///
/// let resolution = resolve_votes(&votes, &VoteConfig::default());
/// assert_eq!(resolution.status(), "matched");
/// assert_eq!(resolution.label(), Some(&a));
/// ```
pub fn resolve_votes(votes: &VoteTally, config: &VoteConfig) -> BulkResolution {
    let candidates = votes.ranked();
    let total_votes = votes.total();

    let Some((top_label, top_votes)) = candidates.first().cloned() else {
        return BulkResolution {
            outcome: BulkOutcome::Unmatched,
            top_votes: 0,
            second_votes: 0,
            total_votes: 0,
            ratio: 0.0,
            candidates,
        };
    };
    let second_votes = candidates.get(1).map(|(_, v)| *v).unwrap_or(0);
    let ratio = f64::from(top_votes) / f64::from(total_votes);

    let ambiguity = if top_votes < config.min_support {
        Some(AmbiguityReason::LowSupport)
    } else if second_votes >= top_votes {
        Some(AmbiguityReason::Tie)
    } else if ratio < config.min_ratio {
        Some(AmbiguityReason::LowRatio)
    } else {
        None
    };

    let outcome = match ambiguity {
        Some(reason) => BulkOutcome::Ambiguous { reason, top_label },
        None => BulkOutcome::Matched { label: top_label },
    };

    BulkResolution {
        outcome,
        top_votes,
        second_votes,
        total_votes,
        ratio,
        candidates,
    }
}

/// Resolve a target trip against the index with default thresholds.
pub fn resolve_bulk(trip: &EdgeTrip, index: &EdgeVoteIndex) -> BulkResolution {
    resolve_votes(&index.votes_for(trip), &VoteConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(votes: &[(&str, u32)]) -> VoteTally {
        votes
            .iter()
            .map(|(l, v)| (TrainLabel::parse(l).unwrap(), *v))
            .collect()
    }

    fn resolve(votes: &[(&str, u32)]) -> BulkResolution {
        resolve_votes(&tally(votes), &VoteConfig::default())
    }

    #[test]
    fn clear_winner_is_matched() {
        let r = resolve(&[("Os 1", 5), ("Os 2", 2)]);
        assert_eq!(r.status(), "matched");
        assert_eq!(r.reason(), "matched");
        assert_eq!(r.label().map(ToString::to_string), Some("Os 1".to_string()));
        assert_eq!((r.top_votes, r.second_votes, r.total_votes), (5, 2, 7));
        assert!((r.ratio - 5.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn single_vote_is_low_support() {
        let r = resolve(&[("Os 1", 1)]);
        assert_eq!(r.status(), "ambiguous");
        assert_eq!(r.reason(), "low_support");
        assert!(r.label().is_none());
        assert_eq!(r.top_label().map(ToString::to_string), Some("Os 1".to_string()));
    }

    #[test]
    fn equal_leaders_tie() {
        let r = resolve(&[("Os 1", 2), ("Os 2", 2)]);
        assert_eq!(
            r.outcome,
            BulkOutcome::Ambiguous {
                reason: AmbiguityReason::Tie,
                top_label: TrainLabel::parse("Os 1").unwrap(),
            }
        );
    }

    #[test]
    fn ratio_boundary_is_inclusive() {
        let r = resolve(&[("Os 1", 3), ("Os 2", 2)]);
        assert_eq!(r.status(), "matched");
        assert!((r.ratio - 0.6).abs() < 1e-9);
    }

    #[test]
    fn spread_votes_are_low_ratio() {
        let r = resolve(&[("Os 1", 4), ("Os 2", 3), ("Os 3", 3)]);
        assert_eq!(r.reason(), "low_ratio");
        assert_eq!(r.candidates.len(), 3);
    }

    #[test]
    fn no_votes_is_unmatched() {
        let r = resolve(&[]);
        assert_eq!(r.outcome, BulkOutcome::Unmatched);
        assert_eq!(r.status(), "unmatched");
        assert_eq!(r.reason(), "no_candidates");
        assert_eq!(r.ratio, 0.0);
        assert!(r.top_label().is_none());
    }

    #[test]
    fn stricter_config() {
        let config = VoteConfig::new(6, 0.60);
        let r = resolve_votes(&tally(&[("Os 1", 5), ("Os 2", 2)]), &config);
        assert_eq!(r.reason(), "low_support");
    }
}
