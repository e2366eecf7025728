//! Feed-level reconciliation and its audit report.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use super::edges::{EdgeTrip, FeedEdges};
use super::index::{EdgeVoteIndex, IndexStats};
use super::resolve::{BulkOutcome, BulkResolution, resolve_votes};
use crate::config::VoteConfig;
use crate::domain::TrainLabel;
use crate::feed::{Feed, TripRow};

/// Votes one label received, for audit output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateVotes {
    pub label: TrainLabel,
    pub votes: u32,
}

/// One trip that was not assigned a label, with the evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub status: &'static str,
    pub reason: &'static str,
    pub top_label: Option<TrainLabel>,
    pub top_votes: u32,
    pub second_votes: u32,
    pub total_votes: u32,
    /// Rounded to 4 decimal places.
    pub ratio: f64,
    pub candidates: Vec<CandidateVotes>,
}

impl AuditRow {
    fn new(trip: &TripRow, resolution: &BulkResolution) -> Self {
        Self {
            trip_id: trip.trip_id.clone(),
            route_id: trip.route_id.clone(),
            service_id: trip.service_id.clone(),
            status: resolution.status(),
            reason: resolution.reason(),
            top_label: resolution.top_label().cloned(),
            top_votes: resolution.top_votes,
            second_votes: resolution.second_votes,
            total_votes: resolution.total_votes,
            ratio: round4(resolution.ratio),
            candidates: resolution
                .candidates
                .iter()
                .map(|(label, votes)| CandidateVotes {
                    label: label.clone(),
                    votes: *votes,
                })
                .collect(),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// A target trip and the label it was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedTrip {
    pub trip_id: String,
    pub label: TrainLabel,
}

/// New `trip_short_name` for one rail trip; empty clears it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortNameAssignment {
    pub trip_id: String,
    pub trip_short_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchStats {
    pub rail_routes: usize,
    pub rail_trips: usize,
    pub rail_edges: usize,
    pub matched_trips: usize,
    pub ambiguous_trips: usize,
    pub unmatched_trips: usize,
}

/// Result of reconciling a whole target feed. Trips appear in feed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub matched: Vec<MatchedTrip>,
    pub ambiguous: Vec<AuditRow>,
    pub unmatched: Vec<AuditRow>,
    pub stats: MatchStats,
    #[serde(skip)]
    rail_trip_ids: Vec<String>,
}

impl ReconciliationReport {
    pub fn label_for(&self, trip_id: &str) -> Option<&TrainLabel> {
        self.matched
            .iter()
            .find(|m| m.trip_id == trip_id)
            .map(|m| &m.label)
    }

    /// `trip_short_name` for every rail trip: the matched label, or empty
    /// to clear whatever the target feed had.
    pub fn short_name_assignments(&self) -> Vec<ShortNameAssignment> {
        let labels: HashMap<&str, &TrainLabel> = self
            .matched
            .iter()
            .map(|m| (m.trip_id.as_str(), &m.label))
            .collect();
        self.rail_trip_ids
            .iter()
            .map(|trip_id| ShortNameAssignment {
                trip_id: trip_id.clone(),
                trip_short_name: labels
                    .get(trip_id.as_str())
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// Assigns authoritative train labels to the rail trips of another feed.
#[derive(Debug)]
pub struct Reconciler {
    index: EdgeVoteIndex,
    config: VoteConfig,
}

impl Reconciler {
    pub fn new(index: EdgeVoteIndex) -> Self {
        Self::with_config(index, VoteConfig::default())
    }

    pub fn with_config(index: EdgeVoteIndex, config: VoteConfig) -> Self {
        Self { index, config }
    }

    /// Index `authoritative` and build a reconciler over it.
    pub fn from_feed(authoritative: &Feed) -> (Self, IndexStats) {
        let (index, stats) = EdgeVoteIndex::from_feed(authoritative);
        (Self::new(index), stats)
    }

    pub fn index(&self) -> &EdgeVoteIndex {
        &self.index
    }

    pub fn config(&self) -> &VoteConfig {
        &self.config
    }

    /// Resolve one trip.
    pub fn resolve(&self, trip: &EdgeTrip) -> BulkResolution {
        resolve_votes(&self.index.votes_for(trip), &self.config)
    }

    /// Resolve every rail trip (`route_type` 2) of `target`.
    pub fn reconcile_feed(&self, target: &Feed) -> ReconciliationReport {
        let rail_routes: HashSet<&str> = target
            .routes
            .iter()
            .filter(|r| r.is_rail())
            .map(|r| r.route_id.as_str())
            .collect();
        let edges = FeedEdges::new(target);
        let mut report = ReconciliationReport {
            stats: MatchStats {
                rail_routes: rail_routes.len(),
                ..MatchStats::default()
            },
            ..ReconciliationReport::default()
        };

        for trip in target
            .trips
            .iter()
            .filter(|t| rail_routes.contains(t.route_id.as_str()))
        {
            report.rail_trip_ids.push(trip.trip_id.clone());
            report.stats.rail_edges += edges.raw_edges(&trip.trip_id).len();

            let resolution = self.resolve(&edges.edge_trip(trip));
            debug!(
                trip_id = %trip.trip_id,
                status = resolution.status(),
                reason = resolution.reason(),
                votes = resolution.total_votes,
                "Resolved trip"
            );
            match &resolution.outcome {
                BulkOutcome::Matched { label } => report.matched.push(MatchedTrip {
                    trip_id: trip.trip_id.clone(),
                    label: label.clone(),
                }),
                BulkOutcome::Ambiguous { .. } => {
                    report.ambiguous.push(AuditRow::new(trip, &resolution))
                }
                BulkOutcome::Unmatched => report.unmatched.push(AuditRow::new(trip, &resolution)),
            }
        }

        report.stats.rail_trips = report.rail_trip_ids.len();
        report.stats.matched_trips = report.matched.len();
        report.stats.ambiguous_trips = report.ambiguous.len();
        report.stats.unmatched_trips = report.unmatched.len();

        info!(
            rail_trips = report.stats.rail_trips,
            matched = report.stats.matched_trips,
            ambiguous = report.stats.ambiguous_trips,
            unmatched = report.stats.unmatched_trips,
            "Reconciled target feed"
        );
        report
    }
}
