//! Edge vote index built from the authoritative feed.
//!
//! Every authoritative trip whose route names a train ("Os 7806") votes for
//! that label on each of its edges, once per weekday it runs. A target trip
//! later collects the votes stored under its own edges.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::info;

use super::edges::{EdgeKey, EdgeTrip, FeedEdges};
use crate::domain::TrainLabel;
use crate::feed::Feed;

/// Vote counts per train label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTally(BTreeMap<TrainLabel, u32>);

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: &TrainLabel, votes: u32) {
        if votes == 0 {
            return;
        }
        *self.0.entry(label.clone()).or_default() += votes;
    }

    /// Add every count of `other` to this tally.
    pub fn merge(&mut self, other: &VoteTally) {
        for (label, votes) in &other.0 {
            self.add(label, *votes);
        }
    }

    pub fn get(&self, label: &TrainLabel) -> u32 {
        self.0.get(label).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Labels by votes, most first; equal counts in label order.
    pub fn ranked(&self) -> Vec<(TrainLabel, u32)> {
        let mut ranked: Vec<(TrainLabel, u32)> =
            self.0.iter().map(|(l, v)| (l.clone(), *v)).collect();
        // sort is stable and the map iterates in label order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

impl FromIterator<(TrainLabel, u32)> for VoteTally {
    fn from_iter<I: IntoIterator<Item = (TrainLabel, u32)>>(iter: I) -> Self {
        let mut tally = VoteTally::new();
        for (label, votes) in iter {
            tally.add(&label, votes);
        }
        tally
    }
}

/// Counters from building an index out of a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub routes_with_label: usize,
    pub trips_considered: usize,
    pub edges_considered: usize,
    pub edges_indexed: usize,
    pub index_keys: usize,
}

/// Read-only map from (edge, weekday) to label votes.
///
/// Built once before any lookups; shared by reference afterwards.
#[derive(Debug, Default)]
pub struct EdgeVoteIndex {
    votes: HashMap<EdgeKey, VoteTally>,
}

impl EdgeVoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from labelled trips.
    pub fn build<'a>(trips: impl IntoIterator<Item = (&'a TrainLabel, &'a EdgeTrip)>) -> Self {
        let mut index = Self::new();
        for (label, trip) in trips {
            index.add_trip(label, trip);
        }
        index
    }

    /// Add one vote per (edge, weekday) of `trip`. Returns the votes added.
    pub fn add_trip(&mut self, label: &TrainLabel, trip: &EdgeTrip) -> usize {
        let mut added = 0;
        for key in trip.keys() {
            self.votes.entry(key).or_default().add(label, 1);
            added += 1;
        }
        added
    }

    /// Build from a GTFS feed, labelling each trip by its route short name.
    ///
    /// Trips on routes whose short name is not a train label are ignored.
    pub fn from_feed(feed: &Feed) -> (Self, IndexStats) {
        let labels: HashMap<&str, TrainLabel> = feed
            .routes
            .iter()
            .filter_map(|r| Some((r.route_id.as_str(), TrainLabel::parse(&r.route_short_name)?)))
            .collect();

        let edges = FeedEdges::new(feed);
        let mut index = Self::new();
        let mut stats = IndexStats {
            routes_with_label: labels.len(),
            ..IndexStats::default()
        };

        for trip in &feed.trips {
            let Some(label) = labels.get(trip.route_id.as_str()) else {
                continue;
            };
            stats.trips_considered += 1;
            stats.edges_considered += edges.raw_edges(&trip.trip_id).len();
            stats.edges_indexed += index.add_trip(label, &edges.edge_trip(trip));
        }
        stats.index_keys = index.len();

        info!(
            routes = stats.routes_with_label,
            trips = stats.trips_considered,
            edges = stats.edges_indexed,
            keys = stats.index_keys,
            "Built edge vote index"
        );
        (index, stats)
    }

    pub fn get(&self, key: &EdgeKey) -> Option<&VoteTally> {
        self.votes.get(key)
    }

    /// Combined votes over every (edge, weekday) of `trip`.
    pub fn votes_for(&self, trip: &EdgeTrip) -> VoteTally {
        let mut tally = VoteTally::new();
        for key in trip.keys() {
            if let Some(votes) = self.votes.get(&key) {
                tally.merge(votes);
            }
        }
        tally
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Total votes stored.
    pub fn total_votes(&self) -> u64 {
        self.votes.values().map(|t| u64::from(t.total())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::NamedEdge;
    use crate::domain::{DayTime, WeekdaySet};
    use chrono::Weekday;

    fn label(s: &str) -> TrainLabel {
        TrainLabel::parse(s).unwrap()
    }

    fn t(h: u32, m: u32) -> DayTime {
        DayTime::from_hms(h, m, 0).unwrap()
    }

    fn trip(days: WeekdaySet, edges: &[(&str, &str, DayTime)]) -> EdgeTrip {
        EdgeTrip::new(
            days,
            edges
                .iter()
                .map(|(o, d, at)| NamedEdge::new(*o, *d, *at))
                .collect(),
        )
    }

    #[test]
    fn tally_ranking_breaks_ties_by_label() {
        let tally: VoteTally = [(label("Os 2"), 3), (label("Os 1"), 3), (label("R 5"), 7)]
            .into_iter()
            .collect();
        let ranked = tally.ranked();
        assert_eq!(ranked[0], (label("R 5"), 7));
        assert_eq!(ranked[1], (label("Os 1"), 3));
        assert_eq!(ranked[2], (label("Os 2"), 3));
        assert_eq!(tally.total(), 13);
        assert_eq!(tally.len(), 3);
    }

    #[test]
    fn zero_votes_are_not_recorded() {
        let mut tally = VoteTally::new();
        tally.add(&label("Os 1"), 0);
        assert!(tally.is_empty());
    }

    #[test]
    fn one_vote_per_edge_and_weekday() {
        let os = label("Os 7806");
        let authoritative = trip(
            WeekdaySet::WORKDAYS,
            &[("a", "b", t(8, 0)), ("b", "c", t(8, 10))],
        );
        let index = EdgeVoteIndex::build([(&os, &authoritative)]);
        assert_eq!(index.len(), 10);
        assert_eq!(index.total_votes(), 10);

        let key = EdgeKey {
            origin: "a".into(),
            destination: "b".into(),
            departure: t(8, 0),
            weekday: Weekday::Tue,
        };
        assert_eq!(index.get(&key).map(|v| v.get(&os)), Some(1));
    }

    #[test]
    fn votes_for_collects_matching_keys_only() {
        let os = label("Os 7806");
        let r = label("R 1");
        let a = trip(WeekdaySet::WORKDAYS, &[("a", "b", t(8, 0)), ("b", "c", t(8, 10))]);
        let b = trip(WeekdaySet::ALL, &[("a", "b", t(8, 0))]);
        let index = EdgeVoteIndex::build([(&os, &a), (&r, &b)]);

        // Saturday only: the workday trip contributes nothing
        let target = trip(
            WeekdaySet::single(Weekday::Sat),
            &[("a", "b", t(8, 0)), ("b", "c", t(8, 10))],
        );
        let votes = index.votes_for(&target);
        assert_eq!(votes.get(&os), 0);
        assert_eq!(votes.get(&r), 1);

        // wrong minute never matches
        let late = trip(WeekdaySet::ALL, &[("a", "b", t(8, 1))]);
        assert!(index.votes_for(&late).is_empty());
    }
}
