//! Trips as sequences of named edges.
//!
//! Stop ids differ between feeds, so an edge is identified by the normalized
//! names of its two stops plus the departure minute.

use std::collections::HashMap;

use chrono::Weekday;

use crate::domain::{DayTime, WeekdaySet};
use crate::feed::{Feed, ServiceDays, TripEdge, TripRow};

/// Hop between two consecutive stops, by normalized stop name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedEdge {
    pub origin: String,
    pub destination: String,
    /// Departure from `origin`, minute precision.
    pub departure: DayTime,
}

impl NamedEdge {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, departure: DayTime) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure: departure.truncate_to_minute(),
        }
    }
}

/// Vote index key: one edge on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub origin: String,
    pub destination: String,
    pub departure: DayTime,
    pub weekday: Weekday,
}

/// A trip reduced to what voting looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeTrip {
    pub days: WeekdaySet,
    pub edges: Vec<NamedEdge>,
}

impl EdgeTrip {
    pub fn new(days: WeekdaySet, edges: Vec<NamedEdge>) -> Self {
        Self { days, edges }
    }

    /// Every (edge, weekday) combination of this trip.
    pub fn keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges.iter().flat_map(move |edge| {
            self.days.iter().map(move |weekday| EdgeKey {
                origin: edge.origin.clone(),
                destination: edge.destination.clone(),
                departure: edge.departure,
                weekday,
            })
        })
    }
}

/// Lookups needed to turn a feed's trips into [`EdgeTrip`]s.
#[derive(Debug)]
pub struct FeedEdges<'a> {
    names: HashMap<&'a str, String>,
    service_days: ServiceDays,
    edges: HashMap<&'a str, Vec<TripEdge<'a>>>,
}

impl<'a> FeedEdges<'a> {
    pub fn new(feed: &'a Feed) -> Self {
        Self {
            names: feed.normalized_stop_names(),
            service_days: feed.service_days(),
            edges: feed.trip_edges(),
        }
    }

    /// Raw consecutive-stop edges of a trip, including unusable ones.
    pub fn raw_edges(&self, trip_id: &str) -> &[TripEdge<'a>] {
        self.edges.get(trip_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The trip's named edges and weekdays.
    ///
    /// Edges with an unknown or unnamed stop, or without a departure time,
    /// are dropped.
    pub fn edge_trip(&self, trip: &TripRow) -> EdgeTrip {
        let edges = self
            .raw_edges(&trip.trip_id)
            .iter()
            .filter_map(|edge| self.named(edge))
            .collect();
        EdgeTrip::new(self.service_days.days(&trip.service_id), edges)
    }

    fn named(&self, edge: &TripEdge<'_>) -> Option<NamedEdge> {
        let origin = self.names.get(edge.from_stop).filter(|n| !n.is_empty())?;
        let destination = self.names.get(edge.to_stop).filter(|n| !n.is_empty())?;
        Some(NamedEdge::new(origin.as_str(), destination.as_str(), edge.departure?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{StopRow, StopTimeRow};

    fn t(h: u32, m: u32) -> DayTime {
        DayTime::from_hms(h, m, 0).unwrap()
    }

    #[test]
    fn keys_cross_edges_with_days() {
        let trip = EdgeTrip::new(
            [Weekday::Mon, Weekday::Sat].into_iter().collect(),
            vec![
                NamedEdge::new("a", "b", t(8, 0)),
                NamedEdge::new("b", "c", t(8, 10)),
            ],
        );
        let keys: Vec<_> = trip.keys().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[0].weekday, Weekday::Mon);
        assert_eq!(keys[1].weekday, Weekday::Sat);
        assert_eq!(keys[2].origin, "b");
    }

    #[test]
    fn edge_departure_is_minute_precision() {
        let edge = NamedEdge::new("a", "b", DayTime::from_hms(8, 0, 45).unwrap());
        assert_eq!(edge.departure, t(8, 0));
    }

    #[test]
    fn feed_edges_skip_unusable_hops() {
        let stop = |id: &str, name: &str| StopRow {
            stop_id: id.into(),
            stop_name: name.into(),
        };
        let st = |stop: &str, seq: u32, dep: Option<&str>| StopTimeRow {
            trip_id: "t".into(),
            stop_id: stop.into(),
            stop_sequence: seq,
            arrival_time: None,
            departure_time: dep.map(Into::into),
        };
        let feed = Feed {
            stops: vec![
                stop("1", "Praha hl. n."),
                stop("2", "Praha-Libeň"),
                stop("3", ""),
                stop("4", "Kolín"),
            ],
            trips: vec![TripRow {
                trip_id: "t".into(),
                route_id: "r".into(),
                service_id: "unknown".into(),
                ..TripRow::default()
            }],
            stop_times: vec![
                st("1", 1, Some("7:00:00")),
                st("2", 2, None),
                st("3", 3, Some("7:20:00")),
                st("4", 4, Some("7:40:00")),
                st("9", 5, Some("7:50:00")),
            ],
            ..Feed::default()
        };

        let edges = FeedEdges::new(&feed);
        assert_eq!(edges.raw_edges("t").len(), 4);
        assert!(edges.raw_edges("other").is_empty());

        let trip = edges.edge_trip(&feed.trips[0]);
        assert_eq!(trip.days, WeekdaySet::ALL);
        assert_eq!(
            trip.edges,
            vec![NamedEdge::new("praha hl.n.", "praha liben", t(7, 0))]
        );
    }
}
