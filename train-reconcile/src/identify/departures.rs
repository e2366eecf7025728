//! Direct departures between two adjacent stops.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Weekday;
use serde::Serialize;
use tracing::debug;

use super::matcher::MatchTarget;
use crate::domain::{DayTime, TrainIdentity, WeekdaySet};
use crate::feed::Feed;

/// Day-of-week group a timetable is printed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayGroup {
    Workdays,
    Saturday,
    Sunday,
}

impl DayGroup {
    pub const ALL: [DayGroup; 3] = [DayGroup::Workdays, DayGroup::Saturday, DayGroup::Sunday];

    pub fn weekdays(&self) -> WeekdaySet {
        match self {
            DayGroup::Workdays => WeekdaySet::WORKDAYS,
            DayGroup::Saturday => WeekdaySet::single(Weekday::Sat),
            DayGroup::Sunday => WeekdaySet::single(Weekday::Sun),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayGroup::Workdays => "workdays",
            DayGroup::Saturday => "saturday",
            DayGroup::Sunday => "sunday",
        }
    }
}

/// One trip leaving `from_stop` with `to_stop` as its very next stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub trip_id: String,
    pub route_id: String,
    pub route_short_name: String,
    pub route_long_name: String,
    pub departure: DayTime,
    pub from_stop: String,
    pub to_stop: String,
    pub identity: TrainIdentity,
    /// Weekdays the trip's service runs on.
    pub days: WeekdaySet,
}

impl Departure {
    pub fn runs_in(&self, group: DayGroup) -> bool {
        self.days.intersects(group.weekdays())
    }

    /// Lookup key for matching this departure against live records.
    pub fn match_target(&self) -> MatchTarget {
        MatchTarget::new(
            self.departure,
            self.identity.clone(),
            self.route_short_name.clone(),
        )
    }
}

/// Departures from `from_stop` whose next stop is `to_stop`, ordered by
/// departure time, then trip id.
///
/// The identity comes from the trip short name; when that has no number the
/// route short name is used instead. Stop times without a departure are
/// left out.
pub fn departures_between(feed: &Feed, from_stop: &str, to_stop: &str) -> Vec<Departure> {
    let routes = feed.routes_by_id();
    let trips: HashMap<&str, _> = feed
        .trips
        .iter()
        .map(|t| (t.trip_id.as_str(), t))
        .collect();
    let service_days = feed.service_days();

    let mut departures: Vec<Departure> = feed
        .trip_edges()
        .into_values()
        .flatten()
        .filter(|e| e.from_stop == from_stop && e.to_stop == to_stop)
        .filter_map(|edge| {
            let departure = edge.departure?;
            let trip = trips.get(edge.trip_id).copied();
            let route = trip.and_then(|t| routes.get(t.route_id.as_str()).copied());
            let route_short_name = route.map(|r| r.route_short_name.clone()).unwrap_or_default();

            let mut identity = trip
                .map(|t| TrainIdentity::parse(&t.trip_short_name))
                .unwrap_or_default();
            if identity.number().is_none() {
                let fallback = TrainIdentity::parse(&route_short_name);
                if fallback.number().is_some() {
                    identity = fallback;
                }
            }

            Some(Departure {
                trip_id: edge.trip_id.to_string(),
                route_id: trip.map(|t| t.route_id.clone()).unwrap_or_default(),
                route_short_name,
                route_long_name: route.map(|r| r.route_long_name.clone()).unwrap_or_default(),
                departure,
                from_stop: from_stop.to_string(),
                to_stop: to_stop.to_string(),
                identity,
                days: trip
                    .map(|t| service_days.days(&t.service_id))
                    .unwrap_or(WeekdaySet::ALL),
            })
        })
        .collect();

    departures.sort_by(|a, b| {
        a.departure
            .cmp(&b.departure)
            .then_with(|| a.trip_id.cmp(&b.trip_id))
    });

    debug!(
        from = from_stop,
        to = to_stop,
        departures = departures.len(),
        "Collected direct departures"
    );
    departures
}

/// Departures running in `group`, keeping their order.
pub fn departures_in(departures: &[Departure], group: DayGroup) -> Vec<&Departure> {
    departures.iter().filter(|d| d.runs_in(group)).collect()
}

/// Minutes past each hour, for printing a compact timetable.
pub fn minutes_by_hour<'a>(
    departures: impl IntoIterator<Item = &'a Departure>,
) -> BTreeMap<u32, BTreeSet<u32>> {
    let mut by_hour: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
    for d in departures {
        by_hour
            .entry(d.departure.hour())
            .or_default()
            .insert(d.departure.minute());
    }
    by_hour
}
