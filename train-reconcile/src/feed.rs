//! In-memory GTFS feed tables.
//!
//! Only the columns the matchers read are modelled. Optional columns default
//! to empty so partial feeds deserialize.

use std::collections::HashMap;

use serde::Deserialize;

use crate::calendar::{CalendarDateRow, CalendarRow};
use crate::domain::{DayTime, WeekdaySet, normalize_stop_name};

/// GTFS `route_type` for rail.
pub const ROUTE_TYPE_RAIL: u16 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: String,
    #[serde(default)]
    pub route_long_name: String,
    #[serde(default)]
    pub route_type: Option<u16>,
}

impl RouteRow {
    pub fn is_rail(&self) -> bool {
        self.route_type == Some(ROUTE_TYPE_RAIL)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TripRow {
    pub trip_id: String,
    pub route_id: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub trip_short_name: String,
    #[serde(default)]
    pub trip_headsign: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    #[serde(default)]
    pub stop_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
}

impl StopTimeRow {
    /// Departure at minute precision, if the column holds a time.
    pub fn departure(&self) -> Option<DayTime> {
        self.departure_time.as_deref().and_then(DayTime::extract)
    }
}

/// A hop between two consecutive stops of one trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripEdge<'a> {
    pub trip_id: &'a str,
    pub from_stop: &'a str,
    pub to_stop: &'a str,
    pub departure: Option<DayTime>,
}

/// Weekdays each service runs on.
///
/// Services without any evidence are assumed to run every day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDays(HashMap<String, WeekdaySet>);

impl ServiceDays {
    pub fn days(&self, service_id: &str) -> WeekdaySet {
        self.0
            .get(service_id)
            .copied()
            .filter(|days| !days.is_empty())
            .unwrap_or(WeekdaySet::ALL)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The tables of one GTFS feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub routes: Vec<RouteRow>,
    pub trips: Vec<TripRow>,
    pub stops: Vec<StopRow>,
    pub stop_times: Vec<StopTimeRow>,
    pub calendar: Vec<CalendarRow>,
    pub calendar_dates: Vec<CalendarDateRow>,
}

impl Feed {
    pub fn routes_by_id(&self) -> HashMap<&str, &RouteRow> {
        self.routes
            .iter()
            .map(|r| (r.route_id.as_str(), r))
            .collect()
    }

    /// Weekdays per service: flags from `calendar` plus the weekdays of
    /// added dates in `calendar_dates`.
    pub fn service_days(&self) -> ServiceDays {
        let mut days: HashMap<String, WeekdaySet> = HashMap::new();
        for row in &self.calendar {
            let entry = days.entry(row.service_id.clone()).or_default();
            for day in row.weekdays().iter() {
                entry.insert(day);
            }
        }
        for row in &self.calendar_dates {
            if let Some(day) = row.added_weekday() {
                days.entry(row.service_id.clone()).or_default().insert(day);
            }
        }
        ServiceDays(days)
    }

    /// Normalized stop name per stop id.
    pub fn normalized_stop_names(&self) -> HashMap<&str, String> {
        self.stops
            .iter()
            .map(|s| (s.stop_id.as_str(), normalize_stop_name(&s.stop_name)))
            .collect()
    }

    /// Stop times of every trip, ordered by stop sequence.
    pub fn stop_times_by_trip(&self) -> HashMap<&str, Vec<&StopTimeRow>> {
        let mut by_trip: HashMap<&str, Vec<&StopTimeRow>> = HashMap::new();
        for st in &self.stop_times {
            by_trip.entry(st.trip_id.as_str()).or_default().push(st);
        }
        for rows in by_trip.values_mut() {
            rows.sort_by_key(|st| st.stop_sequence);
        }
        by_trip
    }

    /// Consecutive-stop edges of every trip, in stop order.
    pub fn trip_edges(&self) -> HashMap<&str, Vec<TripEdge<'_>>> {
        self.stop_times_by_trip()
            .into_iter()
            .map(|(trip_id, rows)| {
                let edges = rows
                    .windows(2)
                    .map(|pair| TripEdge {
                        trip_id,
                        from_stop: pair[0].stop_id.as_str(),
                        to_stop: pair[1].stop_id.as_str(),
                        departure: pair[0].departure(),
                    })
                    .collect();
                (trip_id, edges)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn stop_time(trip: &str, stop: &str, seq: u32, dep: Option<&str>) -> StopTimeRow {
        StopTimeRow {
            trip_id: trip.into(),
            stop_id: stop.into(),
            stop_sequence: seq,
            arrival_time: None,
            departure_time: dep.map(Into::into),
        }
    }

    #[test]
    fn deserializes_partial_feed() {
        let feed: Feed = serde_json::from_str(
            r#"{
                "routes": [{"route_id": "r1", "route_short_name": "Os 7806", "route_type": 2}],
                "trips": [{"trip_id": "t1", "route_id": "r1", "service_id": "s1"}]
            }"#,
        )
        .unwrap();
        assert_eq!(feed.routes.len(), 1);
        assert!(feed.routes[0].is_rail());
        assert_eq!(feed.trips[0].trip_short_name, "");
        assert!(feed.stop_times.is_empty());
        assert!(feed.calendar.is_empty());
    }

    #[test]
    fn routes_are_looked_up_by_id() {
        let feed: Feed = serde_json::from_str(
            r#"{"routes": [
                {"route_id": "r1", "route_short_name": "Os 7806", "route_type": 2},
                {"route_id": "r2", "route_short_name": "S7", "route_type": 2}
            ]}"#,
        )
        .unwrap();
        let routes = feed.routes_by_id();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes["r2"].route_short_name, "S7");
        assert!(!routes.contains_key("r3"));
    }

    #[test]
    fn service_days_from_calendar_and_additions() {
        let feed: Feed = serde_json::from_str(
            r#"{
                "calendar": [
                    {"service_id": "wk", "monday": 1, "tuesday": 1, "wednesday": 1,
                     "thursday": 1, "friday": 1, "start_date": "20241216", "end_date": "20250105"},
                    {"service_id": "none", "start_date": "20241216", "end_date": "20250105"}
                ],
                "calendar_dates": [
                    {"service_id": "wk", "date": "20241221", "exception_type": 1},
                    {"service_id": "wk", "date": "20241222", "exception_type": 2},
                    {"service_id": "dates", "date": "20241222", "exception_type": 1}
                ]
            }"#,
        )
        .unwrap();

        let days = feed.service_days();
        let wk = days.days("wk");
        assert!(wk.contains(Weekday::Mon));
        assert!(wk.contains(Weekday::Sat));
        assert!(!wk.contains(Weekday::Sun));
        assert_eq!(days.days("dates"), WeekdaySet::single(Weekday::Sun));
        // no evidence at all means every day
        assert_eq!(days.days("none"), WeekdaySet::ALL);
        assert_eq!(days.days("missing"), WeekdaySet::ALL);
    }

    #[test]
    fn edges_follow_stop_sequence() {
        let feed = Feed {
            stop_times: vec![
                stop_time("t1", "C", 3, Some("8:20:00")),
                stop_time("t1", "A", 1, Some("8:00:00")),
                stop_time("t1", "B", 2, Some("8:10:30")),
                stop_time("t2", "X", 1, None),
            ],
            ..Feed::default()
        };

        let edges = feed.trip_edges();
        let t1 = &edges["t1"];
        assert_eq!(t1.len(), 2);
        assert_eq!((t1[0].from_stop, t1[0].to_stop), ("A", "B"));
        assert_eq!((t1[1].from_stop, t1[1].to_stop), ("B", "C"));
        assert_eq!(t1[1].departure, DayTime::from_hms(8, 10, 0));
        assert!(edges["t2"].is_empty());
    }

    #[test]
    fn departure_parsing() {
        assert_eq!(
            stop_time("t", "s", 1, Some("25:05:00")).departure(),
            DayTime::from_hms(25, 5, 0)
        );
        assert_eq!(stop_time("t", "s", 1, Some("")).departure(), None);
        assert_eq!(stop_time("t", "s", 1, None).departure(), None);
    }

    #[test]
    fn stop_names_are_normalized() {
        let feed = Feed {
            stops: vec![StopRow {
                stop_id: "1".into(),
                stop_name: "Plzeň hlavní nádraží".into(),
            }],
            ..Feed::default()
        };
        assert_eq!(feed.normalized_stop_names()["1"], "plzen hl.n.");
    }
}
