//! Matching one departure against a pool of live records.
//!
//! A departure from the timetable is looked up among records from another
//! source (typically a delay board) that use their own identifiers. The
//! train number is tried first; when it gives nothing, short line codes in
//! the labels ("P13", "S70") are used together with the scheduled time.

use serde::Serialize;
use tracing::debug;

use crate::config::MatchConfig;
use crate::domain::{DayTime, TrainIdentity, route_codes_within};

/// How confidently a record was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    /// Train number (and category) agree.
    High,
    /// Only a line code and the scheduled time agree.
    Medium,
    /// Nothing matched, or several records did.
    None,
}

impl MatchConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchConfidence::High => "high",
            MatchConfidence::Medium => "medium",
            MatchConfidence::None => "none",
        }
    }

    /// Human-readable description of the confidence level.
    pub fn description(&self) -> &'static str {
        match self {
            MatchConfidence::High => "Matches train number",
            MatchConfidence::Medium => "Matches line code and time",
            MatchConfidence::None => "No unique match",
        }
    }
}

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    TrainNumber,
    RouteCode,
    None,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::TrainNumber => "train_number",
            MatchReason::RouteCode => "route_code",
            MatchReason::None => "none",
        }
    }
}

/// The departure being looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTarget {
    pub scheduled: DayTime,
    /// Identity known from structured fields, possibly incomplete.
    pub identity: TrainIdentity,
    /// Free-text label, e.g. a route short name ("Os 7806", "P13").
    pub label: String,
}

impl MatchTarget {
    pub fn new(scheduled: DayTime, identity: TrainIdentity, label: impl Into<String>) -> Self {
        Self {
            scheduled,
            identity,
            label: label.into(),
        }
    }

    /// Known identity completed from the label.
    pub fn effective_identity(&self) -> TrainIdentity {
        self.identity
            .clone()
            .or_parsed(TrainIdentity::parse(&self.label))
    }
}

/// One record from the other source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidate {
    /// The record's own status text, passed through on a match.
    pub status: String,
    pub identity: TrainIdentity,
    pub scheduled: Option<DayTime>,
    /// Free-text route description, searched for line codes.
    pub label: String,
}

impl MatchCandidate {
    pub fn new(
        status: impl Into<String>,
        identity: TrainIdentity,
        scheduled: Option<DayTime>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            status: status.into(),
            identity,
            scheduled,
            label: label.into(),
        }
    }
}

/// Outcome of [`match_single`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchDecision<'a> {
    pub confidence: MatchConfidence,
    pub reason: MatchReason,
    pub matched: Option<&'a MatchCandidate>,
}

impl<'a> MatchDecision<'a> {
    const STATUS_UNKNOWN: &'static str = "unknown";

    fn unmatched() -> Self {
        Self {
            confidence: MatchConfidence::None,
            reason: MatchReason::None,
            matched: None,
        }
    }

    fn found(
        confidence: MatchConfidence,
        reason: MatchReason,
        candidate: &'a MatchCandidate,
    ) -> Self {
        Self {
            confidence,
            reason,
            matched: Some(candidate),
        }
    }

    /// The matched record's status, or "unknown".
    pub fn status(&self) -> &'a str {
        self.matched
            .map(|c| c.status.as_str())
            .unwrap_or(Self::STATUS_UNKNOWN)
    }

    pub fn is_match(&self) -> bool {
        self.matched.is_some()
    }
}

/// Match with the default configuration.
pub fn match_single<'a>(target: &MatchTarget, candidates: &'a [MatchCandidate]) -> MatchDecision<'a> {
    match_single_with(&MatchConfig::default(), target, candidates)
}

/// Find the one record in `candidates` that is the same train as `target`.
///
/// A unique number match is trusted whatever the time difference, since a
/// delayed train keeps its number. Several number matches are narrowed by the
/// time window; if that still leaves zero or several, nothing is returned and
/// the line code fallback is not tried.
pub fn match_single_with<'a>(
    config: &MatchConfig,
    target: &MatchTarget,
    candidates: &'a [MatchCandidate],
) -> MatchDecision<'a> {
    let identity = target.effective_identity();
    let window = config.time_window().num_minutes();
    let within_window = |candidate: &MatchCandidate| {
        candidate
            .scheduled
            .is_some_and(|t| i64::from(t.minutes_between(target.scheduled)) <= window)
    };

    if identity.number().is_some() {
        let strict: Vec<&MatchCandidate> = candidates
            .iter()
            .filter(|c| identity.matches(&c.identity))
            .collect();

        match strict.as_slice() {
            [] => {}
            [only] => {
                debug!(train = %identity, status = %only.status, "Unique train number match");
                return MatchDecision::found(MatchConfidence::High, MatchReason::TrainNumber, *only);
            }
            many => {
                let near: Vec<&MatchCandidate> =
                    many.iter().copied().filter(|c| within_window(*c)).collect();
                if let [only] = near.as_slice() {
                    debug!(
                        train = %identity,
                        candidates = many.len(),
                        "Train number match narrowed by time"
                    );
                    return MatchDecision::found(
                        MatchConfidence::High,
                        MatchReason::TrainNumber,
                        *only,
                    );
                }
                debug!(
                    train = %identity,
                    candidates = many.len(),
                    near = near.len(),
                    "Ambiguous train number match"
                );
                return MatchDecision::unmatched();
            }
        }
    }

    let codes = route_codes_within(&target.label, config.token_len());
    if codes.is_empty() {
        return MatchDecision::unmatched();
    }

    let by_code: Vec<&MatchCandidate> = candidates
        .iter()
        .filter(|c| within_window(*c))
        .filter(|c| {
            !route_codes_within(&c.label, config.token_len()).is_disjoint(&codes)
        })
        .collect();

    match by_code.as_slice() {
        [only] => {
            debug!(codes = ?codes, status = %only.status, "Route code match");
            MatchDecision::found(MatchConfidence::Medium, MatchReason::RouteCode, *only)
        }
        rest => {
            debug!(codes = ?codes, candidates = rest.len(), "No unique route code match");
            MatchDecision::unmatched()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> DayTime {
        DayTime::from_hms(h, m, 0).unwrap()
    }

    fn numbered(category: &str, number: u32, at: DayTime, status: &str) -> MatchCandidate {
        MatchCandidate::new(
            status,
            TrainIdentity::new(Some(category), Some(number)),
            Some(at),
            "",
        )
    }

    fn by_route(route: &str, at: DayTime, status: &str) -> MatchCandidate {
        MatchCandidate::new(status, TrainIdentity::unknown(), Some(at), route)
    }

    #[test]
    fn unique_number_match_ignores_time() {
        let target = MatchTarget::new(t(12, 50), TrainIdentity::new(Some("Os"), Some(27324)), "");
        let candidates = vec![numbered("Os", 27324, t(12, 41), "+9 min")];

        let decision = match_single(&target, &candidates);
        assert_eq!(decision.confidence, MatchConfidence::High);
        assert_eq!(decision.reason, MatchReason::TrainNumber);
        assert_eq!(decision.status(), "+9 min");
    }

    #[test]
    fn number_from_label_when_fields_missing() {
        let target = MatchTarget::new(t(8, 0), TrainIdentity::unknown(), "Os 27324");
        let candidates = vec![numbered("os", 27324, t(9, 30), "on time")];

        let decision = match_single(&target, &candidates);
        assert_eq!(decision.confidence, MatchConfidence::High);
        assert_eq!(decision.status(), "on time");
    }

    #[test]
    fn category_mismatch_is_not_a_match() {
        let target = MatchTarget::new(t(8, 0), TrainIdentity::new(Some("R"), Some(100)), "");
        let candidates = vec![numbered("Os", 100, t(8, 0), "x")];

        let decision = match_single(&target, &candidates);
        assert!(!decision.is_match());
        assert_eq!(decision.status(), "unknown");
    }

    #[test]
    fn missing_category_on_one_side_still_matches() {
        let target = MatchTarget::new(t(8, 0), TrainIdentity::new(None, Some(100)), "");
        let candidates = vec![numbered("Os", 100, t(8, 0), "x")];
        assert_eq!(
            match_single(&target, &candidates).confidence,
            MatchConfidence::High
        );
    }

    #[test]
    fn duplicate_numbers_narrowed_by_time() {
        let target = MatchTarget::new(t(10, 0), TrainIdentity::new(Some("Os"), Some(5)), "");
        let candidates = vec![
            numbered("Os", 5, t(10, 3), "near"),
            numbered("Os", 5, t(18, 0), "far"),
        ];

        let decision = match_single(&target, &candidates);
        assert_eq!(decision.confidence, MatchConfidence::High);
        assert_eq!(decision.status(), "near");
    }

    #[test]
    fn duplicate_numbers_within_window_are_ambiguous() {
        let target = MatchTarget::new(t(10, 0), TrainIdentity::new(Some("Os"), Some(5)), "P13");
        let candidates = vec![
            numbered("Os", 5, t(10, 1), "a"),
            numbered("Os", 5, t(10, 2), "b"),
            by_route("P13 Plzen", t(10, 0), "route"),
        ];

        // route codes are not consulted once the number was ambiguous
        let decision = match_single(&target, &candidates);
        assert_eq!(decision.confidence, MatchConfidence::None);
        assert_eq!(decision.reason, MatchReason::None);
        assert!(decision.matched.is_none());
    }

    #[test]
    fn duplicate_numbers_without_times_are_ambiguous() {
        let target = MatchTarget::new(t(10, 0), TrainIdentity::new(Some("Os"), Some(5)), "");
        let mut a = numbered("Os", 5, t(10, 0), "a");
        let mut b = numbered("Os", 5, t(10, 0), "b");
        a.scheduled = None;
        b.scheduled = None;
        let candidates = vec![a, b];
        assert!(!match_single(&target, &candidates).is_match());
    }

    #[test]
    fn route_code_window_is_inclusive() {
        let target = MatchTarget::new(t(10, 44), TrainIdentity::unknown(), "P13");

        let far = vec![by_route("P13 Plzen - Rokycany", t(10, 48), "late")];
        let decision = match_single(&target, &far);
        assert_eq!(decision.confidence, MatchConfidence::None);
        assert_eq!(decision.status(), "unknown");

        let near = vec![by_route("P13 Plzen - Rokycany", t(10, 47), "late")];
        let decision = match_single(&target, &near);
        assert_eq!(decision.confidence, MatchConfidence::Medium);
        assert_eq!(decision.reason, MatchReason::RouteCode);
        assert_eq!(decision.status(), "late");
    }

    #[test]
    fn route_code_window_before_target() {
        let target = MatchTarget::new(t(10, 44), TrainIdentity::unknown(), "P13");
        let candidates = vec![by_route("P13", t(10, 41), "early")];
        assert_eq!(
            match_single(&target, &candidates).confidence,
            MatchConfidence::Medium
        );
    }

    #[test]
    fn route_code_needs_whole_token() {
        let target = MatchTarget::new(t(9, 0), TrainIdentity::unknown(), "P2");
        let candidates = vec![by_route("XP20 Plzen - Cheb", t(9, 0), "x")];

        let decision = match_single(&target, &candidates);
        assert_eq!(decision.confidence, MatchConfidence::None);
        assert_eq!(decision.reason, MatchReason::None);
    }

    #[test]
    fn route_code_several_survivors() {
        let target = MatchTarget::new(t(9, 0), TrainIdentity::unknown(), "S70");
        let candidates = vec![
            by_route("S70 Beroun", t(9, 0), "a"),
            by_route("s70 Praha", t(9, 2), "b"),
        ];
        assert!(!match_single(&target, &candidates).is_match());
    }

    #[test]
    fn route_code_candidate_without_time_is_skipped() {
        let target = MatchTarget::new(t(9, 0), TrainIdentity::unknown(), "S70");
        let candidates = vec![
            MatchCandidate::new("a", TrainIdentity::unknown(), None, "S70"),
            by_route("S70", t(9, 1), "b"),
        ];
        assert_eq!(match_single(&target, &candidates).status(), "b");
    }

    #[test]
    fn no_tokens_no_number() {
        let target = MatchTarget::new(t(9, 0), TrainIdentity::unknown(), "Plzeň");
        let candidates = vec![by_route("Plzeň", t(9, 0), "x")];
        let decision = match_single(&target, &candidates);
        assert_eq!(decision.confidence, MatchConfidence::None);
        assert_eq!(decision.reason, MatchReason::None);
    }

    #[test]
    fn empty_pool() {
        let target = MatchTarget::new(t(9, 0), TrainIdentity::new(Some("Os"), Some(1)), "S7");
        let decision = match_single(&target, &[]);
        assert!(!decision.is_match());
    }

    #[test]
    fn number_miss_falls_back_to_route_code() {
        let target = MatchTarget::new(t(7, 5), TrainIdentity::new(Some("Os"), Some(7806)), "S7");
        let candidates = vec![
            numbered("Os", 9999, t(7, 5), "other"),
            by_route("S7 Beroun", t(7, 6), "route"),
        ];
        let decision = match_single(&target, &candidates);
        assert_eq!(decision.reason, MatchReason::RouteCode);
        assert_eq!(decision.status(), "route");
    }

    #[test]
    fn wider_window_from_config() {
        let config = MatchConfig::new(5, 2, 8);
        let target = MatchTarget::new(t(10, 44), TrainIdentity::unknown(), "P13");
        let candidates = vec![by_route("P13", t(10, 48), "late")];
        assert_eq!(
            match_single_with(&config, &target, &candidates).confidence,
            MatchConfidence::Medium
        );
    }

    #[test]
    fn confidence_strings() {
        assert_eq!(MatchConfidence::High.as_str(), "high");
        assert_eq!(MatchReason::TrainNumber.as_str(), "train_number");
        assert_eq!(
            serde_json::to_value(MatchReason::RouteCode).unwrap(),
            "route_code"
        );
        assert_eq!(serde_json::to_value(MatchConfidence::None).unwrap(), "none");
        assert!(MatchConfidence::High < MatchConfidence::Medium);
        assert!(!MatchConfidence::None.description().is_empty());
    }
}
