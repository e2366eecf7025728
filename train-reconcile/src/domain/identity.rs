//! Train identity (category + number) types.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use super::text::fold_text;

/// A category code followed by a train number somewhere in a label.
///
/// Examples: "Os 7806", "R1234", "rj 070", "Sp 1706 Berounka".
static TRAIN_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{1,8})\s*([0-9]{1,6})\b").expect("valid train label regex")
});

/// A train's identity as printed on timetables: a short category code
/// ("Os", "R", "Sp", "rj") and a train number.
///
/// Either part may be missing. A label with no recognizable identity parses
/// to an identity with both parts absent rather than failing, so unknown
/// trains flow through matching as "unknown" instead of as errors.
///
/// # Examples
///
/// ```
/// use train_reconcile::domain::TrainIdentity;
///
/// let id = TrainIdentity::parse("Os 7806");
/// assert_eq!(id.category(), Some("Os"));
/// assert_eq!(id.number(), Some(7806));
///
/// let id = TrainIdentity::parse("R1234 Berounka");
/// assert_eq!(id.category(), Some("R"));
/// assert_eq!(id.number(), Some(1234));
///
/// assert!(TrainIdentity::parse("bez cisla").is_unknown());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TrainIdentity {
    category: Option<String>,
    number: Option<u32>,
}

impl TrainIdentity {
    /// Build from already-known parts. Empty categories are treated as absent.
    pub fn new(category: Option<&str>, number: Option<u32>) -> Self {
        Self {
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            number,
        }
    }

    /// Identity with neither category nor number.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Parse the first category/number pair found in a free-text label.
    pub fn parse(label: &str) -> Self {
        let Some(caps) = TRAIN_LABEL_RE.captures(label) else {
            return Self::unknown();
        };
        let category = caps.get(1).map(|m| m.as_str());
        let number = caps.get(2).and_then(|m| m.as_str().parse().ok());
        match number {
            Some(number) => Self::new(category, Some(number)),
            None => Self::unknown(),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn number(&self) -> Option<u32> {
        self.number
    }

    pub fn is_unknown(&self) -> bool {
        self.category.is_none() && self.number.is_none()
    }

    /// Fill in parts missing from `self` using an identity parsed from a
    /// label, without letting the label contradict what is already known.
    ///
    /// If no number is known the parsed identity is taken whole. If the
    /// number is known but the category is not, the parsed category is only
    /// borrowed when the parsed number agrees, so a line label like "P2/S70"
    /// cannot attach category "P" to train 7806.
    pub fn or_parsed(self, parsed: TrainIdentity) -> Self {
        match (self.number, parsed.number) {
            (None, _) => {
                if parsed.is_unknown() {
                    self
                } else {
                    parsed
                }
            }
            (Some(known), Some(found)) if known == found && self.category.is_none() => Self {
                category: parsed.category,
                number: self.number,
            },
            _ => self,
        }
    }

    /// Whether two identities denote the same train for matching.
    ///
    /// Numbers must both be known and equal. Categories are compared after
    /// case and diacritic folding, and only when both sides have one.
    pub fn matches(&self, other: &TrainIdentity) -> bool {
        match (self.number, other.number) {
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }
        match (&self.category, &other.category) {
            (Some(a), Some(b)) => fold_text(a) == fold_text(b),
            _ => true,
        }
    }

    /// The vote label for this identity, if both parts are known.
    pub fn label(&self) -> Option<TrainLabel> {
        Some(TrainLabel {
            category: self.category.clone()?,
            number: self.number?,
        })
    }
}

impl fmt::Display for TrainIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.category, self.number) {
            (Some(c), Some(n)) => write!(f, "{c} {n}"),
            (Some(c), None) => f.write_str(c),
            (None, Some(n)) => write!(f, "{n}"),
            (None, None) => f.write_str("?"),
        }
    }
}

/// A complete train label ("Os 7806") used as the unit of voting.
///
/// Labels compare exactly (case included) so that each dataset's own
/// spelling is preserved in audit output. Leading zeros of the number are
/// dropped on parse: "rj 070" becomes `rj 70`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrainLabel {
    category: String,
    number: u32,
}

impl TrainLabel {
    /// Parse a label from a route short name. Returns `None` when the text
    /// has no category/number pair (e.g. named trains like "Berounka").
    ///
    /// # Examples
    ///
    /// ```
    /// use train_reconcile::domain::TrainLabel;
    ///
    /// assert_eq!(TrainLabel::parse("Os 7806").unwrap().to_string(), "Os 7806");
    /// assert_eq!(TrainLabel::parse("rj 070").unwrap().to_string(), "rj 70");
    /// assert!(TrainLabel::parse("Berounka").is_none());
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        TrainIdentity::parse(text.trim()).label()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn number(&self) -> u32 {
        self.number
    }
}

impl fmt::Display for TrainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.number)
    }
}

impl Serialize for TrainLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
