//! Domain types shared by the calendar engine and the matchers.
//!
//! Everything in here is a pure value type or a pure function: dates and
//! weekdays, service-day times, train identities and text normalization.

mod date;
mod error;
mod identity;
mod text;
mod time;

pub use date::{WEEKDAYS, WeekdaySet, date_at_offset, days_inclusive, weekday_index};
pub use error::CalendarFormatError;
pub use identity::{TrainIdentity, TrainLabel};
pub use text::{
    MAX_ROUTE_CODE_LEN, MIN_ROUTE_CODE_LEN, fold_text, is_route_code_token,
    is_route_code_token_within, normalize_stop_name, route_codes, route_codes_within,
};
pub use time::{DayTime, TimeError, unroll_midnight};
