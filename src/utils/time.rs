use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Renders an instant the way US locale clocks read it, e.g.
/// `10/17/2026, 3:30:00 PM`, in the given zone.
pub fn to_local_display(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}
