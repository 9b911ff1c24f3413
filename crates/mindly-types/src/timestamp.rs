use chrono::{DateTime, Utc};

/// Layout of `dateCreated` / `dateModified` values, e.g. `2024-05-01 09:30:00 +0000`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Render a UTC instant the way Mindly stores modification times.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The current UTC time in Mindly's timestamp layout.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}
