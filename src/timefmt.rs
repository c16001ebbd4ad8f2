use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};

const DATE_TIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Renders a timestamp as `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.to_offset(UtcOffset::UTC)
        .format(DATE_TIME)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

pub fn format_optional(ts: Option<OffsetDateTime>) -> Option<String> {
    ts.map(format_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn formats_fixed_pattern() {
        let ts = datetime!(2024-03-07 09:05:01 UTC);
        assert_eq!(format_timestamp(ts), "2024-03-07 09:05:01");
    }

    #[test]
    fn normalizes_to_utc() {
        let ts = datetime!(2024-03-07 09:05:01 +7);
        assert_eq!(format_timestamp(ts), "2024-03-07 02:05:01");
    }

    #[test]
    fn optional_passthrough() {
        assert_eq!(format_optional(None), None);
    }
}
