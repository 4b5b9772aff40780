use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub fn now_rfc3339() -> String {
    format_offset(OffsetDateTime::now_utc())
}

pub fn format_offset(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn format_offset_outputs_utc_z() {
        assert_eq!(format_offset(datetime!(2025-01-02 10:20:30 UTC)), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn now_is_rfc3339_parseable() {
        let stamp = now_rfc3339();
        assert!(OffsetDateTime::parse(&stamp, &Rfc3339).is_ok());
    }
}
