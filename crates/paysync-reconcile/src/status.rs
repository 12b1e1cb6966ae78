use paysync_schemas::{CanonicalStatus, StatusInfo};

/// Raw processor status => canonical status.
///
/// Total over all inputs: anything outside the table (including a missing
/// status) is `Unknown`. Matching is exact and case-sensitive.
pub fn canonical_status(raw: Option<&str>) -> CanonicalStatus {
    match raw {
        Some("settlement") | Some("capture") => CanonicalStatus::Success,
        Some("pending") => CanonicalStatus::Pending,
        Some("cancel") => CanonicalStatus::Cancelled,
        Some("expire") => CanonicalStatus::Expired,
        Some("deny") | Some("failure") => CanonicalStatus::Failed,
        _ => CanonicalStatus::Unknown,
    }
}

/// The single source of status semantics for the whole service.
pub fn map_status(raw: Option<&str>) -> StatusInfo {
    StatusInfo::for_status(canonical_status(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[(&str, CanonicalStatus, bool)] = &[
        ("settlement", CanonicalStatus::Success, true),
        ("capture", CanonicalStatus::Success, true),
        ("pending", CanonicalStatus::Pending, false),
        ("cancel", CanonicalStatus::Cancelled, false),
        ("expire", CanonicalStatus::Expired, false),
        ("deny", CanonicalStatus::Failed, false),
        ("failure", CanonicalStatus::Failed, false),
    ];

    #[test]
    fn table_rows_map_exactly() {
        for (raw, status, paid) in TABLE {
            let info = map_status(Some(raw));
            assert_eq!(info.status(), *status, "raw={raw}");
            assert_eq!(info.is_paid(), *paid, "raw={raw}");
            assert_eq!(info.can_navigate_home(), *paid, "raw={raw}");
        }
    }

    #[test]
    fn everything_else_is_unknown() {
        for raw in [
            None,
            Some(""),
            Some("Settlement"),
            Some(" settlement"),
            Some("refund"),
            Some("default"),
            Some("authorize"),
        ] {
            let info = map_status(raw);
            assert_eq!(info.status(), CanonicalStatus::Unknown, "raw={raw:?}");
            assert!(!info.is_paid());
            assert!(!info.can_navigate_home());
        }
    }

    #[test]
    fn mapping_is_repeatable() {
        assert_eq!(map_status(Some("capture")), map_status(Some("capture")));
    }
}
