use serde::{Deserialize, Serialize};

/// Normalised payment status vocabulary.
///
/// `Pending` is the initial state. `Success`, `Cancelled`, `Expired` and
/// `Failed` are terminal. `Unknown` is a transient fallback for raw
/// statuses outside the mapping table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    Pending,
    Success,
    Cancelled,
    Expired,
    Failed,
    Unknown,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Pending => "pending",
            CanonicalStatus::Success => "success",
            CanonicalStatus::Cancelled => "cancelled",
            CanonicalStatus::Expired => "expired",
            CanonicalStatus::Failed => "failed",
            CanonicalStatus::Unknown => "unknown",
        }
    }

    /// Parse the stored textual form. Anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => CanonicalStatus::Pending,
            "success" => CanonicalStatus::Success,
            "cancelled" => CanonicalStatus::Cancelled,
            "expired" => CanonicalStatus::Expired,
            "failed" => CanonicalStatus::Failed,
            _ => CanonicalStatus::Unknown,
        }
    }
}

impl std::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{status, is_paid, can_navigate_home}` triple.
///
/// Fields are private so the two flags can only ever be derived from the
/// status; construct via [`StatusInfo::for_status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    status: CanonicalStatus,
    is_paid: bool,
    can_navigate_home: bool,
}

impl StatusInfo {
    pub fn for_status(status: CanonicalStatus) -> Self {
        let ok = status == CanonicalStatus::Success;
        Self {
            status,
            is_paid: ok,
            can_navigate_home: ok,
        }
    }

    pub fn status(&self) -> CanonicalStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    pub fn can_navigate_home(&self) -> bool {
        self.can_navigate_home
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_status() {
        for s in [
            CanonicalStatus::Pending,
            CanonicalStatus::Success,
            CanonicalStatus::Cancelled,
            CanonicalStatus::Expired,
            CanonicalStatus::Failed,
            CanonicalStatus::Unknown,
        ] {
            let info = StatusInfo::for_status(s);
            assert_eq!(info.is_paid(), s == CanonicalStatus::Success);
            assert_eq!(info.can_navigate_home(), s == CanonicalStatus::Success);
            assert_eq!(CanonicalStatus::parse(s.as_str()), s);
        }
    }
}
