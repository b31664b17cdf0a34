use serde::{Deserialize, Serialize};
use std::fmt;

/// Review states of an application.
///
/// The set is closed but there is no transition table: any member may follow
/// any other. Who may move an application is decided by the guards in
/// [`super::guards`], not by the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    /// Initial state of every newly created application
    Submitted,
    InReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        Self::Draft,
        Self::Submitted,
        Self::InReview,
        Self::Approved,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::InReview => "IN_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Comma separated list of every valid status name
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(Self::Draft),
            "SUBMITTED" => Ok(Self::Submitted),
            "IN_REVIEW" => Ok(Self::InReview),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(format!(
                "Invalid application status: {s}. Valid values: {}",
                Self::valid_names()
            )),
        }
    }
}

impl Default for ApplicationStatus {
    fn default() -> Self {
        Self::Submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_conversion() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.to_string().parse::<ApplicationStatus>().unwrap(), status);
        }
        assert_eq!(ApplicationStatus::InReview.to_string(), "IN_REVIEW");
    }

    #[test]
    fn test_invalid_status_names_valid_set() {
        let err = "approved".parse::<ApplicationStatus>().unwrap_err();
        assert!(err.contains("DRAFT, SUBMITTED, IN_REVIEW, APPROVED, REJECTED"));
        assert!("".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&ApplicationStatus::InReview).unwrap();
        assert_eq!(json, "\"IN_REVIEW\"");
        let parsed: ApplicationStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(parsed, ApplicationStatus::Rejected);
    }

    #[test]
    fn test_default_is_submitted() {
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::Submitted);
    }
}
