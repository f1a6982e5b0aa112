use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Development area an observation is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationCategory {
    Social,
    Literacy,
    Numeracy,
    Physical,
    Creative,
}

impl ObservationCategory {
    pub const ALL: [ObservationCategory; 5] = [
        ObservationCategory::Social,
        ObservationCategory::Literacy,
        ObservationCategory::Numeracy,
        ObservationCategory::Physical,
        ObservationCategory::Creative,
    ];
}

impl std::fmt::Display for ObservationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservationCategory::Social => write!(f, "Social"),
            ObservationCategory::Literacy => write!(f, "Literacy"),
            ObservationCategory::Numeracy => write!(f, "Numeracy"),
            ObservationCategory::Physical => write!(f, "Physical"),
            ObservationCategory::Creative => write!(f, "Creative"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    pub child_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub category: ObservationCategory,
    pub details: String,
    pub development_area: Option<String>,
    pub next_steps: Option<String>,
    #[serde(default)]
    pub media: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPayload {
    pub child_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub category: ObservationCategory,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
}

/// A developmental milestone for a child. Read-only in this client -
/// achievement is recorded by the assessment service, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub category: ObservationCategory,
    pub description: String,
    pub achieved: bool,
    pub achieved_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_observation() {
        let json = r#"{
            "id": "obs_042",
            "childId": "chd_001",
            "title": "Shared blocks during free play",
            "date": "2025-03-15",
            "category": "social",
            "details": "Offered blocks to two other children without prompting.",
            "developmentArea": "Taking turns",
            "nextSteps": null
        }"#;

        let obs: Observation = serde_json::from_str(json).expect("valid observation JSON");
        assert_eq!(obs.category, ObservationCategory::Social);
        assert_eq!(obs.development_area.as_deref(), Some("Taking turns"));
        assert!(obs.media.is_empty());
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!(serde_json::from_str::<ObservationCategory>("\"musical\"").is_err());
    }

    #[test]
    fn test_parse_milestone() {
        let json = r#"{
            "category": "numeracy",
            "description": "Counts to 10 and beyond",
            "achieved": true,
            "achievedDate": "2025-03-10"
        }"#;

        let m: Milestone = serde_json::from_str(json).expect("valid milestone JSON");
        assert!(m.achieved);
        assert_eq!(m.category, ObservationCategory::Numeracy);
    }
}
