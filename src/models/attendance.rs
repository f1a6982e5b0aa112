use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attendance status for a single (child, date) pair.
/// Wire format is kebab-case: "present", "absent", "not-scheduled".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    NotScheduled,
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceStatus::Present => write!(f, "Present"),
            AttendanceStatus::Absent => write!(f, "Absent"),
            AttendanceStatus::NotScheduled => write!(f, "Not Scheduled"),
        }
    }
}

/// One attendance record. The server guarantees at most one per
/// (child, date) pair; the client upholds that by updating the existing
/// record's id instead of posting a duplicate (see `app::attendance_mutation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: String,
    pub child_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// "HH:MM" clock times as reported by the API
    pub arrival_time: Option<String>,
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayload {
    pub child_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::NotScheduled).unwrap(),
            "\"not-scheduled\""
        );
        let parsed: AttendanceStatus = serde_json::from_str("\"not-scheduled\"").unwrap();
        assert_eq!(parsed, AttendanceStatus::NotScheduled);
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_str::<AttendanceStatus>("\"late\"").is_err());
    }

    #[test]
    fn test_parse_record() {
        let json = r#"{
            "id": "att_100",
            "childId": "chd_001",
            "date": "2025-04-10",
            "status": "present",
            "arrivalTime": "08:15",
            "pickupTime": null,
            "notes": "Late arrival - doctor appointment"
        }"#;

        let record: AttendanceRecord = serde_json::from_str(json).expect("valid record JSON");
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.arrival_time.as_deref(), Some("08:15"));
        assert!(record.pickup_time.is_none());
    }

    #[test]
    fn test_payload_omits_empty_optionals() {
        let payload = AttendancePayload {
            child_id: "chd_001".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(),
            status: AttendanceStatus::Absent,
            arrival_time: None,
            pickup_time: None,
            notes: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("arrivalTime"));
        assert!(json.contains("\"status\":\"absent\""));
    }
}
