use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Enrolment status of a child. The API only ever emits these three values;
/// anything else is a contract violation and fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildStatus {
    New,
    Active,
    Leaving,
}

impl std::fmt::Display for ChildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChildStatus::New => write!(f, "New"),
            ChildStatus::Active => write!(f, "Active"),
            ChildStatus::Leaving => write!(f, "Leaving"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardianInfo {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalInfo {
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub status: ChildStatus,
    #[serde(default)]
    pub guardian: GuardianInfo,
    #[serde(default)]
    pub medical: MedicalInfo,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl Child {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "Last, First" ordering for table display
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Create/update payload. Age is never part of the payload - the server
/// stores only the date of birth and age is derived at read time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildPayload {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub status: ChildStatus,
    pub guardian: GuardianInfo,
    pub medical: MedicalInfo,
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// Sortable columns in the roster table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildSortColumn {
    Name,
    Age,
    Status,
}

impl ChildSortColumn {
    pub fn next(&self) -> Self {
        match self {
            ChildSortColumn::Name => ChildSortColumn::Age,
            ChildSortColumn::Age => ChildSortColumn::Status,
            ChildSortColumn::Status => ChildSortColumn::Name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_child_response() {
        let json = r#"{
            "id": "chd_001",
            "firstName": "Emma",
            "lastName": "Wilson",
            "dateOfBirth": "2020-01-15",
            "status": "active",
            "guardian": {"name": "Michelle Wilson", "email": "michelle@example.com", "phone": "07700900123", "address": null},
            "medical": {"allergies": ["Peanuts"], "conditions": ["Mild Asthma"], "notes": null},
            "emergencyContacts": [{"name": "John Wilson", "phone": "07700900456"}]
        }"#;

        let child: Child = serde_json::from_str(json).expect("valid child JSON");
        assert_eq!(child.full_name(), "Emma Wilson");
        assert_eq!(child.display_name(), "Wilson, Emma");
        assert_eq!(child.status, ChildStatus::Active);
        assert_eq!(child.guardian.email, "michelle@example.com");
        assert_eq!(child.guardian.phone, "07700900123");
        assert_eq!(child.medical.allergies, vec!["Peanuts"]);
        assert_eq!(child.emergency_contacts.len(), 1);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let json = r#"{
            "id": "chd_002",
            "firstName": "Noah",
            "lastName": "Smith",
            "dateOfBirth": "2021-03-23",
            "status": "graduated"
        }"#;

        assert!(serde_json::from_str::<Child>(json).is_err());
    }

    #[test]
    fn test_missing_optional_sections_default() {
        let json = r#"{
            "id": "chd_003",
            "firstName": "Olivia",
            "lastName": "Davis",
            "dateOfBirth": "2020-11-05",
            "status": "new"
        }"#;

        let child: Child = serde_json::from_str(json).expect("valid child JSON");
        assert!(child.medical.allergies.is_empty());
        assert!(child.emergency_contacts.is_empty());
        assert_eq!(child.guardian.name, "");
        assert_eq!(child.guardian.email, "");
    }
}
