use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in the state directory
const SESSION_FILE: &str = "session.json";

/// Profile snapshot returned by the login endpoint and persisted alongside
/// the token. Refreshed on every login; never edited locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

pub struct Session {
    state_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            data: None,
        }
    }

    /// Load a persisted session from disk. Returns true if one was found.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;
            self.data = Some(data);
            return Ok(true);
        }
        Ok(false)
    }

    /// Save the session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data, in memory and on disk. Used for logout and for
    /// 401 responses.
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.data.as_ref().map(|d| &d.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_some()
    }

    fn session_path(&self) -> PathBuf {
        self.state_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> SessionData {
        SessionData {
            token: "tok_abc".to_string(),
            user: User {
                id: "usr_123".to_string(),
                name: "Sarah Johnson".to_string(),
                email: "sarah@example.com".to_string(),
                role: "owner".to_string(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_load_clear_roundtrip() {
        let dir = std::env::temp_dir().join(format!("nurserydesk-test-{}", std::process::id()));
        let mut session = Session::new(dir.clone());
        assert!(!session.is_authenticated());

        session.update(sample_data());
        session.save().unwrap();

        let mut loaded = Session::new(dir.clone());
        assert!(loaded.load().unwrap());
        assert_eq!(loaded.token(), Some("tok_abc"));
        assert_eq!(loaded.user().unwrap().name, "Sarah Johnson");

        loaded.clear().unwrap();
        assert!(!loaded.is_authenticated());
        let mut reloaded = Session::new(dir.clone());
        assert!(!reloaded.load().unwrap());

        let _ = std::fs::remove_dir_all(dir);
    }
}
