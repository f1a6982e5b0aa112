//! API client for the nursery management REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests against the children, attendance, progress, and communication
//! resources.

use chrono::NaiveDate;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::auth::User;
use crate::models::{
    Announcement, AnnouncementPayload, AttendancePayload, AttendanceRecord, Child, ChildPayload,
    Message, MessagePayload, Milestone, Observation, ObservationPayload,
};

use super::ApiError;

/// Default base URL for the nursery API, overridable via config or
/// NURSERYDESK_API_URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// API client for the nursery service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            if let Ok(value) = header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(header::AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Issue a request and parse the JSON response body. No automatic
    /// retries: any failure is returned to the caller as-is.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "API request");

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.auth_headers());
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::from_status(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Request {
            message: format!("Failed to parse response: {}", e),
            status: status.as_u16(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Request {
            message: format!("Failed to serialize request: {}", e),
            status: 0,
        })?;
        self.request(Method::POST, path, Some(body)).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Request {
            message: format!("Failed to serialize request: {}", e),
            status: 0,
        })?;
        self.request(Method::PUT, path, Some(body)).await
    }

    /// DELETE endpoints return an empty or irrelevant body
    async fn delete(&self, path: &str) -> ApiResult<()> {
        let url = self.url(path);
        debug!(url = %url, "API DELETE");

        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &text));
        }
        Ok(())
    }

    // ===== Auth =====

    /// Authenticate and return the token plus the user profile snapshot.
    /// The only request issued without a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        self.post("/auth/login", &LoginRequest { email, password })
            .await
    }

    // ===== Children =====

    pub async fn fetch_children(&self) -> ApiResult<Vec<Child>> {
        self.get("/children").await
    }

    pub async fn fetch_child(&self, id: &str) -> ApiResult<Child> {
        self.get(&format!("/children/{}", id)).await
    }

    pub async fn create_child(&self, payload: &ChildPayload) -> ApiResult<Child> {
        self.post("/children", payload).await
    }

    pub async fn update_child(&self, id: &str, payload: &ChildPayload) -> ApiResult<Child> {
        self.put(&format!("/children/{}", id), payload).await
    }

    pub async fn delete_child(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/children/{}", id)).await
    }

    // ===== Attendance =====

    pub async fn fetch_attendance_by_date(&self, date: NaiveDate) -> ApiResult<Vec<AttendanceRecord>> {
        self.get(&format!("/attendance/date/{}", date.format("%Y-%m-%d")))
            .await
    }

    pub async fn fetch_attendance_by_month(
        &self,
        year: i32,
        month: u32,
    ) -> ApiResult<Vec<AttendanceRecord>> {
        self.get(&format!("/attendance/month/{}/{}", year, month))
            .await
    }

    pub async fn fetch_attendance_by_child(&self, child_id: &str) -> ApiResult<Vec<AttendanceRecord>> {
        self.get(&format!("/attendance/child/{}", child_id)).await
    }

    pub async fn mark_attendance(&self, payload: &AttendancePayload) -> ApiResult<AttendanceRecord> {
        self.post("/attendance", payload).await
    }

    pub async fn update_attendance(
        &self,
        id: &str,
        payload: &AttendancePayload,
    ) -> ApiResult<AttendanceRecord> {
        self.put(&format!("/attendance/{}", id), payload).await
    }

    // ===== Progress =====

    pub async fn fetch_observations(&self) -> ApiResult<Vec<Observation>> {
        self.get("/progress/observations").await
    }

    pub async fn fetch_observations_by_child(&self, child_id: &str) -> ApiResult<Vec<Observation>> {
        self.get(&format!("/progress/observations/child/{}", child_id))
            .await
    }

    pub async fn create_observation(&self, payload: &ObservationPayload) -> ApiResult<Observation> {
        self.post("/progress/observations", payload).await
    }

    pub async fn update_observation(
        &self,
        id: &str,
        payload: &ObservationPayload,
    ) -> ApiResult<Observation> {
        self.put(&format!("/progress/observations/{}", id), payload)
            .await
    }

    pub async fn delete_observation(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/progress/observations/{}", id)).await
    }

    pub async fn fetch_milestones_by_child(&self, child_id: &str) -> ApiResult<Vec<Milestone>> {
        self.get(&format!("/progress/milestones/child/{}", child_id))
            .await
    }

    // ===== Communication =====

    pub async fn fetch_messages(&self) -> ApiResult<Vec<Message>> {
        self.get("/communication/messages").await
    }

    pub async fn fetch_messages_by_user(&self, user_id: &str) -> ApiResult<Vec<Message>> {
        self.get(&format!("/communication/messages/user/{}", user_id))
            .await
    }

    pub async fn send_message(&self, payload: &MessagePayload) -> ApiResult<Message> {
        self.post("/communication/messages", payload).await
    }

    pub async fn fetch_announcements(&self) -> ApiResult<Vec<Announcement>> {
        self.get("/communication/announcements").await
    }

    pub async fn send_announcement(&self, payload: &AnnouncementPayload) -> ApiResult<Announcement> {
        self.post("/communication/announcements", payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, ChildStatus, Priority};

    #[test]
    fn test_parse_login_response() {
        let json = r#"{
            "token": "eyJhbGciOiJIUzI1NiJ9.test",
            "user": {"id": "usr_123", "name": "Sarah Johnson", "email": "sarah@example.com", "role": "owner"}
        }"#;

        let resp: LoginResponse = serde_json::from_str(json).expect("valid login JSON");
        assert_eq!(resp.user.name, "Sarah Johnson");
        assert!(resp.token.starts_with("eyJ"));
    }

    #[test]
    fn test_parse_children_collection() {
        let json = r#"[
            {"id": "chd_001", "firstName": "Emma", "lastName": "Wilson",
             "dateOfBirth": "2020-01-15", "status": "active"},
            {"id": "chd_002", "firstName": "Lucas", "lastName": "Taylor",
             "dateOfBirth": "2020-02-28", "status": "new"}
        ]"#;

        let children: Vec<Child> = serde_json::from_str(json).expect("valid children JSON");
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].status, ChildStatus::New);
    }

    #[test]
    fn test_parse_attendance_day() {
        let json = r#"[
            {"id": "att_1", "childId": "chd_001", "date": "2025-04-10",
             "status": "present", "arrivalTime": "08:15", "pickupTime": "17:30", "notes": null},
            {"id": "att_2", "childId": "chd_002", "date": "2025-04-10",
             "status": "not-scheduled", "arrivalTime": null, "pickupTime": null, "notes": null}
        ]"#;

        let records: Vec<AttendanceRecord> = serde_json::from_str(json).expect("valid records");
        assert_eq!(records[0].status, AttendanceStatus::Present);
        assert_eq!(records[1].status, AttendanceStatus::NotScheduled);
    }

    #[test]
    fn test_parse_announcement() {
        let json = r#"{
            "id": "ann_5", "title": "Nursery closed Monday",
            "content": "Staff training day.", "priority": "high",
            "recipients": "all", "createdAt": "2025-04-08T09:00:00Z"
        }"#;

        let ann: Announcement = serde_json::from_str(json).expect("valid announcement");
        assert_eq!(ann.priority, Priority::High);
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new("http://localhost:5000/api".to_string()).unwrap();
        assert_eq!(client.url("/children"), "http://localhost:5000/api/children");
    }
}
