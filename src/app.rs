//! Application state management for Nurserydesk.
//!
//! This module contains the core `App` struct that owns the query cache,
//! the mutation runner, session state, UI state, and the channel that
//! background fetch tasks report back on.

use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, DEFAULT_BASE_URL};
use crate::auth::{CredentialStore, Session, SessionData};
use crate::cache::{FetchDecision, Mutation, MutationRunner, QueryCache, Resource};
use crate::config::Config;
use crate::models::{
    AnnouncementPayload, AttendancePayload, AttendanceRecord, AttendanceStatus, Child,
    ChildPayload, ChildSortColumn, ChildStatus, EmergencyContact, GuardianInfo, MedicalInfo,
    MessagePayload, ObservationCategory, ObservationPayload, Priority, RecipientScope,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// 32 covers a full refresh (5 collection fetches plus milestone prefetch).
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input on the login form
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input on the login form
const MAX_PASSWORD_LENGTH: usize = 128;

/// Number of items to scroll on page up/down
pub const PAGE_SCROLL_SIZE: usize = 10;

/// Maximum concurrent API requests when prefetching per-child milestones
const MAX_CONCURRENT_REQUESTS: usize = 10;

/// How long a transient notice stays in the status bar
const NOTICE_TTL: Duration = Duration::from_secs(5);

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Children,
    Attendance,
    Progress,
    Messages,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Children => "Children",
            Tab::Attendance => "Attendance",
            Tab::Progress => "Progress",
            Tab::Messages => "Messages",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Children,
            Tab::Children => Tab::Attendance,
            Tab::Attendance => Tab::Progress,
            Tab::Progress => Tab::Messages,
            Tab::Messages => Tab::Dashboard,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Messages,
            Tab::Children => Tab::Dashboard,
            Tab::Attendance => Tab::Children,
            Tab::Progress => Tab::Attendance,
            Tab::Messages => Tab::Progress,
        }
    }
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingForm,
    ConfirmingQuit,
    ConfirmingDelete,
    Quitting,
}

/// What the delete confirmation overlay will remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Child { id: String, name: String },
    Observation { id: String, title: String },
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// Messages tab sub-view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagesView {
    Inbox,
    Announcements,
}

// ============================================================================
// Notices
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient status bar message
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    created_at: Instant,
}

impl Notice {
    fn new(level: NoticeLevel, message: String) -> Self {
        Self {
            level,
            message,
            created_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > NOTICE_TTL
    }
}

// ============================================================================
// Forms
// ============================================================================

/// Which write operation an open form feeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    RegisterChild,
    EditChild(String),
    RecordAttendance { child_id: String, date: NaiveDate },
    RecordObservation(String),
    EditObservation { id: String, child_id: String },
    ComposeMessage { recipient_id: String, parent_id: Option<String> },
    ComposeAnnouncement,
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
}

impl FormField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
        }
    }

    fn with_value(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// An open data-entry form. Fields are free text; parsing and validation
/// happen on submit, and a validation failure keeps the form open with an
/// error line instead of issuing any request.
#[derive(Debug, Clone)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    pub fn field_value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }
}

// ============================================================================
// Background Task Outcomes
// ============================================================================

/// Failure shape carried across the outcome channel
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub message: String,
    pub unauthorized: bool,
}

impl From<ApiError> for FetchFailure {
    fn from(e: ApiError) -> Self {
        Self {
            message: e.message(),
            unauthorized: e.is_unauthorized(),
        }
    }
}

/// Outcomes sent from spawned fetch and mutation tasks back to the main
/// loop. Fetch variants carry the query key and the generation token from
/// `begin_fetch`; the cache discards outcomes whose generation no longer
/// matches.
enum TaskOutcome {
    Children(u64, Result<Vec<Child>, FetchFailure>),
    Child(String, u64, Result<Child, FetchFailure>),
    AttendanceByDate(NaiveDate, u64, Result<Vec<AttendanceRecord>, FetchFailure>),
    AttendanceByMonth((i32, u32), u64, Result<Vec<AttendanceRecord>, FetchFailure>),
    AttendanceByChild(String, u64, Result<Vec<AttendanceRecord>, FetchFailure>),
    Observations(u64, Result<Vec<crate::models::Observation>, FetchFailure>),
    ObservationsByChild(String, u64, Result<Vec<crate::models::Observation>, FetchFailure>),
    MilestonesByChild(String, u64, Result<Vec<crate::models::Milestone>, FetchFailure>),
    Messages(u64, Result<Vec<crate::models::Message>, FetchFailure>),
    MessagesByUser(String, u64, Result<Vec<crate::models::Message>, FetchFailure>),
    Announcements(u64, Result<Vec<crate::models::Announcement>, FetchFailure>),
    MutationDone {
        resource: Resource,
        label: &'static str,
        result: Result<(), FetchFailure>,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub mutations: MutationRunner,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub search_query: String,
    pub messages_view: MessagesView,
    pub child_sort_column: ChildSortColumn,
    pub child_sort_ascending: bool,
    pub form: Option<Form>,
    pub delete_target: Option<DeleteTarget>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Selection indices
    pub children_selection: usize,
    pub attendance_selection: usize,
    pub progress_child_selection: usize,
    pub observation_selection: usize,
    /// Limits the progress tab's observation feed to one category
    pub progress_category_filter: Option<ObservationCategory>,
    pub message_selection: usize,
    pub announcement_selection: usize,

    /// Date shown on the attendance tab
    pub attendance_date: NaiveDate,

    /// Today, fixed at startup and used for ages and dashboard figures
    pub today: NaiveDate,

    // Background task channel
    outcome_rx: mpsc::Receiver<TaskOutcome>,
    outcome_tx: mpsc::Sender<TaskOutcome>,

    // Status bar notices, newest last
    notices: Vec<Notice>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        debug!("App::new() starting");
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let state_dir = config
            .state_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("./state"));
        debug!(?state_dir, "State directory configured");

        // Load session from disk if it exists
        let mut session = Session::new(state_dir);
        let load_result = session.load();
        debug!(?load_result, authenticated = session.is_authenticated(), "Session loaded");

        let base_url = std::env::var("NURSERYDESK_API_URL")
            .ok()
            .or_else(|| config.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut api = ApiClient::new(base_url)?;

        if let Some(token) = session.token() {
            api.set_token(token.to_string());
            debug!("Token set on API client");
        }

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = std::env::var("NURSERYDESK_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let login_password = std::env::var("NURSERYDESK_PASSWORD").unwrap_or_default();

        let today = Local::now().date_naive();

        Ok(Self {
            config,
            session,
            api,
            cache: QueryCache::new(),
            mutations: MutationRunner::new(),

            state: AppState::Normal,
            current_tab: Tab::Dashboard,
            focus: Focus::List,
            search_query: String::new(),
            messages_view: MessagesView::Inbox,
            child_sort_column: ChildSortColumn::Name,
            child_sort_ascending: true,
            form: None,
            delete_target: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,

            children_selection: 0,
            attendance_selection: 0,
            progress_child_selection: 0,
            observation_selection: 0,
            progress_category_filter: None,
            message_selection: 0,
            announcement_selection: 0,

            attendance_date: today,
            today,

            outcome_rx: rx,
            outcome_tx: tx,

            notices: Vec::new(),
        })
    }

    // =========================================================================
    // Notices
    // =========================================================================

    pub fn push_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice::new(level, message.into()));
    }

    /// Drop expired notices; called once per event loop tick
    pub fn prune_notices(&mut self) {
        self.notices.retain(|n| !n.is_expired());
    }

    /// The notice currently shown in the status bar
    pub fn active_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let email = self.login_email.clone();
        let password = self.login_password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return Err(anyhow::anyhow!("Email and password required"));
        }

        self.login_error = None;

        match self.api.login(&email, &password).await {
            Ok(response) => {
                if let Err(e) = CredentialStore::store(&email, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.api.set_token(response.token.clone());
                self.session.update(SessionData {
                    token: response.token,
                    user: response.user,
                    created_at: chrono::Utc::now(),
                });
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save session");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!("Login successful");
                self.refresh_all();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let user_message = if e.is_unauthorized() {
                    "Invalid email or password".to_string()
                } else if matches!(e, ApiError::Network(_)) {
                    "Unable to connect to server. Check your connection.".to_string()
                } else {
                    format!("Login failed: {}", e.message())
                };
                self.login_error = Some(user_message);
                Err(anyhow::anyhow!(e.message()))
            }
        }
    }

    /// Log out: drop the persisted session and every cached result
    pub fn logout(&mut self) {
        info!("Logging out");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session file");
        }
        self.api.clear_token();
        self.cache.clear();
        self.start_login();
    }

    /// A request came back 401: the token is no longer valid
    fn handle_unauthorized(&mut self) {
        warn!("Received 401, clearing session");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session file");
        }
        self.api.clear_token();
        self.cache.clear();
        self.push_notice(NoticeLevel::Error, "Session expired. Please log in again.");
        self.start_login();
    }

    pub fn max_login_field_length(focus: LoginFocus) -> usize {
        match focus {
            LoginFocus::Email => MAX_EMAIL_LENGTH,
            LoginFocus::Password => MAX_PASSWORD_LENGTH,
            LoginFocus::Button => 0,
        }
    }

    // =========================================================================
    // Query Fetching
    // =========================================================================

    /// Ensure the queries behind the current tab are loaded or loading
    pub fn ensure_tab_data(&mut self) {
        match self.current_tab {
            Tab::Dashboard => {
                self.ensure_children();
                self.ensure_attendance_for(self.today);
                self.ensure_observations();
                self.ensure_messages();
                self.ensure_announcements();
            }
            Tab::Children => {
                self.ensure_children();
                self.ensure_selected_child_record();
            }
            Tab::Attendance => {
                self.ensure_children();
                self.ensure_attendance_for(self.attendance_date);
                self.ensure_attendance_month();
                self.ensure_selected_attendance_history();
            }
            Tab::Progress => {
                self.ensure_children();
                if let Some(child_id) = self.progress_child_id() {
                    self.ensure_observations_for(child_id.clone());
                    self.ensure_milestones_for(child_id);
                }
            }
            Tab::Messages => {
                self.ensure_messages();
                self.ensure_announcements();
                self.ensure_selected_conversation();
            }
        }
    }

    /// Mark every resource stale and reload the current tab
    pub fn refresh_all(&mut self) {
        self.cache.invalidate(Resource::Children);
        self.cache.invalidate(Resource::Attendance);
        self.cache.invalidate(Resource::Observations);
        self.cache.invalidate(Resource::Messages);
        self.cache.invalidate(Resource::Announcements);
        self.cache.milestones_by_child.invalidate_all();
        self.ensure_tab_data();
        self.push_notice(NoticeLevel::Info, "Refreshing...");
    }

    pub fn ensure_children(&mut self) {
        if let FetchDecision::Begin(generation) = self.cache.children.begin_fetch(()) {
            debug!("Fetching children roster");
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api.fetch_children().await.map_err(FetchFailure::from);
                Self::send_outcome(&tx, TaskOutcome::Children(generation, result)).await;
            });
        }
    }

    pub fn ensure_child(&mut self, id: String) {
        if let FetchDecision::Begin(generation) = self.cache.child.begin_fetch(id.clone()) {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api.fetch_child(&id).await.map_err(FetchFailure::from);
                Self::send_outcome(&tx, TaskOutcome::Child(id, generation, result)).await;
            });
        }
    }

    pub fn ensure_attendance_for(&mut self, date: NaiveDate) {
        if let FetchDecision::Begin(generation) = self.cache.attendance_by_date.begin_fetch(date) {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            debug!(%date, "Fetching attendance");
            tokio::spawn(async move {
                let result = api
                    .fetch_attendance_by_date(date)
                    .await
                    .map_err(FetchFailure::from);
                Self::send_outcome(&tx, TaskOutcome::AttendanceByDate(date, generation, result))
                    .await;
            });
        }
    }

    /// Load the month containing the attendance tab's displayed date,
    /// used for the per-child monthly summary in the history panel
    pub fn ensure_attendance_month(&mut self) {
        let key = (self.attendance_date.year(), self.attendance_date.month());
        if let FetchDecision::Begin(generation) = self.cache.attendance_by_month.begin_fetch(key) {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            debug!(year = key.0, month = key.1, "Fetching month attendance");
            tokio::spawn(async move {
                let result = api
                    .fetch_attendance_by_month(key.0, key.1)
                    .await
                    .map_err(FetchFailure::from);
                Self::send_outcome(&tx, TaskOutcome::AttendanceByMonth(key, generation, result))
                    .await;
            });
        }
    }

    pub fn ensure_attendance_history(&mut self, child_id: String) {
        if let FetchDecision::Begin(generation) =
            self.cache.attendance_by_child.begin_fetch(child_id.clone())
        {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api
                    .fetch_attendance_by_child(&child_id)
                    .await
                    .map_err(FetchFailure::from);
                Self::send_outcome(
                    &tx,
                    TaskOutcome::AttendanceByChild(child_id, generation, result),
                )
                .await;
            });
        }
    }

    pub fn ensure_observations(&mut self) {
        if let FetchDecision::Begin(generation) = self.cache.observations.begin_fetch(()) {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api.fetch_observations().await.map_err(FetchFailure::from);
                Self::send_outcome(&tx, TaskOutcome::Observations(generation, result)).await;
            });
        }
    }

    pub fn ensure_observations_for(&mut self, child_id: String) {
        if let FetchDecision::Begin(generation) =
            self.cache.observations_by_child.begin_fetch(child_id.clone())
        {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api
                    .fetch_observations_by_child(&child_id)
                    .await
                    .map_err(FetchFailure::from);
                Self::send_outcome(
                    &tx,
                    TaskOutcome::ObservationsByChild(child_id, generation, result),
                )
                .await;
            });
        }
    }

    pub fn ensure_milestones_for(&mut self, child_id: String) {
        if let FetchDecision::Begin(generation) =
            self.cache.milestones_by_child.begin_fetch(child_id.clone())
        {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api
                    .fetch_milestones_by_child(&child_id)
                    .await
                    .map_err(FetchFailure::from);
                Self::send_outcome(
                    &tx,
                    TaskOutcome::MilestonesByChild(child_id, generation, result),
                )
                .await;
            });
        }
    }

    /// Prefetch milestones for every child in one bounded-concurrency
    /// stream, so the progress tab renders without per-selection waits.
    pub fn prefetch_milestones(&mut self) {
        let ids: Vec<String> = self
            .cache
            .children
            .items(&())
            .iter()
            .map(|c| c.id.clone())
            .collect();

        // Claim a generation per child up front; keys already fresh or
        // loading are skipped.
        let mut to_fetch: Vec<(String, u64)> = Vec::new();
        for id in ids {
            if let FetchDecision::Begin(generation) =
                self.cache.milestones_by_child.begin_fetch(id.clone())
            {
                to_fetch.push((id, generation));
            }
        }
        if to_fetch.is_empty() {
            return;
        }

        debug!(count = to_fetch.len(), "Prefetching milestones");
        let api = self.api.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            stream::iter(to_fetch)
                .map(|(id, generation)| {
                    let api = api.clone();
                    async move {
                        let result = api
                            .fetch_milestones_by_child(&id)
                            .await
                            .map_err(FetchFailure::from);
                        (id, generation, result)
                    }
                })
                .buffer_unordered(MAX_CONCURRENT_REQUESTS)
                .for_each(|(id, generation, result)| {
                    let tx = tx.clone();
                    async move {
                        Self::send_outcome(
                            &tx,
                            TaskOutcome::MilestonesByChild(id, generation, result),
                        )
                        .await;
                    }
                })
                .await;
        });
    }

    pub fn ensure_messages(&mut self) {
        if let FetchDecision::Begin(generation) = self.cache.messages.begin_fetch(()) {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api.fetch_messages().await.map_err(FetchFailure::from);
                Self::send_outcome(&tx, TaskOutcome::Messages(generation, result)).await;
            });
        }
    }

    pub fn ensure_conversation_with(&mut self, user_id: String) {
        if let FetchDecision::Begin(generation) =
            self.cache.messages_by_user.begin_fetch(user_id.clone())
        {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api
                    .fetch_messages_by_user(&user_id)
                    .await
                    .map_err(FetchFailure::from);
                Self::send_outcome(
                    &tx,
                    TaskOutcome::MessagesByUser(user_id, generation, result),
                )
                .await;
            });
        }
    }

    /// Load the full conversation for the inbox's selected sender
    pub fn ensure_selected_conversation(&mut self) {
        let sender_id = self
            .cache
            .messages
            .items(&())
            .get(self.message_selection)
            .map(|m| m.sender.id.clone());
        if let Some(id) = sender_id {
            self.ensure_conversation_with(id);
        }
    }

    pub fn ensure_announcements(&mut self) {
        if let FetchDecision::Begin(generation) = self.cache.announcements.begin_fetch(()) {
            let api = self.api.clone();
            let tx = self.outcome_tx.clone();
            tokio::spawn(async move {
                let result = api.fetch_announcements().await.map_err(FetchFailure::from);
                Self::send_outcome(&tx, TaskOutcome::Announcements(generation, result)).await;
            });
        }
    }

    /// Helper to send task outcomes, logging any channel errors
    async fn send_outcome(tx: &mpsc::Sender<TaskOutcome>, outcome: TaskOutcome) {
        if let Err(e) = tx.send(outcome).await {
            error!(error = %e, "Failed to send task outcome - channel closed");
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Submit a mutation. Refused while another one is still in flight.
    pub fn run_mutation(&mut self, mutation: Mutation) {
        if !self.mutations.try_begin() {
            self.push_notice(NoticeLevel::Error, "A save is already in progress");
            return;
        }

        let resource = mutation.resource();
        let label = mutation.describe();
        info!(?resource, label, "Running mutation");

        let api = self.api.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = Self::execute_mutation(&api, mutation)
                .await
                .map_err(FetchFailure::from);
            Self::send_outcome(&tx, TaskOutcome::MutationDone { resource, label, result }).await;
        });
    }

    async fn execute_mutation(api: &ApiClient, mutation: Mutation) -> Result<(), ApiError> {
        match mutation {
            Mutation::CreateChild(payload) => api.create_child(&payload).await.map(|_| ()),
            Mutation::UpdateChild { id, payload } => {
                api.update_child(&id, &payload).await.map(|_| ())
            }
            Mutation::DeleteChild { id } => api.delete_child(&id).await,
            Mutation::MarkAttendance(payload) => api.mark_attendance(&payload).await.map(|_| ()),
            Mutation::UpdateAttendance { id, payload } => {
                api.update_attendance(&id, &payload).await.map(|_| ())
            }
            Mutation::CreateObservation(payload) => {
                api.create_observation(&payload).await.map(|_| ())
            }
            Mutation::UpdateObservation { id, payload } => {
                api.update_observation(&id, &payload).await.map(|_| ())
            }
            Mutation::DeleteObservation { id } => api.delete_observation(&id).await,
            Mutation::SendMessage(payload) => api.send_message(&payload).await.map(|_| ()),
            Mutation::SendAnnouncement(payload) => {
                api.send_announcement(&payload).await.map(|_| ())
            }
        }
    }

    // =========================================================================
    // Background Task Processing
    // =========================================================================

    /// Drain and apply completed background tasks; called between frames
    pub fn check_background_tasks(&mut self) {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            outcomes.push(outcome);
        }
        for outcome in outcomes {
            self.process_outcome(outcome);
        }
    }

    fn process_outcome(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Children(generation, result) => {
                let (result, failed) = self.split_failure(result);
                if self.cache.children.resolve(&(), generation, result) {
                    self.clamp_selections();
                    if !failed && self.current_tab == Tab::Progress {
                        self.prefetch_milestones();
                    }
                }
            }
            TaskOutcome::Child(key, generation, result) => {
                let (result, _) = self.split_failure(result);
                self.cache.child.resolve(&key, generation, result);
            }
            TaskOutcome::AttendanceByDate(date, generation, result) => {
                let (result, _) = self.split_failure(result);
                if self.cache.attendance_by_date.resolve(&date, generation, result) {
                    self.clamp_selections();
                }
            }
            TaskOutcome::AttendanceByMonth(key, generation, result) => {
                let (result, _) = self.split_failure(result);
                self.cache.attendance_by_month.resolve(&key, generation, result);
            }
            TaskOutcome::AttendanceByChild(key, generation, result) => {
                let (result, _) = self.split_failure(result);
                self.cache.attendance_by_child.resolve(&key, generation, result);
            }
            TaskOutcome::Observations(generation, result) => {
                let (result, _) = self.split_failure(result);
                self.cache.observations.resolve(&(), generation, result);
            }
            TaskOutcome::ObservationsByChild(key, generation, result) => {
                let (result, _) = self.split_failure(result);
                if self
                    .cache
                    .observations_by_child
                    .resolve(&key, generation, result)
                {
                    self.clamp_selections();
                }
            }
            TaskOutcome::MilestonesByChild(key, generation, result) => {
                let (result, _) = self.split_failure(result);
                self.cache.milestones_by_child.resolve(&key, generation, result);
            }
            TaskOutcome::Messages(generation, result) => {
                let (result, _) = self.split_failure(result);
                if self.cache.messages.resolve(&(), generation, result) {
                    self.clamp_selections();
                }
            }
            TaskOutcome::MessagesByUser(key, generation, result) => {
                let (result, _) = self.split_failure(result);
                self.cache.messages_by_user.resolve(&key, generation, result);
            }
            TaskOutcome::Announcements(generation, result) => {
                let (result, _) = self.split_failure(result);
                if self.cache.announcements.resolve(&(), generation, result) {
                    self.clamp_selections();
                }
            }
            TaskOutcome::MutationDone { resource, label, result } => {
                match result {
                    Ok(()) => {
                        self.mutations.settle(&mut self.cache, resource, true);
                        self.push_notice(NoticeLevel::Success, label);
                        // Staled queries refetch for whatever is on screen
                        self.ensure_tab_data();
                    }
                    Err(failure) => {
                        self.mutations.settle(&mut self.cache, resource, false);
                        if failure.unauthorized {
                            self.handle_unauthorized();
                        } else {
                            error!(error = %failure.message, "Mutation failed");
                            self.push_notice(NoticeLevel::Error, failure.message);
                        }
                    }
                }
            }
        }
    }

    /// Convert a fetch failure into the cache's error string, routing 401s
    /// to the session teardown path and everything else to a notice.
    /// Returns the cache-shaped result and whether it was a failure.
    fn split_failure<T>(
        &mut self,
        result: Result<T, FetchFailure>,
    ) -> (Result<T, String>, bool) {
        match result {
            Ok(data) => (Ok(data), false),
            Err(failure) => {
                if failure.unauthorized {
                    self.handle_unauthorized();
                } else {
                    error!(error = %failure.message, "Fetch failed");
                    self.push_notice(NoticeLevel::Error, failure.message.clone());
                }
                (Err(failure.message), true)
            }
        }
    }

    // =========================================================================
    // Derived Views
    // =========================================================================

    /// True while the current tab's primary query is revalidating behind
    /// already-rendered data, so the status bar can show the refresh
    pub fn is_refetching(&self) -> bool {
        match self.current_tab {
            Tab::Dashboard | Tab::Children => self.cache.children.is_loading(&()),
            Tab::Attendance => self.cache.attendance_by_date.is_loading(&self.attendance_date),
            Tab::Progress => self
                .progress_child_id()
                .map(|id| self.cache.observations_by_child.is_loading(&id))
                .unwrap_or(false),
            Tab::Messages => self.cache.messages.is_loading(&()),
        }
    }

    /// Children matching the search filter, in the current sort order
    pub fn visible_children(&self) -> Vec<&Child> {
        let query = self.search_query.to_lowercase();
        let mut children: Vec<&Child> = self
            .cache
            .children
            .items(&())
            .iter()
            .filter(|c| query.is_empty() || c.full_name().to_lowercase().contains(&query))
            .collect();

        children.sort_by(|a, b| {
            let ordering = match self.child_sort_column {
                ChildSortColumn::Name => a
                    .full_name()
                    .to_lowercase()
                    .cmp(&b.full_name().to_lowercase()),
                // Younger birth date means lower age
                ChildSortColumn::Age => b.date_of_birth.cmp(&a.date_of_birth),
                ChildSortColumn::Status => status_order(a.status).cmp(&status_order(b.status)),
            };
            if self.child_sort_ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        children
    }

    pub fn selected_child(&self) -> Option<&Child> {
        self.visible_children().get(self.children_selection).copied()
    }

    /// The child driving the progress tab panels
    pub fn progress_child_id(&self) -> Option<String> {
        self.cache
            .children
            .items(&())
            .get(self.progress_child_selection)
            .map(|c| c.id.clone())
    }

    /// Keep selection indices inside their collections after data changes
    pub fn clamp_selections(&mut self) {
        let visible = self.visible_children().len();
        self.children_selection = self.children_selection.min(visible.saturating_sub(1));

        let roster = self.cache.children.items(&()).len();
        self.attendance_selection = self.attendance_selection.min(roster.saturating_sub(1));
        self.progress_child_selection =
            self.progress_child_selection.min(roster.saturating_sub(1));

        if let Some(child_id) = self.progress_child_id() {
            let observations = self.cache.observations_by_child.items(&child_id).len();
            self.observation_selection =
                self.observation_selection.min(observations.saturating_sub(1));
        }

        let messages = self.cache.messages.items(&()).len();
        self.message_selection = self.message_selection.min(messages.saturating_sub(1));
        let announcements = self.cache.announcements.items(&()).len();
        self.announcement_selection =
            self.announcement_selection.min(announcements.saturating_sub(1));
    }

    /// Load the history panel for the attendance tab's selected child
    pub fn ensure_selected_attendance_history(&mut self) {
        let child_id = self
            .cache
            .children
            .items(&())
            .get(self.attendance_selection)
            .map(|c| c.id.clone());
        if let Some(id) = child_id {
            self.ensure_attendance_history(id);
        }
    }

    /// Load the observation and milestone panels for the progress tab's
    /// selected child
    pub fn ensure_progress_data(&mut self) {
        if let Some(child_id) = self.progress_child_id() {
            self.ensure_observations_for(child_id.clone());
            self.ensure_milestones_for(child_id);
        }
    }

    /// Step the observation feed's category filter through every
    /// category and back to unfiltered
    pub fn cycle_category_filter(&mut self) {
        self.progress_category_filter = match self.progress_category_filter {
            None => Some(ObservationCategory::ALL[0]),
            Some(current) => ObservationCategory::ALL
                .iter()
                .position(|c| *c == current)
                .and_then(|i| ObservationCategory::ALL.get(i + 1))
                .copied(),
        };
        self.observation_selection = 0;
    }

    /// Observations for the progress tab's selected child, newest first,
    /// narrowed by the category filter when one is set
    pub fn visible_observations(&self) -> Vec<&crate::models::Observation> {
        let Some(child_id) = self.progress_child_id() else {
            return Vec::new();
        };
        let mut observations: Vec<_> = self
            .cache
            .observations_by_child
            .items(&child_id)
            .iter()
            .filter(|o| {
                self.progress_category_filter
                    .map(|c| o.category == c)
                    .unwrap_or(true)
            })
            .collect();
        observations.sort_by(|a, b| b.date.cmp(&a.date));
        observations
    }

    /// The child shown in the roster detail panel. Prefers the child's
    /// own fetched record over the roster row, which may lag it
    pub fn detail_child(&self) -> Option<&Child> {
        let selected = self.selected_child()?;
        Some(self.cache.child.get(&selected.id).unwrap_or(selected))
    }

    /// The observation under the cursor in the filtered feed
    pub fn selected_observation(&self) -> Option<&crate::models::Observation> {
        self.visible_observations()
            .get(self.observation_selection)
            .copied()
    }

    /// Re-fetch the selected child's own record so the detail panel
    /// reflects edits made elsewhere, not just the cached roster row
    pub fn ensure_selected_child_record(&mut self) {
        if let Some(id) = self.selected_child().map(|c| c.id.clone()) {
            self.ensure_child(id);
        }
    }

    /// Mark the selected child for the displayed date in one keypress,
    /// keeping any times and notes already recorded that day
    pub fn quick_mark_attendance(&mut self, status: AttendanceStatus) {
        let Some(child_id) = self
            .cache
            .children
            .items(&())
            .get(self.attendance_selection)
            .map(|c| c.id.clone())
        else {
            return;
        };
        let day_records = self.cache.attendance_by_date.items(&self.attendance_date);
        let existing = day_records.iter().find(|r| r.child_id == child_id);
        let payload = AttendancePayload {
            child_id: child_id.clone(),
            date: self.attendance_date,
            status,
            arrival_time: existing.and_then(|r| r.arrival_time.clone()),
            pickup_time: existing.and_then(|r| r.pickup_time.clone()),
            notes: existing.and_then(|r| r.notes.clone()),
        };
        let mutation = attendance_mutation(day_records, &child_id, payload);
        self.run_mutation(mutation);
    }

    /// Step the attendance tab forward or back one day
    pub fn shift_attendance_date(&mut self, days: i64) {
        if let Some(date) = self
            .attendance_date
            .checked_add_signed(chrono::Duration::days(days))
        {
            self.attendance_date = date;
            self.ensure_attendance_for(date);
            self.ensure_attendance_month();
        }
    }

    // =========================================================================
    // Forms
    // =========================================================================

    pub fn open_register_child_form(&mut self) {
        self.form = Some(Form {
            kind: FormKind::RegisterChild,
            fields: child_form_fields(None),
            focus: 0,
            error: None,
        });
        self.state = AppState::EditingForm;
    }

    pub fn open_edit_child_form(&mut self) {
        let Some(child) = self.selected_child().cloned() else {
            return;
        };
        self.form = Some(Form {
            kind: FormKind::EditChild(child.id.clone()),
            fields: child_form_fields(Some(&child)),
            focus: 0,
            error: None,
        });
        self.state = AppState::EditingForm;
    }

    pub fn open_attendance_form(&mut self) {
        let roster = self.cache.children.items(&());
        let Some(child) = roster.get(self.attendance_selection) else {
            return;
        };
        let child_id = child.id.clone();
        let existing = self
            .cache
            .attendance_by_date
            .items(&self.attendance_date)
            .iter()
            .find(|r| r.child_id == child_id)
            .cloned();

        let status = existing
            .as_ref()
            .map(|r| r.status.to_string())
            .unwrap_or_else(|| "present".to_string());
        let arrival = existing
            .as_ref()
            .and_then(|r| r.arrival_time.clone())
            .unwrap_or_default();
        let pickup = existing
            .as_ref()
            .and_then(|r| r.pickup_time.clone())
            .unwrap_or_default();
        let notes = existing
            .as_ref()
            .and_then(|r| r.notes.clone())
            .unwrap_or_default();

        self.form = Some(Form {
            kind: FormKind::RecordAttendance {
                child_id,
                date: self.attendance_date,
            },
            fields: vec![
                FormField::with_value("Status (present/absent/not-scheduled)", status),
                FormField::with_value("Arrival (HH:MM)", arrival),
                FormField::with_value("Pickup (HH:MM)", pickup),
                FormField::with_value("Notes", notes),
            ],
            focus: 0,
            error: None,
        });
        self.state = AppState::EditingForm;
    }

    pub fn open_observation_form(&mut self) {
        let Some(child_id) = self.progress_child_id() else {
            return;
        };
        self.form = Some(Form {
            kind: FormKind::RecordObservation(child_id),
            fields: vec![
                FormField::new("Title"),
                FormField::with_value("Date (YYYY-MM-DD)", self.today.to_string()),
                FormField::new("Category (social/literacy/numeracy/physical/creative)"),
                FormField::new("Details"),
                FormField::new("Development area"),
                FormField::new("Next steps"),
            ],
            focus: 0,
            error: None,
        });
        self.state = AppState::EditingForm;
    }

    pub fn open_edit_observation_form(&mut self) {
        let Some(observation) = self.selected_observation().cloned() else {
            return;
        };
        self.form = Some(Form {
            kind: FormKind::EditObservation {
                id: observation.id,
                child_id: observation.child_id,
            },
            fields: vec![
                FormField::with_value("Title", observation.title),
                FormField::with_value("Date (YYYY-MM-DD)", observation.date.to_string()),
                FormField::with_value(
                    "Category (social/literacy/numeracy/physical/creative)",
                    observation.category.to_string().to_lowercase(),
                ),
                FormField::with_value("Details", observation.details),
                FormField::with_value(
                    "Development area",
                    observation.development_area.unwrap_or_default(),
                ),
                FormField::with_value("Next steps", observation.next_steps.unwrap_or_default()),
            ],
            focus: 0,
            error: None,
        });
        self.state = AppState::EditingForm;
    }

    pub fn open_reply_form(&mut self) {
        let messages = self.cache.messages.items(&());
        let Some(message) = messages.get(self.message_selection) else {
            return;
        };
        let subject = if message.subject.starts_with("Re: ") {
            message.subject.clone()
        } else {
            format!("Re: {}", message.subject)
        };
        self.form = Some(Form {
            kind: FormKind::ComposeMessage {
                recipient_id: message.sender.id.clone(),
                parent_id: Some(message.id.clone()),
            },
            fields: vec![
                FormField::with_value("Subject", subject),
                FormField::new("Message"),
            ],
            focus: 1,
            error: None,
        });
        self.state = AppState::EditingForm;
    }

    pub fn open_announcement_form(&mut self) {
        self.form = Some(Form {
            kind: FormKind::ComposeAnnouncement,
            fields: vec![
                FormField::new("Title"),
                FormField::new("Content"),
                FormField::with_value("Priority (high/normal/low)", "normal"),
                FormField::with_value("Recipients (all or child ids, comma separated)", "all"),
            ],
            focus: 0,
            error: None,
        });
        self.state = AppState::EditingForm;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    /// Validate and submit the open form. On a validation error the form
    /// stays open showing the problem; nothing is sent.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };

        let mutation = match build_mutation(
            &form,
            self.cache.attendance_by_date.items(
                &match &form.kind {
                    FormKind::RecordAttendance { date, .. } => *date,
                    _ => self.attendance_date,
                },
            ),
        ) {
            Ok(m) => m,
            Err(message) => {
                if let Some(ref mut open) = self.form {
                    open.error = Some(message);
                }
                return;
            }
        };

        self.close_form();
        self.run_mutation(mutation);
    }

    /// Ask to remove the roster's selected child
    pub fn request_delete_child(&mut self) {
        let target = self.selected_child().map(|c| DeleteTarget::Child {
            id: c.id.clone(),
            name: c.full_name(),
        });
        if target.is_some() {
            self.delete_target = target;
            self.state = AppState::ConfirmingDelete;
        }
    }

    /// Ask to remove the progress tab's selected observation
    pub fn request_delete_observation(&mut self) {
        let target = self.selected_observation().map(|o| DeleteTarget::Observation {
            id: o.id.clone(),
            title: o.title.clone(),
        });
        if target.is_some() {
            self.delete_target = target;
            self.state = AppState::ConfirmingDelete;
        }
    }

    /// Run the delete the confirmation overlay was opened for
    pub fn confirm_delete(&mut self) {
        if let Some(target) = self.delete_target.take() {
            self.run_mutation(delete_mutation(target));
        }
        self.state = AppState::Normal;
    }

    pub fn cancel_delete(&mut self) {
        self.delete_target = None;
        self.state = AppState::Normal;
    }
}

fn status_order(status: ChildStatus) -> u8 {
    match status {
        ChildStatus::New => 0,
        ChildStatus::Active => 1,
        ChildStatus::Leaving => 2,
    }
}

fn child_form_fields(child: Option<&Child>) -> Vec<FormField> {
    let value = |f: fn(&Child) -> String| child.map(f).unwrap_or_default();
    vec![
        FormField::with_value("First name", value(|c| c.first_name.clone())),
        FormField::with_value("Last name", value(|c| c.last_name.clone())),
        FormField::with_value(
            "Date of birth (YYYY-MM-DD)",
            value(|c| c.date_of_birth.to_string()),
        ),
        FormField::with_value("Status (new/active/leaving)", value(|c| c.status.to_string())),
        FormField::with_value("Guardian name", value(|c| c.guardian.name.clone())),
        FormField::with_value("Guardian email", value(|c| c.guardian.email.clone())),
        FormField::with_value("Guardian phone", value(|c| c.guardian.phone.clone())),
        FormField::with_value(
            "Guardian address",
            value(|c| c.guardian.address.clone().unwrap_or_default()),
        ),
        FormField::with_value(
            "Allergies (comma separated)",
            value(|c| c.medical.allergies.join(", ")),
        ),
        FormField::with_value(
            "Conditions (comma separated)",
            value(|c| c.medical.conditions.join(", ")),
        ),
        FormField::with_value(
            "Medical notes",
            value(|c| c.medical.notes.clone().unwrap_or_default()),
        ),
        FormField::with_value(
            "Emergency contact name",
            value(|c| {
                c.emergency_contacts
                    .first()
                    .map(|e| e.name.clone())
                    .unwrap_or_default()
            }),
        ),
        FormField::with_value(
            "Emergency contact phone",
            value(|c| {
                c.emergency_contacts
                    .first()
                    .map(|e| e.phone.clone())
                    .unwrap_or_default()
            }),
        ),
    ]
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_date(value: &str, label: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("{} must be YYYY-MM-DD", label))
}

fn parse_child_status(value: &str) -> Result<ChildStatus, String> {
    match value.trim().to_lowercase().as_str() {
        "new" => Ok(ChildStatus::New),
        "active" => Ok(ChildStatus::Active),
        "leaving" => Ok(ChildStatus::Leaving),
        other => Err(format!("Unknown status '{}'", other)),
    }
}

fn parse_attendance_status(value: &str) -> Result<AttendanceStatus, String> {
    match value.trim().to_lowercase().as_str() {
        "present" => Ok(AttendanceStatus::Present),
        "absent" => Ok(AttendanceStatus::Absent),
        "not-scheduled" => Ok(AttendanceStatus::NotScheduled),
        other => Err(format!("Unknown attendance status '{}'", other)),
    }
}

fn parse_category(value: &str) -> Result<ObservationCategory, String> {
    match value.trim().to_lowercase().as_str() {
        "social" => Ok(ObservationCategory::Social),
        "literacy" => Ok(ObservationCategory::Literacy),
        "numeracy" => Ok(ObservationCategory::Numeracy),
        "physical" => Ok(ObservationCategory::Physical),
        "creative" => Ok(ObservationCategory::Creative),
        other => Err(format!("Unknown category '{}'", other)),
    }
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    match value.trim().to_lowercase().as_str() {
        "high" => Ok(Priority::High),
        "normal" => Ok(Priority::Normal),
        "low" => Ok(Priority::Low),
        other => Err(format!("Unknown priority '{}'", other)),
    }
}

fn required(form: &Form, label: &str) -> Result<String, String> {
    let value = form.field_value(label).trim().to_string();
    if value.is_empty() {
        Err(format!("{} is required", label))
    } else {
        Ok(value)
    }
}

/// Decide whether an attendance save creates a new record or updates an
/// existing one: if the day's cached records already hold this child, the
/// save targets that record's id.
pub fn attendance_mutation(
    day_records: &[AttendanceRecord],
    child_id: &str,
    payload: AttendancePayload,
) -> Mutation {
    match day_records.iter().find(|r| r.child_id == child_id) {
        Some(existing) => Mutation::UpdateAttendance {
            id: existing.id.clone(),
            payload,
        },
        None => Mutation::MarkAttendance(payload),
    }
}

fn delete_mutation(target: DeleteTarget) -> Mutation {
    match target {
        DeleteTarget::Child { id, .. } => Mutation::DeleteChild { id },
        DeleteTarget::Observation { id, .. } => Mutation::DeleteObservation { id },
    }
}

fn observation_payload(form: &Form, child_id: &str) -> Result<ObservationPayload, String> {
    Ok(ObservationPayload {
        child_id: child_id.to_string(),
        title: required(form, "Title")?,
        date: parse_date(form.field_value("Date (YYYY-MM-DD)"), "Date")?,
        category: parse_category(
            form.field_value("Category (social/literacy/numeracy/physical/creative)"),
        )?,
        details: required(form, "Details")?,
        development_area: optional(form.field_value("Development area")),
        next_steps: optional(form.field_value("Next steps")),
    })
}

/// Turn a validated form into its mutation
fn build_mutation(form: &Form, day_records: &[AttendanceRecord]) -> Result<Mutation, String> {
    match &form.kind {
        FormKind::RegisterChild | FormKind::EditChild(_) => {
            let payload = ChildPayload {
                first_name: required(form, "First name")?,
                last_name: required(form, "Last name")?,
                date_of_birth: parse_date(
                    form.field_value("Date of birth (YYYY-MM-DD)"),
                    "Date of birth",
                )?,
                status: parse_child_status(form.field_value("Status (new/active/leaving)"))?,
                guardian: GuardianInfo {
                    name: required(form, "Guardian name")?,
                    email: required(form, "Guardian email")?,
                    phone: required(form, "Guardian phone")?,
                    address: optional(form.field_value("Guardian address")),
                },
                medical: MedicalInfo {
                    allergies: comma_list(form.field_value("Allergies (comma separated)")),
                    conditions: comma_list(form.field_value("Conditions (comma separated)")),
                    notes: optional(form.field_value("Medical notes")),
                },
                emergency_contacts: match (
                    optional(form.field_value("Emergency contact name")),
                    optional(form.field_value("Emergency contact phone")),
                ) {
                    (Some(name), Some(phone)) => vec![EmergencyContact { name, phone }],
                    (None, None) => vec![],
                    _ => return Err("Emergency contact needs both name and phone".to_string()),
                },
            };
            match &form.kind {
                FormKind::EditChild(id) => Ok(Mutation::UpdateChild {
                    id: id.clone(),
                    payload,
                }),
                _ => Ok(Mutation::CreateChild(payload)),
            }
        }
        FormKind::RecordAttendance { child_id, date } => {
            let payload = AttendancePayload {
                child_id: child_id.clone(),
                date: *date,
                status: parse_attendance_status(
                    form.field_value("Status (present/absent/not-scheduled)"),
                )?,
                arrival_time: optional(form.field_value("Arrival (HH:MM)")),
                pickup_time: optional(form.field_value("Pickup (HH:MM)")),
                notes: optional(form.field_value("Notes")),
            };
            Ok(attendance_mutation(day_records, child_id, payload))
        }
        FormKind::RecordObservation(child_id) => Ok(Mutation::CreateObservation(
            observation_payload(form, child_id)?,
        )),
        FormKind::EditObservation { id, child_id } => Ok(Mutation::UpdateObservation {
            id: id.clone(),
            payload: observation_payload(form, child_id)?,
        }),
        FormKind::ComposeMessage {
            recipient_id,
            parent_id,
        } => Ok(Mutation::SendMessage(MessagePayload {
            recipient_id: recipient_id.clone(),
            subject: required(form, "Subject")?,
            content: required(form, "Message")?,
            parent_id: parent_id.clone(),
        })),
        FormKind::ComposeAnnouncement => {
            let recipients_field =
                form.field_value("Recipients (all or child ids, comma separated)");
            let recipients = if recipients_field.trim().eq_ignore_ascii_case("all") {
                RecipientScope::All
            } else {
                let ids = comma_list(recipients_field);
                if ids.is_empty() {
                    return Err("Recipients must be 'all' or a list of child ids".to_string());
                }
                RecipientScope::Specific(ids)
            };
            Ok(Mutation::SendAnnouncement(AnnouncementPayload {
                title: required(form, "Title")?,
                content: required(form, "Content")?,
                priority: parse_priority(form.field_value("Priority (high/normal/low)"))?,
                recipients,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_record(id: &str, child_id: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: id.to_string(),
            child_id: child_id.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            status: AttendanceStatus::Present,
            arrival_time: Some("08:30".to_string()),
            pickup_time: None,
            notes: None,
        }
    }

    fn payload(child_id: &str) -> AttendancePayload {
        AttendancePayload {
            child_id: child_id.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            status: AttendanceStatus::Absent,
            arrival_time: None,
            pickup_time: None,
            notes: None,
        }
    }

    #[test]
    fn test_attendance_save_updates_existing_record() {
        let records = vec![day_record("att_1", "c1"), day_record("att_2", "c2")];
        let mutation = attendance_mutation(&records, "c2", payload("c2"));
        match mutation {
            Mutation::UpdateAttendance { id, .. } => assert_eq!(id, "att_2"),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_attendance_save_creates_when_unmarked() {
        let records = vec![day_record("att_1", "c1")];
        let mutation = attendance_mutation(&records, "c3", payload("c3"));
        assert!(matches!(mutation, Mutation::MarkAttendance(_)));
    }

    #[test]
    fn test_edit_observation_form_builds_update() {
        let form = Form {
            kind: FormKind::EditObservation {
                id: "obs_7".to_string(),
                child_id: "c1".to_string(),
            },
            fields: vec![
                FormField::with_value("Title", "Block tower"),
                FormField::with_value("Date (YYYY-MM-DD)", "2026-03-02"),
                FormField::with_value(
                    "Category (social/literacy/numeracy/physical/creative)",
                    "physical",
                ),
                FormField::with_value("Details", "Stacked twelve blocks unaided"),
                FormField::with_value("Development area", ""),
                FormField::with_value("Next steps", ""),
            ],
            focus: 0,
            error: None,
        };
        match build_mutation(&form, &[]).unwrap() {
            Mutation::UpdateObservation { id, payload } => {
                assert_eq!(id, "obs_7");
                assert_eq!(payload.child_id, "c1");
                assert_eq!(payload.category, ObservationCategory::Physical);
            }
            other => panic!("expected observation update, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_targets_map_to_their_mutations() {
        let child = DeleteTarget::Child {
            id: "c9".to_string(),
            name: "Maya Chen".to_string(),
        };
        assert!(matches!(
            delete_mutation(child),
            Mutation::DeleteChild { id } if id == "c9"
        ));

        let observation = DeleteTarget::Observation {
            id: "obs_3".to_string(),
            title: "Circle time".to_string(),
        };
        assert!(matches!(
            delete_mutation(observation),
            Mutation::DeleteObservation { id } if id == "obs_3"
        ));
    }

    #[test]
    fn test_tab_cycle() {
        let mut tab = Tab::Dashboard;
        for _ in 0..5 {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::Dashboard);
        assert_eq!(Tab::Dashboard.prev(), Tab::Messages);
    }

    #[test]
    fn test_child_form_rejects_bad_date() {
        let mut form = Form {
            kind: FormKind::RegisterChild,
            fields: child_form_fields(None),
            focus: 0,
            error: None,
        };
        for field in &mut form.fields {
            field.value = match field.label {
                "First name" => "Maya".to_string(),
                "Last name" => "Chen".to_string(),
                "Date of birth (YYYY-MM-DD)" => "02/03/2024".to_string(),
                "Status (new/active/leaving)" => "active".to_string(),
                "Guardian name" => "Li Chen".to_string(),
                "Guardian email" => "li@example.com".to_string(),
                "Guardian phone" => "5551234567".to_string(),
                _ => field.value.clone(),
            };
        }
        let err = build_mutation(&form, &[]).unwrap_err();
        assert!(err.contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_announcement_form_recipient_scope() {
        let mut form = Form {
            kind: FormKind::ComposeAnnouncement,
            fields: vec![
                FormField::with_value("Title", "Closure"),
                FormField::with_value("Content", "Closed Friday"),
                FormField::with_value("Priority (high/normal/low)", "high"),
                FormField::with_value(
                    "Recipients (all or child ids, comma separated)",
                    "c1, c2",
                ),
            ],
            focus: 0,
            error: None,
        };
        match build_mutation(&form, &[]).unwrap() {
            Mutation::SendAnnouncement(p) => {
                assert_eq!(p.priority, Priority::High);
                assert_eq!(
                    p.recipients,
                    RecipientScope::Specific(vec!["c1".to_string(), "c2".to_string()])
                );
            }
            other => panic!("expected announcement, got {:?}", other),
        }

        form.fields[3].value = "  ".to_string();
        assert!(build_mutation(&form, &[]).is_err());
    }
}
