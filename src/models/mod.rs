//! Data models for nursery entities.
//!
//! This module contains all the data structures returned by the nursery
//! management API:
//!
//! - `Child`: roster entries with guardian, medical, and emergency contacts
//! - `AttendanceRecord`: one per (child, date), with arrival/pickup times
//! - `Observation`, `Milestone`: developmental progress tracking
//! - `Message`, `Announcement`: parent communication
//!
//! Enumerated fields (status, category, priority) are real Rust enums, so
//! unexpected wire values are rejected when a response is parsed rather
//! than leaking into the view layer.

pub mod attendance;
pub mod child;
pub mod message;
pub mod observation;

pub use attendance::{AttendancePayload, AttendanceRecord, AttendanceStatus};
pub use child::{
    Child, ChildPayload, ChildSortColumn, ChildStatus, EmergencyContact, GuardianInfo, MedicalInfo,
};
pub use message::{
    Announcement, AnnouncementPayload, Message, MessagePayload, Priority, RecipientScope,
};
pub use observation::{Milestone, Observation, ObservationCategory, ObservationPayload};
