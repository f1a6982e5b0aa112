//! Authentication module for managing the user session and credentials.
//!
//! This module provides:
//! - `Session`: the persisted bearer token + user profile snapshot
//! - `CredentialStore`: secure OS-level credential storage via keyring
//!
//! The session is the only authority the client holds: it is written on
//! login, cleared on logout, and cleared again whenever the API answers
//! 401 (the server is the judge of token validity, not the client).

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData, User};
