//! Core types shared by every jv pipeline.
//!
//! [`error`] defines [`JvError`], the failure classes the CLI reports on, and the
//! phase wrappers that tell a user which step of an install or update failed.

pub mod error;

pub use error::{
    ErrorClass, ErrorContext, InstallPhase, JvError, UpdatePhase, user_friendly_error,
};
