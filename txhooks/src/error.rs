// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for txhooks

use thiserror::Error;

use crate::hooks::HookPhase;

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for txhooks operations
///
/// `Clone` because the same failure is handed to every after-rollback hook
/// before being returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The unit of work itself failed
    #[error("{0}")]
    Callback(String),

    /// A registered lifecycle hook failed
    #[error("{phase} hook failed: {message}")]
    Hook { phase: HookPhase, message: String },

    /// The underlying driver failed to begin, commit or roll back
    #[error("Driver error: {0}")]
    Driver(String),

    /// A hook was registered after its phase stopped accepting hooks
    #[error("Cannot register {phase} hook: registration is closed")]
    RegistrationClosed { phase: HookPhase },

    /// Invalid coordinator configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Failure of the unit of work
    pub fn callback(message: impl Into<String>) -> Self {
        Error::Callback(message.into())
    }

    /// Failure of a hook running in `phase`
    pub fn hook(phase: HookPhase, message: impl Into<String>) -> Self {
        Error::Hook {
            phase,
            message: message.into(),
        }
    }

    /// Failure reported by the driver
    pub fn driver(message: impl Into<String>) -> Self {
        Error::Driver(message.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Callback(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Callback(s.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
