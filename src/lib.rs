/*
 * A rust library for pulling accounts-payable bills out of a QuickBooks
 * Desktop company file.
 *
 * The backend is reached through a native message-set bridge (see
 * `client::QBTransport`); one session is opened per process and every query
 * is paged through the backend's iterator protocol.
 */
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod functions;
pub mod status;

pub use client::{QBConnector, SessionManager};
pub use error::{APIError, APIResult};
pub use status::{ResultCode, Status};

pub mod types {
    pub use qbd_types::*;
}

/// Regional edition of QuickBooks the request sets are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Edition {
    #[default]
    US,
    CA,
    UK,
}

impl Edition {
    #[inline]
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Edition::US => "US",
            Edition::CA => "CA",
            Edition::UK => "UK",
        }
    }
}

/// Identifies this integration to QuickBooks when a connection is opened.
/// QuickBooks shows the name in its authorization prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub app_id: String,
    pub app_name: String,
}

impl AppIdentity {
    pub const DEFAULT_APP_NAME: &'static str = "QBD Bill Export";

    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
        }
    }

    /// Reads the identity from the environment
    ///
    /// Environment variables:
    /// - `QBD_APP_ID` (default empty)
    /// - `QBD_APP_NAME` (default `QBD Bill Export`)
    #[must_use]
    pub fn from_env() -> Self {
        let app_id = std::env::var("QBD_APP_ID").unwrap_or_default();
        let app_name = std::env::var("QBD_APP_NAME")
            .ok()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_APP_NAME.to_string());
        Self::new(app_id, app_name)
    }
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self::new("", Self::DEFAULT_APP_NAME)
    }
}
