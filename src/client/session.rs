//! Connection and session lifecycle against the desktop backend.
//!
//! ```text
//! Uninitialized -> ConnectionOpen -> SessionOpen -> (execute)* -> SessionClosed -> ConnectionClosed
//! ```
//!
//! A session is never started without an open connection, a request set is
//! never created without a started session, and closing the connection ends
//! the session first. Dropping the manager releases both.

use qbd_types::{MsgSetRequest, MsgSetResponse, Response, SdkVersion, Severity};

use super::transport::{ConnectionType, OpenMode, QBTransport};
use crate::{
    error::{APIError, APIResult, ConnectError},
    status::{ResultCode, Status},
    AppIdentity, Edition,
};

pub struct SessionManager<T: QBTransport> {
    transport: T,
    identity: AppIdentity,
    connection_type: ConnectionType,
    edition: Edition,
    open_mode: OpenMode,
    company_file: String,
    version: Option<SdkVersion>,
    connection_open: bool,
    session_started: bool,
    last_response: Option<MsgSetResponse>,
}

impl<T: QBTransport> SessionManager<T> {
    pub fn new(transport: T, identity: AppIdentity) -> Self {
        Self {
            transport,
            identity,
            connection_type: ConnectionType::default(),
            edition: Edition::default(),
            open_mode: OpenMode::default(),
            company_file: String::new(),
            version: None,
            connection_open: false,
            session_started: false,
            last_response: None,
        }
    }

    #[must_use]
    pub fn with_connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    #[must_use]
    pub fn edition(&self) -> Edition {
        self.edition
    }

    /// Fails with [`APIError::EditionLocked`] when a connection is open and
    /// the edition would change.
    pub fn set_edition(&mut self, edition: Edition) -> APIResult<()> {
        if self.connection_open && self.edition != edition {
            log::error!("SessionManager.set_edition : edition cannot change while connected");
            return Err(APIError::EditionLocked);
        }
        self.edition = edition;
        Ok(())
    }

    /// The qbXML version negotiated for the current connection.
    #[must_use]
    pub fn sdk_version(&self) -> Option<SdkVersion> {
        self.version
    }

    #[must_use]
    pub fn is_connection_open(&self) -> bool {
        self.connection_open
    }

    #[must_use]
    pub fn is_session_started(&self) -> bool {
        self.session_started
    }

    #[must_use]
    pub fn company_file(&self) -> &str {
        &self.company_file
    }

    /// (Re)opens the connection and negotiates the qbXML version for it.
    pub fn open_connection(&mut self) -> APIResult<()> {
        self.close_connection()?;

        self.transport
            .open_connection(
                &self.identity.app_id,
                &self.identity.app_name,
                self.connection_type,
            )
            .inspect_err(|e| log::error!("SessionManager.open_connection : {e}"))?;
        self.last_response = None;
        self.session_started = false;
        self.connection_open = true;

        match self.negotiate_version() {
            Ok(version) => {
                log::info!("Negotiated qbXML version {version}");
                self.version = Some(version);
                Ok(())
            }
            Err(e) => {
                log::error!("SessionManager.open_connection : {e}");
                self.close_connection()?;
                Err(e)
            }
        }
    }

    /// Ends any session, then closes the connection. Safe to repeat.
    pub fn close_connection(&mut self) -> APIResult<()> {
        self.end_session()?;
        if self.connection_open {
            self.connection_open = false;
            self.last_response = None;
            self.version = None;
            self.transport
                .close_connection()
                .inspect_err(|e| log::error!("SessionManager.close_connection : {e}"))?;
        }
        Ok(())
    }

    /// Starts a session on `company_file`, or on the last used file when
    /// `None`. A session already open on the same file is left alone.
    pub fn begin_session(&mut self, company_file: Option<&str>, mode: OpenMode) -> APIResult<()> {
        if let Some(file) = company_file {
            if file != self.company_file {
                self.end_session()?;
                self.company_file = file.to_string();
            }
        }

        if !self.connection_open {
            self.open_connection()?;
        }

        if !self.session_started {
            self.transport
                .begin_session(&self.company_file, mode)
                .inspect_err(|e| log::error!("SessionManager.begin_session : {e}"))?;
            self.last_response = None;
            self.open_mode = mode;
            self.session_started = true;
            log::info!("Began session on {:?}", self.company_file);
        }
        Ok(())
    }

    /// Idempotent.
    pub fn end_session(&mut self) -> APIResult<()> {
        if self.session_started {
            self.session_started = false;
            self.last_response = None;
            self.transport
                .end_session()
                .inspect_err(|e| log::error!("SessionManager.end_session : {e}"))?;
        }
        Ok(())
    }

    /// Opens the connection and session, translating failures into a
    /// [`Status`] the user can read.
    pub fn connect(&mut self, company_file: Option<&str>, mode: OpenMode) -> Status {
        match self.begin_session(company_file, mode) {
            Ok(()) => Status::new(
                "Connected to Quickbooks Successfully.",
                ResultCode::ConnectOK,
                0,
            ),
            Err(APIError::Transport(e)) => {
                log::info!("Connect : {e}");
                ConnectError::from(e).into()
            }
            Err(APIError::Connect(e)) => e.into(),
            Err(e) => {
                log::info!("Connect : {e}");
                Status::new(e.to_string(), ResultCode::NoConnection, 0)
            }
        }
    }

    pub fn disconnect(&mut self) -> APIResult<()> {
        self.close_connection()
    }

    /// Allocates an empty request set, starting the session if needed.
    pub fn create_request(&mut self) -> APIResult<MsgSetRequest> {
        let mode = self.open_mode;
        if let Err(e) = self.begin_session(None, mode) {
            log::error!("SessionManager.create_request : {e}");
            return Err(APIError::NoSession);
        }
        let version = self.version.ok_or(APIError::NoConnection)?;
        Ok(MsgSetRequest::new(self.edition.code(), version))
    }

    /// Runs the request set and classifies every response in it.
    ///
    /// Returns `true` when at least one response carries ERROR or an
    /// unrecognized severity. The response set is kept for
    /// [`SessionManager::response`] either way.
    pub fn execute(&mut self, request: &MsgSetRequest) -> APIResult<bool> {
        if !self.session_started {
            return Err(APIError::NoSession);
        }
        log::debug!("Request set : {request:?}");

        self.last_response = None;
        let response = self
            .transport
            .do_requests(request)
            .inspect_err(|e| log::error!("SessionManager.execute : {e}"))?;
        log::debug!("Response set : {response:?}");

        let response = self.last_response.insert(response);
        check_response_status(request, response)
    }

    pub fn response_count(&self) -> APIResult<usize> {
        let response = self.last_response.as_ref().ok_or(APIError::NoResponse)?;
        let list = response
            .response_list
            .as_ref()
            .ok_or(APIError::NullResponseList)?;
        Ok(list.len())
    }

    pub fn response(&self, index: usize) -> APIResult<&Response> {
        let count = self.response_count()?;
        if index >= count {
            log::error!("SessionManager.response : requested index {index} of {count}");
            return Err(APIError::IndexOutOfRange { index, count });
        }
        self.last_response
            .as_ref()
            .and_then(|r| r.response_list.as_ref())
            .and_then(|list| list[index].as_ref())
            .ok_or(APIError::MissingResponse(index))
    }

    /// Iterator handle of the first response of the last executed set.
    pub fn iterator_id(&self) -> APIResult<Option<&str>> {
        Ok(self.response(0)?.iterator_id.as_deref())
    }

    /// Rows still held by the backend iterator after the last executed set.
    pub fn iterator_remaining_count(&self) -> APIResult<i64> {
        Ok(self.response(0)?.iterator_remaining_count.unwrap_or(0))
    }

    fn negotiate_version(&mut self) -> APIResult<SdkVersion> {
        let supported = self.transport.supported_versions()?;
        log::debug!("Backend supports qbXML versions {supported:?}");

        let mut best: Option<SdkVersion> = None;
        let mut first_error = None;
        for raw in &supported {
            match raw.parse::<SdkVersion>() {
                Ok(v) => best = best.max(Some(v)),
                Err(e) => {
                    log::warn!("Ignoring {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match (best, first_error) {
            (Some(v), _) => Ok(v),
            (None, Some(e)) => Err(e.into()),
            (None, None) => Err(APIError::NoSupportedVersions),
        }
    }
}

impl<T: QBTransport> Drop for SessionManager<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close_connection() {
            log::error!("SessionManager.drop : {e}");
        }
    }
}

/// OK responses are skipped, INFO and WARNING only logged, ERROR and any
/// unrecognized severity flag the set as failed. A hole in the list is a
/// protocol violation.
fn check_response_status(request: &MsgSetRequest, response: &MsgSetResponse) -> APIResult<bool> {
    let list = response.response_list.as_ref().ok_or_else(|| {
        log::error!("SessionManager.check_response_status : null response list");
        APIError::NullResponseList
    })?;
    log::debug!("Number of responses in the set: {}", list.len());

    let mut error_detected = false;
    for (i, slot) in list.iter().enumerate() {
        let Some(resp) = slot else {
            log::error!(
                "SessionManager.check_response_status : unable to find response index {i} of {}",
                list.len()
            );
            return Err(APIError::MissingResponse(i));
        };
        if resp.status_code == 0 {
            continue;
        }

        let request_name = request.requests.get(i).map_or("?", |r| r.name());
        match resp.severity() {
            Severity::Info => {
                log::debug!("Info for index {i} ({request_name}) : {}", resp.status_message);
            }
            Severity::Warning => {
                log::debug!("Request set : {request:?}");
                log::info!(
                    "Warning detected for index: {i} ({request_name})\n\tCode: {}\n\tMessage: {}",
                    resp.status_code,
                    resp.status_message
                );
            }
            Severity::Error => {
                error_detected = true;
                log::info!("Request set : {request:?}");
                log::error!(
                    "Error detected for index: {i} ({request_name})\n\tCode: {}\n\tMessage: {}",
                    resp.status_code,
                    resp.status_message
                );
            }
            Severity::Unknown(severity) => {
                error_detected = true;
                log::error!("Request set : {request:?}");
                log::error!(
                    "Unknown StatusSeverity, {severity} for index: {i} ({request_name})\n\tCode: {}\n\tMessage: {}",
                    resp.status_code,
                    resp.status_message
                );
            }
        }
    }
    Ok(error_detected)
}
