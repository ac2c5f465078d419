use qbd_types::{MsgSetRequest, MsgSetResponse};

use crate::error::TransportError;

/// How the company file is opened for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    SingleUser,
    #[default]
    MultiUser,
    DoNotCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionType {
    #[default]
    LocalQBD,
    LocalQBDLaunchUI,
    RemoteQBD,
}

/// The native message-passing bridge to a running QuickBooks instance.
///
/// Every call blocks until the backend answers. Implementors are not expected
/// to be safe for concurrent use; the session manager serializes all calls.
pub trait QBTransport: Send {
    fn open_connection(
        &mut self,
        app_id: &str,
        app_name: &str,
        connection_type: ConnectionType,
    ) -> Result<(), TransportError>;

    fn close_connection(&mut self) -> Result<(), TransportError>;

    /// An empty `company_file` means whichever file QuickBooks has open.
    fn begin_session(&mut self, company_file: &str, mode: OpenMode)
        -> Result<(), TransportError>;

    fn end_session(&mut self) -> Result<(), TransportError>;

    /// Every qbXML version string the backend accepts, e.g. `["1.0", "13.0"]`.
    fn supported_versions(&mut self) -> Result<Vec<String>, TransportError>;

    fn do_requests(&mut self, request: &MsgSetRequest) -> Result<MsgSetResponse, TransportError>;
}
