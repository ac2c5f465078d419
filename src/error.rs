use thiserror::Error;

/// A failure reported by the transport itself, carrying the native `HRESULT`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (0x{code:08X})")]
pub struct TransportError {
    pub code: u32,
    pub message: String,
}

impl TransportError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Known reasons a connection or session could not be opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Quickbooks is currently open in Single User Mode.  Either close the company file, or re-open it in multi-user mode.")]
    SingleUserModeElsewhere,
    #[error("There is a window open in Quickbooks preventing the connector from accessing it.  Please close the window or the company in Quickbooks.")]
    BlockingDialog,
    #[error("Quickbooks denied access to the company file.  Open the company file as admin and authorize this application.")]
    AccessDenied,
    #[error("{message}")]
    Unrecognized { code: u32, message: String },
}

impl ConnectError {
    pub const SINGLE_USER_MODE_ELSEWHERE: u32 = 0x8004_0410;
    pub const BLOCKING_DIALOG: u32 = 0x8004_0414;
    pub const ACCESS_DENIED: u32 = 0x8004_041B;
}

impl From<TransportError> for ConnectError {
    fn from(value: TransportError) -> Self {
        match value.code {
            Self::SINGLE_USER_MODE_ELSEWHERE => Self::SingleUserModeElsewhere,
            Self::BLOCKING_DIALOG => Self::BlockingDialog,
            Self::ACCESS_DENIED => Self::AccessDenied,
            code => Self::Unrecognized {
                code,
                message: value.message,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum APIError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("Transport error : {0}")]
    Transport(#[from] TransportError),
    #[error("No connection to Quickbooks is open")]
    NoConnection,
    #[error("Unable to start a Quickbooks session")]
    NoSession,
    #[error("No request has been executed yet")]
    NoResponse,
    #[error("The response list was null")]
    NullResponseList,
    #[error("No response object was found for index: {0}")]
    MissingResponse(usize),
    #[error("You are requesting an object that does not exist: {index} (of {count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("Query failed : {0}")]
    QueryFailed(&'static str),
    #[error("Expected {expected} in response, got {got}")]
    UnexpectedResponse {
        expected: &'static str,
        got: &'static str,
    },
    #[error("Quickbooks reported no supported qbXML versions")]
    NoSupportedVersions,
    #[error(transparent)]
    InvalidVersion(#[from] qbd_types::msgset::ParseVersionError),
    #[error("The Edition cannot be changed if a connection is present")]
    EditionLocked,
    #[error("Company file {0} does not exist")]
    CompanyFile(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("IO error : {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error : {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error : {0}")]
    Json(#[from] serde_json::Error),
    #[error("Worker task failed : {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type APIResult<T> = Result<T, APIError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_codes_map_to_friendly_conditions() {
        let err = ConnectError::from(TransportError::new(0x8004_0410, "raw"));
        assert_eq!(err, ConnectError::SingleUserModeElsewhere);
        assert!(err.to_string().contains("Single User Mode"));

        let err = ConnectError::from(TransportError::new(0x8004_0414, "raw"));
        assert_eq!(err, ConnectError::BlockingDialog);

        let err = ConnectError::from(TransportError::new(0x8004_041B, "raw"));
        assert_eq!(err, ConnectError::AccessDenied);
    }

    #[test]
    fn unknown_codes_keep_vendor_message() {
        let err = ConnectError::from(TransportError::new(
            0x8004_0408,
            "Could not start QuickBooks.",
        ));
        assert_eq!(err.to_string(), "Could not start QuickBooks.");
        assert!(matches!(
            err,
            ConnectError::Unrecognized {
                code: 0x8004_0408,
                ..
            }
        ));
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::new(0x8004_0410, "busy");
        assert_eq!(err.to_string(), "busy (0x80040410)");
    }
}
