//! Request and response envelopes exchanged with the desktop backend.
//!
//! A single round-trip carries one [`MsgSetRequest`] holding any number of
//! queries, and returns one [`MsgSetResponse`] with a response per query in
//! the same order.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ret::{BillRet, TermsRet, VendorRet};

/// A qbXML version such as `13.0`, split into its two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SdkVersion {
    pub major: u16,
    pub minor: u16,
}

impl SdkVersion {
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl PartialOrd for SdkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SdkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError(pub String);

impl fmt::Display for ParseVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid qbXML version string : {}", self.0)
    }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for SdkVersion {
    type Err = ParseVersionError;

    /// Accepts `"13"`, `"13.0"` and `"2.1"`. Anything after the first dot is
    /// the minor component.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseVersionError(s.to_string());
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        let major = major.parse().map_err(|_| err())?;
        let minor = if minor.is_empty() {
            0
        } else {
            minor.parse().map_err(|_| err())?
        };
        Ok(Self { major, minor })
    }
}

/// What the backend should do with the remaining queries of a set when one
/// of them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OnError {
    #[default]
    Stop,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IteratorMode {
    Start,
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActiveStatus {
    #[default]
    ActiveOnly,
    InactiveOnly,
    All,
}

impl ActiveStatus {
    #[must_use]
    pub fn admits(self, is_active: Option<bool>) -> bool {
        // The backend treats a missing IsActive flag as active
        let active = is_active.unwrap_or(true);
        match self {
            ActiveStatus::ActiveOnly => active,
            ActiveStatus::InactiveOnly => !active,
            ActiveStatus::All => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BillQuery {
    pub include_line_items: bool,
    pub from_txn_date: Option<NaiveDate>,
    pub max_returned: Option<usize>,
    pub iterator: Option<IteratorMode>,
    #[serde(rename = "IteratorID")]
    pub iterator_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListQuery {
    pub active_status: ActiveStatus,
    pub include_ret_element: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryRequest {
    #[serde(rename = "BillQueryRq")]
    Bill(BillQuery),
    #[serde(rename = "VendorQueryRq")]
    Vendor(ListQuery),
    #[serde(rename = "TermsQueryRq")]
    Terms(ListQuery),
}

impl QueryRequest {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            QueryRequest::Bill(_) => "BillQueryRq",
            QueryRequest::Vendor(_) => "VendorQueryRq",
            QueryRequest::Terms(_) => "TermsQueryRq",
        }
    }
}

/// The request half of a round-trip, scoped to the negotiated version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MsgSetRequest {
    pub country: String,
    pub version: SdkVersion,
    pub on_error: OnError,
    pub requests: Vec<QueryRequest>,
}

impl MsgSetRequest {
    #[must_use]
    pub fn new(country: impl Into<String>, version: SdkVersion) -> Self {
        Self {
            country: country.into(),
            version,
            on_error: OnError::Stop,
            requests: Vec::new(),
        }
    }

    pub fn append(&mut self, request: QueryRequest) -> &mut Self {
        self.requests.push(request);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Typed payload of a single response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseDetail {
    #[serde(rename = "BillRet")]
    Bills(Vec<BillRet>),
    #[serde(rename = "VendorRet")]
    Vendors(Vec<VendorRet>),
    #[serde(rename = "TermsRet")]
    Terms(Vec<TermsRet>),
}

impl ResponseDetail {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ResponseDetail::Bills(_) => "BillRet",
            ResponseDetail::Vendors(_) => "VendorRet",
            ResponseDetail::Terms(_) => "TermsRet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    pub request_id: Option<String>,
    pub status_code: i64,
    pub status_severity: String,
    pub status_message: String,
    #[serde(rename = "iteratorID")]
    pub iterator_id: Option<String>,
    pub iterator_remaining_count: Option<i64>,
    pub detail: Option<ResponseDetail>,
}

impl Response {
    /// A status-0 response carrying `detail`.
    #[must_use]
    pub fn ok(detail: ResponseDetail) -> Self {
        Self {
            status_severity: "Info".into(),
            status_message: "Status OK".into(),
            detail: Some(detail),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        Severity::parse(&self.status_severity)
    }
}

/// The response half of a round-trip.
///
/// `response_list` is `None` when the backend handed back no list at all, and
/// a slot is `None` when the list is shorter than it claims.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MsgSetResponse {
    pub response_list: Option<Vec<Option<Response>>>,
}

impl MsgSetResponse {
    #[must_use]
    pub fn new(responses: Vec<Response>) -> Self {
        Self {
            response_list: Some(responses.into_iter().map(Some).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Unknown(String),
}

impl Severity {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INFO" => Severity::Info,
            "WARN" | "WARNING" => Severity::Warning,
            "ERROR" => Severity::Error,
            _ => Severity::Unknown(raw.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_parsing() {
        assert_eq!("13.0".parse(), Ok(SdkVersion::new(13, 0)));
        assert_eq!("2.1".parse(), Ok(SdkVersion::new(2, 1)));
        assert_eq!("8".parse(), Ok(SdkVersion::new(8, 0)));
        assert_eq!(" 16.0 ".parse(), Ok(SdkVersion::new(16, 0)));
        assert!("CA3.0".parse::<SdkVersion>().is_err());
        assert!("".parse::<SdkVersion>().is_err());
    }

    #[test]
    fn version_ordering_is_numeric() {
        let max = ["1.0", "13.0", "2.1", "13.1", "7.0"]
            .iter()
            .map(|v| v.parse::<SdkVersion>().unwrap())
            .max();
        assert_eq!(max, Some(SdkVersion::new(13, 1)));
        assert!(SdkVersion::new(2, 10) > SdkVersion::new(2, 9));
    }

    #[test]
    fn severity_is_case_insensitive() {
        assert_eq!(Severity::parse("info"), Severity::Info);
        assert_eq!(Severity::parse("Warn"), Severity::Warning);
        assert_eq!(Severity::parse("ERROR"), Severity::Error);
        assert_eq!(
            Severity::parse("Fatal"),
            Severity::Unknown("Fatal".to_string())
        );
    }

    #[test]
    fn active_status_filter() {
        assert!(ActiveStatus::ActiveOnly.admits(None));
        assert!(!ActiveStatus::ActiveOnly.admits(Some(false)));
        assert!(ActiveStatus::InactiveOnly.admits(Some(false)));
        assert!(ActiveStatus::All.admits(Some(false)));
    }

    #[test]
    fn test_response_deserialize() {
        let s = r#"{
  "ResponseList": [
    {
      "statusCode": 0,
      "statusSeverity": "Info",
      "statusMessage": "Status OK",
      "iteratorID": "{a5ba4a1e-7a3e-4f3a-9e0e-0d5a1fbd37a4}",
      "iteratorRemainingCount": 12,
      "detail": { "BillRet": [ { "TxnID": "1A2-1234567890", "RefNumber": "4471" } ] }
    },
    null
  ]
}"#;
        let resp: MsgSetResponse = serde_json::from_str(s).unwrap();
        let list = resp.response_list.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[1].is_none());
        let first = list[0].as_ref().unwrap();
        assert_eq!(first.iterator_remaining_count, Some(12));
        match &first.detail {
            Some(ResponseDetail::Bills(bills)) => {
                assert_eq!(bills[0].ref_number.as_deref(), Some("4471"));
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }
}
