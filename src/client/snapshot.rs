//! A backend served from a JSON export of a company file.
//!
//! The export is loaded when a session begins and answers bill, vendor and
//! terms queries the way a live QuickBooks instance does, iterator handles and
//! remaining counts included.

use std::collections::{HashMap, VecDeque};

use qbd_types::{
    BillQuery, BillRet, IteratorMode, ListQuery, MsgSetRequest, MsgSetResponse, OnError,
    QueryRequest, Response, ResponseDetail, TermsRet, VendorRet,
};
use serde::{Deserialize, Serialize};

use super::transport::{ConnectionType, OpenMode, QBTransport};
use crate::error::TransportError;

const DEFAULT_VERSIONS: &[&str] = &["1.0", "2.0", "3.0", "7.0", "10.0", "13.0"];

const E_NOT_CONNECTED: u32 = 0x8004_0401;
const E_NO_SESSION: u32 = 0x8004_0402;
const E_FILE_OPEN: u32 = 0x8004_040A;

const NO_MATCH: i64 = 1;
const BAD_ITERATOR: i64 = 3120;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CompanySnapshot {
    pub versions: Vec<String>,
    pub bills: Vec<BillRet>,
    pub vendors: Vec<VendorRet>,
    pub terms: Vec<TermsRet>,
}

#[derive(Debug, Default)]
pub struct SnapshotTransport {
    preloaded: Option<CompanySnapshot>,
    company: Option<CompanySnapshot>,
    connected: bool,
    iterators: HashMap<String, VecDeque<BillRet>>,
    next_iterator: u64,
}

impl SnapshotTransport {
    /// Loads the company file named by each `begin_session` call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `snapshot` regardless of the company file requested.
    #[must_use]
    pub fn from_snapshot(snapshot: CompanySnapshot) -> Self {
        Self {
            preloaded: Some(snapshot),
            ..Self::default()
        }
    }

    fn load(company_file: &str) -> Result<CompanySnapshot, TransportError> {
        let raw = std::fs::read_to_string(company_file).map_err(|e| {
            TransportError::new(
                E_FILE_OPEN,
                format!("Could not open company file {company_file} : {e}"),
            )
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            TransportError::new(
                E_FILE_OPEN,
                format!("Company file {company_file} is not a valid export : {e}"),
            )
        })
    }

    fn bill_query(&mut self, company: &CompanySnapshot, query: &BillQuery) -> Response {
        let limit = query.max_returned.unwrap_or(usize::MAX);
        match query.iterator {
            Some(IteratorMode::Continue) => {
                let id = query.iterator_id.clone().unwrap_or_default();
                let Some(queue) = self.iterators.get_mut(&id) else {
                    return Response {
                        status_code: BAD_ITERATOR,
                        status_severity: "Error".into(),
                        status_message: format!("The iterator {id} is not valid"),
                        ..Default::default()
                    };
                };
                let page: Vec<BillRet> = queue.drain(..limit.min(queue.len())).collect();
                let remaining = queue.len();
                if remaining == 0 {
                    self.iterators.remove(&id);
                }
                bill_response(page, Some(id), Some(remaining))
            }
            Some(IteratorMode::Stop) => {
                if let Some(id) = &query.iterator_id {
                    self.iterators.remove(id);
                }
                bill_response(Vec::new(), query.iterator_id.clone(), Some(0))
            }
            Some(IteratorMode::Start) => {
                let mut matching: VecDeque<BillRet> = matching_bills(company, query).collect();
                let page: Vec<BillRet> = matching.drain(..limit.min(matching.len())).collect();
                let remaining = matching.len();

                self.next_iterator += 1;
                let id = format!("{{snapshot-iterator-{}}}", self.next_iterator);
                if remaining > 0 {
                    self.iterators.insert(id.clone(), matching);
                }
                bill_response(page, Some(id), Some(remaining))
            }
            None => {
                let page = matching_bills(company, query).take(limit).collect();
                bill_response(page, None, None)
            }
        }
    }
}

fn matching_bills<'a>(
    company: &'a CompanySnapshot,
    query: &'a BillQuery,
) -> impl Iterator<Item = BillRet> + 'a {
    company
        .bills
        .iter()
        .filter(move |b| match (query.from_txn_date, b.txn_date) {
            (Some(from), Some(date)) => date >= from,
            (Some(_), None) => false,
            (None, _) => true,
        })
        .map(move |b| {
            let mut bill = b.clone();
            if !query.include_line_items {
                bill.item_line_ret.clear();
                bill.expense_line_ret.clear();
            }
            bill
        })
}

fn bill_response(page: Vec<BillRet>, iterator_id: Option<String>, remaining: Option<usize>) -> Response {
    let remaining = remaining.map(|r| i64::try_from(r).unwrap_or(i64::MAX));
    if page.is_empty() {
        Response {
            status_code: NO_MATCH,
            status_severity: "Info".into(),
            status_message: "A query request did not find a matching object in QuickBooks".into(),
            iterator_id,
            iterator_remaining_count: remaining,
            detail: None,
            ..Default::default()
        }
    } else {
        Response {
            iterator_id,
            iterator_remaining_count: remaining,
            ..Response::ok(ResponseDetail::Bills(page))
        }
    }
}

fn list_response<T, F>(items: &[T], query: &ListQuery, is_active: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<bool>,
{
    items
        .iter()
        .filter(|i| query.active_status.admits(is_active(*i)))
        .cloned()
        .collect()
}

impl QBTransport for SnapshotTransport {
    fn open_connection(
        &mut self,
        app_id: &str,
        app_name: &str,
        _connection_type: ConnectionType,
    ) -> Result<(), TransportError> {
        log::debug!("Snapshot connection opened for {app_name} ({app_id})");
        self.connected = true;
        Ok(())
    }

    fn close_connection(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        self.company = None;
        self.iterators.clear();
        Ok(())
    }

    fn begin_session(&mut self, company_file: &str, _mode: OpenMode) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::new(E_NOT_CONNECTED, "No connection is open"));
        }
        let company = match &self.preloaded {
            Some(snapshot) => snapshot.clone(),
            None => Self::load(company_file)?,
        };
        self.company = Some(company);
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), TransportError> {
        self.company = None;
        self.iterators.clear();
        Ok(())
    }

    fn supported_versions(&mut self) -> Result<Vec<String>, TransportError> {
        if !self.connected {
            return Err(TransportError::new(E_NOT_CONNECTED, "No connection is open"));
        }
        match &self.preloaded {
            Some(snapshot) if !snapshot.versions.is_empty() => Ok(snapshot.versions.clone()),
            _ => Ok(DEFAULT_VERSIONS.iter().map(ToString::to_string).collect()),
        }
    }

    fn do_requests(&mut self, request: &MsgSetRequest) -> Result<MsgSetResponse, TransportError> {
        let Some(company) = self.company.take() else {
            return Err(TransportError::new(E_NO_SESSION, "No session has been started"));
        };

        let mut responses = Vec::with_capacity(request.len());
        for (i, query) in request.requests.iter().enumerate() {
            let mut response = match query {
                QueryRequest::Bill(q) => self.bill_query(&company, q),
                QueryRequest::Vendor(q) => Response::ok(ResponseDetail::Vendors(list_response(
                    &company.vendors,
                    q,
                    |v| v.is_active,
                ))),
                QueryRequest::Terms(q) => Response::ok(ResponseDetail::Terms(list_response(
                    &company.terms,
                    q,
                    |t| t.detail().is_active,
                ))),
            };
            response.request_id = Some(i.to_string());
            let failed = response.status_severity.eq_ignore_ascii_case("error");
            responses.push(response);
            if failed && request.on_error == OnError::Stop {
                break;
            }
        }

        self.company = Some(company);
        Ok(MsgSetResponse::new(responses))
    }
}
