//! Data shapes for talking to QuickBooks Desktop: the request/response
//! envelopes, the raw `*Ret` records the backend hands back, and the
//! domain records built from them.

pub mod models;
pub mod msgset;
pub mod ret;

pub use models::{Bill, Business, ExpenseLine, LineItem, NameListIdPair};
pub use msgset::{
    ActiveStatus, BillQuery, IteratorMode, ListQuery, MsgSetRequest, MsgSetResponse, OnError,
    QueryRequest, Response, ResponseDetail, SdkVersion, Severity,
};
pub use ret::{
    Address, BillRet, ExpenseLineRet, ItemLineRet, ListRef, TermsDetail, TermsRet, VendorRet,
};
