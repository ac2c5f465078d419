//! Raw records as the backend returns them.
//!
//! Nearly every node is optional: which ones are present depends on the
//! transaction type, the qbXML version and the `IncludeRetElement` filter of
//! the query. Defaulting happens when these are mapped into the domain model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A reference to a list object, `ListID` plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ListRef {
    #[serde(rename = "ListID")]
    pub list_id: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Address {
    pub addr1: Option<String>,
    pub addr2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ItemLineRet {
    #[serde(rename = "TxnLineID")]
    pub txn_line_id: Option<String>,
    pub item_ref: Option<ListRef>,
    pub desc: Option<String>,
    pub quantity: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub amount: Option<Decimal>,
    /// Custom field the vendor part number is kept in.
    pub other1: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ExpenseLineRet {
    #[serde(rename = "TxnLineID")]
    pub txn_line_id: Option<String>,
    pub account_ref: Option<ListRef>,
    pub amount: Option<Decimal>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BillRet {
    #[serde(rename = "TxnID")]
    pub txn_id: Option<String>,
    pub edit_sequence: Option<String>,
    pub vendor_ref: Option<ListRef>,
    pub vendor_address: Option<Address>,
    pub terms_ref: Option<ListRef>,
    pub txn_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub ref_number: Option<String>,
    pub memo: Option<String>,
    pub amount_due: Option<Decimal>,
    pub sales_tax_total: Option<Decimal>,
    pub shipping: Option<Decimal>,
    pub item_line_ret: Vec<ItemLineRet>,
    pub expense_line_ret: Vec<ExpenseLineRet>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VendorRet {
    #[serde(rename = "ListID")]
    pub list_id: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub account_number: Option<String>,
    pub vendor_tax_ident: Option<String>,
    pub vendor_address: Option<Address>,
    pub credit_limit: Option<Decimal>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub terms_ref: Option<ListRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TermsDetail {
    #[serde(rename = "ListID")]
    pub list_id: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Terms come in two shapes; both carry the same identifying fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermsRet {
    #[serde(rename = "StandardTermsRet")]
    Standard(TermsDetail),
    #[serde(rename = "DateDrivenTermsRet")]
    DateDriven(TermsDetail),
}

impl TermsRet {
    #[must_use]
    pub fn detail(&self) -> &TermsDetail {
        match self {
            TermsRet::Standard(d) | TermsRet::DateDriven(d) => d,
        }
    }
}
