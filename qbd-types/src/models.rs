use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ret::{BillRet, ExpenseLineRet, ItemLineRet, ListRef, TermsRet, VendorRet};

/// Vendor snapshot taken from a single query; never cached.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub terms_id: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub account_number: String,
    pub tax_id: String,
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub credit_limit: Decimal,
    pub phone: String,
    pub fax: String,
    pub email: String,
}

impl From<&VendorRet> for Business {
    fn from(ret: &VendorRet) -> Self {
        let address = ret.vendor_address.clone().unwrap_or_default();
        Self {
            id: ret.list_id.clone().unwrap_or_default(),
            terms_id: list_id(ret.terms_ref.as_ref()),
            name: ret.name.clone().unwrap_or_default(),
            first_name: ret.first_name.clone().unwrap_or_default(),
            last_name: ret.last_name.clone().unwrap_or_default(),
            account_number: ret.account_number.clone().unwrap_or_default(),
            tax_id: ret.vendor_tax_ident.clone().unwrap_or_default(),
            address1: address.addr1.unwrap_or_default(),
            address2: address.addr2.unwrap_or_default(),
            city: address.city.unwrap_or_default(),
            state: address.state.unwrap_or_default(),
            postal_code: address.postal_code.unwrap_or_default(),
            credit_limit: ret.credit_limit.unwrap_or_default(),
            phone: ret.phone.clone().unwrap_or_default(),
            fax: ret.fax.clone().unwrap_or_default(),
            email: ret.email.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub lookup_code: String,
    pub vendor_sku: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub description: String,
    pub line_txn_id: String,
}

impl From<&ItemLineRet> for LineItem {
    fn from(ret: &ItemLineRet) -> Self {
        Self {
            lookup_code: ret
                .item_ref
                .as_ref()
                .and_then(|r| r.full_name.clone())
                .unwrap_or_default(),
            vendor_sku: ret.other1.clone().unwrap_or_default(),
            quantity: ret.quantity.unwrap_or(Decimal::ONE),
            // Cost is the unit price; Amount is all some item types report
            price: ret.cost.or(ret.amount).unwrap_or_default(),
            description: ret.desc.clone().unwrap_or_default(),
            line_txn_id: ret.txn_line_id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub account_id: String,
    pub description: String,
    pub memo: String,
    pub amount: Decimal,
    pub line_txn_id: String,
}

impl From<&ExpenseLineRet> for ExpenseLine {
    fn from(ret: &ExpenseLineRet) -> Self {
        Self {
            account_id: list_id(ret.account_ref.as_ref()),
            description: ret
                .account_ref
                .as_ref()
                .and_then(|r| r.full_name.clone())
                .unwrap_or_default(),
            memo: ret.memo.clone().unwrap_or_default(),
            amount: ret.amount.unwrap_or(Decimal::ZERO),
            line_txn_id: ret.txn_line_id.clone().unwrap_or_default(),
        }
    }
}

/// An accounts-payable bill, built once from a [`BillRet`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Bill {
    pub vendor: Business,
    pub vendor_id: String,
    pub terms_id: String,
    pub txn_id: String,
    pub edit_sequence: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub reference_number: String,
    pub memo: String,
    pub sales_tax: Decimal,
    pub shipping: Decimal,
    pub items: Vec<LineItem>,
    pub expenses: Vec<ExpenseLine>,
}

impl Bill {
    /// Sum of `quantity * price` over the item lines plus every expense amount.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let items: Decimal = self.items.iter().map(|i| i.quantity * i.price).sum();
        let expenses: Decimal = self.expenses.iter().map(|e| e.amount).sum();
        items + expenses
    }
}

impl From<&BillRet> for Bill {
    fn from(ret: &BillRet) -> Self {
        let vendor_id = list_id(ret.vendor_ref.as_ref());
        let terms_id = list_id(ret.terms_ref.as_ref());
        let address = ret.vendor_address.clone().unwrap_or_default();
        let vendor = Business {
            id: vendor_id.clone(),
            terms_id: terms_id.clone(),
            name: ret
                .vendor_ref
                .as_ref()
                .and_then(|r| r.full_name.clone())
                .unwrap_or_default(),
            address1: address.addr1.unwrap_or_default(),
            address2: address.addr2.unwrap_or_default(),
            city: address.city.unwrap_or_default(),
            state: address.state.unwrap_or_default(),
            postal_code: address.postal_code.unwrap_or_default(),
            ..Default::default()
        };
        let date = ret.txn_date.unwrap_or_default();

        Self {
            vendor,
            vendor_id,
            terms_id,
            txn_id: ret.txn_id.clone().unwrap_or_default(),
            edit_sequence: ret.edit_sequence.clone().unwrap_or_default(),
            date,
            due_date: ret.due_date.unwrap_or(date),
            reference_number: ret.ref_number.clone().unwrap_or_default(),
            memo: ret.memo.clone().unwrap_or_default(),
            sales_tax: ret.sales_tax_total.unwrap_or_default(),
            shipping: ret.shipping.unwrap_or_default(),
            items: ret.item_line_ret.iter().map(LineItem::from).collect(),
            expenses: ret.expense_line_ret.iter().map(ExpenseLine::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameListIdPair {
    pub list_id: String,
    pub name: String,
}

impl NameListIdPair {
    #[must_use]
    pub fn to_formatted_string(&self) -> String {
        format!("{}|{}", self.list_id, self.name)
    }
}

impl From<&TermsRet> for NameListIdPair {
    fn from(ret: &TermsRet) -> Self {
        let detail = ret.detail();
        Self {
            list_id: detail.list_id.clone().unwrap_or_default(),
            name: detail.name.clone().unwrap_or_default(),
        }
    }
}

fn list_id(r: Option<&ListRef>) -> String {
    r.and_then(|r| r.list_id.clone()).unwrap_or_default()
}
