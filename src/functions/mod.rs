//! Operations built on an open session.

pub mod attachment;
pub mod bills;
pub mod export;
pub mod lists;

pub use bills::BillPager;
pub use export::{export_bills, BillCsvWriter};
pub use lists::{list_terms, list_vendors};
