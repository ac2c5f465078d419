//! Locating PDFs QuickBooks stored alongside a transaction
//!
//! QuickBooks keeps attached documents next to the company file, one directory
//! per transaction:
//!
//! ```text
//! C:/Company/Acme.QBW
//! C:/Company/attach/Acme/Txn/800<TxnID>/scan.pdf
//! ```

use std::path::{Path, PathBuf};

/// Base attachment directory for `company_file`.
#[must_use]
pub fn attach_dir_for(company_file: &Path) -> PathBuf {
    let stem = company_file.file_stem().unwrap_or_default();
    company_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join("attach")
        .join(stem)
        .join("Txn")
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// First PDF (by file name) attached to `txn_id`, if any.
///
/// A missing or unreadable directory is treated as no attachment.
pub async fn find_attached_pdf(base: &Path, txn_id: &str) -> Option<PathBuf> {
    let dir = base.join(format!("800{txn_id}"));
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) => {
            log::trace!("No attachments for {txn_id} in {} : {e}", dir.display());
            return None;
        }
    };

    let mut pdfs = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if is_pdf(&path) && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    pdfs.into_iter().next()
}
