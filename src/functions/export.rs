//! Writing bills to the CSV consumed by the accounts-payable import.
//!
//! One row per bill, no header:
//!
//! ```text
//! 1/5/2023,INV-1001,2/4/2023,1250.50,C:/Company/attach/Acme/Txn/8001A2-1673/scan.pdf
//! ```

use std::{fs::File, io::Write, path::Path};

use chrono::NaiveDate;
use qbd_types::Bill;

use super::{attachment::find_attached_pdf, bills::BillPager};
use crate::{
    client::{QBConnector, QBTransport},
    status::ResultCode,
    APIError, APIResult, Status,
};

/// `M/D/YYYY` without zero padding.
#[must_use]
pub fn short_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

pub struct BillCsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl BillCsvWriter<File> {
    /// Creates (or truncates) the file at `path`.
    ///
    /// # Errors
    /// If the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> APIResult<Self> {
        Ok(Self::from_writer(File::create(path)?))
    }
}

impl<W: Write> BillCsvWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(writer),
        }
    }

    /// Writes the row for `bill`. Fields are quoted only when they contain a
    /// comma, quote or line break.
    ///
    /// # Errors
    /// If the underlying writer fails.
    pub fn write_bill(&mut self, bill: &Bill, attachment: Option<&Path>) -> APIResult<()> {
        let attachment = attachment
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.writer.write_record([
            short_date(bill.date),
            bill.reference_number.clone(),
            short_date(bill.due_date),
            bill.total().to_string(),
            attachment,
        ])?;
        Ok(())
    }

    /// # Errors
    /// If the underlying writer fails.
    pub fn flush(&mut self) -> APIResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// # Errors
    /// If buffered rows cannot be flushed.
    pub fn into_inner(self) -> APIResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| APIError::Io(e.into_error()))
    }
}

/// Streams every bill dated on or after `start` into `out`, `batch_size` bills
/// per round-trip, and returns how many rows were written.
///
/// `on_progress` is called after each page with the running count against the
/// pager's estimated total.
///
/// # Errors
/// Any failed page aborts the export. Rows already written stay in `out`.
pub async fn export_bills<T, W, F>(
    qb: &QBConnector<T>,
    start: NaiveDate,
    batch_size: usize,
    out: &mut BillCsvWriter<W>,
    mut on_progress: F,
) -> APIResult<usize>
where
    T: QBTransport + 'static,
    W: Write,
    F: FnMut(&Status),
{
    let mut pager = BillPager::new();
    let mut written = 0;

    while let Some(bills) = pager.next_page_async(qb, start, batch_size).await? {
        for bill in &bills {
            let attachment = match qb.attach_dir() {
                Some(base) => find_attached_pdf(base, &bill.txn_id).await,
                None => None,
            };
            out.write_bill(bill, attachment.as_deref())?;
            written += 1;
        }
        out.flush()?;

        let total = pager.total_count().max(written);
        let percent = u8::try_from(written * 100 / total.max(1)).unwrap_or(100);
        on_progress(&Status::new(
            format!("Exported {written} of {total} bills"),
            ResultCode::DownloadOK,
            percent,
        ));
    }

    log::info!("Exported {written} bills dated on or after {start}");
    Ok(written)
}

#[cfg(test)]
mod test {
    use qbd_types::{BillRet, ExpenseLineRet, ItemLineRet};
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        client::{CompanySnapshot, OpenMode, SnapshotTransport},
        AppIdentity,
    };

    fn bill(reference: &str) -> Bill {
        Bill {
            date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2023, 12, 25).unwrap(),
            reference_number: reference.into(),
            items: vec![qbd_types::LineItem {
                quantity: Decimal::new(3, 0),
                price: Decimal::new(1250, 2),
                ..Default::default()
            }],
            expenses: vec![qbd_types::ExpenseLine {
                amount: Decimal::new(5, 1),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn written(w: BillCsvWriter<Vec<u8>>) -> String {
        String::from_utf8(w.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn row_format() {
        let mut w = BillCsvWriter::from_writer(Vec::new());
        w.write_bill(&bill("INV-1001"), Some(Path::new("/a/800X/scan.pdf")))
            .unwrap();
        w.write_bill(&bill("INV-1002"), None).unwrap();
        assert_eq!(
            written(w),
            "1/5/2023,INV-1001,12/25/2023,38.00,/a/800X/scan.pdf\n1/5/2023,INV-1002,12/25/2023,38.00,\n"
        );
    }

    #[test]
    fn embedded_commas_are_quoted() {
        let mut w = BillCsvWriter::from_writer(Vec::new());
        w.write_bill(&bill("A,B"), None).unwrap();
        assert_eq!(written(w), "1/5/2023,\"A,B\",12/25/2023,38.00,\n");
    }

    #[tokio::test]
    async fn exports_every_bill_with_attachments() {
        let root = tempfile::tempdir().unwrap();
        let company = root.path().join("Acme.json");
        let pdf_dir = root.path().join("attach/Acme/Txn/8002-1673");
        std::fs::create_dir_all(&pdf_dir).unwrap();
        std::fs::write(pdf_dir.join("scan.pdf"), b"%PDF").unwrap();

        let bills = (1..=5)
            .map(|i| BillRet {
                txn_id: Some(format!("{i}-1673")),
                ref_number: Some(format!("R{i}")),
                txn_date: NaiveDate::from_ymd_opt(2023, 1, i),
                item_line_ret: vec![ItemLineRet {
                    cost: Some(Decimal::new(10, 0)),
                    ..Default::default()
                }],
                expense_line_ret: vec![ExpenseLineRet::default()],
                ..Default::default()
            })
            .collect();
        let snapshot = CompanySnapshot {
            bills,
            ..Default::default()
        };
        std::fs::write(&company, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let mut qb = QBConnector::new(SnapshotTransport::new(), AppIdentity::default());
        assert!(qb.connect(&company, OpenMode::SingleUser).await.is_connected());

        let mut out = BillCsvWriter::from_writer(Vec::new());
        let mut progress = Vec::new();
        let count = export_bills(
            &qb,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            2,
            &mut out,
            |s| progress.push(s.progress()),
        )
        .await
        .unwrap();

        assert_eq!(count, 5);
        assert_eq!(progress, vec![40, 80, 100]);
        let csv = written(out);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "1/1/2023,R1,1/1/2023,10,");
        assert_eq!(
            lines[1],
            format!("1/2/2023,R2,1/2/2023,10,{}", pdf_dir.join("scan.pdf").display())
        );
    }
}
