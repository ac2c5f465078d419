//! Paging through bills with the backend's iterator protocol.
//!
//! A [`BillPager`] keeps the iterator handle between calls. The first call
//! starts an iterator, later calls continue it, and once the backend reports
//! nothing remaining the pager is exhausted and returns `None`.

use chrono::NaiveDate;
use qbd_types::{Bill, BillQuery, IteratorMode, QueryRequest, ResponseDetail};

use crate::{
    client::{QBConnector, QBTransport, SessionManager},
    APIError, APIResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Cursor {
    #[default]
    Fresh,
    Continuing {
        iterator_id: String,
        remaining: usize,
    },
    Exhausted,
}

struct Page {
    iterator_id: Option<String>,
    remaining: i64,
    bills: Vec<Bill>,
}

/// Cursor over one bill query. Use a new pager for every export.
#[derive(Debug, Default)]
pub struct BillPager {
    cursor: Cursor,
    total_count: usize,
}

impl BillPager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimated number of bills in the whole query, known after the first
    /// page. Only good enough for progress reporting.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Rows the backend still holds for the iterator, `-1` once exhausted.
    #[must_use]
    pub fn remaining_count(&self) -> i64 {
        match &self.cursor {
            Cursor::Fresh => 0,
            Cursor::Continuing { remaining, .. } => i64::try_from(*remaining).unwrap_or(i64::MAX),
            Cursor::Exhausted => -1,
        }
    }

    #[must_use]
    pub fn iterator_id(&self) -> Option<&str> {
        match &self.cursor {
            Cursor::Continuing { iterator_id, .. } => Some(iterator_id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    /// Fetches the next page of bills dated on or after `start`.
    ///
    /// Returns `Ok(None)` once the iterator is exhausted. An empty page is not
    /// the end of the stream. A failed page leaves the cursor untouched, so
    /// calling again re-issues the same request.
    ///
    /// # Errors
    /// `QueryFailed` when the backend flags the page, plus any session error.
    pub fn next_page<T: QBTransport>(
        &mut self,
        session: &mut SessionManager<T>,
        start: NaiveDate,
        page_size: usize,
    ) -> APIResult<Option<Vec<Bill>>> {
        let page_size = page_size.max(1);
        let Some(query) = self.plan(start, page_size) else {
            return Ok(None);
        };
        let page = run_bill_query(session, query)?;
        self.commit(page, page_size).map(Some)
    }

    /// [`BillPager::next_page`] through the shared connector.
    ///
    /// # Errors
    /// Same as [`BillPager::next_page`].
    pub async fn next_page_async<T: QBTransport + 'static>(
        &mut self,
        qb: &QBConnector<T>,
        start: NaiveDate,
        page_size: usize,
    ) -> APIResult<Option<Vec<Bill>>> {
        let page_size = page_size.max(1);
        let Some(query) = self.plan(start, page_size) else {
            return Ok(None);
        };
        let page = qb.with_session(move |s| run_bill_query(s, query)).await?;
        self.commit(page, page_size).map(Some)
    }

    fn plan(&self, start: NaiveDate, page_size: usize) -> Option<BillQuery> {
        let query = BillQuery {
            include_line_items: true,
            from_txn_date: Some(start),
            ..Default::default()
        };
        match &self.cursor {
            Cursor::Exhausted => None,
            Cursor::Fresh => Some(BillQuery {
                max_returned: Some(page_size),
                iterator: Some(IteratorMode::Start),
                ..query
            }),
            Cursor::Continuing {
                iterator_id,
                remaining,
            } => Some(BillQuery {
                max_returned: Some(page_size.min(*remaining)),
                iterator: Some(IteratorMode::Continue),
                iterator_id: Some(iterator_id.clone()),
                ..query
            }),
        }
    }

    fn commit(&mut self, page: Page, page_size: usize) -> APIResult<Vec<Bill>> {
        let remaining = usize::try_from(page.remaining).unwrap_or(0);
        let next = if remaining == 0 {
            Cursor::Exhausted
        } else {
            let iterator_id = page
                .iterator_id
                .filter(|id| !id.is_empty())
                .ok_or(APIError::QueryFailed("BillQueryRq returned no iterator"))?;
            Cursor::Continuing {
                iterator_id,
                remaining,
            }
        };

        if self.cursor == Cursor::Fresh {
            self.total_count = remaining + page_size;
        }
        log::debug!(
            "Bill page of {} received, {remaining} remaining",
            page.bills.len()
        );
        self.cursor = next;
        Ok(page.bills)
    }
}

fn run_bill_query<T: QBTransport>(session: &mut SessionManager<T>, query: BillQuery) -> APIResult<Page> {
    let mut request = session.create_request()?;
    request.append(QueryRequest::Bill(query));
    if session.execute(&request)? {
        return Err(APIError::QueryFailed("BillQueryRq"));
    }

    let bills = match &session.response(0)?.detail {
        Some(ResponseDetail::Bills(rets)) => rets.iter().map(Bill::from).collect(),
        None => Vec::new(),
        Some(other) => {
            return Err(APIError::UnexpectedResponse {
                expected: "BillRet",
                got: other.kind(),
            })
        }
    };

    Ok(Page {
        iterator_id: session.iterator_id()?.map(str::to_string),
        remaining: session.iterator_remaining_count()?,
        bills,
    })
}

#[cfg(test)]
mod test {
    use qbd_types::{BillRet, Response, VendorRet};

    use super::*;
    use crate::{
        client::{testing::ScriptedTransport, CompanySnapshot, OpenMode, SnapshotTransport},
        AppIdentity,
    };

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn snapshot_session(dates: &[&str]) -> SessionManager<SnapshotTransport> {
        let bills = dates
            .iter()
            .enumerate()
            .map(|(i, d)| BillRet {
                txn_id: Some(format!("{}-1673", i + 1)),
                ref_number: Some(format!("INV{i}")),
                txn_date: Some(date(d)),
                ..Default::default()
            })
            .collect();
        let transport = SnapshotTransport::from_snapshot(CompanySnapshot {
            bills,
            ..Default::default()
        });
        let mut session = SessionManager::new(transport, AppIdentity::default());
        assert!(session.connect(Some("acme.json"), OpenMode::SingleUser).is_connected());
        session
    }

    fn bill_page(iterator: &str, remaining: i64, count: usize) -> Response {
        let rets = (0..count)
            .map(|i| BillRet {
                txn_id: Some(i.to_string()),
                ..Default::default()
            })
            .collect();
        Response {
            iterator_id: Some(iterator.into()),
            iterator_remaining_count: Some(remaining),
            ..Response::ok(ResponseDetail::Bills(rets))
        }
    }

    #[test]
    fn pages_until_exhausted() {
        let mut session = snapshot_session(&[
            "2022-11-30",
            "2023-01-01",
            "2023-01-15",
            "2023-02-01",
            "2023-03-10",
            "2023-04-22",
        ]);
        let mut pager = BillPager::new();
        let start = date("2023-01-01");

        let sizes: Vec<usize> = std::iter::from_fn(|| pager.next_page(&mut session, start, 2).unwrap())
            .map(|p| p.len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(pager.total_count(), 5);
        assert_eq!(pager.remaining_count(), -1);
        assert!(pager.iterator_id().is_none());
        assert!(pager.next_page(&mut session, start, 2).unwrap().is_none());
    }

    #[test]
    fn empty_page_is_not_the_end() {
        let transport = ScriptedTransport::new()
            .respond(vec![bill_page("{it}", 4, 0)])
            .respond(vec![bill_page("{it}", 0, 4)]);
        let mut session = SessionManager::new(transport, AppIdentity::default());
        let mut pager = BillPager::new();
        let start = date("2023-01-01");

        let first = pager.next_page(&mut session, start, 4).unwrap();
        assert_eq!(first.map(|p| p.len()), Some(0));
        assert!(!pager.is_exhausted());
        assert_eq!(pager.remaining_count(), 4);

        let second = pager.next_page(&mut session, start, 4).unwrap();
        assert_eq!(second.map(|p| p.len()), Some(4));
        assert!(pager.next_page(&mut session, start, 4).unwrap().is_none());
    }

    #[test]
    fn only_first_request_starts_an_iterator() {
        let transport = ScriptedTransport::new()
            .respond(vec![bill_page("{it}", 5, 2)])
            .respond(vec![bill_page("{it}", 3, 2)])
            .respond(vec![bill_page("{it}", 0, 3)]);
        let calls = transport.calls();
        let mut session = SessionManager::new(transport, AppIdentity::default());
        let mut pager = BillPager::new();
        while pager
            .next_page(&mut session, date("2023-01-01"), 2)
            .unwrap()
            .is_some()
        {}

        let calls = calls.lock().unwrap();
        let queries: Vec<&BillQuery> = calls
            .requests
            .iter()
            .map(|r| match &r.requests[0] {
                QueryRequest::Bill(q) => q,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].iterator, Some(IteratorMode::Start));
        assert_eq!(queries[0].max_returned, Some(2));
        assert!(queries[0].include_line_items);
        assert_eq!(queries[0].from_txn_date, Some(date("2023-01-01")));
        for q in &queries[1..] {
            assert_eq!(q.iterator, Some(IteratorMode::Continue));
            assert_eq!(q.iterator_id.as_deref(), Some("{it}"));
        }
        assert_eq!(queries[2].max_returned, Some(2));
        assert_eq!(pager.total_count(), 7);
    }

    #[test]
    fn continue_is_capped_by_remaining() {
        let transport = ScriptedTransport::new().respond(vec![bill_page("{it}", 1, 10)]);
        let calls = transport.calls();
        let mut session = SessionManager::new(transport, AppIdentity::default());
        let mut pager = BillPager::new();
        let start = date("2023-01-01");
        pager.next_page(&mut session, start, 10).unwrap();
        let _ = pager.next_page(&mut session, start, 10);

        let calls = calls.lock().unwrap();
        match &calls.requests[1].requests[0] {
            QueryRequest::Bill(q) => assert_eq!(q.max_returned, Some(1)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failed_page_keeps_cursor() {
        let error = Response {
            status_code: 3120,
            status_severity: "Error".into(),
            status_message: "Object not found".into(),
            ..Default::default()
        };
        let transport = ScriptedTransport::new()
            .respond(vec![bill_page("{it}", 3, 2)])
            .respond(vec![bill_page("{it}", 1, 2), error])
            .respond(vec![bill_page("{it}", 1, 2)]);
        let calls = transport.calls();
        let mut session = SessionManager::new(transport, AppIdentity::default());
        let mut pager = BillPager::new();
        let start = date("2023-01-01");

        pager.next_page(&mut session, start, 2).unwrap();
        let err = pager.next_page(&mut session, start, 2).unwrap_err();
        assert!(matches!(err, APIError::QueryFailed(_)));
        assert_eq!(pager.iterator_id(), Some("{it}"));
        assert_eq!(pager.remaining_count(), 3);

        pager.next_page(&mut session, start, 2).unwrap();
        let calls = calls.lock().unwrap();
        assert_eq!(calls.requests[1], calls.requests[2]);
    }

    #[test]
    fn wrong_detail_is_rejected() {
        let transport = ScriptedTransport::new().respond(vec![Response::ok(ResponseDetail::Vendors(
            vec![VendorRet::default()],
        ))]);
        let mut session = SessionManager::new(transport, AppIdentity::default());
        let err = BillPager::new()
            .next_page(&mut session, date("2023-01-01"), 2)
            .unwrap_err();
        assert!(matches!(
            err,
            APIError::UnexpectedResponse {
                expected: "BillRet",
                got: "VendorRet"
            }
        ));
    }

    #[tokio::test]
    async fn pages_through_connector() {
        let mut qb = QBConnector::from_session(snapshot_session(&[
            "2023-01-02",
            "2023-01-03",
            "2023-01-04",
        ]));
        assert!(qb
            .connect("acme.json".as_ref(), OpenMode::SingleUser)
            .await
            .is_connected());

        let mut pager = BillPager::new();
        let mut seen = 0;
        while let Some(page) = pager
            .next_page_async(&qb, date("2023-01-01"), 2)
            .await
            .unwrap()
        {
            seen += page.len();
        }
        assert_eq!(seen, 3);
    }
}
