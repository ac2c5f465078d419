use qbd_types::{Business, ListQuery, NameListIdPair, QueryRequest, ResponseDetail};

use crate::{
    client::{QBConnector, QBTransport, SessionManager},
    APIError, APIResult,
};

fn run_list_query<T: QBTransport>(
    session: &mut SessionManager<T>,
    query: QueryRequest,
) -> APIResult<Option<ResponseDetail>> {
    let name = query.name();
    let mut request = session.create_request()?;
    request.append(query);
    if session.execute(&request)? {
        return Err(APIError::QueryFailed(name));
    }
    Ok(session.response(0)?.detail.clone())
}

/// Active vendors as [`Business`] records. Vendors without a ListID are skipped.
///
/// # Errors
/// `QueryFailed` when the backend flags the query, plus any session error.
pub fn list_vendors<T: QBTransport>(session: &mut SessionManager<T>) -> APIResult<Vec<Business>> {
    match run_list_query(session, QueryRequest::Vendor(ListQuery::default()))? {
        Some(ResponseDetail::Vendors(rets)) => Ok(rets
            .iter()
            .filter(|v| v.list_id.as_deref().is_some_and(|id| !id.is_empty()))
            .map(Business::from)
            .collect()),
        None => Ok(Vec::new()),
        Some(other) => Err(APIError::UnexpectedResponse {
            expected: "VendorRet",
            got: other.kind(),
        }),
    }
}

/// Active standard and date-driven terms. Entries without a ListID are skipped.
///
/// # Errors
/// `QueryFailed` when the backend flags the query, plus any session error.
pub fn list_terms<T: QBTransport>(session: &mut SessionManager<T>) -> APIResult<Vec<NameListIdPair>> {
    let query = ListQuery {
        include_ret_element: vec!["ListID".into(), "Name".into()],
        ..Default::default()
    };
    match run_list_query(session, QueryRequest::Terms(query))? {
        Some(ResponseDetail::Terms(rets)) => Ok(rets
            .iter()
            .filter(|t| t.detail().list_id.as_deref().is_some_and(|id| !id.is_empty()))
            .map(NameListIdPair::from)
            .collect()),
        None => Ok(Vec::new()),
        Some(other) => Err(APIError::UnexpectedResponse {
            expected: "TermsRet",
            got: other.kind(),
        }),
    }
}

impl<T: QBTransport + 'static> QBConnector<T> {
    /// See [`list_vendors`].
    ///
    /// # Errors
    /// Same as [`list_vendors`].
    pub async fn list_vendors(&self) -> APIResult<Vec<Business>> {
        self.with_session(list_vendors::<T>).await
    }

    /// See [`list_terms`].
    ///
    /// # Errors
    /// Same as [`list_terms`].
    pub async fn list_terms(&self) -> APIResult<Vec<NameListIdPair>> {
        self.with_session(list_terms::<T>).await
    }
}
