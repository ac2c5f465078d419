use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use qbd_types::{MsgSetRequest, MsgSetResponse, Response};

use super::transport::{ConnectionType, OpenMode, QBTransport};
use crate::error::TransportError;

#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub open_connection: usize,
    pub close_connection: usize,
    pub begin_session: usize,
    pub end_session: usize,
    pub company_files: Vec<String>,
    pub requests: Vec<MsgSetRequest>,
}

/// Records every call and answers `do_requests` from a queue.
pub(crate) struct ScriptedTransport {
    calls: Arc<Mutex<Calls>>,
    versions: Vec<String>,
    responses: VecDeque<Result<MsgSetResponse, TransportError>>,
    begin_error: Option<TransportError>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            calls: Arc::default(),
            versions: vec!["1.0".into(), "13.0".into(), "2.1".into()],
            responses: VecDeque::new(),
            begin_error: None,
        }
    }

    pub fn with_versions(mut self, versions: &[&str]) -> Self {
        self.versions = versions.iter().map(ToString::to_string).collect();
        self
    }

    pub fn respond(mut self, responses: Vec<Response>) -> Self {
        self.responses.push_back(Ok(MsgSetResponse::new(responses)));
        self
    }

    pub fn respond_raw(mut self, response: MsgSetResponse) -> Self {
        self.responses.push_back(Ok(response));
        self
    }

    pub fn failing_begin(mut self, error: TransportError) -> Self {
        self.begin_error = Some(error);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Calls>> {
        Arc::clone(&self.calls)
    }
}

impl QBTransport for ScriptedTransport {
    fn open_connection(
        &mut self,
        _app_id: &str,
        _app_name: &str,
        _connection_type: ConnectionType,
    ) -> Result<(), TransportError> {
        self.calls.lock().unwrap().open_connection += 1;
        Ok(())
    }

    fn close_connection(&mut self) -> Result<(), TransportError> {
        self.calls.lock().unwrap().close_connection += 1;
        Ok(())
    }

    fn begin_session(&mut self, company_file: &str, _mode: OpenMode) -> Result<(), TransportError> {
        let mut calls = self.calls.lock().unwrap();
        calls.begin_session += 1;
        calls.company_files.push(company_file.to_string());
        match &self.begin_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn end_session(&mut self) -> Result<(), TransportError> {
        self.calls.lock().unwrap().end_session += 1;
        Ok(())
    }

    fn supported_versions(&mut self) -> Result<Vec<String>, TransportError> {
        Ok(self.versions.clone())
    }

    fn do_requests(&mut self, request: &MsgSetRequest) -> Result<MsgSetResponse, TransportError> {
        self.calls.lock().unwrap().requests.push(request.clone());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Ok(MsgSetResponse::new(Vec::new())))
    }
}
