//! # Async access to the desktop session
//!
//! [`QBConnector`] owns the single [`SessionManager`] for the process and hands
//! it to blocking work one caller at a time. Every round-trip holds the session
//! lock for its whole duration, so a paged query never interleaves with another
//! request.
//!
//! ```no_run
//! use qbd_bill_export::{client::{OpenMode, QBConnector, SnapshotTransport}, AppIdentity};
//!
//! # async fn run() {
//! let mut qb = QBConnector::new(SnapshotTransport::new(), AppIdentity::from_env());
//! let status = qb.connect("C:/Company/acme.json".as_ref(), OpenMode::SingleUser).await;
//! println!("{}", status.progress_message());
//! # }
//! ```
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_lock::Mutex;

use super::{
    session::SessionManager,
    transport::{OpenMode, QBTransport},
};
use crate::{functions::attachment::attach_dir_for, status::ResultCode, APIResult, AppIdentity, Status};

pub struct QBConnector<T: QBTransport> {
    session: Arc<Mutex<SessionManager<T>>>,
    attach_dir: Option<PathBuf>,
}

impl<T: QBTransport + 'static> QBConnector<T> {
    pub fn new(transport: T, identity: AppIdentity) -> Self {
        Self::from_session(SessionManager::new(transport, identity))
    }

    /// Wraps an already configured session manager.
    pub fn from_session(session: SessionManager<T>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            attach_dir: None,
        }
    }

    /// Locks the session and runs `f` on the blocking pool
    pub(crate) async fn with_session<F, R>(&self, f: F) -> APIResult<R>
    where
        F: FnOnce(&mut SessionManager<T>) -> APIResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let mut guard = self.session.lock_arc().await;
        tokio::task::spawn_blocking(move || f(&mut guard)).await?
    }

    /// Opens the connection and a session on `company_file`.
    ///
    /// Also remembers where QuickBooks keeps attachments for that file, see
    /// [`QBConnector::attach_dir`].
    pub async fn connect(&mut self, company_file: &Path, mode: OpenMode) -> Status {
        let file = company_file.to_string_lossy().into_owned();
        let status = self
            .with_session(move |s| Ok(s.connect(Some(&file), mode)))
            .await
            .unwrap_or_else(|e| {
                log::error!("Connect task failed : {e}");
                Status::new(e.to_string(), ResultCode::NoConnection, 0)
            });

        self.attach_dir = status
            .is_connected()
            .then(|| attach_dir_for(company_file));
        status
    }

    pub async fn disconnect(&self) -> APIResult<()> {
        self.with_session(SessionManager::<T>::disconnect).await
    }

    #[must_use]
    pub fn attach_dir(&self) -> Option<&Path> {
        self.attach_dir.as_deref()
    }
}
