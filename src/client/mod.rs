mod context;
mod session;
pub mod snapshot;
#[cfg(test)]
pub(crate) mod testing;
mod transport;

pub use context::QBConnector;
pub use session::SessionManager;
pub use snapshot::{CompanySnapshot, SnapshotTransport};
pub use transport::{ConnectionType, OpenMode, QBTransport};
