//! List Synchronization
//!
//! Keeps one list's task view consistent across local optimistic edits,
//! backend responses and remote change events.

mod error;
mod pending;
mod session;
mod synchronizer;
mod view;


pub use error::{SyncError, SyncResult};
pub use pending::{OpId, PendingOp, PendingOps};
pub use session::ListSession;
pub use synchronizer::ListSynchronizer;
pub use view::{OrderedView, TaskView};
