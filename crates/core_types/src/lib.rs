pub mod backend;
pub mod error;
pub mod notification;
pub mod session;
pub mod staging;
pub mod view;

pub use backend::{DocumentBackend, SessionDetail, SessionExport, UploadReceipt};
pub use error::BackendError;
pub use notification::{NOTIFICATION_TTL, Notification, NotificationKind};
pub use session::{QaEntry, Reference, Session};
pub use staging::StagedFile;
pub use view::ActiveView;
