pub mod answer;
pub mod controller;
pub mod notify;
pub mod staging;
pub mod stats;

pub use answer::{FormattedAnswer, format_answer};
pub use controller::{SessionController, SessionState};
pub use notify::Notifier;
pub use staging::UploadStaging;
pub use stats::{SessionSummary, summarize};
