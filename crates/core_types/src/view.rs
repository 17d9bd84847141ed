use serde::{Deserialize, Serialize};

/// The visible stage of the client. Chat requires a live session;
/// History renders a placeholder when nothing has happened yet.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    #[default]
    Upload,
    Chat,
    History,
}

impl ActiveView {
    pub fn title(self) -> &'static str {
        match self {
            ActiveView::Upload => "Upload PDFs",
            ActiveView::Chat => "Chat",
            ActiveView::History => "History",
        }
    }
}
