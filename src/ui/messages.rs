use url::Url;

use crate::file::SelectedFile;
use crate::ui::components::{upload_panel, url_dialog};

#[derive(Debug, Clone)]
pub enum RootMessage {
    Panel(upload_panel::Message),
    Navigated(Result<Url, String>),
}

// Shortcuts for the messages frontends send directly
impl RootMessage {
    pub fn select_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self::Panel(upload_panel::Message::FilePicked(Some(path.into())))
    }

    pub fn select_file(file: SelectedFile) -> Self {
        Self::Panel(upload_panel::Message::SelectFile(file))
    }

    pub fn upload() -> Self {
        Self::Panel(upload_panel::Message::Upload)
    }

    pub fn open_url_dialog() -> Self {
        Self::Panel(upload_panel::Message::OpenUrlDialog)
    }

    pub fn dialog(message: url_dialog::Message) -> Self {
        Self::Panel(upload_panel::Message::Dialog(message))
    }

    pub fn save_prediction(path: Option<std::path::PathBuf>) -> Self {
        Self::Panel(upload_panel::Message::SavePrediction(path))
    }
}
