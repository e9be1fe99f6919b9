//! The upload card: pick an image, preview it, send it to the server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::file::{format_file_size, SelectedFile};
use crate::ui::components::file_download::{save_with_dialog, write_file};
use crate::ui::components::file_picker::pick_file;
use crate::ui::components::url_dialog::{self, DialogResult, UrlDialog};
use crate::ui::element::{Element, Tone};
use crate::ui::task::Task;
use crate::upload::{prediction_image_url, UploadClient};

/// User-visible outcome of the last operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Fetching {
        url: String,
    },
    Uploading,
    Redirected {
        target: Url,
        prediction: Option<Url>,
        saved: Option<PathBuf>,
    },
    /// Recoverable: the next selection or upload replaces it
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum Message {
    Browse,
    FilePicked(Option<PathBuf>),
    FileRead(Result<SelectedFile, String>),
    SelectFile(SelectedFile),
    PreviewReady {
        generation: u64,
        data_url: Result<String, String>,
    },
    Upload,
    Uploaded(Result<Url, String>),
    /// The opener could not follow the redirect
    NavigationFailed(String),
    OpenUrlDialog,
    Dialog(url_dialog::Message),
    UrlFetched(Result<SelectedFile, String>),
    /// Save the prediction image, asking for a location when no path is given
    SavePrediction(Option<PathBuf>),
    PredictionSaved(Result<Option<PathBuf>, String>),
}

/// Result of processing a panel message.
#[derive(Debug)]
pub enum Action {
    None,
    Run(Task<Message>),
    /// The server sent us somewhere; the opener decides how to get there
    Navigate(Url),
    /// A file was picked from this directory, then keep going with the task
    RememberDirectory(PathBuf, Task<Message>),
}

pub struct UploadPanel {
    client: Arc<dyn UploadClient>,
    file: Option<SelectedFile>,
    preview: Option<String>,
    // Bumped on every selection so previews of replaced files are dropped
    generation: u64,
    // Set from submit until its answer arrives, whatever else happens to `status` meanwhile
    uploading: bool,
    status: Status,
    dialog: Option<UrlDialog>,
    last_directory: Option<PathBuf>,
}

impl UploadPanel {
    pub fn new(client: Arc<dyn UploadClient>) -> Self {
        Self {
            client,
            file: None,
            preview: None,
            generation: 0,
            uploading: false,
            status: Status::Idle,
            dialog: None,
            last_directory: None,
        }
    }

    pub fn with_last_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.last_directory = dir;
        self
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn dialog(&self) -> Option<&UrlDialog> {
        self.dialog.as_ref()
    }

    /// Drops the selected file and its preview, e.g. after navigating away.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.file = None;
        self.preview = None;
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::Browse => Action::Run(pick_file(self.last_directory.as_deref()).map(Message::FilePicked)),

            Message::FilePicked(None) => {
                info!("No file selected");
                Action::None
            }

            Message::FilePicked(Some(path)) => {
                let read = Task::perform(SelectedFile::read(path.clone()), |r| {
                    Message::FileRead(r.map_err(|e| e.to_string()))
                });
                match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    Some(dir) if self.last_directory.as_deref() != Some(dir) => {
                        self.last_directory = Some(dir.to_path_buf());
                        Action::RememberDirectory(dir.to_path_buf(), read)
                    }
                    _ => Action::Run(read),
                }
            }

            Message::FileRead(Ok(file)) => self.update(Message::SelectFile(file)),
            Message::FileRead(Err(e)) => self.fail(e),

            Message::SelectFile(file) => self.select_file(file),

            Message::PreviewReady { generation, data_url } => {
                if generation != self.generation {
                    debug!(generation, current = self.generation, "dropping stale preview");
                    return Action::None;
                }
                match data_url {
                    Ok(data_url) => self.preview = Some(data_url),
                    Err(e) => warn!("failed to build preview: {}", e),
                }
                Action::None
            }

            Message::Upload => self.submit(),

            Message::Uploaded(Ok(target)) => {
                self.uploading = false;
                info!(%target, "upload finished");
                self.status = Status::Redirected {
                    prediction: prediction_image_url(&target),
                    target: target.clone(),
                    saved: None,
                };
                Action::Navigate(target)
            }
            Message::Uploaded(Err(e)) => {
                self.uploading = false;
                self.fail(e)
            }

            Message::NavigationFailed(e) => self.fail(format!("could not open the result page: {e}")),

            Message::OpenUrlDialog => {
                if self.dialog.is_none() {
                    self.dialog = Some(UrlDialog::new());
                }
                Action::None
            }

            Message::Dialog(message) => {
                let Some(dialog) = self.dialog.as_mut() else {
                    return Action::None;
                };
                match dialog.update(message) {
                    url_dialog::Action::None => Action::None,
                    url_dialog::Action::Close(result) => {
                        self.dialog = None;
                        self.dialog_closed(result)
                    }
                }
            }

            Message::UrlFetched(Ok(file)) => {
                self.status = Status::Idle;
                self.select_file(file)
            }
            Message::UrlFetched(Err(e)) => self.fail(e),

            Message::SavePrediction(destination) => self.save_prediction(destination),

            Message::PredictionSaved(Ok(Some(path))) => {
                if let Status::Redirected { saved, .. } = &mut self.status {
                    *saved = Some(path);
                }
                Action::None
            }
            Message::PredictionSaved(Ok(None)) => Action::None,
            Message::PredictionSaved(Err(e)) => self.fail(e),
        }
    }

    fn select_file(&mut self, file: SelectedFile) -> Action {
        if file.is_empty() {
            debug!(name = %file.name, "ignoring empty file");
            return Action::None;
        }

        info!(name = %file.name, size = file.size(), "file selected");
        self.generation += 1;
        self.preview = None;
        self.file = Some(file.clone());
        if matches!(self.status, Status::Failed(_)) {
            self.status = Status::Idle;
        }

        let generation = self.generation;
        Action::Run(Task::future(async move {
            let data_url = tokio::task::spawn_blocking(move || file.data_url())
                .await
                .map_err(|e| e.to_string());
            Message::PreviewReady { generation, data_url }
        }))
    }

    fn submit(&mut self) -> Action {
        let Some(file) = self.file.clone() else {
            debug!("nothing to upload");
            return Action::None;
        };
        if self.uploading {
            debug!("upload already in flight");
            return Action::None;
        }

        self.uploading = true;
        self.status = Status::Uploading;
        let client = self.client.clone();
        Action::Run(Task::future(async move {
            let result = tokio::task::spawn_blocking(move || client.submit(&file)).await;
            Message::Uploaded(match result {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            })
        }))
    }

    fn dialog_closed(&mut self, result: Option<DialogResult>) -> Action {
        let Some(DialogResult { success: true, url }) = result else {
            return Action::None;
        };

        info!(%url, "fetching image from url");
        self.status = Status::Fetching { url: url.clone() };
        let client = self.client.clone();
        Action::Run(Task::future(async move {
            let result = tokio::task::spawn_blocking(move || client.fetch(&url)).await;
            Message::UrlFetched(match result {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            })
        }))
    }

    fn save_prediction(&mut self, destination: Option<PathBuf>) -> Action {
        let Status::Redirected {
            prediction: Some(prediction),
            ..
        } = &self.status
        else {
            return Action::None;
        };

        let client = self.client.clone();
        let url = prediction.to_string();
        Action::Run(Task::future(async move {
            let fetched = tokio::task::spawn_blocking(move || client.fetch(&url)).await;
            let file = match fetched {
                Ok(Ok(file)) => file,
                Ok(Err(e)) => return Message::PredictionSaved(Err(e.to_string())),
                Err(e) => return Message::PredictionSaved(Err(e.to_string())),
            };

            Message::PredictionSaved(match destination {
                Some(path) => {
                    let written = write_file(&path, &file).await;
                    written.map(|()| Some(path))
                }
                None => save_with_dialog(file).await,
            })
        }))
    }

    fn fail(&mut self, error: String) -> Action {
        warn!("{}", error);
        self.status = Status::Failed(error);
        Action::None
    }

    pub fn view(&self) -> Element<Message> {
        let mut children = vec![Element::Row(vec![
            Element::button("browse", "Browse Image", Some(Message::Browse)),
            Element::button("url", "Enter URL", Some(Message::OpenUrlDialog)),
        ])];

        let alt = self.file.as_ref().map(|f| f.name.clone()).unwrap_or_else(|| "preview".to_string());
        children.push(Element::image(self.preview.clone(), alt));

        if let Some(file) = &self.file {
            children.push(Element::toned(
                format!("{} ({}, {})", file.name, file.mime, format_file_size(file.size())),
                Tone::Muted,
            ));
            children.push(Element::button(
                "upload",
                "Upload Image",
                (!self.uploading).then_some(Message::Upload),
            ));
        }

        children.push(self.status_view());

        let card = Element::Card(children);
        match &self.dialog {
            Some(dialog) => Element::Column(vec![card, Element::modal("Enter URL", dialog.view().map(Message::Dialog))]),
            None => card,
        }
    }

    fn status_view(&self) -> Element<Message> {
        match &self.status {
            Status::Idle => Element::Empty,
            Status::Fetching { url } => Element::toned(format!("Downloading {url}..."), Tone::Muted),
            Status::Uploading => Element::toned("Uploading...", Tone::Muted),
            Status::Redirected {
                target,
                prediction,
                saved,
            } => {
                let mut rows = vec![Element::toned(format!("Result: {target}"), Tone::Success)];
                if prediction.is_some() {
                    rows.push(Element::button("save", "Save Prediction", Some(Message::SavePrediction(None))));
                }
                if let Some(path) = saved {
                    rows.push(Element::toned(format!("Saved to {}", path.display()), Tone::Muted));
                }
                Element::Column(rows)
            }
            Status::Failed(error) => Element::toned(error.clone(), Tone::Danger),
        }
    }
}
