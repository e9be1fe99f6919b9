//! Composition root: the title bar with the upload panel mounted below it.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::error::UploadError;
use crate::settings::Settings;
use crate::ui::components::upload_panel::{self, UploadPanel};
use crate::ui::element::{Element, Tone};
use crate::ui::messages::RootMessage;
use crate::ui::navigator::Navigator;
use crate::ui::runtime::Application;
use crate::ui::task::Task;
use crate::upload::{HttpClient, UploadClient};

pub const TITLE: &str = "Plant Disease Detection";

pub struct AppShell {
    panel: UploadPanel,
    navigator: Arc<dyn Navigator>,
    settings: Settings,
    settings_path: Option<PathBuf>,
    last_navigation: Option<Url>,
}

impl AppShell {
    pub fn new(client: Arc<dyn UploadClient>, navigator: Arc<dyn Navigator>, settings: Settings) -> Self {
        Self {
            panel: UploadPanel::new(client).with_last_directory(settings.last_directory.clone()),
            navigator,
            settings,
            settings_path: None,
            last_navigation: None,
        }
    }

    /// Wires the real HTTP client to the configured server.
    pub fn from_settings(settings: Settings, navigator: Arc<dyn Navigator>) -> Result<Self, UploadError> {
        let client = HttpClient::new(&settings.server_url, settings.request_timeout())?;
        info!(server = %client.server(), "using detection server");
        Ok(Self::new(Arc::new(client), navigator, settings))
    }

    /// Persist settings changes (such as the last picker directory) to `path`.
    pub fn with_settings_path(mut self, path: Option<PathBuf>) -> Self {
        self.settings_path = path;
        self
    }

    pub fn panel(&self) -> &UploadPanel {
        &self.panel
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn last_navigation(&self) -> Option<&Url> {
        self.last_navigation.as_ref()
    }

    fn handle_panel_action(&mut self, action: upload_panel::Action) -> Task<RootMessage> {
        match action {
            upload_panel::Action::None => Task::none(),
            upload_panel::Action::Run(task) => task.map(RootMessage::Panel),
            upload_panel::Action::Navigate(url) => {
                let navigator = self.navigator.clone();
                Task::future(async move {
                    let result = tokio::task::spawn_blocking({
                        let url = url.clone();
                        move || navigator.navigate(&url)
                    })
                    .await;
                    RootMessage::Navigated(match result {
                        Ok(Ok(())) => Ok(url),
                        Ok(Err(e)) => Err(e),
                        Err(e) => Err(e.to_string()),
                    })
                })
            }
            upload_panel::Action::RememberDirectory(dir, task) => {
                self.settings.last_directory = Some(dir);
                Task::batch([task.map(RootMessage::Panel), self.save_settings()])
            }
        }
    }

    fn save_settings(&self) -> Task<RootMessage> {
        let Some(path) = self.settings_path.clone() else {
            return Task::none();
        };
        // only the remembered directory is written back, command line overrides stay out of the file
        let last_directory = self.settings.last_directory.clone();
        Task::consume(async move {
            let mut stored = Settings::load(&path).await;
            stored.last_directory = last_directory;
            stored.save(&path).await
        })
    }
}

impl Application for AppShell {
    type Message = RootMessage;

    fn update(&mut self, message: RootMessage) -> Task<RootMessage> {
        match message {
            RootMessage::Panel(message) => {
                let action = self.panel.update(message);
                self.handle_panel_action(action)
            }
            RootMessage::Navigated(Ok(url)) => {
                self.last_navigation = Some(url);
                self.panel.reset();
                Task::none()
            }
            RootMessage::Navigated(Err(e)) => {
                let action = self.panel.update(upload_panel::Message::NavigationFailed(e));
                self.handle_panel_action(action)
            }
        }
    }

    fn view(&self) -> Element<RootMessage> {
        let mut children = vec![Element::heading(TITLE), self.panel.view().map(RootMessage::Panel)];
        if let Some(url) = &self.last_navigation {
            children.push(Element::toned(format!("Opened {url}"), Tone::Muted));
        }
        Element::Column(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SelectedFile;
    use crate::ui::navigator::Recorder;
    use crate::ui::runtime::Runtime;

    struct FixedClient;

    impl UploadClient for FixedClient {
        fn submit(&self, _file: &SelectedFile) -> Result<Url, UploadError> {
            Ok(Url::parse("http://localhost:5000/result/pred_outcome_leaf").unwrap())
        }

        fn fetch(&self, _url: &str) -> Result<SelectedFile, UploadError> {
            Err(UploadError::Transport("offline".to_string()))
        }
    }

    struct NoBrowser;

    impl Navigator for NoBrowser {
        fn navigate(&self, url: &Url) -> Result<(), String> {
            Err(format!("Failed to open {url}: no browser"))
        }
    }

    fn shell(recorder: &Recorder) -> AppShell {
        AppShell::new(Arc::new(FixedClient), Arc::new(recorder.clone()), Settings::default())
    }

    #[tokio::test]
    async fn upload_navigates_and_discards_the_file() {
        let recorder = Recorder::default();
        let mut runtime = Runtime::new(shell(&recorder));

        runtime.dispatch(RootMessage::select_file(SelectedFile::new("leaf.png", b"hello".to_vec())));
        runtime.settle().await;
        assert!(runtime.app().panel().preview().is_some());

        runtime.dispatch(RootMessage::upload());
        runtime.settle().await;

        let target = Url::parse("http://localhost:5000/result/pred_outcome_leaf").unwrap();
        assert_eq!(recorder.visited(), vec![target.clone()]);
        assert_eq!(runtime.app().last_navigation(), Some(&target));
        assert!(runtime.app().panel().file().is_none());
        assert!(runtime.app().panel().preview().is_none());
    }

    #[tokio::test]
    async fn view_mounts_the_panel_under_the_title() {
        let recorder = Recorder::default();
        let runtime = Runtime::new(shell(&recorder));
        let view = runtime.view();

        assert!(view.render().starts_with("== Plant Disease Detection =="));
        assert!(matches!(
            view.find_button("browse").and_then(|b| b.press()),
            Some(RootMessage::Panel(upload_panel::Message::Browse))
        ));
    }

    #[tokio::test]
    async fn picking_from_a_new_directory_persists_it() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("leaf.png");
        std::fs::write(&image, b"png").unwrap();
        let settings_path = dir.path().join("settings.json");

        let recorder = Recorder::default();
        let mut runtime = Runtime::new(shell(&recorder).with_settings_path(Some(settings_path.clone())));
        runtime.dispatch(RootMessage::select_path(&image));
        runtime.settle().await;

        assert_eq!(runtime.app().settings().last_directory.as_deref(), Some(dir.path()));
        let saved = Settings::load(&settings_path).await;
        assert_eq!(saved.last_directory.as_deref(), Some(dir.path()));
        assert_eq!(runtime.app().panel().file().map(|f| f.name.as_str()), Some("leaf.png"));
    }

    #[tokio::test]
    async fn failed_url_download_is_visible() {
        let recorder = Recorder::default();
        let mut runtime = Runtime::new(shell(&recorder));
        runtime.dispatch(RootMessage::open_url_dialog());
        runtime.dispatch(RootMessage::dialog(
            crate::ui::components::url_dialog::Message::UrlChanged("http://example.com/a.png".to_string()),
        ));
        runtime.dispatch(RootMessage::dialog(crate::ui::components::url_dialog::Message::Save));
        runtime.settle().await;

        assert!(runtime.view().render().contains("[error] request failed: offline"));
        assert!(recorder.visited().is_empty());
    }

    #[tokio::test]
    async fn failed_navigation_is_visible() {
        let mut runtime = Runtime::new(AppShell::new(Arc::new(FixedClient), Arc::new(NoBrowser), Settings::default()));
        runtime.dispatch(RootMessage::select_file(SelectedFile::new("leaf.png", b"hello".to_vec())));
        runtime.dispatch(RootMessage::upload());
        runtime.settle().await;

        assert!(runtime.app().last_navigation().is_none());
        assert!(matches!(
            runtime.app().panel().status(),
            upload_panel::Status::Failed(e) if e.starts_with("could not open the result page")
        ));
        assert!(runtime.view().render().contains("[error] could not open the result page"));
    }
}
