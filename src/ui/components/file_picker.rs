use std::path::{Path, PathBuf};

use crate::ui::task::Task;

/// File extension filter configuration for native file dialogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtensions {
    pub description: String,
    pub extensions: Vec<String>,
}

impl FileExtensions {
    pub fn of(description: &str, extensions: &[&str]) -> Self {
        Self {
            description: description.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn images() -> Self {
        Self::of("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"])
    }

    pub fn any() -> Self {
        Self::of("All files", &["*"])
    }
}

/// Opens the native picker; resolves to the chosen path, or `None` if the user backed out.
///
/// Images are offered first, but any file can be chosen.
pub fn pick_file(start_in: Option<&Path>) -> Task<Option<PathBuf>> {
    let mut dialog = rfd::AsyncFileDialog::new().set_title("Select plant image");
    for filter in [FileExtensions::images(), FileExtensions::any()] {
        dialog = dialog.add_filter(filter.description.clone(), &filter.extensions);
    }
    if let Some(dir) = start_in {
        dialog = dialog.set_directory(dir);
    }

    Task::future(async move { dialog.pick_file().await.map(|f| f.path().to_path_buf()) })
}
