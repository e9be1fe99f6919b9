//! Saving downloaded files to disk.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::file::SelectedFile;
use crate::ui::components::file_picker::FileExtensions;

/// Asks where to save `file` and writes it there.
///
/// Returns the written path, `Ok(None)` if the user dismissed the dialog.
pub async fn save_with_dialog(file: SelectedFile) -> Result<Option<PathBuf>, String> {
    let extension = Path::new(&file.name)
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    let filter = FileExtensions::of("Images", &[extension.as_str()]);

    let picked = rfd::AsyncFileDialog::new()
        .set_title("Save prediction")
        .set_file_name(&file.name)
        .add_filter(filter.description.clone(), &filter.extensions)
        .save_file()
        .await;

    let Some(handle) = picked else {
        return Ok(None);
    };
    let path = handle.path().to_path_buf();
    let written = write_file(&path, &file).await;
    written.map(|()| Some(path))
}

pub async fn write_file(path: &Path, file: &SelectedFile) -> Result<(), String> {
    tokio::fs::write(path, file.bytes())
        .await
        .map_err(|e| format!("Failed to save {}: {}", path.display(), e))?;
    info!("saved {} to {}", file.name, path.display());
    Ok(())
}
