pub mod file_download;
pub mod file_picker;
pub mod upload_panel;
pub mod url_dialog;
