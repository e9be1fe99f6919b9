pub mod error;
pub mod file;
pub mod scopefns;
pub mod settings;
pub mod ui;
pub mod upload;

pub use error::UploadError;
pub use file::SelectedFile;
pub use settings::Settings;
