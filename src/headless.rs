use std::path::PathBuf;
use std::process::ExitCode;

use plant_disease_uploader::ui::components::upload_panel::Status;
use plant_disease_uploader::ui::{AppShell, RootMessage, Runtime};
use tracing::{error, info, warn};

/// Select `image`, upload it and follow the redirect, all without a console.
pub async fn run(shell: AppShell, image: PathBuf, save_prediction: Option<PathBuf>) -> color_eyre::Result<ExitCode> {
    let mut runtime = Runtime::new(shell);

    runtime.dispatch(RootMessage::select_path(&image));
    runtime.settle().await;

    if let Status::Failed(e) = runtime.app().panel().status() {
        error!("{}", e);
        return Ok(ExitCode::FAILURE);
    }
    if runtime.app().panel().file().is_none() {
        warn!("{} is empty, nothing to upload", image.display());
        return Ok(ExitCode::FAILURE);
    }

    runtime.dispatch(RootMessage::upload());
    runtime.settle().await;

    match runtime.app().panel().status() {
        Status::Redirected { target, .. } => info!(%target, "upload accepted"),
        Status::Failed(e) => {
            error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
        other => {
            error!(?other, "upload ended without an answer from the server");
            return Ok(ExitCode::FAILURE);
        }
    }

    let Some(path) = save_prediction else {
        return Ok(ExitCode::SUCCESS);
    };

    runtime.dispatch(RootMessage::save_prediction(Some(path)));
    runtime.settle().await;

    match runtime.app().panel().status() {
        Status::Redirected { saved: Some(saved), .. } => {
            info!("saved prediction to {}", saved.display());
            Ok(ExitCode::SUCCESS)
        }
        Status::Failed(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        }
        _ => {
            warn!("the server answer did not name a prediction image");
            Ok(ExitCode::FAILURE)
        }
    }
}
