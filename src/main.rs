use std::fs::File;
use std::io;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, LazyLock, Mutex, TryLockResult};

use clap::Parser;
use futures::FutureExt;
use plant_disease_uploader::settings::{default_settings_path, Settings};
use plant_disease_uploader::ui::navigator::{Browser, Navigator, Printer};
use plant_disease_uploader::ui::AppShell;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

mod console;
mod headless;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Send plant photos to a disease detection server")]
struct Args {
    /// Upload this image without the interactive console, print the result page and exit
    #[arg(long, short = 'H', value_name = "FILE")]
    headless: Option<PathBuf>,

    /// In headless mode, also download the prediction image to this path
    #[arg(long, requires = "headless", value_name = "PATH")]
    save_prediction: Option<PathBuf>,

    /// Base URL of the detection server, per default the saved setting or http://127.0.0.1:5000/
    #[arg(short, long)]
    server: Option<String>,

    /// Print result pages instead of opening them in the browser
    #[arg(long)]
    no_open: bool,

    /// How long to wait in seconds for the server before giving up
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the settings file, per default in the local app data folder
    #[arg(long)]
    settings: Option<PathBuf>,

    /// How verbose the output should be, can be set up to 3 times. Has no effect if RUST_LOG is set
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to output log to
    #[arg(short, long)]
    log_path: Option<PathBuf>,
}

impl Args {
    /// Saved settings with command line overrides applied on top.
    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(server) = &self.server {
            settings.server_url = server.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.request_timeout_secs = timeout;
        }
        if self.no_open || self.headless.is_some() {
            settings.open_in_browser = false;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    let old_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        old_hook(panic_info);
        error!("Backtrace: {:#?}", backtrace);
    }));

    let args = Args::parse();
    tracing_init(&args)?;

    debug!(?args);

    // AssertUnwindSafe is justified as all we do is write a crash log before ending the program
    match AssertUnwindSafe(run(args)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            error!("the application panicked, this is a bug");
            write_crashlog(payload.as_ref());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(args: Args) -> color_eyre::Result<ExitCode> {
    let settings_path = args.settings.clone().or_else(default_settings_path);
    let stored = match &settings_path {
        Some(path) => Settings::load(path).await,
        None => Settings::default(),
    };
    let settings = args.apply(stored);

    let navigator: Arc<dyn Navigator> = if settings.open_in_browser {
        Arc::new(Browser)
    } else {
        Arc::new(Printer)
    };
    let shell = AppShell::from_settings(settings, navigator)?.with_settings_path(settings_path);

    match args.headless {
        Some(image) => headless::run(shell, image, args.save_prediction).await,
        None => {
            console::run(shell).await?;
            if let Some(log_path) = args.log_path {
                info!("wrote logs to {}", log_path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn write_crashlog(payload: &(dyn std::any::Any + Send)) {
    let Ok(mut file) = File::create("crashlog.txt") else {
        return;
    };

    let mut contents = match LOG_BUFFER.try_lock() {
        TryLockResult::Ok(buffer) => buffer.join("\n"),
        _ => "failed to lock log buffer".to_string(),
    };
    contents.push_str("\n\n");
    if let Some(s) = payload.downcast_ref::<&str>() {
        contents.push_str(s);
    } else if let Some(s) = payload.downcast_ref::<String>() {
        contents.push_str(s);
    } else {
        contents.push_str("panic: unknown payload type");
    }

    match file.write_all(contents.as_bytes()) {
        Ok(()) => info!("wrote crashlog to crashlog.txt"),
        Err(e) => error!("failed to write crashlog: {}", e),
    }
}

/// Log lines kept in memory for the crash log.
static LOG_BUFFER: LazyLock<Mutex<Vec<String>>> = LazyLock::new(|| Mutex::new(Vec::new()));

struct VecWriter;

impl io::Write for VecWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let str = String::from_utf8_lossy(buf);
        if let Ok(mut buffer) = LOG_BUFFER.lock() {
            buffer.extend(str.lines().map(|s| s.to_string()));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct DualWriter<A: io::Write, B: io::Write> {
    m: Arc<Mutex<(A, B)>>,
}

impl<A: io::Write, B: io::Write> DualWriter<A, B> {
    fn new(a: A, b: B) -> Self {
        Self {
            m: Arc::new(Mutex::new((a, b))),
        }
    }
}

impl<A: io::Write, B: io::Write> io::Write for DualWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut m = self.m.lock().map_err(|_| io::Error::other("log writer poisoned"))?;
        m.0.write_all(buf)?;
        m.1.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut m = self.m.lock().map_err(|_| io::Error::other("log writer poisoned"))?;
        m.0.flush()?;
        m.1.flush()
    }
}

impl<'a, A: io::Write, B: io::Write> MakeWriter<'a> for DualWriter<A, B> {
    type Writer = DualWriter<A, B>;

    fn make_writer(&'a self) -> Self::Writer {
        DualWriter { m: self.m.clone() }
    }
}

// stdout belongs to the console view, so logs go to stderr
fn tracing_init(args: &Args) -> color_eyre::Result<()> {
    tracing_log::LogTracer::init()?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(
            match args.verbose {
                0 => "plant_disease_uploader=info",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
            .parse()?,
        )
        .from_env_lossy();

    let console_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(DualWriter::new(VecWriter, io::stderr()))
        .with_filter(env_filter);

    let file_log = match &args.log_path {
        Some(log_path) => {
            let log_file = File::create(log_path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(Mutex::new(log_file))
                    .with_filter(tracing::level_filters::LevelFilter::TRACE),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry().with(console_log).with(file_log);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
