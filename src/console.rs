//! Line-based frontend: renders the view to stdout after every change and turns
//! typed lines into messages.

use std::path::PathBuf;

use plant_disease_uploader::ui::element::Element;
use plant_disease_uploader::ui::{AppShell, RootMessage, Runtime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::debug;

const HELP: &str = "\
:<button>       press the button shown as [:<button>]
:browse <path>  select an image file without the file dialog
:save <path>    save the prediction image to <path>
<text>          type into the open dialog
:help           show this help
:quit           exit";

#[derive(Debug)]
enum Command<M> {
    Dispatch(M),
    Help,
    Quit,
    Redraw,
    Unknown(String),
}

pub async fn run(shell: AppShell) -> color_eyre::Result<()> {
    let mut runtime = Runtime::new(shell);
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());

    draw(&runtime);
    loop {
        tokio::select! {
            line = lines.next() => {
                let Some(line) = line else {
                    debug!("stdin closed");
                    break;
                };
                match parse(&runtime.view(), &line?) {
                    Command::Dispatch(message) => runtime.dispatch(message),
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                    Command::Redraw => {}
                    Command::Unknown(hint) => println!("{hint}"),
                }
                draw(&runtime);
            }
            progressed = runtime.step(), if !runtime.is_idle() => {
                if progressed {
                    draw(&runtime);
                }
            }
        }
    }

    Ok(())
}

fn draw(runtime: &Runtime<AppShell>) {
    println!("\n{}", runtime.view().render());
    println!("(:help for commands)");
}

fn parse(view: &Element<RootMessage>, line: &str) -> Command<RootMessage> {
    let line = line.trim();
    let modal_open = view.find_modal().is_some();

    match line.split_once(' ').map(|(c, a)| (c, a.trim())) {
        Some((":browse", path)) if !modal_open && !path.is_empty() => {
            return Command::Dispatch(RootMessage::select_path(PathBuf::from(path)));
        }
        Some((":save", path)) if !modal_open && !path.is_empty() => {
            if view.find_button("save").is_none() {
                return Command::Unknown("there is no prediction to save yet".to_string());
            }
            return Command::Dispatch(RootMessage::save_prediction(Some(PathBuf::from(path))));
        }
        _ => {}
    }

    interpret(view, line)
}

/// Resolves a line against whatever the view currently shows. An open modal
/// captures every button press and typed text.
fn interpret<M: Clone + 'static>(view: &Element<M>, line: &str) -> Command<M> {
    let scope = view.find_modal().unwrap_or(view);

    match line {
        "" => Command::Redraw,
        ":q" | ":quit" => Command::Quit,
        ":h" | ":help" => Command::Help,
        _ => match line.strip_prefix(':') {
            Some(id) => match scope.find_button(id) {
                Some(button) => match button.press() {
                    Some(message) => Command::Dispatch(message),
                    None => Command::Unknown(format!("{id} is disabled right now")),
                },
                None => Command::Unknown(format!(
                    "no button named {id}, try one of: {}",
                    scope.enabled_buttons().join(", ")
                )),
            },
            None => match scope.first_input() {
                Some(input) if scope.find_modal().is_some() => Command::Dispatch(input.input(line)),
                _ => Command::Unknown("nothing to type into, use :help".to_string()),
            },
        },
    }
}
