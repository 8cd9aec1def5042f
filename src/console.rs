//! # Operator Console
//!
//! Maps lines typed on stdin to dashboard commands.
//!
//! ## Commands
//!
//! | Input | Action |
//! |-------|--------|
//! | `pause` | Toggle pause/resume |
//! | `record` / `stop-record` | Start/stop a recording session |
//! | `replay <n>` / `stop-replay` | Start/cancel replay of recording `n` |
//! | `export <n> [dir]` | Write recording `n` to `dir` (default `.`) |
//! | `import <path>` | Load an exported recording |
//! | `graph <id> <section.key> [title]` | Add a graph with the default window |
//! | `ungraph <id>` | Remove a graph |
//! | `show <section>` / `hide <section>` | Section visibility |
//! | `intake <target>` / `deposit <target>` | Send a slide target |
//! | `init <opmode>` / `start` / `stop` | Op mode control |
//! | `reset` | Reset session state |
//! | `status` | Print the dashboard status |
//!
//! ## Usage
//!
//! ```
//! use robot_dash::console::{parse_command, ConsoleCommand};
//!
//! assert_eq!(parse_command("replay 2"), Ok(ConsoleCommand::StartReplay(2)));
//! assert!(parse_command("replay").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::protocol::Command;
use crate::telemetry::SectionId;

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    TogglePause,
    StartRecording,
    StopRecording,
    StartReplay(usize),
    StopReplay,
    Export { index: usize, dir: PathBuf },
    Import(PathBuf),
    AddGraph { id: String, data_key: String, title: String },
    RemoveGraph(String),
    SectionVisible { section: SectionId, visible: bool },
    Robot(Command),
    Reset,
    Status,
}

/// Why a console line was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsoleError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Parse one console line
///
/// # Errors
///
/// Returns error for an unknown command or bad arguments
pub fn parse_command(line: &str) -> std::result::Result<ConsoleCommand, ConsoleError> {
    let mut words = line.split_whitespace();
    let verb = words.next().ok_or(ConsoleError::Empty)?;

    let command = match verb {
        "pause" | "resume" => ConsoleCommand::TogglePause,
        "record" => ConsoleCommand::StartRecording,
        "stop-record" => ConsoleCommand::StopRecording,
        "replay" => ConsoleCommand::StartReplay(parse_arg(words.next(), "replay")?),
        "stop-replay" => ConsoleCommand::StopReplay,
        "export" => ConsoleCommand::Export {
            index: parse_arg(words.next(), "export")?,
            dir: PathBuf::from(words.next().unwrap_or(".")),
        },
        "import" => ConsoleCommand::Import(PathBuf::from(require(words.next(), "import")?)),
        "graph" => {
            let id = require(words.next(), "graph")?.to_string();
            let data_key = require(words.next(), "graph")?.to_string();
            let rest: Vec<&str> = words.by_ref().collect();
            let title = if rest.is_empty() { data_key.clone() } else { rest.join(" ") };
            ConsoleCommand::AddGraph { id, data_key, title }
        }
        "ungraph" => ConsoleCommand::RemoveGraph(require(words.next(), "ungraph")?.to_string()),
        "show" => ConsoleCommand::SectionVisible {
            section: parse_arg(words.next(), "show")?,
            visible: true,
        },
        "hide" => ConsoleCommand::SectionVisible {
            section: parse_arg(words.next(), "hide")?,
            visible: false,
        },
        "intake" => ConsoleCommand::Robot(Command::SetIntakeSlideTarget {
            payload: parse_arg(words.next(), "intake")?,
        }),
        "deposit" => ConsoleCommand::Robot(Command::SetDepositSlideTarget {
            payload: parse_arg(words.next(), "deposit")?,
        }),
        "init" => ConsoleCommand::Robot(Command::InitOpMode {
            op_mode_name: require(words.next(), "init")?.to_string(),
        }),
        "start" => ConsoleCommand::Robot(Command::StartOpMode),
        "stop" => ConsoleCommand::Robot(Command::StopOpMode),
        "reset" => ConsoleCommand::Reset,
        "status" => ConsoleCommand::Status,
        other => return Err(ConsoleError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn require<'a>(word: Option<&'a str>, verb: &'static str) -> std::result::Result<&'a str, ConsoleError> {
    word.ok_or(ConsoleError::MissingArgument(verb))
}

fn parse_arg<T: std::str::FromStr>(word: Option<&str>, verb: &'static str) -> std::result::Result<T, ConsoleError> {
    let word = require(word, verb)?;
    word.parse()
        .map_err(|_| ConsoleError::InvalidArgument(word.to_string()))
}

/// Apply a console command to the dashboard.
///
/// # Returns
///
/// * `Result<String>` - Human readable outcome
///
/// # Errors
///
/// Returns error only for file I/O (export/import) and status encoding
pub fn execute(dashboard: &mut Dashboard, command: ConsoleCommand) -> Result<String> {
    let reply = match command {
        ConsoleCommand::TogglePause => {
            let state = if dashboard.toggle_pause() { "paused" } else { "resumed" };
            state.to_string()
        }
        ConsoleCommand::StartRecording => {
            if dashboard.start_recording() {
                "recording".to_string()
            } else {
                "cannot start recording".to_string()
            }
        }
        ConsoleCommand::StopRecording => match dashboard.stop_recording() {
            Some(index) => format!("saved recording {}", index),
            None => "nothing recorded".to_string(),
        },
        ConsoleCommand::StartReplay(index) => {
            if dashboard.start_replay(index) {
                format!("replaying recording {}", index)
            } else {
                format!("cannot replay recording {}", index)
            }
        }
        ConsoleCommand::StopReplay => {
            let reply = if dashboard.stop_replay() { "replay stopped" } else { "no replay running" };
            reply.to_string()
        }
        ConsoleCommand::Export { index, dir } => {
            let path = dashboard.export_recording_to_file(index, dir)?;
            format!("exported to {}", path.display())
        }
        ConsoleCommand::Import(path) => match dashboard.import_recording(path)? {
            Some(index) => format!("imported as recording {}", index),
            None => "recording is empty".to_string(),
        },
        ConsoleCommand::AddGraph { id, data_key, title } => {
            dashboard.add_graph_for_key(&id, &title, &data_key);
            format!("graph {} plots {}", id, data_key)
        }
        ConsoleCommand::RemoveGraph(id) => {
            if dashboard.remove_graph(&id) {
                format!("graph {} removed", id)
            } else {
                format!("no graph {}", id)
            }
        }
        ConsoleCommand::SectionVisible { section, visible } => {
            dashboard.set_section_visible(section, visible);
            format!("{} {}", section.display_name(), if visible { "shown" } else { "hidden" })
        }
        ConsoleCommand::Robot(command) => {
            let label = format!("{:?}", command);
            if dashboard.queue_command(command) {
                format!("sent {}", label)
            } else {
                "not connected".to_string()
            }
        }
        ConsoleCommand::Reset => {
            dashboard.reset_session();
            "session reset".to_string()
        }
        ConsoleCommand::Status => serde_json::to_string(&dashboard.status())?,
    };
    Ok(reply)
}
