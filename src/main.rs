//! # Robot Dash
//!
//! Live dashboard state engine for a competition robot.
//!
//! This application connects to the robot, mirrors the subsystem and
//! telemetry state it pushes, and takes operator commands on stdin.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use robot_dash::config::{Config, LoggingConfig};
use robot_dash::connection::{send_command, RobotConnection, RobotLink};
use robot_dash::console::{execute, parse_command};
use robot_dash::dashboard::Dashboard;
use robot_dash::error::Result as DashResult;
use robot_dash::protocol::Command;
use robot_dash::recording::ReplayStep;
use robot_dash::router::RouteOutcome;

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the daily rolling log
const LOG_FILE_PREFIX: &str = "robot-dash.log";

/// Main entry point for Robot Dash
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging
///    - Build the dashboard from configuration
///
/// 2. **Main Loop**
///    - Apply every line received from the robot
///    - Reconnect when the link is down
///    - Poll robot status while connected
///    - Advance replay on its tick
///    - Run operator commands typed on stdin
///    - Send queued commands to the robot
///
/// 3. **Graceful Shutdown**
///    - Close the robot link on Ctrl+C
///
/// # Errors
///
/// Returns error if the configuration file exists but is invalid
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    let _log_guard = init_logging(&config.logging)?;
    info!("Robot Dash v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut dashboard = Dashboard::from_config(&config);
    let mut link: Option<RobotConnection> = None;

    let mut reconnect_timer = interval(Duration::from_millis(config.connection.reconnect_interval_ms));
    let mut status_timer = interval(Duration::from_millis(config.connection.status_poll_interval_ms));
    let mut replay_timer = interval(dashboard.replay_interval());
    for timer in [&mut reconnect_timer, &mut status_timer, &mut replay_timer] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    info!("Robot at {}, type commands on stdin", config.robot_addr());
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            received = recv(&mut link) => {
                match received {
                    Ok(Some(line)) => {
                        if let RouteOutcome::PassThrough { kind, .. } = dashboard.handle_text(&line) {
                            debug!("Robot message: {}", kind);
                        }
                    }
                    Ok(None) => disconnect(&mut dashboard, &mut link),
                    Err(e) => {
                        warn!("Robot link error: {}", e);
                        disconnect(&mut dashboard, &mut link);
                    }
                }
            }

            _ = reconnect_timer.tick(), if link.is_none() => {
                match RobotConnection::open(&config.connection.host, config.connection.port).await {
                    Ok(connection) => {
                        link = Some(connection);
                        dashboard.set_connected(true);
                    }
                    Err(e) => debug!("{}", e),
                }
            }

            _ = status_timer.tick(), if link.is_some() => {
                dashboard.queue_command(Command::GetRobotStatus);
            }

            _ = replay_timer.tick(), if dashboard.is_replaying() => {
                if dashboard.replay_tick() == ReplayStep::Finished {
                    info!("Replay finished");
                }
            }

            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(command) => match execute(&mut dashboard, command) {
                            Ok(reply) => info!("{}", reply),
                            Err(e) => warn!("Command failed: {}", e),
                        },
                        Err(e) => warn!("{}", e),
                    },
                    Ok(None) => {
                        debug!("stdin closed");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }

        if let Err(e) = flush_commands(&mut dashboard, &mut link).await {
            warn!("Failed to send command: {}", e);
            disconnect(&mut dashboard, &mut link);
        }
    }

    if let Some(mut connection) = link.take() {
        if let Err(e) = connection.close().await {
            debug!("Error closing robot link: {}", e);
        }
    }

    Ok(())
}

/// Load configuration, falling back to defaults when the file is missing
fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        eprintln!("Config file {} not found, using defaults", path);
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("Failed to load config from {}", path))
}

/// Initialize stdout logging, plus a daily log file when `log_dir` is set.
///
/// `RUST_LOG` overrides the configured level. The returned guard must be
/// held for the life of the program so buffered file output is flushed.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    if logging.log_dir.is_empty() {
        registry.init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(&logging.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(Some(guard))
}

/// Next line from the robot; pending forever while disconnected
async fn recv(link: &mut Option<RobotConnection>) -> DashResult<Option<String>> {
    match link {
        Some(connection) => connection.recv_line().await,
        None => std::future::pending().await,
    }
}

fn disconnect(dashboard: &mut Dashboard, link: &mut Option<RobotConnection>) {
    if link.take().is_some() {
        dashboard.set_connected(false);
    }
}

/// Send every queued command over the link
async fn flush_commands(dashboard: &mut Dashboard, link: &mut Option<RobotConnection>) -> DashResult<()> {
    let commands = dashboard.drain_commands();
    let Some(connection) = link.as_mut() else {
        return Ok(());
    };
    for command in &commands {
        send_command(connection, command).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = load_config("/nonexistent/robot-dash.toml").unwrap();
        assert_eq!(config.connection.port, 8000);
        assert_eq!(config.replay.tick_ms, 100);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[connection]\nport = 0\n").unwrap();
        assert!(load_config(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_bundled_default_config_is_valid() {
        let config = load_config(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml")).unwrap();
        assert_eq!(config.robot_addr(), "127.0.0.1:8000");
    }
}
