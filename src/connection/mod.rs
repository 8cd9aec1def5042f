//! # Robot Connection Module
//!
//! Handles the socket link to the robot.
//!
//! This module handles:
//! - Opening a TCP connection to the robot
//! - Line-delimited JSON framing in both directions
//! - Sending encoded commands
//!
//! Reconnect policy is left to the caller.

pub mod link;

pub use link::{send_command, RobotLink};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use crate::error::{DashError, Result};

/// Longest line accepted from the robot (bytes)
pub const MAX_LINE_LENGTH: usize = 1 << 20;

/// Robot connection handler
///
/// Owns one TCP stream framed as newline-delimited text.
pub struct RobotConnection {
    framed: Framed<TcpStream, LinesCodec>,
    peer: String,
}

impl std::fmt::Debug for RobotConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotConnection")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

impl RobotConnection {
    /// Open a connection to the robot
    ///
    /// # Arguments
    ///
    /// * `host` - Robot host name or address
    /// * `port` - Robot TCP port
    ///
    /// # Returns
    ///
    /// * `Result<RobotConnection>` - Connected link or error
    ///
    /// # Errors
    ///
    /// Returns error if the connection is refused or the address does not resolve
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use robot_dash::connection::{RobotConnection, RobotLink};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let mut link = RobotConnection::open("127.0.0.1", 8000).await?;
    ///     while let Some(line) = link.recv_line().await? {
    ///         println!("{}", line);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(host: &str, port: u16) -> Result<Self> {
        let peer = format!("{}:{}", host, port);
        debug!("Connecting to robot at {}", peer);

        let stream = TcpStream::connect(&peer)
            .await
            .map_err(|e| DashError::Connection(format!("Failed to connect to {}: {}", peer, e)))?;
        stream.set_nodelay(true)?;

        info!("Connected to robot at {}", peer);
        Ok(Self {
            framed: Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            peer,
        })
    }

    /// `host:port` this connection was opened with
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl RobotLink for RobotConnection {
    async fn recv_line(&mut self) -> Result<Option<String>> {
        loop {
            match self.framed.next().await {
                Some(Ok(line)) => return Ok(Some(line)),
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!("Discarding line longer than {} bytes", MAX_LINE_LENGTH);
                    continue;
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(DashError::Io(e)),
                None => {
                    info!("Robot at {} closed the connection", self.peer);
                    return Ok(None);
                }
            }
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.framed
            .send(line)
            .await
            .map_err(|e| DashError::Connection(format!("Failed to send line: {}", e)))?;
        debug!("Sent {} bytes to robot", line.len());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        SinkExt::<&str>::close(&mut self.framed)
            .await
            .map_err(|e| DashError::Connection(format!("Failed to close connection: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Command;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_open_refused() {
        let (listener, port) = listener().await;
        drop(listener);

        let result = RobotConnection::open("127.0.0.1", port).await;
        assert!(matches!(result, Err(DashError::Connection(_))));
    }

    #[tokio::test]
    async fn test_recv_lines_until_close() {
        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"{\"type\":\"A\"}\n{\"type\":\"B\"}\n")
                .await
                .unwrap();
        });

        let mut link = RobotConnection::open("127.0.0.1", port).await.unwrap();
        assert_eq!(link.peer(), format!("127.0.0.1:{}", port));
        assert_eq!(link.recv_line().await.unwrap().as_deref(), Some(r#"{"type":"A"}"#));
        assert_eq!(link.recv_line().await.unwrap().as_deref(), Some(r#"{"type":"B"}"#));
        server.await.unwrap();
        assert_eq!(link.recv_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_command_is_newline_terminated() {
        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut lines = BufReader::new(socket).lines();
            lines.next_line().await.unwrap()
        });

        let mut link = RobotConnection::open("127.0.0.1", port).await.unwrap();
        send_command(&mut link, &Command::SetDepositSlideTarget { payload: 12.0 })
            .await
            .unwrap();
        link.close().await.unwrap();

        let received = server.await.unwrap();
        assert_eq!(
            received.as_deref(),
            Some(r#"{"type":"SET_DEPOSIT_SLIDE_TARGET","payload":12.0}"#)
        );
    }
}
