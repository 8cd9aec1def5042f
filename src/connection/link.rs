//! Trait abstraction for the robot link to enable testing

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::Command;

/// Line-oriented link to the robot
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RobotLink: Send {
    /// Receive the next line (without the trailing newline).
    ///
    /// Returns `Ok(None)` once the robot closes the connection.
    async fn recv_line(&mut self) -> Result<Option<String>>;

    /// Send one line; the newline is appended by the link.
    async fn send_line(&mut self, line: &str) -> Result<()>;

    /// Flush and close the link
    async fn close(&mut self) -> Result<()>;
}

/// Encode `command` and send it over `link`.
///
/// # Errors
///
/// Returns error if encoding or the write fails
pub async fn send_command<L>(link: &mut L, command: &Command) -> Result<()>
where
    L: RobotLink + ?Sized,
{
    let line = command.encode()?;
    link.send_line(&line).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_send_command_writes_encoded_line() {
        let mut link = MockRobotLink::new();
        link.expect_send_line()
            .with(eq(r#"{"type":"START_OP_MODE"}"#))
            .times(1)
            .returning(|_| Ok(()));

        send_command(&mut link, &Command::StartOpMode).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_command_propagates_write_error() {
        let mut link = MockRobotLink::new();
        link.expect_send_line()
            .returning(|_| Err(DashError::Connection("Mock write error".to_string())));

        let result = send_command(&mut link, &Command::GetRobotStatus).await;
        assert!(matches!(result, Err(DashError::Connection(_))));
    }

    #[test]
    fn test_send_command_through_trait_object() {
        let mut link = MockRobotLink::new();
        link.expect_send_line().times(1).returning(|_| Ok(()));
        let link: &mut dyn RobotLink = &mut link;

        tokio_test::block_on(send_command(link, &Command::StopOpMode)).unwrap();
    }
}
