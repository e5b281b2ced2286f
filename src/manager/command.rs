//! Commands issued by a front end, run as explicit tasks.

use tokio::task::JoinHandle;

use super::ConnectionManager;
use crate::job::PrintJob;

/// Whether an operation's guard let it run.
///
/// `Accepted` says nothing about success; the outcome is in the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dispatch {
    Accepted,
    Rejected,
}

impl Dispatch {
    pub fn is_accepted(self) -> bool {
        self == Dispatch::Accepted
    }
}

/// A button press.
#[derive(Debug, Clone)]
pub enum Command {
    Init,
    Scan,
    Connect,
    Disconnect,
    Print(PrintJob),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Scan => "scan",
            Command::Connect => "connect",
            Command::Disconnect => "disconnect",
            Command::Print(_) => "print",
        }
    }
}

impl ConnectionManager {
    /// Run `command` to completion on the current task.
    pub async fn dispatch(&self, command: Command) -> Dispatch {
        let name = command.name();
        let dispatch = match command {
            Command::Init => self.init().await,
            Command::Scan => self.scan_for_printers().await,
            Command::Connect => self.connect().await,
            Command::Disconnect => self.disconnect().await,
            Command::Print(job) => self.print(job).await,
        };
        tracing::debug!(command = name, ?dispatch, "command finished");
        dispatch
    }

    /// Run `command` as a tokio task.
    ///
    /// Aborting the handle cancels the operation; the status falls back to
    /// the phase the operation started from (Connected for a print).
    pub fn spawn(&self, command: Command) -> JoinHandle<Dispatch> {
        let manager = self.clone();
        tokio::spawn(async move { manager.dispatch(command).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::manager::ManagerConfig;
    use crate::status::Phase;
    use crate::transport::SimulatedTransport;

    #[tokio::test]
    async fn test_spawned_commands_report_dispatch() {
        let manager = ConnectionManager::new(Arc::new(SimulatedTransport::new()), ManagerConfig::default());

        assert_eq!(manager.spawn(Command::Init).await.unwrap(), Dispatch::Accepted);
        assert_eq!(manager.spawn(Command::Connect).await.unwrap(), Dispatch::Rejected);
        assert_eq!(manager.spawn(Command::Scan).await.unwrap(), Dispatch::Accepted);
        assert_eq!(manager.spawn(Command::Connect).await.unwrap(), Dispatch::Accepted);
        assert_eq!(manager.status().phase, Phase::Connected);
        assert_eq!(manager.spawn(Command::Disconnect).await.unwrap(), Dispatch::Accepted);
        assert_eq!(manager.status().phase, Phase::Disconnected);
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Command::Scan.name(), "scan");
        assert!(Dispatch::Accepted.is_accepted());
        assert!(!Dispatch::Rejected.is_accepted());
    }
}
