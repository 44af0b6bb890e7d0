// crates/strand-daemon/src/state.rs
//
// Node state machine for the Strand daemon.
//
// Valid transitions:
//   Initializing -> Restoring -> Running
//   Any state -> ShuttingDown
//
// Every transition is published on a watch channel so the RPC server can
// report the current state in node/info and node/health.

use std::fmt;

use tokio::sync::watch;

/// Lifecycle states of the daemon node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Loading configuration and identity.
    Initializing,
    /// Rebuilding the registry from disk.
    Restoring,
    /// Serving RPC and re-probing pools.
    Running,
    /// Draining requests before exit.
    ShuttingDown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Restoring => write!(f, "Restoring"),
            NodeState::Running => write!(f, "Running"),
            NodeState::ShuttingDown => write!(f, "ShuttingDown"),
        }
    }
}

/// State machine for managing node lifecycle transitions.
pub struct NodeStateMachine {
    current: NodeState,
    publisher: watch::Sender<String>,
}

impl NodeStateMachine {
    /// Create a new state machine starting in the Initializing state.
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(NodeState::Initializing.to_string());
        Self {
            current: NodeState::Initializing,
            publisher,
        }
    }

    pub fn current(&self) -> &NodeState {
        &self.current
    }

    /// Receiver that always holds the current state's name.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.publisher.subscribe()
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns an error if the transition is not valid.
    pub fn transition(&mut self, new_state: NodeState) -> Result<(), String> {
        let valid = match (&self.current, &new_state) {
            (_, NodeState::ShuttingDown) => true,
            (NodeState::Initializing, NodeState::Restoring) => true,
            (NodeState::Restoring, NodeState::Running) => true,
            _ => false,
        };

        if !valid {
            return Err(format!(
                "Invalid state transition: {} -> {}",
                self.current, new_state
            ));
        }

        tracing::info!("State transition: {} -> {}", self.current, new_state);
        self.current = new_state;
        self.publisher.send_replace(self.current.to_string());
        Ok(())
    }
}

impl Default for NodeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_sequence() {
        let mut sm = NodeStateMachine::new();
        let rx = sm.subscribe();
        assert_eq!(*rx.borrow(), "Initializing");

        sm.transition(NodeState::Restoring).unwrap();
        sm.transition(NodeState::Running).unwrap();
        assert_eq!(sm.current(), &NodeState::Running);
        assert_eq!(*rx.borrow(), "Running");
    }

    #[test]
    fn test_cannot_skip_restore() {
        let mut sm = NodeStateMachine::new();
        assert!(sm.transition(NodeState::Running).is_err());
        assert_eq!(sm.current(), &NodeState::Initializing);
    }

    #[test]
    fn test_shutdown_from_anywhere() {
        let mut sm = NodeStateMachine::new();
        sm.transition(NodeState::ShuttingDown).unwrap();
        assert_eq!(sm.current(), &NodeState::ShuttingDown);
    }
}
