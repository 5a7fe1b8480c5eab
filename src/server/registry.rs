//! Connection registry
//!
//! Tracks the active connections of one server and its stop flag. Both live
//! behind a single lock, held only for the admission check, an insert or a
//! removal and never across I/O.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity of an admitted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why an accepted stream was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    Stopped,
    Full,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::Stopped => write!(f, "server is stopped"),
            Refusal::Full => write!(f, "too many open connections"),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    stopped: bool,
    active: HashSet<ConnectionId>,
    next_id: u64,
}

/// Registry for tracking active connections
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
    max_connections: usize,
}

impl ConnectionRegistry {
    pub fn new(max_connections: usize) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            max_connections,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admission check: registers a new connection unless the server is
    /// stopped or already at capacity.
    pub fn admit(&self) -> Result<ConnectionId, Refusal> {
        let mut state = self.lock();

        if state.stopped {
            return Err(Refusal::Stopped);
        }

        if state.active.len() >= self.max_connections {
            return Err(Refusal::Full);
        }

        let id = ConnectionId(state.next_id);
        state.next_id += 1;
        state.active.insert(id);

        Ok(id)
    }

    /// Removes a connection. Returns false if it was not registered, which
    /// makes a second removal of the same connection harmless.
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.lock().active.remove(&id)
    }

    /// Sets the stop flag; no connection is admitted afterwards.
    pub fn stop(&self) {
        self.lock().stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().active.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}
