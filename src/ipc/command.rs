//! Per-request command handle

use std::fmt;

/// Identity of one in-flight request
///
/// Created by the transport for every inbound call and moved into exactly one
/// respond primitive, which consumes it with [`CommandHandle::complete`]. The
/// handle is neither `Clone` nor `Copy`, so a second response for the same
/// request does not type-check.
///
/// Dropping a handle that was never completed means the caller will hang;
/// this is logged as a warning.
pub struct CommandHandle {
    id: u64,
    completed: bool,
}

impl CommandHandle {
    /// Create a handle for the request with the given transport id
    pub fn new(id: u64) -> Self {
        Self {
            id,
            completed: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Mark the request as answered and return its id
    ///
    /// Called by [`Responder`](crate::Responder) implementations once the
    /// response has been emitted.
    pub fn complete(mut self) -> u64 {
        self.completed = true;
        self.id
    }
}

impl fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandHandle").field(&self.id).finish()
    }
}

impl Drop for CommandHandle {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            tracing::warn!(id = self.id, "command handle dropped without a response");
        }
    }
}
