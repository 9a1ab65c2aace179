//! Command/output channel to a device session.
//!
//! The [`Channel`] trait is the only way the engine talks to a device: one
//! textual command (or one framed multi-line block) in, textual output back.
//! Transport, authentication and prompt handling live behind it.
//!
//! # Testing
//!
//! [`MockChannel`] answers from a scripted command → output table and records
//! every request:
//!
//! ```
//! use translate::channel::{Channel, MockChannel};
//!
//! let channel =
//!     MockChannel::new().with_output("show running-config | include ^ip vrf", "ip vrf A\n");
//! assert_eq!(channel.execute("show running-config | include ^ip vrf").unwrap(), "ip vrf A\n");
//! assert_eq!(channel.executed().len(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// I/O error on the session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No complete answer within the allowed time
    #[error("timed out after {}s waiting for '{command}'", .after.as_secs())]
    Timeout {
        /// First line of the command that timed out
        command: String,
        /// Elapsed wait
        after: Duration,
    },

    /// Session was closed by the peer
    #[error("session closed")]
    Closed,

    /// Any other transport failure
    #[error("{0}")]
    Other(String),
}

/// Synchronous request/response access to one device session.
pub trait Channel: Send + Sync {
    /// Execute a command (or framed block) and return the device output.
    fn execute(&self, command: &str) -> Result<String, ChannelError>;
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn execute(&self, command: &str) -> Result<String, ChannelError> {
        (**self).execute(command)
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn execute(&self, command: &str) -> Result<String, ChannelError> {
        (**self).execute(command)
    }
}

// ============================================================================
// Read cache
// ============================================================================

/// Memoized read outputs for one transaction.
///
/// Dropped together with the transaction that owns it. Only reads go through
/// the cache; write batches always reach the channel.
#[derive(Debug, Default)]
pub struct ReadCache {
    entries: Mutex<HashMap<String, String>>,
    hits: AtomicUsize,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached output for `command`, executing it on a miss.
    ///
    /// The lock is not held while the channel runs, so two parallel readers
    /// missing on the same command may both execute it; the first stored
    /// answer wins.
    pub fn get_or_execute(
        &self,
        channel: &dyn Channel,
        command: &str,
    ) -> Result<String, ChannelError> {
        if let Some(output) = self.lookup(command) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("read cache hit: {command}");
            return Ok(output);
        }

        log::debug!("read: {command}");
        let output = channel.execute(command)?;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .entry(command.to_string())
            .or_insert(output)
            .clone())
    }

    fn lookup(&self, command: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(command)
            .cloned()
    }

    /// Number of cached commands.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every cached output.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of requests answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

// ============================================================================
// Mock
// ============================================================================

/// Scripted channel for tests.
///
/// Unknown commands answer with empty output, which is what a device prints
/// for an `include` filter that matches nothing.
#[derive(Debug, Clone, Default)]
pub struct MockChannel {
    outputs: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `output`.
    pub fn with_output(self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(command.into(), output.into());
        self
    }

    /// Fail with a timeout when `command` is executed.
    pub fn failing_on(self, command: impl Into<String>) -> Self {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(command.into());
        self
    }

    /// Every command received, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Channel for MockChannel {
    fn execute(&self, command: &str) -> Result<String, ChannelError> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.to_string());

        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(command)
        {
            return Err(ChannelError::Timeout {
                command: command.lines().next().unwrap_or_default().to_string(),
                after: Duration::from_secs(30),
            });
        }

        Ok(self
            .outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(command)
            .cloned()
            .unwrap_or_default())
    }
}
