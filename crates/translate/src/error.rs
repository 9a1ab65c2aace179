//! Error types for translation operations.
//!
//! Every reader, writer and transaction failure is one [`Error`] value tagged
//! with an [`ErrorKind`]. The kind decides how the host presents and handles the
//! failure; the error always carries the path of the offending node and, where
//! applicable, the before/after state that triggered it.

use crate::channel::ChannelError;
use crate::path::ConfigPath;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Kinds of translation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No registered handler claims the requested subtree variant
    UnsupportedType,
    /// An update tried to change a field that cannot change in place
    ImmutableFieldChanged,
    /// Create/delete on a resource whose lifecycle the device owns
    ForbiddenLifecycleOperation,
    /// Transport I/O failure or timeout
    ChannelFailure,
    /// A mandatory value could not be parsed from device output
    MalformedDeviceOutput,
    /// A value does not satisfy a format precondition
    InvalidData,
    /// The device answered a write with an error marker
    CommandRejected,
    /// Handler or registry wiring violation
    Contract,
}

impl ErrorKind {
    /// Whether the failure is detected before anything is sent to the device.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType
                | Self::ImmutableFieldChanged
                | Self::ForbiddenLifecycleOperation
                | Self::InvalidData
        )
    }

    /// Whether a host transaction manager may reasonably retry.
    ///
    /// The engine itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChannelFailure)
    }

    /// Short user-facing description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "unsupported type",
            Self::ImmutableFieldChanged => "immutable field changed",
            Self::ForbiddenLifecycleOperation => "forbidden lifecycle operation",
            Self::ChannelFailure => "channel failure",
            Self::MalformedDeviceOutput => "malformed device output",
            Self::InvalidData => "invalid data",
            Self::CommandRejected => "command rejected by device",
            Self::Contract => "handler contract violation",
        }
    }

    /// Actionable advice for operators.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "This device does not support the requested variant",
            Self::ImmutableFieldChanged => {
                "Delete the node and create it again with the new value"
            }
            Self::ForbiddenLifecycleOperation => {
                "The device owns this resource; only its attributes can be changed"
            }
            Self::ChannelFailure => "Check device connectivity and retry the transaction",
            Self::MalformedDeviceOutput => "Compare the device output with the expected format",
            Self::InvalidData => "Fix the value in the requested configuration",
            Self::CommandRejected => "Inspect the device output for the rejected command",
            Self::Contract => "This is a bug in handler wiring",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A translation failure for one node.
#[derive(Debug, Error)]
#[error("{kind} at {path}: {message}")]
pub struct Error {
    kind: ErrorKind,
    path: ConfigPath,
    message: String,
    before: Option<Value>,
    after: Option<Value>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, path: &ConfigPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.clone(),
            message: message.into(),
            before: None,
            after: None,
            source: None,
        }
    }

    pub fn unsupported_type(path: &ConfigPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedType, path, message)
    }

    pub fn forbidden(path: &ConfigPath, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ForbiddenLifecycleOperation, path, reason)
    }

    pub fn malformed(path: &ConfigPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedDeviceOutput, path, message)
    }

    pub fn invalid(path: &ConfigPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidData, path, message)
    }

    pub fn contract(path: &ConfigPath, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Contract, path, message)
    }

    /// An in-place change of `field`, with both values recorded.
    pub fn immutable_field<B, A>(path: &ConfigPath, field: &str, before: &B, after: &A) -> Self
    where
        B: Serialize + ?Sized,
        A: Serialize + ?Sized,
    {
        Self::new(
            ErrorKind::ImmutableFieldChanged,
            path,
            format!("changing {field} is not permitted"),
        )
        .with_before(before)
        .with_after(after)
    }

    /// Wrap a transport failure.
    pub fn channel(path: &ConfigPath, err: ChannelError) -> Self {
        let mut error = Self::new(ErrorKind::ChannelFailure, path, err.to_string());
        error.source = Some(Box::new(err));
        error
    }

    /// The device echoed an error marker for `command`.
    pub fn rejected(path: &ConfigPath, command: &str, output: &str) -> Self {
        Self::new(
            ErrorKind::CommandRejected,
            path,
            format!(
                "device rejected '{}': {}",
                command.lines().next().unwrap_or_default(),
                output.trim()
            ),
        )
    }

    /// Record the state before the change.
    pub fn with_before<T: Serialize + ?Sized>(mut self, before: &T) -> Self {
        self.before = serde_json::to_value(before).ok();
        self
    }

    /// Record the requested state.
    pub fn with_after<T: Serialize + ?Sized>(mut self, after: &T) -> Self {
        self.after = serde_json::to_value(after).ok();
        self
    }

    /// Record before/after state unless already present.
    pub fn fill_states<B, A>(mut self, before: Option<&B>, after: Option<&A>) -> Self
    where
        B: Serialize + ?Sized,
        A: Serialize + ?Sized,
    {
        if self.before.is_none() {
            self.before = before.and_then(|b| serde_json::to_value(b).ok());
        }
        if self.after.is_none() {
            self.after = after.and_then(|a| serde_json::to_value(a).ok());
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn path(&self) -> &ConfigPath {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn before(&self) -> Option<&Value> {
        self.before.as_ref()
    }

    pub fn after(&self) -> Option<&Value> {
        self.after.as_ref()
    }

    /// Shortcut for `self.kind().is_validation()`.
    pub fn is_validation(&self) -> bool {
        self.kind.is_validation()
    }
}

/// Result type for translation operations.
pub type Result<T> = std::result::Result<T, Error>;
