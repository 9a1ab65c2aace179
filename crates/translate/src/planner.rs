//! Differential update planning.
//!
//! Writers render commands with a [`BlockBuilder`]: one call per field, each
//! appending zero or one line depending on how that field moved between the
//! before and after state. The builder frames the collected lines exactly once
//! and produces nothing at all when no field changed.
//!
//! ```
//! use translate::command::Frame;
//! use translate::planner::BlockBuilder;
//!
//! let before = Some(9100u32);
//! let after: Option<u32> = None;
//! let frame = Frame::new(["configure terminal", "router mpls", "vll network 41"], ["end"]);
//! let seq = BlockBuilder::new(frame)
//!     .set_or_no(
//!         before.as_ref(),
//!         after.as_ref(),
//!         |m| format!("vll-mtu {m}"),
//!         |m| format!("no vll-mtu {m}"),
//!     )
//!     .finish();
//! assert_eq!(
//!     seq.to_text(),
//!     "configure terminal\nrouter mpls\nvll network 41\nno vll-mtu 9100\nend\n"
//! );
//! ```

use crate::command::{CommandSequence, Frame};
use crate::error::{Error, Result};
use crate::path::ConfigPath;
use serde::Serialize;

/// How one field moved between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field<'a, T> {
    /// Equal in both states (including unset in both)
    Unchanged,
    /// Unset before, set after
    Set(&'a T),
    /// Set in both, with different values
    Changed { old: &'a T, new: &'a T },
    /// Set before, unset after
    Unset(&'a T),
}

impl<'a, T: PartialEq> Field<'a, T> {
    /// Classify a field transition.
    pub fn between(before: Option<&'a T>, after: Option<&'a T>) -> Self {
        match (before, after) {
            (None, None) => Self::Unchanged,
            (None, Some(new)) => Self::Set(new),
            (Some(old), None) => Self::Unset(old),
            (Some(old), Some(new)) if old == new => Self::Unchanged,
            (Some(old), Some(new)) => Self::Changed { old, new },
        }
    }

    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Fail with `ImmutableFieldChanged` if `field` differs between the states.
pub fn ensure_unchanged<T>(path: &ConfigPath, field: &str, before: &T, after: &T) -> Result<()>
where
    T: PartialEq + Serialize + ?Sized,
{
    if before == after {
        Ok(())
    } else {
        Err(Error::immutable_field(path, field, before, after))
    }
}

/// Collects field lines for one framed block.
#[derive(Debug, Clone)]
pub struct BlockBuilder {
    frame: Frame,
    body: Vec<String>,
}

impl BlockBuilder {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            body: Vec::new(),
        }
    }

    /// Append a literal line.
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }

    /// Append a line only when `condition` holds.
    pub fn line_if(self, condition: bool, line: impl Into<String>) -> Self {
        if condition { self.line(line) } else { self }
    }

    /// Render an optional value; nothing when it is unset.
    pub fn opt<T>(self, value: Option<&T>, render: impl FnOnce(&T) -> String) -> Self {
        match value {
            Some(value) => self.line(render(value)),
            None => self,
        }
    }

    /// Emit the positive form for set/changed values and the negative
    /// (no/undo) form, rendered from the old value, when a value is removed.
    pub fn set_or_no<T: PartialEq>(
        self,
        before: Option<&T>,
        after: Option<&T>,
        positive: impl FnOnce(&T) -> String,
        negative: impl FnOnce(&T) -> String,
    ) -> Self {
        match Field::between(before, after) {
            Field::Unchanged => self,
            Field::Set(new) | Field::Changed { new, .. } => self.line(positive(new)),
            Field::Unset(old) => self.line(negative(old)),
        }
    }

    /// Emit `on`/`off` when the effective boolean changed.
    ///
    /// Unset values take `default`, so `None → Some(default)` is no change.
    pub fn flag(
        self,
        before: Option<bool>,
        after: Option<bool>,
        default: bool,
        on: &str,
        off: &str,
    ) -> Self {
        let old = before.unwrap_or(default);
        let new = after.unwrap_or(default);
        if old == new {
            self
        } else if new {
            self.line(on)
        } else {
            self.line(off)
        }
    }

    /// Append lines produced elsewhere (a nested helper).
    pub fn extend<I>(mut self, lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.body.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Whether any field line has been emitted.
    pub fn has_changes(&self) -> bool {
        !self.body.is_empty()
    }

    /// Frame the body, or return the empty sequence when nothing changed.
    pub fn finish(self) -> CommandSequence {
        if self.body.is_empty() {
            return CommandSequence::empty();
        }
        CommandSequence::block(self.frame, self.body)
    }

    /// Frame the body even when it is empty.
    ///
    /// For creates and deletes where entering the context is itself the change.
    pub fn finish_always(self) -> CommandSequence {
        CommandSequence::block(self.frame, self.body)
    }
}
