//! Node writers.
//!
//! A [`Writer`] turns one node's desired state into the command sequence that
//! achieves it. Writers are pure: they build commands and never touch the
//! channel. Validation (unsupported variants, immutable fields, device-owned
//! lifecycles) happens before any line is built, so a rejected request cannot
//! leave partial configuration behind.

use crate::command::CommandSequence;
use crate::error::Result;
use crate::path::ConfigPath;
use crate::snapshot::{Change, Data, Diff, Snapshot};
use std::collections::HashMap;

/// Create/update/delete for one node type.
pub trait Writer<T: Data>: Send + Sync {
    fn create(&self, path: &ConfigPath, after: &T, ctx: &WriteContext) -> Result<CommandSequence>;

    /// Only fields that differ between `before` and `after` may produce lines.
    fn update(
        &self,
        path: &ConfigPath,
        before: &T,
        after: &T,
        ctx: &WriteContext,
    ) -> Result<CommandSequence>;

    fn delete(&self, path: &ConfigPath, before: &T, ctx: &WriteContext) -> Result<CommandSequence>;
}

/// State of other nodes touched by the same transaction.
///
/// Writers use it to look up parent attributes they need for framing, such as
/// the AS number of the BGP instance a neighbor belongs to.
#[derive(Debug, Clone, Default)]
pub struct WriteContext {
    before: HashMap<ConfigPath, Snapshot>,
    after: HashMap<ConfigPath, Snapshot>,
}

impl WriteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state of `path` before the transaction.
    pub fn with_before(mut self, path: ConfigPath, snapshot: Snapshot) -> Self {
        self.before.insert(path, snapshot);
        self
    }

    /// Record the state of `path` after the transaction.
    pub fn with_after(mut self, path: ConfigPath, snapshot: Snapshot) -> Self {
        self.after.insert(path, snapshot);
        self
    }

    pub(crate) fn insert(
        &mut self,
        path: &ConfigPath,
        before: Option<&Snapshot>,
        after: Option<&Snapshot>,
    ) {
        if let Some(before) = before {
            self.before.insert(path.clone(), before.clone());
        }
        if let Some(after) = after {
            self.after.insert(path.clone(), after.clone());
        }
    }

    /// Typed state of `path` before the transaction, if known.
    pub fn before<U: Data>(&self, path: &ConfigPath) -> Result<Option<U>> {
        self.before.get(path).map(|s| s.to_data(path)).transpose()
    }

    /// Typed state of `path` after the transaction, if known.
    ///
    /// Falls back to the before state for nodes the transaction leaves alone.
    pub fn after<U: Data>(&self, path: &ConfigPath) -> Result<Option<U>> {
        match self.after.get(path) {
            Some(snapshot) => snapshot.to_data(path).map(Some),
            None if self.before.contains_key(path) => self.before(path),
            None => Ok(None),
        }
    }
}

/// Dispatch a diff to the matching writer operation.
///
/// A no-op diff returns the empty sequence without calling the writer. Errors
/// are completed with the diff's before/after state when the writer did not
/// attach them itself.
pub fn apply_diff<T, W>(
    writer: &W,
    path: &ConfigPath,
    diff: &Diff<T>,
    ctx: &WriteContext,
) -> Result<CommandSequence>
where
    T: Data,
    W: Writer<T> + ?Sized,
{
    let result = match (&diff.before, &diff.after, diff.change()) {
        (_, _, Change::Noop) => Ok(CommandSequence::empty()),
        (None, Some(after), _) => writer.create(path, after, ctx),
        (Some(before), Some(after), _) => writer.update(path, before, after, ctx),
        (Some(before), None, _) => writer.delete(path, before, ctx),
        (None, None, _) => Ok(CommandSequence::empty()),
    };
    result.map_err(|e| e.fill_states(diff.before.as_ref(), diff.after.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Frame;
    use crate::error::{Error, ErrorKind};
    use crate::planner::BlockBuilder;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Ldp {
        interface: String,
        #[serde(default)]
        hello: Option<u16>,
    }

    struct LdpWriter;

    impl Writer<Ldp> for LdpWriter {
        fn create(
            &self,
            _path: &ConfigPath,
            after: &Ldp,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(BlockBuilder::new(Frame::new(["configure terminal"], ["end"]))
                .line(format!("mpls ldp router-id {}", after.interface))
                .finish_always())
        }

        fn update(
            &self,
            _path: &ConfigPath,
            before: &Ldp,
            after: &Ldp,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(BlockBuilder::new(Frame::new(["configure terminal"], ["end"]))
                .set_or_no(
                    before.hello.as_ref(),
                    after.hello.as_ref(),
                    |h| format!("mpls ldp hello {h}"),
                    |_| "no mpls ldp hello".into(),
                )
                .finish())
        }

        fn delete(
            &self,
            path: &ConfigPath,
            _before: &Ldp,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Err(Error::forbidden(path, "LDP cannot be removed here"))
        }
    }

    fn ldp(hello: Option<u16>) -> Ldp {
        Ldp {
            interface: "tunnel 1".into(),
            hello,
        }
    }

    fn path() -> ConfigPath {
        ConfigPath::root().child("ldp")
    }

    #[test]
    fn test_noop_does_not_call_writer() {
        let noop = Diff::update(ldp(None), ldp(None));
        let seq = apply_diff(&LdpWriter, &path(), &noop, &WriteContext::new()).unwrap();
        assert!(seq.is_empty());
    }

    #[test]
    fn test_dispatch() {
        let ctx = WriteContext::new();
        let create = apply_diff(&LdpWriter, &path(), &Diff::create(ldp(None)), &ctx).unwrap();
        assert_eq!(create.to_text(), "configure terminal\nmpls ldp router-id tunnel 1\nend\n");

        let update =
            apply_diff(&LdpWriter, &path(), &Diff::update(ldp(Some(5)), ldp(None)), &ctx).unwrap();
        assert_eq!(update.to_text(), "configure terminal\nno mpls ldp hello\nend\n");
    }

    #[test]
    fn test_errors_get_states() {
        let err = apply_diff(&LdpWriter, &path(), &Diff::delete(ldp(Some(5))), &WriteContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ForbiddenLifecycleOperation);
        assert_eq!(err.before().unwrap()["hello"], 5);
        assert!(err.after().is_none());
    }

    #[test]
    fn test_context_lookup() {
        let parent = ConfigPath::root().keyed("bgp", "default");
        let snapshot = Snapshot::from_data(&parent, &ldp(Some(1))).unwrap();
        let ctx = WriteContext::new().with_before(parent.clone(), snapshot);

        let before: Option<Ldp> = ctx.before(&parent).unwrap();
        let after: Option<Ldp> = ctx.after(&parent).unwrap();
        assert_eq!(before, after);
        assert!(ctx.after::<Ldp>(&path()).unwrap().is_none());
    }
}
