//! Composite readers and writers.
//!
//! Several handlers can be registered for the same subtree, each owning a
//! variant of it (a network instance is a VRF, a point-to-point link, a VSI or
//! the default instance). The composites here hold those handlers in
//! registration order and pick exactly one per request:
//!
//! - [`CompositeListReader`]: keys are the union of all children; a member is
//!   populated by the first child that lists its key.
//! - [`CompositeConfigReader`]: the first child whose ownership check succeeds
//!   populates the node.
//! - [`CompositeWriter`]: the first child whose discriminator claims the data
//!   handles the request. If none does the request fails with
//!   `UnsupportedType`. An update is routed by its before state; if the after
//!   state is unclaimed or claimed by another child the variant changed and
//!   the update fails with `ImmutableFieldChanged`.
//!
//! [`Claim`] decides from the node's own data. [`ContextClaim`] may also look
//! at other nodes of the transaction when the variant is set by a parent.
//! [`Reserved`] is a writer child that claims a system-owned variant and
//! rejects every mutation of it. It is registered last.

use crate::command::CommandSequence;
use crate::error::{Error, ErrorKind, Result};
use crate::path::ConfigPath;
use crate::reader::{ConfigReader, ListReader, ReadContext};
use crate::snapshot::Data;
use crate::writer::{WriteContext, Writer};
use std::collections::HashSet;

// ============================================================================
// Readers
// ============================================================================

/// Union of several list readers for one list.
pub struct CompositeListReader<T: Data> {
    children: Vec<Box<dyn ListReader<T>>>,
}

impl<T: Data> CompositeListReader<T> {
    pub fn new(children: Vec<Box<dyn ListReader<T>>>) -> Self {
        Self { children }
    }

    fn owner(
        &self,
        path: &ConfigPath,
        ctx: &ReadContext<'_>,
    ) -> Result<Option<&dyn ListReader<T>>> {
        let Some(key) = path.last_key() else {
            return Err(Error::contract(path, "member path has no key"));
        };
        let list = path.with_key_removed();
        for child in &self.children {
            if child.list_keys(&list, ctx)?.iter().any(|k| k == key) {
                return Ok(Some(child.as_ref()));
            }
        }
        Ok(None)
    }
}

impl<T: Data> ListReader<T> for CompositeListReader<T> {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for (index, child) in self.children.iter().enumerate() {
            for key in child.list_keys(path, ctx)? {
                if seen.insert(key.clone()) {
                    keys.push(key);
                } else {
                    log::warn!(
                        "duplicate key '{key}' from reader #{index} at {path}, keeping first owner"
                    );
                }
            }
        }
        Ok(keys)
    }

    fn populate(&self, path: &ConfigPath, builder: &mut T, ctx: &ReadContext<'_>) -> Result<()> {
        match self.owner(path, ctx)? {
            Some(child) => child.populate(path, builder, ctx),
            None => {
                log::debug!("no reader lists {path}, leaving it empty");
                Ok(())
            }
        }
    }
}

/// A config reader that can tell whether it owns a node.
pub trait ConfigReaderChild<T: Data>: ConfigReader<T> {
    fn owns(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<bool>;
}

/// Attach an ownership check to any config reader.
pub struct Guarded<R, F> {
    reader: R,
    guard: F,
}

impl<R, F> Guarded<R, F> {
    pub fn new(reader: R, guard: F) -> Self
    where
        F: Fn(&ConfigPath, &ReadContext<'_>) -> Result<bool> + Send + Sync,
    {
        Self { reader, guard }
    }
}

impl<T, R, F> ConfigReader<T> for Guarded<R, F>
where
    T: Data,
    R: ConfigReader<T>,
    F: Fn(&ConfigPath, &ReadContext<'_>) -> Result<bool> + Send + Sync,
{
    fn populate(&self, path: &ConfigPath, builder: &mut T, ctx: &ReadContext<'_>) -> Result<()> {
        self.reader.populate(path, builder, ctx)
    }
}

impl<T, R, F> ConfigReaderChild<T> for Guarded<R, F>
where
    T: Data,
    R: ConfigReader<T>,
    F: Fn(&ConfigPath, &ReadContext<'_>) -> Result<bool> + Send + Sync,
{
    fn owns(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<bool> {
        (self.guard)(path, ctx)
    }
}

/// First-owner dispatch over config readers.
pub struct CompositeConfigReader<T: Data> {
    children: Vec<Box<dyn ConfigReaderChild<T>>>,
}

impl<T: Data> CompositeConfigReader<T> {
    pub fn new(children: Vec<Box<dyn ConfigReaderChild<T>>>) -> Self {
        Self { children }
    }
}

impl<T: Data> ConfigReader<T> for CompositeConfigReader<T> {
    fn populate(&self, path: &ConfigPath, builder: &mut T, ctx: &ReadContext<'_>) -> Result<()> {
        for child in &self.children {
            if child.owns(path, ctx)? {
                return child.populate(path, builder, ctx);
            }
        }
        log::debug!("no reader owns {path}");
        Ok(())
    }
}

// ============================================================================
// Writers
// ============================================================================

/// A writer that claims the variants it handles.
pub trait WriterChild<T: Data>: Writer<T> {
    /// Pure discriminator: does this child handle `data`?
    ///
    /// `ctx` carries the other nodes of the transaction for variants that are
    /// decided by a parent, such as the type of the owning network instance.
    fn claims(&self, path: &ConfigPath, data: &T, ctx: &WriteContext) -> bool;
}

/// Attach a discriminator to any writer.
pub struct Claim<W, F> {
    writer: W,
    discriminator: F,
}

impl<W, F> Claim<W, F> {
    pub fn new<T>(writer: W, discriminator: F) -> Self
    where
        T: Data,
        W: Writer<T>,
        F: Fn(&ConfigPath, &T) -> bool + Send + Sync,
    {
        Self {
            writer,
            discriminator,
        }
    }
}

impl<T, W, F> Writer<T> for Claim<W, F>
where
    T: Data,
    W: Writer<T>,
    F: Fn(&ConfigPath, &T) -> bool + Send + Sync,
{
    fn create(&self, path: &ConfigPath, after: &T, ctx: &WriteContext) -> Result<CommandSequence> {
        self.writer.create(path, after, ctx)
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &T,
        after: &T,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        self.writer.update(path, before, after, ctx)
    }

    fn delete(&self, path: &ConfigPath, before: &T, ctx: &WriteContext) -> Result<CommandSequence> {
        self.writer.delete(path, before, ctx)
    }
}

impl<T, W, F> WriterChild<T> for Claim<W, F>
where
    T: Data,
    W: Writer<T>,
    F: Fn(&ConfigPath, &T) -> bool + Send + Sync,
{
    fn claims(&self, path: &ConfigPath, data: &T, _ctx: &WriteContext) -> bool {
        (self.discriminator)(path, data)
    }
}

/// Attach a discriminator that looks at other nodes of the transaction.
pub struct ContextClaim<W, F> {
    writer: W,
    discriminator: F,
}

impl<W, F> ContextClaim<W, F> {
    pub fn new<T>(writer: W, discriminator: F) -> Self
    where
        T: Data,
        W: Writer<T>,
        F: Fn(&ConfigPath, &T, &WriteContext) -> bool + Send + Sync,
    {
        Self {
            writer,
            discriminator,
        }
    }
}

impl<T, W, F> Writer<T> for ContextClaim<W, F>
where
    T: Data,
    W: Writer<T>,
    F: Fn(&ConfigPath, &T, &WriteContext) -> bool + Send + Sync,
{
    fn create(&self, path: &ConfigPath, after: &T, ctx: &WriteContext) -> Result<CommandSequence> {
        self.writer.create(path, after, ctx)
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &T,
        after: &T,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        self.writer.update(path, before, after, ctx)
    }

    fn delete(&self, path: &ConfigPath, before: &T, ctx: &WriteContext) -> Result<CommandSequence> {
        self.writer.delete(path, before, ctx)
    }
}

impl<T, W, F> WriterChild<T> for ContextClaim<W, F>
where
    T: Data,
    W: Writer<T>,
    F: Fn(&ConfigPath, &T, &WriteContext) -> bool + Send + Sync,
{
    fn claims(&self, path: &ConfigPath, data: &T, ctx: &WriteContext) -> bool {
        (self.discriminator)(path, data, ctx)
    }
}

/// Claims a system-owned variant and rejects every change to it.
pub struct Reserved<F> {
    reason: &'static str,
    discriminator: F,
}

impl<F> Reserved<F> {
    pub fn new<T>(reason: &'static str, discriminator: F) -> Self
    where
        T: Data,
        F: Fn(&ConfigPath, &T) -> bool + Send + Sync,
    {
        Self {
            reason,
            discriminator,
        }
    }
}

impl<T, F> Writer<T> for Reserved<F>
where
    T: Data,
    F: Fn(&ConfigPath, &T) -> bool + Send + Sync,
{
    fn create(&self, path: &ConfigPath, after: &T, _ctx: &WriteContext) -> Result<CommandSequence> {
        Err(Error::forbidden(path, self.reason).with_after(after))
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &T,
        after: &T,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Err(Error::forbidden(path, self.reason)
            .with_before(before)
            .with_after(after))
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &T,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Err(Error::forbidden(path, self.reason).with_before(before))
    }
}

impl<T, F> WriterChild<T> for Reserved<F>
where
    T: Data,
    F: Fn(&ConfigPath, &T) -> bool + Send + Sync,
{
    fn claims(&self, path: &ConfigPath, data: &T, _ctx: &WriteContext) -> bool {
        (self.discriminator)(path, data)
    }
}

/// Exactly-one-owner dispatch over writers.
pub struct CompositeWriter<T: Data> {
    children: Vec<Box<dyn WriterChild<T>>>,
}

impl<T: Data> CompositeWriter<T> {
    pub fn new(children: Vec<Box<dyn WriterChild<T>>>) -> Self {
        Self { children }
    }

    /// Indexes of every child claiming `data`, in registration order.
    pub fn claimants(&self, path: &ConfigPath, data: &T, ctx: &WriteContext) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.claims(path, data, ctx))
            .map(|(index, _)| index)
            .collect()
    }

    fn select(&self, path: &ConfigPath, data: &T, ctx: &WriteContext) -> Result<usize> {
        let claimants = self.claimants(path, data, ctx);
        match claimants.as_slice() {
            [] => Err(Error::unsupported_type(
                path,
                "no writer handles this variant",
            )),
            [only] => Ok(*only),
            [first, rest @ ..] => {
                log::warn!("{} writers claim {path}, using #{first}", rest.len() + 1);
                Ok(*first)
            }
        }
    }
}

impl<T: Data> Writer<T> for CompositeWriter<T> {
    fn create(&self, path: &ConfigPath, after: &T, ctx: &WriteContext) -> Result<CommandSequence> {
        let index = self.select(path, after, ctx).map_err(|e| e.with_after(after))?;
        self.children[index].create(path, after, ctx)
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &T,
        after: &T,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let index = self
            .select(path, before, ctx)
            .map_err(|e| e.with_before(before).with_after(after))?;
        if self.claimants(path, after, ctx).first() != Some(&index) {
            return Err(Error::new(
                ErrorKind::ImmutableFieldChanged,
                path,
                "changing the variant of an existing node is not permitted",
            )
            .with_before(before)
            .with_after(after));
        }
        self.children[index].update(path, before, after, ctx)
    }

    fn delete(&self, path: &ConfigPath, before: &T, ctx: &WriteContext) -> Result<CommandSequence> {
        let index = self.select(path, before, ctx).map_err(|e| e.with_before(before))?;
        self.children[index].delete(path, before, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MockChannel, ReadCache};
    use crate::command::Frame;
    use crate::planner::BlockBuilder;
    use crate::snapshot::Snapshot;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    enum Kind {
        #[default]
        Vrf,
        P2p,
        Default,
        Bridge,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Instance {
        name: String,
        kind: Kind,
        mtu: Option<u32>,
    }

    struct NamedWriter(&'static str);

    impl Writer<Instance> for NamedWriter {
        fn create(
            &self,
            _path: &ConfigPath,
            after: &Instance,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("{} {}", self.0, after.name)))
        }

        fn update(
            &self,
            _path: &ConfigPath,
            before: &Instance,
            after: &Instance,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(BlockBuilder::new(Frame::new([format!("{} {}", self.0, after.name)], ["exit"]))
                .set_or_no(
                    before.mtu.as_ref(),
                    after.mtu.as_ref(),
                    |m| format!("mtu {m}"),
                    |m| format!("no mtu {m}"),
                )
                .finish())
        }

        fn delete(
            &self,
            _path: &ConfigPath,
            before: &Instance,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("no {} {}", self.0, before.name)))
        }
    }

    fn composite() -> CompositeWriter<Instance> {
        CompositeWriter::new(vec![
            Box::new(Claim::new(NamedWriter("vll"), |_: &ConfigPath, d: &Instance| {
                d.kind == Kind::P2p
            })),
            Box::new(Claim::new(NamedWriter("ip vrf"), |_: &ConfigPath, d: &Instance| {
                d.kind == Kind::Vrf
            })),
            Box::new(Reserved::new(
                "Default network instance cannot be manipulated",
                |_: &ConfigPath, d: &Instance| d.kind == Kind::Default,
            )),
        ])
    }

    fn instance(kind: Kind, mtu: Option<u32>) -> Instance {
        Instance {
            name: "n1".into(),
            kind,
            mtu,
        }
    }

    fn path() -> ConfigPath {
        ConfigPath::root().keyed("network-instance", "n1").child("config")
    }

    #[test]
    fn test_exactly_one_claimant() {
        let writer = composite();
        let ctx = WriteContext::new();
        for kind in [Kind::Vrf, Kind::P2p, Kind::Default] {
            assert_eq!(writer.claimants(&path(), &instance(kind, None), &ctx).len(), 1);
        }
        assert!(
            writer
                .claimants(&path(), &instance(Kind::Bridge, None), &ctx)
                .is_empty()
        );
    }

    #[test]
    fn test_dispatch_by_discriminator() {
        let ctx = WriteContext::new();
        let seq = composite().create(&path(), &instance(Kind::P2p, None), &ctx).unwrap();
        assert_eq!(seq.to_text(), "vll n1\n");
        let seq = composite().delete(&path(), &instance(Kind::Vrf, None), &ctx).unwrap();
        assert_eq!(seq.to_text(), "no ip vrf n1\n");
    }

    #[test]
    fn test_unclaimed_is_unsupported() {
        let err = composite()
            .create(&path(), &instance(Kind::Bridge, None), &WriteContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert!(err.after().is_some());
    }

    #[test]
    fn test_reserved_rejects_everything() {
        let ctx = WriteContext::new();
        let default = instance(Kind::Default, None);
        for result in [
            composite().create(&path(), &default, &ctx),
            composite().update(&path(), &default, &instance(Kind::Default, Some(1)), &ctx),
            composite().delete(&path(), &default, &ctx),
        ] {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::ForbiddenLifecycleOperation);
        }
    }

    #[test]
    fn test_claim_from_parent_in_context() {
        let parent = ConfigPath::root().keyed("network-instance", "n1").child("config");
        let points = ConfigPath::root()
            .keyed("network-instance", "n1")
            .child("connection-points");
        let parent_is = |kind: Kind| {
            let parent = parent.clone();
            move |_: &ConfigPath, _: &Instance, ctx: &WriteContext| {
                ctx.after::<Instance>(&parent)
                    .ok()
                    .flatten()
                    .is_some_and(|p| p.kind == kind)
            }
        };
        let writer: CompositeWriter<Instance> = CompositeWriter::new(vec![
            Box::new(ContextClaim::new(NamedWriter("vll"), parent_is(Kind::P2p))),
            Box::new(ContextClaim::new(NamedWriter("vpls"), parent_is(Kind::Bridge))),
        ]);

        let snapshot = Snapshot::from_data(&parent, &instance(Kind::Bridge, None)).unwrap();
        let ctx = WriteContext::new().with_after(parent.clone(), snapshot);
        let seq = writer.create(&points, &instance(Kind::Vrf, None), &ctx).unwrap();
        assert_eq!(seq.to_text(), "vpls n1\n");

        let err = writer
            .create(&points, &instance(Kind::Vrf, None), &WriteContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn test_variant_change_is_immutable() {
        let before = instance(Kind::P2p, Some(9100));
        let err = composite()
            .update(&path(), &before, &instance(Kind::Vrf, None), &WriteContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableFieldChanged);
        assert_eq!(err.before().unwrap()["kind"], "P2p");
        assert_eq!(err.after().unwrap()["kind"], "Vrf");

        // a kind no child writes is still a change of variant
        let err = composite()
            .update(
                &path(),
                &instance(Kind::Vrf, None),
                &instance(Kind::Bridge, None),
                &WriteContext::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableFieldChanged);
        assert_eq!(err.before().unwrap()["kind"], "Vrf");
        assert_eq!(err.after().unwrap()["kind"], "Bridge");
    }

    #[test]
    fn test_update_noop() {
        let x = instance(Kind::P2p, Some(9100));
        let seq = composite().update(&path(), &x, &x, &WriteContext::new()).unwrap();
        assert!(seq.is_empty());
    }

    // ------------------------------------------------------------------------

    struct Fixed(&'static [&'static str], &'static str);

    impl ListReader<Instance> for Fixed {
        fn list_keys(&self, _path: &ConfigPath, _ctx: &ReadContext<'_>) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|k| (*k).to_string()).collect())
        }

        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Instance,
            _ctx: &ReadContext<'_>,
        ) -> Result<()> {
            builder.name = format!("{}:{}", self.1, path.last_key().unwrap_or_default());
            Ok(())
        }
    }

    #[test]
    fn test_list_union_first_owner_wins() {
        let channel = MockChannel::new();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let reader = CompositeListReader::new(vec![
            Box::new(Fixed(&["a", "b"], "first")),
            Box::new(Fixed(&["b", "c"], "second")),
        ]);
        let list = ConfigPath::root().child("network-instance");

        assert_eq!(reader.list_keys(&list, &ctx).unwrap(), vec!["a", "b", "c"]);

        let mut builder = Instance::default();
        reader.populate(&list.with_key("b"), &mut builder, &ctx).unwrap();
        assert_eq!(builder.name, "first:b");

        let mut builder = Instance::default();
        reader.populate(&list.with_key("c"), &mut builder, &ctx).unwrap();
        assert_eq!(builder.name, "second:c");

        let mut builder = Instance::default();
        reader.populate(&list.with_key("zzz"), &mut builder, &ctx).unwrap();
        assert_eq!(builder, Instance::default());
    }

    struct MtuReader(u32);

    impl ConfigReader<Instance> for MtuReader {
        fn populate(
            &self,
            _path: &ConfigPath,
            builder: &mut Instance,
            _ctx: &ReadContext<'_>,
        ) -> Result<()> {
            builder.mtu = Some(self.0);
            Ok(())
        }
    }

    #[test]
    fn test_config_reader_first_owner() {
        let channel = MockChannel::new().with_output("show vll", "vll n1 41\n");
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let reader = CompositeConfigReader::new(vec![
            Box::new(Guarded::new(MtuReader(1), |path: &ConfigPath, ctx: &ReadContext<'_>| {
                Ok(ctx.read(path, "show vll")?.contains("vll n1 "))
            })),
            Box::new(Guarded::new(MtuReader(2), |_: &ConfigPath, _: &ReadContext<'_>| Ok(true))),
        ]);

        let mut builder = Instance::default();
        reader.populate(&path(), &mut builder, &ctx).unwrap();
        assert_eq!(builder.mtu, Some(1));
    }
}
