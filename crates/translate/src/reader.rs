//! Node readers.
//!
//! A [`ListReader`] discovers the keys of a list subtree and fills one member;
//! a [`ConfigReader`] fills a non-list node. Both read through a
//! [`ReadContext`], which shares one output cache per transaction so several
//! readers parsing the same `show running-config` cost one round trip.
//!
//! A reader that needs data of another node (the AS number of the BGP process
//! that owns a list) reads it with [`ReadContext::read_node`], which runs the
//! registered reader of that node over the same cache.

use crate::channel::{Channel, ReadCache};
use crate::error::{Error, Result};
use crate::path::ConfigPath;
use crate::registry::Registry;
use crate::snapshot::{Data, Snapshot};
use std::marker::PhantomData;

/// Device access for readers within one transaction.
#[derive(Clone, Copy)]
pub struct ReadContext<'a> {
    channel: &'a dyn Channel,
    cache: &'a ReadCache,
    registry: Option<&'a Registry>,
}

impl<'a> ReadContext<'a> {
    pub fn new(channel: &'a dyn Channel, cache: &'a ReadCache) -> Self {
        Self {
            channel,
            cache,
            registry: None,
        }
    }

    /// Allow [`read_node`](Self::read_node) through the readers of `registry`.
    #[must_use]
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Output of `command`, memoized for the rest of the transaction.
    pub fn read(&self, path: &ConfigPath, command: &str) -> Result<String> {
        self.cache
            .get_or_execute(self.channel, command)
            .map_err(|e| Error::channel(path, e))
    }

    /// Typed attributes of the node at `path`, as its registered reader
    /// reads them.
    ///
    /// `None` when no reader is registered there, a list member does not
    /// exist or a non-list node has nothing set.
    pub fn read_node<U: Data>(&self, path: &ConfigPath) -> Result<Option<U>> {
        let Some(registry) = self.registry else {
            return Err(Error::contract(path, "node reads need a registry in the read context"));
        };
        let Some(reader) = registry.reader_for(path) else {
            log::debug!("no reader registered for {path}");
            return Ok(None);
        };
        if reader.is_list() {
            let Some(key) = path.last_key() else {
                return Err(Error::contract(path, "list member path has no key"));
            };
            if !reader.list_keys(&path.with_key_removed(), self)?.iter().any(|k| k == key) {
                return Ok(None);
            }
        }
        let snapshot = reader.read(path, self)?;
        if snapshot.is_empty() && !reader.is_list() {
            return Ok(None);
        }
        snapshot.to_data(path).map(Some)
    }
}

/// Reader for a keyed list subtree.
pub trait ListReader<T: Data>: Send + Sync {
    /// All existing member keys under `path` (the unkeyed list path).
    ///
    /// Returns an empty list when the subtree is absent on the device.
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>>;

    /// Fill `builder` for the member addressed by `path` (its last segment
    /// carries the key).
    fn populate(&self, path: &ConfigPath, builder: &mut T, ctx: &ReadContext<'_>) -> Result<()>;

    /// Attach completed members to the parent snapshot under `node`.
    fn merge(&self, parent: &mut Snapshot, node: &str, items: Vec<Snapshot>) {
        parent.attach_list(node, items);
    }
}

/// Reader for a single (non-list) node.
pub trait ConfigReader<T: Data>: Send + Sync {
    fn populate(&self, path: &ConfigPath, builder: &mut T, ctx: &ReadContext<'_>) -> Result<()>;
}

/// Reader for subtrees a device unit does not parse yet.
///
/// Lists no keys and leaves builders untouched.
pub struct EmptyReader<T> {
    what: &'static str,
    _data: PhantomData<fn() -> T>,
}

impl<T> EmptyReader<T> {
    pub fn new(what: &'static str) -> Self {
        Self {
            what,
            _data: PhantomData,
        }
    }
}

impl<T: Data> ListReader<T> for EmptyReader<T> {
    fn list_keys(&self, path: &ConfigPath, _ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        log::debug!("{} not read at {path}", self.what);
        Ok(Vec::new())
    }

    fn populate(&self, _path: &ConfigPath, _builder: &mut T, _ctx: &ReadContext<'_>) -> Result<()> {
        Ok(())
    }
}

impl<T: Data> ConfigReader<T> for EmptyReader<T> {
    fn populate(&self, path: &ConfigPath, _builder: &mut T, _ctx: &ReadContext<'_>) -> Result<()> {
        log::debug!("{} not read at {path}", self.what);
        Ok(())
    }
}

/// Read all members of a list as typed data, in key order.
pub fn read_all<T, R>(reader: &R, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<T>>
where
    T: Data,
    R: ListReader<T> + ?Sized,
{
    reader
        .list_keys(path, ctx)?
        .into_iter()
        .map(|key| {
            let mut builder = T::default();
            reader.populate(&path.with_key(key), &mut builder, ctx)?;
            Ok(builder)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannel;
    use crate::error::ErrorKind;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Vrf {
        name: String,
    }

    struct LineReader;

    impl ListReader<Vrf> for LineReader {
        fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
            let out = ctx.read(path, "show vrfs")?;
            Ok(out.lines().map(str::to_string).collect())
        }

        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Vrf,
            _ctx: &ReadContext<'_>,
        ) -> Result<()> {
            builder.name = path.last_key().unwrap_or_default().to_string();
            Ok(())
        }
    }

    #[test]
    fn test_read_uses_cache() {
        let channel = MockChannel::new().with_output("show vrfs", "A\nB");
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let path = ConfigPath::root().child("vrf");

        let vrfs = read_all(&LineReader, &path, &ctx).unwrap();
        let again = read_all(&LineReader, &path, &ctx).unwrap();

        assert_eq!(vrfs, again);
        assert_eq!(vrfs[1].name, "B");
        assert_eq!(channel.executed().len(), 1);
    }

    #[test]
    fn test_channel_failure_is_typed() {
        let channel = MockChannel::new().failing_on("show vrfs");
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let err = LineReader
            .list_keys(&ConfigPath::root().child("vrf"), &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChannelFailure);
    }

    struct AsReader;

    impl ConfigReader<Vrf> for AsReader {
        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Vrf,
            ctx: &ReadContext<'_>,
        ) -> Result<()> {
            let out = ctx.read(path, "show router")?;
            builder.name = out.trim().to_string();
            Ok(())
        }
    }

    /// Names prefixed with the router read through another node.
    struct PrefixedReader;

    impl ListReader<Vrf> for PrefixedReader {
        fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
            let router: Option<Vrf> = ctx.read_node(&ConfigPath::root().child("router"))?;
            let Some(router) = router else {
                return Ok(Vec::new());
            };
            let out = ctx.read(path, "show vrfs")?;
            Ok(out.lines().map(|l| format!("{}-{l}", router.name)).collect())
        }

        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Vrf,
            _ctx: &ReadContext<'_>,
        ) -> Result<()> {
            builder.name = path.last_key().unwrap_or_default().to_string();
            Ok(())
        }
    }

    fn registry() -> Registry {
        let mut builder = Registry::builder();
        builder
            .add_reader(crate::path::PathPattern::new(&["router"]), AsReader)
            .add_list_reader(crate::path::PathPattern::new(&["vrf"]), PrefixedReader);
        builder.build().unwrap()
    }

    #[test]
    fn test_read_node_through_registry() {
        let registry = registry();
        let channel = MockChannel::new()
            .with_output("show router", "r1\n")
            .with_output("show vrfs", "A\nB");
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache).with_registry(&registry);

        let keys = PrefixedReader
            .list_keys(&ConfigPath::root().child("vrf"), &ctx)
            .unwrap();
        assert_eq!(keys, ["r1-A", "r1-B"]);

        let member: Option<Vrf> = ctx
            .read_node(&ConfigPath::root().keyed("vrf", "r1-B"))
            .unwrap();
        assert_eq!(member.unwrap().name, "r1-B");
        assert!(
            ctx.read_node::<Vrf>(&ConfigPath::root().keyed("vrf", "C"))
                .unwrap()
                .is_none()
        );
        // one round trip per command
        assert_eq!(channel.executed().len(), 2);
    }

    #[test]
    fn test_read_node_of_empty_node() {
        let registry = registry();
        let channel = MockChannel::new();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache).with_registry(&registry);

        let router: Option<Vrf> = ctx.read_node(&ConfigPath::root().child("router")).unwrap();
        assert!(router.is_none());
        let keys = PrefixedReader
            .list_keys(&ConfigPath::root().child("vrf"), &ctx)
            .unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn test_read_node_needs_registry() {
        let channel = MockChannel::new();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let err = ctx
            .read_node::<Vrf>(&ConfigPath::root().child("router"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Contract);
    }

    #[test]
    fn test_empty_reader() {
        let channel = MockChannel::new();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let reader = EmptyReader::<Vrf>::new("vlan membership");
        let path = ConfigPath::root().child("vlan");

        assert!(ListReader::list_keys(&reader, &path, &ctx).unwrap().is_empty());
        let mut builder = Vrf::default();
        ConfigReader::populate(&reader, &path, &mut builder, &ctx).unwrap();
        assert_eq!(builder, Vrf::default());
        assert!(channel.executed().is_empty());
    }
}
