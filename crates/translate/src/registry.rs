//! Handler registration.
//!
//! A [`Registry`] maps path patterns to the readers and writers of one device
//! type. It is assembled once with a [`RegistryBuilder`] and is immutable
//! afterwards, so it can be shared across threads and transactions.
//!
//! Writers carry ordering constraints. `add_writer_after(a, .., &[b])` means
//! changes at `b` are written before changes at `a` (an interface must exist
//! before its sub-interfaces are configured). [`Registry::write_order`] is the
//! resulting topological order; registration order breaks ties.
//!
//! A subtree writer also covers every path nested below its pattern, so the
//! host does not dispatch those children separately.

use crate::command::CommandSequence;
use crate::error::{Error, Result};
use crate::path::{ConfigPath, PathPattern};
use crate::reader::{ConfigReader, ListReader, ReadContext};
use crate::snapshot::{Change, Data, Diff, Snapshot};
use crate::writer::{WriteContext, Writer, apply_diff};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

// ============================================================================
// Type-erased handlers
// ============================================================================

/// Reader working on snapshots instead of typed data.
pub(crate) trait ErasedReader: Send + Sync {
    fn is_list(&self) -> bool;
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>>;
    fn read(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Snapshot>;
    fn merge(&self, parent: &mut Snapshot, node: &str, items: Vec<Snapshot>);
}

/// Writer working on snapshots instead of typed data.
pub(crate) trait ErasedWriter: Send + Sync {
    fn write(
        &self,
        path: &ConfigPath,
        before: Option<&Snapshot>,
        after: Option<&Snapshot>,
        ctx: &WriteContext,
    ) -> Result<(Change, CommandSequence)>;
}

struct ListAdapter<T, R> {
    reader: R,
    _data: PhantomData<fn() -> T>,
}

impl<T: Data, R: ListReader<T>> ErasedReader for ListAdapter<T, R> {
    fn is_list(&self) -> bool {
        true
    }

    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        self.reader.list_keys(path, ctx)
    }

    fn read(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Snapshot> {
        let mut builder = T::default();
        self.reader.populate(path, &mut builder, ctx)?;
        Snapshot::from_data(path, &builder)
    }

    fn merge(&self, parent: &mut Snapshot, node: &str, items: Vec<Snapshot>) {
        self.reader.merge(parent, node, items);
    }
}

struct ConfigAdapter<T, R> {
    reader: R,
    _data: PhantomData<fn() -> T>,
}

impl<T: Data, R: ConfigReader<T>> ErasedReader for ConfigAdapter<T, R> {
    fn is_list(&self) -> bool {
        false
    }

    fn list_keys(&self, _path: &ConfigPath, _ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn read(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Snapshot> {
        let mut builder = T::default();
        self.reader.populate(path, &mut builder, ctx)?;
        if builder == T::default() {
            return Ok(Snapshot::new());
        }
        Snapshot::from_data(path, &builder)
    }

    fn merge(&self, parent: &mut Snapshot, node: &str, items: Vec<Snapshot>) {
        for item in items {
            if !item.is_empty() {
                parent.attach_child(node, item);
            }
        }
    }
}

struct WriterAdapter<T, W> {
    writer: W,
    _data: PhantomData<fn() -> T>,
}

impl<T: Data, W: Writer<T>> ErasedWriter for WriterAdapter<T, W> {
    fn write(
        &self,
        path: &ConfigPath,
        before: Option<&Snapshot>,
        after: Option<&Snapshot>,
        ctx: &WriteContext,
    ) -> Result<(Change, CommandSequence)> {
        let diff: Diff<T> = Diff::new(
            before.map(|s| s.to_data(path)).transpose()?,
            after.map(|s| s.to_data(path)).transpose()?,
        );
        let commands = apply_diff(&self.writer, path, &diff, ctx)?;
        Ok((diff.change(), commands))
    }
}

// ============================================================================
// Builder
// ============================================================================

struct ReaderEntry {
    pattern: PathPattern,
    reader: Box<dyn ErasedReader>,
}

struct WriterEntry {
    pattern: PathPattern,
    writer: Box<dyn ErasedWriter>,
    subtree: bool,
    after: Vec<PathPattern>,
    before: Vec<PathPattern>,
}

/// Collects handler registrations for one device type.
#[derive(Default)]
pub struct RegistryBuilder {
    readers: Vec<ReaderEntry>,
    writers: Vec<WriterEntry>,
    duplicates: Vec<PathPattern>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reader for a list subtree.
    pub fn add_list_reader<T, R>(&mut self, pattern: PathPattern, reader: R) -> &mut Self
    where
        T: Data,
        R: ListReader<T> + 'static,
    {
        self.push_reader(
            pattern,
            Box::new(ListAdapter {
                reader,
                _data: PhantomData,
            }),
        )
    }

    /// Register a reader for a non-list node.
    pub fn add_reader<T, R>(&mut self, pattern: PathPattern, reader: R) -> &mut Self
    where
        T: Data,
        R: ConfigReader<T> + 'static,
    {
        self.push_reader(
            pattern,
            Box::new(ConfigAdapter {
                reader,
                _data: PhantomData,
            }),
        )
    }

    /// Register a writer without ordering constraints.
    pub fn add_writer<T, W>(&mut self, pattern: PathPattern, writer: W) -> &mut Self
    where
        T: Data,
        W: Writer<T> + 'static,
    {
        self.push_writer(pattern, writer, false, Vec::new(), Vec::new())
    }

    /// Register a writer that runs after the writers of `after`.
    pub fn add_writer_after<T, W>(
        &mut self,
        pattern: PathPattern,
        writer: W,
        after: &[PathPattern],
    ) -> &mut Self
    where
        T: Data,
        W: Writer<T> + 'static,
    {
        self.push_writer(pattern, writer, false, after.to_vec(), Vec::new())
    }

    /// Register a writer that runs before the writers of `before`.
    pub fn add_writer_before<T, W>(
        &mut self,
        pattern: PathPattern,
        writer: W,
        before: &[PathPattern],
    ) -> &mut Self
    where
        T: Data,
        W: Writer<T> + 'static,
    {
        self.push_writer(pattern, writer, false, Vec::new(), before.to_vec())
    }

    /// Register a writer that also covers everything nested below `pattern`.
    pub fn subtree_add_writer_after<T, W>(
        &mut self,
        pattern: PathPattern,
        writer: W,
        after: &[PathPattern],
    ) -> &mut Self
    where
        T: Data,
        W: Writer<T> + 'static,
    {
        self.push_writer(pattern, writer, true, after.to_vec(), Vec::new())
    }

    fn push_reader(&mut self, pattern: PathPattern, reader: Box<dyn ErasedReader>) -> &mut Self {
        if self.readers.iter().any(|e| e.pattern == pattern) {
            self.duplicates.push(pattern);
            return self;
        }
        self.readers.push(ReaderEntry { pattern, reader });
        self
    }

    fn push_writer<T, W>(
        &mut self,
        pattern: PathPattern,
        writer: W,
        subtree: bool,
        after: Vec<PathPattern>,
        before: Vec<PathPattern>,
    ) -> &mut Self
    where
        T: Data,
        W: Writer<T> + 'static,
    {
        if self.writers.iter().any(|e| e.pattern == pattern) {
            self.duplicates.push(pattern);
            return self;
        }
        self.writers.push(WriterEntry {
            pattern,
            writer: Box::new(WriterAdapter {
                writer,
                _data: PhantomData,
            }),
            subtree,
            after,
            before,
        });
        self
    }

    /// Validate and freeze the registrations.
    ///
    /// Fails on duplicate patterns and on cyclic writer ordering.
    /// Dependencies on patterns nobody registered are ignored.
    pub fn build(self) -> Result<Registry> {
        if let Some(pattern) = self.duplicates.first() {
            return Err(Error::contract(
                &ConfigPath::root(),
                format!("handler registered twice for {pattern}"),
            ));
        }
        let writers = order_writers(self.writers)?;
        log::debug!(
            "registry built: {} readers, {} writers",
            self.readers.len(),
            writers.len()
        );
        Ok(Registry {
            readers: self.readers,
            writers,
        })
    }
}

/// Stable topological sort (Kahn) of writer entries.
fn order_writers(entries: Vec<WriterEntry>) -> Result<Vec<WriterEntry>> {
    let index: HashMap<PathPattern, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.pattern.clone(), i))
        .collect();

    // edges[a] contains b when a must be written before b
    let mut edges: Vec<HashSet<usize>> = vec![HashSet::new(); entries.len()];
    for (i, entry) in entries.iter().enumerate() {
        for dep in &entry.after {
            match index.get(dep) {
                Some(&d) => {
                    edges[d].insert(i);
                }
                None => log::debug!("{} depends on unregistered {dep}", entry.pattern),
            }
        }
        for dep in &entry.before {
            match index.get(dep) {
                Some(&d) => {
                    edges[i].insert(d);
                }
                None => log::debug!("{} precedes unregistered {dep}", entry.pattern),
            }
        }
    }

    let mut incoming = vec![0usize; entries.len()];
    for targets in &edges {
        for &t in targets {
            incoming[t] += 1;
        }
    }

    let mut order = Vec::with_capacity(entries.len());
    let mut done = vec![false; entries.len()];
    while order.len() < entries.len() {
        let Some(next) = (0..entries.len()).find(|&i| !done[i] && incoming[i] == 0) else {
            let stuck: Vec<String> = (0..entries.len())
                .filter(|&i| !done[i])
                .map(|i| entries[i].pattern.to_string())
                .collect();
            return Err(Error::contract(
                &ConfigPath::root(),
                format!("writer ordering cycle between {}", stuck.join(", ")),
            ));
        };
        done[next] = true;
        order.push(next);
        for &t in &edges[next] {
            incoming[t] -= 1;
        }
    }

    let mut slots: Vec<Option<WriterEntry>> = entries.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable handler table for one device type.
pub struct Registry {
    readers: Vec<ReaderEntry>,
    writers: Vec<WriterEntry>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Reader registered exactly for the pattern of `path`.
    pub(crate) fn reader_for(&self, path: &ConfigPath) -> Option<&dyn ErasedReader> {
        self.readers
            .iter()
            .find(|e| e.pattern.matches(path))
            .map(|e| e.reader.as_ref())
    }

    /// Reader registered exactly at `pattern`.
    pub(crate) fn reader_at(&self, pattern: &PathPattern) -> Option<&dyn ErasedReader> {
        self.readers
            .iter()
            .find(|e| &e.pattern == pattern)
            .map(|e| e.reader.as_ref())
    }

    /// Names of the nodes directly below `pattern` that lead to a reader,
    /// in registration order.
    ///
    /// Containers without a reader of their own are included when some reader
    /// is registered further down.
    pub fn child_nodes(&self, pattern: &PathPattern) -> Vec<&str> {
        let mut nodes: Vec<&str> = Vec::new();
        for entry in &self.readers {
            let descendant = entry.pattern.len() > pattern.len()
                && entry.pattern.nodes().starts_with(pattern.nodes());
            if !descendant {
                continue;
            }
            let next = entry.pattern.nodes()[pattern.len()].as_str();
            if !nodes.contains(&next) {
                nodes.push(next);
            }
        }
        nodes
    }

    /// Writer for `path` and its position in the write order.
    ///
    /// An exact registration wins; otherwise the closest subtree registration
    /// covering the path is returned with its own pattern.
    pub(crate) fn writer_for(&self, path: &ConfigPath) -> Option<WriterMatch<'_>> {
        if let Some((position, entry)) = self
            .writers
            .iter()
            .enumerate()
            .find(|(_, e)| e.pattern.matches(path))
        {
            return Some(WriterMatch {
                position,
                pattern: &entry.pattern,
                writer: entry.writer.as_ref(),
                exact: true,
            });
        }

        self.writers
            .iter()
            .enumerate()
            .filter(|(_, e)| e.subtree && e.pattern.covers(path))
            .max_by_key(|(_, e)| e.pattern.len())
            .map(|(position, entry)| WriterMatch {
                position,
                pattern: &entry.pattern,
                writer: entry.writer.as_ref(),
                exact: false,
            })
    }

    /// Writer patterns in write order.
    pub fn write_order(&self) -> Vec<&PathPattern> {
        self.writers.iter().map(|e| &e.pattern).collect()
    }

    /// Reader patterns in registration order.
    pub fn reader_patterns(&self) -> Vec<&PathPattern> {
        self.readers.iter().map(|e| &e.pattern).collect()
    }

    /// Whether the writer at `pattern` covers its subtree.
    pub fn is_subtree_writer(&self, pattern: &PathPattern) -> bool {
        self.writers
            .iter()
            .any(|e| e.subtree && &e.pattern == pattern)
    }

    /// Whether a reader is registered for the pattern of `path`.
    pub fn has_reader(&self, path: &ConfigPath) -> bool {
        self.reader_for(path).is_some()
    }

    /// Whether some writer handles `path`.
    pub fn has_writer(&self, path: &ConfigPath) -> bool {
        self.writer_for(path).is_some()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("readers", &self.reader_patterns())
            .field("writers", &self.write_order())
            .finish()
    }
}

/// Result of a writer lookup.
pub(crate) struct WriterMatch<'a> {
    pub position: usize,
    pub pattern: &'a PathPattern,
    pub writer: &'a dyn ErasedWriter,
    pub exact: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{MockChannel, ReadCache};
    use crate::error::ErrorKind;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Named {
        name: String,
    }

    struct LineWriter(&'static str);

    impl Writer<Named> for LineWriter {
        fn create(
            &self,
            _path: &ConfigPath,
            after: &Named,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("{} {}", self.0, after.name)))
        }

        fn update(
            &self,
            _path: &ConfigPath,
            _before: &Named,
            after: &Named,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("{} {}", self.0, after.name)))
        }

        fn delete(
            &self,
            _path: &ConfigPath,
            before: &Named,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("no {} {}", self.0, before.name)))
        }
    }

    struct Keys;

    impl ListReader<Named> for Keys {
        fn list_keys(&self, _path: &ConfigPath, _ctx: &ReadContext<'_>) -> Result<Vec<String>> {
            Ok(vec!["a".into()])
        }

        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Named,
            _ctx: &ReadContext<'_>,
        ) -> Result<()> {
            builder.name = path.last_key().unwrap_or_default().into();
            Ok(())
        }
    }

    fn p(s: &str) -> PathPattern {
        s.parse().unwrap()
    }

    #[test]
    fn test_write_order_respects_after_and_before() {
        let mut builder = Registry::builder();
        builder
            .add_writer_after(p("/interface/subinterface"), LineWriter("sub"), &[p("/interface")])
            .add_writer(p("/interface"), LineWriter("ifc"))
            .add_writer_before(p("/vlan"), LineWriter("vlan"), &[p("/interface")]);
        let registry = builder.build().unwrap();

        let order: Vec<String> = registry.write_order().iter().map(ToString::to_string).collect();
        assert_eq!(order, vec!["/vlan", "/interface", "/interface/subinterface"]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut builder = Registry::builder();
        builder
            .add_writer_after(p("/a"), LineWriter("a"), &[p("/b")])
            .add_writer_after(p("/b"), LineWriter("b"), &[p("/a")]);
        let err = builder.build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Contract);
        assert!(err.message().contains("cycle"));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut builder = Registry::builder();
        builder
            .add_writer(p("/a"), LineWriter("a"))
            .add_writer(p("/a"), LineWriter("again"));
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_unknown_dependency_ignored() {
        let mut builder = Registry::builder();
        builder.add_writer_after(p("/a"), LineWriter("a"), &[p("/elsewhere")]);
        assert_eq!(builder.build().unwrap().write_order().len(), 1);
    }

    #[test]
    fn test_subtree_lookup() {
        let mut builder = Registry::builder();
        builder
            .subtree_add_writer_after(p("/interface"), LineWriter("ifc"), &[])
            .add_writer(p("/interface/hold-time"), LineWriter("hold"));
        let registry = builder.build().unwrap();

        let nested: ConfigPath = "/interface[eth0]/ethernet/config".parse().unwrap();
        let found = registry.writer_for(&nested).unwrap();
        assert!(!found.exact);
        assert_eq!(found.pattern.to_string(), "/interface");

        let hold: ConfigPath = "/interface[eth0]/hold-time".parse().unwrap();
        assert!(registry.writer_for(&hold).unwrap().exact);
        assert!(!registry.has_writer(&"/vlan[1]".parse().unwrap()));
        assert!(registry.is_subtree_writer(&p("/interface")));
    }

    #[test]
    fn test_child_nodes_include_containers() {
        let mut builder = Registry::builder();
        builder
            .add_list_reader(p("/interface"), Keys)
            .add_list_reader(p("/network-instance/protocols/protocol"), Keys)
            .add_list_reader(p("/network-instance"), Keys)
            .add_list_reader(p("/interface/subinterface"), Keys);
        let registry = builder.build().unwrap();

        assert_eq!(
            registry.child_nodes(&PathPattern::default()),
            vec!["interface", "network-instance"]
        );
        assert_eq!(registry.child_nodes(&p("/network-instance")), vec!["protocols"]);
        assert!(registry.reader_at(&p("/network-instance/protocols")).is_none());
        assert!(registry.child_nodes(&p("/interface/subinterface")).is_empty());
    }

    #[test]
    fn test_erased_roundtrip() {
        let mut builder = Registry::builder();
        builder
            .add_list_reader(p("/vrf"), Keys)
            .add_writer(p("/vrf"), LineWriter("ip vrf"));
        let registry = builder.build().unwrap();

        let channel = MockChannel::new();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let path: ConfigPath = "/vrf[a]".parse().unwrap();

        let reader = registry.reader_for(&path).unwrap();
        assert!(reader.is_list());
        let snapshot = reader.read(&path, &ctx).unwrap();
        assert_eq!(snapshot.get("name").unwrap(), "a");

        let writer = registry.writer_for(&path).unwrap().writer;
        let (change, seq) = writer
            .write(&path, None, Some(&snapshot), &WriteContext::new())
            .unwrap();
        assert_eq!(change, Change::Create);
        assert_eq!(seq.to_text(), "ip vrf a\n");

        let (change, seq) = writer
            .write(&path, Some(&snapshot), Some(&snapshot), &WriteContext::new())
            .unwrap();
        assert_eq!(change, Change::Noop);
        assert!(seq.is_empty());
    }
}
