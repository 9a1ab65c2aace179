//! Read and write transactions against one device.
//!
//! A [`Transaction`] binds a [`Registry`] to a [`Channel`] and owns the read
//! cache for its lifetime. Writes are planned in full before anything is
//! sent: every change is resolved to its writer, validated and rendered, so a
//! rejected request leaves the device untouched. Committing then sends one
//! batch per node in dependency order and stops at the first transport error
//! or device rejection.

use crate::channel::{Channel, ReadCache};
use crate::command::CommandSequence;
use crate::error::{Error, ErrorKind, Result};
use crate::path::ConfigPath;
use crate::reader::ReadContext;
use crate::registry::{ErasedReader, ErasedWriter, Registry};
use crate::snapshot::{Change, Snapshot};
use crate::writer::WriteContext;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;

// ============================================================================
// Types
// ============================================================================

/// Requested before/after state of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeChange {
    pub path: ConfigPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Snapshot>,
}

impl NodeChange {
    pub fn create(path: ConfigPath, after: Snapshot) -> Self {
        Self {
            path,
            before: None,
            after: Some(after),
        }
    }

    pub fn update(path: ConfigPath, before: Snapshot, after: Snapshot) -> Self {
        Self {
            path,
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn delete(path: ConfigPath, before: Snapshot) -> Self {
        Self {
            path,
            before: Some(before),
            after: None,
        }
    }

    /// Classify the change.
    pub fn change(&self) -> Change {
        match (&self.before, &self.after) {
            (None, Some(_)) => Change::Create,
            (Some(_), None) => Change::Delete,
            (Some(before), Some(after)) if before == after => Change::Noop,
            (Some(_), Some(_)) => Change::Update,
            (None, None) => Change::Noop,
        }
    }
}

/// Transaction tuning.
#[derive(Debug, Clone)]
pub struct TransactionOptions {
    /// Worker threads for subtree reads (1 = sequential)
    pub jobs: usize,
    /// Output patterns that mark a write batch as rejected by the device
    pub error_patterns: Vec<Regex>,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            error_patterns: Vec::new(),
        }
    }
}

/// One rendered write, ready to send.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedWrite {
    pub path: ConfigPath,
    pub change: Change,
    pub commands: CommandSequence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Snapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Snapshot>,
}

/// Ordered writes of a transaction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub writes: Vec<PlannedWrite>,
    /// Changes whose before and after state are equal
    pub unchanged: usize,
}

impl Plan {
    /// Whether nothing would be sent.
    pub fn is_empty(&self) -> bool {
        self.writes.iter().all(|w| w.commands.is_empty())
    }

    /// All batches, concatenated in send order.
    pub fn to_text(&self) -> String {
        self.writes.iter().map(|w| w.commands.to_text()).collect()
    }
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Batches sent to the channel
    pub batches: usize,
}

impl CommitSummary {
    /// Total number of nodes changed on the device.
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// Reads and writes for one device session.
pub struct Transaction<'a> {
    registry: &'a Registry,
    channel: &'a dyn Channel,
    cache: ReadCache,
    options: TransactionOptions,
    pool: Option<rayon::ThreadPool>,
}

impl<'a> Transaction<'a> {
    pub fn new(registry: &'a Registry, channel: &'a dyn Channel) -> Self {
        Self {
            registry,
            channel,
            cache: ReadCache::new(),
            options: TransactionOptions::default(),
            pool: None,
        }
    }

    /// Apply options. A thread pool is created when `jobs > 1`; if that fails
    /// reads stay sequential.
    #[must_use]
    pub fn with_options(mut self, options: TransactionOptions) -> Self {
        self.pool = if options.jobs > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(options.jobs)
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    log::warn!("falling back to sequential reads: {e}");
                    None
                }
            }
        } else {
            None
        };
        self.options = options;
        self
    }

    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    fn ctx(&self) -> ReadContext<'_> {
        ReadContext::new(self.channel, &self.cache).with_registry(self.registry)
    }

    fn reader(&self, path: &ConfigPath) -> Result<&'a dyn ErasedReader> {
        self.registry.reader_for(path).ok_or_else(|| {
            Error::unsupported_type(path, format!("no reader registered for {}", path.pattern()))
        })
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Keys of the list at `path`. A key on the last segment is ignored.
    pub fn read_keys(&self, path: &ConfigPath) -> Result<Vec<String>> {
        let reader = self.reader(path)?;
        if !reader.is_list() {
            return Err(Error::contract(path, "not a list node"));
        }
        reader.list_keys(&path.with_key_removed(), &self.ctx())
    }

    /// Attributes of the node at `path`, without its children.
    ///
    /// `None` when a list member does not exist or a non-list node has no
    /// attributes set.
    pub fn read(&self, path: &ConfigPath) -> Result<Option<Snapshot>> {
        let reader = self.reader(path)?;
        let ctx = self.ctx();
        if reader.is_list() && !self.member_exists(reader, path)? {
            return Ok(None);
        }
        let snapshot = reader.read(path, &ctx)?;
        Ok((reader.is_list() || !snapshot.is_empty()).then_some(snapshot))
    }

    /// The node at `path` with every registered descendant attached.
    ///
    /// List members are read in parallel when the transaction has more than
    /// one job. `None` when `path` addresses a missing list member.
    pub fn read_tree(&self, path: &ConfigPath) -> Result<Option<Snapshot>> {
        if let Some(reader) = self.registry.reader_for(path) {
            if reader.is_list() && !self.member_exists(reader, path)? {
                return Ok(None);
            }
        }
        let tree = match &self.pool {
            Some(pool) => pool.install(|| self.read_subtree(path)),
            None => self.read_subtree(path),
        }?;
        Ok(Some(tree))
    }

    fn member_exists(&self, reader: &dyn ErasedReader, path: &ConfigPath) -> Result<bool> {
        let Some(key) = path.last_key() else {
            return Err(Error::contract(path, "list member path has no key"));
        };
        let keys = reader.list_keys(&path.with_key_removed(), &self.ctx())?;
        Ok(keys.iter().any(|k| k == key))
    }

    fn read_subtree(&self, path: &ConfigPath) -> Result<Snapshot> {
        let ctx = self.ctx();
        let mut node = match self.registry.reader_for(path) {
            Some(reader) => reader.read(path, &ctx)?,
            None => Snapshot::new(),
        };

        let pattern = path.pattern();
        for name in self.registry.child_nodes(&pattern) {
            let child = path.child(name);
            match self.registry.reader_at(&pattern.child(name)) {
                Some(reader) if reader.is_list() => {
                    let keys = reader.list_keys(&child, &ctx)?;
                    let members = self.read_members(&child, &keys)?;
                    reader.merge(&mut node, name, members);
                }
                Some(reader) => {
                    let subtree = self.read_subtree(&child)?;
                    reader.merge(&mut node, name, vec![subtree]);
                }
                None => {
                    let subtree = self.read_subtree(&child)?;
                    if !subtree.is_empty() {
                        node.attach_child(name, subtree);
                    }
                }
            }
        }
        Ok(node)
    }

    fn read_members(&self, list: &ConfigPath, keys: &[String]) -> Result<Vec<Snapshot>> {
        if self.pool.is_some() && keys.len() > 1 {
            keys.par_iter()
                .map(|key| self.read_subtree(&list.with_key(key.as_str())))
                .collect()
        } else {
            keys.iter()
                .map(|key| self.read_subtree(&list.with_key(key.as_str())))
                .collect()
        }
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Resolve, validate and render every change without touching the device.
    ///
    /// Deletes come first, in reverse write order; creates and updates follow
    /// in write order. Changes at the same position keep their input order.
    /// Changes below a subtree writer are accepted only together with a
    /// change of the node that writer owns.
    pub fn plan(&self, changes: &[NodeChange]) -> Result<Plan> {
        let changed: HashSet<&ConfigPath> = changes
            .iter()
            .filter(|c| c.change() != Change::Noop)
            .map(|c| &c.path)
            .collect();

        let mut ctx = WriteContext::new();
        for change in changes {
            ctx.insert(&change.path, change.before.as_ref(), change.after.as_ref());
        }

        let mut unchanged = 0;
        let mut deletes: Vec<Resolved<'_, 'a>> = Vec::new();
        let mut upserts: Vec<Resolved<'_, 'a>> = Vec::new();
        for (index, change) in changes.iter().enumerate() {
            let kind = change.change();
            if kind == Change::Noop {
                unchanged += 1;
                continue;
            }

            let Some(found) = self.registry.writer_for(&change.path) else {
                return Err(Error::unsupported_type(
                    &change.path,
                    format!("no writer registered for {}", change.path.pattern()),
                )
                .fill_states(change.before.as_ref(), change.after.as_ref()));
            };
            if !found.exact {
                let owner = change.path.prefix(found.pattern.len());
                if changed.contains(&owner) {
                    log::debug!("{} is written together with {owner}", change.path);
                    continue;
                }
                return Err(Error::contract(
                    &change.path,
                    format!(
                        "nested below the subtree writer at {}, change {owner} instead",
                        found.pattern
                    ),
                ));
            }

            let resolved = Resolved {
                position: found.position,
                index,
                change,
                writer: found.writer,
            };
            if kind == Change::Delete {
                deletes.push(resolved);
            } else {
                upserts.push(resolved);
            }
        }

        deletes.sort_by_key(|r| (Reverse(r.position), r.index));
        upserts.sort_by_key(|r| (r.position, r.index));

        let mut writes = Vec::with_capacity(deletes.len() + upserts.len());
        for resolved in deletes.into_iter().chain(upserts) {
            let node = resolved.change;
            let (change, commands) =
                resolved
                    .writer
                    .write(&node.path, node.before.as_ref(), node.after.as_ref(), &ctx)?;
            log::debug!("planned {change} {} ({} lines)", node.path, commands.len());
            writes.push(PlannedWrite {
                path: node.path.clone(),
                change,
                commands,
                before: node.before.clone(),
                after: node.after.clone(),
            });
        }

        Ok(Plan { writes, unchanged })
    }

    /// Plan and send every change, one batch per node.
    ///
    /// Validation failures return before any command is sent. A transport
    /// failure or a device rejection stops the commit immediately; batches
    /// already sent are not rolled back.
    pub fn commit(&self, changes: &[NodeChange]) -> Result<CommitSummary> {
        let plan = self.plan(changes)?;
        let mut summary = CommitSummary {
            unchanged: plan.unchanged,
            ..CommitSummary::default()
        };

        for write in &plan.writes {
            if write.commands.is_empty() {
                log::debug!("nothing to send for {}", write.path);
                summary.unchanged += 1;
                continue;
            }

            let text = write.commands.to_text();
            log::info!("{} {}: sending {} lines", write.change, write.path, write.commands.len());
            let output = match self.channel.execute(&text) {
                Ok(output) => output,
                Err(e) => {
                    log::warn!(
                        "commit aborted at {} after {} batches",
                        write.path,
                        summary.batches
                    );
                    let message = format!("{e} (after {} batches)", summary.batches);
                    return Err(Error::new(ErrorKind::ChannelFailure, &write.path, message)
                        .with_source(e)
                        .fill_states(write.before.as_ref(), write.after.as_ref()));
                }
            };
            summary.batches += 1;

            if self
                .options
                .error_patterns
                .iter()
                .any(|pattern| pattern.is_match(&output))
            {
                log::warn!(
                    "commit aborted: device rejected batch {} for {}",
                    summary.batches,
                    write.path
                );
                return Err(Error::rejected(&write.path, &text, &output)
                    .fill_states(write.before.as_ref(), write.after.as_ref()));
            }

            match write.change {
                Change::Create => summary.created += 1,
                Change::Update => summary.updated += 1,
                Change::Delete => summary.deleted += 1,
                Change::Noop => summary.unchanged += 1,
            }
        }

        if summary.batches > 0 {
            self.cache.clear();
        }
        Ok(summary)
    }
}

struct Resolved<'c, 'r> {
    position: usize,
    index: usize,
    change: &'c NodeChange,
    writer: &'r dyn ErasedWriter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannel;
    use crate::command::Frame;
    use crate::path::PathPattern;
    use crate::planner::BlockBuilder;
    use crate::reader::{ConfigReader, ListReader};
    use crate::writer::Writer;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Iface {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mtu: Option<u16>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Sub {
        index: u32,
    }

    struct IfaceReader;

    impl ListReader<Iface> for IfaceReader {
        fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
            let out = ctx.read(path, "show interfaces")?;
            Ok(out.split_whitespace().map(str::to_string).collect())
        }

        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Iface,
            ctx: &ReadContext<'_>,
        ) -> Result<()> {
            let name = path.require_key("interface")?;
            builder.name = name.to_string();
            let out = ctx.read(path, &format!("show mtu {name}"))?;
            builder.mtu = out.trim().parse().ok();
            Ok(())
        }
    }

    struct SubReader;

    impl ListReader<Sub> for SubReader {
        fn list_keys(&self, path: &ConfigPath, _ctx: &ReadContext<'_>) -> Result<Vec<String>> {
            Ok(if path.first_key_of("interface") == Some("eth0") {
                vec!["0".into(), "1".into()]
            } else {
                Vec::new()
            })
        }

        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Sub,
            _ctx: &ReadContext<'_>,
        ) -> Result<()> {
            builder.index = path.last_key().and_then(|k| k.parse().ok()).unwrap_or_default();
            Ok(())
        }
    }

    struct HostnameReader;

    impl ConfigReader<Iface> for HostnameReader {
        fn populate(
            &self,
            path: &ConfigPath,
            builder: &mut Iface,
            ctx: &ReadContext<'_>,
        ) -> Result<()> {
            builder.name = ctx.read(path, "show hostname")?.trim().to_string();
            Ok(())
        }
    }

    struct IfaceWriter;

    impl Writer<Iface> for IfaceWriter {
        fn create(
            &self,
            _path: &ConfigPath,
            after: &Iface,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(BlockBuilder::new(Frame::new([format!("interface {}", after.name)], ["exit"]))
                .opt(after.mtu.as_ref(), |m| format!("mtu {m}"))
                .finish_always())
        }

        fn update(
            &self,
            _path: &ConfigPath,
            before: &Iface,
            after: &Iface,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(BlockBuilder::new(Frame::new([format!("interface {}", after.name)], ["exit"]))
                .set_or_no(
                    before.mtu.as_ref(),
                    after.mtu.as_ref(),
                    |m| format!("mtu {m}"),
                    |_| "no mtu".into(),
                )
                .finish())
        }

        fn delete(
            &self,
            _path: &ConfigPath,
            before: &Iface,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("no interface {}", before.name)))
        }
    }

    struct SubWriter;

    impl Writer<Sub> for SubWriter {
        fn create(
            &self,
            path: &ConfigPath,
            after: &Sub,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            let interface = path.require_key("interface")?;
            Ok(CommandSequence::line(format!("interface {interface}.{}", after.index)))
        }

        fn update(
            &self,
            _path: &ConfigPath,
            _before: &Sub,
            _after: &Sub,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::empty())
        }

        fn delete(
            &self,
            path: &ConfigPath,
            before: &Sub,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            let interface = path.require_key("interface")?;
            Ok(CommandSequence::line(format!("no interface {interface}.{}", before.index)))
        }
    }

    fn p(s: &str) -> PathPattern {
        s.parse().unwrap()
    }

    fn path(s: &str) -> ConfigPath {
        s.parse().unwrap()
    }

    fn registry() -> Registry {
        let mut builder = Registry::builder();
        builder
            .add_list_reader(p("/interface"), IfaceReader)
            .add_list_reader(p("/interface/subinterfaces/subinterface"), SubReader)
            .add_reader(p("/system"), HostnameReader)
            .add_writer_after(
                p("/interface/subinterfaces/subinterface"),
                SubWriter,
                &[p("/interface")],
            )
            .add_writer(p("/interface"), IfaceWriter);
        builder.build().unwrap()
    }

    fn channel() -> MockChannel {
        MockChannel::new()
            .with_output("show interfaces", "eth0 eth1")
            .with_output("show mtu eth0", "9100")
            .with_output("show mtu eth1", "")
            .with_output("show hostname", "r1\n")
    }

    fn snapshot(value: serde_json::Value) -> Snapshot {
        Snapshot::from_value(&ConfigPath::root(), value).unwrap()
    }

    #[test]
    fn test_read_keys_and_member() {
        let registry = registry();
        let channel = channel();
        let tx = Transaction::new(&registry, &channel);

        assert_eq!(tx.read_keys(&path("/interface")).unwrap(), vec!["eth0", "eth1"]);
        let eth0 = tx.read(&path("/interface[eth0]")).unwrap().unwrap();
        assert_eq!(eth0.get("mtu"), Some(&json!(9100)));
        assert!(tx.read(&path("/interface[eth9]")).unwrap().is_none());
        assert_eq!(channel.executed().iter().filter(|c| *c == "show interfaces").count(), 1);
    }

    #[test]
    fn test_read_is_idempotent() {
        let registry = registry();
        let channel = channel();
        let tx = Transaction::new(&registry, &channel);
        let first = tx.read(&path("/interface[eth0]")).unwrap();
        let second = tx.read(&path("/interface[eth0]")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_unregistered_path() {
        let registry = registry();
        let channel = channel();
        let tx = Transaction::new(&registry, &channel);
        let err = tx.read(&path("/vlan[10]")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert_eq!(tx.read_keys(&path("/system")).unwrap_err().kind(), ErrorKind::Contract);
    }

    #[test]
    fn test_read_tree_sequential_and_parallel_agree() {
        let registry = registry();
        let channel = channel();

        let sequential = Transaction::new(&registry, &channel)
            .read_tree(&ConfigPath::root())
            .unwrap()
            .unwrap();
        let parallel = Transaction::new(&registry, &channel)
            .with_options(TransactionOptions {
                jobs: 4,
                ..TransactionOptions::default()
            })
            .read_tree(&ConfigPath::root())
            .unwrap()
            .unwrap();

        assert_eq!(sequential, parallel);
        assert_eq!(
            sequential.as_value(),
            &json!({
                "interface": [
                    {
                        "name": "eth0",
                        "mtu": 9100,
                        "subinterfaces": {"subinterface": [{"index": 0}, {"index": 1}]}
                    },
                    {"name": "eth1"}
                ],
                "system": {"name": "r1"}
            })
        );
    }

    #[test]
    fn test_plan_orders_deletes_then_writes() {
        let registry = registry();
        let channel = channel();
        let tx = Transaction::new(&registry, &channel);

        let eth0 = snapshot(json!({"name": "eth0"}));
        let changes = vec![
            NodeChange::create(
                path("/interface[eth2]/subinterfaces/subinterface[0]"),
                snapshot(json!({"index": 0})),
            ),
            NodeChange::create(
                path("/interface[eth2]"),
                snapshot(json!({"name": "eth2", "mtu": 1500})),
            ),
            NodeChange::delete(path("/interface[eth1]"), snapshot(json!({"name": "eth1"}))),
            NodeChange::delete(
                path("/interface[eth0]/subinterfaces/subinterface[1]"),
                snapshot(json!({"index": 1})),
            ),
            NodeChange::update(path("/interface[eth0]"), eth0.clone(), eth0),
        ];
        let plan = tx.plan(&changes).unwrap();

        assert_eq!(plan.unchanged, 1);
        assert_eq!(
            plan.to_text(),
            "no interface eth0.1\nno interface eth1\ninterface eth2\nmtu 1500\nexit\n\
             interface eth2.0\n"
        );
        assert!(channel.executed().is_empty());
    }

    #[test]
    fn test_plan_validation_sends_nothing() {
        let registry = registry();
        let channel = channel();
        let tx = Transaction::new(&registry, &channel);
        let changes = vec![
            NodeChange::create(path("/interface[eth2]"), snapshot(json!({"name": "eth2"}))),
            NodeChange::create(path("/vlan[10]"), snapshot(json!({"id": 10}))),
        ];
        let err = tx.commit(&changes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
        assert_eq!(err.after(), Some(&json!({"id": 10})));
        assert!(channel.executed().is_empty());
    }

    #[test]
    fn test_commit_summary() {
        let registry = registry();
        let channel = channel();
        let tx = Transaction::new(&registry, &channel);
        let changes = vec![
            NodeChange::update(
                path("/interface[eth0]"),
                snapshot(json!({"name": "eth0", "mtu": 9100})),
                snapshot(json!({"name": "eth0"})),
            ),
            NodeChange::delete(path("/interface[eth1]"), snapshot(json!({"name": "eth1"}))),
        ];

        let summary = tx.commit(&changes).unwrap();
        assert_eq!(
            summary,
            CommitSummary {
                updated: 1,
                deleted: 1,
                batches: 2,
                ..CommitSummary::default()
            }
        );
        assert_eq!(summary.total_changes(), 2);
        assert_eq!(
            channel.executed(),
            vec!["no interface eth1\n", "interface eth0\nno mtu\nexit\n"]
        );
    }

    #[test]
    fn test_commit_stops_on_channel_failure() {
        let registry = registry();
        let channel = channel().failing_on("no interface eth1\n");
        let tx = Transaction::new(&registry, &channel);
        let changes = vec![
            NodeChange::create(path("/interface[eth2]"), snapshot(json!({"name": "eth2"}))),
            NodeChange::delete(path("/interface[eth1]"), snapshot(json!({"name": "eth1"}))),
        ];

        let err = tx.commit(&changes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ChannelFailure);
        assert!(err.message().contains("after 0 batches"));
        assert_eq!(err.before(), Some(&json!({"name": "eth1"})));
        assert_eq!(err.after(), None);
        assert_eq!(channel.executed().len(), 1);
    }

    #[test]
    fn test_commit_detects_rejection() {
        let registry = registry();
        let channel = channel()
            .with_output("interface eth2\nexit\n", "% Invalid input detected at '^' marker.");
        let tx = Transaction::new(&registry, &channel).with_options(TransactionOptions {
            jobs: 1,
            error_patterns: vec![Regex::new(r"^% Invalid").unwrap()],
        });
        let changes = vec![
            NodeChange::create(path("/interface[eth2]"), snapshot(json!({"name": "eth2"}))),
            NodeChange::create(
                path("/interface[eth2]/subinterfaces/subinterface[0]"),
                snapshot(json!({"index": 0})),
            ),
        ];

        let err = tx.commit(&changes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandRejected);
        assert_eq!(err.path().to_string(), "/interface[eth2]");
        assert_eq!(err.after(), Some(&json!({"name": "eth2"})));
        assert_eq!(channel.executed().len(), 1);
    }

    struct Whole;

    impl Writer<Iface> for Whole {
        fn create(
            &self,
            _path: &ConfigPath,
            after: &Iface,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("port {}", after.name)))
        }

        fn update(
            &self,
            _path: &ConfigPath,
            _before: &Iface,
            after: &Iface,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("port {}", after.name)))
        }

        fn delete(
            &self,
            _path: &ConfigPath,
            before: &Iface,
            _ctx: &WriteContext,
        ) -> Result<CommandSequence> {
            Ok(CommandSequence::line(format!("no port {}", before.name)))
        }
    }

    #[test]
    fn test_subtree_writer_absorbs_nested_changes() {
        let mut builder = Registry::builder();
        builder.subtree_add_writer_after(p("/port"), Whole, &[]);
        let registry = builder.build().unwrap();
        let channel = MockChannel::new();
        let tx = Transaction::new(&registry, &channel);

        let nested = NodeChange::create(path("/port[1]/config"), snapshot(json!({"name": "1"})));
        let owner = NodeChange::create(path("/port[1]"), snapshot(json!({"name": "1"})));

        let plan = tx.plan(&[owner, nested.clone()]).unwrap();
        assert_eq!(plan.writes.len(), 1);

        let err = tx.plan(&[nested]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Contract);
    }
}
