//! # Translate
//!
//! Translation between structured configuration trees and line-oriented
//! device CLI dialects.
//!
//! The crate provides the contract every device handler follows and the
//! machinery that composes handlers into one coherent device model.
//!
//! ## Core Concepts
//!
//! - **ConfigPath**: address of one node (`/network-instance[default]/protocols`)
//! - **Snapshot**: structured state of one node, converted to/from typed data
//! - **Reader**: parses device output into a node (`ListReader`, `ConfigReader`)
//! - **Writer**: renders create/update/delete of a node as a `CommandSequence`
//! - **Composite**: several handlers for one subtree, exactly one owner per node
//! - **Registry**: handler table for one device type, with writer ordering
//! - **Transaction**: reads through a cache, plans and commits changes
//!
//! ## Example
//!
//! ```ignore
//! use translate::{
//!     CommandSequence, ConfigPath, Frame, BlockBuilder, NodeChange, Registry,
//!     Result, Transaction, WriteContext, Writer,
//! };
//!
//! #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
//! struct Vrf { name: String, rd: Option<String> }
//!
//! struct VrfWriter;
//!
//! impl Writer<Vrf> for VrfWriter {
//!     fn create(&self, _: &ConfigPath, after: &Vrf, _: &WriteContext) -> Result<CommandSequence> {
//!         let enter = ["configure terminal".to_string(), format!("ip vrf {}", after.name)];
//!         let frame = Frame::new(enter, ["end"]);
//!         Ok(BlockBuilder::new(frame)
//!             .opt(after.rd.as_ref(), |rd| format!("rd {rd}"))
//!             .finish_always())
//!     }
//!     // update, delete ...
//! }
//!
//! let mut builder = Registry::builder();
//! builder.add_writer("/network-instance".parse()?, VrfWriter);
//! let registry = builder.build()?;
//!
//! let tx = Transaction::new(&registry, &channel);
//! let summary = tx.commit(&[NodeChange::create(path, snapshot)])?;
//! ```
//!
//! ## Seams
//!
//! - [`Channel`]: the only access to a device; [`MockChannel`] scripts it in tests
//! - [`Writer`] / [`ListReader`] / [`ConfigReader`]: implemented per device unit
//! - [`WriterChild`] / [`ConfigReaderChild`]: variant ownership inside composites

pub mod channel;
pub mod command;
pub mod composite;
pub mod error;
pub mod extract;
pub mod path;
pub mod planner;
pub mod reader;
pub mod registry;
pub mod snapshot;
pub mod transaction;
pub mod writer;

// Re-export main types at crate root
pub use channel::{Channel, ChannelError, MockChannel, ReadCache};
pub use command::{Block, CommandSequence, Frame};
pub use composite::{
    Claim, CompositeConfigReader, CompositeListReader, CompositeWriter, ConfigReaderChild,
    ContextClaim, Guarded, Reserved, WriterChild,
};
pub use error::{Error, ErrorKind, Result};
pub use extract::Normalize;
pub use path::{ConfigPath, ParsePathError, PathPattern};
pub use planner::{BlockBuilder, Field, ensure_unchanged};
pub use reader::{ConfigReader, EmptyReader, ListReader, ReadContext};
pub use registry::{Registry, RegistryBuilder};
pub use snapshot::{Change, Data, Diff, FieldChange, Snapshot, field_changes};
pub use transaction::{
    CommitSummary, NodeChange, Plan, PlannedWrite, Transaction, TransactionOptions,
};
pub use writer::{WriteContext, Writer, apply_diff};
