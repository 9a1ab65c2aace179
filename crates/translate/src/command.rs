//! Command sequences sent to a device.
//!
//! A [`CommandSequence`] is a list of [`Block`]s. Each block enters a
//! configuration context, emits its body and leaves the context again, so a
//! sequence never assumes or leaves the session in a sub-mode. The whole
//! sequence is sent to the channel as one batch.

use serde::Serialize;
use std::fmt;

/// Enter/exit commands around a block body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Frame {
    enter: Vec<String>,
    exit: Vec<String>,
}

impl Frame {
    /// Frame with the given enter and exit lines.
    pub fn new<E, X>(enter: E, exit: X) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        X: IntoIterator,
        X::Item: Into<String>,
    {
        Self {
            enter: enter.into_iter().map(Into::into).collect(),
            exit: exit.into_iter().map(Into::into).collect(),
        }
    }

    /// A frame with no context commands.
    pub fn none() -> Self {
        Self::default()
    }

    /// Append an enter line (nested sub-mode).
    pub fn enter(mut self, line: impl Into<String>) -> Self {
        self.enter.push(line.into());
        self
    }

    pub fn enter_lines(&self) -> &[String] {
        &self.enter
    }

    pub fn exit_lines(&self) -> &[String] {
        &self.exit
    }
}

/// One framed group of commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    frame: Frame,
    body: Vec<String>,
}

impl Block {
    pub fn new(frame: Frame, body: Vec<String>) -> Self {
        Self { frame, body }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// All lines in send order: enter, body, exit.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.frame
            .enter
            .iter()
            .chain(&self.body)
            .chain(&self.frame.exit)
            .map(String::as_str)
    }
}

/// Ordered, self-contained list of command blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CommandSequence {
    blocks: Vec<Block>,
}

impl CommandSequence {
    /// The sequence that changes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A sequence of one block.
    pub fn block(frame: Frame, body: Vec<String>) -> Self {
        Self {
            blocks: vec![Block::new(frame, body)],
        }
    }

    /// A single unframed command line.
    pub fn line(line: impl Into<String>) -> Self {
        Self::block(Frame::none(), vec![line.into()])
    }

    /// Append another sequence after this one.
    pub fn then(mut self, other: Self) -> Self {
        self.blocks.extend(other.blocks);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// All lines in send order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().flat_map(Block::lines)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines().count()
    }

    /// Text sent to the channel: one line per command, newline-terminated.
    ///
    /// The empty sequence renders as the empty string.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in self.lines() {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

impl fmt::Display for CommandSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router_frame() -> Frame {
        Frame::new(["configure terminal", "router mpls"], ["end"])
    }

    #[test]
    fn test_empty_renders_nothing() {
        let seq = CommandSequence::empty();
        assert!(seq.is_empty());
        assert_eq!(seq.to_text(), "");
        assert_eq!(seq.len(), 0);
    }

    #[test]
    fn test_block_order() {
        let seq = CommandSequence::block(
            router_frame().enter("vll network 41"),
            vec!["vll-mtu 9100".into()],
        );
        assert_eq!(
            seq.to_text(),
            "configure terminal\nrouter mpls\nvll network 41\nvll-mtu 9100\nend\n"
        );
    }

    #[test]
    fn test_then_keeps_blocks_self_contained() {
        let seq = CommandSequence::block(router_frame(), vec!["a".into()])
            .then(CommandSequence::line("write memory"));
        assert_eq!(seq.blocks().len(), 2);
        assert_eq!(
            seq.lines().collect::<Vec<_>>(),
            vec!["configure terminal", "router mpls", "a", "end", "write memory"]
        );
    }
}
