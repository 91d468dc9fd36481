//! The displayed transcript.
//!
//! A [`Transcript`] is the ordered list of nodes shown for the active session
//! view.  It is append-only; the single exception is the loading placeholder,
//! which is removed and replaced wholesale through its [`LoadingHandle`].

use std::fmt;

use crate::types::{Message, Role};

/// Stable identifier of a transcript node.
///
/// Identifiers come from a counter that is never reset, so they stay unique
/// across transcript clears for the lifetime of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    /// Returns the raw counter value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message-{}", self.0)
    }
}

/// What a node displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    /// A real message.  `welcome` only selects a style.
    Message { message: Message, welcome: bool },
    /// The transient "waiting for an answer" indicator.
    Loading,
}

/// One displayed entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    /// Identifier of the node.
    pub id: MessageId,
    /// The node's content.
    pub body: NodeBody,
}

impl MessageNode {
    /// Returns the message, or `None` for the loading placeholder.
    pub fn message(&self) -> Option<&Message> {
        match &self.body {
            NodeBody::Message { message, .. } => Some(message),
            NodeBody::Loading => None,
        }
    }

    /// Returns true for the loading placeholder.
    pub fn is_loading(&self) -> bool {
        matches!(self.body, NodeBody::Loading)
    }

    /// Returns true if the node uses the welcome style.
    pub fn is_welcome(&self) -> bool {
        matches!(self.body, NodeBody::Message { welcome: true, .. })
    }
}

/// Ticket for a loading placeholder.
///
/// The handle is consumed when the placeholder is resolved, so a placeholder
/// can be removed at most once.
#[must_use = "a loading placeholder must be resolved"]
#[derive(Debug, PartialEq, Eq)]
pub struct LoadingHandle {
    id: MessageId,
    epoch: u64,
}

impl LoadingHandle {
    /// The node id of the placeholder.
    pub fn id(&self) -> MessageId {
        self.id
    }
}

/// The ordered nodes of the active session view.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    nodes: Vec<MessageNode>,
    next_id: u64,
    epoch: u64,
    scroll_anchor: Option<MessageId>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its node id.
    pub fn add_message(&mut self, message: Message, welcome: bool) -> MessageId {
        self.push(NodeBody::Message { message, welcome })
    }

    /// Appends a loading placeholder.
    pub fn push_loading(&mut self) -> LoadingHandle {
        let id = self.push(NodeBody::Loading);
        LoadingHandle {
            id,
            epoch: self.epoch,
        }
    }

    /// Removes the placeholder behind `handle` and appends `message`.
    ///
    /// Returns `None` without touching the transcript when it has been
    /// replaced since the placeholder was inserted; the result belongs to a
    /// view that no longer exists.
    pub fn resolve_loading(&mut self, handle: LoadingHandle, message: Message) -> Option<MessageId> {
        if handle.epoch != self.epoch {
            return None;
        }
        self.nodes.retain(|node| node.id != handle.id);
        Some(self.add_message(message, false))
    }

    /// Removes the placeholder behind `handle` without a replacement.
    ///
    /// Returns false when the transcript has been replaced since the
    /// placeholder was inserted.
    pub fn abandon_loading(&mut self, handle: LoadingHandle) -> bool {
        if handle.epoch != self.epoch {
            return false;
        }
        self.nodes.retain(|node| node.id != handle.id);
        true
    }

    /// Returns true if `handle` still refers to this transcript.
    pub fn is_current(&self, handle: &LoadingHandle) -> bool {
        handle.epoch == self.epoch
    }

    /// Removes every node and starts a new view.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.epoch += 1;
        self.scroll_anchor = None;
    }

    /// All nodes, oldest first.
    pub fn nodes(&self) -> &[MessageNode] {
        &self.nodes
    }

    /// Nodes inserted after `id`, or every node when `id` is `None`.
    pub fn nodes_after(&self, id: Option<MessageId>) -> &[MessageNode] {
        let Some(id) = id else {
            return &self.nodes;
        };
        let start = self.nodes.partition_point(|node| node.id <= id);
        &self.nodes[start..]
    }

    /// The real messages, skipping placeholders.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.nodes.iter().filter_map(MessageNode::message)
    }

    /// Number of nodes, placeholders included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing is displayed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of outstanding loading placeholders.
    pub fn loading_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_loading()).count()
    }

    /// Number of messages written by `role`.
    pub fn count_role(&self, role: Role) -> usize {
        self.messages().filter(|message| message.role == role).count()
    }

    /// Increments each time the view is replaced.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The node the view is scrolled to: the newest insertion.
    pub fn scroll_anchor(&self) -> Option<MessageId> {
        self.scroll_anchor
    }

    fn push(&mut self, body: NodeBody) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.nodes.push(MessageNode { id, body });
        self.scroll_anchor = Some(id);
        id
    }
}
