use std::mem;

use crate::ast::Node;

/// Bytes worth of nodes reserved up front by [`Arena::new`].
pub const ARENA_DEFAULT_CAPACITY: usize = 8 * 1024;

/// Handle to a node owned by an [`Arena`].
///
/// Handles carry the generation of the arena they were allocated in, so a
/// handle that survives a [`Arena::reset`] no longer resolves instead of
/// pointing at whatever node was allocated into its old slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Owner of every AST node built by one parse.
///
/// Nodes are never freed individually: the arena is reset or released as a
/// whole.
#[derive(Debug)]
pub struct Arena {
    nodes: Vec<Node>,
    generation: u32,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_capacity(ARENA_DEFAULT_CAPACITY)
    }
    /// Reserves room for `bytes` worth of nodes. The arena grows past this on
    /// demand.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(bytes / mem::size_of::<Node>()),
            generation: 0,
        }
    }
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId {
            index: self.nodes.len() - 1,
            generation: self.generation,
        }
    }
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index)
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }
    /// Drops every node but keeps the backing storage. All handles handed out
    /// so far stop resolving.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.generation = self.generation.wrapping_add(1);
    }
    /// Drops every node and frees the backing storage.
    pub fn release(&mut self) {
        self.nodes = Vec::new();
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
