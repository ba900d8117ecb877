//! Host-side ownership of fracture results
//!
//! An explicit table from generation id to [`FractureResult`] with an
//! explicit lifecycle (insert on request, free on teardown, purge when the
//! owning scene entity is gone), plus a typed parent chain for locating the
//! root of a fractured object. No global state: the host owns the store as a
//! plain value.

use std::collections::HashMap;

use crate::result::FractureResult;

/// Identifier of one generation request held by a [`FractureStore`]
///
/// Ids are monotonic and never reused within a store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FractureId(u64);

/// Ownership table mapping generation ids to their results
#[derive(Default)]
pub struct FractureStore {
    entries: HashMap<FractureId, FractureResult>,
    next_id: u64,
}

impl FractureStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a result, returning its id
    pub fn insert(&mut self, result: FractureResult) -> FractureId {
        let id = FractureId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, result);
        id
    }

    /// The result for an id, if still owned
    pub fn get(&self, id: FractureId) -> Option<&FractureResult> {
        self.entries.get(&id)
    }

    /// Whether an id is still owned
    pub fn contains(&self, id: FractureId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Explicit teardown of one result
    pub fn free(&mut self, id: FractureId) -> Option<FractureResult> {
        self.entries.remove(&id)
    }

    /// Drop every result whose owner is gone
    ///
    /// `alive` is the host's liveness check (e.g. "does the owning scene
    /// entity still exist"). Returns the number of results purged.
    pub fn purge<F>(&mut self, alive: F) -> usize
    where
        F: Fn(FractureId) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|&id, _| alive(id));
        before - self.entries.len()
    }

    /// Number of owned results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store owns nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the owned ids (order unspecified)
    pub fn ids(&self) -> impl Iterator<Item = FractureId> + '_ {
        self.entries.keys().copied()
    }
}

/// Role of a scene node within a fracture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractureRole {
    /// The node holding the fracture (shards are its descendants)
    Root,
    /// A shard or helper object below a root
    Child,
    /// Not part of any fracture
    None,
}

/// Outcome of walking up from a node towards its fracture root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootLookup {
    /// The root node of the fracture the query node belongs to
    Found(usize),
    /// The chain of Child nodes ended without reaching a Root
    BrokenChain,
    /// The query node is not tagged as part of a fracture
    NotPartOfFracture,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    parent: Option<usize>,
    role: FractureRole,
}

/// Parent-pointer arena of scene nodes with typed fracture roles
///
/// Replaces tag-presence checks on host objects: every node carries an
/// explicit [`FractureRole`], and the upward walk returns a typed
/// [`RootLookup`] instead of relying on attribute lookups failing.
#[derive(Debug, Default)]
pub struct FractureHierarchy {
    nodes: Vec<Node>,
}

impl FractureHierarchy {
    /// An empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index
    pub fn add(&mut self, role: FractureRole, parent: Option<usize>) -> usize {
        self.nodes.push(Node { parent, role });
        self.nodes.len() - 1
    }

    /// The role of a node
    pub fn role(&self, node: usize) -> Option<FractureRole> {
        self.nodes.get(node).map(|n| n.role)
    }

    /// Retag a node (e.g. when a shard is detached from its fracture)
    pub fn set_role(&mut self, node: usize, role: FractureRole) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.role = role;
        }
    }

    /// Walk up from `node` to the root of its fracture
    ///
    /// A `Root` node finds itself. A `Child` climbs parents while they are
    /// tagged `Child`; the walk ends `Found` on a `Root` parent and
    /// `BrokenChain` when a parent is missing, untagged, or the chain loops.
    pub fn find_root(&self, node: usize) -> RootLookup {
        let Some(start) = self.nodes.get(node) else {
            return RootLookup::NotPartOfFracture;
        };
        match start.role {
            FractureRole::None => return RootLookup::NotPartOfFracture,
            FractureRole::Root => return RootLookup::Found(node),
            FractureRole::Child => {}
        }

        let mut current = node;
        // Cycle guard: a well-formed chain is shorter than the node count
        for _ in 0..self.nodes.len() {
            let Some(parent) = self.nodes[current].parent else {
                return RootLookup::BrokenChain;
            };
            match self.nodes.get(parent).map(|n| n.role) {
                Some(FractureRole::Root) => return RootLookup::Found(parent),
                Some(FractureRole::Child) => current = parent,
                _ => return RootLookup::BrokenChain,
            }
        }
        RootLookup::BrokenChain
    }

    /// Indices of all Root nodes
    pub fn roots(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.role == FractureRole::Root)
            .map(|(i, _)| i)
            .collect()
    }
}
