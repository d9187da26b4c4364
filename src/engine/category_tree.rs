//! Category forest
//!
//! Built once per recompute from the flat category list: one pass indexes
//! every record, a second repairs dangling parents and cuts cycles, a third
//! resolves each node's root and depth, a fourth links children. The tree is
//! never patched in place.

use std::collections::HashMap;

use crate::models::{Category, CategoryId, CategoryKind};

use super::anomaly::Anomaly;

/// A category plus its resolved position in the forest
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: Category,
    parent: Option<CategoryId>,
    root: CategoryId,
    depth: usize,
    children: Vec<CategoryId>,
}

impl CategoryNode {
    /// Parent after repair; differs from `category.parent_id` for orphans
    /// and for the member a cycle was cut at
    pub fn parent_id(&self) -> Option<CategoryId> {
        self.parent
    }

    pub fn children(&self) -> &[CategoryId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// The ownership-scoped category hierarchy of one user
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, CategoryNode>,
    order: Vec<CategoryId>,
    roots: Vec<CategoryId>,
    anomalies: Vec<Anomaly>,
}

impl CategoryTree {
    /// Build the forest from a flat category list
    ///
    /// Never fails: a missing parent turns the category into a root, a cycle
    /// is cut at the member that appears first in `categories`. Both are
    /// recorded in [`CategoryTree::anomalies`].
    pub fn build(categories: &[Category]) -> Self {
        let mut tree = Self::default();

        for category in categories {
            let node = CategoryNode {
                category: category.clone(),
                parent: category.parent_id,
                root: category.id,
                depth: 0,
                children: Vec::new(),
            };
            if tree.nodes.insert(category.id, node).is_none() {
                tree.order.push(category.id);
            } else {
                tracing::debug!(
                    category = %category.id.short(),
                    "duplicate category record, keeping the later one"
                );
            }
        }

        tree.detach_orphans();
        tree.cut_cycles();
        tree.resolve_roots();
        tree.link_children();

        for anomaly in &tree.anomalies {
            tracing::warn!(%anomaly, "category tree repaired");
        }
        tracing::debug!(
            categories = tree.order.len(),
            roots = tree.roots.len(),
            "category tree built"
        );

        tree
    }

    fn detach_orphans(&mut self) {
        for id in &self.order {
            let missing = match self.nodes[id].parent {
                Some(parent) if !self.nodes.contains_key(&parent) => parent,
                _ => continue,
            };
            if let Some(node) = self.nodes.get_mut(id) {
                node.parent = None;
            }
            self.anomalies.push(Anomaly::OrphanedParent {
                category_id: *id,
                missing_parent: missing,
            });
        }
    }

    /// Every node has at most one parent, so each walk either reaches a
    /// root, reaches a node finished by an earlier walk, or re-enters its own
    /// path. The last case is a cycle.
    fn cut_cycles(&mut self) {
        let position: HashMap<CategoryId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let mut state = vec![Visit::Unvisited; self.order.len()];

        for start in 0..self.order.len() {
            if state[start] != Visit::Unvisited {
                continue;
            }

            let mut path: Vec<CategoryId> = Vec::new();
            let mut current = Some(self.order[start]);

            while let Some(id) = current {
                let i = position[&id];
                match state[i] {
                    Visit::Done => break,
                    Visit::InProgress => {
                        let entry = path.iter().position(|p| *p == id).unwrap_or(0);
                        let members = path[entry..].to_vec();
                        let broken_at = members
                            .iter()
                            .copied()
                            .min_by_key(|m| position[m])
                            .unwrap_or(id);
                        if let Some(node) = self.nodes.get_mut(&broken_at) {
                            node.parent = None;
                        }
                        self.anomalies
                            .push(Anomaly::CycleDetected { members, broken_at });
                        break;
                    }
                    Visit::Unvisited => {
                        state[i] = Visit::InProgress;
                        path.push(id);
                        current = self.nodes[&id].parent;
                    }
                }
            }

            for id in &path {
                state[position[id]] = Visit::Done;
            }
        }
    }

    /// Parent links are acyclic here, so every walk ends at a root or at a
    /// node resolved by an earlier walk. A walk longer than the category
    /// count can only mean a surviving cycle; it is cut where it was noticed.
    fn resolve_roots(&mut self) {
        let limit = self.order.len();
        let mut resolved: HashMap<CategoryId, (CategoryId, usize)> = HashMap::with_capacity(limit);

        for start in self.order.clone() {
            let mut path: Vec<CategoryId> = Vec::new();
            let mut current = start;

            let (root, mut depth) = loop {
                if let Some(&known) = resolved.get(&current) {
                    break known;
                }
                if path.len() > limit {
                    self.cut_runaway_walk(&mut path, current);
                    resolved.insert(current, (current, 0));
                    break (current, 0);
                }
                match self.nodes.get(&current).and_then(|n| n.parent) {
                    Some(parent) => {
                        path.push(current);
                        current = parent;
                    }
                    None => {
                        resolved.insert(current, (current, 0));
                        break (current, 0);
                    }
                }
            };

            for id in path.iter().rev() {
                depth += 1;
                resolved.entry(*id).or_insert((root, depth));
            }
        }

        for (id, (root, depth)) in resolved {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.root = root;
                node.depth = depth;
            }
        }
    }

    fn cut_runaway_walk(&mut self, path: &mut Vec<CategoryId>, at: CategoryId) {
        let entry = path.iter().position(|p| *p == at).unwrap_or(path.len());
        let mut members: Vec<CategoryId> = Vec::new();
        for id in &path[entry..] {
            if members.contains(id) {
                break;
            }
            members.push(*id);
        }
        path.truncate(entry);

        if let Some(node) = self.nodes.get_mut(&at) {
            node.parent = None;
        }
        self.anomalies.push(Anomaly::CycleDetected {
            members,
            broken_at: at,
        });
    }

    fn link_children(&mut self) {
        let links: Vec<(CategoryId, Option<CategoryId>)> = self
            .order
            .iter()
            .map(|id| (*id, self.nodes[id].parent))
            .collect();

        for (id, parent) in links {
            match parent {
                None => self.roots.push(id),
                Some(parent) => {
                    if let Some(node) = self.nodes.get_mut(&parent) {
                        node.children.push(id);
                    }
                }
            }
        }
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id).map(|n| &n.category)
    }

    pub fn node(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The parent of a category, `None` for roots and unknown ids
    pub fn parent_of(&self, id: CategoryId) -> Option<&Category> {
        self.nodes
            .get(&id)
            .and_then(|n| n.parent)
            .and_then(|p| self.get(p))
    }

    /// The root ancestor of a category; a root is its own root
    ///
    /// Returns `None` only when `id` is unknown.
    pub fn root_of(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id).and_then(|n| self.get(n.root))
    }

    /// Kind used for top-level totals: the root ancestor's kind
    pub fn root_kind(&self, id: CategoryId) -> Option<CategoryKind> {
        self.root_of(id).map(|root| root.kind)
    }

    /// Number of ancestors; 0 for a root
    pub fn depth_of(&self, id: CategoryId) -> Option<usize> {
        self.nodes.get(&id).map(|n| n.depth)
    }

    /// Direct children of a category in input order
    pub fn children_of(&self, id: CategoryId) -> impl Iterator<Item = &Category> + '_ {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|c| self.get(*c))
    }

    /// Root categories in input order
    pub fn roots(&self) -> impl Iterator<Item = &Category> + '_ {
        self.roots.iter().filter_map(|id| self.get(*id))
    }

    /// All categories in input order
    pub fn iter(&self) -> impl Iterator<Item = &Category> + '_ {
        self.order.iter().filter_map(|id| self.get(*id))
    }

    /// Case-insensitive lookup by name, first match in input order
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        let needle = name.trim().to_lowercase();
        self.iter().find(|c| c.name.to_lowercase() == needle)
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
