//! External dependency tracking for unsat cores.
//!
//! Callers tag assertions with opaque integers. Internally tags become leaves
//! of a content-addressed join tree: joining the same pair twice yields the
//! same node, so dependency sets stay shared instead of being copied around.
//! `linearize` flattens a tree back into the sorted set of leaf tags.

use rustc_hash::FxHashMap;

/// Handle to a dependency tree node. The null handle is the empty set and is
/// the identity of `join`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dep(u32);

impl Dep {
    /// The empty dependency set.
    pub const NULL: Dep = Dep(0);

    /// Is this the empty set?
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy)]
enum DepNode {
    Leaf(u32),
    Join(Dep, Dep),
}

/// Arena of dependency nodes with memoized construction.
#[derive(Debug, Default)]
pub struct DepManager {
    nodes: Vec<DepNode>,
    leaves: FxHashMap<u32, Dep>,
    joins: FxHashMap<(Dep, Dep), Dep>,
}

impl DepManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            // Slot 0 is reserved for Dep::NULL.
            nodes: vec![DepNode::Leaf(u32::MAX)],
            leaves: FxHashMap::default(),
            joins: FxHashMap::default(),
        }
    }

    /// The singleton set containing `tag`.
    pub fn leaf(&mut self, tag: u32) -> Dep {
        if let Some(&d) = self.leaves.get(&tag) {
            return d;
        }
        let d = self.push(DepNode::Leaf(tag));
        self.leaves.insert(tag, d);
        d
    }

    /// Union of two dependency sets.
    pub fn join(&mut self, a: Dep, b: Dep) -> Dep {
        if a.is_null() || a == b {
            return b;
        }
        if b.is_null() {
            return a;
        }
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&d) = self.joins.get(&key) {
            return d;
        }
        let d = self.push(DepNode::Join(key.0, key.1));
        self.joins.insert(key, d);
        d
    }

    /// Flatten a dependency set into its sorted, de-duplicated leaf tags.
    #[must_use]
    pub fn linearize(&self, dep: Dep) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![dep];
        while let Some(d) = stack.pop() {
            if d.is_null() {
                continue;
            }
            match self.nodes[d.0 as usize] {
                DepNode::Leaf(tag) => out.push(tag),
                DepNode::Join(a, b) => {
                    stack.push(a);
                    stack.push(b);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    fn push(&mut self, node: DepNode) -> Dep {
        let d = Dep(u32::try_from(self.nodes.len()).expect("dependency arena overflow"));
        self.nodes.push(node);
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_identity() {
        let mut dm = DepManager::new();
        let a = dm.leaf(3);
        assert_eq!(dm.join(Dep::NULL, a), a);
        assert_eq!(dm.join(a, Dep::NULL), a);
        assert_eq!(dm.join(a, a), a);
    }

    #[test]
    fn test_content_addressing() {
        let mut dm = DepManager::new();
        let a = dm.leaf(1);
        let b = dm.leaf(2);
        let ab = dm.join(a, b);
        let ba = dm.join(b, a);
        assert_eq!(ab, ba);
        assert_eq!(dm.leaf(1), a);
    }

    #[test]
    fn test_linearize() {
        let mut dm = DepManager::new();
        let a = dm.leaf(5);
        let b = dm.leaf(2);
        let c = dm.leaf(5);
        let ab = dm.join(a, b);
        let abc = dm.join(ab, c);
        assert_eq!(dm.linearize(abc), vec![2, 5]);
        assert_eq!(dm.linearize(Dep::NULL), Vec::<u32>::new());
    }
}
