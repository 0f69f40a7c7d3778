//! A small hash-consed reduced ordered binary decision diagram manager.
//!
//! Nodes are interned in a unique table and never freed; handles stay valid
//! for the manager's lifetime, which lets clients store them in undo logs and
//! compare predicates by handle equality. Variables are ordered by index,
//! smaller indices closer to the root.

use rustc_hash::FxHashMap;

/// Handle to a BDD node. Handle equality is semantic equality of the
/// represented predicates (within one manager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The constant-false predicate.
    pub const FALSE: NodeId = NodeId(0);
    /// The constant-true predicate.
    pub const TRUE: NodeId = NodeId(1);

    /// Is this a terminal node?
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.0 <= 1
    }
}

/// Variable index used for the two terminal nodes.
const TERMINAL_VAR: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BddNode {
    pub(crate) var: u32,
    pub(crate) lo: NodeId,
    pub(crate) hi: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    And,
    Or,
    Xor,
}

/// Hash-consing BDD manager.
#[derive(Debug, Default)]
pub(crate) struct BddManager {
    nodes: Vec<BddNode>,
    unique: FxHashMap<BddNode, NodeId>,
    apply_cache: FxHashMap<(Op, NodeId, NodeId), NodeId>,
    not_cache: FxHashMap<NodeId, NodeId>,
}

impl BddManager {
    pub(crate) fn new() -> Self {
        let terminal = |id| BddNode {
            var: TERMINAL_VAR,
            lo: id,
            hi: id,
        };
        Self {
            nodes: vec![terminal(NodeId::FALSE), terminal(NodeId::TRUE)],
            unique: FxHashMap::default(),
            apply_cache: FxHashMap::default(),
            not_cache: FxHashMap::default(),
        }
    }

    pub(crate) fn node(&self, n: NodeId) -> BddNode {
        self.nodes[n.0 as usize]
    }

    pub(crate) fn var_of(&self, n: NodeId) -> u32 {
        self.nodes[n.0 as usize].var
    }

    pub(crate) fn mk(&mut self, var: u32, lo: NodeId, hi: NodeId) -> NodeId {
        if lo == hi {
            return lo;
        }
        debug_assert!(var < self.var_of(lo) && var < self.var_of(hi));
        let node = BddNode { var, lo, hi };
        if let Some(&id) = self.unique.get(&node) {
            return id;
        }
        let id = NodeId(u32::try_from(self.nodes.len()).expect("BDD node table overflow"));
        self.nodes.push(node);
        self.unique.insert(node, id);
        id
    }

    /// The predicate "bit `var` is set".
    pub(crate) fn literal(&mut self, var: u32) -> NodeId {
        self.mk(var, NodeId::FALSE, NodeId::TRUE)
    }

    pub(crate) fn and(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.apply(Op::And, a, b)
    }

    pub(crate) fn or(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.apply(Op::Or, a, b)
    }

    pub(crate) fn xor(&mut self, a: NodeId, b: NodeId) -> NodeId {
        self.apply(Op::Xor, a, b)
    }

    pub(crate) fn not(&mut self, a: NodeId) -> NodeId {
        match a {
            NodeId::FALSE => NodeId::TRUE,
            NodeId::TRUE => NodeId::FALSE,
            _ => {
                if let Some(&r) = self.not_cache.get(&a) {
                    return r;
                }
                let n = self.node(a);
                let lo = self.not(n.lo);
                let hi = self.not(n.hi);
                let r = self.mk(n.var, lo, hi);
                self.not_cache.insert(a, r);
                r
            }
        }
    }

    fn apply(&mut self, op: Op, a: NodeId, b: NodeId) -> NodeId {
        if let Some(r) = Self::apply_terminal(op, a, b) {
            return r;
        }
        // All three ops are commutative; canonicalize the cache key.
        let key = if a <= b { (op, a, b) } else { (op, b, a) };
        if let Some(&r) = self.apply_cache.get(&key) {
            return r;
        }
        let var = self.var_of(a).min(self.var_of(b));
        let (alo, ahi) = self.cofactors(a, var);
        let (blo, bhi) = self.cofactors(b, var);
        let lo = self.apply(op, alo, blo);
        let hi = self.apply(op, ahi, bhi);
        let r = self.mk(var, lo, hi);
        self.apply_cache.insert(key, r);
        r
    }

    fn apply_terminal(op: Op, a: NodeId, b: NodeId) -> Option<NodeId> {
        match op {
            Op::And => match (a, b) {
                (NodeId::FALSE, _) | (_, NodeId::FALSE) => Some(NodeId::FALSE),
                (NodeId::TRUE, x) | (x, NodeId::TRUE) => Some(x),
                _ if a == b => Some(a),
                _ => None,
            },
            Op::Or => match (a, b) {
                (NodeId::TRUE, _) | (_, NodeId::TRUE) => Some(NodeId::TRUE),
                (NodeId::FALSE, x) | (x, NodeId::FALSE) => Some(x),
                _ if a == b => Some(a),
                _ => None,
            },
            Op::Xor => match (a, b) {
                (NodeId::FALSE, x) | (x, NodeId::FALSE) => Some(x),
                _ if a == b => Some(NodeId::FALSE),
                _ => None,
            },
        }
    }

    fn cofactors(&self, n: NodeId, var: u32) -> (NodeId, NodeId) {
        let node = self.node(n);
        if node.var == var {
            (node.lo, node.hi)
        } else {
            (n, n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        let mut m = BddManager::new();
        assert_eq!(m.and(NodeId::TRUE, NodeId::FALSE), NodeId::FALSE);
        assert_eq!(m.or(NodeId::TRUE, NodeId::FALSE), NodeId::TRUE);
        assert_eq!(m.not(NodeId::TRUE), NodeId::FALSE);
    }

    #[test]
    fn test_hash_consing() {
        let mut m = BddManager::new();
        let a = m.literal(0);
        let b = m.literal(1);
        let ab1 = m.and(a, b);
        let ab2 = m.and(b, a);
        assert_eq!(ab1, ab2);
    }

    #[test]
    fn test_de_morgan() {
        let mut m = BddManager::new();
        let a = m.literal(0);
        let b = m.literal(2);
        let lhs = {
            let ab = m.and(a, b);
            m.not(ab)
        };
        let rhs = {
            let na = m.not(a);
            let nb = m.not(b);
            m.or(na, nb)
        };
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_xor_identity() {
        let mut m = BddManager::new();
        let a = m.literal(0);
        let b = m.literal(1);
        let x = m.xor(a, b);
        let x2 = m.xor(x, b);
        assert_eq!(x2, a);
    }

    #[test]
    fn test_double_negation() {
        let mut m = BddManager::new();
        let a = m.literal(0);
        let b = m.literal(1);
        let ab = m.or(a, b);
        let n = m.not(ab);
        assert_eq!(m.not(n), ab);
    }
}
