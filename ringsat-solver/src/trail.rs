//! The trail: ordered undo log for every reversible mutation.
//!
//! The search stack holds the assignments themselves; the trail records, in
//! order, which kind of mutation happened so backtracking can dispatch on it
//! and reverse each one. Popping below the level where a boolean assignment
//! was made deactivates its constraint; if the constraint (and its reason)
//! are stored at a surviving level, the assignment is replayed at the target
//! level after the pop, watches rebuilt and narrowing re-run.

use crate::clause::ClauseId;
use crate::constraint::SignedConstraint;
use crate::solver::Solver;
use crate::types::{Lit, PVar};
use ringsat_math::NodeId;
use tracing::{debug, trace};

/// One entry of the mixed search stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchItem {
    /// An integer variable got a value.
    Assignment {
        /// The assigned variable.
        var: PVar,
        /// The assigned value.
        val: u64,
    },
    /// A boolean literal became true.
    Boolean(Lit),
}

/// One reversible mutation.
#[derive(Debug, Clone, Copy)]
pub(crate) enum TrailInstr {
    /// The decision level was incremented.
    IncLevel,
    /// A variable was created.
    AddVar,
    /// An integer assignment was pushed onto the search stack.
    AssignInt,
    /// A boolean assignment was pushed onto the search stack.
    AssignBool,
    /// A viable set was refined; holds the previous predicate.
    Viable { var: PVar, prev: NodeId },
    /// A constraint was appended to `cjust[var]`.
    Cjust { var: PVar },
    /// The propagation head was advanced; holds the previous position.
    Qhead { prev: usize },
}

impl Solver {
    pub(crate) fn push_level(&mut self) {
        self.level += 1;
        self.trail.push(TrailInstr::IncLevel);
    }

    pub(crate) fn backjump(&mut self, new_level: u32) {
        debug!(from = self.level, to = new_level, "backjump");
        if self.level > new_level {
            self.pop_levels(self.level - new_level);
        }
    }

    /// Undo `num` levels, walking the trail backwards and reversing each
    /// mutation, then release storage and replay surviving propagations.
    pub(crate) fn pop_levels(&mut self, num: u32) {
        debug_assert!(self.level >= num);
        let target = self.level - num;
        trace!(from = self.level, to = target, "pop levels");
        let mut remaining = num;
        let mut replay: Vec<(Lit, ClauseId, Option<ClauseId>)> = Vec::new();
        while remaining > 0 {
            let instr = self.trail.pop().expect("trail exhausted below target level");
            match instr {
                TrailInstr::IncLevel => {
                    self.level -= 1;
                    remaining -= 1;
                }
                TrailInstr::AddVar => self.del_var(),
                TrailInstr::AssignInt => {
                    let Some(SearchItem::Assignment { var, .. }) = self.search.pop() else {
                        unreachable!("trail and search stack out of sync");
                    };
                    trace!(var, "undo assignment");
                    self.justification[var as usize] = crate::justification::Justification::Unassigned;
                    self.queue.unassign_var(var);
                }
                TrailInstr::AssignBool => {
                    let Some(SearchItem::Boolean(lit)) = self.search.pop() else {
                        unreachable!("trail and search stack out of sync");
                    };
                    trace!(%lit, "undo boolean assignment");
                    let sc = self.store.lookup_lit(lit);
                    if let Some(entry) = self.replay_entry(lit, target) {
                        replay.push(entry);
                    }
                    self.deactivate(sc);
                    self.bools.unassign(lit.var());
                }
                TrailInstr::Viable { var, prev } => {
                    self.viable[var as usize] = prev;
                }
                TrailInstr::Cjust { var } => {
                    self.cjust[var as usize].pop();
                }
                TrailInstr::Qhead { prev } => {
                    self.qhead = prev;
                }
            }
        }
        self.pop_constraint_list(target);
        self.store.release_level(target + 1, &mut self.bools);
        debug_assert_eq!(self.level, target);
        // Replay in original (bottom-up) order. The replayed entries land
        // above the restored propagation head, so the queue re-activates
        // them (watches rebuilt, narrowing re-run) in order.
        for (lit, reason, lemma) in replay.into_iter().rev() {
            trace!(%lit, "replay boolean assignment");
            self.bools.assign(lit, self.level, Some(reason), lemma);
            self.search.push(SearchItem::Boolean(lit));
            self.trail.push(TrailInstr::AssignBool);
            debug_assert!(self.qhead < self.search.len());
        }
    }

    /// A popped boolean assignment survives as a replay when its constraint
    /// and its justifying clauses are all stored at or below the target.
    fn replay_entry(&self, lit: Lit, target: u32) -> Option<(Lit, ClauseId, Option<ClauseId>)> {
        let sc = self.store.lookup_lit(lit);
        if self.store.get(sc.id).level > target {
            return None;
        }
        let reason = self.bools.reason(lit.var())?;
        if self.store.clause(reason).level() > target {
            return None;
        }
        let lemma = self.bools.lemma(lit.var());
        if let Some(l) = lemma {
            if self.store.clause(l).level() > target {
                return None;
            }
        }
        Some((lit, reason, lemma))
    }

    /// Drop bookkeeping entries whose storage level got popped. Re-interning
    /// can lower a storage level after insertion, so this scans instead of
    /// trusting the insertion order.
    fn pop_constraint_list(&mut self, target: u32) {
        let mut dropped: Vec<SignedConstraint> = Vec::new();
        {
            let store = &self.store;
            self.original.retain(|&sc| {
                let keep = store.get(sc.id).level <= target;
                if !keep {
                    dropped.push(sc);
                }
                keep
            });
            self.redundant.retain(|&sc| {
                let keep = store.get(sc.id).level <= target;
                if !keep {
                    dropped.push(sc);
                }
                keep
            });
            self.redundant_clauses
                .retain(|&cid| store.clause(cid).level() <= target);
        }
        for sc in dropped {
            self.deactivate(sc);
        }
    }

    fn del_var(&mut self) {
        let v = (self.num_vars() - 1) as PVar;
        trace!(var = v, "undo variable creation");
        self.queue.pop_var(v);
        self.value.pop();
        self.justification.pop();
        self.viable.pop();
        let cj = self.cjust.pop();
        debug_assert!(cj.is_some_and(|c| c.is_empty()));
        let w = self.watch.pop();
        debug_assert!(w.is_some_and(|w| w.is_empty()));
        self.vars.pop();
        self.width.pop();
        self.pop_mark();
    }
}
