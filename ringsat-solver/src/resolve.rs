//! The conflict-resolution driver.
//!
//! Walks the search stack from the top down, processing marked entries:
//! value resolution for propagated integer variables, boolean resolution for
//! propagated literals, and reversion for decisions of either kind. Reaching
//! the base level (or exhausting the trail) makes the problem unsat relative
//! to the current user scope.

use crate::clause::{Clause, ClauseId};
use crate::solver::Solver;
use crate::trail::SearchItem;
use crate::types::{BVar, LBool, Lit, PVar};
use tracing::{debug, trace};

impl Solver {
    pub(crate) fn resolve_conflict(&mut self) {
        self.stats.conflicts += 1;
        debug!(
            core = self.conflict.constraints.len(),
            conflict_var = ?self.conflict.conflict_var,
            "resolve conflict"
        );
        self.queue.decay();
        self.remark();

        if let Some(v) = self.conflict.conflict_var {
            // An emptied viable set is a propagation of v that never made it
            // onto the stack; resolve it first.
            self.resolve_value_step(v);
            self.remark();
        }

        let mut i = self.search.len();
        while i > 0 {
            i -= 1;
            match self.search[i] {
                SearchItem::Assignment { var: v, .. } => {
                    if !self.is_marked(v) {
                        continue;
                    }
                    let j = self.justification[v as usize];
                    trace!(var = v, ?j, "conflict walk");
                    if j.level() <= self.base_level() {
                        break;
                    }
                    if j.is_decision() {
                        self.revert_decision(v);
                        return;
                    }
                    debug_assert!(j.is_propagation());
                    self.resolve_value_step(v);
                }
                SearchItem::Boolean(lit) => {
                    let var = lit.var();
                    if !self.bools.is_marked(var) {
                        continue;
                    }
                    trace!(%lit, "conflict walk");
                    if self.bools.level(var) <= self.base_level() {
                        break;
                    }
                    if self.bools.is_decision(var) {
                        self.revert_bool_decision(lit);
                        return;
                    }
                    debug_assert!(self.bools.is_propagation(var));
                    self.resolve_bool(lit);
                }
            }
            self.remark();
        }
        self.report_unsat();
    }

    /// Refresh all marks from the current core.
    fn remark(&mut self) {
        self.reset_marks();
        self.bools.reset_marks();
        let mut pvars: Vec<PVar> = Vec::new();
        let mut bvars: Vec<BVar> = Vec::new();
        if let Some(v) = self.conflict.conflict_var {
            pvars.push(v);
        }
        for &sc in &self.conflict.constraints {
            let data = self.store.get(sc.id);
            bvars.push(data.bvar);
            pvars.extend(data.vars.iter().copied());
        }
        for v in pvars {
            self.set_mark(v);
            self.queue.bump(v);
        }
        for b in bvars {
            self.bools.set_mark(b);
        }
    }

    /// Boolean resolution of the core against the reason of `lit`.
    fn resolve_bool(&mut self, lit: Lit) {
        let var = lit.var();
        let rid = self
            .bools
            .reason(var)
            .expect("boolean propagation carries a reason clause");
        let reason = self.store.clause(rid).clone();
        trace!(%lit, "boolean resolution");
        let store = &self.store;
        self.conflict
            .constraints
            .retain(|sc| store.get(sc.id).bvar != var);
        for &l in reason.literals() {
            if l.var() != var {
                let nc = !self.store.lookup_lit(l);
                self.conflict.insert(nc);
            }
        }
        self.conflict.extra_dep = self.dm.join(self.conflict.extra_dep, reason.dep());
    }

    /// Revert the integer decision `v := value` that the conflict depends on.
    ///
    /// Explains the conflict (forbidden intervals first), backjumps below the
    /// decision, excludes the guessed value, learns the lemma, and re-decides.
    fn revert_decision(&mut self, v: PVar) {
        let val = self.value[v as usize];
        let lvl = self.justification[v as usize].level();
        debug!(var = v, val, lvl, "revert decision");
        let cjust_snapshot = self.cjust[v as usize].clone();
        let mut lemma = self.explain_intervals(v, &cjust_snapshot);
        if lemma.is_none() && !self.conflict.needs_model {
            lemma = Some(self.build_fallback_lemma());
        }
        if let Some(cl) = lemma.as_mut() {
            self.clamp_lemma_storage(cl, lvl - 1);
        }
        self.conflict.reset();
        self.backjump(lvl - 1);
        self.add_non_viable(v, val);
        if let Some(cl) = lemma {
            if !cl.is_empty() {
                self.learn_lemma(v, cl);
            }
        }
        if self.is_conflict() {
            return;
        }
        self.narrow_var(v);
        if self.is_conflict() {
            return;
        }
        if self.justification[v as usize].is_unassigned() {
            self.queue.del_var(v);
            self.decide_var(v);
        }
    }

    /// Revert a boolean decision: replace it by the propagation of its
    /// negation under a reason built from the core, then guess the next
    /// literal of the lemma it came from.
    fn revert_bool_decision(&mut self, lit: Lit) {
        let var = lit.var();
        let lvl = self.bools.level(var);
        debug!(%lit, lvl, "revert boolean decision");
        let mut reason = self.build_fallback_lemma();
        // Keep the boolean-resolution invariant: the negation of the decided
        // literal must appear in its reason.
        reason.push_unique(!lit);
        let own_level = self.store.get(self.store.lookup_lit(lit).id).level;
        if own_level > reason.level() {
            reason.set_level(own_level);
        }
        let lemma = self
            .bools
            .lemma(var)
            .expect("boolean decisions come from guessing a lemma literal");
        self.clamp_lemma_storage(&mut reason, lvl - 1);
        self.conflict.reset();
        self.backjump(lvl - 1);
        let rid = self.add_lemma(reason);
        self.propagate_bool(!lit, rid);
        if self.is_conflict() {
            return;
        }
        self.decide_bool_on(lemma);
    }

    /// Keep a clause and the constraints behind its literals alive across a
    /// backjump to `target`: storage above that level is about to be
    /// released, and learned clauses must not outlive their constraints.
    fn clamp_lemma_storage(&mut self, clause: &mut Clause, target: u32) {
        if clause.level() > target {
            clause.set_level(target);
        }
        // No literal constraint may be stored above the clause itself.
        let bound = clause.level();
        for &l in clause.literals() {
            let sc = self.store.lookup_lit(l);
            self.store.lower_level(sc.id, bound);
        }
    }

    /// Negations of the core constraints as a clause. Only valid as a lemma
    /// when the core does not depend on the model.
    fn build_fallback_lemma(&mut self) -> Clause {
        let core = self.conflict.constraints.clone();
        let mut level = 0;
        let mut dep = self.conflict.extra_dep;
        for &sc in &core {
            let data = self.store.get(sc.id);
            level = level.max(data.level);
            dep = self.dm.join(dep, data.dep);
        }
        let mut clause = Clause::new(level, dep, []);
        for &sc in &core {
            clause.push_unique(self.store.blit(!sc));
        }
        clause
    }

    /// Unsatisfiable relative to the current base: collect dependencies and
    /// return to the base level with the conflict still set.
    fn report_unsat(&mut self) {
        debug!("unsat at base level");
        let mut dep = self.conflict.extra_dep;
        for &sc in &self.conflict.constraints.clone() {
            dep = self.dm.join(dep, self.store.get(sc.id).dep);
        }
        self.conflict.extra_dep = dep;
        self.backjump(self.base_level());
        let store = &self.store;
        self.conflict.constraints.retain(|sc| store.is_live(sc.id));
        debug_assert!(self.is_conflict());
    }

    /// Store a learned clause justifying `v` and branch on one of its
    /// literals.
    pub(crate) fn learn_lemma(&mut self, v: PVar, mut lemma: Clause) {
        debug_assert!(!lemma.is_empty());
        lemma.justified_var = Some(v);
        let cid = self.add_lemma(lemma);
        self.decide_bool_on(cid);
    }

    /// Add a lemma to the redundant store without activating it.
    pub(crate) fn add_lemma(&mut self, lemma: Clause) -> ClauseId {
        self.stats.lemmas += 1;
        let unit = (lemma.len() == 1).then(|| lemma.literals()[0]);
        let cid = self.store.store_clause(lemma);
        debug!(clause = cid, "learn lemma");
        self.redundant_clauses.push(cid);
        let mut i = self.redundant_clauses.len() - 1;
        while i > 0
            && self.store.clause(self.redundant_clauses[i - 1]).level()
                > self.store.clause(self.redundant_clauses[i]).level()
        {
            self.redundant_clauses.swap(i - 1, i);
            i -= 1;
        }
        if let Some(l) = unit {
            let sc = self.store.lookup_lit(l);
            // Keep an existing (longer-lived) unit clause, e.g. from an
            // external assertion of the same constraint.
            let data = self.store.get_mut(sc.id);
            if data.unit_clause.is_none() {
                data.unit_clause = Some(cid);
            }
            Self::insert_level_sorted(&self.store, &mut self.redundant, sc);
        }
        cid
    }

    /// Guess a literal of a lemma that is neither assigned false nor false
    /// under the current model, starting from the clause's guess cursor.
    /// The last such literal propagates instead; none at all is a conflict
    /// on the lemma itself.
    pub(crate) fn decide_bool_on(&mut self, cid: ClauseId) {
        let clause = self.store.clause(cid).clone();
        if clause
            .literals()
            .iter()
            .any(|&l| self.bools.value_lit(l) == LBool::True)
        {
            // The clause is already satisfied; nothing to branch on.
            trace!(clause = cid, "lemma already satisfied");
            return;
        }
        let len = clause.len();
        let start = clause.next_guess as usize;
        let mut choice: Option<(usize, Lit)> = None;
        let mut num_choices = 0;
        for off in 0..len {
            let idx = (start + off) % len;
            let l = clause.literals()[idx];
            if self.is_suitable_guess(l) {
                num_choices += 1;
                if choice.is_none() {
                    choice = Some((idx, l));
                }
            }
        }
        match choice {
            None => {
                // Every literal is false: the lemma itself is the conflict.
                let all_assigned_false = clause
                    .literals()
                    .iter()
                    .all(|&l| self.bools.value_lit(l) == LBool::False);
                let negated: Vec<_> = clause
                    .literals()
                    .iter()
                    .map(|&l| !self.store.lookup_lit(l))
                    .collect();
                if !self.is_conflict() {
                    debug!(clause = cid, "lemma has no guessable literal");
                    self.conflict
                        .set_clause(negated, clause.dep(), !all_assigned_false);
                }
            }
            Some((idx, l)) => {
                self.store.clause_mut(cid).next_guess = (idx as u32).wrapping_add(1);
                if let Some(jv) = clause.justified_var {
                    let sc = self.store.lookup_lit(l);
                    self.push_cjust(jv, sc);
                }
                if num_choices == 1 {
                    self.propagate_bool(l, cid);
                } else {
                    self.decide_bool_lit(l, cid);
                }
            }
        }
    }

    fn is_suitable_guess(&self, l: Lit) -> bool {
        match self.bools.value_lit(l) {
            LBool::False => false,
            // A true literal cannot appear in a freshly violated lemma.
            LBool::True => false,
            LBool::Undef => !self.is_currently_false(self.store.lookup_lit(l)),
        }
    }
}
