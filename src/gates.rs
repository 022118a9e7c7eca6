//! OR-gate discovery and gate-based clause simplification
//!
//! An OR gate is the identity `output ⇔ (input₁ ∨ input₂ ∨ ...)`, encoded
//! in CNF as one long clause `¬output ∨ input₁ ∨ ...` plus one binary
//! clause `output ∨ ¬inputᵢ` per input. This module discovers gates
//! implied by the clause database, synthesizes new gates by introducing
//! fresh output variables (extended resolution), and exploits gates three
//! ways:
//!
//! - shortening clauses that contain all gate inputs,
//! - contracting clause pairs through two-input gates
//!   (`w ⇔ a ∨ b` merges `¬a ∨ X` and `¬b ∨ X` into `¬w ∨ X`),
//! - deriving literal equivalences from gates with identical inputs.
//!
//! All passes are budgeted through the occurrence store's work counter and
//! abort cleanly when it runs out; partial results are consistent.

use std::io;
use std::mem;
use std::time::Instant;

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::clause::ClauseStats;
use crate::clause_db::ClauseDB;
use crate::literal::{Lit, Var};
use crate::solver::Solver;
use crate::subsume::{clause_sig, sig_bit, ClauseSig, Subsumer};

/// A discovered or synthesized OR gate
#[derive(Debug, Clone)]
pub struct OrGate {
    /// The disjuncts, kept sorted; at least two
    pub inputs: Vec<Lit>,
    /// The literal equivalent to the disjunction of the inputs
    pub output: Lit,
    /// True if any witnessing clause was learnt
    pub learnt: bool,
    /// Tombstone flag; removed gates keep their id but are skipped
    pub removed: bool,
}

impl OrGate {
    /// Create a gate, normalizing the input order
    pub fn new(mut inputs: Vec<Lit>, output: Lit, learnt: bool) -> Self {
        debug_assert!(inputs.len() >= 2);
        inputs.sort_unstable();
        OrGate {
            inputs,
            output,
            learnt,
            removed: false,
        }
    }
}

/// Configuration for the gate passes
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Shorten clauses that contain all inputs of a gate
    pub shorten_with_or_gates: bool,
    /// Contract clause pairs through two-input gates
    pub remove_cl_with_and_gates: bool,
    /// Derive equivalences from gates with identical inputs
    pub find_eq_lits: bool,
    /// Clauses longer than this are never examined for gates
    pub max_gate_size: usize,
    /// Emit pass banners at `info` level when at least 1
    pub verbosity: u32,
    /// Work budget for one discovery pass
    pub find_budget: i64,
    /// Work budget for one shortening pass
    pub shorten_budget: i64,
    /// Work budget for one contraction pass
    pub contract_budget: i64,
    /// Work budget for one synthesis pass
    pub synth_budget: i64,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            shorten_with_or_gates: true,
            remove_cl_with_and_gates: true,
            find_eq_lits: true,
            max_gate_size: 20,
            verbosity: 0,
            find_budget: 100_000_000,
            shorten_budget: 100_000_000,
            contract_budget: 100_000_000,
            synth_budget: 100_000_000,
        }
    }
}

/// Synthesis stops sampling once the budget sinks below this floor
const SYNTH_BUDGET_FLOOR: i64 = 50_000_000;

/// Cap on the work spent in dry-run contractions during one synthesis pass
const DRY_RUN_OP_CAP: u64 = 100_000_000;

/// Cumulative statistics across all passes
#[derive(Debug, Clone, Default)]
pub struct GateStats {
    /// Gates inserted into the store
    pub gates_found: u64,
    /// Clauses rewritten or dropped by OR-gate shortening
    pub clauses_shortened: u64,
    /// Literals dropped by OR-gate shortening
    pub lits_removed: u64,
    /// Clause pairs merged by AND-gate contraction
    pub clauses_removed: u64,
    /// Fresh output variables introduced by synthesis
    pub vars_added: u64,
    /// Variables queued for replacement via gate equivalences
    pub vars_replaced: u64,
    /// Wall-clock seconds spent in gate passes
    pub total_time: f64,
}

/// Storage for discovered gates with two reverse indexes
///
/// Gates are never erased during a pass; `mark_removed` tombstones them so
/// ids stay stable and the index postings never dangle.
#[derive(Debug, Default)]
pub struct GateStore {
    gates: Vec<OrGate>,
    by_output: Vec<Vec<u32>>,
    by_input: Vec<Vec<u32>>,
}

impl GateStore {
    /// Create a store for `num_vars` variables
    pub fn new(num_vars: usize) -> Self {
        GateStore {
            gates: Vec::new(),
            by_output: vec![Vec::new(); num_vars * 2],
            by_input: vec![Vec::new(); num_vars * 2],
        }
    }

    /// Grow the reverse indexes to cover `num_vars` variables
    pub fn ensure_num_vars(&mut self, num_vars: usize) {
        let target = num_vars.saturating_mul(2);
        if self.by_output.len() < target {
            self.by_output.resize_with(target, Vec::new);
        }
        if self.by_input.len() < target {
            self.by_input.resize_with(target, Vec::new);
        }
    }

    /// Insert a gate and index it; the caller handles deduplication.
    ///
    /// The output index is always updated; the input index only for
    /// non-learnt gates, so learnt inputs can never enable a non-learnt
    /// rewrite.
    pub fn add(&mut self, gate: OrGate) -> u32 {
        let id = self.gates.len() as u32;
        self.by_output[gate.output.index()].push(id);
        if !gate.learnt {
            for &l in &gate.inputs {
                self.by_input[l.index()].push(id);
            }
        }
        self.gates.push(gate);
        id
    }

    /// The gate with the given id
    #[inline]
    pub fn get(&self, id: u32) -> &OrGate {
        &self.gates[id as usize]
    }

    /// Tombstone a gate; its id stays valid
    pub fn mark_removed(&mut self, id: u32) {
        self.gates[id as usize].removed = true;
    }

    /// Number of slots, tombstoned ones included
    #[inline]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// True if no gate was ever inserted
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Ids and gates that have not been tombstoned
    pub fn iter_live(&self) -> impl Iterator<Item = (u32, &OrGate)> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.removed)
            .map(|(i, g)| (i as u32, g))
    }

    /// Ids of gates with the given output literal
    #[inline]
    pub fn by_output(&self, lit: Lit) -> &[u32] {
        let idx = lit.index();
        if idx < self.by_output.len() {
            &self.by_output[idx]
        } else {
            &[]
        }
    }

    /// Ids of non-learnt gates with the given input literal
    #[inline]
    pub fn by_input(&self, lit: Lit) -> &[u32] {
        let idx = lit.index();
        if idx < self.by_input.len() {
            &self.by_input[idx]
        } else {
            &[]
        }
    }

    /// An existing gate with this output and input set, if any
    pub fn find_same(&self, output: Lit, inputs: &[Lit]) -> Option<u32> {
        self.by_output(output)
            .iter()
            .copied()
            .find(|&id| self.gates[id as usize].inputs == inputs)
    }

    /// Drop every gate and empty both indexes
    pub fn clear(&mut self) {
        self.gates.clear();
        for list in &mut self.by_output {
            list.clear();
        }
        for list in &mut self.by_input {
            list.clear();
        }
    }
}

/// A scored candidate for a synthesized gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GateCandidate {
    lit1: Lit,
    lit2: Lit,
    num_cl_removable: u32,
    potential: u32,
}

impl Ord for GateCandidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Higher potential first, then higher removable count.
        other
            .potential
            .cmp(&self.potential)
            .then(other.num_cl_removable.cmp(&self.num_cl_removable))
            .then(self.lit1.cmp(&other.lit1))
            .then(self.lit2.cmp(&other.lit2))
    }
}

impl PartialOrd for GateCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The gate engine
///
/// Holds the gate store, configuration, cumulative statistics, and the
/// scratch buckets used by contraction. The solver state and the
/// occurrence store are passed into each pass by reference.
#[derive(Debug)]
pub struct GateFinder {
    store: GateStore,
    cfg: GateConfig,
    stats: GateStats,
    // Per-pass counters, reset at the start of the owning pass.
    shortened_pass: u64,
    lits_removed_pass: u64,
    contracted_pass: u64,
    contracted_size_pass: u64,
    size_sorted_occ: Vec<Vec<usize>>,
}

impl GateFinder {
    /// Create a gate engine for `num_vars` variables
    pub fn new(num_vars: usize, cfg: GateConfig) -> Self {
        GateFinder {
            store: GateStore::new(num_vars),
            cfg,
            stats: GateStats::default(),
            shortened_pass: 0,
            lits_removed_pass: 0,
            contracted_pass: 0,
            contracted_size_pass: 0,
            size_sorted_occ: Vec::new(),
        }
    }

    /// Grow per-variable structures to cover `num_vars` variables
    pub fn ensure_num_vars(&mut self, num_vars: usize) {
        self.store.ensure_num_vars(num_vars);
    }

    /// Cumulative statistics; every counter is non-decreasing
    #[inline]
    pub fn stats(&self) -> &GateStats {
        &self.stats
    }

    /// The gate store
    #[inline]
    pub fn store(&self) -> &GateStore {
        &self.store
    }

    /// The gate store, mutably
    #[inline]
    pub fn store_mut(&mut self) -> &mut GateStore {
        &mut self.store
    }

    /// The configuration
    #[inline]
    pub fn config(&self) -> &GateConfig {
        &self.cfg
    }

    /// The configuration, mutably
    #[inline]
    pub fn config_mut(&mut self) -> &mut GateConfig {
        &mut self.cfg
    }

    /// Clauses rewritten or dropped by the most recent shortening pass
    #[inline]
    pub fn shortened_this_pass(&self) -> u64 {
        self.shortened_pass
    }

    /// Literals dropped by the most recent shortening pass
    #[inline]
    pub fn lits_removed_this_pass(&self) -> u64 {
        self.lits_removed_pass
    }

    /// Clause pairs merged by the most recent contraction pass
    #[inline]
    pub fn contracted_this_pass(&self) -> u64 {
        self.contracted_pass
    }

    /// Forget all gates and clear every gate-definition shield
    pub fn clear_indexes(&mut self, sub: &mut Subsumer) {
        sub.clear_gate_defs();
        self.store.clear();
    }

    /// Discover the OR gates implied by the current clause database.
    ///
    /// Clears previous results first. Learnt clauses and learnt binary
    /// witnesses are admitted; gates built from them carry the `learnt`
    /// flag and are applied under the usual restrictions.
    pub fn find_or_gates(&mut self, solver: &mut Solver, sub: &mut Subsumer) {
        self.find_gates(solver, sub, true);
    }

    /// Discovery with control over learnt witnesses.
    ///
    /// With `allow_learnt_gates` false, learnt clauses are skipped and a
    /// learnt binary never counts as a witness, so every discovered gate
    /// is non-learnt.
    pub fn find_gates(&mut self, solver: &mut Solver, sub: &mut Subsumer, allow_learnt_gates: bool) {
        debug_assert!(solver.is_ok());
        let start = Instant::now();
        self.ensure_num_vars(solver.num_vars());
        sub.ensure_num_vars(solver.num_vars());
        self.clear_indexes(sub);
        sub.set_budget(self.cfg.find_budget);

        for idx in solver.db().indices() {
            if solver.db().is_deleted(idx) {
                continue;
            }
            if sub.exhausted() {
                debug!("gate discovery stopped: out of budget");
                break;
            }

            let len = solver.db().lits(idx).len();
            if len < 3 || len > self.cfg.max_gate_size {
                continue;
            }
            let clause_learnt = solver.db().is_learnt(idx);
            if !allow_learnt_gates && clause_learnt {
                continue;
            }

            // A literal with no binary implications at all cannot serve as
            // an input. Two such literals rule out every output choice.
            let mut num_zero_reach = 0u32;
            for &l in solver.db().lits(idx) {
                if solver.implied_by(l).is_empty() && solver.watches().for_lit(l).is_empty() {
                    num_zero_reach += 1;
                    if num_zero_reach > 1 {
                        break;
                    }
                }
            }
            if num_zero_reach > 1 {
                continue;
            }

            let cl: Vec<Lit> = solver.db().lits(idx).to_vec();
            for &l in &cl {
                self.try_recognize(idx, &cl, !l, clause_learnt, allow_learnt_gates, solver, sub);
            }
        }

        if self.cfg.verbosity >= 1 {
            let mut num_non_learnt = 0u64;
            let mut size_non_learnt = 0u64;
            let mut num_learnt = 0u64;
            let mut size_learnt = 0u64;
            for (_, g) in self.store.iter_live() {
                if g.learnt {
                    num_learnt += 1;
                    size_learnt += g.inputs.len() as u64;
                } else {
                    num_non_learnt += 1;
                    size_non_learnt += g.inputs.len() as u64;
                }
            }
            info!(
                non_learnt = num_non_learnt,
                avg_size_non_learnt = avg(size_non_learnt, num_non_learnt),
                learnt = num_learnt,
                avg_size_learnt = avg(size_learnt, num_learnt),
                time_s = start.elapsed().as_secs_f64(),
                "or-gate discovery"
            );
        }
        self.stats.total_time += start.elapsed().as_secs_f64();
    }

    /// Try to read clause `cl` as the long clause of a gate with the given
    /// output. Each non-output literal needs a witnessing binary clause
    /// `¬input ∨ output`, searched first in the implication cache, then in
    /// the binary watch lists. Pure on failure.
    #[allow(clippy::too_many_arguments)]
    fn try_recognize(
        &mut self,
        clause_idx: usize,
        cl: &[Lit],
        output: Lit,
        clause_learnt: bool,
        allow_learnt_gates: bool,
        solver: &mut Solver,
        sub: &mut Subsumer,
    ) {
        let mut learnt = clause_learnt;

        for &other in cl {
            if other == !output {
                continue;
            }

            let mut witnessed = false;

            let cache = solver.implied_by(other);
            sub.charge(cache.len() as u64);
            for imp in cache {
                if (allow_learnt_gates || imp.only_non_learnt) && imp.lit == output {
                    learnt |= !imp.only_non_learnt;
                    witnessed = true;
                    break;
                }
            }

            if !witnessed {
                let ws = solver.watches().for_lit(other);
                sub.charge(ws.len() as u64);
                for w in ws {
                    if (allow_learnt_gates || !w.learnt) && w.other == output {
                        learnt |= w.learnt;
                        witnessed = true;
                        break;
                    }
                }
            }

            if !witnessed {
                return;
            }
        }

        let inputs: Vec<Lit> = cl.iter().copied().filter(|&l| l != !output).collect();
        let gate = OrGate::new(inputs, output, learnt);

        if self.store.find_same(gate.output, &gate.inputs).is_some() {
            return;
        }

        sub.charge(gate.inputs.len() as u64 * 2);
        debug!(output = %gate.output, arity = gate.inputs.len(), learnt = gate.learnt, "found or-gate");
        solver.freeze(gate.output.var());
        self.store.add(gate);
        sub.set_gate_def(clause_idx, true);
        self.stats.gates_found += 1;
    }

    /// Run the three gate-application passes: clause shortening, AND-gate
    /// contraction, and equivalence extraction, in that order.
    ///
    /// Returns `false` if the clause database became inconsistent; the
    /// caller must stop simplifying.
    pub fn apply_gates(&mut self, solver: &mut Solver, sub: &mut Subsumer) -> bool {
        debug_assert!(solver.is_ok());
        self.ensure_num_vars(solver.num_vars());
        sub.ensure_num_vars(solver.num_vars());

        if self.cfg.shorten_with_or_gates {
            let start = Instant::now();
            self.shortened_pass = 0;
            self.lits_removed_pass = 0;
            sub.set_budget(self.cfg.shorten_budget);

            for id in 0..self.store.len() as u32 {
                if self.store.get(id).removed {
                    continue;
                }
                if sub.exhausted() {
                    debug!("gate shortening stopped: out of budget");
                    break;
                }
                let gate = self.store.get(id).clone();
                if !self.shorten_with_gate(&gate, solver, sub) {
                    return false;
                }
            }

            if self.cfg.verbosity >= 1 {
                info!(
                    shortened = self.shortened_pass,
                    lits_removed = self.lits_removed_pass,
                    time_s = start.elapsed().as_secs_f64(),
                    "or-gate shortening"
                );
            }
            self.stats.total_time += start.elapsed().as_secs_f64();
            self.stats.clauses_shortened += self.shortened_pass;
            self.stats.lits_removed += self.lits_removed_pass;
        }

        if self.cfg.remove_cl_with_and_gates {
            let start = Instant::now();
            self.contracted_pass = 0;
            self.contracted_size_pass = 0;
            sub.set_budget(self.cfg.contract_budget);
            let mut num_op = 0u64;

            for id in 0..self.store.len() as u32 {
                let gate = {
                    let g = self.store.get(id);
                    if g.removed || g.inputs.len() != 2 {
                        continue;
                    }
                    g.clone()
                };
                if sub.exhausted() {
                    debug!("gate contraction stopped: out of budget");
                    break;
                }
                if self
                    .contract_with_gate(&gate, true, &mut num_op, solver, sub)
                    .is_none()
                {
                    return false;
                }
            }

            if self.cfg.verbosity >= 1 {
                info!(
                    contracted = self.contracted_pass,
                    avg_size = avg(self.contracted_size_pass, self.contracted_pass),
                    time_s = start.elapsed().as_secs_f64(),
                    "and-gate contraction"
                );
            }
            self.stats.total_time += start.elapsed().as_secs_f64();
            self.stats.clauses_removed += self.contracted_pass;
        }

        if self.cfg.find_eq_lits {
            let start = Instant::now();
            let before = solver.num_new_to_replace_vars();

            if !self.find_eq_gates(solver) {
                return false;
            }

            let replaced = solver.num_new_to_replace_vars() - before;
            if self.cfg.verbosity >= 1 {
                info!(
                    vars_replaced = replaced,
                    time_s = start.elapsed().as_secs_f64(),
                    "gate equivalences"
                );
            }
            self.stats.total_time += start.elapsed().as_secs_f64();
            self.stats.vars_replaced += replaced;
        }

        true
    }

    /// Shorten every clause that contains all inputs of `gate`.
    ///
    /// If the clause also contains the output, the inputs are simply
    /// redundant and get dropped. If it contains the negated output, the
    /// clause is satisfied whenever it matters and is removed outright.
    /// Otherwise the inputs are replaced by the output.
    fn shorten_with_gate(&mut self, gate: &OrGate, solver: &mut Solver, sub: &mut Subsumer) -> bool {
        let mut subs: Vec<usize> = Vec::new();
        sub.find_subsumed(&gate.inputs, clause_sig(&gate.inputs), solver.db(), &mut subs);

        for c_idx in subs {
            // Never rewrite a gate definition, and never let a learnt gate
            // weaken a non-learnt clause.
            if sub.is_gate_def(c_idx) || (!solver.db().is_learnt(c_idx) && gate.learnt) {
                continue;
            }

            self.shortened_pass += 1;

            let cl: Vec<Lit> = solver.db().lits(c_idx).to_vec();
            let mut output_inside = false;
            let mut drop_clause = false;
            for &l in &cl {
                if l.var() == gate.output.var() {
                    if l == gate.output {
                        output_inside = true;
                    } else {
                        drop_clause = true;
                    }
                    break;
                }
            }

            if drop_clause {
                sub.unlink_clause(c_idx, solver.db_mut());
                continue;
            }

            let mut new_lits: Vec<Lit> = Vec::with_capacity(cl.len());
            for &l in &cl {
                if gate.inputs.contains(&l) {
                    self.lits_removed_pass += 1;
                } else {
                    new_lits.push(l);
                }
            }
            if !output_inside {
                new_lits.push(gate.output);
                self.lits_removed_pass -= 1;
            }

            let learnt = solver.db().is_learnt(c_idx);
            let stats = solver.db().stats(c_idx);
            sub.unlink_clause(c_idx, solver.db_mut());

            let new_idx = solver.add_clause_int(&new_lits, learnt, stats);
            if !solver.is_ok() {
                return false;
            }
            if let Some(idx) = new_idx {
                let sorted: Vec<Lit> = solver.db().lits(idx).to_vec();
                sub.link_in_clause(idx, &sorted);
            }
        }

        true
    }

    /// Bucket the clauses of `occur[¬b]` by size, recording their literals
    /// in `seen2` and accumulating their abstraction. Clauses that define
    /// gates, and non-learnt clauses under a learnt gate, are excluded.
    fn build_size_buckets(
        &mut self,
        gate: &OrGate,
        db: &ClauseDB,
        sub: &mut Subsumer,
        seen2_set: &mut Vec<usize>,
        num_op: &mut u64,
    ) -> (ClauseSig, usize) {
        for bucket in &mut self.size_sorted_occ {
            bucket.clear();
        }

        let b = gate.inputs[1];
        let mut abstraction: ClauseSig = 0;
        let mut max_size = 0usize;

        let occ_b: Vec<usize> = sub.occur(!b).to_vec();
        sub.charge(occ_b.len() as u64 * 3);
        for &idx in &occ_b {
            if sub.is_gate_def(idx) || (!db.is_learnt(idx) && gate.learnt) {
                continue;
            }
            let cl = db.lits(idx);
            *num_op += cl.len() as u64;

            max_size = max_size.max(cl.len());
            if self.size_sorted_occ.len() < max_size + 1 {
                self.size_sorted_occ.resize_with(max_size + 1, Vec::new);
            }
            self.size_sorted_occ[cl.len()].push(idx);

            for &l in cl {
                if !sub.seen2[l.index()] {
                    sub.seen2[l.index()] = true;
                    seen2_set.push(l.index());
                }
                abstraction |= sig_bit(l);
            }
        }
        abstraction |= sig_bit(gate.inputs[0]);

        (abstraction, max_size)
    }

    /// Contract clause pairs through a two-input gate `w ⇔ a ∨ b`: a pair
    /// `¬a ∨ X` and `¬b ∨ X` with identical residual `X` collapses into
    /// `¬w ∨ X`.
    ///
    /// With `really_remove` false this is a dry run that only counts the
    /// contractible pairs. Returns the count, or `None` if installing a
    /// resolvent made the solver inconsistent. The `seen`/`seen2` scratch
    /// is restored on every path.
    fn contract_with_gate(
        &mut self,
        gate: &OrGate,
        really_remove: bool,
        num_op: &mut u64,
        solver: &mut Solver,
        sub: &mut Subsumer,
    ) -> Option<u32> {
        debug_assert_eq!(gate.inputs.len(), 2);
        let a = gate.inputs[0];
        let b = gate.inputs[1];

        if sub.occur(!a).is_empty() || sub.occur(!b).is_empty() {
            return Some(0);
        }

        let mut seen2_set: Vec<usize> = Vec::new();
        let (abstraction, max_size) =
            self.build_size_buckets(gate, solver.db(), sub, &mut seen2_set, num_op);

        let mut to_unlink: FxHashSet<usize> = FxHashSet::default();
        let mut found_potential = 0u32;
        let mut consistent = true;

        let occ_a: Vec<usize> = sub.occur(!a).to_vec();
        sub.charge(occ_a.len() as u64 * 3);
        'clauses: for &c_idx in &occ_a {
            let data = sub.data(c_idx);
            if data.gate_def
                || (data.sig | abstraction) != abstraction
                || data.size as usize > max_size
                || self.size_sorted_occ[data.size as usize].is_empty()
            {
                continue;
            }
            if !solver.db().is_learnt(c_idx) && gate.learnt {
                continue;
            }

            let cl: Vec<Lit> = solver.db().lits(c_idx).to_vec();
            *num_op += cl.len() as u64;

            // The residual may touch neither gate variable, and every
            // residual literal must occur on the other side as well.
            for &l in &cl {
                if l == !a {
                    continue;
                }
                if l.var() == b.var() || l.var() == gate.output.var() || !sub.seen2[l.index()] {
                    continue 'clauses;
                }
            }

            let mut sig2 = sig_bit(b);
            for &l in &cl {
                if l == !a {
                    continue;
                }
                sub.seen[l.index()] = true;
                sig2 |= sig_bit(l);
            }

            *num_op += self.size_sorted_occ[cl.len()].len() as u64 * 5;
            let twin = self.find_twin(cl.len(), !b, sig2, solver.db(), sub);
            if twin.is_some() {
                found_potential += 1;
            }

            if really_remove {
                if let Some(other_idx) = twin {
                    debug_assert_ne!(other_idx, c_idx);
                    to_unlink.insert(other_idx);
                    to_unlink.insert(c_idx);
                    if !self.merge_pair(c_idx, other_idx, gate, solver, sub) {
                        consistent = false;
                    }
                }
            }

            for &l in &cl {
                if l != !a {
                    sub.seen[l.index()] = false;
                }
            }
            if !consistent {
                break;
            }
        }

        for idx in seen2_set {
            sub.seen2[idx] = false;
        }

        if !consistent {
            return None;
        }

        for idx in to_unlink {
            sub.unlink_clause(idx, solver.db_mut());
        }
        Some(found_potential)
    }

    /// Search one size bucket for a clause whose literals, apart from
    /// `skip`, are exactly the ones recorded in `seen`. The abstraction
    /// must match exactly; first hit wins.
    fn find_twin(
        &self,
        size: usize,
        skip: Lit,
        sig2: ClauseSig,
        db: &ClauseDB,
        sub: &mut Subsumer,
    ) -> Option<usize> {
        let bucket = &self.size_sorted_occ[size];
        sub.charge(bucket.len() as u64);

        'candidates: for &idx in bucket {
            let data = sub.data(idx);
            if data.gate_def || data.sig != sig2 {
                continue;
            }
            for &l in db.lits(idx) {
                if l == skip {
                    continue;
                }
                if !sub.seen[l.index()] {
                    continue 'candidates;
                }
            }
            return Some(idx);
        }
        None
    }

    /// Install the resolvent `(cl \ {¬a}) ∪ {¬w}` that replaces a
    /// contracted clause pair. Returns solver consistency.
    fn merge_pair(
        &mut self,
        c_idx: usize,
        other_idx: usize,
        gate: &OrGate,
        solver: &mut Solver,
        sub: &mut Subsumer,
    ) -> bool {
        let cl: Vec<Lit> = solver.db().lits(c_idx).to_vec();
        self.contracted_pass += 1;
        self.contracted_size_pass += cl.len() as u64;

        let a = gate.inputs[0];
        let mut lits: Vec<Lit> = Vec::with_capacity(cl.len());
        for &l in &cl {
            debug_assert_ne!(l.var(), gate.output.var());
            if l != !a {
                lits.push(l);
            }
        }
        lits.push(!gate.output);

        sub.charge(solver.db().lits(other_idx).len() as u64 * 2);
        let learnt = solver.db().is_learnt(c_idx) && solver.db().is_learnt(other_idx);
        let stats = ClauseStats::combine(solver.db().stats(c_idx), solver.db().stats(other_idx));

        if let Some(idx) = solver.add_clause_int(&lits, learnt, stats) {
            let sorted: Vec<Lit> = solver.db().lits(idx).to_vec();
            sub.link_in_clause(idx, &sorted);
        }
        solver.is_ok()
    }

    /// Submit an equivalence for every pair of gates with identical inputs
    /// but different output variables.
    fn find_eq_gates(&mut self, solver: &mut Solver) -> bool {
        let mut gates: Vec<OrGate> = self.store.iter_live().map(|(_, g)| g.clone()).collect();
        gates.sort_by(|x, y| {
            x.inputs
                .cmp(&y.inputs)
                .then(x.output.var().cmp(&y.output.var()))
                .then(x.output.sign().cmp(&y.output.sign()))
        });

        for pair in gates.windows(2) {
            let (g1, g2) = (&pair[0], &pair[1]);
            if g1.inputs == g2.inputs && g1.output.var() != g2.output.var() {
                let rhs = g1.output.sign() ^ g2.output.sign();
                if !solver.add_xor_clause_int(g1.output.unsigned(), g2.output.unsigned(), rhs) {
                    return false;
                }
            }
        }
        true
    }

    /// Synthesize new gates by extended resolution: sample literal pairs,
    /// keep the ones whose gate would unlock enough simplification, and
    /// materialize the best with fresh output variables. Ends with a full
    /// application pass over the synthesized gates.
    ///
    /// Returns `false` if the clause database became inconsistent.
    pub fn extend_resolution(&mut self, solver: &mut Solver, sub: &mut Subsumer) -> bool {
        debug_assert!(solver.is_ok());
        let start = Instant::now();
        self.ensure_num_vars(solver.num_vars());
        sub.ensure_num_vars(solver.num_vars());

        let old_replaced = solver.num_new_to_replace_vars();
        let old_bins = solver.watches().num_binaries();

        self.clear_indexes(sub);
        let added = self.create_new_vars(solver, sub);
        if !solver.is_ok() {
            return false;
        }

        let ok = self.apply_gates(solver, sub);

        if self.cfg.verbosity >= 1 {
            info!(
                vars_added = added,
                shortened = self.shortened_pass,
                lits_removed = self.lits_removed_pass,
                bins_added = solver.watches().num_binaries() - old_bins,
                vars_replaced = solver.num_new_to_replace_vars() - old_replaced,
                contracted = self.contracted_pass,
                time_s = start.elapsed().as_secs_f64(),
                "extended resolution"
            );
        }

        ok && solver.is_ok()
    }

    fn eligible(solver: &Solver, var: Var) -> bool {
        solver.value(var).is_none() && solver.is_decision_var(var) && !solver.is_eliminated(var)
    }

    /// Sample and score candidate gates, then materialize the top of the
    /// ranking. Returns the number of variables added.
    fn create_new_vars(&mut self, solver: &mut Solver, sub: &mut Subsumer) -> u32 {
        let start = Instant::now();
        let mut candidates: Vec<GateCandidate> = Vec::new();
        let mut subs: Vec<usize> = Vec::new();
        let mut num_op: u64 = 0;
        sub.set_budget(self.cfg.synth_budget);

        let num_unset = solver.num_unset_vars() as u64;
        let max_tries = 100_000u64.min(num_unset * num_unset / 2);

        let mut tries = 0u64;
        while tries < max_tries {
            tries += 1;
            if sub.budget() < SYNTH_BUDGET_FLOOR {
                break;
            }

            let var1 = solver.random_var();
            let var2 = solver.random_var();
            if var1 == var2 || !Self::eligible(solver, var1) || !Self::eligible(solver, var2) {
                continue;
            }

            let mut lit1 = Lit::new(var1, solver.random_sign());
            let mut lit2 = Lit::new(var2, solver.random_sign());
            if lit1 > lit2 {
                mem::swap(&mut lit1, &mut lit2);
            }

            // How many clauses the gate would shorten right away.
            let pair = [lit1, lit2];
            subs.clear();
            sub.find_subsumed(&pair, clause_sig(&pair), solver.db(), &mut subs);
            let num_cl_removable = subs.len() as u32;

            // How many clause pairs it would contract, by dry run. The
            // placeholder output means clauses over variable 0 are not
            // counted; the score is an approximation either way.
            let mut potential = 0u32;
            if num_op < DRY_RUN_OP_CAP {
                let probe = OrGate::new(vec![lit1, lit2], Lit::positive(Var(0)), false);
                potential = self
                    .contract_with_gate(&probe, false, &mut num_op, solver, sub)
                    .unwrap_or(0);
            }

            if potential > 5 || num_cl_removable > 100 || (potential > 1 && num_cl_removable > 50) {
                candidates.push(GateCandidate {
                    lit1,
                    lit2,
                    num_cl_removable,
                    potential,
                });
            }
        }

        candidates.sort_unstable();
        candidates.dedup();

        let mut added = 0u32;
        for (i, cand) in candidates.iter().enumerate() {
            if i > 100
                || i as f64 > solver.num_unset_vars() as f64 * 0.01
                || (i > 50 && cand.num_cl_removable < 1000 && cand.potential < 25)
            {
                break;
            }

            let w = solver.new_var();
            self.ensure_num_vars(solver.num_vars());
            sub.ensure_num_vars(solver.num_vars());
            solver.freeze(w);
            let w_lit = Lit::positive(w);

            self.store
                .add(OrGate::new(vec![cand.lit1, cand.lit2], w_lit, false));
            self.stats.gates_found += 1;

            // The two binaries are absorbed by the watch lists.
            let r = solver.add_clause_int(&[w_lit, !cand.lit1], false, ClauseStats::default());
            debug_assert!(r.is_none());
            let r = solver.add_clause_int(&[w_lit, !cand.lit2], false, ClauseStats::default());
            debug_assert!(r.is_none());
            if !solver.is_ok() {
                break;
            }

            let stats = ClauseStats {
                conflict_introduced: solver.sum_conflicts(),
                ..ClauseStats::default()
            };
            let long = solver.add_clause_int(&[!w_lit, cand.lit1, cand.lit2], false, stats);
            if !solver.is_ok() {
                break;
            }
            if let Some(idx) = long {
                let sorted: Vec<Lit> = solver.db().lits(idx).to_vec();
                sub.link_in_clause(idx, &sorted);
                sub.set_gate_def(idx, true);
            }

            added += 1;
        }

        if self.cfg.verbosity >= 1 {
            info!(
                vars_added = added,
                tried = tries,
                candidates = candidates.len(),
                time_s = start.elapsed().as_secs_f64(),
                "gate synthesis"
            );
        }
        self.stats.total_time += start.elapsed().as_secs_f64();
        self.stats.vars_added += added as u64;

        added
    }

    /// Write the gate graph in dot format: one vertex per live gate, an
    /// edge from gate `A` to gate `B` when an input of `B` is the output
    /// of `A`. Learnt gates render in a darker color.
    pub fn dump_dot<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "digraph G {{")?;

        let mut used = vec![false; self.store.len()];
        for (id, gate) in self.store.iter_live() {
            for &input in &gate.inputs {
                for &src in self.store.by_output(input) {
                    if src == id || self.store.get(src).removed {
                        continue;
                    }
                    used[src as usize] = true;
                    used[id as usize] = true;
                    writeln!(out, "Gate{} -> Gate{}[arrowsize=\"0.4\"];", src, id)?;
                }
            }
        }

        for (id, gate) in self.store.iter_live() {
            if used[id as usize] {
                let color = if gate.learnt {
                    "darkseagreen4"
                } else {
                    "darkseagreen"
                };
                writeln!(
                    out,
                    "Gate{} [ shape=\"point\", size = 0.8, style=\"filled\", color=\"{}\"];",
                    id, color
                )?;
            }
        }

        writeln!(out, "}}")
    }
}

fn avg(total: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
