//! Solver-core state consumed by the simplification passes
//!
//! This is not a search engine. It carries exactly the state the gate
//! passes read and write: variable assignments and flags, the binary watch
//! lists, the transitive binary-implication cache, the literal-equivalence
//! registry, a seedable RNG, and internal clause addition with
//! unit/binary absorption. Unit propagation and conflict analysis live in
//! the host solver, outside this crate.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::clause::ClauseStats;
use crate::clause_db::ClauseDB;
use crate::literal::{Lit, Var};
use crate::watched::BinWatches;

/// One entry of the binary-implication cache
///
/// An entry under literal `l` records a (possibly transitive) binary
/// implication `l → lit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedImp {
    /// The implied literal
    pub lit: Lit,
    /// True if the implication is witnessed by non-learnt binaries only
    pub only_non_learnt: bool,
}

/// Default RNG seed; override with [`Solver::set_random_seed`]
const DEFAULT_SEED: u64 = 42;

/// The solver-core state carrier
#[derive(Debug)]
pub struct Solver {
    num_vars: usize,
    db: ClauseDB,
    assignment: Vec<Option<bool>>,
    decision: Vec<bool>,
    eliminated: Vec<bool>,
    frozen: Vec<bool>,
    watches: BinWatches,
    cache: Vec<Vec<CachedImp>>,
    equivs: Vec<(Var, Var, bool)>,
    new_to_replace_vars: u64,
    num_assigned: usize,
    sum_conflicts: u64,
    ok: bool,
    rng: ChaCha8Rng,
}

impl Solver {
    /// Create a solver with `num_vars` variables, all unset and
    /// decision-eligible
    pub fn new(num_vars: usize) -> Self {
        Solver {
            num_vars,
            db: ClauseDB::new(),
            assignment: vec![None; num_vars],
            decision: vec![true; num_vars],
            eliminated: vec![false; num_vars],
            frozen: vec![false; num_vars],
            watches: BinWatches::new(num_vars),
            cache: vec![Vec::new(); num_vars * 2],
            equivs: Vec::new(),
            new_to_replace_vars: 0,
            num_assigned: 0,
            sum_conflicts: 0,
            ok: true,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_SEED),
        }
    }

    /// Allocate a fresh variable
    pub fn new_var(&mut self) -> Var {
        let var = Var(self.num_vars as u32);
        self.num_vars += 1;
        self.assignment.push(None);
        self.decision.push(true);
        self.eliminated.push(false);
        self.frozen.push(false);
        self.watches.ensure_num_vars(self.num_vars);
        self.cache.push(Vec::new());
        self.cache.push(Vec::new());
        var
    }

    /// Number of variables
    #[inline]
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of unassigned variables
    #[inline]
    pub fn num_unset_vars(&self) -> usize {
        self.num_vars - self.num_assigned
    }

    /// The clause arena
    #[inline]
    pub fn db(&self) -> &ClauseDB {
        &self.db
    }

    /// The clause arena, mutably
    #[inline]
    pub fn db_mut(&mut self) -> &mut ClauseDB {
        &mut self.db
    }

    /// True while the clause database is consistent
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Assignment of a variable; `None` = unset
    #[inline]
    pub fn value(&self, var: Var) -> Option<bool> {
        self.assignment[var.index()]
    }

    /// Truth value of a literal under the current assignment
    #[inline]
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.var().index()].map(|v| v != lit.sign())
    }

    /// True if the variable may be picked as a decision
    #[inline]
    pub fn is_decision_var(&self, var: Var) -> bool {
        self.decision[var.index()]
    }

    /// Mark a variable (in)eligible as a decision
    pub fn set_decision_var(&mut self, var: Var, val: bool) {
        self.decision[var.index()] = val;
    }

    /// True if the variable has been eliminated
    #[inline]
    pub fn is_eliminated(&self, var: Var) -> bool {
        self.eliminated[var.index()]
    }

    /// Mark a variable eliminated
    pub fn set_eliminated(&mut self, var: Var) {
        self.eliminated[var.index()] = true;
    }

    /// True if the variable must never be eliminated
    #[inline]
    pub fn is_frozen(&self, var: Var) -> bool {
        self.frozen[var.index()]
    }

    /// Shield a variable from elimination for the solver's lifetime
    pub fn freeze(&mut self, var: Var) {
        self.frozen[var.index()] = true;
    }

    /// The binary watch lists
    #[inline]
    pub fn watches(&self) -> &BinWatches {
        &self.watches
    }

    /// Cached binary implications of a literal
    #[inline]
    pub fn implied_by(&self, lit: Lit) -> &[CachedImp] {
        let idx = lit.index();
        if idx < self.cache.len() {
            &self.cache[idx]
        } else {
            &[]
        }
    }

    /// Record a binary implication `lit → implied` in the cache
    pub fn cache_implication(&mut self, lit: Lit, implied: Lit, only_non_learnt: bool) {
        self.cache[lit.index()].push(CachedImp {
            lit: implied,
            only_non_learnt,
        });
    }

    /// Conflict count used to stamp new clauses
    #[inline]
    pub fn sum_conflicts(&self) -> u64 {
        self.sum_conflicts
    }

    /// Update the conflict count
    pub fn set_sum_conflicts(&mut self, n: u64) {
        self.sum_conflicts = n;
    }

    /// Reseed the RNG so sampling passes are reproducible
    pub fn set_random_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// A uniformly random variable id
    #[inline]
    pub fn random_var(&mut self) -> Var {
        Var(self.rng.gen_range(0..self.num_vars as u32))
    }

    /// A uniformly random sign
    #[inline]
    pub fn random_sign(&mut self) -> bool {
        self.rng.gen()
    }

    fn assign(&mut self, lit: Lit) {
        match self.lit_value(lit) {
            Some(false) => self.ok = false,
            Some(true) => {}
            None => {
                self.assignment[lit.var().index()] = Some(!lit.sign());
                self.num_assigned += 1;
            }
        }
    }

    /// Add a clause internally, normalizing against the current assignment.
    ///
    /// Units are absorbed into the assignment (a conflicting unit makes the
    /// solver inconsistent), binaries go into the watch lists, and longer
    /// clauses are arena'd and returned by index. The returned clause is
    /// NOT registered in any occurrence store; the caller links it where it
    /// wants it. Returns `None` when the clause was absorbed or dropped.
    pub fn add_clause_int(
        &mut self,
        lits: &[Lit],
        learnt: bool,
        stats: ClauseStats,
    ) -> Option<usize> {
        if !self.ok {
            return None;
        }

        let mut out: Vec<Lit> = lits.to_vec();
        out.sort_unstable();
        out.dedup();

        // Tautology or already satisfied: nothing to add.
        if out.windows(2).any(|w| w[0] == !w[1]) {
            return None;
        }
        if out.iter().any(|&l| self.lit_value(l) == Some(true)) {
            return None;
        }
        out.retain(|&l| self.lit_value(l).is_none());

        match out.len() {
            0 => {
                self.ok = false;
                None
            }
            1 => {
                self.assign(out[0]);
                None
            }
            2 => {
                self.watches.attach(out[0], out[1], learnt);
                None
            }
            _ => Some(self.db.add(&out, learnt, stats)),
        }
    }

    /// Submit a two-variable equivalence `a ⊕ b = rhs` to the replacement
    /// registry (both literals must be unsigned).
    ///
    /// Returns `false` if the equivalence contradicts the current state.
    pub fn add_xor_clause_int(&mut self, a: Lit, b: Lit, rhs: bool) -> bool {
        debug_assert!(!a.sign() && !b.sign());
        if !self.ok {
            return false;
        }

        if a.var() == b.var() {
            if rhs {
                self.ok = false;
            }
            return self.ok;
        }

        if let (Some(va), Some(vb)) = (self.value(a.var()), self.value(b.var())) {
            if (va ^ vb) != rhs {
                self.ok = false;
                return false;
            }
        }

        self.equivs.push((a.var(), b.var(), rhs));
        self.new_to_replace_vars += 1;
        true
    }

    /// Equivalences submitted so far, as `(var, var, parity)` triples
    #[inline]
    pub fn equivalences(&self) -> &[(Var, Var, bool)] {
        &self.equivs
    }

    /// Number of variables queued for replacement by equivalence
    #[inline]
    pub fn num_new_to_replace_vars(&self) -> u64 {
        self.new_to_replace_vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: u32, positive: bool) -> Lit {
        if positive {
            Lit::positive(Var(v))
        } else {
            Lit::negative(Var(v))
        }
    }

    #[test]
    fn test_unit_absorbed() {
        let mut s = Solver::new(3);
        let r = s.add_clause_int(&[lit(0, true)], false, ClauseStats::default());
        assert_eq!(r, None);
        assert_eq!(s.value(Var(0)), Some(true));
        assert_eq!(s.num_unset_vars(), 2);
        assert!(s.is_ok());
    }

    #[test]
    fn test_conflicting_units_break_consistency() {
        let mut s = Solver::new(2);
        s.add_clause_int(&[lit(0, true)], false, ClauseStats::default());
        s.add_clause_int(&[lit(0, false)], false, ClauseStats::default());
        assert!(!s.is_ok());
    }

    #[test]
    fn test_binary_goes_to_watches() {
        let mut s = Solver::new(3);
        let r = s.add_clause_int(&[lit(0, true), lit(1, false)], false, ClauseStats::default());
        assert_eq!(r, None);
        assert_eq!(s.watches().num_binaries(), 1);
        // Clause (0 ∨ ¬1): implication ¬0 → ¬1 filed under ¬0.
        let ws = s.watches().for_lit(lit(0, false));
        assert_eq!(ws.len(), 1);
        assert_eq!(ws[0].other, lit(1, false));
    }

    #[test]
    fn test_long_clause_arenaed() {
        let mut s = Solver::new(4);
        let r = s.add_clause_int(
            &[lit(2, true), lit(0, true), lit(1, true)],
            false,
            ClauseStats::default(),
        );
        let idx = r.unwrap();
        assert_eq!(s.db().lits(idx), &[lit(0, true), lit(1, true), lit(2, true)]);
    }

    #[test]
    fn test_falsified_lits_dropped() {
        let mut s = Solver::new(4);
        s.add_clause_int(&[lit(0, false)], false, ClauseStats::default());
        // 0 is false, so the ternary shrinks to a binary.
        let r = s.add_clause_int(
            &[lit(0, true), lit(1, true), lit(2, true)],
            false,
            ClauseStats::default(),
        );
        assert_eq!(r, None);
        assert_eq!(s.watches().num_binaries(), 1);
    }

    #[test]
    fn test_satisfied_clause_dropped() {
        let mut s = Solver::new(4);
        s.add_clause_int(&[lit(0, true)], false, ClauseStats::default());
        let r = s.add_clause_int(
            &[lit(0, true), lit(1, true), lit(2, true)],
            false,
            ClauseStats::default(),
        );
        assert_eq!(r, None);
        assert_eq!(s.db().len(), 0);
    }

    #[test]
    fn test_tautology_dropped() {
        let mut s = Solver::new(3);
        let r = s.add_clause_int(
            &[lit(0, true), lit(0, false), lit(1, true)],
            false,
            ClauseStats::default(),
        );
        assert_eq!(r, None);
        assert!(s.is_ok());
        assert_eq!(s.db().len(), 0);
    }

    #[test]
    fn test_xor_registry() {
        let mut s = Solver::new(4);
        assert!(s.add_xor_clause_int(lit(0, true), lit(1, true), false));
        assert_eq!(s.num_new_to_replace_vars(), 1);
        assert_eq!(s.equivalences(), &[(Var(0), Var(1), false)]);
    }

    #[test]
    fn test_xor_degenerate_contradiction() {
        let mut s = Solver::new(2);
        assert!(!s.add_xor_clause_int(lit(0, true), lit(0, true), true));
        assert!(!s.is_ok());
    }

    #[test]
    fn test_xor_violated_assignment() {
        let mut s = Solver::new(2);
        s.add_clause_int(&[lit(0, true)], false, ClauseStats::default());
        s.add_clause_int(&[lit(1, false)], false, ClauseStats::default());
        // 0 = true, 1 = false, so 0 ⊕ 1 = true; claiming rhs = false fails.
        assert!(!s.add_xor_clause_int(lit(0, true), lit(1, true), false));
        assert!(!s.is_ok());
    }

    #[test]
    fn test_new_var_grows_state() {
        let mut s = Solver::new(1);
        let v = s.new_var();
        assert_eq!(v, Var(1));
        assert_eq!(s.num_vars(), 2);
        assert_eq!(s.value(v), None);
        assert!(s.is_decision_var(v));
        assert!(!s.is_frozen(v));
        s.freeze(v);
        assert!(s.is_frozen(v));
    }

    #[test]
    fn test_seeded_rng_reproducible() {
        let mut a = Solver::new(100);
        let mut b = Solver::new(100);
        a.set_random_seed(7);
        b.set_random_seed(7);
        let va: Vec<u32> = (0..10).map(|_| a.random_var().0).collect();
        let vb: Vec<u32> = (0..10).map(|_| b.random_var().0).collect();
        assert_eq!(va, vb);
    }
}
