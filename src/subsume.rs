//! Occurrence store shared with the simplification passes
//!
//! Tracks, for every long clause in the arena: which literals it contains
//! (occurrence lists), a 64-bit abstraction signature for fast subset
//! pre-filtering, its size, and whether it currently serves as the long
//! defining clause of a gate. Also owns the `seen`/`seen2` scratch bitmaps
//! and the signed work budget that the passes decrement.
//!
//! Scratch discipline: any pass that sets bits in `seen` or `seen2` must
//! clear exactly those bits before returning, on every path. Later passes
//! rely on the bitmaps starting out all-false.

use crate::clause_db::ClauseDB;
use crate::literal::Lit;

/// 64-bit abstraction signature
///
/// Bit `var % 64` is set for every variable in the clause. If
/// `sig(A) & !sig(B) != 0` then `A ⊄ B`, so signatures serve as a cheap
/// necessary condition for subset tests.
pub type ClauseSig = u64;

/// Number of bits in a [`ClauseSig`]
pub const CLAUSE_SIG_BITS: u32 = 64;

/// Compute the abstraction signature of a set of literals
#[inline]
pub fn clause_sig(lits: &[Lit]) -> ClauseSig {
    let mut sig: ClauseSig = 0;
    for lit in lits {
        sig |= sig_bit(*lit);
    }
    sig
}

/// The signature bit contributed by one literal's variable
#[inline]
pub fn sig_bit(lit: Lit) -> ClauseSig {
    1u64 << (lit.var().0 % CLAUSE_SIG_BITS)
}

/// Cached per-clause data, indexed like the arena
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseData {
    /// Abstraction signature, recomputed on every link
    pub sig: ClauseSig,
    /// Clause size at link time
    pub size: u32,
    /// True while the clause is the long defining clause of a live gate;
    /// such clauses are shielded from shortening and removal
    pub gate_def: bool,
}

/// Occurrence list: for each literal, the arena indices of the live long
/// clauses containing it
#[derive(Debug, Default)]
pub struct OccurrenceList {
    occ: Vec<Vec<usize>>,
}

impl OccurrenceList {
    /// Create occurrence lists for `num_vars` variables
    pub fn new(num_vars: usize) -> Self {
        OccurrenceList {
            occ: vec![Vec::new(); num_vars * 2],
        }
    }

    /// Grow the lists to cover `num_vars` variables
    pub fn ensure_num_vars(&mut self, num_vars: usize) {
        let target = num_vars.saturating_mul(2);
        if self.occ.len() < target {
            self.occ.resize_with(target, Vec::new);
        }
    }

    /// Add a clause to the lists of all its literals
    pub fn add_clause(&mut self, clause_idx: usize, lits: &[Lit]) {
        for &lit in lits {
            self.occ[lit.index()].push(clause_idx);
        }
    }

    /// Remove a clause from the lists of all its literals
    pub fn remove_clause(&mut self, clause_idx: usize, lits: &[Lit]) {
        for &lit in lits {
            let list = &mut self.occ[lit.index()];
            if let Some(pos) = list.iter().position(|&idx| idx == clause_idx) {
                list.swap_remove(pos);
            }
        }
    }

    /// The clauses containing a literal
    #[inline]
    pub fn get(&self, lit: Lit) -> &[usize] {
        let idx = lit.index();
        if idx < self.occ.len() {
            &self.occ[idx]
        } else {
            &[]
        }
    }

    /// Clear every list
    pub fn clear(&mut self) {
        for list in &mut self.occ {
            list.clear();
        }
    }
}

/// The occurrence store
#[derive(Debug, Default)]
pub struct Subsumer {
    occ: OccurrenceList,
    clause_data: Vec<ClauseData>,
    /// Per-literal scratch, cleared between operations
    pub(crate) seen: Vec<bool>,
    /// Second per-literal scratch, cleared between operations
    pub(crate) seen2: Vec<bool>,
    budget: i64,
}

impl Subsumer {
    /// Create a store for `num_vars` variables
    pub fn new(num_vars: usize) -> Self {
        Subsumer {
            occ: OccurrenceList::new(num_vars),
            clause_data: Vec::new(),
            seen: vec![false; num_vars * 2],
            seen2: vec![false; num_vars * 2],
            budget: 0,
        }
    }

    /// Grow per-variable structures to cover `num_vars` variables
    pub fn ensure_num_vars(&mut self, num_vars: usize) {
        self.occ.ensure_num_vars(num_vars);
        let target = num_vars.saturating_mul(2);
        if self.seen.len() < target {
            self.seen.resize(target, false);
        }
        if self.seen2.len() < target {
            self.seen2.resize(target, false);
        }
    }

    /// Set the work budget for the next pass
    #[inline]
    pub fn set_budget(&mut self, budget: i64) {
        self.budget = budget;
    }

    /// Remaining budget; negative once exhausted
    #[inline]
    pub fn budget(&self) -> i64 {
        self.budget
    }

    /// Charge `work` units against the budget
    #[inline]
    pub fn charge(&mut self, work: u64) {
        self.budget -= work as i64;
    }

    /// True once the budget has gone negative
    #[inline]
    pub fn exhausted(&self) -> bool {
        self.budget < 0
    }

    /// The clauses containing a literal
    #[inline]
    pub fn occur(&self, lit: Lit) -> &[usize] {
        self.occ.get(lit)
    }

    /// Cached data of a clause
    #[inline]
    pub fn data(&self, idx: usize) -> ClauseData {
        self.clause_data
            .get(idx)
            .copied()
            .unwrap_or_default()
    }

    /// True if the clause currently defines a gate
    #[inline]
    pub fn is_gate_def(&self, idx: usize) -> bool {
        self.clause_data.get(idx).is_some_and(|d| d.gate_def)
    }

    /// Set or clear the gate-definition shield on a clause
    pub fn set_gate_def(&mut self, idx: usize, val: bool) {
        if idx >= self.clause_data.len() {
            self.clause_data.resize(idx + 1, ClauseData::default());
        }
        self.clause_data[idx].gate_def = val;
    }

    /// Clear the gate-definition shield on every clause
    pub fn clear_gate_defs(&mut self) {
        for data in &mut self.clause_data {
            data.gate_def = false;
        }
    }

    /// Register a clause in the occurrence lists and cache its signature
    pub fn link_in_clause(&mut self, idx: usize, lits: &[Lit]) {
        if idx >= self.clause_data.len() {
            self.clause_data.resize(idx + 1, ClauseData::default());
        }
        self.clause_data[idx] = ClauseData {
            sig: clause_sig(lits),
            size: lits.len() as u32,
            gate_def: false,
        };
        self.occ.add_clause(idx, lits);
    }

    /// Unregister a clause and tombstone it in the arena
    pub fn unlink_clause(&mut self, idx: usize, db: &mut ClauseDB) {
        let lits: Vec<Lit> = db.lits(idx).to_vec();
        self.occ.remove_clause(idx, &lits);
        if idx < self.clause_data.len() {
            self.clause_data[idx] = ClauseData::default();
        }
        db.delete(idx);
    }

    /// Rebuild all occurrence lists and cached data from the arena
    pub fn rebuild(&mut self, db: &ClauseDB) {
        self.occ.clear();
        self.clause_data.clear();
        self.clause_data.resize(db.len(), ClauseData::default());
        for idx in db.indices() {
            if db.is_deleted(idx) {
                continue;
            }
            let lits = db.lits(idx);
            self.clause_data[idx] = ClauseData {
                sig: clause_sig(lits),
                size: lits.len() as u32,
                gate_def: false,
            };
            self.occ.add_clause(idx, lits);
        }
    }

    /// Collect the live clauses that contain every literal of `lits`.
    ///
    /// Candidates come from the smallest occurrence list among `lits`; the
    /// signature pre-filter rejects most non-supersets before the exact
    /// check. Charges the budget for the occurrence lists walked.
    pub fn find_subsumed(
        &mut self,
        lits: &[Lit],
        sig: ClauseSig,
        db: &ClauseDB,
        out: &mut Vec<usize>,
    ) {
        if lits.is_empty() {
            return;
        }

        let min_lit = lits
            .iter()
            .copied()
            .min_by_key(|&l| self.occ.get(l).len())
            .unwrap();

        self.charge(self.occ.get(min_lit).len() as u64);

        for &d_idx in self.occ.get(min_lit) {
            let data = self.clause_data[d_idx];
            if data.size < lits.len() as u32 || sig & !data.sig != 0 {
                continue;
            }
            let d_lits = db.lits(d_idx);
            if lits.iter().all(|l| d_lits.contains(l)) {
                out.push(d_idx);
            }
        }
    }

    /// True if both scratch bitmaps are fully cleared
    pub fn scratch_clean(&self) -> bool {
        self.seen.iter().all(|&b| !b) && self.seen2.iter().all(|&b| !b)
    }
}
