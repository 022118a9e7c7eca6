//! Binary-clause watch lists
//!
//! Only binary clauses are watched here; long clauses are tracked by the
//! occurrence store. For a binary clause `a ∨ b`, an entry `{other: b}` is
//! filed under `¬a` and an entry `{other: a}` under `¬b`: the list for a
//! literal `l` holds exactly the implications `l → other`, which is the
//! view the gate recognizer walks when it searches for a witness binary.

use crate::literal::Lit;

/// One binary clause as seen from one of its watch slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinWatch {
    /// The other literal of the binary clause
    pub other: Lit,
    /// True if the binary clause is learnt
    pub learnt: bool,
}

/// Watch lists for binary clauses
#[derive(Debug, Default)]
pub struct BinWatches {
    watches: Vec<Vec<BinWatch>>,
    num_binaries: u64,
}

impl BinWatches {
    /// Create watch lists for `num_vars` variables
    pub fn new(num_vars: usize) -> Self {
        BinWatches {
            watches: vec![Vec::new(); num_vars * 2],
            num_binaries: 0,
        }
    }

    /// Grow the lists to cover `num_vars` variables
    pub fn ensure_num_vars(&mut self, num_vars: usize) {
        let target = num_vars.saturating_mul(2);
        if self.watches.len() < target {
            self.watches.resize_with(target, Vec::new);
        }
    }

    /// Register the binary clause `a ∨ b`
    pub fn attach(&mut self, a: Lit, b: Lit, learnt: bool) {
        self.watches[(!a).index()].push(BinWatch { other: b, learnt });
        self.watches[(!b).index()].push(BinWatch { other: a, learnt });
        self.num_binaries += 1;
    }

    /// The binaries `¬l ∨ other`, i.e. the implications `l → other`
    #[inline]
    pub fn for_lit(&self, l: Lit) -> &[BinWatch] {
        let idx = l.index();
        if idx < self.watches.len() {
            &self.watches[idx]
        } else {
            &[]
        }
    }

    /// Number of binary clauses attached so far
    #[inline]
    pub fn num_binaries(&self) -> u64 {
        self.num_binaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Var;
    use proptest::prelude::*;

    fn lit(v: u32, positive: bool) -> Lit {
        if positive {
            Lit::positive(Var(v))
        } else {
            Lit::negative(Var(v))
        }
    }

    #[test]
    fn test_attach_files_both_directions() {
        let mut w = BinWatches::new(3);
        // Clause (¬0 ∨ 1): implications 0 → 1 and ¬1 → ¬0.
        w.attach(lit(0, false), lit(1, true), false);

        let from_zero = w.for_lit(lit(0, true));
        assert_eq!(from_zero.len(), 1);
        assert_eq!(from_zero[0].other, lit(1, true));
        assert!(!from_zero[0].learnt);

        let from_not_one = w.for_lit(lit(1, false));
        assert_eq!(from_not_one.len(), 1);
        assert_eq!(from_not_one[0].other, lit(0, false));

        assert!(w.for_lit(lit(0, false)).is_empty());
        assert_eq!(w.num_binaries(), 1);
    }

    proptest! {
        /// Every attach creates exactly two entries, one per direction
        #[test]
        fn prop_attach_symmetric(a in 0u32..20, b in 0u32..20, sa: bool, sb: bool, learnt: bool) {
            prop_assume!(a != b);
            let la = Lit::new(Var(a), sa);
            let lb = Lit::new(Var(b), sb);

            let mut w = BinWatches::new(20);
            w.attach(la, lb, learnt);

            prop_assert_eq!(w.for_lit(!la).len(), 1);
            prop_assert_eq!(w.for_lit(!lb).len(), 1);
            prop_assert_eq!(w.for_lit(!la)[0].other, lb);
            prop_assert_eq!(w.for_lit(!lb)[0].other, la);
            prop_assert_eq!(w.for_lit(!la)[0].learnt, learnt);
        }
    }
}
