//! Literal and variable representation
//!
//! A literal is a variable with a polarity, packed into a single `u32`:
//! positive literal = `2*var`, negative literal = `2*var + 1`. The packed
//! index doubles as the index into per-literal arrays (occurrence lists,
//! watch lists, scratch bitmaps), which all have size `2 * num_vars`.

use std::fmt;
use std::ops::Not;

/// A variable identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(kani, derive(kani::Arbitrary))]
pub struct Var(pub u32);

impl Var {
    /// Index into per-variable arrays
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal: a variable with a polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(kani, derive(kani::Arbitrary))]
pub struct Lit(pub u32);

impl Lit {
    /// Create a literal from a variable and a sign (`true` = negated)
    #[inline]
    pub fn new(var: Var, sign: bool) -> Self {
        Lit((var.0 << 1) | sign as u32)
    }

    /// The positive literal of a variable
    #[inline]
    pub fn positive(var: Var) -> Self {
        Lit(var.0 << 1)
    }

    /// The negative literal of a variable
    #[inline]
    pub fn negative(var: Var) -> Self {
        Lit((var.0 << 1) | 1)
    }

    /// The underlying variable
    #[inline]
    pub fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// True if the literal is negated
    #[inline]
    pub fn sign(self) -> bool {
        (self.0 & 1) != 0
    }

    /// The positive literal of the same variable
    #[inline]
    pub fn unsigned(self) -> Self {
        Lit(self.0 & !1)
    }

    /// Index into per-literal arrays
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Inverse of [`Lit::index`]
    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Lit(idx as u32)
    }

    /// Build a literal from a DIMACS integer (non-zero; negative = negated)
    #[inline]
    pub fn from_dimacs(n: i32) -> Self {
        debug_assert!(n != 0);
        Lit::new(Var(n.unsigned_abs() - 1), n < 0)
    }

    /// The DIMACS integer for this literal
    #[inline]
    pub fn to_dimacs(self) -> i32 {
        let v = (self.var().0 + 1) as i32;
        if self.sign() {
            -v
        } else {
            v
        }
    }
}

impl Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit(self.0 ^ 1)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

// ============================================================================
// Kani Verification Harnesses
// ============================================================================

#[cfg(kani)]
mod verification {
    use super::*;

    /// Negation is involutive
    #[kani::proof]
    fn lit_negation_involutive() {
        let lit: Lit = kani::any();
        kani::assume(lit.0 < 1_000_000);
        assert_eq!(!!lit, lit);
    }

    /// Variable and sign round-trip through the packed encoding
    #[kani::proof]
    fn lit_var_sign_roundtrip() {
        let var: Var = kani::any();
        let sign: bool = kani::any();
        kani::assume(var.0 < 500_000);

        let lit = Lit::new(var, sign);
        assert_eq!(lit.var(), var);
        assert_eq!(lit.sign(), sign);
    }

    /// The two polarities of a variable are distinct and mutually negated
    #[kani::proof]
    fn lit_polarity_distinct() {
        let var: Var = kani::any();
        kani::assume(var.0 < 500_000);

        let pos = Lit::positive(var);
        let neg = Lit::negative(var);
        assert_ne!(pos, neg);
        assert_eq!(!pos, neg);
        assert_eq!(pos, neg.unsigned());
    }

    /// Packed indices are consecutive per variable
    #[kani::proof]
    fn lit_index_consecutive() {
        let var: Var = kani::any();
        kani::assume(var.0 < 500_000);

        assert_eq!(Lit::positive(var).index(), var.index() * 2);
        assert_eq!(Lit::negative(var).index(), var.index() * 2 + 1);
    }
}

// ============================================================================
// Property Tests (proptest)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Negation is involutive
        #[test]
        fn prop_negation_involutive(v in 0u32..100_000, sign: bool) {
            let lit = Lit::new(Var(v), sign);
            prop_assert_eq!(!!lit, lit);
        }

        /// Variable and sign survive the packed encoding
        #[test]
        fn prop_var_sign_roundtrip(v in 0u32..100_000, sign: bool) {
            let lit = Lit::new(Var(v), sign);
            prop_assert_eq!(lit.var(), Var(v));
            prop_assert_eq!(lit.sign(), sign);
        }

        /// `unsigned` strips the sign and nothing else
        #[test]
        fn prop_unsigned(v in 0u32..100_000, sign: bool) {
            let lit = Lit::new(Var(v), sign);
            prop_assert_eq!(lit.unsigned(), Lit::positive(Var(v)));
            prop_assert!(!lit.unsigned().sign());
        }

        /// DIMACS conversion round-trips
        #[test]
        fn prop_dimacs_roundtrip(n in 1i32..100_000, neg: bool) {
            let n = if neg { -n } else { n };
            prop_assert_eq!(Lit::from_dimacs(n).to_dimacs(), n);
        }

        /// Index round-trips
        #[test]
        fn prop_index_roundtrip(v in 0u32..100_000, sign: bool) {
            let lit = Lit::new(Var(v), sign);
            prop_assert_eq!(Lit::from_index(lit.index()), lit);
        }

        /// Literal ordering refines variable ordering
        #[test]
        fn prop_order_by_var(a in 0u32..1000, b in 0u32..1000) {
            prop_assume!(a < b);
            prop_assert!(Lit::negative(Var(a)) < Lit::positive(Var(b)));
        }
    }

    #[test]
    fn test_basic() {
        let v = Var(5);
        let pos = Lit::positive(v);
        let neg = Lit::negative(v);

        assert_eq!(pos.var(), v);
        assert_eq!(neg.var(), v);
        assert!(!pos.sign());
        assert!(neg.sign());
        assert_eq!(!pos, neg);
        assert_eq!(pos.to_dimacs(), 6);
        assert_eq!(neg.to_dimacs(), -6);
    }

    #[test]
    fn test_var_zero() {
        assert_eq!(Lit::positive(Var(0)).0, 0);
        assert_eq!(Lit::negative(Var(0)).0, 1);
        assert_eq!(Lit::from_dimacs(1), Lit::positive(Var(0)));
        assert_eq!(Lit::from_dimacs(-1), Lit::negative(Var(0)));
    }
}
