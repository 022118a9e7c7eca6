//! Gate-oriented CNF simplification
//!
//! A preprocessing building block for CDCL SAT solvers that discovers and
//! exploits OR-gate structure hidden in a clause database.
//!
//! ## Passes
//! - **Discovery**: recognize clauses of the form `¬w ∨ a ∨ b ∨ ...` whose
//!   inputs all carry a witnessing binary `w ∨ ¬input`, yielding the gate
//!   `w ⇔ (a ∨ b ∨ ...)`
//! - **Shortening**: clauses containing all gate inputs get the inputs
//!   replaced by the output (or dropped, or the clause removed, depending
//!   on the output's polarity in the clause)
//! - **Contraction**: through a two-input gate `w ⇔ a ∨ b`, the clause
//!   pair `¬a ∨ X` and `¬b ∨ X` merges into `¬w ∨ X`
//! - **Equivalences**: two gates with identical inputs make their outputs
//!   equivalent
//! - **Extended resolution**: sample literal pairs, score them by the
//!   simplification their gate would unlock, and materialize the best
//!   candidates with fresh output variables
//!
//! Every pass runs under a work budget and stops cleanly when it is spent;
//! partial results are always consistent. Nothing here decides
//! satisfiability or propagates units; the crate is meant to sit inside a
//! host solver's inprocessing loop.
//!
//! ## References
//! - Eén & Biere, "Effective Preprocessing in SAT through Variable and
//!   Clause Elimination", SAT 2005.
//! - Audemard, Katsirelos & Simon, "A Restriction of Extended Resolution
//!   for Clause Learning SAT Solvers", AAAI 2010.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clause;
pub mod clause_db;
pub mod dimacs;
pub mod gates;
pub mod literal;
pub mod solver;
pub mod subsume;
pub mod watched;

pub use clause::{Clause, ClauseStats};
pub use clause_db::ClauseDB;
pub use dimacs::{parse_str as parse_dimacs, DimacsError, DimacsFormula};
pub use gates::{GateConfig, GateFinder, GateStats, GateStore, OrGate};
pub use literal::{Lit, Var};
pub use solver::{CachedImp, Solver};
pub use subsume::{clause_sig, ClauseSig, Subsumer};
pub use watched::{BinWatch, BinWatches};
