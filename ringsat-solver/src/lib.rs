//! Conflict-driven solver for polynomial constraints over ℤ/2^w.
//!
//! The solver decides satisfiability of conjunctions of polynomial
//! equalities, disequalities and unsigned/signed inequalities over
//! fixed-width bit-vector variables. Search interleaves value propagation
//! over a mixed boolean/integer trail with decisions; conflicts are analyzed
//! by value resolution (polynomial superposition) and explained with
//! forbidden-interval lemmas.
//!
//! # Examples
//!
//! ```
//! use ringsat_solver::{SatResult, Solver};
//!
//! let mut solver = Solver::new();
//! let a = solver.add_var(2);
//! // a + 1 = 0 over Z/4 forces a = 3
//! solver.add_eq(solver.var(a) + 1, None);
//! assert_eq!(solver.check_sat(), SatResult::Sat);
//! assert_eq!(solver.value_of(a), Some(3));
//! ```
//!
//! Assertions can carry opaque dependency tags, reported back in the unsat
//! core:
//!
//! ```
//! use ringsat_solver::{SatResult, Solver};
//!
//! let mut solver = Solver::new();
//! let a = solver.add_var(3);
//! solver.add_eq(solver.var(a) * 4 + 2, 17u32);
//! assert_eq!(solver.check_sat(), SatResult::Unsat);
//! assert_eq!(solver.unsat_core(), vec![17]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod activity;
mod boolean;
mod clause;
mod conflict;
mod constraint;
mod dep;
mod explain;
mod intervals;
mod justification;
mod propagate;
mod resolve;
mod resource;
mod solver;
mod stats;
mod trail;
mod types;
mod viable;

pub use resource::{LimitStatus, ResourceLimits, ResourceManager};
pub use solver::{SatResult, Solver, UnknownReason};
pub use stats::Statistics;
pub use types::PVar;

pub use ringsat_math::{Poly, MAX_WIDTH};
