//! Fixed-width modular arithmetic providers for the ringsat solver.
//!
//! This crate supplies the two mathematical engines the solver core builds on:
//! - Multivariate polynomials over ℤ/2^w with canonical term order, factoring,
//!   substitution and superposition resolvents ([`Poly`]).
//! - Decidable predicates over ℤ/2^w backed by reduced ordered binary decision
//!   diagrams, with constructors for point constraints and affine comparisons
//!   ([`Fdd`]).
//!
//! Widths range over `1..=MAX_WIDTH`. All arithmetic is unsigned modular;
//! values are masked `u64`, intermediates are widened to `u128`.
//!
//! # Examples
//!
//! ```
//! use ringsat_math::{Fdd, FindResult, Poly};
//!
//! // 3*x + 1 over Z/2^4
//! let p = Poly::var(4, 0) * 3 + 1;
//! assert_eq!(p.subst_val(&[(0, 5)]).as_val(), Some(0));
//!
//! // the values of x with 3*x + 1 = 0 (mod 16)
//! let mut fdd = Fdd::new(4).unwrap();
//! let zeros = fdd.affine_eq_zero(3, 1);
//! assert_eq!(fdd.find(zeros, 0), FindResult::Singleton(5));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod bdd;
pub mod error;
pub mod fdd;
pub mod modular;
pub mod poly;

pub use bdd::NodeId;
pub use error::MathError;
pub use fdd::{Fdd, FindResult};
pub use modular::MAX_WIDTH;
pub use poly::{Monomial, Poly, Unilinear, Var};
