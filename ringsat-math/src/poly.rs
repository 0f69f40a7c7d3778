//! Multivariate polynomials over ℤ/2^w.
//!
//! A [`Poly`] is a canonical sum of terms `coeff * monomial` with coefficients
//! reduced modulo `2^width` and monomials kept in graded-lexicographic order.
//! The operation set mirrors what the solver core needs from its polynomial
//! provider: ring arithmetic, unilinear recognition, per-variable factoring,
//! exact division by a constant, evaluation under a partial assignment, and
//! the superposition resolvent used during conflict explanation.

use crate::modular;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Variable identifier for polynomials.
pub type Var = u32;

/// Power of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarPower {
    /// The variable identifier.
    pub var: Var,
    /// The exponent, always positive.
    pub power: u32,
}

/// A product of variable powers, sorted by variable index.
///
/// The unit monomial (1) is the empty product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Monomial {
    vars: SmallVec<[VarPower; 4]>,
}

impl Monomial {
    /// The unit monomial.
    #[must_use]
    pub fn unit() -> Self {
        Self::default()
    }

    /// A single variable with power 1.
    #[must_use]
    pub fn from_var(var: Var) -> Self {
        Self::from_var_power(var, 1)
    }

    /// A single variable with the given power.
    #[must_use]
    pub fn from_var_power(var: Var, power: u32) -> Self {
        let mut vars = SmallVec::new();
        if power > 0 {
            vars.push(VarPower { var, power });
        }
        Self { vars }
    }

    /// Is this the unit monomial?
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.vars.is_empty()
    }

    /// Sum of all exponents.
    #[must_use]
    pub fn total_degree(&self) -> u32 {
        self.vars.iter().map(|vp| vp.power).sum()
    }

    /// The variable powers, sorted by variable index.
    #[must_use]
    pub fn vars(&self) -> &[VarPower] {
        &self.vars
    }

    /// Exponent of `var` in this monomial.
    #[must_use]
    pub fn degree(&self, var: Var) -> u32 {
        self.vars
            .iter()
            .find(|vp| vp.var == var)
            .map_or(0, |vp| vp.power)
    }

    /// Product of two monomials.
    #[must_use]
    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut vars: SmallVec<[VarPower; 4]> = SmallVec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.vars.len() && j < other.vars.len() {
            let (a, b) = (self.vars[i], other.vars[j]);
            match a.var.cmp(&b.var) {
                Ordering::Less => {
                    vars.push(a);
                    i += 1;
                }
                Ordering::Greater => {
                    vars.push(b);
                    j += 1;
                }
                Ordering::Equal => {
                    vars.push(VarPower {
                        var: a.var,
                        power: a.power + b.power,
                    });
                    i += 1;
                    j += 1;
                }
            }
        }
        vars.extend_from_slice(&self.vars[i..]);
        vars.extend_from_slice(&other.vars[j..]);
        Monomial { vars }
    }

    /// Divide out `var^power`; the monomial must contain it.
    fn div_power(&self, var: Var, power: u32) -> Monomial {
        debug_assert!(self.degree(var) >= power);
        let mut vars = self.vars.clone();
        if let Some(pos) = vars.iter().position(|vp| vp.var == var) {
            if vars[pos].power > power {
                vars[pos].power -= power;
            } else {
                vars.remove(pos);
            }
        }
        Monomial { vars }
    }

    /// Graded-lexicographic comparison.
    #[must_use]
    pub fn grlex_cmp(&self, other: &Monomial) -> Ordering {
        self.total_degree()
            .cmp(&other.total_degree())
            .then_with(|| self.vars[..].cmp(&other.vars[..]))
    }
}

/// One term of a polynomial.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    /// Coefficient, reduced modulo `2^width` and never zero.
    pub coeff: u64,
    /// The monomial part.
    pub mono: Monomial,
}

/// A recognized `scale * var + offset` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unilinear {
    /// The single free variable.
    pub var: Var,
    /// Coefficient of the variable, nonzero.
    pub scale: u64,
    /// Constant offset.
    pub offset: u64,
}

/// A canonical multivariate polynomial over ℤ/2^width.
///
/// Terms are sorted in descending graded-lexicographic order, so the constant
/// term (if any) comes last and the shape of a polynomial is independent of
/// how it was built. Equal polynomials hash equally, which the solver's
/// constraint interning relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Poly {
    width: u32,
    terms: Vec<Term>,
}

impl Poly {
    /// The zero polynomial.
    #[must_use]
    pub fn zero(width: u32) -> Self {
        Self {
            width,
            terms: Vec::new(),
        }
    }

    /// A constant polynomial.
    #[must_use]
    pub fn val(width: u32, value: u64) -> Self {
        Self::from_terms(
            width,
            std::iter::once(Term {
                coeff: value,
                mono: Monomial::unit(),
            }),
        )
    }

    /// A single-variable polynomial `v`.
    #[must_use]
    pub fn var(width: u32, v: Var) -> Self {
        Self::from_terms(
            width,
            std::iter::once(Term {
                coeff: 1,
                mono: Monomial::from_var(v),
            }),
        )
    }

    /// Build a polynomial from arbitrary terms, merging and normalizing.
    pub fn from_terms(width: u32, terms: impl IntoIterator<Item = Term>) -> Self {
        let mut acc: FxHashMap<Monomial, u64> = FxHashMap::default();
        for t in terms {
            let c = t.coeff & modular::mask(width);
            if c == 0 {
                continue;
            }
            let entry = acc.entry(t.mono).or_insert(0);
            *entry = modular::add(*entry, c, width);
        }
        let mut out: Vec<Term> = acc
            .into_iter()
            .filter(|(_, c)| *c != 0)
            .map(|(mono, coeff)| Term { coeff, mono })
            .collect();
        out.sort_by(|a, b| b.mono.grlex_cmp(&a.mono));
        Self { width, terms: out }
    }

    /// The bit-width this polynomial lives in.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The canonical term list.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Is this the zero polynomial?
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Is this a constant?
    #[must_use]
    pub fn is_val(&self) -> bool {
        self.terms.is_empty() || (self.terms.len() == 1 && self.terms[0].mono.is_unit())
    }

    /// The constant value, if this is a constant.
    #[must_use]
    pub fn as_val(&self) -> Option<u64> {
        if self.terms.is_empty() {
            Some(0)
        } else if self.terms.len() == 1 && self.terms[0].mono.is_unit() {
            Some(self.terms[0].coeff)
        } else {
            None
        }
    }

    /// All free variables, sorted and unique.
    #[must_use]
    pub fn free_vars(&self) -> SmallVec<[Var; 4]> {
        let mut vars: SmallVec<[Var; 4]> = SmallVec::new();
        for t in &self.terms {
            for vp in t.mono.vars() {
                if let Err(pos) = vars.binary_search(&vp.var) {
                    vars.insert(pos, vp.var);
                }
            }
        }
        vars
    }

    /// Highest power of `v` appearing in the polynomial.
    #[must_use]
    pub fn degree(&self, v: Var) -> u32 {
        self.terms.iter().map(|t| t.mono.degree(v)).max().unwrap_or(0)
    }

    /// Recognize the shape `scale * v + offset` with exactly one variable.
    #[must_use]
    pub fn as_unilinear(&self) -> Option<Unilinear> {
        let vars = self.free_vars();
        if vars.len() != 1 {
            return None;
        }
        let var = vars[0];
        let mut scale = 0u64;
        let mut offset = 0u64;
        for t in &self.terms {
            if t.mono.is_unit() {
                offset = t.coeff;
            } else if t.mono.vars() == [VarPower { var, power: 1 }] {
                scale = t.coeff;
            } else {
                return None;
            }
        }
        debug_assert_ne!(scale, 0);
        Some(Unilinear { var, scale, offset })
    }

    /// Split as `self = q * v^degree + r` where `r` collects the terms whose
    /// `v`-degree is below `degree`.
    #[must_use]
    pub fn factor(&self, v: Var, degree: u32) -> (Poly, Poly) {
        let mut q = Vec::new();
        let mut r = Vec::new();
        for t in &self.terms {
            if t.mono.degree(v) >= degree {
                q.push(Term {
                    coeff: t.coeff,
                    mono: t.mono.div_power(v, degree),
                });
            } else {
                r.push(t.clone());
            }
        }
        (
            Poly::from_terms(self.width, q),
            Poly::from_terms(self.width, r),
        )
    }

    /// Exact division of every coefficient by `divisor`, if possible.
    ///
    /// Division by `d = 2^k * odd` succeeds when every coefficient is
    /// divisible by `2^k`; the odd part is inverted.
    #[must_use]
    pub fn try_div(&self, divisor: u64) -> Option<Poly> {
        let divisor = divisor & modular::mask(self.width);
        if divisor == 0 {
            return None;
        }
        let shift = divisor.trailing_zeros();
        let inv = modular::inverse(divisor >> shift, self.width)?;
        let low = modular::mask(shift.min(63));
        let mut out = Vec::with_capacity(self.terms.len());
        for t in &self.terms {
            if shift > 0 && t.coeff & low != 0 {
                return None;
            }
            out.push(Term {
                coeff: modular::mul(t.coeff >> shift, inv, self.width),
                mono: t.mono.clone(),
            });
        }
        Some(Poly::from_terms(self.width, out))
    }

    /// Superposition resolvent: eliminate the leading `v`-degree of `other`
    /// using `self`.
    ///
    /// With `self = A*v^d1 + B` and `other = C*v^d2 + D` and `d1 <= d2`,
    /// the result is `A*D - C*v^(d2-d1)*B`, a combination of the inputs with
    /// the `A*C*v^d2` summands cancelled. Returns `None` when either input
    /// does not mention `v` or the degrees are the wrong way around.
    #[must_use]
    pub fn resolve(&self, v: Var, other: &Poly) -> Option<Poly> {
        debug_assert_eq!(self.width, other.width);
        let d1 = self.degree(v);
        let d2 = other.degree(v);
        if d1 == 0 || d2 == 0 || d1 > d2 {
            return None;
        }
        let (a, b) = self.factor(v, d1);
        let (c, d) = other.factor(v, d2);
        let shift = Poly::from_terms(
            self.width,
            std::iter::once(Term {
                coeff: 1,
                mono: Monomial::from_var_power(v, d2 - d1),
            }),
        );
        Some(a * d - c * shift * b)
    }

    /// Substitute values for variables and renormalize.
    #[must_use]
    pub fn subst_val(&self, assignment: &[(Var, u64)]) -> Poly {
        let lookup = |v: Var| assignment.iter().find(|(av, _)| *av == v).map(|(_, k)| *k);
        let mut out = Vec::with_capacity(self.terms.len());
        for t in &self.terms {
            let mut coeff = t.coeff;
            let mut vars: SmallVec<[VarPower; 4]> = SmallVec::new();
            for vp in t.mono.vars() {
                match lookup(vp.var) {
                    Some(k) => {
                        coeff = modular::mul(coeff, modular::pow(k, vp.power, self.width), self.width)
                    }
                    None => vars.push(*vp),
                }
            }
            out.push(Term {
                coeff,
                mono: Monomial { vars },
            });
        }
        Poly::from_terms(self.width, out)
    }
}

impl Add for Poly {
    type Output = Poly;
    fn add(self, rhs: Poly) -> Poly {
        debug_assert_eq!(self.width, rhs.width);
        let width = self.width;
        Poly::from_terms(width, self.terms.into_iter().chain(rhs.terms))
    }
}

impl Add<u64> for Poly {
    type Output = Poly;
    fn add(self, rhs: u64) -> Poly {
        let width = self.width;
        self + Poly::val(width, rhs)
    }
}

impl Sub for Poly {
    type Output = Poly;
    fn sub(self, rhs: Poly) -> Poly {
        self + (-rhs)
    }
}

impl Sub<u64> for Poly {
    type Output = Poly;
    fn sub(self, rhs: u64) -> Poly {
        let width = self.width;
        self - Poly::val(width, rhs)
    }
}

impl Neg for Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        let width = self.width;
        Poly::from_terms(
            width,
            self.terms.into_iter().map(|t| Term {
                coeff: modular::neg(t.coeff, width),
                mono: t.mono,
            }),
        )
    }
}

impl Mul for Poly {
    type Output = Poly;
    fn mul(self, rhs: Poly) -> Poly {
        debug_assert_eq!(self.width, rhs.width);
        let width = self.width;
        let mut out = Vec::with_capacity(self.terms.len() * rhs.terms.len());
        for a in &self.terms {
            for b in &rhs.terms {
                out.push(Term {
                    coeff: modular::mul(a.coeff, b.coeff, width),
                    mono: a.mono.mul(&b.mono),
                });
            }
        }
        Poly::from_terms(width, out)
    }
}

impl Mul<u64> for Poly {
    type Output = Poly;
    fn mul(self, rhs: u64) -> Poly {
        let width = self.width;
        Poly::from_terms(
            width,
            self.terms.into_iter().map(|t| Term {
                coeff: modular::mul(t.coeff, rhs, width),
                mono: t.mono,
            }),
        )
    }
}

impl Mul<Poly> for u64 {
    type Output = Poly;
    fn mul(self, rhs: Poly) -> Poly {
        rhs * self
    }
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unit() {
            return write!(f, "1");
        }
        for (i, vp) in self.vars.iter().enumerate() {
            if i > 0 {
                write!(f, "*")?;
            }
            write!(f, "v{}", vp.var)?;
            if vp.power > 1 {
                write!(f, "^{}", vp.power)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            if t.mono.is_unit() {
                write!(f, "{}", t.coeff)?;
            } else if t.coeff == 1 {
                write!(f, "{}", t.mono)?;
            } else {
                write!(f, "{}*{}", t.coeff, t.mono)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Poly {
        Poly::var(4, 0)
    }

    fn y() -> Poly {
        Poly::var(4, 1)
    }

    #[test]
    fn test_canonical_form() {
        let p = x() * 3 + y() + 1;
        let q = Poly::val(4, 1) + y() + x() * 3;
        assert_eq!(p, q);
        assert_eq!(p.terms().len(), 3);
        assert!(p.terms().last().unwrap().mono.is_unit());
    }

    #[test]
    fn test_coefficients_reduce() {
        let p = x() * 16;
        assert!(p.is_zero());
        let q = x() * 17;
        assert_eq!(q, x());
    }

    #[test]
    fn test_as_val() {
        assert_eq!(Poly::zero(4).as_val(), Some(0));
        assert_eq!(Poly::val(4, 20).as_val(), Some(4));
        assert_eq!(x().as_val(), None);
    }

    #[test]
    fn test_unilinear() {
        let p = x() * 3 + 5;
        let u = p.as_unilinear().unwrap();
        assert_eq!((u.var, u.scale, u.offset), (0, 3, 5));
        assert_eq!((x() * 3 + y()).as_unilinear(), None);
        assert_eq!((x().clone() * x() + 1).as_unilinear(), None);
        assert_eq!(Poly::val(4, 3).as_unilinear(), None);
    }

    #[test]
    fn test_factor() {
        // x^2*y + 2x + 3 factored by x^1: q = x*y + 2, r = 3
        let p = x() * x() * y() + x() * 2 + 3;
        let (q, r) = p.factor(0, 1);
        assert_eq!(q, x() * y() + 2);
        assert_eq!(r, Poly::val(4, 3));
        let back = q * x() + r;
        assert_eq!(back, x() * x() * y() + x() * 2 + 3);
    }

    #[test]
    fn test_try_div() {
        let p = x() * 6 + 2;
        assert_eq!(p.clone().try_div(2).unwrap(), x() * 3 + 1);
        assert_eq!((x() * 3 + 1).try_div(2), None);
        // odd divisors always succeed: 3 * 11 = 33 = 1 (mod 16)
        assert_eq!((x() * 3).try_div(3).unwrap(), x());
    }

    #[test]
    fn test_subst_val() {
        let p = x() * x() + y() * 2 + 1;
        let q = p.subst_val(&[(0, 3)]);
        assert_eq!(q, y() * 2 + 10);
        assert_eq!(q.subst_val(&[(1, 3)]).as_val(), Some(0));
    }

    #[test]
    fn test_resolve_linear() {
        // p = x + 2y + 4, q = x + 4y + 4  =>  resolvent eliminates x: 2y (mod 8)
        let p = Poly::var(3, 0) + Poly::var(3, 1) * 2 + 4;
        let q = Poly::var(3, 0) + Poly::var(3, 1) * 4 + 4;
        let r = p.resolve(0, &q).unwrap();
        assert_eq!(r, Poly::var(3, 1) * 2);
        assert_eq!(r.degree(0), 0);
    }

    #[test]
    fn test_resolve_degrees() {
        // p = x*y + 1 (degree 1 in x), q = x^2 + x (degree 2)
        let p = x() * y() + 1;
        let q = x() * x() + x();
        let r = p.resolve(0, &q).unwrap();
        // A = y, B = 1, C = 1, D = x: r = y*x - x = (y - 1)*x
        assert_eq!(r, x() * y() - x());
        assert_eq!(r.degree(0), 1);
        assert_eq!(q.resolve(0, &p), None);
        assert_eq!(Poly::val(4, 1).resolve(0, &q), None);
    }

    #[test]
    fn test_display() {
        let p = x() * x() * 3 + y() + 7;
        assert_eq!(p.to_string(), "3*v0^2 + v1 + 7");
        assert_eq!(Poly::zero(4).to_string(), "0");
    }
}
