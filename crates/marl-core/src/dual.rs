//! Forward-mode dual number backing derivative-carrying properties.
//!
//! A [`Dual`] holds a value plus a vector of partial derivatives with
//! respect to some set of independent variables fixed by the caller.
//! Arithmetic propagates derivatives by the usual forward-mode rules.
//! Operands with derivative vectors of different lengths are combined
//! as if the shorter one were zero-padded.

use smallvec::SmallVec;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

use crate::value::{AdCarrier, PropValue};

/// Inline capacity of the derivative vector.
///
/// `SmallVec` keeps up to this many partials without a heap allocation,
/// covering the common case of a handful of coupled unknowns per point.
const INLINE_DERIVS: usize = 4;

/// A forward-mode dual number: value plus partial derivatives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dual {
    value: f64,
    derivs: SmallVec<[f64; INLINE_DERIVS]>,
}

impl Dual {
    /// A constant with no sensitivity to any variable.
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            derivs: SmallVec::new(),
        }
    }

    /// An independent variable: derivative 1 with respect to itself.
    ///
    /// `index` selects which slot in the derivative vector this
    /// variable occupies.
    pub fn variable(value: f64, index: usize) -> Self {
        let mut derivs = SmallVec::new();
        derivs.resize(index + 1, 0.0);
        derivs[index] = 1.0;
        Self { value, derivs }
    }

    /// The primal value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The partial derivative with respect to variable `index`.
    ///
    /// Slots beyond the stored vector are zero.
    pub fn derivative(&self, index: usize) -> f64 {
        self.derivs.get(index).copied().unwrap_or(0.0)
    }

    /// Number of derivative slots currently stored.
    pub fn n_derivatives(&self) -> usize {
        self.derivs.len()
    }

    /// Combine two derivative vectors elementwise, zero-padding the shorter.
    fn zip_derivs(
        a: &SmallVec<[f64; INLINE_DERIVS]>,
        b: &SmallVec<[f64; INLINE_DERIVS]>,
        f: impl Fn(f64, f64) -> f64,
    ) -> SmallVec<[f64; INLINE_DERIVS]> {
        let len = a.len().max(b.len());
        let mut out = SmallVec::with_capacity(len);
        for i in 0..len {
            let da = a.get(i).copied().unwrap_or(0.0);
            let db = b.get(i).copied().unwrap_or(0.0);
            out.push(f(da, db));
        }
        out
    }
}

impl fmt::Display for Dual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<f64> for Dual {
    fn from(v: f64) -> Self {
        Self::constant(v)
    }
}

impl PropValue for Dual {
    fn set_zero(&mut self) {
        self.value = 0.0;
        self.derivs.clear();
    }
}

impl AdCarrier for f64 {
    type Ad = Dual;
}

impl Add for Dual {
    type Output = Dual;

    fn add(self, rhs: Dual) -> Dual {
        Dual {
            value: self.value + rhs.value,
            derivs: Dual::zip_derivs(&self.derivs, &rhs.derivs, |a, b| a + b),
        }
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Dual) {
        *self = self.clone() + rhs;
    }
}

impl Sub for Dual {
    type Output = Dual;

    fn sub(self, rhs: Dual) -> Dual {
        Dual {
            value: self.value - rhs.value,
            derivs: Dual::zip_derivs(&self.derivs, &rhs.derivs, |a, b| a - b),
        }
    }
}

impl Mul for Dual {
    type Output = Dual;

    fn mul(self, rhs: Dual) -> Dual {
        // Product rule: (ab)' = a'b + ab'.
        let (av, bv) = (self.value, rhs.value);
        Dual {
            value: av * bv,
            derivs: Dual::zip_derivs(&self.derivs, &rhs.derivs, |da, db| da * bv + av * db),
        }
    }
}

impl Div for Dual {
    type Output = Dual;

    fn div(self, rhs: Dual) -> Dual {
        // Quotient rule: (a/b)' = (a'b - ab') / b^2.
        let (av, bv) = (self.value, rhs.value);
        Dual {
            value: av / bv,
            derivs: Dual::zip_derivs(&self.derivs, &rhs.derivs, |da, db| {
                (da * bv - av * db) / (bv * bv)
            }),
        }
    }
}

impl Neg for Dual {
    type Output = Dual;

    fn neg(self) -> Dual {
        Dual {
            value: -self.value,
            derivs: self.derivs.iter().map(|d| -d).collect(),
        }
    }
}

impl Mul<f64> for Dual {
    type Output = Dual;

    fn mul(self, rhs: f64) -> Dual {
        Dual {
            value: self.value * rhs,
            derivs: self.derivs.iter().map(|d| d * rhs).collect(),
        }
    }
}

impl Add<f64> for Dual {
    type Output = Dual;

    fn add(self, rhs: f64) -> Dual {
        Dual {
            value: self.value + rhs,
            derivs: self.derivs,
        }
    }
}
