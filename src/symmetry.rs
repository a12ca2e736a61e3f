use std::fmt;

use crate::error::Result;
use crate::permutation::{self, Permutation};

// A Symmetry is a permutation of positions, plus whether applying it negates the object.
// For example, swapping the indices of an antisymmetric tensor is the symmetry
// ((0 1), sign = true), since A_ij = -A_ji.
#[derive(Clone, Debug, Hash, Eq, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symmetry {
    permutation: Permutation,

    // true means the permutation flips the sign.
    sign: bool,
}

impl Symmetry {
    pub fn new(permutation: Permutation, sign: bool) -> Symmetry {
        Symmetry { permutation, sign }
    }

    // Like new, but checks that the permutation is a bijection of the given degree.
    pub fn checked(degree: usize, permutation: Permutation, sign: bool) -> Result<Symmetry> {
        permutation::validate(degree, &permutation)?;
        Ok(Symmetry { permutation, sign })
    }

    pub fn identity(degree: usize) -> Symmetry {
        Symmetry::new(permutation::identity(degree), false)
    }

    // Parses cycle notation, with a leading "-" for a negating symmetry.
    // For example "-(0 1)".
    pub fn parse(degree: usize, s: &str) -> Result<Symmetry> {
        let s = s.trim();
        let (sign, cycles) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        Ok(Symmetry::new(permutation::parse(degree, cycles)?, sign))
    }

    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    pub fn into_permutation(self) -> Permutation {
        self.permutation
    }

    pub fn sign(&self) -> bool {
        self.sign
    }

    pub fn dimension(&self) -> usize {
        self.permutation.len()
    }

    pub fn is_identity(&self) -> bool {
        permutation::is_identity(&self.permutation)
    }

    // Applies self, then other. The signs multiply.
    pub fn compose(&self, other: &Symmetry) -> Symmetry {
        Symmetry {
            permutation: permutation::compose(&self.permutation, &other.permutation),
            sign: self.sign ^ other.sign,
        }
    }

    pub fn inverse(&self) -> Symmetry {
        Symmetry {
            permutation: permutation::inverse(&self.permutation),
            sign: self.sign,
        }
    }
}

impl fmt::Display for Symmetry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.sign {
            write!(f, "-")?;
        }
        write!(f, "{}", permutation::to_cycle_string(&self.permutation))
    }
}
