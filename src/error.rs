use thiserror::Error;

// Everything that can go wrong when building or extending a symmetry group.
// None of these are transient. The first one is a user-facing declaration error,
// the rest mean the caller handed us bad data.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SymmetryError {
    // The permutation is already derivable from the group with the opposite sign.
    #[error("inconsistent generators: {permutation:?} is derivable with both signs")]
    InconsistentGenerators { permutation: Vec<usize> },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Not a bijection on 0..n.
    #[error("malformed permutation: {permutation:?}")]
    MalformedPermutation { permutation: Vec<usize> },

    #[error("point {point} is out of range for degree {degree}")]
    PointOutOfRange { point: usize, degree: usize },

    #[error("cannot parse cycle notation: {0}")]
    InvalidCycleNotation(String),
}

impl SymmetryError {
    pub fn inconsistent(permutation: &[usize]) -> SymmetryError {
        SymmetryError::InconsistentGenerators {
            permutation: permutation.to_vec(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            SymmetryError::InconsistentGenerators { .. } => "InconsistentGenerators",
            SymmetryError::DimensionMismatch { .. } => "DimensionMismatch",
            SymmetryError::MalformedPermutation { .. } => "MalformedPermutation",
            SymmetryError::PointOutOfRange { .. } => "PointOutOfRange",
            SymmetryError::InvalidCycleNotation(_) => "InvalidCycleNotation",
        }
    }
}

pub type Result<T> = std::result::Result<T, SymmetryError>;
