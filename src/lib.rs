pub mod error;
pub mod orbit;
pub mod permutation;
pub mod stabilizer_chain;
pub mod symmetry;
pub mod symmetry_set;

pub use error::{Result, SymmetryError};
pub use permutation::Permutation;
pub use stabilizer_chain::StabilizerChain;
pub use symmetry::Symmetry;
pub use symmetry_set::{SymmetrySet, Variant};
