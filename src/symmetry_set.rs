use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::error::{Result, SymmetryError};
use crate::permutation::{self, Permutation};
use crate::stabilizer_chain::StabilizerChain;
use crate::symmetry::Symmetry;

// The goal of this object is to represent the symmetries of the indices of a tensor.
// For example, R_abcd = -R_bacd = R_cdab is generated by the symmetries
//   -(0 1)
//   (0 2)(1 3)
// and any composition of those operations.
// The group is stored as its basis, a set of generators. The first basis element is
// always the identity.
// The "dimension" is the number of positions being permuted.
#[derive(Clone, Debug)]
pub struct SymmetrySet {
    dimension: usize,
    kind: Kind,
}

// Which representation a SymmetrySet uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    // Dimension 0 or 1. Only the identity.
    Empty,

    // Every permutation, none of them negating.
    Full,

    // Whatever the basis generates.
    General,
}

#[derive(Clone, Debug)]
enum Kind {
    // The immutable variants share their basis between clones.
    Empty(Arc<[Symmetry]>),
    Full(Arc<[Symmetry]>),

    General(Vec<Symmetry>),
}

static EMPTY: OnceLock<[SymmetrySet; 2]> = OnceLock::new();

fn empty(dimension: usize) -> SymmetrySet {
    SymmetrySet {
        dimension,
        kind: Kind::Empty(Arc::from(vec![Symmetry::identity(dimension)])),
    }
}

// Enumerates the closure of the basis, checking for a permutation reached with both signs.
// Returns the sign of every element of the group.
fn signed_closure(dimension: usize, basis: &[Symmetry]) -> Result<HashMap<Permutation, bool>> {
    let generators: Vec<&Symmetry> = basis.iter().filter(|s| !s.is_identity()).collect();
    if let Some(s) = basis.iter().find(|s| s.is_identity() && s.sign()) {
        return Err(SymmetryError::inconsistent(s.permutation()));
    }

    let mut signs = HashMap::new();
    signs.insert(permutation::identity(dimension), false);
    let mut queue = VecDeque::new();
    queue.push_back(Symmetry::identity(dimension));

    // Every edge gets checked, even into elements we have already seen.
    // Otherwise a contradiction could hide behind the first path that found an element.
    while let Some(element) = queue.pop_front() {
        for generator in &generators {
            let product = element.compose(generator);
            match signs.get(product.permutation()) {
                Some(&sign) => {
                    if sign != product.sign() {
                        return Err(SymmetryError::inconsistent(product.permutation()));
                    }
                }
                None => {
                    signs.insert(product.permutation().to_vec(), product.sign());
                    queue.push_back(product);
                }
            }
        }
    }
    Ok(signs)
}

// Appends (0 1) and the rotation of the block, as far as the block size allows.
fn add_block(set: &mut SymmetrySet, start: usize, len: usize) {
    if len >= 2 {
        let swap = permutation::transposition(set.dimension, start, start + 1);
        set.add_unsafe(Symmetry::new(swap, false));
    }
    if len >= 3 {
        let cycle = permutation::rotation(set.dimension, start, len);
        set.add_unsafe(Symmetry::new(cycle, false));
    }
}

// Adds two extra points that get swapped by negating symmetries.
// This turns a signed group into an ordinary permutation group of degree dimension + 2.
fn embed_sign(p: &[usize], sign: bool) -> Permutation {
    let n = p.len();
    let mut answer = p.to_vec();
    if sign {
        answer.extend([n + 1, n]);
    } else {
        answer.extend([n, n + 1]);
    }
    answer
}

impl SymmetrySet {
    // The group containing only the identity.
    pub fn trivial(dimension: usize) -> SymmetrySet {
        if dimension <= 1 {
            let cached = EMPTY.get_or_init(|| [empty(0), empty(1)]);
            return cached[dimension].clone();
        }
        SymmetrySet {
            dimension,
            kind: Kind::General(vec![Symmetry::identity(dimension)]),
        }
    }

    // The group of all permutations, generated by (0 1) and (0 1 ... n-1).
    pub fn full_symmetric(dimension: usize) -> SymmetrySet {
        if dimension <= 1 {
            return SymmetrySet::trivial(dimension);
        }
        let basis = vec![
            Symmetry::identity(dimension),
            Symmetry::new(permutation::transposition(dimension, 0, 1), false),
            Symmetry::new(permutation::rotation(dimension, 0, dimension), false),
        ];
        SymmetrySet {
            dimension,
            kind: Kind::Full(Arc::from(basis)),
        }
    }

    // Two blocks of positions, each fully symmetric on its own.
    // The upper block is the first upper_count positions, the lower block the next lower_count.
    // Nothing mixes the blocks.
    pub fn full_symmetric_block(upper_count: usize, lower_count: usize) -> SymmetrySet {
        let dimension = upper_count + lower_count;
        let mut answer = SymmetrySet::trivial(dimension);
        if dimension <= 1 {
            return answer;
        }
        add_block(&mut answer, 0, upper_count);
        add_block(&mut answer, upper_count, lower_count);
        answer
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn variant(&self) -> Variant {
        match self.kind {
            Kind::Empty(_) => Variant::Empty,
            Kind::Full(_) => Variant::Full,
            Kind::General(_) => Variant::General,
        }
    }

    pub fn basis(&self) -> &[Symmetry] {
        match &self.kind {
            Kind::Empty(basis) | Kind::Full(basis) => &basis[..],
            Kind::General(basis) => &basis[..],
        }
    }

    // Whether the identity is the only element.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            Kind::Empty(_) => true,
            Kind::Full(_) => false,
            Kind::General(basis) => basis.iter().all(|s| s.is_identity()),
        }
    }

    fn check_dimension(&self, symmetry: &Symmetry) -> Result<()> {
        permutation::validate(self.dimension, symmetry.permutation())
    }

    // Adds a generator to the group.
    // Returns Ok(false) if the group already contains it, Ok(true) if the group grew.
    // If the generator contradicts the sign of something the group can already derive,
    // this returns an error and leaves the set as it was.
    // This enumerates the whole group, so it is only meant for small groups.
    pub fn add(&mut self, symmetry: Symmetry) -> Result<bool> {
        self.check_dimension(&symmetry)?;

        let basis = match &mut self.kind {
            Kind::Empty(_) | Kind::Full(_) => {
                // Every permutation is already here, with a positive sign
                if symmetry.sign() {
                    warn!(generator = %symmetry, "rejected inconsistent symmetry");
                    return Err(SymmetryError::inconsistent(symmetry.permutation()));
                }
                return Ok(false);
            }
            Kind::General(basis) => basis,
        };

        let signs = signed_closure(self.dimension, basis)?;
        match signs.get(symmetry.permutation()) {
            Some(&sign) if sign == symmetry.sign() => return Ok(false),
            Some(_) => {
                warn!(generator = %symmetry, "rejected inconsistent symmetry");
                return Err(SymmetryError::inconsistent(symmetry.permutation()));
            }
            None => {}
        }

        // Check the extended basis on a copy, so a failure leaves the basis untouched
        let mut candidate = basis.clone();
        candidate.push(symmetry.clone());
        if let Err(e) = signed_closure(self.dimension, &candidate) {
            warn!(generator = %symmetry, "rejected inconsistent symmetry");
            return Err(e);
        }
        debug!(
            dimension = self.dimension,
            generator = %symmetry,
            "extended symmetry group"
        );
        *basis = candidate;
        Ok(true)
    }

    // Adds a generator without checking it against the rest of the group.
    // Only for callers that already know the result is consistent.
    // Returns whether the basis changed. The immutable variants never change.
    pub fn add_unsafe(&mut self, symmetry: Symmetry) -> bool {
        assert_eq!(symmetry.dimension(), self.dimension);
        assert!(permutation::is_bijection(symmetry.permutation()));
        match &mut self.kind {
            Kind::Empty(_) | Kind::Full(_) => false,
            Kind::General(basis) => {
                if basis.contains(&symmetry) {
                    return false;
                }
                basis.push(symmetry);
                true
            }
        }
    }

    // Every element of the group, each permutation exactly once.
    // Each call starts a fresh enumeration.
    pub fn iter(&self) -> Elements {
        let inner = match &self.kind {
            Kind::Empty(_) => Inner::Single(Some(Symmetry::identity(self.dimension))),
            Kind::Full(_) => Inner::Lexicographic(Some(permutation::identity(self.dimension))),
            Kind::General(basis) => {
                let identity = Symmetry::identity(self.dimension);
                Inner::Span {
                    generators: basis.iter().filter(|s| !s.is_identity()).cloned().collect(),
                    seen: std::iter::once(identity.permutation().to_vec()).collect(),
                    queue: std::iter::once(identity).collect(),
                }
            }
        };
        Elements { inner }
    }

    // A stabilizer chain for the group, ignoring signs.
    pub fn chain(&self) -> StabilizerChain {
        let generators: Vec<Permutation> = self
            .basis()
            .iter()
            .map(|s| s.permutation().to_vec())
            .collect();
        StabilizerChain::build(self.dimension, &generators, &[])
    }

    // A stabilizer chain on dimension + 2 points, where the last two points record the sign.
    pub fn signed_chain(&self) -> StabilizerChain {
        let generators: Vec<Permutation> = self
            .basis()
            .iter()
            .map(|s| embed_sign(s.permutation(), s.sign()))
            .collect();
        StabilizerChain::build(self.dimension + 2, &generators, &[])
    }

    // The number of distinct permutations in the group.
    // None if that does not fit in a u128, as for the full group on 35 points.
    pub fn order(&self) -> Option<u128> {
        match &self.kind {
            Kind::Empty(_) => Some(1),
            Kind::Full(_) => {
                (1..=self.dimension as u128).try_fold(1u128, |acc, k| acc.checked_mul(k))
            }
            Kind::General(_) => self.chain().order(),
        }
    }

    // The sign that the group assigns to this permutation, or None if it isn't in the group.
    pub fn sign_of(&self, p: &[usize]) -> Option<bool> {
        if p.len() != self.dimension || !permutation::is_bijection(p) {
            return None;
        }
        match &self.kind {
            Kind::Empty(_) => permutation::is_identity(p).then_some(false),
            Kind::Full(_) => Some(false),
            Kind::General(_) => {
                let chain = self.signed_chain();
                [false, true]
                    .into_iter()
                    .find(|&sign| chain.contains(&embed_sign(p, sign)))
            }
        }
    }

    pub fn contains(&self, symmetry: &Symmetry) -> bool {
        self.sign_of(symmetry.permutation()) == Some(symmetry.sign())
    }
}

// A lazy enumeration of the elements of a SymmetrySet.
pub struct Elements {
    inner: Inner,
}

enum Inner {
    Single(Option<Symmetry>),

    // The next permutation to yield, in lexicographic order.
    Lexicographic(Option<Permutation>),

    // Breadth-first search over products of the generators.
    Span {
        generators: Vec<Symmetry>,
        seen: HashSet<Permutation>,
        queue: VecDeque<Symmetry>,
    },
}

// The lexicographically next permutation, or None if this is the last one.
fn next_lexicographic(current: &[usize]) -> Option<Permutation> {
    let mut next = current.to_vec();
    let i = next.windows(2).rposition(|w| w[0] < w[1])?;
    let j = next.iter().rposition(|&x| x > next[i])?;
    next.swap(i, j);
    next[i + 1..].reverse();
    Some(next)
}

impl Iterator for Elements {
    type Item = Symmetry;

    fn next(&mut self) -> Option<Symmetry> {
        match &mut self.inner {
            Inner::Single(element) => element.take(),
            Inner::Lexicographic(current) => {
                let answer = current.take()?;
                *current = next_lexicographic(&answer);
                Some(Symmetry::new(answer, false))
            }
            Inner::Span {
                generators,
                seen,
                queue,
            } => {
                let element = queue.pop_front()?;
                for generator in generators.iter() {
                    let product = element.compose(generator);
                    if seen.insert(product.permutation().to_vec()) {
                        queue.push_back(product);
                    }
                }
                Some(element)
            }
        }
    }
}
