use std::collections::HashSet;

use tracing::{debug, trace};

use crate::error::{Result, SymmetryError};
use crate::orbit::Orbit;
use crate::permutation::{self, Permutation};

// One level of a stabilizer chain.
// The generators all fix the base points of the earlier levels.
#[derive(Clone, Debug)]
pub struct Level {
    base_point: usize,
    generators: Vec<Permutation>,
    orbit: Orbit,

    // transversals[q] maps base_point to q, for q in the orbit.
    transversals: Vec<Option<Permutation>>,
}

impl Level {
    fn new(degree: usize, base_point: usize, generators: Vec<Permutation>) -> Level {
        let orbit = Orbit::build(degree, &generators, base_point);
        let transversals = orbit.transversals(&generators);
        Level {
            base_point,
            generators,
            orbit,
            transversals,
        }
    }

    fn add_generator(&mut self, degree: usize, generator: Permutation) {
        if self.generators.contains(&generator) {
            return;
        }
        self.generators.push(generator);
        self.orbit = Orbit::build(degree, &self.generators, self.base_point);
        self.transversals = self.orbit.transversals(&self.generators);
    }

    pub fn base_point(&self) -> usize {
        self.base_point
    }

    pub fn generators(&self) -> &[Permutation] {
        &self.generators
    }

    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    // A permutation in this level's group mapping the base point to point.
    pub fn transversal(&self, point: usize) -> Option<&Permutation> {
        self.transversals.get(point)?.as_ref()
    }

    // The Schreier generator for orbit point beta and generator x.
    // None when the transversal already accounts for x, so the generator is the identity.
    fn schreier_generator(&self, beta: usize, x: &[usize]) -> Option<Permutation> {
        let u_beta = self.transversal(beta)?;
        let u_image = self.transversal(x[beta])?;
        let moved = permutation::compose(u_beta, x);
        if moved == *u_image {
            return None;
        }
        Some(permutation::compose(&moved, &permutation::inverse(u_image)))
    }
}

// What the scan of a level found wrong with the chain.
enum Defect {
    // The residue fixes the base points before this level but is not accounted for
    // by the levels from here on.
    Residue(Permutation, usize),

    // The residue fixes every base point. It needs a new level, based at this point.
    NewBase(Permutation, usize),
}

// A base and strong generating set for a permutation group, built with Schreier-Sims.
// The group generated by level 0 is the whole group.
// The group generated by level i is the subgroup fixing the base points of levels 0..i.
// Every chain handed out by the constructors is complete: any group element strips
// to the identity.
#[derive(Clone, Debug)]
pub struct StabilizerChain {
    degree: usize,
    levels: Vec<Level>,
}

impl StabilizerChain {
    pub fn new(degree: usize, generators: &[Permutation]) -> Result<StabilizerChain> {
        StabilizerChain::with_base(degree, generators, &[])
    }

    // Like new, but the base starts with the provided points, in order.
    // A prefix point can be redundant, in which case its level has an orbit of size one.
    pub fn with_base(
        degree: usize,
        generators: &[Permutation],
        base_prefix: &[usize],
    ) -> Result<StabilizerChain> {
        for generator in generators {
            permutation::validate(degree, generator)?;
        }
        for &point in base_prefix {
            if point >= degree {
                return Err(SymmetryError::PointOutOfRange { point, degree });
            }
        }
        Ok(StabilizerChain::build(degree, generators, base_prefix))
    }

    // The inputs must already be valid permutations of this degree.
    pub(crate) fn build(
        degree: usize,
        generators: &[Permutation],
        base_prefix: &[usize],
    ) -> StabilizerChain {
        let mut seen = HashSet::new();
        let generators: Vec<Permutation> = generators
            .iter()
            .filter(|g| !permutation::is_identity(g))
            .filter(|g| seen.insert(g.to_vec()))
            .cloned()
            .collect();

        let mut base = vec![];
        for &point in base_prefix {
            if !base.contains(&point) {
                base.push(point);
            }
        }

        // Every generator has to move some base point, or stripping could not see it.
        for generator in &generators {
            if base.iter().all(|&b| generator[b] == b) {
                if let Some(point) = permutation::first_moved_point(generator) {
                    base.push(point);
                }
            }
        }

        let mut chain = StabilizerChain {
            degree,
            levels: vec![],
        };
        for i in 0..base.len() {
            let fixing: Vec<Permutation> = generators
                .iter()
                .filter(|g| base[..i].iter().all(|&b| g[b] == b))
                .cloned()
                .collect();
            chain.levels.push(Level::new(degree, base[i], fixing));
        }

        if !chain.levels.is_empty() {
            chain.complete();
        }
        debug!(
            degree,
            base = ?chain.base(),
            order = ?chain.order(),
            "built stabilizer chain"
        );
        chain
    }

    // Runs until every Schreier generator at every level strips to the identity.
    // Scans from the deepest level upward. When a level turns up a defect, the residue
    // is added to the levels it belongs to, and the scan moves back down to the deepest
    // level that changed.
    fn complete(&mut self) {
        let mut current = self.levels.len() - 1;
        loop {
            match self.find_defect(current) {
                None => {
                    if current == 0 {
                        break;
                    }
                    current -= 1;
                }
                Some(Defect::Residue(residue, stop)) => {
                    for level in current + 1..=stop {
                        self.levels[level].add_generator(self.degree, residue.clone());
                    }
                    current = stop;
                }
                Some(Defect::NewBase(residue, point)) => {
                    let stop = self.levels.len();
                    self.levels.push(Level::new(self.degree, point, vec![]));
                    for level in current + 1..=stop {
                        self.levels[level].add_generator(self.degree, residue.clone());
                    }
                    current = stop;
                }
            }
        }
    }

    // Checks the Schreier generators of one level against the levels below it.
    fn find_defect(&self, index: usize) -> Option<Defect> {
        let level = &self.levels[index];
        for &beta in level.orbit.points() {
            for x in &level.generators {
                let Some(schreier_generator) = level.schreier_generator(beta, x) else {
                    continue;
                };
                let (residue, stop) = self.strip_from(index + 1, schreier_generator);
                if stop < self.levels.len() {
                    trace!(level = index, stop, "residue stopped early");
                    return Some(Defect::Residue(residue, stop));
                }
                if let Some(point) = permutation::first_moved_point(&residue) {
                    trace!(level = index, point, "residue needs a new base point");
                    return Some(Defect::NewBase(residue, point));
                }
            }
        }
        None
    }

    // Strips the permutation through the levels starting at start.
    // Returns what is left, and the index of the level where stripping stopped.
    // If stripping got all the way through, the index is the number of levels.
    fn strip_from(&self, start: usize, mut g: Permutation) -> (Permutation, usize) {
        for (i, level) in self.levels.iter().enumerate().skip(start) {
            let image = g[level.base_point];
            match level.transversal(image) {
                Some(u) => g = permutation::compose(&g, &permutation::inverse(u)),
                None => return (g, i),
            }
        }
        (g, self.levels.len())
    }

    pub fn strip(&self, g: &[usize]) -> (Permutation, usize) {
        self.strip_from(0, g.to_vec())
    }

    // Whether g is an element of the group.
    pub fn contains(&self, g: &[usize]) -> bool {
        if g.len() != self.degree || !permutation::is_bijection(g) {
            return false;
        }
        let (residue, stop) = self.strip(g);
        stop == self.levels.len() && permutation::is_identity(&residue)
    }

    // The product of the orbit sizes, or None if that does not fit in a u128.
    pub fn order(&self) -> Option<u128> {
        self.levels
            .iter()
            .try_fold(1u128, |acc, level| acc.checked_mul(level.orbit.len() as u128))
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn base(&self) -> Vec<usize> {
        self.levels.iter().map(|level| level.base_point).collect()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    // All the generators used anywhere in the chain, without duplicates.
    pub fn strong_generators(&self) -> Vec<Permutation> {
        let mut seen = HashSet::new();
        let mut answer = vec![];
        for level in &self.levels {
            for g in &level.generators {
                if seen.insert(g.clone()) {
                    answer.push(g.clone());
                }
            }
        }
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::{identity, parse, rotation, transposition};

    fn chain(degree: usize, cycles: &[&str]) -> StabilizerChain {
        let generators: Vec<Permutation> =
            cycles.iter().map(|c| parse(degree, c).unwrap()).collect();
        StabilizerChain::new(degree, &generators).unwrap()
    }

    #[test]
    fn test_symmetric_group_order() {
        let c = StabilizerChain::new(5, &[transposition(5, 0, 1), rotation(5, 0, 5)]).unwrap();
        assert_eq!(c.order(), Some(120));
        let sizes: Vec<usize> = c.levels().iter().map(|l| l.orbit().len()).collect();
        assert_eq!(sizes.iter().product::<usize>(), 120);
    }

    #[test]
    fn test_transposition_membership() {
        let c = chain(4, &["(0 1)"]);
        assert_eq!(c.order(), Some(2));

        let (residue, stop) = c.strip(&[1, 0, 2, 3]);
        assert!(permutation::is_identity(&residue));
        assert_eq!(stop, c.len());
        assert!(c.contains(&[1, 0, 2, 3]));

        let (residue, _) = c.strip(&[0, 1, 3, 2]);
        assert!(!permutation::is_identity(&residue));
        assert!(!c.contains(&[0, 1, 3, 2]));
    }

    #[test]
    fn test_trivial_group() {
        let c = StabilizerChain::new(3, &[identity(3)]).unwrap();
        assert!(c.is_empty());
        assert_eq!(c.order(), Some(1));
        assert!(c.contains(&identity(3)));
        assert!(!c.contains(&[1, 0, 2]));

        let c = StabilizerChain::new(0, &[]).unwrap();
        assert_eq!(c.order(), Some(1));
        assert!(c.contains(&[]));
    }

    #[test]
    fn test_alternating_group() {
        // (0 1 2) and (1 2 3) generate A4
        let c = chain(4, &["(0 1 2)", "(1 2 3)"]);
        assert_eq!(c.order(), Some(12));
        assert!(c.contains(&parse(4, "(0 1)(2 3)").unwrap()));
        assert!(!c.contains(&parse(4, "(0 1)").unwrap()));
    }

    #[test]
    fn test_dihedral_group() {
        // Symmetries of a square
        let c = chain(4, &["(0 1 2 3)", "(1 3)"]);
        assert_eq!(c.order(), Some(8));
        assert!(c.contains(&parse(4, "(0 2)").unwrap()));
        assert!(c.contains(&parse(4, "(0 1)(2 3)").unwrap()));
        assert!(!c.contains(&parse(4, "(0 1)").unwrap()));
    }

    #[test]
    fn test_direct_product() {
        let c = chain(7, &["(0 1)", "(0 1 2)", "(3 4)", "(3 4 5 6)"]);
        assert_eq!(c.order(), Some(6 * 24));
        assert!(c.contains(&parse(7, "(0 2)(4 6)").unwrap()));
        assert!(!c.contains(&parse(7, "(2 3)").unwrap()));
    }

    #[test]
    fn test_larger_symmetric_group() {
        let c = StabilizerChain::new(10, &[transposition(10, 0, 1), rotation(10, 0, 10)]).unwrap();
        assert_eq!(c.order(), Some(3_628_800));
        assert!(c.contains(&parse(10, "(0 9 4)(2 7)").unwrap()));
    }

    #[test]
    fn test_order_overflow() {
        let c = StabilizerChain::new(35, &[transposition(35, 0, 1), rotation(35, 0, 35)]).unwrap();
        assert_eq!(c.order(), None);
        assert!(c.contains(&transposition(35, 7, 30)));
        assert!(!c.contains(&[0; 35]));
    }

    #[test]
    fn test_every_schreier_generator_strips() {
        let c = chain(6, &["(0 1 2 3 4 5)", "(0 2)"]);
        for (i, level) in c.levels().iter().enumerate() {
            for &beta in level.orbit().points() {
                for x in level.generators() {
                    if let Some(s) = level.schreier_generator(beta, x) {
                        let (residue, stop) = c.strip_from(i + 1, s);
                        assert_eq!(stop, c.len());
                        assert!(permutation::is_identity(&residue));
                    }
                }
            }
        }
    }

    #[test]
    fn test_with_base() {
        let generators = vec![transposition(4, 0, 1), rotation(4, 0, 4)];
        let c = StabilizerChain::with_base(4, &generators, &[3, 2]).unwrap();
        assert_eq!(&c.base()[..2], &[3, 2]);
        assert_eq!(c.order(), Some(24));

        // A redundant prefix point still gets its own level
        let c = StabilizerChain::with_base(4, &[transposition(4, 0, 1)], &[3]).unwrap();
        assert_eq!(c.base(), vec![3, 0]);
        assert_eq!(c.levels()[0].orbit().len(), 1);
        assert_eq!(c.order(), Some(2));
    }

    #[test]
    fn test_bad_input() {
        assert_eq!(
            StabilizerChain::new(3, &[vec![1, 0]]).unwrap_err(),
            SymmetryError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert!(matches!(
            StabilizerChain::new(3, &[vec![1, 1, 0]]),
            Err(SymmetryError::MalformedPermutation { .. })
        ));
        assert!(matches!(
            StabilizerChain::with_base(3, &[], &[5]),
            Err(SymmetryError::PointOutOfRange { point: 5, degree: 3 })
        ));
    }

    #[test]
    fn test_strong_generators() {
        let c = chain(4, &["(0 1)", "(0 1)", "(2 3)"]);
        let strong = c.strong_generators();
        assert_eq!(strong.len(), 2);
        assert_eq!(c.order(), Some(4));
    }
}
