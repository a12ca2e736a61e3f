use std::collections::HashSet;

use crate::error::{Result, SymmetryError};
use crate::permutation::{self, Permutation};

// Schreier vector entry for the point the orbit was grown from.
pub const SEED: i32 = -1;

// Schreier vector entry for a point outside the orbit.
pub const UNREACHED: i32 = -2;

// The orbit of a seed point under a list of generators.
// The points are stored in the order a breadth-first search discovers them.
// The Schreier vector is indexed by point. For an orbit point other than the seed,
// it holds the index of the generator that first reached it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Orbit {
    seed: usize,
    points: Vec<usize>,
    schreier: Vec<i32>,
}

// Every generator must be a permutation of this degree, and the point must be in range.
fn check_inputs(degree: usize, generators: &[Permutation], point: usize) -> Result<()> {
    for generator in generators {
        permutation::validate(degree, generator)?;
    }
    if point >= degree {
        return Err(SymmetryError::PointOutOfRange { point, degree });
    }
    Ok(())
}

impl Orbit {
    pub fn new(degree: usize, generators: &[Permutation], seed: usize) -> Result<Orbit> {
        check_inputs(degree, generators, seed)?;
        Ok(Orbit::build(degree, generators, seed))
    }

    // Like new, for inputs that are already known to be valid.
    pub(crate) fn build(degree: usize, generators: &[Permutation], seed: usize) -> Orbit {
        let mut schreier = vec![UNREACHED; degree];
        schreier[seed] = SEED;
        let mut points = vec![seed];

        // points doubles as the BFS queue
        let mut next = 0;
        while next < points.len() {
            let point = points[next];
            next += 1;
            for (k, generator) in generators.iter().enumerate() {
                let image = generator[point];
                if schreier[image] == UNREACHED {
                    schreier[image] = k as i32;
                    points.push(image);
                }
            }
        }

        Orbit {
            seed,
            points,
            schreier,
        }
    }

    pub fn seed(&self) -> usize {
        self.seed
    }

    pub fn points(&self) -> &[usize] {
        &self.points
    }

    pub fn schreier_vector(&self) -> &[i32] {
        &self.schreier
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn contains(&self, point: usize) -> bool {
        point < self.schreier.len() && self.schreier[point] != UNREACHED
    }

    // For every orbit point q, a permutation mapping the seed to q.
    // Indexed by point, None outside the orbit.
    // These agree with what decompose produces.
    // The generators must be the ones the orbit was built from.
    pub(crate) fn transversals(&self, generators: &[Permutation]) -> Vec<Option<Permutation>> {
        let degree = self.schreier.len();
        let inverses: Vec<Permutation> = generators.iter().map(|g| permutation::inverse(g)).collect();
        let mut answer: Vec<Option<Permutation>> = vec![None; degree];
        answer[self.seed] = Some(permutation::identity(degree));

        // Each point is discovered after the point it was reached from.
        for &point in &self.points[1..] {
            let k = self.schreier[point] as usize;
            let previous = inverses[k][point];
            let u = match &answer[previous] {
                Some(u) => permutation::compose(u, &generators[k]),
                None => continue,
            };
            answer[point] = Some(u);
        }
        answer
    }
}

// The orbit of point, as discovered by a breadth-first search.
pub fn orbit(degree: usize, generators: &[Permutation], point: usize) -> Result<Vec<usize>> {
    Ok(Orbit::new(degree, generators, point)?.points)
}

pub fn schreier_vector(
    degree: usize,
    generators: &[Permutation],
    point: usize,
) -> Result<Vec<i32>> {
    Ok(Orbit::new(degree, generators, point)?.schreier)
}

// Walks the Schreier vector back from point to the seed.
// Returns the generator indices in the order they should be applied, so that applying
// them in sequence to the seed lands on point.
// None if point is not in the orbit.
pub fn decompose(
    generators: &[Permutation],
    schreier_vector: &[i32],
    point: usize,
) -> Option<Vec<usize>> {
    if point >= schreier_vector.len() || schreier_vector[point] == UNREACHED {
        return None;
    }
    let mut path = vec![];
    let mut current = point;
    while schreier_vector[current] != SEED {
        // A path longer than the degree means the vector does not belong to these generators
        if path.len() >= schreier_vector.len() {
            return None;
        }
        let k = usize::try_from(schreier_vector[current]).ok()?;
        path.push(k);
        current = generators.get(k)?.iter().position(|&image| image == current)?;
        if current >= schreier_vector.len() {
            return None;
        }
    }
    path.reverse();
    Some(path)
}

// A permutation mapping the seed of the Schreier vector to point.
// Ok(None) if point is not in the orbit.
pub fn transversal(
    degree: usize,
    generators: &[Permutation],
    schreier_vector: &[i32],
    point: usize,
) -> Result<Option<Permutation>> {
    for generator in generators {
        permutation::validate(degree, generator)?;
    }
    let Some(path) = decompose(generators, schreier_vector, point) else {
        return Ok(None);
    };
    Ok(Some(path.iter().fold(permutation::identity(degree), |u, &k| {
        permutation::compose(&u, &generators[k])
    })))
}

// Schreier's lemma.
// For every orbit point b and generator x, u(b) x u(x(b))^-1 fixes the seed, where u is
// the transversal. Together these generate the stabilizer of the seed in the group
// generated by the generators.
// Returns the Schreier vector along with the non-identity stabilizer generators, without
// duplicates. The generating set may still be redundant.
pub fn orbit_stabilizer(
    degree: usize,
    generators: &[Permutation],
    point: usize,
) -> Result<(Vec<i32>, Vec<Permutation>)> {
    let orbit = Orbit::new(degree, generators, point)?;
    let transversals = orbit.transversals(generators);

    let mut seen = HashSet::new();
    let mut stabilizer = vec![];
    for &beta in orbit.points() {
        for x in generators {
            let (Some(u_beta), Some(u_image)) = (&transversals[beta], &transversals[x[beta]])
            else {
                continue;
            };
            let moved = permutation::compose(u_beta, x);
            if moved == *u_image {
                // The transversal already predicts this step
                continue;
            }
            let schreier_generator = permutation::compose(&moved, &permutation::inverse(u_image));
            if seen.insert(schreier_generator.clone()) {
                stabilizer.push(schreier_generator);
            }
        }
    }
    Ok((orbit.schreier, stabilizer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permutation::{apply, parse};

    fn gens(degree: usize, cycles: &[&str]) -> Vec<Permutation> {
        cycles.iter().map(|c| parse(degree, c).unwrap()).collect()
    }

    #[test]
    fn test_orbit_of_disjoint_cycles() {
        let g = gens(6, &["(0 1 2)", "(3 4)"]);
        assert_eq!(orbit(6, &g, 0).unwrap(), vec![0, 1, 2]);
        assert_eq!(orbit(6, &g, 4).unwrap(), vec![4, 3]);
        assert_eq!(orbit(6, &g, 5).unwrap(), vec![5]);
    }

    #[test]
    fn test_schreier_vector_sentinels() {
        let g = gens(5, &["(0 1)", "(1 2)"]);
        let sv = schreier_vector(5, &g, 0).unwrap();
        assert_eq!(sv, vec![SEED, 0, 1, UNREACHED, UNREACHED]);
    }

    #[test]
    fn test_decompose_and_transversal() {
        let g = gens(5, &["(0 1)", "(1 2)", "(2 3)"]);
        let sv = schreier_vector(5, &g, 0).unwrap();
        assert_eq!(decompose(&g, &sv, 0), Some(vec![]));
        assert_eq!(decompose(&g, &sv, 3), Some(vec![0, 1, 2]));
        assert_eq!(decompose(&g, &sv, 4), None);

        for q in 0..4 {
            let u = transversal(5, &g, &sv, q).unwrap().unwrap();
            assert_eq!(apply(&u, 0), q);
        }
        assert_eq!(transversal(5, &g, &sv, 4), Ok(None));
    }

    #[test]
    fn test_transversals_agree_with_decompose() {
        let g = gens(6, &["(0 1 2 3 4 5)", "(0 1)"]);
        let o = Orbit::new(6, &g, 2).unwrap();
        let table = o.transversals(&g);
        for &q in o.points() {
            let expected = transversal(6, &g, o.schreier_vector(), q).unwrap().unwrap();
            assert_eq!(table[q].as_ref(), Some(&expected));
        }
    }

    #[test]
    fn test_orbit_stabilizer_of_s3() {
        let g = gens(3, &["(0 1)", "(0 1 2)"]);
        let (sv, stab) = orbit_stabilizer(3, &g, 0).unwrap();
        assert!(sv.iter().all(|&s| s != UNREACHED));
        assert!(!stab.is_empty());
        for s in &stab {
            assert_eq!(s[0], 0);
            assert!(!permutation::is_identity(s));
        }
        // The stabilizer of 0 in S3 is generated by (1 2)
        assert!(stab.contains(&parse(3, "(1 2)").unwrap()));
    }

    #[test]
    fn test_orbit_stabilizer_of_cyclic_group() {
        // A regular action has trivial point stabilizers
        let g = gens(4, &["(0 1 2 3)"]);
        let (sv, stab) = orbit_stabilizer(4, &g, 1).unwrap();
        assert_eq!(sv[1], SEED);
        assert!(stab.is_empty());
    }

    #[test]
    fn test_orbit_contains() {
        let g = gens(4, &["(0 1)"]);
        let o = Orbit::new(4, &g, 1).unwrap();
        assert!(o.contains(0));
        assert!(o.contains(1));
        assert!(!o.contains(2));
        assert!(!o.contains(9));
        assert_eq!(o.len(), 2);
        assert_eq!(o.seed(), 1);
    }

    #[test]
    fn test_bad_orbit_inputs() {
        let g = gens(3, &["(0 1)"]);
        assert_eq!(
            schreier_vector(3, &g, 3),
            Err(SymmetryError::PointOutOfRange {
                point: 3,
                degree: 3
            })
        );
        assert_eq!(
            orbit_stabilizer(4, &g, 0),
            Err(SymmetryError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            Orbit::new(3, &[vec![0, 0, 1]], 0),
            Err(SymmetryError::MalformedPermutation { .. })
        ));
        assert!(orbit(0, &[], 0).is_err());
        assert!(transversal(4, &g, &[SEED, 0, UNREACHED, UNREACHED], 1).is_err());
    }

    #[test]
    fn test_decompose_rejects_foreign_vectors() {
        let g = gens(3, &["(0 1)"]);
        // Generator index out of range
        assert_eq!(decompose(&g, &[SEED, 4, UNREACHED], 1), None);
        // No path back to a seed
        assert_eq!(decompose(&g, &[0, 0, UNREACHED], 1), None);
        assert_eq!(decompose(&g, &[SEED, 0], 5), None);
    }
}
