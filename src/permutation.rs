use std::sync::{Arc, Mutex, PoisonError};

use bitvec::prelude::*;

use crate::error::{Result, SymmetryError};

// A permutation is represented in "one-line" form.
// Specifically, it is a vector v where v[i] = j means that the permutation maps i to j.
pub type Permutation = Vec<usize>;

// Identities of degree below this are cached by shared_identity.
pub const IDENTITY_CACHE_LIMIT: usize = 32;

// Indexed by degree. Populated lazily, under the lock.
static IDENTITY_CACHE: Mutex<Vec<Option<Arc<[usize]>>>> = Mutex::new(Vec::new());

fn fresh_identity(degree: usize) -> Permutation {
    (0..degree).collect()
}

// An owned identity. Small degrees are copied out of the cache.
pub fn identity(degree: usize) -> Permutation {
    if degree >= IDENTITY_CACHE_LIMIT {
        return fresh_identity(degree);
    }
    shared_identity(degree).to_vec()
}

// The identity of a given degree, shared across callers when the degree is small.
// Larger degrees get a fresh allocation every time.
pub fn shared_identity(degree: usize) -> Arc<[usize]> {
    if degree >= IDENTITY_CACHE_LIMIT {
        return fresh_identity(degree).into();
    }
    let mut cache = IDENTITY_CACHE
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if cache.len() <= degree {
        cache.resize(degree + 1, None);
    }
    cache[degree]
        .get_or_insert_with(|| fresh_identity(degree).into())
        .clone()
}

pub fn apply(permutation: &[usize], item: usize) -> usize {
    permutation[item]
}

// Applies first, then second.
// So compose(first, second)[i] = second[first[i]].
pub fn compose(first: &[usize], second: &[usize]) -> Permutation {
    assert_eq!(first.len(), second.len());
    first.iter().map(|&i| second[i]).collect()
}

pub fn inverse(permutation: &[usize]) -> Permutation {
    let mut result = vec![0; permutation.len()];
    for (i, &j) in permutation.iter().enumerate() {
        result[j] = i;
    }
    result
}

pub fn is_identity(permutation: &[usize]) -> bool {
    permutation.iter().enumerate().all(|(i, &j)| i == j)
}

// Every value in 0..n appears exactly once.
pub fn is_bijection(permutation: &[usize]) -> bool {
    let n = permutation.len();
    let mut seen = bitvec![0; n];
    for &j in permutation {
        if j >= n || seen.replace(j, true) {
            return false;
        }
    }
    true
}

// Checks that this is a valid permutation of the given degree.
pub fn validate(degree: usize, permutation: &[usize]) -> Result<()> {
    if permutation.len() != degree {
        return Err(SymmetryError::DimensionMismatch {
            expected: degree,
            actual: permutation.len(),
        });
    }
    if !is_bijection(permutation) {
        return Err(SymmetryError::MalformedPermutation {
            permutation: permutation.to_vec(),
        });
    }
    Ok(())
}

// The points that the permutation moves, in increasing order.
pub fn support(permutation: &[usize]) -> Vec<usize> {
    permutation
        .iter()
        .enumerate()
        .filter(|(i, j)| i != *j)
        .map(|(i, _)| i)
        .collect()
}

pub fn first_moved_point(permutation: &[usize]) -> Option<usize> {
    permutation.iter().enumerate().position(|(i, &j)| i != j)
}

pub fn transposition(degree: usize, a: usize, b: usize) -> Permutation {
    let mut result = identity(degree);
    result.swap(a, b);
    result
}

// The cycle start -> start + 1 -> ... -> start + len - 1 -> start.
pub fn rotation(degree: usize, start: usize, len: usize) -> Permutation {
    let mut result = identity(degree);
    for i in 0..len {
        result[start + i] = start + (i + 1) % len;
    }
    result
}

// Parses a cycle in the math-standard (1 2 3) form, except it's indexed to start at 0.
fn parse_cycle(degree: usize, s: &str) -> Result<Permutation> {
    let s = s.replace(&['(', ')'], " ");

    let mut items = vec![];
    for word in s.split_whitespace() {
        let item: usize = word
            .parse()
            .map_err(|_| SymmetryError::InvalidCycleNotation(s.trim().to_string()))?;
        if item >= degree {
            return Err(SymmetryError::PointOutOfRange {
                point: item,
                degree,
            });
        }
        items.push(item);
    }

    let mut result = identity(degree);
    for i in 0..items.len() {
        let j = (i + 1) % items.len();
        result[items[i]] = items[j];
    }
    validate(degree, &result)?;
    Ok(result)
}

// Parses a permutation represented as a composition of cycles.
// The cycles are applied left to right, so "(0 1)(1 2)" sends 0 to 2.
pub fn parse(degree: usize, s: &str) -> Result<Permutation> {
    let s = s.trim();
    if !s.is_empty() && !s.starts_with('(') {
        return Err(SymmetryError::InvalidCycleNotation(s.to_string()));
    }
    let mut result = identity(degree);
    for cycle in s.split('(').skip(1) {
        if !cycle.trim_end().ends_with(')') {
            return Err(SymmetryError::InvalidCycleNotation(s.to_string()));
        }
        let cycle = parse_cycle(degree, cycle)?;
        result = compose(&result, &cycle);
    }
    Ok(result)
}

// The inverse of parse. Fixed points are left out, and the identity is "()".
pub fn to_cycle_string(permutation: &[usize]) -> String {
    let mut visited = bitvec![0; permutation.len()];
    let mut answer = String::new();
    for start in 0..permutation.len() {
        if visited[start] || permutation[start] == start {
            continue;
        }
        let mut cycle = vec![];
        let mut i = start;
        while !visited[i] {
            visited.set(i, true);
            cycle.push(i.to_string());
            i = permutation[i];
        }
        answer.push('(');
        answer.push_str(&cycle.join(" "));
        answer.push(')');
    }
    if answer.is_empty() {
        answer.push_str("()");
    }
    answer
}
