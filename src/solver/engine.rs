// src/solver/engine.rs
use super::expand::CompiledQubo;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Starting temperature as a multiple of the largest single-flip change.
const INITIAL_TEMPERATURE_SCALE: f64 = 2.0;
/// Final temperature as a multiple of the smallest non-zero coupling.
const FINAL_TEMPERATURE_SCALE: f64 = 0.05;

/// Adjacency form of a QUBO used by both search strategies.
/// (Internal visibility)
pub(crate) struct SearchEngine {
    /// Diagonal coefficients.
    linear: Vec<f64>,
    /// Off-diagonal couplings, listed on both endpoints.
    neighbors: Vec<Vec<(usize, f64)>>,
    offset: f64,
}

impl SearchEngine {
    pub(crate) fn new(qubo: &CompiledQubo) -> Self {
        let n = qubo.len();
        let mut linear = vec![0.0; n];
        let mut neighbors = vec![Vec::new(); n];
        for (&(i, j), &coefficient) in qubo.terms() {
            if coefficient == 0.0 {
                continue;
            }
            if i == j {
                linear[i] += coefficient;
            } else {
                neighbors[i].push((j, coefficient));
                neighbors[j].push((i, coefficient));
            }
        }
        Self { linear, neighbors, offset: qubo.offset() }
    }

    pub(crate) fn len(&self) -> usize {
        self.linear.len()
    }

    pub(crate) fn energy(&self, state: &[bool]) -> f64 {
        let mut energy = self.offset;
        for (i, &on) in state.iter().enumerate() {
            if !on {
                continue;
            }
            energy += self.linear[i];
            // Each coupling counted once, from its lower endpoint.
            energy += self.neighbors[i].iter().filter(|(j, _)| *j > i && state[*j]).map(|(_, c)| c).sum::<f64>();
        }
        energy
    }

    /// Energy change from flipping variable `i`.
    fn delta(&self, state: &[bool], i: usize) -> f64 {
        let field = self.linear[i]
            + self.neighbors[i].iter().filter(|(j, _)| state[*j]).map(|(_, c)| c).sum::<f64>();
        if state[i] { -field } else { field }
    }

    /// Visits every assignment in Gray-code order, one flip per step.
    ///
    /// Ties keep the first minimum found, which is the one with the smallest
    /// Gray-code rank.
    pub(crate) fn exhaustive(&self) -> (Vec<bool>, f64) {
        let n = self.len();
        let mut state = vec![false; n];
        let mut energy = self.offset;
        let mut best = (state.clone(), energy);
        for step in 1u64..(1u64 << n) {
            let flip = step.trailing_zeros() as usize;
            energy += self.delta(&state, flip);
            state[flip] = !state[flip];
            if energy < best.1 {
                best = (state.clone(), energy);
            }
        }
        best
    }

    /// Metropolis annealing with a geometric cooling schedule.
    pub(crate) fn anneal(&self, seed: u64, sweeps: usize) -> (Vec<bool>, f64) {
        let n = self.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state: Vec<bool> = (0..n).map(|_| rng.random::<f64>() < 0.5).collect();
        let mut energy = self.energy(&state);
        let mut best = (state.clone(), energy);

        let (hot, cold) = self.temperature_range();
        let sweeps = sweeps.max(1);
        let cooling = if sweeps > 1 { (cold / hot).powf(1.0 / (sweeps - 1) as f64) } else { 1.0 };
        let mut temperature = hot;

        for _ in 0..sweeps {
            for i in 0..n {
                let delta = self.delta(&state, i);
                if delta <= 0.0 || rng.random::<f64>() < (-delta / temperature).exp() {
                    state[i] = !state[i];
                    energy += delta;
                    if energy < best.1 {
                        best = (state.clone(), energy);
                    }
                }
            }
            temperature *= cooling;
        }
        best
    }

    fn temperature_range(&self) -> (f64, f64) {
        let mut largest: f64 = 0.0;
        let mut smallest = f64::INFINITY;
        for i in 0..self.len() {
            let field = self.linear[i].abs() + self.neighbors[i].iter().map(|(_, c)| c.abs()).sum::<f64>();
            largest = largest.max(field);
            for c in std::iter::once(self.linear[i]).chain(self.neighbors[i].iter().map(|(_, c)| *c)) {
                if c != 0.0 {
                    smallest = smallest.min(c.abs());
                }
            }
        }
        if largest == 0.0 || !smallest.is_finite() {
            return (1.0, 1.0);
        }
        let hot = largest * INITIAL_TEMPERATURE_SCALE;
        let cold = (smallest * FINAL_TEMPERATURE_SCALE).min(hot);
        (hot, cold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TOLERANCE: f64 = 1e-9;

    #[test]
    fn exhaustive_finds_the_fallback_optimum() {
        let qubo = CompiledQubo::fallback();
        let engine = SearchEngine::new(&qubo);
        let (state, energy) = engine.exhaustive();
        assert!((engine.energy(&state) - energy).abs() < TEST_TOLERANCE);
        assert!((qubo.energy(&state) - energy).abs() < TEST_TOLERANCE);
        // Pairwise -4 rewards filling the board: every cell set.
        assert!(state.iter().all(|on| *on));
    }

    #[test]
    fn annealing_is_deterministic_per_seed() {
        let engine = SearchEngine::new(&CompiledQubo::fallback());
        assert_eq!(engine.anneal(7, 50), engine.anneal(7, 50));
    }

    #[test]
    fn annealing_reaches_the_exhaustive_optimum_on_small_problems() {
        let engine = SearchEngine::new(&CompiledQubo::fallback());
        let (_, exact) = engine.exhaustive();
        let (_, annealed) = engine.anneal(42, 200);
        assert!((annealed - exact).abs() < TEST_TOLERANCE);
    }
}
