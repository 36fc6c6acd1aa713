//! Shared fixtures: a multi-objective 0/1 knapsack and its operators.
#![allow(dead_code)]

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use u_vns::{random_index, NeighborhoodOperator, Neighbors, Problem, Solution};

pub type Bits = Vec<u8>;

/// Installs a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Multi-objective knapsack. Infeasible selections score the negated
/// profits so that any feasible selection dominates them.
pub struct Knapsack {
    pub weights: Vec<f64>,
    /// `profits[item][objective]`
    pub profits: Vec<Vec<f64>>,
    pub capacity: f64,
}

impl Knapsack {
    pub fn scenario() -> Self {
        Self {
            weights: vec![2.0, 3.0, 4.0, 5.0],
            profits: vec![
                vec![10.0, 5.0],
                vec![8.0, 12.0],
                vec![15.0, 7.0],
                vec![6.0, 18.0],
            ],
            capacity: 7.0,
        }
    }

    /// Deterministic pseudo-random instance with `n` items and two objectives.
    pub fn generated(n: usize) -> Self {
        let weights = (0..n).map(|i| ((i * 7) % 11 + 1) as f64).collect::<Vec<_>>();
        let profits = (0..n)
            .map(|i| vec![((i * 5) % 13 + 1) as f64, ((i * 3) % 17 + 1) as f64])
            .collect();
        let capacity = weights.iter().sum::<f64>() / 2.0;
        Self {
            weights,
            profits,
            capacity,
        }
    }

    pub fn weight(&self, bits: &Bits) -> f64 {
        bits.iter()
            .zip(&self.weights)
            .map(|(&b, w)| b as f64 * w)
            .sum()
    }

    pub fn is_feasible(&self, bits: &Bits) -> bool {
        self.weight(bits) <= self.capacity
    }

    pub fn into_problem(self) -> Arc<Problem<Bits>> {
        let n = self.weights.len();
        let objectives = self.profits[0].len();
        let knapsack = Arc::new(self);

        let mut builder = Problem::builder(move |_rng| vec![0u8; n]).with_distance(hamming);
        for j in 0..objectives {
            let k = Arc::clone(&knapsack);
            builder = builder.with_objective(move |bits: &Bits| {
                let profit: f64 = bits
                    .iter()
                    .zip(&k.profits)
                    .map(|(&b, p)| b as f64 * p[j])
                    .sum();
                if k.is_feasible(bits) {
                    profit
                } else {
                    -profit
                }
            });
        }
        builder.build().expect("knapsack has objectives")
    }
}

pub fn hamming(a: &Bits, b: &Bits) -> f64 {
    a.iter().zip(b).filter(|(x, y)| x != y).count() as f64
}

/// Adds or removes a single item.
pub struct AddRemove;

impl NeighborhoodOperator<Bits> for AddRemove {
    fn neighbors<'a>(&'a self, solution: &'a Solution<Bits>, rng: &'a mut dyn RngCore) -> Neighbors<'a, Bits> {
        let mut order: Vec<usize> = (0..solution.data().len()).collect();
        order.shuffle(&mut *rng);
        Box::new(order.into_iter().map(move |i| {
            let mut bits = solution.data().clone();
            bits[i] ^= 1;
            solution.variant(bits)
        }))
    }
}

/// Swaps one selected item for one unselected item.
pub struct Swap;

impl NeighborhoodOperator<Bits> for Swap {
    fn neighbors<'a>(&'a self, solution: &'a Solution<Bits>, _rng: &'a mut dyn RngCore) -> Neighbors<'a, Bits> {
        let bits = solution.data();
        let selected: Vec<usize> = (0..bits.len()).filter(|&i| bits[i] == 1).collect();
        let unselected: Vec<usize> = (0..bits.len()).filter(|&i| bits[i] == 0).collect();
        Box::new(selected.into_iter().flat_map(move |out| {
            unselected.clone().into_iter().map(move |inn| {
                let mut next = solution.data().clone();
                next[out] = 0;
                next[inn] = 1;
                solution.variant(next)
            })
        }))
    }
}

/// Randomly adds or removes an item `k` times; no-ops when impossible.
pub fn shake_add_remove(solution: &Solution<Bits>, k: usize, rng: &mut dyn RngCore) -> Solution<Bits> {
    let mut bits = solution.data().clone();
    for _ in 0..k {
        let target = if rng.random_bool(0.5) { 0 } else { 1 };
        let pool: Vec<usize> = (0..bits.len()).filter(|&i| bits[i] == target).collect();
        if let Some(i) = random_index(&mut *rng, pool.len()) {
            bits[pool[i]] = 1 - target;
        }
    }
    solution.variant(bits)
}
