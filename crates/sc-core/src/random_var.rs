//! Bounded discrete random variables
//!
//! A [`RandomVar`] is an explicit distribution over a contiguous integer
//! range. To-hit and damage formulas are expressed with it so expected values
//! and probabilities can be queried without rolling.

use std::collections::BTreeMap;
use std::ops::Add;

use crate::rng::GameRng;

/// Discrete distribution over `start..start + weights.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomVar {
    start: i32,
    weights: Vec<u64>,
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl RandomVar {
    /// Always `value`.
    pub fn constant(value: i32) -> Self {
        Self {
            start: value,
            weights: vec![1],
        }
    }

    /// Uniform over `lo..=hi`.
    pub fn uniform(lo: i32, hi: i32) -> Self {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        Self {
            start: lo,
            weights: vec![1; (hi - lo + 1) as usize],
        }
    }

    /// Distribution of `GameRng::random2(n)`.
    pub fn random2(n: i32) -> Self {
        if n <= 0 {
            Self::constant(0)
        } else {
            Self::uniform(0, n - 1)
        }
    }

    /// Distribution of `GameRng::roll_dice(num, size)`.
    pub fn roll_dice(num: i32, size: i32) -> Self {
        if num <= 0 || size <= 0 {
            return Self::constant(0);
        }
        let die = Self::uniform(1, size);
        (1..num).fold(die.clone(), |acc, _| acc + die.clone())
    }

    /// Build from explicit `(value, weight)` pairs. Zero-weight input yields
    /// the constant zero.
    pub fn from_weights(pairs: impl IntoIterator<Item = (i32, u64)>) -> Self {
        let mut grouped: BTreeMap<i32, u64> = BTreeMap::new();
        for (v, w) in pairs {
            if w > 0 {
                *grouped.entry(v).or_insert(0) += w;
            }
        }
        let (Some((&lo, _)), Some((&hi, _))) = (grouped.first_key_value(), grouped.last_key_value())
        else {
            return Self::constant(0);
        };
        let mut weights = vec![0; (hi - lo + 1) as usize];
        for (v, w) in grouped {
            weights[(v - lo) as usize] = w;
        }
        Self { start: lo, weights }.reduced()
    }

    fn reduced(mut self) -> Self {
        let g = self.weights.iter().fold(0, |acc, &w| gcd(acc, w));
        if g > 1 {
            for w in &mut self.weights {
                *w /= g;
            }
        }
        self
    }

    pub fn min(&self) -> i32 {
        self.start
    }

    pub fn max(&self) -> i32 {
        self.start + self.weights.len() as i32 - 1
    }

    pub fn total_weight(&self) -> u64 {
        self.weights.iter().sum()
    }

    /// Iterate `(value, weight)` pairs with non-zero weight.
    pub fn outcomes(&self) -> impl Iterator<Item = (i32, u64)> + '_ {
        self.weights
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > 0)
            .map(move |(i, &w)| (self.start + i as i32, w))
    }

    pub fn expected(&self) -> f64 {
        let total = self.total_weight() as f64;
        self.outcomes()
            .map(|(v, w)| v as f64 * w as f64)
            .sum::<f64>()
            / total
    }

    /// Probability that `pred` holds for a sample.
    pub fn probability(&self, pred: impl Fn(i32) -> bool) -> f64 {
        let total = self.total_weight() as f64;
        let hits: u64 = self
            .outcomes()
            .filter(|(v, _)| pred(*v))
            .map(|(_, w)| w)
            .sum();
        hits as f64 / total
    }

    /// Push every outcome through `f`.
    pub fn map(&self, f: impl Fn(i32) -> i32) -> Self {
        Self::from_weights(self.outcomes().map(|(v, w)| (f(v), w)))
    }

    /// Replace each outcome with a whole distribution and mix the results.
    ///
    /// Weights are scaled so each source outcome keeps its probability mass.
    pub fn flat_map(&self, f: impl Fn(i32) -> RandomVar) -> Self {
        let parts: Vec<(u64, RandomVar)> = self.outcomes().map(|(v, w)| (w, f(v))).collect();
        let common = parts
            .iter()
            .fold(1u64, |acc, (_, rv)| {
                let t = rv.total_weight();
                acc / gcd(acc, t) * t
            });
        let mut pairs = Vec::new();
        for (w, rv) in &parts {
            let scale = common / rv.total_weight();
            pairs.extend(rv.outcomes().map(|(v, inner)| (v, w * inner * scale)));
        }
        Self::from_weights(pairs)
    }

    /// Sample using the session RNG. Consumes one draw.
    pub fn roll(&self, rng: &mut GameRng) -> i32 {
        let total = self.total_weight();
        let mut pick = if total <= i32::MAX as u64 {
            rng.random2(total as i32) as u64
        } else {
            (rng.random2(i32::MAX) as u64).saturating_mul(total) / i32::MAX as u64
        };
        for (v, w) in self.outcomes() {
            if pick < w {
                return v;
            }
            pick -= w;
        }
        self.max()
    }
}

impl Add for RandomVar {
    type Output = RandomVar;

    /// Distribution of the sum of two independent samples.
    fn add(self, rhs: RandomVar) -> RandomVar {
        let mut weights = vec![0u64; self.weights.len() + rhs.weights.len() - 1];
        for (i, &a) in self.weights.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in rhs.weights.iter().enumerate() {
                weights[i + j] += a * b;
            }
        }
        RandomVar {
            start: self.start + rhs.start,
            weights,
        }
        .reduced()
    }
}

impl Add<i32> for RandomVar {
    type Output = RandomVar;

    fn add(mut self, rhs: i32) -> RandomVar {
        self.start += rhs;
        self
    }
}
