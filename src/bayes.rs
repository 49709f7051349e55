//! Expected cost of a release under uncertainty in the host density.

use crate::batch::CostRecord;
use crate::engine::InitialPopulation;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashMap},
    f64::consts::PI,
};

/// Sample counts above this use Stirling's approximation of the factorial.
pub const STIRLING_THRESHOLD: u64 = 150;

/// A host density with its prior probability (not necessarily normalized).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityHypothesis {
    pub density: f64,
    pub probability: f64,
}

/// Number of hosts observed in a sampled area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub host_count: u64,
    pub area: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesCostRecord {
    pub predator_count: u64,
    pub sample_host_count: u64,
    pub sample_area: f64,
    pub expected_cost: f64,
}

/// Result of a Bayes cost evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum BayesOutcome {
    /// One record per candidate predator count.
    Complete(Vec<BayesCostRecord>),
    /// Populations missing from the cost table, sorted and without duplicates.
    Incomplete(Vec<InitialPopulation>),
}

impl BayesOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, BayesOutcome::Complete(_))
    }
}

/// Probability of observing `n` hosts in `area` for a host `density`.
pub fn poisson(n: u64, area: f64, density: f64) -> f64 {
    ln_poisson(n, area, density).exp()
}

fn ln_poisson(n: u64, area: f64, density: f64) -> f64 {
    let rate = density * area;
    if rate == 0.0 {
        return if n == 0 { 0.0 } else { f64::NEG_INFINITY };
    }
    if n <= STIRLING_THRESHOLD {
        ln_poisson_exact(n, rate)
    } else {
        ln_poisson_stirling(n, rate)
    }
}

fn ln_poisson_exact(n: u64, rate: f64) -> f64 {
    n as f64 * rate.ln() - rate - ln_factorial(n)
}

fn ln_poisson_stirling(n: u64, rate: f64) -> f64 {
    let n = n as f64;
    n * (rate / n).ln() - rate + n - 0.5 * (2.0 * PI * n).ln()
}

fn ln_factorial(n: u64) -> f64 {
    (2..=n).map(|k| (k as f64).ln()).sum()
}

/// Host count simulated for a density.
pub fn host_count(density: f64, density_scale: f64) -> u64 {
    (density * density_scale).round() as u64
}

/// Posterior expected cost of each candidate predator count given a sample.
///
/// The cost of each density hypothesis is looked up in `costs` by predator
/// count and scaled host count, the last matching record taking precedence.
/// If any required record is absent, no cost is computed.
///
/// # Errors
/// Returns an error if the sample is impossible under every density hypothesis
/// with a positive prior probability.
pub fn bayes_cost(
    prior: &[DensityHypothesis],
    sample: Sample,
    predator_counts: &[u64],
    density_scale: f64,
    costs: &[CostRecord],
) -> Result<BayesOutcome> {
    let table: HashMap<_, _> = costs
        .iter()
        .map(|rec| ((rec.predator_count, rec.host_count), rec.cost))
        .collect();

    let mut missing = BTreeSet::new();
    for &predator_count in predator_counts {
        for hyp in prior {
            let host_count = host_count(hyp.density, density_scale);
            if !table.contains_key(&(predator_count, host_count)) {
                missing.insert(InitialPopulation {
                    predator_count,
                    host_count,
                });
            }
        }
    }
    if !missing.is_empty() {
        return Ok(BayesOutcome::Incomplete(missing.into_iter().collect()));
    }

    // Unnormalized log posteriors are rescaled by their maximum, which cancels in the ratio.
    let ln_posts: Vec<_> = prior
        .iter()
        .map(|hyp| {
            if hyp.probability > 0.0 {
                ln_poisson(sample.host_count, sample.area, hyp.density) + hyp.probability.ln()
            } else {
                f64::NEG_INFINITY
            }
        })
        .collect();
    let max_ln_post = ln_posts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_ln_post == f64::NEG_INFINITY {
        bail!("sample {sample:?} is impossible under every density");
    }
    let weights: Vec<_> = ln_posts
        .iter()
        .map(|&ln_post| (ln_post - max_ln_post).exp())
        .collect();
    let norm: f64 = weights.iter().sum();

    let records = predator_counts
        .iter()
        .map(|&predator_count| {
            let weighted: f64 = prior
                .iter()
                .zip(&weights)
                .map(|(hyp, &weight)| {
                    let host_count = host_count(hyp.density, density_scale);
                    weight * table[&(predator_count, host_count)]
                })
                .sum();
            BayesCostRecord {
                predator_count,
                sample_host_count: sample.host_count,
                sample_area: sample.area,
                expected_cost: weighted / norm,
            }
        })
        .collect();

    Ok(BayesOutcome::Complete(records))
}

/// Keep, for every sample, the records with minimal expected cost.
pub fn min_bayes_cost(records: &[BayesCostRecord]) -> Vec<BayesCostRecord> {
    let mut samples: Vec<(u64, f64)> = Vec::new();
    for rec in records {
        let key = (rec.sample_host_count, rec.sample_area);
        if !samples.contains(&key) {
            samples.push(key);
        }
    }

    let mut min_records = Vec::new();
    for (host_count, area) in samples {
        let group: Vec<_> = records
            .iter()
            .filter(|rec| rec.sample_host_count == host_count && rec.sample_area == area)
            .collect();
        let min_cost = group
            .iter()
            .map(|rec| rec.expected_cost)
            .fold(f64::INFINITY, f64::min);
        min_records.extend(group.into_iter().filter(|rec| rec.expected_cost == min_cost));
    }
    min_records
}
