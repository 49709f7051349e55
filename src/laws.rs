//! Biological laws governing both species.

use crate::config::{LawsConfig, SpeciesParams};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::{Bernoulli, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two simulated species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Predator,
    Host,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Predator, Species::Host];

    pub fn name(self) -> &'static str {
        match self {
            Species::Predator => "predator",
            Species::Host => "host",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Laws of a single species with their sampling distributions.
#[derive(Debug, Clone)]
pub struct SpeciesLaws {
    params: SpeciesParams,
    male: Bernoulli,
    fertile: Bernoulli,
    random_death: Bernoulli,
    lifespan: Normal<f64>,
    offspring: Normal<f64>,
    initial_age: Uniform<u32>,
}

impl SpeciesLaws {
    pub fn new(params: SpeciesParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            male: Bernoulli::new(params.male_prob).context("invalid male probability")?,
            fertile: Bernoulli::new(params.fertility_ratio).context("invalid fertility ratio")?,
            random_death: Bernoulli::new(params.random_death_prob)
                .context("invalid random death probability")?,
            lifespan: Normal::new(params.lifespan_mean, params.lifespan_std_dev)
                .context("invalid lifespan distribution")?,
            offspring: Normal::new(params.offspring_mean, params.offspring_std_dev)
                .context("invalid offspring distribution")?,
            initial_age: Uniform::new_inclusive(params.initial_age_min, params.initial_age_max)
                .context("invalid initial age distribution")?,
            params,
        })
    }

    pub fn adult_age(&self) -> u32 {
        self.params.adult_age
    }

    pub fn egg_age(&self) -> u32 {
        self.params.egg_age
    }

    pub fn sample_male<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.male.sample(rng)
    }

    pub fn sample_fertile<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.fertile.sample(rng)
    }

    pub fn sample_random_death<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        self.random_death.sample(rng)
    }

    /// Rounded normal draw, floored at 1.
    pub fn sample_lifespan<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        round_to_count(self.lifespan.sample(rng)).max(1)
    }

    /// Rounded normal draw, floored at 0.
    pub fn sample_offspring<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        round_to_count(self.offspring.sample(rng))
    }

    /// Age of an agent present when the world is initialized.
    pub fn sample_initial_age<R: Rng + ?Sized>(&self, lifespan: u32, rng: &mut R) -> u32 {
        match self.params.initial_remaining_life {
            Some(remaining) => lifespan.saturating_sub(remaining),
            None => self.initial_age.sample(rng),
        }
    }
}

// Float-to-int casts saturate, so negative draws become 0.
fn round_to_count(val: f64) -> u32 {
    val.round() as u32
}

/// Immutable bundle of the laws of both species.
#[derive(Debug, Clone)]
pub struct LawSet {
    predator: SpeciesLaws,
    host: SpeciesLaws,
    predation_coef: f64,
}

impl LawSet {
    pub fn new(cfg: &LawsConfig) -> Result<Self> {
        Ok(Self {
            predator: SpeciesLaws::new(cfg.predator.clone()).context("invalid predator laws")?,
            host: SpeciesLaws::new(cfg.host.clone()).context("invalid host laws")?,
            predation_coef: cfg.predation_coef,
        })
    }

    pub fn species(&self, species: Species) -> &SpeciesLaws {
        match species {
            Species::Predator => &self.predator,
            Species::Host => &self.host,
        }
    }

    pub fn predation_coef(&self) -> f64 {
        self.predation_coef
    }
}
