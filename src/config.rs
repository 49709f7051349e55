use crate::batch::OutputMode;
use crate::bayes::{DensityHypothesis, Sample};
use crate::engine::InitialPopulation;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seed of the master random number generator (OS entropy if absent).
    pub seed: Option<u64>,

    /// Biological laws of both species.
    pub laws: LawsConfig,

    /// Unit costs used to evaluate a log.
    pub costs: CostsConfig,

    /// Batch execution parameters.
    pub batch: BatchConfig,

    /// Bayesian cost parameters (optional).
    pub bayes: Option<BayesConfig>,
}

/// Biological parameters of a single species.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpeciesParams {
    /// Probability of an agent being male.
    pub male_prob: f64,
    /// Mean of the lifespan distribution.
    pub lifespan_mean: f64,
    /// Standard deviation of the lifespan distribution.
    pub lifespan_std_dev: f64,
    /// Minimum initial age (inclusive).
    pub initial_age_min: u32,
    /// Maximum initial age (inclusive).
    pub initial_age_max: u32,
    /// Remaining days of life of every initial agent (overrides initial ages).
    #[serde(default)]
    pub initial_remaining_life: Option<u32>,
    /// Probability of an agent being fertile.
    pub fertility_ratio: f64,
    /// Mean of the offspring distribution.
    pub offspring_mean: f64,
    /// Standard deviation of the offspring distribution.
    pub offspring_std_dev: f64,
    /// Age from which an agent is an adult.
    pub adult_age: u32,
    /// Age up to which an agent is an egg.
    pub egg_age: u32,
    /// Daily probability of a random death.
    pub random_death_prob: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LawsConfig {
    pub predator: SpeciesParams,
    pub host: SpeciesParams,
    /// Scales the ratio of juvenile hosts to predators into a predation probability.
    pub predation_coef: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CostsConfig {
    pub predator_unit_cost: f64,
    pub host_unit_cost: f64,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of simulated days per run.
    pub n_steps: usize,
    /// Number of runs per batch.
    pub n_runs: usize,

    pub log_output: OutputMode,
    pub cost_output: OutputMode,

    /// Initial populations to simulate, one batch each.
    pub populations: Vec<InitialPopulation>,
    /// Half-open range of populations to simulate (all if absent).
    #[serde(default)]
    pub rows: Option<[usize; 2]>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BayesConfig {
    /// Candidate numbers of released predators.
    pub predator_counts: Vec<u64>,
    /// Converts a host density into an initial host count.
    pub density_scale: f64,
    /// Discrete prior over host densities.
    pub prior: Vec<DensityHypothesis>,
    /// Field observations to evaluate.
    pub samples: Vec<Sample>,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.laws
            .predator
            .validate()
            .context("invalid predator laws")?;
        self.laws.host.validate().context("invalid host laws")?;
        check_num(self.laws.predation_coef, 0.0..).context("invalid predation coefficient")?;

        check_num(self.costs.predator_unit_cost, 0.0..).context("invalid predator unit cost")?;
        check_num(self.costs.host_unit_cost, 0.0..).context("invalid host unit cost")?;

        check_num(self.batch.n_steps, 0..1_000_000).context("invalid number of steps")?;
        check_num(self.batch.n_runs, 1..1_000_000).context("invalid number of runs")?;
        if let Some([start, end]) = self.batch.rows {
            check_num(start, 0..=end).context("invalid start row")?;
            check_num(end, start..=self.batch.populations.len()).context("invalid end row")?;
        }

        if let Some(bayes) = &self.bayes {
            bayes.validate().context("invalid bayes parameters")?;
        }

        Ok(())
    }
}

impl SpeciesParams {
    pub fn validate(&self) -> Result<()> {
        check_prob(self.male_prob).context("invalid male probability")?;
        check_num(self.lifespan_mean, 0.0..).context("invalid lifespan mean")?;
        check_num(self.lifespan_std_dev, 0.0..).context("invalid lifespan standard deviation")?;
        check_num(self.initial_age_min, 0..=self.initial_age_max)
            .context("invalid minimum initial age")?;
        check_prob(self.fertility_ratio).context("invalid fertility ratio")?;
        check_num(self.offspring_mean, 0.0..).context("invalid offspring mean")?;
        check_num(self.offspring_std_dev, 0.0..)
            .context("invalid offspring standard deviation")?;
        check_prob(self.random_death_prob).context("invalid random death probability")?;
        Ok(())
    }
}

impl BayesConfig {
    fn validate(&self) -> Result<()> {
        if self.predator_counts.is_empty() {
            bail!("at least one predator count is required");
        }
        check_num(self.density_scale, 0.0..).context("invalid density scale")?;

        if self.prior.is_empty() {
            bail!("prior must have at least one density");
        }
        for (i_hyp, hyp) in self.prior.iter().enumerate() {
            check_num(hyp.density, 0.0..).with_context(|| format!("invalid density {i_hyp}"))?;
            check_num(hyp.probability, 0.0..)
                .with_context(|| format!("invalid probability {i_hyp}"))?;
        }
        let sum: f64 = self.prior.iter().map(|hyp| hyp.probability).sum();
        if sum <= 0.0 {
            bail!("prior probabilities must have a positive sum, but sum to {sum}");
        }

        for (i_sample, sample) in self.samples.iter().enumerate() {
            if sample.area <= 0.0 {
                bail!("sample {i_sample} area must be positive, but is {}", sample.area);
            }
        }

        Ok(())
    }
}

pub fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

pub fn check_prob(prob: f64) -> Result<()> {
    check_num(prob, 0.0..=1.0)
}
