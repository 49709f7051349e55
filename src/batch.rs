//! Batches of independent simulation runs and their costs.

use crate::census::{Counter, Log};
use crate::config::CostsConfig;
use crate::engine::{InitialPopulation, Population};
use crate::laws::{LawSet, Species};
use crate::stats::{LogAccumulator, simpson};
use crate::store::Store;
use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Which results of a batch are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every run and the batch mean.
    All,
    /// The batch mean only.
    Mean,
    None,
}

impl OutputMode {
    pub fn keeps_runs(self) -> bool {
        self == OutputMode::All
    }

    pub fn keeps_mean(self) -> bool {
        self != OutputMode::None
    }
}

/// Cost of a single run (`run_count == 1`) or of a batch mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    pub predator_count: u64,
    pub host_count: u64,
    pub step_count: usize,
    pub run_count: usize,
    pub cost: f64,
}

pub struct BatchResult {
    pub mean_log: Log,
    /// Logs of every run, kept only if runs are logged.
    pub run_logs: Vec<Log>,
    /// Cost records selected by the cost output mode.
    pub costs: Vec<CostRecord>,
}

pub struct BatchRunner<'a> {
    laws: &'a LawSet,
    costs: CostsConfig,
    log_output: OutputMode,
    cost_output: OutputMode,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        laws: &'a LawSet,
        costs: CostsConfig,
        log_output: OutputMode,
        cost_output: OutputMode,
    ) -> Self {
        Self {
            laws,
            costs,
            log_output,
            cost_output,
        }
    }

    /// Run `n_runs` independent simulations of `n_steps` days and average their logs.
    ///
    /// Each run draws from its own generator spawned from `rng`.
    pub fn run_batch(
        &self,
        init: InitialPopulation,
        n_steps: usize,
        n_runs: usize,
        rng: &mut ChaCha12Rng,
    ) -> Result<BatchResult> {
        if n_runs == 0 {
            bail!("number of runs must be positive");
        }

        let mut acc = LogAccumulator::new(n_steps + 1);
        let mut run_logs = Vec::new();
        let mut costs = Vec::new();

        for i_run in 0..n_runs {
            let run_rng = ChaCha12Rng::from_rng(rng);
            let log = Population::new(self.laws, init, run_rng).run(n_steps);
            acc.add(&log)
                .with_context(|| format!("failed to accumulate run {i_run}"))?;

            if self.cost_output.keeps_runs() {
                costs.push(self.cost_record(init, &log, n_steps, 1));
            }
            if self.log_output.keeps_runs() {
                run_logs.push(log);
            }

            let progress = 100.0 * (i_run + 1) as f64 / n_runs as f64;
            log::debug!("completed {progress:06.2}% of {init:?}");
        }

        let mean_log = acc.mean();
        if self.cost_output.keeps_mean() {
            costs.push(self.cost_record(init, &mean_log, n_steps, n_runs));
        }

        Ok(BatchResult {
            mean_log,
            run_logs,
            costs,
        })
    }

    /// Run one batch per selected initial population, persisting logs and costs.
    ///
    /// The cost table in `store` is extended after every batch.
    pub fn run_some_batches(
        &self,
        populations: &[InitialPopulation],
        rows: Option<Range<usize>>,
        n_steps: usize,
        n_runs: usize,
        rng: &mut ChaCha12Rng,
        store: &Store,
    ) -> Result<Vec<CostRecord>> {
        let rows = rows.unwrap_or(0..populations.len());
        let selected = populations
            .get(rows.clone())
            .with_context(|| format!("rows {rows:?} exceed {} populations", populations.len()))?;

        let mut all_costs = Vec::new();
        for (i_pop, &init) in selected.iter().enumerate() {
            let result = self
                .run_batch(init, n_steps, n_runs, rng)
                .with_context(|| format!("failed to run batch for {init:?}"))?;

            for (i_run, log) in result.run_logs.iter().enumerate() {
                store
                    .save_run_log(init, i_run, log)
                    .context("failed to save run log")?;
            }
            if self.log_output.keeps_mean() {
                store
                    .save_mean_log(init, &result.mean_log)
                    .context("failed to save mean log")?;
            }
            if !result.costs.is_empty() {
                store
                    .append_costs(&result.costs)
                    .context("failed to append costs")?;
            }

            let progress = 100.0 * (i_pop + 1) as f64 / selected.len() as f64;
            log::info!("completed {progress:06.2}%");

            all_costs.extend(result.costs);
        }

        Ok(all_costs)
    }

    /// Cost of the whole log.
    pub fn cost(&self, log: &Log) -> f64 {
        self.cost_until(log, log.len().saturating_sub(1))
    }

    /// Cost of the first `n_steps` steps of the log.
    ///
    /// Final predators are charged at unit cost and juvenile hosts at unit cost per day.
    pub fn cost_until(&self, log: &Log, n_steps: usize) -> f64 {
        let n_rows = log.len().min(n_steps + 1);
        let Some(last) = n_rows.checked_sub(1).map(|idx| &log.rows()[idx]) else {
            return 0.0;
        };
        let juveniles: Vec<_> = log.rows()[..n_rows]
            .iter()
            .map(|row| row[Species::Host][Counter::Juveniles])
            .collect();

        last[Species::Predator][Counter::Living] * self.costs.predator_unit_cost
            + self.costs.host_unit_cost * simpson(&juveniles)
    }

    fn cost_record(
        &self,
        init: InitialPopulation,
        log: &Log,
        n_steps: usize,
        n_runs: usize,
    ) -> CostRecord {
        CostRecord {
            predator_count: init.predator_count,
            host_count: init.host_count,
            step_count: n_steps,
            run_count: n_runs,
            cost: self.cost(log),
        }
    }
}
