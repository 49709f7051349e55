use crate::batch::BatchRunner;
use crate::bayes::{BayesOutcome, bayes_cost, min_bayes_cost};
use crate::census::Log;
use crate::config::Config;
use crate::laws::LawSet;
use crate::store::{self, Store};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

pub struct Manager {
    cfg: Config,
    laws: LawSet,
    store: Store,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        let laws = LawSet::new(&cfg.laws).context("failed to construct laws")?;

        Ok(Self {
            cfg,
            laws,
            store: Store::new(sim_dir),
        })
    }

    /// Simulate the configured populations, or those missing from the last Bayes evaluation.
    ///
    /// The missing table is removed once its batches have completed.
    pub fn simulate(&self, missing: bool) -> Result<()> {
        let (populations, rows) = if missing {
            let populations = self
                .store
                .load_missing()
                .context("failed to load missing populations")?;
            (populations, None)
        } else {
            let rows = self.cfg.batch.rows.map(|[start, end]| start..end);
            (self.cfg.batch.populations.clone(), rows)
        };
        log::info!("simulating {} populations (rows {rows:?})", populations.len());

        let mut rng = self.master_rng()?;
        let runner = BatchRunner::new(
            &self.laws,
            self.cfg.costs.clone(),
            self.cfg.batch.log_output,
            self.cfg.batch.cost_output,
        );
        let costs = runner
            .run_some_batches(
                &populations,
                rows,
                self.cfg.batch.n_steps,
                self.cfg.batch.n_runs,
                &mut rng,
                &self.store,
            )
            .context("failed to run batches")?;
        log::info!("appended {} cost records", costs.len());

        if missing {
            self.store
                .remove_missing()
                .context("failed to remove consumed missing populations")?;
            log::info!("consumed {:?}", self.store.missing_file());
        }

        Ok(())
    }

    /// Evaluate the Bayes cost of every configured sample.
    ///
    /// If the cost table is incomplete, the missing populations are saved instead.
    pub fn evaluate_bayes(&self) -> Result<()> {
        let bayes = self
            .cfg
            .bayes
            .as_ref()
            .context("config has no bayes section")?;
        let costs = self.store.load_costs().context("failed to load costs")?;

        let mut records = Vec::new();
        let mut missing = BTreeSet::new();
        for &sample in &bayes.samples {
            let outcome = bayes_cost(
                &bayes.prior,
                sample,
                &bayes.predator_counts,
                bayes.density_scale,
                &costs,
            )
            .with_context(|| format!("failed to evaluate {sample:?}"))?;
            match outcome {
                BayesOutcome::Complete(sample_records) => records.extend(sample_records),
                BayesOutcome::Incomplete(sample_missing) => missing.extend(sample_missing),
            }
        }

        if !missing.is_empty() {
            let missing: Vec<_> = missing.into_iter().collect();
            log::warn!("cost table is missing {} populations: {missing:?}", missing.len());
            self.store
                .save_missing(&missing)
                .context("failed to save missing populations")?;
            log::info!("saved {:?}", self.store.missing_file());
            return Ok(());
        }

        self.store
            .save_bayes_costs(&records)
            .context("failed to save bayes costs")?;
        let min_records = min_bayes_cost(&records);
        for rec in &min_records {
            log::info!("{rec:?}");
        }
        self.store
            .save_min_bayes_costs(&min_records)
            .context("failed to save minimal bayes costs")?;

        Ok(())
    }

    /// Print the selected columns of a saved log.
    pub fn show(&self, file: PathBuf, columns: &[String]) -> Result<()> {
        let log: Log = store::load(&file).with_context(|| format!("failed to load {file:?}"))?;
        let series = log.select(columns).context("failed to select columns")?;

        println!("step {}", columns.join(" "));
        for i_row in 0..log.len() {
            let vals: Vec<_> = series.iter().map(|col| format!("{:.4}", col[i_row])).collect();
            println!("{i_row} {}", vals.join(" "));
        }

        Ok(())
    }

    pub fn clean(&self) -> Result<()> {
        let count = self.store.clean().context("failed to clean outputs")?;
        log::info!("removed {count} files");
        Ok(())
    }

    fn master_rng(&self) -> Result<ChaCha12Rng> {
        let rng = match self.cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };
        Ok(rng)
    }
}
