use crate::batch::CostRecord;
use crate::bayes::BayesCostRecord;
use crate::census::Log;
use crate::engine::InitialPopulation;
use anyhow::{Context, Result};
use glob::glob;
use rmp_serde::{decode, encode};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Output files of a simulation directory.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn save_run_log(&self, init: InitialPopulation, run_idx: usize, log: &Log) -> Result<()> {
        save(self.log_file(init, &format!("run{run_idx:04}")), log)
    }

    pub fn save_mean_log(&self, init: InitialPopulation, log: &Log) -> Result<()> {
        save(self.log_file(init, "mean"), log)
    }

    /// Load the cost table, empty if it does not exist yet.
    pub fn load_costs(&self) -> Result<Vec<CostRecord>> {
        load_or_default(self.costs_file())
    }

    /// Append records to the cost table, creating it if needed.
    pub fn append_costs(&self, records: &[CostRecord]) -> Result<()> {
        let mut costs = self.load_costs().context("failed to load costs")?;
        costs.extend_from_slice(records);
        save(self.costs_file(), &costs)
    }

    pub fn save_bayes_costs(&self, records: &[BayesCostRecord]) -> Result<()> {
        save(self.bayes_costs_file(), records)
    }

    pub fn save_min_bayes_costs(&self, records: &[BayesCostRecord]) -> Result<()> {
        save(self.min_bayes_costs_file(), records)
    }

    pub fn save_missing(&self, missing: &[InitialPopulation]) -> Result<()> {
        save(self.missing_file(), missing)
    }

    pub fn load_missing(&self) -> Result<Vec<InitialPopulation>> {
        load(self.missing_file())
    }

    /// Remove the missing table once it has been simulated.
    pub fn remove_missing(&self) -> Result<()> {
        let file = self.missing_file();
        fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))
    }

    /// Remove every output file, returning how many were removed.
    pub fn clean(&self) -> Result<usize> {
        let pattern = self.dir.join("*.msgpack");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let mut count = 0;
        for file in glob(pattern).context("failed to glob output files")? {
            let file = file.context("failed to read glob entry")?;
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            count += 1;
        }
        Ok(count)
    }

    pub fn log_file(&self, init: InitialPopulation, suffix: &str) -> PathBuf {
        self.dir.join(format!(
            "log-p{}-h{}-{suffix}.msgpack",
            init.predator_count, init.host_count
        ))
    }

    pub fn costs_file(&self) -> PathBuf {
        self.dir.join("costs.msgpack")
    }

    pub fn bayes_costs_file(&self) -> PathBuf {
        self.dir.join("bayes-costs.msgpack")
    }

    pub fn min_bayes_costs_file(&self) -> PathBuf {
        self.dir.join("bayes-min.msgpack")
    }

    pub fn missing_file(&self) -> PathBuf {
        self.dir.join("missing.msgpack")
    }
}

pub fn save<P: AsRef<Path>, T: Serialize + ?Sized>(file: P, val: &T) -> Result<()> {
    let file = file.as_ref();
    let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(file);
    encode::write(&mut writer, val).context("failed to serialize value")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

pub fn load<P: AsRef<Path>, T: DeserializeOwned>(file: P) -> Result<T> {
    let file = file.as_ref();
    let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let mut reader = BufReader::new(file);
    decode::from_read(&mut reader).context("failed to deserialize value")
}

fn load_or_default<P: AsRef<Path>, T: DeserializeOwned + Default>(file: P) -> Result<T> {
    let file = file.as_ref();
    if !file.exists() {
        return Ok(T::default());
    }
    load(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::{Census, Counter};
    use std::env;

    fn test_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("biocontrol-store-{name}"));
        fs::remove_dir_all(&dir).ok();
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn record(predator_count: u64, cost: f64) -> CostRecord {
        CostRecord {
            predator_count,
            host_count: 10,
            step_count: 5,
            run_count: 1,
            cost,
        }
    }

    #[test]
    fn costs_are_appended() {
        let dir = test_dir("costs");
        let store = Store::new(&dir);
        assert!(store.load_costs().unwrap().is_empty());

        store.append_costs(&[record(1, 2.0)]).unwrap();
        store.append_costs(&[record(2, 3.0), record(1, 4.0)]).unwrap();
        assert_eq!(
            store.load_costs().unwrap(),
            vec![record(1, 2.0), record(2, 3.0), record(1, 4.0)]
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn logs_are_saved_and_cleaned() {
        let dir = test_dir("logs");
        let store = Store::new(&dir);
        let init = InitialPopulation {
            predator_count: 3,
            host_count: 4,
        };
        let mut census = Census::default();
        census.host[Counter::Living] = 4.0;
        let mut log = Log::default();
        log.push(census);

        store.save_run_log(init, 0, &log).unwrap();
        store.save_mean_log(init, &log).unwrap();
        let loaded: Log = load(store.log_file(init, "mean")).unwrap();
        assert_eq!(loaded, log);
        assert!(dir.join("log-p3-h4-run0000.msgpack").exists());

        store.save_missing(&[init]).unwrap();
        assert_eq!(store.load_missing().unwrap(), vec![init]);

        store.remove_missing().unwrap();
        assert!(store.load_missing().is_err());
        assert!(store.remove_missing().is_err());
        store.save_missing(&[init]).unwrap();

        assert_eq!(store.clean().unwrap(), 3);
        assert!(store.load_missing().is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
