//! Per-step counter records of a simulation.

use crate::laws::Species;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Quantities recorded for each species at every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Living,
    Dead,
    Male,
    Female,
    RandomlyKilled,
    OldAgeKilled,
    Parents,
    Adults,
    Newborn,
    Predation,
    Juveniles,
}

pub const N_COUNTERS: usize = 11;

impl Counter {
    pub const ALL: [Counter; N_COUNTERS] = [
        Counter::Living,
        Counter::Dead,
        Counter::Male,
        Counter::Female,
        Counter::RandomlyKilled,
        Counter::OldAgeKilled,
        Counter::Parents,
        Counter::Adults,
        Counter::Newborn,
        Counter::Predation,
        Counter::Juveniles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::Living => "living",
            Counter::Dead => "dead",
            Counter::Male => "male",
            Counter::Female => "female",
            Counter::RandomlyKilled => "randomly_killed",
            Counter::OldAgeKilled => "old_age_killed",
            Counter::Parents => "parents",
            Counter::Adults => "adults",
            Counter::Newborn => "newborn",
            Counter::Predation => "predation",
            Counter::Juveniles => "juveniles",
        }
    }
}

/// Counter values of one species at one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters([f64; N_COUNTERS]);

impl Counters {
    pub fn add(&mut self, counter: Counter, flag: bool) {
        if flag {
            self[counter] += 1.0;
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.0
    }
}

impl Index<Counter> for Counters {
    type Output = f64;

    fn index(&self, counter: Counter) -> &f64 {
        &self.0[counter as usize]
    }
}

impl IndexMut<Counter> for Counters {
    fn index_mut(&mut self, counter: Counter) -> &mut f64 {
        &mut self.0[counter as usize]
    }
}

/// Counters of both species at one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub predator: Counters,
    pub host: Counters,
}

impl Index<Species> for Census {
    type Output = Counters;

    fn index(&self, species: Species) -> &Counters {
        match species {
            Species::Predator => &self.predator,
            Species::Host => &self.host,
        }
    }
}

impl IndexMut<Species> for Census {
    fn index_mut(&mut self, species: Species) -> &mut Counters {
        match species {
            Species::Predator => &mut self.predator,
            Species::Host => &mut self.host,
        }
    }
}

/// Sequence of censuses, row 0 being the census before the first step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Log {
    rows: Vec<Census>,
}

impl Log {
    /// Log of `n_rows` zeroed censuses.
    pub fn zeroed(n_rows: usize) -> Self {
        Self {
            rows: vec![Census::default(); n_rows],
        }
    }

    pub fn push(&mut self, census: Census) {
        self.rows.push(census);
    }

    pub fn reserve(&mut self, additional: usize) {
        self.rows.reserve(additional);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Census] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Census] {
        &mut self.rows
    }

    pub fn last(&self) -> Option<&Census> {
        self.rows.last()
    }

    /// Values of one counter over all steps.
    pub fn series(&self, species: Species, counter: Counter) -> Vec<f64> {
        self.rows.iter().map(|row| row[species][counter]).collect()
    }

    /// Names of all columns, formatted as `<species>-<counter>`.
    pub fn columns() -> Vec<String> {
        Species::ALL
            .iter()
            .flat_map(|sp| Counter::ALL.iter().map(move |ctr| column_name(*sp, *ctr)))
            .collect()
    }

    /// Values of the named columns over all steps, one vector per column.
    ///
    /// # Errors
    /// Returns an error if any column is not part of the log schema.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<Vec<f64>>> {
        columns
            .iter()
            .map(|col| {
                let col = col.as_ref();
                let (species, counter) =
                    parse_column(col).with_context(|| format!("invalid column {col:?}"))?;
                Ok(self.series(species, counter))
            })
            .collect()
    }
}

pub fn column_name(species: Species, counter: Counter) -> String {
    format!("{}-{}", species.name(), counter.name())
}

fn parse_column(col: &str) -> Result<(Species, Counter)> {
    for species in Species::ALL {
        for counter in Counter::ALL {
            if col == column_name(species, counter) {
                return Ok((species, counter));
            }
        }
    }
    bail!("column must be one of {:?}", Log::columns());
}
