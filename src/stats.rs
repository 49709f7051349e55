use crate::census::Log;
use anyhow::{Result, bail};

/// Running elementwise sum of logs of equal length.
pub struct LogAccumulator {
    n_logs: usize,
    sum: Log,
}

impl LogAccumulator {
    pub fn new(n_rows: usize) -> Self {
        Self {
            n_logs: 0,
            sum: Log::zeroed(n_rows),
        }
    }

    pub fn n_logs(&self) -> usize {
        self.n_logs
    }

    pub fn add(&mut self, log: &Log) -> Result<()> {
        let exp_len = self.sum.len();
        let len = log.len();
        if len != exp_len {
            bail!("log length must be {exp_len}, but is {len}");
        }

        self.n_logs += 1;

        for (sum_row, row) in self.sum.rows_mut().iter_mut().zip(log.rows()) {
            for (sum_ctrs, ctrs) in [
                (&mut sum_row.predator, &row.predator),
                (&mut sum_row.host, &row.host),
            ] {
                for (sum_val, &val) in sum_ctrs.values_mut().iter_mut().zip(ctrs.values()) {
                    *sum_val += val;
                }
            }
        }

        Ok(())
    }

    /// Elementwise mean of the added logs.
    pub fn mean(&self) -> Log {
        let mut mean = self.sum.clone();
        if self.n_logs == 0 {
            return mean;
        }
        let n_logs = self.n_logs as f64;
        for row in mean.rows_mut() {
            for ctrs in [&mut row.predator, &mut row.host] {
                ctrs.values_mut().iter_mut().for_each(|val| *val /= n_logs);
            }
        }
        mean
    }
}

/// Integrate equally spaced samples (unit spacing) with the composite Simpson rule.
///
/// For an even number of samples the result averages Simpson's rule over the
/// first and last `n - 1` samples, each completed with a trapezoid.
pub fn simpson(vals: &[f64]) -> f64 {
    match vals.len() {
        0 | 1 => 0.0,
        2 => trapezoid(vals),
        n if n % 2 == 1 => simpson_odd(vals),
        n => {
            let head = simpson_odd(&vals[..n - 1]) + trapezoid(&vals[n - 2..]);
            let tail = trapezoid(&vals[..2]) + simpson_odd(&vals[1..]);
            0.5 * (head + tail)
        }
    }
}

fn simpson_odd(vals: &[f64]) -> f64 {
    if vals.len() < 3 {
        return 0.0;
    }
    let n = vals.len() - 1;
    let inner: f64 = vals[1..n]
        .iter()
        .enumerate()
        .map(|(idx, &val)| if idx % 2 == 0 { 4.0 * val } else { 2.0 * val })
        .sum();
    (vals[0] + inner + vals[n]) / 3.0
}

fn trapezoid(vals: &[f64]) -> f64 {
    vals.windows(2).map(|pair| 0.5 * (pair[0] + pair[1])).sum()
}
