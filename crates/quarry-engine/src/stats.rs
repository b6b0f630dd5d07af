//! Online statistics accumulator for trial outcomes.

use std::fmt;
use std::io::{self, Write};

/// Running count, sum, sum of squares, and extrema over a stream of values,
/// plus the wall time the producing batch took.
///
/// `mean` is `sum / n`. The standard deviation is the sample deviation
/// (`n - 1` denominator); it is zero below two samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    description: String,
    n: u64,
    sum: f64,
    sumsq: f64,
    min: f64,
    max: f64,
    ms_taken: u64,
}

impl Stats {
    /// Empty accumulator labelled `description`.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            n: 0,
            sum: 0.0,
            sumsq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            ms_taken: 0,
        }
    }

    /// Fold one observation in.
    pub fn add(&mut self, value: f64) {
        self.n += 1;
        self.sum += value;
        self.sumsq += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Label used in logs and CSV rows.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of values added.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Sum of values.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Sum of squared values.
    pub fn sumsq(&self) -> f64 {
        self.sumsq
    }

    /// Smallest value seen; `+inf` when empty.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest value seen; `-inf` when empty.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// `sum / n`; NaN when empty.
    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            return f64::NAN;
        }
        self.sum / self.n as f64
    }

    /// Sample standard deviation.
    pub fn std_dev(&self) -> f64 {
        if self.n < 2 {
            return 0.0;
        }
        let n = self.n as f64;
        let mean = self.sum / n;
        // Clamp: cancellation can push the numerator slightly negative.
        ((self.sumsq - n * mean * mean) / (n - 1.0)).max(0.0).sqrt()
    }

    /// Standard error of the mean.
    pub fn std_error(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        self.std_dev() / (self.n as f64).sqrt()
    }

    /// Wall time of the batch that produced these values.
    pub fn ms_taken(&self) -> u64 {
        self.ms_taken
    }

    /// Record the batch wall time.
    pub fn set_ms_taken(&mut self, ms: u64) {
        self.ms_taken = ms;
    }

    /// One CSV row:
    /// `description, index, mean, sum, sumsq, sd, n, min, max, stderr, ms`.
    pub fn csv_row(&self, index: usize) -> String {
        format!(
            "{}, {}, {:.6}, {:.6}, {:.6}, {:.6}, {}, {:.6}, {:.6}, {:.6}, {}",
            self.description,
            index,
            self.mean(),
            self.sum,
            self.sumsq,
            self.std_dev(),
            self.n,
            self.min,
            self.max,
            self.std_error(),
            self.ms_taken
        )
    }
}

impl Extend<f64> for Stats {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: n={} mean={:.3} sd={:.3} min={} max={} ({} ms)",
            self.description,
            self.n,
            self.mean(),
            self.std_dev(),
            self.min,
            self.max,
            self.ms_taken
        )
    }
}

/// Write `stats` as one CSV row (see [`Stats::csv_row`]).
pub fn write_stats(writer: &mut impl Write, stats: &Stats, index: usize) -> io::Result<()> {
    writeln!(writer, "{}", stats.csv_row(index))
}
