//! Gathering results into index order and printing them.

use std::fmt;
use std::time::Duration;

use crate::Error;

/// The determinant of the matrix at `index` in the batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterminantResult {
    pub index: usize,
    pub value: f64,
}

/// Collects result blocks in any arrival order.
#[derive(Debug)]
pub struct ResultSet {
    slots: Vec<Option<f64>>,
}

impl ResultSet {
    pub fn new(n_mat: usize) -> Self {
        Self {
            slots: vec![None; n_mat],
        }
    }

    /// Stores `values` for indices `first_index..first_index + values.len()`.
    pub fn insert_block(&mut self, first_index: usize, values: &[f64]) -> Result<(), Error> {
        let len = self.slots.len();
        for (offset, &value) in values.iter().enumerate() {
            let index = first_index + offset;
            let slot = self
                .slots
                .get_mut(index)
                .ok_or(Error::ResultOutOfRange { index, len })?;
            if slot.is_some() {
                return Err(Error::DuplicateResult(index));
            }
            *slot = Some(value);
        }
        Ok(())
    }

    /// Fails unless every index has exactly one result.
    pub fn finish(self, elapsed: Duration) -> Result<Report, Error> {
        let results = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.map(|value| DeterminantResult { index, value })
                    .ok_or(Error::MissingResult(index))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Report { results, elapsed })
    }
}

/// The outcome of a whole batch: one result per matrix, in index order.
#[derive(Debug, Clone)]
pub struct Report {
    pub results: Vec<DeterminantResult>,
    pub elapsed: Duration,
}

impl Report {
    pub fn values(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.value).collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(
                f,
                "The determinant of matrix {} is {:.3e}",
                result.index, result.value
            )?;
        }
        writeln!(f)?;
        write!(f, "Elapsed time = {:.6} s", self.elapsed.as_secs_f64())
    }
}
