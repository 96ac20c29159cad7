//! Where batches come from.
//!
//! # Batch file layout
//!
//! ```text
//! nMat   : i32 LE     number of matrices
//! order  : u32 LE     shared matrix order
//! coeffs : f64 LE     nMat * order * order values, matrix after matrix,
//!                     each matrix row-major
//! ```
//!
//! A file is accepted only if the coefficient data matches the header
//! exactly; short files and trailing bytes are both rejected.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use tracing::info;

use crate::wire::{ByteReader, put_f64s};
use crate::{Batch, Error, Matrix};

const HEADER_LEN: usize = 4 + 4;

/// Supplies the batch processed by the coordinator.
#[async_trait]
pub trait MatrixSource: Send + Sync {
    async fn load(&self) -> Result<Batch, Error>;
}

#[async_trait]
impl MatrixSource for Batch {
    async fn load(&self) -> Result<Batch, Error> {
        Ok(self.clone())
    }
}

/// A batch stored on disk in the binary batch format.
#[derive(Debug, Clone)]
pub struct BatchFile {
    path: PathBuf,
}

impl BatchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses a whole batch file held in memory.
    pub fn parse(bytes: &[u8]) -> Result<Batch, Error> {
        let mut reader = ByteReader::new(bytes);
        let (Some(count), Some(order)) = (reader.read_i32(), reader.read_u32()) else {
            return Err(Error::TruncatedHeader {
                expected: HEADER_LEN,
                found: bytes.len(),
            });
        };

        let count = usize::try_from(count).map_err(|_| Error::NegativeCount(count))?;
        let order = order as usize;
        if order == 0 {
            return Err(Error::ZeroOrder);
        }

        let too_large = || Error::TooLarge { count, order };
        let per_matrix = order.checked_mul(order).ok_or_else(too_large)?;
        let values = count.checked_mul(per_matrix).ok_or_else(too_large)?;
        let data_len = values.checked_mul(8).ok_or_else(too_large)?;

        let available = reader.remaining();
        if available < data_len {
            return Err(Error::ShortRead {
                expected: values,
                found: available / 8,
            });
        }
        if available > data_len {
            return Err(Error::TrailingData(available - data_len));
        }

        let mut matrices = Vec::new();
        matrices
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation(values))?;
        for _ in 0..count {
            let coefficients = reader.read_f64s(per_matrix)?.ok_or(Error::ShortRead {
                expected: values,
                found: available / 8,
            })?;
            matrices.push(Matrix::new(order, coefficients)?);
        }

        Batch::new(order, matrices)
    }

    pub fn encode(batch: &Batch) -> Result<Vec<u8>, Error> {
        let count = i32::try_from(batch.len()).map_err(|_| Error::TooLarge {
            count: batch.len(),
            order: batch.order(),
        })?;
        let order = u32::try_from(batch.order()).map_err(|_| Error::TooLarge {
            count: batch.len(),
            order: batch.order(),
        })?;

        let mut buf =
            Vec::with_capacity(HEADER_LEN + batch.len() * batch.order() * batch.order() * 8);
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&order.to_le_bytes());
        for matrix in batch.matrices() {
            put_f64s(&mut buf, matrix.coefficients());
        }
        Ok(buf)
    }

    pub async fn save(&self, batch: &Batch) -> Result<(), Error> {
        let bytes = Self::encode(batch)?;
        tokio::fs::write(&self.path, bytes).await?;
        info!(path = %self.path.display(), matrices = batch.len(), order = batch.order(), "batch written");
        Ok(())
    }
}

#[async_trait]
impl MatrixSource for BatchFile {
    async fn load(&self) -> Result<Batch, Error> {
        let bytes = tokio::fs::read(&self.path).await?;
        let batch = Self::parse(&bytes)?;
        info!(path = %self.path.display(), matrices = batch.len(), order = batch.order(), "batch loaded");
        Ok(batch)
    }
}

/// Builds a batch of `count` matrices with coefficients drawn from `[-10, 10)`.
pub fn random_batch<R: Rng>(rng: &mut R, count: usize, order: usize) -> Result<Batch, Error> {
    let matrices = (0..count)
        .map(|_| {
            let coefficients = (0..order * order)
                .map(|_| rng.gen_range(-10.0..10.0))
                .collect();
            Matrix::new(order, coefficients)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Batch::new(order, matrices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn header(count: i32, order: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&count.to_le_bytes());
        buf.extend_from_slice(&order.to_le_bytes());
        buf
    }

    #[test]
    fn parses_what_it_encodes() {
        let batch = random_batch(&mut StdRng::seed_from_u64(7), 3, 4).unwrap();
        let bytes = BatchFile::encode(&batch).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 3 * 16 * 8);
        assert_eq!(BatchFile::parse(&bytes).unwrap(), batch);
    }

    #[test]
    fn empty_batch_is_valid() {
        let batch = BatchFile::parse(&header(0, 3)).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.order(), 3);
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(matches!(
            BatchFile::parse(&[1, 0, 0, 0, 2]),
            Err(Error::TruncatedHeader {
                expected: 8,
                found: 5
            })
        ));
    }

    #[test]
    fn rejects_negative_count_and_zero_order() {
        assert!(matches!(
            BatchFile::parse(&header(-1, 2)),
            Err(Error::NegativeCount(-1))
        ));
        assert!(matches!(
            BatchFile::parse(&header(1, 0)),
            Err(Error::ZeroOrder)
        ));
    }

    #[test]
    fn rejects_short_coefficient_data() {
        let mut bytes = header(2, 2);
        put_f64s(&mut bytes, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(matches!(
            BatchFile::parse(&bytes),
            Err(Error::ShortRead {
                expected: 8,
                found: 5
            })
        ));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = header(1, 1);
        put_f64s(&mut bytes, &[1.0]);
        bytes.push(0xff);
        assert!(matches!(
            BatchFile::parse(&bytes),
            Err(Error::TrailingData(1))
        ));
    }

    #[test]
    fn huge_header_fails_without_allocating() {
        assert!(matches!(
            BatchFile::parse(&header(i32::MAX, u32::MAX)),
            Err(Error::TooLarge { .. }) | Err(Error::ShortRead { .. })
        ));
    }

    #[test]
    fn random_batch_stays_in_range() {
        let batch = random_batch(&mut StdRng::seed_from_u64(1), 5, 3).unwrap();
        assert_eq!(batch.len(), 5);
        assert!(
            batch
                .matrices()
                .iter()
                .flat_map(|m| m.coefficients())
                .all(|v| (-10.0..10.0).contains(v))
        );
    }
}
