//! Coordinator/worker message encoding.
//!
//! Both messages carry their own counts, so a receiver never has to know the
//! sender's partition to size its buffers. All integers and floats are
//! little-endian.
//!
//! - assignment: `first_index: u64`, `count: u64`, `order: u64`,
//!   `engine: u8`, then `count * order * order` coefficients (`f64`)
//! - results: `first_index: u64`, `count: u64`, then `count` determinants

use crate::{Engine, Error, Matrix};

const ASSIGNMENT_HEADER: usize = 8 + 8 + 8 + 1;
const RESULTS_HEADER: usize = 8 + 8;

/// Cursor over a byte slice; every read returns `None` once the data runs out.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    pub fn read_exact(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }
        let start = self.offset;
        self.offset += len;
        Some(&self.bytes[start..start + len])
    }

    pub fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Some(out)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|b| b[0])
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Reads `count` floats into a freshly reserved vector.
    pub fn read_f64s(&mut self, count: usize) -> Result<Option<Vec<f64>>, Error> {
        let Some(len) = count.checked_mul(8) else {
            return Ok(None);
        };
        let Some(bytes) = self.read_exact(len) else {
            return Ok(None);
        };

        let mut values = Vec::new();
        values
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation(count))?;
        values.extend(bytes.chunks_exact(8).map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        }));
        Ok(Some(values))
    }
}

pub(crate) fn put_f64s(buf: &mut Vec<u8>, values: &[f64]) {
    for value in values {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// A block of matrices handed to one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentMessage {
    pub first_index: usize,
    pub engine: Engine,
    pub matrices: Vec<Matrix>,
}

/// The determinants a worker computed for its block, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsMessage {
    pub first_index: usize,
    pub values: Vec<f64>,
}

pub fn encode_assignment(
    first_index: usize,
    order: usize,
    engine: Engine,
    matrices: &[Matrix],
) -> Vec<u8> {
    let values = matrices.len() * order * order;
    let mut buf = Vec::with_capacity(ASSIGNMENT_HEADER + values * 8);

    buf.extend_from_slice(&(first_index as u64).to_le_bytes());
    buf.extend_from_slice(&(matrices.len() as u64).to_le_bytes());
    buf.extend_from_slice(&(order as u64).to_le_bytes());
    buf.push(engine.tag());
    for matrix in matrices {
        put_f64s(&mut buf, matrix.coefficients());
    }

    buf
}

pub fn decode_assignment(bytes: &[u8]) -> Result<AssignmentMessage, Error> {
    const KIND: &str = "assignment";

    let mut reader = ByteReader::new(bytes);
    let first_index = reader.read_u64().ok_or(Error::Malformed(KIND))? as usize;
    let count = reader.read_u64().ok_or(Error::Malformed(KIND))? as usize;
    let order = reader.read_u64().ok_or(Error::Malformed(KIND))? as usize;
    let engine = Engine::from_tag(reader.read_u8().ok_or(Error::Malformed(KIND))?)?;

    let per_matrix = order.checked_mul(order).ok_or(Error::Malformed(KIND))?;
    let expected = count
        .checked_mul(per_matrix)
        .and_then(|values| values.checked_mul(8))
        .ok_or(Error::Malformed(KIND))?;
    if expected != reader.remaining() {
        return Err(Error::Malformed(KIND));
    }

    let mut matrices = Vec::new();
    matrices
        .try_reserve_exact(count)
        .map_err(|_| Error::Allocation(count))?;
    for _ in 0..count {
        let coefficients = reader
            .read_f64s(per_matrix)?
            .ok_or(Error::Malformed(KIND))?;
        matrices.push(Matrix::new(order, coefficients)?);
    }

    Ok(AssignmentMessage {
        first_index,
        engine,
        matrices,
    })
}

pub fn encode_results(first_index: usize, values: &[f64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RESULTS_HEADER + values.len() * 8);
    buf.extend_from_slice(&(first_index as u64).to_le_bytes());
    buf.extend_from_slice(&(values.len() as u64).to_le_bytes());
    put_f64s(&mut buf, values);
    buf
}

pub fn decode_results(bytes: &[u8]) -> Result<ResultsMessage, Error> {
    const KIND: &str = "results";

    let mut reader = ByteReader::new(bytes);
    let first_index = reader.read_u64().ok_or(Error::Malformed(KIND))? as usize;
    let count = reader.read_u64().ok_or(Error::Malformed(KIND))? as usize;

    if count.checked_mul(8) != Some(reader.remaining()) {
        return Err(Error::Malformed(KIND));
    }
    let values = reader.read_f64s(count)?.ok_or(Error::Malformed(KIND))?;

    Ok(ResultsMessage {
        first_index,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Matrix> {
        vec![
            Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(),
            Matrix::identity(2).unwrap(),
        ]
    }

    #[test]
    fn assignment_carries_its_own_size() {
        let bytes = encode_assignment(7, 2, Engine::Elimination, &sample());
        assert_eq!(bytes.len(), ASSIGNMENT_HEADER + 2 * 4 * 8);

        let message = decode_assignment(&bytes).unwrap();
        assert_eq!(message.first_index, 7);
        assert_eq!(message.engine, Engine::Elimination);
        assert_eq!(message.matrices, sample());
    }

    #[test]
    fn empty_assignment() {
        let message = decode_assignment(&encode_assignment(0, 3, Engine::Cofactor, &[])).unwrap();
        assert!(message.matrices.is_empty());
    }

    #[test]
    fn rejects_truncated_assignment() {
        let bytes = encode_assignment(0, 2, Engine::Cofactor, &sample());
        assert!(matches!(
            decode_assignment(&bytes[..bytes.len() - 1]),
            Err(Error::Malformed("assignment"))
        ));
        assert!(matches!(
            decode_assignment(&bytes[..10]),
            Err(Error::Malformed("assignment"))
        ));
    }

    #[test]
    fn rejects_zero_order_matrices() {
        let mut bytes = encode_assignment(0, 0, Engine::Cofactor, &[]);
        bytes[8] = 1;
        assert!(matches!(decode_assignment(&bytes), Err(Error::ZeroOrder)));
    }

    #[test]
    fn results_keep_their_order() {
        let message = decode_results(&encode_results(3, &[-2.0, 0.0, 1.5])).unwrap();
        assert_eq!(message.first_index, 3);
        assert_eq!(message.values, vec![-2.0, 0.0, 1.5]);
    }

    #[test]
    fn rejects_results_with_extra_bytes() {
        let mut bytes = encode_results(0, &[1.0]);
        bytes.push(0);
        assert!(matches!(
            decode_results(&bytes),
            Err(Error::Malformed("results"))
        ));
    }
}
