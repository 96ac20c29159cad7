//! Splits a batch into one contiguous block of matrix indices per role.
//!
//! Every role gets `n_mat / roles` indices. The `n_mat % roles` left over go
//! to the coordinator, whose block comes first, so the blocks always cover
//! `[0, n_mat)` exactly and stay in role order.

use std::ops::Range;

use role_exchange::Rank;

use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub role: Rank,
    pub range: Range<usize>,
}

impl Assignment {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

pub fn partition(n_mat: usize, roles: usize) -> Result<Vec<Assignment>, Error> {
    if roles == 0 {
        return Err(Error::NoRoles);
    }

    let base = n_mat / roles;
    let remainder = n_mat % roles;

    let mut start = 0;
    let assignments = (0..roles)
        .map(|role| {
            let len = if role == 0 { base + remainder } else { base };
            let range = start..start + len;
            start += len;
            Assignment { role, range }
        })
        .collect();

    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sizes(assignments: &[Assignment]) -> Vec<usize> {
        assignments.iter().map(Assignment::len).collect()
    }

    #[test]
    fn remainder_goes_to_the_coordinator() {
        // A truncating split would hand out {2, 2} and never process index 4.
        let assignments = partition(5, 2).unwrap();
        assert_eq!(sizes(&assignments), vec![3, 2]);
        assert_eq!(assignments[0].range, 0..3);
        assert_eq!(assignments[1].range, 3..5);
    }

    #[test]
    fn more_roles_than_matrices() {
        let assignments = partition(2, 4).unwrap();
        assert_eq!(sizes(&assignments), vec![2, 0, 0, 0]);
        assert!(assignments[3].is_empty());
    }

    #[test]
    fn empty_batch() {
        assert_eq!(sizes(&partition(0, 3).unwrap()), vec![0, 0, 0]);
    }

    #[test]
    fn rejects_zero_roles() {
        assert!(matches!(partition(4, 0), Err(Error::NoRoles)));
    }

    proptest! {
        #[test]
        fn covers_every_index_once(n_mat in 0usize..500, roles in 1usize..17) {
            let assignments = partition(n_mat, roles).unwrap();
            prop_assert_eq!(assignments.len(), roles);

            let mut next = 0;
            for (role, assignment) in assignments.iter().enumerate() {
                prop_assert_eq!(assignment.role, role);
                prop_assert_eq!(assignment.range.start, next);
                next = assignment.range.end;
            }
            prop_assert_eq!(next, n_mat);
        }
    }
}
