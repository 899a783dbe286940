//! Hyperslab selection for partial dataset reads and block writes.
//!
//! A [`Selection`] describes which elements of a dataset to access. A
//! hyperslab is a regular, strided sub-region of the dataspace; every
//! selected element is visited in row-major order.
//!
//! ```
//! use rustynwb::io::Selection;
//!
//! // Rows 20..30, columns 40..60 of a 100x100 dataset
//! let sel = Selection::slice(&[20..30, 40..60]);
//! assert_eq!(sel.num_elements(&[100, 100]), 200);
//! ```

use std::ops::Range;

use crate::error::{Error, Result};

/// Elements of a dataset to read or write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// The entire dataspace.
    #[default]
    All,

    /// A regular hyperslab defined per dimension by:
    /// - `start[d]`: first element index
    /// - `stride[d]`: step between blocks (must be >= `block[d]`)
    /// - `count[d]`: number of blocks
    /// - `block[d]`: consecutive elements per block
    Hyperslab {
        start: Vec<usize>,
        stride: Vec<usize>,
        count: Vec<usize>,
        block: Vec<usize>,
    },
}

impl Selection {
    /// A contiguous hyperslab from one range per dimension.
    pub fn slice(ranges: &[Range<usize>]) -> Self {
        let rank = ranges.len();
        Selection::Hyperslab {
            start: ranges.iter().map(|r| r.start).collect(),
            stride: vec![1; rank],
            count: ranges.iter().map(|r| r.end.saturating_sub(r.start)).collect(),
            block: vec![1; rank],
        }
    }

    /// Build a selection from the optional read arguments.
    ///
    /// All-empty arguments select everything. Otherwise `start` is required;
    /// a missing `count` runs to the end of each dimension and missing
    /// `stride`/`block` default to 1.
    pub fn from_args(
        dims: &[usize],
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        block: &[usize],
    ) -> Result<Self> {
        if start.is_empty() && count.is_empty() && stride.is_empty() && block.is_empty() {
            return Ok(Selection::All);
        }
        let rank = dims.len();
        if start.len() != rank {
            return Err(Error::InvalidSelection(format!(
                "start has {} dimensions, dataset has {rank}",
                start.len()
            )));
        }
        let or_default = |values: &[usize], name: &str, default: &dyn Fn(usize) -> usize| {
            if values.is_empty() {
                Ok((0..rank).map(default).collect::<Vec<_>>())
            } else if values.len() == rank {
                Ok(values.to_vec())
            } else {
                Err(Error::InvalidSelection(format!(
                    "{name} has {} dimensions, dataset has {rank}",
                    values.len()
                )))
            }
        };
        let stride = or_default(stride, "stride", &|_| 1)?;
        let block = or_default(block, "block", &|_| 1)?;
        let count = or_default(count, "count", &|d| {
            let remaining = dims[d].saturating_sub(start[d]);
            remaining.div_ceil(stride[d].max(1))
        })?;
        let sel = Selection::Hyperslab {
            start: start.to_vec(),
            stride,
            count,
            block,
        };
        sel.validate(dims)?;
        Ok(sel)
    }

    /// Check that the selection lies inside a dataspace of shape `dims`.
    pub fn validate(&self, dims: &[usize]) -> Result<()> {
        let Selection::Hyperslab {
            start,
            stride,
            count,
            block,
        } = self
        else {
            return Ok(());
        };
        if start.len() != dims.len() {
            return Err(Error::InvalidSelection(format!(
                "selection rank {} does not match dataset rank {}",
                start.len(),
                dims.len()
            )));
        }
        for d in 0..dims.len() {
            if block[d] == 0 || stride[d] < block[d] {
                return Err(Error::InvalidSelection(format!(
                    "dimension {d}: stride {} must be >= block {} > 0",
                    stride[d], block[d]
                )));
            }
            if count[d] == 0 {
                continue;
            }
            let end = start[d] + (count[d] - 1) * stride[d] + block[d];
            if end > dims[d] {
                return Err(Error::InvalidSelection(format!(
                    "dimension {d}: selection ends at {end}, extent is {}",
                    dims[d]
                )));
            }
        }
        Ok(())
    }

    /// Number of selected elements for a given dataspace shape.
    pub fn num_elements(&self, dims: &[usize]) -> usize {
        self.output_shape(dims).iter().product()
    }

    /// Shape of the selected region: `count[d] * block[d]` per dimension.
    pub fn output_shape(&self, dims: &[usize]) -> Vec<usize> {
        match self {
            Selection::All => dims.to_vec(),
            Selection::Hyperslab { count, block, .. } => {
                count.iter().zip(block.iter()).map(|(&c, &b)| c * b).collect()
            }
        }
    }

    /// Row-major flat offsets (into a dataset of shape `dims`) of every
    /// selected element, in output order.
    pub fn flat_indices(&self, dims: &[usize]) -> Vec<usize> {
        let per_dim: Vec<Vec<usize>> = match self {
            Selection::All => dims.iter().map(|&n| (0..n).collect()).collect(),
            Selection::Hyperslab {
                start,
                stride,
                count,
                block,
            } => (0..dims.len())
                .map(|d| {
                    (0..count[d])
                        .flat_map(|c| {
                            let base = start[d] + c * stride[d];
                            base..base + block[d]
                        })
                        .collect()
                })
                .collect(),
        };
        if dims.is_empty() {
            return vec![0];
        }
        if per_dim.iter().any(Vec::is_empty) {
            return Vec::new();
        }

        let mut strides = vec![1usize; dims.len()];
        for d in (0..dims.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * dims[d + 1];
        }

        let total: usize = per_dim.iter().map(Vec::len).product();
        let mut out = Vec::with_capacity(total);
        let mut cursor = vec![0usize; dims.len()];
        loop {
            out.push(
                cursor
                    .iter()
                    .enumerate()
                    .map(|(d, &i)| per_dim[d][i] * strides[d])
                    .sum(),
            );
            // odometer increment, last dimension fastest
            let mut d = dims.len();
            loop {
                if d == 0 {
                    return out;
                }
                d -= 1;
                cursor[d] += 1;
                if cursor[d] < per_dim[d].len() {
                    break;
                }
                cursor[d] = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn all_selection() {
        let sel = Selection::All;
        assert_eq!(sel.num_elements(&[10, 20]), 200);
        assert_eq!(sel.output_shape(&[10, 20]), vec![10, 20]);
        assert_eq!(sel.flat_indices(&[2, 2]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn scalar_dataspace() {
        assert_eq!(Selection::All.flat_indices(&[]), vec![0]);
    }

    #[test]
    fn contiguous_slice() {
        let sel = Selection::slice(&[2..5]);
        assert_eq!(sel.output_shape(&[10]), vec![3]);
        assert_eq!(sel.flat_indices(&[10]), vec![2, 3, 4]);
    }

    #[test]
    fn strided_blocks() {
        let sel = Selection::from_args(&[10], &[1], &[3], &[3], &[2]).unwrap();
        assert_eq!(sel.output_shape(&[10]), vec![6]);
        assert_eq!(sel.flat_indices(&[10]), vec![1, 2, 4, 5, 7, 8]);
    }

    #[test]
    fn two_dimensional_column() {
        let sel = Selection::slice(&[0..3, 1..2]);
        assert_eq!(sel.flat_indices(&[3, 4]), vec![1, 5, 9]);
    }

    #[test]
    fn empty_args_select_all() {
        assert_eq!(Selection::from_args(&[5], &[], &[], &[], &[]).unwrap(), Selection::All);
    }

    #[test]
    fn missing_count_runs_to_end() {
        let sel = Selection::from_args(&[10], &[7], &[], &[], &[]).unwrap();
        assert_eq!(sel.flat_indices(&[10]), vec![7, 8, 9]);
    }

    #[test]
    fn out_of_bounds_rejected() {
        assert!(Selection::from_args(&[10], &[8], &[3], &[], &[]).is_err());
        assert!(Selection::from_args(&[10, 2], &[0], &[1], &[], &[]).is_err());
        assert!(Selection::from_args(&[10], &[0], &[2], &[1], &[2]).is_err());
    }

    #[test]
    fn zero_count_selects_nothing() {
        let sel = Selection::slice(&[3..3]);
        assert_eq!(sel.num_elements(&[10]), 0);
        assert!(sel.flat_indices(&[10]).is_empty());
    }

    proptest! {
        #[test]
        fn indices_match_element_count(
            rows in 1usize..8,
            cols in 1usize..8,
            r0 in 0usize..8,
            c0 in 0usize..8,
        ) {
            let r0 = r0 % rows;
            let c0 = c0 % cols;
            let sel = Selection::slice(&[r0..rows, c0..cols]);
            let dims = [rows, cols];
            prop_assert!(sel.validate(&dims).is_ok());
            let idx = sel.flat_indices(&dims);
            prop_assert_eq!(idx.len(), sel.num_elements(&dims));
            prop_assert!(idx.iter().all(|&i| i < rows * cols));
        }
    }
}
