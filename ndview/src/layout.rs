/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Layout analysis for strided views.
//!
//! A [`Layout`] is the triple (`shape`, `strides`, `offset`) mapping
//! coordinates to buffer indices:
//!
//! ```text
//! index = offset + ∑ iₖ × strides[k]
//! ```
//!
//! Strides are signed; a negative stride walks its dimension
//! backwards through memory. Everything in this module depends on the
//! layout alone, never on buffer contents.

use crate::dtype::Order;

mod sealed {
    pub trait Sealed {}
}

/// A memory layout mapping multidimensional coordinates (in `ℕⁿ`) to
/// buffer indices via an affine map:
///
/// ```text
/// offset_of(x) = offset + dot(strides, x)
/// ```
///
/// No bounds checking is performed: the caller guarantees that every
/// coordinate is within `sizes()`.
pub trait LayoutMap: sealed::Sealed {
    /// The number of dimensions in the domain of the map.
    fn rank(&self) -> usize;

    /// The shape of the domain (number of elements per dimension).
    fn sizes(&self) -> &[usize];

    /// Maps a multidimensional coordinate to a buffer index.
    fn offset_of(&self, coord: &[usize]) -> usize;
}

/// The sign pattern of a stride vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterationOrder {
    /// No stride is negative.
    Forward,
    /// No stride is positive (and at least one is negative).
    Backward,
    /// Strides of both signs.
    Mixed,
}

impl IterationOrder {
    /// +1, -1 or 0.
    pub fn sign(self) -> isize {
        match self {
            IterationOrder::Forward => 1,
            IterationOrder::Backward => -1,
            IterationOrder::Mixed => 0,
        }
    }
}

/// Ordering of stride magnitudes, in dimension order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Monotonicity {
    /// Non-decreasing magnitudes, e.g. `[1, 2]` (column-major-like).
    Ascending,
    /// Non-increasing magnitudes, e.g. `[2, 1]` (row-major-like).
    Descending,
    /// Both: all magnitudes equal, or fewer than two strides.
    Constant,
    /// Neither.
    Mixed,
}

impl Monotonicity {
    fn row_major(self) -> bool {
        matches!(self, Monotonicity::Descending | Monotonicity::Constant)
    }

    fn column_major(self) -> bool {
        matches!(self, Monotonicity::Ascending | Monotonicity::Constant)
    }
}

/// Layout flags of a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags {
    pub row_major_contiguous: bool,
    pub column_major_contiguous: bool,
    pub readonly: bool,
}

/// Classify the sign pattern of `strides`. An empty stride vector is
/// [`IterationOrder::Forward`].
pub fn iteration_order(strides: &[isize]) -> IterationOrder {
    if strides.iter().all(|&s| s >= 0) {
        IterationOrder::Forward
    } else if strides.iter().all(|&s| s <= 0) {
        IterationOrder::Backward
    } else {
        IterationOrder::Mixed
    }
}

/// Classify the magnitudes of `strides` in dimension order.
pub fn monotonicity(strides: &[isize]) -> Monotonicity {
    let mut ascending = true;
    let mut descending = true;
    for pair in strides.windows(2) {
        let (a, b) = (pair[0].unsigned_abs(), pair[1].unsigned_abs());
        ascending &= a <= b;
        descending &= a >= b;
    }
    match (ascending, descending) {
        (true, true) => Monotonicity::Constant,
        (true, false) => Monotonicity::Ascending,
        (false, true) => Monotonicity::Descending,
        (false, false) => Monotonicity::Mixed,
    }
}

/// The minimum and maximum buffer indices reachable from `offset`.
/// An empty shape dimension collapses the span to `(offset, offset)`.
pub fn min_max_offsets(shape: &[usize], strides: &[isize], offset: usize) -> (isize, isize) {
    let offset = offset as isize;
    let (mut min, mut max) = (offset, offset);
    for (&size, &stride) in shape.iter().zip(strides) {
        if size == 0 {
            return (offset, offset);
        }
        let extent = stride * (size as isize - 1);
        if stride > 0 {
            max += extent;
        } else if stride < 0 {
            min += extent;
        }
    }
    (min, max)
}

/// A strided layout: shape, signed strides and base offset.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    shape: Vec<usize>,
    strides: Vec<isize>,
    offset: usize,
}

impl Layout {
    /// Create a layout without validation. A zero-dimensional layout
    /// may carry a single placeholder stride (conventionally `[0]`).
    pub fn new(shape: Vec<usize>, strides: Vec<isize>, offset: usize) -> Self {
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Dense row-major strides for `shape`.
    pub fn row_major_strides(shape: &[usize]) -> Vec<isize> {
        let mut strides = vec![1isize; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1] as isize;
        }
        strides
    }

    /// Dense column-major strides for `shape`.
    pub fn column_major_strides(shape: &[usize]) -> Vec<isize> {
        let mut strides = vec![1isize; shape.len()];
        for i in 1..shape.len() {
            strides[i] = strides[i - 1] * shape[i - 1] as isize;
        }
        strides
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of elements; 1 for a zero-dimensional layout.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iteration_order(&self) -> IterationOrder {
        iteration_order(&self.strides)
    }

    pub fn monotonicity(&self) -> Monotonicity {
        monotonicity(&self.strides)
    }

    pub fn min_max_offsets(&self) -> (isize, isize) {
        min_max_offsets(&self.shape, &self.strides, self.offset)
    }

    /// Whether the reachable span holds exactly `len()` slots, with
    /// strides of a single sign.
    pub fn is_contiguous(&self) -> bool {
        let len = self.len();
        if len == 0 || self.iteration_order() == IterationOrder::Mixed {
            return false;
        }
        let (min, max) = self.min_max_offsets();
        (max - min + 1) as usize == len
    }

    /// Derived layout flags. `readonly` is always false here.
    pub fn flags(&self) -> Flags {
        let contiguous = self.is_contiguous();
        let monotonicity = self.monotonicity();
        Flags {
            row_major_contiguous: contiguous && monotonicity.row_major(),
            column_major_contiguous: contiguous && monotonicity.column_major(),
            readonly: false,
        }
    }

    /// Decompose a linear index into subscripts, treating `index` as a
    /// position in the traversal implied by `order`.
    pub fn unravel(&self, index: usize, order: Order) -> Vec<usize> {
        let mut coord = vec![0; self.shape.len()];
        let mut rest = index;
        let mut peel = |dim: usize| {
            let size = self.shape[dim];
            coord[dim] = rest % size;
            rest /= size;
        };
        match order {
            Order::RowMajor => (0..self.shape.len()).rev().for_each(&mut peel),
            Order::ColumnMajor => (0..self.shape.len()).for_each(&mut peel),
        }
        coord
    }

    /// Buffer index of the element at linear position `index`, by
    /// per-dimension decomposition. Valid for any layout.
    pub fn linear_offset(&self, index: usize, order: Order) -> usize {
        let mut offset = self.offset as isize;
        let mut rest = index;
        let mut peel = |dim: usize| {
            let size = self.shape[dim];
            offset += (rest % size) as isize * self.strides[dim];
            rest /= size;
        };
        match order {
            Order::RowMajor => (0..self.shape.len()).rev().for_each(&mut peel),
            Order::ColumnMajor => (0..self.shape.len()).for_each(&mut peel),
        }
        offset as usize
    }
}

impl sealed::Sealed for Layout {}

impl LayoutMap for Layout {
    fn rank(&self) -> usize {
        self.shape.len()
    }

    fn sizes(&self) -> &[usize] {
        &self.shape
    }

    fn offset_of(&self, coord: &[usize]) -> usize {
        // Dot product ∑ᵢ (strideᵢ × coordᵢ)
        let delta = self
            .strides
            .iter()
            .zip(coord)
            .map(|(&s, &i)| s * i as isize)
            .sum::<isize>();
        (self.offset as isize + delta) as usize
    }
}
