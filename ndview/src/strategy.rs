/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Property-based generators for views.
//!
//! The main entry point is [`gen_view_case`], which produces a layout
//! (shape, signed strides, offset, order) together with the smallest
//! buffer that contains it. Buffer slot `i` holds the value `i as f64`,
//! so an element read identifies the buffer index it came from.
//!
//! This module is only included in test builds (`#[cfg(test)]`).

use proptest::prelude::*;

use crate::buffer::SharedBuffer;
use crate::dtype::DType;
use crate::dtype::Order;
use crate::layout::Layout;
use crate::view::View;

/// A generated view layout and the size of the buffer backing it.
#[derive(Debug, Clone)]
pub struct ViewCase {
    pub shape: Vec<usize>,
    pub strides: Vec<isize>,
    pub offset: usize,
    pub order: Order,
    pub buffer_len: usize,
}

impl ViewCase {
    /// Build a `float64` view over a fresh buffer holding `0..len`.
    pub fn build(&self) -> View<SharedBuffer<f64>> {
        let values: Vec<f64> = (0..self.buffer_len).map(|i| i as f64).collect();
        View::new(
            DType::Float64,
            SharedBuffer::from(values),
            self.shape.clone(),
            self.strides.clone(),
            self.offset,
            self.order,
        )
    }
}

fn gen_order() -> impl Strategy<Value = Order> {
    prop_oneof![Just(Order::RowMajor), Just(Order::ColumnMajor)]
}

/// Generates a view with up to `max_dims` dimensions of size
/// `1..=max_len`.
///
/// Stride magnitudes start from the dense strides of either order
/// (chosen independently of the view's declared order) and are
/// optionally stretched per dimension, which introduces gaps. Each
/// stride's sign is random. The offset is the smallest one that keeps
/// every reachable index non-negative.
///
/// Roughly: a quarter of cases are contiguous in the declared order,
/// a quarter contiguous in the other order, the rest strided or mixed
/// in sign.
pub fn gen_view_case(max_dims: usize, max_len: usize) -> impl Strategy<Value = ViewCase> {
    prop::collection::vec(1..=max_len, 0..=max_dims).prop_flat_map(|shape| {
        let ndims = shape.len();
        (
            Just(shape),
            gen_order(),
            gen_order(),
            prop::collection::vec(any::<bool>(), ndims),
            prop::collection::vec(prop_oneof![3 => Just(1usize), 1 => 2usize..=3], ndims),
        )
            .prop_map(|(shape, order, memory_order, negative, stretch)| {
                let dense = match memory_order {
                    Order::RowMajor => Layout::row_major_strides(&shape),
                    Order::ColumnMajor => Layout::column_major_strides(&shape),
                };
                let mut strides: Vec<isize> = dense
                    .iter()
                    .zip(&stretch)
                    .zip(&negative)
                    .map(|((&s, &k), &neg)| {
                        let s = s * k as isize;
                        if neg { -s } else { s }
                    })
                    .collect();
                if strides.is_empty() {
                    strides.push(0);
                }
                let offset: usize = shape
                    .iter()
                    .zip(&strides)
                    .filter(|(_, s)| **s < 0)
                    .map(|(&n, &s)| s.unsigned_abs() * (n - 1))
                    .sum();
                let (_, max) = Layout::new(shape.clone(), strides.clone(), offset).min_max_offsets();
                ViewCase {
                    shape,
                    strides,
                    offset,
                    order,
                    buffer_len: max as usize + 1,
                }
            })
    })
}

/// Generates a view that is contiguous in its declared order, with
/// all strides of one sign.
pub fn gen_contiguous_case(max_dims: usize, max_len: usize) -> impl Strategy<Value = ViewCase> {
    (
        prop::collection::vec(1..=max_len, 0..=max_dims),
        gen_order(),
        any::<bool>(),
    )
        .prop_map(|(shape, order, negative)| {
            let dense = match order {
                Order::RowMajor => Layout::row_major_strides(&shape),
                Order::ColumnMajor => Layout::column_major_strides(&shape),
            };
            let len: usize = shape.iter().product();
            let (strides, offset) = if negative {
                (dense.iter().map(|s| -s).collect(), len - 1)
            } else {
                (dense, 0)
            };
            let strides = if shape.is_empty() { vec![0] } else { strides };
            ViewCase {
                shape,
                strides,
                offset,
                order,
                buffer_len: len,
            }
        })
}
