/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Textual and structured representations of a view.
//!
//! Both forms describe a forward traversal from offset 0: strides are
//! written without their signs, and elements are listed in the view's
//! linear order. Neither form records the view's offset.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;

use crate::buffer::Buffer;
use crate::buffer::Element;
use crate::buffer::FromComponents;
use crate::buffer::Scalar;
use crate::dtype::DType;
use crate::dtype::Order;
use crate::layout::Layout;
use crate::view::View;
use crate::view::ViewError;
use crate::view::check_dims;

/// Views longer than this list only their first and last
/// [`EDGE_ITEMS`] elements.
const MAX_LISTED: usize = 100;
const EDGE_ITEMS: usize = 3;

/// The `READONLY` flag as it appears in [`ViewJson`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonFlags {
    #[serde(rename = "READONLY")]
    pub readonly: bool,
}

/// The structured form of a view: its metadata plus its elements,
/// flattened to components in linear order. Complex elements
/// contribute two consecutive entries (real, imaginary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewJson<C> {
    /// Always `"ndarray"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub dtype: DType,
    pub flags: JsonFlags,
    pub order: Order,
    pub shape: Vec<usize>,
    /// Stride magnitudes.
    pub strides: Vec<isize>,
    pub data: Vec<C>,
}

const KIND: &str = "ndarray";

impl<B: Buffer> View<B> {
    /// The structured form of this view.
    pub fn to_json(&self) -> ViewJson<<B::Elem as Element>::Component> {
        let mut data = Vec::with_capacity(self.len() * B::Elem::WIDTH);
        for value in self {
            value.push_components(&mut data);
        }
        ViewJson {
            kind: KIND.to_string(),
            dtype: self.dtype(),
            flags: JsonFlags {
                readonly: self.flags().readonly,
            },
            order: self.order(),
            shape: self.shape().to_vec(),
            strides: self.strides().iter().map(|s| s.abs()).collect(),
            data,
        }
    }

    /// Rebuild a view over a fresh buffer from its structured form.
    ///
    /// The new view starts at offset 0 with the recorded strides. The
    /// buffer is sized to the layout's reachable span and each element
    /// is written at the slot its linear index resolves to, so the
    /// rebuilt view lists the same elements in the same order. Slots
    /// outside the layout hold copies of the first element. Layouts
    /// that map two elements to one slot are rejected.
    pub fn from_json(json: &ViewJson<<B::Elem as Element>::Component>) -> Result<Self, ViewError>
    where
        B: FromComponents,
    {
        if json.kind != KIND {
            return Err(ViewError::InvalidJson {
                reason: format!("expected type {:?}, got {:?}", KIND, json.kind),
            });
        }
        check_dims(&json.shape, &json.strides)?;
        let len: usize = json.shape.iter().product();
        let expected = len * B::Elem::WIDTH;
        if json.data.len() != expected {
            return Err(ViewError::InvalidJson {
                reason: format!(
                    "expected {} data entries for shape {:?}, got {}",
                    expected,
                    json.shape,
                    json.data.len()
                ),
            });
        }

        let layout = Layout::new(json.shape.clone(), json.strides.clone(), 0);
        let span = if layout.is_empty() {
            0
        } else {
            let (_, max) = layout.min_max_offsets();
            max.max(0) as usize + 1
        };
        let fill = &json.data[..expected.min(B::Elem::WIDTH)];
        let buffer = B::from_components(
            fill.iter()
                .cycle()
                .take(span * B::Elem::WIDTH)
                .copied()
                .collect(),
        );
        let mut view = View::try_new(
            json.dtype,
            buffer,
            json.shape.clone(),
            json.strides.clone(),
            0,
            json.order,
        )?;

        let mut filled = vec![false; span];
        for index in 0..len {
            let slot = view.layout().linear_offset(index, view.order());
            if std::mem::replace(&mut filled[slot], true) {
                return Err(ViewError::InvalidJson {
                    reason: format!(
                        "strides {:?} map more than one element to buffer index {}",
                        json.strides, slot
                    ),
                });
            }
        }
        for (index, components) in json.data.chunks(B::Elem::WIDTH).enumerate() {
            view.iset(index, <B::Elem as Element>::from_components(components));
        }

        view.set_readonly(json.flags.readonly);
        Ok(view)
    }

    fn push_literals(&self, index: usize, out: &mut Vec<String>) {
        let mut components = Vec::with_capacity(B::Elem::WIDTH);
        self.iget(index).push_components(&mut components);
        out.extend(components.iter().map(Scalar::literal));
    }

    fn data_literal(&self) -> String {
        let len = self.len();
        let mut parts = Vec::new();
        if len <= MAX_LISTED {
            for index in 0..len {
                self.push_literals(index, &mut parts);
            }
        } else {
            for index in 0..EDGE_ITEMS {
                self.push_literals(index, &mut parts);
            }
            parts.push("...".to_string());
            for index in len - EDGE_ITEMS..len {
                self.push_literals(index, &mut parts);
            }
        }
        parts.join(", ")
    }
}

fn join<T: ToString>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a constructor-call reconstruction of the view:
///
/// ```text
/// ndarray( '<dtype>', <data>, <shape>, <|strides|>, 0, '<order>' )
/// ```
impl<B: Buffer> fmt::Display for View<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self
            .dtype()
            .literal_template()
            .replace("{{data}}", &self.data_literal());
        write!(f, "ndarray( '{}', {}, ", self.dtype(), data)?;
        if self.ndims() == 0 {
            write!(f, "[], [ 0 ]")?;
        } else {
            write!(
                f,
                "[ {} ], [ {} ]",
                join(self.shape()),
                join(self.strides().iter().map(|s| s.abs()))
            )?;
        }
        write!(f, ", 0, '{}' )", self.order())
    }
}

impl<B: Buffer> Serialize for View<B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
