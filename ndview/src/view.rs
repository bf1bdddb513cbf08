/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::cell::Cell;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bytes::Bytes;

use crate::buffer::Buffer;
use crate::buffer::Element;
use crate::dtype::DType;
use crate::dtype::IndexMode;
use crate::dtype::Order;
use crate::layout::Flags;
use crate::layout::IterationOrder;
use crate::layout::Layout;
use crate::layout::LayoutMap;
use crate::meta::MetaEncoding;

/// The type of error for view construction.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ViewError {
    #[error("invalid dims: expected {expected} strides, got {got}")]
    InvalidDims { expected: usize, got: usize },

    #[error("reachable indices {min}..={max} exceed buffer of length {len}")]
    OutOfBounds { min: isize, max: isize, len: usize },

    #[error("{element} storage cannot back dtype {dtype}")]
    IncompatibleDType { dtype: DType, element: &'static str },

    #[error("invalid json record: {reason}")]
    InvalidJson { reason: String },
}

/// Strides must match the shape one-for-one, except that a
/// zero-dimensional view may carry one placeholder stride.
pub(crate) fn check_dims(shape: &[usize], strides: &[isize]) -> Result<(), ViewError> {
    let placeholder = shape.is_empty() && strides.len() == 1;
    if strides.len() != shape.len() && !placeholder {
        return Err(ViewError::InvalidDims {
            expected: shape.len(),
            got: strides.len(),
        });
    }
    Ok(())
}

/// A strided, N-dimensional view over a flat [`Buffer`].
///
/// A view is described by a shape, signed strides, a base offset and a
/// nominal [`Order`]. The element at subscripts `(i₀, …, iₙ₋₁)` lives
/// at buffer index
///
/// ```text
/// offset + ∑ iₖ × strides[k]
/// ```
///
/// The buffer is shared: the view never resizes it, and other views
/// (or the creator) may read and write the same storage. Layout
/// properties are analyzed once, at construction.
///
/// Access methods do not check bounds. Callers must construct views
/// whose reachable indices lie inside the buffer (see
/// [`View::try_new`]) and must pass in-range subscripts; violations
/// panic on the slot lookup.
///
/// ```
/// use ndview::DType;
/// use ndview::Order;
/// use ndview::SharedBuffer;
/// use ndview::View;
///
/// let buffer = SharedBuffer::from(vec![1.0, 2.0, 3.0, 4.0]);
/// let view = View::new(DType::Float64, buffer, vec![2, 2], vec![2, -1], 1, Order::RowMajor);
/// assert_eq!(view.get(&[0, 0]), 2.0);
/// assert_eq!(view.iget(3), 3.0);
/// ```
pub struct View<B: Buffer> {
    buffer: B,
    /// Direct slots, when the buffer exposes them; accessors otherwise.
    slots: Option<Rc<[Cell<B::Elem>]>>,
    dtype: DType,
    layout: Layout,
    order: Order,
    length: usize,
    bytes_per_element: Option<usize>,
    byte_length: Option<usize>,
    iteration_order: IterationOrder,
    flags: Flags,
    /// +1 or -1 when linear indices map straight onto the buffer.
    linear_step: Option<isize>,
    pub(crate) mode: Option<IndexMode>,
    pub(crate) submodes: Option<Vec<IndexMode>>,
    pub(crate) meta_encoding: Option<MetaEncoding>,
    pub(crate) meta_cache: RefCell<Option<Bytes>>,
}

impl<B: Buffer> View<B> {
    /// Create a view without validating the layout against the
    /// buffer. A zero-dimensional view takes an empty shape and a
    /// single placeholder stride, conventionally `[0]`.
    pub fn new(
        dtype: DType,
        buffer: B,
        shape: impl Into<Vec<usize>>,
        strides: impl Into<Vec<isize>>,
        offset: usize,
        order: Order,
    ) -> Self {
        Self::from_layout(
            dtype,
            buffer,
            Layout::new(shape.into(), strides.into(), offset),
            order,
        )
    }

    fn from_layout(dtype: DType, buffer: B, layout: Layout, order: Order) -> Self {
        let length = layout.len();
        let bytes_per_element = dtype.bytes_per_element();
        let byte_length = bytes_per_element.map(|n| n * length);
        let iteration_order = layout.iteration_order();
        let flags = layout.flags();
        let contiguous_in_order = match order {
            Order::RowMajor => flags.row_major_contiguous,
            Order::ColumnMajor => flags.column_major_contiguous,
        };
        let linear_step = match iteration_order {
            IterationOrder::Forward | IterationOrder::Backward if contiguous_in_order => {
                Some(iteration_order.sign())
            }
            _ => None,
        };
        let slots = buffer.slots();

        tracing::trace!(
            %dtype,
            ndims = layout.rank(),
            length,
            ?flags,
            accessors = slots.is_none(),
            "created view"
        );

        Self {
            buffer,
            slots,
            dtype,
            layout,
            order,
            length,
            bytes_per_element,
            byte_length,
            iteration_order,
            flags,
            linear_step,
            mode: None,
            submodes: None,
            meta_encoding: None,
            meta_cache: RefCell::new(None),
        }
    }

    /// Create a view, validating that:
    ///   - shape and strides have the same number of dimensions (a
    ///     zero-dimensional view may carry one placeholder stride),
    ///   - the buffer's element type can back `dtype`,
    ///   - every reachable index lies inside the buffer.
    pub fn try_new(
        dtype: DType,
        buffer: B,
        shape: impl Into<Vec<usize>>,
        strides: impl Into<Vec<isize>>,
        offset: usize,
        order: Order,
    ) -> Result<Self, ViewError> {
        let shape = shape.into();
        let strides = strides.into();
        check_dims(&shape, &strides)?;
        if !<B::Elem as Element>::supports(dtype) {
            return Err(ViewError::IncompatibleDType {
                dtype,
                element: std::any::type_name::<B::Elem>(),
            });
        }
        let layout = Layout::new(shape, strides, offset);
        if !layout.is_empty() {
            let (min, max) = layout.min_max_offsets();
            if min < 0 || max >= buffer.len() as isize {
                return Err(ViewError::OutOfBounds {
                    min,
                    max,
                    len: buffer.len(),
                });
            }
        }
        Ok(Self::from_layout(dtype, buffer, layout, order))
    }

    /// Set the primary index mode and per-dimension submodes recorded
    /// in the binary metadata.
    pub fn with_index_mode(mut self, mode: IndexMode, submodes: Vec<IndexMode>) -> Self {
        self.mode = Some(mode);
        self.submodes = Some(submodes);
        self.meta_cache.get_mut().take();
        self
    }

    /// Pin the metadata writer for this view instead of using the
    /// configured default.
    pub fn with_meta_encoding(mut self, encoding: MetaEncoding) -> Self {
        self.meta_encoding = Some(encoding);
        self.meta_cache.get_mut().take();
        self
    }

    /// Size of the viewed elements in bytes, if the dtype has a fixed
    /// element size.
    pub fn byte_length(&self) -> Option<usize> {
        self.byte_length
    }

    pub fn bytes_per_element(&self) -> Option<usize> {
        self.bytes_per_element
    }

    /// The underlying buffer.
    pub fn data(&self) -> &B {
        &self.buffer
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// A copy of the view's flags.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Mark the view read-only (or not). The flag is recorded in the
    /// serialized forms; writes are not blocked.
    pub fn set_readonly(&mut self, readonly: bool) {
        self.flags.readonly = readonly;
        self.meta_cache.get_mut().take();
    }

    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn ndims(&self) -> usize {
        self.layout.rank()
    }

    /// Buffer index of the element at all-zero subscripts.
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Strides with their signs.
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn iteration_order(&self) -> IterationOrder {
        self.iteration_order
    }

    /// The primary index mode (defaults to [`IndexMode::Throw`]).
    pub fn index_mode(&self) -> IndexMode {
        self.mode.unwrap_or_default()
    }

    /// Per-dimension index modes (defaults to the primary mode alone).
    pub fn submodes(&self) -> Vec<IndexMode> {
        self.submodes
            .clone()
            .unwrap_or_else(|| vec![self.index_mode()])
    }

    /// Whether elements are read through buffer accessors rather than
    /// direct slots.
    pub fn uses_accessors(&self) -> bool {
        self.slots.is_none()
    }

    #[inline]
    fn read(&self, index: usize) -> B::Elem {
        match &self.slots {
            Some(slots) => slots[index].get(),
            None => self.buffer.get(index),
        }
    }

    #[inline]
    fn write(&self, index: usize, value: B::Elem) {
        match &self.slots {
            Some(slots) => slots[index].set(value),
            None => self.buffer.set(index, value),
        }
    }

    /// Buffer index of the element at linear position `index` in this
    /// view's order.
    #[inline]
    fn resolve(&self, index: usize) -> usize {
        if self.layout.rank() == 0 {
            return self.layout.offset();
        }
        match self.linear_step {
            Some(step) => (self.layout.offset() as isize + step * index as isize) as usize,
            None => self.layout.linear_offset(index, self.order),
        }
    }

    /// The element at `subscripts`. One subscript per dimension; none
    /// for a zero-dimensional view.
    pub fn get(&self, subscripts: &[usize]) -> B::Elem {
        self.read(self.layout.offset_of(subscripts))
    }

    /// Write `value` at `subscripts`. Returns the view for chaining.
    pub fn set(&self, subscripts: &[usize], value: B::Elem) -> &Self {
        self.write(self.layout.offset_of(subscripts), value);
        self
    }

    /// The element at linear position `index`, counting in this view's
    /// [`Order`]. A zero-dimensional view ignores `index`.
    pub fn iget(&self, index: usize) -> B::Elem {
        self.read(self.resolve(index))
    }

    /// Write `value` at linear position `index`. Returns the view for
    /// chaining.
    pub fn iset(&self, index: usize, value: B::Elem) -> &Self {
        self.write(self.resolve(index), value);
        self
    }

    /// The single element of a zero-dimensional view.
    pub fn scalar(&self) -> Option<B::Elem> {
        (self.layout.rank() == 0).then(|| self.read(self.layout.offset()))
    }

    /// Iterator over the view's elements in linear order.
    pub fn iter(&self) -> ViewIterator<'_, B> {
        ViewIterator {
            view: self,
            index: 0,
        }
    }
}

impl<B: Buffer> fmt::Debug for View<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("dtype", &self.dtype)
            .field("shape", &self.layout.shape())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .field("order", &self.order)
            .field("flags", &self.flags)
            .finish()
    }
}

impl<'a, B: Buffer> IntoIterator for &'a View<B> {
    type Item = B::Elem;
    type IntoIter = ViewIterator<'a, B>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterates over a view's elements in linear order (see
/// [`View::iget`]).
pub struct ViewIterator<'a, B: Buffer> {
    view: &'a View<B>,
    index: usize,
}

impl<B: Buffer> Iterator for ViewIterator<'_, B> {
    type Item = B::Elem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.view.len() {
            return None;
        }
        let value = self.view.iget(self.index);
        self.index += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<B: Buffer> ExactSizeIterator for ViewIterator<'_, B> {}
