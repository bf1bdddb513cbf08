/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Strided N-dimensional views over flat buffers.
//!
//! Provides [`View`], which interprets a shared one-dimensional
//! [`Buffer`] as an N-dimensional array through a shape, signed
//! strides, a base offset and a memory [`Order`]. Views support access
//! by subscripts or by linear index, report their contiguity, and
//! render themselves as text, as a JSON record ([`ViewJson`]) or as a
//! compact binary descriptor ([`View::meta`]).
//!
//! Layout properties are computed once, when a view is constructed.
//! Views whose memory is contiguous in their declared order resolve
//! linear indices with a single multiply-add; all others unravel the
//! index per dimension.

mod buffer;
pub use buffer::Buffer;
pub use buffer::ComplexBuffer;
pub use buffer::Element;
pub use buffer::FromComponents;
pub use buffer::Scalar;
pub use buffer::SharedBuffer;

/// Data types, memory orders and index modes.
pub mod dtype;
pub use dtype::DType;
pub use dtype::IndexMode;
pub use dtype::Order;

/// Layout analysis: contiguity, iteration order and offsets.
pub mod layout;
pub use layout::Flags;
pub use layout::IterationOrder;
pub use layout::Layout;
pub use layout::LayoutMap;
pub use layout::Monotonicity;

mod view;
pub use view::View;
pub use view::ViewError;
pub use view::ViewIterator;

mod serialize;
pub use serialize::JsonFlags;
pub use serialize::ViewJson;

/// Binary view descriptors.
pub mod meta;
pub use meta::Descriptor;
pub use meta::MetaEncoding;
pub use meta::MetaError;

/// Environment-driven configuration.
pub mod config;
pub use config::Config;

/// Property-based generators for randomized test input.
#[cfg(test)]
pub mod strategy;
