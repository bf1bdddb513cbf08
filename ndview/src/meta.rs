/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Binary view descriptors.
//!
//! A descriptor carries a view's metadata (not its elements) in a fixed
//! layout, so that another component can interpret the same buffer
//! without copying it:
//!
//! | field           | width              |
//! |-----------------|--------------------|
//! | endianness      | 1 (1 = little)     |
//! | dtype code      | 2                  |
//! | ndims           | 8                  |
//! | shape           | 8 × ndims          |
//! | strides (bytes) | 8 × ndims          |
//! | offset (bytes)  | 8                  |
//! | order code      | 1                  |
//! | index mode      | 1                  |
//! | submode count   | 8                  |
//! | submodes        | 1 × nsubmodes      |
//! | flags           | 4                  |
//!
//! Multi-byte fields are written in host byte order; the leading byte
//! tells a reader which. Byte strides and offsets use a zero element
//! size for dtypes without one.

use bytes::BufMut;
use bytes::Bytes;
use bytes::BytesMut;

use crate::buffer::Buffer;
use crate::config;
use crate::dtype::DType;
use crate::dtype::IndexMode;
use crate::dtype::Order;
use crate::view::View;

/// Bit set in the flags word when the view is read-only.
const READONLY_BIT: i32 = 4;

/// Whether the host has native 64-bit integers.
const WIDE_AVAILABLE: bool = cfg!(target_pointer_width = "64");

/// Errors from descriptor encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MetaError {
    #[error("wide metadata encoding is unavailable on this host")]
    WideUnavailable,

    #[error("invalid metadata encoding: {0}")]
    InvalidEncoding(String),
}

/// How 64-bit descriptor fields are written. Both encodings produce
/// identical bytes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter
)]
#[strum(serialize_all = "lowercase")]
pub enum MetaEncoding {
    /// Native 64-bit writes.
    Wide,
    /// Two native 32-bit writes per field.
    Split,
}

impl MetaEncoding {
    /// Whether this host can use the encoding.
    pub fn is_available(self) -> bool {
        match self {
            MetaEncoding::Wide => WIDE_AVAILABLE,
            MetaEncoding::Split => true,
        }
    }

    /// Resolve a requested encoding; `None` picks the best one the
    /// host supports.
    pub fn select(requested: Option<MetaEncoding>) -> Result<MetaEncoding, MetaError> {
        match requested {
            Some(encoding) if !encoding.is_available() => Err(MetaError::WideUnavailable),
            Some(encoding) => Ok(encoding),
            None if WIDE_AVAILABLE => Ok(MetaEncoding::Wide),
            None => Ok(MetaEncoding::Split),
        }
    }

    /// Parse an encoding name.
    pub fn parse(name: &str) -> Result<MetaEncoding, MetaError> {
        name.parse::<MetaEncoding>()
            .map_err(|_| MetaError::InvalidEncoding(name.to_string()))
    }

    fn writer(self) -> &'static dyn WordWriter {
        match self {
            MetaEncoding::Wide => &Wide,
            MetaEncoding::Split => &Split,
        }
    }
}

/// Writes one 64-bit descriptor field.
trait WordWriter {
    fn put_word(&self, buf: &mut BytesMut, value: i64);
}

struct Wide;

impl WordWriter for Wide {
    fn put_word(&self, buf: &mut BytesMut, value: i64) {
        buf.put_slice(&value.to_ne_bytes());
    }
}

struct Split;

impl WordWriter for Split {
    fn put_word(&self, buf: &mut BytesMut, value: i64) {
        let low = value as u32;
        let high = (value >> 32) as u32;
        let (first, second) = if cfg!(target_endian = "little") {
            (low, high)
        } else {
            (high, low)
        };
        buf.put_slice(&first.to_ne_bytes());
        buf.put_slice(&second.to_ne_bytes());
    }
}

/// Encoded size of a descriptor.
pub fn encoded_len(ndims: usize, nsubmodes: usize) -> usize {
    33 + 16 * ndims + nsubmodes
}

/// The fields of a view descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub dtype: DType,
    pub shape: Vec<usize>,
    /// Element strides, one per dimension.
    pub strides: Vec<isize>,
    pub offset: usize,
    pub order: Order,
    pub mode: IndexMode,
    pub submodes: Vec<IndexMode>,
    pub readonly: bool,
}

impl Descriptor {
    pub fn encoded_len(&self) -> usize {
        encoded_len(self.shape.len(), self.submodes.len())
    }

    /// Encode this descriptor.
    pub fn encode(&self, encoding: MetaEncoding) -> Bytes {
        let writer = encoding.writer();
        let bytes_per_element = self.dtype.bytes_per_element().unwrap_or(0) as i64;
        let mut buf = BytesMut::with_capacity(self.encoded_len());

        buf.put_u8(u8::from(cfg!(target_endian = "little")));
        buf.put_slice(&self.dtype.code().to_ne_bytes());
        writer.put_word(&mut buf, self.shape.len() as i64);
        for &size in &self.shape {
            writer.put_word(&mut buf, size as i64);
        }
        for &stride in self.strides.iter().take(self.shape.len()) {
            writer.put_word(&mut buf, stride as i64 * bytes_per_element);
        }
        writer.put_word(&mut buf, self.offset as i64 * bytes_per_element);
        buf.put_i8(self.order.code());
        buf.put_i8(self.mode.code());
        writer.put_word(&mut buf, self.submodes.len() as i64);
        for mode in &self.submodes {
            buf.put_i8(mode.code());
        }
        let flags = if self.readonly { READONLY_BIT } else { 0 };
        buf.put_slice(&flags.to_ne_bytes());

        debug_assert_eq!(buf.len(), self.encoded_len());
        buf.freeze()
    }
}

impl<B: Buffer> View<B> {
    /// This view's descriptor fields.
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            dtype: self.dtype(),
            shape: self.shape().to_vec(),
            strides: self.strides().iter().copied().take(self.ndims()).collect(),
            offset: self.offset(),
            order: self.order(),
            mode: self.index_mode(),
            submodes: self.submodes(),
            readonly: self.flags().readonly,
        }
    }

    /// The binary descriptor of this view. The encoding is cached:
    /// repeated calls return the same allocation until a change to the
    /// view's metadata requires a new one.
    pub fn meta(&self) -> Result<Bytes, MetaError> {
        let expected = encoded_len(self.ndims(), self.submodes().len());
        if let Some(cached) = self.meta_cache.borrow().as_ref() {
            if cached.len() == expected {
                return Ok(cached.clone());
            }
        }

        let encoding =
            MetaEncoding::select(self.meta_encoding.or(config::global().meta_encoding))?;
        let encoded = self.descriptor().encode(encoding);
        tracing::debug!(
            ndims = self.ndims(),
            bytes = encoded.len(),
            %encoding,
            "encoded view metadata"
        );
        *self.meta_cache.borrow_mut() = Some(encoded.clone());
        Ok(encoded)
    }
}
