/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Element types and the buffers views read from.
//!
//! Buffers are cheap shared handles: cloning one yields another handle
//! to the same storage, and writes through any handle are visible to
//! all of them. Storage is fixed-length and never reallocated.
//!
//! A buffer either exposes its storage as plain slots (one element per
//! slot, see [`Buffer::slots`]) or only through accessor methods, as
//! with [`ComplexBuffer`], whose elements are assembled from
//! interleaved components.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use num_complex::Complex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::dtype::DType;

/// A primitive value that appears in serialized output.
pub trait Scalar: Copy + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static {
    /// Render the value as it appears in a view's textual form.
    fn literal(&self) -> String;
}

macro_rules! impl_scalar_display {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn literal(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_scalar_display!(bool, i8, u8, i16, u16, i32, u32);

/// Render a float the way a JavaScript number prints: shortest
/// round-trip digits, no sign on zero, plain notation for decimal
/// exponents in `-6..21` and `d.ddde±x` otherwise.
fn number_literal(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // value = 0.d₁d₂…dₖ × 10ⁿ
    let n = exponent + 1;
    let sign = if value < 0.0 { "-" } else { "" };

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat(-n as usize), digits)
    } else {
        let (lead, rest) = digits.split_at(1);
        let exponent_sign = if n - 1 < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{}e{}{}", lead, exponent_sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", lead, rest, exponent_sign, (n - 1).abs())
        }
    };
    format!("{}{}", sign, body)
}

/// `f32` values print as the `f64` they widen to.
macro_rules! impl_scalar_float {
    ($($t:ty),*) => {
        $(
            impl Scalar for $t {
                fn literal(&self) -> String {
                    number_literal(f64::from(*self))
                }
            }
        )*
    };
}

impl_scalar_float!(f32, f64);

/// A value stored in a buffer slot. Complex elements flatten to two
/// components (real, imaginary); all other elements to one.
pub trait Element: Copy + PartialEq + fmt::Debug + 'static {
    type Component: Scalar;

    /// Number of components per element.
    const WIDTH: usize;

    /// Append this element's components to `out`.
    fn push_components(self, out: &mut Vec<Self::Component>);

    /// Assemble an element from exactly [`Self::WIDTH`] components.
    fn from_components(components: &[Self::Component]) -> Self;

    /// Whether storage of this element type can back a view of `dtype`.
    fn supports(dtype: DType) -> bool;
}

macro_rules! impl_element {
    ($($t:ty => [$($dtype:ident),*]),* $(,)?) => {
        $(
            impl Element for $t {
                type Component = $t;
                const WIDTH: usize = 1;

                fn push_components(self, out: &mut Vec<$t>) {
                    out.push(self);
                }

                fn from_components(components: &[$t]) -> Self {
                    components[0]
                }

                fn supports(dtype: DType) -> bool {
                    matches!(dtype, DType::Generic $(| DType::$dtype)*)
                }
            }
        )*
    };
}

impl_element! {
    bool => [Bool],
    i8 => [Int8],
    u8 => [Uint8, Uint8c, Binary],
    i16 => [Int16],
    u16 => [Uint16],
    i32 => [Int32],
    u32 => [Uint32],
    f32 => [Float32],
    f64 => [Float64],
}

macro_rules! impl_complex_element {
    ($($t:ty => $dtype:ident),*) => {
        $(
            impl Element for Complex<$t> {
                type Component = $t;
                const WIDTH: usize = 2;

                fn push_components(self, out: &mut Vec<$t>) {
                    out.push(self.re);
                    out.push(self.im);
                }

                fn from_components(components: &[$t]) -> Self {
                    Complex::new(components[0], components[1])
                }

                fn supports(dtype: DType) -> bool {
                    matches!(dtype, DType::Generic | DType::$dtype)
                }
            }
        )*
    };
}

impl_complex_element!(f32 => Complex64, f64 => Complex128);

/// Indexable, fixed-length element storage shared between a view and
/// its creator.
///
/// Indices passed to [`Buffer::get`] and [`Buffer::set`] must be less
/// than [`Buffer::len`]; implementations may panic otherwise.
pub trait Buffer {
    type Elem: Element;

    /// Number of element slots.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct slot storage, for buffers that hold exactly one element
    /// per slot. `None` means elements are only reachable through
    /// [`Buffer::get`] and [`Buffer::set`].
    fn slots(&self) -> Option<Rc<[Cell<Self::Elem>]>> {
        None
    }

    /// Read the element at `index`.
    fn get(&self, index: usize) -> Self::Elem;

    /// Write `value` at `index`.
    fn set(&self, index: usize, value: Self::Elem);
}

/// Buffers that can be rebuilt from a flat component list, as
/// produced by [`crate::ViewJson`].
pub trait FromComponents: Buffer + Sized {
    fn from_components(components: Vec<<Self::Elem as Element>::Component>) -> Self;
}

/// Plain shared storage with one element per slot.
///
/// ```
/// use ndview::Buffer;
/// use ndview::SharedBuffer;
///
/// let a = SharedBuffer::from(vec![1.0, 2.0, 3.0]);
/// let b = a.clone();
/// b.set(1, 5.0);
/// assert_eq!(a.to_vec(), vec![1.0, 5.0, 3.0]);
/// ```
pub struct SharedBuffer<T>(Rc<[Cell<T>]>);

impl<T: Element> SharedBuffer<T> {
    /// A buffer of `len` copies of `value`.
    pub fn filled(len: usize, value: T) -> Self {
        Self::from(vec![value; len])
    }

    /// Copy the current contents out.
    pub fn to_vec(&self) -> Vec<T> {
        self.0.iter().map(Cell::get).collect()
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for SharedBuffer<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Element> fmt::Debug for SharedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(Cell::get)).finish()
    }
}

impl<T> From<Vec<T>> for SharedBuffer<T> {
    fn from(values: Vec<T>) -> Self {
        Self(values.into_iter().map(Cell::new).collect())
    }
}

impl<T: Element> Buffer for SharedBuffer<T> {
    type Elem = T;

    fn len(&self) -> usize {
        self.0.len()
    }

    fn slots(&self) -> Option<Rc<[Cell<T>]>> {
        Some(Rc::clone(&self.0))
    }

    fn get(&self, index: usize) -> T {
        self.0[index].get()
    }

    fn set(&self, index: usize, value: T) {
        self.0[index].set(value)
    }
}

impl<T: Element> FromComponents for SharedBuffer<T> {
    fn from_components(components: Vec<T::Component>) -> Self {
        components
            .chunks(T::WIDTH)
            .map(T::from_components)
            .collect::<Vec<_>>()
            .into()
    }
}

/// Complex storage laid out as interleaved `(re, im)` components.
/// Elements are only reachable through accessors.
pub struct ComplexBuffer<F>(Rc<[Cell<F>]>);

impl<F: Copy> ComplexBuffer<F> {
    /// Wrap interleaved components. A trailing unpaired component is
    /// ignored.
    pub fn from_interleaved(components: Vec<F>) -> Self {
        Self(components.into_iter().map(Cell::new).collect())
    }

    /// Copy the current components out, interleaved.
    pub fn to_interleaved(&self) -> Vec<F> {
        self.0.iter().map(Cell::get).collect()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<F> Clone for ComplexBuffer<F> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<F: Copy + fmt::Debug> fmt::Debug for ComplexBuffer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(Cell::get)).finish()
    }
}

impl<F: Copy> From<Vec<Complex<F>>> for ComplexBuffer<F> {
    fn from(values: Vec<Complex<F>>) -> Self {
        Self::from_interleaved(values.into_iter().flat_map(|c| [c.re, c.im]).collect())
    }
}

impl<F> Buffer for ComplexBuffer<F>
where
    F: Copy,
    Complex<F>: Element<Component = F>,
{
    type Elem = Complex<F>;

    fn len(&self) -> usize {
        self.0.len() / 2
    }

    fn get(&self, index: usize) -> Complex<F> {
        Complex::new(self.0[2 * index].get(), self.0[2 * index + 1].get())
    }

    fn set(&self, index: usize, value: Complex<F>) {
        self.0[2 * index].set(value.re);
        self.0[2 * index + 1].set(value.im);
    }
}

impl<F> FromComponents for ComplexBuffer<F>
where
    F: Copy,
    Complex<F>: Element<Component = F>,
{
    fn from_components(components: Vec<F>) -> Self {
        Self::from_interleaved(components)
    }
}
