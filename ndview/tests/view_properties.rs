/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

use ndview::Buffer;
use ndview::DType;
use ndview::MetaEncoding;
use ndview::Order;
use ndview::SharedBuffer;
use ndview::View;
use ndview::ViewJson;

fn float64(
    values: Vec<f64>,
    shape: &[usize],
    strides: &[isize],
    offset: usize,
    order: Order,
) -> View<SharedBuffer<f64>> {
    View::try_new(
        DType::Float64,
        SharedBuffer::from(values),
        shape,
        strides,
        offset,
        order,
    )
    .unwrap()
}

#[test]
fn contiguity_classification() {
    let buf = || vec![0.0; 8];

    let flags = float64(buf(), &[2, 2], &[2, 1], 0, Order::RowMajor).flags();
    assert!(flags.row_major_contiguous);
    assert!(!flags.column_major_contiguous);

    let flags = float64(buf(), &[2, 2], &[1, 2], 0, Order::ColumnMajor).flags();
    assert!(!flags.row_major_contiguous);
    assert!(flags.column_major_contiguous);

    let flags = float64(buf(), &[4], &[1], 0, Order::RowMajor).flags();
    assert!(flags.row_major_contiguous);
    assert!(flags.column_major_contiguous);

    let flags = float64(buf(), &[2, 2, 2], &[4, 1, 2], 0, Order::ColumnMajor).flags();
    assert!(!flags.row_major_contiguous);
    assert!(!flags.column_major_contiguous);
}

#[test]
fn negative_stride_traversal() {
    let v = float64(vec![1.0, 2.0, 3.0, 4.0], &[2, 2], &[2, -1], 1, Order::RowMajor);
    assert_eq!(v.get(&[0, 0]), 2.0);
    assert_eq!(v.get(&[0, 1]), 1.0);
    assert_eq!(v.get(&[1, 0]), 4.0);
    assert_eq!(v.get(&[1, 1]), 3.0);
    assert_eq!(v.iter().collect::<Vec<_>>(), vec![2.0, 1.0, 4.0, 3.0]);
}

#[test]
fn zero_rank_view() {
    for k in 0..4 {
        let buffer = SharedBuffer::from(vec![1.0, 2.0, 3.0, 4.0]);
        let v = View::new(
            DType::Float64,
            buffer.clone(),
            Vec::<usize>::new(),
            vec![0],
            k,
            Order::RowMajor,
        );
        assert_eq!(v.get(&[]), buffer.get(k));
        assert_eq!(v.iget(0), buffer.get(k));

        v.set(&[], -1.0);
        assert_eq!(buffer.get(k), -1.0);
        v.iset(0, -2.0);
        assert_eq!(buffer.get(k), -2.0);
    }
}

#[test]
fn byte_lengths() {
    let v = float64(vec![1.0, 2.0, 3.0, 4.0], &[4], &[1], 0, Order::RowMajor);
    assert_eq!(v.byte_length(), Some(32));
    assert_eq!(v.bytes_per_element(), Some(8));

    let g = View::new(
        DType::Generic,
        SharedBuffer::from(vec![1.0, 2.0, 3.0, 4.0]),
        vec![4],
        vec![1],
        0,
        Order::RowMajor,
    );
    assert_eq!(g.byte_length(), None);
    assert_eq!(g.bytes_per_element(), None);
}

#[test]
fn metadata_determinism() {
    let make = || {
        float64(vec![1.0, 2.0, 3.0, 4.0], &[2, 2], &[2, -1], 1, Order::RowMajor)
            .with_meta_encoding(MetaEncoding::Split)
    };
    let v = make();
    let first = v.meta().unwrap();
    let second = v.meta().unwrap();
    assert_eq!(first.as_ptr(), second.as_ptr());

    let other = make().meta().unwrap();
    assert_eq!(first, other);
    assert_ne!(first.as_ptr(), other.as_ptr());
}

#[test]
fn json_text_round_trip() {
    let v = float64(
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        &[3, 2],
        &[-1, -3],
        5,
        Order::ColumnMajor,
    );
    let text = serde_json::to_string(&v).unwrap();
    let json: ViewJson<f64> = serde_json::from_str(&text).unwrap();
    let rebuilt = View::<SharedBuffer<f64>>::from_json(&json).unwrap();
    assert_eq!(rebuilt.offset(), 0);
    assert_eq!(rebuilt.strides(), &[1, 3]);
    assert_eq!(serde_json::to_string(&rebuilt).unwrap(), text);
    assert_eq!(
        rebuilt.to_string(),
        "ndarray( 'float64', new Float64Array( [ 6, 5, 4, 3, 2, 1 ] ), [ 3, 2 ], [ 1, 3 ], 0, 'column-major' )"
    );
}
