#![forbid(unsafe_code)]

//! Property suites: invariants that must hold for arbitrary frames, not just
//! the hand-written fixtures.

use proptest::prelude::*;

use nd_frame::{DataFrame, FrameConfig, FrameOptions, Selector, Series};
use nd_groupby::GroupByExt;
use nd_index::{Index, IndexLabel};
use nd_types::{DType, ErrorKind, NullKind, Scalar, infer_dtype};

// ---------------------------------------------------------------------------
// Strategy generators
// ---------------------------------------------------------------------------

fn arb_scalar() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        3 => (-1_000i64..1_000).prop_map(Scalar::Int64),
        2 => (-1e3_f64..1e3).prop_map(Scalar::Float64),
        2 => "[a-d]{1,2}".prop_map(Scalar::Utf8),
        1 => any::<bool>().prop_map(Scalar::Bool),
        1 => Just(Scalar::Null(NullKind::NaN)),
        1 => Just(Scalar::Null(NullKind::Null)),
    ]
}

/// Small alphabet so groups collide.
fn arb_key() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        4 => "[a-c]".prop_map(Scalar::Utf8),
        1 => Just(Scalar::Null(NullKind::Null)),
    ]
}

/// Rows of `width` values with 1..=max_rows rows.
fn arb_rows(width: usize, max_rows: usize) -> impl Strategy<Value = Vec<Vec<Scalar>>> {
    proptest::collection::vec(proptest::collection::vec(arb_scalar(), width), 1..=max_rows)
}

fn arb_frame(max_rows: usize) -> impl Strategy<Value = DataFrame> {
    (1usize..4)
        .prop_flat_map(move |width| arb_rows(width, max_rows))
        .prop_filter_map("frame construction must succeed", |rows| {
            DataFrame::new(rows.into(), FrameOptions::default()).ok()
        })
}

/// Two key columns and one value column.
fn arb_keyed_frame(max_rows: usize) -> impl Strategy<Value = DataFrame> {
    proptest::collection::vec((arb_key(), arb_key(), -100i64..100), 0..=max_rows).prop_filter_map(
        "frame construction must succeed",
        |triples| {
            let rows: Vec<Vec<Scalar>> = triples
                .into_iter()
                .map(|(a, b, v)| vec![a, b, Scalar::Int64(v)])
                .collect();
            DataFrame::new(
                rows.into(),
                FrameOptions::default()
                    .columns(["a", "b", "v"])
                    .dtypes(vec![DType::Utf8, DType::Utf8, DType::Int64]),
            )
            .ok()
        },
    )
}

fn count_of(value: &Scalar) -> i64 {
    match value {
        Scalar::Int64(n) => *n,
        other => panic!("count should be an integer, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_identity_loc_is_a_copy(frame in arb_frame(20)) {
        let copy = frame.loc(&Selector::All, &Selector::All).expect("loc all");
        prop_assert_eq!(copy, frame);
    }

    #[test]
    fn prop_iloc_slice_length(frame in arb_frame(20), a in 0usize..=20, b in 0usize..=20) {
        let len = frame.len();
        let (start, end) = (a.min(len), b.min(len));
        let out = frame
            .iloc(&Selector::slice(&format!("{start}:{end}")), &Selector::All)
            .expect("in-range slice");
        prop_assert_eq!(out.len(), end.saturating_sub(start));
        prop_assert_eq!(out.index().len(), out.len());
        prop_assert_eq!(out.dtypes(), frame.dtypes());
    }

    #[test]
    fn prop_iloc_past_end_is_a_range_error(frame in arb_frame(10), extra in 1usize..5) {
        let past = frame.len() + extra;
        let err = frame
            .iloc(&Selector::slice(&format!("0:{past}")), &Selector::All)
            .expect_err("past the end");
        prop_assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn prop_mask_keeps_marked_positions(frame in arb_frame(20), seed in any::<u64>()) {
        let mask: Vec<bool> = (0..frame.len()).map(|i| (seed >> (i % 64)) & 1 == 1).collect();
        let out = frame.iloc(&Selector::mask(&mask), &Selector::All).expect("mask");
        let expected: Vec<&IndexLabel> = frame
            .index()
            .labels()
            .iter()
            .zip(&mask)
            .filter_map(|(label, keep)| keep.then_some(label))
            .collect();
        prop_assert_eq!(out.index().labels().iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn prop_groupby_conserves_rows(frame in arb_keyed_frame(30)) {
        let counts = frame
            .groupby(&["a", "b"])
            .expect("groupby")
            .col(&["v"])
            .expect("targets")
            .count()
            .expect("count");
        let total: i64 = counts.values().iter().map(|row| count_of(&row[2])).sum();
        prop_assert_eq!(total, frame.len() as i64);
        prop_assert!(counts.values().iter().all(|row| count_of(&row[2]) > 0));
    }

    #[test]
    fn prop_groupby_keys_are_distinct(frame in arb_keyed_frame(30)) {
        let grouped = frame.groupby(&["a", "b"]).expect("groupby");
        let groups = grouped.groups().expect("groups");
        for (i, (left, _)) in groups.iter().enumerate() {
            for (right, _) in &groups[i + 1..] {
                let same = left
                    .iter()
                    .zip(right)
                    .all(|(l, r)| l.semantic_eq(r) || (l.is_missing() && r.is_missing()));
                prop_assert!(!same, "{:?} appears twice", left);
            }
        }
    }

    #[test]
    fn prop_duplicate_index_is_rejected(values in proptest::collection::vec(arb_scalar(), 2..10)) {
        let mut labels: Vec<IndexLabel> = (0..values.len() as i64).map(IndexLabel::Int64).collect();
        labels[1] = labels[0].clone();
        let err = Series::new(values, FrameOptions::default().index(labels))
            .expect_err("duplicate labels");
        prop_assert_eq!(err.kind(), ErrorKind::DuplicateLabel);
    }

    #[test]
    fn prop_inference_ignores_values_past_the_window(
        (limit, window, tail) in (1usize..12).prop_flat_map(|limit| (
            Just(limit),
            proptest::collection::vec(arb_scalar(), limit),
            proptest::collection::vec(arb_scalar(), 0..12),
        )),
    ) {
        let mut all = window.clone();
        all.extend(tail);
        prop_assert_eq!(infer_dtype(&all, limit), infer_dtype(&window, usize::MAX));

        let series = Series::new(
            all,
            FrameOptions::default().config(FrameConfig::default().with_dtype_sample_limit(limit)),
        )
        .expect("series");
        prop_assert_eq!(series.dtype(), infer_dtype(&window, usize::MAX));
    }

    #[test]
    fn prop_index_take_preserves_labels(len in 1usize..20, picks in proptest::collection::vec(0usize..20, 0..10)) {
        let index = Index::range(len);
        let positions: Vec<usize> = picks.into_iter().filter(|&p| p < len).collect();
        let taken = index.take(&positions);
        for (pos, label) in positions.iter().zip(taken.labels()) {
            prop_assert_eq!(label, &IndexLabel::Int64(*pos as i64));
        }
    }
}
