use std::collections::BTreeSet;

use cocoslice::augment::{SampleImage, Split};
use cocoslice::ir::{Category, CategoryId, ImageId};
use cocoslice::normalize::AnnotationNormalizer;
use cocoslice::store::{AnnotationStore, InMemoryStore};
use cocoslice::view::{DatasetView, ViewOptions};
use image::RgbImage;
use proptest::prelude::*;

mod proptest_helpers;

use proptest_helpers::{arb_raw_annotations, assert_aligned};

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn normalized_targets_are_aligned_and_positive(
        (width, height, annotations) in (8u32..=64, 8u32..=64)
            .prop_flat_map(|(w, h)| (Just(w), Just(h), arb_raw_annotations(w, h)))
    ) {
        let sample = AnnotationNormalizer::new(false)
            .normalize(SampleImage::Rgb(RgbImage::new(width, height)), ImageId::new(1), &annotations)
            .expect("normalize");
        let t = &sample.target;

        let res = assert_aligned(t);
        prop_assert!(res.is_ok(), "{}", res.unwrap_err());
        prop_assert!(t.iscrowd.iter().all(|&c| c == 0));

        let (w, h) = (f64::from(width), f64::from(height));
        for b in t.boxes.as_pixel().unwrap() {
            prop_assert!(b.xmax() > b.xmin() && b.ymax() > b.ymin());
            prop_assert!(b.xmin() >= 0.0 && b.xmax() <= w);
            prop_assert!(b.ymin() >= 0.0 && b.ymax() <= h);
        }

        let non_crowd = annotations.iter().filter(|a| !a.is_crowd()).count();
        prop_assert!(t.len() <= non_crowd);
    }

    #[test]
    fn view_catalog_is_requested_ids_present_in_store(
        store_ids in proptest::collection::btree_set(1u64..50, 0..10),
        requested in proptest::collection::vec(1u64..60, 0..10),
    ) {
        let store = store_ids.iter().fold(InMemoryStore::new(), |s, &id| {
            s.with_category(Category::new(id, format!("c{id}")))
        });
        let requested: Vec<CategoryId> = requested.into_iter().map(CategoryId::new).collect();

        let view = DatasetView::new(store, Split::Train, None, Some(requested.as_slice()), ViewOptions::default());

        let expected: BTreeSet<CategoryId> = requested
            .iter()
            .copied()
            .filter(|id| store_ids.contains(&id.as_u64()))
            .collect();
        let actual: BTreeSet<CategoryId> = view.catalog().keys().copied().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(view.store().category_catalog().len(), store_ids.len());
    }
}
