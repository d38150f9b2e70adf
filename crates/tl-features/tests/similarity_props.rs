//! Range and threshold properties of the similarity primitives.

use proptest::prelude::*;
use tl_features::similarity::{quantity_similarity, string_similarity};

proptest! {
    #[test]
    fn string_similarity_in_unit_range(a in "[a-z ,]{0,24}", b in "[a-z ,]{0,24}", threshold in 0.05f64..=1.0) {
        let sim = string_similarity(&a, &b, threshold, ',');
        prop_assert!((0.0..=1.0).contains(&sim));
        prop_assert!(sim == 0.0 || sim >= threshold);
    }

    #[test]
    fn string_similarity_is_symmetric(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        prop_assert_eq!(
            string_similarity(&a, &b, 0.5, ','),
            string_similarity(&b, &a, 0.5, ',')
        );
    }

    #[test]
    fn lowering_threshold_never_lowers_string_similarity(
        a in "[a-z ]{1,16}",
        b in "[a-z ]{1,16}",
        high in 0.5f64..=1.0,
        drop in 0.0f64..0.45,
    ) {
        let strict = string_similarity(&a, &b, high, ',');
        let lenient = string_similarity(&a, &b, high - drop, ',');
        prop_assert!(lenient >= strict);
    }

    #[test]
    fn quantity_similarity_in_unit_range(a in -1e6f64..1e6, b in -1e6f64..1e6, threshold in 0.05f64..=1.0) {
        let sim = quantity_similarity(a, b, threshold);
        prop_assert!((0.0..=1.0).contains(&sim));
        prop_assert!(sim == 0.0 || sim >= threshold);
    }

    #[test]
    fn equal_quantities_always_match(a in -1e6f64..1e6, threshold in 0.05f64..=1.0) {
        prop_assert_eq!(quantity_similarity(a, a, threshold), 1.0);
    }
}
