#[cfg(test)]
mod local_recommendation_tests {
    use crate::recommender::{CURRENCY_EXCHANGE_ITEMS, LocalRecommender, MINIMAL_ITEMS};
    use crate::trip::{Activity, Companion, Labelled, Purpose, TransportMode, TripAttributes};

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_attributes_yield_minimal_set() {
        let recommender = LocalRecommender::new();
        let result = recommender.compute(&TripAttributes::default());
        assert_eq!(result, labels(&["passport", "charger", "sunscreen"]));
    }

    #[test]
    fn test_unmatched_purpose_matches_empty_purpose() {
        let recommender = LocalRecommender::new();
        let camping = TripAttributes {
            purpose: Some(Purpose::Camping),
            minimal_packing: Some(false),
            ..Default::default()
        };
        let unset = TripAttributes {
            purpose: Purpose::from_label("unknown-value"),
            minimal_packing: Some(false),
            ..Default::default()
        };
        assert_eq!(recommender.compute(&camping), labels(MINIMAL_ITEMS));
        assert_eq!(recommender.compute(&unset), labels(MINIMAL_ITEMS));
    }

    #[test]
    fn test_business_purpose_items() {
        let recommender = LocalRecommender::new();
        let attributes = TripAttributes {
            purpose: Some(Purpose::Business),
            transport_mode: Some(TransportMode::RentalCar),
            minimal_packing: Some(false),
            needs_currency_exchange: Some(false),
            ..Default::default()
        };
        assert_eq!(
            recommender.compute(&attributes),
            labels(&[
                "passport",
                "charger",
                "suit",
                "laptop",
                "work-documents",
                "international-driving-permit",
            ])
        );
    }

    #[test]
    fn test_minimal_packing_short_circuits_purpose_and_activities() {
        let recommender = LocalRecommender::new();
        let attributes = TripAttributes {
            purpose: Some(Purpose::Business),
            transport_mode: Some(TransportMode::PublicTransit),
            activities: vec![Activity::Hiking, Activity::SeaSwim],
            minimal_packing: Some(true),
            needs_currency_exchange: Some(false),
            companions: vec![],
        };
        assert_eq!(recommender.compute(&attributes), labels(MINIMAL_ITEMS));
    }

    #[test]
    fn test_currency_exchange_applies_with_minimal_packing() {
        let recommender = LocalRecommender::new();
        let attributes = TripAttributes {
            minimal_packing: Some(true),
            needs_currency_exchange: Some(true),
            ..Default::default()
        };
        assert_eq!(
            recommender.compute(&attributes),
            labels(&["passport", "charger", "sunscreen", "won", "wallet"])
        );
    }

    #[test]
    fn test_companions_apply_with_minimal_packing() {
        let recommender = LocalRecommender::new();
        let attributes = TripAttributes {
            minimal_packing: Some(true),
            companions: vec![Companion::Infant],
            ..Default::default()
        };
        let result = recommender.compute(&attributes);
        assert!(result.contains(&"diapers".to_string()));
        assert!(result.contains(&"baby-bottle".to_string()));
    }

    #[test]
    fn test_companion_items() {
        let recommender = LocalRecommender::new();
        let attributes = TripAttributes {
            purpose: Some(Purpose::Business),
            minimal_packing: Some(false),
            companions: vec![Companion::Pet, Companion::Minor, Companion::Elderly],
            ..Default::default()
        };
        let result = recommender.compute(&attributes);
        let tail: Vec<&str> = result.iter().skip(5).map(|s| s.as_str()).collect();
        assert_eq!(
            tail,
            vec![
                "pet-food",
                "snacks",
                "waste-bags",
                "comfortable-shoes",
                "walking-cane"
            ]
        );
    }

    #[test]
    fn test_activity_order_follows_selection_order() {
        let recommender = LocalRecommender::new();
        let swim_first = TripAttributes {
            purpose: Some(Purpose::Business),
            activities: vec![Activity::SeaSwim, Activity::Hiking],
            minimal_packing: Some(false),
            ..Default::default()
        };
        let result = recommender.compute(&swim_first);
        let swimsuit = result.iter().position(|l| l == "swimsuit").unwrap();
        let tracksuit = result.iter().position(|l| l == "tracksuit").unwrap();
        assert!(swimsuit < tracksuit);
    }

    #[test]
    fn test_healing_trip_scenario() {
        let recommender = LocalRecommender::new();
        let attributes = TripAttributes {
            purpose: Some(Purpose::Healing),
            transport_mode: Some(TransportMode::PublicTransit),
            activities: vec![Activity::FoodTour],
            minimal_packing: Some(false),
            needs_currency_exchange: Some(true),
            companions: vec![],
        };
        let result = recommender.compute(&attributes);
        assert_eq!(
            result,
            labels(&[
                "passport",
                "charger",
                "comfortable-shoes",
                "wet-wipes",
                "transit-card",
                "won",
                "wallet",
            ])
        );
        let wet_wipes = result.iter().filter(|l| *l == "wet-wipes").count();
        assert_eq!(wet_wipes, 1, "food tour wet wipes must be deduplicated");
        for item in CURRENCY_EXCHANGE_ITEMS {
            assert!(result.contains(&item.to_string()));
        }
    }
}

#[cfg(test)]
mod local_recommendation_proptests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use crate::recommender::{BASELINE_ITEMS, CURRENCY_EXCHANGE_ITEMS, LocalRecommender};
    use crate::trip::{Activity, Companion, Labelled, Purpose, TransportMode, TripAttributes};

    fn trip_attributes() -> impl Strategy<Value = TripAttributes> {
        (
            prop::option::of(prop::sample::select(Purpose::ALL.to_vec())),
            prop::option::of(prop::sample::select(TransportMode::ALL.to_vec())),
            prop::sample::subsequence(Activity::ALL.to_vec(), 0..=Activity::ALL.len())
                .prop_shuffle(),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
            prop::sample::subsequence(Companion::ALL.to_vec(), 0..=Companion::ALL.len())
                .prop_shuffle(),
        )
            .prop_map(
                |(purpose, transport_mode, activities, minimal, exchange, companions)| {
                    TripAttributes {
                        purpose,
                        transport_mode,
                        activities,
                        minimal_packing: minimal,
                        needs_currency_exchange: exchange,
                        companions,
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_computation_is_deterministic(attributes in trip_attributes()) {
            let recommender = LocalRecommender::new();
            let first = recommender.compute(&attributes);
            let second = recommender.compute(&attributes);
            prop_assert_eq!(&first, &second);

            let unique: HashSet<&String> = first.iter().collect();
            prop_assert_eq!(unique.len(), first.len(), "labels must be unique");

            for item in BASELINE_ITEMS {
                prop_assert!(first.contains(&item.to_string()));
            }
        }

        #[test]
        fn prop_minimal_packing_bypasses_purpose_activity_and_transport(
            attributes in trip_attributes(),
        ) {
            let recommender = LocalRecommender::new();
            let minimal = TripAttributes {
                minimal_packing: Some(true),
                ..attributes.clone()
            };
            let stripped = TripAttributes {
                purpose: None,
                transport_mode: None,
                activities: vec![],
                minimal_packing: Some(true),
                ..attributes
            };
            prop_assert_eq!(recommender.compute(&minimal), recommender.compute(&stripped));
        }

        #[test]
        fn prop_currency_exchange_always_added(attributes in trip_attributes()) {
            let recommender = LocalRecommender::new();
            let exchanging = TripAttributes {
                needs_currency_exchange: Some(true),
                ..attributes
            };
            let result = recommender.compute(&exchanging);
            for item in CURRENCY_EXCHANGE_ITEMS {
                prop_assert!(result.contains(&item.to_string()), "missing {}", item);
            }
        }

        #[test]
        fn prop_unmatched_purpose_equals_empty_purpose(attributes in trip_attributes()) {
            let recommender = LocalRecommender::new();
            let camping = TripAttributes {
                purpose: Some(Purpose::Camping),
                ..attributes.clone()
            };
            let unset = TripAttributes {
                purpose: None,
                ..attributes
            };
            prop_assert_eq!(recommender.compute(&camping), recommender.compute(&unset));
        }
    }
}
