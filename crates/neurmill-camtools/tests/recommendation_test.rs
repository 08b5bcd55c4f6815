use neurmill_camtools::aggregator::{AggregatorOptions, RecommendationAggregator};
use neurmill_camtools::features::{Feature, FeatureId};
use neurmill_camtools::recommendation::{EntryId, Feedback, RecommendationSet};
use neurmill_camtools::speeds_feeds::Operation;
use neurmill_camtools::{CamToolError, ResourceKind};
use neurmill_core::data::materials;
use neurmill_core::data::tools::{self, Tool, ToolId, ToolLibrary, ToolType};
use neurmill_core::{Material, MaterialCategory, MaterialId, ToolMaterial};
use neurmill_devicedb::{init_standard_catalog, MachineProfile, MachineProvider};
use std::sync::Arc;

fn aggregator() -> RecommendationAggregator {
    RecommendationAggregator::new(Arc::new(tools::init_standard_library()))
}

fn haas() -> MachineProfile {
    init_standard_catalog().get_machine("1").unwrap()
}

fn aluminum() -> Material {
    materials::init_standard_library()
        .find("aluminum_6061")
        .cloned()
        .unwrap()
}

fn sample_part() -> Vec<Feature> {
    vec![
        Feature::hole("feature-001", 12.5, 25.0).at(10.0, 20.0, 0.0),
        Feature::hole("feature-002", 8.0, 15.0).at(50.0, 20.0, 0.0),
        Feature::slot("feature-003", 15.0, 80.0, 10.0, None).at(100.0, 50.0, 0.0),
        Feature::pocket("feature-004", 60.0, 60.0, 30.0, Some(5.0)).at(150.0, 100.0, 0.0),
    ]
}

fn entry_for(set: &RecommendationSet, feature: &str, operation: Operation) -> EntryId {
    set.entries()
        .into_iter()
        .find(|e| e.feature_id == Some(FeatureId::from(feature)) && e.operation == operation)
        .map(|e| e.id)
        .unwrap()
}

#[test]
fn test_sample_part_tool_selection() {
    let set = aggregator()
        .build_recommendations(&sample_part(), &haas(), &aluminum())
        .unwrap();

    assert!(set.unresolved_features.is_empty());
    let entries = set.entries();
    let picked: Vec<(&str, &str, Operation)> = entries
        .iter()
        .map(|e| {
            (
                e.feature_id.as_ref().unwrap().0.as_str(),
                e.tool_id.0.as_str(),
                e.operation,
            )
        })
        .collect();

    assert_eq!(
        picked,
        vec![
            ("feature-001", "105", Operation::Drilling),
            ("feature-002", "104", Operation::Drilling),
            ("feature-003", "101", Operation::Roughing),
            ("feature-004", "109", Operation::Roughing),
            ("feature-004", "103", Operation::Finishing),
        ]
    );
    assert_eq!(set.machine_id, "1");
    assert!(set.summary.contains("Aluminum 6061"));
    assert!(set.summary.contains("Haas VF-2"));
}

#[test]
fn test_undersized_hole_uses_pilot_drill() {
    let set = aggregator()
        .build_recommendations(
            &[Feature::hole("h1", 12.5, 25.0)],
            &haas(),
            &aluminum(),
        )
        .unwrap();

    let entry = &set.entries()[0];
    assert_eq!(entry.tool_id, ToolId::from("105"));
    assert!(entry.tolerance_warning);
    assert!(entry.explanation.contains("boring"));
    assert_eq!(entry.depth_passes, 1);
    // 300 m/min on a 12mm drill, feed capped by the Haas
    assert_eq!(entry.baseline.unwrap().speed, 7957);
    assert_eq!(entry.adjusted_speed, 7957);
    assert_eq!(entry.adjusted_feed, 500);
    assert_eq!(entry.wear_score, None);
}

#[test]
fn test_pilot_drill_can_be_disabled() {
    let aggregator = aggregator().with_options(AggregatorOptions {
        allow_undersized_drills: false,
        ..AggregatorOptions::default()
    });
    let set = aggregator
        .build_recommendations(&[Feature::hole("h1", 12.5, 25.0)], &haas(), &aluminum())
        .unwrap();

    assert!(set.is_empty());
    assert_eq!(set.unresolved_features.len(), 1);
    assert_eq!(set.unresolved_features[0].feature_id, FeatureId::from("h1"));
}

#[test]
fn test_exact_drill_has_no_warning() {
    let set = aggregator()
        .build_recommendations(&[Feature::hole("h1", 12.0, 20.0)], &haas(), &aluminum())
        .unwrap();

    let entry = &set.entries()[0];
    assert_eq!(entry.tool_id, ToolId::from("105"));
    assert!(!entry.tolerance_warning);
}

#[test]
fn test_oversized_tool_on_small_machine_is_unresolved() {
    let mut library = tools::init_standard_library();
    let mut big_drill = Tool::new(
        ToolId::from("195"),
        195,
        "Drill 95mm".to_string(),
        ToolType::Drill,
        95.0,
    );
    big_drill.max_rpm = 2000;
    library.add_tool(big_drill);

    // Mazak INTEGREX holds tools up to 90mm
    let mazak = init_standard_catalog().get_machine("3").unwrap();
    let features = vec![
        Feature::hole("big", 95.0, 40.0),
        Feature::hole("small", 8.0, 15.0),
    ];

    let set = RecommendationAggregator::new(Arc::new(library))
        .build_recommendations(&features, &mazak, &aluminum())
        .unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.entries()[0].tool_id, ToolId::from("104"));
    assert_eq!(set.unresolved_features.len(), 1);
    assert_eq!(set.unresolved_features[0].feature_id, FeatureId::from("big"));
    assert!(set.unresolved_features[0].reason.contains("90"));
    assert!(set.summary.contains("could not be tooled"));
}

#[test]
fn test_tight_corner_radius_sets_tolerance_warning() {
    let set = aggregator()
        .build_recommendations(
            &[Feature::pocket("p1", 30.0, 40.0, 5.0, Some(1.5))],
            &haas(),
            &aluminum(),
        )
        .unwrap();

    let finishing = set
        .entries()
        .into_iter()
        .find(|e| e.operation == Operation::Finishing)
        .unwrap();
    // Smallest ball end mill in the catalog is 4mm
    assert_eq!(finishing.tool_id, ToolId::from("107"));
    assert!(finishing.tolerance_warning);

    let roughing = set
        .entries()
        .into_iter()
        .find(|e| e.operation == Operation::Roughing)
        .unwrap();
    assert_eq!(roughing.tool_id, ToolId::from("109"));
    assert!(!roughing.tolerance_warning);
}

#[test]
fn test_finishing_passes_can_be_disabled() {
    let aggregator = aggregator().with_options(AggregatorOptions {
        finishing_passes: false,
        ..AggregatorOptions::default()
    });
    let set = aggregator
        .build_recommendations(
            &[Feature::pocket("p1", 60.0, 60.0, 30.0, Some(5.0))],
            &haas(),
            &aluminum(),
        )
        .unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.entries()[0].operation, Operation::Roughing);
}

#[test]
fn test_narrow_pocket_is_unresolved() {
    let set = aggregator()
        .build_recommendations(
            &[
                Feature::pocket("tiny", 3.0, 3.0, 2.0, None),
                Feature::slot("ok", 12.0, 50.0, 6.0, None),
            ],
            &haas(),
            &aluminum(),
        )
        .unwrap();

    assert_eq!(set.len(), 1);
    assert_eq!(set.unresolved_features[0].feature_id, FeatureId::from("tiny"));
}

#[test]
fn test_invalid_feature_is_unresolved() {
    let set = aggregator()
        .build_recommendations(&[Feature::hole("bad", -2.0, 5.0)], &haas(), &aluminum())
        .unwrap();
    assert!(set.is_empty());
    assert!(set.unresolved_features[0].reason.contains("bad.diameter"));
}

#[test]
fn test_depth_passes() {
    let set = aggregator()
        .build_recommendations(
            &[Feature::slot("deep", 12.0, 50.0, 40.0, None)],
            &haas(),
            &aluminum(),
        )
        .unwrap();

    // 10mm end mill cuts 15mm per pass
    let entry = &set.entries()[0];
    assert_eq!(entry.tool_id, ToolId::from("101"));
    assert_eq!(entry.depth_passes, 3);
    assert!(entry.explanation.contains("3 passes"));
}

#[test]
fn test_machine_range_limits_candidates() {
    let mut library = ToolLibrary::new();
    let mut em = Tool::new(ToolId::from("E6"), 1, "End Mill 6mm".to_string(), ToolType::EndMill, 6.0);
    em.max_rpm = 20000;
    library.add_tool(em);
    let mut em25 = Tool::new(
        ToolId::from("E25"),
        2,
        "End Mill 25mm".to_string(),
        ToolType::EndMill,
        25.0,
    );
    em25.max_rpm = 8000;
    library.add_tool(em25);

    let router = MachineProfile {
        id: "router".to_string(),
        name: "Router".to_string(),
        max_tool_diameter: 12.7,
        ..MachineProfile::default()
    };

    let set = RecommendationAggregator::new(Arc::new(library))
        .build_recommendations(&[Feature::pocket("p", 40.0, 40.0, 5.0, None)], &router, &aluminum())
        .unwrap();
    assert_eq!(set.entries()[0].tool_id, ToolId::from("E6"));
}

#[test]
fn test_manual_entry() {
    let aggregator = aggregator();
    let machine = haas();
    let set = aggregator
        .build_recommendations(&sample_part(), &machine, &aluminum())
        .unwrap();
    let before = set.len();

    let entry = aggregator
        .add_manual_entry(&set, &machine, &aluminum(), &ToolId::from("102"), Some(10.0))
        .unwrap();

    assert!(entry.is_manual());
    assert_eq!(entry.baseline, None);
    assert_eq!(entry.reference.speed, 12000);
    assert_eq!(entry.reference.feed, 500);
    assert_eq!(entry.adjusted_speed, 9600);
    assert_eq!(entry.adjusted_feed, 450);
    assert_eq!(set.len(), before + 1);
    assert_eq!(set.entries().last().unwrap().id, entry.id);
}

#[test]
fn test_manual_entry_without_wear_uses_limits() {
    let aggregator = aggregator();
    let machine = haas();
    let set = RecommendationSet::new("f", "1", aluminum().id);

    let entry = aggregator
        .add_manual_entry(&set, &machine, &aluminum(), &ToolId::from("101"), None)
        .unwrap();
    // Tool allows 18000 but the Haas stops at 12000
    assert_eq!(entry.adjusted_speed, 12000);
    assert_eq!(entry.adjusted_feed, 500);
    assert_eq!(entry.operation, Operation::SemiFinishing);

    let drill = aggregator
        .add_manual_entry(&set, &machine, &aluminum(), &ToolId::from("104"), None)
        .unwrap();
    assert_eq!(drill.adjusted_speed, 10000);
    assert_eq!(drill.operation, Operation::Drilling);
}

#[test]
fn test_manual_entry_errors() {
    let aggregator = aggregator();
    let machine = haas();
    let set = RecommendationSet::new("f", "1", aluminum().id);

    let err = aggregator
        .add_manual_entry(&set, &machine, &aluminum(), &ToolId::from("999"), None)
        .unwrap_err();
    assert!(matches!(
        err,
        CamToolError::NotFound {
            kind: ResourceKind::Tool,
            ..
        }
    ));

    let small = MachineProfile {
        max_tool_diameter: 8.0,
        ..MachineProfile::default()
    };
    let err = aggregator
        .add_manual_entry(&set, &small, &aluminum(), &ToolId::from("102"), None)
        .unwrap_err();
    assert!(err.is_incompatible_tool());

    let err = aggregator
        .add_manual_entry(&set, &machine, &aluminum(), &ToolId::from("101"), Some(11.0))
        .unwrap_err();
    assert!(err.is_invalid_wear_score());
    assert!(set.is_empty());
}

#[test]
fn test_update_wear_score() {
    let aggregator = aggregator();
    let set = aggregator
        .build_recommendations(&sample_part(), &haas(), &aluminum())
        .unwrap();
    let id = entry_for(&set, "feature-001", Operation::Drilling);

    let updated = aggregator.update_wear_score(&set, &id, Some(10.0)).unwrap();
    assert_eq!(updated.wear_score, Some(10.0));
    assert_eq!(updated.adjusted_speed, 6365);
    assert_eq!(updated.adjusted_feed, 450);
    assert_eq!(set.entry(&id).unwrap().lock().adjusted_speed, 6365);

    // Clearing the score restores the baseline
    let cleared = aggregator.update_wear_score(&set, &id, None).unwrap();
    assert_eq!(cleared.adjusted_speed, 7957);
    assert_eq!(cleared.adjusted_feed, 500);
}

#[test]
fn test_invalid_wear_update_leaves_entry_untouched() {
    let aggregator = aggregator();
    let set = aggregator
        .build_recommendations(&sample_part(), &haas(), &aluminum())
        .unwrap();
    let id = entry_for(&set, "feature-003", Operation::Roughing);
    aggregator.update_wear_score(&set, &id, Some(9.0)).unwrap();
    let before = set.entry(&id).unwrap().lock().clone();

    let err = aggregator
        .update_wear_score(&set, &id, Some(-1.0))
        .unwrap_err();
    assert!(err.is_invalid_wear_score());
    assert_eq!(*set.entry(&id).unwrap().lock(), before);
}

#[test]
fn test_update_unknown_entry() {
    let aggregator = aggregator();
    let set = RecommendationSet::new("f", "1", aluminum().id);
    let err = aggregator
        .update_wear_score(&set, &EntryId::from("missing"), Some(2.0))
        .unwrap_err();
    assert!(matches!(
        err,
        CamToolError::NotFound {
            kind: ResourceKind::Entry,
            ..
        }
    ));
}

#[test]
fn test_update_wear_score_for_tool() {
    let aggregator = aggregator();
    let set = aggregator
        .build_recommendations(
            &[
                Feature::hole("a", 12.0, 10.0),
                Feature::hole("b", 11.0, 10.0),
                Feature::hole("c", 5.0, 10.0),
            ],
            &haas(),
            &aluminum(),
        )
        .unwrap();

    let updated = aggregator
        .update_wear_score_for_tool(&set, &ToolId::from("105"), Some(10.0))
        .unwrap();
    assert_eq!(updated.len(), 2);
    assert!(updated.iter().all(|e| e.wear_score == Some(10.0)));

    let untouched = set.entries_for_tool(&ToolId::from("108"));
    assert_eq!(untouched[0].wear_score, None);

    let err = aggregator
        .update_wear_score_for_tool(&set, &ToolId::from("102"), Some(1.0))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_concurrent_wear_updates() {
    let aggregator = Arc::new(aggregator());
    let set = Arc::new(
        aggregator
            .build_recommendations(&sample_part(), &haas(), &aluminum())
            .unwrap(),
    );
    let ids: Vec<EntryId> = set.entries().into_iter().map(|e| e.id).collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, id)| {
            let aggregator = Arc::clone(&aggregator);
            let set = Arc::clone(&set);
            std::thread::spawn(move || {
                let wear = (i + 1) as f64;
                for _ in 0..50 {
                    aggregator.update_wear_score(&set, &id, Some(wear)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for (i, id) in ids.iter().enumerate() {
        let entry = set.entry(id).unwrap().lock().clone();
        assert_eq!(entry.wear_score, Some((i + 1) as f64));
        assert_eq!(entry, {
            let mut expected = entry.clone();
            expected.apply_wear(Some((i + 1) as f64)).unwrap();
            expected
        });
    }
}

#[test]
fn test_concurrent_wear_updates_to_one_entry() {
    let aggregator = Arc::new(aggregator());
    let set = Arc::new(
        aggregator
            .build_recommendations(&sample_part(), &haas(), &aluminum())
            .unwrap(),
    );
    let id = entry_for(&set, "feature-003", Operation::Roughing);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let aggregator = Arc::clone(&aggregator);
            let set = Arc::clone(&set);
            let id = id.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    let wear = if (t + i) % 2 == 0 { 2.0 } else { 9.0 };
                    let entry = aggregator.update_wear_score(&set, &id, Some(wear)).unwrap();
                    let expected = entry.adjusted_for(Some(wear)).unwrap();
                    assert_eq!(entry.wear_score, Some(wear));
                    assert_eq!(entry.adjusted_speed, expected.speed);
                    assert_eq!(entry.adjusted_feed, expected.feed);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let entry = set.entry(&id).unwrap().lock().clone();
    let wear = entry.wear_score.unwrap();
    assert!(wear == 2.0 || wear == 9.0);
    let expected = entry.adjusted_for(Some(wear)).unwrap();
    assert_eq!(entry.adjusted_speed, expected.speed);
    assert_eq!(entry.adjusted_feed, expected.feed);
}

#[test]
fn test_roughing_kept_when_no_ball_end_mill_fits() {
    let mut library = ToolLibrary::new();
    library.add_tool(Tool::new(
        ToolId::from("E3"),
        1,
        "End Mill 3mm".to_string(),
        ToolType::EndMill,
        3.0,
    ));
    library.add_tool(Tool::new(
        ToolId::from("B4"),
        2,
        "Ball End Mill 4mm".to_string(),
        ToolType::BallEndMill,
        4.0,
    ));

    let set = RecommendationAggregator::new(Arc::new(library))
        .build_recommendations(
            &[Feature::pocket("p", 3.5, 20.0, 5.0, Some(0.5))],
            &haas(),
            &aluminum(),
        )
        .unwrap();

    assert!(set.unresolved_features.is_empty());
    assert_eq!(set.len(), 1);
    let roughing = &set.entries()[0];
    assert_eq!(roughing.tool_id, ToolId::from("E3"));
    assert_eq!(roughing.operation, Operation::Roughing);
    // 1.5mm cutter radius cannot form the 0.5mm corners
    assert!(roughing.tolerance_warning);
    assert!(roughing.explanation.contains("No finishing pass"));
}

#[test]
fn test_feature_not_split_between_entries_and_unresolved() {
    let mut library = ToolLibrary::new();
    library.add_tool(Tool::new(
        ToolId::from("E10"),
        1,
        "End Mill 10mm".to_string(),
        ToolType::EndMill,
        10.0,
    ));
    let mut ball = Tool::new(
        ToolId::from("B4"),
        2,
        "Ball End Mill 4mm".to_string(),
        ToolType::BallEndMill,
        4.0,
    );
    ball.material = ToolMaterial::Hss;
    library.add_tool(ball);

    // No HSS cutting data, so the finishing pass has no baseline
    let carbide_only = Material::new(
        MaterialId::from("m"),
        "Carbide Only".to_string(),
        MaterialCategory::NonFerrousMetal,
    )
    .with_surface_speed(ToolMaterial::Carbide, 200.0)
    .with_chip_load(ToolType::EndMill, 0.05)
    .with_chip_load(ToolType::BallEndMill, 0.03);

    let set = RecommendationAggregator::new(Arc::new(library))
        .build_recommendations(
            &[Feature::pocket("p", 30.0, 40.0, 5.0, Some(2.0))],
            &haas(),
            &carbide_only,
        )
        .unwrap();

    assert!(set.unresolved_features.is_empty());
    assert_eq!(set.len(), 1);
    let entry = &set.entries()[0];
    assert_eq!(entry.operation, Operation::Roughing);
    assert!(entry.tolerance_warning);
    assert!(entry.explanation.contains("HSS"));
    assert!(set.summary.starts_with("1 operation "));
    assert!(!set.summary.contains("could not be tooled"));
}

#[test]
fn test_tools_not_rated_for_material_are_skipped() {
    let mut library = ToolLibrary::new();
    let mut aluminum_only = Tool::new(
        ToolId::from("E12"),
        1,
        "End Mill 12mm".to_string(),
        ToolType::EndMill,
        12.0,
    );
    aluminum_only.workpiece_materials = vec!["Aluminum".to_string()];
    library.add_tool(aluminum_only);
    library.add_tool(Tool::new(
        ToolId::from("E8"),
        2,
        "End Mill 8mm".to_string(),
        ToolType::EndMill,
        8.0,
    ));
    let mut drill = Tool::new(
        ToolId::from("D10"),
        3,
        "Drill 10mm".to_string(),
        ToolType::Drill,
        10.0,
    );
    drill.workpiece_materials = vec!["titanium_6al4v".to_string()];
    library.add_tool(drill);

    let aggregator = RecommendationAggregator::new(Arc::new(library));
    let features = [
        Feature::slot("s", 15.0, 60.0, 5.0, None),
        Feature::hole("h", 10.0, 10.0),
    ];

    let set = aggregator
        .build_recommendations(&features, &haas(), &aluminum())
        .unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.entries()[0].tool_id, ToolId::from("E12"));
    assert_eq!(set.unresolved_features.len(), 1);
    assert_eq!(set.unresolved_features[0].feature_id, FeatureId::from("h"));

    let steel = materials::init_standard_library()
        .find("steel_1018")
        .cloned()
        .unwrap();
    let set = aggregator
        .build_recommendations(&features, &haas(), &steel)
        .unwrap();
    assert_eq!(set.entries()[0].tool_id, ToolId::from("E8"));

    let err = aggregator
        .add_manual_entry(&set, &haas(), &steel, &ToolId::from("E12"), None)
        .unwrap_err();
    assert!(err.is_unsupported_material());
    assert_eq!(set.len(), 1);
}

#[test]
fn test_submit_feedback() {
    let aggregator = aggregator();
    let set = RecommendationSet::new("f", "1", aluminum().id);

    let receipt = aggregator
        .submit_feedback(
            &set,
            Feedback {
                rating: 4,
                comments: Some("  Drill choice was spot on ".to_string()),
            },
        )
        .unwrap();
    assert_eq!(receipt.recommendation_id, set.id);
    assert!(receipt.feedback_id.starts_with("feedback-"));

    aggregator
        .submit_feedback(
            &set,
            Feedback {
                rating: 5,
                comments: Some("   ".to_string()),
            },
        )
        .unwrap();

    let stored = set.feedback();
    assert_eq!(stored.len(), 2);
    assert_eq!(
        stored[0].feedback.comments.as_deref(),
        Some("Drill choice was spot on")
    );
    assert_eq!(stored[1].feedback.comments, None);
}

#[test]
fn test_feedback_rating_bounds() {
    let aggregator = aggregator();
    let set = RecommendationSet::new("f", "1", aluminum().id);

    for rating in [0, 6] {
        let err = aggregator
            .submit_feedback(
                &set,
                Feedback {
                    rating,
                    comments: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, CamToolError::InvalidFeedback(_)));
    }
    assert!(set.feedback().is_empty());
}
