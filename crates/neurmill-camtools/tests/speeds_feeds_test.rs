use neurmill_camtools::speeds_feeds::{Operation, SpeedsFeedsCalculator};
use neurmill_camtools::{CamToolError, ParameterError};
use neurmill_core::data::materials::{self, Material, MaterialCategory, MaterialId};
use neurmill_core::data::tools::{self, Tool, ToolId, ToolMaterial, ToolType};
use neurmill_devicedb::{init_standard_catalog, MachineProfile, MachineProvider};

fn tool(id: &str) -> Tool {
    tools::init_standard_library()
        .get(&ToolId::from(id))
        .unwrap()
}

fn machine(id: &str) -> MachineProfile {
    init_standard_catalog().get_machine(id).unwrap()
}

fn material(id: &str) -> Material {
    materials::init_standard_library()
        .get(&MaterialId::from(id))
        .unwrap()
}

#[test]
fn test_end_mill_in_aluminum() {
    let result = SpeedsFeedsCalculator::compute_baseline(
        &tool("101"),
        &machine("1"),
        &material("aluminum_6061"),
        Operation::SemiFinishing,
    )
    .unwrap();

    // 300 m/min on a 10mm cutter
    assert_eq!(result.rpm, 9549);
    assert_eq!(result.flutes, 2);
    assert_eq!(result.chip_load, 0.05);
    // 0.05 * 2 * 9549 exceeds the Haas feed limit
    assert_eq!(result.feed_rate, 500);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_operation_scales_surface_speed() {
    let rough = SpeedsFeedsCalculator::compute_baseline(
        &tool("101"),
        &machine("4"),
        &material("aluminum_6061"),
        Operation::Roughing,
    )
    .unwrap();
    let finish = SpeedsFeedsCalculator::compute_baseline(
        &tool("101"),
        &machine("4"),
        &material("aluminum_6061"),
        Operation::Finishing,
    )
    .unwrap();

    assert_eq!(rough.rpm, 7639);
    assert_eq!(finish.rpm, 11459);
    assert_eq!(finish.surface_speed, 360.0);
    assert_eq!(finish.feed_rate, 550);
}

#[test]
fn test_drill_uses_single_flute() {
    let result = SpeedsFeedsCalculator::compute_baseline(
        &tool("105"),
        &machine("1"),
        &material("titanium_6al4v"),
        Operation::Drilling,
    )
    .unwrap();

    assert_eq!(result.flutes, 1);
    assert_eq!(result.rpm, 1326);
    assert_eq!(result.feed_rate, 66);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_hss_drill_uses_hss_surface_speed() {
    let result = SpeedsFeedsCalculator::compute_baseline(
        &tool("104"),
        &machine("1"),
        &material("steel_1018"),
        Operation::Drilling,
    )
    .unwrap();

    assert_eq!(result.rpm, 1123);
    assert_eq!(result.feed_rate, 89);
}

#[test]
fn test_spindle_clamped_to_machine_limit() {
    // 6mm cutter at finishing speed in acrylic wants ~15900 RPM
    let result = SpeedsFeedsCalculator::compute_baseline(
        &tool("106"),
        &machine("1"),
        &material("acrylic"),
        Operation::Finishing,
    )
    .unwrap();

    assert_eq!(result.rpm, 12000);
    assert_eq!(result.feed_rate, 500);
    assert_eq!(result.warnings.len(), 2);
    assert!(result.warnings[0].contains("machine"));
}

#[test]
fn test_spindle_clamped_to_tool_limit() {
    let mut slow_tool = tool("101");
    slow_tool.max_rpm = 6000;

    let result = SpeedsFeedsCalculator::compute_baseline(
        &slow_tool,
        &machine("4"),
        &material("aluminum_6061"),
        Operation::SemiFinishing,
    )
    .unwrap();

    assert_eq!(result.rpm, 6000);
    assert!(result.warnings[0].contains("tool"));
}

#[test]
fn test_ten_mm_tool_stays_under_18000() {
    let fast_machine = MachineProfile {
        id: "fast".to_string(),
        name: "High Speed Router".to_string(),
        max_rpm: 18000,
        max_feed_rate: 5000.0,
        ..MachineProfile::default()
    };
    let mut hot_material = material("aluminum_6061");
    hot_material.surface_speeds.insert(ToolMaterial::Carbide, 2000.0);

    let result = SpeedsFeedsCalculator::compute_baseline(
        &tool("101"),
        &fast_machine,
        &hot_material,
        Operation::Finishing,
    )
    .unwrap();

    assert_eq!(result.rpm, 18000);
    assert!(result.feed_rate as f64 <= fast_machine.max_feed_rate);
}

#[test]
fn test_never_exceeds_limits_across_catalog() {
    let tools = tools::init_standard_library();
    let machines = init_standard_catalog();
    let materials = materials::init_standard_library();
    let operations = [
        Operation::Roughing,
        Operation::SemiFinishing,
        Operation::Finishing,
        Operation::Drilling,
    ];

    for tool in tools.get_all_tools() {
        for machine in machines.list_machines() {
            for material in materials.get_all_materials() {
                for operation in operations {
                    let result =
                        SpeedsFeedsCalculator::compute_baseline(tool, &machine, material, operation)
                            .unwrap();
                    assert!(result.rpm >= 1);
                    assert!(result.rpm <= machine.max_rpm.min(tool.max_rpm));
                    assert!(result.feed_rate >= 1);
                    assert!(result.feed_rate as f64 <= machine.max_feed_rate);
                }
            }
        }
    }
}

#[test]
fn test_incompatible_tool_diameter() {
    let small_spindle = MachineProfile {
        id: "mini".to_string(),
        name: "Mini Mill".to_string(),
        min_tool_diameter: 1.0,
        max_tool_diameter: 8.0,
        ..MachineProfile::default()
    };

    let err = SpeedsFeedsCalculator::compute_baseline(
        &tool("101"),
        &small_spindle,
        &material("aluminum_6061"),
        Operation::Roughing,
    )
    .unwrap_err();

    assert!(err.is_incompatible_tool());
    match err {
        CamToolError::IncompatibleTool {
            tool_id,
            machine_id,
            diameter,
            ..
        } => {
            assert_eq!(tool_id, "101");
            assert_eq!(machine_id, "mini");
            assert_eq!(diameter, 10.0);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Boundary diameters are accepted
    assert!(SpeedsFeedsCalculator::check_compatibility(&tool("103"), &small_spindle).is_ok());
}

#[test]
fn test_incompatible_checked_before_table_lookup() {
    let small_spindle = MachineProfile {
        max_tool_diameter: 5.0,
        ..MachineProfile::default()
    };
    let empty = Material::new(
        MaterialId::from("mystery"),
        "Mystery Alloy".to_string(),
        MaterialCategory::Superalloy,
    );

    let err = SpeedsFeedsCalculator::compute_baseline(
        &tool("101"),
        &small_spindle,
        &empty,
        Operation::Roughing,
    )
    .unwrap_err();
    assert!(err.is_incompatible_tool());
}

#[test]
fn test_missing_cutting_data() {
    let carbide_only = Material::new(
        MaterialId::from("carbide_only"),
        "Carbide Only".to_string(),
        MaterialCategory::NonFerrousMetal,
    )
    .with_surface_speed(ToolMaterial::Carbide, 200.0)
    .with_chip_load(ToolType::EndMill, 0.05);

    // HSS drill has no surface speed row
    let err = SpeedsFeedsCalculator::compute_baseline(
        &tool("104"),
        &machine("1"),
        &carbide_only,
        Operation::Drilling,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CamToolError::Parameter(ParameterError::Missing(_))
    ));

    // Carbide drill has a speed but no chip load row
    let err = SpeedsFeedsCalculator::compute_baseline(
        &tool("105"),
        &machine("1"),
        &carbide_only,
        Operation::Drilling,
    )
    .unwrap_err();
    assert!(err.to_string().contains("chip load"));
}
