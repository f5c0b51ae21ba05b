use particle_core::config::resolve_thread_count;
use particle_core::{ConfigSnapshot, SimError};

#[test]
fn test_default_config_is_valid() {
    let config = ConfigSnapshot::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.bounds_width, 1280.0);
    assert_eq!(config.bounds_height, 720.0);
    assert_eq!(config.target_tps, 60.0);
    assert!(config.interpolate);
    assert!(!config.report_grid);
}

#[test]
fn test_each_rule_rejects() {
    let cases: Vec<(&str, ConfigSnapshot)> = vec![
        ("zero width", ConfigSnapshot { bounds_width: 0.0, ..Default::default() }),
        ("nan height", ConfigSnapshot { bounds_height: f32::NAN, ..Default::default() }),
        ("negative time scale", ConfigSnapshot { time_scale: -1.0, ..Default::default() }),
        ("viscosity above one", ConfigSnapshot { viscosity: 1.5, ..Default::default() }),
        ("negative viscosity", ConfigSnapshot { viscosity: -0.01, ..Default::default() }),
        ("threads below -1", ConfigSnapshot { threads: -2, ..Default::default() }),
        ("negative wall repel", ConfigSnapshot { wall_repel: -1.0, ..Default::default() }),
        ("negative wall strength", ConfigSnapshot { wall_strength: -1.0, ..Default::default() }),
        ("infinite gravity", ConfigSnapshot { gravity_x: f32::INFINITY, ..Default::default() }),
        ("negative tps", ConfigSnapshot { target_tps: -30.0, ..Default::default() }),
    ];
    for (name, config) in cases {
        assert!(
            matches!(config.validate(), Err(SimError::InvalidConfig(_))),
            "{name} should be rejected"
        );
    }
}

#[test]
fn test_edge_values_accepted() {
    let config = ConfigSnapshot {
        viscosity: 1.0,
        time_scale: 0.0,
        threads: -1,
        target_tps: 0.0,
        wall_repel: 0.0,
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_partial_document() {
    let config = ConfigSnapshot::from_toml(
        r#"
bounds_width = 1920.0
viscosity = 0.25
threads = 4
report_grid = true
"#,
    )
    .unwrap();
    assert_eq!(config.bounds_width, 1920.0);
    assert_eq!(config.bounds_height, 720.0);
    assert_eq!(config.viscosity, 0.25);
    assert_eq!(config.resolved_threads(), 4);
    assert!(config.report_grid);
}

#[test]
fn test_from_toml_rejects_invalid_values_and_syntax() {
    assert!(matches!(
        ConfigSnapshot::from_toml("viscosity = 2.0"),
        Err(SimError::InvalidConfig(_))
    ));
    assert!(matches!(
        ConfigSnapshot::from_toml("viscosity = ["),
        Err(SimError::ConfigParse(_))
    ));
}

#[test]
fn test_toml_round_trip() {
    let config = ConfigSnapshot {
        gravity_y: 0.5,
        threads: 3,
        ..Default::default()
    };
    let text = toml::to_string(&config).unwrap();
    assert_eq!(ConfigSnapshot::from_toml(&text).unwrap(), config);
}

#[test]
fn test_thread_resolution() {
    assert_eq!(resolve_thread_count(6), 6);
    let hw = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let auto = hw.saturating_sub(2).max(1);
    assert_eq!(resolve_thread_count(0), auto);
    assert_eq!(resolve_thread_count(-1), auto);
}
