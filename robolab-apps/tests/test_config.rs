use robolab_apps::{PathPlanningConfig, SceneKind, SeparationAppConfig};

#[test]
fn verify_path_planning_sample_configs() {
    let files = vec!["config/path_planning.toml"];
    for f in files {
        let result = PathPlanningConfig::try_new(f);
        assert!(result.is_ok(), "{:?} {:?}", f, result);
        let config = result.unwrap();
        let arm = config.create_arm();
        assert!(arm.is_ok(), "{:?} {:?}", f, arm.err());
        let ser_result = toml::to_string(&config);
        assert!(ser_result.is_ok(), "{:?} {:?}", f, ser_result);
    }
}

#[test]
fn verify_separation_sample_configs() {
    let files = vec![
        "config/separate_objects.toml",
        "config/separate_three_bodies.toml",
    ];
    for f in files {
        let result = SeparationAppConfig::try_new(f);
        assert!(result.is_ok(), "{:?} {:?}", f, result);
        let config = result.unwrap();
        assert!(config.build_scene().is_ok(), "{:?}", f);
        let ser_result = toml::to_string(&config);
        assert!(ser_result.is_ok(), "{:?} {:?}", f, ser_result);
    }
    let config = SeparationAppConfig::try_new("config/separate_three_bodies.toml").unwrap();
    assert_eq!(config.scene, SceneKind::ThreeBodies);
}

#[test]
fn ser_default_config() {
    let s = toml::to_string(&PathPlanningConfig::default()).unwrap();
    PathPlanningConfig::from_str(&s, "default.toml").unwrap();
    let s = toml::to_string(&SeparationAppConfig::default()).unwrap();
    SeparationAppConfig::from_str(&s, "default.toml").unwrap();
}

#[test]
fn missing_config_file() {
    assert!(matches!(
        SeparationAppConfig::try_new("config/no_such_file.toml"),
        Err(robolab_apps::Error::NoFile(..))
    ));
}
