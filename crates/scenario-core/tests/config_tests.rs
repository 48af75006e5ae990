//! Functional tests for configuration-driven generation.
//!
//! Registries built from a configuration file must behave exactly like
//! registries assembled by hand.

use scenario_core::{init_logging, DeploymentDeclaration, DeploymentGenerator, ScenarioConfig, ValidationError};
use scenario_registry::{ContainerMode, DeployableContainer, Protocol};
use scenario_test_utils::{jar, test_class, CountingContainer, StaticExtractor, TestProtocol};
use std::sync::Arc;

const CONFIG: &str = r#"
[[containers]]
name = "tomcat"
default = true

[[containers]]
name = "manual"
mode = "custom"

[[protocols]]
name = "servlet"
default = true

[logging]
level = "debug"
"#;

fn available() -> Vec<Arc<dyn Protocol>> {
    let servlet: Arc<dyn Protocol> = TestProtocol::new("servlet");
    let jmx: Arc<dyn Protocol> = TestProtocol::new("jmx");
    vec![servlet, jmx]
}

/// Tenet: a file-configured scenario resolves against the configured defaults.
#[test]
fn generates_from_configuration_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let config = ScenarioConfig::from_path(&path).unwrap();
    init_logging(&config.logging).unwrap();

    let counting = CountingContainer::new("jmx");
    let deployable: Arc<dyn DeployableContainer> = counting.clone();
    let registries = config.populate(&deployable, &available()).unwrap();
    let generator = DeploymentGenerator::new(
        StaticExtractor::always(vec![
            DeploymentDeclaration::archive(jar("app.jar")).with_name("app"),
            DeploymentDeclaration::archive(jar("stub.jar"))
                .with_name("stub")
                .with_target("manual")
                .with_managed(false),
            DeploymentDeclaration::archive(jar("jmx.jar"))
                .with_name("jmx")
                .with_protocol("jmx")
                .with_testable(false),
        ]),
        registries.containers,
        registries.protocols,
    );

    let scenario = generator.generate(&test_class()).unwrap();

    let app = scenario.deployment("app").unwrap();
    assert_eq!(app.container().name(), "tomcat");
    assert_eq!(app.protocol().map(|p| p.name()), Some("servlet"));
    assert!(app.is_processed());

    let stub = scenario.deployment("stub").unwrap();
    assert_eq!(stub.container().name(), "manual");
    assert!(stub.protocol().is_none());

    let jmx = scenario.deployment("jmx").unwrap();
    assert_eq!(jmx.protocol().map(|p| p.name()), Some("jmx"));
    assert!(!jmx.is_processed());

    assert_eq!(counting.default_protocol_calls(), 0);
}

/// Tenet: configured container modes are enforced at resolution.
#[test]
fn configured_custom_mode_rejects_managed_deployment() {
    let config = ScenarioConfig::from_toml_str(CONFIG).unwrap();
    let deployable: Arc<dyn DeployableContainer> = CountingContainer::new("servlet");
    let registries = config.populate(&deployable, &available()).unwrap();
    let generator = DeploymentGenerator::new(
        StaticExtractor::single(DeploymentDeclaration::archive(jar("app.jar")).with_target("manual")),
        registries.containers,
        registries.protocols,
    );

    let error = generator.generate(&test_class()).unwrap_err();

    assert!(matches!(error.validation(), Some(ValidationError::ManagedOnCustomContainer { .. })));
}

/// Tenet: container modes in configuration files are matched case-insensitively.
#[test]
fn container_mode_in_configuration_ignores_case() {
    let toml = "[[containers]]\nname = \"manual\"\nmode = \"Custom\"\n";
    let config = ScenarioConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.containers[0].mode, ContainerMode::Custom);

    let yaml = "containers:\n  - name: manual\n    mode: CUSTOM\n";
    let config = ScenarioConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.containers[0].mode, ContainerMode::Custom);

    let deployable: Arc<dyn DeployableContainer> = CountingContainer::new("servlet");
    let registries = config.populate(&deployable, &available()).unwrap();
    let generator = DeploymentGenerator::new(
        StaticExtractor::single(DeploymentDeclaration::archive(jar("app.jar")).with_target("manual")),
        registries.containers,
        registries.protocols,
    );
    let error = generator.generate(&test_class()).unwrap_err();
    assert!(error.to_string().contains("This container is set to mode custom "));
}

/// Tenet: unknown container modes are configuration errors.
#[test]
fn unknown_container_mode_is_rejected() {
    let error = ScenarioConfig::from_toml_str("[[containers]]\nname = \"x\"\nmode = \"remote\"\n").unwrap_err();
    assert!(error.to_string().contains("unknown container mode 'remote'"));
}
