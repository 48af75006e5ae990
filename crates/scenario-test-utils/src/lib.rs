//! Testing utilities for the deployment scenario workspace
//!
//! Recording stage implementations, a counting container implementation, a static
//! declaration extractor, and a fixture that wires them into a generator.

#![allow(missing_docs)]

use parking_lot::Mutex;
use scenario_archive::{Archive, ArchiveFactory, ArchiveKind};
use scenario_core::{
    ApplicationArchiveProcessor, AuxiliaryArchiveAppender, AuxiliaryArchiveProcessor, DeclarationExtractor,
    DeploymentDeclaration, DeploymentGenerator, ExtractionError, PluginRegistry, StageError, StageKind, TestClass,
};
use scenario_registry::{
    ContainerDef, ContainerMode, ContainerRegistry, DeployableContainer, DeploymentPackager, LibraryPackager,
    PackagingError, Protocol, ProtocolArchiveProcessor, ProtocolDefinition, ProtocolDescription, ProtocolRegistry,
    TestDeployment,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Name of the protocol the counting container reports as its default
pub const CONTAINER_DEFAULT_PROTOCOL: &str = "local";

/// Name of the archive contributed by [`RecordingAppender`]
pub const RECORDED_AUXILIARY: &str = "RecordingAppender.jar";

pub fn jar(name: &str) -> Archive {
    Archive::new(ArchiveKind::Java, name)
}

pub fn test_class() -> TestClass {
    TestClass::new("org.example.scenario.GreeterTest")
}

// ---------------------------------------------------------------------------
// Stage recording
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CallRecorder {
    calls: Mutex<Vec<StageKind>>,
}

impl CallRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, kind: StageKind) {
        self.calls.lock().push(kind);
    }

    pub fn count(&self, kind: StageKind) -> usize {
        self.calls.lock().iter().filter(|k| **k == kind).count()
    }

    pub fn was_called(&self, kind: StageKind) -> bool {
        self.count(kind) > 0
    }

    pub fn calls(&self) -> Vec<StageKind> {
        self.calls.lock().clone()
    }

    pub fn total(&self) -> usize {
        self.calls.lock().len()
    }
}

#[derive(Debug)]
pub struct RecordingAppender {
    recorder: Arc<CallRecorder>,
    archive: Option<&'static str>,
}

impl RecordingAppender {
    pub fn new(recorder: &Arc<CallRecorder>) -> Self {
        Self {
            recorder: Arc::clone(recorder),
            archive: Some(RECORDED_AUXILIARY),
        }
    }

    /// Appender that records the call but contributes nothing
    pub fn empty(recorder: &Arc<CallRecorder>) -> Self {
        Self {
            recorder: Arc::clone(recorder),
            archive: None,
        }
    }
}

impl AuxiliaryArchiveAppender for RecordingAppender {
    fn create_auxiliary_archive(&self, archives: &dyn ArchiveFactory) -> Result<Option<Archive>, StageError> {
        self.recorder.record(StageKind::AuxiliaryArchiveAppender);
        match self.archive {
            Some(name) => Ok(Some(archives.create(ArchiveKind::Java, name)?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug)]
pub struct RecordingAuxiliaryProcessor {
    recorder: Arc<CallRecorder>,
}

impl RecordingAuxiliaryProcessor {
    pub fn new(recorder: &Arc<CallRecorder>) -> Self {
        Self {
            recorder: Arc::clone(recorder),
        }
    }
}

impl AuxiliaryArchiveProcessor for RecordingAuxiliaryProcessor {
    fn process(&self, auxiliary_archive: &mut Archive) -> Result<(), StageError> {
        self.recorder.record(StageKind::AuxiliaryArchiveProcessor);
        auxiliary_archive.add("META-INF/processed", "auxiliary")?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecordingApplicationProcessor {
    recorder: Arc<CallRecorder>,
}

impl RecordingApplicationProcessor {
    pub fn new(recorder: &Arc<CallRecorder>) -> Self {
        Self {
            recorder: Arc::clone(recorder),
        }
    }
}

impl ApplicationArchiveProcessor for RecordingApplicationProcessor {
    fn process(&self, application_archive: &mut Archive, test_class: &TestClass) -> Result<(), StageError> {
        self.recorder.record(StageKind::ApplicationArchiveProcessor);
        application_archive.add("META-INF/test-class", test_class.name())?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecordingProtocolProcessor {
    recorder: Arc<CallRecorder>,
}

impl RecordingProtocolProcessor {
    pub fn new(recorder: &Arc<CallRecorder>) -> Self {
        Self {
            recorder: Arc::clone(recorder),
        }
    }
}

impl ProtocolArchiveProcessor for RecordingProtocolProcessor {
    fn process(&self, _deployment: &TestDeployment, _archive: &mut Archive) -> Result<(), PackagingError> {
        self.recorder.record(StageKind::ProtocolArchiveProcessor);
        Ok(())
    }
}

#[derive(Debug)]
pub struct FailingApplicationProcessor;

impl ApplicationArchiveProcessor for FailingApplicationProcessor {
    fn process(&self, _application_archive: &mut Archive, _test_class: &TestClass) -> Result<(), StageError> {
        Err(StageError::Failed("application processing rejected".into()))
    }
}

/// Plugin registry with one recording implementation per stage kind
pub fn recording_plugins(recorder: &Arc<CallRecorder>) -> PluginRegistry {
    let mut plugins = PluginRegistry::new();
    plugins
        .register_appender(RecordingAppender::new(recorder))
        .register_auxiliary_processor(RecordingAuxiliaryProcessor::new(recorder))
        .register_application_processor(RecordingApplicationProcessor::new(recorder))
        .register_protocol_processor(RecordingProtocolProcessor::new(recorder));
    plugins
}

// ---------------------------------------------------------------------------
// Containers and protocols
// ---------------------------------------------------------------------------

/// Container implementation counting default-protocol queries
#[derive(Debug)]
pub struct CountingContainer {
    default_protocol: ProtocolDescription,
    supported: Vec<ProtocolDescription>,
    default_protocol_calls: AtomicUsize,
}

impl CountingContainer {
    pub fn new(default_protocol: &str) -> Arc<Self> {
        Self::supporting(default_protocol, &[])
    }

    pub fn supporting(default_protocol: &str, supported: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            default_protocol: ProtocolDescription::new(default_protocol),
            supported: supported.iter().map(|name| ProtocolDescription::new(*name)).collect(),
            default_protocol_calls: AtomicUsize::new(0),
        })
    }

    pub fn default_protocol_calls(&self) -> usize {
        self.default_protocol_calls.load(Ordering::SeqCst)
    }
}

impl DeployableContainer for CountingContainer {
    fn default_protocol(&self) -> ProtocolDescription {
        self.default_protocol_calls.fetch_add(1, Ordering::SeqCst);
        self.default_protocol.clone()
    }

    fn supported_protocols(&self) -> Vec<ProtocolDescription> {
        self.supported.clone()
    }
}

#[derive(Debug)]
pub struct TestProtocol {
    name: String,
}

impl TestProtocol {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self { name: name.to_string() })
    }
}

impl Protocol for TestProtocol {
    fn description(&self) -> ProtocolDescription {
        ProtocolDescription::new(self.name.clone())
    }

    fn packager(&self) -> Arc<dyn DeploymentPackager> {
        Arc::new(LibraryPackager::default())
    }
}

pub fn protocol_definition(name: &str, default: bool) -> ProtocolDefinition {
    ProtocolDefinition::new(TestProtocol::new(name), BTreeMap::new(), default)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extractor serving fixed declarations
#[derive(Debug, Default)]
pub struct StaticExtractor {
    by_class: HashMap<String, Vec<DeploymentDeclaration>>,
    fallback: Vec<DeploymentDeclaration>,
}

impl StaticExtractor {
    /// Serve `declarations` for every test class
    pub fn always(declarations: Vec<DeploymentDeclaration>) -> Self {
        Self {
            by_class: HashMap::new(),
            fallback: declarations,
        }
    }

    pub fn single(declaration: DeploymentDeclaration) -> Self {
        Self::always(vec![declaration])
    }

    pub fn with_class(mut self, test_class: &TestClass, declarations: Vec<DeploymentDeclaration>) -> Self {
        self.by_class.insert(test_class.name().to_string(), declarations);
        self
    }
}

impl DeclarationExtractor for StaticExtractor {
    fn extract(&self, test_class: &TestClass) -> Result<Vec<DeploymentDeclaration>, ExtractionError> {
        Ok(self
            .by_class
            .get(test_class.name())
            .unwrap_or(&self.fallback)
            .clone())
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// Registries, container implementation and recorder wired for generator tests
#[derive(Debug)]
pub struct ScenarioFixture {
    containers: ContainerRegistry,
    protocols: ProtocolRegistry,
    deployable: Arc<CountingContainer>,
    recorder: Arc<CallRecorder>,
}

impl Default for ScenarioFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioFixture {
    pub fn new() -> Self {
        Self::with_deployable(CountingContainer::new(CONTAINER_DEFAULT_PROTOCOL))
    }

    pub fn with_deployable(deployable: Arc<CountingContainer>) -> Self {
        Self {
            containers: ContainerRegistry::new(),
            protocols: ProtocolRegistry::new(),
            deployable,
            recorder: CallRecorder::new(),
        }
    }

    pub fn container(self, name: &str) -> Self {
        self.container_def(ContainerDef::new(name))
    }

    pub fn custom_container(self, name: &str) -> Self {
        self.container_def(ContainerDef::new(name).with_mode(ContainerMode::Custom))
    }

    pub fn container_def(mut self, def: ContainerDef) -> Self {
        let deployable: Arc<dyn DeployableContainer> = self.deployable.clone();
        self.containers.create(def, deployable).unwrap();
        self
    }

    pub fn protocol(mut self, name: &str, default: bool) -> Self {
        self.protocols.add_protocol(protocol_definition(name, default)).unwrap();
        self
    }

    pub fn container_protocol(mut self, container: &str, name: &str, default: bool) -> Self {
        self.protocols
            .add_container_protocol(container, protocol_definition(name, default))
            .unwrap();
        self
    }

    pub fn deployable(&self) -> Arc<CountingContainer> {
        Arc::clone(&self.deployable)
    }

    pub fn recorder(&self) -> Arc<CallRecorder> {
        Arc::clone(&self.recorder)
    }

    /// Generator with one recording implementation per stage kind
    pub fn generator(self, extractor: impl DeclarationExtractor + 'static) -> DeploymentGenerator {
        let plugins = recording_plugins(&self.recorder);
        DeploymentGenerator::new(extractor, self.containers, self.protocols).with_plugins(plugins)
    }

    /// Generator using the given stages instead of the recording ones
    pub fn generator_with(
        self,
        extractor: impl DeclarationExtractor + 'static,
        plugins: PluginRegistry,
    ) -> DeploymentGenerator {
        DeploymentGenerator::new(extractor, self.containers, self.protocols).with_plugins(plugins)
    }
}
