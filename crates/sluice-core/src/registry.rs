//! Name-to-factory registries and the operator factory entry point.
//!
//! Registries are explicit objects, constructed once at process start and
//! populated by explicit registration calls gathered from each
//! operator-providing module (see `sluice-operators` for the reference
//! builders). They are passed into whatever executes graphs rather than
//! living as global state; after startup they are read-only.

use crate::definition::{DeviceType, OperatorDef};
use crate::operator::RunnableOperator;
use crate::workspace::Workspace;
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Factory signature: build an operator from its definition and workspace.
pub type OperatorFactory =
    Box<dyn Fn(OperatorDef, &mut Workspace) -> Result<Box<dyn RunnableOperator>> + Send + Sync>;

/// Registration key for an engine-qualified operator variant.
fn engine_qualified_name(name: &str, engine: &str) -> String {
    format!("{name}_ENGINE_{engine}")
}

/// Registry mapping operator type names to factories.
///
/// One instance exists per device kind; see [`DeviceRegistries`].
#[derive(Default)]
pub struct OperatorRegistry {
    factories: HashMap<String, OperatorFactory>,
}

impl OperatorRegistry {
    /// Create a new empty operator registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`.
    ///
    /// Returns `self` for method chaining.
    ///
    /// # Panics
    ///
    /// Registering the same name twice in one registry would make operator
    /// resolution depend on registration order, so duplicates are fatal at
    /// startup.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(OperatorDef, &mut Workspace) -> Result<Box<dyn RunnableOperator>>
            + Send
            + Sync
            + 'static,
    {
        if self
            .factories
            .insert(name.to_string(), Box::new(factory))
            .is_some()
        {
            panic!("operator '{name}' registered twice in the same registry");
        }
        self
    }

    /// Register an engine-qualified variant of `name`.
    ///
    /// The variant is preferred over the plain registration when a
    /// definition requests that engine.
    ///
    /// # Panics
    ///
    /// Same duplicate policy as [`OperatorRegistry::register`].
    pub fn register_with_engine<F>(&mut self, name: &str, engine: &str, factory: F) -> &mut Self
    where
        F: Fn(OperatorDef, &mut Workspace) -> Result<Box<dyn RunnableOperator>>
            + Send
            + Sync
            + 'static,
    {
        let key = engine_qualified_name(name, engine);
        self.register(&key, factory)
    }

    /// Check if a name (or qualified name) is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Iterate over all registered names.
    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }

    /// Resolve `def`'s operator name and invoke the factory.
    ///
    /// An engine-qualified name is tried first when the definition requests
    /// an engine, falling back to the unqualified name. A miss on both is a
    /// resolution error; on success the factory's own result is returned
    /// untouched, so an unsupported-feature refusal from a constructor
    /// keeps its distinct kind.
    pub fn create(
        &self,
        def: OperatorDef,
        ws: &mut Workspace,
    ) -> Result<Box<dyn RunnableOperator>> {
        let factory = self.resolve(&def)?;
        factory(def, ws)
    }

    fn resolve(&self, def: &OperatorDef) -> Result<&OperatorFactory> {
        if let Some(engine) = &def.engine {
            let qualified = engine_qualified_name(&def.op_type, engine);
            if let Some(factory) = self.factories.get(&qualified) {
                return Ok(factory);
            }
        }
        self.factories.get(&def.op_type).ok_or_else(|| {
            Error::resolution(format!(
                "operator '{}' is not registered for device kind {}",
                def.op_type, def.device_option.device_type
            ))
        })
    }
}

/// Registry-of-registries keyed by device kind.
///
/// Lets [`DeviceRegistries::create_operator`] dispatch by device before by
/// name. Both reference kinds are normally present from startup even if
/// one has no operators yet; backend crates populate their own kind.
#[derive(Default)]
pub struct DeviceRegistries {
    registries: BTreeMap<DeviceType, OperatorRegistry>,
}

impl DeviceRegistries {
    /// Create an empty registry set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the operator registry for a device kind.
    ///
    /// # Panics
    ///
    /// Registering the same device kind twice is fatal at startup, for the
    /// same reason duplicate operator names are.
    pub fn register_device(&mut self, device: DeviceType, registry: OperatorRegistry) -> &mut Self {
        if self.registries.contains_key(&device) {
            panic!("device kind {device} registered twice");
        }
        self.registries.insert(device, registry);
        self
    }

    /// The operator registry for a device kind, if registered.
    pub fn device_registry(&self, device: DeviceType) -> Option<&OperatorRegistry> {
        self.registries.get(&device)
    }

    /// Check if a device kind has a registry.
    pub fn contains_device(&self, device: DeviceType) -> bool {
        self.registries.contains_key(&device)
    }

    /// Factory entry point: resolve device kind, then operator name, then
    /// invoke the factory.
    ///
    /// Fails with a resolution error when either lookup misses; never
    /// yields a null-ish success. Callers treat failure as fatal to graph
    /// construction.
    pub fn create_operator(
        &self,
        def: OperatorDef,
        ws: &mut Workspace,
    ) -> Result<Box<dyn RunnableOperator>> {
        let device = def.device_option.device_type;
        let registry = self.registries.get(&device).ok_or_else(|| {
            Error::resolution(format!(
                "no operator registry for device kind {device}"
            ))
        })?;
        tracing::debug!(op_type = %def.op_type, %device, "creating operator");
        registry.create(def, ws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CpuContext;
    use crate::definition::{DeviceType, OperatorDef};
    use crate::operator::{DeviceOperator, Operator};
    use crate::{ErrorKind, Result};

    /// Minimal operator used as registry fodder.
    struct NoopOp<C: crate::Context> {
        op: Operator<C>,
    }

    crate::simple_device_operator!(NoopOp);

    impl<C: crate::Context> DeviceOperator for NoopOp<C> {
        fn run_on_device(&mut self) -> Result<bool> {
            Ok(true)
        }
    }

    fn noop_factory(
        def: OperatorDef,
        ws: &mut Workspace,
    ) -> Result<Box<dyn RunnableOperator>> {
        Ok(Box::new(NoopOp::<CpuContext>::new(def, ws)?))
    }

    fn cpu_registry() -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        registry.register("Noop", noop_factory);
        registry
    }

    #[test]
    fn test_register_and_create() {
        let registry = cpu_registry();
        assert!(registry.contains("Noop"));
        assert_eq!(registry.len(), 1);

        let mut ws = Workspace::new();
        let mut op = registry
            .create(OperatorDef::new("Noop").output("Y"), &mut ws)
            .unwrap();
        assert!(op.run().unwrap());
        assert_eq!(op.base().def().op_type, "Noop");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_name_is_fatal() {
        let mut registry = cpu_registry();
        registry.register("Noop", noop_factory);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_device_kind_is_fatal() {
        let mut registries = DeviceRegistries::new();
        registries.register_device(DeviceType::Cpu, cpu_registry());
        registries.register_device(DeviceType::Cpu, OperatorRegistry::new());
    }

    #[test]
    fn test_unknown_name_fails() {
        let registry = cpu_registry();
        let mut ws = Workspace::new();
        let err = registry
            .create(OperatorDef::new("DoesNotExist"), &mut ws)
            .err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(err.to_string().contains("DoesNotExist"));
    }

    #[test]
    fn test_unknown_device_kind_fails_before_name_resolution() {
        let mut registries = DeviceRegistries::new();
        registries.register_device(DeviceType::Cpu, cpu_registry());

        let mut ws = Workspace::new();
        // "Noop" is registered for Cpu, but the definition asks for Gpu.
        let def = OperatorDef::new("Noop").output("Y").device(DeviceType::Gpu);
        let err = registries.create_operator(def, &mut ws).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(err.to_string().contains("device kind gpu"));
        // The miss happened at the device level, not the name level.
        assert!(!err.to_string().contains("Noop"));
    }

    #[test]
    fn test_engine_variant_is_preferred() {
        let mut registry = OperatorRegistry::new();
        registry.register("Noop", noop_factory);
        registry.register_with_engine("Noop", "TUNED", |def, ws| {
            // The tuned variant marks its instances by renaming them.
            Ok(Box::new(NoopOp::<CpuContext>::new(def.name("tuned"), ws)?))
        });

        let mut ws = Workspace::new();
        let op = registry
            .create(OperatorDef::new("Noop").engine("TUNED"), &mut ws)
            .unwrap();
        assert_eq!(op.base().def().name, "tuned");
    }

    #[test]
    fn test_unregistered_engine_falls_back_to_plain_name() {
        let registry = cpu_registry();
        let mut ws = Workspace::new();
        let op = registry
            .create(OperatorDef::new("Noop").engine("NO_SUCH_ENGINE"), &mut ws)
            .unwrap();
        assert_eq!(op.base().def().op_type, "Noop");
    }

    #[test]
    fn test_unsupported_feature_keeps_its_kind_through_the_factory() {
        let mut registry = OperatorRegistry::new();
        registry.register("Picky", |_def, _ws| {
            Err(crate::Error::unsupported_feature(
                "this engine does not support the requested configuration",
            ))
        });

        let mut ws = Workspace::new();
        let err = registry
            .create(OperatorDef::new("Picky"), &mut ws)
            .err().unwrap();
        // Distinguishable from a resolution miss.
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn test_create_operator_routes_by_device_first() {
        let mut registries = DeviceRegistries::new();
        registries.register_device(DeviceType::Cpu, cpu_registry());
        registries.register_device(DeviceType::Gpu, OperatorRegistry::new());

        let mut ws = Workspace::new();
        let op = registries
            .create_operator(OperatorDef::new("Noop").output("Y"), &mut ws)
            .unwrap();
        assert_eq!(op.base().def().op_type, "Noop");

        // Same name against the (empty) Gpu registry is a miss.
        let def = OperatorDef::new("Noop").output("Y").device(DeviceType::Gpu);
        let err = registries.create_operator(def, &mut ws).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }
}
