//! Pre-populated registries for the reference operators.

use crate::{GatherOp, ScaleOp, ScatterAssignOp, SumOp};
use sluice_core::{
    CpuContext, DeviceRegistries, DeviceType, OperatorRegistry, RunnableOperator,
};

/// Returns an operator registry pre-populated with the reference CPU
/// operators.
///
/// The registry includes Scale, Sum, Gather, and ScatterAssign. Custom
/// operators can be added to the returned registry via
/// `registry.register(name, factory)`.
pub fn cpu_operator_registry() -> OperatorRegistry {
    let mut registry = OperatorRegistry::new();

    registry.register("Scale", |def, ws| {
        Ok(Box::new(ScaleOp::<CpuContext>::new(def, ws)?) as Box<dyn RunnableOperator>)
    });
    registry.register("Sum", |def, ws| {
        Ok(Box::new(SumOp::<CpuContext>::new(def, ws)?) as Box<dyn RunnableOperator>)
    });
    registry.register("Gather", |def, ws| {
        Ok(Box::new(GatherOp::<CpuContext>::new(def, ws)?) as Box<dyn RunnableOperator>)
    });
    registry.register("ScatterAssign", |def, ws| {
        Ok(Box::new(ScatterAssignOp::<CpuContext>::new(def, ws)?) as Box<dyn RunnableOperator>)
    });

    registry
}

/// Returns the registry-of-registries with both reference device kinds.
///
/// The Cpu registry carries the reference operators; the Gpu registry is
/// declared up front but empty, for backend crates to populate before
/// handing the set to an executor.
pub fn standard_device_registries() -> DeviceRegistries {
    let mut registries = DeviceRegistries::new();
    registries.register_device(DeviceType::Cpu, cpu_operator_registry());
    registries.register_device(DeviceType::Gpu, OperatorRegistry::new());
    registries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_registry_contents() {
        let registry = cpu_operator_registry();
        let mut names: Vec<_> = registry.operator_names().collect();
        names.sort();
        assert_eq!(names, vec!["Gather", "Scale", "ScatterAssign", "Sum"]);
    }

    #[test]
    fn test_standard_registries_declare_both_kinds() {
        let registries = standard_device_registries();
        assert!(registries.contains_device(DeviceType::Cpu));
        assert!(registries.contains_device(DeviceType::Gpu));
        assert!(registries
            .device_registry(DeviceType::Gpu)
            .unwrap()
            .is_empty());
    }
}
