//! 描述符驱动的注册与注入集成测试
//!
//! 不经过上下文装配, 直接使用组件描述符与注册表完成实例化、注册和字段注入。

use di_abstractions::{ComponentInstance, ComponentRegistry, ComponentResolver};
use di_impl::ComponentRegistryImpl;
use infrastructure_common::{
    ComponentDescriptor, DependencyError, DependencySlot, Inject, Injectable,
};
use std::sync::Arc;

trait Step: Send + Sync {
    fn implem_name(&self) -> String;
}

#[derive(Default)]
struct StepImpl1;

#[derive(Default)]
struct StepImpl2;

impl Step for StepImpl1 {
    fn implem_name(&self) -> String {
        "stepImpl1".to_string()
    }
}

impl Step for StepImpl2 {
    fn implem_name(&self) -> String {
        "stepImpl2".to_string()
    }
}

impl Injectable for StepImpl1 {
    fn dependency_slots() -> Vec<DependencySlot> {
        Vec::new()
    }
}

impl Injectable for StepImpl2 {
    fn dependency_slots() -> Vec<DependencySlot> {
        Vec::new()
    }
}

/// 两个同能力字段, 按字段名消歧
#[derive(Default)]
struct Root {
    step_impl1: Inject<dyn Step>,
    step_impl2: Inject<dyn Step>,
}

impl Injectable for Root {
    fn dependency_slots() -> Vec<DependencySlot> {
        vec![
            DependencySlot::new::<Root, dyn Step>("stepImpl1", |root| &root.step_impl1),
            DependencySlot::new::<Root, dyn Step>("stepImpl2", |root| &root.step_impl2),
        ]
    }
}

fn descriptors() -> Vec<ComponentDescriptor> {
    vec![
        ComponentDescriptor::builder::<Root>().build(),
        ComponentDescriptor::builder::<StepImpl1>()
            .provides::<dyn Step>(|c: Arc<StepImpl1>| -> Arc<dyn Step> { c })
            .build(),
        ComponentDescriptor::builder::<StepImpl2>()
            .provides::<dyn Step>(|c: Arc<StepImpl2>| -> Arc<dyn Step> { c })
            .build(),
    ]
}

/// 实例化并注册全部描述符
fn register_all(descriptors: &[ComponentDescriptor]) -> anyhow::Result<ComponentRegistryImpl> {
    let mut registry = ComponentRegistryImpl::new();
    for descriptor in descriptors {
        let target = descriptor.instantiate()?;
        let mut instance = ComponentInstance::new(
            descriptor.type_info.clone(),
            Arc::clone(&target),
            descriptor.slots().to_vec(),
        );
        for capability in descriptor.exposures() {
            let handle = capability
                .upcast(&target)
                .ok_or_else(|| anyhow::anyhow!("无法转换为能力 {}", capability.type_info))?;
            instance = instance.expose(capability.type_info.clone(), handle);
        }
        registry.register(instance)?;
    }
    Ok(registry)
}

/// 为全部实例注入依赖字段
fn inject_all(registry: &ComponentRegistryImpl) -> anyhow::Result<()> {
    for instance in registry.all_instances() {
        for slot in &instance.slots {
            let dependency = registry.resolve_handle(&slot.capability, Some(slot.name.as_str()))?;
            slot.inject_into(&*instance.target, &dependency)?;
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_slots_resolved_by_field_name() -> anyhow::Result<()> {
    let registry = register_all(&descriptors())?;
    inject_all(&registry)?;

    let root = registry.resolve::<Root>(None)?;
    assert_eq!(root.step_impl1.implem_name(), "stepImpl1");
    assert_eq!(root.step_impl2.implem_name(), "stepImpl2");
    Ok(())
}

#[tokio::test]
async fn test_registration_order_does_not_matter() -> anyhow::Result<()> {
    let mut reversed = descriptors();
    reversed.reverse();
    let registry = register_all(&reversed)?;
    inject_all(&registry)?;

    let root = registry.resolve::<Root>(None)?;
    assert_eq!(root.step_impl1.implem_name(), "stepImpl1");
    assert_eq!(root.step_impl2.implem_name(), "stepImpl2");
    Ok(())
}

#[tokio::test]
async fn test_missing_capability_fails_injection() -> anyhow::Result<()> {
    let registry = register_all(&descriptors()[..1])?;
    let err = inject_all(&registry).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DependencyError>(),
        Some(DependencyError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_instance_registration_is_noop() -> anyhow::Result<()> {
    let mut registry = register_all(&descriptors()[1..2])?;
    let existing = Arc::clone(&registry.all_instances()[0]);
    registry.register((*existing).clone())?;

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.candidates(&existing.type_info).len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_instance_without_capabilities_is_rejected() {
    let descriptor = &descriptors()[1];
    let target = descriptor.instantiate().unwrap();
    let instance = ComponentInstance::new(descriptor.type_info.clone(), target, Vec::new());

    let mut registry = ComponentRegistryImpl::new();
    assert!(matches!(
        registry.register(instance),
        Err(DependencyError::RegistrationFailed { .. })
    ));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_concurrent_reads_after_assembly() -> anyhow::Result<()> {
    let registry = register_all(&descriptors())?;
    inject_all(&registry)?;
    let registry = Arc::new(registry);

    let mut tasks = Vec::new();
    for i in 0..8 {
        let registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let name = if i % 2 == 0 { "stepImpl1" } else { "stepImpl2" };
            registry
                .resolve::<dyn Step>(Some(name))
                .map(|step| step.implem_name() == name)
        }));
    }

    for task in tasks {
        assert!(task.await??);
    }
    Ok(())
}
