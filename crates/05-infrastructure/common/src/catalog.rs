//! 描述符目录
//!
//! `#[derive(Component)]` 与 `#[aspect]` 生成的代码在程序启动时把描述符工厂登记到这里,
//! 上下文装配时再按命名空间读取。目录只保存描述符工厂, 不保存任何组件实例。

use crate::advice::AdviceDescriptor;
use crate::component::ComponentDescriptor;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::trace;

/// 描述符工厂
pub type ComponentDescriptorFn = fn() -> ComponentDescriptor;
pub type AdviceDescriptorFn = fn() -> AdviceDescriptor;

#[derive(Default)]
struct DescriptorCatalog {
    components: Vec<ComponentDescriptorFn>,
    advices: Vec<AdviceDescriptorFn>,
}

static GLOBAL_DESCRIPTOR_CATALOG: Lazy<RwLock<DescriptorCatalog>> =
    Lazy::new(|| RwLock::new(DescriptorCatalog::default()));

/// 登记组件描述符工厂
pub fn register_component_descriptor(factory: ComponentDescriptorFn) {
    trace!("登记组件描述符");
    GLOBAL_DESCRIPTOR_CATALOG.write().components.push(factory);
}

/// 登记通知描述符工厂
pub fn register_advice_descriptor(factory: AdviceDescriptorFn) {
    trace!("登记通知描述符");
    GLOBAL_DESCRIPTOR_CATALOG.write().advices.push(factory);
}

/// 获取已登记的组件描述符
pub fn registered_component_descriptors() -> Vec<ComponentDescriptor> {
    let factories = GLOBAL_DESCRIPTOR_CATALOG.read().components.clone();
    factories.into_iter().map(|factory| factory()).collect()
}

/// 获取已登记的通知描述符
pub fn registered_advice_descriptors() -> Vec<AdviceDescriptor> {
    let factories = GLOBAL_DESCRIPTOR_CATALOG.read().advices.clone();
    factories.into_iter().map(|factory| factory()).collect()
}
