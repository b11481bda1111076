//! 组件模型定义
//!
//! 描述受管组件的静态元数据: 自身类型、提供的能力、依赖字段与构造方式。
//! 描述符在发现阶段创建, 之后不再变化。

use crate::dispatch::{Advisable, AdvisableFor, MethodDispatch};
use crate::errors::{DependencyError, DependencyResult};
use crate::inject::Inject;
use crate::metadata::TypeInfo;
use crate::method::{MethodDescriptor, MethodKey};
use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 组件实例句柄, 内部为 `Arc<T>` 擦除后的具体实例
pub type ComponentHandle = Arc<dyn Any + Send + Sync>;

/// 能力句柄, 内部保存 `Arc<C>`, `C` 为能力类型（具体类型或 trait 对象）
pub type CapabilityHandle = Arc<dyn Any + Send + Sync>;

type UpcastFn = Arc<dyn Fn(&ComponentHandle) -> Option<CapabilityHandle> + Send + Sync>;
type ProxyFn =
    Arc<dyn Fn(&CapabilityHandle, Arc<dyn MethodDispatch>) -> Option<CapabilityHandle> + Send + Sync>;
type FactoryFn = Arc<dyn Fn() -> Result<ComponentHandle, Box<dyn Error + Send + Sync>> + Send + Sync>;
type InjectorFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &CapabilityHandle) -> DependencyResult<()> + Send + Sync>;

/// 可注入对象 trait
///
/// 声明对象上的依赖字段。外部对象只需实现此 trait 即可交给上下文注入。
pub trait Injectable: Any + Send + Sync {
    /// 依赖字段列表
    fn dependency_slots() -> Vec<DependencySlot>;
}

/// 受管组件 trait
///
/// 每个实现类型在上下文中只有一个单例实例。
pub trait Component: Injectable + Sized {
    /// 组件描述符
    fn descriptor() -> ComponentDescriptor;
}

/// 从能力句柄取出类型化实例
pub fn downcast_capability<C: ?Sized + 'static>(handle: &CapabilityHandle) -> Option<Arc<C>> {
    handle.downcast_ref::<Arc<C>>().cloned()
}

/// 能力描述符
#[derive(Clone)]
pub struct CapabilityDescriptor {
    /// 能力类型信息
    pub type_info: TypeInfo,
    methods: Vec<&'static str>,
    upcast: UpcastFn,
    proxy: Option<ProxyFn>,
}

impl CapabilityDescriptor {
    /// 组件自身类型
    pub fn identity<T: Any + Send + Sync>() -> Self {
        Self::plain::<T, T>(|target| target)
    }

    /// 普通能力, 不参与方法拦截
    pub fn plain<T, C>(upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        T: Any + Send + Sync,
        C: ?Sized + Send + Sync + 'static,
    {
        Self {
            type_info: TypeInfo::of::<C>(),
            methods: Vec::new(),
            upcast: upcast_fn(upcast),
            proxy: None,
        }
    }

    /// 可拦截能力, 其方法参与切入点匹配
    pub fn advisable<T, C>(upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        T: Any + Send + Sync,
        C: ?Sized + Advisable,
    {
        let proxy: ProxyFn = Arc::new(
            |plain: &CapabilityHandle, dispatch: Arc<dyn MethodDispatch>| {
                let target = downcast_capability::<C>(plain)?;
                Some(Arc::new(C::proxy(target, dispatch)) as CapabilityHandle)
            },
        );

        Self {
            type_info: C::capability(),
            methods: C::methods(),
            upcast: upcast_fn(upcast),
            proxy: Some(proxy),
        }
    }

    /// 可拦截的公开方法
    pub fn methods(&self) -> &[&'static str] {
        &self.methods
    }

    pub fn is_advisable(&self) -> bool {
        self.proxy.is_some()
    }

    /// 将组件实例转换为能力句柄
    pub fn upcast(&self, target: &ComponentHandle) -> Option<CapabilityHandle> {
        (self.upcast)(target)
    }

    /// 为能力句柄构建代理, 非可拦截能力返回 `None`
    pub fn proxy(
        &self,
        plain: &CapabilityHandle,
        dispatch: Arc<dyn MethodDispatch>,
    ) -> Option<CapabilityHandle> {
        self.proxy.as_ref().and_then(|proxy| proxy(plain, dispatch))
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("type_info", &self.type_info.path)
            .field("methods", &self.methods)
            .field("advisable", &self.is_advisable())
            .finish()
    }
}

fn upcast_fn<T, C>(upcast: fn(Arc<T>) -> Arc<C>) -> UpcastFn
where
    T: Any + Send + Sync,
    C: ?Sized + Send + Sync + 'static,
{
    Arc::new(move |target: &ComponentHandle| {
        let concrete = Arc::clone(target).downcast::<T>().ok()?;
        Some(Arc::new(upcast(concrete)) as CapabilityHandle)
    })
}

/// 依赖字段描述
#[derive(Clone)]
pub struct DependencySlot {
    /// 字段名称, 多个候选时用于消歧
    pub name: String,
    /// 所需能力
    pub capability: TypeInfo,
    injector: InjectorFn,
}

impl DependencySlot {
    /// 创建依赖字段描述
    ///
    /// `accessor` 返回宿主对象上的 [`Inject`] 字段。
    pub fn new<T, D>(name: &str, accessor: fn(&T) -> &Inject<D>) -> Self
    where
        T: Any + Send + Sync,
        D: ?Sized + Send + Sync + 'static,
    {
        let slot_name = name.to_string();
        let injector: InjectorFn = Arc::new(
            move |target: &(dyn Any + Send + Sync), dependency: &CapabilityHandle| {
                let failed = |message: &str| DependencyError::InjectionFailed {
                    type_name: std::any::type_name::<T>().to_string(),
                    slot: slot_name.clone(),
                    message: message.to_string(),
                };

                let host = target
                    .downcast_ref::<T>()
                    .ok_or_else(|| failed("宿主对象类型不匹配"))?;
                let dependency =
                    downcast_capability::<D>(dependency).ok_or_else(|| failed("依赖实例类型不匹配"))?;

                if accessor(host).set(dependency) {
                    Ok(())
                } else {
                    Err(failed("字段已注入其他实例"))
                }
            },
        );

        Self {
            name: name.to_string(),
            capability: TypeInfo::of::<D>(),
            injector,
        }
    }

    /// 将依赖写入宿主对象
    pub fn inject_into(
        &self,
        target: &(dyn Any + Send + Sync),
        dependency: &CapabilityHandle,
    ) -> DependencyResult<()> {
        (self.injector)(target, dependency)
    }
}

impl fmt::Debug for DependencySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencySlot")
            .field("name", &self.name)
            .field("capability", &self.capability.path)
            .finish()
    }
}

/// 组件描述符
#[derive(Clone)]
pub struct ComponentDescriptor {
    /// 组件类型信息
    pub type_info: TypeInfo,
    identity: CapabilityDescriptor,
    capabilities: Vec<CapabilityDescriptor>,
    slots: Vec<DependencySlot>,
    factory: FactoryFn,
}

impl ComponentDescriptor {
    /// 使用 `Default` 构造的描述符构建器
    pub fn builder<T: Injectable + Default>() -> ComponentDescriptorBuilder<T> {
        Self::builder_with_factory(|| Ok::<T, std::convert::Infallible>(T::default()))
    }

    /// 使用自定义工厂的描述符构建器
    pub fn builder_with_factory<T, E, F>(factory: F) -> ComponentDescriptorBuilder<T>
    where
        T: Injectable,
        E: Into<Box<dyn Error + Send + Sync>>,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        let factory: FactoryFn = Arc::new(move || {
            factory()
                .map(|instance| Arc::new(instance) as ComponentHandle)
                .map_err(Into::into)
        });

        ComponentDescriptorBuilder {
            type_info: TypeInfo::of::<T>(),
            capabilities: Vec::new(),
            slots: T::dependency_slots(),
            factory,
            _marker: PhantomData,
        }
    }

    /// 组件自身类型能力
    pub fn identity(&self) -> &CapabilityDescriptor {
        &self.identity
    }

    /// 声明的能力
    pub fn capabilities(&self) -> &[CapabilityDescriptor] {
        &self.capabilities
    }

    /// 组件在注册表中暴露的全部能力, 自身类型在前
    pub fn exposures(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        std::iter::once(&self.identity).chain(self.capabilities.iter())
    }

    /// 依赖字段
    pub fn slots(&self) -> &[DependencySlot] {
        &self.slots
    }

    /// 构造组件实例
    pub fn instantiate(&self) -> DependencyResult<ComponentHandle> {
        (self.factory)().map_err(|source| DependencyError::InstantiationError {
            type_name: self.type_info.path.clone(),
            source,
        })
    }

    /// 可拦截的公开方法
    ///
    /// 同名方法合并为一个, 其路径集合包含组件自身路径以及每个声明该方法的能力路径。
    pub fn public_methods(&self) -> Vec<MethodDescriptor> {
        let mut methods: BTreeMap<&'static str, MethodDescriptor> = BTreeMap::new();

        for capability in self.capabilities.iter().filter(|c| c.is_advisable()) {
            for name in capability.methods() {
                methods
                    .entry(*name)
                    .or_insert_with(|| {
                        MethodDescriptor::new(
                            MethodKey::new(self.type_info.id, *name),
                            &self.type_info,
                        )
                    })
                    .add_declaring_type(&capability.type_info);
            }
        }

        methods.into_values().collect()
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("type_info", &self.type_info.path)
            .field("capabilities", &self.capabilities)
            .field("slots", &self.slots)
            .finish()
    }
}

/// 组件描述符构建器
pub struct ComponentDescriptorBuilder<T> {
    type_info: TypeInfo,
    capabilities: Vec<CapabilityDescriptor>,
    slots: Vec<DependencySlot>,
    factory: FactoryFn,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> ComponentDescriptorBuilder<T> {
    /// 声明普通能力
    ///
    /// 普通能力不携带父 trait 信息, 需要按父 trait 解析时应一并声明。
    pub fn provides<C>(mut self, upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.push_capability(CapabilityDescriptor::plain(upcast));
        self
    }

    /// 声明可拦截能力, 同时登记其全部可拦截父 trait
    pub fn advisable<C>(mut self, upcast: fn(Arc<T>) -> Arc<C>) -> Self
    where
        C: ?Sized + AdvisableFor<T>,
    {
        self.push_capability(CapabilityDescriptor::advisable(upcast));
        for inherited in C::supertraits() {
            self.push_capability(inherited);
        }
        self
    }

    /// 追加依赖字段
    pub fn slot(mut self, slot: DependencySlot) -> Self {
        self.slots.push(slot);
        self
    }

    // 同一能力只登记一次, 先声明者优先
    fn push_capability(&mut self, capability: CapabilityDescriptor) {
        let declared = self
            .capabilities
            .iter()
            .any(|existing| existing.type_info.id == capability.type_info.id);
        if !declared {
            self.capabilities.push(capability);
        }
    }

    pub fn build(self) -> ComponentDescriptor {
        ComponentDescriptor {
            type_info: self.type_info,
            identity: CapabilityDescriptor::identity::<T>(),
            capabilities: self.capabilities,
            slots: self.slots,
            factory: self.factory,
        }
    }
}
