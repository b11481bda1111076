//! # Component Macros
//!
//! 这个 crate 提供了生成组件描述符、能力代理与通知描述符的过程宏。
//!
//! ## 核心宏
//!
//! - [`Component`] - 受管组件, 生成描述符并在启动时登记
//! - [`Injectable`] - 只声明依赖字段, 用于交给上下文注入的外部对象
//! - [`advisable`] - 可拦截能力, 生成代理类型
//! - [`aspect`] - 通知类型, 收集 `#[around]` 环绕方法
//!
//! 生成代码引用 `::infrastructure_common` 与 `::ctor`, 使用方需要同时依赖这两个 crate。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use component_macros::{advisable, aspect, Component};
//! use infrastructure_common::{AdviceResult, Arguments, Inject, Invoker, JoinPoint};
//!
//! #[advisable]
//! pub trait Step: Send + Sync {
//!     fn implem_name(&self) -> String;
//! }
//!
//! #[derive(Default, Component)]
//! #[component(advisable(dyn Step))]
//! pub struct StepImpl1;
//!
//! impl Step for StepImpl1 {
//!     fn implem_name(&self) -> String {
//!         "stepImpl1".to_string()
//!     }
//! }
//!
//! #[derive(Default, Component)]
//! pub struct Root {
//!     #[inject(name = "stepImpl1")]
//!     step: Inject<dyn Step>,
//! }
//!
//! #[derive(Default)]
//! pub struct Advice1;
//!
//! #[aspect]
//! impl Advice1 {
//!     #[around(joinpoint = ".*StepImpl1.*")]
//!     fn intercept(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
//!         let name: String = invoker.proceed_as(args)?;
//!         Ok(infrastructure_common::value(format!("interceptor => {}", name)))
//!     }
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, ItemImpl, ItemTrait};

mod advisable;
mod aspect;
mod component;
mod utils;

// Re-exports are not allowed in proc-macro crates

/// 组件派生宏
///
/// 实现 `Injectable` 与 `Component`, 并在程序启动时把描述符登记到全局目录。
/// 类型为 `Inject<T>` 的字段视为依赖字段, 字段名即消歧名称。
///
/// # 参数
///
/// - `advisable(dyn A, ...)` - 可拦截能力, trait 需标注 `#[advisable]`
/// - `provides(dyn B, ...)` - 普通能力
/// - `factory = path` - 构造函数, 签名为 `fn() -> Result<Self, E>`; 缺省时使用 `Default`
///
/// 字段属性 `#[inject(name = "...")]` 覆盖消歧名称。
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Component)]
/// #[component(advisable(dyn Rule), factory = RuleImpl::load)]
/// pub struct RuleImpl {
///     #[inject(name = "stepImpl2")]
///     step: Inject<dyn Step>,
/// }
/// ```
#[proc_macro_derive(Component, attributes(component, inject))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_component_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 可注入对象派生宏
///
/// 只实现 `Injectable`, 不登记为组件。
///
/// # 示例
///
/// ```rust,ignore
/// #[derive(Default, Injectable)]
/// pub struct Handler {
///     rule: Inject<dyn Rule>,
/// }
///
/// context.inject(&handler)?;
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_injectable_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 可拦截能力宏
///
/// 为 trait 生成 `{Trait}Proxy` 与 `impl Advisable for dyn Trait`。
/// trait 必须以 `Send + Sync` 为父 trait, 其余父 trait 必须同样标注 `#[advisable]`,
/// 组件声明子 trait 时一并登记全部父 trait; 方法接收者必须为 `&self`,
/// 参数与返回值必须为 `'static` 类型。返回 `Result` 的方法要求错误类型实现 `From<AopError>`,
/// 其余方法在通知失败时 panic。
///
/// # 参数
///
/// - `path = "..."` - 切入点匹配使用的声明类型路径, 缺省为 `module_path!()::Trait`
#[proc_macro_attribute]
pub fn advisable(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemTrait);
    advisable::advisable_impl(args.into(), item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// 通知宏
///
/// 标注在通知类型的固有 impl 块上, 收集 `#[around(joinpoint = "...")]` 方法并实现 `Aspect`。
/// 环绕方法签名为 `fn(&self, &JoinPoint, Arguments, Invoker) -> AdviceResult`,
/// 通知类型需要实现 `Default`。
#[proc_macro_attribute]
pub fn aspect(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        return syn::Error::new(proc_macro2::Span::call_site(), "#[aspect] 不接受参数")
            .into_compile_error()
            .into();
    }
    let item = parse_macro_input!(input as ItemImpl);
    aspect::aspect_impl(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
