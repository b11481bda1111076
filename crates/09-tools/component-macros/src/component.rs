//! 组件派生宏实现

use crate::utils::{extract_string_from_field_attr, inject_target, registration_fn_name};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parenthesized, punctuated::Punctuated, Data, DeriveInput, Fields, Path, Result, Token, Type,
};

/// 组件属性参数
#[derive(Default)]
pub struct ComponentArgs {
    /// 普通能力
    pub provides: Vec<Type>,
    /// 可拦截能力
    pub advisable: Vec<Type>,
    /// 自定义工厂函数
    pub factory: Option<Path>,
}

impl ComponentArgs {
    /// 解析 `#[component(...)]` 属性
    pub fn from_attrs(input: &DeriveInput) -> Result<Self> {
        let mut args = ComponentArgs::default();

        for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("provides") {
                    args.provides.extend(parse_type_list(&meta)?);
                } else if meta.path.is_ident("advisable") {
                    args.advisable.extend(parse_type_list(&meta)?);
                } else if meta.path.is_ident("factory") {
                    args.factory = Some(meta.value()?.parse()?);
                } else {
                    return Err(meta.error("不支持的 #[component] 参数, 可用参数: provides, advisable, factory"));
                }
                Ok(())
            })?;
        }

        Ok(args)
    }
}

fn parse_type_list(meta: &syn::meta::ParseNestedMeta) -> Result<Vec<Type>> {
    let content;
    parenthesized!(content in meta.input);
    let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
    Ok(types.into_iter().collect())
}

/// 依赖字段
struct SlotField {
    field: syn::Ident,
    name: String,
    dependency: Type,
}

fn slot_fields(input: &DeriveInput) -> Result<Vec<SlotField>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "只能为结构体派生"));
    };

    let fields = match &data.fields {
        Fields::Named(named) => &named.named,
        Fields::Unit => return Ok(Vec::new()),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(&input.ident, "不支持元组结构体"));
        }
    };

    let mut slots = Vec::new();
    for field in fields {
        let Some(dependency) = inject_target(&field.ty) else {
            continue;
        };
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let name = extract_string_from_field_attr(field, "inject", "name")?
            .unwrap_or_else(|| ident.to_string());
        slots.push(SlotField {
            field: ident,
            name,
            dependency: dependency.clone(),
        });
    }
    Ok(slots)
}

fn reject_generics(input: &DeriveInput) -> Result<()> {
    if input.generics.params.is_empty() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(&input.generics, "受管组件不支持泛型参数"))
    }
}

fn injectable_impl(input: &DeriveInput) -> Result<TokenStream> {
    let ty = &input.ident;
    let slots = slot_fields(input)?.into_iter().map(|slot| {
        let SlotField {
            field,
            name,
            dependency,
        } = slot;
        quote! {
            ::infrastructure_common::DependencySlot::new::<#ty, #dependency>(#name, |__c| &__c.#field)
        }
    });

    Ok(quote! {
        impl ::infrastructure_common::Injectable for #ty {
            fn dependency_slots() -> ::std::vec::Vec<::infrastructure_common::DependencySlot> {
                ::std::vec![#(#slots),*]
            }
        }
    })
}

/// 实现 #[derive(Injectable)]
pub fn derive_injectable_impl(input: DeriveInput) -> Result<TokenStream> {
    reject_generics(&input)?;
    injectable_impl(&input)
}

/// 实现 #[derive(Component)]
pub fn derive_component_impl(input: DeriveInput) -> Result<TokenStream> {
    reject_generics(&input)?;
    let args = ComponentArgs::from_attrs(&input)?;
    let injectable = injectable_impl(&input)?;
    let ty = &input.ident;

    let builder = match &args.factory {
        Some(factory) => quote! {
            ::infrastructure_common::ComponentDescriptor::builder_with_factory::<#ty, _, _>(#factory)
        },
        None => quote! {
            ::infrastructure_common::ComponentDescriptor::builder::<#ty>()
        },
    };

    let advisable = args.advisable.iter().map(|capability| {
        quote! {
            .advisable::<#capability>(
                |__c: ::std::sync::Arc<#ty>| -> ::std::sync::Arc<#capability> { __c }
            )
        }
    });
    let provides = args.provides.iter().map(|capability| {
        quote! {
            .provides::<#capability>(
                |__c: ::std::sync::Arc<#ty>| -> ::std::sync::Arc<#capability> { __c }
            )
        }
    });

    let register_fn = registration_fn_name("component", ty);

    Ok(quote! {
        #injectable

        impl ::infrastructure_common::Component for #ty {
            fn descriptor() -> ::infrastructure_common::ComponentDescriptor {
                #builder
                    #(#advisable)*
                    #(#provides)*
                    .build()
            }
        }

        // 使用 ctor 在程序启动时登记组件描述符
        #[::ctor::ctor]
        fn #register_fn() {
            ::infrastructure_common::register_component_descriptor(
                <#ty as ::infrastructure_common::Component>::descriptor,
            );
        }
    })
}
