//! 通知宏实现

use crate::utils::registration_fn_name;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{ImplItem, ItemImpl, LitStr, Result, Type};

/// 环绕方法声明
struct Around {
    method: syn::Ident,
    joinpoint: LitStr,
}

fn parse_around(attr: &syn::Attribute) -> Result<LitStr> {
    let mut joinpoint = None;
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("joinpoint") {
            joinpoint = Some(meta.value()?.parse::<LitStr>()?);
            Ok(())
        } else {
            Err(meta.error("不支持的 #[around] 参数, 可用参数: joinpoint"))
        }
    })?;
    joinpoint.ok_or_else(|| syn::Error::new_spanned(attr, "#[around] 缺少 joinpoint 参数"))
}

/// 实现 #[aspect]
pub fn aspect_impl(mut item: ItemImpl) -> Result<TokenStream> {
    if item.trait_.is_some() {
        return Err(syn::Error::new_spanned(&item.self_ty, "#[aspect] 只能用于固有 impl 块"));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&item.generics, "通知类型不支持泛型参数"));
    }

    let type_name = match &*item.self_ty {
        Type::Path(type_path) => match type_path.path.segments.last() {
            Some(segment) => segment.ident.clone(),
            None => return Err(syn::Error::new_spanned(&item.self_ty, "无效的通知类型")),
        },
        other => return Err(syn::Error::new_spanned(other, "无效的通知类型")),
    };

    let mut arounds = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let mut kept = Vec::with_capacity(method.attrs.len());
        for attr in method.attrs.drain(..) {
            if attr.path().is_ident("around") {
                arounds.push(Around {
                    method: method.sig.ident.clone(),
                    joinpoint: parse_around(&attr)?,
                });
            } else {
                kept.push(attr);
            }
        }
        method.attrs = kept;
    }

    let self_ty = &item.self_ty;
    let declarations = arounds.iter().map(|around| {
        let Around { method, joinpoint } = around;
        let name = method.to_string();
        quote! { .around(#name, #joinpoint, <#self_ty>::#method) }
    });
    let register_fn = registration_fn_name("aspect", &type_name);

    Ok(quote! {
        #item

        impl ::infrastructure_common::Aspect for #self_ty {
            fn advice_descriptor() -> ::infrastructure_common::AdviceDescriptor {
                ::infrastructure_common::AdviceDescriptor::builder::<#self_ty>()
                    #(#declarations)*
                    .build()
            }
        }

        // 使用 ctor 在程序启动时登记通知描述符
        #[::ctor::ctor]
        fn #register_fn() {
            ::infrastructure_common::register_advice_descriptor(
                <#self_ty as ::infrastructure_common::Aspect>::advice_descriptor,
            );
        }
    })
}
