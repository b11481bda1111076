//! 可拦截能力宏实现
//!
//! 为 trait 生成 `Proxy<C>` 上的转发实现、`{Trait}Proxy` 别名与 `impl Advisable for dyn Trait`。
//! 代理的每个方法把参数装箱后交给分派器, 原方法体在闭包中调用目标实例。
//!
//! 父 trait 除 `Send`/`Sync`/`Sized` 与生命周期外必须同样标注 `#[advisable]`,
//! 子 trait 的代理借助父 trait 对 `Proxy<C>` 的实现转发父 trait 方法。

use crate::utils::{borrows, is_result_type};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    FnArg, Ident, ItemTrait, LitStr, Pat, PatIdent, PatType, Path, PathArguments, Result,
    ReturnType, Signature, TraitBoundModifier, TraitItem, TraitItemFn, Type, TypeParamBound,
    WherePredicate,
};

/// 不参与代理的标记父 trait
const MARKER_TRAITS: &[&str] = &["Send", "Sync", "Sized"];

/// `#[advisable(...)]` 参数
#[derive(Default)]
pub struct AdvisableArgs {
    /// 切入点匹配使用的声明类型路径, 默认为 `module_path!()::Trait`
    pub path: Option<LitStr>,
}

impl AdvisableArgs {
    pub fn parse(args: TokenStream) -> Result<Self> {
        let mut parsed = AdvisableArgs::default();
        if args.is_empty() {
            return Ok(parsed);
        }

        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("path") {
                parsed.path = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("不支持的 #[advisable] 参数, 可用参数: path"))
            }
        });
        syn::parse::Parser::parse2(parser, args)?;
        Ok(parsed)
    }
}

/// 被代理的方法
struct ProxiedMethod<'a> {
    sig: &'a Signature,
    args: Vec<(Ident, Type)>,
    output: Type,
    fallible: bool,
}

fn requires_sized(method: &TraitItemFn) -> bool {
    method
        .sig
        .generics
        .where_clause
        .as_ref()
        .map(|clause| {
            clause.predicates.iter().any(|predicate| match predicate {
                WherePredicate::Type(bound) => {
                    matches!(&bound.bounded_ty, Type::Path(p) if p.path.is_ident("Self"))
                        && bound.bounds.iter().any(|b| {
                            matches!(b, syn::TypeParamBound::Trait(t) if t.path.is_ident("Sized"))
                        })
                }
                _ => false,
            })
        })
        .unwrap_or(false)
}

/// 需要转发的可拦截父 trait
fn advisable_supertraits(item: &ItemTrait) -> Result<Vec<&Path>> {
    let mut supertraits = Vec::new();
    for bound in &item.supertraits {
        match bound {
            TypeParamBound::Lifetime(_) => {}
            TypeParamBound::Trait(bound) => {
                let Some(last) = bound.path.segments.last() else {
                    continue;
                };
                if MARKER_TRAITS.iter().any(|marker| last.ident == *marker) {
                    continue;
                }
                if !matches!(bound.modifier, TraitBoundModifier::None)
                    || bound.lifetimes.is_some()
                    || !matches!(last.arguments, PathArguments::None)
                {
                    return Err(syn::Error::new_spanned(
                        bound,
                        "可拦截能力的父 trait 必须是不带泛型参数的 #[advisable] trait",
                    ));
                }
                supertraits.push(&bound.path);
            }
            other => return Err(syn::Error::new_spanned(other, "不支持的父 trait 约束")),
        }
    }
    Ok(supertraits)
}

fn proxied_method(method: &TraitItemFn) -> Result<ProxiedMethod<'_>> {
    let sig = &method.sig;
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(sig, "可拦截方法不支持 async"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&sig.generics, "可拦截方法不支持泛型参数"));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() =>
        {
            if receiver.colon_token.is_some() {
                return Err(syn::Error::new_spanned(receiver, "可拦截方法的接收者必须为 &self"));
            }
        }
        _ => {
            return Err(syn::Error::new_spanned(sig, "可拦截方法的接收者必须为 &self"));
        }
    }

    let mut args = Vec::new();
    for (index, input) in inputs.enumerate() {
        let FnArg::Typed(PatType { ty, .. }) = input else {
            return Err(syn::Error::new_spanned(input, "无效的参数"));
        };
        if borrows(ty) {
            return Err(syn::Error::new_spanned(
                ty,
                "可拦截方法的参数必须为拥有所有权的 'static 类型",
            ));
        }
        args.push((format_ident!("__arg{}", index), (**ty).clone()));
    }

    let output: Type = match &sig.output {
        ReturnType::Default => syn::parse_quote!(()),
        ReturnType::Type(_, ty) => {
            if borrows(ty) {
                return Err(syn::Error::new_spanned(
                    ty,
                    "可拦截方法的返回值必须为拥有所有权的 'static 类型",
                ));
            }
            (**ty).clone()
        }
    };

    Ok(ProxiedMethod {
        sig,
        fallible: is_result_type(&output),
        args,
        output,
    })
}

fn proxy_method(method: &ProxiedMethod<'_>) -> TokenStream {
    let name = &method.sig.ident;
    let name_str = name.to_string();
    let output = &method.output;

    // 代理签名使用生成的参数名
    let mut sig = method.sig.clone();
    for (input, (ident, _)) in sig.inputs.iter_mut().skip(1).zip(&method.args) {
        if let FnArg::Typed(pat_type) = input {
            *pat_type.pat = Pat::Ident(PatIdent {
                attrs: Vec::new(),
                by_ref: None,
                mutability: None,
                ident: ident.clone(),
                subpat: None,
            });
        }
    }

    let idents: Vec<&Ident> = method.args.iter().map(|(ident, _)| ident).collect();
    let tys: Vec<&Type> = method.args.iter().map(|(_, ty)| ty).collect();
    let indices = 0..method.args.len();

    let unpack = if method.args.is_empty() {
        quote! {}
    } else {
        quote! {
            let mut __args = __args;
            #(let #idents: #tys = __args.take(#indices, #name_str)?;)*
        }
    };
    let args_name = if method.args.is_empty() {
        quote!(_)
    } else {
        quote!(__args)
    };

    let on_error = if method.fallible {
        quote! { ::std::result::Result::Err(::std::convert::From::from(__err)) }
    } else {
        quote! { ::std::panic!("{}", __err) }
    };

    quote! {
        #sig {
            let __target = ::std::sync::Arc::clone(::infrastructure_common::Proxy::target(self));
            #[allow(unused_mut)]
            let mut __call_args = ::infrastructure_common::Arguments::new();
            #(__call_args.push(#idents);)*
            let __body: ::infrastructure_common::MethodBody = ::std::boxed::Box::new(
                move |#args_name: ::infrastructure_common::Arguments|
                      -> ::infrastructure_common::AopResult<::infrastructure_common::Value> {
                    #unpack
                    ::std::result::Result::Ok(::infrastructure_common::value(__target.#name(#(#idents),*)))
                },
            );
            match ::infrastructure_common::Proxy::dispatcher(self)
                .dispatch(#name_str, __call_args, __body)
                .and_then(|__ret| ::infrastructure_common::downcast_value::<#output>(__ret, #name_str))
            {
                ::std::result::Result::Ok(__ret) => __ret,
                ::std::result::Result::Err(__err) => #on_error,
            }
        }
    }
}

/// 实现 #[advisable]
pub fn advisable_impl(args: TokenStream, item: ItemTrait) -> Result<TokenStream> {
    let args = AdvisableArgs::parse(args)?;

    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&item.generics, "可拦截能力不支持泛型参数"));
    }

    let supertraits = advisable_supertraits(&item)?;

    let mut methods = Vec::new();
    for trait_item in &item.items {
        match trait_item {
            TraitItem::Fn(method) if requires_sized(method) => {
                if method.default.is_none() {
                    return Err(syn::Error::new_spanned(
                        &method.sig,
                        "`where Self: Sized` 方法必须提供默认实现",
                    ));
                }
            }
            TraitItem::Fn(method) => methods.push(proxied_method(method)?),
            TraitItem::Type(ty) => {
                return Err(syn::Error::new_spanned(ty, "可拦截能力不支持关联类型"));
            }
            TraitItem::Const(constant) => {
                return Err(syn::Error::new_spanned(constant, "可拦截能力不支持关联常量"));
            }
            _ => {}
        }
    }

    let vis = &item.vis;
    let trait_name = &item.ident;
    let proxy_name = Ident::new(&format!("{}Proxy", trait_name), Span::call_site());
    let method_names: Vec<String> = methods.iter().map(|m| m.sig.ident.to_string()).collect();
    let proxy_methods = methods.iter().map(proxy_method);

    let path = match &args.path {
        Some(path) => quote!(#path),
        None => quote!(::std::concat!(::std::module_path!(), "::", ::std::stringify!(#trait_name))),
    };

    Ok(quote! {
        #item

        /// 由 `#[advisable]` 生成的代理
        #[allow(dead_code)]
        #vis type #proxy_name = ::infrastructure_common::Proxy<dyn #trait_name>;

        impl<__C: ?::std::marker::Sized + #trait_name + 'static> #trait_name
            for ::infrastructure_common::Proxy<__C>
        {
            #(#proxy_methods)*
        }

        impl ::infrastructure_common::Advisable for dyn #trait_name {
            fn capability() -> ::infrastructure_common::TypeInfo {
                ::infrastructure_common::TypeInfo::named::<dyn #trait_name>(#path)
            }

            fn methods() -> ::std::vec::Vec<&'static str> {
                #[allow(unused_mut)]
                let mut methods: ::std::vec::Vec<&'static str> = ::std::vec![#(#method_names),*];
                #(
                    for method in <dyn #supertraits as ::infrastructure_common::Advisable>::methods() {
                        if !methods.contains(&method) {
                            methods.push(method);
                        }
                    }
                )*
                methods
            }

            fn proxy(
                target: ::std::sync::Arc<Self>,
                dispatch: ::std::sync::Arc<dyn ::infrastructure_common::MethodDispatch>,
            ) -> ::std::sync::Arc<Self> {
                ::std::sync::Arc::new(::infrastructure_common::Proxy::new(target, dispatch))
            }
        }

        impl<__T> ::infrastructure_common::AdvisableFor<__T> for dyn #trait_name
        where
            __T: #trait_name + 'static,
        {
            fn supertraits() -> ::std::vec::Vec<::infrastructure_common::CapabilityDescriptor> {
                #[allow(unused_mut)]
                let mut capabilities = ::std::vec::Vec::new();
                #(
                    capabilities.push(
                        ::infrastructure_common::CapabilityDescriptor::advisable::<__T, dyn #supertraits>(
                            |__target: ::std::sync::Arc<__T>| -> ::std::sync::Arc<dyn #supertraits> { __target },
                        ),
                    );
                    capabilities.extend(
                        <dyn #supertraits as ::infrastructure_common::AdvisableFor<__T> >::supertraits(),
                    );
                )*
                capabilities
            }
        }
    })
}
