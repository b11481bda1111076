//! 宏工具函数

use proc_macro2::Span;
use syn::{Field, Ident, Lit, Type};

/// 从类型中提取泛型参数
pub fn extract_generic_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner_type)) = args.args.first() {
                    return Some(inner_type);
                }
            }
        }
    }
    None
}

/// 检查类型是否为 `Inject<T>`, 返回依赖类型
pub fn inject_target(ty: &Type) -> Option<&Type> {
    match ty {
        Type::Path(type_path) => {
            let segment = type_path.path.segments.last()?;
            if segment.ident == "Inject" {
                extract_generic_type(ty)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// 检查类型是否为 Result 类型（包括 `io::Result`、`anyhow::Result` 等别名）
///
/// 末段必须带泛型参数, `SearchResult` 这类普通结构体不视为 Result。
pub fn is_result_type(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| {
                segment.ident.to_string().ends_with("Result")
                    && matches!(segment.arguments, syn::PathArguments::AngleBracketed(_))
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// 检查类型是否包含引用或借用生命周期
pub fn borrows(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => {
            reference
                .lifetime
                .as_ref()
                .map_or(true, |lifetime| lifetime.ident != "static")
                || borrows(&reference.elem)
        }
        Type::ImplTrait(_) => true,
        Type::Paren(inner) => borrows(&inner.elem),
        Type::Group(inner) => borrows(&inner.elem),
        Type::Slice(inner) => borrows(&inner.elem),
        Type::Array(inner) => borrows(&inner.elem),
        Type::Tuple(tuple) => tuple.elems.iter().any(borrows),
        Type::Path(type_path) => type_path.path.segments.iter().any(|segment| {
            match &segment.arguments {
                syn::PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| match arg {
                    syn::GenericArgument::Lifetime(lifetime) => lifetime.ident != "static",
                    syn::GenericArgument::Type(inner) => borrows(inner),
                    _ => false,
                }),
                _ => false,
            }
        }),
        _ => false,
    }
}

/// 生成注册函数名
pub fn registration_fn_name(prefix: &str, type_name: &Ident) -> Ident {
    Ident::new(
        &format!("__register_{}_{}", prefix, to_snake_case(&type_name.to_string())),
        Span::call_site(),
    )
}

/// 将驼峰命名转换为蛇形命名
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            // 检查前一个字符是否为小写，或者下一个字符是否为小写
            let prev_is_lower = chars.get(i - 1).map_or(false, |c| c.is_lowercase());
            let next_is_lower = chars.get(i + 1).map_or(false, |c| c.is_lowercase());

            if prev_is_lower || next_is_lower {
                result.push('_');
            }
        }
        result.push(ch.to_lowercase().next().unwrap_or(ch));
    }

    result
}

/// 从字段属性中提取字符串值
pub fn extract_string_from_field_attr(
    field: &Field,
    attr_name: &str,
    key: &str,
) -> syn::Result<Option<String>> {
    let mut result = None;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident(attr_name)) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                if let Lit::Str(lit_str) = meta.value()?.parse::<Lit>()? {
                    result = Some(lit_str.value());
                    return Ok(());
                }
            }
            Err(meta.error(format!("不支持的 #[{}] 参数", attr_name)))
        })?;
    }
    Ok(result)
}
