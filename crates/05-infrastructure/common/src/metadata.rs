//! 元数据定义
//!
//! 提供组件和能力的类型信息

use std::any::TypeId;
use std::fmt;

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 简短类型名称
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 完整路径
    pub path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::named::<T>(std::any::type_name::<T>())
    }

    /// 使用显式路径创建类型信息
    ///
    /// trait 对象的 `type_name` 形如 `dyn a::Step + Send`, 不适合作为切入点路径,
    /// 因此能力类型通过此方法指定路径。
    pub fn named<T: ?Sized + 'static>(path: &str) -> Self {
        Self {
            name: short_name_of(path).to_string(),
            id: TypeId::of::<T>(),
            path: path.to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// 判断名称是否与简短类型名称匹配
    ///
    /// 忽略大小写与下划线, 字段名 `step_impl1` 与类型 `StepImpl1` 相互匹配。
    pub fn matches_name(&self, candidate: &str) -> bool {
        let candidate = normalize_name(candidate);
        !candidate.is_empty() && normalize_name(&self.name) == candidate
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn short_name_of(path: &str) -> &str {
    let base = path.split('<').next().unwrap_or(path);
    base.rsplit("::").next().unwrap_or(base).trim()
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StepImpl1;
    trait Step {}

    #[test]
    fn test_type_info_of() {
        let info = TypeInfo::of::<StepImpl1>();
        assert_eq!(info.short_name(), "StepImpl1");
        assert!(info.path.ends_with("metadata::tests::StepImpl1"));
        assert_eq!(info.id, TypeId::of::<StepImpl1>());
    }

    #[test]
    fn test_named_trait_object() {
        let info = TypeInfo::named::<dyn Step>("app::bean::Step");
        assert_eq!(info.short_name(), "Step");
        assert_eq!(info.to_string(), "app::bean::Step");
        assert_eq!(info.id, TypeId::of::<dyn Step>());
    }

    #[test]
    fn test_short_name_strips_generics() {
        assert_eq!(short_name_of("a::b::Holder<c::D>"), "Holder");
        assert_eq!(short_name_of("Plain"), "Plain");
    }

    #[test]
    fn test_matches_name() {
        let info = TypeInfo::of::<StepImpl1>();
        assert!(info.matches_name("stepImpl1"));
        assert!(info.matches_name("step_impl1"));
        assert!(info.matches_name("STEPIMPL1"));
        assert!(!info.matches_name("stepImpl2"));
        assert!(!info.matches_name(""));
    }

    #[test]
    fn test_matches_name_requires_whole_name() {
        let info = TypeInfo::of::<StepImpl1>();
        assert!(info.matches_name("stepimpl1"));
        assert!(!info.matches_name("step_impl_1x"));
        assert!(!info.matches_name("stepimpl"));
        assert!(!info.matches_name("stepimpl11"));
        assert!(!info.matches_name("step impl1"));
    }
}
