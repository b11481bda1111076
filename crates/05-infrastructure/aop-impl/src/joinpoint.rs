//! 切入点表达式
//!
//! 默认使用正则表达式, 且必须匹配完整路径; `glob:` 前缀切换为通配符匹配。

use infrastructure_common::{AopError, AopResult};
use regex::Regex;
use std::fmt;

const GLOB_PREFIX: &str = "glob:";
const REGEX_PREFIX: &str = "regex:";

/// 切入点
#[derive(Clone)]
pub enum Joinpoint {
    /// 完整匹配的正则表达式
    Regex { source: String, regex: Regex },
    /// 通配符表达式
    Glob {
        source: String,
        pattern: glob::Pattern,
    },
}

impl Joinpoint {
    /// 解析切入点表达式
    pub fn parse(expr: &str) -> AopResult<Self> {
        if let Some(pattern) = expr.strip_prefix(GLOB_PREFIX) {
            Self::glob(pattern)
        } else if let Some(pattern) = expr.strip_prefix(REGEX_PREFIX) {
            Self::regex(pattern)
        } else {
            Self::regex(expr)
        }
    }

    /// 正则切入点
    pub fn regex(expr: &str) -> AopResult<Self> {
        let regex = Regex::new(&format!("^(?:{})$", expr)).map_err(|e| {
            AopError::InvalidJoinpoint {
                pattern: expr.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(Self::Regex {
            source: expr.to_string(),
            regex,
        })
    }

    /// 通配符切入点
    pub fn glob(expr: &str) -> AopResult<Self> {
        let pattern = glob::Pattern::new(expr).map_err(|e| AopError::InvalidJoinpoint {
            pattern: expr.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::Glob {
            source: expr.to_string(),
            pattern,
        })
    }

    /// 原始表达式
    pub fn as_str(&self) -> &str {
        match self {
            Self::Regex { source, .. } | Self::Glob { source, .. } => source,
        }
    }

    /// 是否匹配单条路径
    pub fn is_match(&self, path: &str) -> bool {
        match self {
            Self::Regex { regex, .. } => regex.is_match(path),
            Self::Glob { pattern, .. } => pattern.matches(path),
        }
    }

    /// 任意一条候选路径匹配即视为匹配
    pub fn matches<'a, I>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        paths.into_iter().any(|path| self.is_match(path))
    }
}

impl fmt::Debug for Joinpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex { source, .. } => f.debug_tuple("Regex").field(source).finish(),
            Self::Glob { source, .. } => f.debug_tuple("Glob").field(source).finish(),
        }
    }
}

impl fmt::Display for Joinpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 判断表达式是否匹配任意一条候选路径
pub fn matches<'a, I>(pattern: &str, paths: I) -> AopResult<bool>
where
    I: IntoIterator<Item = &'a String>,
{
    Ok(Joinpoint::parse(pattern)?.matches(paths))
}
