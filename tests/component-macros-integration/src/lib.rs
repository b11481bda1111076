//! 过程宏与上下文装配的集中集成测试工程, 测试位于 `tests/` 目录
