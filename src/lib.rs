// ============================================================================
// [总线] 程序的组装车间
// ✅ 只能做：pub mod 暴露子模块
// ⛔ 禁止：直接实现业务逻辑（放到 services）或命令（放到 commands）
// ============================================================================

pub mod cli;
pub mod commands;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;
