// ============================================================================
// 业务层：纯 Rust 核心逻辑
// ✅ 特点：不依赖 CLI 与数据库，保持纯净，方便写 #[test]
// ⛔ 禁止：直接读写终端或提示用户
// ============================================================================

pub mod entry_list;
pub mod history;
pub mod naming;
pub mod packer;
pub mod session;
