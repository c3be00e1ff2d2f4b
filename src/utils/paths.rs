// ============================================================================
// 数据目录路径
// 数据目录由调用方显式传入，这里只负责默认值与派生路径
// ============================================================================

use std::path::{Path, PathBuf};

/// 数据库文件名
pub const DATABASE_FILE: &str = "zip_creator.db";

/// 默认数据目录（~/.zip-creator），取不到 home 目录时退回当前目录
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".zip-creator"))
        .unwrap_or_else(|| PathBuf::from(".zip-creator"))
}

/// 数据库文件路径（<data_dir>/zip_creator.db）
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}
