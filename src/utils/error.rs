// ============================================================================
// 统一错误类型定义
// 使用 thiserror 派生宏，所有 services / commands 共用
// ============================================================================

use thiserror::Error;

/// 应用统一错误枚举
///
/// 每个变体对应一类失败场景。所有失败都只终止当前这一次用户操作，
/// 不会影响会话本身（shell 模式下打印错误后继续读取下一条命令）。
#[derive(Debug, Error)]
pub enum AppError {
    /// 参数验证失败（如未选择条目、名称为空、无效的父文件夹）
    #[error("验证失败：{0}")]
    ValidationError(String),

    /// 按显示名称或索引找不到条目
    #[error("未找到：{0}")]
    NotFound(String),

    /// 撤销 / 重做栈为空
    #[error("{0}")]
    HistoryError(String),

    /// 文件系统重命名失败
    #[error("重命名失败：{0}")]
    RenameError(String),

    /// 新建文件写入失败
    #[error("创建文件失败：{0}")]
    CreateError(String),

    /// ZIP 打包过程中的错误
    #[error("创建归档失败：{0}")]
    ArchiveError(String),

    /// 文件系统 IO 错误
    #[error("IO 错误：{0}")]
    IoError(#[from] std::io::Error),

    /// 数据库操作错误
    #[error("{0}")]
    DatabaseError(String),

    /// 用户取消操作（如在确认提示中选择了“否”）
    #[error("cancelled")]
    Cancelled,
}

/// 便捷类型别名，统一项目内的 Result 签名
pub type AppResult<T> = Result<T, AppError>;

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::DatabaseError(format!("数据库操作失败：{}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::DatabaseError(format!("会话数据序列化失败：{}", err))
    }
}
