// ============================================================================
// 数据传输对象（DTO）定义
// 前端（CLI / shell）展示用的数据结构，仅包含字段定义和序列化派生
// ⛔ 禁止：包含复杂的业务逻辑方法
// ============================================================================

use serde::{Deserialize, Serialize};

/// 条目列表中的一行，由 `list` 命令返回
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EntryView {
    /// 条目在列表中的位置（从 0 开始）
    pub index: usize,
    /// 条目类型：file / folder / virtual
    pub kind: String,
    /// 归档内的显示名称
    pub display_name: String,
    /// 磁盘来源路径，虚拟文件夹为 None
    pub source: Option<String>,
}

/// 会话统计信息（条目数量与文件总大小）
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// 列表中的条目总数
    pub item_count: usize,
    /// 仍然存在的文件条目的字节总数
    pub total_bytes: u64,
    /// 可撤销步数
    pub undo_depth: usize,
    /// 可重做步数
    pub redo_depth: usize,
}

/// 打包结果，由 `archive` 命令返回
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ArchiveReport {
    /// 生成的 ZIP 文件的完整路径
    pub archive_path: String,
    /// 归档文件大小（字节）
    pub size_bytes: u64,
    /// 处理过的条目数量（含跳过的虚拟文件夹）
    pub entry_count: usize,
    /// 实际写入的成员数量
    pub member_count: usize,
    /// 归档文件内容的 SHA256（十六进制）
    pub sha256: String,
    /// 用户选择的归档类型标签（rar / 7z 仍写出 ZIP）
    pub kind: String,
}
