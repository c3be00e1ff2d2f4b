// ============================================================================
// 命名规则：名称校验、显示名称拼接、归档成员路径规范化
// 纯 Rust 函数，方便单元测试
// ============================================================================

use std::path::Path;

use regex::Regex;

use crate::utils::error::{AppError, AppResult};

/// 校验单段名称（文件名 / 文件夹名），返回去除首尾空白后的名称
///
/// 名称不能为空，不能是 `.` / `..`，不能包含路径分隔符、
/// Windows 保留字符或控制字符。
pub fn validate_name(name: &str, what: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{}不能为空", what)));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(AppError::ValidationError(format!(
            "{}无效：{}",
            what, trimmed
        )));
    }

    let re_forbidden = Regex::new(r#"[<>:"|?*/\\\x00-\x1f]"#)
        .map_err(|e| AppError::ValidationError(format!("正则编译失败：{}", e)))?;
    if let Some(found) = re_forbidden.find(trimmed) {
        return Err(AppError::ValidationError(format!(
            "{}包含非法字符 {:?}：{}",
            what,
            found.as_str(),
            trimmed
        )));
    }

    Ok(trimmed.to_string())
}

/// 拼接显示名称：有父文件夹时为 `parent/name`，否则为 `name`
pub fn join_display(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{}/{}", parent, name),
        _ => name.to_string(),
    }
}

/// 取路径最后一段作为名称
pub fn file_name_of(path: &Path) -> AppResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            AppError::ValidationError(format!("无法获取路径名称：{}", path.display()))
        })
}

/// 相对路径转为归档成员路径，统一使用正斜杠
pub fn to_member_path(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}
