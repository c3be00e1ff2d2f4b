// ============================================================================
// 设置 Commands
// 负责：查看设置、校验并保存单个设置项
// ============================================================================

use std::path::Path;

use crate::commands::{AppContext, Outcome};
use crate::database::SETTING_KEYS;
use crate::services::packer::{ArchiveKind, Compression};
use crate::utils::error::{AppError, AppResult};

/// 查看当前设置
pub fn show(ctx: &AppContext) -> AppResult<Outcome> {
    let settings = ctx.db.get_settings()?;
    Ok(Outcome::unchanged(format!(
        "default_output_dir = {}\narchive_kind = {}\ncompression = {}\nmax_history = {}\ndb_path = {}",
        settings.default_output_dir.as_deref().unwrap_or("(工作目录)"),
        settings.archive_kind,
        settings.compression,
        settings.max_history,
        settings.db_path
    )))
}

/// 校验并保存设置项，返回规范化后的值
pub fn set(ctx: &mut AppContext, key: &str, value: &str) -> AppResult<Outcome> {
    let normalized = normalize_setting(key, value)?;
    ctx.db.save_setting(key, &normalized)?;

    // 撤销深度立即作用于当前会话
    if key == "max_history" {
        let depth = normalized
            .parse::<usize>()
            .map_err(|_| AppError::ValidationError(format!("max_history 无效：{}", value)))?;
        ctx.session.set_history_limit(depth);
        return Ok(Outcome::changed(format!("{} = {}", key, normalized)));
    }

    Ok(Outcome::unchanged(format!("{} = {}", key, normalized)))
}

/// 按键校验设置值
pub fn normalize_setting(key: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    match key {
        "default_output_dir" => {
            let dir = Path::new(value);
            if !dir.is_dir() {
                return Err(AppError::ValidationError(format!(
                    "输出目录不存在：{}",
                    value
                )));
            }
            let canonical = std::fs::canonicalize(dir)?;
            Ok(canonical.to_string_lossy().to_string())
        }
        "archive_kind" => Ok(value.parse::<ArchiveKind>()?.label().to_string()),
        "compression" => Ok(value.parse::<Compression>()?.label().to_string()),
        "max_history" => match value.parse::<usize>() {
            Ok(depth) if depth >= 1 => Ok(depth.to_string()),
            _ => Err(AppError::ValidationError(format!(
                "max_history 必须是正整数：{}",
                value
            ))),
        },
        _ => Err(AppError::ValidationError(format!(
            "未知的设置项：{}（可用：{}）",
            key,
            SETTING_KEYS.join(", ")
        ))),
    }
}
