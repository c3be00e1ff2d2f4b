// ============================================================================
// 条目相关 Commands
// 负责：列表查看、统计、添加 / 新建 / 删除 / 重命名 / 替换、撤销 / 重做、清空
// ============================================================================

use std::path::Path;

use crate::commands::{format_bytes, AppContext, Outcome};
use crate::services::entry_list::RemoveFilter;
use crate::utils::error::{AppError, AppResult};
use crate::utils::prompt::Prompter;

/// 列出当前条目
pub fn list(ctx: &AppContext) -> Outcome {
    let views = ctx.session.entries().views();
    if views.is_empty() {
        return Outcome::unchanged("归档列表为空");
    }

    let lines: Vec<String> = views
        .iter()
        .map(|v| match &v.source {
            Some(source) => format!("[{}] {:<7} {}  ← {}", v.index, v.kind, v.display_name, source),
            None => format!("[{}] {:<7} {}", v.index, v.kind, v.display_name),
        })
        .collect();
    Outcome::unchanged(lines.join("\n"))
}

/// 统计信息：条目数、文件总大小、可撤销 / 重做步数
pub fn stats(ctx: &AppContext) -> Outcome {
    let stats = ctx.session.stats();
    Outcome::unchanged(format!(
        "条目：{} 项\n文件总大小：{}\n可撤销：{} 步，可重做：{} 步",
        stats.item_count,
        format_bytes(stats.total_bytes),
        stats.undo_depth,
        stats.redo_depth
    ))
}

pub fn add_file(ctx: &mut AppContext, path: &Path, parent: Option<&str>) -> AppResult<Outcome> {
    let entry = ctx.session.add_file(path, parent)?;
    Ok(Outcome::changed(format!("已添加文件 '{}'", entry.display_name)))
}

pub fn add_folder(ctx: &mut AppContext, path: &Path, parent: Option<&str>) -> AppResult<Outcome> {
    let added = ctx.session.add_folder(path, parent)?;
    Ok(Outcome::changed(format!(
        "已添加文件夹 {}（共 {} 个条目）",
        path.display(),
        added
    )))
}

/// 新建文件；未通过参数给出内容时向用户索取
pub fn create_file(
    ctx: &mut AppContext,
    prompter: &dyn Prompter,
    name: &str,
    content: Option<&str>,
    parent: Option<&str>,
) -> AppResult<Outcome> {
    let content = match content {
        Some(text) => text.to_string(),
        None => prompter.input("文件内容").unwrap_or_default(),
    };
    let entry = ctx.session.create_file(name, &content, parent)?;
    Ok(Outcome::changed(format!("已创建文件 '{}'", entry.display_name)))
}

pub fn create_folder(ctx: &mut AppContext, name: &str, parent: Option<&str>) -> AppResult<Outcome> {
    let entry = ctx.session.create_folder(name, parent)?;
    Ok(Outcome::changed(format!("已创建文件夹 '{}'", entry.display_name)))
}

pub fn remove(ctx: &mut AppContext, indices: &[usize], filter: RemoveFilter) -> AppResult<Outcome> {
    let removed = ctx.session.remove(indices, filter)?;
    let names: Vec<&str> = removed.iter().map(|e| e.display_name.as_str()).collect();
    Ok(Outcome::changed(format!("已删除：{}", names.join(", "))))
}

pub fn rename(ctx: &mut AppContext, old_name: &str, new_name: &str) -> AppResult<Outcome> {
    let entry = ctx.session.rename(old_name, new_name)?;
    Ok(Outcome::changed(format!(
        "已将 '{}' 重命名为 '{}'",
        old_name, entry.display_name
    )))
}

pub fn replace(ctx: &mut AppContext, index: usize, new_path: &Path) -> AppResult<Outcome> {
    let entry = ctx.session.replace(index, new_path)?;
    Ok(Outcome::changed(format!(
        "第 {} 项已替换为 '{}'",
        index, entry.display_name
    )))
}

pub fn undo(ctx: &mut AppContext) -> AppResult<Outcome> {
    ctx.session.undo()?;
    Ok(Outcome::changed(format!(
        "已撤销，当前 {} 项",
        ctx.session.entries().len()
    )))
}

pub fn redo(ctx: &mut AppContext) -> AppResult<Outcome> {
    ctx.session.redo()?;
    Ok(Outcome::changed(format!(
        "已重做，当前 {} 项",
        ctx.session.entries().len()
    )))
}

/// 新建归档：确认后清空列表与历史
pub fn clear(ctx: &mut AppContext, prompter: &dyn Prompter) -> AppResult<Outcome> {
    if ctx.session.entries().is_empty() {
        return Ok(Outcome::unchanged("归档列表为空"));
    }
    if !prompter.confirm("这将清空所有内容，是否继续？") {
        return Err(AppError::Cancelled);
    }
    ctx.session.clear();
    Ok(Outcome::changed("已清空归档列表"))
}
