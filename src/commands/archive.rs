// ============================================================================
// 打包相关 Commands
// 负责：确定输出路径、确认覆盖、调用打包服务、记录归档历史
// ============================================================================

use std::path::{Path, PathBuf};

use crate::commands::{format_bytes, AppContext, Outcome};
use crate::services::packer::{self, ArchiveKind, Compression, ProgressSink};
use crate::utils::error::{AppError, AppResult};
use crate::utils::prompt::Prompter;

/// 创建归档
///
/// 未指定类型 / 压缩方式时使用设置中的值；目标已存在时先确认覆盖。
pub fn create_archive(
    ctx: &mut AppContext,
    prompter: &dyn Prompter,
    destination: Option<&Path>,
    kind: Option<ArchiveKind>,
    compression: Option<Compression>,
    progress: &mut dyn ProgressSink,
) -> AppResult<Outcome> {
    // 空列表在询问任何问题之前就拒绝
    packer::validate_entries(ctx.session.entries().entries())?;

    let settings = ctx.db.get_settings()?;
    let mut options = settings.archive_options()?;
    if let Some(kind) = kind {
        options.kind = kind;
    }
    if let Some(compression) = compression {
        options.compression = compression;
    }

    let output_dir = settings.default_output_dir.as_deref().map(Path::new);
    let archive_path = resolve_destination(destination, output_dir, ctx.session.work_dir())?;

    if archive_path.exists()
        && !prompter.confirm(&format!("{} 已存在，是否覆盖？", archive_path.display()))
    {
        return Err(AppError::Cancelled);
    }

    let report = ctx.session.create_archive(&archive_path, options, progress)?;
    ctx.db.create_archive_record(&report)?;

    Ok(Outcome::unchanged(format!(
        "归档已创建：{}（{}，{} 个成员）\nSHA256: {}",
        report.archive_path,
        format_bytes(report.size_bytes),
        report.member_count,
        report.sha256
    )))
}

/// 最近的归档记录
pub fn history(ctx: &AppContext, limit: usize) -> AppResult<Outcome> {
    let records = ctx.db.list_archive_records(limit)?;
    if records.is_empty() {
        return Ok(Outcome::unchanged("暂无归档记录"));
    }

    let lines: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "{}  {}  {} 项  {}  [{}]",
                r.created_at,
                r.archive_path,
                r.entry_count,
                format_bytes(r.size_bytes.max(0) as u64),
                r.kind
            )
        })
        .collect();
    Ok(Outcome::unchanged(lines.join("\n")))
}

/// 确定归档输出路径
///
/// - 只给出文件名时放到默认输出目录（未设置则为工作目录）
/// - 给出相对路径时相对于工作目录
/// - 未给出时生成带时间戳的文件名
pub fn resolve_destination(
    destination: Option<&Path>,
    output_dir: Option<&Path>,
    work_dir: &Path,
) -> AppResult<PathBuf> {
    let base = output_dir.unwrap_or(work_dir);

    let path = match destination {
        Some(dest) => {
            let dest = packer::with_default_extension(dest);
            let bare_name = dest
                .parent()
                .map_or(true, |p| p.as_os_str().is_empty());
            if dest.is_absolute() {
                dest
            } else if bare_name {
                base.join(dest)
            } else {
                work_dir.join(dest)
            }
        }
        None => base.join(timestamped_archive_name()?),
    };

    Ok(path)
}

/// 形如 `archive_20240131_235959.zip` 的文件名（本地时间，取不到时区时用 UTC）
fn timestamped_archive_name() -> AppResult<String> {
    let now = time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let format = time::format_description::parse("[year][month][day]_[hour][minute][second]")
        .map_err(|e| AppError::ValidationError(format!("时间格式无效：{}", e)))?;
    let stamp = now
        .format(&format)
        .map_err(|e| AppError::ValidationError(format!("时间格式化失败：{}", e)))?;
    Ok(format!("archive_{}.zip", stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ScriptedPrompter;
    use crate::services::packer::NoProgress;
    use std::fs;
    use tempfile::TempDir;

    fn context_with_file(data: &TempDir, work: &TempDir) -> AppContext {
        let mut ctx = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();
        let file = work.path().join("a.txt");
        fs::write(&file, "content").unwrap();
        ctx.session.add_file(&file, None).unwrap();
        ctx
    }

    #[test]
    fn test_resolve_destination_rules() {
        let work = Path::new("/work");
        let out = Path::new("/out");

        assert_eq!(
            resolve_destination(Some(Path::new("bundle")), None, work).unwrap(),
            PathBuf::from("/work/bundle.zip")
        );
        assert_eq!(
            resolve_destination(Some(Path::new("bundle.zip")), Some(out), work).unwrap(),
            PathBuf::from("/out/bundle.zip")
        );
        assert_eq!(
            resolve_destination(Some(Path::new("sub/bundle.zip")), Some(out), work).unwrap(),
            PathBuf::from("/work/sub/bundle.zip")
        );
        assert_eq!(
            resolve_destination(Some(Path::new("/abs/x.zip")), Some(out), work).unwrap(),
            PathBuf::from("/abs/x.zip")
        );
    }

    #[test]
    fn test_resolve_destination_generates_name() {
        let path = resolve_destination(None, None, Path::new("/work")).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(path.starts_with("/work"));
        assert!(name.starts_with("archive_"));
        assert!(name.ends_with(".zip"));
        assert_eq!(name.len(), "archive_20240131_235959.zip".len());
    }

    #[test]
    fn test_create_archive_records_history() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = context_with_file(&data, &work);

        let out = create_archive(
            &mut ctx,
            &ScriptedPrompter::default(),
            Some(Path::new("bundle.zip")),
            None,
            None,
            &mut NoProgress,
        )
        .unwrap();

        assert!(out.message.contains("bundle.zip"));
        assert!(!out.changed);
        assert!(work.path().join("bundle.zip").exists());

        let records = ctx.db.list_archive_records(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entry_count, 1);
        assert!(history(&ctx, 10).unwrap().message.contains("bundle.zip"));
    }

    #[test]
    fn test_create_archive_asks_before_overwrite() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = context_with_file(&data, &work);
        let target = work.path().join("bundle.zip");
        fs::write(&target, "old").unwrap();

        let err = create_archive(
            &mut ctx,
            &ScriptedPrompter::confirming(false),
            Some(&target),
            None,
            None,
            &mut NoProgress,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");

        create_archive(
            &mut ctx,
            &ScriptedPrompter::confirming(true),
            Some(&target),
            None,
            None,
            &mut NoProgress,
        )
        .unwrap();
        assert_ne!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_create_archive_empty_list() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();

        let err = create_archive(
            &mut ctx,
            &ScriptedPrompter::default(),
            Some(Path::new("empty.zip")),
            None,
            None,
            &mut NoProgress,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(!work.path().join("empty.zip").exists());
        assert!(history(&ctx, 10).unwrap().message.contains("暂无归档记录"));
    }

    #[test]
    fn test_create_archive_uses_kind_setting() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = context_with_file(&data, &work);
        ctx.db.save_setting("archive_kind", "rar").unwrap();

        create_archive(
            &mut ctx,
            &ScriptedPrompter::default(),
            Some(Path::new("bundle.zip")),
            None,
            Some(Compression::Stored),
            &mut NoProgress,
        )
        .unwrap();

        let records = ctx.db.list_archive_records(1).unwrap();
        assert_eq!(records[0].kind, "rar");
    }
}
