// ============================================================================
// 命令调度：单次命令与交互式 shell
// 负责：把解析后的命令交给 commands 层，会话有改动时持久化
// ============================================================================

use std::io::{IsTerminal, Write};

use anyhow::Context;
use clap::Parser;

use crate::cli::progress::TerminalProgress;
use crate::cli::{Args, Command, ConfigAction, ShellLine};
use crate::commands::{archive, entries, settings, AppContext, Outcome};
use crate::services::entry_list::RemoveFilter;
use crate::services::packer::ProgressSink;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::default_data_dir;
use crate::utils::prompt::{AssumeYes, Prompter, TerminalPrompter};

/// `main` 的入口
pub fn run(args: Args) -> anyhow::Result<()> {
    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    let work_dir = std::env::current_dir().context("无法获取当前工作目录")?;
    let mut ctx = AppContext::open(&data_dir, work_dir)
        .with_context(|| format!("无法打开数据目录 {}", data_dir.display()))?;
    log::debug!("数据目录 {}", data_dir.display());

    let mut progress = TerminalProgress::new(std::io::stderr().is_terminal());
    let prompter = TerminalPrompter::default();

    match args.command {
        Command::Shell => {
            let mut stdout = std::io::stdout();
            let mut next_line = || -> std::io::Result<Option<String>> {
                let mut line = String::new();
                match std::io::stdin().read_line(&mut line)? {
                    0 => Ok(None),
                    _ => Ok(Some(line)),
                }
            };
            run_shell(
                &mut ctx,
                &mut next_line,
                &mut stdout,
                &prompter,
                &mut progress,
            )?;
        }
        command => match execute(&mut ctx, command, &prompter, &mut progress) {
            Ok(outcome) => println!("{}", outcome.message),
            Err(AppError::Cancelled) => println!("已取消"),
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

/// 执行单条命令，会话有改动时立即持久化
pub fn execute(
    ctx: &mut AppContext,
    command: Command,
    prompter: &dyn Prompter,
    progress: &mut dyn ProgressSink,
) -> AppResult<Outcome> {
    let outcome = match command {
        Command::List => entries::list(ctx),
        Command::Stats => entries::stats(ctx),
        Command::AddFile { path, parent } => entries::add_file(ctx, &path, parent.as_deref())?,
        Command::AddFolder { path, parent } => {
            entries::add_folder(ctx, &path, parent.as_deref())?
        }
        Command::CreateFile {
            name,
            content,
            parent,
        } => entries::create_file(
            ctx,
            prompter,
            &name,
            content.as_deref(),
            parent.as_deref(),
        )?,
        Command::CreateFolder { name, parent } => {
            entries::create_folder(ctx, &name, parent.as_deref())?
        }
        Command::Remove {
            indices,
            files_only,
            folders_only,
        } => {
            let filter = match (files_only, folders_only) {
                (true, _) => RemoveFilter::FilesOnly,
                (_, true) => RemoveFilter::FoldersOnly,
                _ => RemoveFilter::Any,
            };
            entries::remove(ctx, &indices, filter)?
        }
        Command::Rename { old_name, new_name } => entries::rename(ctx, &old_name, &new_name)?,
        Command::Replace { index, path } => entries::replace(ctx, index, &path)?,
        Command::Undo => entries::undo(ctx)?,
        Command::Redo => entries::redo(ctx)?,
        Command::Clear { yes } => entries::clear(ctx, choose_prompter(yes, prompter))?,
        Command::Archive {
            destination,
            kind,
            compression,
            yes,
        } => archive::create_archive(
            ctx,
            choose_prompter(yes, prompter),
            destination.as_deref(),
            kind.map(Into::into),
            compression.map(Into::into),
            progress,
        )?,
        Command::History { limit } => archive::history(ctx, limit)?,
        Command::Config { action } => match action {
            ConfigAction::Show => settings::show(ctx)?,
            ConfigAction::Set { key, value } => settings::set(ctx, &key, &value)?,
        },
        Command::Shell => {
            return Err(AppError::ValidationError("已经在 shell 中".to_string()));
        }
    };

    if outcome.changed {
        ctx.persist()?;
    }
    Ok(outcome)
}

fn choose_prompter(yes: bool, prompter: &dyn Prompter) -> &dyn Prompter {
    if yes {
        &AssumeYes
    } else {
        prompter
    }
}

/// 交互式循环：每行一条命令，遇到 `exit` / `quit` 或输入结束时退出
///
/// 单条命令出错只打印错误，循环继续。
pub fn run_shell(
    ctx: &mut AppContext,
    next_line: &mut dyn FnMut() -> std::io::Result<Option<String>>,
    out: &mut dyn Write,
    prompter: &dyn Prompter,
    progress: &mut dyn ProgressSink,
) -> AppResult<()> {
    writeln!(out, "输入 help 查看命令，exit 退出")?;

    loop {
        write!(out, "zip> ")?;
        out.flush()?;

        let Some(line) = next_line()? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(e) => {
                writeln!(out, "错误：{}", e)?;
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                writeln!(out, "{}", e)?;
                continue;
            }
        };

        match execute(ctx, parsed.command, prompter, progress) {
            Ok(outcome) => writeln!(out, "{}", outcome.message)?,
            Err(AppError::Cancelled) => writeln!(out, "已取消")?,
            Err(e) => {
                log::debug!("shell 命令失败：{}", e);
                writeln!(out, "错误：{}", e)?;
            }
        }
    }

    Ok(())
}

/// 把一行输入拆成参数：单引号内原样保留，双引号内支持 `\"` 与 `\\`，
/// 引号外的反斜杠转义下一个字符
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err("单引号未闭合".to_string()),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err("双引号未闭合".to_string()),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err("双引号未闭合".to_string()),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(ch) = chars.next() {
                    current.push(ch);
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::ScriptedPrompter;
    use crate::services::packer::NoProgress;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    fn scripted_lines(lines: &[&str]) -> impl FnMut() -> std::io::Result<Option<String>> {
        let mut queue: VecDeque<String> = lines.iter().map(|l| format!("{}\n", l)).collect();
        move || Ok(queue.pop_front())
    }

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("add-file a.txt").unwrap(), vec!["add-file", "a.txt"]);
        assert_eq!(
            split_words(r#"create-file "my notes.txt" -c 'a "b"'"#).unwrap(),
            vec!["create-file", "my notes.txt", "-c", r#"a "b""#]
        );
        assert_eq!(split_words(r"rename a\ b c").unwrap(), vec!["rename", "a b", "c"]);
        assert_eq!(split_words(r#"x """#).unwrap(), vec!["x", ""]);
        assert!(split_words("rename 'open").is_err());
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn test_execute_persists_changes() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();

        execute(
            &mut ctx,
            Command::CreateFolder {
                name: "docs".to_string(),
                parent: None,
            },
            &ScriptedPrompter::default(),
            &mut NoProgress,
        )
        .unwrap();

        let reopened = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();
        assert_eq!(reopened.session.entries().folder_choices(), vec!["docs"]);
    }

    #[test]
    fn test_execute_clear_with_yes_skips_prompt() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();
        ctx.session.create_folder("docs", None).unwrap();
        let prompter = ScriptedPrompter::default();

        execute(&mut ctx, Command::Clear { yes: true }, &prompter, &mut NoProgress).unwrap();
        assert!(ctx.session.entries().is_empty());
        assert!(prompter.asked.borrow().is_empty());
    }

    #[test]
    fn test_execute_rejects_nested_shell() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();
        let err = execute(
            &mut ctx,
            Command::Shell,
            &ScriptedPrompter::default(),
            &mut NoProgress,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_shell_session_builds_archive() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let report = work.path().join("report.pdf");
        let notes = work.path().join("notes.txt");
        fs::write(&report, "%PDF").unwrap();
        fs::write(&notes, "notes").unwrap();
        let zip_path = work.path().join("out.zip");

        let mut ctx = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();
        let add_report = format!("add-file '{}'", report.display());
        let add_notes = format!("add-file '{}' --parent docs", notes.display());
        let archive_cmd = format!("archive '{}'", zip_path.display());
        let mut next_line = scripted_lines(&[
            &add_report,
            "create-folder docs",
            &add_notes,
            "undo",
            "undo",
            "bogus-command",
            "redo",
            "redo",
            &archive_cmd,
            "exit",
            "list",
        ]);
        let mut out: Vec<u8> = Vec::new();

        run_shell(
            &mut ctx,
            &mut next_line,
            &mut out,
            &ScriptedPrompter::default(),
            &mut NoProgress,
        )
        .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("已添加文件 'report.pdf'"));
        assert!(printed.contains("已添加文件 'docs/notes.txt'"));
        assert!(printed.contains("归档已创建"));
        assert!(!printed.contains("[0] file"), "commands after exit must not run");

        let mut archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"report.pdf".to_string()));
        assert!(names.contains(&"docs/notes.txt".to_string()));
        assert!(archive.by_name("docs/notes.txt").is_ok());
    }

    #[test]
    fn test_shell_reports_errors_and_continues() {
        let data = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let mut ctx = AppContext::open(data.path(), work.path().to_path_buf()).unwrap();
        let mut next_line = scripted_lines(&["undo", "create-folder docs", "stats"]);
        let mut out: Vec<u8> = Vec::new();

        run_shell(
            &mut ctx,
            &mut next_line,
            &mut out,
            &ScriptedPrompter::default(),
            &mut NoProgress,
        )
        .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("错误：没有可撤销的操作"));
        assert!(printed.contains("已创建文件夹 'docs'"));
        assert!(printed.contains("条目：1 项"));
    }
}
