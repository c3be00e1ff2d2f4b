// ============================================================================
// 条目列表管理：添加 / 新建 / 删除 / 重命名 / 替换
// ✅ 只能做：列表簿记与必要的文件系统操作（读取元数据、新建文件、重命名）
// ⛔ 禁止：处理撤销历史（由 session 负责）
// ============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::dtos::EntryView;
use crate::models::entry::{Entry, EntrySource};
use crate::services::naming::{file_name_of, join_display, to_member_path, validate_name};
use crate::utils::error::{AppError, AppResult};

/// 删除时的条目类型过滤
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveFilter {
    /// 任意条目
    Any,
    /// 只允许删除文件
    FilesOnly,
    /// 只允许删除文件夹（目录或虚拟文件夹）
    FoldersOnly,
}

impl RemoveFilter {
    fn accepts(&self, entry: &Entry) -> bool {
        match self {
            RemoveFilter::Any => true,
            RemoveFilter::FilesOnly => !entry.is_folder(),
            RemoveFilter::FoldersOnly => entry.is_folder(),
        }
    }
}

/// 有序条目列表，插入顺序即归档成员顺序
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct EntryList {
    entries: Vec<Entry>,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 可作为父文件夹的显示名称（目录与虚拟文件夹）
    pub fn folder_choices(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_folder())
            .map(|e| e.display_name.clone())
            .collect()
    }

    /// 添加单个文件
    pub fn add_file(&mut self, path: &Path, parent: Option<&str>) -> AppResult<Entry> {
        let parent = self.resolve_parent(parent)?;
        let metadata = std::fs::metadata(path).map_err(|e| {
            AppError::ValidationError(format!("无法读取文件 {}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(AppError::ValidationError(format!(
                "不是文件：{}",
                path.display()
            )));
        }

        let abs_path = std::fs::canonicalize(path)?;
        let name = entry_name(path, &abs_path)?;
        let entry = Entry::new(
            EntrySource::File(abs_path),
            join_display(parent.as_deref(), &name),
        );

        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// 添加文件夹：先追加文件夹本身，再按相对路径追加其中的每个文件
    ///
    /// 返回追加的条目数量（文件数 + 1）。
    pub fn add_folder(&mut self, path: &Path, parent: Option<&str>) -> AppResult<usize> {
        let parent = self.resolve_parent(parent)?;
        let metadata = std::fs::metadata(path).map_err(|e| {
            AppError::ValidationError(format!("无法读取文件夹 {}: {}", path.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(AppError::ValidationError(format!(
                "不是文件夹：{}",
                path.display()
            )));
        }

        let abs_path = std::fs::canonicalize(path)?;
        let folder_name = entry_name(path, &abs_path)?;
        let folder_display = join_display(parent.as_deref(), &folder_name);
        self.ensure_folder_name_free(&folder_display, None)?;

        // 先收集全部文件，遍历失败时列表保持不变
        let files = expand_directory(&abs_path, &folder_display)?;

        let added = files.len() + 1;
        self.entries
            .push(Entry::new(EntrySource::Directory(abs_path), folder_display));
        self.entries.extend(files);
        Ok(added)
    }

    /// 在 `dir` 下新建文件并写入内容，然后按 `add_file` 追加
    ///
    /// 已存在的同名文件不会被覆盖。
    pub fn create_file(
        &mut self,
        dir: &Path,
        name: &str,
        content: &str,
        parent: Option<&str>,
    ) -> AppResult<Entry> {
        let name = validate_name(name, "文件名")?;
        if content.trim().is_empty() {
            return Err(AppError::ValidationError("文件内容不能为空".to_string()));
        }
        // 写文件之前先校验父文件夹
        self.resolve_parent(parent)?;

        let file_path = dir.join(&name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .map_err(|e| AppError::CreateError(format!("{}: {}", file_path.display(), e)))?;
        file.write_all(content.as_bytes())
            .map_err(|e| AppError::CreateError(format!("{}: {}", file_path.display(), e)))?;

        self.add_file(&file_path, parent)
    }

    /// 新建虚拟文件夹
    pub fn create_folder(&mut self, name: &str, parent: Option<&str>) -> AppResult<Entry> {
        let name = validate_name(name, "文件夹名称")?;
        let parent = self.resolve_parent(parent)?;
        let display_name = join_display(parent.as_deref(), &name);
        self.ensure_folder_name_free(&display_name, None)?;

        let entry = Entry::new(EntrySource::Virtual, display_name);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// 按索引删除条目
    ///
    /// 任一索引越界或类型不符时整批拒绝，列表保持不变。
    /// 返回被删除的条目（按原顺序）。
    pub fn remove(&mut self, indices: &[usize], filter: RemoveFilter) -> AppResult<Vec<Entry>> {
        if indices.is_empty() {
            return Err(AppError::ValidationError("未选择任何条目".to_string()));
        }

        let mut selected = indices.to_vec();
        selected.sort_unstable();
        selected.dedup();

        if let Some(&bad) = selected.iter().find(|&&i| i >= self.entries.len()) {
            return Err(AppError::ValidationError(format!(
                "索引超出范围：{}（共 {} 项）",
                bad,
                self.entries.len()
            )));
        }

        let mismatched: Vec<&str> = selected
            .iter()
            .map(|&i| &self.entries[i])
            .filter(|e| !filter.accepts(e))
            .map(|e| e.display_name.as_str())
            .collect();
        if !mismatched.is_empty() {
            let expected = match filter {
                RemoveFilter::FilesOnly => "文件",
                _ => "文件夹",
            };
            return Err(AppError::ValidationError(format!(
                "以下条目不是{}：{}",
                expected,
                mismatched.join(", ")
            )));
        }

        let mut removed: Vec<Entry> = selected
            .iter()
            .rev()
            .map(|&i| self.entries.remove(i))
            .collect();
        removed.reverse();
        Ok(removed)
    }

    /// 重命名条目
    ///
    /// 真实文件 / 目录先在其所在目录执行文件系统重命名，成功后才更新条目；
    /// 虚拟文件夹只更新显示名称。显示名称的父文件夹前缀保持不变，
    /// 嵌套在被重命名文件夹下的条目同步更新。
    pub fn rename(&mut self, old_display_name: &str, new_name: &str) -> AppResult<Entry> {
        let new_name = validate_name(new_name, "新名称")?;
        let index = self
            .entries
            .iter()
            .position(|e| e.display_name == old_display_name)
            .ok_or_else(|| AppError::NotFound(format!("条目 '{}'", old_display_name)))?;

        let old_entry = self.entries[index].clone();
        let new_display = join_display(old_entry.display_prefix(), &new_name);
        if new_display == old_entry.display_name {
            return Err(AppError::ValidationError(
                "新名称与原名称相同".to_string(),
            ));
        }
        if old_entry.is_folder() {
            self.ensure_folder_name_free(&new_display, Some(index))?;
        }

        let new_source = match &old_entry.source {
            EntrySource::File(old_path) | EntrySource::Directory(old_path) => {
                let new_path = renamed_path(old_path, &new_name)?;
                if new_path.exists() {
                    return Err(AppError::RenameError(format!(
                        "目标已存在：{}",
                        new_path.display()
                    )));
                }
                std::fs::rename(old_path, &new_path).map_err(|e| {
                    AppError::RenameError(format!(
                        "{} → {}: {}",
                        old_path.display(),
                        new_path.display(),
                        e
                    ))
                })?;
                match old_entry.source {
                    EntrySource::Directory(_) => EntrySource::Directory(new_path),
                    _ => EntrySource::File(new_path),
                }
            }
            EntrySource::Virtual => EntrySource::Virtual,
        };

        if old_entry.is_folder() {
            self.rewrite_nested(index, &old_entry, &new_display, new_source.path());
        }

        let entry = &mut self.entries[index];
        entry.source = new_source;
        entry.display_name = new_display;
        Ok(entry.clone())
    }

    /// 用新选择的路径替换指定位置的条目，位置与显示名称前缀保持不变
    ///
    /// 换成目录时，与 `add_folder` 一样在其后展开目录中的文件。
    pub fn replace(&mut self, index: usize, new_path: &Path) -> AppResult<Entry> {
        let current = self.entries.get(index).ok_or_else(|| {
            AppError::ValidationError(format!(
                "索引超出范围：{}（共 {} 项）",
                index,
                self.entries.len()
            ))
        })?;
        if current.source == EntrySource::Virtual {
            return Err(AppError::ValidationError(format!(
                "虚拟文件夹 '{}' 不能替换",
                current.display_name
            )));
        }

        let metadata = std::fs::metadata(new_path).map_err(|e| {
            AppError::ValidationError(format!("无法读取 {}: {}", new_path.display(), e))
        })?;
        let abs_path = std::fs::canonicalize(new_path)?;
        let name = entry_name(new_path, &abs_path)?;
        let display_name = join_display(current.display_prefix(), &name);
        let source = EntrySource::from_metadata(abs_path, &metadata);
        let files = match &source {
            EntrySource::Directory(dir) => {
                self.ensure_folder_name_free(&display_name, Some(index))?;
                expand_directory(dir, &display_name)?
            }
            _ => Vec::new(),
        };

        let entry = Entry::new(source, display_name);
        self.entries[index] = entry.clone();
        let tail = self.entries.split_off(index + 1);
        self.entries.extend(files);
        self.entries.extend(tail);
        Ok(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 仍然存在的文件条目的字节总数
    pub fn total_file_bytes(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| match &e.source {
                EntrySource::File(p) => std::fs::metadata(p).ok(),
                _ => None,
            })
            .filter(|m| m.is_file())
            .map(|m| m.len())
            .sum()
    }

    /// 展示用视图
    pub fn views(&self) -> Vec<EntryView> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, e)| EntryView {
                index,
                kind: e.source.kind_label().to_string(),
                display_name: e.display_name.clone(),
                source: e.source.path().map(|p| p.display().to_string()),
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // 内部辅助
    // ------------------------------------------------------------------------

    /// 校验父文件夹必须是已有的文件夹显示名称
    fn resolve_parent(&self, parent: Option<&str>) -> AppResult<Option<String>> {
        let parent = match parent.map(|p| p.trim().trim_end_matches('/')) {
            None | Some("") => return Ok(None),
            Some(p) => p,
        };
        if self
            .entries
            .iter()
            .any(|e| e.is_folder() && e.display_name == parent)
        {
            Ok(Some(parent.to_string()))
        } else {
            Err(AppError::ValidationError(format!(
                "无效的父文件夹：{}",
                parent
            )))
        }
    }

    fn ensure_folder_name_free(&self, display_name: &str, except: Option<usize>) -> AppResult<()> {
        let taken = self
            .entries
            .iter()
            .enumerate()
            .any(|(i, e)| Some(i) != except && e.is_folder() && e.display_name == display_name);
        if taken {
            return Err(AppError::ValidationError(format!(
                "文件夹已存在：{}",
                display_name
            )));
        }
        Ok(())
    }

    /// 文件夹改名后，同步更新嵌套条目的显示名称前缀与来源路径
    fn rewrite_nested(
        &mut self,
        skip: usize,
        old_entry: &Entry,
        new_display: &str,
        new_dir: Option<&Path>,
    ) {
        let old_prefix = format!("{}/", old_entry.display_name);
        let old_dir = old_entry.source.path().map(Path::to_path_buf);

        for (i, entry) in self.entries.iter_mut().enumerate() {
            if i == skip {
                continue;
            }
            if let Some(rest) = entry.display_name.strip_prefix(&old_prefix) {
                entry.display_name = format!("{}/{}", new_display, rest);
            }
            if let (Some(old_dir), Some(new_dir)) = (&old_dir, new_dir) {
                let moved = match &entry.source {
                    EntrySource::File(p) | EntrySource::Directory(p) => p
                        .strip_prefix(old_dir)
                        .ok()
                        .map(|rest| new_dir.join(rest)),
                    EntrySource::Virtual => None,
                };
                if let Some(moved) = moved {
                    entry.source = match entry.source {
                        EntrySource::Directory(_) => EntrySource::Directory(moved),
                        _ => EntrySource::File(moved),
                    };
                }
            }
        }
    }
}

/// 条目名称取用户给出的路径（符号链接保留链接名），`.` 之类没有名称的路径退回规范化路径
fn entry_name(given: &Path, canonical: &Path) -> AppResult<String> {
    file_name_of(given).or_else(|_| file_name_of(canonical))
}

/// 目录中的每个文件展开为一个文件条目，显示名称为 `folder_display/相对路径`
fn expand_directory(dir: &Path, folder_display: &str) -> AppResult<Vec<Entry>> {
    let mut files = Vec::new();
    for item in walkdir::WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let item =
            item.map_err(|e| AppError::ValidationError(format!("遍历文件夹失败: {}", e)))?;
        if !item.file_type().is_file() {
            continue;
        }
        let relative = item
            .path()
            .strip_prefix(dir)
            .map_err(|e| AppError::ValidationError(format!("路径处理失败: {}", e)))?;
        files.push(Entry::new(
            EntrySource::File(item.path().to_path_buf()),
            format!("{}/{}", folder_display, to_member_path(relative)),
        ));
    }
    Ok(files)
}

/// 同一父目录下的新路径
fn renamed_path(old_path: &Path, new_name: &str) -> AppResult<PathBuf> {
    let parent = old_path.parent().ok_or_else(|| {
        AppError::RenameError(format!("无法获取所在目录：{}", old_path.display()))
    })?;
    Ok(parent.join(new_name))
}

// ============================================================================
// 单元测试
// ============================================================================
