// ============================================================================
// 归档条目模型
// 条目 = (来源, 显示名称)；来源用带标签的枚举区分文件 / 目录 / 虚拟文件夹
// ============================================================================

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// 条目来源
///
/// `Virtual` 只存在于归档命名空间中，永远不会去文件系统解析。
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum EntrySource {
    /// 磁盘上的普通文件（绝对路径）
    File(PathBuf),
    /// 磁盘上的目录（绝对路径），打包时递归写入其中所有文件
    Directory(PathBuf),
    /// 虚拟文件夹，仅作为显示名称前缀
    Virtual,
}

impl EntrySource {
    /// 来源在磁盘上的路径，虚拟文件夹返回 None
    pub fn path(&self) -> Option<&Path> {
        match self {
            EntrySource::File(p) | EntrySource::Directory(p) => Some(p),
            EntrySource::Virtual => None,
        }
    }

    /// 是否可以作为父文件夹（目录或虚拟文件夹）
    pub fn is_folder(&self) -> bool {
        matches!(self, EntrySource::Directory(_) | EntrySource::Virtual)
    }

    /// 根据磁盘元数据判断来源类型
    pub fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        if metadata.is_dir() {
            EntrySource::Directory(path)
        } else {
            EntrySource::File(path)
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            EntrySource::File(_) => "file",
            EntrySource::Directory(_) => "folder",
            EntrySource::Virtual => "virtual",
        }
    }
}

/// 单个归档条目
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// 条目来源
    pub source: EntrySource,
    /// 归档内的路径，以 `/` 分隔，永不为空
    pub display_name: String,
}

impl Entry {
    pub fn new(source: EntrySource, display_name: impl Into<String>) -> Self {
        Self {
            source,
            display_name: display_name.into(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.source.is_folder()
    }

    /// 显示名称中最后一个 `/` 之前的部分（所属父文件夹），没有则为 None
    pub fn display_prefix(&self) -> Option<&str> {
        self.display_name
            .rsplit_once('/')
            .map(|(prefix, _)| prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_source_serializes_with_kind_tag() {
        let entry = Entry::new(EntrySource::File(PathBuf::from("/tmp/a.txt")), "a.txt");
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""kind":"file""#));
        assert!(json.contains(r#""path":"/tmp/a.txt""#));

        let virtual_json = serde_json::to_string(&EntrySource::Virtual).unwrap();
        assert_eq!(virtual_json, r#"{"kind":"virtual"}"#);
    }

    #[test]
    fn test_entry_json_restores_same_value() {
        let entry = Entry::new(EntrySource::Directory(PathBuf::from("/srv/photos")), "docs/photos");
        let json = serde_json::to_string(&entry).unwrap();
        let restored: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn test_display_prefix() {
        let nested = Entry::new(EntrySource::Virtual, "docs/drafts");
        assert_eq!(nested.display_prefix(), Some("docs"));

        let top = Entry::new(EntrySource::Virtual, "docs");
        assert_eq!(top.display_prefix(), None);
    }

    #[test]
    fn test_is_folder_by_kind() {
        assert!(EntrySource::Virtual.is_folder());
        assert!(EntrySource::Directory(PathBuf::from("/x")).is_folder());
        assert!(!EntrySource::File(PathBuf::from("/x")).is_folder());
        assert_eq!(EntrySource::Virtual.path(), None);
    }
}
