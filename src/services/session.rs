// ============================================================================
// 归档会话：条目列表 + 撤销 / 重做历史
// 每次成功的修改都先保存修改前的整表快照；修改失败时列表与历史都不变
// ============================================================================

use std::path::{Path, PathBuf};

use crate::models::dtos::{ArchiveReport, SessionStats};
use crate::models::entry::Entry;
use crate::services::entry_list::{EntryList, RemoveFilter};
use crate::services::history::History;
use crate::services::packer::{self, ArchiveOptions, ProgressSink};
use crate::utils::error::AppResult;

/// 一个归档会话，由前端显式持有
#[derive(Debug, Clone)]
pub struct ArchiveSession {
    entries: EntryList,
    history: History<EntryList>,
    /// 新建文件写入的目录
    work_dir: PathBuf,
}

impl ArchiveSession {
    pub fn new(work_dir: PathBuf) -> Self {
        Self::restore(EntryList::new(), History::default(), work_dir)
    }

    /// 从持久化状态恢复会话
    pub fn restore(entries: EntryList, history: History<EntryList>, work_dir: PathBuf) -> Self {
        Self {
            entries,
            history,
            work_dir,
        }
    }

    pub fn entries(&self) -> &EntryList {
        &self.entries
    }

    pub fn history(&self) -> &History<EntryList> {
        &self.history
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn set_history_limit(&mut self, max_depth: usize) {
        self.history.set_limit(max_depth);
    }

    // ------------------------------------------------------------------------
    // 修改操作
    // ------------------------------------------------------------------------

    pub fn add_file(&mut self, path: &Path, parent: Option<&str>) -> AppResult<Entry> {
        let entry = self.mutate(|list| list.add_file(path, parent))?;
        log::info!("添加文件 {}", entry.display_name);
        Ok(entry)
    }

    pub fn add_folder(&mut self, path: &Path, parent: Option<&str>) -> AppResult<usize> {
        let added = self.mutate(|list| list.add_folder(path, parent))?;
        log::info!("添加文件夹 {}（{} 个条目）", path.display(), added);
        Ok(added)
    }

    pub fn create_file(
        &mut self,
        name: &str,
        content: &str,
        parent: Option<&str>,
    ) -> AppResult<Entry> {
        let work_dir = self.work_dir.clone();
        let entry = self.mutate(|list| list.create_file(&work_dir, name, content, parent))?;
        log::info!("新建文件 {}", entry.display_name);
        Ok(entry)
    }

    pub fn create_folder(&mut self, name: &str, parent: Option<&str>) -> AppResult<Entry> {
        let entry = self.mutate(|list| list.create_folder(name, parent))?;
        log::info!("新建虚拟文件夹 {}", entry.display_name);
        Ok(entry)
    }

    pub fn remove(&mut self, indices: &[usize], filter: RemoveFilter) -> AppResult<Vec<Entry>> {
        let removed = self.mutate(|list| list.remove(indices, filter))?;
        log::info!("删除 {} 个条目", removed.len());
        Ok(removed)
    }

    pub fn rename(&mut self, old_display_name: &str, new_name: &str) -> AppResult<Entry> {
        let entry = self.mutate(|list| list.rename(old_display_name, new_name))?;
        log::info!("重命名 {} → {}", old_display_name, entry.display_name);
        Ok(entry)
    }

    pub fn replace(&mut self, index: usize, new_path: &Path) -> AppResult<Entry> {
        let entry = self.mutate(|list| list.replace(index, new_path))?;
        log::info!("替换第 {} 项为 {}", index, entry.display_name);
        Ok(entry)
    }

    /// 撤销：恢复上一份快照
    pub fn undo(&mut self) -> AppResult<()> {
        let previous = self.history.undo(self.entries.clone())?;
        self.entries = previous;
        log::info!("撤销，当前 {} 项", self.entries.len());
        Ok(())
    }

    /// 重做：恢复下一份快照
    pub fn redo(&mut self) -> AppResult<()> {
        let next = self.history.redo(self.entries.clone())?;
        self.entries = next;
        log::info!("重做，当前 {} 项", self.entries.len());
        Ok(())
    }

    /// 清空列表并重置历史（不可撤销）
    pub fn clear(&mut self) {
        self.entries.clear();
        self.history.reset();
        log::info!("清空归档列表");
    }

    // ------------------------------------------------------------------------
    // 查询与打包
    // ------------------------------------------------------------------------

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            item_count: self.entries.len(),
            total_bytes: self.entries.total_file_bytes(),
            undo_depth: self.history.undo_depth(),
            redo_depth: self.history.redo_depth(),
        }
    }

    pub fn create_archive(
        &self,
        destination: &Path,
        options: ArchiveOptions,
        progress: &mut dyn ProgressSink,
    ) -> AppResult<ArchiveReport> {
        packer::create_archive(self.entries.entries(), destination, options, progress)
    }

    /// 在副本上执行修改，成功后再替换当前列表并记录快照
    fn mutate<R>(
        &mut self,
        op: impl FnOnce(&mut EntryList) -> AppResult<R>,
    ) -> AppResult<R> {
        let mut next = self.entries.clone();
        let result = op(&mut next)?;
        let previous = std::mem::replace(&mut self.entries, next);
        self.history.record(previous);
        Ok(result)
    }
}

// ============================================================================
// 单元测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entry::EntrySource;
    use crate::services::packer::NoProgress;
    use proptest::prelude::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    fn session_in(dir: &TempDir) -> ArchiveSession {
        ArchiveSession::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_remove_then_undo_restores_list() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.create_folder("a", None).unwrap();
        session.create_folder("b", None).unwrap();
        session.create_folder("c", Some("a")).unwrap();
        let before = session.entries().clone();

        session.remove(&[0, 2], RemoveFilter::Any).unwrap();
        assert_eq!(session.entries().len(), 1);

        session.undo().unwrap();
        assert_eq!(session.entries(), &before);

        session.redo().unwrap();
        assert_eq!(session.entries().len(), 1);
    }

    #[test]
    fn test_undo_redo_empty_history() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);

        let err = session.undo().unwrap_err();
        assert!(err.to_string().contains("没有可撤销的操作"));
        let err = session.redo().unwrap_err();
        assert!(err.to_string().contains("没有可重做的操作"));

        session.create_folder("docs", None).unwrap();
        let before = session.entries().clone();
        assert!(session.redo().is_err());
        assert_eq!(session.entries(), &before);
    }

    #[test]
    fn test_failed_mutation_keeps_history() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.create_folder("docs", None).unwrap();

        assert!(session.create_folder("docs", None).is_err());
        assert!(session.remove(&[], RemoveFilter::Any).is_err());
        assert_eq!(session.stats().undo_depth, 1);
        assert_eq!(session.entries().len(), 1);
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.create_folder("a", None).unwrap();
        session.create_folder("b", None).unwrap();
        session.undo().unwrap();
        assert_eq!(session.stats().redo_depth, 1);

        session.create_folder("c", None).unwrap();
        assert_eq!(session.stats().redo_depth, 0);
        assert!(session.redo().is_err());
    }

    #[test]
    fn test_clear_resets_history() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        session.create_folder("a", None).unwrap();
        session.clear();

        assert!(session.entries().is_empty());
        assert_eq!(session.stats(), SessionStats::default());
        assert!(session.undo().is_err());
    }

    #[test]
    fn test_create_file_uses_work_dir() {
        let dir = TempDir::new().unwrap();
        let mut session = session_in(&dir);
        let entry = session.create_file("hello.txt", "hi", None).unwrap();

        assert_eq!(entry.display_name, "hello.txt");
        assert_eq!(fs::read_to_string(dir.path().join("hello.txt")).unwrap(), "hi");
        assert_eq!(session.stats().total_bytes, 2);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let dir = TempDir::new().unwrap();
        let report = dir.path().join("report.pdf");
        let notes = dir.path().join("notes.txt");
        fs::write(&report, "%PDF-1.4").unwrap();
        fs::write(&notes, "meeting notes").unwrap();

        let mut session = session_in(&dir);
        let first = session.add_file(&report, None).unwrap();
        assert_eq!(first.display_name, "report.pdf");
        assert_eq!(first.source, EntrySource::File(fs::canonicalize(&report).unwrap()));

        session.create_folder("docs", None).unwrap();
        let nested = session.add_file(&notes, Some("docs")).unwrap();
        assert_eq!(nested.display_name, "docs/notes.txt");

        let zip_path = dir.path().join("bundle.zip");
        let result = session
            .create_archive(&zip_path, ArchiveOptions::default(), &mut NoProgress)
            .unwrap();
        assert_eq!(result.member_count, 2);

        let mut archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
        assert!(names.contains(&"report.pdf".to_string()));
        assert!(names.contains(&"docs/notes.txt".to_string()));

        let mut content = String::new();
        archive
            .by_name("docs/notes.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "meeting notes");
    }

    #[test]
    fn test_add_folder_counts_in_session() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.rs"), "a").unwrap();
        fs::write(src.join("nested").join("b.rs"), "b").unwrap();

        let mut session = session_in(&dir);
        assert_eq!(session.add_folder(&src, None).unwrap(), 3);
        assert_eq!(session.entries().len(), 3);

        session.undo().unwrap();
        assert!(session.entries().is_empty());
    }

    #[test]
    fn test_removed_folder_file_is_not_archived() {
        let dir = TempDir::new().unwrap();
        let photos = dir.path().join("photos");
        fs::create_dir(&photos).unwrap();
        fs::write(photos.join("a.jpg"), "a").unwrap();
        fs::write(photos.join("secret.txt"), "s").unwrap();

        let mut session = session_in(&dir);
        session.add_folder(&photos, None).unwrap();
        let secret = session
            .entries()
            .entries()
            .iter()
            .position(|e| e.display_name == "photos/secret.txt")
            .unwrap();
        session.remove(&[secret], RemoveFilter::Any).unwrap();

        let zip_path = dir.path().join("photos.zip");
        session
            .create_archive(&zip_path, ArchiveOptions::default(), &mut NoProgress)
            .unwrap();

        let archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(|n| n.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["photos/", "photos/a.jpg"]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// 任意次虚拟文件夹创建后逐步撤销，每一步都应回到对应的历史列表
        #[test]
        fn prop_undo_walks_back_through_snapshots(
            names in prop::collection::hash_set("[a-z]{1,8}", 1..10)
        ) {
            let dir = TempDir::new().unwrap();
            let mut session = session_in(&dir);
            let mut snapshots = vec![session.entries().clone()];

            for name in &names {
                session.create_folder(name, None).unwrap();
                snapshots.push(session.entries().clone());
            }

            snapshots.pop();
            while let Some(expected) = snapshots.pop() {
                session.undo().unwrap();
                prop_assert_eq!(session.entries(), &expected);
            }
            prop_assert!(session.undo().is_err());
        }
    }
}
