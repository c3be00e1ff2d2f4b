// ============================================================================
// 数据库模块：SQLite 持久化层
// 保存会话状态（条目列表 + 撤销/重做栈）、应用设置和归档记录
// 使用 rusqlite 直接操作 SQLite，不引入 ORM
// ============================================================================

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::models::dtos::ArchiveReport;
use crate::services::entry_list::EntryList;
use crate::services::history::{History, DEFAULT_MAX_HISTORY};
use crate::services::packer::{ArchiveKind, ArchiveOptions, Compression};
use crate::services::session::ArchiveSession;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::database_path;

// ============================================================================
// 数据结构定义
// ============================================================================

/// 归档记录
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ArchiveRecord {
    pub id: i64,
    pub archive_path: String,
    pub entry_count: i64,
    pub size_bytes: i64,
    pub sha256: String,
    pub kind: String,
    pub created_at: String,
}

/// 应用设置
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// 归档默认输出目录
    pub default_output_dir: Option<String>,
    /// 归档类型（zip / rar / 7z）
    pub archive_kind: String,
    /// 压缩方式（stored / deflated）
    pub compression: String,
    /// 撤销深度
    pub max_history: usize,
    /// 数据库文件路径（不存储在数据库中）
    pub db_path: String,
}

impl AppSettings {
    /// 转换为打包选项
    pub fn archive_options(&self) -> AppResult<ArchiveOptions> {
        Ok(ArchiveOptions {
            kind: self.archive_kind.parse::<ArchiveKind>()?,
            compression: self.compression.parse::<Compression>()?,
        })
    }
}

/// 支持的设置键
pub const SETTING_KEYS: &[&str] = &[
    "default_output_dir",
    "archive_kind",
    "compression",
    "max_history",
];

// ============================================================================
// 数据库管理器
// ============================================================================

/// 数据库管理器，封装 rusqlite 连接
pub struct Database {
    conn: Connection,
    db_path: PathBuf,
}

impl Database {
    /// 初始化数据库：在指定目录创建数据库文件并建表
    pub fn init(data_dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            AppError::DatabaseError(format!(
                "数据库初始化失败：无法创建数据目录 {}: {}",
                data_dir.display(),
                e
            ))
        })?;

        let db_path = database_path(data_dir);
        let conn = Connection::open(&db_path).map_err(|e| {
            AppError::DatabaseError(format!(
                "数据库初始化失败：无法打开数据库文件 {}: {}",
                db_path.display(),
                e
            ))
        })?;

        Self::create_tables(&conn)?;

        Ok(Database { conn, db_path })
    }

    /// 创建所有数据库表（如果不存在）
    fn create_tables(conn: &Connection) -> AppResult<()> {
        conn.execute_batch(
            "
            -- 会话状态（单行）
            CREATE TABLE IF NOT EXISTS session_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                entries TEXT NOT NULL,
                undo_stack TEXT NOT NULL,
                redo_stack TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- 归档记录表
            CREATE TABLE IF NOT EXISTS archive_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                archive_path TEXT NOT NULL,
                entry_count INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL,
                sha256 TEXT NOT NULL,
                kind TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- 设置表（键值对）
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| {
            AppError::DatabaseError(format!("数据库初始化失败：创建表结构时出错: {}", e))
        })?;

        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // ========================================================================
    // 会话状态
    // ========================================================================

    /// 读取上次保存的会话；没有保存过时返回空会话
    ///
    /// `work_dir` 为新建文件的写入目录，不随会话持久化。
    pub fn load_session(&self, work_dir: &Path) -> AppResult<ArchiveSession> {
        let max_history = self.get_settings()?.max_history;

        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT entries, undo_stack, redo_stack FROM session_state WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let session = match row {
            Some((entries_json, undo_json, redo_json)) => {
                let entries: EntryList = serde_json::from_str(&entries_json)?;
                let undo_stack: Vec<EntryList> = serde_json::from_str(&undo_json)?;
                let redo_stack: Vec<EntryList> = serde_json::from_str(&redo_json)?;
                ArchiveSession::restore(
                    entries,
                    History::from_stacks(undo_stack, redo_stack, max_history),
                    work_dir.to_path_buf(),
                )
            }
            None => {
                let mut session = ArchiveSession::new(work_dir.to_path_buf());
                session.set_history_limit(max_history);
                session
            }
        };

        Ok(session)
    }

    /// 保存会话（upsert 单行）
    pub fn save_session(&self, session: &ArchiveSession) -> AppResult<()> {
        let entries_json = serde_json::to_string(session.entries())?;
        let undo_json = serde_json::to_string(session.history().undo_stack())?;
        let redo_json = serde_json::to_string(session.history().redo_stack())?;

        self.conn.execute(
            "INSERT OR REPLACE INTO session_state (id, entries, undo_stack, redo_stack, updated_at)
             VALUES (1, ?1, ?2, ?3, datetime('now'))",
            params![entries_json, undo_json, redo_json],
        )?;

        Ok(())
    }

    // ========================================================================
    // 归档记录
    // ========================================================================

    /// 记录一次成功的打包
    pub fn create_archive_record(&self, report: &ArchiveReport) -> AppResult<ArchiveRecord> {
        self.conn.execute(
            "INSERT INTO archive_records (archive_path, entry_count, size_bytes, sha256, kind) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                report.archive_path,
                report.entry_count as i64,
                report.size_bytes as i64,
                report.sha256,
                report.kind
            ],
        )?;

        let id = self.conn.last_insert_rowid();

        // 查询刚插入的记录以获取 created_at 默认值
        let record = self.conn.query_row(
            "SELECT id, archive_path, entry_count, size_bytes, sha256, kind, created_at FROM archive_records WHERE id = ?1",
            params![id],
            row_to_record,
        )?;
        Ok(record)
    }

    /// 最近的归档记录，最新的在前
    pub fn list_archive_records(&self, limit: usize) -> AppResult<Vec<ArchiveRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, archive_path, entry_count, size_bytes, sha256, kind, created_at FROM archive_records ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;

        let records = stmt.query_map(params![limit as i64], row_to_record)?;
        records
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::from)
    }

    // ========================================================================
    // 设置方法（键值对操作）
    // ========================================================================

    /// 获取应用设置，缺失的键使用默认值
    pub fn get_settings(&self) -> AppResult<AppSettings> {
        let default_output_dir = self.get_setting("default_output_dir")?;
        let archive_kind = self
            .get_setting("archive_kind")?
            .unwrap_or_else(|| ArchiveKind::default().label().to_string());
        let compression = self
            .get_setting("compression")?
            .unwrap_or_else(|| Compression::default().label().to_string());
        let max_history = match self.get_setting("max_history")? {
            Some(value) => value.parse::<usize>().map_err(|_| {
                AppError::DatabaseError(format!("设置 max_history 的值无效：{}", value))
            })?,
            None => DEFAULT_MAX_HISTORY,
        };

        Ok(AppSettings {
            default_output_dir,
            archive_kind,
            compression,
            max_history,
            db_path: self.db_path.to_string_lossy().to_string(),
        })
    }

    fn get_setting(&self, key: &str) -> AppResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 保存单个设置项（INSERT OR REPLACE 实现 upsert）
    pub fn save_setting(&self, key: &str, value: &str) -> AppResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArchiveRecord> {
    Ok(ArchiveRecord {
        id: row.get(0)?,
        archive_path: row.get(1)?,
        entry_count: row.get(2)?,
        size_bytes: row.get(3)?,
        sha256: row.get(4)?,
        kind: row.get(5)?,
        created_at: row.get(6)?,
    })
}

// ============================================================================
// 单元测试
// ============================================================================
