// ============================================================================
// Commands：前端（CLI / shell）与 services、database 之间的薄接口层
// 负责：接收参数 → 调用会话 / 数据库 → 组织输出文本
// ⛔ 禁止：包含列表簿记或打包逻辑
// ============================================================================

pub mod archive;
pub mod entries;
pub mod settings;

use std::path::{Path, PathBuf};

use crate::database::Database;
use crate::services::session::ArchiveSession;
use crate::utils::error::AppResult;

/// 一次运行期间共享的上下文：数据库与当前会话
pub struct AppContext {
    pub db: Database,
    pub session: ArchiveSession,
}

impl AppContext {
    /// 打开数据目录中的数据库并恢复上次的会话
    pub fn open(data_dir: &Path, work_dir: PathBuf) -> AppResult<Self> {
        let db = Database::init(data_dir)?;
        let session = db.load_session(&work_dir)?;
        Ok(Self { db, session })
    }

    /// 持久化当前会话
    pub fn persist(&self) -> AppResult<()> {
        self.db.save_session(&self.session)
    }
}

/// 命令执行结果：输出文本，以及会话是否被修改（需要持久化）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub message: String,
    pub changed: bool,
}

impl Outcome {
    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changed: true,
        }
    }

    pub fn unchanged(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            changed: false,
        }
    }
}

/// 字节数转为便于阅读的文本
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::utils::prompt::Prompter;

    /// 按脚本应答的提示器，替代终端对话框
    #[derive(Default)]
    pub struct ScriptedPrompter {
        pub confirms: RefCell<VecDeque<bool>>,
        pub inputs: RefCell<VecDeque<String>>,
        pub asked: RefCell<Vec<String>>,
    }

    impl ScriptedPrompter {
        pub fn confirming(answer: bool) -> Self {
            let prompter = Self::default();
            prompter.confirms.borrow_mut().push_back(answer);
            prompter
        }

        pub fn with_input(text: &str) -> Self {
            let prompter = Self::default();
            prompter.inputs.borrow_mut().push_back(text.to_string());
            prompter
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&self, message: &str) -> bool {
            self.asked.borrow_mut().push(message.to_string());
            self.confirms.borrow_mut().pop_front().unwrap_or(false)
        }

        fn input(&self, message: &str) -> Option<String> {
            self.asked.borrow_mut().push(message.to_string());
            self.inputs.borrow_mut().pop_front()
        }
    }
}
