// ============================================================================
// 撤销 / 重做历史：整表快照的线性栈
// 任何新的修改都会清空重做栈（不保留分支）
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// 默认撤销深度
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// 快照历史
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct History<T> {
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    max_depth: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_HISTORY)
    }
}

impl<T> History<T> {
    /// 创建空历史，`max_depth` 为 0 时按 1 处理
    pub fn with_limit(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// 从持久化的两个栈恢复
    pub fn from_stacks(undo_stack: Vec<T>, redo_stack: Vec<T>, max_depth: usize) -> Self {
        let mut history = Self {
            undo_stack,
            redo_stack,
            max_depth: max_depth.max(1),
        };
        history.trim();
        history
    }

    /// 记录修改前的状态，并清空重做栈
    pub fn record(&mut self, previous: T) {
        self.undo_stack.push(previous);
        self.redo_stack.clear();
        self.trim();
    }

    /// 撤销：当前状态入重做栈，返回上一状态
    pub fn undo(&mut self, current: T) -> AppResult<T> {
        let previous = self
            .undo_stack
            .pop()
            .ok_or_else(|| AppError::HistoryError("没有可撤销的操作".to_string()))?;
        self.redo_stack.push(current);
        Ok(previous)
    }

    /// 重做：当前状态入撤销栈，返回下一状态
    pub fn redo(&mut self, current: T) -> AppResult<T> {
        let next = self
            .redo_stack
            .pop()
            .ok_or_else(|| AppError::HistoryError("没有可重做的操作".to_string()))?;
        self.undo_stack.push(current);
        self.trim();
        Ok(next)
    }

    /// 清空两个栈
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn set_limit(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        self.trim();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_stack(&self) -> &[T] {
        &self.undo_stack
    }

    pub fn redo_stack(&self) -> &[T] {
        &self.redo_stack
    }

    // 超出深度时丢弃最旧的快照
    fn trim(&mut self) {
        if self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..excess);
        }
    }
}
