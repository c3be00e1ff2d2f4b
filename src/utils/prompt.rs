// ============================================================================
// 用户交互：确认提示与文本输入
// 只约定“请求 → 应答”的简单契约，终端实现基于 dialoguer，测试另有脚本实现
// ============================================================================

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

/// 交互提示接口
pub trait Prompter {
    /// 是 / 否确认，无法交互时视为“否”
    fn confirm(&self, message: &str) -> bool;

    /// 读取一行文本，用户未输入或无法交互时返回 None
    fn input(&self, message: &str) -> Option<String>;
}

/// 终端实现：提示写到 stderr
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> bool {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                log::debug!("确认提示不可用：{}", e);
                false
            })
    }

    fn input(&self, message: &str) -> Option<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| log::debug!("输入提示不可用：{}", e))
            .ok()
            .filter(|s| !s.trim().is_empty())
    }
}

/// 非交互实现：所有确认都视为同意（`--yes`），不提供文本输入
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }

    fn input(&self, _message: &str) -> Option<String> {
        None
    }
}
