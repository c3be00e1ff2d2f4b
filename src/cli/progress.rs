// ============================================================================
// 终端进度条
// 基于 indicatif，每处理完一个条目推进一格；stderr 不是终端时隐藏
// ============================================================================

use indicatif::{ProgressBar, ProgressStyle};

use crate::services::packer::ProgressSink;

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} 项";

pub struct TerminalProgress {
    bar: ProgressBar,
    visible: bool,
}

impl TerminalProgress {
    pub fn new(visible: bool) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            visible,
        }
    }

    fn styled_bar(total: u64) -> ProgressBar {
        let bar = ProgressBar::new(total);
        match ProgressStyle::with_template(BAR_TEMPLATE) {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => log::debug!("进度条模板无效：{}", e),
        }
        bar
    }
}

impl ProgressSink for TerminalProgress {
    fn start(&mut self, total: usize) {
        self.bar = if self.visible {
            Self::styled_bar(total as u64)
        } else {
            ProgressBar::hidden()
        };
        self.bar.set_length(total as u64);
    }

    fn advance(&mut self, done: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid() {
        assert!(ProgressStyle::with_template(BAR_TEMPLATE).is_ok());
    }

    #[test]
    fn test_hidden_bar_tracks_position() {
        let mut progress = TerminalProgress::new(false);
        progress.start(3);
        progress.advance(2, 3);
        assert_eq!(progress.bar.position(), 2);
        assert_eq!(progress.bar.length(), Some(3));

        progress.finish();
        assert!(progress.bar.is_finished());
    }
}
