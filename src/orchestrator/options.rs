use crate::config::Config;
use crate::error::AppResult;
use crate::models::batch::Section;
use crate::models::position::ResumePoint;
use crate::models::record::ContentKind;
use crate::models::selection::parse_selection;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// 一次运行的参数
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 按索引排序的文档列表，位置 +1 即为文档索引
    pub documents: Vec<PathBuf>,
    /// 选中的文档索引；None 表示全部
    pub selection: Option<BTreeSet<usize>>,
    pub sections: Vec<Section>,
    pub resume: ResumePoint,
    /// 两次请求之间的间隔
    pub delay: Duration,
    pub dom_delay_seconds: u64,
    pub pages_per_batch: usize,
    pub premium: bool,
    pub content_kind: ContentKind,
    pub pause_poll_interval: Duration,
}

impl RunOptions {
    pub fn new(documents: Vec<PathBuf>) -> Self {
        Self {
            documents,
            selection: None,
            sections: Section::ALL.to_vec(),
            resume: ResumePoint::default(),
            delay: Duration::from_secs(12),
            dom_delay_seconds: 1,
            pages_per_batch: 5,
            premium: false,
            content_kind: ContentKind::Mcq,
            pause_poll_interval: Duration::from_secs(1),
        }
    }

    /// 按配置构建，文档选择字符串在这里解析
    pub fn from_config(config: &Config, documents: Vec<PathBuf>) -> AppResult<Self> {
        let selection = if config.document_selection.trim().is_empty() {
            None
        } else {
            Some(parse_selection(&config.document_selection, documents.len())?)
        };

        Ok(Self {
            documents,
            selection,
            sections: config.sections.clone(),
            resume: ResumePoint::default(),
            delay: Duration::from_secs_f64(config.delay_seconds.max(0.0)),
            dom_delay_seconds: config.dom_delay_seconds,
            pages_per_batch: config.pages_per_batch.max(1),
            premium: config.premium_model,
            content_kind: config.content_kind,
            pause_poll_interval: Duration::from_millis(config.pause_poll_interval_ms.max(1)),
        })
    }

    pub fn with_resume(mut self, resume: ResumePoint) -> Self {
        self.resume = resume;
        self
    }

    /// 文档是否被选中
    pub fn is_selected(&self, index: usize) -> bool {
        self.selection
            .as_ref()
            .map_or(true, |selected| selected.contains(&index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_parses_selection() {
        let config = Config {
            document_selection: "1,3-4".to_string(),
            ..Config::default()
        };
        let docs = (1..=5).map(|i| PathBuf::from(format!("{}.txt", i))).collect();
        let options = RunOptions::from_config(&config, docs).unwrap();

        assert!(options.is_selected(1));
        assert!(!options.is_selected(2));
        assert!(options.is_selected(4));
        assert!(!options.is_selected(5));
    }

    #[test]
    fn test_invalid_selection_is_rejected() {
        let config = Config {
            document_selection: "9".to_string(),
            ..Config::default()
        };
        assert!(RunOptions::from_config(&config, vec![PathBuf::from("a.txt")]).is_err());
    }

    #[test]
    fn test_empty_selection_selects_everything() {
        let options = RunOptions::new(vec![PathBuf::from("a.txt")]);
        assert!(options.is_selected(1));
        assert!(options.is_selected(42));
    }
}
