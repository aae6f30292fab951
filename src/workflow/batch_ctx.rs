//! 批次处理上下文
//!
//! 封装"我正在处理哪个文档哪个部分的第几批"这一信息

use crate::models::batch::Section;
use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct BatchCtx {
    /// 文档索引（从 1 开始）
    pub document_index: usize,

    pub document_name: String,

    pub section: Section,

    /// 批次号（从 1 开始）
    pub batch_index: usize,

    /// 该部分的批次总数
    pub total_batches: usize,
}

impl BatchCtx {
    pub fn new(
        document_index: usize,
        document_name: impl Into<String>,
        section: Section,
        batch_index: usize,
        total_batches: usize,
    ) -> Self {
        Self {
            document_index,
            document_name: document_name.into(),
            section,
            batch_index,
            total_batches,
        }
    }

    /// 是否为该部分的最后一批
    pub fn is_last(&self) -> bool {
        self.batch_index >= self.total_batches
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文档 {} {} 批次 {}/{}]",
            self.document_index,
            self.section.as_str().to_uppercase(),
            self.batch_index,
            self.total_batches
        )
    }
}
