//! 文档来源
//!
//! 编排层只通过 `DocumentSource` 获取批次文本，从不自己解析文档格式。
//! 内置实现 `PagedTextDocument` 读取以换页符（`\f`）分隔页面的纯文本，
//! 即 `pdftotext` 的默认输出。

use crate::error::AppResult;
use crate::models::batch::{Batch, Section};
use async_trait::async_trait;
use std::path::Path;

/// 已打开的文档
pub trait DocumentSource: Send + Sync {
    /// 文档名（不含扩展名）
    fn name(&self) -> &str;

    /// 总页数
    fn page_count(&self) -> usize;

    /// 某部分的页码范围（从 1 开始，闭区间）；该部分没有页面时返回 None
    fn section_page_range(&self, section: Section) -> Option<(usize, usize)>;

    /// 按顺序切分某部分的批次
    fn batches_for_section(&self, section: Section, pages_per_batch: usize) -> Vec<Batch>;
}

/// 打开文档的能力
#[async_trait]
pub trait DocumentOpener: Send + Sync {
    async fn open(&self, path: &Path) -> AppResult<Box<dyn DocumentSource>>;
}

/// 计算期中部分的页数
///
/// 公式：floor(总页数 / 2 × 百分比 / 100)，至少 1 页。
/// 例如 260 页、95% → 130 × 0.95 = 123.5 → 123 页
pub fn mids_page_count(total_pages: usize, mids_percentage: u32) -> usize {
    if total_pages == 0 {
        return 0;
    }
    let mids = (total_pages as u64 * mids_percentage as u64) / 200;
    (mids as usize).clamp(1, total_pages)
}

/// 按页切分好的纯文本文档
#[derive(Debug, Clone)]
pub struct PagedTextDocument {
    name: String,
    pages: Vec<String>,
    mids_pages: usize,
}

impl PagedTextDocument {
    /// 由已清洗的页面文本构建
    pub fn from_pages(name: impl Into<String>, pages: Vec<String>, mids_percentage: u32) -> Self {
        let mids_pages = mids_page_count(pages.len(), mids_percentage);
        Self {
            name: name.into(),
            pages,
            mids_pages,
        }
    }

    /// 由原始文本构建，页面之间以 `\f` 分隔
    pub fn from_text(name: impl Into<String>, text: &str, mids_percentage: u32) -> Self {
        let mut pages: Vec<String> = text.split('\u{c}').map(clean_page_text).collect();
        // pdftotext 的输出以换页符结尾
        if pages.len() > 1 && pages.last().is_some_and(|p| p.is_empty()) {
            pages.pop();
        }
        Self::from_pages(name, pages, mids_percentage)
    }

    pub fn mids_pages(&self) -> usize {
        self.mids_pages
    }
}

impl DocumentSource for PagedTextDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn section_page_range(&self, section: Section) -> Option<(usize, usize)> {
        let total = self.pages.len();
        let (start, end) = match section {
            Section::Mids => (1, self.mids_pages),
            Section::Finals => (self.mids_pages + 1, total),
        };
        (start <= end && end > 0).then_some((start, end))
    }

    fn batches_for_section(&self, section: Section, pages_per_batch: usize) -> Vec<Batch> {
        let Some((start, end)) = self.section_page_range(section) else {
            return Vec::new();
        };
        let per_batch = pages_per_batch.max(1);

        let mut batches = Vec::new();
        let mut current = start;
        let mut batch_number = 1;

        while current <= end {
            let batch_end = (current + per_batch - 1).min(end);

            let text = (current..=batch_end)
                .filter_map(|page| {
                    let page_text = &self.pages[page - 1];
                    (!page_text.is_empty()).then(|| format!("--- Page {} ---\n{}", page, page_text))
                })
                .collect::<Vec<_>>()
                .join("\n\n");

            batches.push(Batch {
                batch_number,
                start_page: current,
                end_page: batch_end,
                page_count: batch_end - current + 1,
                text,
            });

            current = batch_end + 1;
            batch_number += 1;
        }

        batches
    }
}

/// 清洗单页文本：去掉每行首尾空白与空行，合并连续空格
pub fn clean_page_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(' ').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 从路径中取文档名（不含扩展名）
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_pages(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("content of page {}", i)).collect()
    }

    #[test]
    fn test_split_260_pages() {
        let doc = PagedTextDocument::from_pages("CS101", numbered_pages(260), 95);

        assert_eq!(doc.mids_pages(), 123);
        assert_eq!(doc.section_page_range(Section::Mids), Some((1, 123)));
        assert_eq!(doc.section_page_range(Section::Finals), Some((124, 260)));

        let mids = doc.batches_for_section(Section::Mids, 10);
        assert_eq!(mids.len(), 13);
        assert_eq!(mids.last().unwrap().page_count, 3);
        assert_eq!(mids.last().unwrap().start_page, 121);
        assert_eq!(mids.last().unwrap().end_page, 123);

        let finals = doc.batches_for_section(Section::Finals, 10);
        assert_eq!(finals.len(), 14);
        assert_eq!(finals[0].start_page, 124);
        assert_eq!(finals[0].batch_number, 1);
        assert_eq!(finals.last().unwrap().page_count, 7);
        assert_eq!(finals.last().unwrap().end_page, 260);
    }

    #[test]
    fn test_mids_at_least_one_page() {
        assert_eq!(mids_page_count(1, 95), 1);
        assert_eq!(mids_page_count(2, 10), 1);
        assert_eq!(mids_page_count(0, 95), 0);

        let doc = PagedTextDocument::from_pages("tiny", numbered_pages(1), 95);
        assert_eq!(doc.section_page_range(Section::Finals), None);
        assert!(doc.batches_for_section(Section::Finals, 5).is_empty());
    }

    #[test]
    fn test_batch_text_prefixes_and_skips_empty_pages() {
        let pages = vec!["alpha".to_string(), String::new(), "gamma".to_string()];
        let doc = PagedTextDocument::from_pages("doc", pages, 200);
        let batches = doc.batches_for_section(Section::Mids, 5);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].page_count, 3);
        assert_eq!(
            batches[0].text,
            "--- Page 1 ---\nalpha\n\n--- Page 3 ---\ngamma"
        );
    }

    #[test]
    fn test_from_text_splits_on_form_feed() {
        let text = "  first   page \n\n line two \u{c}second page\u{c}";
        let doc = PagedTextDocument::from_text("doc", text, 95);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[0], "first page\nline two");
        assert_eq!(doc.pages[1], "second page");
    }
}
