use crate::error::{AppError, AppResult, DocumentError};
use crate::models::document::{document_stem, DocumentOpener, DocumentSource, PagedTextDocument};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 支持的文档扩展名
const DOCUMENT_EXTENSIONS: [&str; 2] = ["txt", "text"];

/// 从文件夹中找出所有待处理文档，按文件名排序
///
/// 返回列表中的位置 +1 即为文档索引
pub async fn list_documents(folder_path: &str) -> Result<Vec<PathBuf>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut documents = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_document = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_document {
            documents.push(path);
        }
    }

    documents.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));

    for (idx, path) in documents.iter().enumerate() {
        tracing::info!(
            "  {}. {}",
            idx + 1,
            path.file_name().unwrap_or_default().to_string_lossy()
        );
    }

    Ok(documents)
}

/// 读取换页符分页的纯文本文档
pub struct TextDocumentOpener {
    mids_percentage: u32,
}

impl TextDocumentOpener {
    pub fn new(mids_percentage: u32) -> Self {
        Self { mids_percentage }
    }
}

#[async_trait]
impl DocumentOpener for TextDocumentOpener {
    async fn open(&self, path: &Path) -> AppResult<Box<dyn DocumentSource>> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::document_open_failed(path.display().to_string(), e))?;

        let doc = PagedTextDocument::from_text(document_stem(path), &content, self.mids_percentage);
        if doc.page_count() == 0 || content.trim().is_empty() {
            return Err(AppError::Document(DocumentError::Empty {
                path: path.display().to_string(),
            }));
        }

        tracing::info!(
            "📄 文档: {} | 总页数: {} | 期中: 1-{} | 期末: {}-{}",
            doc.name(),
            doc.page_count(),
            doc.mids_pages(),
            doc.mids_pages() + 1,
            doc.page_count()
        );

        Ok(Box::new(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batch::Section;

    #[tokio::test]
    async fn test_list_documents_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_doc.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a_doc.txt"), "a").unwrap();
        std::fs::write(dir.path().join("notes.md"), "skip").unwrap();

        let docs = list_documents(dir.path().to_str().unwrap()).await.unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_doc.txt", "b_doc.txt"]);
    }

    #[tokio::test]
    async fn test_open_missing_file_is_document_error() {
        let opener = TextDocumentOpener::new(95);
        let result = opener.open(Path::new("/definitely/not/here.txt")).await;
        assert!(matches!(result, Err(AppError::Document(DocumentError::OpenFailed { .. }))));
    }

    #[tokio::test]
    async fn test_open_paged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CS101.txt");
        let text = (1..=4).map(|i| format!("page {}", i)).collect::<Vec<_>>().join("\u{c}");
        std::fs::write(&path, text).unwrap();

        let doc = TextDocumentOpener::new(100).open(&path).await.unwrap();
        assert_eq!(doc.name(), "CS101");
        assert_eq!(doc.page_count(), 4);
        assert_eq!(doc.section_page_range(Section::Mids), Some((1, 2)));
        assert_eq!(doc.section_page_range(Section::Finals), Some((3, 4)));
    }
}
