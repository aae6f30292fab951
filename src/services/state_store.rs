//! 断点状态存储 - 业务能力层
//!
//! 只负责"记住最后完成的批次"，每次保存都整体替换文件

use crate::error::{AppError, AppResult};
use crate::models::position::ProcessingPosition;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// 默认状态文件名
pub const DEFAULT_STATE_FILE: &str = "last_processed_state.json";

/// 断点状态存储
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// 保存位置：先写临时文件再重命名，读到的文件要么是旧的要么是新的
    pub async fn save(&self, position: &ProcessingPosition) -> AppResult<()> {
        let content = serde_json::to_string_pretty(position)?;
        let temp = self.temp_path();
        let target = self.path.display().to_string();

        fs::write(&temp, content)
            .await
            .map_err(|e| AppError::file_write_failed(temp.display().to_string(), e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| AppError::file_write_failed(target, e))?;

        debug!("💾 已保存断点: {}", position.summary());
        Ok(())
    }

    /// 读取位置；文件不存在或内容无效时返回 None
    pub async fn load(&self) -> Option<ProcessingPosition> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("⚠️  读取断点文件失败 {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(position) => Some(position),
            Err(e) => {
                warn!("⚠️  断点文件内容无效 {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// 删除状态文件，不存在时视为成功
    pub async fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::File(crate::error::FileError::DeleteFailed {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })),
        }
    }

    /// 已保存位置的可读摘要
    pub async fn summary(&self) -> Option<String> {
        self.load().await.map(|position| position.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::batch::Section;
    use tokio_test::assert_ok;

    fn position(batch: usize) -> ProcessingPosition {
        ProcessingPosition::now("/docs/CS101.txt", 3, "CS101", Section::Finals, batch)
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        assert_ok!(store.save(&position(6)).await);
        assert_ok!(store.save(&position(7)).await);

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.batch_index, 7);
        assert_eq!(loaded.document_index, 3);
        assert_eq!(loaded.section, Section::Finals);
        assert!(!store.temp_path().exists());
        assert_eq!(
            store.summary().await.unwrap(),
            "Document 3: CS101, Section: FINALS, Batch: 7"
        );
    }

    #[tokio::test]
    async fn test_file_uses_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store.save(&position(2)).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["documentIndex"], 3);
        assert_eq!(value["documentName"], "CS101");
        assert_eq!(value["section"], "finals");
        assert_eq!(value["batch"], 2);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert!(store.load().await.is_none());

        std::fs::write(store.path(), r#"{"documentIndex": 1}"#).unwrap();
        assert!(store.load().await.is_none());
        assert!(store.summary().await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        // 文件不存在时也成功
        assert_ok!(store.clear().await);

        assert_ok!(store.save(&position(1)).await);
        assert_ok!(store.clear().await);
        assert!(store.load().await.is_none());
    }
}
