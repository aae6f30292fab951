use crate::models::batch::Section;
use serde::{Deserialize, Serialize};

/// 断点位置：最后一个成功完成的批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingPosition {
    pub document_path: String,
    pub document_index: usize,
    pub document_name: String,
    pub section: Section,
    #[serde(rename = "batch")]
    pub batch_index: usize,
    #[serde(default)]
    pub timestamp: String,
}

impl ProcessingPosition {
    /// 以当前时间创建
    pub fn now(
        document_path: impl Into<String>,
        document_index: usize,
        document_name: impl Into<String>,
        section: Section,
        batch_index: usize,
    ) -> Self {
        Self {
            document_path: document_path.into(),
            document_index,
            document_name: document_name.into(),
            section,
            batch_index,
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    /// 供日志/界面显示的摘要
    pub fn summary(&self) -> String {
        format!(
            "Document {}: {}, Section: {}, Batch: {}",
            self.document_index,
            self.document_name,
            self.section.as_str().to_uppercase(),
            self.batch_index
        )
    }
}

/// 本次运行的起点
///
/// 文档索引与批次号均从 1 开始；批次跳过只作用于本次运行处理的第一个文档
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    pub document_index: usize,
    pub mids_start_batch: usize,
    pub finals_start_batch: usize,
}

impl Default for ResumePoint {
    fn default() -> Self {
        Self {
            document_index: 1,
            mids_start_batch: 1,
            finals_start_batch: 1,
        }
    }
}

impl ResumePoint {
    pub fn new(document_index: usize, mids_start_batch: usize, finals_start_batch: usize) -> Self {
        Self {
            document_index: document_index.max(1),
            mids_start_batch: mids_start_batch.max(1),
            finals_start_batch: finals_start_batch.max(1),
        }
    }

    /// 从已记录的位置继续：从记录批次的下一个批次开始，不重复处理已完成的批次
    ///
    /// 记录位于 finals 时，mids 视为已完成
    pub fn after(position: &ProcessingPosition) -> Self {
        let next = position.batch_index + 1;
        match position.section {
            Section::Mids => Self::new(position.document_index, next, 1),
            Section::Finals => Self {
                document_index: position.document_index.max(1),
                mids_start_batch: usize::MAX,
                finals_start_batch: next,
            },
        }
    }

    pub fn start_batch(&self, section: Section) -> usize {
        match section {
            Section::Mids => self.mids_start_batch,
            Section::Finals => self.finals_start_batch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_json_field_names() {
        let pos = ProcessingPosition {
            document_path: "/docs/CS101.txt".to_string(),
            document_index: 3,
            document_name: "CS101.txt".to_string(),
            section: Section::Finals,
            batch_index: 7,
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
        };
        let value = serde_json::to_value(&pos).unwrap();
        assert_eq!(value["documentPath"], "/docs/CS101.txt");
        assert_eq!(value["documentIndex"], 3);
        assert_eq!(value["documentName"], "CS101.txt");
        assert_eq!(value["section"], "finals");
        assert_eq!(value["batch"], 7);
    }

    #[test]
    fn test_resume_after_position() {
        let pos = ProcessingPosition::now("a.txt", 3, "a.txt", Section::Finals, 6);
        let resume = ResumePoint::after(&pos);
        assert_eq!(resume.document_index, 3);
        assert_eq!(resume.start_batch(Section::Finals), 7);
        assert_eq!(resume.start_batch(Section::Mids), usize::MAX);

        let pos = ProcessingPosition::now("a.txt", 2, "a.txt", Section::Mids, 4);
        let resume = ResumePoint::after(&pos);
        assert_eq!(resume.start_batch(Section::Mids), 5);
        assert_eq!(resume.start_batch(Section::Finals), 1);
    }

    #[test]
    fn test_summary() {
        let pos = ProcessingPosition::now("x/CS101.txt", 5, "CS101.txt", Section::Mids, 3);
        assert_eq!(pos.summary(), "Document 5: CS101.txt, Section: MIDS, Batch: 3");
    }
}
