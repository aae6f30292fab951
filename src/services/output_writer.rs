//! 输出写入服务 - 业务能力层
//!
//! 只负责"把一个部分的记录写成 JSON 文件"，不关心流程

use crate::error::{AppError, AppResult};
use crate::models::accumulator::renumber;
use crate::models::batch::Section;
use crate::models::record::{ContentKind, Record};
use phf::phf_set;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// 可识别的科目代码
pub static SUBJECT_CODES: phf::Set<&'static str> = phf_set! {
    "ACC", "BIF", "BIO", "BIT", "BNK", "BT", "CHE", "CS", "ECO", "EDU",
    "ENG", "ETH", "FIN", "GSC", "HRM", "ISL", "IT", "MCD", "MCM", "MGMT",
    "MGT", "MKT", "MTH", "PAD", "PAK", "PHY", "PSC", "SOC", "STA", "URD", "ZOO",
};

/// 从文档名提取科目代码：开头的字母后紧跟数字，且字母部分在已知列表中
///
/// `CS101` -> `CS`，`MGMT301` -> `MGMT`，`XYZ999` -> None
pub fn subject_code(document_name: &str) -> Option<&'static str> {
    let upper = document_name.to_uppercase();
    let letters_len = upper
        .chars()
        .take_while(char::is_ascii_uppercase)
        .count();
    if letters_len == 0 {
        return None;
    }

    let (letters, rest) = upper.split_at(letters_len);
    if !rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }
    SUBJECT_CODES.get_key(letters).copied()
}

/// 输出文件名
pub fn output_file_name(document_name: &str, section: Section, kind: ContentKind) -> String {
    match kind {
        ContentKind::Mcq => format!("{}_{}_mcqs.json", document_name, section),
        ContentKind::ShortNote => format!("short note {}_{}.json", document_name, section),
    }
}

/// 输出写入服务
pub struct OutputWriter {
    organized_dir: Option<PathBuf>,
}

impl OutputWriter {
    /// `organized_dir` 为空时总是写到源文档旁边
    pub fn new(organized_dir: Option<PathBuf>) -> Self {
        Self { organized_dir }
    }

    /// 文档的输出目录
    ///
    /// 识别出科目代码时为 `<organized_dir>/<CODE>/<name>/`，否则为源文档目录下的 `<name>_JSON/`
    pub fn output_folder(&self, document_name: &str, source_path: &Path) -> PathBuf {
        if let (Some(base), Some(code)) = (&self.organized_dir, subject_code(document_name)) {
            return base.join(code).join(document_name);
        }
        source_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{}_JSON", document_name))
    }

    /// 写入一个部分的全部记录，编号重排为 1..N
    ///
    /// 没有记录时不写文件，返回 None
    pub async fn save_section(
        &self,
        document_name: &str,
        source_path: &Path,
        section: Section,
        kind: ContentKind,
        mut records: Vec<Record>,
    ) -> AppResult<Option<PathBuf>> {
        if records.is_empty() {
            warn!("⚠️  {} 部分没有可保存的{}", section, kind.label());
            return Ok(None);
        }

        let folder = self.output_folder(document_name, source_path);
        fs::create_dir_all(&folder)
            .await
            .map_err(|e| AppError::file_write_failed(folder.display().to_string(), e))?;

        renumber(&mut records);
        let path = folder.join(output_file_name(document_name, section, kind));
        let content = serde_json::to_string_pretty(&records)?;
        fs::write(&path, content)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

        info!(
            "✓ 已保存 {} 条{}到 {}",
            records.len(),
            kind.label(),
            path.display()
        );
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ShortNote;

    fn notes(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                Record::ShortNote(ShortNote {
                    id: 0,
                    question: format!("Q{}", i),
                    answer: "A".to_string(),
                })
            })
            .collect()
    }

    #[test]
    fn test_subject_code() {
        assert_eq!(subject_code("CS101"), Some("CS"));
        assert_eq!(subject_code("mgmt301_handouts"), Some("MGMT"));
        assert_eq!(subject_code("XYZ999"), None);
        assert_eq!(subject_code("random_file"), None);
        assert_eq!(subject_code("CS"), None);
    }

    #[test]
    fn test_output_file_names() {
        assert_eq!(
            output_file_name("CS101", Section::Mids, ContentKind::Mcq),
            "CS101_mids_mcqs.json"
        );
        assert_eq!(
            output_file_name("CS101", Section::Finals, ContentKind::ShortNote),
            "short note CS101_finals.json"
        );
    }

    #[test]
    fn test_output_folder() {
        let writer = OutputWriter::new(Some(PathBuf::from("/organized")));
        assert_eq!(
            writer.output_folder("CS101", Path::new("/docs/CS101.txt")),
            PathBuf::from("/organized/CS/CS101")
        );
        assert_eq!(
            writer.output_folder("notes", Path::new("/docs/notes.txt")),
            PathBuf::from("/docs/notes_JSON")
        );

        let plain = OutputWriter::new(None);
        assert_eq!(
            plain.output_folder("CS101", Path::new("/docs/CS101.txt")),
            PathBuf::from("/docs/CS101_JSON")
        );
    }

    #[tokio::test]
    async fn test_save_section_renumbers() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        let writer = OutputWriter::new(None);

        let path = writer
            .save_section("notes", &source, Section::Mids, ContentKind::ShortNote, notes(3))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, dir.path().join("notes_JSON").join("short note notes_mids.json"));

        let saved: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let ids: Vec<u64> = saved.iter().map(|v| v["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_section_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = OutputWriter::new(None);
        let saved = writer
            .save_section(
                "notes",
                &dir.path().join("notes.txt"),
                Section::Finals,
                ContentKind::ShortNote,
                Vec::new(),
            )
            .await
            .unwrap();
        assert!(saved.is_none());
        assert!(!dir.path().join("notes_JSON").exists());
    }
}
