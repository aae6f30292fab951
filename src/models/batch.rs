use serde::{Deserialize, Serialize};
use std::fmt;

/// 文档的两个部分：期中 / 期末
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Mids,
    Finals,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Mids, Section::Finals];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Mids => "mids",
            Section::Finals => "finals",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mids" => Some(Section::Mids),
            "finals" => Some(Section::Finals),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次生成请求的单位：连续若干页的文本
///
/// 页码从 1 开始，`start_page..=end_page`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub batch_number: usize,
    pub start_page: usize,
    pub end_page: usize,
    pub page_count: usize,
    pub text: String,
}
