use serde::{Deserialize, Serialize};
use std::fmt;

/// 生成内容的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ContentKind {
    /// 选择题
    #[default]
    #[serde(rename = "mcq")]
    Mcq,
    /// 简答笔记
    #[serde(rename = "short_notes")]
    ShortNote,
}

impl ContentKind {
    /// 发送给服务端的 `content_type` 值
    pub fn wire_name(self) -> &'static str {
        match self {
            ContentKind::Mcq => "mcq",
            ContentKind::ShortNote => "short_notes",
        }
    }

    /// 日志中显示的名称
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::Mcq => "MCQs",
            ContentKind::ShortNote => "Short Notes",
        }
    }

    /// 从配置字符串解析
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mcq" | "mcqs" => Some(ContentKind::Mcq),
            "short_notes" | "short_note" | "notes" => Some(ContentKind::ShortNote),
            _ => None,
        }
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// 非法值返回 None，由调用方决定默认值
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// 选择题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mcq {
    #[serde(default)]
    pub id: usize,
    pub question: String,
    pub options: Vec<String>,
    pub correct: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_importance")]
    pub importance: u8,
}

fn default_importance() -> u8 {
    3
}

/// 简答笔记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortNote {
    #[serde(default)]
    pub id: usize,
    pub question: String,
    pub answer: String,
}

/// 经过校验的一条输出记录
///
/// 只能通过 `services::repair::validate` 构造出来的记录才会被写入磁盘
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Mcq(Mcq),
    ShortNote(ShortNote),
}

impl Record {
    pub fn id(&self) -> usize {
        match self {
            Record::Mcq(m) => m.id,
            Record::ShortNote(n) => n.id,
        }
    }

    pub fn set_id(&mut self, id: usize) {
        match self {
            Record::Mcq(m) => m.id = id,
            Record::ShortNote(n) => n.id = id,
        }
    }

    pub fn question(&self) -> &str {
        match self {
            Record::Mcq(m) => &m.question,
            Record::ShortNote(n) => &n.question,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Record::Mcq(_) => ContentKind::Mcq,
            Record::ShortNote(_) => ContentKind::ShortNote,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
