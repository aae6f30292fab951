//! 模型输出修复引擎
//!
//! 把接近 JSON 的文本逐级修复为合法记录列表：
//! 1. 直接解析
//! 2. 快速修复（去 markdown / HTML，截取数组）
//! 3. 截断最后一个 `]` 之后的垃圾
//! 4. 结构修复（补括号、去多余逗号、补缺失逗号）
//! 5. 逐个对象抽取 + 引号修复
//!
//! 每个阶段只有在过滤后至少得到一条合法记录时才算成功

pub mod quick_fix;
pub mod quote_fix;
pub mod validate;

use crate::models::record::{ContentKind, Record};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub use validate::{normalize_answer, record_is_valid};

/// 修复阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairStage {
    FastPath,
    QuickFix,
    Trimmed,
    StructuralRepair,
    PartialExtract,
}

impl fmt::Display for RepairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepairStage::FastPath => "fastPath",
            RepairStage::QuickFix => "quickFix",
            RepairStage::Trimmed => "trimmed",
            RepairStage::StructuralRepair => "structuralRepair",
            RepairStage::PartialExtract => "partialExtract",
        };
        write!(f, "{}", name)
    }
}

/// 所有阶段都没能得到合法记录
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("模型输出无法修复: {reason}")]
pub struct RepairFailure {
    pub reason: String,
}

impl RepairFailure {
    fn unrecoverable() -> Self {
        Self {
            reason: "unrecoverable".to_string(),
        }
    }
}

/// 一次成功修复的详细结果
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    pub records: Vec<Record>,
    pub stage: RepairStage,
    pub dropped: usize,
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairStats {
    pub fast_path: u64,
    pub quick_fix: u64,
    pub trimmed: u64,
    pub structural_repair: u64,
    pub partial_extract: u64,
    pub failures: u64,
    /// 校验未通过被丢弃的条目总数
    pub dropped_records: u64,
}

impl RepairStats {
    pub fn total_calls(&self) -> u64 {
        self.fast_path
            + self.quick_fix
            + self.trimmed
            + self.structural_repair
            + self.partial_extract
            + self.failures
    }
}

#[derive(Debug, Default)]
struct StageCounters {
    fast_path: AtomicU64,
    quick_fix: AtomicU64,
    trimmed: AtomicU64,
    structural_repair: AtomicU64,
    partial_extract: AtomicU64,
    failures: AtomicU64,
    dropped_records: AtomicU64,
}

impl StageCounters {
    fn for_stage(&self, stage: RepairStage) -> &AtomicU64 {
        match stage {
            RepairStage::FastPath => &self.fast_path,
            RepairStage::QuickFix => &self.quick_fix,
            RepairStage::Trimmed => &self.trimmed,
            RepairStage::StructuralRepair => &self.structural_repair,
            RepairStage::PartialExtract => &self.partial_extract,
        }
    }
}

/// 一个阶段：把原始文本转换为候选条目，无法解析时返回 None
type StageAttempt = fn(&str) -> Option<Vec<Value>>;

const STAGES: [(RepairStage, StageAttempt); 5] = [
    (RepairStage::FastPath, parse_direct),
    (RepairStage::QuickFix, parse_quick_fixed),
    (RepairStage::Trimmed, parse_trimmed),
    (RepairStage::StructuralRepair, parse_structural),
    (RepairStage::PartialExtract, extract_objects),
];

/// 修复引擎，计数器可在多个任务间共享
#[derive(Debug, Default)]
pub struct RepairEngine {
    counters: StageCounters,
}

impl RepairEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 修复并校验，返回非空的合法记录列表
    pub fn repair(&self, raw: &str, kind: ContentKind) -> Result<Vec<Record>, RepairFailure> {
        self.repair_detailed(raw, kind).map(|outcome| outcome.records)
    }

    /// 同 [`repair`](Self::repair)，额外返回成功的阶段和丢弃数量
    pub fn repair_detailed(
        &self,
        raw: &str,
        kind: ContentKind,
    ) -> Result<RepairOutcome, RepairFailure> {
        for (stage, attempt) in STAGES {
            let Some(items) = attempt(raw) else {
                continue;
            };
            let (records, dropped) = validate::filter_valid(items, kind);
            if records.is_empty() {
                continue;
            }

            self.counters.for_stage(stage).fetch_add(1, Ordering::Relaxed);
            self.counters
                .dropped_records
                .fetch_add(dropped as u64, Ordering::Relaxed);

            if stage != RepairStage::FastPath {
                tracing::debug!("🔧 修复阶段 {} 成功, 有效 {} 条, 丢弃 {} 条", stage, records.len(), dropped);
            }

            return Ok(RepairOutcome {
                records,
                stage,
                dropped,
            });
        }

        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            "❌ 所有修复阶段均失败 (输入 {} 字符): {}",
            raw.chars().count(),
            crate::utils::logging::truncate_text(raw, 120)
        );
        Err(RepairFailure::unrecoverable())
    }

    /// 校验服务端已解析好的条目，不计入阶段统计
    pub fn validate_items(&self, items: Vec<Value>, kind: ContentKind) -> Vec<Record> {
        let (records, dropped) = validate::filter_valid(items, kind);
        self.counters
            .dropped_records
            .fetch_add(dropped as u64, Ordering::Relaxed);
        records
    }

    pub fn stats(&self) -> RepairStats {
        let c = &self.counters;
        RepairStats {
            fast_path: c.fast_path.load(Ordering::Relaxed),
            quick_fix: c.quick_fix.load(Ordering::Relaxed),
            trimmed: c.trimmed.load(Ordering::Relaxed),
            structural_repair: c.structural_repair.load(Ordering::Relaxed),
            partial_extract: c.partial_extract.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            dropped_records: c.dropped_records.load(Ordering::Relaxed),
        }
    }
}

fn as_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn parse_list(text: &str) -> Option<Vec<Value>> {
    serde_json::from_str(text.trim()).ok().and_then(as_list)
}

fn parse_direct(raw: &str) -> Option<Vec<Value>> {
    parse_list(raw)
}

fn parse_quick_fixed(raw: &str) -> Option<Vec<Value>> {
    parse_list(&quick_fix::quick_fix(raw))
}

/// 只解析第一个完整的值，忽略其后的内容
fn parse_trimmed(raw: &str) -> Option<Vec<Value>> {
    let fixed = quick_fix::quick_fix(raw);
    let truncated = quick_fix::truncate_at_last_bracket(&fixed)?;
    let mut stream = serde_json::Deserializer::from_str(truncated).into_iter::<Value>();
    stream.next()?.ok().and_then(as_list)
}

/// 截断的输出里最后一个 `]` 往往属于某个选项数组，先从第一个 `[` 一直取到末尾再补全，
/// 不行再对快速修复的结果补全
fn parse_structural(raw: &str) -> Option<Vec<Value>> {
    let cleaned = quick_fix::clean_markup(raw);
    let from_open = cleaned.find('[').map_or(cleaned.as_str(), |start| &cleaned[start..]);
    let sliced = quick_fix::slice_to_list(&cleaned);

    // 先绑定再返回：临时数组借用了 cleaned
    let found = [from_open, sliced]
        .into_iter()
        .find_map(|candidate| parse_list(&quick_fix::fix_structure(candidate)));
    found
}

fn extract_objects(raw: &str) -> Option<Vec<Value>> {
    let cleaned = quick_fix::clean_markup(raw);
    let objects: Vec<Value> = quick_fix::object_candidates(&cleaned)
        .into_iter()
        .filter_map(|candidate| {
            let candidate = quick_fix::strip_trailing_commas(candidate);
            serde_json::from_str::<Value>(&candidate)
                .or_else(|_| serde_json::from_str(&quote_fix::repair_quotes(&candidate)))
                .ok()
        })
        .filter(Value::is_object)
        .collect();

    if objects.is_empty() {
        None
    } else {
        Some(objects)
    }
}
