//! 记录校验
//!
//! 所有进入输出的记录都经过这里；校验失败的条目直接丢弃，只计入统计

use crate::models::record::{ContentKind, Difficulty, Mcq, Record, ShortNote};
use serde_json::Value;

/// 选项必须恰好 4 个
pub const MCQ_OPTION_COUNT: usize = 4;

/// 答案比较前的统一规范化：各类 Unicode 空格视为普通空格，合并连续空白，去掉首尾空白
///
/// 修复阶段的过滤和之后的任何再校验都使用同一规则
pub fn normalize_answer(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{00a0}' | '\u{2009}' | '\u{200a}' | '\u{202f}' => ' ',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 过滤出合法记录，返回 (合法记录, 被丢弃数量)
pub fn filter_valid(items: Vec<Value>, kind: ContentKind) -> (Vec<Record>, usize) {
    let total = items.len();
    let records: Vec<Record> = items.iter().filter_map(|item| to_record(item, kind)).collect();
    let dropped = total - records.len();
    (records, dropped)
}

/// 把一个 JSON 条目转换为记录；不合法时返回 None
pub fn to_record(item: &Value, kind: ContentKind) -> Option<Record> {
    match kind {
        ContentKind::Mcq => to_mcq(item).map(Record::Mcq),
        ContentKind::ShortNote => to_short_note(item).map(Record::ShortNote),
    }
}

pub fn is_valid_mcq(item: &Value) -> bool {
    to_mcq(item).is_some()
}

pub fn is_valid_short_note(item: &Value) -> bool {
    to_short_note(item).is_some()
}

/// 对已经构造出的记录再次校验
pub fn record_is_valid(record: &Record) -> bool {
    match record {
        Record::Mcq(m) => {
            !m.question.trim().is_empty()
                && m.options.len() == MCQ_OPTION_COUNT
                && answer_in_options(&m.correct, &m.options)
        }
        Record::ShortNote(n) => !n.question.trim().is_empty() && !n.answer.trim().is_empty(),
    }
}

fn answer_in_options(correct: &str, options: &[String]) -> bool {
    let correct = normalize_answer(correct);
    !correct.is_empty() && options.iter().any(|opt| normalize_answer(opt) == correct)
}

fn to_mcq(item: &Value) -> Option<Mcq> {
    let obj = item.as_object()?;

    let question = non_empty_text(obj.get("question")?)?;

    let options = obj
        .get("options")?
        .as_array()?
        .iter()
        .map(scalar_text)
        .collect::<Option<Vec<String>>>()?;
    if options.len() != MCQ_OPTION_COUNT {
        return None;
    }

    let correct = non_empty_text(obj.get("correct")?)?;
    if !answer_in_options(&correct, &options) {
        return None;
    }

    let explanation = obj.get("explanation").and_then(scalar_text).unwrap_or_default();
    let difficulty = obj
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::parse)
        .unwrap_or_default();
    let importance = obj.get("importance").map(importance_of).unwrap_or(3);

    Some(Mcq {
        id: 0,
        question,
        options,
        correct,
        explanation,
        difficulty,
        importance,
    })
}

fn to_short_note(item: &Value) -> Option<ShortNote> {
    let obj = item.as_object()?;
    Some(ShortNote {
        id: 0,
        question: non_empty_text(obj.get("question")?)?,
        answer: non_empty_text(obj.get("answer")?)?,
    })
}

/// 字符串、数字、布尔值转为文本
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty_text(value: &Value) -> Option<String> {
    scalar_text(value).filter(|s| !s.trim().is_empty())
}

/// 重要度限制在 1..=5，无法识别时取 3
fn importance_of(value: &Value) -> u8 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(v) if v.is_finite() => v.trunc().clamp(1.0, 5.0) as u8,
        _ => 3,
    }
}
