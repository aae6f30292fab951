use crate::models::record::Record;
use std::time::{Duration, Instant};

/// 相同文本在该时间窗口内重复提交时直接返回上次结果
pub const DEDUP_WINDOW: Duration = Duration::from_secs(5);

/// 上一次请求；请求失败时没有记录
#[derive(Debug)]
struct LastRequest {
    text: String,
    at: Instant,
    records: Option<Vec<Record>>,
}

/// 重复请求保护
///
/// 只和紧邻的上一次请求比较。每次请求前先登记文本，成功后才保存结果，
/// 所以失败的请求既不会留下缓存，也会让更早的结果失效
#[derive(Debug, Default)]
pub struct DedupGuard {
    last: Option<LastRequest>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找窗口内相同文本的结果
    pub fn lookup(&self, text: &str, now: Instant) -> Option<Vec<Record>> {
        let last = self.last.as_ref()?;
        let fresh = now.saturating_duration_since(last.at) < DEDUP_WINDOW;
        if !fresh || last.text != text {
            return None;
        }
        last.records.clone()
    }

    /// 登记即将发送的请求
    pub fn begin(&mut self, text: &str, now: Instant) {
        self.last = Some(LastRequest {
            text: text.to_string(),
            at: now,
            records: None,
        });
    }

    /// 保存成功请求的结果
    pub fn store(&mut self, text: &str, now: Instant, records: &[Record]) {
        self.last = Some(LastRequest {
            text: text.to_string(),
            at: now,
            records: Some(records.to_vec()),
        });
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::ShortNote;

    fn note(q: &str) -> Record {
        Record::ShortNote(ShortNote {
            id: 0,
            question: q.to_string(),
            answer: "a".to_string(),
        })
    }

    #[test]
    fn test_hit_within_window() {
        let start = Instant::now();
        let mut guard = DedupGuard::new();
        guard.store("batch text", start, &[note("Q1")]);

        let hit = guard.lookup("batch text", start + Duration::from_secs(4));
        assert_eq!(hit, Some(vec![note("Q1")]));
    }

    #[test]
    fn test_miss_after_window_or_different_text() {
        let start = Instant::now();
        let mut guard = DedupGuard::new();
        guard.store("batch text", start, &[note("Q1")]);

        assert!(guard.lookup("batch text", start + DEDUP_WINDOW).is_none());
        assert!(guard.lookup("other text", start).is_none());
    }

    #[test]
    fn test_clear() {
        let start = Instant::now();
        let mut guard = DedupGuard::new();
        guard.store("batch text", start, &[]);
        guard.clear();
        assert!(guard.lookup("batch text", start).is_none());
    }

    #[test]
    fn test_pending_request_hides_older_result() {
        let start = Instant::now();
        let mut guard = DedupGuard::new();
        guard.store("text a", start, &[note("Q1")]);

        // B 发出后失败，没有结果
        guard.begin("text b", start + Duration::from_secs(1));
        assert!(guard.lookup("text a", start + Duration::from_secs(2)).is_none());
        assert!(guard.lookup("text b", start + Duration::from_secs(2)).is_none());
    }
}
