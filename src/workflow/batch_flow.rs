//! 批次处理流程 - 流程层
//!
//! 核心职责：定义"一个批次"的完整处理流程
//!
//! 流程顺序：
//! 1. 请求数达到阈值时先开启新会话
//! 2. 发送生成请求
//! 3. 成功 → 计数 +1，返回记录；失败 → 记录日志，跳过该批次

use std::sync::Arc;
use std::time::Instant;

use crate::clients::{GenerationBackend, GenerationRequest};
use crate::error::AppError;
use crate::models::batch::Batch;
use crate::models::event::EventSink;
use crate::models::record::{ContentKind, Record};
use crate::workflow::batch_ctx::BatchCtx;

/// 高级模型每 10 次请求重置一次会话
pub const PREMIUM_RESET_THRESHOLD: usize = 10;
/// 普通模型每 20 次请求重置一次会话
pub const STANDARD_RESET_THRESHOLD: usize = 20;

/// 批次处理结果
#[derive(Debug)]
pub enum BatchOutcome {
    /// 请求成功，记录可能为空
    Recorded(Vec<Record>),
    /// 请求失败，跳过该批次
    Skipped(AppError),
}

/// 会话重置策略
///
/// 计数器只在请求成功后 +1；新文档开始或重置会话后清零
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    threshold: usize,
    requests: usize,
}

impl SessionPolicy {
    pub fn new(premium: bool) -> Self {
        let threshold = if premium {
            PREMIUM_RESET_THRESHOLD
        } else {
            STANDARD_RESET_THRESHOLD
        };
        Self {
            threshold,
            requests: 0,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    /// 下一次请求前是否需要重置会话
    pub fn needs_reset(&self) -> bool {
        self.requests > 0 && self.requests % self.threshold == 0
    }

    pub fn record_success(&mut self) {
        self.requests += 1;
    }

    pub fn reset(&mut self) {
        self.requests = 0;
    }
}

/// 批次处理流程
///
/// - 决定何时重置会话、何时发送请求
/// - 不持有文档，不写文件
/// - 只依赖生成服务接口
pub struct BatchFlow<B: GenerationBackend + ?Sized> {
    backend: Arc<B>,
    session: SessionPolicy,
    kind: ContentKind,
    dom_delay_seconds: u64,
}

impl<B: GenerationBackend + ?Sized> BatchFlow<B> {
    pub fn new(backend: Arc<B>, premium: bool, kind: ContentKind, dom_delay_seconds: u64) -> Self {
        Self {
            backend,
            session: SessionPolicy::new(premium),
            kind,
            dom_delay_seconds,
        }
    }

    pub fn session(&self) -> &SessionPolicy {
        &self.session
    }

    /// 新文档开始：开启新会话并清零计数器
    pub async fn start_document(&mut self, sink: &EventSink) {
        sink.info("🔄 为新文档开启新的会话...");
        if let Err(e) = self.backend.reset_session().await {
            sink.warning(format!("⚠️  会话重置失败，继续处理: {}", e));
        }
        self.session.reset();
        sink.info("🔄 请求计数已清零");
    }

    pub async fn run(&mut self, ctx: &BatchCtx, batch: &Batch, sink: &EventSink) -> BatchOutcome {
        if self.session.needs_reset() {
            self.reset_session(sink).await;
        }

        let started = Instant::now();
        let request = GenerationRequest {
            text: &batch.text,
            section: ctx.section,
            page_count: batch.page_count,
            kind: self.kind,
            dom_delay_seconds: self.dom_delay_seconds,
        };

        match self.backend.generate(&request).await {
            Ok(records) => {
                self.session.record_success();
                sink.success(format!(
                    "{}    ✓ 生成 {} 条{}, 耗时 {:.1}s (本文档请求数: {})",
                    ctx,
                    records.len(),
                    self.kind.label(),
                    started.elapsed().as_secs_f64(),
                    self.session.requests()
                ));
                BatchOutcome::Recorded(records)
            }
            Err(e) => {
                sink.error(format!("{}    ❌ 失败: {}", ctx, e));
                sink.warning(format!("{}    ⏭️  跳过该批次", ctx));
                BatchOutcome::Skipped(e)
            }
        }
    }

    async fn reset_session(&mut self, sink: &EventSink) {
        sink.info(format!(
            "🔄 已发送 {} 次请求 (上限 {})，自动开启新会话...",
            self.session.requests(),
            self.session.threshold()
        ));
        match self.backend.reset_session().await {
            Ok(()) => sink.success("✓ 会话重置成功"),
            Err(e) => sink.warning(format!("⚠️  会话重置失败，继续处理: {}", e)),
        }
        self.session.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(SessionPolicy::new(true).threshold(), 10);
        assert_eq!(SessionPolicy::new(false).threshold(), 20);
    }

    #[test]
    fn test_needs_reset_on_positive_multiple() {
        let mut policy = SessionPolicy::new(true);
        assert!(!policy.needs_reset());

        for _ in 0..9 {
            policy.record_success();
        }
        assert!(!policy.needs_reset());

        policy.record_success();
        assert!(policy.needs_reset());

        policy.reset();
        assert!(!policy.needs_reset());
        assert_eq!(policy.requests(), 0);
    }
}
