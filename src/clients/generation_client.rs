//! 生成服务客户端
//!
//! 封装健康检查、会话重置、暂停/恢复和批次生成；生成结果交给修复引擎解析

use crate::clients::backend::{GenerationBackend, GenerationRequest};
use crate::clients::dedup::DedupGuard;
use crate::config::Config;
use crate::error::{AppError, AppResult, ServiceError, UnavailableReason};
use crate::infrastructure::{HttpExecutor, HttpReply};
use crate::models::record::Record;
use crate::services::repair::{RepairEngine, RepairStats};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

const HEALTH_PATH: &str = "/api/health";
const RESET_PATH: &str = "/api/reset-chat";
const PAUSE_PATH: &str = "/api/pause";
const RESUME_PATH: &str = "/api/resume";
const PAUSE_STATUS_PATH: &str = "/api/pause-status";
const GENERATE_PATH: &str = "/api/generate-mcqs";

/// 生成服务客户端
pub struct RequestClient {
    executor: HttpExecutor,
    repair: RepairEngine,
    dedup: Mutex<DedupGuard>,
    request_timeout: Duration,
    control_timeout: Duration,
}

impl RequestClient {
    /// 按配置创建客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_timeouts(
            &config.server_url,
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.control_timeout_secs),
        )
    }

    pub fn with_timeouts(
        server_url: &str,
        request_timeout: Duration,
        control_timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            executor: HttpExecutor::new(server_url)?,
            repair: RepairEngine::new(),
            dedup: Mutex::new(DedupGuard::new()),
            request_timeout,
            control_timeout,
        })
    }

    /// 修复引擎的统计信息
    pub fn repair_stats(&self) -> RepairStats {
        self.repair.stats()
    }

    /// 把 200 以外的状态码映射为错误
    fn status_error(reply: &HttpReply) -> AppError {
        let message = reply.str_field("error").map(str::to_string);
        let err = match reply.status {
            503 => ServiceError::Unavailable {
                reason: UnavailableReason::from_code(reply.str_field("code")),
                message,
            },
            504 => ServiceError::Timeout { message },
            status => ServiceError::BadStatus { status, message },
        };
        err.into()
    }

    /// 解析 200 响应体
    fn interpret_success(
        &self,
        reply: &HttpReply,
        request: &GenerationRequest<'_>,
        started: Instant,
    ) -> AppResult<Vec<Record>> {
        if !reply.body.is_object() {
            return Err(ServiceError::InvalidBody {
                endpoint: GENERATE_PATH.to_string(),
                status: reply.status,
            }
            .into());
        }

        if reply.bool_field("success") != Some(true) {
            return Err(ServiceError::GenerationFailure {
                message: reply.str_field("error").unwrap_or("未知错误").to_string(),
            }
            .into());
        }

        let raw = reply.str_field("raw_response").unwrap_or_default();
        if raw.is_empty() {
            let items = reply
                .body
                .get("mcqs")
                .and_then(Value::as_array)
                .filter(|items| !items.is_empty())
                .ok_or_else(|| ServiceError::GenerationFailure {
                    message: "服务端没有返回数据".to_string(),
                })?;
            let records = self.repair.validate_items(items.clone(), request.kind);
            info!(
                "  ✓ 收到预解析结果 {} 条, 有效 {} 条, 耗时 {:.1}s",
                items.len(),
                records.len(),
                started.elapsed().as_secs_f64()
            );
            return Ok(records);
        }

        let receive_time = started.elapsed();
        info!(
            "  📥 收到模型输出 ({} 字符), 耗时 {:.1}s",
            raw.chars().count(),
            receive_time.as_secs_f64()
        );

        let parse_started = Instant::now();
        let records = match self.repair.repair(raw, request.kind) {
            Ok(records) => {
                info!(
                    "  ✓ JSON 解析并过滤完成, 耗时 {}ms",
                    parse_started.elapsed().as_millis()
                );
                records
            }
            Err(e) => {
                warn!("  ❌ {}，本批次返回空结果", e);
                Vec::new()
            }
        };

        let cached = if reply.bool_field("cached") == Some(true) {
            " (服务端缓存)"
        } else {
            ""
        };
        info!(
            "  ✅ 处理完成 {} 条, 总耗时 {:.1}s{} (接收 {:.1}s, 解析 {}ms)",
            records.len(),
            started.elapsed().as_secs_f64(),
            cached,
            receive_time.as_secs_f64(),
            parse_started.elapsed().as_millis()
        );

        Ok(records)
    }

    async fn control_post(&self, path: &str) -> AppResult<HttpReply> {
        let reply = self.executor.post(path, None, self.control_timeout).await?;
        if !reply.is_ok() {
            return Err(Self::status_error(&reply));
        }
        Ok(reply)
    }
}

#[async_trait]
impl GenerationBackend for RequestClient {
    async fn health(&self) -> AppResult<bool> {
        let reply = self.executor.get(HEALTH_PATH, self.control_timeout).await?;
        Ok(reply.is_ok() && reply.bool_field("initialized").unwrap_or(false))
    }

    async fn reset_session(&self) -> AppResult<()> {
        self.control_post(RESET_PATH).await?;
        self.dedup.lock().await.clear();
        info!("✓ 已开启新的会话");
        Ok(())
    }

    async fn pause(&self) -> AppResult<()> {
        let reply = self.control_post(PAUSE_PATH).await?;
        info!(
            "⏸️  服务端已暂停于 {}",
            reply.str_field("pausedAt").unwrap_or("now")
        );
        Ok(())
    }

    async fn resume(&self) -> AppResult<()> {
        let reply = self.control_post(RESUME_PATH).await?;
        let duration = reply
            .body
            .get("pauseDurationSeconds")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        info!("▶️  服务端已恢复 (暂停了 {}s)", duration);
        Ok(())
    }

    async fn is_paused(&self) -> AppResult<bool> {
        let reply = self
            .executor
            .get(PAUSE_STATUS_PATH, self.control_timeout)
            .await?;
        if !reply.is_ok() {
            return Err(Self::status_error(&reply));
        }
        Ok(reply.bool_field("isPaused").unwrap_or(false))
    }

    async fn generate(&self, request: &GenerationRequest<'_>) -> AppResult<Vec<Record>> {
        {
            let mut dedup = self.dedup.lock().await;
            let now = Instant::now();
            if let Some(records) = dedup.lookup(request.text, now) {
                warn!("  ⚠️  5 秒内重复提交相同内容，直接使用上次结果");
                return Ok(records);
            }
            dedup.begin(request.text, now);
        }

        info!(
            "  → 发送请求 ({} 页, 期望 {} 条 {})...",
            request.page_count,
            request.expected_records(),
            request.kind.label()
        );

        let body = json!({
            "text": request.text,
            "section": request.section.as_str(),
            "expected_mcqs": request.expected_records(),
            "content_type": request.kind.wire_name(),
            "dom_delay_seconds": request.dom_delay_seconds,
        });

        let started = Instant::now();
        let reply = self
            .executor
            .post(GENERATE_PATH, Some(&body), self.request_timeout)
            .await?;

        if !reply.is_ok() {
            return Err(Self::status_error(&reply));
        }
        let records = self.interpret_success(&reply, request, started)?;

        self.dedup
            .lock()
            .await
            .store(request.text, Instant::now(), &records);
        Ok(records)
    }
}
