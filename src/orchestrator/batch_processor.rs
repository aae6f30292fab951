//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个流水线的入口，负责批量文档的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **健康检查**：服务未就绪时整个运行直接失败
//! 2. **文档遍历**：按索引顺序处理，跳过断点之前和未选中的文档
//! 3. **断点续传**：批次跳过只作用于本次运行处理的第一个文档
//! 4. **失败隔离**：单个文档失败只计数，继续下一个
//! 5. **全局统计**：汇总结果并发出结束事件
//!
//! ## 设计特点
//!
//! - **单一工作任务**：同一时间最多一个生成请求
//! - **资源所有者**：唯一持有生成服务、输出写入和断点存储的模块
//! - **向下委托**：委托 document_processor 处理单个文档

use crate::clients::GenerationBackend;
use crate::models::document::DocumentOpener;
use crate::models::event::{EventSink, LogLevel, ProgressEvent};
use crate::models::position::ResumePoint;
use crate::orchestrator::control::{ControlHandle, RunControl};
use crate::orchestrator::document_processor::{process_document, DocumentEnv, DocumentOutcome};
use crate::orchestrator::options::RunOptions;
use crate::services::{OutputWriter, StateStore};
use crate::workflow::BatchFlow;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 停止时的结束消息
pub const STOPPED_MESSAGE: &str = "用户已停止处理";

/// 运行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
    /// 初始化失败（服务不可用等）
    Failed(String),
}

/// 运行统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub total_documents: usize,
    pub successful: usize,
    pub failed: usize,
    pub failed_documents: Vec<String>,
    pub records_saved: usize,
}

impl RunSummary {
    fn new(total_documents: usize) -> Self {
        Self {
            outcome: RunOutcome::Completed,
            total_documents,
            successful: 0,
            failed: 0,
            failed_documents: Vec::new(),
            records_saved: 0,
        }
    }
}

/// 批量处理器
pub struct BatchOrchestrator<B: GenerationBackend + ?Sized> {
    backend: Arc<B>,
    opener: Arc<dyn DocumentOpener>,
    writer: OutputWriter,
    state: StateStore,
    options: RunOptions,
    control: RunControl,
    sink: EventSink,
}

impl<B: GenerationBackend + ?Sized> BatchOrchestrator<B> {
    pub fn new(
        backend: Arc<B>,
        opener: Arc<dyn DocumentOpener>,
        writer: OutputWriter,
        state: StateStore,
        options: RunOptions,
    ) -> Self {
        Self {
            backend,
            opener,
            writer,
            state,
            options,
            control: RunControl::new(),
            sink: EventSink::detached(),
        }
    }

    /// 订阅进度事件
    ///
    /// 需要在 [`control_handle`](Self::control_handle) 之前调用，句柄产生的日志才会进入同一事件流
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<ProgressEvent> {
        let (sink, rx) = EventSink::channel();
        self.sink = sink;
        rx
    }

    pub fn control_handle(&self) -> ControlHandle<B> {
        ControlHandle::new(
            self.control.clone(),
            Arc::clone(&self.backend),
            self.sink.clone(),
        )
    }

    /// 执行整个流水线
    pub async fn run(self) -> RunSummary {
        let total = self.options.documents.len();
        let mut summary = RunSummary::new(total);
        let sink = &self.sink;

        sink.separator(LogLevel::Info);
        sink.info(format!("🚀 批量处理: {} 个文档", total));
        sink.separator(LogLevel::Info);

        if let Err(message) = self.check_health().await {
            sink.info("");
            sink.separator(LogLevel::Error);
            sink.error(format!("❌ 批量处理错误: {}", message));
            sink.separator(LogLevel::Error);
            sink.finished(false, message.clone());
            summary.outcome = RunOutcome::Failed(message);
            return summary;
        }

        let mut flow = BatchFlow::new(
            Arc::clone(&self.backend),
            self.options.premium,
            self.options.content_kind,
            self.options.dom_delay_seconds,
        );
        let resume = self.options.resume;
        let mut first_document = true;

        for (i, path) in self.options.documents.iter().enumerate() {
            let index = i + 1;

            if self.control.is_stopped() {
                summary.outcome = RunOutcome::Stopped;
                break;
            }

            if index < resume.document_index {
                sink.info(format!(
                    "⏭️  跳过文档 {}/{} (从 {} 继续)",
                    index, total, resume.document_index
                ));
                continue;
            }

            if !self.options.is_selected(index) {
                continue;
            }

            let start = if first_document {
                resume
            } else {
                ResumePoint::default()
            };
            first_document = false;

            let mut env = DocumentEnv {
                flow: &mut flow,
                opener: self.opener.as_ref(),
                writer: &self.writer,
                state: &self.state,
                control: &self.control,
                options: &self.options,
                sink,
            };

            match process_document(&mut env, path, index, total, start).await {
                Ok(DocumentOutcome::Completed { records_saved }) => {
                    summary.successful += 1;
                    summary.records_saved += records_saved;
                    sink.success(format!("✅ 文档 {}/{} 处理完成", index, total));
                }
                Ok(DocumentOutcome::Stopped { records_saved }) => {
                    summary.records_saved += records_saved;
                    summary.outcome = RunOutcome::Stopped;
                    break;
                }
                Err(e) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    summary.failed += 1;
                    summary.failed_documents.push(name);
                    sink.error(format!("❌ 文档 {}/{} 处理失败: {}", index, total, e));
                }
            }
        }

        if summary.outcome == RunOutcome::Stopped {
            sink.error("❌ 批量处理已被用户停止");
            sink.finished(false, STOPPED_MESSAGE);
        } else {
            log_final_summary(sink, &summary);
            sink.finished(
                true,
                format!(
                    "已处理 {} 个文档: 成功 {}, 失败 {}",
                    total, summary.successful, summary.failed
                ),
            );
        }

        summary
    }

    async fn check_health(&self) -> Result<(), String> {
        match self.backend.health().await {
            Ok(true) => {
                self.sink.success("✓ 生成服务已就绪");
                Ok(())
            }
            Ok(false) => Err("生成服务未运行或未初始化".to_string()),
            Err(e) => Err(format!("生成服务健康检查失败: {}", e)),
        }
    }
}

impl<B: GenerationBackend + ?Sized + 'static> BatchOrchestrator<B> {
    /// 在独立任务中运行，返回任务句柄和事件接收端
    pub fn start(
        mut self,
    ) -> (
        JoinHandle<RunSummary>,
        mpsc::UnboundedReceiver<ProgressEvent>,
        ControlHandle<B>,
    ) {
        let rx = self.events();
        let handle = self.control_handle();
        let task = tokio::spawn(self.run());
        (task, rx, handle)
    }
}

// ========== 日志辅助函数 ==========

fn log_final_summary(sink: &EventSink, summary: &RunSummary) {
    sink.info("");
    sink.separator(LogLevel::Info);
    sink.success("🎉 批量处理完成!");
    sink.separator(LogLevel::Info);
    sink.info("📊 统计:");
    sink.info(format!("   文档总数: {}", summary.total_documents));
    sink.success(format!("   成功: {}", summary.successful));
    let failed_level = if summary.failed > 0 {
        LogLevel::Error
    } else {
        LogLevel::Info
    };
    sink.log(failed_level, format!("   失败: {}", summary.failed));
    if !summary.failed_documents.is_empty() {
        sink.error("   失败的文档:");
        for name in &summary.failed_documents {
            sink.error(format!("     • {}", name));
        }
    }
    sink.info(format!("   已保存记录: {}", summary.records_saved));
    sink.separator(LogLevel::Info);
}
