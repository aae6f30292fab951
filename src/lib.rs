//! # Batch MCQ Extract
//!
//! 把长文档按页切分成批次，逐批发送给外部生成服务，
//! 再把服务返回的、经常不合法的 JSON 修复成经过校验的选择题 / 简答笔记
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 连接池），只暴露能力
//! - `HttpExecutor` - 唯一的 Client owner，提供 get / post 能力
//!
//! ### ② 业务能力层（Clients / Services）
//! - `clients/` - 生成服务接口 `GenerationBackend` 及其 HTTP 实现 `RequestClient`
//! - `RepairEngine` - 五级修复 + 记录校验
//! - `StateStore` - 断点保存 / 读取
//! - `OutputWriter` - 按科目整理输出目录，写 JSON
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个批次"的完整处理流程
//! - `BatchCtx` - 上下文封装（文档 + 部分 + 批次号）
//! - `BatchFlow` - 流程编排（会话重置 → 生成 → 计数）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量文档处理器，健康检查、断点续传、统计
//! - `orchestrator/document_processor` - 单个文档处理器，遍历部分和批次
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{GenerationBackend, GenerationRequest, RequestClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::HttpExecutor;
pub use models::{ContentKind, EventSink, ProgressEvent, Record, Section};
pub use orchestrator::{BatchOrchestrator, ControlHandle, RunOptions, RunOutcome, RunSummary};
pub use services::{OutputWriter, RepairEngine, StateStore};
pub use workflow::{BatchCtx, BatchFlow};
