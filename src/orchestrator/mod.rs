//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量文档处理器
//! - 健康检查、文档遍历、断点续传
//! - 失败文档计数，输出全局统计
//! - 在独立任务中运行，通过事件流汇报进度
//!
//! ### `document_processor` - 单个文档处理器
//! - 遍历部分和批次，调用 BatchFlow
//! - 保存断点、控制请求节奏
//! - 写出部分结果，停止时自动保存
//!
//! ### `control` - 停止 / 暂停标志
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<文档>)
//!     ↓
//! document_processor (处理 Vec<Batch>)
//!     ↓
//! workflow::BatchFlow (处理单个 Batch)
//!     ↓
//! clients / services (生成服务 / 修复 / 输出 / 断点)
//!     ↓
//! infrastructure (基础设施：HttpExecutor)
//! ```

pub mod batch_processor;
pub mod control;
pub mod document_processor;
pub mod options;

// 重新导出主要类型
pub use batch_processor::{BatchOrchestrator, RunOutcome, RunSummary, STOPPED_MESSAGE};
pub use control::{ControlHandle, RunControl};
pub use document_processor::DocumentOutcome;
pub use options::RunOptions;
