//! 进度事件
//!
//! 工作任务通过单向、有序的事件流向调用方汇报日志、进度、断点和结束状态

use crate::models::position::ProcessingPosition;
use std::fmt;
use tokio::sync::mpsc;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Log { message: String, level: LogLevel },
    /// 当前文档内的批次进度
    Progress { current: usize, total: usize },
    CurrentDocument { name: String, index: usize, total: usize },
    Position(ProcessingPosition),
    Finished { success: bool, message: String },
}

/// 事件发送端
///
/// 每条日志同时写入 tracing；接收端已关闭时静默丢弃事件
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl EventSink {
    /// 创建发送端和接收端
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// 只写 tracing 的发送端
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
        }
        self.emit(ProgressEvent::Log { message, level });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// 分隔线
    pub fn separator(&self, level: LogLevel) {
        self.log(level, "=".repeat(60));
    }

    pub fn progress(&self, current: usize, total: usize) {
        self.emit(ProgressEvent::Progress { current, total });
    }

    pub fn current_document(&self, name: impl Into<String>, index: usize, total: usize) {
        self.emit(ProgressEvent::CurrentDocument {
            name: name.into(),
            index,
            total,
        });
    }

    pub fn position(&self, position: ProcessingPosition) {
        self.emit(ProgressEvent::Position(position));
    }

    pub fn finished(&self, success: bool, message: impl Into<String>) {
        self.emit(ProgressEvent::Finished {
            success,
            message: message.into(),
        });
    }
}
