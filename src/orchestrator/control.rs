//! 运行控制：停止 / 暂停标志
//!
//! 调用方随时设置标志，工作任务只在批次边界和暂停等待循环中检查

use crate::clients::GenerationBackend;
use crate::models::event::EventSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 停止与暂停标志，可在任务间共享
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.pause.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }

    /// 暂停期间按固定间隔轮询，恢复或停止时返回
    pub async fn wait_while_paused(&self, poll: Duration, sink: &EventSink) {
        let mut announced = false;
        while self.is_paused() && !self.is_stopped() {
            if !announced {
                sink.warning("⏸️  已暂停，等待恢复...");
                announced = true;
            }
            tokio::time::sleep(poll).await;
        }
        if announced && !self.is_stopped() {
            sink.info("▶️  已恢复，继续处理");
        }
    }

    /// 分段等待，期间收到停止请求立即返回
    pub async fn sleep(&self, total: Duration, poll: Duration) {
        let poll = poll.max(Duration::from_millis(1));
        let mut remaining = total;
        while !remaining.is_zero() && !self.is_stopped() {
            let step = remaining.min(poll);
            tokio::time::sleep(step).await;
            remaining = remaining.saturating_sub(step);
        }
    }
}

/// 调用方持有的控制句柄
///
/// 暂停 / 恢复同时通知服务端，使服务端的暂停状态保持一致
pub struct ControlHandle<B: GenerationBackend + ?Sized> {
    control: RunControl,
    backend: Arc<B>,
    sink: EventSink,
}

impl<B: GenerationBackend + ?Sized> Clone for ControlHandle<B> {
    fn clone(&self) -> Self {
        Self {
            control: self.control.clone(),
            backend: Arc::clone(&self.backend),
            sink: self.sink.clone(),
        }
    }
}

impl<B: GenerationBackend + ?Sized> ControlHandle<B> {
    pub fn new(control: RunControl, backend: Arc<B>, sink: EventSink) -> Self {
        Self {
            control,
            backend,
            sink,
        }
    }

    /// 请求停止；正在进行的请求会自然完成
    pub fn stop(&self) {
        self.control.request_stop();
        self.sink.warning("🛑 用户请求停止，当前批次结束后保存并退出...");
    }

    pub async fn pause(&self) {
        self.control.set_paused(true);
        if let Err(e) = self.backend.pause().await {
            self.sink.warning(format!("⚠️  通知服务端暂停失败: {}", e));
        }
        self.sink.warning("⏸️  用户请求暂停...");
    }

    pub async fn resume(&self) {
        self.control.set_paused(false);
        if let Err(e) = self.backend.resume().await {
            self.sink.warning(format!("⚠️  通知服务端恢复失败: {}", e));
        }
        self.sink.info("▶️  继续处理...");
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }
}
