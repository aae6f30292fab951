//! 生成服务的抽象接口
//!
//! 编排层只依赖这个 trait，真实实现是 [`RequestClient`](super::RequestClient)，测试中替换为脚本化的假服务

use crate::error::AppResult;
use crate::models::batch::Section;
use crate::models::record::{ContentKind, Record};
use async_trait::async_trait;

/// 一次生成请求
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub text: &'a str,
    pub section: Section,
    pub page_count: usize,
    pub kind: ContentKind,
    pub dom_delay_seconds: u64,
}

impl GenerationRequest<'_> {
    /// 期望的记录数量：每页 2 条，只作为提示发给服务端
    pub fn expected_records(&self) -> usize {
        self.page_count * 2
    }
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// 服务是否已就绪
    async fn health(&self) -> AppResult<bool>;

    /// 开启新的会话
    async fn reset_session(&self) -> AppResult<()>;

    async fn pause(&self) -> AppResult<()>;

    async fn resume(&self) -> AppResult<()>;

    /// 服务端是否处于暂停状态
    async fn is_paused(&self) -> AppResult<bool>;

    /// 发送一个批次，返回校验后的记录（可能为空）
    async fn generate(&self, request: &GenerationRequest<'_>) -> AppResult<Vec<Record>>;
}
