//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 HTTP 连接池和服务地址，只暴露"发请求、拿 JSON"的能力

use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// 一次请求的结果：状态码 + 响应体
///
/// 响应体不是 JSON 时为 `Null`，由上层决定如何处理
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: JsonValue,
}

impl HttpReply {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// 读取字符串字段
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(JsonValue::as_str)
    }

    /// 读取布尔字段
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.body.get(key).and_then(JsonValue::as_bool)
    }
}

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 Client
/// - 拼接端点地址，设置单次请求超时
/// - 不认识生成 / 暂停等业务含义
pub struct HttpExecutor {
    client: Client,
    base_url: String,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::transport("client", e))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 端点完整地址
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET 请求
    pub async fn get(&self, path: &str, timeout: Duration) -> AppResult<HttpReply> {
        let request = self.client.get(self.endpoint(path)).timeout(timeout);
        self.send(path, request).await
    }

    /// POST 请求，`body` 为空时发送空 JSON 对象
    pub async fn post(
        &self,
        path: &str,
        body: Option<&JsonValue>,
        timeout: Duration,
    ) -> AppResult<HttpReply> {
        let empty = JsonValue::Object(Default::default());
        let request = self
            .client
            .post(self.endpoint(path))
            .json(body.unwrap_or(&empty))
            .timeout(timeout);
        self.send(path, request).await
    }

    async fn send(&self, path: &str, request: reqwest::RequestBuilder) -> AppResult<HttpReply> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::transport(path, e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::transport(path, e))?;
        let body = serde_json::from_str(&text).unwrap_or(JsonValue::Null);

        tracing::debug!("HTTP {} -> {} ({} 字节)", path, status, text.len());
        Ok(HttpReply { status, body })
    }
}
