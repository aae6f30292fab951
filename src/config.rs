use crate::error::{AppError, AppResult, ConfigError};
use crate::models::batch::Section;
use crate::models::record::ContentKind;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 生成服务 ---
    pub server_url: String,
    /// 生成请求超时（秒）
    pub request_timeout_secs: u64,
    /// 健康检查、暂停等控制请求的超时（秒）
    pub control_timeout_secs: u64,
    // --- 输入 ---
    /// 待处理文档所在目录
    pub document_folder: String,
    /// 文档选择，如 "1,3-5"；空表示全部
    pub document_selection: String,
    pub sections: Vec<Section>,
    pub pages_per_batch: usize,
    /// 期中部分占前一半页面的百分比
    pub mids_percentage: u32,
    // --- 节奏 ---
    /// 两次请求之间的间隔（秒）
    pub delay_seconds: f64,
    /// 服务端等待页面稳定的时间（秒，1-15）
    pub dom_delay_seconds: u64,
    /// 高级模型每 10 次请求重置会话，否则每 20 次
    pub premium_model: bool,
    pub content_kind: ContentKind,
    pub pause_poll_interval_ms: u64,
    // --- 输出与状态 ---
    pub state_file: String,
    /// 按科目整理的输出目录；为空时输出到源文档旁边
    pub organized_output_dir: Option<String>,
    /// 是否从上次的断点继续
    pub resume_from_state: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:3000".to_string(),
            request_timeout_secs: 300,
            control_timeout_secs: 10,
            document_folder: "documents".to_string(),
            document_selection: String::new(),
            sections: Section::ALL.to_vec(),
            pages_per_batch: 5,
            mids_percentage: 95,
            delay_seconds: 12.0,
            dom_delay_seconds: 1,
            premium_model: false,
            content_kind: ContentKind::Mcq,
            pause_poll_interval_ms: 1000,
            state_file: crate::services::state_store::DEFAULT_STATE_FILE.to_string(),
            organized_output_dir: None,
            resume_from_state: false,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_sections(value: &str) -> Option<Vec<Section>> {
    let sections: Vec<Section> = value
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(Section::parse)
        .collect::<Option<_>>()?;
    (!sections.is_empty()).then_some(sections)
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// 读取 TOML 配置文件，缺省字段取默认值，再用环境变量覆盖
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config.merge_env())
    }

    fn merge_env(self) -> Self {
        let base = self;
        Self {
            server_url: std::env::var("SERVER_URL").unwrap_or(base.server_url),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(base.request_timeout_secs),
            control_timeout_secs: env_parse("CONTROL_TIMEOUT_SECS").unwrap_or(base.control_timeout_secs),
            document_folder: std::env::var("DOCUMENT_FOLDER").unwrap_or(base.document_folder),
            document_selection: std::env::var("DOCUMENT_SELECTION").unwrap_or(base.document_selection),
            sections: std::env::var("SECTIONS").ok().and_then(|v| parse_sections(&v)).unwrap_or(base.sections),
            pages_per_batch: env_parse("PAGES_PER_BATCH").unwrap_or(base.pages_per_batch),
            mids_percentage: env_parse("MIDS_PERCENTAGE").unwrap_or(base.mids_percentage),
            delay_seconds: env_parse("DELAY_SECONDS").unwrap_or(base.delay_seconds),
            dom_delay_seconds: env_parse("DOM_DELAY_SECONDS").unwrap_or(base.dom_delay_seconds),
            premium_model: env_parse("PREMIUM_MODEL").unwrap_or(base.premium_model),
            content_kind: std::env::var("CONTENT_KIND").ok().and_then(|v| ContentKind::parse(&v)).unwrap_or(base.content_kind),
            pause_poll_interval_ms: env_parse("PAUSE_POLL_INTERVAL_MS").unwrap_or(base.pause_poll_interval_ms),
            state_file: std::env::var("STATE_FILE").unwrap_or(base.state_file),
            organized_output_dir: std::env::var("ORGANIZED_OUTPUT_DIR").ok().filter(|v| !v.trim().is_empty()).or(base.organized_output_dir),
            resume_from_state: env_parse("RESUME_FROM_STATE").unwrap_or(base.resume_from_state),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(base.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(base.output_log_file),
        }
    }

    /// 检查取值范围
    pub fn validate(&self) -> AppResult<()> {
        let invalid = |field: &str, value: String| {
            Err(AppError::Config(ConfigError::InvalidValue {
                field: field.to_string(),
                value,
            }))
        };

        if self.pages_per_batch == 0 {
            return invalid("pages_per_batch", self.pages_per_batch.to_string());
        }
        if !(1..=100).contains(&self.mids_percentage) {
            return invalid("mids_percentage", self.mids_percentage.to_string());
        }
        if !(1..=15).contains(&self.dom_delay_seconds) {
            return invalid("dom_delay_seconds", self.dom_delay_seconds.to_string());
        }
        if !self.delay_seconds.is_finite() || self.delay_seconds < 0.0 {
            return invalid("delay_seconds", self.delay_seconds.to_string());
        }
        if self.sections.is_empty() {
            return invalid("sections", "[]".to_string());
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs", "0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_toml_with_partial_fields() {
        let config: Config = toml::from_str(
            r#"
            server_url = "http://10.0.0.2:3000"
            sections = ["finals"]
            content_kind = "short_notes"
            premium_model = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://10.0.0.2:3000");
        assert_eq!(config.sections, vec![Section::Finals]);
        assert_eq!(config.content_kind, ContentKind::ShortNote);
        assert!(config.premium_model);
        assert_eq!(config.pages_per_batch, 5);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = Config {
            dom_delay_seconds: 20,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::Config(ConfigError::InvalidValue { .. }))
        ));

        let config = Config {
            sections: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_sections() {
        assert_eq!(
            parse_sections("mids, finals"),
            Some(vec![Section::Mids, Section::Finals])
        );
        assert_eq!(parse_sections("mids,unknown"), None);
        assert_eq!(parse_sections(""), None);
    }
}
