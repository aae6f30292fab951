use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 生成服务相关错误
    Service(ServiceError),
    /// 文档打开/读取错误
    Document(DocumentError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Service(e) => write!(f, "服务错误: {}", e),
            AppError::Document(e) => write!(f, "文档错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Service(e) => Some(e),
            AppError::Document(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

/// 503 响应中的子错误码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// 服务端尚未完成初始化（未登录）
    NotInitialized,
    /// 服务端处于暂停状态
    Paused,
    /// 其他未知代码
    Other(String),
}

impl UnavailableReason {
    /// 从响应体中的 `code` 字段解析
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("NOT_INITIALIZED") => UnavailableReason::NotInitialized,
            Some("PAUSED") => UnavailableReason::Paused,
            Some(other) => UnavailableReason::Other(other.to_string()),
            None => UnavailableReason::Other("UNKNOWN".to_string()),
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NotInitialized => write!(f, "服务未初始化，请启动服务并完成登录"),
            UnavailableReason::Paused => write!(f, "服务已暂停，请恢复后继续"),
            UnavailableReason::Other(code) => write!(f, "不可用 (code: {})", code),
        }
    }
}

/// 生成服务错误
///
/// 所有变体对于单个批次都是致命的，但不会自动重试
#[derive(Debug)]
pub enum ServiceError {
    /// 200 但 `success=false`
    GenerationFailure { message: String },
    /// 503
    Unavailable {
        reason: UnavailableReason,
        message: Option<String>,
    },
    /// 504
    Timeout { message: Option<String> },
    /// 其他非 200 状态码
    BadStatus { status: u16, message: Option<String> },
    /// 连接失败或请求超时
    Transport {
        endpoint: String,
        timed_out: bool,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 响应体无法解析
    InvalidBody { endpoint: String, status: u16 },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::GenerationFailure { message } => write!(f, "生成失败: {}", message),
            ServiceError::Unavailable { reason, message } => match message {
                Some(msg) => write!(f, "服务不可用: {} ({})", reason, msg),
                None => write!(f, "服务不可用: {}", reason),
            },
            ServiceError::Timeout { message } => write!(
                f,
                "服务端超时: {}",
                message.as_deref().unwrap_or("请求耗时过长")
            ),
            ServiceError::BadStatus { status, message } => write!(
                f,
                "服务端错误 ({}): {}",
                status,
                message.as_deref().unwrap_or("未知错误")
            ),
            ServiceError::Transport {
                endpoint,
                timed_out,
                source,
            } => {
                if *timed_out {
                    write!(f, "请求超时 ({}): {}", endpoint, source)
                } else {
                    write!(f, "无法连接到服务 ({}): {}", endpoint, source)
                }
            }
            ServiceError::InvalidBody { endpoint, status } => {
                write!(f, "服务返回了无效的 JSON ({}, 状态码 {})", endpoint, status)
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Transport { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文档错误
#[derive(Debug)]
pub enum DocumentError {
    /// 打开文档失败
    OpenFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 文档没有任何页面
    Empty { path: String },
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::OpenFailed { path, source } => {
                write!(f, "无法打开文档 ({}): {}", path, source)
            }
            DocumentError::Empty { path } => write!(f, "文档没有任何页面: {}", path),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::OpenFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 删除文件失败
    DeleteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON / TOML 解析失败
    ParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::DeleteFailed { path, source } => {
                write!(f, "删除文件失败 ({}): {}", path, source)
            }
            FileError::ParseFailed { path, source } => {
                write!(f, "解析文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::DeleteFailed { source, .. }
            | FileError::ParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置值非法
    InvalidValue { field: String, value: String },
    /// 文档选择字符串无法解析
    InvalidSelection { selection: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { field, value } => {
                write!(f, "配置项 {} 的值 '{}' 非法", field, value)
            }
            ConfigError::InvalidSelection { selection } => {
                write!(f, "无法解析文档选择: '{}'", selection)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        AppError::Document(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::File(FileError::ParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::ParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建传输层错误（连接失败 / 超时）
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let timed_out = source.is_timeout();
        AppError::Service(ServiceError::Transport {
            endpoint: endpoint.into(),
            timed_out,
            source: Box::new(source),
        })
    }

    /// 创建文档打开错误
    pub fn document_open_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Document(DocumentError::OpenFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件解析错误
    pub fn file_parse_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ParseFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 是否为传输层失败
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Service(ServiceError::Transport { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
