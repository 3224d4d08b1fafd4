//! Ingestion 错误类型

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
///
/// 仅用于 connector 的构造阶段；运行期错误统一使用 `ContractError`。
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 端点地址不合法
    #[error("invalid endpoint '{url}': {message}")]
    InvalidEndpoint {
        /// 端点地址
        url: String,
        /// 错误消息
        message: String,
    },

    /// HTTP 客户端构造失败
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// 契约层错误
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl IngestionError {
    pub(crate) fn invalid_endpoint(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;

/// 校验端点 scheme
pub(crate) fn require_scheme(url: &str, allowed: &[&str]) -> Result<()> {
    let scheme = url
        .split_once("://")
        .map(|(scheme, _)| scheme.to_ascii_lowercase());

    match scheme {
        Some(s) if allowed.contains(&s.as_str()) => Ok(()),
        _ => Err(IngestionError::invalid_endpoint(
            url,
            format!("expected scheme {allowed:?}"),
        )),
    }
}
