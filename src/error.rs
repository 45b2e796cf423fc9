//! 定义了整个 `pansou-rs` 库的错误类型 `PanSouError`。

use thiserror::Error;

/// `pansou-rs` 库的通用错误枚举。
///
/// 按照聚合器的约定，搜索源内部的错误不会越过
/// [`crate::sources::Source::search_safe`] 边界，这里的错误类型
/// 主要在各搜索源内部通过 `?` 传播。
#[derive(Error, Debug)]
pub enum PanSouError {
    /// 网络请求失败 (源自 `reqwest::Error`)
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// JSON 解析失败 (源自 `serde_json::Error`)
    #[error("JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// API 返回错误或空数据
    #[error("API 为 `{0}` 返回了错误或空数据")]
    ApiError(String),

    /// HTML 或文本内容解析失败
    #[error("内容解析失败: {0}")]
    Parser(String),

    /// 签名密钥派生失败
    #[error("签名密钥派生失败: {0}")]
    SignKey(String),

    /// 不支持的搜索源
    #[error("不支持的搜索源: '{0}'")]
    SourceNotSupported(String),

    /// 更通用的网络层错误（重试耗尽等）
    #[error("网络错误: {0}")]
    Network(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// `PanSouError` 的 `Result` 类型别名，方便在函数签名中使用。
pub type Result<T> = std::result::Result<T, PanSouError>;
