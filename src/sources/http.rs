//! 各搜索源共用的 HTTP 工具。
//!
//! 统一的客户端构造与「传输层错误指数退避重试」策略：
//! 最多 3 次尝试，退避从 200ms 起倍增，并附加少量随机抖动。
//! 非 200 状态与 JSON 解析失败视为请求失败，由调用方决定是否重试。

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::warn;

use crate::error::{PanSouError, Result};

/// 默认的单次 HTTP 请求超时。
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// 传输层错误的最大尝试次数。
pub const MAX_ATTEMPTS: u32 = 3;

/// 浏览器 User-Agent，大部分站点要求带上。
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// 构造带统一超时与 UA 的 HTTP 客户端。
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .map_err(PanSouError::from)
}

/// 执行请求，传输层错误按指数退避重试。
///
/// `attempt` 每次调用都要构造一个全新的请求（`RequestBuilder` 不可
/// 复用），`what` 仅用于日志标注。
pub async fn send_with_retry<F, Fut>(what: &str, mut attempt: F) -> Result<Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = reqwest::Result<Response>>,
{
    let mut backoff = Duration::from_millis(200);
    let mut last_err: Option<reqwest::Error> = None;

    for round in 1..=MAX_ATTEMPTS {
        match attempt().await {
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                warn!("[{what}] 第 {round} 次请求失败: {e}");
                last_err = Some(e);
                if round < MAX_ATTEMPTS {
                    let jitter = Duration::from_millis(rand::random_range(0..50));
                    tokio::time::sleep(backoff + jitter).await;
                    backoff *= 2;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(PanSouError::Network(format!(
        "{what} 重试 {MAX_ATTEMPTS} 次后仍然失败: {}",
        last_err.map_or_else(|| "未知错误".to_string(), |e| e.to_string())
    )))
}

/// 检查响应状态码，非 2xx 统一折算为 `ApiError`。
pub fn ensure_success(what: &str, resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(PanSouError::ApiError(format!(
            "{what} 返回状态码 {}",
            resp.status()
        )))
    }
}
