//! 小兔搜（xiaotusoso.com）的 `Source` 实现。
//!
//! 搜索接口要求按请求体计算 `x-sign` 签名，签名密钥埋在站点的
//! Next.js 前端脚本里，需要先抓页面、定位 chunk 脚本、再从
//! `runtimeEnv` 里抠出 `NEXT_PUBLIC_SIGN_KEY`。派生开销大，
//! 密钥按实例缓存一小时；派生失败时本源静默返回空结果即可，
//! 不应阻塞其它源。

use std::{
    sync::LazyLock,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
    error::{PanSouError, Result},
    model::{ChannelInfo, CloudLink, ResultItem, SearchResult},
    sources::{
        Source,
        cache::KeywordCache,
        http::{self, DEFAULT_TIMEOUT},
        text,
    },
};

const BASE_URL: &str = "https://xiaotusoso.com";
const SIGN_KEY_CACHE_KEY: &str = "sign_key";

static RUNTIME_ENV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"runtimeEnv\s*:\s*\{([^}]+)\}").expect("正则无效"));
static SIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"NEXT_PUBLIC_SIGN_KEY["']?\s*:\s*["']([^"']+)["']"#).expect("正则无效")
});

#[derive(Debug, Deserialize)]
struct XiaotusoResponse {
    #[serde(default)]
    result: XiaotusoResult,
}

#[derive(Debug, Deserialize, Default)]
struct XiaotusoResult {
    #[serde(default)]
    list: Vec<XiaotusoItem>,
}

#[derive(Debug, Deserialize)]
struct XiaotusoItem {
    #[serde(default)]
    disk_id: serde_json::Value,
    #[serde(default)]
    disk_name: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    disk_pass: String,
    #[serde(default)]
    shared_time: String,
    #[serde(default)]
    tags: serde_json::Value,
}

/// 小兔搜搜索源。
pub struct Xiaotuso {
    http_client: Client,
    sign_key_cache: KeywordCache<String>,
}

impl Xiaotuso {
    /// 创建一个新的小兔搜搜索源实例。
    pub fn new() -> Result<Self> {
        Ok(Self {
            http_client: http::build_client(DEFAULT_TIMEOUT)?,
            sign_key_cache: KeywordCache::hourly(),
        })
    }

    /// 从搜索页 HTML 中定位承载签名密钥的 chunk 脚本地址。
    fn locate_chunk_script(html: &str) -> Result<String> {
        let doc = Html::parse_document(html);
        let selector = Selector::parse("script[src]")
            .map_err(|e| PanSouError::Parser(format!("选择器无效: {e}")))?;
        doc.select(&selector)
            .filter_map(|el| el.value().attr("src"))
            .find(|src| src.contains("/_next/static/chunks/app/") && src.contains("sopan/page-"))
            .map(|src| format!("{BASE_URL}{src}"))
            .ok_or_else(|| PanSouError::SignKey("未找到目标 script 标签".to_string()))
    }

    /// 从 chunk 脚本源码中提取 `NEXT_PUBLIC_SIGN_KEY`。
    fn extract_sign_key(script: &str) -> Result<String> {
        let env_block = RUNTIME_ENV_RE
            .captures(script)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| PanSouError::SignKey("未找到 runtimeEnv 结构体".to_string()))?;
        SIGN_KEY_RE
            .captures(&env_block)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| PanSouError::SignKey("未找到 NEXT_PUBLIC_SIGN_KEY".to_string()))
    }

    /// 派生签名密钥，命中实例缓存则直接返回。
    async fn resolve_sign_key(&self, keyword: &str) -> Result<String> {
        if let Some(key) = self.sign_key_cache.get(SIGN_KEY_CACHE_KEY) {
            return Ok(key);
        }
        let page_url = format!("{BASE_URL}/sopan?q={}", urlencoding::encode(keyword));
        let resp = http::send_with_retry("xiaotuso", || {
            self.http_client
                .get(&page_url)
                .header("referer", &page_url)
                .send()
        })
        .await?;
        let html = http::ensure_success("xiaotuso", resp)?.text().await?;
        let script_url = Self::locate_chunk_script(&html)?;

        let resp = http::send_with_retry("xiaotuso", || {
            self.http_client
                .get(&script_url)
                .header("referer", &page_url)
                .send()
        })
        .await?;
        let script = http::ensure_success("xiaotuso", resp)?.text().await?;
        let sign_key = Self::extract_sign_key(&script)?;
        debug!("[xiaotuso] 签名密钥派生成功");
        self.sign_key_cache.insert(SIGN_KEY_CACHE_KEY, sign_key.clone());
        Ok(sign_key)
    }

    /// 按 key 升序拼接 `key=value`，再接 timestamp 与 app_key，取 SHA-256 十六进制。
    fn build_sign(params: &[(&str, String)], timestamp: &str, app_key: &str) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let full = format!("{joined}&timestamp={timestamp}&app_key={app_key}");
        format!("{:x}", Sha256::digest(full.as_bytes()))
    }

    /// 百度盘等平台的提取码需要拼回链接里。
    fn build_link(item: &XiaotusoItem) -> String {
        if !item.disk_pass.is_empty()
            && item.link.contains("baidu.com")
            && !item.link.contains("pwd=")
        {
            format!("{}?pwd={}", item.link, item.disk_pass)
        } else {
            item.link.clone()
        }
    }

    fn to_item(item: &XiaotusoItem) -> ResultItem {
        let message_id = match &item.disk_id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        let tags = match &item.tags {
            serde_json::Value::Array(values) => values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        let title = text::clean_html(&item.disk_name);
        let mut link = CloudLink::from_url(Self::build_link(item));
        // 分类以原始链接为准，拼接提取码不应影响识别结果
        link.cloud_type = crate::model::CloudType::from_url(&item.link);
        ResultItem {
            message_id,
            title: title.clone(),
            pub_date: item.shared_time.clone(),
            content: title,
            cloud_links: vec![link],
            tags,
            channel: "小兔搜".to_string(),
            channel_id: "xiaotuso".to_string(),
            ..Default::default()
        }
    }

    fn timestamp_millis() -> Result<String> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().to_string())
            .map_err(|e| PanSouError::Internal(format!("系统时间早于 UNIX 纪元: {e}")))
    }
}

#[async_trait]
impl Source for Xiaotuso {
    fn name(&self) -> &str {
        "xiaotuso"
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("xiaotuso", "小兔搜", 1002)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let sign_key = self.resolve_sign_key(keyword).await?;
        let timestamp = Self::timestamp_millis()?;
        let sign_params = [
            ("page", "1".to_string()),
            ("size", "20".to_string()),
            ("q", keyword.to_string()),
            ("type", "ALL".to_string()),
            ("share_time", "ALL".to_string()),
            ("format", String::new()),
            ("mode", "common".to_string()),
            ("gateway", "G1".to_string()),
        ];
        let x_sign = Self::build_sign(&sign_params, &timestamp, &sign_key);

        let payload = json!({
            "page": 1,
            "size": 20,
            "q": keyword,
            "type": "ALL",
            "share_time": "ALL",
            "format": "",
            "mode": "common",
            "gateway": "G1",
        });
        let referer = format!("{BASE_URL}/sopan?q={}", urlencoding::encode(keyword));
        let url = format!("{BASE_URL}/api/extra/disk/search");
        let resp = http::send_with_retry("xiaotuso", || {
            self.http_client
                .post(&url)
                .header("origin", BASE_URL)
                .header("referer", &referer)
                .header("x-sign", &x_sign)
                .header("x-timestamp", &timestamp)
                .json(&payload)
                .send()
        })
        .await?;
        let resp = http::ensure_success("xiaotuso", resp)?;
        let body: XiaotusoResponse = resp.json().await?;

        let list = body.result.list.iter().map(Self::to_item).collect();
        Ok(SearchResult::new(self.channel_info(), list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_chunk_script() {
        let html = r#"<html><head>
            <script src="/_next/static/chunks/framework-abc.js"></script>
            <script src="/_next/static/chunks/app/sopan/page-123abc.js"></script>
        </head></html>"#;
        let url = Xiaotuso::locate_chunk_script(html).unwrap();
        assert_eq!(
            url,
            "https://xiaotusoso.com/_next/static/chunks/app/sopan/page-123abc.js"
        );
    }

    #[test]
    fn test_extract_sign_key() {
        let script = r#"x={runtimeEnv:{NEXT_PUBLIC_API:"/api",NEXT_PUBLIC_SIGN_KEY:"s3cr3t-key"}}"#;
        assert_eq!(Xiaotuso::extract_sign_key(script).unwrap(), "s3cr3t-key");
        assert!(Xiaotuso::extract_sign_key("没有密钥").is_err());
    }

    /// 签名串固定为 key 升序 + timestamp + app_key 的 SHA-256。
    #[test]
    fn test_build_sign_is_order_insensitive() {
        let params_a = [("b", "2".to_string()), ("a", "1".to_string())];
        let params_b = [("a", "1".to_string()), ("b", "2".to_string())];
        let sign_a = Xiaotuso::build_sign(&params_a, "1000", "key");
        let sign_b = Xiaotuso::build_sign(&params_b, "1000", "key");
        assert_eq!(sign_a, sign_b);

        let expected = format!("{:x}", Sha256::digest(b"a=1&b=2&timestamp=1000&app_key=key"));
        assert_eq!(sign_a, expected);
    }

    #[test]
    fn test_build_link_appends_baidu_password() {
        let item = XiaotusoItem {
            disk_id: serde_json::Value::Null,
            disk_name: String::new(),
            link: "https://pan.baidu.com/s/abc".into(),
            disk_pass: "1234".into(),
            shared_time: String::new(),
            tags: serde_json::Value::Null,
        };
        assert_eq!(
            Xiaotuso::build_link(&item),
            "https://pan.baidu.com/s/abc?pwd=1234"
        );
    }
}
