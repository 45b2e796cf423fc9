//! pansearch.me 的 `Source` 实现。
//!
//! 两段式：先从首页 HTML 中提取 Next.js 的 `buildId`，再请求
//! 对应版本的数据端点。结果里的链接和提取码都埋在一段 HTML
//! 富文本中，用正则抠出来。

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{PanSouError, Result},
    model::{ChannelInfo, ResultItem, SearchResult},
    sources::{
        Source,
        http::{self, DEFAULT_TIMEOUT},
        text,
    },
};

const WEBSITE_URL: &str = "https://www.pansearch.me/search";

static BUILD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""buildId":"([^"]+)""#).expect("正则无效"));
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("正则无效"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"名称：([^\n<]+)").expect("正则无效"));

#[derive(Debug, Deserialize)]
struct PansearchResponse {
    #[serde(rename = "pageProps", default)]
    page_props: PageProps,
}

#[derive(Debug, Deserialize, Default)]
struct PageProps {
    #[serde(default)]
    data: PageData,
}

#[derive(Debug, Deserialize, Default)]
struct PageData {
    #[serde(default)]
    data: Vec<PansearchItem>,
}

#[derive(Debug, Deserialize)]
struct PansearchItem {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    content: String,
    #[serde(default)]
    time: String,
}

/// pansearch 搜索源。
pub struct Pansearch {
    http_client: Client,
}

impl Pansearch {
    /// 创建一个新的 pansearch 搜索源实例。
    pub fn new() -> Result<Self> {
        Ok(Self {
            http_client: http::build_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// 从首页 HTML 提取 buildId。
    async fn get_build_id(&self) -> Result<String> {
        let resp = http::send_with_retry("pansearch", || {
            self.http_client
                .get(WEBSITE_URL)
                .header("referer", "https://www.pansearch.me/")
                .send()
        })
        .await?;
        let resp = http::ensure_success("pansearch", resp)?;
        let html = resp.text().await?;
        BUILD_ID_RE
            .captures(&html)
            .map(|caps| caps[1].to_string())
            .ok_or_else(|| PanSouError::Parser("未能从首页提取 buildId".to_string()))
    }

    fn to_item(raw: &PansearchItem, keyword: &str) -> ResultItem {
        let link = HREF_RE
            .captures(&raw.content)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();
        let cloud_links = if link.is_empty() {
            Vec::new()
        } else {
            vec![text::link_with_context_password(&link, &raw.content)]
        };
        let title = TITLE_RE
            .captures(&raw.content)
            .map(|caps| text::clean_html(&caps[1]))
            .unwrap_or_else(|| keyword.to_string());
        let id = match &raw.id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        ResultItem {
            message_id: format!("pansearch-{id}"),
            title,
            pub_date: raw.time.clone(),
            content: raw.content.clone(),
            cloud_links,
            channel: "pansearch".to_string(),
            channel_id: "pansearch".to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Source for Pansearch {
    fn name(&self) -> &str {
        "pansearch"
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("pansearch", "pansearch", 1011)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let build_id = self.get_build_id().await?;
        let api_url = format!("https://www.pansearch.me/_next/data/{build_id}/search.json");
        let resp = http::send_with_retry("pansearch", || {
            self.http_client
                .get(&api_url)
                .query(&[("keyword", keyword), ("offset", "0")])
                .header("referer", "https://www.pansearch.me/")
                .send()
        })
        .await?;
        let resp = http::ensure_success("pansearch", resp)?;
        let body: PansearchResponse = resp.json().await?;

        let list = body
            .page_props
            .data
            .data
            .iter()
            .map(|item| Self::to_item(item, keyword))
            .collect();
        Ok(SearchResult::new(self.channel_info(), list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CloudType;

    #[test]
    fn test_build_id_regex() {
        let html = r#"<script>{"props":{},"buildId":"kXyZ123","page":"/search"}</script>"#;
        let caps = BUILD_ID_RE.captures(html).unwrap();
        assert_eq!(&caps[1], "kXyZ123");
    }

    #[test]
    fn test_to_item_extracts_link_password_title() {
        let raw = PansearchItem {
            id: serde_json::json!(9),
            content: "名称：流浪地球<br>链接：<a href=\"https://pan.baidu.com/s/abc?pwd=1234\">点我</a>"
                .to_string(),
            time: "2024-06-01T00:00:00Z".to_string(),
        };
        let item = Pansearch::to_item(&raw, "流浪地球");
        assert_eq!(item.message_id, "pansearch-9");
        assert_eq!(item.title, "流浪地球");
        assert_eq!(item.cloud_links.len(), 1);
        assert_eq!(item.cloud_links[0].cloud_type, CloudType::Baidu);
        assert_eq!(item.cloud_links[0].password.as_deref(), Some("1234"));
    }

    #[test]
    fn test_to_item_falls_back_to_keyword_title() {
        let raw = PansearchItem {
            id: serde_json::Value::Null,
            content: "没有名称字段".to_string(),
            time: String::new(),
        };
        let item = Pansearch::to_item(&raw, "关键词");
        assert_eq!(item.title, "关键词");
        assert!(item.cloud_links.is_empty());
    }
}
