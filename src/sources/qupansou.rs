//! 趣盘搜（funletu.com）的 `Source` 实现。
//!
//! 结果按关键词缓存一小时，缓存到期整体清空，见
//! [`crate::sources::cache::KeywordCache`]。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    error::{PanSouError, Result},
    model::{ChannelInfo, CloudLink, ResultItem, SearchResult},
    sources::{Source, cache::KeywordCache, http, text},
};

const API_URL: &str = "https://v.funletu.com/search";
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(6);

#[derive(Debug, Deserialize)]
struct QupansouResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Vec<QupansouItem>,
}

#[derive(Debug, Deserialize)]
struct QupansouItem {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    updatetime: String,
    #[serde(default)]
    createtime: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    filetype: String,
    #[serde(default)]
    size: String,
}

/// 趣盘搜搜索源。
pub struct Qupansou {
    http_client: Client,
    cache: KeywordCache<Vec<ResultItem>>,
}

impl Qupansou {
    /// 创建一个新的趣盘搜搜索源实例。
    pub fn new() -> Result<Self> {
        Ok(Self {
            http_client: http::build_client(TIMEOUT)?,
            cache: KeywordCache::hourly(),
        })
    }

    fn convert(items: Vec<QupansouItem>) -> Vec<ResultItem> {
        items
            .into_iter()
            .filter_map(|item| {
                let url = if item.url.is_empty() {
                    item.link.clone()
                } else {
                    item.url.clone()
                };
                if url.is_empty() {
                    return None;
                }
                let pub_date = if item.updatetime.is_empty() {
                    item.createtime.clone()
                } else {
                    item.updatetime.clone()
                };
                let id = match &item.id {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                Some(ResultItem {
                    message_id: format!("qupansou-{id}"),
                    title: text::clean_html(&item.title),
                    pub_date,
                    content: format!(
                        "类别: {}, 文件类型: {}, 大小: {}",
                        item.category, item.filetype, item.size
                    ),
                    cloud_links: vec![CloudLink::from_url(url)],
                    channel: "趣盘搜".to_string(),
                    channel_id: "qupansou".to_string(),
                    ..Default::default()
                })
            })
            .collect()
    }

    async fn search_api(&self, keyword: &str) -> Result<Vec<QupansouItem>> {
        let payload = json!({
            "style": "get",
            "datasrc": "search",
            "query": {
                "id": "",
                "datetime": "",
                "courseid": 1,
                "categoryid": "",
                "filetypeid": "",
                "filetype": "",
                "reportid": "",
                "validid": "",
                "searchtext": keyword,
            },
            "page": { "pageSize": 1000, "pageIndex": 1 },
            "order": { "prop": "sort", "order": "desc" },
            "message": "请求资源列表数据",
        });
        let resp = http::send_with_retry("qupansou", || {
            self.http_client
                .post(API_URL)
                .header("referer", "https://pan.funletu.com/")
                .json(&payload)
                .send()
        })
        .await?;
        let resp = http::ensure_success("qupansou", resp)?;
        let body: QupansouResponse = resp.json().await?;
        if body.status != 200 {
            return Err(PanSouError::ApiError(format!(
                "qupansou status: {} message: {}",
                body.status, body.message
            )));
        }
        Ok(body.data)
    }
}

#[async_trait]
impl Source for Qupansou {
    fn name(&self) -> &str {
        "qupansou"
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("qupansou", "趣盘搜", 1021)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let cache_key = keyword.trim();
        if let Some(cached) = self.cache.get(cache_key) {
            debug!("[qupansou] 缓存命中: {cache_key}");
            return Ok(SearchResult::new(self.channel_info(), cached));
        }

        let items = self.search_api(keyword).await?;
        let list = Self::convert(items);
        self.cache.insert(cache_key, list.clone());
        Ok(SearchResult::new(self.channel_info(), list))
    }
}
