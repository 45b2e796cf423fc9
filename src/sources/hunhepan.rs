//! 混合盘（hunhepan.com 及其镜像站）的 `Source` 实现。
//!
//! 同一查询并发打向三个同构接口，合并后按 `doc_id` 去重
//! （缺失时退化为 链接+标题 组合键）。

use async_trait::async_trait;
use futures::future;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{
    error::Result,
    model::{ChannelInfo, CloudLink, ResultItem, SearchResult},
    sources::{
        Source,
        http::{self, DEFAULT_TIMEOUT},
    },
};

/// (接口名, 搜索接口, referer)
const API_LIST: [(&str, &str, &str); 3] = [
    (
        "hunhepan",
        "https://hunhepan.com/open/search/disk",
        "https://hunhepan.com/search",
    ),
    (
        "qkpanso",
        "https://qkpanso.com/v1/search/disk",
        "https://qkpanso.com/search",
    ),
    (
        "kuake8",
        "https://kuake8.com/v1/search/disk",
        "https://kuake8.com/search",
    ),
];

#[derive(Debug, Deserialize)]
struct DiskResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: DiskData,
}

#[derive(Debug, Deserialize, Default)]
struct DiskData {
    #[serde(default)]
    list: Vec<DiskItem>,
}

#[derive(Debug, Deserialize, Clone)]
struct DiskItem {
    #[serde(default)]
    doc_id: String,
    #[serde(default)]
    disk_name: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    shared_time: String,
    #[serde(default)]
    files: String,
}

impl DiskItem {
    fn dedup_key(&self) -> String {
        if self.doc_id.is_empty() {
            format!("{}|{}", self.link, self.disk_name)
        } else {
            self.doc_id.clone()
        }
    }
}

/// 混合盘搜索源。
pub struct Hunhepan {
    http_client: Client,
}

impl Hunhepan {
    /// 创建一个新的混合盘搜索源实例。
    pub fn new() -> Result<Self> {
        Ok(Self {
            http_client: http::build_client(DEFAULT_TIMEOUT)?,
        })
    }

    async fn fetch_one(&self, api_name: &str, api_url: &str, referer: &str, keyword: &str) -> Result<Vec<DiskItem>> {
        let payload = json!({
            "q": keyword,
            "exact": true,
            "page": 1,
            "size": 30,
            "type": "",
            "time": "",
            "from": "web",
            "user_id": 0,
            "filter": true,
        });
        let resp = http::send_with_retry(api_name, || {
            self.http_client
                .post(api_url)
                .header("referer", referer)
                .json(&payload)
                .send()
        })
        .await?;
        let resp = http::ensure_success(api_name, resp)?;
        let body: DiskResponse = resp.json().await?;
        if body.code != 200 {
            return Err(crate::error::PanSouError::ApiError(format!(
                "{api_name} code: {} msg: {}",
                body.code, body.msg
            )));
        }
        Ok(body.data.list)
    }

    fn to_item(item: &DiskItem) -> ResultItem {
        let title = item.disk_name.replace("<em>", "").replace("</em>", "");
        ResultItem {
            message_id: item.doc_id.clone(),
            title,
            pub_date: item.shared_time.clone(),
            content: item.files.clone(),
            cloud_links: vec![CloudLink::from_url(&item.link)],
            channel: "混合盘".to_string(),
            channel_id: "hunhepan".to_string(),
            ..Default::default()
        }
    }

    fn dedup(items: Vec<DiskItem>) -> Vec<DiskItem> {
        let mut seen = std::collections::HashSet::new();
        items
            .into_iter()
            .filter(|item| seen.insert(item.dedup_key()))
            .collect()
    }
}

#[async_trait]
impl Source for Hunhepan {
    fn name(&self) -> &str {
        "hunhepan"
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("hunhepan", "混合盘", 1004)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let fetches = API_LIST
            .iter()
            .map(|(api_name, api_url, referer)| self.fetch_one(api_name, api_url, referer, keyword));

        let mut merged = Vec::new();
        for (outcome, (api_name, ..)) in future::join_all(fetches).await.into_iter().zip(API_LIST) {
            match outcome {
                Ok(items) => merged.extend(items),
                Err(e) => debug!("[hunhepan] 子接口 {api_name} 失败: {e}"),
            }
        }

        let list = Self::dedup(merged).iter().map(Self::to_item).collect();
        Ok(SearchResult::new(self.channel_info(), list))
    }
}
