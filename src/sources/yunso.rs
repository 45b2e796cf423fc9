//! 云桥计划（yunso.net）开放搜索接口的 `Source` 实现。
//!
//! 单次 GET 请求返回 JSON 列表，这里只保留夸克盘条目。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::Result,
    model::{ChannelInfo, CloudLink, ResultItem, SearchResult},
    sources::{
        Source,
        http::{self, DEFAULT_TIMEOUT},
    },
};

const API_URL: &str = "https://www.yunso.net/api/opensearch.php";
/// 接口不返回发布时间，沿用约定的占位时间戳。
const PLACEHOLDER_PUB_DATE: &str = "2022-11-03T14:07:54+00:00";

#[derive(Debug, Deserialize)]
struct YunsoResponse {
    #[serde(rename = "Data", default)]
    data: Vec<YunsoItem>,
}

#[derive(Debug, Deserialize)]
struct YunsoItem {
    #[serde(rename = "ScrID", default)]
    scr_id: serde_json::Value,
    #[serde(rename = "ScrName", default)]
    scr_name: String,
    #[serde(rename = "Scrurl", default)]
    scr_url: String,
    #[serde(rename = "Scrurlname", default)]
    scr_url_name: String,
}

/// 云桥计划搜索源。
pub struct Yunso {
    http_client: Client,
}

impl Yunso {
    /// 创建一个新的云桥计划搜索源实例。
    pub fn new() -> Result<Self> {
        Ok(Self {
            http_client: http::build_client(DEFAULT_TIMEOUT)?,
        })
    }

    fn to_item(&self, raw: &YunsoItem) -> ResultItem {
        let message_id = match &raw.scr_id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        ResultItem {
            message_id,
            title: raw.scr_name.clone(),
            pub_date: PLACEHOLDER_PUB_DATE.to_string(),
            content: raw.scr_name.clone(),
            cloud_links: vec![CloudLink::from_url(&raw.scr_url)],
            channel: "云桥计划".to_string(),
            channel_id: "yunso".to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Source for Yunso {
    fn name(&self) -> &str {
        "yunso"
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("yunso", "云桥计划", 1000)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let resp = http::send_with_retry("yunso", || {
            self.http_client
                .get(API_URL)
                .query(&[("wd", keyword), ("uk", ""), ("mode", "90001")])
                .send()
        })
        .await?;
        let resp = http::ensure_success("yunso", resp)?;
        let body: YunsoResponse = resp.json().await?;

        let list = body
            .data
            .iter()
            .filter(|item| item.scr_url_name == "夸克")
            .map(|item| self.to_item(item))
            .collect();

        Ok(SearchResult::new(self.channel_info(), list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CloudType;

    #[test]
    fn test_response_parsing_and_filter() {
        let json = r#"{
            "Data": [
                {"ScrID": 42, "ScrName": "流浪地球 4K", "Scrurl": "https://pan.quark.cn/s/ab12", "Scrurlname": "夸克"},
                {"ScrID": "43", "ScrName": "别的盘", "Scrurl": "https://pan.baidu.com/s/xy", "Scrurlname": "百度"}
            ]
        }"#;
        let body: YunsoResponse = serde_json::from_str(json).unwrap();
        let source = Yunso::new().unwrap();
        let items: Vec<_> = body
            .data
            .iter()
            .filter(|item| item.scr_url_name == "夸克")
            .map(|item| source.to_item(item))
            .collect();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].message_id, "42");
        assert_eq!(items[0].cloud_links[0].cloud_type, CloudType::Quark);
        assert_eq!(items[0].channel_id, "yunso");
    }

    fn init_tracing() {
        use tracing_subscriber::{EnvFilter, FmtSubscriber};
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_search() {
        init_tracing();
        let source = Yunso::new().unwrap();
        let result = source.search("流浪地球").await.unwrap();
        assert!(!result.is_empty(), "应该至少返回一条结果");
        for item in &result.list {
            assert_eq!(item.cloud_links[0].cloud_type, CloudType::Quark);
        }
    }
}
