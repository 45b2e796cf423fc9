//! 即刻盘（jikepan.xyz）的 `Source` 实现。
//!
//! 接口按链接给出 `service` 字段；URL 识别优先，识别不出时
//! 回退到 `service` 映射。没有任何有效链接的条目直接丢弃。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{PanSouError, Result},
    model::{ChannelInfo, CloudLink, CloudType, ResultItem, SearchResult},
    sources::{Source, http},
};

const API_URL: &str = "https://api.jikepan.xyz/search";
/// 全量搜索较慢，接口侧约 10 秒，给足余量。
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct JikepanResponse {
    #[serde(default)]
    msg: String,
    #[serde(default)]
    list: Vec<JikepanItem>,
}

#[derive(Debug, Deserialize)]
struct JikepanItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    links: Vec<JikepanLink>,
}

#[derive(Debug, Deserialize)]
struct JikepanLink {
    #[serde(default)]
    service: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    pwd: String,
}

/// 即刻盘搜索源。
pub struct Jikepan {
    http_client: Client,
    /// 是否请求全量结果（慢）。
    is_all: bool,
}

impl Jikepan {
    /// 创建一个新的即刻盘搜索源实例。
    pub fn new(is_all: bool) -> Result<Self> {
        Ok(Self {
            http_client: http::build_client(TIMEOUT)?,
            is_all,
        })
    }

    fn convert_link(raw: &JikepanLink) -> Option<CloudLink> {
        if raw.link.is_empty() {
            return None;
        }
        let mut cloud_type = CloudType::from_url(&raw.link);
        if !cloud_type.is_known() {
            cloud_type = CloudType::from_service_tag(&raw.service);
        }
        if !cloud_type.is_known() && raw.link.to_ascii_lowercase().contains("drive.uc.cn") {
            cloud_type = CloudType::Uc;
        }
        if !cloud_type.is_known() {
            return None;
        }
        let mut link = CloudLink::from_url(&raw.link);
        link.cloud_type = cloud_type;
        Some(link.with_password(raw.pwd.clone()))
    }

    fn to_item(idx: usize, raw: &JikepanItem) -> Option<ResultItem> {
        let cloud_links: Vec<CloudLink> = raw.links.iter().filter_map(Self::convert_link).collect();
        if cloud_links.is_empty() {
            return None;
        }
        Some(ResultItem {
            message_id: format!("jikepan-{idx}"),
            title: raw.name.clone(),
            content: raw.name.clone(),
            cloud_links,
            channel: "即刻盘".to_string(),
            channel_id: "jikepan".to_string(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl Source for Jikepan {
    fn name(&self) -> &str {
        "jikepan"
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("jikepan", "即刻盘", 1020)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let payload = json!({ "name": keyword, "is_all": self.is_all });
        let resp = http::send_with_retry("jikepan", || {
            self.http_client
                .post(API_URL)
                .header("referer", "https://jikepan.xyz/")
                .json(&payload)
                .send()
        })
        .await?;
        let resp = http::ensure_success("jikepan", resp)?;
        let body: JikepanResponse = resp.json().await?;
        if body.msg != "success" {
            return Err(PanSouError::ApiError(format!("jikepan msg: {}", body.msg)));
        }

        let list = body
            .list
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| Self::to_item(idx, item))
            .collect();
        Ok(SearchResult::new(self.channel_info(), list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(service: &str, url: &str, pwd: &str) -> JikepanLink {
        JikepanLink {
            service: service.into(),
            link: url.into(),
            pwd: pwd.into(),
        }
    }

    #[test]
    fn test_url_detection_beats_service_tag() {
        // URL 明确是夸克，即使 service 声称别的平台
        let converted = Jikepan::convert_link(&link("baidu", "https://pan.quark.cn/s/ab", ""));
        assert_eq!(converted.unwrap().cloud_type, CloudType::Quark);
    }

    #[test]
    fn test_service_tag_fallback() {
        let converted =
            Jikepan::convert_link(&link("189cloud", "https://example.net/t/abc", "9x2k")).unwrap();
        assert_eq!(converted.cloud_type, CloudType::Tianyi);
        assert_eq!(converted.password.as_deref(), Some("9x2k"));
    }

    #[test]
    fn test_unrecognizable_link_dropped() {
        assert!(Jikepan::convert_link(&link("unknown", "https://example.net/x", "")).is_none());
        assert!(Jikepan::convert_link(&link("baidu", "", "")).is_none());
    }

    #[test]
    fn test_linkless_item_dropped() {
        let raw = JikepanItem {
            name: "没有链接".into(),
            links: vec![link("unknown", "https://example.net/x", "")],
        };
        assert!(Jikepan::to_item(0, &raw).is_none());
    }
}
