//! 爱盘（aipan.me）的 `Source` 实现。
//!
//! 同一个实现按数据源编号（1..=8）实例化多份，频道 ID 带编号
//! 后缀。只保留夸克与天翼链接。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::Result,
    model::{ChannelInfo, CloudLink, CloudType, ResultItem, SearchResult},
    sources::{
        Source,
        http::{self, DEFAULT_TIMEOUT},
    },
};

#[derive(Debug, Deserialize)]
struct AipanResponse {
    #[serde(default)]
    list: Vec<AipanItem>,
}

#[derive(Debug, Deserialize)]
struct AipanItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    links: Vec<AipanLink>,
}

#[derive(Debug, Deserialize)]
struct AipanLink {
    #[serde(default)]
    link: String,
    #[serde(default)]
    pwd: String,
}

/// 爱盘搜索源，按 `source_id` 区分多个后端数据源。
pub struct Aipan {
    source_id: u8,
    name: String,
    http_client: Client,
}

impl Aipan {
    /// 创建指定数据源编号（1..=8）的爱盘实例。
    pub fn new(source_id: u8) -> Result<Self> {
        Ok(Self {
            source_id,
            name: format!("aipan_{source_id}"),
            http_client: http::build_client(DEFAULT_TIMEOUT)?,
        })
    }

    /// 清理资源标题，提取第一个有效资源名称。
    fn clean_title(title: &str) -> String {
        let mut title = title.to_string();
        if let Some((first, _)) = title.split_once(';') {
            title = first.trim().to_string();
        }
        if title.contains('、') {
            let parts: Vec<&str> = title
                .split('、')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            if parts.len() > 1
                && parts[0].chars().next().is_some_and(|c| c.is_ascii_digit())
            {
                title = parts[1]
                    .split(':')
                    .next()
                    .unwrap_or(parts[1])
                    .trim()
                    .to_string();
            }
        }
        let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() {
            "未命名资源".to_string()
        } else {
            title
        }
    }

    fn wanted(link: &AipanLink) -> bool {
        link.link.contains("quark") || link.link.contains("189.cn")
    }

    fn to_item(&self, raw: &AipanItem) -> Option<ResultItem> {
        let cloud_links: Vec<CloudLink> = raw
            .links
            .iter()
            .filter(|l| Self::wanted(l))
            .map(|l| {
                let mut link = CloudLink::from_url(&l.link);
                // 接口只收录夸克和天翼两类，URL 识别不出时按内容兜底
                if !link.cloud_type.is_known() {
                    link.cloud_type = if l.link.contains("quark") {
                        CloudType::Quark
                    } else {
                        CloudType::Tianyi
                    };
                }
                link.with_password(l.pwd.clone())
            })
            .collect();
        if cloud_links.is_empty() {
            return None;
        }
        let title = Self::clean_title(&raw.name);
        Some(ResultItem {
            title: title.clone(),
            content: title,
            cloud_links,
            channel: format!("爱盘-{}", self.source_id),
            channel_id: self.name.clone(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl Source for Aipan {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new(self.name.clone(), format!("爱盘-{}", self.source_id), 1002)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let url = format!("https://www.aipan.me/api/sources/{}", self.source_id);
        let referer = format!(
            "https://www.aipan.me/search?keyword={}",
            urlencoding::encode(keyword)
        );
        let payload = json!({ "name": keyword });
        let resp = http::send_with_retry(&self.name, || {
            self.http_client
                .post(&url)
                .header("origin", "https://www.aipan.me")
                .header("referer", &referer)
                .json(&payload)
                .send()
        })
        .await?;
        let resp = http::ensure_success(&self.name, resp)?;
        let body: AipanResponse = resp.json().await?;

        let list = body
            .list
            .iter()
            .filter_map(|item| self.to_item(item))
            .collect();
        Ok(SearchResult::new(self.channel_info(), list))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title() {
        assert_eq!(Aipan::clean_title("流浪地球;其它"), "流浪地球");
        assert_eq!(Aipan::clean_title("1、 流浪地球:4K、2、别的"), "流浪地球");
        assert_eq!(Aipan::clean_title("  多  空格  "), "多 空格");
        assert_eq!(Aipan::clean_title(""), "未命名资源");
    }

    #[test]
    fn test_link_filter_and_typing() {
        let aipan = Aipan::new(3).unwrap();
        let raw = AipanItem {
            name: "流浪地球".into(),
            links: vec![
                AipanLink {
                    link: "https://pan.quark.cn/s/ab".into(),
                    pwd: String::new(),
                },
                AipanLink {
                    link: "https://cloud.189.cn/t/cd".into(),
                    pwd: "1234".into(),
                },
                AipanLink {
                    link: "https://pan.baidu.com/s/ef".into(),
                    pwd: String::new(),
                },
            ],
        };
        let item = aipan.to_item(&raw).unwrap();
        assert_eq!(item.cloud_links.len(), 2);
        assert_eq!(item.cloud_links[0].cloud_type, CloudType::Quark);
        assert_eq!(item.cloud_links[1].cloud_type, CloudType::Tianyi);
        assert_eq!(item.cloud_links[1].password.as_deref(), Some("1234"));
        assert_eq!(item.channel_id, "aipan_3");
    }

    #[test]
    fn test_item_without_wanted_links_dropped() {
        let aipan = Aipan::new(1).unwrap();
        let raw = AipanItem {
            name: "只有百度".into(),
            links: vec![AipanLink {
                link: "https://pan.baidu.com/s/ef".into(),
                pwd: String::new(),
            }],
        };
        assert!(aipan.to_item(&raw).is_none());
    }
}
