//! 4K影视（4kfox.com）的 `Source` 实现。
//!
//! 完整的两段式抓取：列表页只有条目元数据，真实网盘链接在
//! 详情页里。列表分页并发抓取（封顶 10 页），详情页在有界并发
//! 下批量抓取，链接用按平台形状的正则从页面文本里收集，
//! 提取码优先取链接自带参数、其次取周边文本。

use std::sync::LazyLock;

use async_trait::async_trait;
use futures::{StreamExt, stream};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::{
    error::{PanSouError, Result},
    model::{ChannelInfo, CloudLink, ResultItem, SearchResult},
    sources::{Source, http, text},
};

const BASE_URL: &str = "https://4kfox.com";
/// 最大分页数，避免无限请求。
const MAX_PAGES: usize = 10;
/// 详情页抓取的并发上限。
const DETAIL_CONCURRENCY: usize = 50;
/// 接口不返回发布时间，沿用约定的占位时间戳。
const PLACEHOLDER_PUB_DATE: &str = "2022-11-03T14:07:54+00:00";
const TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

static DETAIL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/video/(\d+)\.html").expect("正则无效"));
static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}").expect("正则无效"));

/// 列表页解析出的一条候选条目，链接待详情页补全。
#[derive(Debug, Clone)]
struct SearchHit {
    id: String,
    title: String,
    image: String,
    content: String,
    tags: Vec<String>,
}

/// 详情页解析结果。
#[derive(Debug, Default)]
struct DetailInfo {
    content: String,
    tags: Vec<String>,
    links: Vec<CloudLink>,
    magnet: String,
}

/// 4K影视搜索源。
pub struct Fox4k {
    http_client: Client,
}

impl Fox4k {
    /// 创建一个新的 4K影视搜索源实例。
    pub fn new() -> Result<Self> {
        Ok(Self {
            http_client: http::build_client(TIMEOUT)?,
        })
    }

    fn selector(pattern: &str) -> Result<Selector> {
        Selector::parse(pattern).map_err(|e| PanSouError::Parser(format!("选择器无效: {e}")))
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let resp = http::send_with_retry("fox4k", || {
            self.http_client
                .get(url)
                .header("referer", format!("{BASE_URL}/"))
                .send()
        })
        .await?;
        http::ensure_success("fox4k", resp)?
            .text()
            .await
            .map_err(PanSouError::from)
    }

    /// 解析分页提示（形如 `1 / 2`），失败时按单页处理。
    fn parse_total_pages(doc: &Html) -> usize {
        let Ok(selector) = Self::selector(".hl-page-tips a") else {
            return 1;
        };
        doc.select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(|text| {
                let (_, total) = text.split_once('/')?;
                total.trim().parse::<usize>().ok()
            })
            .filter(|total| *total >= 1)
            .unwrap_or(1)
    }

    /// 解析一页搜索结果，返回 (候选条目, 总页数)。
    fn parse_search_page(html: &str) -> Result<(Vec<SearchHit>, usize)> {
        let doc = Html::parse_document(html);
        let total_pages = Self::parse_total_pages(&doc);

        let item_sel = Self::selector(".hl-list-item")?;
        let pic_link_sel = Self::selector(".hl-item-pic a")?;
        let title_sel = Self::selector(".hl-item-title a")?;
        let thumb_sel = Self::selector(".hl-item-thumb")?;
        let remarks_sel = Self::selector(".hl-pic-text .remarks")?;
        let score_sel = Self::selector(".hl-text-conch.score")?;
        let sub_sel = Self::selector(".hl-item-sub")?;

        let mut hits = Vec::new();
        for item in doc.select(&item_sel) {
            let Some(href) = item
                .select(&pic_link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };
            let Some(id) = DETAIL_ID_RE
                .captures(href)
                .map(|caps| caps[1].to_string())
            else {
                continue;
            };
            let title = item
                .select(&title_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            if title.is_empty() {
                continue;
            }
            let mut image = item
                .select(&thumb_sel)
                .next()
                .and_then(|el| el.value().attr("data-original"))
                .unwrap_or_default()
                .to_string();
            if image.starts_with('/') {
                image = format!("{BASE_URL}{image}");
            }
            let status = item
                .select(&remarks_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let score = item
                .select(&score_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            let subs: Vec<String> = item
                .select(&sub_sel)
                .map(|el| el.text().collect::<String>().trim().to_string())
                .collect();
            let basic_info = subs.first().cloned().unwrap_or_default();
            let description = subs.last().cloned().unwrap_or_default();

            let (year, region, category) = Self::parse_basic_info(&basic_info, &score);

            let mut tags = Vec::new();
            for tag in [status, year, region, category] {
                if !tag.is_empty() {
                    tags.push(tag);
                }
            }

            let mut content = description;
            if !basic_info.is_empty() {
                content = format!("{basic_info}\n{content}");
            }
            if !score.is_empty() {
                content = format!("评分: {score}\n{content}");
            }

            hits.push(SearchHit {
                id,
                title,
                image,
                content,
                tags,
            });
        }
        Ok((hits, total_pages))
    }

    /// 从「年份·地区·类型」串中拆出年份、地区与类型。
    fn parse_basic_info(basic_info: &str, score: &str) -> (String, String, String) {
        let mut year = String::new();
        let mut region = String::new();
        let mut category = String::new();
        for part in basic_info.split('·') {
            let part = part.trim();
            if part.is_empty() || (!score.is_empty() && part.contains(score)) {
                continue;
            }
            if year.is_empty() && YEAR_RE.is_match(part) {
                year = part.to_string();
            } else if region.is_empty() {
                region = part.to_string();
            } else if category.is_empty() {
                category = part.to_string();
            } else {
                category = format!("{category} {part}");
            }
        }
        (year, region, category)
    }

    /// 解析详情页：简介、标签与全部可识别的下载链接。
    fn parse_detail_page(html: &str) -> Result<DetailInfo> {
        let doc = Html::parse_document(html);
        let mut detail = DetailInfo::default();

        let content_sel = Self::selector(".hl-content-wrap .hl-content-text")?;
        if let Some(el) = doc.select(&content_sel).next() {
            detail.content = el.text().collect::<String>().trim().to_string();
        }

        let data_sel = Self::selector(".hl-vod-data ul li")?;
        for li in doc.select(&data_sel) {
            let tag = li.text().collect::<String>().trim().replace('：', ": ");
            if tag.contains("类型:") || tag.contains("地区:") || tag.contains("语言:") {
                detail.tags.push(tag);
            }
        }

        // 整页文本收集一轮，再补充下载区域的 clipboard 属性
        let page_text: String = doc.root_element().text().collect();
        let mut links = text::harvest_cloud_links(&page_text);
        if let Some(magnet) = text::extract_magnet(&page_text) {
            detail.magnet = magnet;
        }

        let copy_sel = Self::selector(".hl-rb-downlist .down-copy")?;
        for el in doc.select(&copy_sel) {
            if let Some(clipboard) = el.value().attr("data-clipboard-text") {
                links.extend(text::harvest_cloud_links(clipboard));
            }
        }
        let href_sel = Self::selector(".hl-rb-downlist .hl-downs-list li a")?;
        for el in doc.select(&href_sel) {
            if let Some(href) = el.value().attr("href") {
                links.extend(text::harvest_cloud_links(href));
            }
        }

        // 提取码兜底：链接自己不带就从整页文本里找
        let fallback_pwd = text::extract_password(&page_text);
        let mut seen = std::collections::HashSet::new();
        for mut link in links {
            if !seen.insert(link.link.clone()) {
                continue;
            }
            if link.password.is_none()
                && let Some(pwd) = &fallback_pwd
            {
                link = link.with_password(pwd.clone());
            }
            detail.links.push(link);
        }
        Ok(detail)
    }

    fn search_page_url(encoded_keyword: &str, page: usize) -> String {
        if page == 1 {
            format!("{BASE_URL}/search/{encoded_keyword}-------------.html")
        } else {
            format!("{BASE_URL}/search/{encoded_keyword}----------{page}---.html")
        }
    }

    /// 拉取详情页并把链接合并进候选条目。
    async fn enrich_hit(&self, hit: SearchHit) -> Option<ResultItem> {
        let detail_url = format!("{BASE_URL}/video/{}.html", hit.id);
        let detail = match self.fetch_html(&detail_url).await {
            Ok(html) => match Self::parse_detail_page(&html) {
                Ok(detail) => detail,
                Err(e) => {
                    debug!("[fox4k] 详情页解析失败 ({}): {e}", hit.id);
                    return None;
                }
            },
            Err(e) => {
                debug!("[fox4k] 详情页请求失败 ({}): {e}", hit.id);
                return None;
            }
        };
        if detail.links.is_empty() && detail.magnet.is_empty() {
            return None;
        }

        let mut tags = hit.tags;
        for tag in detail.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        let content = if detail.content.is_empty() {
            hit.content
        } else {
            detail.content
        };
        Some(ResultItem {
            message_id: format!("fox4k-{}", hit.id),
            title: hit.title,
            pub_date: PLACEHOLDER_PUB_DATE.to_string(),
            content,
            image: hit.image,
            cloud_links: detail.links,
            tags,
            magnet_link: detail.magnet,
            channel: "4K影视".to_string(),
            channel_id: "fox4k".to_string(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl Source for Fox4k {
    fn name(&self) -> &str {
        "fox4k"
    }

    fn channel_info(&self) -> ChannelInfo {
        ChannelInfo::new("fox4k", "4K影视", 1000)
    }

    async fn search(&self, keyword: &str) -> Result<SearchResult> {
        let encoded = urlencoding::encode(keyword).into_owned();

        // 第一页给出总页数
        let first_html = self.fetch_html(&Self::search_page_url(&encoded, 1)).await?;
        let (mut hits, total_pages) = Self::parse_search_page(&first_html)?;

        let pages_to_fetch = total_pages.min(MAX_PAGES);
        if pages_to_fetch > 1 {
            let extra_pages = stream::iter(2..=pages_to_fetch)
                .map(|page| {
                    let url = Self::search_page_url(&encoded, page);
                    async move {
                        match self.fetch_html(&url).await {
                            Ok(html) => Self::parse_search_page(&html)
                                .map(|(page_hits, _)| page_hits)
                                .unwrap_or_default(),
                            Err(e) => {
                                debug!("[fox4k] 第 {page} 页请求失败: {e}");
                                Vec::new()
                            }
                        }
                    }
                })
                .buffer_unordered(DETAIL_CONCURRENCY)
                .collect::<Vec<_>>()
                .await;
            hits.extend(extra_pages.into_iter().flatten());
        }

        // 有界并发补全详情页
        let mut items: Vec<ResultItem> = stream::iter(hits)
            .map(|hit| self.enrich_hit(hit))
            .buffer_unordered(DETAIL_CONCURRENCY)
            .filter_map(|item| async move { item })
            .collect()
            .await;

        // 结果再按关键词粗过滤一轮
        let keyword_lower = keyword.to_lowercase();
        items.retain(|item| {
            item.title.to_lowercase().contains(&keyword_lower)
                || item.content.to_lowercase().contains(&keyword_lower)
        });

        Ok(SearchResult::new(self.channel_info(), items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CloudType;

    const SEARCH_PAGE: &str = r#"
    <html><body>
      <div class="hl-page-tips"><a>1 / 3</a></div>
      <div class="hl-list-item">
        <div class="hl-item-pic">
          <a href="/video/4242.html"><img class="hl-item-thumb" data-original="/upload/a.jpg"></a>
          <div class="hl-pic-text"><span class="remarks">完结</span></div>
        </div>
        <div class="hl-item-title"><a>流浪地球2</a></div>
        <span class="hl-text-conch score">8.3</span>
        <div class="hl-item-sub">8.3 · 2023 · 中国大陆 · 科幻</div>
        <div class="hl-item-sub">刘培强的故事继续。</div>
      </div>
    </body></html>"#;

    #[test]
    fn test_parse_search_page() {
        let (hits, total_pages) = Fox4k::parse_search_page(SEARCH_PAGE).unwrap();
        assert_eq!(total_pages, 3);
        assert_eq!(hits.len(), 1);
        let hit = &hits[0];
        assert_eq!(hit.id, "4242");
        assert_eq!(hit.title, "流浪地球2");
        assert_eq!(hit.image, "https://4kfox.com/upload/a.jpg");
        assert!(hit.tags.contains(&"完结".to_string()));
        assert!(hit.tags.contains(&"2023".to_string()));
        assert!(hit.content.starts_with("评分: 8.3"));
    }

    #[test]
    fn test_parse_basic_info() {
        let (year, region, category) = Fox4k::parse_basic_info("8.3 · 2023 · 中国大陆 · 科幻", "8.3");
        assert_eq!(year, "2023");
        assert_eq!(region, "中国大陆");
        assert_eq!(category, "科幻");
    }

    #[test]
    fn test_parse_detail_page_collects_links() {
        let html = r#"
        <html><body>
          <div class="hl-content-wrap"><div class="hl-content-text">太阳即将毁灭。</div></div>
          <div class="hl-vod-data"><ul><li>类型：科幻</li><li>主演：某人</li></ul></div>
          <div class="hl-rb-downlist">
            <div class="hl-downs-list"><ul><li>
              <span class="down-copy" data-clipboard-text="https://pan.quark.cn/s/0a1b2c3d"></span>
              <a href="https://pan.baidu.com/s/abc?pwd=1234">百度</a>
            </li></ul></div>
          </div>
          <p>天翼：https://cloud.189.cn/t/xyz（访问码：9h2x）</p>
        </body></html>"#;
        let detail = Fox4k::parse_detail_page(html).unwrap();
        assert_eq!(detail.content, "太阳即将毁灭。");
        assert_eq!(detail.tags, vec!["类型: 科幻".to_string()]);
        let types: Vec<_> = detail.links.iter().map(|l| l.cloud_type).collect();
        assert!(types.contains(&CloudType::Quark));
        assert!(types.contains(&CloudType::Baidu));
        assert!(types.contains(&CloudType::Tianyi));
        let baidu = detail
            .links
            .iter()
            .find(|l| l.cloud_type == CloudType::Baidu)
            .unwrap();
        assert_eq!(baidu.password.as_deref(), Some("1234"));
    }

    #[test]
    fn test_parse_total_pages_defaults_to_one() {
        let (_, total) = Fox4k::parse_search_page("<html><body></body></html>").unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_search_page_url() {
        assert_eq!(
            Fox4k::search_page_url("abc", 1),
            "https://4kfox.com/search/abc-------------.html"
        );
        assert_eq!(
            Fox4k::search_page_url("abc", 3),
            "https://4kfox.com/search/abc----------3---.html"
        );
    }
}
