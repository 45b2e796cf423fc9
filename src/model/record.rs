//! 定义了所有搜索源共享的标准化结果结构。
//!
//! 字段名序列化后与聚合接口的 JSON 约定一一对应
//! (`messageId` / `pubDate` / `cloudLinks` / `channelInfo` 等)。

use serde::{Deserialize, Serialize};

use crate::model::cloud::CloudType;

/// 一条云盘分享链接。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CloudLink {
    /// 分享链接 URL。
    pub link: String,
    /// 链接所属的云盘类型。
    #[serde(rename = "cloudType")]
    pub cloud_type: CloudType,
    /// 提取码（部分平台需要）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl CloudLink {
    /// 根据 URL 创建链接，云盘类型由分类器推导。
    pub fn from_url(link: impl Into<String>) -> Self {
        let link = link.into();
        let cloud_type = CloudType::from_url(&link);
        Self {
            link,
            cloud_type,
            password: None,
        }
    }

    /// 附带提取码。
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        let password = password.into();
        if !password.is_empty() {
            self.password = Some(password);
        }
        self
    }
}

/// 一条标准化的搜索结果条目。
///
/// 这是所有搜索源的 `search` 方法需要产出的条目类型。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResultItem {
    /// 条目在其来源内的唯一 ID（跨来源不保证唯一）。
    #[serde(rename = "messageId")]
    pub message_id: String,
    /// 资源标题。
    pub title: String,
    /// 发布时间。各站点格式不统一，按原样透传，不保证可解析。
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    /// 资源描述。
    pub content: String,
    /// 封面图 URL，可为空。
    pub image: String,
    /// 发现顺序排列的云盘链接列表。
    #[serde(rename = "cloudLinks")]
    pub cloud_links: Vec<CloudLink>,
    /// 标签列表。
    pub tags: Vec<String>,
    /// 磁力链接，可为空。
    #[serde(rename = "magnetLink")]
    pub magnet_link: String,
    /// 来源的展示名称。
    pub channel: String,
    /// 来源的机器 ID。
    #[serde(rename = "channelId")]
    pub channel_id: String,
}

impl ResultItem {
    /// 条目是否带有至少一个可用资源（云盘链接或磁力链接）。
    pub fn has_resource(&self) -> bool {
        !self.cloud_links.is_empty() || !self.magnet_link.is_empty()
    }
}

/// 搜索源（频道）的展示信息。
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ChannelInfo {
    /// 稳定的机器 ID，例如 `"hunhepan"`。
    pub id: String,
    /// 展示名称，例如 `"混合盘"`。
    pub name: String,
    /// 展示排序序号。
    pub index: i64,
    /// 频道图标 URL，可为空。
    #[serde(rename = "channelLogo")]
    pub channel_logo: String,
}

impl ChannelInfo {
    /// 创建一个无图标的频道信息。
    pub fn new(id: impl Into<String>, name: impl Into<String>, index: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            index,
            channel_logo: String::new(),
        }
    }
}

/// 一次搜索源调用的完整输出。
///
/// 每次 `search` 调用都构造一个新实例，返回后不再修改，也不做持久化。
/// `id` / `index` 是 `channel_info` 对应字段的别名，为兼容既有
/// 消费方而保留，构造时始终从 `channel_info` 同步。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResult {
    /// 标准化结果条目，顺序即发现顺序。
    pub list: Vec<ResultItem>,
    /// 来源的频道信息。
    #[serde(rename = "channelInfo")]
    pub channel_info: ChannelInfo,
    /// `channel_info.id` 的别名。
    pub id: String,
    /// `channel_info.index` 的别名。
    pub index: i64,
}

impl SearchResult {
    /// 用给定条目构造结果，别名字段从频道信息同步。
    pub fn new(channel_info: ChannelInfo, list: Vec<ResultItem>) -> Self {
        let id = channel_info.id.clone();
        let index = channel_info.index;
        Self {
            list,
            channel_info,
            id,
            index,
        }
    }

    /// 构造一个空结果。搜索失败时源以此作为统一的降级输出。
    pub fn empty(channel_info: ChannelInfo) -> Self {
        Self::new(channel_info, Vec::new())
    }

    /// 结果是否不含任何条目。
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// 过滤掉没有任何可用资源的条目。
    ///
    /// 这是共享契约的统一口径：不带链接的条目不会越过源边界，
    /// 不再由各源自行决定。
    pub fn retain_linked(&mut self) {
        self.list.retain(ResultItem::has_resource);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_link_from_url_classifies() {
        let link = CloudLink::from_url("https://pan.baidu.com/s/abc");
        assert_eq!(link.cloud_type, CloudType::Baidu);
        assert!(link.password.is_none());
    }

    #[test]
    fn test_with_password_ignores_empty() {
        let link = CloudLink::from_url("https://pan.quark.cn/s/abc").with_password("");
        assert!(link.password.is_none());
        let link = link.with_password("1234");
        assert_eq!(link.password.as_deref(), Some("1234"));
    }

    #[test]
    fn test_search_result_aliases_follow_channel_info() {
        let result = SearchResult::empty(ChannelInfo::new("hunhepan", "混合盘", 1004));
        assert_eq!(result.id, "hunhepan");
        assert_eq!(result.index, 1004);
        assert!(result.is_empty());
    }

    #[test]
    fn test_retain_linked_drops_resourceless_items() {
        let mut result = SearchResult::new(
            ChannelInfo::new("x", "X", 1),
            vec![
                ResultItem {
                    title: "有链接".into(),
                    cloud_links: vec![CloudLink::from_url("https://pan.quark.cn/s/a")],
                    ..Default::default()
                },
                ResultItem {
                    title: "只有磁力".into(),
                    magnet_link: "magnet:?xt=urn:btih:0000".into(),
                    ..Default::default()
                },
                ResultItem {
                    title: "什么都没有".into(),
                    ..Default::default()
                },
            ],
        );
        result.retain_linked();
        let titles: Vec<_> = result.list.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["有链接", "只有磁力"]);
    }

    #[test]
    fn test_wire_field_names() {
        let item = ResultItem {
            message_id: "m1".into(),
            title: "t".into(),
            cloud_links: vec![CloudLink::from_url("https://pan.quark.cn/s/a")],
            channel: "频道".into(),
            channel_id: "ch".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["messageId"], "m1");
        assert_eq!(value["cloudLinks"][0]["cloudType"], "quark");
        assert!(value["cloudLinks"][0].get("password").is_none());
        assert_eq!(value["channelId"], "ch");

        let result = SearchResult::new(ChannelInfo::new("ch", "频道", 7), vec![item]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["channelInfo"]["channelLogo"], "");
        assert_eq!(value["id"], "ch");
        assert_eq!(value["index"], 7);
    }
}
