//! 文本提取工具：HTML 清理、提取码识别、自由文本中的云盘链接收集。

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{CloudLink, CloudType};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("正则无效"));

static PWD_QUERY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?pwd=([0-9a-zA-Z]+)").expect("正则无效"));

/// 提取码的常见文本写法：提取码 / 访问码 / 密码。
static PWD_TEXT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"提取码[：:]\s*([0-9a-zA-Z]+)",
        r"访问码[：:]\s*([0-9a-zA-Z]+)",
        r"密码[：:]\s*([0-9a-zA-Z]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("正则无效"))
    .collect()
});

/// 自由文本中各平台分享链接的形状。键序无意义，链接归属最终
/// 仍由 [`CloudType::from_url`] 裁决。
static PAN_LINK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"https?://pan\.baidu\.com/s/[0-9a-zA-Z_-]+(?:\?pwd=[0-9a-zA-Z]+)?",
        r"https?://(?:www\.)?alipan\.com/s/[0-9a-zA-Z_-]+",
        r"https?://(?:www\.)?aliyundrive\.com/s/[0-9a-zA-Z_-]+",
        r"https?://cloud\.189\.cn/t/[0-9a-zA-Z_-]+",
        r"https?://drive\.uc\.cn/s/[0-9a-fA-F]+",
        r"https?://caiyun\.139\.com/[^\s\x22']+",
        r"https?://115\.com/s/[0-9a-zA-Z_-]+",
        r"https?://mypikpak\.com/s/[0-9a-zA-Z_-]+",
        r"https?://pan\.xunlei\.com/s/[0-9a-zA-Z_-]+(?:\?pwd=[0-9a-zA-Z]+)?",
        r"https?://(?:www\.)?123pan\.com/s/[0-9a-zA-Z_-]+",
        r"https?://pan\.quark\.cn/s/[0-9a-fA-F]+(?:\?pwd=[0-9a-zA-Z]+)?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("正则无效"))
    .collect()
});

static MAGNET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"magnet:\?xt=urn:btih:[0-9a-fA-F]{40}[^\s"']*"#).expect("正则无效")
});

/// 去掉所有 HTML 标签并裁剪首尾空白。
pub fn clean_html(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}

/// 从 URL 的 `?pwd=` 参数或「提取码：xxxx」式文本中提取提取码。
pub fn extract_password(text: &str) -> Option<String> {
    if let Some(caps) = PWD_QUERY_RE.captures(text) {
        return Some(caps[1].to_string());
    }
    PWD_TEXT_RES
        .iter()
        .find_map(|re| re.captures(text).map(|caps| caps[1].to_string()))
}

/// 从任意文本中收集可识别的云盘链接，保持出现顺序并去重。
///
/// 每条链接的提取码优先取 URL 自带的 `?pwd=` 参数。
pub fn harvest_cloud_links(text: &str) -> Vec<CloudLink> {
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();
    for re in PAN_LINK_RES.iter() {
        for m in re.find_iter(text) {
            let url = m.as_str().to_string();
            if !seen.insert(url.clone()) {
                continue;
            }
            let password = PWD_QUERY_RE
                .captures(&url)
                .map(|caps| caps[1].to_string());
            let mut link = CloudLink::from_url(url);
            if let Some(pwd) = password {
                link = link.with_password(pwd);
            }
            if link.cloud_type.is_known() {
                links.push(link);
            }
        }
    }
    links
}

/// 从文本中提取第一条磁力链接。
pub fn extract_magnet(text: &str) -> Option<String> {
    MAGNET_RE.find(text).map(|m| m.as_str().to_string())
}

/// 识别链接类型时顺带从周边文本补齐提取码（若链接本身没带）。
pub fn link_with_context_password(url: &str, context: &str) -> CloudLink {
    let link = CloudLink::from_url(url);
    if let Some(caps) = PWD_QUERY_RE.captures(url) {
        return link.with_password(caps[1].to_string());
    }
    match extract_password(context) {
        Some(pwd) => link.with_password(pwd),
        None => link,
    }
}
