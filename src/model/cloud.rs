//! 云盘类型标签与基于 URL 的云盘类型识别。
//!
//! 识别规则是一组按固定顺序执行的子串匹配，先匹配先生效。
//! 顺序不可调整：部分域名模式互为子串（例如 pan123 链接的路径里
//! 可能包含 `115`），固定顺序就是约定的裁决方式，所有搜索源都
//! 依赖同样的结果。

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 云盘分享链接所属的网盘平台标签。
///
/// 序列化为接口约定的小写标签字符串，`Unknown` 序列化为空串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CloudType {
    /// 百度网盘
    Baidu,
    /// 阿里云盘
    Aliyun,
    /// 天翼云盘
    Tianyi,
    /// 夸克网盘
    Quark,
    /// 115 网盘
    Pan115,
    /// 123 云盘
    Pan123,
    /// 移动云盘（彩云）
    Mobile,
    /// UC 网盘
    Uc,
    /// 迅雷云盘
    Xunlei,
    /// PikPak
    Pikpak,
    /// 蓝奏云
    Lanzou,
    /// 坚果云
    Jianguoyun,
    /// 腾讯微云
    Weiyun,
    /// ed2k 链接
    Ed2k,
    /// 磁力链接
    Magnet,
    /// 无法识别
    #[default]
    Unknown,
}

impl CloudType {
    /// 根据 URL 判断云盘类型。
    ///
    /// 纯函数，任何输入都有结果：空串或无法识别时返回 [`CloudType::Unknown`]。
    /// 匹配顺序与各搜索源共同约定的规则保持一致，不要重排。
    pub fn from_url(url: &str) -> Self {
        if url.is_empty() {
            return Self::Unknown;
        }
        if url.contains("pan.baidu.com") || url.contains("yun.baidu.com") {
            Self::Baidu
        } else if url.contains("cloud.189.cn") {
            Self::Tianyi
        } else if url.contains("aliyundrive.com") || url.contains("alipan.com") {
            Self::Aliyun
        } else if url.contains("115.com") || url.contains("anxia.com") || url.contains("115cdn.com")
        {
            Self::Pan115
        } else if url.contains("123") && url.contains(".com/s/") {
            Self::Pan123
        } else if url.contains("pan.quark.cn") {
            Self::Quark
        } else if url.contains("caiyun.139.com") {
            Self::Mobile
        } else if url.contains("drive.uc.cn") {
            Self::Uc
        } else {
            Self::Unknown
        }
    }

    /// 根据接口返回的平台字段（如即刻盘的 `service`）映射云盘类型。
    ///
    /// 仅在 URL 识别失败、而接口本身给出了更可信的平台信息时使用。
    pub fn from_service_tag(service: &str) -> Self {
        match service.to_ascii_lowercase().as_str() {
            "baidu" | "bdy" => Self::Baidu,
            "aliyun" | "aly" => Self::Aliyun,
            "189cloud" | "tianyi" => Self::Tianyi,
            "quark" => Self::Quark,
            "115" => Self::Pan115,
            "123" => Self::Pan123,
            "caiyun" | "mobile" => Self::Mobile,
            "uc" => Self::Uc,
            "xunlei" => Self::Xunlei,
            "pikpak" => Self::Pikpak,
            "lanzou" => Self::Lanzou,
            "jianguoyun" => Self::Jianguoyun,
            "weiyun" => Self::Weiyun,
            "ed2k" => Self::Ed2k,
            "magnet" => Self::Magnet,
            _ => Self::Unknown,
        }
    }

    /// 返回接口约定的标签字符串。
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Baidu => "baidu",
            Self::Aliyun => "aliyun",
            Self::Tianyi => "tianyi",
            Self::Quark => "quark",
            Self::Pan115 => "pan115",
            Self::Pan123 => "pan123",
            Self::Mobile => "mobile",
            Self::Uc => "uc",
            Self::Xunlei => "xunlei",
            Self::Pikpak => "pikpak",
            Self::Lanzou => "lanzou",
            Self::Jianguoyun => "jianguoyun",
            Self::Weiyun => "weiyun",
            Self::Ed2k => "ed2k",
            Self::Magnet => "magnet",
            Self::Unknown => "",
        }
    }

    /// 是否为可识别的云盘类型。
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl std::fmt::Display for CloudType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl Serialize for CloudType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for CloudType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_service_tag(&tag))
    }
}
