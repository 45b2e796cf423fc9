//! 搜索源模块。
//!
//! 该模块定义了所有网盘搜索源需要实现的通用契约 [`Source`]，
//! 以及各源共用的 HTTP、缓存与文本提取工具。

use async_trait::async_trait;
use tracing::warn;

use crate::{
    error::Result,
    model::{ChannelInfo, SearchResult},
};

pub mod cache;
pub mod http;
pub mod text;

pub mod aipan;
pub mod fox4k;
pub mod hunhepan;
pub mod jikepan;
pub mod pansearch;
pub mod qupansou;
pub mod xiaotuso;
pub mod yunso;

/// 定义了所有网盘搜索源需要实现的通用接口。
///
/// 每个实现对接一个外部站点或 API，负责把站点返回的数据
/// 规整为统一的 [`SearchResult`]。关键词的转义方式由各源
/// 按自家上游的要求自行处理。
#[async_trait]
pub trait Source: Send + Sync {
    /// 返回搜索源的唯一名称（机器 ID），例如 `"hunhepan"`。
    ///
    /// 多实例源的名称带实例后缀，例如 `"aipan_3"`。
    fn name(&self) -> &str;

    /// 返回该源的频道展示信息。
    fn channel_info(&self) -> ChannelInfo;

    /// 执行搜索并返回标准化结果。
    ///
    /// 内部错误通过 `Err` 返回；聚合侧不会直接调用本方法，
    /// 而是经由 [`Source::search_safe`]。
    async fn search(&self, keyword: &str) -> Result<SearchResult>;

    /// 永不失败的搜索入口。
    ///
    /// 任何错误都在这里被记录并吞掉，降级为带频道信息的空结果，
    /// 下游合并逻辑因此无需区分「零结果」与「请求失败」。
    /// 同时统一过滤掉不带任何可用链接的条目。
    async fn search_safe(&self, keyword: &str) -> SearchResult {
        match self.search(keyword).await {
            Ok(mut result) => {
                result.retain_linked();
                result
            }
            Err(e) => {
                warn!("[{}] 搜索失败，返回空结果: {e}", self.name());
                SearchResult::empty(self.channel_info())
            }
        }
    }
}
