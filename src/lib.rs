#![warn(missing_docs)]

//! # PanSou RS
//!
//! 一个网盘资源聚合搜索库：把一个关键词并发派发给多个搜索源，
//! 按链接 URL 识别网盘类型，统一规整为同一套 JSON 结构，
//! 并支持把结果并入上游响应的 `data` 数组。
//!
//! ## 主要功能
//!
//! - **并发聚合**: 每个源独立任务执行，单源失败、超时或 panic
//!   都不影响整体响应，只收集非空结果。
//! - **链接识别**: 按 URL 特征识别百度、阿里云、天翼、夸克等
//!   十余种网盘与磁力、电驴链接。
//! - **范围控制**: 关键词以 `#` 结尾时调用所有源做穷尽搜索，
//!   否则只调响应稳定的快速子集。
//!
//! ## 搜索示例
//!
//! ```rust,no_run
//! use pansou_rs::PanSou;
//!
//! async {
//!     let pansou = PanSou::new().unwrap();
//!     let results = pansou.search("流浪地球").await;
//!     for result in &results {
//!         println!("[{}] {} 条结果", result.channel_info.name, result.list.len());
//!     }
//!
//!     let upstream = serde_json::json!({ "code": 200, "data": [] });
//!     let merged = pansou.merge(upstream, &results);
//!     println!("{merged}");
//! };
//! ```

pub mod error;
pub mod merge;
pub mod model;
pub mod registry;
pub mod search;
pub mod sources;

use std::{sync::Arc, time::Duration};

pub use error::{PanSouError, Result};
pub use model::{ChannelInfo, CloudLink, CloudType, ResultItem, SearchResult};
pub use registry::{SourceConfig, SourceKind};
pub use search::SearchScope;
pub use sources::Source;

use serde_json::Value;

/// 聚合搜索客户端，持有已实例化的全部搜索源。
///
/// 实例化开销只在构造时发生一次，之后可以被任意多次并发调用；
/// 各源的内部缓存（关键词结果、签名密钥）挂在源实例上，随
/// 客户端一同存活。
pub struct PanSou {
    sources: Vec<Arc<dyn Source>>,
    budget: Duration,
}

impl PanSou {
    /// 按默认配置创建客户端（全部已接入的源，爱盘实例化八份）。
    pub fn new() -> Result<Self> {
        Self::with_configs(&registry::default_configs())
    }

    /// 按指定配置创建客户端。
    pub fn with_configs(configs: &[SourceConfig]) -> Result<Self> {
        Ok(Self {
            sources: registry::build_sources(configs)?,
            budget: search::DEFAULT_BUDGET,
        })
    }

    /// 调整聚合预算，超出预算的源任务会被放弃。
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// 已启用的源数量。
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 搜索。关键词结尾的 `#` 表示穷尽搜索（所有源），
    /// 否则只调快速子集。
    pub async fn search(&self, raw_keyword: &str) -> Vec<SearchResult> {
        let (keyword, scope) = search::parse_keyword(raw_keyword);
        self.search_scoped(&keyword, &scope).await
    }

    /// 在指定范围内搜索，关键词按原样使用，不解析 `#` 标记。
    pub async fn search_scoped(&self, keyword: &str, scope: &SearchScope) -> Vec<SearchResult> {
        search::fetch_all(&self.sources, keyword, scope, self.budget).await
    }

    /// 只调指定名称的单个源，名称未登记时返回错误。
    pub async fn search_one(&self, name: &str, keyword: &str) -> Result<SearchResult> {
        let source = self
            .sources
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| PanSouError::SourceNotSupported(name.to_string()))?;
        Ok(source.search_safe(keyword).await)
    }

    /// 把聚合结果并入上游响应，见 [`merge::merge_into_upstream`]。
    pub fn merge(&self, upstream: Value, results: &[SearchResult]) -> Value {
        merge::merge_into_upstream(upstream, results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_builds_all_sources() {
        let pansou = PanSou::new().unwrap();
        assert_eq!(pansou.source_count(), 15);
    }

    #[test]
    fn test_with_configs_subset() {
        let configs = vec![
            SourceConfig::enabled(SourceKind::Yunso),
            SourceConfig::enabled(SourceKind::Aipan { source_id: 1 }),
        ];
        let pansou = PanSou::with_configs(&configs).unwrap();
        assert_eq!(pansou.source_count(), 2);
    }

    /// 穷尽标记只改变范围，关键词本身原样传给各源。
    #[tokio::test]
    async fn test_search_parses_exhaustive_marker() {
        let pansou = PanSou::with_configs(&[]).unwrap();
        // 没有源时两种范围都应平静地返回空集
        assert!(pansou.search("流浪地球").await.is_empty());
        assert!(pansou.search("流浪地球#").await.is_empty());
    }

    #[tokio::test]
    async fn test_search_one_unknown_source() {
        let pansou = PanSou::with_configs(&[]).unwrap();
        let err = pansou.search_one("不存在的源", "关键词").await.unwrap_err();
        assert!(matches!(err, PanSouError::SourceNotSupported(_)));
    }
}
