//! 并发搜索编排。
//!
//! 把一个关键词同时派发给一批搜索源，每个源跑在独立任务里，
//! 单个源的失败、超时或 panic 都不影响其它源。只保留非空结果。

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::{model::SearchResult, registry, sources::Source};

/// 聚合预算的默认值，超时的源任务直接放弃。
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(60);

/// 一次搜索要覆盖的源范围。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// 只调快速子集（见 [`registry::FAST_SOURCES`]）。
    Fast,
    /// 调所有启用的源。
    All,
    /// 只调指定名称的一批源。
    Subset(Vec<String>),
    /// 只调单个源。
    Specific(String),
}

impl SearchScope {
    fn covers(&self, name: &str) -> bool {
        match self {
            SearchScope::Fast => registry::is_fast(name),
            SearchScope::All => true,
            SearchScope::Subset(names) => names.iter().any(|n| n == name),
            SearchScope::Specific(target) => target == name,
        }
    }
}

/// 解析原始关键词：结尾的 `#` 表示穷尽搜索（所有源），
/// 否则只调快速子集。返回去掉标记后的关键词与对应范围。
pub fn parse_keyword(raw: &str) -> (String, SearchScope) {
    let trimmed = raw.trim();
    if let Some(stripped) = trimmed.strip_suffix('#') {
        (stripped.trim().to_string(), SearchScope::All)
    } else {
        (trimmed.to_string(), SearchScope::Fast)
    }
}

/// 并发调用范围内的所有源，收集非空结果。
///
/// 每个源包一层 `tokio::spawn` 隔离 panic，再包一层预算超时；
/// 超时的任务被放弃，迟到的结果不会再被合并。结果顺序按
/// 源在 `sources` 里的排列，不做跨源排序。
pub async fn fetch_all(
    sources: &[Arc<dyn Source>],
    keyword: &str,
    scope: &SearchScope,
    budget: Duration,
) -> Vec<SearchResult> {
    let selected: Vec<Arc<dyn Source>> = sources
        .iter()
        .filter(|s| scope.covers(s.name()))
        .cloned()
        .collect();
    if selected.is_empty() {
        warn!("范围内没有可用的搜索源: {scope:?}");
        return Vec::new();
    }
    info!("开始搜索: {keyword}, 共 {} 个源", selected.len());

    let overall_start = Instant::now();
    let tasks = selected.into_iter().map(|source| {
        let keyword = keyword.to_string();
        async move {
            let name = source.name().to_string();
            let start = Instant::now();
            let handle =
                tokio::spawn(async move { source.search_safe(&keyword).await });
            let outcome = tokio::time::timeout(budget, handle).await;
            let elapsed = start.elapsed();
            match outcome {
                Ok(Ok(result)) => {
                    debug!("[{name}] 耗时 {:.2}s, {} 条结果", elapsed.as_secs_f64(), result.list.len());
                    Some((name, elapsed, result))
                }
                Ok(Err(e)) => {
                    warn!("[{name}] 任务异常终止: {e}");
                    None
                }
                Err(_) => {
                    warn!("[{name}] 超出 {:.0}s 预算，放弃等待", budget.as_secs_f64());
                    None
                }
            }
        }
    });
    let outcomes: Vec<_> = join_all(tasks).await.into_iter().flatten().collect();

    // 耗时统计，便于观察哪个源拖慢了整体响应
    if !outcomes.is_empty() {
        let total: Duration = outcomes.iter().map(|(_, d, _)| *d).sum();
        let (fastest, slowest) = outcomes.iter().fold(
            (&outcomes[0], &outcomes[0]),
            |(fast, slow), o| {
                (
                    if o.1 < fast.1 { o } else { fast },
                    if o.1 > slow.1 { o } else { slow },
                )
            },
        );
        info!(
            "搜索统计: 总调用次数 {}, 总耗时 {:.2}s, 平均 {:.2}s, 最快 {} ({:.2}s), 最慢 {} ({:.2}s), 整体耗时 {:.2}s",
            outcomes.len(),
            total.as_secs_f64(),
            total.as_secs_f64() / outcomes.len() as f64,
            fastest.0,
            fastest.1.as_secs_f64(),
            slowest.0,
            slowest.1.as_secs_f64(),
            overall_start.elapsed().as_secs_f64(),
        );
    }

    outcomes
        .into_iter()
        .map(|(_, _, result)| result)
        .filter(|result| !result.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{PanSouError, Result},
        model::{ChannelInfo, CloudLink, ResultItem},
    };
    use async_trait::async_trait;

    struct Stub {
        name: &'static str,
        behavior: Behavior,
    }

    enum Behavior {
        Fails,
        Empty,
        TwoItems,
        Panics,
        Slow(Duration),
    }

    #[async_trait]
    impl Source for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn channel_info(&self) -> ChannelInfo {
            ChannelInfo::new(self.name, self.name, 1)
        }

        async fn search(&self, _keyword: &str) -> Result<SearchResult> {
            match &self.behavior {
                Behavior::Fails => Err(PanSouError::Network("连接超时".into())),
                Behavior::Empty => Ok(SearchResult::empty(self.channel_info())),
                Behavior::TwoItems => Ok(SearchResult::new(
                    self.channel_info(),
                    vec![item("条目一"), item("条目二")],
                )),
                Behavior::Panics => panic!("适配器内部错误"),
                Behavior::Slow(delay) => {
                    tokio::time::sleep(*delay).await;
                    Ok(SearchResult::new(self.channel_info(), vec![item("迟到")]))
                }
            }
        }
    }

    fn item(title: &str) -> ResultItem {
        ResultItem {
            title: title.to_string(),
            cloud_links: vec![CloudLink::from_url("https://pan.quark.cn/s/ab12")],
            ..Default::default()
        }
    }

    fn stub(name: &'static str, behavior: Behavior) -> Arc<dyn Source> {
        Arc::new(Stub { name, behavior })
    }

    #[test]
    fn test_parse_keyword_marker() {
        assert_eq!(
            parse_keyword("流浪地球"),
            ("流浪地球".to_string(), SearchScope::Fast)
        );
        assert_eq!(
            parse_keyword("流浪地球#"),
            ("流浪地球".to_string(), SearchScope::All)
        );
        assert_eq!(parse_keyword("  abc# "), ("abc".to_string(), SearchScope::All));
    }

    #[test]
    fn test_scope_covers() {
        assert!(SearchScope::All.covers("xiaotuso"));
        assert!(SearchScope::Fast.covers("hunhepan"));
        assert!(!SearchScope::Fast.covers("xiaotuso"));
        assert!(SearchScope::Subset(vec!["a".into(), "b".into()]).covers("b"));
        assert!(SearchScope::Specific("yunso".into()).covers("yunso"));
        assert!(!SearchScope::Specific("yunso".into()).covers("fox4k"));
    }

    /// 失败、空结果与 panic 的源都被隔离，只留下有结果的那个。
    #[tokio::test]
    async fn test_fetch_all_isolates_failures() {
        let sources = vec![
            stub("s_fail", Behavior::Fails),
            stub("s_empty", Behavior::Empty),
            stub("s_panic", Behavior::Panics),
            stub("s_ok", Behavior::TwoItems),
        ];
        let results =
            fetch_all(&sources, "流浪地球", &SearchScope::All, DEFAULT_BUDGET).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "s_ok");
        assert_eq!(results[0].list.len(), 2);
    }

    /// 超出预算的源被放弃，不阻塞整体返回。
    #[tokio::test]
    async fn test_fetch_all_abandons_slow_sources() {
        let sources = vec![
            stub("s_slow", Behavior::Slow(Duration::from_secs(5))),
            stub("s_ok", Behavior::TwoItems),
        ];
        let start = Instant::now();
        let results = fetch_all(
            &sources,
            "流浪地球",
            &SearchScope::All,
            Duration::from_millis(100),
        )
        .await;
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "s_ok");
    }

    #[tokio::test]
    async fn test_fetch_all_respects_subset_scope() {
        let sources = vec![
            stub("s_a", Behavior::TwoItems),
            stub("s_b", Behavior::TwoItems),
        ];
        let scope = SearchScope::Specific("s_b".into());
        let results = fetch_all(&sources, "关键词", &scope, DEFAULT_BUDGET).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "s_b");
    }

    #[tokio::test]
    async fn test_fetch_all_empty_scope() {
        let sources = vec![stub("s_a", Behavior::TwoItems)];
        let scope = SearchScope::Specific("不存在".into());
        let results = fetch_all(&sources, "关键词", &scope, DEFAULT_BUDGET).await;
        assert!(results.is_empty());
    }
}
