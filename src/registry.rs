//! 搜索源注册表。
//!
//! 所有可用的搜索源在这里静态登记，以显式配置取代运行时扫描。
//! 新增一个源时在 [`SourceKind`] 和 [`default_configs`] 各加一行
//! 即可。

use std::sync::Arc;

use crate::{
    error::Result,
    sources::{
        Source, aipan::Aipan, fox4k::Fox4k, hunhepan::Hunhepan, jikepan::Jikepan,
        pansearch::Pansearch, qupansou::Qupansou, xiaotuso::Xiaotuso, yunso::Yunso,
    },
};

/// 快速子集：响应稳定、延迟低的源，默认搜索只调它们。
pub const FAST_SOURCES: &[&str] = &["pansearch", "hunhepan", "qupansou", "fox4k", "yunso"];

/// 可实例化的搜索源种类。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// 混合盘（三个兄弟端点并发查询）。
    Hunhepan,
    /// 即刻盘，`is_all` 控制是否要求上游返回全量结果。
    Jikepan {
        /// 透传给上游接口的 `is_all` 标记。
        is_all: bool,
    },
    /// 云桥计划（仅夸克资源）。
    Yunso,
    /// 爱盘，同一实现按数据源编号实例化多份。
    Aipan {
        /// 后端数据源编号，有效范围 1..=8。
        source_id: u8,
    },
    /// 趣盘搜。
    Qupansou,
    /// pansearch.me。
    Pansearch,
    /// 小兔搜（带请求签名）。
    Xiaotuso,
    /// 4K影视（纯 HTML 抓取）。
    Fox4k,
}

/// 单个搜索源的启用配置。
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// 源的种类与实例参数。
    pub kind: SourceKind,
    /// 是否启用，禁用的源不会被实例化。
    pub enabled: bool,
}

impl SourceConfig {
    /// 创建一个启用状态的配置。
    pub fn enabled(kind: SourceKind) -> Self {
        Self {
            kind,
            enabled: true,
        }
    }
}

/// 默认配置：全部已接入的源，其中爱盘按 1..=8 实例化八份。
pub fn default_configs() -> Vec<SourceConfig> {
    let mut configs = vec![
        SourceConfig::enabled(SourceKind::Hunhepan),
        SourceConfig::enabled(SourceKind::Jikepan { is_all: false }),
        SourceConfig::enabled(SourceKind::Yunso),
        SourceConfig::enabled(SourceKind::Qupansou),
        SourceConfig::enabled(SourceKind::Pansearch),
        SourceConfig::enabled(SourceKind::Xiaotuso),
        SourceConfig::enabled(SourceKind::Fox4k),
    ];
    for source_id in 1..=8 {
        configs.push(SourceConfig::enabled(SourceKind::Aipan { source_id }));
    }
    configs
}

/// 按配置实例化所有启用的搜索源。
pub fn build_sources(configs: &[SourceConfig]) -> Result<Vec<Arc<dyn Source>>> {
    let mut sources: Vec<Arc<dyn Source>> = Vec::with_capacity(configs.len());
    for config in configs {
        if !config.enabled {
            continue;
        }
        let source: Arc<dyn Source> = match &config.kind {
            SourceKind::Hunhepan => Arc::new(Hunhepan::new()?),
            SourceKind::Jikepan { is_all } => Arc::new(Jikepan::new(*is_all)?),
            SourceKind::Yunso => Arc::new(Yunso::new()?),
            SourceKind::Aipan { source_id } => Arc::new(Aipan::new(*source_id)?),
            SourceKind::Qupansou => Arc::new(Qupansou::new()?),
            SourceKind::Pansearch => Arc::new(Pansearch::new()?),
            SourceKind::Xiaotuso => Arc::new(Xiaotuso::new()?),
            SourceKind::Fox4k => Arc::new(Fox4k::new()?),
        };
        sources.push(source);
    }
    Ok(sources)
}

/// 判断某个源是否属于快速子集。
pub fn is_fast(name: &str) -> bool {
    FAST_SOURCES.contains(&name)
}
