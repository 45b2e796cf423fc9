//! 聚合器共享的数据模型：云盘类型标签与标准化结果结构。

pub mod cloud;
pub mod record;

pub use cloud::CloudType;
pub use record::{ChannelInfo, CloudLink, ResultItem, SearchResult};
