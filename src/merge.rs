//! 把聚合结果并入上游响应。
//!
//! 网关把上游的原始 JSON 交进来，这里只负责保证 `data` 数组
//! 存在并把非空结果按序追加进去，不去重、不排序，其余字段
//! 原样保留。

use serde_json::{Value, json};
use tracing::warn;

use crate::model::SearchResult;

/// 把非空的 `extra` 结果追加到 `upstream.data` 末尾。
///
/// 上游不是 JSON 对象时按空对象处理，保证返回值始终带
/// `data` 数组。
pub fn merge_into_upstream(upstream: Value, extra: &[SearchResult]) -> Value {
    let mut payload = match upstream {
        Value::Object(map) => map,
        other => {
            warn!("上游响应不是 JSON 对象，按空对象处理: {other}");
            serde_json::Map::new()
        }
    };
    let data = payload
        .entry("data")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !data.is_array() {
        warn!("上游 data 字段不是数组，已重置");
        *data = Value::Array(Vec::new());
    }
    if let Value::Array(items) = data {
        for result in extra {
            if result.is_empty() {
                continue;
            }
            items.push(json!(result));
        }
    }
    Value::Object(payload)
}
