//! 载荷形状
//!
//! 同一个集合在全量快照里是数组，在增量更新里是以数字字符串为键的对象。
//! 这里把两种形状统一成按键排序的序列；字段读取对类型错误一律视为缺失。

use std::cmp::Ordering;

use serde_json::{Map, Value};

pub(crate) enum Collection<'a> {
    List(&'a [Value]),
    Keyed(&'a Map<String, Value>),
}

impl<'a> Collection<'a> {
    pub(crate) fn from_value(value: &'a Value) -> Option<Collection<'a>> {
        match value {
            Value::Array(items) => Some(Collection::List(items)),
            Value::Object(map) => Some(Collection::Keyed(map)),
            _ => None,
        }
    }

    /// 数组按下标，对象按数字键升序；非数字键排在最后。
    pub(crate) fn into_ordered(self) -> Vec<(String, &'a Value)> {
        match self {
            Collection::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
            Collection::Keyed(map) => {
                let mut entries: Vec<(String, &'a Value)> =
                    map.iter().map(|(k, v)| (k.clone(), v)).collect();
                entries.sort_by(|a, b| key_order(&a.0, &b.0));
                entries
            }
        }
    }
}

pub(crate) fn ordered_entries(value: &Value) -> Option<Vec<(String, &Value)>> {
    Collection::from_value(value).map(Collection::into_ordered)
}

fn key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub(crate) fn str_field<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key)?.as_str()
}

pub(crate) fn bool_field(obj: &Value, key: &str) -> Option<bool> {
    obj.get(key)?.as_bool()
}

/// 数值字段；feed 有时把数字写成字符串。
pub(crate) fn number_field(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn count_field(obj: &Value, key: &str) -> Option<u32> {
    number_field(obj, key)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u32)
}
