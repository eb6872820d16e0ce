use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 远端配置快照：key -> 任意 JSON 值，按 key 排序
pub type ConfigMap = BTreeMap<String, serde_json::Value>;

/// JS 安全整数上限，超过则按浮点序列化
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// 配置值的显式类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Null,
}

impl ValueType {
    pub const ALL: [ValueType; 4] = [
        ValueType::String,
        ValueType::Number,
        ValueType::Boolean,
        ValueType::Null,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Null => "null",
        }
    }

    /// 循环顺序：string -> number -> boolean -> null -> string
    pub fn next(self) -> ValueType {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> ValueType {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 原始类型配置值
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl ConfigValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            ConfigValue::String(_) => ValueType::String,
            ConfigValue::Number(_) => ValueType::Number,
            ConfigValue::Boolean(_) => ValueType::Boolean,
            ConfigValue::Null => ValueType::Null,
        }
    }

    /// 从 JSON 值转换；数组和对象不是原始类型，返回 None
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(ConfigValue::String(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(ConfigValue::Number),
            serde_json::Value::Bool(b) => Some(ConfigValue::Boolean(*b)),
            serde_json::Value::Null => Some(ConfigValue::Null),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// 整数值按 JSON 整数输出（5 而不是 5.0）
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            ConfigValue::Boolean(b) => serde_json::Value::Bool(*b),
            ConfigValue::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::Number(n) => write!(f, "{}", n),
            ConfigValue::Boolean(b) => write!(f, "{}", b),
            ConfigValue::Null => f.write_str("null"),
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_primitives() {
        assert_eq!(
            ConfigValue::from_json(&json!("a")),
            Some(ConfigValue::String("a".to_string()))
        );
        assert_eq!(ConfigValue::from_json(&json!(3)), Some(ConfigValue::Number(3.0)));
        assert_eq!(ConfigValue::from_json(&json!(false)), Some(ConfigValue::Boolean(false)));
        assert_eq!(ConfigValue::from_json(&json!(null)), Some(ConfigValue::Null));
    }

    #[test]
    fn test_from_json_rejects_compound() {
        assert_eq!(ConfigValue::from_json(&json!([1, 2])), None);
        assert_eq!(ConfigValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_whole_numbers_serialize_as_integers() {
        assert_eq!(ConfigValue::Number(5.0).to_json(), json!(5));
        assert_eq!(ConfigValue::Number(-12.0).to_json(), json!(-12));
        assert_eq!(ConfigValue::Number(1.5).to_json(), json!(1.5));
        let text = serde_json::to_string(&ConfigValue::Number(5.0)).unwrap();
        assert_eq!(text, "5");
    }

    #[test]
    fn test_type_cycle() {
        assert_eq!(ValueType::String.next(), ValueType::Number);
        assert_eq!(ValueType::Null.next(), ValueType::String);
        assert_eq!(ValueType::String.prev(), ValueType::Null);
        assert_eq!(ValueType::Boolean.to_string(), "boolean");
    }
}
