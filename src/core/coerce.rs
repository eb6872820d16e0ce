use crate::models::{ConfigValue, ValueType};

/// 把当前值转换为目标类型。总是成功，结果的类型一定等于 target。
pub fn coerce(target: ValueType, value: &ConfigValue) -> ConfigValue {
    match target {
        ValueType::Null => ConfigValue::Null,
        ValueType::Boolean => ConfigValue::Boolean(match value {
            ConfigValue::Boolean(b) => *b,
            ConfigValue::Number(n) => *n != 0.0,
            ConfigValue::String(s) => s.trim().to_lowercase() == "true",
            ConfigValue::Null => false,
        }),
        ValueType::Number => ConfigValue::Number(match value {
            ConfigValue::Number(n) => *n,
            ConfigValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ConfigValue::String(s) => parse_number(s).unwrap_or(0.0),
            ConfigValue::Null => 0.0,
        }),
        ValueType::String => ConfigValue::String(match value {
            ConfigValue::Null => String::new(),
            other => other.to_string(),
        }),
    }
}

/// 解析数字：空串为 0，无法解析或非有限值返回 None
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
