use super::coerce::{coerce, parse_number};
use crate::error::{AdminError, Result};
use crate::models::{ConfigValue, ValueType};

/// 单个 key 的本地编辑状态。value 的类型始终等于 value_type。
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    value_type: ValueType,
    value: ConfigValue,
}

impl Draft {
    /// 从快照值构建，类型标签只在这里从值推断一次
    pub fn from_value(value: ConfigValue) -> Self {
        Self {
            value_type: value.value_type(),
            value,
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn value(&self) -> &ConfigValue {
        &self.value
    }

    /// 切换类型并转换当前值
    pub fn set_type(&mut self, value_type: ValueType) {
        self.value = coerce(value_type, &self.value);
        self.value_type = value_type;
    }

    /// 写入新值；类型不符时按当前标签转换
    pub fn set_value(&mut self, value: ConfigValue) {
        self.value = if value.value_type() == self.value_type {
            value
        } else {
            coerce(self.value_type, &value)
        };
    }
}

/// 相对最近一次加载的快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Clean,
    Dirty,
}

/// 按类型区分的值编辑器，由草稿的类型标签选择
#[derive(Debug, Clone, PartialEq)]
pub enum ValueEditor {
    Text(String),
    /// 原始输入，提交时解析
    Number(String),
    Toggle(bool),
    Null,
}

impl ValueEditor {
    pub fn for_draft(draft: &Draft) -> Self {
        Self::seeded(draft.value_type(), draft.value())
    }

    pub fn empty(value_type: ValueType) -> Self {
        match value_type {
            ValueType::String => ValueEditor::Text(String::new()),
            ValueType::Number => ValueEditor::Number(String::new()),
            ValueType::Boolean => ValueEditor::Toggle(false),
            ValueType::Null => ValueEditor::Null,
        }
    }

    fn seeded(value_type: ValueType, value: &ConfigValue) -> Self {
        match coerce(value_type, value) {
            ConfigValue::String(s) => ValueEditor::Text(s),
            ConfigValue::Number(n) => ValueEditor::Number(n.to_string()),
            ConfigValue::Boolean(b) => ValueEditor::Toggle(b),
            ConfigValue::Null => ValueEditor::Null,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ValueEditor::Text(_) => ValueType::String,
            ValueEditor::Number(_) => ValueType::Number,
            ValueEditor::Toggle(_) => ValueType::Boolean,
            ValueEditor::Null => ValueType::Null,
        }
    }

    pub fn insert(&mut self, c: char) {
        match self {
            ValueEditor::Text(buf) => buf.push(c),
            ValueEditor::Number(buf) => {
                if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') {
                    buf.push(c);
                }
            }
            ValueEditor::Toggle(_) | ValueEditor::Null => {}
        }
    }

    pub fn backspace(&mut self) {
        if let ValueEditor::Text(buf) | ValueEditor::Number(buf) = self {
            buf.pop();
        }
    }

    pub fn toggle(&mut self) {
        if let ValueEditor::Toggle(b) = self {
            *b = !*b;
        }
    }

    /// 提交编辑结果；数字必须能解析为有限值，空输入视为 0
    pub fn commit(&self) -> Result<ConfigValue> {
        match self {
            ValueEditor::Text(s) => Ok(ConfigValue::String(s.clone())),
            ValueEditor::Number(raw) => parse_number(raw)
                .map(ConfigValue::Number)
                .ok_or_else(|| AdminError::InvalidNumber(raw.trim().to_string())),
            ValueEditor::Toggle(b) => Ok(ConfigValue::Boolean(*b)),
            ValueEditor::Null => Ok(ConfigValue::Null),
        }
    }

    /// 换成另一种类型的编辑器，用 coerce 从当前输入得到初值
    pub fn retype(&self, value_type: ValueType) -> Self {
        let current = match self {
            ValueEditor::Text(s) | ValueEditor::Number(s) => ConfigValue::String(s.clone()),
            ValueEditor::Toggle(b) => ConfigValue::Boolean(*b),
            ValueEditor::Null => ConfigValue::Null,
        };
        Self::seeded(value_type, &current)
    }

    pub fn display(&self) -> String {
        match self {
            ValueEditor::Text(s) | ValueEditor::Number(s) => s.clone(),
            ValueEditor::Toggle(b) => b.to_string(),
            ValueEditor::Null => "null".to_string(),
        }
    }
}

/// "新增 key" 行的临时状态
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntryDraft {
    pub key: String,
    input: ValueEditor,
}

impl Default for NewEntryDraft {
    fn default() -> Self {
        Self {
            key: String::new(),
            input: ValueEditor::empty(ValueType::String),
        }
    }
}

impl NewEntryDraft {
    pub fn value_type(&self) -> ValueType {
        self.input.value_type()
    }

    pub fn set_type(&mut self, value_type: ValueType) {
        if value_type != self.value_type() {
            self.input = self.input.retype(value_type);
        }
    }

    pub fn input(&self) -> &ValueEditor {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut ValueEditor {
        &mut self.input
    }

    pub fn value(&self) -> Result<ConfigValue> {
        self.input.commit()
    }
}
