// ==========================================
// 设置栈核心库 - 容器领域模型
// ==========================================
// 职责: 定义属性表、实例/定义容器与共享空容器
// 红线: 定义容器装配后只读, 空容器全局唯一且不可变
// ==========================================

use crate::domain::types::InstanceType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

// ==========================================
// PropertyTable - 属性表
// ==========================================
// 键结构: 设置键 → 属性名 → 属性值
// 属性值为未类型化的 JSON 值 (数值/布尔/字符串)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyTable {
    entries: HashMap<String, HashMap<String, Value>>,
}

impl PropertyTable {
    /// 创建空属性表
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询属性值
    pub fn get(&self, key: &str, property: &str) -> Option<&Value> {
        self.entries.get(key).and_then(|props| props.get(property))
    }

    /// 判断属性是否存在
    pub fn has(&self, key: &str, property: &str) -> bool {
        self.entries
            .get(key)
            .map(|props| props.contains_key(property))
            .unwrap_or(false)
    }

    /// 写入属性值 (已存在则覆盖)
    pub fn set(&mut self, key: &str, property: &str, value: Value) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .insert(property.to_string(), value);
    }

    /// 属性表是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// InstanceContainer - 实例容器
// ==========================================
// 承载覆写/预设层数据, 属性表可变
// container_type 仅在共享空容器上缺失
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceContainer {
    id: String,                            // 容器标识 (生命周期内稳定)
    container_type: Option<InstanceType>,  // 元数据标签 "type"
    properties: PropertyTable,             // 属性表
}

impl InstanceContainer {
    /// 创建带类型标签的实例容器
    pub fn new(id: impl Into<String>, container_type: InstanceType) -> Self {
        Self {
            id: id.into(),
            container_type: Some(container_type),
            properties: PropertyTable::new(),
        }
    }

    /// 创建共享空容器的底层实例 (id 固定为 "empty", 无类型标签)
    fn empty() -> Self {
        Self {
            id: EMPTY_CONTAINER_ID.to_string(),
            container_type: None,
            properties: PropertyTable::new(),
        }
    }

    /// 容器标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 元数据类型标签
    pub fn container_type(&self) -> Option<InstanceType> {
        self.container_type
    }

    /// 查询属性值
    pub fn get_property(&self, key: &str, property: &str) -> Option<Value> {
        self.properties.get(key, property).cloned()
    }

    /// 判断属性是否存在
    pub fn has_property(&self, key: &str, property: &str) -> bool {
        self.properties.has(key, property)
    }

    /// 写入属性值
    pub fn set_property(&mut self, key: &str, property: &str, value: Value) {
        self.properties.set(key, property, value);
    }

    /// 构造期链式写入属性 (测试与装配场景)
    pub fn with_property(mut self, key: &str, property: &str, value: Value) -> Self {
        self.properties.set(key, property, value);
        self
    }
}

// ==========================================
// DefinitionContainer - 定义容器
// ==========================================
// 承载硬件机型 schema 与默认值, 装配后只读
// 无 "type" 元数据标签, 按结构变体区分
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionContainer {
    id: String,                // 容器标识
    properties: PropertyTable, // schema 默认值 (含 machine_extruder_count)
}

impl DefinitionContainer {
    /// 创建定义容器
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: PropertyTable::new(),
        }
    }

    /// 容器标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 查询属性值
    pub fn get_property(&self, key: &str, property: &str) -> Option<Value> {
        self.properties.get(key, property).cloned()
    }

    /// 判断属性是否存在
    pub fn has_property(&self, key: &str, property: &str) -> bool {
        self.properties.has(key, property)
    }

    /// 构造期链式写入 schema 属性 (装配后不再提供写入口)
    pub fn with_property(mut self, key: &str, property: &str, value: Value) -> Self {
        self.properties.set(key, property, value);
        self
    }
}

// ==========================================
// Container - 容器判别联合
// ==========================================
// 封闭双变体: 实例容器 / 定义容器
// 所有槽位赋值与解析点按变体穷举分派
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Container {
    Instance(InstanceContainer),
    Definition(DefinitionContainer),
}

impl Container {
    /// 容器标识
    pub fn id(&self) -> &str {
        match self {
            Container::Instance(c) => c.id(),
            Container::Definition(c) => c.id(),
        }
    }

    /// 元数据类型标签 (定义容器与空容器均无标签)
    pub fn metadata_type(&self) -> Option<InstanceType> {
        match self {
            Container::Instance(c) => c.container_type(),
            Container::Definition(_) => None,
        }
    }

    /// 查询属性值
    pub fn get_property(&self, key: &str, property: &str) -> Option<Value> {
        match self {
            Container::Instance(c) => c.get_property(key, property),
            Container::Definition(c) => c.get_property(key, property),
        }
    }

    /// 判断属性是否存在
    pub fn has_property(&self, key: &str, property: &str) -> bool {
        match self {
            Container::Instance(c) => c.has_property(key, property),
            Container::Definition(c) => c.has_property(key, property),
        }
    }

    /// 是否为共享空容器 (实例形态, 无类型标签)
    pub fn is_empty_sentinel(&self) -> bool {
        matches!(self, Container::Instance(c) if c.container_type().is_none())
    }
}

impl From<InstanceContainer> for Container {
    fn from(container: InstanceContainer) -> Self {
        Container::Instance(container)
    }
}

impl From<DefinitionContainer> for Container {
    fn from(container: DefinitionContainer) -> Self {
        Container::Definition(container)
    }
}

// ==========================================
// 共享空容器 (Empty Sentinel)
// ==========================================

/// 共享空容器的固定标识
pub const EMPTY_CONTAINER_ID: &str = "empty";

static EMPTY_CONTAINER: OnceLock<Arc<Container>> = OnceLock::new();

/// 获取共享空容器
///
/// 进程内唯一实例, 对一切查询回答 "不存在", 可被任意多个栈同时引用。
/// 全局单元恒持有一个引用, 写时复制路径不可能触及其本体。
pub fn empty_container() -> Arc<Container> {
    EMPTY_CONTAINER
        .get_or_init(|| Arc::new(Container::Instance(InstanceContainer::empty())))
        .clone()
}
