// ==========================================
// 设置栈核心库 - 领域类型定义
// ==========================================
// 职责: 定义实例容器类型词表与槽位顺序
// 红线: 词表封闭, 槽位数量与顺序为架构常量
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 实例容器类型 (Instance Type)
// ==========================================
// 对应容器元数据标签 "type" 的封闭词表
// 序列化格式: snake_case (与配置文档一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceType {
    User,              // 操作员覆写
    QualityChanges,    // 质量预设覆写
    Quality,           // 质量预设
    Material,          // 材料数据
    Variant,           // 硬件变体
    DefinitionChanges, // 机器定义覆写
}

impl InstanceType {
    /// 全部实例类型, 按所在槽位优先级从高到低排列
    pub const ALL: [InstanceType; 6] = [
        InstanceType::User,
        InstanceType::QualityChanges,
        InstanceType::Quality,
        InstanceType::Material,
        InstanceType::Variant,
        InstanceType::DefinitionChanges,
    ];

    /// 转换为字符串标识
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::User => "user",
            InstanceType::QualityChanges => "quality_changes",
            InstanceType::Quality => "quality",
            InstanceType::Material => "material",
            InstanceType::Variant => "variant",
            InstanceType::DefinitionChanges => "definition_changes",
        }
    }

    /// 从字符串标识解析
    ///
    /// # 返回
    /// - Some(InstanceType): 词表内的合法标识
    /// - None: 词表外的标识
    pub fn parse(tag: &str) -> Option<InstanceType> {
        match tag {
            "user" => Some(InstanceType::User),
            "quality_changes" => Some(InstanceType::QualityChanges),
            "quality" => Some(InstanceType::Quality),
            "material" => Some(InstanceType::Material),
            "variant" => Some(InstanceType::Variant),
            "definition_changes" => Some(InstanceType::DefinitionChanges),
            _ => None,
        }
    }

    /// 该实例类型对应的栈槽位
    pub fn slot(&self) -> StackSlot {
        match self {
            InstanceType::User => StackSlot::UserChanges,
            InstanceType::QualityChanges => StackSlot::QualityChanges,
            InstanceType::Quality => StackSlot::Quality,
            InstanceType::Material => StackSlot::Material,
            InstanceType::Variant => StackSlot::Variant,
            InstanceType::DefinitionChanges => StackSlot::DefinitionChanges,
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 栈槽位 (Stack Slot)
// ==========================================
// 7 个固定槽位, 解析优先级从高到低, Definition 恒为最后
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackSlot {
    UserChanges,
    QualityChanges,
    Quality,
    Material,
    Variant,
    DefinitionChanges,
    Definition,
}

impl StackSlot {
    /// 槽位总数 (架构常量)
    pub const COUNT: usize = 7;

    /// 全部槽位, 按解析优先级从高到低排列
    pub const ALL: [StackSlot; StackSlot::COUNT] = [
        StackSlot::UserChanges,
        StackSlot::QualityChanges,
        StackSlot::Quality,
        StackSlot::Material,
        StackSlot::Variant,
        StackSlot::DefinitionChanges,
        StackSlot::Definition,
    ];

    /// 槽位下标 (0 = 最高优先级)
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 从下标还原槽位
    pub fn from_index(index: usize) -> Option<StackSlot> {
        StackSlot::ALL.get(index).copied()
    }

    /// 该槽位期望的实例容器类型
    ///
    /// # 返回
    /// - Some(InstanceType): 6 个实例槽位
    /// - None: Definition 槽位 (按结构变体校验, 不按类型标签)
    pub fn expected_type(&self) -> Option<InstanceType> {
        match self {
            StackSlot::UserChanges => Some(InstanceType::User),
            StackSlot::QualityChanges => Some(InstanceType::QualityChanges),
            StackSlot::Quality => Some(InstanceType::Quality),
            StackSlot::Material => Some(InstanceType::Material),
            StackSlot::Variant => Some(InstanceType::Variant),
            StackSlot::DefinitionChanges => Some(InstanceType::DefinitionChanges),
            StackSlot::Definition => None,
        }
    }

    /// 配置文档中该槽位的引用键名 (对外固定契约)
    pub fn document_key(&self) -> &'static str {
        match self.expected_type() {
            Some(ty) => ty.as_str(),
            None => "definition",
        }
    }
}

impl fmt::Display for StackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackSlot::UserChanges => write!(f, "user_changes"),
            StackSlot::QualityChanges => write!(f, "quality_changes"),
            StackSlot::Quality => write!(f, "quality"),
            StackSlot::Material => write!(f, "material"),
            StackSlot::Variant => write!(f, "variant"),
            StackSlot::DefinitionChanges => write!(f, "definition_changes"),
            StackSlot::Definition => write!(f, "definition"),
        }
    }
}
