// ==========================================
// 设置栈核心库 - 配置文档模型
// ==========================================
// 职责: 解析外部分层配置文档的已定型结构
// 说明: 引擎只定位各槽位的引用键, 不校验完整文法;
//       键名 → 槽位 的映射是对外固定契约
// ==========================================

use crate::domain::types::StackSlot;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 当前支持的文档版本
pub const DOCUMENT_VERSION: u32 = 3;

// ==========================================
// GeneralSection - 标识段
// ==========================================

/// 文档标识段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    /// 栈显示名称 (可选)
    #[serde(default)]
    pub name: Option<String>,

    /// 文档版本
    pub version: u32,
}

// ==========================================
// StackDocument - 分层配置文档
// ==========================================

/// 分层配置文档的已解析形态
///
/// `containers` 段以固定键名引用各槽位的容器 id; 缺失的键表示
/// "该槽位使用共享空容器"。词表外的多余键被忽略。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackDocument {
    /// 标识段 (名称/版本)
    pub general: GeneralSection,

    /// 槽位引用段: 槽位键名 → 容器 id
    #[serde(default)]
    pub containers: BTreeMap<String, String>,
}

impl StackDocument {
    /// 从文档文本解析
    ///
    /// # 返回
    /// - `Err`: 文本不可解析或版本不受支持 (均视为文档损坏或不兼容)
    pub fn parse(serialized: &str) -> anyhow::Result<StackDocument> {
        let document: StackDocument =
            serde_json::from_str(serialized).context("配置文档解析失败")?;

        if document.general.version != DOCUMENT_VERSION {
            bail!(
                "不支持的配置文档版本: {} (当前支持 {})",
                document.general.version,
                DOCUMENT_VERSION
            );
        }
        Ok(document)
    }

    /// 标识段中的栈名称
    pub fn name(&self) -> Option<&str> {
        self.general.name.as_deref()
    }

    /// 指定槽位的容器引用 id
    pub fn container_reference(&self, slot: StackSlot) -> Option<&str> {
        self.containers.get(slot.document_key()).map(String::as_str)
    }
}
