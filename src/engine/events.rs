// ==========================================
// 设置栈核心库 - 引擎层变更通知
// ==========================================
// 职责: 定义槽位变更通知 trait, 实现依赖倒置
// 说明: Engine 层定义 trait, UI/重算层实现适配器
// 红线: 先安装后通知, 观察者不可见中间态
// ==========================================

use crate::domain::types::StackSlot;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 槽位变更事件
// ==========================================

/// 槽位变更事件
///
/// 每次 `set_slot` 成功后同步发出, 负载仅含栈标识与槽位, 无其他内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChangedEvent {
    /// 发生变更的栈标识
    pub stack_id: String,
    /// 发生变更的槽位
    pub slot: StackSlot,
}

impl SlotChangedEvent {
    /// 创建变更事件
    pub fn new(stack_id: impl Into<String>, slot: StackSlot) -> Self {
        Self {
            stack_id: stack_id.into(),
            slot,
        }
    }
}

// ==========================================
// 变更通知 Trait
// ==========================================

/// 槽位变更通知发布者 Trait
///
/// Engine 层定义, 消费方 (UI 刷新、依赖设置重算) 实现
///
/// # 时序保证
/// - 仅在新容器完全安装后发布
/// - 与 `set_slot` 同一调用栈内同步执行
pub trait SlotEventPublisher: Send + Sync {
    /// 发布槽位变更事件
    ///
    /// # 返回
    /// - `Ok(())`: 发布成功
    /// - `Err`: 发布失败 (安装不回滚, 由调用侧记录日志)
    fn publish(&self, event: SlotChangedEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作通知发布者
///
/// 用于不需要变更通知的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpSlotEventPublisher;

impl SlotEventPublisher for NoOpSlotEventPublisher {
    fn publish(&self, event: SlotChangedEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpSlotEventPublisher: 跳过变更通知 - stack_id={}, slot={}",
            event.stack_id,
            event.slot
        );
        Ok(())
    }
}

/// 可选的通知发布者包装
///
/// 简化 Option<Arc<dyn SlotEventPublisher>> 的使用
#[derive(Clone, Default)]
pub struct OptionalSlotEventPublisher {
    inner: Option<Arc<dyn SlotEventPublisher>>,
}

impl OptionalSlotEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn SlotEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布通知）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: SlotChangedEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::trace!(
                    "OptionalSlotEventPublisher: 未配置发布者, 跳过事件 - stack_id={}, slot={}",
                    event.stack_id,
                    event.slot
                );
                Ok(())
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl std::fmt::Debug for OptionalSlotEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionalSlotEventPublisher")
            .field("configured", &self.is_configured())
            .finish()
    }
}
