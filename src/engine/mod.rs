// ==========================================
// 设置栈核心库 - 引擎层
// ==========================================
// 职责: 实现分层栈与解析算法
// 红线: 引擎不持久化, 注册表以显式参数注入
// ==========================================

pub mod events;
pub mod layered_stack;
pub mod resolving_stack;

// 重导出核心引擎
pub use events::{
    NoOpSlotEventPublisher, OptionalSlotEventPublisher, SlotChangedEvent, SlotEventPublisher,
};
pub use layered_stack::{LayeredStack, PROPERTY_VALUE};
pub use resolving_stack::{
    ExtruderUnit, ResolvingStack, MACHINE_EXTRUDER_COUNT, PROPERTY_RESOLVE,
};
