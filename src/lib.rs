// ==========================================
// 设置栈核心库 - 分层配置解析引擎
// ==========================================
// 系统定位: 多头打印机配置的分层解析核心
// 技术栈: serde + thiserror + anyhow + tracing
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 容器与类型词表
pub mod domain;

// 注册表契约 - id → 容器 检索
pub mod registry;

// 引擎层 - 分层栈与解析算法
pub mod engine;

// 配置文档模型 - 外部格式边界
pub mod document;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    empty_container, Container, DefinitionContainer, InstanceContainer, InstanceType,
    PropertyTable, StackSlot, EMPTY_CONTAINER_ID,
};

// 注册表
pub use registry::{ContainerRegistry, InMemoryContainerRegistry};

// 引擎
pub use engine::{
    ExtruderUnit, LayeredStack, NoOpSlotEventPublisher, ResolvingStack, SlotChangedEvent,
    SlotEventPublisher, MACHINE_EXTRUDER_COUNT, PROPERTY_RESOLVE, PROPERTY_VALUE,
};

// 文档模型
pub use document::{StackDocument, DOCUMENT_VERSION};

// 错误
pub use error::{StackError, StackResult};

// ==========================================
// 常量定义
// ==========================================

// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 库名称
pub const APP_NAME: &str = "打印机设置栈核心库";
