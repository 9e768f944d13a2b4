// ==========================================
// 设置栈核心库 - 领域模型层
// ==========================================
// 职责: 定义容器实体、类型词表与共享空容器
// 红线: 不含解析逻辑, 不含注册表访问
// ==========================================

pub mod container;
pub mod types;

// 重导出核心类型
pub use container::{
    empty_container, Container, DefinitionContainer, InstanceContainer, PropertyTable,
    EMPTY_CONTAINER_ID,
};
pub use types::{InstanceType, StackSlot};
