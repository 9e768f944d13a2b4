// ==========================================
// 设置栈核心库 - 容器注册表契约
// ==========================================
// 职责: 定义 id → 容器 的检索 trait, 实现依赖倒置
// 说明: 引擎只消费该 trait, 存储服务由宿主实现;
//       注册表以显式参数注入, 不走进程级全局状态
// ==========================================

use crate::domain::container::{empty_container, Container};
use crate::domain::types::InstanceType;
use std::sync::Arc;

// ==========================================
// ContainerRegistry - 检索契约
// ==========================================

/// 容器注册表 trait
///
/// 返回列表的顺序是注册表自身的相关度排序, 引擎不再排序, 取首个匹配。
///
/// # 实现说明
/// - 宿主的存储服务实现此 trait
/// - `InMemoryContainerRegistry` 为内存参考实现, 供测试与嵌入场景
pub trait ContainerRegistry {
    /// 检索实例容器
    ///
    /// # 参数
    /// - `id`: 容器标识过滤条件 (None 表示不过滤)
    /// - `container_type`: 类型标签过滤条件 (None 表示不过滤)
    fn find_instance_containers(
        &self,
        id: Option<&str>,
        container_type: Option<InstanceType>,
    ) -> Vec<Arc<Container>>;

    /// 检索定义容器
    ///
    /// # 参数
    /// - `id`: 容器标识过滤条件 (None 表示不过滤)
    fn find_definition_containers(&self, id: Option<&str>) -> Vec<Arc<Container>>;

    /// 获取共享空容器
    fn empty_instance_container(&self) -> Arc<Container> {
        empty_container()
    }
}

// ==========================================
// InMemoryContainerRegistry - 内存参考实现
// ==========================================

/// 内存容器注册表
///
/// 按插入顺序存储, 检索结果保持插入顺序（即相关度排序 = 注册顺序）。
#[derive(Debug, Default)]
pub struct InMemoryContainerRegistry {
    containers: Vec<Arc<Container>>,
}

impl InMemoryContainerRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个容器
    pub fn add(&mut self, container: impl Into<Container>) -> Arc<Container> {
        let container = Arc::new(container.into());
        self.containers.push(container.clone());
        container
    }

    /// 注册一个已共享的容器
    pub fn add_shared(&mut self, container: Arc<Container>) {
        self.containers.push(container);
    }

    /// 注册表中的容器总数
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// 注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl ContainerRegistry for InMemoryContainerRegistry {
    fn find_instance_containers(
        &self,
        id: Option<&str>,
        container_type: Option<InstanceType>,
    ) -> Vec<Arc<Container>> {
        self.containers
            .iter()
            .filter(|c| matches!(c.as_ref(), Container::Instance(_)))
            .filter(|c| id.map(|want| c.id() == want).unwrap_or(true))
            .filter(|c| {
                container_type
                    .map(|want| c.metadata_type() == Some(want))
                    .unwrap_or(true)
            })
            .cloned()
            .collect()
    }

    fn find_definition_containers(&self, id: Option<&str>) -> Vec<Arc<Container>> {
        self.containers
            .iter()
            .filter(|c| matches!(c.as_ref(), Container::Definition(_)))
            .filter(|c| id.map(|want| c.id() == want).unwrap_or(true))
            .cloned()
            .collect()
    }
}
