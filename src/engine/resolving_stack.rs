// ==========================================
// 设置栈核心库 - 解析栈
// ==========================================
// 职责: 在分层栈之上实现 value/resolve 两阶段解析、
//       按 id 装配槽位、挤出机扇出与配置文档装载
// 红线: 显式覆写值恒胜于任何 resolve 回退;
//       挤出机列表受定义层 machine_extruder_count 约束
// ==========================================

use crate::document::StackDocument;
use crate::domain::container::Container;
use crate::domain::types::{InstanceType, StackSlot};
use crate::engine::events::SlotEventPublisher;
use crate::engine::layered_stack::{LayeredStack, PROPERTY_VALUE};
use crate::error::{StackError, StackResult};
use crate::registry::ContainerRegistry;
use anyhow::{anyhow, Context};
use serde_json::Value;
use std::sync::Arc;

/// 设置键上承载回退计算的属性名
pub const PROPERTY_RESOLVE: &str = "resolve";

/// 定义层声明挤出机数量上限的设置键
pub const MACHINE_EXTRUDER_COUNT: &str = "machine_extruder_count";

// ==========================================
// ExtruderUnit - 挤出机单元契约
// ==========================================

/// 挤出机单元 Trait
///
/// 引擎只要求其可标识、可存入扇出列表; 单元内部的解析逻辑由宿主实现。
/// 生命周期由宿主管理, 栈仅持引用。
pub trait ExtruderUnit: Send + Sync {
    /// 单元标识
    fn id(&self) -> &str;
}

impl std::fmt::Debug for dyn ExtruderUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtruderUnit").field("id", &self.id()).finish()
    }
}

// ==========================================
// ResolvingStack - 解析栈
// ==========================================

/// 解析栈
///
/// 在 [`LayeredStack`] 之上叠加 "value" 属性的两阶段解析算法,
/// 并管理按机型容量约束的挤出机扇出列表。
#[derive(Debug)]
pub struct ResolvingStack {
    /// 底层分层栈
    stack: LayeredStack,
    /// 挤出机扇出列表 (长度受 machine_extruder_count 约束)
    extruders: Vec<Arc<dyn ExtruderUnit>>,
}

impl ResolvingStack {
    /// 创建空解析栈: 全部槽位为共享空容器, 无挤出机
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            stack: LayeredStack::new(id),
            extruders: Vec::new(),
        }
    }

    // ==========================================
    // 底层栈委托
    // ==========================================

    /// 栈标识
    pub fn id(&self) -> &str {
        self.stack.id()
    }

    /// 显示名称
    pub fn name(&self) -> &str {
        self.stack.name()
    }

    /// 注册变更通知发布者
    pub fn set_event_publisher(&mut self, publisher: Arc<dyn SlotEventPublisher>) {
        self.stack.set_event_publisher(publisher);
    }

    /// 读取指定槽位的容器
    pub fn slot(&self, slot: StackSlot) -> &Arc<Container> {
        self.stack.slot(slot)
    }

    /// 读取全部 7 个槽位
    pub fn slots(&self) -> &[Arc<Container>; StackSlot::COUNT] {
        self.stack.slots()
    }

    /// 替换指定槽位的容器 (校验规则见 [`LayeredStack::set_slot`])
    pub fn set_slot(&mut self, slot: StackSlot, container: Arc<Container>) -> StackResult<()> {
        self.stack.set_slot(slot, container)
    }

    /// 追加容器: 固定槽位栈禁止
    pub fn add_container(&mut self, container: Arc<Container>) -> StackResult<()> {
        self.stack.add_container(container)
    }

    /// 插入容器: 固定槽位栈禁止
    pub fn insert_container(&mut self, index: usize, container: Arc<Container>) -> StackResult<()> {
        self.stack.insert_container(index, container)
    }

    /// 移除容器: 固定槽位栈禁止
    pub fn remove_container(&mut self, container: Arc<Container>) -> StackResult<()> {
        self.stack.remove_container(container)
    }

    /// 设置上游栈: 解析根禁止
    pub fn set_next_stack(&mut self, next: &LayeredStack) -> StackResult<()> {
        self.stack.set_next_stack(next)
    }

    /// 判断设置键是否携带操作员输入值
    pub fn has_user_value(&self, key: &str) -> bool {
        self.stack.has_user_value(key)
    }

    // ==========================================
    // 两阶段 value 解析
    // ==========================================

    /// 查询设置属性的有效值
    ///
    /// 仅当 `property == "value"` 时启用两阶段解析算法, 其余属性走
    /// 通用穿透查询:
    /// 1. 自上而下扫 6 个非定义槽位的 "value", 首个非缺失者胜出;
    /// 2. 无果则自上而下扫全部 7 个槽位的 "resolve", 首个非缺失者
    ///    胜出 (最高层的 resolve 胜, 而非定义层自己的);
    /// 3. 仍无果则取定义层自身的 "value" (可能缺失)。
    pub fn get_property(&self, key: &str, property: &str) -> Option<Value> {
        if property != PROPERTY_VALUE {
            return self.stack.get_property(key, property);
        }

        // 第一阶段: 非定义槽位的显式值
        for slot in &StackSlot::ALL[..StackSlot::COUNT - 1] {
            if let Some(value) = self.stack.slot(*slot).get_property(key, PROPERTY_VALUE) {
                return Some(value);
            }
        }

        // 第二阶段: 全部槽位的 resolve 回退
        for slot in StackSlot::ALL {
            if let Some(value) = self.stack.slot(slot).get_property(key, PROPERTY_RESOLVE) {
                return Some(value);
            }
        }

        // 第三阶段: 定义层自身默认值
        self.stack
            .slot(StackSlot::Definition)
            .get_property(key, PROPERTY_VALUE)
    }

    // ==========================================
    // 属性写入
    // ==========================================

    /// 写入属性到 UserChanges 槽位 (操作员覆写的默认落点)
    pub fn set_property(&mut self, key: &str, property: &str, value: Value) -> StackResult<()> {
        self.set_property_on(InstanceType::User, key, property, value)
    }

    /// 写入属性到指定实例槽位
    ///
    /// 目标由 [`InstanceType`] 给定, 定义层在类型上即不可成为写入目标。
    /// 目标槽位持共享空容器时写时复制出私有容器, 空容器本体不被改动。
    /// 写入本身不触发解析。
    pub fn set_property_on(
        &mut self,
        target: InstanceType,
        key: &str,
        property: &str,
        value: Value,
    ) -> StackResult<()> {
        let slot = target.slot();
        match Arc::make_mut(self.stack.slot_mut(slot)) {
            Container::Instance(instance) => {
                instance.set_property(key, property, value);
                Ok(())
            }
            // 实例槽位不变量下不可达, 穷举以封闭词表
            Container::Definition(definition) => Err(StackError::InvalidContainer(format!(
                "槽位 {} 持有定义容器 {}, 不可写入",
                slot,
                definition.id()
            ))),
        }
    }

    // ==========================================
    // 按 id 装配槽位
    // ==========================================

    /// 按 id 装配 Definition 槽位
    pub fn set_definition_by_id(
        &mut self,
        registry: &dyn ContainerRegistry,
        id: &str,
    ) -> StackResult<()> {
        self.set_slot_by_id(registry, StackSlot::Definition, id)
    }

    /// 按 id 装配 DefinitionChanges 槽位
    pub fn set_definition_changes_by_id(
        &mut self,
        registry: &dyn ContainerRegistry,
        id: &str,
    ) -> StackResult<()> {
        self.set_slot_by_id(registry, StackSlot::DefinitionChanges, id)
    }

    /// 按 id 装配 Variant 槽位
    pub fn set_variant_by_id(
        &mut self,
        registry: &dyn ContainerRegistry,
        id: &str,
    ) -> StackResult<()> {
        self.set_slot_by_id(registry, StackSlot::Variant, id)
    }

    /// 按 id 装配 Material 槽位
    pub fn set_material_by_id(
        &mut self,
        registry: &dyn ContainerRegistry,
        id: &str,
    ) -> StackResult<()> {
        self.set_slot_by_id(registry, StackSlot::Material, id)
    }

    /// 按 id 装配 Quality 槽位
    pub fn set_quality_by_id(
        &mut self,
        registry: &dyn ContainerRegistry,
        id: &str,
    ) -> StackResult<()> {
        self.set_slot_by_id(registry, StackSlot::Quality, id)
    }

    /// 按 id 装配 QualityChanges 槽位
    pub fn set_quality_changes_by_id(
        &mut self,
        registry: &dyn ContainerRegistry,
        id: &str,
    ) -> StackResult<()> {
        self.set_slot_by_id(registry, StackSlot::QualityChanges, id)
    }

    /// 按 (id, 槽位期望类型) 检索并装配
    ///
    /// 零匹配 → InvalidContainer 且槽位不变;
    /// 多匹配 → 取注册表排序的首个, 经 `set_slot` 装配 (约束复核)。
    fn set_slot_by_id(
        &mut self,
        registry: &dyn ContainerRegistry,
        slot: StackSlot,
        container_id: &str,
    ) -> StackResult<()> {
        let matches = match slot.expected_type() {
            Some(ty) => registry.find_instance_containers(Some(container_id), Some(ty)),
            None => registry.find_definition_containers(Some(container_id)),
        };

        let Some(container) = matches.into_iter().next() else {
            tracing::warn!(
                "注册表无匹配容器: stack={}, slot={}, id={}",
                self.id(),
                slot,
                container_id
            );
            return Err(StackError::InvalidContainer(format!(
                "注册表无匹配容器: id={container_id}, slot={slot}"
            )));
        };

        self.stack.set_slot(slot, container)
    }

    // ==========================================
    // 挤出机扇出
    // ==========================================

    /// 定义层声明的挤出机数量上限
    ///
    /// 经本栈的标准解析算法取 `machine_extruder_count` 的 "value";
    /// 缺失或非整数时返回 None。
    pub fn machine_extruder_count(&self) -> Option<i64> {
        self.get_property(MACHINE_EXTRUDER_COUNT, PROPERTY_VALUE)
            .and_then(|v| v.as_i64())
    }

    /// 追加挤出机单元
    ///
    /// # 返回
    /// - `Ok(())`: 已追加到列表尾部
    /// - `Err(TooManyExtruders)`: 已达上限, 列表不变
    ///
    /// 上限缺失时不设门槛 (机型未声明容量即不约束)。
    pub fn add_extruder(&mut self, extruder: Arc<dyn ExtruderUnit>) -> StackResult<()> {
        if let Some(limit) = self.machine_extruder_count() {
            if (self.extruders.len() as i64) + 1 > limit {
                tracing::warn!(
                    "拒绝追加挤出机: stack={}, extruder={}, 上限={}",
                    self.id(),
                    extruder.id(),
                    limit
                );
                return Err(StackError::TooManyExtruders { limit });
            }
        }
        tracing::debug!("追加挤出机: stack={}, extruder={}", self.id(), extruder.id());
        self.extruders.push(extruder);
        Ok(())
    }

    /// 挤出机扇出列表 (按追加顺序)
    pub fn extruders(&self) -> &[Arc<dyn ExtruderUnit>] {
        &self.extruders
    }

    // ==========================================
    // 配置文档装载
    // ==========================================

    /// 从配置文档文本装载全部槽位
    ///
    /// 对 7 个槽位逐一处理: 文档给出引用 id 的, 按 (id, 期望类型)
    /// 经注册表解析后装配; 未给出的装入共享空容器, 部分指定的文档
    /// 不会破坏 7 槽位不变量。
    ///
    /// # 返回
    /// - `Err`: 文档损坏、版本不兼容或引用无法解析。此失败不可恢复,
    ///   失败时可能已存在部分槽位状态, 调用方必须弃用整个栈。
    pub fn deserialize(
        &mut self,
        registry: &dyn ContainerRegistry,
        serialized: &str,
    ) -> anyhow::Result<()> {
        let document = StackDocument::parse(serialized)?;

        if let Some(name) = document.name() {
            self.stack.set_name(name);
        }

        for slot in StackSlot::ALL {
            match document.container_reference(slot) {
                Some(container_id) => {
                    let matches = match slot.expected_type() {
                        Some(ty) => {
                            registry.find_instance_containers(Some(container_id), Some(ty))
                        }
                        None => registry.find_definition_containers(Some(container_id)),
                    };
                    let container = matches.into_iter().next().ok_or_else(|| {
                        anyhow!(
                            "配置文档引用了无法解析的容器: slot={slot}, id={container_id}"
                        )
                    })?;
                    tracing::debug!(
                        "装载槽位引用: stack={}, slot={}, id={}",
                        self.id(),
                        slot,
                        container_id
                    );
                    self.stack
                        .set_slot(slot, container)
                        .with_context(|| format!("装配槽位 {slot} 失败"))?;
                }
                None => {
                    self.stack
                        .set_slot(slot, registry.empty_instance_container())
                        .with_context(|| format!("装配槽位 {slot} 失败"))?;
                }
            }
        }
        Ok(())
    }
}
