// ==========================================
// 设置栈核心库 - 固定槽位分层栈
// ==========================================
// 职责: 持有 7 个固定槽位并实现通用自上而下穿透查询
// 红线: 槽位恒满 7 个, 空缺处放共享空容器, 永不为 null;
//       槽位集合运行期禁止增删改排
// ==========================================

use crate::domain::container::{empty_container, Container};
use crate::domain::types::StackSlot;
use crate::engine::events::{OptionalSlotEventPublisher, SlotChangedEvent, SlotEventPublisher};
use crate::error::{StackError, StackResult};
use serde_json::Value;
use std::sync::Arc;

/// 设置键上承载显式值的属性名
pub const PROPERTY_VALUE: &str = "value";

// ==========================================
// LayeredStack - 分层栈
// ==========================================

/// 固定 7 槽位的分层配置栈
///
/// 每个槽位持有一个容器 (可能是共享空容器), 按优先级自上而下穿透查询。
/// 本栈是解析根, 不存在上游栈; 唯一的链接方向是挤出机扇出
/// (见 `ResolvingStack`)。
#[derive(Debug)]
pub struct LayeredStack {
    /// 栈标识 (生命周期内稳定)
    id: String,
    /// 显示名称 (可被配置文档覆盖)
    name: String,
    /// 7 个槽位, 下标即优先级 (0 = UserChanges, 6 = Definition)
    slots: [Arc<Container>; StackSlot::COUNT],
    /// 变更通知发布者
    publisher: OptionalSlotEventPublisher,
}

impl LayeredStack {
    /// 创建新栈, 全部槽位填充共享空容器
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let empty = empty_container();
        Self {
            name: id.clone(),
            id,
            slots: std::array::from_fn(|_| empty.clone()),
            publisher: OptionalSlotEventPublisher::none(),
        }
    }

    /// 栈标识
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 显示名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 修改显示名称 (标识不可变, 名称可变)
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// 注册变更通知发布者 (按栈实例注册)
    pub fn set_event_publisher(&mut self, publisher: Arc<dyn SlotEventPublisher>) {
        self.publisher = OptionalSlotEventPublisher::with_publisher(publisher);
    }

    // ==========================================
    // 槽位读取
    // ==========================================

    /// 读取指定槽位的容器 (恒为有效容器, 可能是空容器)
    pub fn slot(&self, slot: StackSlot) -> &Arc<Container> {
        &self.slots[slot.index()]
    }

    /// 读取全部 7 个槽位
    pub fn slots(&self) -> &[Arc<Container>; StackSlot::COUNT] {
        &self.slots
    }

    /// 槽位容器的可变入口 (供解析栈按目标槽位写属性)
    pub(crate) fn slot_mut(&mut self, slot: StackSlot) -> &mut Arc<Container> {
        &mut self.slots[slot.index()]
    }

    // ==========================================
    // 槽位写入
    // ==========================================

    /// 替换指定槽位的容器
    ///
    /// 校验规则:
    /// - 共享空容器: 任何槽位均接受
    /// - 6 个实例槽位: 要求实例容器且类型标签与槽位一致
    /// - Definition 槽位: 要求定义容器 (按结构变体, 不按标签)
    ///
    /// # 返回
    /// - `Ok(())`: 已替换并发出变更通知
    /// - `Err(InvalidContainer)`: 校验失败, 原占用者保持不变
    pub fn set_slot(&mut self, slot: StackSlot, container: Arc<Container>) -> StackResult<()> {
        if !slot_accepts(slot, &container) {
            tracing::warn!(
                "拒绝槽位赋值: stack={}, slot={}, container={}",
                self.id,
                slot,
                container.id()
            );
            return Err(StackError::InvalidContainer(format!(
                "容器 {} 不符合槽位 {} 的约束",
                container.id(),
                slot
            )));
        }

        tracing::debug!(
            "安装容器: stack={}, slot={}, container={}",
            self.id,
            slot,
            container.id()
        );
        self.slots[slot.index()] = container;

        // 先安装后通知; 通知失败不回滚安装
        let event = SlotChangedEvent::new(self.id.clone(), slot);
        if let Err(e) = self.publisher.publish(event) {
            tracing::warn!("变更通知发布失败: stack={}, slot={}, error={}", self.id, slot, e);
        }
        Ok(())
    }

    // ==========================================
    // 结构性变更 (一律禁止)
    // ==========================================

    /// 追加容器: 固定槽位栈禁止
    pub fn add_container(&mut self, _container: Arc<Container>) -> StackResult<()> {
        Err(StackError::InvalidOperation(
            "固定槽位栈不支持追加容器".to_string(),
        ))
    }

    /// 插入容器: 固定槽位栈禁止
    pub fn insert_container(&mut self, _index: usize, _container: Arc<Container>) -> StackResult<()> {
        Err(StackError::InvalidOperation(
            "固定槽位栈不支持插入容器".to_string(),
        ))
    }

    /// 移除容器: 固定槽位栈禁止
    pub fn remove_container(&mut self, _container: Arc<Container>) -> StackResult<()> {
        Err(StackError::InvalidOperation(
            "固定槽位栈不支持移除容器".to_string(),
        ))
    }

    /// 设置上游栈: 本栈是解析根, 禁止
    pub fn set_next_stack(&mut self, _next: &LayeredStack) -> StackResult<()> {
        Err(StackError::InvalidOperation(
            "解析根栈不支持设置上游栈".to_string(),
        ))
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 通用自上而下穿透查询
    ///
    /// 自 UserChanges 至 Definition 逐槽检查: 第一个 `has_property`
    /// 为真的槽位立即以其 `get_property` 作答 (即便答案为缺失);
    /// 全部槽位均无此属性则返回 None。
    pub fn get_property(&self, key: &str, property: &str) -> Option<Value> {
        for container in &self.slots {
            if container.has_property(key, property) {
                return container.get_property(key, property);
            }
        }
        None
    }

    /// 判断设置键是否携带操作员输入值
    ///
    /// UserChanges 或 QualityChanges 槽位存在该键的 "value" 属性即为真;
    /// 空键恒为假。
    pub fn has_user_value(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        self.slots[StackSlot::UserChanges.index()].has_property(key, PROPERTY_VALUE)
            || self.slots[StackSlot::QualityChanges.index()].has_property(key, PROPERTY_VALUE)
    }
}

// ==========================================
// 槽位约束校验
// ==========================================

/// 判断容器是否满足槽位约束
fn slot_accepts(slot: StackSlot, container: &Container) -> bool {
    // 空容器填充任何空缺槽位
    if container.is_empty_sentinel() {
        return true;
    }
    match slot.expected_type() {
        // 实例槽位: 类型标签必须与槽位一致
        Some(expected) => match container {
            Container::Instance(c) => c.container_type() == Some(expected),
            Container::Definition(_) => false,
        },
        // Definition 槽位: 必须是定义容器结构变体
        None => matches!(container, Container::Definition(_)),
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::{DefinitionContainer, InstanceContainer};
    use crate::domain::types::InstanceType;
    use serde_json::json;

    fn instance(id: &str, ty: InstanceType) -> Arc<Container> {
        Arc::new(InstanceContainer::new(id, ty).into())
    }

    #[test]
    fn test_new_stack_fully_populated() {
        let stack = LayeredStack::new("TestStack");
        assert_eq!(stack.slots().len(), StackSlot::COUNT);
        for slot in StackSlot::ALL {
            assert!(stack.slot(slot).is_empty_sentinel());
        }
    }

    #[test]
    fn test_set_slot_type_constraint() {
        let mut stack = LayeredStack::new("TestStack");

        // 类型匹配: 接受
        assert!(stack
            .set_slot(StackSlot::Quality, instance("q", InstanceType::Quality))
            .is_ok());
        assert_eq!(stack.slot(StackSlot::Quality).id(), "q");

        // 类型不匹配: 拒绝且原占用者不变
        let result = stack.set_slot(StackSlot::Quality, instance("m", InstanceType::Material));
        assert!(matches!(result, Err(StackError::InvalidContainer(_))));
        assert_eq!(stack.slot(StackSlot::Quality).id(), "q");
    }

    #[test]
    fn test_set_slot_definition_structural_check() {
        let mut stack = LayeredStack::new("TestStack");

        // 实例容器进 Definition 槽位: 拒绝
        let result = stack.set_slot(
            StackSlot::Definition,
            instance("wrong", InstanceType::Material),
        );
        assert!(matches!(result, Err(StackError::InvalidContainer(_))));

        // 定义容器进实例槽位: 拒绝
        let definition: Arc<Container> = Arc::new(DefinitionContainer::new("machine").into());
        let result = stack.set_slot(StackSlot::UserChanges, definition.clone());
        assert!(matches!(result, Err(StackError::InvalidContainer(_))));

        // 定义容器进 Definition 槽位: 接受
        assert!(stack.set_slot(StackSlot::Definition, definition).is_ok());
        assert_eq!(stack.slot(StackSlot::Definition).id(), "machine");
    }

    #[test]
    fn test_empty_sentinel_accepted_everywhere() {
        let mut stack = LayeredStack::new("TestStack");
        for slot in StackSlot::ALL {
            assert!(stack.set_slot(slot, empty_container()).is_ok());
        }
    }

    #[test]
    fn test_structural_mutation_forbidden() {
        let mut stack = LayeredStack::new("TestStack");
        let container = instance("x", InstanceType::User);

        assert!(matches!(
            stack.add_container(container.clone()),
            Err(StackError::InvalidOperation(_))
        ));
        assert!(matches!(
            stack.insert_container(0, container.clone()),
            Err(StackError::InvalidOperation(_))
        ));
        assert!(matches!(
            stack.remove_container(container),
            Err(StackError::InvalidOperation(_))
        ));

        let other = LayeredStack::new("OtherStack");
        assert!(matches!(
            stack.set_next_stack(&other),
            Err(StackError::InvalidOperation(_))
        ));

        // 槽位未被动过
        for slot in StackSlot::ALL {
            assert!(stack.slot(slot).is_empty_sentinel());
        }
    }

    #[test]
    fn test_get_property_fallthrough_topmost_wins() {
        let mut stack = LayeredStack::new("TestStack");

        let quality = InstanceContainer::new("q", InstanceType::Quality)
            .with_property("layer_height", "value", json!(0.2));
        let material = InstanceContainer::new("m", InstanceType::Material)
            .with_property("layer_height", "value", json!(0.3));

        stack
            .set_slot(StackSlot::Material, Arc::new(material.into()))
            .unwrap();
        assert_eq!(
            stack.get_property("layer_height", "value"),
            Some(json!(0.3))
        );

        // 更高优先级槽位安装后覆盖
        stack
            .set_slot(StackSlot::Quality, Arc::new(quality.into()))
            .unwrap();
        assert_eq!(
            stack.get_property("layer_height", "value"),
            Some(json!(0.2))
        );

        // 无人持有的键
        assert_eq!(stack.get_property("infill_sparse_density", "value"), None);
    }

    #[test]
    fn test_has_user_value() {
        let mut stack = LayeredStack::new("TestStack");
        assert!(!stack.has_user_value("layer_height"));

        let user = InstanceContainer::new("u", InstanceType::User)
            .with_property("layer_height", "value", json!(0.1));
        stack
            .set_slot(StackSlot::UserChanges, Arc::new(user.into()))
            .unwrap();

        assert!(stack.has_user_value("layer_height"));
        assert!(!stack.has_user_value("infill_sparse_density"));
        assert!(!stack.has_user_value(""));
    }
}
