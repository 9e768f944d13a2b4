// ==========================================
// 分层栈集成测试
// ==========================================
// 测试范围:
// 1. 7 槽位不变量贯穿整个生命周期
// 2. 结构性变更一律拒绝且不留痕
// 3. 通用穿透查询的逐层优先级
// 4. 变更通知的先安装后发布时序
// ==========================================


use printer_settings::{
    empty_container, InstanceType, LayeredStack, StackError, StackSlot,
};
use serde_json::json;
use std::sync::Arc;
use test_helpers::{definition, instance, instance_with_property, RecordingPublisher};

// ==========================================
// 槽位不变量
// ==========================================

#[test]
fn test_slots_always_seven() {
    let mut stack = LayeredStack::new("TestStack");
    assert_eq!(stack.slots().len(), 7);

    // 装配、拒绝、再装配, 全程槽位数不变
    stack
        .set_slot(StackSlot::Material, instance("m", InstanceType::Material))
        .unwrap();
    assert_eq!(stack.slots().len(), 7);

    let _ = stack.set_slot(StackSlot::Quality, instance("bad", InstanceType::Material));
    assert_eq!(stack.slots().len(), 7);

    stack.set_slot(StackSlot::Material, empty_container()).unwrap();
    assert_eq!(stack.slots().len(), 7);

    // 空缺槽位是共享空容器, 不是缺失引用
    for slot in StackSlot::ALL {
        assert!(!stack.slot(slot).id().is_empty());
    }
}

#[test]
fn test_structural_mutation_always_rejected() {
    let mut stack = LayeredStack::new("TestStack");
    stack
        .set_slot(StackSlot::Quality, instance("q", InstanceType::Quality))
        .unwrap();
    let before: Vec<String> = stack.slots().iter().map(|c| c.id().to_string()).collect();

    assert!(matches!(
        stack.add_container(instance("x", InstanceType::User)),
        Err(StackError::InvalidOperation(_))
    ));
    assert!(matches!(
        stack.insert_container(3, instance("x", InstanceType::User)),
        Err(StackError::InvalidOperation(_))
    ));
    assert!(matches!(
        stack.remove_container(instance("q", InstanceType::Quality)),
        Err(StackError::InvalidOperation(_))
    ));
    let other = LayeredStack::new("upstream");
    assert!(matches!(
        stack.set_next_stack(&other),
        Err(StackError::InvalidOperation(_))
    ));

    let after: Vec<String> = stack.slots().iter().map(|c| c.id().to_string()).collect();
    assert_eq!(before, after);
}

// ==========================================
// 通用穿透查询
// ==========================================

/// 每个槽位单独持有 layer_height 时各自作答; 多槽位持有时最高层胜出
#[test]
fn test_fallthrough_ladder_bottom_up() {
    let mut stack = LayeredStack::new("TestStack");

    // 自底向上逐槽安装, 每一步后最新安装的 (最高的) 槽位胜出
    let install = |stack: &mut LayeredStack, slot: StackSlot| {
        let marker = json!(slot.index());
        let container = match slot.expected_type() {
            Some(ty) => instance_with_property(
                &format!("c{}", slot.index()),
                ty,
                "layer_height",
                "value",
                marker,
            ),
            None => Arc::new(
                printer_settings::DefinitionContainer::new("machine")
                    .with_property("layer_height", "value", marker)
                    .into(),
            ),
        };
        stack.set_slot(slot, container).unwrap();
    };

    for slot in StackSlot::ALL.iter().rev() {
        install(&mut stack, *slot);
        assert_eq!(
            stack.get_property("layer_height", "value"),
            Some(json!(slot.index())),
            "槽位 {slot} 安装后未胜出"
        );
    }
}

#[test]
fn test_fallthrough_single_slot_answers() {
    // 任一槽位单独持有属性时, 该槽位作答
    for slot in StackSlot::ALL {
        let mut stack = LayeredStack::new("TestStack");
        let container = match slot.expected_type() {
            Some(ty) => instance_with_property("only", ty, "layer_height", "value", json!(42)),
            None => Arc::new(
                printer_settings::DefinitionContainer::new("only")
                    .with_property("layer_height", "value", json!(42))
                    .into(),
            ),
        };
        stack.set_slot(slot, container).unwrap();

        assert_eq!(
            stack.get_property("layer_height", "value"),
            Some(json!(42)),
            "槽位 {slot} 单独持有时未作答"
        );
        assert_eq!(stack.get_property("infill_sparse_density", "value"), None);
    }
}

// ==========================================
// 操作员输入值判定
// ==========================================

#[test]
fn test_has_user_value_via_user_changes() {
    let mut stack = LayeredStack::new("TestStack");
    stack
        .set_slot(
            StackSlot::UserChanges,
            instance_with_property(
                "test_user_changes",
                InstanceType::User,
                "layer_height",
                "value",
                json!(0.1),
            ),
        )
        .unwrap();

    assert!(stack.has_user_value("layer_height"));
    assert!(!stack.has_user_value("infill_sparse_density"));
    assert!(!stack.has_user_value(""));
}

#[test]
fn test_has_user_value_via_quality_changes() {
    let mut stack = LayeredStack::new("TestStack");
    stack
        .set_slot(
            StackSlot::QualityChanges,
            instance_with_property(
                "test_quality_changes",
                InstanceType::QualityChanges,
                "layer_height",
                "value",
                json!(0.1),
            ),
        )
        .unwrap();

    assert!(stack.has_user_value("layer_height"));
    assert!(!stack.has_user_value("infill_sparse_density"));
    assert!(!stack.has_user_value(""));
}

#[test]
fn test_has_user_value_ignores_lower_slots() {
    // 仅 Quality 以下槽位持有时不算操作员输入
    let mut stack = LayeredStack::new("TestStack");
    stack
        .set_slot(
            StackSlot::Quality,
            instance_with_property("q", InstanceType::Quality, "layer_height", "value", json!(1)),
        )
        .unwrap();

    assert!(!stack.has_user_value("layer_height"));
}

// ==========================================
// 变更通知
// ==========================================

#[test]
fn test_notification_after_successful_install() {
    let publisher = RecordingPublisher::new();
    let mut stack = LayeredStack::new("TestStack");
    stack.set_event_publisher(Arc::new(publisher.clone()));

    stack
        .set_slot(StackSlot::Variant, instance("v", InstanceType::Variant))
        .unwrap();
    stack.set_slot(StackSlot::Definition, definition("machine")).unwrap();

    let events = publisher.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].stack_id, "TestStack");
    assert_eq!(events[0].slot, StackSlot::Variant);
    assert_eq!(events[1].slot, StackSlot::Definition);
}

#[test]
fn test_no_notification_on_rejected_install() {
    let publisher = RecordingPublisher::new();
    let mut stack = LayeredStack::new("TestStack");
    stack.set_event_publisher(Arc::new(publisher.clone()));

    let _ = stack.set_slot(StackSlot::Quality, instance("bad", InstanceType::Material));
    let _ = stack.add_container(instance("x", InstanceType::User));

    assert_eq!(publisher.len(), 0);
}
