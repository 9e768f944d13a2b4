// ==========================================
// 设置栈核心库 - 引擎错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 文档反序列化的不可恢复失败走 anyhow 通道,
//       不属于本枚举的任何一类
// ==========================================

use thiserror::Error;

/// 设置栈引擎错误类型
///
/// 每一类错误发生时栈状态保持不变, 调用方可安全重试或放弃。
#[derive(Error, Debug)]
pub enum StackError {
    // ===== 结构性错误 =====
    /// 槽位集合的数量与顺序为架构常量, 运行期禁止增删改排
    #[error("非法操作: {0}")]
    InvalidOperation(String),

    // ===== 容器约束错误 =====
    /// 容器形态/类型与目标槽位不符, 或按 id 检索无匹配
    #[error("非法容器: {0}")]
    InvalidContainer(String),

    // ===== 扇出容量错误 =====
    /// 挤出机列表已达定义层声明的上限
    #[error("挤出机数量超出上限: 上限={limit}")]
    TooManyExtruders { limit: i64 },
}

/// Result 类型别名
pub type StackResult<T> = Result<T, StackError>;
