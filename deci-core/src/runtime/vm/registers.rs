//! 寄存器组
//!
//! 每个寄存器是一个独立的值栈，按需创建：
//! - s/l 操作寄存器栈顶（s 覆盖，l 复制）
//! - S/L 把寄存器当栈用（S 压入，L 弹出）
//!
//! 读空寄存器是错误，不是隐式的 0。

use crate::runtime::error::RuntimeError;
use crate::runtime::value::Value;

use super::Vm;

impl Vm {
    /// s：覆盖寄存器栈顶（空寄存器等价于压入）
    pub(super) fn reg_store(&mut self, reg: u16, value: Value) {
        let cells = self.registers.entry(reg).or_default();
        match cells.last_mut() {
            Some(top) => *top = value,
            None => cells.push(value),
        }
    }

    /// l：复制寄存器栈顶
    pub(super) fn reg_load(&self, reg: u16) -> Result<Value, RuntimeError> {
        self.registers
            .get(&reg)
            .and_then(|cells| cells.last())
            .cloned()
            .ok_or(RuntimeError::RegisterEmpty { reg })
    }

    /// S：压入寄存器栈
    pub(super) fn reg_push(&mut self, reg: u16, value: Value) {
        self.registers.entry(reg).or_default().push(value);
    }

    /// L：弹出寄存器栈
    pub(super) fn reg_pop(&mut self, reg: u16) -> Result<Value, RuntimeError> {
        self.registers
            .get_mut(&reg)
            .and_then(|cells| cells.pop())
            .ok_or(RuntimeError::RegisterEmpty { reg })
    }
}
