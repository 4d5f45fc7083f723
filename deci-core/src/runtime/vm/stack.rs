//! 主栈操作
//!
//! 弹出失败（深度不足、类型不符）时把已弹出的值放回去，
//! 保证出错的指令不改变机器状态。

use crate::runtime::error::RuntimeError;
use crate::runtime::number::Number;
use crate::runtime::value::Value;

use super::Vm;

impl Vm {
    /// 压栈，超出深度限制报 StackOverflow
    pub(super) fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.limits.max_stack_depth {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    /// 把刚弹出的值放回去（错误恢复路径，不做深度检查）
    pub(super) fn restore(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub(super) fn pop(&mut self, op: &'static str) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow { op })
    }

    pub(super) fn peek(&self, op: &'static str) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow { op })
    }

    /// 弹出一个数字
    pub(super) fn pop_number(&mut self, op: &'static str) -> Result<Number, RuntimeError> {
        match self.pop(op)? {
            Value::Number(n) => Ok(n),
            other => {
                let found = other.type_name();
                self.restore(other);
                Err(RuntimeError::TypeMismatch { op, found })
            }
        }
    }

    /// 弹出两个数字，返回 (次顶, 栈顶)
    pub(super) fn pop_two_numbers(
        &mut self,
        op: &'static str,
    ) -> Result<(Number, Number), RuntimeError> {
        if self.stack.len() < 2 {
            return Err(RuntimeError::StackUnderflow { op });
        }
        let top = self.pop_number(op)?;
        match self.pop_number(op) {
            Ok(below) => Ok((below, top)),
            Err(err) => {
                self.restore(Value::Number(top));
                Err(err)
            }
        }
    }

    /// 弹出一个字符串（宏体）
    pub(super) fn pop_macro(&mut self, op: &'static str) -> Result<String, RuntimeError> {
        match self.pop(op)? {
            Value::Str(s) => Ok(s),
            other => {
                let found = other.type_name();
                self.restore(other);
                Err(RuntimeError::TypeMismatch { op, found })
            }
        }
    }

    /// 交换栈顶两项
    pub(super) fn swap_top(&mut self, op: &'static str) -> Result<(), RuntimeError> {
        let len = self.stack.len();
        if len < 2 {
            return Err(RuntimeError::StackUnderflow { op });
        }
        self.stack.swap(len - 1, len - 2);
        Ok(())
    }

    /// 清空主栈
    pub(super) fn clear_stack(&mut self) {
        self.stack.clear();
    }

    /// 从栈顶到栈底遍历（f 命令的顺序）
    pub(super) fn iter_top_down(&self) -> impl Iterator<Item = &Value> {
        self.stack.iter().rev()
    }
}
