//! 指令分发循环
//!
//! 每条指令分发前是一个安全点：检查中断标志，有中断立即
//! 以 Interrupted 错误返回。q 不走错误通道，用 Flow::Quit
//! 沿调用链逐层递减，退满两层后恢复正常执行。

use std::cmp::Ordering;
use std::io::BufRead;

use crate::runtime::bytecode::chunk::Chunk;
use crate::runtime::bytecode::OpCode;
use crate::runtime::error::RuntimeError;
use crate::runtime::number::{Number, NumberError};
use crate::runtime::value::Value;

use super::Vm;

/// 一层宏执行的控制流结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// 执行到块尾
    Continue,
    /// q：还需要退出多少层（含当前层）
    Quit(usize),
}

/// 解释一个字节码块
///
/// depth 是宏嵌套深度，顶层为 0。
pub(super) fn run(vm: &mut Vm, chunk: &Chunk, depth: usize) -> Result<Flow, RuntimeError> {
    let mut ip = 0;
    while ip < chunk.len() {
        if vm.interrupt.take() {
            return Err(RuntimeError::Interrupted);
        }

        let byte = chunk
            .byte_at(ip)
            .ok_or_else(|| RuntimeError::Internal(format!("ip {ip} out of range")))?;
        let op = OpCode::from_u8(byte)
            .ok_or_else(|| RuntimeError::Internal(format!("bad opcode {byte:#04x} at {ip}")))?;

        #[cfg(feature = "trace_execution")]
        deci_log::trace!(
            vm.logger,
            "[depth {}] {:04} {} (stack {})",
            depth,
            ip,
            op.name(),
            vm.stack.len()
        );

        ip += 1;
        match op {
            OpCode::LoadConst => {
                let index = operand_u8(chunk, &mut ip, op)? as usize;
                let value = constant_at(chunk, index)?;
                vm.push(value)?;
            }
            OpCode::LoadConstWide => {
                let index = operand_u16(chunk, &mut ip, op)? as usize;
                let value = constant_at(chunk, index)?;
                vm.push(value)?;
            }

            // ===== 算术 =====
            OpCode::Add => binary(vm, "+", |a, b| a.add(b))?,
            OpCode::Sub => binary(vm, "-", |a, b| a.sub(b))?,
            OpCode::Mul => binary(vm, "*", |a, b| a.mul(b))?,
            OpCode::Div => binary_scaled(vm, "/", Number::div)?,
            OpCode::Rem => binary_scaled(vm, "%", Number::rem)?,
            OpCode::Pow => binary_scaled(vm, "^", Number::pow)?,
            OpCode::Sqrt => {
                let n = vm.pop_number("v")?;
                match n.sqrt(vm.scale) {
                    Ok(root) => vm.push(Value::Number(root))?,
                    Err(err) => {
                        vm.restore(Value::Number(n));
                        return Err(err.into());
                    }
                }
            }

            // ===== 打印 =====
            OpCode::Print => {
                let text = vm.peek("p")?.to_string();
                vm.out.write_str(&text)?;
                vm.out.putc(b'\n')?;
            }
            OpCode::PrintPop => {
                let value = vm.pop("n")?;
                let text = value.to_string();
                vm.out.write_str(&text)?;
            }
            OpCode::PrintStack => {
                let lines: Vec<String> = vm.iter_top_down().map(|v| v.to_string()).collect();
                for line in lines {
                    vm.out.write_str(&line)?;
                    vm.out.putc(b'\n')?;
                }
            }

            // ===== 栈操作 =====
            OpCode::ClearStack => vm.clear_stack(),
            OpCode::Dup => {
                let top = vm.peek("d")?.clone();
                vm.push(top)?;
            }
            OpCode::Swap => vm.swap_top("r")?,
            OpCode::Depth => {
                let depth_value = Number::from_u64(vm.stack.len() as u64);
                vm.push(Value::Number(depth_value))?;
            }

            // ===== 参数 =====
            OpCode::SetScale => {
                let n = vm.pop_number("k")?;
                match n.to_u64().and_then(|v| usize::try_from(v).ok()) {
                    Some(scale) => vm.scale = scale,
                    None => {
                        vm.restore(Value::Number(n));
                        return Err(RuntimeError::TypeMismatch {
                            op: "k",
                            found: "negative or oversized number",
                        });
                    }
                }
            }
            OpCode::PushScale => {
                vm.push(Value::Number(Number::from_u64(vm.scale as u64)))?;
            }
            OpCode::ScaleOf => {
                let value = vm.pop("X")?;
                let scale = match &value {
                    Value::Number(n) => n.scale(),
                    Value::Str(_) => 0,
                };
                vm.push(Value::Number(Number::from_u64(scale as u64)))?;
            }
            OpCode::DigitCount => {
                let value = vm.pop("Z")?;
                let count = match &value {
                    Value::Number(n) => n.digit_count(),
                    Value::Str(s) => s.len(),
                };
                vm.push(Value::Number(Number::from_u64(count as u64)))?;
            }

            // ===== 寄存器 =====
            OpCode::StoreReg => {
                let reg = operand_u16(chunk, &mut ip, op)?;
                let value = vm.pop("s")?;
                vm.reg_store(reg, value);
            }
            OpCode::LoadReg => {
                let reg = operand_u16(chunk, &mut ip, op)?;
                let value = vm.reg_load(reg)?;
                vm.push(value)?;
            }
            OpCode::PushReg => {
                let reg = operand_u16(chunk, &mut ip, op)?;
                let value = vm.pop("S")?;
                vm.reg_push(reg, value);
            }
            OpCode::PopReg => {
                let reg = operand_u16(chunk, &mut ip, op)?;
                let value = vm.reg_pop(reg)?;
                vm.push(value)?;
            }

            // ===== 控制流 =====
            OpCode::ExecMacro => {
                let body = vm.pop_macro("x")?;
                if let Some(flow) = invoke(vm, &body, depth)? {
                    return Ok(flow);
                }
            }
            OpCode::ExecIfGreater
            | OpCode::ExecIfNotGreater
            | OpCode::ExecIfLess
            | OpCode::ExecIfNotLess
            | OpCode::ExecIfEqual
            | OpCode::ExecIfNotEqual => {
                let reg = operand_u16(chunk, &mut ip, op)?;
                if let Some(flow) = conditional(vm, op, reg, depth)? {
                    return Ok(flow);
                }
            }
            OpCode::ReadLine => {
                // 阻塞读之前先把提示性输出放出去
                vm.out.flush()?;
                let mut line = String::new();
                let read = vm.input.read_line(&mut line)?;
                if read > 0 {
                    if let Some(flow) = invoke(vm, &line, depth)? {
                        return Ok(flow);
                    }
                }
            }
            OpCode::Quit => return Ok(Flow::Quit(2)),
        }
    }
    Ok(Flow::Continue)
}

/// 无精度参数的二元算术
fn binary(
    vm: &mut Vm,
    op: &'static str,
    apply: fn(&Number, &Number) -> Number,
) -> Result<(), RuntimeError> {
    let (a, b) = vm.pop_two_numbers(op)?;
    vm.push(Value::Number(apply(&a, &b)))
}

/// 带精度参数的二元算术，失败时恢复两个操作数
fn binary_scaled(
    vm: &mut Vm,
    op: &'static str,
    apply: fn(&Number, &Number, usize) -> Result<Number, NumberError>,
) -> Result<(), RuntimeError> {
    let (a, b) = vm.pop_two_numbers(op)?;
    match apply(&a, &b, vm.scale) {
        Ok(result) => vm.push(Value::Number(result)),
        Err(err) => {
            vm.restore(Value::Number(a));
            vm.restore(Value::Number(b));
            Err(err.into())
        }
    }
}

/// 汇编并执行一段宏
///
/// 返回 Some(flow) 表示当前层也要退出，None 表示继续。
fn invoke(vm: &mut Vm, source: &str, depth: usize) -> Result<Option<Flow>, RuntimeError> {
    if depth + 1 > vm.limits.max_recursion_depth {
        return Err(RuntimeError::RecursionLimit);
    }
    let chunk = crate::compiler::assemble_source(source, vm.extended_registers)
        .map_err(|err| RuntimeError::MacroSyntax(err.to_string()))?;
    match run(vm, &chunk, depth + 1)? {
        Flow::Continue => Ok(None),
        // q 退两层：宏本身算一层，剩余层数传给上级
        Flow::Quit(levels) if levels > 1 => Ok(Some(Flow::Quit(levels - 1))),
        Flow::Quit(_) => Ok(None),
    }
}

/// 条件执行：先弹的值在比较符左边
fn conditional(
    vm: &mut Vm,
    op: OpCode,
    reg: u16,
    depth: usize,
) -> Result<Option<Flow>, RuntimeError> {
    let op_name = match op {
        OpCode::ExecIfGreater => ">",
        OpCode::ExecIfNotGreater => "!>",
        OpCode::ExecIfLess => "<",
        OpCode::ExecIfNotLess => "!<",
        OpCode::ExecIfEqual => "=",
        _ => "!=",
    };
    let (below, top) = vm.pop_two_numbers(op_name)?;
    let ord = top.compare(&below);
    let fire = match op {
        OpCode::ExecIfGreater => ord == Ordering::Greater,
        OpCode::ExecIfNotGreater => ord != Ordering::Greater,
        OpCode::ExecIfLess => ord == Ordering::Less,
        OpCode::ExecIfNotLess => ord != Ordering::Less,
        OpCode::ExecIfEqual => ord == Ordering::Equal,
        _ => ord != Ordering::Equal,
    };
    if !fire {
        return Ok(None);
    }
    match vm.reg_load(reg)? {
        Value::Str(body) => invoke(vm, &body, depth),
        Value::Number(_) => Err(RuntimeError::TypeMismatch {
            op: op_name,
            found: "number",
        }),
    }
}

/// 读取 1 字节操作数
fn operand_u8(chunk: &Chunk, ip: &mut usize, op: OpCode) -> Result<u8, RuntimeError> {
    let byte = chunk
        .byte_at(*ip)
        .ok_or_else(|| RuntimeError::Internal(format!("truncated operand for {}", op.name())))?;
    *ip += 1;
    Ok(byte)
}

/// 读取 2 字节操作数（大端）
fn operand_u16(chunk: &Chunk, ip: &mut usize, op: OpCode) -> Result<u16, RuntimeError> {
    let value = chunk
        .u16_at(*ip)
        .ok_or_else(|| RuntimeError::Internal(format!("truncated operand for {}", op.name())))?;
    *ip += 2;
    Ok(value)
}

fn constant_at(chunk: &Chunk, index: usize) -> Result<Value, RuntimeError> {
    chunk
        .constant(index)
        .cloned()
        .ok_or_else(|| RuntimeError::Internal(format!("constant index {index} out of range")))
}
