//! 栈式虚拟机
//!
//! 机器状态 = 主栈 + 寄存器组 + scale + 输出缓冲。
//! 所有状态集中在 Vm 结构体里，不依赖全局变量；
//! 同一个 Vm 跨语句存活，REPL 的状态连续性由此而来。

mod execution;
mod registers;
mod stack;

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Arc;

use deci_config::{LimitConfig, MachineConfig};
use deci_log::{debug, Logger};

use crate::runtime::bytecode::chunk::Chunk;
use crate::runtime::error::RuntimeError;
use crate::runtime::interrupt::InterruptFlag;
use crate::runtime::output::SharedOutput;
use crate::runtime::value::Value;

pub use execution::Flow;

/// 一段字节码的解释结果
#[derive(Debug)]
pub enum InterpretResult {
    /// 正常执行完毕
    Ok,
    /// 遇到 q，会话应当结束
    Quit,
    /// 运行时错误（机器状态保持错误发生前的样子）
    RuntimeError(RuntimeError),
}

/// 虚拟机
pub struct Vm {
    /// 主栈
    stack: Vec<Value>,
    /// 寄存器组：每个寄存器是一个独立的值栈
    registers: HashMap<u16, Vec<Value>>,
    /// 当前 scale（除法、取余、乘方、开方的精度）
    scale: usize,
    /// 输出缓冲（信号线程持有同一句柄做尽力冲刷）
    out: SharedOutput,
    /// ? 命令的输入源
    input: Box<dyn BufRead + Send>,
    /// 中断标志（信号处理器共享）
    interrupt: InterruptFlag,
    /// 深度限制
    limits: LimitConfig,
    /// 扩展寄存器模式（影响宏的重新汇编）
    extended_registers: bool,
    logger: Arc<Logger>,
}

impl Vm {
    /// 创建虚拟机
    ///
    /// 输出与输入都由调用方注入，核心不接触终端。
    pub fn new(
        machine: &MachineConfig,
        limits: LimitConfig,
        sink: Box<dyn Write + Send>,
        input: Box<dyn BufRead + Send>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            stack: Vec::with_capacity(machine.initial_stack_capacity),
            registers: HashMap::new(),
            scale: machine.initial_scale,
            out: SharedOutput::new(sink, machine.output_buffer_capacity),
            input,
            interrupt: InterruptFlag::new(),
            limits,
            extended_registers: machine.extended_registers,
            logger,
        }
    }

    /// 中断标志的克隆（交给信号处理器）
    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    /// 输出缓冲句柄的克隆（交给信号处理器做尽力冲刷）
    pub fn output_handle(&self) -> SharedOutput {
        self.out.clone()
    }

    /// 当前 scale
    pub fn scale(&self) -> usize {
        self.scale
    }

    /// 主栈深度
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// 是否启用扩展寄存器模式
    pub fn extended_registers(&self) -> bool {
        self.extended_registers
    }

    /// 解释一段字节码（顶层入口）
    ///
    /// 错误发生时机器状态保持原样，调用方报告后可以继续
    /// 投喂下一条语句。执行结束后冲刷输出。
    pub fn interpret(&mut self, chunk: &Chunk) -> InterpretResult {
        let result = execution::run(self, chunk, 0);
        if let Err(flush_err) = self.out.flush() {
            // 执行错误优先于冲刷错误
            return match result {
                Err(err) => InterpretResult::RuntimeError(err),
                Ok(_) => InterpretResult::RuntimeError(flush_err),
            };
        }
        match result {
            Ok(Flow::Continue) => InterpretResult::Ok,
            Ok(Flow::Quit(_)) => InterpretResult::Quit,
            Err(err) => {
                debug!(self.logger, "runtime error: {}", err);
                InterpretResult::RuntimeError(err)
            }
        }
    }
}
