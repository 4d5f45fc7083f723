//! Deci API - Session orchestration layer
//!
//! Provides unified execution interface, including:
//! - Session: a persistent machine fed statement by statement
//! - Configuration abstraction (RunConfig)
//! - Unified error handling (DeciError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `run(source, &config)` API.

use std::io::{BufRead, Write};
use std::sync::Arc;

use deci_log::{debug, info, Logger};

use deci_core::compiler::{assemble_source, AssembleStep, Assembler};
use deci_core::{InterpretResult, InterruptFlag, SharedOutput, SharedSink, Vm};

// Re-export config
pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};

// Re-export config types from deci_config
pub use deci_config::{LimitConfig, MachineConfig, Phase};

// Re-export error and types
pub mod error;
pub mod types;
pub use error::{DeciError, ErrorReport};
pub use types::{CompileOutput, ExecuteOutput};

// Re-export core types
pub use deci_core;
pub use deci_core::{Number, RuntimeError, Value};

/// 流式推进一次的结果
#[derive(Debug)]
pub enum StepOutcome {
    /// 一条语句执行完毕
    Executed,
    /// 语句还没凑齐，继续喂输入
    NeedMoreInput,
    /// 输入耗尽，尾部语句也已执行
    Finished,
    /// 收到 q，会话结束
    Quit,
    /// 出错（可恢复错误报告后可以继续 step）
    Error(DeciError),
}

/// 计算器会话
///
/// 持有跨语句存活的虚拟机与流式汇编器。两种用法：
/// - eval：一整段源码一次执行（-e、文件内容）
/// - feed + step：流式逐语句执行（REPL 从 stdin 读）
pub struct Session {
    vm: Vm,
    assembler: Assembler,
    capture: Option<SharedSink>,
    dump_bytecode: bool,
    logger: Arc<Logger>,
    quit: bool,
}

impl Session {
    /// 输出与 ? 输入由调用方注入
    pub fn new(
        config: &RunConfig,
        sink: Box<dyn Write + Send>,
        input: Box<dyn BufRead + Send>,
    ) -> Self {
        let vm = Vm::new(
            &config.machine,
            config.limits.clone(),
            sink,
            input,
            config.logger.clone(),
        );
        Self {
            assembler: Assembler::new(config.machine.extended_registers),
            vm,
            capture: None,
            dump_bytecode: config.dump_bytecode,
            logger: config.logger.clone(),
            quit: false,
        }
    }

    /// 捕获模式：输出进内存，? 读到 EOF
    pub fn capturing(config: &RunConfig) -> Self {
        let sink = SharedSink::new();
        let mut session = Self::new(config, Box::new(sink.clone()), Box::new(std::io::empty()));
        session.capture = Some(sink);
        session
    }

    /// 中断标志（交给信号处理器）
    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.vm.interrupt_flag()
    }

    /// 输出缓冲句柄（信号处理器升级退出前的尽力冲刷用）
    pub fn output_handle(&self) -> SharedOutput {
        self.vm.output_handle()
    }

    /// 是否已收到 q
    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// 当前 scale（诊断用）
    pub fn scale(&self) -> usize {
        self.vm.scale()
    }

    /// 主栈深度（诊断用）
    pub fn stack_depth(&self) -> usize {
        self.vm.stack_depth()
    }

    /// 执行一整段源码
    ///
    /// 宏语义：换行只是分隔符，整段一次汇编。出错时机器
    /// 状态保持原样，会话可以继续；错误语句在出错前捕获的
    /// 部分输出随错误一并丢弃，下一次 eval 只拿到自己的输出。
    pub fn eval(&mut self, source: &str) -> Result<ExecuteOutput, DeciError> {
        if self.quit {
            return Ok(self.output(true));
        }
        let chunk = assemble_source(source, self.vm.extended_registers())?;
        if self.dump_bytecode {
            debug!(self.logger, "{}", chunk.disassemble("eval"));
        }
        match self.vm.interpret(&chunk) {
            InterpretResult::Ok => Ok(self.output(false)),
            InterpretResult::Quit => {
                self.quit = true;
                Ok(self.output(true))
            }
            InterpretResult::RuntimeError(err) => {
                self.discard_captured();
                Err(DeciError::Runtime(err))
            }
        }
    }

    /// 流式喂入输入（不立即执行，配合 step）
    pub fn feed(&mut self, data: &[u8]) {
        self.assembler.feed(data);
    }

    /// 标记流式输入结束
    pub fn close_input(&mut self) {
        self.assembler.close();
    }

    /// 推进一步：汇编并执行下一条完成的语句
    ///
    /// 语法错误时本行已被丢弃，继续 step 从下一行恢复。
    pub fn step(&mut self) -> StepOutcome {
        if self.quit {
            return StepOutcome::Quit;
        }
        match self.assembler.assemble_statement() {
            Err(err) => StepOutcome::Error(DeciError::Syntax(err)),
            Ok(AssembleStep::Incomplete) => StepOutcome::NeedMoreInput,
            Ok(AssembleStep::Eof) => StepOutcome::Finished,
            Ok(AssembleStep::Statement(chunk)) => {
                if self.dump_bytecode {
                    debug!(self.logger, "{}", chunk.disassemble("statement"));
                }
                match self.vm.interpret(&chunk) {
                    InterpretResult::Ok => StepOutcome::Executed,
                    InterpretResult::Quit => {
                        self.quit = true;
                        StepOutcome::Quit
                    }
                    InterpretResult::RuntimeError(err) => {
                        StepOutcome::Error(DeciError::Runtime(err))
                    }
                }
            }
        }
    }

    /// 丢弃捕获模式下积累的输出（错误路径）
    fn discard_captured(&mut self) {
        if let Some(sink) = &self.capture {
            sink.clear();
        }
    }

    /// 取走捕获模式下积累的输出
    fn output(&mut self, quit: bool) -> ExecuteOutput {
        let stdout = match &self.capture {
            Some(sink) => {
                let text = sink.contents();
                sink.clear();
                text
            }
            None => String::new(),
        };
        ExecuteOutput { stdout, quit }
    }
}

/// Assemble with explicit configuration
pub fn compile(source: &str, config: &RunConfig) -> Result<CompileOutput, DeciError> {
    let chunk = assemble_source(source, config.machine.extended_registers)?;
    debug!(
        config.logger,
        "assembly completed: constants={}, code_bytes={}",
        chunk.constant_count(),
        chunk.len(),
    );
    Ok(CompileOutput { chunk })
}

/// Execute with explicit configuration
///
/// This is the recommended API for library users. Output is captured
/// and returned in `ExecuteOutput::stdout`.
pub fn run(source: &str, config: &RunConfig) -> Result<ExecuteOutput, DeciError> {
    info!(config.logger, "Starting execution");
    let mut session = Session::capturing(config);
    let output = session.eval(source)?;
    info!(config.logger, "Execution completed");
    Ok(output)
}

// ==================== Legacy API (using global config) ====================

/// Compile and run (uses global config)
///
/// # Panics
/// If global config is not initialized
pub fn compile_and_run(source: &str) -> Result<ExecuteOutput, DeciError> {
    run(source, get_config())
}

/// Quick run with default config (auto-initializes if needed)
pub fn quick_run(source: &str) -> Result<ExecuteOutput, DeciError> {
    if !is_initialized() {
        init_config(RunConfig::default());
    }
    compile_and_run(source)
}
