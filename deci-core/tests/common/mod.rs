//! 集成测试共用工具

use deci_core::compiler::assemble_source;
use deci_core::{InterpretResult, LimitConfig, MachineConfig, SharedSink, Vm};
use deci_log::Logger;

/// 新建一台输出被捕获的虚拟机
pub fn machine() -> (Vm, SharedSink) {
    machine_with(&MachineConfig::default(), LimitConfig::default(), "")
}

/// 定制配置与 ? 命令输入源
pub fn machine_with(
    config: &MachineConfig,
    limits: LimitConfig,
    input: &str,
) -> (Vm, SharedSink) {
    let sink = SharedSink::new();
    let vm = Vm::new(
        config,
        limits,
        Box::new(sink.clone()),
        Box::new(std::io::Cursor::new(input.as_bytes().to_vec())),
        Logger::noop(),
    );
    (vm, sink)
}

/// 在给定虚拟机上执行一段源码
pub fn eval(vm: &mut Vm, source: &str) -> InterpretResult {
    let chunk = assemble_source(source, vm.extended_registers())
        .unwrap_or_else(|err| panic!("assemble failed for {source:?}: {err}"));
    vm.interpret(&chunk)
}

/// 执行一段源码并返回输出，运行必须成功
pub fn run_ok(source: &str) -> String {
    let (mut vm, sink) = machine();
    match eval(&mut vm, source) {
        InterpretResult::Ok | InterpretResult::Quit => sink.contents(),
        InterpretResult::RuntimeError(err) => panic!("runtime error for {source:?}: {err}"),
    }
}

/// 执行一段源码，返回结果与输出
pub fn run(source: &str) -> (InterpretResult, String) {
    let (mut vm, sink) = machine();
    let result = eval(&mut vm, source);
    (result, sink.contents())
}
