//! 虚拟机端到端测试
//!
//! 源码直接进汇编器再进虚拟机，输出从 SharedSink 捞回来，
//! 整条链路和 CLI 实际跑的一致。

mod common;

use deci_core::compiler::{AssembleStep, Assembler};
use deci_core::{InterpretResult, LimitConfig, MachineConfig, RuntimeError};

use common::{eval, machine, machine_with, run, run_ok};

// ===== 基本运算与打印 =====

#[test]
fn test_add_and_print() {
    assert_eq!(run_ok("3 4 + p"), "7\n");
}

#[test]
fn test_print_does_not_pop() {
    assert_eq!(run_ok("5 p p"), "5\n5\n");
}

#[test]
fn test_print_pop_no_newline() {
    assert_eq!(run_ok("1 2 n n"), "21");
}

#[test]
fn test_print_stack_top_down() {
    assert_eq!(run_ok("1 2 3 f"), "3\n2\n1\n");
}

#[test]
fn test_negative_literal_and_subtraction() {
    assert_eq!(run_ok("_5 3 - p"), "-8\n");
    assert_eq!(run_ok("3 5 - p"), "-2\n");
}

#[test]
fn test_fractional_output_format() {
    assert_eq!(run_ok("2k 1 2 / p"), ".50\n");
    assert_eq!(run_ok("_1 2 * .25 * p"), "-.50\n");
}

// ===== 栈操作 =====

#[test]
fn test_dup_swap_clear_depth() {
    assert_eq!(run_ok("5 d + p"), "10\n");
    assert_eq!(run_ok("1 2 r - p"), "1\n");
    assert_eq!(run_ok("1 2 3 c z p"), "0\n");
    assert_eq!(run_ok("9 9 9 z p"), "3\n");
}

#[test]
fn test_balanced_push_pop_restores_depth() {
    let (mut vm, _sink) = machine();
    eval(&mut vm, "7");
    let before = vm.stack_depth();
    eval(&mut vm, "1 2 3 4 sa sa sa sa");
    assert_eq!(vm.stack_depth(), before);
}

// ===== scale 与数字检查 =====

#[test]
fn test_scale_commands() {
    assert_eq!(run_ok("K p"), "0\n");
    assert_eq!(run_ok("3k K p"), "3\n");
    assert_eq!(run_ok("1.250 X p"), "3\n");
    assert_eq!(run_ok("123.45 Z p"), "5\n");
}

#[test]
fn test_scale_applies_to_division() {
    assert_eq!(run_ok("10 3 / p"), "3\n");
    assert_eq!(run_ok("4k 10 3 / p"), "3.3333\n");
}

#[test]
fn test_sqrt_uses_scale() {
    assert_eq!(run_ok("4k 2 v p"), "1.4142\n");
    assert_eq!(run_ok("16 v p"), "4\n");
}

// ===== 寄存器 =====

#[test]
fn test_store_load() {
    assert_eq!(run_ok("42 sa la la + p"), "84\n");
}

#[test]
fn test_register_stack_push_pop() {
    assert_eq!(run_ok("1 Sa 2 Sa La La f"), "1\n2\n");
}

#[test]
fn test_empty_register_is_error() {
    let (result, _) = run("la");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::RegisterEmpty { .. })
    ));
}

#[test]
fn test_extended_register_names() {
    let config = MachineConfig {
        extended_registers: true,
        ..MachineConfig::default()
    };
    let (mut vm, sink) = machine_with(&config, LimitConfig::default(), "");
    let result = eval(&mut vm, "42 sAB lAB p");
    assert!(matches!(result, InterpretResult::Ok));
    assert_eq!(sink.contents(), "42\n");
}

// ===== 宏与条件执行 =====

#[test]
fn test_execute_macro() {
    assert_eq!(run_ok("[2 3 +] x p"), "5\n");
}

#[test]
fn test_macro_spanning_lines() {
    assert_eq!(run_ok("[1\n2\n+] x p"), "3\n");
}

#[test]
fn test_execute_number_is_type_error() {
    let (result, _) = run("5 x");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::TypeMismatch { op: "x", .. })
    ));
}

#[test]
fn test_conditionals_compare_first_popped_left() {
    // 先弹出的在比较符左边：5 3 <a 比较 3 < 5
    assert_eq!(run_ok("[1 p]sa 5 3 <a"), "1\n");
    assert_eq!(run_ok("[1 p]sa 3 5 <a"), "");
    assert_eq!(run_ok("[1 p]sa 3 5 >a"), "1\n");
    assert_eq!(run_ok("[1 p]sa 4 4 =a"), "1\n");
    assert_eq!(run_ok("[1 p]sa 4 4 !=a"), "");
    assert_eq!(run_ok("[1 p]sa 5 3 !<a"), "");
    assert_eq!(run_ok("[1 p]sa 5 3 !>a"), "1\n");
}

#[test]
fn test_conditional_on_empty_register() {
    let (result, _) = run("1 2 =a");
    // 条件不成立就不碰寄存器
    assert!(matches!(result, InterpretResult::Ok));

    let (result, _) = run("4 4 =a");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::RegisterEmpty { .. })
    ));
}

#[test]
fn test_macro_syntax_error_is_runtime_error() {
    let (result, _) = run("[1 @ 2] x");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::MacroSyntax(_))
    ));
}

#[test]
fn test_recursion_limit() {
    // la 取出宏自己再执行：无限递归
    let (result, _) = run("[lax] d sa x");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::RecursionLimit)
    ));
}

// ===== q 的两层退出语义 =====

#[test]
fn test_quit_at_top_level_ends_session() {
    let (result, output) = run("1 p q 2 p");
    assert!(matches!(result, InterpretResult::Quit));
    assert_eq!(output, "1\n");
}

#[test]
fn test_quit_in_macro_quits_two_levels() {
    // 宏里的 q 连顶层一起退
    let (result, output) = run("[q] x 5 p");
    assert!(matches!(result, InterpretResult::Quit));
    assert_eq!(output, "");
}

#[test]
fn test_quit_in_nested_macro_spares_top_level() {
    // 最里层的 q 退掉两层宏，顶层继续
    let (result, output) = run("[[q] x 1 p] x 2 p");
    assert!(matches!(result, InterpretResult::Ok));
    assert_eq!(output, "2\n");
}

// ===== ? 读行执行 =====

#[test]
fn test_read_line_executes_input() {
    let (mut vm, sink) = machine_with(
        &MachineConfig::default(),
        LimitConfig::default(),
        "2 3 +\n",
    );
    let result = eval(&mut vm, "? p");
    assert!(matches!(result, InterpretResult::Ok));
    assert_eq!(sink.contents(), "5\n");
}

#[test]
fn test_read_line_at_eof_is_noop() {
    let (mut vm, sink) = machine_with(&MachineConfig::default(), LimitConfig::default(), "");
    let result = eval(&mut vm, "1 ? p");
    assert!(matches!(result, InterpretResult::Ok));
    assert_eq!(sink.contents(), "1\n");
}

// ===== 错误与状态保持 =====

#[test]
fn test_divide_by_zero_prints_nothing() {
    let (result, output) = run("5 0 / p");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::DivideByZero)
    ));
    assert_eq!(output, "");
}

#[test]
fn test_stack_underflow_names_operator() {
    let (result, _) = run("1 +");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::StackUnderflow { op: "+" })
    ));
}

#[test]
fn test_error_preserves_machine_state() {
    let (mut vm, sink) = machine();
    eval(&mut vm, "3k 8");
    let result = eval(&mut vm, "0 /");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::DivideByZero)
    ));
    // scale 与操作数原样保留，会话可以继续
    assert_eq!(vm.scale(), 3);
    assert_eq!(vm.stack_depth(), 2);
    eval(&mut vm, "+ p");
    assert_eq!(sink.contents(), "8\n");
}

#[test]
fn test_stack_overflow() {
    let limits = LimitConfig {
        max_stack_depth: 4,
        ..LimitConfig::default()
    };
    let (mut vm, _sink) = machine_with(&MachineConfig::default(), limits, "");
    let result = eval(&mut vm, "1 2 3 4 5");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::StackOverflow)
    ));
}

#[test]
fn test_huge_exponent() {
    let (result, _) = run("2 10000000 ^");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::HugeExponent)
    ));
}

// ===== 中断 =====

#[test]
fn test_interrupt_stops_execution() {
    let (mut vm, sink) = machine();
    vm.interrupt_flag().trigger();
    let result = eval(&mut vm, "1 p");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::Interrupted)
    ));
    assert_eq!(sink.contents(), "");
}

#[test]
fn test_interrupt_is_consumed_once() {
    let (mut vm, sink) = machine();
    vm.interrupt_flag().trigger();
    let result = eval(&mut vm, "1 p");
    assert!(matches!(
        result,
        InterpretResult::RuntimeError(RuntimeError::Interrupted)
    ));
    // 下一条语句正常执行
    let result = eval(&mut vm, "2 p");
    assert!(matches!(result, InterpretResult::Ok));
    assert_eq!(sink.contents(), "2\n");
}

// ===== 流式逐语句执行 =====

#[test]
fn test_streaming_statements_drive_vm() {
    let (mut vm, sink) = machine();
    let mut asm = Assembler::new(false);

    // 模拟逐块到达的输入，语句跨块
    for piece in [&b"2 3"[..], b" +\n", b"p\n"] {
        asm.feed(piece);
        loop {
            match asm.assemble_statement().unwrap() {
                AssembleStep::Statement(chunk) => {
                    assert!(matches!(vm.interpret(&chunk), InterpretResult::Ok));
                }
                AssembleStep::Incomplete => break,
                AssembleStep::Eof => break,
            }
        }
    }
    asm.close();
    if let AssembleStep::Statement(chunk) = asm.assemble_statement().unwrap() {
        vm.interpret(&chunk);
    }
    assert_eq!(sink.contents(), "5\n");
}

#[test]
fn test_syntax_error_recovery_keeps_session_alive() {
    let (mut vm, sink) = machine();
    let mut asm = Assembler::new(false);
    asm.feed(b"1 2 @ +\n40 2 + p\n");
    asm.close();

    assert!(asm.assemble_statement().is_err());
    match asm.assemble_statement().unwrap() {
        AssembleStep::Statement(chunk) => {
            assert!(matches!(vm.interpret(&chunk), InterpretResult::Ok));
        }
        other => panic!("expected statement, got {other:?}"),
    }
    assert_eq!(sink.contents(), "42\n");
}
