//! 字节码汇编
//!
//! 把 token 流翻译成字节码块。两种用法：
//! - assemble_statement：流式，换行出一条语句，供 REPL 和
//!   逐行执行；语法错误时丢弃本行重来
//! - 整段汇编（见 mod.rs 的 assemble_source）：宏体和 -e
//!   文本一次性成块，换行只是分隔符

use crate::kit::SourcePosition;
use crate::runtime::bytecode::chunk::Chunk;
use crate::runtime::bytecode::OpCode;
use crate::runtime::value::Value;

use super::error::{SyntaxError, SyntaxErrorKind};
use super::lexer::{LexStep, Lexer, RegOp, Token, TokenKind};

/// 一次汇编推进的结果
#[derive(Debug)]
pub enum AssembleStep {
    /// 一条完整语句
    Statement(Chunk),
    /// 需要更多输入
    Incomplete,
    /// 输入结束
    Eof,
}

/// 流式汇编器
pub struct Assembler {
    lexer: Lexer,
    /// 跨 Incomplete 保留的未完成语句
    pending: Chunk,
}

impl Assembler {
    pub fn new(extended_registers: bool) -> Self {
        Self {
            lexer: Lexer::new(extended_registers),
            pending: Chunk::new(),
        }
    }

    /// 喂入输入；流已关闭时返回 false
    pub fn feed(&mut self, data: &[u8]) -> bool {
        self.lexer.feed(data)
    }

    /// 标记输入结束
    pub fn close(&mut self) {
        self.lexer.close();
    }

    /// 汇编下一条语句（到换行或 EOF 为止）
    ///
    /// 出错时丢弃本行已积累的半条语句并进入恢复模式，
    /// 下一次调用从下一行开始。
    pub fn assemble_statement(&mut self) -> Result<AssembleStep, SyntaxError> {
        loop {
            let step = match self.lexer.next_step() {
                Ok(step) => step,
                Err(err) => return Err(self.recover(err)),
            };
            match step {
                LexStep::Incomplete => return Ok(AssembleStep::Incomplete),
                LexStep::Eof => {
                    if self.pending.is_empty() {
                        return Ok(AssembleStep::Eof);
                    }
                    return Ok(AssembleStep::Statement(self.pending.take()));
                }
                LexStep::Token(token) => {
                    if matches!(token.kind, TokenKind::End) {
                        if !self.pending.is_empty() {
                            return Ok(AssembleStep::Statement(self.pending.take()));
                        }
                        continue;
                    }
                    if let Err(err) = self.emit(token) {
                        return Err(self.recover(err));
                    }
                }
            }
        }
    }

    /// 整段汇编的推进（换行不是边界），供 assemble_source 使用
    pub(super) fn assemble_all(&mut self) -> Result<Chunk, SyntaxError> {
        loop {
            match self.lexer.next_step()? {
                LexStep::Token(token) => {
                    if !matches!(token.kind, TokenKind::End) {
                        self.emit(token)?;
                    }
                }
                // close 之后不会出现 Incomplete，防御性兜底
                LexStep::Incomplete | LexStep::Eof => return Ok(self.pending.take()),
            }
        }
    }

    /// 丢弃半条语句，让词法器跳到下一行
    fn recover(&mut self, err: SyntaxError) -> SyntaxError {
        self.pending.clear();
        self.lexer.begin_skip();
        err
    }

    /// 翻译一个 token
    fn emit(&mut self, token: Token) -> Result<(), SyntaxError> {
        // kind 里的 Number/Str 会被移出，位置先拷出来
        let position = token.position;
        let line = position.line;
        match token.kind {
            TokenKind::Number(n) => self.emit_constant(Value::Number(n), position, line),
            TokenKind::Str(s) => self.emit_constant(Value::Str(s), position, line),
            TokenKind::Command(byte) => {
                let op = command_opcode(byte).ok_or_else(|| {
                    SyntaxError::new(SyntaxErrorKind::UnknownCommand(byte as char), position)
                })?;
                self.pending.write_op(op, line);
                Ok(())
            }
            TokenKind::Register { op, index } => {
                self.pending.write_op(register_opcode(op), line);
                self.pending.write_u16(index, line);
                Ok(())
            }
            TokenKind::End => Ok(()),
        }
    }

    /// 常量进表，短索引用单字节指令
    fn emit_constant(
        &mut self,
        value: Value,
        position: SourcePosition,
        line: usize,
    ) -> Result<(), SyntaxError> {
        if self.pending.constant_count() > u16::MAX as usize {
            return Err(SyntaxError::new(SyntaxErrorKind::TooManyConstants, position));
        }
        let index = self.pending.add_constant(value);
        if index <= u8::MAX as usize {
            self.pending.write_op(OpCode::LoadConst, line);
            self.pending.write_byte(index as u8, line);
        } else {
            self.pending.write_op(OpCode::LoadConstWide, line);
            self.pending.write_u16(index as u16, line);
        }
        Ok(())
    }
}

/// 单字符命令到操作码
fn command_opcode(byte: u8) -> Option<OpCode> {
    Some(match byte {
        b'+' => OpCode::Add,
        b'-' => OpCode::Sub,
        b'*' => OpCode::Mul,
        b'/' => OpCode::Div,
        b'%' => OpCode::Rem,
        b'^' => OpCode::Pow,
        b'v' => OpCode::Sqrt,
        b'p' => OpCode::Print,
        b'n' => OpCode::PrintPop,
        b'f' => OpCode::PrintStack,
        b'c' => OpCode::ClearStack,
        b'd' => OpCode::Dup,
        b'r' => OpCode::Swap,
        b'z' => OpCode::Depth,
        b'k' => OpCode::SetScale,
        b'K' => OpCode::PushScale,
        b'X' => OpCode::ScaleOf,
        b'Z' => OpCode::DigitCount,
        b'x' => OpCode::ExecMacro,
        b'?' => OpCode::ReadLine,
        b'q' => OpCode::Quit,
        _ => return None,
    })
}

fn register_opcode(op: RegOp) -> OpCode {
    match op {
        RegOp::Store => OpCode::StoreReg,
        RegOp::Load => OpCode::LoadReg,
        RegOp::PushReg => OpCode::PushReg,
        RegOp::PopReg => OpCode::PopReg,
        RegOp::Greater => OpCode::ExecIfGreater,
        RegOp::NotGreater => OpCode::ExecIfNotGreater,
        RegOp::Less => OpCode::ExecIfLess,
        RegOp::NotLess => OpCode::ExecIfNotLess,
        RegOp::Equal => OpCode::ExecIfEqual,
        RegOp::NotEqual => OpCode::ExecIfNotEqual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(source: &str) -> Chunk {
        let mut asm = Assembler::new(false);
        asm.feed(source.as_bytes());
        asm.close();
        match asm.assemble_statement().unwrap() {
            AssembleStep::Statement(chunk) => chunk,
            other => panic!("expected statement, got {other:?}"),
        }
    }

    #[test]
    fn test_assemble_arithmetic_statement() {
        let chunk = statement("2 3 +p\n");
        // LoadConst 0, LoadConst 1, Add, Print
        assert_eq!(chunk.byte_at(0), Some(OpCode::LoadConst as u8));
        assert_eq!(chunk.byte_at(1), Some(0));
        assert_eq!(chunk.byte_at(2), Some(OpCode::LoadConst as u8));
        assert_eq!(chunk.byte_at(3), Some(1));
        assert_eq!(chunk.byte_at(4), Some(OpCode::Add as u8));
        assert_eq!(chunk.byte_at(5), Some(OpCode::Print as u8));
        assert_eq!(chunk.constant_count(), 2);
    }

    #[test]
    fn test_mixed_constant_kinds_in_one_statement() {
        // 数字和字符串常量各走一条 emit 分支
        let chunk = statement("1.5 [3 p]\n");
        assert_eq!(chunk.constant_count(), 2);
        assert!(matches!(chunk.constant(0), Some(Value::Number(_))));
        assert!(matches!(chunk.constant(1), Some(Value::Str(s)) if s == "3 p"));
    }

    #[test]
    fn test_assemble_register_command() {
        let chunk = statement("5sa\n");
        assert_eq!(chunk.byte_at(2), Some(OpCode::StoreReg as u8));
        assert_eq!(chunk.u16_at(3), Some(b'a' as u16));
    }

    #[test]
    fn test_trailing_statement_without_newline() {
        let chunk = statement("1 2 +");
        assert_eq!(chunk.byte_at(4), Some(OpCode::Add as u8));
    }

    #[test]
    fn test_statement_per_line() {
        let mut asm = Assembler::new(false);
        asm.feed(b"1\n2\n");
        asm.close();
        let first = match asm.assemble_statement().unwrap() {
            AssembleStep::Statement(c) => c,
            other => panic!("expected statement, got {other:?}"),
        };
        let second = match asm.assemble_statement().unwrap() {
            AssembleStep::Statement(c) => c,
            other => panic!("expected statement, got {other:?}"),
        };
        assert_eq!(first.constant_count(), 1);
        assert_eq!(second.constant_count(), 1);
        assert!(matches!(
            asm.assemble_statement().unwrap(),
            AssembleStep::Eof
        ));
    }

    #[test]
    fn test_blank_lines_produce_no_statement() {
        let mut asm = Assembler::new(false);
        asm.feed(b"\n\n  \n");
        asm.close();
        assert!(matches!(
            asm.assemble_statement().unwrap(),
            AssembleStep::Eof
        ));
    }

    #[test]
    fn test_incomplete_statement_survives_feeds() {
        let mut asm = Assembler::new(false);
        asm.feed(b"1 2 ");
        assert!(matches!(
            asm.assemble_statement().unwrap(),
            AssembleStep::Incomplete
        ));
        asm.feed(b"+\n");
        let chunk = match asm.assemble_statement().unwrap() {
            AssembleStep::Statement(c) => c,
            other => panic!("expected statement, got {other:?}"),
        };
        assert_eq!(chunk.constant_count(), 2);
        assert_eq!(chunk.byte_at(4), Some(OpCode::Add as u8));
    }

    #[test]
    fn test_error_discards_line_and_recovers() {
        let mut asm = Assembler::new(false);
        asm.feed(b"1 2 @ +\n3 4 +\n");
        asm.close();

        let err = asm.assemble_statement().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnknownCommand('@'));

        // 出错行整行丢弃，下一行完整可用
        let chunk = match asm.assemble_statement().unwrap() {
            AssembleStep::Statement(c) => c,
            other => panic!("expected statement, got {other:?}"),
        };
        assert_eq!(chunk.constant_count(), 2);
        assert_eq!(chunk.byte_at(4), Some(OpCode::Add as u8));
    }

    #[test]
    fn test_error_position_reported() {
        let mut asm = Assembler::new(false);
        asm.feed(b"1\n2 @\n");
        asm.close();
        let _ = asm.assemble_statement().unwrap();
        let err = asm.assemble_statement().unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 3);
    }
}
