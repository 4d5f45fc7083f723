//! 编译前端：词法分析与字节码汇编

pub mod assembler;
pub mod error;
pub mod lexer;

pub use assembler::{AssembleStep, Assembler};
pub use error::{SyntaxError, SyntaxErrorKind};
pub use lexer::{LexStep, Lexer, RegOp, Token, TokenKind};

use crate::runtime::bytecode::chunk::Chunk;

/// 一次性汇编整段源码
///
/// 宏体和 -e 文本走这里：换行只是分隔符，整段出一个块。
/// 任何语法错误都让整段失败，没有逐行恢复。
pub fn assemble_source(source: &str, extended_registers: bool) -> Result<Chunk, SyntaxError> {
    let mut assembler = Assembler::new(extended_registers);
    assembler.feed(source.as_bytes());
    assembler.close();
    assembler.assemble_all()
}
