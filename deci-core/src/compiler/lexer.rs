//! 流式词法分析
//!
//! dc 语言没有关键字，token 就是单字符命令、数字、方括号
//! 字符串和带寄存器名的复合命令。词法器建立在 ByteStream 的
//! 预读之上：只有整个 token 都可见时才消费字节，输入不完整
//! 就返回 Incomplete 原地等待，绝不吃掉半个 token。
//!
//! 换行是语句边界，发 End token；`#` 注释吃到行尾。

use crate::kit::stream::{ByteStream, StreamResult};
use crate::kit::SourcePosition;
use crate::runtime::number::Number;

use super::error::{SyntaxError, SyntaxErrorKind};

/// 无操作数的单字符命令
const COMMANDS: &[u8] = b"+-*/%^vpnfcdrzkKXZxq?";

/// 寄存器类命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegOp {
    /// s
    Store,
    /// l
    Load,
    /// S
    PushReg,
    /// L
    PopReg,
    /// >R
    Greater,
    /// !>R
    NotGreater,
    /// <R
    Less,
    /// !<R
    NotLess,
    /// =R
    Equal,
    /// !=R
    NotEqual,
}

/// 词法单元
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// 数字字面量
    Number(Number),
    /// 方括号字符串（不含外层方括号）
    Str(String),
    /// 单字符命令
    Command(u8),
    /// 寄存器类命令
    Register { op: RegOp, index: u16 },
    /// 语句边界（换行）
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: SourcePosition,
}

/// 一次词法推进的结果
#[derive(Debug, Clone, PartialEq)]
pub enum LexStep {
    Token(Token),
    /// 输入不完整，喂更多字节后重试
    Incomplete,
    /// 输入结束
    Eof,
}

/// 流式词法分析器
pub struct Lexer {
    stream: ByteStream,
    /// 扩展寄存器模式：寄存器名占两个字节（大端拼接编号）
    extended_registers: bool,
    /// 错误恢复中：丢弃字节直到下一行
    skipping: bool,
}

impl Lexer {
    pub fn new(extended_registers: bool) -> Self {
        Self {
            stream: ByteStream::new(),
            extended_registers,
            skipping: false,
        }
    }

    /// 喂入输入；流已关闭时返回 false
    pub fn feed(&mut self, data: &[u8]) -> bool {
        self.stream.feed(data)
    }

    /// 标记输入结束
    pub fn close(&mut self) {
        self.stream.close();
    }

    pub fn position(&self) -> SourcePosition {
        self.stream.position()
    }

    /// 进入错误恢复：丢弃当前行剩余内容
    ///
    /// 下一次 next_step 会一直消费到换行，然后发 End token
    /// 让上层回到语句边界。
    pub fn begin_skip(&mut self) {
        self.skipping = true;
    }

    /// 取下一个 token
    pub fn next_step(&mut self) -> Result<LexStep, SyntaxError> {
        if self.skipping {
            return Ok(self.drain_line());
        }
        loop {
            match self.stream.try_peek(0) {
                StreamResult::Incomplete => return Ok(LexStep::Incomplete),
                StreamResult::Eof => return Ok(LexStep::Eof),
                StreamResult::Ok(byte) => match byte {
                    b' ' | b'\t' | b'\r' => self.stream.consume(1),
                    b'#' => {
                        if let Some(step) = self.skip_comment() {
                            return Ok(step);
                        }
                    }
                    b'\n' => {
                        let position = self.stream.position();
                        self.stream.consume(1);
                        return Ok(LexStep::Token(Token {
                            kind: TokenKind::End,
                            position,
                        }));
                    }
                    b'0'..=b'9' | b'_' | b'.' => return self.lex_number(),
                    b'[' => return self.lex_string(),
                    b's' => return self.lex_register(RegOp::Store, 1, 's'),
                    b'l' => return self.lex_register(RegOp::Load, 1, 'l'),
                    b'S' => return self.lex_register(RegOp::PushReg, 1, 'S'),
                    b'L' => return self.lex_register(RegOp::PopReg, 1, 'L'),
                    b'>' => return self.lex_register(RegOp::Greater, 1, '>'),
                    b'<' => return self.lex_register(RegOp::Less, 1, '<'),
                    b'=' => return self.lex_register(RegOp::Equal, 1, '='),
                    b'!' => return self.lex_bang(),
                    _ if COMMANDS.contains(&byte) => {
                        let position = self.stream.position();
                        self.stream.consume(1);
                        return Ok(LexStep::Token(Token {
                            kind: TokenKind::Command(byte),
                            position,
                        }));
                    }
                    other => {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnknownCommand(other as char),
                            self.stream.position(),
                        ));
                    }
                },
            }
        }
    }

    /// 恢复模式：消费到换行为止
    fn drain_line(&mut self) -> LexStep {
        loop {
            match self.stream.try_peek(0) {
                StreamResult::Ok(b'\n') => {
                    let position = self.stream.position();
                    self.stream.consume(1);
                    self.skipping = false;
                    return LexStep::Token(Token {
                        kind: TokenKind::End,
                        position,
                    });
                }
                StreamResult::Ok(_) => self.stream.consume(1),
                StreamResult::Incomplete => return LexStep::Incomplete,
                StreamResult::Eof => {
                    self.skipping = false;
                    return LexStep::Eof;
                }
            }
        }
    }

    /// 注释内容可以边看边丢，换行本身留给 End token
    fn skip_comment(&mut self) -> Option<LexStep> {
        loop {
            match self.stream.try_peek(0) {
                StreamResult::Ok(b'\n') | StreamResult::Eof => return None,
                StreamResult::Ok(_) => self.stream.consume(1),
                StreamResult::Incomplete => return Some(LexStep::Incomplete),
            }
        }
    }

    /// 数字：`[_]?digits[.digits]`
    ///
    /// 第二个小数点终止 token（`1.2.3` 是 1.2 和 .3 两个数）。
    fn lex_number(&mut self) -> Result<LexStep, SyntaxError> {
        let position = self.stream.position();
        let mut bytes: Vec<u8> = Vec::new();
        let mut len = 0;
        let mut seen_dot = false;
        let mut digit_count = 0;

        if let StreamResult::Ok(b'_') = self.stream.try_peek(0) {
            bytes.push(b'_');
            len = 1;
        }
        loop {
            match self.stream.try_peek(len) {
                StreamResult::Ok(b @ b'0'..=b'9') => {
                    bytes.push(b);
                    digit_count += 1;
                    len += 1;
                }
                StreamResult::Ok(b'.') if !seen_dot => {
                    bytes.push(b'.');
                    seen_dot = true;
                    len += 1;
                }
                StreamResult::Ok(_) | StreamResult::Eof => break,
                StreamResult::Incomplete => return Ok(LexStep::Incomplete),
            }
        }

        if digit_count == 0 {
            // 孤立的 `_` 或 `.`
            return Err(SyntaxError::new(SyntaxErrorKind::MalformedNumber, position));
        }
        let text: String = bytes.iter().map(|&b| b as char).collect();
        let number: Number = text
            .parse()
            .map_err(|_| SyntaxError::new(SyntaxErrorKind::MalformedNumber, position))?;
        self.stream.consume(len);
        Ok(LexStep::Token(Token {
            kind: TokenKind::Number(number),
            position,
        }))
    }

    /// 方括号字符串，嵌套方括号按深度配对
    fn lex_string(&mut self) -> Result<LexStep, SyntaxError> {
        let position = self.stream.position();
        let mut bytes: Vec<u8> = Vec::new();
        let mut depth = 1usize;
        let mut k = 1;
        loop {
            match self.stream.try_peek(k) {
                StreamResult::Ok(b'[') => {
                    depth += 1;
                    bytes.push(b'[');
                    k += 1;
                }
                StreamResult::Ok(b']') => {
                    depth -= 1;
                    k += 1;
                    if depth == 0 {
                        break;
                    }
                    bytes.push(b']');
                }
                StreamResult::Ok(b) => {
                    bytes.push(b);
                    k += 1;
                }
                StreamResult::Incomplete => return Ok(LexStep::Incomplete),
                StreamResult::Eof => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnterminatedString,
                        position,
                    ));
                }
            }
        }
        self.stream.consume(k);
        Ok(LexStep::Token(Token {
            kind: TokenKind::Str(String::from_utf8_lossy(&bytes).into_owned()),
            position,
        }))
    }

    /// 寄存器类命令：prefix 个命令字节 + 1 或 2 个寄存器名字节
    fn lex_register(
        &mut self,
        op: RegOp,
        prefix: usize,
        shown: char,
    ) -> Result<LexStep, SyntaxError> {
        let position = self.stream.position();
        let width = if self.extended_registers { 2 } else { 1 };
        let mut index: u16 = 0;
        for k in 0..width {
            match self.stream.try_peek(prefix + k) {
                StreamResult::Ok(byte) => index = (index << 8) | byte as u16,
                StreamResult::Incomplete => return Ok(LexStep::Incomplete),
                StreamResult::Eof => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::MissingRegister(shown),
                        position,
                    ));
                }
            }
        }
        self.stream.consume(prefix + width);
        Ok(LexStep::Token(Token {
            kind: TokenKind::Register { op, index },
            position,
        }))
    }

    /// `!` 只能开头取反比较命令
    fn lex_bang(&mut self) -> Result<LexStep, SyntaxError> {
        match self.stream.try_peek(1) {
            StreamResult::Ok(b'>') => self.lex_register(RegOp::NotGreater, 2, '>'),
            StreamResult::Ok(b'<') => self.lex_register(RegOp::NotLess, 2, '<'),
            StreamResult::Ok(b'=') => self.lex_register(RegOp::NotEqual, 2, '='),
            StreamResult::Incomplete => Ok(LexStep::Incomplete),
            _ => Err(SyntaxError::new(
                SyntaxErrorKind::UnknownCommand('!'),
                self.stream.position(),
            )),
        }
    }
}
