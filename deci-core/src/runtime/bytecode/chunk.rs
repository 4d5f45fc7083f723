//! 字节码块
//!
//! 一段指令流加上它引用的常量表。汇编器按语句填充，
//! 虚拟机顺序解释。行号表与指令流等长，供错误定位。

use std::fmt::Write as _;

use super::OpCode;
use crate::runtime::value::Value;

/// 字节码块
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// 指令流：操作码与内联操作数
    code: Vec<u8>,
    /// 常量表
    constants: Vec<Value>,
    /// 每个指令字节对应的源行号
    lines: Vec<usize>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// 写入操作码
    pub fn write_op(&mut self, op: OpCode, line: usize) {
        self.code.push(op as u8);
        self.lines.push(line);
    }

    /// 写入 1 字节操作数
    pub fn write_byte(&mut self, byte: u8, line: usize) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// 写入 2 字节操作数（大端）
    pub fn write_u16(&mut self, value: u16, line: usize) {
        self.code.push((value >> 8) as u8);
        self.code.push((value & 0xff) as u8);
        self.lines.push(line);
        self.lines.push(line);
    }

    /// 登记常量，返回索引
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// 常量个数
    pub fn constant_count(&self) -> usize {
        self.constants.len()
    }

    /// 读取偏移处的指令字节
    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// 读取偏移处的 2 字节操作数（大端）
    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        let hi = self.code.get(offset).copied()?;
        let lo = self.code.get(offset + 1).copied()?;
        Some(((hi as u16) << 8) | lo as u16)
    }

    /// 读取常量
    pub fn constant(&self, index: usize) -> Option<&Value> {
        self.constants.get(index)
    }

    /// 偏移处的源行号
    pub fn line_at(&self, offset: usize) -> usize {
        self.lines.get(offset).copied().unwrap_or(0)
    }

    /// 清空，保留已分配容量
    pub fn clear(&mut self) {
        self.code.clear();
        self.constants.clear();
        self.lines.clear();
    }

    /// 取走内容，自身复位
    pub fn take(&mut self) -> Chunk {
        std::mem::take(self)
    }

    /// 反汇编为可读列表
    pub fn disassemble(&self, name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {name} ==");
        let mut offset = 0;
        while offset < self.code.len() {
            offset = self.disassemble_instruction(&mut out, offset);
        }
        out
    }

    fn disassemble_instruction(&self, out: &mut String, offset: usize) -> usize {
        let _ = write!(out, "{offset:04} ");
        let byte = self.code[offset];
        let Some(op) = OpCode::from_u8(byte) else {
            let _ = writeln!(out, "??{byte:02x}");
            return offset + 1;
        };

        match op.operand_size() {
            1 => {
                let operand = self.byte_at(offset + 1).unwrap_or(0);
                if op == OpCode::LoadConst {
                    let value = self
                        .constant(operand as usize)
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "<bad index>".to_string());
                    let _ = writeln!(out, "{:<16} {operand:4} ; {value}", op.name());
                } else {
                    let _ = writeln!(out, "{:<16} {operand:4}", op.name());
                }
            }
            2 => {
                let operand = self.u16_at(offset + 1).unwrap_or(0);
                if op == OpCode::LoadConstWide {
                    let value = self
                        .constant(operand as usize)
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "<bad index>".to_string());
                    let _ = writeln!(out, "{:<16} {operand:4} ; {value}", op.name());
                } else {
                    let _ = writeln!(out, "{:<16} {operand:4}", op.name());
                }
            }
            _ => {
                let _ = writeln!(out, "{}", op.name());
            }
        }
        offset + 1 + op.operand_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::number::Number;

    #[test]
    fn test_chunk_write_and_read() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(Number::from_u64(42)));
        chunk.write_op(OpCode::LoadConst, 1);
        chunk.write_byte(idx as u8, 1);
        chunk.write_op(OpCode::Print, 1);

        assert_eq!(chunk.len(), 3);
        assert_eq!(chunk.byte_at(0), Some(OpCode::LoadConst as u8));
        assert_eq!(chunk.byte_at(1), Some(0));
        assert_eq!(chunk.byte_at(2), Some(OpCode::Print as u8));
        assert_eq!(chunk.line_at(0), 1);
    }

    #[test]
    fn test_u16_big_endian() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::StoreReg, 1);
        chunk.write_u16(0x0161, 1);
        assert_eq!(chunk.byte_at(1), Some(0x01));
        assert_eq!(chunk.byte_at(2), Some(0x61));
        assert_eq!(chunk.u16_at(1), Some(0x0161));
    }

    #[test]
    fn test_take_resets() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Quit, 1);
        let taken = chunk.take();
        assert_eq!(taken.len(), 1);
        assert!(chunk.is_empty());
        assert_eq!(chunk.constant_count(), 0);
    }

    #[test]
    fn test_disassemble_shows_constants() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(Number::from_u64(7)));
        chunk.write_op(OpCode::LoadConst, 1);
        chunk.write_byte(idx as u8, 1);
        chunk.write_op(OpCode::Add, 1);

        let listing = chunk.disassemble("test");
        assert!(listing.contains("== test =="));
        assert!(listing.contains("LOAD_CONST"));
        assert!(listing.contains("; 7"));
        assert!(listing.contains("ADD"));
    }
}
