//! 运行时
//!
//! 字节码定义、值类型、十进制数、输出缓冲与栈式虚拟机。

pub mod bytecode;
pub mod error;
pub mod interrupt;
pub mod number;
pub mod output;
pub mod value;
pub mod vm;
