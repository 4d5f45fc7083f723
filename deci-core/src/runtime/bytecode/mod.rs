//! 字节码指令集
//!
//! 单字节操作码，操作数内联在指令流中：
//! - LoadConst: 1 字节常量索引；LoadConstWide: 2 字节（大端）
//! - 寄存器类指令：2 字节寄存器编号（大端）
//! - 其余指令无操作数

pub mod chunk;

/// 操作码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// 压入常量（1 字节索引）
    LoadConst = 0,
    /// 压入常量（2 字节索引）
    LoadConstWide,

    // ===== 算术 =====
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Sqrt,

    // ===== 打印 =====
    /// p：打印栈顶加换行，不弹出
    Print,
    /// n：弹出并打印，无换行
    PrintPop,
    /// f：从栈顶到栈底逐行打印整个栈
    PrintStack,

    // ===== 栈操作 =====
    /// c：清空栈
    ClearStack,
    /// d：复制栈顶
    Dup,
    /// r：交换栈顶两项
    Swap,
    /// z：压入当前栈深度
    Depth,

    // ===== 参数 =====
    /// k：弹出并设为 scale
    SetScale,
    /// K：压入当前 scale
    PushScale,
    /// X：弹出，压入其小数位数
    ScaleOf,
    /// Z：弹出，压入其有效位数
    DigitCount,

    // ===== 寄存器（2 字节编号） =====
    /// s：弹出存入寄存器（覆盖栈顶）
    StoreReg,
    /// l：读寄存器栈顶压入（不弹出）
    LoadReg,
    /// S：弹出压入寄存器栈
    PushReg,
    /// L：弹出寄存器栈压入主栈
    PopReg,

    // ===== 控制流 =====
    /// x：弹出，字符串则作为宏执行，数字则报类型错误
    ExecMacro,
    /// >R：先弹 a 再弹 b，a > b 时执行寄存器 R 的宏
    ExecIfGreater,
    /// !>R
    ExecIfNotGreater,
    /// <R
    ExecIfLess,
    /// !<R
    ExecIfNotLess,
    /// =R
    ExecIfEqual,
    /// !=R
    ExecIfNotEqual,
    /// ?：读一行输入并执行
    ReadLine,
    /// q：退出两层宏（顶层则结束会话）
    Quit,
}

impl OpCode {
    /// 操作数字节数
    pub fn operand_size(self) -> usize {
        match self {
            OpCode::LoadConst => 1,
            OpCode::LoadConstWide
            | OpCode::StoreReg
            | OpCode::LoadReg
            | OpCode::PushReg
            | OpCode::PopReg
            | OpCode::ExecIfGreater
            | OpCode::ExecIfNotGreater
            | OpCode::ExecIfLess
            | OpCode::ExecIfNotLess
            | OpCode::ExecIfEqual
            | OpCode::ExecIfNotEqual => 2,
            _ => 0,
        }
    }

    /// 指令名（反汇编与日志用）
    pub fn name(self) -> &'static str {
        match self {
            OpCode::LoadConst => "LOAD_CONST",
            OpCode::LoadConstWide => "LOAD_CONST_WIDE",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Rem => "REM",
            OpCode::Pow => "POW",
            OpCode::Sqrt => "SQRT",
            OpCode::Print => "PRINT",
            OpCode::PrintPop => "PRINT_POP",
            OpCode::PrintStack => "PRINT_STACK",
            OpCode::ClearStack => "CLEAR_STACK",
            OpCode::Dup => "DUP",
            OpCode::Swap => "SWAP",
            OpCode::Depth => "DEPTH",
            OpCode::SetScale => "SET_SCALE",
            OpCode::PushScale => "PUSH_SCALE",
            OpCode::ScaleOf => "SCALE_OF",
            OpCode::DigitCount => "DIGIT_COUNT",
            OpCode::StoreReg => "STORE_REG",
            OpCode::LoadReg => "LOAD_REG",
            OpCode::PushReg => "PUSH_REG",
            OpCode::PopReg => "POP_REG",
            OpCode::ExecMacro => "EXEC_MACRO",
            OpCode::ExecIfGreater => "EXEC_IF_GT",
            OpCode::ExecIfNotGreater => "EXEC_IF_NOT_GT",
            OpCode::ExecIfLess => "EXEC_IF_LT",
            OpCode::ExecIfNotLess => "EXEC_IF_NOT_LT",
            OpCode::ExecIfEqual => "EXEC_IF_EQ",
            OpCode::ExecIfNotEqual => "EXEC_IF_NOT_EQ",
            OpCode::ReadLine => "READ_LINE",
            OpCode::Quit => "QUIT",
        }
    }

    /// 从字节还原操作码
    pub fn from_u8(byte: u8) -> Option<Self> {
        const LAST: u8 = OpCode::Quit as u8;
        if byte > LAST {
            return None;
        }
        // SAFETY: repr(u8)、无空洞的连续判别值，且已做范围检查
        Some(unsafe { std::mem::transmute::<u8, OpCode>(byte) })
    }
}
