//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和源码上下文打印。

use deci_api::DeciError;

/// 打印错误报告到 stderr
pub fn print_error(e: &DeciError) {
    eprintln!("deci: {}", e.to_report());
}

/// 打印错误并显示源代码上下文
pub fn print_error_with_source(e: &DeciError, source: &str) {
    print_error(e);
    if let (Some(error_line), Some(col)) = (e.line(), e.column()) {
        print_source_context(source, error_line, col);
    }
}

/// 打印源代码上下文（显示错误行前后几行）
pub fn print_source_context(source: &str, error_line: usize, error_col: usize) {
    const CONTEXT_LINES: usize = 2;

    let lines: Vec<&str> = source.lines().collect();
    if error_line == 0 || error_line > lines.len() {
        return;
    }

    let start = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end = (error_line + CONTEXT_LINES).min(lines.len());
    let width = end.to_string().len();

    eprintln!("{}|--", "-".repeat(width + 1));
    for idx in start..=end {
        eprintln!("{idx:>width$} | {}", lines[idx - 1]);
        if idx == error_line {
            // 指向出错列的标记
            let marker = " ".repeat(error_col.saturating_sub(1));
            eprintln!("{:>width$} | {marker}^", "");
        }
    }
    eprintln!("{}|--", "-".repeat(width + 1));
}
