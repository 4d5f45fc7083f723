//! 平台层：终端输入输出的胶水

mod cli;
mod input;

pub use cli::{print_error, print_error_with_source};
pub use input::LineInput;
