//! Deci CLI - Command line interface
//!
//! dc 风格的任意精度逆波兰计算器。输入来源按顺序处理：
//! -e 表达式、-f 文件、位置参数文件；一个都没有时从 stdin
//! 逐行读取直到 EOF。q 命令或输入耗尽后正常退出。

use clap::Parser;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process;

mod platform;

use crate::platform::{print_error, print_error_with_source, LineInput};
use deci_api::{compile, init_config, RunConfig, Session, StepOutcome};
use deci_core::{Chunk, OpCode};
use deci_log::{warn, Level, Logger, StderrSink};

/// deci.json 结构
#[derive(Debug, serde::Deserialize)]
struct ConfigFile {
    /// 初始 scale
    scale: Option<usize>,
    /// 寄存器名是否为两字节
    extended_registers: Option<bool>,
    /// 是否输出字节码（JSON 格式）
    dump_bytecode: Option<bool>,
    /// 日志级别: "silent", "error", "warn", "info", "debug", "trace"
    log_level: Option<String>,
    /// 主栈深度上限
    max_stack_depth: Option<usize>,
    /// 宏递归深度上限
    max_recursion_depth: Option<usize>,
}

#[derive(Debug, Parser)]
#[command(
    name = "deci",
    about = "Arbitrary precision reverse-polish calculator",
    version
)]
struct Cli {
    /// Evaluate EXPR as deci source (repeatable, runs in order)
    #[arg(short = 'e', long = "expression", value_name = "EXPR")]
    expressions: Vec<String>,

    /// Run FILE before other input (repeatable)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Source file to run (after -e and -f)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Register names are two bytes wide
    #[arg(short = 'x', long = "extended-registers")]
    extended_registers: bool,

    /// Initial scale (digits kept after the decimal point)
    #[arg(long, value_name = "N")]
    scale: Option<usize>,

    /// Configuration file path (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Dump assembled bytecode as JSON before executing
    #[arg(long)]
    dump_bytecode: bool,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() {
    let cli = parse_args();

    let file_config = match &cli.config {
        Some(path) => match read_config_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("deci: {}", e);
                process::exit(1);
            }
        },
        None => None,
    };

    let run_config = match build_run_config(&cli, file_config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("deci: {}", e);
            process::exit(1);
        }
    };

    // Initialize API config (global singleton for convenience)
    init_config(run_config.clone());

    // stdout 给计算结果，? 命令从 stdin 读，且不抢 REPL 的行
    let mut session = Session::new(
        &run_config,
        Box::new(io::stdout()),
        Box::new(LineInput::new(io::stdin())),
    );
    install_interrupt_handler(&session, &run_config);

    let code = run_cli(&cli, &run_config, &mut session);
    process::exit(code);
}

/// Parse arguments; -V goes to stdout and exits 0, -h and usage errors
/// go to stderr and exit 1
fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let (to_stdout, code) = usage_disposition(err.kind());
            if to_stdout {
                print!("{err}");
            } else {
                eprint!("{err}");
            }
            process::exit(code);
        }
    }
}

/// (stdout?, exit code) for a failed argument parse
fn usage_disposition(kind: clap::error::ErrorKind) -> (bool, i32) {
    if kind == clap::error::ErrorKind::DisplayVersion {
        (true, 0)
    } else {
        // -h 和非法参数同样算 usage：stderr、退出码 1
        (false, 1)
    }
}

/// Read and parse the JSON configuration file
fn read_config_file(path: &Path) -> Result<ConfigFile, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("cannot parse '{}': {}", path.display(), e))
}

/// 合并配置：默认值 < 配置文件 < 命令行
fn build_run_config(cli: &Cli, file: Option<&ConfigFile>) -> Result<RunConfig, String> {
    let mut config = RunConfig::default();

    if let Some(f) = file {
        if let Some(scale) = f.scale {
            config.machine.initial_scale = scale;
        }
        if let Some(extended) = f.extended_registers {
            config.machine.extended_registers = extended;
        }
        if let Some(dump) = f.dump_bytecode {
            config.dump_bytecode = dump;
        }
        if let Some(depth) = f.max_stack_depth {
            config.limits.max_stack_depth = depth;
        }
        if let Some(depth) = f.max_recursion_depth {
            config.limits.max_recursion_depth = depth;
        }
    }

    if let Some(scale) = cli.scale {
        config.machine.initial_scale = scale;
    }
    if cli.extended_registers {
        config.machine.extended_registers = true;
    }
    if cli.dump_bytecode {
        config.dump_bytecode = true;
    }

    let level_name = cli
        .log_level
        .as_deref()
        .or_else(|| file.and_then(|f| f.log_level.as_deref()));
    let level = match level_name {
        Some(name) => name.parse::<Level>().map_err(|e| e.to_string())?,
        None => Level::Error,
    };
    config.logger = Logger::new(level).with_sink(StderrSink);

    Ok(config)
}

/// 安装 SIGINT 处理器
///
/// 单次 Ctrl-C 只置中断标志，由虚拟机在安全点消费。
/// 上一次中断还没被消费时再来一次，尽力冲刷残留输出后
/// 直接退出（执行卡死时的逃生口）。
fn install_interrupt_handler(session: &Session, config: &RunConfig) {
    let flag = session.interrupt_flag();
    let out = session.output_handle();
    let result = ctrlc::set_handler(move || {
        if flag.is_set() {
            out.try_flush();
            process::exit(130);
        }
        flag.trigger();
    });
    if let Err(e) = result {
        warn!(config.logger, "cannot install SIGINT handler: {}", e);
    }
}

/// 按顺序执行所有输入来源，返回进程退出码
fn run_cli(cli: &Cli, config: &RunConfig, session: &mut Session) -> i32 {
    let mut had_input = false;

    for expr in &cli.expressions {
        had_input = true;
        if let Some(code) = run_text(session, config, expr) {
            return code;
        }
    }

    let mut paths: Vec<&PathBuf> = cli.files.iter().collect();
    if let Some(file) = &cli.file {
        paths.push(file);
    }
    for path in paths {
        had_input = true;
        let source = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("deci: cannot read '{}': {}", path.display(), e);
                return 1;
            }
        };
        if let Some(code) = run_text(session, config, &source) {
            return code;
        }
    }

    if !had_input {
        return repl(session);
    }

    // 收尾：最后一段可能有没换行结尾的语句
    session.close_input();
    pump(session).unwrap_or(0)
}

/// 执行一段输入；Some(code) 表示会话该结束了
fn run_text(session: &mut Session, config: &RunConfig, text: &str) -> Option<i32> {
    if config.dump_bytecode {
        dump_bytecode(text, config);
    }
    session.feed(text.as_bytes());
    if !text.ends_with('\n') {
        session.feed(b"\n");
    }
    pump(session)
}

/// 推进会话直到需要更多输入；Some(code) 表示该退出了
fn pump(session: &mut Session) -> Option<i32> {
    loop {
        match session.step() {
            StepOutcome::Executed => {}
            StepOutcome::NeedMoreInput | StepOutcome::Finished => return None,
            StepOutcome::Quit => return Some(0),
            StepOutcome::Error(err) => {
                print_error(&err);
                if !err.is_recoverable() {
                    return Some(2);
                }
            }
        }
    }
}

/// 从 stdin 逐行读取执行
fn repl(session: &mut Session) -> i32 {
    let mut input = LineInput::new(io::stdin());
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                session.close_input();
                return pump(session).unwrap_or(0);
            }
            Ok(_) => {
                session.feed(line.as_bytes());
                if let Some(code) = pump(session) {
                    return code;
                }
            }
            Err(e) => {
                eprintln!("deci: input error: {}", e);
                return 2;
            }
        }
    }
}

/// 将汇编结果输出到 stdout（JSON 格式）
fn dump_bytecode(source: &str, config: &RunConfig) {
    match compile(source, config) {
        Ok(output) => {
            let json = build_chunk_json(&output.chunk);
            if let Ok(text) = serde_json::to_string_pretty(&json) {
                println!("{}", text);
            }
        }
        // dump 失败不终止，执行路径还会按语句再报一次
        Err(e) => print_error_with_source(&e, source),
    }
}

/// 构建字节码 JSON（指令数组 + 常量表）
fn build_chunk_json(chunk: &Chunk) -> serde_json::Value {
    use serde_json::json;

    let mut instructions: Vec<serde_json::Value> = Vec::new();
    let mut offset = 0;
    while let Some(byte) = chunk.byte_at(offset) {
        let Some(op) = OpCode::from_u8(byte) else {
            instructions.push(json!({ "opcode": format!("0x{byte:02x}") }));
            offset += 1;
            continue;
        };
        let entry = match op.operand_size() {
            0 => json!({ "opcode": op.name() }),
            1 => json!({
                "opcode": op.name(),
                "operand": chunk.byte_at(offset + 1).unwrap_or(0),
            }),
            _ => json!({
                "opcode": op.name(),
                "operand": chunk.u16_at(offset + 1).unwrap_or(0),
            }),
        };
        instructions.push(entry);
        offset += 1 + op.operand_size();
    }

    let constants: Vec<serde_json::Value> = (0..chunk.constant_count())
        .filter_map(|i| chunk.constant(i))
        .map(|v| json!({ "type": v.type_name(), "value": v.to_string() }))
        .collect();

    json!({ "constants": constants, "bytecode": instructions })
}
