//! Deci Core - Calculator core (pure logic, no ambient IO)
//!
//! Contains the lexer, bytecode assembler, decimal bignum library, and the
//! stack virtual machine. Output and input go through injected sinks and
//! sources only; nothing in this crate touches the terminal on its own.
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod compiler;
pub mod kit;
pub mod runtime;

// Re-export common types
pub use runtime::bytecode::chunk::Chunk;
pub use runtime::bytecode::OpCode;
pub use runtime::error::RuntimeError;
pub use runtime::interrupt::InterruptFlag;
pub use runtime::number::Number;
pub use runtime::output::{OutBuffer, SharedOutput, SharedSink};
pub use runtime::value::Value;
pub use runtime::vm::{InterpretResult, Vm};

// Re-export config types from deci-config
pub use deci_config::{LimitConfig, MachineConfig, Phase};
