//! Deci Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all deci crates.

use serde::{Deserialize, Serialize};

/// Configuration for the virtual machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Initial operand stack capacity
    pub initial_stack_capacity: usize,
    /// Output buffer capacity in bytes
    pub output_buffer_capacity: usize,
    /// Initial scale (fraction digits kept by division and sqrt)
    pub initial_scale: usize,
    /// Whether register indices are read as two bytes
    pub extended_registers: bool,
}

/// Configuration for execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum operand stack depth
    pub max_stack_depth: usize,
    /// Maximum macro execution nesting (`x`, conditionals, `?`)
    pub max_recursion_depth: usize,
}

/// Execution phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Lexer,
    Assembler,
    Vm,
    Io,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Lexer => "lexer",
            Phase::Assembler => "assembler",
            Phase::Vm => "vm",
            Phase::Io => "io",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("deci::{}", self.as_str())
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            initial_stack_capacity: 64,
            output_buffer_capacity: 1024,
            initial_scale: 0,
            extended_registers: false,
        }
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: 4096,
            max_recursion_depth: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_machine_config() {
        let cfg = MachineConfig::default();
        assert_eq!(cfg.initial_scale, 0);
        assert!(!cfg.extended_registers);
        assert!(cfg.output_buffer_capacity > 0);
    }

    #[test]
    fn test_default_limit_config() {
        let cfg = LimitConfig::default();
        assert_eq!(cfg.max_stack_depth, 4096);
        assert_eq!(cfg.max_recursion_depth, 256);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Lexer.as_str(), "lexer");
        assert_eq!(Phase::Vm.target(), "deci::vm");
    }

    #[test]
    fn test_machine_config_serde_roundtrip() {
        let cfg = MachineConfig {
            initial_stack_capacity: 16,
            output_buffer_capacity: 256,
            initial_scale: 5,
            extended_registers: true,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: MachineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.initial_scale, 5);
        assert!(back.extended_registers);
    }
}
