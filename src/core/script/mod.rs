//! Script disassembly, classification, and address derivation (spec §4.2-4.3).

pub mod address;
pub mod classify;
pub mod disasm;
mod opcodes;

pub use classify::{
    classify_input, classify_output, derive_output_address, InputClassification,
    InputScriptType, OutputScriptType,
};
pub use disasm::{disassemble, Disassembly, Instruction};
