//! Script disassembler: turns raw script bytes into an ASM token string plus
//! a structured instruction stream the classifier can pattern-match over.

use super::opcodes::name_of;
use std::fmt;

/// A script could not be fully disassembled (truncated push body only —
/// the disassembler never rejects a script for any other reason).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisasmError {
    pub message: String,
}

impl fmt::Display for DisasmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DisasmError {}

/// One decoded script element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// A non-push opcode, including `OP_0`, `OP_1NEGATE` and `OP_1`..`OP_16`.
    Op(u8),
    /// A push of literal data (`OP_PUSHBYTES_n`, `OP_PUSHDATA1/2/4`).
    Push(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Disassembly {
    pub asm: String,
    pub instructions: Vec<Instruction>,
}

/// Disassembles `script` into an ASM string and an instruction stream.
///
/// Never fails except when a push opcode's declared length runs past the
/// end of the script.
pub fn disassemble(script: &[u8]) -> Result<Disassembly, DisasmError> {
    let mut tokens: Vec<String> = Vec::new();
    let mut instructions: Vec<Instruction> = Vec::new();
    let mut i = 0usize;

    while i < script.len() {
        let op = script[i];
        i += 1;
        match op {
            0x00 => {
                tokens.push("OP_0".to_string());
                instructions.push(Instruction::Op(op));
            }
            0x01..=0x4b => {
                let n = op as usize;
                let data = take(script, &mut i, n, "OP_PUSHBYTES")?;
                tokens.push(format!("OP_PUSHBYTES_{} {}", n, hex::encode(&data)));
                instructions.push(Instruction::Push(data));
            }
            0x4c => {
                let n = take(script, &mut i, 1, "OP_PUSHDATA1")?[0] as usize;
                let data = take(script, &mut i, n, "OP_PUSHDATA1")?;
                tokens.push(format!("OP_PUSHDATA1 {}", hex::encode(&data)));
                instructions.push(Instruction::Push(data));
            }
            0x4d => {
                let len_bytes = take(script, &mut i, 2, "OP_PUSHDATA2")?;
                let n = u16::from_le_bytes([len_bytes[0], len_bytes[1]]) as usize;
                let data = take(script, &mut i, n, "OP_PUSHDATA2")?;
                tokens.push(format!("OP_PUSHDATA2 {}", hex::encode(&data)));
                instructions.push(Instruction::Push(data));
            }
            0x4e => {
                let len_bytes = take(script, &mut i, 4, "OP_PUSHDATA4")?;
                let n = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]])
                    as usize;
                let data = take(script, &mut i, n, "OP_PUSHDATA4")?;
                tokens.push(format!("OP_PUSHDATA4 {}", hex::encode(&data)));
                instructions.push(Instruction::Push(data));
            }
            0x4f => {
                tokens.push("OP_1NEGATE".to_string());
                instructions.push(Instruction::Op(op));
            }
            0x51..=0x60 => {
                tokens.push(format!("OP_{}", op - 0x50));
                instructions.push(Instruction::Op(op));
            }
            other => {
                let name = name_of(other)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("OP_UNKNOWN_0x{:02x}", other));
                tokens.push(name);
                instructions.push(Instruction::Op(other));
            }
        }
    }

    Ok(Disassembly {
        asm: tokens.join(" "),
        instructions,
    })
}

fn take(script: &[u8], i: &mut usize, n: usize, op_name: &str) -> Result<Vec<u8>, DisasmError> {
    if *i + n > script.len() {
        return Err(DisasmError {
            message: format!(
                "{op_name}: push of {n} bytes at offset {i} truncated (script is {} bytes)",
                script.len()
            ),
        });
    }
    let data = script[*i..*i + n].to_vec();
    *i += n;
    Ok(data)
}
