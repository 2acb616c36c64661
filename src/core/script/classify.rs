//! Output/input script classification and address derivation (spec §4.3).

use super::address;
use super::disasm::{disassemble, Instruction};

/// The closed set of output script tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputScriptType {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
    OpReturn,
    Unknown,
}

impl OutputScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputScriptType::P2pkh => "p2pkh",
            OutputScriptType::P2sh => "p2sh",
            OutputScriptType::P2wpkh => "p2wpkh",
            OutputScriptType::P2wsh => "p2wsh",
            OutputScriptType::P2tr => "p2tr",
            OutputScriptType::OpReturn => "op_return",
            OutputScriptType::Unknown => "unknown",
        }
    }
}

/// The closed set of input script tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputScriptType {
    P2pkh,
    P2wpkh,
    P2wsh,
    P2shP2wpkh,
    P2shP2wsh,
    P2trKeypath,
    P2trScriptpath,
    Unknown,
}

impl InputScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputScriptType::P2pkh => "p2pkh",
            InputScriptType::P2wpkh => "p2wpkh",
            InputScriptType::P2wsh => "p2wsh",
            InputScriptType::P2shP2wpkh => "p2sh-p2wpkh",
            InputScriptType::P2shP2wsh => "p2sh-p2wsh",
            InputScriptType::P2trKeypath => "p2tr_keypath",
            InputScriptType::P2trScriptpath => "p2tr_scriptpath",
            InputScriptType::Unknown => "unknown",
        }
    }
}

/// Classifies a `scriptPubKey` by exact byte pattern (spec §4.3 table).
pub fn classify_output(script_pubkey: &[u8]) -> OutputScriptType {
    let len = script_pubkey.len();
    if len == 25
        && script_pubkey[0] == 0x76
        && script_pubkey[1] == 0xa9
        && script_pubkey[2] == 0x14
        && script_pubkey[23] == 0x88
        && script_pubkey[24] == 0xac
    {
        return OutputScriptType::P2pkh;
    }
    if len == 23 && script_pubkey[0] == 0xa9 && script_pubkey[1] == 0x14 && script_pubkey[22] == 0x87
    {
        return OutputScriptType::P2sh;
    }
    if len == 22 && script_pubkey[0] == 0x00 && script_pubkey[1] == 0x14 {
        return OutputScriptType::P2wpkh;
    }
    if len == 34 && script_pubkey[0] == 0x00 && script_pubkey[1] == 0x20 {
        return OutputScriptType::P2wsh;
    }
    if len == 34 && script_pubkey[0] == 0x51 && script_pubkey[1] == 0x20 {
        return OutputScriptType::P2tr;
    }
    if len >= 1 && script_pubkey[0] == 0x6a {
        return OutputScriptType::OpReturn;
    }
    OutputScriptType::Unknown
}

/// Derives the canonical mainnet address for an output, or `None` for
/// `op_return`/`unknown`.
pub fn derive_output_address(ty: OutputScriptType, script_pubkey: &[u8]) -> Option<String> {
    match ty {
        OutputScriptType::P2pkh => {
            let mut h = [0u8; 20];
            h.copy_from_slice(&script_pubkey[3..23]);
            Some(address::p2pkh_address(&h))
        }
        OutputScriptType::P2sh => {
            let mut h = [0u8; 20];
            h.copy_from_slice(&script_pubkey[2..22]);
            Some(address::p2sh_address(&h))
        }
        OutputScriptType::P2wpkh => {
            let mut h = [0u8; 20];
            h.copy_from_slice(&script_pubkey[2..22]);
            Some(address::p2wpkh_address(&h))
        }
        OutputScriptType::P2wsh => {
            let mut h = [0u8; 32];
            h.copy_from_slice(&script_pubkey[2..34]);
            Some(address::p2wsh_address(&h))
        }
        OutputScriptType::P2tr => {
            let mut h = [0u8; 32];
            h.copy_from_slice(&script_pubkey[2..34]);
            Some(address::p2tr_address(&h))
        }
        OutputScriptType::OpReturn | OutputScriptType::Unknown => None,
    }
}

/// Result of classifying an input, including extras the report needs.
pub struct InputClassification {
    pub script_type: InputScriptType,
    /// Disassembly of the last witness item, for p2wsh / p2sh-p2wsh only.
    pub witness_script_asm: Option<String>,
}

/// Classifies an input given its paired prevout type, `script_sig`, and
/// witness stack (spec §4.3).
pub fn classify_input(
    prevout_type: OutputScriptType,
    script_sig: &[u8],
    witness: &[Vec<u8>],
) -> InputClassification {
    match prevout_type {
        OutputScriptType::P2pkh => InputClassification {
            script_type: InputScriptType::P2pkh,
            witness_script_asm: None,
        },
        OutputScriptType::P2wpkh => InputClassification {
            script_type: InputScriptType::P2wpkh,
            witness_script_asm: None,
        },
        OutputScriptType::P2wsh => {
            let asm = witness.last().and_then(|item| disassemble(item).ok()).map(|d| d.asm);
            InputClassification {
                script_type: InputScriptType::P2wsh,
                witness_script_asm: asm,
            }
        }
        OutputScriptType::P2tr => {
            if witness.len() == 1 && matches!(witness[0].len(), 64 | 65) {
                InputClassification {
                    script_type: InputScriptType::P2trKeypath,
                    witness_script_asm: None,
                }
            } else {
                InputClassification {
                    script_type: InputScriptType::P2trScriptpath,
                    witness_script_asm: None,
                }
            }
        }
        OutputScriptType::P2sh => classify_p2sh_input(script_sig, witness),
        OutputScriptType::OpReturn | OutputScriptType::Unknown => InputClassification {
            script_type: InputScriptType::Unknown,
            witness_script_asm: None,
        },
    }
}

fn classify_p2sh_input(script_sig: &[u8], witness: &[Vec<u8>]) -> InputClassification {
    let unknown = InputClassification {
        script_type: InputScriptType::Unknown,
        witness_script_asm: None,
    };

    let Ok(disasm) = disassemble(script_sig) else {
        return unknown;
    };
    let [Instruction::Push(redeem)] = disasm.instructions.as_slice() else {
        return unknown;
    };

    match classify_output(redeem) {
        OutputScriptType::P2wpkh => InputClassification {
            script_type: InputScriptType::P2shP2wpkh,
            witness_script_asm: None,
        },
        OutputScriptType::P2wsh => {
            let asm = witness.last().and_then(|item| disassemble(item).ok()).map(|d| d.asm);
            InputClassification {
                script_type: InputScriptType::P2shP2wsh,
                witness_script_asm: asm,
            }
        }
        _ => unknown,
    }
}
