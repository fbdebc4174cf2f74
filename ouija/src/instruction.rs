use std::fmt;

use heapless::Vec as InlineVec;
use serde::{Deserialize, Serialize};

use crate::lookup::decode;

/// Op codes of the five call instructions (`call`, `call nz/z/nc/c`).
const CALL_OP_CODES: [u8; 5] = [0xC4, 0xCC, 0xCD, 0xD4, 0xDC];

/// Op codes of the six return instructions (`ret`, `ret nz/z/nc/c`, `reti`).
const RETURN_OP_CODES: [u8; 6] = [0xC0, 0xC8, 0xC9, 0xD0, 0xD8, 0xD9];

const JR_OP_CODE: u8 = 0x18;
const JP_OP_CODE: u8 = 0xC3;

/// A decoded instruction. The raw bytes are exactly the ones the decoder consumed, so their
/// count is the length of the instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub address: u16,
    pub bytes: InlineVec<u8, 3>,
    pub mnemonic: String,
}

impl Instruction {
    /// Decodes the instruction at `address` from a window of the three bytes found there.
    pub fn decode(address: u16, window: [u8; 3]) -> Self {
        let (mnemonic, size) = decode(&window);
        let bytes = window.into_iter().take(size as usize).collect();
        Self {
            address,
            bytes,
            mnemonic,
        }
    }

    pub fn size(&self) -> u8 {
        self.bytes.len() as u8
    }

    /// The address of the instruction that directly follows this one in memory.
    pub fn next_addr(&self) -> u16 {
        self.address.wrapping_add(self.size() as u16)
    }

    pub fn op_code(&self) -> u8 {
        self.bytes[0]
    }

    pub fn is_call(&self) -> bool {
        CALL_OP_CODES.contains(&self.op_code())
    }

    pub fn is_return(&self) -> bool {
        RETURN_OP_CODES.contains(&self.op_code())
    }

    /// Whether this instruction transfers control straight back to its own address: `jr $fe` or a
    /// `jp` whose target is its own address.
    pub fn jumps_to_self(&self) -> bool {
        match self.bytes.as_slice() {
            [JR_OP_CODE, offset] => {
                self.address.wrapping_add(2).wrapping_add(*offset as i8 as u16) == self.address
            }
            [JP_OP_CODE, lo, hi] => u16::from_le_bytes([*lo, *hi]) == self.address,
            _ => false,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X} ", self.address)?;
        for i in 0..3 {
            match self.bytes.get(i) {
                Some(byte) => write!(f, "{byte:02X} ")?,
                None => write!(f, "   ")?,
            }
        }
        write!(f, "{}", self.mnemonic)
    }
}

#[cfg(test)]
mod tests {
    use super::Instruction;

    #[test]
    fn bytes_are_truncated_to_size() {
        let inst = Instruction::decode(0x0100, [0x3E, 0x0A, 0xCD]);
        assert_eq!(inst.size(), 2);
        assert_eq!(inst.bytes.as_slice(), &[0x3E, 0x0A]);
        assert_eq!(inst.mnemonic, "ld a, $0a");
        assert_eq!(inst.next_addr(), 0x0102);
    }

    #[test]
    fn next_addr_wraps() {
        let inst = Instruction::decode(0xFFFF, [0xCD, 0x00, 0x00]);
        assert_eq!(inst.next_addr(), 0x0002);
    }

    #[test]
    fn classification() {
        assert!(Instruction::decode(0, [0xCD, 0x50, 0xC0]).is_call());
        assert!(Instruction::decode(0, [0xDC, 0x50, 0xC0]).is_call());
        assert!(!Instruction::decode(0, [0xC3, 0x50, 0xC0]).is_call());
        assert!(Instruction::decode(0, [0xC9, 0, 0]).is_return());
        assert!(Instruction::decode(0, [0xD9, 0, 0]).is_return());
        assert!(!Instruction::decode(0, [0xE9, 0, 0]).is_return());
    }

    #[test]
    fn self_jumps() {
        let jumps = |bytes| Instruction::decode(0x0150, bytes).jumps_to_self();
        assert!(jumps([0x18, 0xFE, 0x00]));
        assert!(!jumps([0x18, 0xFD, 0x00]));
        assert!(jumps([0xC3, 0x50, 0x01]));
        assert!(!jumps([0xC3, 0x53, 0x01]));
        assert!(!jumps([0x00, 0xFE, 0x00]));
        // `jp nz` is not unconditional.
        assert!(!jumps([0xC2, 0x50, 0x01]));
        assert!(Instruction::decode(0x4000, [0xC3, 0x00, 0x40]).jumps_to_self());
    }

    #[test]
    fn display_pads_missing_bytes() {
        let inst = Instruction::decode(0x0100, [0x3E, 0x0A, 0xFF]);
        assert_eq!(inst.to_string(), "0100 3E 0A    ld a, $0a");
        let inst = Instruction::decode(0x0200, [0xCD, 0x50, 0xC0]);
        assert_eq!(inst.to_string(), "0200 CD 50 C0 call $c050");
    }
}
