//! The opcode lookup tables. Every leading byte has exactly one entry, which fixes the length of
//! the instruction and knows how to render its mnemonic. The `0xCB` prefix defers to a second
//! table that is keyed by the byte following it.
//!
//! Both tables are built at compile time in the same shape as the CPU's opcode matrix: the
//! irregular top and bottom quarters are written column by column and transposed, and the
//! register-indexed middle quarters are generated one row of eight at a time.

use array_concat::concat_arrays;

/// The mnemonic of every opcode the CPU leaves undefined.
pub const ILLEGAL_MNEMONIC: &str = "xx";

/// The leading byte that selects the extended (bit manipulation) table.
pub const PREFIX_OP_CODE: u8 = 0xCB;

/// A single table entry. The renderer is handed the two bytes that follow the op code, whether
/// or not the instruction uses them.
#[derive(Clone, Copy)]
struct Op {
    size: u8,
    render: fn(u8, u8) -> String,
}

type OpArray<const N: usize> = [Op; N];

/// Decodes the instruction at the start of `bytes` into its mnemonic and its length in bytes.
///
/// The length is not known before the op code is looked up, so callers should hand over three
/// bytes. Operand bytes missing from a shorter window are rendered as zero.
pub fn decode(bytes: &[u8]) -> (String, u8) {
    let byte = |i: usize| bytes.get(i).copied().unwrap_or_default();
    let Op { size, render } = OP_LOOKUP[byte(0) as usize];
    (render(byte(1), byte(2)), size)
}

fn render_prefixed(op_code: u8) -> String {
    (PREFIXED_OP_LOOKUP[op_code as usize].render)(0, 0)
}

macro_rules! define_op {
    () => {
        Op {
            size: 1,
            render: |_, _| ILLEGAL_MNEMONIC.to_owned(),
        }
    };
    (PREFIX) => {
        Op {
            size: 2,
            render: |op, _| render_prefixed(op),
        }
    };
    ($text: literal) => {
        Op {
            size: 1,
            render: |_, _| String::from($text),
        }
    };
    // Single byte immediates are rendered as they are stored.
    ($text: literal, n) => {
        Op {
            size: 2,
            render: |n, _| format!($text, n = n),
        }
    };
    // Two byte immediates are stored low byte first but written high byte first.
    ($text: literal, nn) => {
        Op {
            size: 3,
            render: |lo, hi| format!($text, nn = u16::from_le_bytes([lo, hi])),
        }
    };
    (LD, "(hl)", "(hl)") => {
        define_op!("halt")
    };
    (LD, $dest: tt, $src: tt) => {
        Op {
            size: 1,
            render: |_, _| format!("ld {}, {}", $dest, $src),
        }
    };
    (REG, $op: tt, $r: tt) => {
        Op {
            size: 1,
            render: |_, _| format!("{} {}", $op, $r),
        }
    };
    (BIT, $op: tt, $bit: tt, $r: tt) => {
        Op {
            size: 1,
            render: |_, _| format!("{} {}, {}", $op, $bit, $r),
        }
    };
}

macro_rules! define_op_chunk {
    (LD) => {{
        const OPS: OpArray<0x40> = concat_arrays!(
            define_op_chunk!(LD, "b"),
            define_op_chunk!(LD, "c"),
            define_op_chunk!(LD, "d"),
            define_op_chunk!(LD, "e"),
            define_op_chunk!(LD, "h"),
            define_op_chunk!(LD, "l"),
            define_op_chunk!(LD, "(hl)"),
            define_op_chunk!(LD, "a")
        );
        OPS
    }};
    (LD, $dest: tt) => {{
        const OPS: OpArray<8> = [
            define_op!(LD, $dest, "b"),
            define_op!(LD, $dest, "c"),
            define_op!(LD, $dest, "d"),
            define_op!(LD, $dest, "e"),
            define_op!(LD, $dest, "h"),
            define_op!(LD, $dest, "l"),
            define_op!(LD, $dest, "(hl)"),
            define_op!(LD, $dest, "a"),
        ];
        OPS
    }};
    ($op: literal, NUM) => {{
        const OPS: OpArray<0x40> = concat_arrays!(
            define_op_chunk!($op, 0,),
            define_op_chunk!($op, 1,),
            define_op_chunk!($op, 2,),
            define_op_chunk!($op, 3,),
            define_op_chunk!($op, 4,),
            define_op_chunk!($op, 5,),
            define_op_chunk!($op, 6,),
            define_op_chunk!($op, 7,)
        );
        OPS
    }};
    ($op: literal, $bit: literal,) => {{
        const OPS: OpArray<8> = [
            define_op!(BIT, $op, $bit, "b"),
            define_op!(BIT, $op, $bit, "c"),
            define_op!(BIT, $op, $bit, "d"),
            define_op!(BIT, $op, $bit, "e"),
            define_op!(BIT, $op, $bit, "h"),
            define_op!(BIT, $op, $bit, "l"),
            define_op!(BIT, $op, $bit, "(hl)"),
            define_op!(BIT, $op, $bit, "a"),
        ];
        OPS
    }};
    ($op: literal) => {{
        const OPS: OpArray<8> = [
            define_op!(REG, $op, "b"),
            define_op!(REG, $op, "c"),
            define_op!(REG, $op, "d"),
            define_op!(REG, $op, "e"),
            define_op!(REG, $op, "h"),
            define_op!(REG, $op, "l"),
            define_op!(REG, $op, "(hl)"),
            define_op!(REG, $op, "a"),
        ];
        OPS
    }};
}

macro_rules! define_op_lookup_table {
    () => {
        concat_arrays!(
            define_op_lookup_table!(CHUNK_ONE),
            define_op_lookup_table!(CHUNK_TWO),
            define_op_lookup_table!(CHUNK_THREE),
            define_op_lookup_table!(CHUNK_FOUR)
        )
    };
    (PREFIXED) => {
        concat_arrays!(
            define_op_chunk!("rlc"),
            define_op_chunk!("rrc"),
            define_op_chunk!("rl"),
            define_op_chunk!("rr"),
            define_op_chunk!("sla"),
            define_op_chunk!("sra"),
            define_op_chunk!("swap"),
            define_op_chunk!("srl"),
            define_op_chunk!("bit", NUM),
            define_op_chunk!("res", NUM),
            define_op_chunk!("set", NUM)
        )
    };
    // Ops 0x00 through 0x3F. Each inner array is one column of the opcode matrix (the low
    // nibble) across its four rows (the high nibble).
    (CHUNK_ONE) => {{
        const TO_TRANSPOSED: [OpArray<4>; 0x10] = [
            [
                define_op!("nop"),
                define_op!("stop"),
                define_op!("jr nz, ${n:02x}", n),
                define_op!("jr nc, ${n:02x}", n),
            ],
            [
                define_op!("ld bc, ${nn:04x}", nn),
                define_op!("ld de, ${nn:04x}", nn),
                define_op!("ld hl, ${nn:04x}", nn),
                define_op!("ld sp, ${nn:04x}", nn),
            ],
            [
                define_op!("ld (bc), a"),
                define_op!("ld (de), a"),
                define_op!("ldi (hl), a"),
                define_op!("ldd (hl), a"),
            ],
            [
                define_op!("inc bc"),
                define_op!("inc de"),
                define_op!("inc hl"),
                define_op!("inc sp"),
            ],
            [
                define_op!("inc b"),
                define_op!("inc d"),
                define_op!("inc h"),
                define_op!("inc (hl)"),
            ],
            [
                define_op!("dec b"),
                define_op!("dec d"),
                define_op!("dec h"),
                define_op!("dec (hl)"),
            ],
            [
                define_op!("ld b, ${n:02x}", n),
                define_op!("ld d, ${n:02x}", n),
                define_op!("ld h, ${n:02x}", n),
                define_op!("ld (hl), ${n:02x}", n),
            ],
            [
                define_op!("rlca"),
                define_op!("rla"),
                define_op!("daa"),
                define_op!("scf"),
            ],
            [
                define_op!("ld (${nn:04x}), sp", nn),
                define_op!("jr ${n:02x}", n),
                define_op!("jr z, ${n:02x}", n),
                define_op!("jr c, ${n:02x}", n),
            ],
            [
                define_op!("add hl, bc"),
                define_op!("add hl, de"),
                define_op!("add hl, hl"),
                define_op!("add hl, sp"),
            ],
            [
                define_op!("ld a, (bc)"),
                define_op!("ld a, (de)"),
                define_op!("ldi a, (hl)"),
                define_op!("ldd a, (hl)"),
            ],
            [
                define_op!("dec bc"),
                define_op!("dec de"),
                define_op!("dec hl"),
                define_op!("dec sp"),
            ],
            [
                define_op!("inc c"),
                define_op!("inc e"),
                define_op!("inc l"),
                define_op!("inc a"),
            ],
            [
                define_op!("dec c"),
                define_op!("dec e"),
                define_op!("dec l"),
                define_op!("dec a"),
            ],
            [
                define_op!("ld c, ${n:02x}", n),
                define_op!("ld e, ${n:02x}", n),
                define_op!("ld l, ${n:02x}", n),
                define_op!("ld a, ${n:02x}", n),
            ],
            [
                define_op!("rrca"),
                define_op!("rra"),
                define_op!("cpl"),
                define_op!("ccf"),
            ],
        ];
        const TRANSPOSED: [OpArray<16>; 4] = transpose!(TO_TRANSPOSED);
        const CHUNK: OpArray<0x40> =
            concat_arrays!(TRANSPOSED[0], TRANSPOSED[1], TRANSPOSED[2], TRANSPOSED[3]);
        CHUNK
    }};
    (CHUNK_TWO) => {
        define_op_chunk!(LD)
    };
    (CHUNK_THREE) => {{
        const CHUNK: OpArray<0x40> = concat_arrays!(
            define_op_chunk!("add"),
            define_op_chunk!("adc"),
            define_op_chunk!("sub"),
            define_op_chunk!("sbc"),
            define_op_chunk!("and"),
            define_op_chunk!("xor"),
            define_op_chunk!("or"),
            define_op_chunk!("cp")
        );
        CHUNK
    }};
    // Ops 0xC0 through 0xFF, laid out like `CHUNK_ONE`.
    (CHUNK_FOUR) => {{
        const TO_TRANSPOSED: [OpArray<4>; 0x10] = [
            [
                define_op!("ret nz"),
                define_op!("ret nc"),
                define_op!("ldh ($ff{n:02x}), a", n),
                define_op!("ldh a, ($ff{n:02x})", n),
            ],
            [
                define_op!("pop bc"),
                define_op!("pop de"),
                define_op!("pop hl"),
                define_op!("pop af"),
            ],
            [
                define_op!("jp nz, ${nn:04x}", nn),
                define_op!("jp nc, ${nn:04x}", nn),
                define_op!("ldh (c), a"),
                define_op!("ldh a, (c)"),
            ],
            [
                define_op!("jp ${nn:04x}", nn),
                define_op!(),
                define_op!(),
                define_op!("di"),
            ],
            [
                define_op!("call nz, ${nn:04x}", nn),
                define_op!("call nc, ${nn:04x}", nn),
                define_op!(),
                define_op!(),
            ],
            [
                define_op!("push bc"),
                define_op!("push de"),
                define_op!("push hl"),
                define_op!("push af"),
            ],
            [
                define_op!("add ${n:02x}", n),
                define_op!("sub ${n:02x}", n),
                define_op!("and ${n:02x}", n),
                define_op!("or ${n:02x}", n),
            ],
            [
                define_op!("rst $00"),
                define_op!("rst $10"),
                define_op!("rst $20"),
                define_op!("rst $30"),
            ],
            [
                define_op!("ret z"),
                define_op!("ret c"),
                define_op!("add sp, ${n:02x}", n),
                define_op!("ldhl sp, ${n:02x}", n),
            ],
            [
                define_op!("ret"),
                define_op!("reti"),
                define_op!("jp hl"),
                define_op!("ld sp, hl"),
            ],
            [
                define_op!("jp z, ${nn:04x}", nn),
                define_op!("jp c, ${nn:04x}", nn),
                define_op!("ld (${nn:04x}), a", nn),
                define_op!("ld a, (${nn:04x})", nn),
            ],
            [
                define_op!(PREFIX),
                define_op!(),
                define_op!(),
                define_op!("ei"),
            ],
            [
                define_op!("call z, ${nn:04x}", nn),
                define_op!("call c, ${nn:04x}", nn),
                define_op!(),
                define_op!(),
            ],
            [
                define_op!("call ${nn:04x}", nn),
                define_op!(),
                define_op!(),
                define_op!(),
            ],
            [
                define_op!("adc ${n:02x}", n),
                define_op!("sbc ${n:02x}", n),
                define_op!("xor ${n:02x}", n),
                define_op!("cp ${n:02x}", n),
            ],
            [
                define_op!("rst $08"),
                define_op!("rst $18"),
                define_op!("rst $28"),
                define_op!("rst $38"),
            ],
        ];
        const TRANSPOSED: [OpArray<16>; 4] = transpose!(TO_TRANSPOSED);
        const CHUNK: OpArray<0x40> =
            concat_arrays!(TRANSPOSED[0], TRANSPOSED[1], TRANSPOSED[2], TRANSPOSED[3]);
        CHUNK
    }};
}

macro_rules! transpose {
    ($arr: ident) => {{
        const TRANSPOSED: [OpArray<16>; 4] = [
            transpose!($arr, 0),
            transpose!($arr, 1),
            transpose!($arr, 2),
            transpose!($arr, 3),
        ];
        TRANSPOSED
    }};
    ($arr: ident, $i: literal) => {{
        const INNER: OpArray<16> = [
            $arr[0][$i],
            $arr[1][$i],
            $arr[2][$i],
            $arr[3][$i],
            $arr[4][$i],
            $arr[5][$i],
            $arr[6][$i],
            $arr[7][$i],
            $arr[8][$i],
            $arr[9][$i],
            $arr[10][$i],
            $arr[11][$i],
            $arr[12][$i],
            $arr[13][$i],
            $arr[14][$i],
            $arr[15][$i],
        ];
        INNER
    }};
}

// `concat_arrays!` expands to a cfg the compiler doesn't recognize.
#[allow(unexpected_cfgs)]
static OP_LOOKUP: OpArray<0x100> = define_op_lookup_table!();
#[allow(unexpected_cfgs)]
static PREFIXED_OP_LOOKUP: OpArray<0x100> = define_op_lookup_table!(PREFIXED);
