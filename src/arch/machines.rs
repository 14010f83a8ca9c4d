//! Display names for `e_machine` and `EI_OSABI`.

/// Returns a human-readable name for a machine type.
///
/// Unknown values yield `None`; callers display them as `<unknown>: 0x..`.
pub fn machine_name(machine: u16) -> Option<&'static str> {
    Some(match machine {
        0 => "None",
        1 => "WE32100",
        2 => "Sparc",
        3 => "Intel 80386",
        4 => "MC68000",
        5 => "MC88000",
        6 => "Intel MCU",
        7 => "Intel 80860",
        8 => "MIPS R3000",
        9 => "IBM System/370",
        10 => "MIPS R4000 big-endian",
        15 => "HPPA",
        17 => "Fujitsu VPP500",
        18 => "Sparc v8+",
        19 => "Intel 80960",
        20 => "PowerPC",
        21 => "PowerPC64",
        22 => "IBM S/390",
        23 => "SPU",
        36 => "Renesas V850 (using RH850 ABI)",
        37 => "Fujitsu FR20",
        38 => "TRW RH32",
        39 => "MCORE",
        40 => "ARM",
        41 => "Digital Alpha (old)",
        42 => "Renesas / SuperH SH",
        43 => "Sparc v9",
        44 => "Siemens Tricore",
        45 => "ARC",
        46 => "Renesas H8/300",
        47 => "Renesas H8/300H",
        48 => "Renesas H8S",
        49 => "Renesas H8/500",
        50 => "Intel IA-64",
        51 => "Stanford MIPS-X",
        52 => "Motorola Coldfire",
        53 => "Motorola MC68HC12 Microcontroller",
        54 => "Fujitsu Multimedia Accelerator",
        55 => "Siemens PCP",
        56 => "Sony nCPU embedded RISC processor",
        57 => "Denso NDR1 microprocessor",
        58 => "Motorola Star*Core processor",
        59 => "Toyota ME16 processor",
        60 => "STMicroelectronics ST100 processor",
        61 => "Advanced Logic Corp. TinyJ embedded processor",
        62 => "Advanced Micro Devices X86-64",
        63 => "Sony DSP processor",
        66 => "Siemens FX66 microcontroller",
        67 => "STMicroelectronics ST9+ 8/16 bit microcontroller",
        68 => "STMicroelectronics ST7 8-bit microcontroller",
        69 => "Motorola MC68HC16 Microcontroller",
        70 => "Motorola MC68HC11 Microcontroller",
        71 => "Motorola MC68HC08 Microcontroller",
        72 => "Motorola MC68HC05 Microcontroller",
        73 => "Silicon Graphics SVx",
        74 => "STMicroelectronics ST19 8-bit microcontroller",
        75 => "Digital VAX",
        76 => "Axis Communications 32-bit embedded processor",
        80 => "MMIX",
        83 => "Atmel AVR 8-bit microcontroller",
        87 => "NEC v850",
        88 => "Renesas M32R (formerly Mitsubishi M32r)",
        89 => "Matsushita MN10300",
        90 => "Matsushita MN10200",
        92 => "OpenRISC 1000",
        93 => "ARCompact",
        94 => "Tensilica Xtensa Processor",
        105 => "Texas Instruments msp430 microcontroller",
        106 => "Analog Devices Blackfin",
        113 => "Altera Nios",
        140 => "Texas Instruments TMS320C6000 DSP family",
        164 => "QUALCOMM DSP6 Processor",
        183 => "AArch64",
        187 => "Tilera TILE64",
        188 => "Tilera TILEPro",
        189 => "Xilinx MicroBlaze",
        191 => "Tilera TILE-Gx",
        195 => "ARCv2",
        220 => "Zilog Z80",
        224 => "AMD GPU",
        243 => "RISC-V",
        247 => "Linux BPF",
        252 => "C-SKY",
        258 => "LoongArch",
        0x5441 => "Fujitsu FR-V",
        0x9026 => "Alpha",
        0xa390 => "IBM S/390",
        _ => return None,
    })
}

/// Returns the name of an OS/ABI identification byte.
///
/// Values from 64 up are architecture specific and are not decoded here.
pub fn osabi_name(osabi: u8) -> Option<&'static str> {
    Some(match osabi {
        0 => "UNIX - System V",
        1 => "UNIX - HP-UX",
        2 => "UNIX - NetBSD",
        3 => "UNIX - GNU",
        6 => "UNIX - Solaris",
        7 => "UNIX - AIX",
        8 => "UNIX - IRIX",
        9 => "UNIX - FreeBSD",
        10 => "UNIX - TRU64",
        11 => "Novell - Modesto",
        12 => "UNIX - OpenBSD",
        13 => "VMS - OpenVMS",
        14 => "HP - Non-Stop Kernel",
        15 => "AROS",
        16 => "FenixOS",
        17 => "Nuxi CloudABI",
        18 => "Stratus Technologies OpenVOS",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_machines() {
        assert_eq!(machine_name(62), Some("Advanced Micro Devices X86-64"));
        assert_eq!(machine_name(243), Some("RISC-V"));
        assert_eq!(machine_name(0x7777), None);
        assert_eq!(osabi_name(3), Some("UNIX - GNU"));
        assert_eq!(osabi_name(200), None);
    }
}
