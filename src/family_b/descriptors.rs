//! FAMILY-B's fixed-offset structures: the three encrypted boot sections,
//! the setup descriptor (menu/full variant), and the device/system
//! descriptor tables.

use binrw::{BinRead, BinWrite};

pub const SETUP_OFFSET: u64 = 0x30000;

pub const MENU_WORDS: usize = 18;
pub const FULL_WORDS: usize = 35;

/// One of the three fixed, Pattern-B-scrambled boot sections at the start
/// of a FAMILY-B image.
pub struct FixedSection {
    pub name: &'static str,
    pub offset: u64,
    pub size: u64,
}

pub const FIXED_SECTIONS: [FixedSection; 3] = [
    FixedSection {
        name: "ploader",
        offset: 0x00000,
        size: 0x08000,
    },
    FixedSection {
        name: "sloader",
        offset: 0x08000,
        size: 0x10000,
    },
    FixedSection {
        name: "updtool",
        offset: 0x18000,
        size: 0x18000,
    },
];

/// The setup descriptor, in whichever of the two on-disk variants the
/// discriminator (`model[0] == 'n'` in the full layout's position) selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setup {
    Menu {
        date: [u8; 32],
        autorun: u32,
        quiet: u32,
        keeplogs: u32,
        dumpnand: u32,
    },
    Full {
        version: [u8; 32],
        date: [u8; 32],
        model: [u8; 32],
        hostname: [u8; 32],
        autorun: u32,
        keeplogs: u32,
        dumpnand: u32,
    },
}

impl Setup {
    pub fn is_full(&self) -> bool {
        matches!(self, Setup::Full { .. })
    }

    pub fn variant_label(&self) -> &'static str {
        match self {
            Setup::Menu { .. } => "menu",
            Setup::Full { .. } => "full",
        }
    }

    /// Parses the menu-variant layout from its 72-byte (18-word) buffer.
    pub fn from_menu_bytes(buf: &[u8; MENU_WORDS * 4]) -> Self {
        let mut date = [0u8; 32];
        date.copy_from_slice(&buf[0..32]);
        Setup::Menu {
            date,
            autorun: u32::from_le_bytes(buf[32..36].try_into().unwrap()),
            quiet: u32::from_le_bytes(buf[36..40].try_into().unwrap()),
            keeplogs: u32::from_le_bytes(buf[48..52].try_into().unwrap()),
            dumpnand: u32::from_le_bytes(buf[52..56].try_into().unwrap()),
        }
    }

    /// Parses the full-variant layout from its 140-byte (35-word) buffer.
    pub fn from_full_bytes(buf: &[u8; FULL_WORDS * 4]) -> Self {
        let mut version = [0u8; 32];
        version.copy_from_slice(&buf[0..32]);
        let mut date = [0u8; 32];
        date.copy_from_slice(&buf[32..64]);
        let mut model = [0u8; 32];
        model.copy_from_slice(&buf[64..96]);
        let mut hostname = [0u8; 32];
        hostname.copy_from_slice(&buf[96..128]);
        Setup::Full {
            version,
            date,
            model,
            hostname,
            autorun: u32::from_le_bytes(buf[128..132].try_into().unwrap()),
            keeplogs: u32::from_le_bytes(buf[132..136].try_into().unwrap()),
            dumpnand: u32::from_le_bytes(buf[136..140].try_into().unwrap()),
        }
    }
}

/// The byte offset of `model[0]` within the full-variant layout; used to
/// discriminate the setup descriptor's variant from an initial 18-word read.
pub const MODEL_BYTE_OFFSET: usize = 64;

/// One device descriptor: seven little-endian u32s.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct DeviceDescriptor {
    pub r#type: u32,
    pub dest: u32,
    pub size: u32,
    pub rawsize: u32,
    pub compressed: u32,
    pub pattern: u32,
    pub cksum: u32,
}

/// One system descriptor header: five little-endian u32s, immediately
/// followed on disk by `size` raw, unscrambled section bytes. Only
/// `index, size, rawsize, compressed` carry named semantics; the fifth word
/// is modelled as a trailing `cksum`, mirroring the device descriptor's own
/// closing field.
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[brw(little)]
pub struct SystemDescriptor {
    pub index: u32,
    pub size: u32,
    pub rawsize: u32,
    pub compressed: u32,
    pub cksum: u32,
}

pub const FPOS_COUNT: usize = 10;

/// Maps a device's `dest` field to its destination path.
pub fn destination(dest: u32) -> String {
    match dest {
        0..=7 => format!("/dev/_nand{dest}"),
        8 => "/tmp/sysdata.img".to_string(),
        other => format!("unknown{other}.bin"),
    }
}
