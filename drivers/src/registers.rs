/// Number of physical (IO) registers. IO register ids map one-to-one onto addresses.
pub const IO_REGISTERS: usize = 256;

/// Logical register id.
///
/// Ids below `IO_REGISTERS` are physical registers.
/// Higher ids are virtual registers composed of bit fields of one or more physical registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Register(pub u16);

impl Register {
    pub const fn io(address: u8) -> Self {
        Self(address as u16)
    }

    pub fn id(self) -> u16 {
        self.0
    }

    pub fn is_io(self) -> bool {
        (self.0 as usize) < IO_REGISTERS
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_io() {
            return write!(formatter, "IOREG(0x{:02x})", self.0);
        }
        match gl843().name(*self) {
            Some(name) => formatter.write_str(name),
            None => write!(formatter, "REG({})", self.0),
        }
    }
}

/// Direction of a fragment's shift, as seen when reading the physical register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shift {
    /// Shift right when reading, left when writing.
    Right(u32),

    /// Shift left when reading, right when writing.
    Left(u32),
}

/// One physical register's contribution to a logical register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Field {
    pub address: u8,
    pub mask: u8,
    pub shift: Shift,
}

impl Field {
    pub const fn io(address: u8) -> Self {
        Self {
            address,
            mask: 0xff,
            shift: Shift::Right(0),
        }
    }

    /// Returns this fragment's bits of the logical value, given the physical register's value.
    pub fn extract(&self, physical: u8) -> u32 {
        let bits = (physical & self.mask) as u32;
        match self.shift {
            Shift::Right(shift) => bits >> shift,
            Shift::Left(shift) => bits << shift,
        }
    }

    /// Returns the physical register's value with this fragment's bits replaced by `value`'s.
    pub fn insert(&self, physical: u8, value: u32) -> u8 {
        let bits = match self.shift {
            Shift::Right(shift) => value << shift,
            Shift::Left(shift) => value >> shift,
        };
        (physical & !self.mask) | ((bits & self.mask as u32) as u8)
    }

    /// Bits of the logical value covered by this fragment.
    pub fn value_mask(&self) -> u32 {
        self.extract(0xff)
    }
}

/// Immutable table of fragments, with a per-register index into it.
pub struct RegisterMap {
    fields: Vec<Field>,
    index: Vec<std::ops::Range<usize>>,
    names: Vec<&'static str>,
}

impl RegisterMap {
    /// Builds a map with `IO_REGISTERS` physical registers followed by the given virtual registers.
    pub fn new(virtual_registers: &[(&'static str, &[Field])]) -> Self {
        let mut fields = Vec::with_capacity(
            IO_REGISTERS
                + virtual_registers
                    .iter()
                    .map(|(_, fragments)| fragments.len())
                    .sum::<usize>(),
        );
        let mut index = Vec::with_capacity(IO_REGISTERS + virtual_registers.len());
        for address in 0..IO_REGISTERS {
            index.push(fields.len()..fields.len() + 1);
            fields.push(Field::io(address as u8));
        }
        let mut names = Vec::with_capacity(virtual_registers.len());
        for (name, fragments) in virtual_registers {
            index.push(fields.len()..fields.len() + fragments.len());
            fields.extend_from_slice(fragments);
            names.push(*name);
        }
        Self {
            fields,
            index,
            names,
        }
    }

    /// Number of logical registers (physical and virtual).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn fields(&self, register: Register) -> Option<&[Field]> {
        self.index
            .get(register.0 as usize)
            .map(|range| &self.fields[range.clone()])
    }

    pub fn name(&self, register: Register) -> Option<&'static str> {
        (register.0 as usize)
            .checked_sub(IO_REGISTERS)
            .and_then(|offset| self.names.get(offset).copied())
    }

    pub fn find(&self, name: &str) -> Option<Register> {
        self.names
            .iter()
            .position(|candidate| *candidate == name)
            .map(|offset| Register((IO_REGISTERS + offset) as u16))
    }

    /// Union of the register's fragment masks, in value space.
    pub fn full_mask(&self, register: Register) -> Option<u32> {
        self.fields(register).map(|fields| {
            fields
                .iter()
                .fold(0u32, |mask, field| mask | field.value_mask())
        })
    }
}

/// Shared GL843 register map.
pub fn gl843() -> &'static RegisterMap {
    static MAP: once_cell::sync::Lazy<RegisterMap> =
        once_cell::sync::Lazy::new(|| RegisterMap::new(VIRTUAL_REGISTERS));
    &MAP
}

macro_rules! field {
    ($address:literal & $mask:literal >> $shift:literal) => {
        Field {
            address: $address,
            mask: $mask,
            shift: Shift::Right($shift),
        }
    };
    ($address:literal & $mask:literal << $shift:literal) => {
        Field {
            address: $address,
            mask: $mask,
            shift: Shift::Left($shift),
        }
    };
    ($address:literal & $mask:literal) => {
        Field {
            address: $address,
            mask: $mask,
            shift: Shift::Right(($mask as u8).trailing_zeros()),
        }
    };
    ($address:literal << $shift:literal) => {
        Field {
            address: $address,
            mask: 0xff,
            shift: Shift::Left($shift),
        }
    };
    ($address:literal) => {
        Field::io($address)
    };
}

// Each fragment is written `address & mask`, optionally followed by an explicit shift.
// Without a shift, the field is aligned on the mask's lowest bit.
// Multi-byte values are big-endian across ascending addresses.
macro_rules! registers {
    ($($name:ident => [$(($($fragment:tt)+)),+ $(,)?]),+ $(,)?) => {
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Copy, Clone)]
        enum Virtual {
            $(
                $name,
            )+
        }

        impl Register {
            $(
                pub const $name: Register = Register(IO_REGISTERS as u16 + Virtual::$name as u16);
            )+
        }

        pub static VIRTUAL_REGISTERS: &[(&str, &[Field])] = &[
            $(
                (stringify!($name), &[$(field!($($fragment)+)),+]),
            )+
        ];
    };
}

registers! {
    // 0x01
    CISSET => [(0x01 & 0x80)],
    DOGENB => [(0x01 & 0x40)],
    DVDSET => [(0x01 & 0x20)],
    STAGGER => [(0x01 & 0x10)],
    COMPENB => [(0x01 & 0x08)],
    TRUEGRAY => [(0x01 & 0x04)],
    SHDAREA => [(0x01 & 0x02)],
    SCAN => [(0x01 & 0x01)],

    // 0x02
    NOTHOME => [(0x02 & 0x80)],
    ACDCDIS => [(0x02 & 0x40)],
    AGOHOME => [(0x02 & 0x20)],
    MTRPWR => [(0x02 & 0x10)],
    FASTFED => [(0x02 & 0x08)],
    MTRREV => [(0x02 & 0x04)],
    HOMENEG => [(0x02 & 0x02)],
    LONGCURV => [(0x02 & 0x01)],

    // 0x03
    LAMPDOG => [(0x03 & 0x80)],
    AVEENB => [(0x03 & 0x40)],
    XPASEL => [(0x03 & 0x20)],
    LAMPPWR => [(0x03 & 0x10)],
    LAMPTIM => [(0x03 & 0x0f)],

    // 0x04
    LINEART => [(0x04 & 0x80)],
    BITSET => [(0x04 & 0x40)],
    AFEMOD => [(0x04 & 0x30)],
    FILTER => [(0x04 & 0x0c)],
    FESET => [(0x04 & 0x03)],

    // 0x05
    DPIHW => [(0x05 & 0xc0)],
    MTLLAMP => [(0x05 & 0x30)],
    GMMENB => [(0x05 & 0x08)],
    ENB20M => [(0x05 & 0x04)],
    MTLBASE => [(0x05 & 0x03)],

    // 0x06
    SCANMOD => [(0x06 & 0xe0)],
    PWRBIT => [(0x06 & 0x10)],
    GAIN4 => [(0x06 & 0x08)],
    OPTEST => [(0x06 & 0x07)],

    // 0x08
    DECFLAG => [(0x08 & 0x80)],
    GMMFFR => [(0x08 & 0x40)],
    GMMFFG => [(0x08 & 0x20)],
    GMMFFB => [(0x08 & 0x10)],
    GMMZR => [(0x08 & 0x08)],
    GMMZG => [(0x08 & 0x04)],
    GMMZB => [(0x08 & 0x02)],

    // 0x09
    MCNTSET => [(0x09 & 0xc0)],
    EVEN1ST => [(0x09 & 0x20)],
    BLINE1ST => [(0x09 & 0x10)],
    BACKSCAN => [(0x09 & 0x08)],
    ENHANCE => [(0x09 & 0x04)],
    SHORTTG => [(0x09 & 0x02)],
    NWAIT => [(0x09 & 0x01)],

    // 0x0A
    LPWMEN => [(0x0a & 0x80)],
    LCDSEL => [(0x0a & 0x40)],
    LCMSEL => [(0x0a & 0x20)],
    ADFSEL => [(0x0a & 0x10)],
    EPROMSEL => [(0x0a & 0x08)],
    RS232SEL => [(0x0a & 0x04)],
    BAUDRAT => [(0x0a & 0x03)],

    // 0x0B
    CLKSET => [(0x0b & 0xe0)],
    RFHDIS => [(0x0b & 0x10)],
    ENBDRAM => [(0x0b & 0x08)],
    DRAMSEL => [(0x0b & 0x07)],

    // 0x0D, command flags
    JAMPCMD => [(0x0d & 0x80)],
    DOCCMD => [(0x0d & 0x40)],
    CCDCMD => [(0x0d & 0x20)],
    FULLSTP => [(0x0d & 0x10)],
    SEND => [(0x0d & 0x08)],
    CLRMCNT => [(0x0d & 0x04)],
    CLRDOCJM => [(0x0d & 0x02)],
    CLRLNCNT => [(0x0d & 0x01)],
    SCANRESET => [(0x0e)],
    MOVE => [(0x0f)],

    // exposure
    EXPR => [(0x10 << 8), (0x11)],
    EXPG => [(0x12 << 8), (0x13)],
    EXPB => [(0x14 << 8), (0x15)],

    // 0x16
    CTRLHI => [(0x16 & 0x80)],
    TOSHIBA => [(0x16 & 0x40)],
    TGINV => [(0x16 & 0x20)],
    CK1INV => [(0x16 & 0x10)],
    CK2INV => [(0x16 & 0x08)],
    CTRLINV => [(0x16 & 0x04)],
    CKDIS => [(0x16 & 0x02)],
    CTRLDIS => [(0x16 & 0x01)],

    // 0x17
    TGMODE => [(0x17 & 0xc0)],
    TGW => [(0x17 & 0x3f)],

    // 0x18
    CNSET => [(0x18 & 0x80)],
    DCKSEL => [(0x18 & 0x60)],
    CKTOGGLE => [(0x18 & 0x10)],
    CKDELAY => [(0x18 & 0x0c)],
    CKSEL => [(0x18 & 0x03)],

    EXPDMY => [(0x19)],

    // 0x1A
    TGLSW2 => [(0x1a & 0x80)],
    TGLSW1 => [(0x1a & 0x40)],
    MANUAL3 => [(0x1a & 0x20)],
    MANUAL1 => [(0x1a & 0x10)],
    CK4INV => [(0x1a & 0x08)],
    CK3INV => [(0x1a & 0x04)],
    LINECLP => [(0x1a & 0x02)],

    // 0x1B
    GRAYSET => [(0x1b & 0x80)],
    CHANSEL => [(0x1b & 0x60)],
    BGRENB => [(0x1b & 0x10)],
    ICGENB => [(0x1b & 0x08)],
    ICGDLY => [(0x1b & 0x07)],

    // 0x1C
    CK4MTGL => [(0x1c & 0x80)],
    CK3MTGL => [(0x1c & 0x40)],
    CK1MTGL => [(0x1c & 0x20)],
    CKAREA => [(0x1c & 0x10)],
    MTLWD => [(0x1c & 0x08)],
    TGTIME => [(0x1c & 0x07)],

    // 0x1D
    CK4LOW => [(0x1d & 0x80)],
    CK3LOW => [(0x1d & 0x40)],
    CK1LOW => [(0x1d & 0x20)],
    TGSHLD => [(0x1d & 0x1f)],

    // 0x1E
    WDTIME => [(0x1e & 0xf0)],
    LINESEL => [(0x1e & 0x0f)],

    // motor and buffer
    SCANFED => [(0x1f)],
    BUFSEL => [(0x20)],
    STEPNO => [(0x21)],
    FWDSTEP => [(0x22)],
    BWDSTEP => [(0x23)],
    FASTNO => [(0x24)],
    LINCNT => [(0x25 & 0x0f << 16), (0x26 << 8), (0x27)],

    // buffer ports, only their address is used
    GMMWRDATA => [(0x28)],
    RAMWRDATA => [(0x3c)],
    RAMRDDATA => [(0x45)],

    RAMADDR => [(0x2a << 8), (0x2b)],
    DPISET => [(0x2c << 8), (0x2d)],
    BWHI => [(0x2e)],
    BWLOW => [(0x2f)],
    STRPIXEL => [(0x30 << 8), (0x31)],
    ENDPIXEL => [(0x32 << 8), (0x33)],
    DUMMY => [(0x34)],
    MAXWD => [(0x35 & 0x0f << 16), (0x36 << 8), (0x37)],
    LPERIOD => [(0x38 << 8), (0x39)],
    FEWRDATA => [(0x3a << 8), (0x3b)],
    FEEDL => [(0x3d & 0x0f << 16), (0x3e << 8), (0x3f)],

    // 0x40, read-only
    DOCSNR => [(0x40 & 0x80)],
    ADFSNR => [(0x40 & 0x40)],
    COVERSNR => [(0x40 & 0x20)],
    CHKVER => [(0x40 & 0x10)],
    DOCJAM => [(0x40 & 0x08)],
    HISPDFLG => [(0x40 & 0x04)],
    MOTMFLG => [(0x40 & 0x02)],
    DATAENB => [(0x40 & 0x01)],

    // 0x41, read-only
    PWRBIT_RD => [(0x41 & 0x80)],
    BUFEMPTY => [(0x41 & 0x40)],
    FEEDFSH => [(0x41 & 0x20)],
    SCANFSH => [(0x41 & 0x10)],
    HOMESNR => [(0x41 & 0x08)],
    LAMPSTS => [(0x41 & 0x04)],
    FEBUSY => [(0x41 & 0x02)],
    MOTORENB => [(0x41 & 0x01)],

    VALIDWORD => [(0x42 & 0x0f << 16), (0x43 << 8), (0x44)],
    FERDDATA => [(0x46 << 8), (0x47)],
    FEDCNT => [(0x48 & 0x0f << 16), (0x49 << 8), (0x4a)],
    SCANCNT => [(0x4b & 0x0f << 16), (0x4c << 8), (0x4d)],

    // 0x4F, read-only
    DOGON => [(0x4f & 0x80)],
    ROMBSY => [(0x4f & 0x20)],
    LCMBSY => [(0x4f & 0x10)],
    TX232BSY => [(0x4f & 0x08)],
    RX232BSY => [(0x4f & 0x04)],
    RXREADY => [(0x4f & 0x01)],

    // analog frontend
    FERDA => [(0x50 & 0x3f)],
    FEWRA => [(0x51 & 0x3f)],
    RHI => [(0x52 & 0x1f)],
    RLOW => [(0x53 & 0x1f)],
    GHI => [(0x54 & 0x1f)],
    GLOW => [(0x55 & 0x1f)],
    BHI => [(0x56 & 0x1f)],
    BLOW => [(0x57 & 0x1f)],
    VSMP => [(0x58 & 0xf8)],
    VSMPW => [(0x58 & 0x07)],
    BSMP => [(0x59 & 0xf8)],
    BSMPW => [(0x59 & 0x07)],
    ADCLKINV => [(0x5a & 0x80)],
    RLCSEL => [(0x5a & 0x40)],
    CDSREF => [(0x5a & 0x30)],
    RLC => [(0x5a & 0x0f)],

    // gamma and motor tables
    MTRTBL => [(0x5b & 0x40)],
    GMMADDR => [(0x5b & 0x3f << 8), (0x5c)],

    // 0x5E
    DECSEL => [(0x5e & 0xe0)],
    STOPTIM => [(0x5e & 0x1f)],

    FMOVDEC => [(0x5f)],
    Z1MOD => [(0x60 & 0x1f << 16), (0x61 << 8), (0x62)],
    Z2MOD => [(0x63 & 0x1f << 16), (0x64 << 8), (0x65)],
    PHFREQ => [(0x66)],
    STEPSEL => [(0x67 & 0xc0)],
    MTRPWM => [(0x67 & 0x3f)],
    FSTPSEL => [(0x68 & 0xc0)],
    FASTPWM => [(0x68 & 0x3f)],
    FSHDEC => [(0x69)],
    FMOVNO => [(0x6a)],

    // 0x6B
    MULTFILM => [(0x6b & 0x80)],
    GPOM13 => [(0x6b & 0x40)],
    GPOM12 => [(0x6b & 0x20)],
    GPOM11 => [(0x6b & 0x10)],
    GPOCK4 => [(0x6b & 0x08)],
    GPOCP => [(0x6b & 0x04)],
    GPOLEDB => [(0x6b & 0x02)],
    GPOADF => [(0x6b & 0x01)],

    // GPIO
    GPIO13 => [(0x6c & 0x10)],
    GPIO10 => [(0x6c & 0x02)],
    GPOE16 => [(0x6e & 0x80)],
    GPOE14 => [(0x6e & 0x20)],

    // CCD clocks
    RSH => [(0x70 & 0x1f)],
    RSL => [(0x71 & 0x1f)],
    CPH => [(0x72 & 0x1f)],
    CPL => [(0x73 & 0x1f)],
    CK1MAP => [(0x74 << 16), (0x75 << 8), (0x76)],
    CK3MAP => [(0x77 << 16), (0x78 << 8), (0x79)],
    CK4MAP => [(0x7a << 16), (0x7b << 8), (0x7c)],

    // 0x7D
    CK1NEG => [(0x7d & 0x80)],
    CK3NEG => [(0x7d & 0x40)],
    CK4NEG => [(0x7d & 0x20)],
    RSNEG => [(0x7d & 0x10)],
    CPNEG => [(0x7d & 0x08)],
    BSMPNEG => [(0x7d & 0x04)],
    VSMPNEG => [(0x7d & 0x02)],
    DLYSET => [(0x7d & 0x01)],

    // 0x7F
    BSMPDLY => [(0x7f & 0xc0)],
    VSMPDLY => [(0x7f & 0x30)],
    LEDCNT => [(0x7f & 0x0f)],

    // motor current, low bits in 0x80 and high bit in 0xAC
    VRHOME => [(0x80 & 0x03), (0xac & 0x01 << 2)],
    VRMOVE => [(0x80 & 0x0c >> 2), (0xac & 0x02 << 1)],
    VRBACK => [(0x80 & 0x30 >> 4), (0xac & 0x04 >> 0)],
    VRSCAN => [(0x80 & 0xc0 >> 6), (0xac & 0x08 >> 1)],

    // 0x87
    ACYCNRLC => [(0x87 & 0x80)],
    ENOFFSET => [(0x87 & 0x40)],
    LEDADD => [(0x87 & 0x20)],
    CK4ADC => [(0x87 & 0x10)],
    AUTOCONF => [(0x87 & 0x08)],
    YENB => [(0x87 & 0x04)],
    YBIT => [(0x87 & 0x03)],

    MTRPLS => [(0x94)],
    ONDUR => [(0x98 << 8), (0x99)],
    OFFDUR => [(0x9a << 8), (0x9b)],

    // 0x9D
    MULDMYLN => [(0x9d & 0xc0)],
    RAMDLY => [(0x9d & 0x20)],
    MOTLAG => [(0x9d & 0x10)],
    CMODE => [(0x9d & 0x08)],
    STEPTIM => [(0x9d & 0x06)],
    IFRS => [(0x9d & 0x01)],

    // 0x9E
    SEL3INV => [(0x9e & 0x80)],
    TGSTIME => [(0x9e & 0x70)],
    TGWTIME => [(0x9e & 0x07)],

    RFHSET => [(0xa2)],
    TRUER => [(0xa3)],
    TRUEG => [(0xa4)],
    TRUEB => [(0xa5)],

    // 0xAB
    FIX16CLK => [(0xab & 0x80)],
    GPOM9 => [(0xab & 0x40)],
    NODECEL => [(0xab & 0x20)],
    TB3TB1 => [(0xab & 0x10)],
    TB5TB2 => [(0xab & 0x08)],
    MULSTOP => [(0xab & 0x07)],

    // 0xAD
    CCDTYP => [(0xad & 0x38)],
    ADFTYP => [(0xad & 0x07)],

    // 0xAE
    MOTSET => [(0xae & 0xf0)],
    PROCESS => [(0xae & 0x0f)],

    // 0xAF
    SCANTYP => [(0xaf & 0xc0)],
    FEDTYP => [(0xaf & 0x30)],
    ADFMOVE => [(0xaf & 0x0f)],
}
