use crate::chip;
use crate::configuration;
use crate::device;
use crate::error;
use crate::properties;
use crate::registers::Register;
use crate::types;
use crate::usb;

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error(transparent)]
    Usb(#[from] usb::Error),

    #[error(transparent)]
    Chip(#[from] error::Error),
}

impl From<rusb::Error> for Error {
    fn from(error: rusb::Error) -> Self {
        usb::Error::from(error).into()
    }
}

pub struct Device {
    chip: chip::Chip<device::Handle>,
    name: String,
}

impl device::Usb for Device {
    type Error = Error;

    const VENDOR_ID: u16 = 0x04a9;

    const PRODUCT_ID: u16 = 0x2228;

    const PROPERTIES: properties::Scanner = properties::Scanner {
        name: "cs4400f",
        vendor: "Canon",
        model: "CanonScan 4400F",
        kind: "flatbed scanner",
        resolutions: &[80, 100, 150, 200, 300, 400, 600, 1200],
        bit_depths: &[8, 16],
        platen: properties::Area {
            width: 216.0,
            height: 297.5,
            left: 2.7,
            top: 11.7,
            calibration_y: 5.0,
        },
        transparency: Some(properties::Area {
            width: 24.0,
            height: 226.0,
            left: 97.0,
            top: 31.0,
            calibration_y: 13.0,
        }),
        lamp_timeout_minutes: 15,
    };

    const DEFAULT_CONFIGURATION: configuration::Configuration = configuration::Configuration::DEFAULT;

    fn open(
        name: &Option<&str>,
        configuration: configuration::Configuration,
        context: &rusb::Context,
    ) -> Result<Self, Self::Error> {
        let (mut handle, name) = Self::handle_from_name(context, name)?;
        handle.set_active_configuration(1)?;
        handle.claim_interface(0)?;
        let mut chip = chip::Chip::new(handle, configuration);
        setup_static(&mut chip)?;

        // start warming up the lamp before the scan is configured
        set_lamp(
            &mut chip,
            types::Lamp::Platen,
            Self::PROPERTIES.lamp_timeout_minutes,
        );
        chip.flush()?;
        tracing::info!(name = %name, "opened {}", Self::PROPERTIES.model);
        Ok(Device { chip, name })
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn speed(&self) -> usb::Speed {
        self.chip.handle().device().speed().into()
    }

    fn chip(&mut self) -> &mut chip::Chip<device::Handle> {
        &mut self.chip
    }
}

pub fn set_sysclk<Handle: usb::Transport>(chip: &mut chip::Chip<Handle>, sysclk: types::Sysclk) {
    chip.set(Register::CLKSET, sysclk as u32);
}

/// Selects the lamp. `timeout` is in minutes (0 to 15), 0 disables the lamp watchdog.
pub fn set_lamp<Handle: usb::Transport>(
    chip: &mut chip::Chip<Handle>,
    lamp: types::Lamp,
    timeout: u8,
) {
    chip.set_many(&[
        (Register::LAMPDOG, (timeout != 0) as u32),
        (Register::XPASEL, (lamp == types::Lamp::Transparency) as u32),
        (Register::LAMPPWR, (lamp != types::Lamp::Off) as u32),
        (Register::LAMPTIM, timeout as u32),
        (Register::MTLLAMP, 0), // timeout = LAMPTIM * 2^MTLLAMP
        (Register::LPWMEN, 0),
        (Register::ONDUR, 159),
        (Register::OFFDUR, 175),
    ]);
}

/// Default motor registers. The stepping mode of both scan and fast moves follows `setup.step_type`.
pub fn set_motor<Handle: usb::Transport>(
    chip: &mut chip::Chip<Handle>,
    setup: &types::ScanSetup,
) {
    chip.set_many(&[
        // operating modes
        (Register::NOTHOME, 0),
        (Register::ACDCDIS, 0),
        (Register::AGOHOME, 0),
        (Register::MTRPWR, 0),
        (Register::MTRREV, 0),
        (Register::FASTFED, 0),
        (Register::LONGCURV, 0),
        // carriage movement
        (Register::SCANFED, 255),
        (Register::FWDSTEP, 0),
        (Register::BWDSTEP, 0),
        (Register::LINCNT, 1),
        (Register::FEEDL, 1),
        (Register::STOPTIM, 15),
        (Register::DECSEL, 0),
        (Register::MULSTOP, 0),
        // motor tables count pixel clocks
        (Register::MCNTSET, 0),
        (Register::STEPNO, 0),
        (Register::FASTNO, 0),
        (Register::FSHDEC, 0),
        (Register::FMOVNO, 0),
        (Register::FMOVDEC, 0),
        (Register::STEPTIM, 0),
        (Register::Z1MOD, 0),
        (Register::Z2MOD, 0),
        (Register::NODECEL, 0),
        (Register::TB3TB1, 0),
        (Register::TB5TB2, 0),
        // stepping motor
        (Register::STEPSEL, setup.step_type as u32),
        (Register::FSTPSEL, setup.step_type as u32),
        (Register::VRHOME, 0),
        (Register::VRMOVE, 0),
        (Register::VRBACK, 0),
        (Register::VRSCAN, 0),
    ]);
}

/// Sensor and analog frontend timing of one scan, beyond what `ScanSetup` carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendTiming {
    /// Resolution seen by the A/D converter (1:1, 1:2 or 1:4 of the CCD), 0 for the defaults.
    pub afe_dpi: u32,
    pub maximum_width: u32,
    pub tg_time: u32,
    pub exposure: [u32; 3],
}

struct ClockTiming {
    tgw: u32,
    tgshld: u32,
    ck1map: u32,
    ck3map: u32,
    ck4map: u32,
    cph: u32,
    cpl: u32,
    rsh: u32,
    rsl: u32,
    vsmp: u32,
    // red, green and blue sampling windows
    rhi: u32,
    rlow: u32,
    ghi: u32,
    glow: u32,
    bhi: u32,
    blow: u32,
}

impl ClockTiming {
    fn from_afe_dpi(afe_dpi: u32) -> Self {
        match afe_dpi {
            1200 => Self {
                tgw: 10,
                tgshld: 11,
                ck1map: 0xf838,
                ck3map: 0xfc00,
                ck4map: 0x92a4,
                cph: 1,
                cpl: 3,
                rsh: 0,
                rsl: 2,
                vsmp: 11,
                rhi: 10,
                rlow: 13,
                ghi: 0,
                glow: 3,
                bhi: 6,
                blow: 8,
            },
            2400 => Self {
                tgw: 21,
                tgshld: 21,
                ck1map: 0xff00,
                ck3map: 0xff00,
                ck4map: 0x5492,
                cph: 2,
                cpl: 4,
                rsh: 0,
                rsl: 2,
                vsmp: 10,
                rhi: 11,
                rlow: 13,
                ghi: 0,
                glow: 3,
                bhi: 6,
                blow: 9,
            },
            4800 => Self {
                tgw: 21,
                tgshld: 21,
                ck1map: 0xffff,
                ck3map: 0xffff,
                ck4map: 0x5492,
                cph: 10,
                cpl: 12,
                rsh: 8,
                rsl: 10,
                vsmp: 3,
                rhi: 2,
                rlow: 5,
                ghi: 8,
                glow: 11,
                bhi: 13,
                blow: 15,
            },
            _ => Self {
                tgw: 10,
                tgshld: 11,
                ck1map: 0,
                ck3map: 0,
                ck4map: 0,
                cph: 0,
                cpl: 0,
                rsh: 0,
                rsl: 0,
                vsmp: 11,
                rhi: 11,
                rlow: 13,
                ghi: 0,
                glow: 3,
                bhi: 6,
                blow: 9,
            },
        }
    }
}

/// The frontend outputs 16-bit samples for 16-bit formats, line select and line period come from `setup`.
pub fn set_frontend<Handle: usb::Transport>(
    chip: &mut chip::Chip<Handle>,
    setup: &types::ScanSetup,
    timing: &FrontendTiming,
) {
    let clocks = ClockTiming::from_afe_dpi(timing.afe_dpi);
    chip.set_many(&[
        (Register::BITSET, setup.format.has_16_bit_samples() as u32),
        (Register::FILTER, 0),
        // 0: 12 clocks per pixel, 7: 16 clocks per pixel
        (Register::SCANMOD, if timing.afe_dpi == 0 { 0 } else { 7 }),
        (Register::EXPR, timing.exposure[0]),
        (Register::EXPG, timing.exposure[1]),
        (Register::EXPB, timing.exposure[2]),
        (Register::TGMODE, 0),
        (Register::TGW, clocks.tgw),
        (Register::EXPDMY, 42),
        (Register::CK4MTGL, 0),
        (Register::CK3MTGL, 0),
        (Register::CK1MTGL, 0),
        (Register::TGTIME, timing.tg_time),
        (Register::TGSHLD, clocks.tgshld),
        (Register::TGSTIME, 5),
        (Register::TGWTIME, 5),
        (Register::LINESEL, setup.line_select),
        (Register::DUMMY, 20),
        (Register::MAXWD, timing.maximum_width),
        (Register::LPERIOD, setup.line_period),
        (Register::RHI, clocks.rhi),
        (Register::RLOW, clocks.rlow),
        (Register::GHI, clocks.ghi),
        (Register::GLOW, clocks.glow),
        (Register::BHI, clocks.bhi),
        (Register::BLOW, clocks.blow),
        (Register::VSMP, clocks.vsmp),
        (Register::VSMPW, 3),
        (Register::RSH, clocks.rsh),
        (Register::RSL, clocks.rsl),
        (Register::CPH, clocks.cph),
        (Register::CPL, clocks.cpl),
        (Register::CK1MAP, clocks.ck1map),
        (Register::CK3MAP, clocks.ck3map),
        (Register::CK4MAP, clocks.ck4map),
    ]);
}

/// Reads up to `lines` lines of scan data into `buffer`, resized to fit them.
///
/// The buffer is truncated to the number of bytes received. Partial lines are kept.
pub fn read_lines<Handle: usb::Transport>(
    chip: &mut chip::Chip<Handle>,
    setup: &types::ScanSetup,
    lines: usize,
    buffer: &mut Vec<u8>,
    timeout: std::time::Duration,
) -> Result<usize, error::Error> {
    buffer.resize(setup.bytes_per_line() * lines, 0);
    let read = chip.read_line(buffer, setup.format, timeout)?;
    buffer.truncate(read);
    Ok(read)
}

/// Configures the analog frontend (colour mode, correlated double sampling, 16-bit output).
pub fn init_frontend<Handle: usb::Transport>(
    chip: &mut chip::Chip<Handle>,
) -> Result<(), error::Error> {
    for (address, value) in [(1, 0x23), (2, 0x24), (3, 0x1f), (6, 0), (8, 0), (9, 0)] {
        if let Err(error) = chip.write_afe(address, value) {
            tracing::error!("cannot configure the analog frontend: {error}");
            return Err(error);
        }
    }
    Ok(())
}

pub fn setup_static<Handle: usb::Transport>(
    chip: &mut chip::Chip<Handle>,
) -> Result<(), error::Error> {
    chip.write_many(&[
        // CCD clock pins
        (Register::GPOCK4, 0),
        (Register::GPOCP, 0),
        (Register::GPOLEDB, 1),
        (Register::GPOADF, 0),
        // GPIO13, 12 and 11 control the motor reference voltage
        (Register::GPOM13, 1),
        (Register::GPOM12, 1),
        (Register::GPOM11, 1),
        (Register::GPOM9, 0),
        (Register::io(0x7e), 0),
    ])?;
    for (address, value) in [
        (0xa8, 0x00),
        (0xa7, 0xff),
        (0xa6, 0x00),
        (0x6e, 0xff),
        (0x6c, 0x01),
        (0x6f, 0x00),
        (0x6d, 0x00),
    ] {
        chip.write_io(address, value)?;
    }
    chip.set_many(&[
        // frontend and CCD
        (Register::CISSET, 0),
        (Register::AFEMOD, 1),
        (Register::FESET, 0),
        (Register::DPIHW, 3),
        (Register::ENB20M, 0),
        (Register::MTLBASE, 0),
        (Register::EVEN1ST, 0),
        (Register::BLINE1ST, 0),
        (Register::SHORTTG, 0),
        (Register::CTRLHI, 0),
        (Register::TOSHIBA, 0),
        (Register::TGINV, 0),
        (Register::CK1INV, 1),
        (Register::CK2INV, 0),
        (Register::CTRLINV, 0),
        (Register::CKDIS, 1),
        (Register::CTRLDIS, 1),
        (Register::CNSET, 0),
        (Register::DCKSEL, 0),
        (Register::CKTOGGLE, 1),
        (Register::CKDELAY, 0),
        (Register::CKSEL, 0),
        (Register::EXPDMY, 42),
        (Register::TGLSW2, 0),
        (Register::TGLSW1, 0),
        (Register::MANUAL3, 1),
        (Register::MANUAL1, 1),
        (Register::CK4INV, 0),
        (Register::CK3INV, 0),
        (Register::LINECLP, 0),
        (Register::GRAYSET, 0),
        (Register::CHANSEL, 0),
        (Register::BGRENB, 0),
        (Register::ICGENB, 0),
        (Register::ICGDLY, 0),
        (Register::CK4MTGL, 0),
        (Register::CKAREA, 0),
        (Register::CK4LOW, 0),
        (Register::CK3LOW, 1),
        (Register::CK1LOW, 1),
        (Register::DUMMY, 20),
        (Register::VSMPW, 3),
        (Register::BSMP, 0),
        (Register::BSMPW, 0),
        (Register::ADCLKINV, 0),
        (Register::RLCSEL, 1),
        (Register::CDSREF, 0),
        (Register::RLC, 0),
        (Register::CK1NEG, 0),
        (Register::CK3NEG, 0),
        (Register::CK4NEG, 0),
        (Register::RSNEG, 0),
        (Register::CPNEG, 0),
        (Register::BSMPNEG, 0),
        (Register::VSMPNEG, 0),
        (Register::DLYSET, 0),
        (Register::BSMPDLY, 0),
        (Register::VSMPDLY, 0),
        (Register::ACYCNRLC, 0),
        (Register::ENOFFSET, 0),
        (Register::LEDADD, 0),
        (Register::CK4ADC, 1),
        (Register::AUTOCONF, 0),
        (Register::MULDMYLN, 0),
        (Register::SEL3INV, 0),
        (Register::CCDTYP, 0),
        // SDRAM, 16 Mbit with auto-refresh
        (Register::ENBDRAM, 1),
        (Register::RFHDIS, 0),
        (Register::DRAMSEL, 1),
        (Register::RAMDLY, 0),
        (Register::RFHSET, 31),
        // misc
        (Register::HOMENEG, 0),
        (Register::BUFSEL, 16),
        (Register::BACKSCAN, 0),
        // motor
        (Register::PHFREQ, 0),
        (Register::MTRPWM, 63),
        (Register::FASTPWM, 63),
        (Register::YENB, 0),
        (Register::YBIT, 0),
        // unused functions
        (Register::OPTEST, 0),
        (Register::ENHANCE, 0),
        (Register::NWAIT, 0),
        (Register::LCDSEL, 0),
        (Register::LCMSEL, 0),
        (Register::ADFSEL, 0),
        (Register::EPROMSEL, 0),
        (Register::RS232SEL, 0),
        (Register::BAUDRAT, 0),
        (Register::DOGENB, 0),
        (Register::MTLWD, 0),
        (Register::WDTIME, 2),
        (Register::MULTFILM, 0),
        (Register::LEDCNT, 0),
        (Register::MTRPLS, 255),
        (Register::MOTLAG, 0),
        (Register::CMODE, 0),
        (Register::IFRS, 0),
        (Register::FIX16CLK, 0),
        (Register::ADFTYP, 0),
        (Register::MOTSET, 0),
        (Register::PROCESS, 0),
        (Register::io(0xaf), 0),
    ]);
    set_sysclk(chip, types::Sysclk::Mhz60);
    set_lamp(chip, types::Lamp::Off, 0);
    chip.flush()?;
    chip.write(Register::PWRBIT, 1)
}
