/// Pixel formats, the discriminant is the number of bits per pixel.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelFormat {
    Lineart = 1,
    Gray8 = 8,
    Gray16 = 16,
    Rgb8 = 24,
    Rgb16 = 48,
}

impl PixelFormat {
    pub fn bits_per_pixel(self) -> u32 {
        self as u32
    }

    pub fn has_16_bit_samples(self) -> bool {
        matches!(self, Self::Gray16 | Self::Rgb16)
    }
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lamp {
    Off = 0,
    Platen = 1,
    Transparency = 2,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sysclk {
    Mhz24 = 0,
    Mhz30 = 1,
    Mhz40 = 2,
    Mhz48 = 3,
    Mhz60 = 4,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepType {
    Full = 0,
    Half = 1,
    Quarter = 2,
    Eighth = 3,
}

/// Number of entries in a motor acceleration table (hardware limit).
pub const MOTOR_TABLE_LENGTH: usize = 1020;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSetup {
    pub source: Lamp,
    pub format: PixelFormat,
    pub dpi: u32,

    /// Pixels from the left edge.
    pub start_x: u32,

    /// Pixels per line.
    pub width: u32,

    /// Motor steps from the top edge.
    pub start_y: u32,

    /// Lines.
    pub height: u32,

    /// Extra lines used to correct the distance between CCD color lines.
    pub overscan: u32,

    /// Black/white threshold in [0, 1].
    pub black_white_threshold: f32,

    /// Black/white hysteresis in [0, 1].
    pub black_white_hysteresis: f32,

    pub use_backtracking: bool,
    pub step_type: StepType,
    pub step_dpi: u32,
    pub line_period: u32,
    pub line_select: u32,
}

impl ScanSetup {
    pub fn bytes_per_line(&self) -> usize {
        (self.width as usize * self.format.bits_per_pixel() as usize + 7) / 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(format: PixelFormat, width: u32) -> ScanSetup {
        ScanSetup {
            source: Lamp::Platen,
            format,
            dpi: 300,
            start_x: 0,
            width,
            start_y: 0,
            height: 10,
            overscan: 0,
            black_white_threshold: 0.5,
            black_white_hysteresis: 0.0,
            use_backtracking: false,
            step_type: StepType::Half,
            step_dpi: 300,
            line_period: 11640,
            line_select: 0,
        }
    }

    #[test]
    fn bytes_per_line() {
        assert_eq!(setup(PixelFormat::Lineart, 9).bytes_per_line(), 2);
        assert_eq!(setup(PixelFormat::Gray8, 100).bytes_per_line(), 100);
        assert_eq!(setup(PixelFormat::Gray16, 100).bytes_per_line(), 200);
        assert_eq!(setup(PixelFormat::Rgb8, 100).bytes_per_line(), 300);
        assert_eq!(setup(PixelFormat::Rgb16, 100).bytes_per_line(), 600);
    }

    #[test]
    fn sixteen_bit_formats() {
        assert!(PixelFormat::Gray16.has_16_bit_samples());
        assert!(PixelFormat::Rgb16.has_16_bit_samples());
        assert!(!PixelFormat::Rgb8.has_16_bit_samples());
        assert!(!PixelFormat::Lineart.has_16_bit_samples());
    }
}
