/// Geometry limits of one light source, in millimetres.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Area {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
    pub calibration_y: f64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Scanner {
    pub name: &'static str,
    pub vendor: &'static str,
    pub model: &'static str,
    pub kind: &'static str,
    pub resolutions: &'static [u32],
    pub bit_depths: &'static [u8],
    pub platen: Area,
    pub transparency: Option<Area>,
    pub lamp_timeout_minutes: u8,
}
