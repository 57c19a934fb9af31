//! UIC record ids and their binary layouts
//!
//! Every UIC1 and UIC4 record id maps to one encoding kind. The table is
//! static; supporting a new id means adding a row here.

/// UIC record ids shared by UIC1 and UIC4
pub mod ids {
    pub const AUTO_SCALE: u32 = 0;
    pub const MIN_SCALE: u32 = 1;
    pub const MAX_SCALE: u32 = 2;
    pub const SPATIAL_CALIBRATION: u32 = 3;
    pub const X_CALIBRATION: u32 = 4;
    pub const Y_CALIBRATION: u32 = 5;
    pub const CALIBRATION_UNITS: u32 = 6;
    pub const NAME: u32 = 7;
    pub const THRESH_STATE: u32 = 8;
    pub const THRESH_STATE_RED: u32 = 9;
    pub const THRESH_STATE_GREEN: u32 = 11;
    pub const THRESH_STATE_BLUE: u32 = 12;
    pub const THRESH_STATE_LO: u32 = 13;
    pub const THRESH_STATE_HI: u32 = 14;
    pub const ZOOM: u32 = 15;
    pub const CREATE_TIME: u32 = 16;
    pub const LAST_SAVED_TIME: u32 = 17;
    pub const CURRENT_BUFFER: u32 = 18;
    pub const GRAY_FIT: u32 = 19;
    pub const GRAY_POINT_COUNT: u32 = 20;
    pub const GRAY_X: u32 = 21;
    pub const GRAY_Y: u32 = 22;
    pub const GRAY_MIN: u32 = 23;
    pub const GRAY_MAX: u32 = 24;
    pub const GRAY_UNIT_NAME: u32 = 25;
    pub const STANDARD_LUT: u32 = 26;
    pub const WAVELENGTH: u32 = 27;
    pub const STAGE_POSITION: u32 = 28;
    pub const CAMERA_CHIP_OFFSET: u32 = 29;
    pub const STAGE_LABEL: u32 = 37;
    pub const AUTO_SCALE_LO_INFO: u32 = 38;
    pub const AUTO_SCALE_HI_INFO: u32 = 39;
    pub const ABSOLUTE_Z: u32 = 40;
    pub const ABSOLUTE_Z_VALID: u32 = 41;
    pub const GAMMA: u32 = 42;
    pub const GAMMA_RED: u32 = 43;
    pub const GAMMA_GREEN: u32 = 44;
    pub const GAMMA_BLUE: u32 = 45;
    pub const CAMERA_BIN: u32 = 46;
    pub const NEW_LUT: u32 = 47;
    pub const IMAGE_PROPERTY_EX: u32 = 48;
    pub const USER_LUT_TABLE: u32 = 50;
    pub const RED_AUTO_SCALE_INFO: u32 = 51;
    pub const RED_AUTO_SCALE_LO_INFO: u32 = 52;
    pub const RED_AUTO_SCALE_HI_INFO: u32 = 53;
    pub const RED_MIN_SCALE_INFO: u32 = 54;
    pub const RED_MAX_SCALE_INFO: u32 = 55;
    pub const GREEN_AUTO_SCALE_INFO: u32 = 56;
    pub const GREEN_AUTO_SCALE_LO_INFO: u32 = 57;
    pub const GREEN_AUTO_SCALE_HI_INFO: u32 = 58;
    pub const GREEN_MIN_SCALE_INFO: u32 = 59;
    pub const GREEN_MAX_SCALE_INFO: u32 = 60;
    pub const BLUE_AUTO_SCALE_INFO: u32 = 61;
    pub const BLUE_AUTO_SCALE_LO_INFO: u32 = 62;
    pub const BLUE_AUTO_SCALE_HI_INFO: u32 = 63;
    pub const BLUE_MIN_SCALE_INFO: u32 = 64;
    pub const BLUE_MAX_SCALE_INFO: u32 = 65;
    pub const OVERLAY_PLANE_COLOR: u32 = 66;
}

/// Size of the UserLutTable block (256 RGB triples)
pub const USER_LUT_LEN: usize = 768;

/// Layout of a UIC1 record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uic1Kind {
    /// One long stored in the record slot
    InlineLong,
    /// Offset to one rational
    Rational,
    /// Offset to one rational per plane
    PlaneRationals,
    /// Offset to one long per plane
    PlaneLongs,
    /// Offset to a u32 length followed by ASCII bytes
    String,
    /// Offset to one long
    OffsetLong,
    /// Offset to the 768-byte user LUT
    ByteTable,
    /// Offset to two rationals per plane
    PlaneRationalPairs,
    /// Offset to an inner offset, then one length-prefixed string per plane
    PlaneStrings,
    /// Slot consumed and discarded
    Ignored,
}

/// Layout of one per-plane value in a UIC4 block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uic4Kind {
    RationalPair,
    String,
    Rational,
    Long,
}

/// UIC1 layout of `id`, None for ids the format does not define
pub fn uic1_kind(id: u32) -> Option<Uic1Kind> {
    use ids::*;
    let kind = match id {
        AUTO_SCALE | MIN_SCALE | MAX_SCALE | SPATIAL_CALIBRATION | THRESH_STATE | THRESH_STATE_RED | 10
        | THRESH_STATE_GREEN | THRESH_STATE_BLUE | THRESH_STATE_LO | THRESH_STATE_HI | ZOOM | CURRENT_BUFFER
        | GRAY_FIT | GRAY_POINT_COUNT | GRAY_UNIT_NAME | STANDARD_LUT | WAVELENGTH | NEW_LUT
        | RED_AUTO_SCALE_INFO | RED_MIN_SCALE_INFO | RED_MAX_SCALE_INFO | GREEN_AUTO_SCALE_INFO
        | GREEN_MIN_SCALE_INFO | GREEN_MAX_SCALE_INFO | BLUE_AUTO_SCALE_INFO | BLUE_MIN_SCALE_INFO
        | BLUE_MAX_SCALE_INFO => Uic1Kind::InlineLong,
        X_CALIBRATION | Y_CALIBRATION | CREATE_TIME | LAST_SAVED_TIME | GRAY_X | GRAY_Y | GRAY_MIN | GRAY_MAX
        | AUTO_SCALE_LO_INFO | AUTO_SCALE_HI_INFO | RED_AUTO_SCALE_LO_INFO | RED_AUTO_SCALE_HI_INFO
        | GREEN_AUTO_SCALE_LO_INFO | GREEN_AUTO_SCALE_HI_INFO | BLUE_AUTO_SCALE_LO_INFO
        | BLUE_AUTO_SCALE_HI_INFO => Uic1Kind::Rational,
        ABSOLUTE_Z => Uic1Kind::PlaneRationals,
        ABSOLUTE_Z_VALID => Uic1Kind::PlaneLongs,
        CALIBRATION_UNITS | NAME => Uic1Kind::String,
        GAMMA | GAMMA_RED | GAMMA_GREEN | GAMMA_BLUE => Uic1Kind::OffsetLong,
        USER_LUT_TABLE => Uic1Kind::ByteTable,
        STAGE_POSITION | CAMERA_CHIP_OFFSET => Uic1Kind::PlaneRationalPairs,
        STAGE_LABEL => Uic1Kind::PlaneStrings,
        CAMERA_BIN | IMAGE_PROPERTY_EX | OVERLAY_PLANE_COLOR => Uic1Kind::Ignored,
        _ => return None,
    };
    Some(kind)
}

/// UIC4 layout of `id`, None for ids UIC4 cannot carry
pub fn uic4_kind(id: u16) -> Option<Uic4Kind> {
    match id as u32 {
        ids::STAGE_POSITION | ids::CAMERA_CHIP_OFFSET => Some(Uic4Kind::RationalPair),
        ids::STAGE_LABEL => Some(Uic4Kind::String),
        ids::ABSOLUTE_Z | ids::CAMERA_BIN => Some(Uic4Kind::Rational),
        ids::ABSOLUTE_Z_VALID => Some(Uic4Kind::Long),
        _ => None,
    }
}

/// Human-readable name of a UIC record id
pub fn uic_name(id: u32) -> &'static str {
    use ids::*;
    match id {
        AUTO_SCALE => "AutoScale",
        MIN_SCALE => "MinScale",
        MAX_SCALE => "MaxScale",
        SPATIAL_CALIBRATION => "SpatialCalibration",
        X_CALIBRATION => "XCalibration",
        Y_CALIBRATION => "YCalibration",
        CALIBRATION_UNITS => "CalibrationUnits",
        NAME => "Name",
        THRESH_STATE => "ThreshState",
        THRESH_STATE_RED => "ThreshStateRed",
        THRESH_STATE_GREEN => "ThreshStateGreen",
        THRESH_STATE_BLUE => "ThreshStateBlue",
        THRESH_STATE_LO => "ThreshStateLo",
        THRESH_STATE_HI => "ThreshStateHi",
        ZOOM => "Zoom",
        CREATE_TIME => "CreateTime",
        LAST_SAVED_TIME => "LastSavedTime",
        CURRENT_BUFFER => "CurrentBuffer",
        GRAY_FIT => "GrayFit",
        GRAY_POINT_COUNT => "GrayPointCount",
        GRAY_X => "GrayX",
        GRAY_Y => "GrayY",
        GRAY_MIN => "GrayMin",
        GRAY_MAX => "GrayMax",
        GRAY_UNIT_NAME => "GrayUnitName",
        STANDARD_LUT => "StandardLUT",
        WAVELENGTH => "Wavelength",
        STAGE_POSITION => "StagePosition",
        CAMERA_CHIP_OFFSET => "CameraChipOffset",
        STAGE_LABEL => "StageLabel",
        AUTO_SCALE_LO_INFO => "AutoScaleLoInfo",
        AUTO_SCALE_HI_INFO => "AutoScaleHiInfo",
        ABSOLUTE_Z => "AbsoluteZ",
        ABSOLUTE_Z_VALID => "AbsoluteZValid",
        GAMMA => "Gamma",
        GAMMA_RED => "GammaRed",
        GAMMA_GREEN => "GammaGreen",
        GAMMA_BLUE => "GammaBlue",
        CAMERA_BIN => "CameraBin",
        NEW_LUT => "NewLUT",
        IMAGE_PROPERTY_EX => "ImagePropertyEx",
        USER_LUT_TABLE => "UserLutTable",
        RED_AUTO_SCALE_INFO => "RedAutoScaleInfo",
        RED_AUTO_SCALE_LO_INFO => "RedAutoScaleLoInfo",
        RED_AUTO_SCALE_HI_INFO => "RedAutoScaleHiInfo",
        RED_MIN_SCALE_INFO => "RedMinScaleInfo",
        RED_MAX_SCALE_INFO => "RedMaxScaleInfo",
        GREEN_AUTO_SCALE_INFO => "GreenAutoScaleInfo",
        GREEN_AUTO_SCALE_LO_INFO => "GreenAutoScaleLoInfo",
        GREEN_AUTO_SCALE_HI_INFO => "GreenAutoScaleHiInfo",
        GREEN_MIN_SCALE_INFO => "GreenMinScaleInfo",
        GREEN_MAX_SCALE_INFO => "GreenMaxScaleInfo",
        BLUE_AUTO_SCALE_INFO => "BlueAutoScaleInfo",
        BLUE_AUTO_SCALE_LO_INFO => "BlueAutoScaleLoInfo",
        BLUE_AUTO_SCALE_HI_INFO => "BlueAutoScaleHiInfo",
        BLUE_MIN_SCALE_INFO => "BlueMinScaleInfo",
        BLUE_MAX_SCALE_INFO => "BlueMaxScaleInfo",
        OVERLAY_PLANE_COLOR => "OverlayPlaneColor",
        _ => "Unknown",
    }
}
