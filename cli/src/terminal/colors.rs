use colored::Color;

pub const PRIMARY: Color = Color::TrueColor { r: 129, g: 199, b: 132 };
pub const ACCENT: Color = Color::TrueColor { r: 255, g: 213, b: 79 };
pub const SEPARATOR: Color = Color::TrueColor { r: 110, g: 110, b: 110 };
pub const TEXT_DEFAULT: Color = Color::TrueColor { r: 220, g: 220, b: 220 };

pub const IPV4_ADDR: Color = Color::TrueColor { r: 100, g: 181, b: 246 };
pub const PORT: Color = Color::TrueColor { r: 186, g: 104, b: 200 };
pub const URL: Color = Color::TrueColor { r: 77, g: 208, b: 225 };

pub const TIER_HIGH: Color = Color::TrueColor { r: 102, g: 187, b: 106 };
pub const TIER_MEDIUM: Color = Color::TrueColor { r: 255, g: 183, b: 77 };
pub const TIER_LOW: Color = Color::TrueColor { r: 158, g: 158, b: 158 };
