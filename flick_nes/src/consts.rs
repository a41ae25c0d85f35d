//! Fixed properties of the NTSC NES.

/// Width of the visible picture in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Height of the visible picture in pixels.
pub const FRAME_HEIGHT: usize = 240;
/// Number of pixels in one frame.
pub const FRAME_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// Numerator of the NTSC frame rate.
pub const NTSC_FPS_NUMERATOR: u32 = 39_375_000;
/// Denominator of the NTSC frame rate.
pub const NTSC_FPS_DENOMINATOR: u32 = 655_171;

/// The NTSC frame rate, roughly 60.0988 frames per second.
pub fn ntsc_fps() -> f64 {
    NTSC_FPS_NUMERATOR as f64 / NTSC_FPS_DENOMINATOR as f64
}

/// Size of the console's internal work RAM.
pub const RAM_SIZE: usize = 0x0800;

/// Number of entries in the master palette.
pub const PALETTE_ENTRIES: usize = 64;
/// Palette index of black.
pub const PALETTE_ENTRY_BLACK: u8 = 0x0f;
/// Palette index of white.
pub const PALETTE_ENTRY_WHITE: u8 = 0x20;

/// The master palette, as RGB triples.
pub static DEFAULT_PALETTE: [[u8; 3]; PALETTE_ENTRIES] = [
    [0x52, 0x52, 0x52],
    [0x01, 0x1a, 0x51],
    [0x0f, 0x0f, 0x65],
    [0x23, 0x06, 0x63],
    [0x36, 0x03, 0x4b],
    [0x40, 0x04, 0x26],
    [0x3f, 0x09, 0x04],
    [0x32, 0x13, 0x00],
    [0x1f, 0x20, 0x00],
    [0x0b, 0x2a, 0x00],
    [0x00, 0x2f, 0x00],
    [0x00, 0x2e, 0x0a],
    [0x00, 0x26, 0x2d],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xa0, 0xa0, 0xa0],
    [0x1e, 0x4a, 0x9d],
    [0x38, 0x37, 0xbc],
    [0x58, 0x28, 0xb8],
    [0x75, 0x21, 0x94],
    [0x84, 0x23, 0x5c],
    [0x82, 0x2e, 0x24],
    [0x6f, 0x3f, 0x00],
    [0x51, 0x52, 0x00],
    [0x31, 0x63, 0x00],
    [0x1a, 0x6b, 0x05],
    [0x0e, 0x69, 0x2e],
    [0x10, 0x5c, 0x68],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xfe, 0xff, 0xff],
    [0x69, 0x9e, 0xfc],
    [0x89, 0x87, 0xff],
    [0xae, 0x76, 0xff],
    [0xce, 0x6d, 0xf1],
    [0xe0, 0x70, 0xb2],
    [0xde, 0x7c, 0x70],
    [0xc8, 0x91, 0x3e],
    [0xa6, 0xa7, 0x25],
    [0x81, 0xba, 0x28],
    [0x63, 0xc4, 0x46],
    [0x54, 0xc1, 0x7d],
    [0x56, 0xb3, 0xc0],
    [0x3c, 0x3c, 0x3c],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
    [0xfe, 0xff, 0xff],
    [0xbe, 0xd6, 0xfd],
    [0xcc, 0xcc, 0xff],
    [0xdd, 0xc4, 0xff],
    [0xea, 0xc0, 0xf9],
    [0xf2, 0xc1, 0xdf],
    [0xf1, 0xc7, 0xc2],
    [0xe8, 0xd0, 0xaa],
    [0xd9, 0xda, 0x9d],
    [0xc9, 0xe2, 0x9e],
    [0xbc, 0xe6, 0xae],
    [0xb4, 0xe5, 0xc7],
    [0xb5, 0xdf, 0xe4],
    [0xa9, 0xa9, 0xa9],
    [0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_black_and_white() {
        assert_eq!(DEFAULT_PALETTE[PALETTE_ENTRY_BLACK as usize], [0, 0, 0]);
        assert_eq!(
            DEFAULT_PALETTE[PALETTE_ENTRY_WHITE as usize],
            [0xfe, 0xff, 0xff]
        );
    }

    #[test]
    fn ntsc_rate() {
        assert!((ntsc_fps() - 60.0988).abs() < 1e-3);
    }
}
