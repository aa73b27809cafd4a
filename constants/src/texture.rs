/// Side length of the generated test card used when no source image is configured
pub const TEST_CARD_SIZE: u32 = 256;

/// Number of checker cells along each side of the test card
pub const TEST_CARD_CELLS: u32 = 8;

/// Border width of the test card (pixels)
pub const TEST_CARD_BORDER: u32 = 6;
