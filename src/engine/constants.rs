// Constants for the input tensor
pub const NUM_PIECE_TYPE_BITS: usize = 6; // 6 piece types
pub const NUM_COLOR_BITS: usize = 2; // 2 colors
pub const NUM_BITS_PER_BOARD: usize = NUM_PIECE_TYPE_BITS * NUM_COLOR_BITS; // 12 piece planes

pub const NUM_LEGAL_DESTINATION_BITS: usize = 1; // 1 plane marking legal move destinations

pub const NUM_POSITION_BITS: usize = NUM_BITS_PER_BOARD + NUM_LEGAL_DESTINATION_BITS; // 13 8x8 planes in the input tensor
pub const LEGAL_DESTINATION_LAYER: usize = NUM_BITS_PER_BOARD;

pub const BOARD_SIZE: usize = 8;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;
pub const NUM_INPUT_VALUES: usize = NUM_POSITION_BITS * NUM_SQUARES; // 832 floats per position

// Constants for the move vocabulary
pub const NUM_PROMOTION_PIECES: usize = 4; // knight, bishop, rook, queen
pub const NUM_EXHAUSTIVE_MOVES: usize = 1968; // every from/to pair a piece can travel, plus promotions
