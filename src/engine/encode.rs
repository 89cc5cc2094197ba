use chess::Color;
use crate::engine::constants::{BOARD_SIZE, LEGAL_DESTINATION_LAYER, NUM_INPUT_VALUES, NUM_PIECE_TYPE_BITS, NUM_POSITION_BITS, NUM_SQUARES};
use crate::error::PredictError;
use crate::position::{square_to_row_col, Position};

/// Dense `[13, 8, 8]` float planes, stored row-major as (layer, row, col).
#[derive(Clone, PartialEq, Debug)]
pub struct BoardTensor {
    data: Box<[f32; NUM_INPUT_VALUES]>,
}

impl BoardTensor {
    pub const SHAPE: [usize; 3] = [NUM_POSITION_BITS, BOARD_SIZE, BOARD_SIZE];

    pub fn zeros() -> BoardTensor {
        BoardTensor {
            data: Box::new([0.; NUM_INPUT_VALUES]),
        }
    }

    const fn offset(layer: usize, row: usize, col: usize) -> usize {
        layer * NUM_SQUARES + row * BOARD_SIZE + col
    }

    pub fn get(&self, layer: usize, row: usize, col: usize) -> f32 {
        self.data[Self::offset(layer, row, col)]
    }

    fn set(&mut self, layer: usize, row: usize, col: usize) {
        self.data[Self::offset(layer, row, col)] = 1.;
    }

    pub fn layer(&self, layer: usize) -> &[f32] {
        &self.data[layer * NUM_SQUARES..(layer + 1) * NUM_SQUARES]
    }

    pub fn layer_sum(&self, layer: usize) -> f32 {
        self.layer(layer).iter().sum()
    }

    /// Number of non-zero cells across `layers`.
    pub fn count_set(&self, layers: std::ops::Range<usize>) -> usize {
        layers
            .flat_map(|layer| self.layer(layer).iter())
            .filter(|&&value| value != 0.)
            .count()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data[..]
    }
}

/// Fills the tensor channels for a given color's pieces.
/// `offset` determines the starting channel for this color's pieces in the tensor.
fn fill_pieces_for_color(tensor: &mut BoardTensor, position: &Position, color: Color, offset: usize) {
    for (square, piece, _) in position.piece_map().filter(|(_, _, c)| *c == color) {
        let (row, col) = square_to_row_col(square.to_index());
        tensor.set(offset + piece.to_index(), row, col);
    }
}

fn fill_pieces(tensor: &mut BoardTensor, position: &Position) {
    // Channels 0-5: White pieces, pawn to king
    fill_pieces_for_color(tensor, position, Color::White, 0);

    // Channels 6-11: Black pieces, same order
    fill_pieces_for_color(tensor, position, Color::Black, NUM_PIECE_TYPE_BITS);
}

fn fill_legal_destinations(tensor: &mut BoardTensor, position: &Position) {
    for mv in position.legal_moves() {
        let (row, col) = square_to_row_col(mv.get_dest().to_index());
        tensor.set(LEGAL_DESTINATION_LAYER, row, col);
    }
}

pub fn position_to_tensor(position: &Position) -> BoardTensor {
    let mut tensor = BoardTensor::zeros();

    // Channels 0-11: Pieces
    fill_pieces(&mut tensor, position);

    // Channel 12: Squares some legal move lands on
    fill_legal_destinations(&mut tensor, position);

    tensor
}

/// Parses and encodes in one step; an unparseable or insane FEN never
/// reaches tensor construction.
pub fn fen_to_tensor(fen: &str) -> Result<BoardTensor, PredictError> {
    let position = Position::from_fen(fen)?;
    Ok(position_to_tensor(&position))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use chess::{Board, Piece, Square, ALL_SQUARES};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use crate::engine::constants::NUM_BITS_PER_BOARD;
    use crate::position::INITIAL_FEN;
    use super::*;

    fn random_positions(seed: u64, count: usize) -> Vec<Position> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = Vec::with_capacity(count);
        let mut position = Position::initial();
        while positions.len() < count {
            positions.push(position.clone());
            match position.legal_moves().choose(&mut rng) {
                Some(mv) => {
                    let board: Board = position.board().make_move_new(*mv);
                    position = Position::from_board(board);
                }
                None => position = Position::initial(),
            }
        }
        positions
    }

    #[test]
    fn test_position_to_tensor() {
        let tensor = fen_to_tensor(INITIAL_FEN).unwrap();

        // channels 0-5: white pawns, knights, bishops, rooks, queens, kings
        assert_eq!(tensor.layer_sum(0), 8.);
        assert_eq!(tensor.layer_sum(1), 2.);
        assert_eq!(tensor.layer_sum(2), 2.);
        assert_eq!(tensor.layer_sum(3), 2.);
        assert_eq!(tensor.layer_sum(4), 1.);
        assert_eq!(tensor.layer_sum(5), 1.);

        // channels 6-11: black pieces
        assert_eq!(tensor.layer_sum(6), 8.);
        assert_eq!(tensor.layer_sum(7), 2.);
        assert_eq!(tensor.layer_sum(8), 2.);
        assert_eq!(tensor.layer_sum(9), 2.);
        assert_eq!(tensor.layer_sum(10), 1.);
        assert_eq!(tensor.layer_sum(11), 1.);

        assert_eq!(tensor.count_set(0..NUM_BITS_PER_BOARD), 32);

        // channel 12: ranks 3 and 4 are reachable, nothing else
        assert_eq!(tensor.layer_sum(12), 16.);
        for col in 0..8 {
            assert_eq!(tensor.get(12, 2, col), 1.);
            assert_eq!(tensor.get(12, 3, col), 1.);
        }
    }

    #[test]
    fn test_square_layout() {
        let tensor = position_to_tensor(&Position::initial());

        // white king on e1 = square 4 = (row 0, col 4)
        assert_eq!(tensor.get(Piece::King.to_index(), 0, 4), 1.);
        // black queen on d8 = square 59 = (row 7, col 3)
        assert_eq!(tensor.get(NUM_PIECE_TYPE_BITS + Piece::Queen.to_index(), 7, 3), 1.);
        // h2 pawn
        let (row, col) = square_to_row_col(Square::H2.to_index());
        assert_eq!(tensor.get(0, row, col), 1.);
        assert_eq!((row, col), (1, 7));
    }

    #[test]
    fn test_black_to_move_is_not_mirrored() {
        let position = Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        let tensor = position_to_tensor(&position);

        // e4 pawn stays a white pawn on (row 3, col 4)
        assert_eq!(tensor.get(0, 3, 4), 1.);
        // black's replies land on ranks 6 and 5
        for col in 0..8 {
            assert_eq!(tensor.get(12, 5, col), 1.);
            assert_eq!(tensor.get(12, 4, col), 1.);
        }
        assert_eq!(tensor.layer_sum(12), 16.);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for position in random_positions(7, 50) {
            let reparsed = Position::from_fen(&position.fen()).unwrap();
            assert_eq!(position_to_tensor(&position), position_to_tensor(&reparsed));
        }
    }

    #[test]
    fn test_piece_planes_match_board() {
        for position in random_positions(11, 200) {
            let tensor = position_to_tensor(&position);
            let num_pieces = position.piece_map().count();
            assert_eq!(tensor.count_set(0..NUM_BITS_PER_BOARD), num_pieces);

            for row in 0..8 {
                for col in 0..8 {
                    let occupied = (0..NUM_BITS_PER_BOARD)
                        .filter(|&layer| tensor.get(layer, row, col) == 1.)
                        .count();
                    let square = ALL_SQUARES[row * 8 + col];
                    let expected = usize::from(position.board().piece_on(square).is_some());
                    assert_eq!(occupied, expected);
                }
            }
        }
    }

    #[test]
    fn test_legal_destination_plane() {
        for position in random_positions(23, 200) {
            let tensor = position_to_tensor(&position);
            let destinations: HashSet<usize> = position.legal_moves().iter()
                .map(|mv| mv.get_dest().to_index())
                .collect();

            assert_eq!(tensor.count_set(LEGAL_DESTINATION_LAYER..LEGAL_DESTINATION_LAYER + 1), destinations.len());
            for index in destinations {
                let (row, col) = square_to_row_col(index);
                assert_eq!(tensor.get(LEGAL_DESTINATION_LAYER, row, col), 1.);
            }
        }
    }

    #[test]
    fn test_invalid_fen_is_rejected() {
        let result = fen_to_tensor("rnbq1bnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQ - 0 1");
        assert!(matches!(result, Err(PredictError::InvalidPosition(_))));
    }

    #[test]
    fn test_shape() {
        let tensor = BoardTensor::zeros();
        assert_eq!(BoardTensor::SHAPE, [13, 8, 8]);
        assert_eq!(tensor.as_slice().len(), 13 * 8 * 8);
        assert_eq!(tensor.count_set(0..13), 0);
    }
}
