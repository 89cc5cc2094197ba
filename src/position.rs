use std::collections::BTreeSet;
use std::str::FromStr;
use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, ALL_COLORS};
use crate::engine::constants::BOARD_SIZE;
use crate::error::PredictError;

pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const FEN_PIECE_CHARS: &str = "pnbrqkPNBRQK";
const FEN_CASTLING_CHARS: &str = "KQkq";
const NUM_FEN_FIELDS: usize = 6;
const MAX_PIECES_PER_SIDE: u32 = 16;
const MAX_PAWNS_PER_SIDE: u32 = 8;

/// A parsed, sanity-checked board together with its legal moves.
///
/// Legal moves are generated once on construction; everything downstream
/// (tensor encoding, move selection) reads the same list.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    legal_moves: Vec<ChessMove>,
}

impl Position {
    /// Parses FEN text. Missing trailing fields take their usual defaults
    /// (white to move, no castling, no en passant, clocks `0 1`). Besides the
    /// layout checks, the position must pass the rules engine's sanity checks
    /// (missing kings, pawns on the back rank, opponent in check, ...) and
    /// hold at most 16 pieces and 8 pawns per side, so every `Position` is
    /// valid.
    pub fn from_fen(fen: &str) -> Result<Position, PredictError> {
        let fen = normalize_fen(fen).map_err(PredictError::InvalidPosition)?;
        let board = Board::from_str(&fen)
            .map_err(|e| PredictError::InvalidPosition(e.to_string()))?;
        check_piece_counts(&board).map_err(PredictError::InvalidPosition)?;
        Ok(Position::from_board(board))
    }

    pub fn from_board(board: Board) -> Position {
        let legal_moves = MoveGen::new_legal(&board).collect();
        Position { board, legal_moves }
    }

    pub fn initial() -> Position {
        Position::from_board(Board::default())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Every occupied square with the piece standing on it.
    pub fn piece_map(&self) -> impl Iterator<Item = (Square, Piece, Color)> + '_ {
        let board = &self.board;
        (*board.combined()).filter_map(move |square| {
            Some((square, board.piece_on(square)?, board.color_on(square)?))
        })
    }

    pub fn legal_moves(&self) -> &[ChessMove] {
        &self.legal_moves
    }

    /// Legal moves in UCI notation, ordered lexicographically.
    pub fn legal_move_set(&self) -> BTreeSet<String> {
        self.legal_moves.iter().map(|mv| mv.to_string()).collect()
    }

    pub fn has_legal_moves(&self) -> bool {
        !self.legal_moves.is_empty()
    }

    pub fn status(&self) -> BoardStatus {
        if self.has_legal_moves() {
            BoardStatus::Ongoing
        } else if *self.board.checkers() == chess::EMPTY {
            BoardStatus::Stalemate
        } else {
            BoardStatus::Checkmate
        }
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }
}

/// Square index in the a1 = 0, h1 = 7, a8 = 56 layout, split into (row, column).
pub const fn square_to_row_col(square_index: usize) -> (usize, usize) {
    (square_index / 8, square_index % 8)
}

/// Checks every FEN field and returns the full six-field form.
///
/// `Board::from_str` does not check rank lengths, so its input must pass here
/// first.
fn normalize_fen(fen: &str) -> Result<String, String> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.is_empty() {
        return Err("empty FEN".to_string());
    }
    if fields.len() > NUM_FEN_FIELDS {
        return Err(format!("expected at most {} fields, found {}", NUM_FEN_FIELDS, fields.len()));
    }

    check_placement(fields[0])?;

    let side = fields.get(1).copied().unwrap_or("w");
    if side != "w" && side != "b" {
        return Err(format!("side to move must be 'w' or 'b', found {:?}", side));
    }

    let castling = fields.get(2).copied().unwrap_or("-");
    check_castling(castling)?;

    let en_passant = fields.get(3).copied().unwrap_or("-");
    check_en_passant(en_passant, side)?;

    let halfmove = fields.get(4).copied().unwrap_or("0");
    let fullmove = fields.get(5).copied().unwrap_or("1");
    for clock in [halfmove, fullmove] {
        if clock.parse::<u32>().is_err() {
            return Err(format!("move counter must be a number, found {:?}", clock));
        }
    }

    Ok(format!("{} {} {} {} {} {}", fields[0], side, castling, en_passant, halfmove, fullmove))
}

/// Exactly 8 ranks of exactly 8 squares, pieces from `pnbrqkPNBRQK`, empty
/// runs as single digits 1 to 8.
fn check_placement(placement: &str) -> Result<(), String> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != BOARD_SIZE {
        return Err(format!("expected {} ranks, found {}", BOARD_SIZE, ranks.len()));
    }

    for (i, rank) in ranks.iter().enumerate() {
        let rank_number = BOARD_SIZE - i;
        let mut squares = 0;
        let mut previous_was_digit = false;
        for c in rank.chars() {
            match c {
                '1'..='8' => {
                    if previous_was_digit {
                        return Err(format!("two consecutive digits in rank {}", rank_number));
                    }
                    squares += c as usize - '0' as usize;
                    previous_was_digit = true;
                }
                c if FEN_PIECE_CHARS.contains(c) => {
                    squares += 1;
                    previous_was_digit = false;
                }
                c => return Err(format!("unexpected character {:?} in rank {}", c, rank_number)),
            }
        }
        if squares != BOARD_SIZE {
            return Err(format!("expected {} squares in rank {}, found {}", BOARD_SIZE, rank_number, squares));
        }
    }
    Ok(())
}

fn check_castling(castling: &str) -> Result<(), String> {
    if castling == "-" {
        return Ok(());
    }
    let well_formed = castling.chars().all(|c| FEN_CASTLING_CHARS.contains(c))
        && castling.chars().enumerate().all(|(i, c)| !castling[i + 1..].contains(c));
    if !well_formed {
        return Err(format!("invalid castling rights {:?}", castling));
    }
    Ok(())
}

/// `-`, or a square on the 6th rank with white to move (3rd with black).
fn check_en_passant(en_passant: &str, side: &str) -> Result<(), String> {
    if en_passant == "-" {
        return Ok(());
    }
    let expected_rank = if side == "w" { b'6' } else { b'3' };
    match en_passant.as_bytes() {
        [file, rank] if (b'a'..=b'h').contains(file) && *rank == expected_rank => Ok(()),
        _ => Err(format!("invalid en passant square {:?}", en_passant)),
    }
}

fn check_piece_counts(board: &Board) -> Result<(), String> {
    for color in ALL_COLORS {
        let pieces = board.color_combined(color);
        let pawns = pieces & board.pieces(Piece::Pawn);
        if pieces.popcnt() > MAX_PIECES_PER_SIDE {
            return Err(format!("{:?} has {} pieces", color, pieces.popcnt()));
        }
        if pawns.popcnt() > MAX_PAWNS_PER_SIDE {
            return Err(format!("{:?} has {} pawns", color, pawns.popcnt()));
        }
    }
    Ok(())
}
