use std::fs;
use std::path::Path;
use chess::{Square, ALL_SQUARES};
use indexmap::{IndexMap, IndexSet};
use crate::engine::constants::NUM_PROMOTION_PIECES;
use crate::error::{VocabularyError, VocabularyResult};

const PROMOTION_CHARS: [char; NUM_PROMOTION_PIECES] = ['n', 'b', 'r', 'q'];

/// Fixed bidirectional table between UCI move strings and dense policy indices.
///
/// The position of a move in the underlying `IndexSet` is its index, so both
/// directions are O(1) and built exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveVocabulary {
    moves: IndexSet<String>,
}

impl MoveVocabulary {
    /// Builds a vocabulary from `(move, index)` pairs, as stored on disk.
    /// The indices must cover `0..len` exactly once.
    pub fn from_index_map<I>(entries: I) -> VocabularyResult<MoveVocabulary>
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let entries: Vec<(String, u32)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(VocabularyError::Empty);
        }

        let len = entries.len();
        let mut slots: Vec<Option<String>> = vec![None; len];
        for (mv, index) in entries {
            if !is_uci_move(&mv) {
                return Err(VocabularyError::InvalidMove(mv));
            }
            let slot = match slots.get_mut(index as usize) {
                Some(slot) => slot,
                None => return Err(VocabularyError::IndexOutOfRange { mv, index, len }),
            };
            if let Some(first) = slot.take() {
                return Err(VocabularyError::DuplicateIndex { index, first, second: mv });
            }
            *slot = Some(mv);
        }

        // len entries, all in range, no index twice: every slot is filled
        MoveVocabulary::from_moves(slots.into_iter().flatten())
    }

    /// Builds a vocabulary whose indices are the iteration order of `moves`.
    pub fn from_moves<I, S>(moves: I) -> VocabularyResult<MoveVocabulary>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = IndexSet::new();
        for mv in moves {
            let mv = mv.into();
            if !is_uci_move(&mv) {
                return Err(VocabularyError::InvalidMove(mv));
            }
            if set.contains(&mv) {
                return Err(VocabularyError::DuplicateMove(mv));
            }
            set.insert(mv);
        }
        if set.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(MoveVocabulary { moves: set })
    }

    pub fn from_json_str(json: &str) -> VocabularyResult<MoveVocabulary> {
        let entries: IndexMap<String, u32> = serde_json::from_str(json)?;
        MoveVocabulary::from_index_map(entries)
    }

    pub fn from_bincode_bytes(bytes: &[u8]) -> VocabularyResult<MoveVocabulary> {
        let entries: IndexMap<String, u32> = bincode::deserialize(bytes)?;
        MoveVocabulary::from_index_map(entries)
    }

    pub fn from_pickle_bytes(bytes: &[u8]) -> VocabularyResult<MoveVocabulary> {
        let entries: IndexMap<String, u32> = serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new())?;
        MoveVocabulary::from_index_map(entries)
    }

    /// Loads a vocabulary file in the format named by its extension
    /// (see [`VocabularyFormat::from_path`]).
    pub fn load(path: impl AsRef<Path>) -> VocabularyResult<MoveVocabulary> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match VocabularyFormat::from_path(path) {
            VocabularyFormat::Bincode => MoveVocabulary::from_bincode_bytes(&bytes),
            VocabularyFormat::Pickle => MoveVocabulary::from_pickle_bytes(&bytes),
            VocabularyFormat::Json => MoveVocabulary::from_json_str(&String::from_utf8_lossy(&bytes)),
        }
    }

    pub fn to_index_map(&self) -> IndexMap<&str, u32> {
        self.moves
            .iter()
            .enumerate()
            .map(|(index, mv)| (mv.as_str(), index as u32))
            .collect()
    }

    pub fn to_json_string(&self) -> VocabularyResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_index_map())?)
    }

    pub fn to_bincode_bytes(&self) -> VocabularyResult<Vec<u8>> {
        Ok(bincode::serialize(&self.to_index_map())?)
    }

    pub fn to_pickle_bytes(&self) -> VocabularyResult<Vec<u8>> {
        Ok(serde_pickle::to_vec(&self.to_index_map(), serde_pickle::SerOptions::new())?)
    }

    /// Writes the vocabulary in the format `load` picks for this path.
    pub fn save(&self, path: impl AsRef<Path>) -> VocabularyResult<()> {
        let path = path.as_ref();
        let bytes = match VocabularyFormat::from_path(path) {
            VocabularyFormat::Bincode => self.to_bincode_bytes()?,
            VocabularyFormat::Pickle => self.to_pickle_bytes()?,
            VocabularyFormat::Json => self.to_json_string()?.into_bytes(),
        };
        fs::write(path, bytes).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Every move some piece could geometrically make on an empty board:
    /// queen lines of length 1 to 7, knight jumps, and pawn promotions to
    /// each of n, b, r, q. Ordered by source square, then destination, with
    /// promotions right after the plain move.
    pub fn exhaustive() -> MoveVocabulary {
        let mut moves = IndexSet::new();
        for src in ALL_SQUARES {
            for dst in ALL_SQUARES {
                if src == dst || !(is_queen_like_move(src, dst) || is_knight_jump(src, dst)) {
                    continue;
                }
                let plain = format!("{}{}", src, dst);
                moves.insert(plain.clone());
                if is_promotion_path(src, dst) {
                    for promotion in PROMOTION_CHARS {
                        moves.insert(format!("{}{}", plain, promotion));
                    }
                }
            }
        }
        MoveVocabulary { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn index_of(&self, mv: &str) -> Option<usize> {
        self.moves.get_index_of(mv)
    }

    pub fn move_at(&self, index: usize) -> Option<&str> {
        self.moves.get_index(index).map(String::as_str)
    }

    pub fn contains(&self, mv: &str) -> bool {
        self.moves.contains(mv)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(String::as_str)
    }
}

/// On-disk vocabulary encodings, picked by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VocabularyFormat {
    Json,
    Bincode,
    /// A pickled Python `dict` of move to index
    Pickle,
}

impl VocabularyFormat {
    /// `.bin`/`.bincode` is bincode, `.pkl`/`.pickle` is pickle, anything else JSON.
    pub fn from_path(path: &Path) -> VocabularyFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("bin") | Some("bincode") => VocabularyFormat::Bincode,
            Some("pkl") | Some("pickle") => VocabularyFormat::Pickle,
            _ => VocabularyFormat::Json,
        }
    }
}

fn rank_and_file_diff(src: Square, dst: Square) -> (i8, i8) {
    let rank_diff = dst.get_rank().to_index() as i8 - src.get_rank().to_index() as i8;
    let file_diff = dst.get_file().to_index() as i8 - src.get_file().to_index() as i8;
    (rank_diff, file_diff)
}

/// Checks if a move is a knight move based on its source and destination squares.
fn is_knight_jump(src: Square, dst: Square) -> bool {
    let (rank_diff, file_diff) = rank_and_file_diff(src, dst);
    let (rank_diff, file_diff) = (rank_diff.abs(), file_diff.abs());

    // A knight move is either (±2, ±1) or (±1, ±2)
    (rank_diff == 2 && file_diff == 1) || (rank_diff == 1 && file_diff == 2)
}

/// Same rank, same file, or same diagonal.
fn is_queen_like_move(src: Square, dst: Square) -> bool {
    let (rank_diff, file_diff) = rank_and_file_diff(src, dst);
    rank_diff == 0 || file_diff == 0 || rank_diff.abs() == file_diff.abs()
}

/// One step forward (straight or diagonal) from the 7th rank to the 8th, or
/// from the 2nd to the 1st.
fn is_promotion_path(src: Square, dst: Square) -> bool {
    let (_, file_diff) = rank_and_file_diff(src, dst);
    let (src_rank, dst_rank) = (src.get_rank().to_index(), dst.get_rank().to_index());
    file_diff.abs() <= 1 && ((src_rank == 6 && dst_rank == 7) || (src_rank == 1 && dst_rank == 0))
}

/// Syntactic UCI check: two squares, optionally a lowercase promotion piece.
pub fn is_uci_move(mv: &str) -> bool {
    let bytes = mv.as_bytes();
    let is_square = |file: u8, rank: u8| (b'a'..=b'h').contains(&file) && (b'1'..=b'8').contains(&rank);
    let squares_ok = match bytes.len() {
        4 | 5 => is_square(bytes[0], bytes[1]) && is_square(bytes[2], bytes[3]) && bytes[0..2] != bytes[2..4],
        _ => false,
    };
    squares_ok && (bytes.len() == 4 || PROMOTION_CHARS.contains(&(bytes[4] as char)))
}
