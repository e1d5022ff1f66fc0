use std::{fmt, str::FromStr, sync::LazyLock};

use arrayvec::ArrayVec;
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

/// Maximum number of cells in a single rotation state.
pub const MAX_PIECE_CELLS: usize = 4;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid piece kind: {input:?} (expected one of I, O, S, Z, J, L, T or 0-6)")]
pub struct PieceKindParseError {
    input: String,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CatalogError {
    #[display("piece kind {kind} has no entry in the catalog")]
    MissingKind { kind: PieceKind },
    #[display("piece kind {kind} appears more than once in the catalog")]
    DuplicateKind { kind: PieceKind },
    #[display("piece kind {kind} has zero rotation states")]
    NoRotations { kind: PieceKind },
    #[display("rotation state must have 1 to {MAX_PIECE_CELLS} cells, got {count}")]
    CellCount { count: usize },
}

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('I'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<u8> for PieceKind {
    type Error = PieceKindParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| PieceKindParseError {
                input: value.to_string(),
            })
    }
}

impl FromStr for PieceKind {
    type Err = PieceKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PieceKindParseError {
            input: s.to_owned(),
        };
        let mut chars = s.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(err());
        };
        if let Some(kind) = Self::from_char(c.to_ascii_uppercase()) {
            return Ok(kind);
        }
        c.to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .and_then(|d| Self::try_from(d).ok())
            .ok_or_else(err)
    }
}

/// Offset of a single piece cell from the piece pivot. `dy` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellOffset {
    pub dx: i8,
    pub dy: i8,
}

/// One orientation of a piece: the offsets of its cells from the pivot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationState {
    cells: ArrayVec<CellOffset, MAX_PIECE_CELLS>,
}

impl RotationState {
    /// Creates a rotation state from `(dx, dy)` offsets.
    pub fn new(offsets: &[(i8, i8)]) -> Result<Self, CatalogError> {
        if offsets.is_empty() || offsets.len() > MAX_PIECE_CELLS {
            return Err(CatalogError::CellCount {
                count: offsets.len(),
            });
        }
        Ok(Self::from_offsets(offsets))
    }

    fn from_offsets(offsets: &[(i8, i8)]) -> Self {
        Self {
            cells: offsets
                .iter()
                .map(|&(dx, dy)| CellOffset { dx, dy })
                .collect(),
        }
    }

    #[must_use]
    pub fn cells(&self) -> &[CellOffset] {
        &self.cells
    }

    #[must_use]
    pub fn min_dx(&self) -> i8 {
        self.cells.iter().map(|c| c.dx).min().unwrap_or(0)
    }

    #[must_use]
    pub fn max_dx(&self) -> i8 {
        self.cells.iter().map(|c| c.dx).max().unwrap_or(0)
    }

    #[must_use]
    pub fn max_dy(&self) -> i8 {
        self.cells.iter().map(|c| c.dy).max().unwrap_or(0)
    }

    /// Absolute cells covered when the pivot sits at (`x`, `y`).
    pub fn cells_at(&self, x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells
            .iter()
            .map(move |c| (x + i32::from(c.dx), y + i32::from(c.dy)))
    }
}

/// Immutable table mapping every piece kind to its rotation states.
///
/// Components receive a catalog at construction rather than reaching for a global, so
/// tests can swap in alternative shapes. [`PieceCatalog::standard`] provides the regular
/// seven tetrominoes with four rotation states each.
///
/// # Example
///
/// ```
/// use blockfall_engine::{PieceCatalog, PieceKind};
///
/// let catalog = PieceCatalog::standard();
/// assert_eq!(catalog.rotations(PieceKind::T).len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceCatalog {
    rotations: [Vec<RotationState>; PieceKind::LEN],
}

static STANDARD_CATALOG: LazyLock<PieceCatalog> = LazyLock::new(|| PieceCatalog {
    rotations: STANDARD_OFFSETS.map(|states| {
        states
            .iter()
            .map(|offsets| RotationState::from_offsets(offsets))
            .collect()
    }),
});

impl PieceCatalog {
    /// Builds a catalog from `(kind, rotation states)` entries.
    ///
    /// Every kind must appear exactly once with at least one rotation state.
    pub fn new<I>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (PieceKind, Vec<RotationState>)>,
    {
        let mut rotations: [Option<Vec<RotationState>>; PieceKind::LEN] = Default::default();
        for (kind, states) in entries {
            if states.is_empty() {
                return Err(CatalogError::NoRotations { kind });
            }
            if rotations[kind.index()].replace(states).is_some() {
                return Err(CatalogError::DuplicateKind { kind });
            }
        }
        let mut checked: [Vec<RotationState>; PieceKind::LEN] = Default::default();
        for (kind, (slot, states)) in PieceKind::ALL
            .into_iter()
            .zip(checked.iter_mut().zip(rotations))
        {
            *slot = states.ok_or(CatalogError::MissingKind { kind })?;
        }
        Ok(Self { rotations: checked })
    }

    /// The standard tetromino catalog, shared process-wide.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD_CATALOG
    }

    /// Rotation states of `kind`, in rotation-index order. Never empty.
    #[must_use]
    pub fn rotations(&self, kind: PieceKind) -> &[RotationState] {
        &self.rotations[kind.index()]
    }

    #[must_use]
    pub fn rotation(&self, kind: PieceKind, index: usize) -> Option<&RotationState> {
        self.rotations(kind).get(index)
    }
}

type Offsets = [(i8, i8); 4];

// Indexed by `PieceKind`; each entry lists rotation states 0-3.
const STANDARD_OFFSETS: [[Offsets; 4]; PieceKind::LEN] = [
    // I-piece
    [
        [(0, 0), (0, -1), (0, -2), (0, 1)],
        [(0, 0), (-1, 0), (-2, 0), (1, 0)],
        [(0, 0), (0, 1), (0, 2), (0, -1)],
        [(0, 0), (1, 0), (2, 0), (-1, 0)],
    ],
    // O-piece
    [
        [(0, 0), (0, -1), (1, 0), (1, -1)],
        [(0, 0), (0, -1), (1, 0), (1, -1)],
        [(0, 0), (0, -1), (1, 0), (1, -1)],
        [(0, 0), (0, -1), (1, 0), (1, -1)],
    ],
    // S-piece
    [
        [(0, 0), (-1, 0), (0, -1), (1, -1)],
        [(0, 0), (0, 1), (-1, 0), (-1, -1)],
        [(0, 0), (1, 0), (0, 1), (-1, 1)],
        [(0, 0), (0, -1), (1, 0), (1, 1)],
    ],
    // Z-piece
    [
        [(0, 0), (1, 0), (0, -1), (-1, -1)],
        [(0, 0), (0, -1), (-1, 0), (-1, 1)],
        [(0, 0), (-1, 0), (0, 1), (1, 1)],
        [(0, 0), (0, 1), (1, 0), (1, -1)],
    ],
    // J-piece
    [
        [(0, 0), (0, -1), (0, 1), (-1, 1)],
        [(0, 0), (-1, 0), (1, 0), (1, 1)],
        [(0, 0), (0, 1), (0, -1), (1, -1)],
        [(0, 0), (1, 0), (-1, 0), (-1, -1)],
    ],
    // L-piece
    [
        [(0, 0), (0, -1), (0, 1), (1, 1)],
        [(0, 0), (-1, 0), (1, 0), (1, -1)],
        [(0, 0), (0, 1), (0, -1), (-1, -1)],
        [(0, 0), (1, 0), (-1, 0), (-1, 1)],
    ],
    // T-piece
    [
        [(0, 0), (-1, 0), (1, 0), (0, -1)],
        [(0, 0), (0, 1), (0, -1), (-1, 0)],
        [(0, 0), (1, 0), (-1, 0), (0, 1)],
        [(0, 0), (0, -1), (0, 1), (1, 0)],
    ],
];
