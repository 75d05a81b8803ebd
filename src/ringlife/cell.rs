//! Cell state, neighbor scratch fields and the transition rule.
//!
//! The rule is Life with one deviation kept on purpose: a dead cell is born
//! with *three or more* alive neighbors, not exactly three. Survival is the
//! usual S23.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellState {
    Alive = b'A',
    #[default]
    Dead = b'D',
}

impl CellState {
    #[inline]
    pub const fn is_alive(self) -> bool {
        matches!(self, CellState::Alive)
    }

    #[inline]
    pub const fn from_alive(alive: bool) -> Self {
        if alive { CellState::Alive } else { CellState::Dead }
    }

    /// Printable symbol, `'A'` or `'D'`.
    #[inline]
    pub const fn symbol(self) -> char {
        self as u8 as char
    }
}

/// Previous-generation states of the eight neighbors of one cell.
///
/// Scratch data: overwritten once per generation by the neighbor passes and
/// read only by [`Cell::next_state`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Neighborhood {
    pub up: CellState,
    pub down: CellState,
    pub left: CellState,
    pub right: CellState,
    pub up_left: CellState,
    pub up_right: CellState,
    pub down_left: CellState,
    pub down_right: CellState,
}

impl Neighborhood {
    /// A neighborhood where all eight fields hold `state`.
    pub const fn uniform(state: CellState) -> Self {
        Self {
            up: state,
            down: state,
            left: state,
            right: state,
            up_left: state,
            up_right: state,
            down_left: state,
            down_right: state,
        }
    }

    #[inline]
    pub fn as_array(&self) -> [CellState; 8] {
        [
            self.up,
            self.down,
            self.left,
            self.right,
            self.up_left,
            self.up_right,
            self.down_left,
            self.down_right,
        ]
    }

    /// Number of alive neighbors, always in `0..=8`.
    #[inline]
    pub fn alive_count(&self) -> u8 {
        self.as_array().iter().filter(|s| s.is_alive()).count() as u8
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub state: CellState,
    pub neighbors: Neighborhood,
}

impl Cell {
    pub const fn new(state: CellState) -> Self {
        Self {
            state,
            neighbors: Neighborhood::uniform(CellState::Dead),
        }
    }

    /// State for the next generation, from the populated neighbor fields.
    #[inline]
    pub fn next_state(&self) -> CellState {
        next_state(self.state, self.neighbors.alive_count())
    }
}

/// Transition rule: survive on 2 or 3, birth on 3 or more.
#[inline]
pub fn next_state(state: CellState, alive_neighbors: u8) -> CellState {
    debug_assert!(alive_neighbors <= 8);
    match state {
        CellState::Alive => CellState::from_alive(alive_neighbors == 2 || alive_neighbors == 3),
        CellState::Dead => CellState::from_alive(alive_neighbors >= 3),
    }
}
