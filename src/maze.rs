//! Maze layout: a fixed grid of open, wall and goal tiles.
//!
//! Tile codes are stored row-major as `u8` (0 open, 1 wall, 2 goal). A grid
//! coordinate maps to canvas units by multiplying with the tile size.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tile {
    Open,
    Wall,
    Goal,
}

impl Tile {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Tile::Open),
            1 => Some(Tile::Wall),
            2 => Some(Tile::Goal),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MazeError {
    Empty,
    /// Cell count is not a whole number of rows.
    Ragged { len: usize, width: usize },
    BadTile { index: usize, code: u8 },
    ZeroTileSize,
}

pub const CLASSIC_WIDTH: usize = 16;
pub const CLASSIC_HEIGHT: usize = 8;
pub const CLASSIC_TILE_SIZE: u16 = 8;

#[rustfmt::skip]
static CLASSIC_LAYOUT: [u8; CLASSIC_WIDTH * CLASSIC_HEIGHT] = [
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,0,0,0,1,0,0,0,0,0,0,0,0,0,0,1,
    1,0,1,0,1,0,1,1,1,1,1,0,1,1,0,1,
    1,0,1,0,0,0,0,0,0,0,1,0,1,0,0,1,
    1,0,1,1,1,1,1,0,1,0,1,0,1,0,1,1,
    1,0,0,0,0,0,1,0,1,0,0,0,1,0,0,1,
    1,1,1,1,1,0,1,1,1,1,1,1,1,1,2,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
];

/// Immutable view over a validated tile array.
#[derive(Clone, Copy, Debug)]
pub struct MazeGrid<'a> {
    cells: &'a [u8],
    width: usize,
    height: usize,
    tile_size: u16,
}

impl MazeGrid<'static> {
    /// The stock 16x8 layout with 8-unit tiles, sized for a 128x64 canvas.
    pub fn classic() -> Self {
        Self {
            cells: &CLASSIC_LAYOUT,
            width: CLASSIC_WIDTH,
            height: CLASSIC_HEIGHT,
            tile_size: CLASSIC_TILE_SIZE,
        }
    }
}

impl<'a> MazeGrid<'a> {
    pub fn new(cells: &'a [u8], width: usize, tile_size: u16) -> Result<Self, MazeError> {
        if cells.is_empty() || width == 0 {
            return Err(MazeError::Empty);
        }
        if cells.len() % width != 0 {
            return Err(MazeError::Ragged {
                len: cells.len(),
                width,
            });
        }
        if tile_size == 0 {
            return Err(MazeError::ZeroTileSize);
        }
        if let Some((index, &code)) = cells
            .iter()
            .enumerate()
            .find(|(_, c)| Tile::from_code(**c).is_none())
        {
            return Err(MazeError::BadTile { index, code });
        }
        Ok(Self {
            cells,
            width,
            height: cells.len() / width,
            tile_size,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> u16 {
        self.tile_size
    }

    /// Tile at grid column/row, `None` outside the grid.
    pub fn tile(&self, col: i32, row: i32) -> Option<Tile> {
        if col < 0 || row < 0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.width || row >= self.height {
            return None;
        }
        Tile::from_code(self.cells[row * self.width + col])
    }

    /// Grid cell containing a canvas point (truncating division).
    pub fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        let t = self.tile_size as f32;
        ((x / t) as i32, (y / t) as i32)
    }

    /// Tile containing a canvas point, `None` outside the grid.
    pub fn tile_at(&self, x: f32, y: f32) -> Option<Tile> {
        let (col, row) = self.cell_of(x, y);
        self.tile(col, row)
    }

    /// Canvas coordinates of a cell's centre.
    pub fn cell_center(&self, col: usize, row: usize) -> (f32, f32) {
        let t = self.tile_size as f32;
        ((col as f32 + 0.5) * t, (row as f32 + 0.5) * t)
    }

    /// Every tile in row-major order, with its column and row.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        let w = self.width;
        self.cells.iter().enumerate().filter_map(move |(i, &c)| {
            Tile::from_code(c).map(|t| (i % w, i / w, t))
        })
    }
}
