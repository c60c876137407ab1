//! Sparse four-level tiled storage for sheet cells.
//!
//! Every level is a tile of `2^LOG_W` columns by `2^LOG_H` rows. The top
//! tile is always allocated; lower tiles appear on first write. With the
//! default 16×32 tiles four levels address 65 536 columns by 1 048 576 rows.

use tilecalc_common::{CellAddress, MAX_COLS, MAX_ROWS};

type Tile<T> = Box<[Option<T>]>;
type Leaf<T> = Tile<T>;
type Mid<T> = Tile<Leaf<T>>;
type Upper<T> = Tile<Mid<T>>;

pub const LEVELS: u32 = 4;

/// Sparse grid of `T` indexed by (column, row).
pub struct SheetRep<T, const LOG_W: u32 = 4, const LOG_H: u32 = 5> {
    root: Tile<Upper<T>>,
    len: usize,
}

/* ──────────────────────── geometry helpers ──────────────────────── */

impl<T, const LOG_W: u32, const LOG_H: u32> SheetRep<T, LOG_W, LOG_H> {
    const W: u32 = 1 << LOG_W;
    const H: u32 = 1 << LOG_H;
    const MASK_W: u32 = Self::W - 1;
    const MASK_H: u32 = Self::H - 1;
    const TILE: usize = 1 << (LOG_W + LOG_H);

    /// Columns addressable by this geometry, capped at the sheet limit.
    pub const COLS: u32 = {
        let reach = 1u64 << (LEVELS * LOG_W);
        if reach < MAX_COLS as u64 { reach as u32 } else { MAX_COLS }
    };
    /// Rows addressable by this geometry, capped at the sheet limit.
    pub const ROWS: u32 = {
        let reach = 1u64 << (LEVELS * LOG_H);
        if reach < MAX_ROWS as u64 { reach as u32 } else { MAX_ROWS }
    };

    #[inline(always)]
    fn slot(col: u32, row: u32, level: u32) -> usize {
        let c = (col >> (level * LOG_W)) & Self::MASK_W;
        let r = (row >> (level * LOG_H)) & Self::MASK_H;
        ((c << LOG_H) | r) as usize
    }

    #[inline(always)]
    fn unslot(slot: usize) -> (u32, u32) {
        ((slot as u32) >> LOG_H, (slot as u32) & Self::MASK_H)
    }

    #[inline(always)]
    fn in_range(col: u32, row: u32) -> bool {
        col < Self::COLS && row < Self::ROWS
    }

    fn empty_tile<U>() -> Tile<U> {
        (0..Self::TILE).map(|_| None).collect()
    }
}

impl<T, const LOG_W: u32, const LOG_H: u32> std::fmt::Debug for SheetRep<T, LOG_W, LOG_H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetRep").field("len", &self.len).finish()
    }
}

impl<T, const LOG_W: u32, const LOG_H: u32> Default for SheetRep<T, LOG_W, LOG_H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const LOG_W: u32, const LOG_H: u32> SheetRep<T, LOG_W, LOG_H> {
    pub fn new() -> Self {
        Self {
            root: Self::empty_tile(),
            len: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Value at (`col`, `row`); `None` when absent or out of range.
    pub fn get(&self, col: u32, row: u32) -> Option<&T> {
        if !Self::in_range(col, row) {
            return None;
        }
        let upper = self.root[Self::slot(col, row, 3)].as_ref()?;
        let mid = upper[Self::slot(col, row, 2)].as_ref()?;
        let leaf = mid[Self::slot(col, row, 1)].as_ref()?;
        leaf[Self::slot(col, row, 0)].as_ref()
    }

    /// Store `value` at (`col`, `row`) and return what was there.
    ///
    /// Writing `None` never allocates; out-of-range writes are ignored.
    pub fn set(&mut self, col: u32, row: u32, value: Option<T>) -> Option<T> {
        if !Self::in_range(col, row) {
            return None;
        }
        let old = match value {
            None => {
                let upper = self.root[Self::slot(col, row, 3)].as_mut()?;
                let mid = upper[Self::slot(col, row, 2)].as_mut()?;
                let leaf = mid[Self::slot(col, row, 1)].as_mut()?;
                leaf[Self::slot(col, row, 0)].take()
            }
            Some(v) => {
                let upper = self.root[Self::slot(col, row, 3)].get_or_insert_with(Self::empty_tile);
                let mid = upper[Self::slot(col, row, 2)].get_or_insert_with(Self::empty_tile);
                let leaf = mid[Self::slot(col, row, 1)].get_or_insert_with(Self::empty_tile);
                let old = leaf[Self::slot(col, row, 0)].replace(v);
                self.len += 1;
                old
            }
        };
        if old.is_some() {
            self.len -= 1;
        }
        old
    }

    /// Remove and return the value at (`col`, `row`).
    pub fn take(&mut self, col: u32, row: u32) -> Option<T> {
        self.set(col, row, None)
    }

    pub fn clear(&mut self) {
        self.root = Self::empty_tile();
        self.len = 0;
    }

    /// Occupied slots in tile order.
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &T)> + '_ {
        fn occupied<U>(tile: &[Option<U>]) -> impl Iterator<Item = (usize, &U)> {
            tile.iter()
                .enumerate()
                .filter_map(|(i, t)| t.as_ref().map(|t| (i, t)))
        }
        occupied(&self.root).flat_map(|(i3, upper)| {
            occupied(upper).flat_map(move |(i2, mid)| {
                occupied(mid).flat_map(move |(i1, leaf)| {
                    occupied(leaf).map(move |(i0, value)| {
                        let mut col = 0;
                        let mut row = 0;
                        for slot in [i3, i2, i1, i0] {
                            let (c, r) = Self::unslot(slot);
                            col = (col << LOG_W) | c;
                            row = (row << LOG_H) | r;
                        }
                        (CellAddress::new(col, row), value)
                    })
                })
            })
        })
    }

    pub fn for_each(&self, mut act: impl FnMut(CellAddress, &T)) {
        for (addr, value) in self.iter() {
            act(addr, value);
        }
    }

    /// Occupied slots in row-major order, for export. Walks one band of
    /// tile rows at a time; empty bands are skipped at every level.
    pub fn iter_for_export(&self) -> impl Iterator<Item = (CellAddress, &T)> + '_ {
        Self::bands(vec![(0, &self.root)]).flat_map(move |(r3, uppers)| {
            Self::bands(uppers).flat_map(move |(r2, mids)| {
                Self::bands(mids).flat_map(move |(r1, leaves)| {
                    Self::bands(leaves).flat_map(move |(r0, cells)| {
                        let row = (((((r3 << LOG_H) | r2) << LOG_H) | r1) << LOG_H) | r0;
                        cells.into_iter().map(move |(col, v)| (CellAddress::new(col, row), v))
                    })
                })
            })
        })
    }

    /// Non-empty tile rows across `tiles`, top to bottom.
    fn bands<'a, U>(tiles: Vec<(u32, &'a Tile<U>)>) -> impl Iterator<Item = (u32, Vec<(u32, &'a U)>)> {
        (0..Self::H)
            .map(move |r| (r, Self::row_band(&tiles, r)))
            .filter(|(_, band)| !band.is_empty())
    }

    /// Children present in tile row `r` of `tiles`, left to right, keyed by
    /// their column prefix one level down.
    fn row_band<'a, U>(tiles: &[(u32, &'a Tile<U>)], r: u32) -> Vec<(u32, &'a U)> {
        let mut out = Vec::new();
        for &(prefix, tile) in tiles {
            for c in 0..Self::W {
                if let Some(child) = tile[((c << LOG_H) | r) as usize].as_ref() {
                    out.push(((prefix << LOG_W) | c, child));
                }
            }
        }
        out
    }
}
