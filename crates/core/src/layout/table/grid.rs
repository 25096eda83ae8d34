//! Table structure from ruling lines.
//!
//! The table region is cut into a fine grid at every distinct ruling
//! position. Probe lines through each row and column record which grid
//! boundaries are actually ruled, and cells grow across the missing ones:
//! up when the top boundary is absent, else left when the left boundary is
//! absent.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::layout::elements::PageElems;
use crate::utils::{HasBBox, Plane, Rect, center, contains_point, reading_order};

use super::clustering::{closest_index, retain_centroids};

/// Settings of the grid builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Boundaries closer than this to the previous one are dropped.
    pub min_cell_size: f64,
    /// A ruling thinner than this along x is vertical; along y, horizontal.
    pub ruling_width: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            min_cell_size: 6.0,
            ruling_width: 0.1,
        }
    }
}

/// A rectangular block of grid slots with no ruling inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    /// One past the last row.
    pub row_end: usize,
    /// One past the last column.
    pub col_end: usize,
    /// Indices into `PageElems::mentions`, in reading order.
    pub texts: SmallVec<[usize; 4]>,
}

impl Cell {
    fn new(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            row_end: row + 1,
            col_end: col + 1,
            texts: SmallVec::new(),
        }
    }

    pub fn rowspan(&self) -> usize {
        self.row_end - self.row
    }

    pub fn colspan(&self) -> usize {
        self.col_end - self.col
    }
}

/// Rows and columns of one table region.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Column boundaries, ascending.
    pub xs: Vec<f64>,
    /// Row boundaries, ascending.
    pub ys: Vec<f64>,
    cells: Vec<Cell>,
    /// Cell index of every grid slot, row-major.
    slots: Vec<usize>,
}

fn is_vertical(r: &Rect, settings: &GridSettings) -> bool {
    r.2 - r.0 < settings.ruling_width
}

fn is_horizontal(r: &Rect, settings: &GridSettings) -> bool {
    r.3 - r.1 < settings.ruling_width
}

impl Grid {
    /// Builds the grid of `region` from the rulings inside it and assigns
    /// every text line of `page` to the first cell holding its center.
    pub fn build(page: &PageElems, region: Rect, rulings: &[Rect], settings: &GridSettings) -> Self {
        let xs = retain_centroids(
            rulings
                .iter()
                .filter(|r| is_vertical(r, settings))
                .map(|r| r.xc())
                .chain([region.0, region.2])
                .collect(),
            settings.min_cell_size,
        );
        let ys = retain_centroids(
            rulings
                .iter()
                .filter(|r| is_horizontal(r, settings))
                .map(|r| r.yc())
                .chain([region.1, region.3])
                .collect(),
            settings.min_cell_size,
        );
        let mut grid = Self {
            xs,
            ys,
            cells: Vec::new(),
            slots: Vec::new(),
        };
        grid.grow_cells(region, rulings, settings);
        grid.assign_texts(page);
        grid
    }

    pub fn num_rows(&self) -> usize {
        self.ys.len().saturating_sub(1)
    }

    pub fn num_cols(&self) -> usize {
        self.xs.len().saturating_sub(1)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell covering the slot at `(row, col)`.
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.num_rows() || col >= self.num_cols() {
            return None;
        }
        self.cells.get(self.slots[row * self.num_cols() + col])
    }

    pub fn cell_bbox(&self, cell: &Cell) -> Rect {
        (
            self.xs[cell.col],
            self.ys[cell.row],
            self.xs[cell.col_end],
            self.ys[cell.row_end],
        )
    }

    /// Cells grouped by the row they start in, left to right.
    pub fn rows(&self) -> Vec<Vec<&Cell>> {
        let mut rows: Vec<Vec<&Cell>> = vec![Vec::new(); self.num_rows()];
        for cell in &self.cells {
            rows[cell.row].push(cell);
        }
        for row in &mut rows {
            row.sort_by_key(|c| c.col);
        }
        rows
    }

    /// Marks the ruled boundaries with probe lines and merges slots across
    /// the unruled ones.
    fn grow_cells(&mut self, region: Rect, rulings: &[Rect], settings: &GridSettings) {
        let (rows, cols) = (self.num_rows(), self.num_cols());
        if rows == 0 || cols == 0 {
            return;
        }
        let mut plane: Plane<Rect> = Plane::new();
        plane.extend(rulings.iter().copied());

        // vbars[i][j]: the left boundary of slot (i, j) is ruled.
        let mut vbars = vec![vec![false; cols + 1]; rows];
        for (i, w) in self.ys.windows(2).enumerate() {
            let yc = (w[0] + w[1]) / 2.0;
            for l in plane.find((region.0 - 1.0, yc, region.2 + 1.0, yc)) {
                if is_vertical(l, settings) {
                    vbars[i][closest_index(&self.xs, l.xc())] = true;
                }
            }
        }
        // hbars[i][j]: the top boundary of slot (i, j) is ruled.
        let mut hbars = vec![vec![false; cols]; rows + 1];
        for (j, w) in self.xs.windows(2).enumerate() {
            let xc = (w[0] + w[1]) / 2.0;
            for l in plane.find((xc, region.1 - 1.0, xc, region.3 + 1.0)) {
                if is_horizontal(l, settings) {
                    hbars[closest_index(&self.ys, l.yc())][j] = true;
                }
            }
        }

        self.slots = vec![0; rows * cols];
        for i in 0..rows {
            for j in 0..cols {
                let slot = i * cols + j;
                if i > 0 && !hbars[i][j] {
                    let c = self.slots[slot - cols];
                    self.slots[slot] = c;
                    self.cells[c].row_end = i + 1;
                } else if j > 0 && !vbars[i][j] {
                    let c = self.slots[slot - 1];
                    self.slots[slot] = c;
                    self.cells[c].col_end = j + 1;
                } else {
                    self.slots[slot] = self.cells.len();
                    self.cells.push(Cell::new(i, j));
                }
            }
        }
    }

    fn assign_texts(&mut self, page: &PageElems) {
        let mut plane: Plane<Rect> = Plane::new();
        plane.extend(page.mentions.iter().map(HasBBox::bbox));
        let mut taken = vec![false; page.mentions.len()];
        for c in 0..self.cells.len() {
            let bbox = self.cell_bbox(&self.cells[c]);
            let mut texts: SmallVec<[usize; 4]> = plane
                .candidates(bbox)
                .into_iter()
                .filter(|&m| !taken[m] && contains_point(bbox, center(page.mentions[m].bbox())))
                .collect();
            for &m in &texts {
                taken[m] = true;
            }
            texts.sort_by(|&a, &b| reading_order(page.mentions[a].bbox(), page.mentions[b].bbox()));
            self.cells[c].texts = texts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::elements::TextLine;

    fn vline(x: f64, y0: f64, y1: f64) -> Rect {
        (x, y0, x, y1)
    }

    fn hline(y: f64, x0: f64, x1: f64) -> Rect {
        (x0, y, x1, y)
    }

    fn page_with(texts: &[(f64, f64)]) -> PageElems {
        let mentions = texts
            .iter()
            .map(|&(x, y)| TextLine::new((x - 5.0, y - 4.0, x + 5.0, y + 4.0), "t"))
            .collect();
        PageElems::new(1, 600.0, 800.0, mentions, vec![], vec![], vec![])
    }

    #[test]
    fn test_fully_ruled_grid() {
        let region = (100.0, 50.0, 400.0, 170.0);
        let mut rulings: Vec<Rect> = [100.0, 200.0, 300.0, 400.0]
            .iter()
            .map(|&x| vline(x, 50.0, 170.0))
            .collect();
        rulings.extend([50.0, 90.0, 130.0, 170.0].iter().map(|&y| hline(y, 100.0, 400.0)));
        let page = page_with(&[(150.0, 70.0), (250.0, 110.0), (350.0, 150.0)]);
        let grid = Grid::build(&page, region, &rulings, &GridSettings::default());
        assert_eq!((grid.num_rows(), grid.num_cols()), (3, 3));
        assert_eq!(grid.cells().len(), 9);
        assert!(grid.cells().iter().all(|c| c.rowspan() == 1 && c.colspan() == 1));
        assert_eq!(grid.cell_at(0, 0).map(|c| c.texts.to_vec()), Some(vec![0]));
        assert_eq!(grid.cell_at(1, 1).map(|c| c.texts.to_vec()), Some(vec![1]));
        assert_eq!(grid.cell_at(2, 2).map(|c| c.texts.to_vec()), Some(vec![2]));
        assert_eq!(grid.cell_bbox(&grid.cells()[4]), (200.0, 90.0, 300.0, 130.0));
    }

    #[test]
    fn test_missing_rulings_make_spans() {
        let region = (100.0, 50.0, 400.0, 170.0);
        let rulings = vec![
            vline(100.0, 50.0, 170.0),
            vline(200.0, 90.0, 170.0),
            vline(300.0, 50.0, 170.0),
            vline(400.0, 50.0, 170.0),
            hline(50.0, 100.0, 400.0),
            hline(90.0, 100.0, 400.0),
            hline(130.0, 100.0, 300.0),
            hline(170.0, 100.0, 400.0),
        ];
        let page = page_with(&[(200.0, 70.0)]);
        let grid = Grid::build(&page, region, &rulings, &GridSettings::default());
        let first = grid.cell_at(0, 0).cloned();
        assert_eq!(first.as_ref().map(Cell::colspan), Some(2));
        assert_eq!(first.map(|c| c.texts.to_vec()), Some(vec![0]));
        let last = grid.cell_at(1, 2).cloned();
        assert_eq!(last.as_ref().map(Cell::rowspan), Some(2));
        assert_eq!(grid.cell_at(2, 2), grid.cell_at(1, 2));
        assert_eq!(grid.cells().len(), 7);
        let rows = grid.rows();
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[2].len(), 2);
    }

    #[test]
    fn test_close_rulings_collapse() {
        let region = (0.0, 0.0, 100.0, 40.0);
        let rulings = vec![vline(50.0, 0.0, 40.0), vline(53.0, 0.0, 40.0)];
        let grid = Grid::build(&page_with(&[]), region, &rulings, &GridSettings::default());
        assert_eq!(grid.xs, vec![0.0, 50.0, 100.0]);
        assert_eq!(grid.num_rows(), 1);
        assert_eq!(grid.cells().len(), 2);
    }

    #[test]
    fn test_text_on_shared_edge_goes_to_first_cell() {
        let region = (0.0, 0.0, 100.0, 40.0);
        let rulings = vec![vline(50.0, 0.0, 40.0)];
        let page = page_with(&[(50.0, 20.0)]);
        let grid = Grid::build(&page, region, &rulings, &GridSettings::default());
        assert_eq!(grid.cells()[0].texts.as_slice(), &[0]);
        assert!(grid.cells()[1].texts.is_empty());
    }
}
