/// Minimum edge length of a grid cell in world units.
pub const MIN_CELL_SIZE: f32 = 1.0;

/// Cells always allowed regardless of the particle count.
pub const MIN_CELL_BUDGET: usize = 1 << 16;

/// Hard ceiling on the number of cells.
pub const MAX_CELL_BUDGET: usize = 1 << 22;

/// Cells allowed per particle between the two limits above.
pub const CELLS_PER_PARTICLE: usize = 4;

/// Largest cell count [`SpatialGrid::resize`] allocates for `count` particles.
#[must_use]
pub fn cell_budget(count: usize) -> usize {
    count
        .saturating_mul(CELLS_PER_PARTICLE)
        .clamp(MIN_CELL_BUDGET, MAX_CELL_BUDGET)
}

fn grid_dims(width: f32, height: f32, cell_size: f32) -> (usize, usize) {
    let cols = ((width / cell_size).ceil() as usize).max(1);
    let rows = ((height / cell_size).ceil() as usize).max(1);
    (cols, rows)
}

/// Grows `cell_size` until the grid fits in `budget` cells.
fn fit_cell_size(width: f32, height: f32, cell_size: f32, budget: usize) -> (f32, usize, usize) {
    let fits = |cols: usize, rows: usize| cols.checked_mul(rows).is_some_and(|c| c <= budget);
    let (cols, rows) = grid_dims(width, height, cell_size);
    if fits(cols, rows) {
        return (cell_size, cols, rows);
    }

    let area = f64::from(width) * f64::from(height);
    let mut cell_size = cell_size.max((area / budget as f64).sqrt() as f32);
    loop {
        let (cols, rows) = grid_dims(width, height, cell_size);
        if fits(cols, rows) {
            return (cell_size, cols, rows);
        }
        cell_size *= 1.1;
    }
}

#[derive(Clone, Default, Debug)]
/// Uniform-cell spatial hash over 2D particle positions.
///
/// Rebuilt from scratch every tick; there is no incremental update or
/// removal API. Uses the "offset array" layout (like compressed sparse
/// rows): `cell_offsets[c]..cell_offsets[c + 1]` indexes into
/// `particle_indices` and lists every particle in cell `c`, sorted by
/// particle index.
///
/// # Invariants after [`SpatialGrid::build`]
/// - every particle index in `[0, count)` appears in exactly one cell
/// - `cell_offsets.len() == cols * rows + 1`
///
/// # Examples
/// ```
/// use particle_core::spatial_grid::SpatialGrid;
///
/// let xs = [5.0_f32, 15.0, 95.0];
/// let ys = [5.0_f32, 5.0, 95.0];
/// let mut grid = SpatialGrid::new();
/// grid.resize(100.0, 100.0, 10.0, xs.len());
/// grid.build(xs.len(), |i| xs[i], |i| ys[i]);
///
/// let mut near = Vec::new();
/// grid.for_each_neighbor(0, 0, |j| near.push(j));
/// assert_eq!(near, vec![0, 1]);
/// ```
pub struct SpatialGrid {
    pub cell_size: f32,
    requested_cell_size: f32,
    pub width: f32,
    pub height: f32,
    pub cols: usize,
    pub rows: usize,
    pub cell_offsets: Vec<u32>,
    pub particle_indices: Vec<u32>,
    particle_cells: Vec<u32>,
    cursor: Vec<u32>,
    count: usize,
}

impl SpatialGrid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reallocates cell and per-particle storage if any of the particle
    /// count, bounds or cell size changed since the previous call.
    ///
    /// Returns `true` when storage was reallocated. `cell_size` is raised to
    /// [`MIN_CELL_SIZE`]; `cols` and `rows` use ceiling division so the last
    /// row and column cover the far bounds. When that grid would exceed
    /// [`cell_budget`] cells, the stored `cell_size` is enlarged until it
    /// fits, so neighbor queries still cover at least the requested radius.
    pub fn resize(&mut self, width: f32, height: f32, cell_size: f32, count: usize) -> bool {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        };
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };

        if !self.cell_offsets.is_empty()
            && count == self.count
            && width == self.width
            && height == self.height
            && cell_size == self.requested_cell_size
        {
            return false;
        }

        let (fitted, cols, rows) = fit_cell_size(width, height, cell_size, cell_budget(count));
        if fitted > cell_size {
            tracing::debug!(
                requested = cell_size,
                cell_size = fitted,
                cells = cols * rows,
                "Grid cell size enlarged to fit the cell budget"
            );
        }

        self.requested_cell_size = cell_size;
        self.cell_size = fitted;
        self.width = width;
        self.height = height;
        self.cols = cols;
        self.rows = rows;
        self.count = count;

        let cells = self.cols * self.rows;
        self.cell_offsets = vec![0; cells + 1];
        self.cursor = vec![0; cells];
        self.particle_indices = vec![0; count];
        self.particle_cells = vec![0; count];
        true
    }

    /// Clears every cell and re-inserts particles `0..count` by position.
    ///
    /// Non-finite coordinates are treated as `0`; cell coordinates are
    /// clamped into the grid so particles on or past the boundary still land
    /// in an edge cell.
    pub fn build<FX, FY>(&mut self, count: usize, get_x: FX, get_y: FY)
    where
        FX: Fn(usize) -> f32,
        FY: Fn(usize) -> f32,
    {
        if self.cell_offsets.is_empty() || count != self.count {
            let (w, h, cs) = (self.width, self.height, self.requested_cell_size);
            self.resize(w, h, cs, count);
        }

        let cells = self.cols * self.rows;
        self.cursor.iter_mut().for_each(|c| *c = 0);

        for i in 0..count {
            let (cx, cy) = self.cell_coords(get_x(i), get_y(i));
            let cell = cy * self.cols + cx;
            self.particle_cells[i] = cell as u32;
            self.cursor[cell] += 1;
        }

        let mut total = 0u32;
        for c in 0..cells {
            self.cell_offsets[c] = total;
            total += self.cursor[c];
            self.cursor[c] = self.cell_offsets[c];
        }
        self.cell_offsets[cells] = total;

        for i in 0..count {
            let cell = self.particle_cells[i] as usize;
            let slot = self.cursor[cell] as usize;
            self.particle_indices[slot] = i as u32;
            self.cursor[cell] += 1;
        }
    }

    /// Clamped cell coordinates of a world position.
    #[inline]
    #[must_use]
    pub fn cell_coords(&self, x: f32, y: f32) -> (usize, usize) {
        let x = if x.is_finite() { x } else { 0.0 };
        let y = if y.is_finite() { y } else { 0.0 };
        let cx = ((x / self.cell_size).floor() as i64).clamp(0, self.cols as i64 - 1);
        let cy = ((y / self.cell_size).floor() as i64).clamp(0, self.rows as i64 - 1);
        (cx as usize, cy as usize)
    }

    /// Flat index of cell `(cx, cy)`, or `None` outside the grid.
    #[inline]
    #[must_use]
    pub fn cell_index(&self, cx: i64, cy: i64) -> Option<usize> {
        if cx < 0 || cy < 0 || cx >= self.cols as i64 || cy >= self.rows as i64 {
            None
        } else {
            Some(cy as usize * self.cols + cx as usize)
        }
    }

    /// Particles stored in cell `cell`.
    #[inline]
    #[must_use]
    pub fn cell(&self, cell: usize) -> &[u32] {
        let start = self.cell_offsets[cell] as usize;
        let end = self.cell_offsets[cell + 1] as usize;
        &self.particle_indices[start..end]
    }

    /// Cell the particle was binned into by the last build.
    #[inline]
    #[must_use]
    pub fn cell_of_particle(&self, i: usize) -> usize {
        self.particle_cells[i] as usize
    }

    /// Calls `callback` for every particle in the 3×3 block of cells
    /// centred on `(cx, cy)`, including the centre cell itself.
    #[inline]
    pub fn for_each_neighbor<F>(&self, cx: usize, cy: usize, mut callback: F)
    where
        F: FnMut(usize),
    {
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if let Some(cell) = self.cell_index(cx as i64 + dx, cy as i64 + dy) {
                    for &j in self.cell(cell) {
                        callback(j as usize);
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn cell_population(&self, cell: usize) -> usize {
        (self.cell_offsets[cell + 1] - self.cell_offsets[cell]) as usize
    }
}
