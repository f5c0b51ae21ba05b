use crate::spatial_grid::SpatialGrid;
use std::sync::{Arc, Mutex, MutexGuard};

/// Per-cell aggregate used by overlay visualizations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridFrame {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f32,
    /// Particles per cell, row-major.
    pub counts: Vec<u32>,
    pub sum_vx: Vec<f32>,
    pub sum_vy: Vec<f32>,
}

impl GridFrame {
    /// Recomputes counts and summed velocities from a freshly built grid.
    pub fn fill_from(&mut self, grid: &SpatialGrid, vx: &[f32], vy: &[f32]) {
        let cells = grid.cell_count();
        self.cols = grid.cols;
        self.rows = grid.rows;
        self.cell_size = grid.cell_size;
        self.counts.clear();
        self.sum_vx.clear();
        self.sum_vy.clear();
        self.counts.reserve(cells);
        self.sum_vx.reserve(cells);
        self.sum_vy.reserve(cells);

        for c in 0..cells {
            let members = grid.cell(c);
            let (mut sx, mut sy) = (0.0f32, 0.0f32);
            for &i in members {
                sx += vx[i as usize];
                sy += vy[i as usize];
            }
            self.counts.push(members.len() as u32);
            self.sum_vx.push(sx);
            self.sum_vy.push(sy);
        }
    }

    /// Mean velocity of cell `c`, or zero for an empty cell.
    #[must_use]
    pub fn mean_velocity(&self, c: usize) -> (f32, f32) {
        match self.counts.get(c) {
            Some(&n) if n > 0 => (self.sum_vx[c] / n as f32, self.sum_vy[c] / n as f32),
            _ => (0.0, 0.0),
        }
    }
}

/// Positions and velocities of one published tick.
#[derive(Debug, Clone, Default)]
pub struct DrawFrame {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub vx: Vec<f32>,
    pub vy: Vec<f32>,
    /// Engine clock in seconds; `0` means never published.
    pub timestamp: f64,
    pub num_steps: u64,
    pub grid: Option<GridFrame>,
}

impl DrawFrame {
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.x.len()
    }
}

/// The two most recent ticks, pinned for as long as a reader holds them.
#[derive(Debug, Clone)]
pub struct ReadView {
    pub prev: Arc<DrawFrame>,
    pub curr: Arc<DrawFrame>,
    pub t0: f64,
    pub t1: f64,
}

impl ReadView {
    /// Interpolation needs two distinct, bootstrapped ticks of equal size.
    #[must_use]
    pub fn can_interpolate(&self) -> bool {
        self.t0 > 0.0 && self.t1 > self.t0 && self.prev.x.len() == self.curr.x.len()
    }

    /// Blend factor for `target_time` clamped into `[t0, t1]`; `1` (latest
    /// tick) when interpolation is not possible.
    #[must_use]
    pub fn alpha(&self, target_time: f64) -> f32 {
        if !self.can_interpolate() {
            return 1.0;
        }
        let t = target_time.clamp(self.t0, self.t1);
        ((t - self.t0) / (self.t1 - self.t0)) as f32
    }

    #[must_use]
    pub fn interpolated_position(&self, i: usize, alpha: f32) -> (f32, f32) {
        let (cx, cy) = (self.curr.x[i], self.curr.y[i]);
        if !self.can_interpolate() {
            return (cx, cy);
        }
        let (px, py) = (self.prev.x[i], self.prev.y[i]);
        (px + (cx - px) * alpha, py + (cy - py) * alpha)
    }

    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.curr.particle_count()
    }
}

#[derive(Debug, Default)]
struct FramePair {
    prev: Arc<DrawFrame>,
    curr: Arc<DrawFrame>,
    spare: Option<Arc<DrawFrame>>,
}

/// Publish/acquire channel for the per-tick draw payload.
///
/// Frames are reference counted: `begin_read` pins the current pair, so the
/// engine never writes into a frame a reader still holds. A retired frame is
/// recycled only once no reader references it; otherwise a fresh one is
/// allocated. The internal lock is held just long enough to swap or clone
/// two `Arc`s.
#[derive(Debug, Default)]
pub struct DrawBuffer {
    frames: Mutex<FramePair>,
}

impl DrawBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FramePair> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fills a writable frame outside the lock, then publishes it as the
    /// current tick; the old current tick becomes `prev`.
    pub fn publish_with<F>(&self, fill: F)
    where
        F: FnOnce(&mut DrawFrame),
    {
        let recycled = self.lock().spare.take();
        // The spare is out of the pair, so no reader can gain a new reference.
        let mut frame = match recycled {
            Some(arc) if Arc::strong_count(&arc) == 1 => arc,
            _ => Arc::new(DrawFrame::default()),
        };
        fill(Arc::make_mut(&mut frame));

        let mut pair = self.lock();
        let old_curr = std::mem::replace(&mut pair.curr, frame);
        let retired = std::mem::replace(&mut pair.prev, old_curr);
        pair.spare = Some(retired);
    }

    /// Pins the two latest frames.
    #[must_use]
    pub fn begin_read(&self) -> ReadView {
        let pair = self.lock();
        let prev = Arc::clone(&pair.prev);
        let curr = Arc::clone(&pair.curr);
        drop(pair);
        ReadView {
            t0: prev.timestamp,
            t1: curr.timestamp,
            prev,
            curr,
        }
    }

    /// Releases a view obtained from [`DrawBuffer::begin_read`].
    pub fn end_read(&self, view: ReadView) {
        drop(view);
    }
}
