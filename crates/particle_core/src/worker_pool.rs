//! Fixed-size worker pool for the per-particle step kernels.
//!
//! Wraps a dedicated `rayon::ThreadPool` so the engine controls exactly how
//! many workers the physics uses and when they exist. The pool exposes
//! [`WorkerPool::parallel_for`], which splits `[0, n)` into contiguous
//! blocks and returns once every block has finished. Kernels that write
//! per-particle data use [`WorkerPool::install`] with `par_chunks_mut` of
//! [`WorkerPool::block_len`] so each block owns its own sub-slices.

use crate::config::resolve_thread_count;
use crate::error::{Result, SimError};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Below this many items `parallel_for` runs inline on the caller.
pub const SERIAL_THRESHOLD: usize = 1024;

/// Fixed-size thread pool with a blocking `parallel_for`.
#[derive(Default)]
pub struct WorkerPool {
    pool: Option<ThreadPool>,
    size: usize,
}

impl WorkerPool {
    /// Creates and starts a pool; `threads <= 0` means auto.
    pub fn new(threads: i32) -> Result<Self> {
        let mut pool = Self::unstarted();
        pool.start(threads)?;
        Ok(pool)
    }

    /// A pool with no workers; `parallel_for` runs inline until started.
    #[must_use]
    pub fn unstarted() -> Self {
        Self::default()
    }

    /// Spawns the workers. Starting a started pool is a caller bug.
    pub fn start(&mut self, threads: i32) -> Result<()> {
        if self.pool.is_some() {
            return Err(SimError::PoolAlreadyStarted);
        }
        let size = resolve_thread_count(threads);
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|id| format!("particle-worker-{id}"))
            .build()?;

        self.pool = Some(pool);
        self.size = size;
        tracing::debug!(threads = size, "Worker pool started");
        Ok(())
    }

    /// Releases the workers. Stopping a pool that is not running is a
    /// caller bug.
    pub fn stop(&mut self) -> Result<()> {
        if self.pool.take().is_none() {
            return Err(SimError::PoolNotStarted);
        }
        self.size = 0;
        tracing::debug!("Worker pool stopped");
        Ok(())
    }

    /// Restarts the pool if the resolved thread count differs from the
    /// current size. Returns `true` when a restart happened.
    pub fn resize(&mut self, threads: i32) -> Result<bool> {
        let target = resolve_thread_count(threads);
        if self.is_started() && target == self.size {
            return Ok(false);
        }
        if self.is_started() {
            self.stop()?;
        }
        self.start(threads)?;
        tracing::info!(threads = target, "Worker pool resized");
        Ok(true)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.pool.is_some()
    }

    /// True when `parallel_for(n, ..)` runs as a single inline block.
    #[must_use]
    pub fn runs_inline(&self, n: usize) -> bool {
        n < SERIAL_THRESHOLD || self.size <= 1 || self.pool.is_none()
    }

    /// Length of the blocks `parallel_for(n, ..)` hands out. Never zero.
    #[must_use]
    pub fn block_len(&self, n: usize) -> usize {
        if self.runs_inline(n) {
            n.max(1)
        } else {
            n.div_ceil(self.size)
        }
    }

    /// Runs `op` on this pool, so rayon parallel iterators inside it use
    /// these workers. Runs `op` on the caller when the pool is stopped.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Runs `f(start, end)` over contiguous blocks covering `[0, n)` exactly
    /// once and returns after every block completed.
    ///
    /// Small inputs (`n < SERIAL_THRESHOLD`) and single-thread pools run
    /// `f(0, n)` inline. A panic inside `f` is re-raised here after all
    /// blocks have finished.
    pub fn parallel_for<F>(&self, n: usize, f: F)
    where
        F: Fn(usize, usize) + Sync,
    {
        if n == 0 {
            return;
        }
        let pool = match &self.pool {
            Some(pool) if !self.runs_inline(n) => pool,
            _ => {
                f(0, n);
                return;
            }
        };

        let block = self.block_len(n);
        let f = &f;
        pool.scope(|s| {
            for start in (0..n).step_by(block) {
                let end = (start + block).min(n);
                s.spawn(move |_| f(start, end));
            }
        });
    }
}
