//! Fixed-capacity object pools
//!
//! A pool owns a fixed number of equally sized byte blocks, all allocated up
//! front. Blocks are handed out as [`PoolBlock`] owners and go back to the free
//! list when the owner is dropped, so every allocation is released exactly once.
//!
//! Exhausting a pool through [`FixedPool::assert_allocate`] is fatal: the pool
//! size is a static bound on pipelining depth, not a backpressure signal.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Snapshot of a pool's usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub name: String,
    pub block_size: usize,
    pub capacity: usize,
    pub in_use: usize,
    pub high_water: usize,
}

struct PoolState {
    free: Vec<Box<[u8]>>,
    in_use: usize,
    high_water: usize,
}

struct PoolInner {
    name: String,
    block_size: usize,
    capacity: usize,
    state: RefCell<PoolState>,
}

/// A named pool of `capacity` blocks of `block_size` bytes
///
/// Cloning the handle shares the same blocks. The pool is single-threaded
/// (`!Send`), matching the cooperative event loop it serves.
#[derive(Clone)]
pub struct FixedPool {
    inner: Rc<PoolInner>,
}

impl FixedPool {
    /// Create a pool and pre-allocate all of its blocks
    pub fn new(name: impl Into<String>, capacity: usize, block_size: usize) -> Self {
        let name = name.into();
        let free = (0..capacity)
            .map(|_| vec![0u8; block_size].into_boxed_slice())
            .collect();

        tracing::debug!(pool = %name, capacity, block_size, "created pool");

        Self {
            inner: Rc::new(PoolInner {
                name,
                block_size,
                capacity,
                state: RefCell::new(PoolState {
                    free,
                    in_use: 0,
                    high_water: 0,
                }),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn block_size(&self) -> usize {
        self.inner.block_size
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Take a zero-filled block, or report exhaustion
    pub fn try_allocate(&self) -> Result<PoolBlock> {
        let mut state = self.inner.state.borrow_mut();
        let Some(mut data) = state.free.pop() else {
            return Err(Error::PoolExhausted {
                pool: self.inner.name.clone(),
                capacity: self.inner.capacity,
            });
        };

        data.fill(0);
        state.in_use += 1;
        state.high_water = state.high_water.max(state.in_use);
        tracing::trace!(pool = %self.inner.name, in_use = state.in_use, "allocated block");

        Ok(PoolBlock {
            data,
            pool: Rc::clone(&self.inner),
        })
    }

    /// Take a zero-filled block, panicking if the pool is exhausted
    ///
    /// # Panics
    ///
    /// Panics when every block is in use.
    pub fn assert_allocate(&self) -> PoolBlock {
        match self.try_allocate() {
            Ok(block) => block,
            Err(e) => {
                tracing::error!(error = %e, "fatal pool exhaustion");
                panic!("{e}");
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.borrow();
        PoolStats {
            name: self.inner.name.clone(),
            block_size: self.inner.block_size,
            capacity: self.inner.capacity,
            in_use: state.in_use,
            high_water: state.high_water,
        }
    }
}

impl fmt::Debug for FixedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("name", &self.inner.name)
            .field("block_size", &self.inner.block_size)
            .field("capacity", &self.inner.capacity)
            .finish()
    }
}

/// An allocated block, returned to its pool on drop
pub struct PoolBlock {
    data: Box<[u8]>,
    pool: Rc<PoolInner>,
}

impl PoolBlock {
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Name of the pool this block belongs to
    pub fn pool_name(&self) -> &str {
        &self.pool.name
    }
}

impl fmt::Debug for PoolBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBlock")
            .field("pool", &self.pool.name)
            .field("len", &self.data.len())
            .finish()
    }
}

impl Drop for PoolBlock {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        let mut state = self.pool.state.borrow_mut();
        state.free.push(data);
        state.in_use -= 1;
        tracing::trace!(pool = %self.pool.name, in_use = state.in_use, "released block");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_release() {
        let pool = FixedPool::new("test", 2, 16);

        let block = pool.try_allocate().unwrap();
        assert_eq!(block.len(), 16);
        assert_eq!(pool.stats().in_use, 1);

        drop(block);
        let stats = pool.stats();
        assert_eq!(stats.in_use, 0);
        assert_eq!(stats.high_water, 1);
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let pool = FixedPool::new("tight", 2, 8);
        let _a = pool.try_allocate().unwrap();
        let _b = pool.try_allocate().unwrap();

        let result = pool.try_allocate();
        assert!(matches!(
            result,
            Err(Error::PoolExhausted { ref pool, capacity: 2 }) if pool == "tight"
        ));
    }

    #[test]
    #[should_panic(expected = "exhausted")]
    fn test_assert_allocate_panics_when_exhausted() {
        let pool = FixedPool::new("fatal", 1, 8);
        let _held = pool.assert_allocate();
        let _ = pool.assert_allocate();
    }

    #[test]
    fn test_released_block_is_reused_zeroed() {
        let pool = FixedPool::new("reuse", 1, 4);

        let mut block = pool.assert_allocate();
        block.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        drop(block);

        let block = pool.assert_allocate();
        assert_eq!(block.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_clones_share_blocks() {
        let pool = FixedPool::new("shared", 1, 4);
        let other = pool.clone();

        let _held = pool.assert_allocate();
        assert!(other.try_allocate().is_err());
        assert_eq!(other.stats().in_use, 1);
    }
}
