//! Bounds checking of `(pool, offset, length)` references.

use axon_hal::{DataLocation, Memory, MemoryPool};
use tracing::error;

/// Validates data locations against a fixed list of memory pools.
///
/// Pool sizes are cached at construction; token pools report size zero, which
/// forces any reference into them to have `offset == 0 && length == 0`. The
/// verifier only reads sizes and never takes ownership of pool handles.
#[derive(Debug, Clone)]
pub struct MemoryAccessVerifier {
    pool_sizes: Vec<u64>,
}

impl MemoryAccessVerifier {
    /// Build a verifier over a model's memory list.
    pub fn from_memories(pools: &[Memory]) -> Self {
        Self { pool_sizes: pools.iter().map(|pool| pool.size).collect() }
    }

    /// Build a verifier over a request's pool list.
    pub fn from_pools(pools: &[MemoryPool]) -> Self {
        Self { pool_sizes: pools.iter().map(MemoryPool::size).collect() }
    }

    /// Whether `location` addresses bytes that exist in its pool.
    pub fn validate(&self, location: &DataLocation) -> bool {
        let pool_index = location.pool_index as usize;
        if pool_index >= self.pool_sizes.len() {
            error!(
                "Invalid pool index {} (have {} pools)",
                location.pool_index,
                self.pool_sizes.len()
            );
            return false;
        }
        let size = self.pool_sizes[pool_index];
        // Widen before adding so offset + length cannot wrap.
        if u64::from(location.offset) + u64::from(location.length) > size {
            error!(
                "Reference to pool {} with offset {} and length {} exceeds pool size of {}",
                location.pool_index, location.offset, location.length, size
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_bounds() {
        let verifier = MemoryAccessVerifier::from_memories(&[Memory::ashmem(100)]);
        assert!(verifier.validate(&DataLocation::new(0, 0, 100)));
        assert!(verifier.validate(&DataLocation::new(0, 60, 40)));
        assert!(verifier.validate(&DataLocation::new(0, 100, 0)));
    }

    #[test]
    fn test_out_of_bounds() {
        let verifier = MemoryAccessVerifier::from_memories(&[Memory::ashmem(100)]);
        assert!(!verifier.validate(&DataLocation::new(0, 60, 41)));
        assert!(!verifier.validate(&DataLocation::new(1, 0, 0)));
    }

    #[test]
    fn test_offset_plus_length_does_not_wrap() {
        // Both legs fit in u32 but their sum does not; a 32-bit addition
        // would wrap to 4 and pass.
        let verifier = MemoryAccessVerifier::from_memories(&[Memory::ashmem(100)]);
        assert!(!verifier.validate(&DataLocation::new(0, u32::MAX, 5)));
    }

    #[test]
    fn test_token_pool_is_size_zero() {
        let verifier = MemoryAccessVerifier::from_pools(&[MemoryPool::Token(7)]);
        assert!(verifier.validate(&DataLocation::new(0, 0, 0)));
        assert!(!verifier.validate(&DataLocation::new(0, 0, 1)));
        assert!(!verifier.validate(&DataLocation::new(0, 1, 0)));
    }
}
