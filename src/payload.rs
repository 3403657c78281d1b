//! Pool-backed payload storage for deferred responses
//!
//! Values are encoded into a pool block when a request is captured and decoded
//! again when its deferred continuation runs. Three shapes exist:
//!
//! - [`PayloadBox`]: one fixed-size value in one block
//! - [`StringPayload`]: a NUL-terminated string in one value block
//! - [`ArrayPayload`]: a buffer block holding the input elements plus an
//!   indirection record (from a separate pool) holding the element counts
//!
//! Every shape owns its blocks, so the allocation is released when the payload
//! is consumed by its continuation.

use std::borrow::Cow;
use std::marker::PhantomData;

use crate::pool::{FixedPool, PoolBlock};
use crate::types::{LargeBitMask, LargeEnum, floor_char_boundary};

/// Fixed-width byte encoding of a value stored in a pool block
pub trait BlockCodec: Sized {
    /// Number of bytes written by `encode` and read by `decode`
    const ENCODED_LEN: usize;

    /// Write the value into `out[..ENCODED_LEN]`
    fn encode(&self, out: &mut [u8]);

    /// Read a value back from `bytes[..ENCODED_LEN]`
    fn decode(bytes: &[u8]) -> Self;
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(raw)
}

impl BlockCodec for u8 {
    const ENCODED_LEN: usize = 1;

    fn encode(&self, out: &mut [u8]) {
        out[0] = *self;
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl BlockCodec for i64 {
    const ENCODED_LEN: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        out[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        read_u64(bytes) as i64
    }
}

impl BlockCodec for u64 {
    const ENCODED_LEN: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        out[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        read_u64(bytes)
    }
}

// Goes through the raw bits so NaN payloads and signed zeros survive.
impl BlockCodec for f64 {
    const ENCODED_LEN: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        self.to_bits().encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        f64::from_bits(read_u64(bytes))
    }
}

impl BlockCodec for LargeEnum {
    const ENCODED_LEN: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        self.0.encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self(read_u64(bytes))
    }
}

impl BlockCodec for LargeBitMask {
    const ENCODED_LEN: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        self.0.encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self(read_u64(bytes))
    }
}

/// A single value boxed in a pool block
#[derive(Debug)]
pub struct PayloadBox<T> {
    block: PoolBlock,
    _marker: PhantomData<T>,
}

impl<T: BlockCodec> PayloadBox<T> {
    /// Allocate a block from `pool` and encode `value` into it
    ///
    /// # Panics
    ///
    /// Panics if the pool is exhausted or its blocks are smaller than
    /// `T::ENCODED_LEN`.
    pub fn capture(pool: &FixedPool, value: &T) -> Self {
        assert!(
            pool.block_size() >= T::ENCODED_LEN,
            "pool {} blocks too small for a {}-byte value",
            pool.name(),
            T::ENCODED_LEN
        );
        let mut block = pool.assert_allocate();
        value.encode(block.as_mut_slice());
        Self {
            block,
            _marker: PhantomData,
        }
    }

    /// Decode the value without releasing the block
    pub fn peek(&self) -> T {
        T::decode(self.block.as_slice())
    }

    /// Decode the value and release the block
    pub fn into_value(self) -> T {
        self.peek()
    }
}

/// A NUL-terminated string in a value-pool block
#[derive(Debug)]
pub struct StringPayload {
    block: PoolBlock,
}

impl StringPayload {
    /// Copy `input` into a block, bounded by `out_size` bytes including the terminator
    ///
    /// `out_size` is clamped to the block size. At most `out_size - 1` bytes are
    /// kept, cut back to a character boundary; copying also stops at an
    /// interior NUL. An `out_size` of zero stores the empty string.
    pub fn capture(pool: &FixedPool, input: &str, out_size: usize) -> Self {
        let mut block = pool.assert_allocate();
        let capacity = out_size.min(block.len());

        if capacity > 0 {
            let input = input.split('\0').next().unwrap_or_default();
            let len = floor_char_boundary(input, capacity - 1);
            let buf = block.as_mut_slice();
            buf[..len].copy_from_slice(&input.as_bytes()[..len]);
            buf[len] = 0;
        }

        Self { block }
    }

    /// The stored string, up to its terminator
    pub fn as_str(&self) -> Cow<'_, str> {
        let bytes = self.block.as_slice();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end])
    }
}

/// Indirection record layout: `[out_len: u64 LE][in_len: u64 LE]`
pub const RECORD_SIZE: usize = 16;

/// An element buffer plus the indirection record describing it
///
/// The buffer holds the captured *input* elements; the record, allocated from a
/// separate small-block pool, carries the output element count the response
/// must deliver. Fields drop in declaration order, so the buffer is released
/// before the record.
#[derive(Debug)]
pub struct ArrayPayload<T> {
    buffer: PoolBlock,
    record: PoolBlock,
    _marker: PhantomData<T>,
}

impl<T: BlockCodec> ArrayPayload<T> {
    /// Number of `T` elements a block of `block_size` bytes can hold
    pub fn capacity_for(block_size: usize) -> usize {
        block_size / T::ENCODED_LEN
    }

    /// Copy `input` into a value block and record the requested output length
    ///
    /// Both the copied input and `out_len` are clamped to the buffer's element
    /// capacity.
    pub fn capture(
        value_pool: &FixedPool,
        record_pool: &FixedPool,
        input: &[T],
        out_len: usize,
    ) -> Self {
        let capacity = Self::capacity_for(value_pool.block_size());
        let in_len = input.len().min(capacity);
        let out_len = out_len.min(capacity);

        let mut buffer = value_pool.assert_allocate();
        for (chunk, value) in buffer
            .as_mut_slice()
            .chunks_exact_mut(T::ENCODED_LEN)
            .zip(&input[..in_len])
        {
            value.encode(chunk);
        }

        let mut record = record_pool.assert_allocate();
        (out_len as u64).encode(&mut record.as_mut_slice()[..8]);
        (in_len as u64).encode(&mut record.as_mut_slice()[8..RECORD_SIZE]);

        Self {
            buffer,
            record,
            _marker: PhantomData,
        }
    }

    /// Output element count stored in the record
    pub fn out_len(&self) -> usize {
        read_u64(self.record.as_slice()) as usize
    }

    /// Input element count stored in the record
    pub fn in_len(&self) -> usize {
        read_u64(&self.record.as_slice()[8..]) as usize
    }

    /// Decode the first `out_len` elements
    ///
    /// Elements past the captured input decode from zeroed bytes.
    pub fn elements(&self) -> Vec<T> {
        self.buffer
            .as_slice()
            .chunks_exact(T::ENCODED_LEN)
            .take(self.out_len())
            .map(T::decode)
            .collect()
    }

    /// Release the buffer, then the record
    pub fn release(self) {
        let Self { buffer, record, .. } = self;
        drop(buffer);
        drop(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TheStruct;

    fn pools() -> (FixedPool, FixedPool) {
        (
            FixedPool::new("value", 2, 257),
            FixedPool::new("record", 2, RECORD_SIZE),
        )
    }

    #[test]
    fn test_boxed_double_is_bit_exact() {
        let pool = FixedPool::new("value", 1, 257);
        for value in [0.0, -0.0, f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE] {
            let boxed = PayloadBox::capture(&pool, &value);
            assert_eq!(boxed.into_value().to_bits(), value.to_bits());
        }

        let nan = f64::from_bits(0x7FF8_0000_DEAD_BEEF);
        let boxed = PayloadBox::capture(&pool, &nan);
        assert_eq!(boxed.into_value().to_bits(), nan.to_bits());
    }

    #[test]
    fn test_boxed_value_releases_block() {
        let pool = FixedPool::new("value", 1, 8);
        let boxed = PayloadBox::capture(&pool, &LargeEnum::LARGE_VALUE1);
        assert_eq!(pool.stats().in_use, 1);
        assert_eq!(boxed.into_value(), LargeEnum::LARGE_VALUE1);
        assert_eq!(pool.stats().in_use, 0);
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn test_boxed_value_rejects_small_pool() {
        let pool = FixedPool::new("tiny", 1, 4);
        let _ = PayloadBox::capture(&pool, &1.5f64);
    }

    #[test]
    fn test_string_truncated_to_out_size() {
        let pool = FixedPool::new("value", 1, 257);
        let payload = StringPayload::capture(&pool, "hello world", 6);
        assert_eq!(payload.as_str(), "hello");
    }

    #[test]
    fn test_string_out_size_clamped_to_block() {
        let pool = FixedPool::new("value", 1, 257);
        let input = "x".repeat(400);
        let payload = StringPayload::capture(&pool, &input, 1000);
        assert_eq!(payload.as_str().len(), 256);
    }

    #[test]
    fn test_string_stops_at_nul_and_char_boundary() {
        let pool = FixedPool::new("value", 2, 257);

        let payload = StringPayload::capture(&pool, "abc\0def", 100);
        assert_eq!(payload.as_str(), "abc");

        let payload = StringPayload::capture(&pool, "aé", 3);
        assert_eq!(payload.as_str(), "a");
    }

    #[test]
    fn test_string_zero_out_size_is_empty() {
        let pool = FixedPool::new("value", 1, 257);
        let payload = StringPayload::capture(&pool, "hello", 0);
        assert_eq!(payload.as_str(), "");
    }

    #[test]
    fn test_array_keeps_input_and_out_len() {
        let (values, records) = pools();
        let payload = ArrayPayload::capture(&values, &records, &[1i64, -2, 3, 4], 3);

        assert_eq!(payload.in_len(), 4);
        assert_eq!(payload.out_len(), 3);
        assert_eq!(payload.elements(), vec![1, -2, 3]);
    }

    #[test]
    fn test_array_out_len_beyond_input_reads_zero() {
        let (values, records) = pools();
        let payload = ArrayPayload::capture(&values, &records, &[7i64], 3);
        assert_eq!(payload.elements(), vec![7, 0, 0]);
    }

    #[test]
    fn test_array_clamped_to_block_capacity() {
        let (values, records) = pools();
        let input: Vec<i64> = (0..40).collect();
        let payload = ArrayPayload::capture(&values, &records, &input, 40);

        assert_eq!(ArrayPayload::<i64>::capacity_for(257), 32);
        assert_eq!(payload.in_len(), 32);
        assert_eq!(payload.elements(), (0..32).collect::<Vec<i64>>());
    }

    #[test]
    fn test_array_release_frees_both_blocks() {
        let (values, records) = pools();
        let payload = ArrayPayload::capture(&values, &records, &[1u8, 2, 3], 3);
        assert_eq!(values.stats().in_use, 1);
        assert_eq!(records.stats().in_use, 1);

        payload.release();
        assert_eq!(values.stats().in_use, 0);
        assert_eq!(records.stats().in_use, 0);
    }

    #[test]
    fn test_struct_array_capacity() {
        let (values, records) = pools();
        let input: Vec<TheStruct> = (0..12).map(|i| TheStruct::new(format!("s{i}"), i)).collect();
        let payload = ArrayPayload::capture(&values, &records, &input, 12);

        assert_eq!(payload.out_len(), 11);
        assert_eq!(payload.elements(), input[..11].to_vec());
    }
}
