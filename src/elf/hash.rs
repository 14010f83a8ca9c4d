//! # Hash Tables
//!
//! The SysV (`DT_HASH`) and GNU (`DT_GNU_HASH`) symbol hash tables. Neither
//! table is used for lookups here: the dynamic symbol table carries no count
//! of its own, so the count is derived by walking a hash table, and the
//! chain lengths feed the bucket histogram.
//!
//! Every chain walk is bounded by the number of chain entries actually
//! present, so a corrupt table can never loop.

use crate::arch::EM_S390;
use crate::errors::{ElfError, Result};
use crate::utils::{Codec, ElfClass};

/// `EM_ALPHA`, whose 64-bit hash tables use 8-byte entries.
const EM_ALPHA: u16 = 0x9026;

/// GNU hash chains mark their last entry with the low bit.
const GNU_CHAIN_END: u32 = 1;

/// Width of one SysV hash table entry for this machine.
pub fn sysv_entry_size(machine: u16, class: ElfClass) -> usize {
    if class.is_64() && (machine == EM_S390 || machine == EM_ALPHA) {
        8
    } else {
        4
    }
}

// ============================================================================
// SysV hash
// ============================================================================

/// A decoded `.hash` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SysvHash {
    pub buckets: Vec<u64>,
    pub chains: Vec<u64>,
}

impl SysvHash {
    /// Parse a table from `data`, which may extend past the table's end.
    pub fn parse(data: &[u8], codec: Codec, entry_size: usize) -> Result<Self> {
        let nbucket = codec.uint_at(data, 0, entry_size)?;
        let nchain = codec.uint_at(data, entry_size, entry_size)?;
        let needed = nbucket
            .checked_add(nchain)
            .and_then(|n| n.checked_add(2))
            .and_then(|n| n.checked_mul(entry_size as u64))
            .ok_or_else(|| ElfError::corrupt("hash table", "bucket and chain counts overflow"))?;
        if needed > data.len() as u64 {
            return Err(ElfError::corrupt(
                "hash table",
                format!(
                    "{nbucket} buckets and {nchain} chains need {needed:#x} bytes, only {:#x} available",
                    data.len()
                ),
            ));
        }
        let word = |i: u64| codec.uint_at(data, (i as usize) * entry_size, entry_size);
        let buckets = (0..nbucket).map(|i| word(2 + i)).collect::<Result<_>>()?;
        let chains = (0..nchain)
            .map(|i| word(2 + nbucket + i))
            .collect::<Result<_>>()?;
        Ok(SysvHash { buckets, chains })
    }

    /// Number of dynamic symbols: one past the largest index reachable
    /// from any bucket.
    pub fn symbol_count(&self) -> u64 {
        let mut max: Option<u64> = None;
        for &start in &self.buckets {
            self.walk(start, |index| {
                max = Some(max.map_or(index, |m| m.max(index)));
            });
        }
        max.map_or(0, |m| m + 1)
    }

    /// Length of each bucket's chain.
    pub fn bucket_lengths(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|&start| {
                let mut len = 0;
                self.walk(start, |_| len += 1);
                len
            })
            .collect()
    }

    /// Visit every index on the chain starting at `start`, stopping at
    /// index 0, at an index outside the chain array, or after as many
    /// steps as there are chain entries.
    fn walk(&self, start: u64, mut visit: impl FnMut(u64)) {
        let mut index = start;
        let mut steps = 0usize;
        while index != 0 && steps < self.chains.len() {
            let Some(&next) = self.chains.get(index as usize) else {
                break;
            };
            visit(index);
            index = next;
            steps += 1;
        }
    }
}

// ============================================================================
// GNU hash
// ============================================================================

/// A decoded `.gnu.hash` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GnuHash {
    /// Index of the first symbol covered by the table.
    pub symbol_offset: u32,
    pub bloom_shift: u32,
    pub bloom: Vec<u64>,
    pub buckets: Vec<u32>,

    /// Chain values for symbols `symbol_offset..`, as far as the data goes.
    pub chains: Vec<u32>,
}

impl GnuHash {
    /// Parse a table from `data`. The chain array has no explicit length,
    /// so every remaining whole word is taken as a chain entry.
    pub fn parse(data: &[u8], codec: Codec) -> Result<Self> {
        let nbuckets = codec.u32_at(data, 0)? as usize;
        let symbol_offset = codec.u32_at(data, 4)?;
        let bloom_size = codec.u32_at(data, 8)? as usize;
        let bloom_shift = codec.u32_at(data, 12)?;
        let word = codec.word_size();

        let bloom_end = bloom_size
            .checked_mul(word)
            .and_then(|n| n.checked_add(16))
            .filter(|&n| n <= data.len())
            .ok_or_else(|| ElfError::corrupt("GNU hash table", "bloom filter exceeds the table"))?;
        let buckets_end = nbuckets
            .checked_mul(4)
            .and_then(|n| n.checked_add(bloom_end))
            .filter(|&n| n <= data.len())
            .ok_or_else(|| ElfError::corrupt("GNU hash table", "buckets exceed the table"))?;

        let bloom = (0..bloom_size)
            .map(|i| codec.word_at(data, 16 + i * word))
            .collect::<Result<_>>()?;
        let buckets = (0..nbuckets)
            .map(|i| codec.u32_at(data, bloom_end + i * 4))
            .collect::<Result<_>>()?;
        let chains = data[buckets_end..]
            .chunks_exact(4)
            .map(|c| codec.u32_at(c, 0))
            .collect::<Result<_>>()?;

        Ok(GnuHash {
            symbol_offset,
            bloom_shift,
            bloom,
            buckets,
            chains,
        })
    }

    /// Number of dynamic symbols: the chain of the highest bucket is walked
    /// to its terminator, whose index is the last symbol.
    pub fn symbol_count(&self) -> Result<u64> {
        let Some(&max_bucket) = self.buckets.iter().max() else {
            return Ok(u64::from(self.symbol_offset));
        };
        if max_bucket == 0 {
            return Ok(u64::from(self.symbol_offset));
        }
        if max_bucket < self.symbol_offset {
            return Err(ElfError::corrupt(
                "GNU hash table",
                format!(
                    "bucket value {max_bucket} is below the symbol offset {}",
                    self.symbol_offset
                ),
            ));
        }
        let mut position = (max_bucket - self.symbol_offset) as usize;
        loop {
            let chain = self.chains.get(position).ok_or_else(|| {
                ElfError::corrupt("GNU hash table", "chain runs past the end of the table")
            })?;
            if chain & GNU_CHAIN_END != 0 {
                return Ok(u64::from(self.symbol_offset) + position as u64 + 1);
            }
            position += 1;
        }
    }

    /// Length of each bucket's chain. A chain with no terminator ends at
    /// the end of the data.
    pub fn bucket_lengths(&self) -> Vec<u64> {
        self.buckets
            .iter()
            .map(|&start| {
                if start == 0 || start < self.symbol_offset {
                    return 0;
                }
                let mut len = 0;
                let mut position = (start - self.symbol_offset) as usize;
                while let Some(chain) = self.chains.get(position) {
                    len += 1;
                    if chain & GNU_CHAIN_END != 0 {
                        break;
                    }
                    position += 1;
                }
                len
            })
            .collect()
    }
}

// ============================================================================
// Histogram
// ============================================================================

/// `counts[n]` is the number of buckets whose chain has length `n`.
pub fn histogram(lengths: &[u64]) -> Vec<u64> {
    let longest = lengths.iter().copied().max().unwrap_or(0) as usize;
    let mut counts = vec![0u64; longest + 1];
    for &len in lengths {
        counts[len as usize] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Endianness;

    const LE64: Codec = Codec::new(ElfClass::Elf64, Endianness::Little);
    const BE32: Codec = Codec::new(ElfClass::Elf32, Endianness::Big);

    fn words(codec: Codec, values: &[u32]) -> Vec<u8> {
        let mut out = vec![0u8; values.len() * 4];
        for (i, &v) in values.iter().enumerate() {
            codec.put_u32(&mut out, i * 4, v).unwrap();
        }
        out
    }

    #[test]
    fn test_sysv_count_and_lengths() {
        // 2 buckets, 6 chain entries. Bucket 0 -> 1 -> 3 -> 0, bucket 1 -> 5 -> 2 -> 0.
        let data = words(BE32, &[2, 6, 1, 5, 0, 3, 0, 0, 0, 2]);
        let hash = SysvHash::parse(&data, BE32, 4).unwrap();
        assert_eq!(hash.buckets, vec![1, 5]);
        assert_eq!(hash.symbol_count(), 6);
        assert_eq!(hash.bucket_lengths(), vec![2, 2]);
        assert_eq!(histogram(&hash.bucket_lengths()), vec![0, 0, 2]);
    }

    #[test]
    fn test_sysv_cycle_is_bounded() {
        // Chain 1 -> 2 -> 1 -> ...
        let data = words(BE32, &[1, 3, 1, 0, 2, 1]);
        let hash = SysvHash::parse(&data, BE32, 4).unwrap();
        assert_eq!(hash.bucket_lengths(), vec![3]);
        assert_eq!(hash.symbol_count(), 3);
    }

    #[test]
    fn test_sysv_truncated() {
        let data = words(BE32, &[4, 100, 0, 0]);
        assert!(matches!(
            SysvHash::parse(&data, BE32, 4),
            Err(ElfError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_gnu_count() {
        // 3 buckets, symbols start at 4, one bloom word (8 bytes on ELF64).
        // Bucket chains: [4, 5], [], [6, 7, 8].
        let mut data = words(LE64, &[3, 4, 1, 6]);
        data.extend_from_slice(&[0xff; 8]);
        data.extend(words(LE64, &[4, 0, 6]));
        data.extend(words(LE64, &[0x10, 0x11, 0x20, 0x30, 0x41]));
        let hash = GnuHash::parse(&data, LE64).unwrap();
        assert_eq!(hash.bloom.len(), 1);
        assert_eq!(hash.symbol_count().unwrap(), 9);
        assert_eq!(hash.bucket_lengths(), vec![2, 0, 3]);
        assert_eq!(histogram(&hash.bucket_lengths()), vec![1, 0, 1, 1]);
    }

    #[test]
    fn test_gnu_missing_terminator() {
        let mut data = words(LE64, &[1, 1, 0, 6]);
        data.extend(words(LE64, &[1, 0x10, 0x12]));
        let hash = GnuHash::parse(&data, LE64).unwrap();
        assert!(hash.symbol_count().is_err());
        assert_eq!(hash.bucket_lengths(), vec![2]);

        let mut data = words(LE64, &[1, 1, 0, 6]);
        data.extend(words(LE64, &[0]));
        assert_eq!(GnuHash::parse(&data, LE64).unwrap().symbol_count().unwrap(), 1);
    }
}
