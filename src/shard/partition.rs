//! Pure shard assignment
//!
//! Records are distributed across exactly `num_shards` partitions. Which
//! partition a record lands in is decided by a [`Partitioner`]; assignment
//! itself performs no I/O.

use crate::error::{ErrorCode, ShardError, ShardResult};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on the number of shards in one write
pub const MAX_NUM_SHARDS: usize = 1_000_000;

/// Chooses the shard index for a record
pub trait Partitioner: Send + Sync {
    /// Return a shard index in `[0, num_shards)`.
    ///
    /// `position` is the record's index in the input sequence.
    fn partition_for(&self, record: &Record, position: usize, num_shards: usize) -> usize;
}

/// Stable FNV-1a hash of the record key
#[derive(Debug, Clone, Copy, Default)]
pub struct HashPartitioner;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Pure: 64-bit FNV-1a over the given bytes
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

impl Partitioner for HashPartitioner {
    fn partition_for(&self, record: &Record, _position: usize, num_shards: usize) -> usize {
        (fnv1a(record.key.as_bytes()) % num_shards as u64) as usize
    }
}

/// Deal records out in input order
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobinPartitioner;

impl Partitioner for RoundRobinPartitioner {
    fn partition_for(&self, _record: &Record, position: usize, num_shards: usize) -> usize {
        position % num_shards
    }
}

/// Named partitioning strategy, selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionStrategy {
    #[default]
    Hash,
    RoundRobin,
}

impl PartitionStrategy {
    pub fn partitioner(self) -> Box<dyn Partitioner> {
        match self {
            Self::Hash => Box::new(HashPartitioner),
            Self::RoundRobin => Box::new(RoundRobinPartitioner),
        }
    }
}

impl fmt::Display for PartitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash => write!(f, "hash"),
            Self::RoundRobin => write!(f, "round-robin"),
        }
    }
}

impl<P: Partitioner + ?Sized> Partitioner for Box<P> {
    fn partition_for(&self, record: &Record, position: usize, num_shards: usize) -> usize {
        (**self).partition_for(record, position, num_shards)
    }
}

/// Records grouped into exactly `num_shards` partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardAssignment {
    shards: Vec<Vec<Record>>,
}

impl ShardAssignment {
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    pub fn shard(&self, index: usize) -> Option<&[Record]> {
        self.shards.get(index).map(Vec::as_slice)
    }

    pub fn total_records(&self) -> usize {
        self.shards.iter().map(Vec::len).sum()
    }

    /// Number of partitions holding at least one record
    pub fn occupied_shards(&self) -> usize {
        self.shards.iter().filter(|shard| !shard.is_empty()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[Record])> {
        self.shards
            .iter()
            .enumerate()
            .map(|(index, shard)| (index, shard.as_slice()))
    }

    pub fn into_shards(self) -> Vec<Vec<Record>> {
        self.shards
    }
}

/// Pure: assign every record to exactly one of `num_shards` partitions
pub fn assign<P>(
    records: Vec<Record>,
    num_shards: usize,
    partitioner: &P,
) -> ShardResult<ShardAssignment>
where
    P: Partitioner + ?Sized,
{
    if num_shards == 0 {
        return Err(ShardError::partition_count(num_shards));
    }
    if num_shards > MAX_NUM_SHARDS {
        return Err(ShardError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!(
                "num_shards {} exceeds the maximum of {}",
                num_shards, MAX_NUM_SHARDS
            ),
        ));
    }

    let mut shards: Vec<Vec<Record>> = vec![Vec::new(); num_shards];
    for (position, record) in records.into_iter().enumerate() {
        let index = partitioner.partition_for(&record, position, num_shards);
        let shard = shards
            .get_mut(index)
            .ok_or_else(|| ShardError::partition_out_of_range(index, num_shards))?;
        shard.push(record);
    }

    Ok(ShardAssignment { shards })
}
