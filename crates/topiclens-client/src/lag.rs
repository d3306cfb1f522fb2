//! Offset-map reconciliation and lag aggregation
//!
//! The three inputs (earliest, latest, current) come from three
//! independently-timed broker round trips; this module's job is to
//! guarantee key-set consistency before any arithmetic and to reduce the
//! per-partition figures to topic totals. It performs no I/O.

use crate::error::{Error, Result};
use std::collections::HashMap;
use topiclens_protocol::PartitionLayout;

/// Aggregate view of one topic at one describe instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMetrics {
    /// Topic name
    pub name: String,
    /// Number of partitions in the described layout
    pub partition_count: usize,
    /// Σ over partitions of (latest − earliest)
    pub total_messages: u64,
    /// Σ over partitions of (latest − current)
    pub total_lag: u64,
}

/// Merge the described layout and the three offset maps into topic metrics.
///
/// Every partition in the layout must be present in all three maps; a
/// missing partition is a data-consistency error, never silently skipped.
/// A partition reporting `latest < earliest` violates the broker contract
/// and is rejected the same way. A `current` outside `[earliest, latest]`
/// is snapshot skew between the independently-timed reads and is clamped
/// into the range, so lag always lands in `[0, messages]`.
pub fn aggregate(
    layout: &PartitionLayout,
    earliest: &HashMap<u32, u64>,
    latest: &HashMap<u32, u64>,
    current: &HashMap<u32, u64>,
) -> Result<TopicMetrics> {
    let mut total_messages: u64 = 0;
    let mut total_lag: u64 = 0;

    for &partition in &layout.partitions {
        let earliest = fetch(layout, earliest, partition, "earliest offset")?;
        let latest = fetch(layout, latest, partition, "latest offset")?;
        let current = fetch(layout, current, partition, "current position")?;

        if latest < earliest {
            return Err(Error::IncompleteMetadata {
                topic: layout.name.clone(),
                detail: format!(
                    "partition {partition} reports latest {latest} < earliest {earliest}"
                ),
            });
        }

        let current = current.clamp(earliest, latest);

        total_messages += latest - earliest;
        total_lag += latest - current;
    }

    Ok(TopicMetrics {
        name: layout.name.clone(),
        partition_count: layout.partitions.len(),
        total_messages,
        total_lag,
    })
}

fn fetch(
    layout: &PartitionLayout,
    map: &HashMap<u32, u64>,
    partition: u32,
    what: &str,
) -> Result<u64> {
    map.get(&partition)
        .copied()
        .ok_or_else(|| Error::IncompleteMetadata {
            topic: layout.name.clone(),
            detail: format!("no {what} for partition {partition}"),
        })
}
