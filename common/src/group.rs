use std::{collections::HashMap, fmt, hash::Hash};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{Implementation, SeriesPoint};

/// Identifies one chart: every point measured with the same cluster and
/// thread counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub clusters: u32,
    pub threads: u32,
}

impl GroupKey {
    pub fn of(point: &SeriesPoint) -> Self {
        Self {
            clusters: point.clusters,
            threads: point.threads,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Clusters={}, Threads={}", self.clusters, self.threads)
    }
}

/// How the line series of a subplot are ordered
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesOrder {
    /// Order in which each implementation first appears in the data
    #[default]
    FirstSeen,
    /// Multithreaded, Distributed, Shared
    Declared,
}

/// One line of a subplot, sorted by pixel count.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub implementation: Implementation,
    pub points: Vec<(u64, Option<f64>)>,
}

impl Series {
    /// Runs of consecutive present values. A missing speedup breaks the line.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (x, y) in &self.points {
            match y {
                Some(y) => current.push((*x as f64, *y)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// One subplot: all series measured with a single kernel size.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub kernel_size: u32,
    pub series: Vec<Series>,
}

impl Panel {
    pub fn present_values(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.series.iter().flat_map(|s| {
            s.points
                .iter()
                .filter_map(|(x, y)| y.map(|y| (*x as f64, y)))
        })
    }
}

/// Everything that ends up in one output file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGroup {
    pub key: GroupKey,
    pub panels: Vec<Panel>,
}

/// Groups items by key, keeping keys in the order they are first seen and
/// items in their original order within each group.
pub fn partition_ordered<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut index = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(item);
    }
    groups
}

/// Partitions points by (clusters, threads), then kernel size, then
/// implementation.
pub fn build_groups(points: &[SeriesPoint], order: SeriesOrder) -> Vec<ChartGroup> {
    partition_ordered(points.iter(), |p| GroupKey::of(p))
        .into_iter()
        .filter(|(key, members)| {
            if members.is_empty() {
                debug!("Skipping empty group {key}");
            }
            !members.is_empty()
        })
        .map(|(key, members)| {
            let kernel_sizes = members
                .iter()
                .map(|p| p.kernel_size)
                .sorted_unstable()
                .dedup()
                .collect::<Vec<_>>();
            let panels = kernel_sizes
                .into_iter()
                .map(|kernel_size| {
                    let in_panel = members.iter().filter(|p| p.kernel_size == kernel_size);
                    build_panel(kernel_size, in_panel.copied(), order)
                })
                .collect::<Vec<_>>();
            debug!("Group {key}: {} members, {} panels", members.len(), panels.len());
            ChartGroup { key, panels }
        })
        .collect()
}

fn build_panel<'a>(
    kernel_size: u32,
    points: impl Iterator<Item = &'a SeriesPoint>,
    order: SeriesOrder,
) -> Panel {
    let mut series = partition_ordered(points, |p| p.implementation)
        .into_iter()
        .map(|(implementation, members)| Series {
            implementation,
            points: members
                .into_iter()
                .map(|p| (p.pixel_count, p.speedup))
                .sorted_by_key(|(pixel_count, _)| *pixel_count)
                .collect(),
        })
        .collect::<Vec<_>>();
    if order == SeriesOrder::Declared {
        series.sort_by_key(|s| s.implementation);
    }
    Panel {
        kernel_size,
        series,
    }
}
