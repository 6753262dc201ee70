// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Cluster Size Histogram

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub size: usize,
    pub count: usize,
}

/// Frequency of every cluster size between the smallest and largest graph,
/// zero-count sizes included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeHistogram {
    pub bins: Vec<HistogramBin>,
}

impl SizeHistogram {
    pub fn from_sizes(sizes: &[usize]) -> Self {
        let (Some(&min), Some(&max)) = (sizes.iter().min(), sizes.iter().max()) else {
            return Self::default();
        };
        let mut counts = vec![0usize; max - min + 1];
        for &size in sizes {
            counts[size - min] += 1;
        }
        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(offset, count)| HistogramBin { size: min + offset, count })
            .collect();
        Self { bins }
    }

    pub fn min_size(&self) -> Option<usize> {
        self.bins.first().map(|b| b.size)
    }

    pub fn max_size(&self) -> Option<usize> {
        self.bins.last().map(|b| b.size)
    }

    /// Number of clusters counted.
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn count_of(&self, size: usize) -> usize {
        self.bins.iter().find(|b| b.size == size).map_or(0, |b| b.count)
    }
}
