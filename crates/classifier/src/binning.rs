//! Class break generation from sample data, the way the data server builds
//! the `breaks` arrays it publishes in the metadata document.

use std::str::FromStr;

use census_common::{BoundaryLevel, Breaks, Feature, MapType, NUM_BREAKS};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::gradient::PERCENT_CEILING;

const KMEANS_MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinningMethod {
    /// Same number of areas per class (ntile)
    #[default]
    EqualCount,
    /// Same value width per class
    EqualInterval,
    /// One-dimensional k-means cluster maxima
    KMeans,
    /// Fractions of the maximum value
    MaxFraction,
}

impl BinningMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinningMethod::EqualCount => "equal_count",
            BinningMethod::EqualInterval => "equal_interval",
            BinningMethod::KMeans => "k_means",
            BinningMethod::MaxFraction => "max_fraction",
        }
    }
}

impl FromStr for BinningMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "equal_count" | "ntile" => Ok(BinningMethod::EqualCount),
            "equal_interval" => Ok(BinningMethod::EqualInterval),
            "kmeans" | "k_means" => Ok(BinningMethod::KMeans),
            "max_fraction" => Ok(BinningMethod::MaxFraction),
            other => Err(format!("unknown binning method '{}'", other)),
        }
    }
}

/// Sorted sample of the values breaks are computed from.
///
/// Keeps values above zero from areas over the level's population threshold.
/// Percent samples must also be under 100.
pub fn sample_values<'a>(
    features: impl IntoIterator<Item = &'a Feature>,
    map_type: MapType,
    level: &BoundaryLevel,
) -> Vec<f64> {
    let mut values: Vec<f64> = features
        .into_iter()
        .filter(|f| !level.suppresses(f.population))
        .filter_map(|f| map_type.metric(f))
        .filter(|v| *v > 0.0)
        .filter(|v| map_type != MapType::Percent || *v < PERCENT_CEILING)
        .collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Seven breaks from a sorted sample.
pub fn compute_breaks(samples: &[f64], method: BinningMethod) -> Result<Vec<f64>, ClassifierError> {
    let (Some(&min), Some(&max)) = (samples.first(), samples.last()) else {
        return Err(ClassifierError::EmptySample {
            map_type: MapType::Values,
        });
    };

    let n = NUM_BREAKS;
    let breaks = match method {
        BinningMethod::EqualInterval => {
            let delta = (max - min) / n as f64;
            (0..n)
                .map(|i| if i + 1 == n { max } else { min + delta * (i + 1) as f64 })
                .collect()
        }
        BinningMethod::MaxFraction => (0..n).map(|i| max / n as f64 * (i + 1) as f64).collect(),
        BinningMethod::EqualCount => ntile_maxima(samples, n),
        BinningMethod::KMeans => kmeans_maxima(samples, n),
    };

    Ok(pad(breaks, n))
}

/// Sample, compute and validate breaks for one batch.
pub fn breaks_for_batch<'a>(
    features: impl IntoIterator<Item = &'a Feature>,
    map_type: MapType,
    level: &BoundaryLevel,
    method: BinningMethod,
) -> Result<Breaks, ClassifierError> {
    let samples = sample_values(features, map_type, level);
    if samples.is_empty() {
        return Err(ClassifierError::EmptySample { map_type });
    }
    let breaks = compute_breaks(&samples, method)?;
    Ok(Breaks::try_from(breaks)?)
}

/// Maximum of each ntile bucket. Leading buckets take the remainder.
fn ntile_maxima(samples: &[f64], n: usize) -> Vec<f64> {
    let len = samples.len();
    let base = len / n;
    let extra = len % n;

    let mut maxima = Vec::with_capacity(n);
    let mut end = 0;
    for bucket in 0..n {
        let size = base + usize::from(bucket < extra);
        if size == 0 {
            break;
        }
        end += size;
        maxima.push(samples[end - 1]);
    }
    maxima
}

/// Lloyd iteration over a sorted 1-D sample, returning each cluster's maximum.
fn kmeans_maxima(samples: &[f64], k: usize) -> Vec<f64> {
    let len = samples.len();
    let k = k.min(len);

    let mut centroids: Vec<f64> = (0..k)
        .map(|i| samples[((2 * i + 1) * len / (2 * k)).min(len - 1)])
        .collect();
    let mut assignment = vec![0usize; len];

    for _ in 0..KMEANS_MAX_ITERATIONS {
        let mut changed = false;
        for (slot, value) in assignment.iter_mut().zip(samples) {
            let nearest = nearest_centroid(&centroids, *value);
            if *slot != nearest {
                *slot = nearest;
                changed = true;
            }
        }

        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (cluster, value) in assignment.iter().zip(samples) {
            sums[*cluster] += value;
            counts[*cluster] += 1;
        }
        for (c, centroid) in centroids.iter_mut().enumerate() {
            if counts[c] > 0 {
                *centroid = sums[c] / counts[c] as f64;
            }
        }

        if !changed {
            break;
        }
    }

    let mut maxima: Vec<Option<f64>> = vec![None; k];
    for (cluster, value) in assignment.iter().zip(samples) {
        let slot = &mut maxima[*cluster];
        *slot = Some(slot.map_or(*value, |m| m.max(*value)));
    }
    let mut maxima: Vec<f64> = maxima.into_iter().flatten().collect();
    maxima.sort_by(f64::total_cmp);
    maxima
}

fn nearest_centroid(centroids: &[f64], value: f64) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (value - **a).abs().total_cmp(&(value - **b).abs()))
        .map_or(0, |(i, _)| i)
}

/// Repeat the highest break until there are `n`.
fn pad(mut breaks: Vec<f64>, n: usize) -> Vec<f64> {
    if let Some(&last) = breaks.last() {
        breaks.resize(n.max(breaks.len()), last);
    }
    breaks.truncate(n);
    breaks
}
