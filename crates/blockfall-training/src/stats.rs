//! Summary statistics for population reports.

use serde::Serialize;

/// Summary of a set of `f32` samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Middle element, or the upper of the two middle elements for even counts.
    pub median: f32,
    /// Population standard deviation.
    pub std_dev: f32,
    /// `std_dev / (max - min)`, or `0.0` when all samples are equal.
    ///
    /// Falls towards zero as a population converges.
    pub spread: f32,
}

impl DescriptiveStats {
    /// Summarizes `values`, returning `None` when there are none.
    ///
    /// ```
    /// # use blockfall_training::stats::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!((stats.min, stats.max), (1.0, 5.0));
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f32::total_cmp);

        let min = *values.first()?;
        let max = *values.last()?;
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let median = values[values.len() / 2];
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        let std_dev = variance.sqrt();
        let range = max - min;
        let spread = if range > 0.0 { std_dev / range } else { 0.0 };

        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev,
            spread,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(DescriptiveStats::new([]).is_none());
    }

    #[test]
    fn test_constant_samples() {
        let stats = DescriptiveStats::new([2.5; 4]).unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.spread, 0.0);
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn test_even_count() {
        let stats = DescriptiveStats::new([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.mean, 2.5);
        assert!((stats.std_dev - 1.25_f32.sqrt()).abs() < 1e-6);
        assert!((stats.spread - 1.25_f32.sqrt() / 3.0).abs() < 1e-6);
    }
}
