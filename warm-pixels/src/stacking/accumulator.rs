//! Running pixel-wise mean and spread of the lines in one bin.

/// Welford accumulator over equal-length trails.
#[derive(Debug, Clone)]
pub(crate) struct TrailAccumulator {
    count: usize,
    mean: Vec<f64>,
    sum_sq_dev: Vec<f64>,
}

impl TrailAccumulator {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            count: 0,
            mean: vec![0.0; length],
            sum_sq_dev: vec![0.0; length],
        }
    }

    pub(crate) fn push(&mut self, data: &[f64]) {
        debug_assert_eq!(data.len(), self.mean.len());
        self.count += 1;
        let n = self.count as f64;
        for ((mean, m2), &x) in self.mean.iter_mut().zip(&mut self.sum_sq_dev).zip(data) {
            let delta = x - *mean;
            *mean += delta / n;
            *m2 += delta * (x - *mean);
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Standard error of the mean per pixel; None with fewer than two samples.
    pub(crate) fn standard_error(&self) -> Option<Vec<f64>> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f64;
        Some(
            self.sum_sq_dev
                .iter()
                .map(|m2| (m2 / (n - 1.0)).sqrt() / n.sqrt())
                .collect(),
        )
    }
}
