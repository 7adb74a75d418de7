//! Named time series produced by a completed run.
//!
//! A [`Solution`] holds one series per `var` and `aux_var` key, all sharing
//! the output time grid of the run that produced them.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub type FloatValue = f64;
pub type Time = f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SolutionSeries {
    name: String,
    values: Array1<FloatValue>,
}

/// A collection of named time series sharing a common output time grid.
///
/// Series are kept in insertion order: integrated variables first (in their
/// declared order), then aux variables as they were reconstructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    times: Vec<Time>,
    series: Vec<SolutionSeries>,
}

impl Solution {
    pub fn new() -> Self {
        Self {
            times: Vec::new(),
            series: Vec::new(),
        }
    }

    pub(crate) fn with_times(times: Vec<Time>) -> Self {
        Self {
            times,
            series: Vec::new(),
        }
    }

    /// Add a new series to the solution
    ///
    /// Panics if a series with the same name already exists in the solution
    pub(crate) fn insert(&mut self, name: &str, values: Vec<FloatValue>) {
        if self.get(name).is_some() {
            panic!("series {} already exists", name)
        }
        self.series.push(SolutionSeries {
            name: name.to_string(),
            values: Array1::from_vec(values),
        });
    }

    /// The output time grid shared by every series.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    pub fn get(&self, name: &str) -> Option<&Array1<FloatValue>> {
        self.series
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.values)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<FloatValue>)> {
        self.series.iter().map(|s| (s.name.as_str(), &s.values))
    }

    /// Number of series held (not the number of time points).
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding() {
        let mut solution = Solution::with_times(vec![0.0, 1.0, 2.0]);
        solution.insert("prey", vec![10.0, 9.0, 8.5]);
        solution.insert("predator", vec![5.0, 6.0, 6.2]);

        assert_eq!(solution.len(), 2);
        assert_eq!(solution.times(), &[0.0, 1.0, 2.0]);
        assert_eq!(solution.get("prey").unwrap()[0], 10.0);
        assert_eq!(
            solution.names().collect::<Vec<_>>(),
            vec!["prey", "predator"]
        );
    }

    #[test]
    fn missing_series() {
        let solution = Solution::new();
        assert!(solution.get("prey").is_none());
        assert!(solution.is_empty());
    }

    #[test]
    #[should_panic]
    fn adding_same_name() {
        let mut solution = Solution::with_times(vec![0.0]);
        solution.insert("prey", vec![10.0]);
        solution.insert("prey", vec![10.0]);
    }
}
