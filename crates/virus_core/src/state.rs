//! Simulation state: single rows and the growing per-channel history.

use crate::error::ModelError;
use crate::traits::Scalar;
use serde::Serialize;

/// One owned snapshot `(x[N], v[N], z, t)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRow<T> {
    pub x: Vec<T>,
    pub v: Vec<T>,
    pub z: T,
    pub t: T,
}

impl<T: Scalar> StateRow<T> {
    /// Builds a row, failing if `x` and `v` disagree on the strain count.
    pub fn new(x: Vec<T>, v: Vec<T>, z: T, t: T) -> Result<Self, ModelError> {
        if x.len() != v.len() {
            return Err(ModelError::DimensionMismatch {
                x: x.len(),
                v: v.len(),
            });
        }
        Ok(Self { x, v, z, t })
    }

    pub fn strains(&self) -> usize {
        self.x.len()
    }

    pub fn view(&self) -> RowView<'_, T> {
        RowView {
            x: &self.x,
            v: &self.v,
            z: self.z,
            t: self.t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.view().is_finite()
    }
}

/// A borrowed row, as handed to integrators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowView<'a, T> {
    pub x: &'a [T],
    pub v: &'a [T],
    pub z: T,
    pub t: T,
}

impl<'a, T: Scalar> RowView<'a, T> {
    pub fn strains(&self) -> usize {
        self.x.len()
    }

    /// Summed viral input of this row.
    pub fn svi(&self) -> T {
        total(self.v)
    }

    pub fn to_owned_row(&self) -> StateRow<T> {
        StateRow {
            x: self.x.to_vec(),
            v: self.v.to_vec(),
            z: self.z,
            t: self.t,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.z.is_finite()
            && self.t.is_finite()
            && self.x.iter().all(|value| value.is_finite())
            && self.v.iter().all(|value| value.is_finite())
    }
}

/// Sum of a channel, used for every `svi` evaluation.
pub fn total<T: Scalar>(values: &[T]) -> T {
    values.iter().fold(T::zero(), |acc, &value| acc + value)
}

/// Full simulation history, one growable buffer per channel.
///
/// `x` and `v` are stored row-major with a stride of `strains`, so row `n`
/// occupies `n * strains .. (n + 1) * strains`. All channels always hold the
/// same number of rows, and there is always at least the initial row.
#[derive(Debug, Clone, PartialEq)]
pub struct StrainHistory<T> {
    strains: usize,
    x: Vec<T>,
    v: Vec<T>,
    z: Vec<T>,
    t: Vec<T>,
}

impl<T: Scalar> StrainHistory<T> {
    pub fn new(initial: StateRow<T>) -> Self {
        let StateRow { x, v, z, t } = initial;
        Self {
            strains: x.len(),
            x,
            v,
            z: vec![z],
            t: vec![t],
        }
    }

    pub fn strains(&self) -> usize {
        self.strains
    }

    /// Number of rows, initial row included.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowView<'_, T>> {
        if index >= self.len() {
            return None;
        }
        Some(self.view_at(index))
    }

    pub fn initial_row(&self) -> RowView<'_, T> {
        self.view_at(0)
    }

    pub fn last_row(&self) -> RowView<'_, T> {
        self.view_at(self.len() - 1)
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_, T>> + '_ {
        (0..self.len()).map(move |index| self.view_at(index))
    }

    pub fn times(&self) -> &[T] {
        &self.t
    }

    pub fn z(&self) -> &[T] {
        &self.z
    }

    pub fn x_row(&self, index: usize) -> Option<&[T]> {
        self.row(index).map(|row| row.x)
    }

    pub fn v_row(&self, index: usize) -> Option<&[T]> {
        self.row(index).map(|row| row.v)
    }

    /// Time series of `x` for one strain.
    pub fn x_series(&self, strain: usize) -> Option<Vec<T>> {
        self.series(&self.x, strain)
    }

    /// Time series of `v` for one strain.
    pub fn v_series(&self, strain: usize) -> Option<Vec<T>> {
        self.series(&self.v, strain)
    }

    pub(crate) fn push(&mut self, row: StateRow<T>) {
        debug_assert_eq!(row.x.len(), self.strains);
        debug_assert_eq!(row.v.len(), self.strains);
        self.x.extend_from_slice(&row.x);
        self.v.extend_from_slice(&row.v);
        self.z.push(row.z);
        self.t.push(row.t);
    }

    /// Drops every row after the initial one, keeping the allocations.
    pub(crate) fn truncate_to_initial(&mut self) {
        self.x.truncate(self.strains);
        self.v.truncate(self.strains);
        self.z.truncate(1);
        self.t.truncate(1);
    }

    pub fn snapshot(&self) -> HistorySnapshot<T> {
        HistorySnapshot {
            t: self.t.clone(),
            z: self.z.clone(),
            x: (0..self.strains)
                .filter_map(|strain| self.x_series(strain))
                .collect(),
            v: (0..self.strains)
                .filter_map(|strain| self.v_series(strain))
                .collect(),
        }
    }

    fn view_at(&self, index: usize) -> RowView<'_, T> {
        let range = index * self.strains..(index + 1) * self.strains;
        RowView {
            x: &self.x[range.clone()],
            v: &self.v[range],
            z: self.z[index],
            t: self.t[index],
        }
    }

    fn series(&self, channel: &[T], strain: usize) -> Option<Vec<T>> {
        if strain >= self.strains {
            return None;
        }
        Some(
            channel
                .iter()
                .skip(strain)
                .step_by(self.strains)
                .copied()
                .collect(),
        )
    }
}

/// Column-oriented copy of a history for plotting consumers.
/// `x[i]` and `v[i]` are the full time series of strain `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySnapshot<T> {
    pub t: Vec<T>,
    pub z: Vec<T>,
    pub x: Vec<Vec<T>>,
    pub v: Vec<Vec<T>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(x: &[f64], v: &[f64], z: f64, t: f64) -> StateRow<f64> {
        StateRow::new(x.to_vec(), v.to_vec(), z, t).expect("row")
    }

    #[test]
    fn state_row_rejects_mismatched_strain_counts() {
        let err = StateRow::new(vec![1.0, 2.0], vec![1.0], 0.0, 0.0).expect_err("mismatch");
        assert_eq!(err, ModelError::DimensionMismatch { x: 2, v: 1 });
    }

    #[test]
    fn svi_sums_viral_load() {
        let row = row(&[0.0, 0.0, 0.0], &[1.0, 2.5, -0.5], 0.0, 0.0);
        assert_eq!(row.view().svi(), 3.0);
        assert_eq!(total::<f64>(&[]), 0.0);
    }

    #[test]
    fn history_stores_rows_row_major() {
        let mut history = StrainHistory::new(row(&[1.0, 2.0], &[10.0, 20.0], 5.0, 0.0));
        history.push(row(&[3.0, 4.0], &[30.0, 40.0], 6.0, 0.5));

        assert_eq!(history.len(), 2);
        assert_eq!(history.strains(), 2);
        assert_eq!(history.x_row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(history.v_row(0), Some(&[10.0, 20.0][..]));
        assert_eq!(history.x_series(1), Some(vec![2.0, 4.0]));
        assert_eq!(history.v_series(0), Some(vec![10.0, 30.0]));
        assert_eq!(history.z(), &[5.0, 6.0]);
        assert_eq!(history.times(), &[0.0, 0.5]);
        assert_eq!(history.last_row().z, 6.0);
        assert!(history.row(2).is_none());
        assert!(history.x_series(2).is_none());
    }

    #[test]
    fn truncate_keeps_initial_row_only() {
        let initial = row(&[1.0], &[2.0], 3.0, 4.0);
        let mut history = StrainHistory::new(initial.clone());
        for n in 1..5 {
            history.push(row(&[n as f64], &[n as f64], n as f64, 4.0 + n as f64));
        }
        history.truncate_to_initial();

        assert_eq!(history.len(), 1);
        assert_eq!(history.last_row().to_owned_row(), initial);
    }

    #[test]
    fn zero_strain_history_still_tracks_z_and_t() {
        let mut history = StrainHistory::new(row(&[], &[], 1.0, 0.0));
        history.push(row(&[], &[], 0.5, 1.0));

        assert_eq!(history.len(), 2);
        assert!(history.last_row().x.is_empty());
        assert_eq!(history.z(), &[1.0, 0.5]);
        assert!(history.snapshot().x.is_empty());
    }

    #[test]
    fn snapshot_is_column_oriented() {
        let mut history = StrainHistory::new(row(&[1.0, 2.0], &[3.0, 4.0], 0.0, 0.0));
        history.push(row(&[5.0, 6.0], &[7.0, 8.0], 1.0, 0.1));
        let snapshot = history.snapshot();

        assert_eq!(snapshot.x, vec![vec![1.0, 5.0], vec![2.0, 6.0]]);
        assert_eq!(snapshot.v, vec![vec![3.0, 7.0], vec![4.0, 8.0]]);
        assert_eq!(snapshot.t, vec![0.0, 0.1]);
    }

    #[test]
    fn non_finite_rows_are_detected() {
        assert!(row(&[1.0], &[1.0], 1.0, 0.0).is_finite());
        assert!(!row(&[f64::NAN], &[1.0], 1.0, 0.0).is_finite());
        assert!(!row(&[1.0], &[1.0], f64::INFINITY, 0.0).is_finite());
    }
}
