use std::{borrow::Cow, collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{FuelMixError, Result};

/// Table of named numeric series sharing one ordered index.
///
/// Values are stored column-major: `series[c][r]` is the value of column `c`
/// at row `r`. Every invariant is checked once, when the snapshot is built,
/// so downstream code can index without re-validating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct Snapshot {
    index: Vec<String>,
    columns: Vec<String>,
    series: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    index: Vec<String>,
    columns: Vec<String>,
    series: Vec<Vec<f64>>,
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = FuelMixError;

    fn try_from(raw: RawSnapshot) -> Result<Self> {
        Snapshot::new(raw.index, raw.columns, raw.series)
    }
}

impl Snapshot {
    /// Builds a snapshot, rejecting ragged, duplicated or non-finite data.
    pub fn new(index: Vec<String>, columns: Vec<String>, series: Vec<Vec<f64>>) -> Result<Self> {
        if index.is_empty() {
            return Err(FuelMixError::InvalidSnapshot(
                "snapshot has no rows".to_string(),
            ));
        }
        if columns.is_empty() {
            return Err(FuelMixError::InvalidSnapshot(
                "snapshot has no columns".to_string(),
            ));
        }
        if let Some(name) = first_duplicate(&columns) {
            return Err(FuelMixError::InvalidSnapshot(format!(
                "column `{name}` appears more than once"
            )));
        }
        if series.len() != columns.len() {
            return Err(FuelMixError::InvalidSnapshot(format!(
                "{} columns but {} series",
                columns.len(),
                series.len()
            )));
        }

        for (name, values) in columns.iter().zip(&series) {
            if values.len() != index.len() {
                return Err(FuelMixError::InvalidSnapshot(format!(
                    "column `{name}` has {} values for {} index rows",
                    values.len(),
                    index.len()
                )));
            }
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(FuelMixError::InvalidSnapshot(format!(
                    "column `{name}` holds a non-finite value at row {row} (`{}`)",
                    index[row]
                )));
            }
        }

        Ok(Self {
            index,
            columns,
            series,
        })
    }

    /// Builds a snapshot from `(column, values)` pairs, keeping their order.
    pub fn from_columns<I, S>(index: Vec<String>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let (names, series): (Vec<String>, Vec<Vec<f64>>) = columns
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .unzip();
        Self::new(index, names, series)
    }

    pub fn rows(&self) -> usize {
        self.index.len()
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the values of the named column.
    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.column_position(name)
            .map(|position| self.series[position].as_slice())
    }

    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.series
            .get(column)
            .and_then(|values| values.get(row))
            .copied()
    }

    /// Height of the stacked chart at every row.
    pub fn row_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.rows()];
        for values in &self.series {
            for (total, value) in totals.iter_mut().zip(values) {
                *total += value;
            }
        }
        totals
    }

    pub fn max_total(&self) -> f64 {
        self.row_totals()
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Reorders the columns to `order`.
    ///
    /// Borrows `self` when it is already in that order. Any column missing
    /// from either side is reported by name; nothing is defaulted.
    pub fn realign_to(&self, order: &[String], label: &str) -> Result<Cow<'_, Snapshot>> {
        if self.columns == order {
            return Ok(Cow::Borrowed(self));
        }
        if let Some(name) = first_duplicate(order) {
            return Err(FuelMixError::InvalidSnapshot(format!(
                "column order for `{label}` lists `{name}` more than once"
            )));
        }

        let missing: Vec<String> = order
            .iter()
            .filter(|name| self.column_position(name).is_none())
            .cloned()
            .collect();
        let extra: Vec<String> = self
            .columns
            .iter()
            .filter(|name| !order.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(FuelMixError::ColumnMismatch {
                label: label.to_string(),
                missing,
                extra,
            });
        }

        let series: Vec<Vec<f64>> = order
            .iter()
            .filter_map(|name| self.series(name).map(<[f64]>::to_vec))
            .collect();

        Ok(Cow::Owned(Snapshot {
            index: self.index.clone(),
            columns: order.to_vec(),
            series,
        }))
    }

    /// Pointwise convex combination `(1 - alpha) * self + alpha * other`.
    ///
    /// Both snapshots must share column order and row count; the result keeps
    /// `self`'s index and column labels.
    pub fn blend(&self, other: &Snapshot, alpha: f64) -> Result<Snapshot> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(FuelMixError::timing(
                "blend fraction",
                format!("must lie in [0, 1], got {alpha}"),
            ));
        }
        if self.columns != other.columns {
            return Err(FuelMixError::ShapeMismatch {
                left: self.columns.join(", "),
                right: other.columns.join(", "),
                detail: "column order differs".to_string(),
            });
        }
        if self.rows() != other.rows() {
            return Err(FuelMixError::ShapeMismatch {
                left: format!("{} rows", self.rows()),
                right: format!("{} rows", other.rows()),
                detail: "row counts differ".to_string(),
            });
        }

        let series: Vec<Vec<f64>> = self
            .series
            .iter()
            .zip(&other.series)
            .map(|(a, b)| {
                a.iter()
                    .zip(b)
                    .map(|(&a, &b)| convex_blend(a, b, alpha))
                    .collect::<Vec<f64>>()
            })
            .collect();

        Ok(Snapshot {
            index: self.index.clone(),
            columns: self.columns.clone(),
            series,
        })
    }
}

/// `(1 - alpha) * a + alpha * b`, kept inside `[min(a, b), max(a, b)]` so
/// rounding never pushes a value past its endpoints.
#[inline]
fn convex_blend(a: f64, b: f64, alpha: f64) -> f64 {
    ((1.0 - alpha) * a + alpha * b).clamp(a.min(b), a.max(b))
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .map(String::as_str)
}

/// One labelled input to the sequencer: a snapshot, the order its series are
/// stacked in, and the title shown while it is on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    label: String,
    order: Vec<String>,
    snapshot: Snapshot,
}

#[derive(Deserialize)]
struct RawPeriod {
    label: String,
    #[serde(default)]
    order: Option<Vec<String>>,
    snapshot: Snapshot,
}

impl TryFrom<RawPeriod> for Period {
    type Error = FuelMixError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        match raw.order {
            Some(order) => Period::with_order(raw.label, raw.snapshot, order),
            None => Ok(Period::new(raw.label, raw.snapshot)),
        }
    }
}

impl Period {
    /// Period stacked in the snapshot's own column order.
    pub fn new(label: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            label: label.into(),
            order: snapshot.columns().to_vec(),
            snapshot,
        }
    }

    /// Period with an explicit stacking order, which must name exactly the
    /// snapshot's columns.
    pub fn with_order(
        label: impl Into<String>,
        snapshot: Snapshot,
        order: Vec<String>,
    ) -> Result<Self> {
        let label = label.into();
        let snapshot = if snapshot.columns() == order.as_slice() {
            snapshot
        } else {
            snapshot.realign_to(&order, &label)?.into_owned()
        };
        Ok(Self {
            label,
            order,
            snapshot,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// The snapshot, already arranged in [`Period::order`].
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }
}

/// Ordered periods as handed over by the data-preparation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodManifest {
    pub periods: Vec<Period>,
}

impl PeriodManifest {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Series making up the CAISO fuel-mix stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelSource {
    Nuclear,
    Wind,
    Solar,
    #[serde(rename = "Battery Discharge")]
    BatteryDischarge,
    #[serde(rename = "Battery Charge")]
    BatteryCharge,
    Imports,
    Hydro,
    Gas,
}

impl FuelSource {
    /// Bottom-to-top stacking order used by the fuel-mix charts.
    pub const STACK_ORDER: [FuelSource; 8] = [
        FuelSource::Nuclear,
        FuelSource::Wind,
        FuelSource::Solar,
        FuelSource::BatteryDischarge,
        FuelSource::BatteryCharge,
        FuelSource::Imports,
        FuelSource::Hydro,
        FuelSource::Gas,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FuelSource::Nuclear => "Nuclear",
            FuelSource::Wind => "Wind",
            FuelSource::Solar => "Solar",
            FuelSource::BatteryDischarge => "Battery Discharge",
            FuelSource::BatteryCharge => "Battery Charge",
            FuelSource::Imports => "Imports",
            FuelSource::Hydro => "Hydro",
            FuelSource::Gas => "Gas",
        }
    }

    pub fn default_colour(self) -> &'static str {
        match self {
            FuelSource::Nuclear => "#B3E5FC",
            FuelSource::Wind => "#90CAF9",
            FuelSource::Solar => "#FFE082",
            FuelSource::BatteryDischarge => "#FB8C00",
            FuelSource::BatteryCharge => "#FFB74D",
            FuelSource::Imports => "#CFD8DC",
            FuelSource::Hydro => "#64B5F6",
            FuelSource::Gas => "#B0BEC5",
        }
    }
}
