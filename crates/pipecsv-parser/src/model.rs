use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

/// Grouping key for aggregation.
///
/// Ids that parse as integers sort numerically and ahead of any other id;
/// everything else sorts as text. Two numerically equal ids with different
/// spellings (`007` and `7`) stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(String);

impl OperatorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for OperatorId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for OperatorId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OperatorId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One inspection row. Empty numeric cells load as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Operator ID")]
    pub operator_id: OperatorId,
    #[serde(rename = "Operator Business Name")]
    pub business_name: String,
    #[serde(rename = "HCA Miles")]
    pub hca_miles: Option<f64>,
    #[serde(rename = "% Total Onshore Miles")]
    pub percent_onshore_miles: Option<f64>,
    #[serde(rename = "Baseline Miles Completed in Year")]
    pub baseline_miles_completed: Option<f64>,
    #[serde(rename = "Reassessment Miles Completed in Year")]
    pub reassessment_miles_completed: Option<f64>,
    #[serde(rename = "Total Assessments Completed in Year")]
    pub total_assessments: Option<f64>,
    #[serde(rename = "HCA Immediate Repairs")]
    pub immediate_repairs: Option<f64>,
    #[serde(rename = "HCA Scheduled Repairs")]
    pub scheduled_repairs: Option<f64>,
    #[serde(rename = "HCA Pressure Test Failure Repairs")]
    pub pressure_test_failure_repairs: Option<f64>,
    #[serde(rename = "Total HCA Repairs")]
    pub total_hca_repairs: Option<f64>,
    #[serde(rename = "State Name")]
    pub state_name: String,
    #[serde(rename = "Pdf Link")]
    pub pdf_link: String,
}

impl RawRecord {
    /// HCA miles rescaled to the row's full onshore mileage.
    ///
    /// A zero percentage is not guarded: the result is infinite (or NaN for
    /// `0 / 0`). A missing operand yields NaN.
    pub fn pipeline_miles(&self) -> f64 {
        let hca = self.hca_miles.unwrap_or(f64::NAN);
        let percent = self.percent_onshore_miles.unwrap_or(f64::NAN);
        hca / (percent / 100.0)
    }
}

/// All rows of one validated input file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    source: PathBuf,
    records: Vec<RawRecord>,
}

impl RawTable {
    pub(crate) fn new(source: PathBuf, records: Vec<RawRecord>) -> Self {
        Self { source, records }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }
}

/// One output row per operator; field order is the export column order.
///
/// NaN sums are written as empty cells. Count columns holding whole numbers
/// are written without a fractional part.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    #[serde(rename = "Operator ID")]
    pub operator_id: OperatorId,
    #[serde(rename = "Operator Business Name")]
    pub business_name: String,
    #[serde(rename = "Pipeline Miles", serialize_with = "serialize_miles")]
    pub pipeline_miles: f64,
    #[serde(rename = "HCA Miles", serialize_with = "serialize_miles")]
    pub hca_miles: f64,
    #[serde(
        rename = "Total Assessments Completed in Year",
        serialize_with = "serialize_count"
    )]
    pub total_assessments: f64,
    #[serde(rename = "Total HCA Repairs", serialize_with = "serialize_count")]
    pub total_hca_repairs: f64,
}

// Largest magnitude below which every f64 integer is exact.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn serialize_miles<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_f64(*value)
    }
}

fn serialize_count<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serialize_miles(value, serializer)
    }
}
