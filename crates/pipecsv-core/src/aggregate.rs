use std::collections::BTreeMap;

use pipecsv_parser::{OperatorId, RawRecord, RawTable, SummaryRecord};
use tracing::debug;

/// Every row of one input file that shares an operator id, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorGroup {
    id: OperatorId,
    records: Vec<RawRecord>,
}

impl OperatorGroup {
    pub fn id(&self) -> &OperatorId {
        &self.id
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Taken from the first row; other rows are not checked for agreement.
    pub fn business_name(&self) -> &str {
        self.records
            .first()
            .map(|record| record.business_name.as_str())
            .unwrap_or_default()
    }

    /// Sums one numeric column. A missing cell turns the sum into NaN.
    pub fn sum(&self, column: impl Fn(&RawRecord) -> Option<f64>) -> f64 {
        self.records
            .iter()
            .map(|record| column(record).unwrap_or(f64::NAN))
            .sum()
    }

    /// Each row is rescaled on its own before summing, so this is not
    /// `sum(hca) / (sum(percent) / 100)`.
    pub fn pipeline_miles(&self) -> f64 {
        self.records.iter().map(RawRecord::pipeline_miles).sum()
    }

    pub fn summarize(&self) -> SummaryRecord {
        SummaryRecord {
            operator_id: self.id.clone(),
            business_name: self.business_name().to_string(),
            pipeline_miles: self.pipeline_miles(),
            hca_miles: self.sum(|record| record.hca_miles),
            total_assessments: self.sum(|record| record.total_assessments),
            total_hca_repairs: self.sum(|record| record.total_hca_repairs),
        }
    }
}

/// Summary rows for one input file, in ascending operator id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    rows: Vec<SummaryRecord>,
}

impl OutputTable {
    pub fn rows(&self) -> &[SummaryRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Partitions rows by operator id. Groups come back in ascending id order.
pub fn group_by_operator(records: Vec<RawRecord>) -> Vec<OperatorGroup> {
    let mut groups: BTreeMap<OperatorId, Vec<RawRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.operator_id.clone())
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|(id, records)| OperatorGroup { id, records })
        .collect()
}

pub fn aggregate(table: RawTable) -> OutputTable {
    let source = table.source().to_path_buf();
    let groups = group_by_operator(table.into_records());
    debug!(file = %source.display(), groups = groups.len(), "grouped rows by operator");

    OutputTable {
        rows: groups.iter().map(OperatorGroup::summarize).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, hca: f64, percent: f64, assessments: f64, repairs: f64) -> RawRecord {
        RawRecord {
            operator_id: OperatorId::from(id),
            business_name: format!("Operator {id}"),
            hca_miles: Some(hca),
            percent_onshore_miles: Some(percent),
            baseline_miles_completed: Some(0.0),
            reassessment_miles_completed: Some(0.0),
            total_assessments: Some(assessments),
            immediate_repairs: Some(0.0),
            scheduled_repairs: Some(0.0),
            pressure_test_failure_repairs: Some(0.0),
            total_hca_repairs: Some(repairs),
            state_name: "Texas".to_string(),
            pdf_link: String::new(),
        }
    }

    fn summarize(records: Vec<RawRecord>) -> Vec<SummaryRecord> {
        group_by_operator(records)
            .iter()
            .map(OperatorGroup::summarize)
            .collect()
    }

    #[test]
    fn sums_columns_per_operator() {
        let rows = summarize(vec![
            record("A", 10.0, 100.0, 1.0, 0.0),
            record("B", 5.0, 100.0, 4.0, 1.0),
            record("A", 20.0, 100.0, 2.0, 3.0),
        ]);

        assert_eq!(rows.len(), 2);
        let a = &rows[0];
        assert_eq!(a.operator_id.as_str(), "A");
        assert_eq!(a.hca_miles, 30.0);
        assert_eq!(a.total_assessments, 3.0);
        assert_eq!(a.total_hca_repairs, 3.0);

        let b = &rows[1];
        assert_eq!(b.operator_id.as_str(), "B");
        assert_eq!(b.hca_miles, 5.0);
        assert_eq!(b.total_assessments, 4.0);
        assert_eq!(b.total_hca_repairs, 1.0);
    }

    #[test]
    fn pipeline_miles_rescales_each_row_before_summing() {
        let rows = summarize(vec![
            record("A", 50.0, 25.0, 0.0, 0.0),
            record("A", 50.0, 25.0, 0.0, 0.0),
        ]);
        assert_eq!(rows[0].pipeline_miles, 400.0);

        // Mixed percentages separate per-row from aggregate rescaling:
        // 10/0.5 + 30/0.25 = 140, whereas 40/(75/100) would be ~53.3.
        let rows = summarize(vec![
            record("A", 10.0, 50.0, 0.0, 0.0),
            record("A", 30.0, 25.0, 0.0, 0.0),
        ]);
        assert_eq!(rows[0].pipeline_miles, 140.0);
    }

    #[test]
    fn zero_onshore_percentage_yields_infinite_pipeline_miles() {
        let rows = summarize(vec![
            record("A", 12.5, 0.0, 1.0, 0.0),
            record("A", 10.0, 50.0, 1.0, 0.0),
            record("B", 0.0, 0.0, 0.0, 0.0),
        ]);

        assert_eq!(rows[0].pipeline_miles, f64::INFINITY);
        assert_eq!(rows[0].hca_miles, 22.5);
        assert!(rows[1].pipeline_miles.is_nan());
    }

    #[test]
    fn missing_values_propagate_as_nan() {
        let mut sparse = record("A", 10.0, 50.0, 1.0, 1.0);
        sparse.total_assessments = None;
        sparse.hca_miles = None;
        let rows = summarize(vec![sparse, record("A", 10.0, 50.0, 2.0, 2.0)]);

        assert!(rows[0].hca_miles.is_nan());
        assert!(rows[0].pipeline_miles.is_nan());
        assert!(rows[0].total_assessments.is_nan());
        assert_eq!(rows[0].total_hca_repairs, 3.0);
    }

    #[test]
    fn business_name_comes_from_first_row_in_group() {
        let mut first = record("7", 1.0, 100.0, 0.0, 0.0);
        first.business_name = "Original Name".to_string();
        let mut renamed = record("7", 1.0, 100.0, 0.0, 0.0);
        renamed.business_name = "Renamed Later".to_string();

        let rows = summarize(vec![first, renamed]);
        assert_eq!(rows[0].business_name, "Original Name");
    }

    #[test]
    fn groups_every_operator_exactly_once_in_ascending_id_order() {
        let records = vec![
            record("100", 1.0, 100.0, 0.0, 0.0),
            record("9", 1.0, 100.0, 0.0, 0.0),
            record("100", 1.0, 100.0, 0.0, 0.0),
            record("25", 1.0, 100.0, 0.0, 0.0),
            record("9", 1.0, 100.0, 0.0, 0.0),
        ];
        let groups = group_by_operator(records);

        let ids: Vec<&str> = groups.iter().map(|group| group.id().as_str()).collect();
        assert_eq!(ids, ["9", "25", "100"]);
        assert_eq!(groups.iter().map(|g| g.records().len()).sum::<usize>(), 5);
        assert!(groups.iter().all(|g| !g.records().is_empty()));
    }
}
