//! Numeric tables indexed by subject, domain and category.
//!
//! One row per example, a header naming every column, leading index columns
//! and numeric feature columns after them. The table is read whole, sorted
//! by its composite index, checked for a balanced design and reshaped into
//! an array with one axis per index level plus a trailing feature axis.

use std::{collections::BTreeSet, io::Read, path::Path};

use ndarray::{ArrayD, IxDyn};
use ordered_float::OrderedFloat;

use crate::error::Error;

/// Value of one index level, ordered numerically when the whole level is
/// numeric and lexicographically otherwise. Empty cells sort last and are
/// not counted as a level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum LevelValue {
    Number(OrderedFloat<f64>),
    Text(String),
    Missing,
}

struct Row {
    key: Vec<String>,
    values: Vec<f64>,
}

/// Reads a comma separated file into an array of shape
/// `(n_level_1, ..., n_level_k, n_features)`.
///
/// `index_col` names the composite index columns, outermost first (subject,
/// domain, then category).
pub fn read_csv_tabular(
    csv_path: impl AsRef<Path>,
    index_col: &[&str],
) -> Result<ArrayD<f64>, Error> {
    let csv_path = csv_path.as_ref();
    log::debug!("Reading table {}", csv_path.display());
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)?;
    read_tabular(reader, index_col)
}

/// Same as [`read_csv_tabular`] for any comma separated source.
pub fn read_csv_tabular_from<R: Read>(
    source: R,
    index_col: &[&str],
) -> Result<ArrayD<f64>, Error> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    read_tabular(reader, index_col)
}

fn read_tabular<R: Read>(
    mut reader: csv::Reader<R>,
    index_col: &[&str],
) -> Result<ArrayD<f64>, Error> {
    let headers = reader.headers()?.clone();
    let index_positions = index_col
        .iter()
        .map(|&name| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::MissingIndexColumn(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let feature_positions: Vec<usize> = (0..headers.len())
        .filter(|i| !index_positions.contains(i))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let key = index_positions
            .iter()
            .map(|&i| record.get(i).unwrap_or_default().to_string())
            .collect();
        let values = feature_positions
            .iter()
            .map(|&i| {
                let cell = record.get(i).unwrap_or_default();
                parse_feature(cell).ok_or_else(|| Error::ParseFeature {
                    line,
                    column: headers.get(i).unwrap_or_default().to_string(),
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(Row { key, values });
    }
    if rows.is_empty() {
        return Err(Error::EmptyTable);
    }

    let keys = level_values(&rows, index_col.len());
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

    let counts = distinct_counts(&keys, index_col.len());
    if counts.iter().any(|&count| count != counts[0]) {
        let diagnostics = index_col
            .iter()
            .map(|name| name.to_string())
            .zip(counts)
            .collect();
        return Err(Error::UnbalancedDesign(diagnostics));
    }

    let n_features = feature_positions.len();
    let mut dims = counts;
    dims.push(n_features);

    let data: Vec<f64> = order
        .into_iter()
        .flat_map(|i| rows[i].values.iter().copied())
        .collect();
    Ok(ArrayD::from_shape_vec(IxDyn(&dims), data)?)
}

fn parse_feature(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

/// Typed sort keys, one per row. A level is numeric only if every one of
/// its non-empty values parses as a number.
fn level_values(rows: &[Row], levels: usize) -> Vec<Vec<LevelValue>> {
    let numeric: Vec<bool> = (0..levels)
        .map(|level| {
            rows.iter()
                .map(|row| &row.key[level])
                .all(|value| value.is_empty() || value.parse::<f64>().is_ok())
        })
        .collect();

    rows.iter()
        .map(|row| {
            row.key
                .iter()
                .zip(&numeric)
                .map(|(value, &is_numeric)| match value.parse::<f64>() {
                    _ if value.is_empty() => LevelValue::Missing,
                    Ok(number) if is_numeric => LevelValue::Number(OrderedFloat(number)),
                    _ => LevelValue::Text(value.clone()),
                })
                .collect()
        })
        .collect()
}

fn distinct_counts(keys: &[Vec<LevelValue>], levels: usize) -> Vec<usize> {
    (0..levels)
        .map(|level| {
            keys.iter()
                .map(|key| &key[level])
                .filter(|value| **value != LevelValue::Missing)
                .collect::<BTreeSet<_>>()
                .len()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_levels_sort_by_value() {
        let rows = vec![
            Row { key: vec!["10".into()], values: vec![3.0] },
            Row { key: vec!["9".into()], values: vec![2.0] },
        ];
        let keys = level_values(&rows, 1);
        assert!(keys[1] < keys[0]);
    }

    #[test]
    fn mixed_level_falls_back_to_text() {
        let rows = vec![
            Row { key: vec!["10".into()], values: vec![] },
            Row { key: vec!["b".into()], values: vec![] },
            Row { key: vec!["9".into()], values: vec![] },
        ];
        let keys = level_values(&rows, 1);
        assert!(keys.iter().all(|k| matches!(k[0], LevelValue::Text(_))));
        assert!(keys[0] < keys[2]);
    }

    #[test]
    fn numerically_equal_values_count_once() {
        let rows = vec![
            Row { key: vec!["1".into()], values: vec![] },
            Row { key: vec!["1.0".into()], values: vec![] },
        ];
        let keys = level_values(&rows, 1);
        assert_eq!(distinct_counts(&keys, 1), vec![1]);
    }

    #[test]
    fn empty_index_cells_are_not_a_level() {
        let rows = vec![
            Row { key: vec!["2".into()], values: vec![] },
            Row { key: vec!["".into()], values: vec![] },
            Row { key: vec!["1".into()], values: vec![] },
        ];
        let keys = level_values(&rows, 1);
        assert_eq!(distinct_counts(&keys, 1), vec![2]);
        assert!(matches!(keys[0][0], LevelValue::Number(_)));
        assert!(keys[1] > keys[0]);
    }

    #[test]
    fn missing_subject_unbalances_the_design() {
        let csv = "subject,domain,category,f\n1,A,x,0.5\n,B,y,1.5\n";
        let err =
            read_csv_tabular_from(csv.as_bytes(), &["subject", "domain", "category"]).unwrap_err();
        match err {
            Error::UnbalancedDesign(counts) => assert_eq!(
                counts,
                vec![
                    ("subject".to_string(), 1),
                    ("domain".to_string(), 2),
                    ("category".to_string(), 2),
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_cell_reads_as_nan() {
        assert!(parse_feature("").unwrap().is_nan());
        assert_eq!(parse_feature("2.5"), Some(2.5));
        assert_eq!(parse_feature("abc"), None);
    }

    #[test]
    fn header_only_table_is_empty() {
        let err = read_csv_tabular_from("s,d,c,f\n".as_bytes(), &["s", "d", "c"]).unwrap_err();
        assert!(matches!(err, Error::EmptyTable));
    }
}
