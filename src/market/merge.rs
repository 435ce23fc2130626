use std::cmp::Ordering;
use std::collections::HashMap;

use super::model::{MoverRecord, RawRow};
use super::symbol::normalize;

/// Merge the gainers and most-active tables into one record per canonical symbol.
///
/// Rows are visited gainers first. For a symbol seen twice, `pct` keeps the
/// larger value (missing counts as 0) and the other fields take the later
/// row's value when it has one. The result is in canonical pool order.
pub fn merge(gainers: &[RawRow], active: &[RawRow]) -> Vec<MoverRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<MoverRecord> = Vec::new();

    for row in gainers.iter().chain(active) {
        let key = normalize(&row.symbol);
        match index.get(&key) {
            Some(&at) => {
                let existing = &mut records[at];
                existing.pct = existing.pct.max(row.pct.unwrap_or(0.0));
                existing.price = row.price.or(existing.price);
                existing.volume = row.volume.or(existing.volume);
                existing.turnover = row.turnover.or(existing.turnover);
            }
            None => {
                index.insert(key.clone(), records.len());
                records.push(MoverRecord {
                    symbol: key,
                    pct: row.pct.unwrap_or(0.0),
                    price: row.price,
                    volume: row.volume,
                    turnover: row.turnover,
                    ..Default::default()
                });
            }
        }
    }

    sort_by_activity(&mut records);
    records
}

/// Canonical pool order: volume desc (missing last), then pct desc. Stable.
pub fn sort_by_activity(records: &mut [MoverRecord]) {
    records.sort_by(compare_activity);
}

pub(crate) fn compare_activity(a: &MoverRecord, b: &MoverRecord) -> Ordering {
    desc_missing_last(a.volume, b.volume).then_with(|| b.pct.total_cmp(&a.pct))
}

/// Descending order over optional values with `None` after every value
pub(crate) fn desc_missing_last<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn row(symbol: &str, pct: Option<f64>, volume: Option<u64>) -> RawRow {
        RawRow {
            symbol: symbol.to_string(),
            pct,
            volume,
            ..Default::default()
        }
    }

    fn symbols(records: &[MoverRecord]) -> BTreeSet<String> {
        records.iter().map(|r| r.symbol.clone()).collect()
    }

    #[test]
    fn test_merge_collapses_suffix_variants() {
        let gainers = vec![row("XYZ.N2024", Some(4.0), None)];
        let active = vec![row("XYZ.N", Some(6.0), Some(500))];

        let merged = merge(&gainers, &active);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].symbol, "XYZ.N");
        assert_eq!(merged[0].pct, 6.0);
        assert_eq!(merged[0].volume, Some(500));
    }

    #[test]
    fn test_merge_keeps_defined_fields() {
        let gainers = vec![RawRow {
            symbol: "ABC.N0000".to_string(),
            pct: Some(7.5),
            price: Some(12.0),
            volume: Some(1_000),
            turnover: Some(12_000.0),
        }];
        let active = vec![RawRow {
            symbol: "ABC.N".to_string(),
            pct: None,
            price: None,
            volume: Some(2_000),
            turnover: None,
        }];

        let merged = merge(&gainers, &active);

        assert_eq!(merged.len(), 1);
        let record = &merged[0];
        assert_eq!(record.pct, 7.5);
        assert_eq!(record.price, Some(12.0));
        assert_eq!(record.volume, Some(2_000));
        assert_eq!(record.turnover, Some(12_000.0));
        assert!(record.low_float.is_none());
    }

    #[test]
    fn test_merge_missing_pct_counts_as_zero_in_max() {
        let gainers = vec![row("NEG.N", Some(-3.0), None)];
        let active = vec![row("NEG.N0000", None, Some(10))];

        let merged = merge(&gainers, &active);
        assert_eq!(merged[0].pct, 0.0);

        let merged = merge(&gainers, &[]);
        assert_eq!(merged[0].pct, -3.0);
    }

    #[test]
    fn test_merge_orders_by_volume_then_pct() {
        let gainers = vec![
            row("LOW.N", Some(9.0), Some(10)),
            row("NOVOL.N", Some(20.0), None),
            row("TIE1.N", Some(2.0), Some(500)),
        ];
        let active = vec![row("TIE2.N", Some(5.0), Some(500)), row("TOP.N", Some(1.0), Some(9_000))];

        let merged = merge(&gainers, &active);
        let order: Vec<&str> = merged.iter().map(|r| r.symbol.as_str()).collect();

        assert_eq!(order, vec!["TOP.N", "TIE2.N", "TIE1.N", "LOW.N", "NOVOL.N"]);
    }

    #[test]
    fn test_merge_never_drops_rows() {
        let gainers = vec![row("A.N", None, None), row("B.N", Some(1.0), None)];
        let active = vec![row("C.N", None, Some(1))];

        assert_eq!(merge(&gainers, &active).len(), 3);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let rows = vec![
            row("A.N0000", Some(3.0), Some(100)),
            row("B.N", Some(-1.0), Some(300)),
            row("A.N", Some(2.0), None),
        ];

        let once = merge(&rows, &[]);
        let twice = merge(&rows, &rows);

        assert_eq!(symbols(&once), symbols(&twice));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_symbol_set_is_commutative() {
        let gainers = vec![row("A.N", Some(5.0), Some(1)), row("B.N0000", Some(4.0), None)];
        let active = vec![row("B.N", Some(1.0), Some(9)), row("C.N", None, Some(3))];

        assert_eq!(
            symbols(&merge(&gainers, &active)),
            symbols(&merge(&active, &gainers))
        );
    }

    #[test]
    fn test_merge_empty_tables() {
        assert!(merge(&[], &[]).is_empty());
    }
}
