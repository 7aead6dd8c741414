use std::{fmt, io, path::Path};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ReportError, Result};

/// Suffix stripped from a speedup column name to get the implementation name
pub const SPEEDUP_SUFFIX: &str = " Speedup";

/// One measured run, as written to the speedup table by the benchmark harness.
///
/// Identifying values are whole numbers; `1000.0` is accepted as `1000`.
/// Speedups that were empty or not numeric in the table are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRow {
    pub pixel_count: u64,
    pub kernel_size: u32,
    pub clusters: u32,
    pub threads: u32,
    pub multithreaded_speedup: Option<f64>,
    pub distributed_speedup: Option<f64>,
    pub shared_speedup: Option<f64>,
}

/// A table row as read. Columns are matched by header name, so their order
/// does not matter and additional columns (`Serial Speedup`,
/// `Task Pool Speedup`, ...) are ignored. Every cell may be missing, but every
/// column must be present.
#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(rename = "Pixel Count", deserialize_with = "csv::invalid_option")]
    pixel_count: Option<f64>,
    #[serde(rename = "Kernel Size", deserialize_with = "csv::invalid_option")]
    kernel_size: Option<f64>,
    #[serde(rename = "Clusters", deserialize_with = "csv::invalid_option")]
    clusters: Option<f64>,
    #[serde(rename = "Threads", deserialize_with = "csv::invalid_option")]
    threads: Option<f64>,
    #[serde(
        rename = "Multithreaded Speedup",
        deserialize_with = "csv::invalid_option"
    )]
    multithreaded_speedup: Option<f64>,
    #[serde(
        rename = "Distributed Speedup",
        deserialize_with = "csv::invalid_option"
    )]
    distributed_speedup: Option<f64>,
    #[serde(rename = "Shared Speedup", deserialize_with = "csv::invalid_option")]
    shared_speedup: Option<f64>,
}

impl TableRow {
    /// `None` when an identifying value is missing or not a whole number.
    fn into_row(self) -> Option<BenchmarkRow> {
        Some(BenchmarkRow {
            pixel_count: whole(self.pixel_count)?,
            kernel_size: whole(self.kernel_size)?,
            clusters: whole(self.clusters)?,
            threads: whole(self.threads)?,
            multithreaded_speedup: self.multithreaded_speedup,
            distributed_speedup: self.distributed_speedup,
            shared_speedup: self.shared_speedup,
        })
    }
}

fn whole<T: TryFrom<u64>>(value: Option<f64>) -> Option<T> {
    value
        .filter(|x| x.is_finite() && *x >= 0.0 && x.fract() == 0.0 && *x <= u64::MAX as f64)
        .and_then(|x| T::try_from(x as u64).ok())
}

impl BenchmarkRow {
    pub fn speedup(&self, implementation: Implementation) -> Option<f64> {
        let value = match implementation {
            Implementation::Multithreaded => self.multithreaded_speedup,
            Implementation::Distributed => self.distributed_speedup,
            Implementation::Shared => self.shared_speedup,
        };
        value.filter(|x| !x.is_nan())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Implementation {
    Multithreaded,
    Distributed,
    Shared,
}

impl Implementation {
    /// Declared order, which is also the order of the speedup columns
    pub const ALL: [Implementation; 3] = [
        Implementation::Multithreaded,
        Implementation::Distributed,
        Implementation::Shared,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Implementation::Multithreaded => "Multithreaded Speedup",
            Implementation::Distributed => "Distributed Speedup",
            Implementation::Shared => "Shared Speedup",
        }
    }

    pub fn name(&self) -> &'static str {
        let column = self.column();
        column.strip_suffix(SPEEDUP_SUFFIX).unwrap_or(column)
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single speedup measurement of one implementation, in long form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub pixel_count: u64,
    pub kernel_size: u32,
    pub clusters: u32,
    pub threads: u32,
    pub implementation: Implementation,
    pub speedup: Option<f64>,
}

impl SeriesPoint {
    fn from_row(row: &BenchmarkRow, implementation: Implementation) -> Self {
        Self {
            pixel_count: row.pixel_count,
            kernel_size: row.kernel_size,
            clusters: row.clusters,
            threads: row.threads,
            implementation,
            speedup: row.speedup(implementation),
        }
    }
}

/// Reads the benchmark table at `path`, rows in file order.
pub fn load(path: &Path) -> Result<Vec<BenchmarkRow>> {
    if !path.exists() {
        return Err(ReportError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let file = std::fs::File::open(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_reader(file, path)
}

/// Parses a benchmark table from `reader`; `origin` only labels errors.
///
/// A missing column is fatal. Rows whose pixel count, kernel size, clusters or
/// threads are missing cannot be placed on any chart and are skipped.
pub fn load_from_reader<R: io::Read>(reader: R, origin: &Path) -> Result<Vec<BenchmarkRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<TableRow>().enumerate() {
        let record = record.map_err(|source| ReportError::MalformedInput {
            path: origin.to_path_buf(),
            source,
        })?;
        match record.into_row() {
            Some(row) => rows.push(row),
            None => warn!(
                "Skipping row {} of {}: missing or non-integer pixel count, kernel size, clusters or threads",
                idx + 1,
                origin.display()
            ),
        }
    }
    debug!("Loaded {} rows from {}", rows.len(), origin.display());
    Ok(rows)
}

/// Melts the three speedup columns into one point per row and column.
///
/// Points are emitted column by column: every row's multithreaded point, then
/// every distributed point, then every shared point.
pub fn unpivot(rows: &[BenchmarkRow]) -> Vec<SeriesPoint> {
    Implementation::ALL
        .into_iter()
        .flat_map(|implementation| {
            rows.iter()
                .map(move |row| SeriesPoint::from_row(row, implementation))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_matches};
    use pretty_assertions::assert_eq;

    const TABLE: &str = "\
Pixel Count,Kernel Size,Clusters,Threads,Serial Speedup,Multithreaded Speedup,Distributed Speedup,Shared Speedup,Task Pool Speedup
1000,3,2,4,1.000000,1.500000,1.200000,1.800000,0.000000
2000,3,2,4,1.000000,2.000000,,2.400000,0.000000
";

    fn row(pixel_count: u64, kernel_size: u32, clusters: u32, threads: u32) -> BenchmarkRow {
        BenchmarkRow {
            pixel_count,
            kernel_size,
            clusters,
            threads,
            multithreaded_speedup: Some(1.0),
            distributed_speedup: Some(2.0),
            shared_speedup: Some(3.0),
        }
    }

    #[test]
    fn loads_harness_table_ignoring_extra_columns() {
        let rows = load_from_reader(TABLE.as_bytes(), Path::new("table.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            BenchmarkRow {
                pixel_count: 1000,
                kernel_size: 3,
                clusters: 2,
                threads: 4,
                multithreaded_speedup: Some(1.5),
                distributed_speedup: Some(1.2),
                shared_speedup: Some(1.8),
            }
        );
        assert_eq!(rows[1].distributed_speedup, None);
    }

    #[test]
    fn column_order_does_not_matter() {
        let table = "Threads , Shared Speedup,Clusters,Distributed Speedup,Multithreaded Speedup,Kernel Size,Pixel Count\n\
                     8, 2.5 ,1,1.1,3.0,5,640\n";
        let rows = load_from_reader(table.as_bytes(), Path::new("t.csv")).unwrap();
        assert_eq!(rows[0].threads, 8);
        assert_eq!(rows[0].shared_speedup, Some(2.5));
        assert_eq!(rows[0].pixel_count, 640);
    }

    #[test]
    fn unparsable_speedup_is_missing() {
        let table = "Pixel Count,Kernel Size,Clusters,Threads,Multithreaded Speedup,Distributed Speedup,Shared Speedup\n\
                     10,3,1,1,n/a,nan,1.0\n";
        let rows = load_from_reader(table.as_bytes(), Path::new("t.csv")).unwrap();
        assert_eq!(rows[0].multithreaded_speedup, None);
        assert_eq!(rows[0].speedup(Implementation::Distributed), None);
        assert_eq!(rows[0].speedup(Implementation::Shared), Some(1.0));
    }

    #[test]
    fn missing_column_is_malformed() {
        let table = "Pixel Count,Kernel Size,Clusters,Multithreaded Speedup,Distributed Speedup,Shared Speedup\n\
                     10,3,1,1.0,1.0,1.0\n";
        let err = assert_err!(load_from_reader(table.as_bytes(), Path::new("t.csv")));
        assert_matches!(err, ReportError::MalformedInput { .. });
    }

    #[test]
    fn rows_without_group_key_are_skipped() {
        let table = "Pixel Count,Kernel Size,Clusters,Threads,Multithreaded Speedup,Distributed Speedup,Shared Speedup\n\
                     1000,3,2,4,1.5,1.2,1.8\n\
                     2000,3,2,,2.0,1.6,2.4\n\
                     ,3,2,4,2.0,1.6,2.4\n";
        let rows = load_from_reader(table.as_bytes(), Path::new("t.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pixel_count, 1000);
        assert_eq!((rows[0].clusters, rows[0].threads), (2, 4));
    }

    #[test]
    fn whole_floats_are_accepted_fractions_are_not() {
        let table = "Pixel Count,Kernel Size,Clusters,Threads,Multithreaded Speedup,Distributed Speedup,Shared Speedup\n\
                     1000.0,3.0,2,4,1.5,1.2,1.8\n\
                     1000.5,3,2,4,1.5,1.2,1.8\n\
                     1000,3,-2,4,1.5,1.2,1.8\n";
        let rows = load_from_reader(table.as_bytes(), Path::new("t.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].pixel_count, rows[0].kernel_size), (1000, 3));
    }

    #[test]
    fn missing_file_is_reported_before_reading() {
        let err = assert_err!(load(Path::new("does/not/exist.csv")));
        assert_matches!(err, ReportError::MissingInput { .. });
        assert_eq!(err.to_string(), "does/not/exist.csv not found.");
    }

    #[test]
    fn implementation_names_strip_suffix() {
        let names: Vec<_> = Implementation::ALL.iter().map(|x| x.name()).collect();
        assert_eq!(names, vec!["Multithreaded", "Distributed", "Shared"]);
        assert_eq!(Implementation::Shared.to_string(), "Shared");
    }

    #[test]
    fn unpivot_emits_three_points_per_row() {
        let rows = vec![row(100, 3, 1, 2), row(200, 5, 1, 2), row(300, 3, 2, 4)];
        let points = unpivot(&rows);
        assert_eq!(points.len(), 3 * rows.len());
        for point in &points {
            assert!(rows.iter().any(|r| {
                (r.pixel_count, r.kernel_size, r.clusters, r.threads)
                    == (point.pixel_count, point.kernel_size, point.clusters, point.threads)
            }));
        }
        let order: Vec<_> = points.iter().map(|p| p.implementation).collect();
        assert_eq!(&order[..3], &[Implementation::Multithreaded; 3]);
        assert_eq!(&order[3..6], &[Implementation::Distributed; 3]);
        assert_eq!(&order[6..], &[Implementation::Shared; 3]);
        assert_eq!(points[4].speedup, Some(2.0));
    }

    #[test]
    fn unpivot_of_nothing_is_empty() {
        assert!(unpivot(&[]).is_empty());
    }
}
