//! CSV loading and writing of object tables.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::matcher::Assignment;
use crate::record::{CoordinateRounding, ObjectRecord, RawRecord};

fn default_id() -> String {
    "Number".to_string()
}

fn default_intensity() -> String {
    "channel1_mean".to_string()
}

fn default_x() -> String {
    "xmean".to_string()
}

fn default_y() -> String {
    "ymean".to_string()
}

/// Names of the required columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    #[serde(default = "default_id")]
    pub id: String,
    #[serde(default = "default_intensity")]
    pub intensity: String,
    #[serde(default = "default_x")]
    pub x: String,
    #[serde(default = "default_y")]
    pub y: String,
}

impl Default for TableColumns {
    fn default() -> Self {
        Self {
            id: default_id(),
            intensity: default_intensity(),
            x: default_x(),
            y: default_y(),
        }
    }
}

/// Column positions resolved against a header row.
struct ColumnIndex {
    id: usize,
    intensity: usize,
    x: usize,
    y: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &TableColumns) -> Result<Self, TableError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TableError::MissingColumn {
                    column: name.to_string(),
                })
        };
        Ok(Self {
            id: find(&columns.id)?,
            intensity: find(&columns.intensity)?,
            x: find(&columns.x)?,
            y: find(&columns.y)?,
        })
    }
}

fn parse_field(row: &StringRecord, index: usize, line: usize, column: &str) -> Result<f64, TableError> {
    let malformed = |reason: String| TableError::MalformedRecord {
        row: line,
        column: column.to_string(),
        reason,
    };
    let raw = row
        .get(index)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("missing value".to_string()))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| malformed(format!("`{raw}` is not a number")))?;
    if !value.is_finite() {
        return Err(malformed(format!("`{raw}` is not finite")));
    }
    Ok(value)
}

fn parse_id(row: &StringRecord, index: usize, line: usize, column: &str) -> Result<i64, TableError> {
    if let Some(id) = row.get(index).and_then(|s| s.parse::<i64>().ok()) {
        return Ok(id);
    }
    let value = parse_field(row, index, line, column)?;
    if value.fract() != 0.0 {
        return Err(TableError::MalformedRecord {
            row: line,
            column: column.to_string(),
            reason: format!("`{value}` is not an integer id"),
        });
    }
    Ok(value as i64)
}

fn parse_coordinate(
    row: &StringRecord,
    index: usize,
    line: usize,
    column: &str,
    rounding: CoordinateRounding,
) -> Result<f64, TableError> {
    let value = parse_field(row, index, line, column)?;
    if rounding.checked_key(value).is_none() {
        return Err(TableError::MalformedRecord {
            row: line,
            column: column.to_string(),
            reason: format!(
                "`{value}` is too large to key at {} decimals",
                rounding.decimals()
            ),
        });
    }
    Ok(value)
}

/// A loaded object table: the parsed records plus the raw rows they came from.
#[derive(Clone, Debug)]
pub struct ObjectTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    records: Vec<ObjectRecord>,
    rounding: CoordinateRounding,
}

impl ObjectTable {
    /// Parse a CSV stream with a header row.
    ///
    /// Rows shorter than the header are accepted as long as every required
    /// field is present; the missing trailing fields are kept as empty.
    /// Rows longer than the header are malformed.
    pub fn from_reader<R: Read>(
        reader: R,
        columns: &TableColumns,
        rounding: CoordinateRounding,
    ) -> Result<Self, TableError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let index = ColumnIndex::resolve(&headers, columns)?;

        let mut rows = Vec::new();
        let mut records = Vec::new();
        for (line, row) in rdr.records().enumerate() {
            let mut row = row?;
            if row.len() > headers.len() {
                return Err(TableError::MalformedRecord {
                    row: line,
                    column: format!("#{}", headers.len() + 1),
                    reason: format!("{} fields, header has {}", row.len(), headers.len()),
                });
            }
            let raw = RawRecord {
                id: parse_id(&row, index.id, line, &columns.id)?,
                intensity: parse_field(&row, index.intensity, line, &columns.intensity)?,
                x: parse_coordinate(&row, index.x, line, &columns.x, rounding)?,
                y: parse_coordinate(&row, index.y, line, &columns.y, rounding)?,
            };
            while row.len() < headers.len() {
                row.push_field("");
            }
            records.push(ObjectRecord::new(line, raw, rounding));
            rows.push(row);
        }

        log::info!("loaded {} object records", records.len());
        Ok(Self {
            headers,
            rows,
            records,
            rounding,
        })
    }

    /// Load a CSV file from disk.
    pub fn from_path(
        path: impl AsRef<Path>,
        columns: &TableColumns,
        rounding: CoordinateRounding,
    ) -> Result<Self, TableError> {
        let path = path.as_ref();
        log::debug!("reading object table {}", path.display());
        Self::from_reader(File::open(path)?, columns, rounding)
    }

    /// Build a table from already-parsed fields. The raw rows hold exactly
    /// the four required columns.
    pub fn from_raw_records(
        raw: impl IntoIterator<Item = RawRecord>,
        columns: &TableColumns,
        rounding: CoordinateRounding,
    ) -> Self {
        let headers = StringRecord::from(vec![
            columns.id.as_str(),
            columns.intensity.as_str(),
            columns.x.as_str(),
            columns.y.as_str(),
        ]);
        let (rows, records): (Vec<_>, Vec<_>) = raw
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                let row = StringRecord::from(vec![
                    r.id.to_string(),
                    r.intensity.to_string(),
                    r.x.to_string(),
                    r.y.to_string(),
                ]);
                (row, ObjectRecord::new(index, r, rounding))
            })
            .unzip();
        Self {
            headers,
            rows,
            records,
            rounding,
        }
    }

    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rounding(&self) -> CoordinateRounding {
        self.rounding
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    /// Raw CSV fields of the record at `index`.
    pub fn row(&self, index: usize) -> Option<&StringRecord> {
        self.rows.get(index)
    }

    /// Write matched records: every original column followed by
    /// `found_x`, `found_y` and `distance`.
    ///
    /// Fails with [`TableError::ForeignRecord`] if an assignment carries a
    /// record that was not loaded into this table.
    pub fn write_matched<W: Write>(
        &self,
        writer: W,
        assignments: &[Assignment],
    ) -> Result<(), TableError> {
        let mut wtr = WriterBuilder::new().from_writer(writer);
        let mut header: Vec<&str> = self.headers.iter().collect();
        header.extend(["found_x", "found_y", "distance"]);
        wtr.write_record(&header)?;

        for a in assignments {
            let row = match (self.rows.get(a.record.index), self.records.get(a.record.index)) {
                (Some(row), Some(rec)) if *rec == a.record => row,
                _ => {
                    return Err(TableError::ForeignRecord {
                        id: a.record.id,
                        row: a.record.index,
                    })
                }
            };
            let mut out: Vec<String> = row.iter().map(str::to_string).collect();
            out.push(self.rounding.format(a.found.x));
            out.push(self.rounding.format(a.found.y));
            out.push(a.distance.to_string());
            wtr.write_record(&out)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write matched records to a CSV file.
    pub fn write_matched_path(
        &self,
        path: impl AsRef<Path>,
        assignments: &[Assignment],
    ) -> Result<(), TableError> {
        self.write_matched(File::create(path)?, assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RoundedKey;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
Number,channel1_mean,xmean,ymean,area
1,10.5,4.4,4.6,25
2,3.25,100.5,20.5,40
";

    fn load(csv: &str) -> Result<ObjectTable, TableError> {
        ObjectTable::from_reader(
            csv.as_bytes(),
            &TableColumns::default(),
            CoordinateRounding::INTEGER,
        )
    }

    #[test]
    fn loads_records_with_rounded_keys() {
        let table = load(SAMPLE).expect("table");
        assert_eq!(table.len(), 2);
        let first = &table.records()[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.index, 0);
        assert_relative_eq!(first.intensity, 10.5);
        assert_eq!(first.key, RoundedKey { x: 4, y: 5 });
        // half-to-even on both axes
        assert_eq!(table.records()[1].key, RoundedKey { x: 100, y: 20 });
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let err = load("Number,channel1_mean,xmean\n1,2,3\n").expect_err("missing ymean");
        assert!(matches!(err, TableError::MissingColumn { ref column } if column == "ymean"));
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let err = load("Number,channel1_mean,xmean,ymean\n1,2,abc,4\n").expect_err("bad x");
        match err {
            TableError::MalformedRecord { row, column, .. } => {
                assert_eq!(row, 0);
                assert_eq!(column, "xmean");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_field_is_malformed() {
        let err = load("Number,channel1_mean,xmean,ymean\n1,2,3,4\n2,,3,4\n").expect_err("empty");
        assert!(matches!(
            err,
            TableError::MalformedRecord { row: 1, ref column, .. } if column == "channel1_mean"
        ));
    }

    #[test]
    fn fractional_id_is_malformed() {
        let err = load("Number,channel1_mean,xmean,ymean\n1.5,2,3,4\n").expect_err("id");
        assert!(matches!(err, TableError::MalformedRecord { ref column, .. } if column == "Number"));
        let ok = load("Number,channel1_mean,xmean,ymean\n7.0,2,3,4\n").expect("table");
        assert_eq!(ok.records()[0].id, 7);
    }

    #[test]
    fn custom_column_names() {
        let columns = TableColumns {
            id: "id".into(),
            intensity: "mean".into(),
            x: "cx".into(),
            y: "cy".into(),
        };
        let table = ObjectTable::from_reader(
            "cx,cy,id,mean\n1.2,3.4,5,6\n".as_bytes(),
            &columns,
            CoordinateRounding::HUNDREDTHS,
        )
        .expect("table");
        let rec = &table.records()[0];
        assert_eq!(rec.id, 5);
        assert_eq!(rec.key, RoundedKey { x: 120, y: 340 });
    }

    #[test]
    fn short_row_missing_required_field_is_malformed() {
        let err = load("Number,channel1_mean,xmean,ymean\n1,2,3\n").expect_err("short row");
        assert!(matches!(
            err,
            TableError::MalformedRecord { row: 0, ref column, .. } if column == "ymean"
        ));
    }

    #[test]
    fn short_row_with_required_fields_is_padded() {
        let table = load("Number,channel1_mean,xmean,ymean,area\n1,2,3,4\n").expect("table");
        assert_eq!(table.len(), 1);
        let row = table.row(0).expect("row");
        assert_eq!(row.len(), 5);
        assert_eq!(row.get(4), Some(""));
    }

    #[test]
    fn long_row_is_malformed() {
        let err = load("Number,channel1_mean,xmean,ymean\n1,2,3,4,5\n").expect_err("long row");
        assert!(matches!(err, TableError::MalformedRecord { row: 0, .. }));
    }

    #[test]
    fn coordinates_beyond_key_range_are_malformed() {
        let rounding = CoordinateRounding::new(9).expect("rounding");
        let err = ObjectTable::from_reader(
            "Number,channel1_mean,xmean,ymean\n1,2,1e12,4\n".as_bytes(),
            &TableColumns::default(),
            rounding,
        )
        .expect_err("too large");
        assert!(matches!(err, TableError::MalformedRecord { ref column, .. } if column == "xmean"));
    }

    fn assignment_for(record: ObjectRecord) -> Assignment {
        Assignment {
            component_index: 0,
            component_label: 1,
            found: record.key,
            found_position: record.position(),
            record,
            distance: 0.0,
        }
    }

    #[test]
    fn write_matched_appends_found_columns() {
        let table = load(SAMPLE).expect("table");
        let mut out = Vec::new();
        table
            .write_matched(&mut out, &[assignment_for(table.records()[1].clone())])
            .expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "Number,channel1_mean,xmean,ymean,area,found_x,found_y,distance\n\
             2,3.25,100.5,20.5,40,100,20,0\n"
        );
    }

    #[test]
    fn write_matched_rejects_foreign_records() {
        let table = load(SAMPLE).expect("table");
        let other = load("Number,channel1_mean,xmean,ymean\n1,2,3,4\n9,9,9,9\n9,9,9,9\n")
            .expect("other");

        let mut out = Vec::new();
        let err = table
            .write_matched(&mut out, &[assignment_for(other.records()[2].clone())])
            .expect_err("index out of range");
        assert!(matches!(err, TableError::ForeignRecord { id: 9, row: 2 }));

        let err = table
            .write_matched(Vec::<u8>::new(), &[assignment_for(other.records()[1].clone())])
            .expect_err("different record at same index");
        assert!(matches!(err, TableError::ForeignRecord { id: 9, row: 1 }));
    }

    #[test]
    fn columns_deserialize_with_defaults() {
        let columns: TableColumns = serde_json::from_str(r#"{"x":"cx"}"#).expect("json");
        assert_eq!(columns.x, "cx");
        assert_eq!(columns.id, "Number");
    }
}
