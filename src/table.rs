use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{Error, Result};

/// Zonal statistics for one or more areas, as returned by the CSV endpoints.
///
/// Rows are aligned to `columns`; a cell is empty when the source table had no
/// such column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZonalTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ZonalTable {
    /// Parse a CSV body, skipping `#` comment lines.
    pub fn from_csv(body: &str) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(Error::NoData("empty CSV body".into()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|v| v.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Prepend constant `id` and `name` columns.
    pub fn with_area(mut self, id: &str, name: &str) -> Self {
        self.columns.insert(0, "name".to_string());
        self.columns.insert(0, "id".to_string());
        for row in &mut self.rows {
            row.insert(0, name.to_string());
            row.insert(0, id.to_string());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(move |r| r[idx].as_str()))
    }

    /// Concatenate tables; columns are the union in first-seen order.
    pub fn concat(tables: impl IntoIterator<Item = ZonalTable>) -> Self {
        let mut out = ZonalTable::default();
        for table in tables {
            let mut mapping = Vec::with_capacity(table.columns.len());
            for col in &table.columns {
                let idx = match out.columns.iter().position(|c| c == col) {
                    Some(i) => i,
                    None => {
                        out.columns.push(col.clone());
                        for row in &mut out.rows {
                            row.push(String::new());
                        }
                        out.columns.len() - 1
                    }
                };
                mapping.push(idx);
            }
            for row in table.rows {
                let mut aligned = vec![String::new(); out.columns.len()];
                for (value, &idx) in row.into_iter().zip(&mapping) {
                    aligned[idx] = value;
                }
                out.rows.push(aligned);
            }
        }
        out
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = WriterBuilder::new().from_writer(writer);
        w.write_record(&self.columns)?;
        for row in &self.rows {
            w.write_record(row)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_csv(File::create(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPERATURE_CSV: &str = "\
# Temperature data for Yukon Flats
# tas: mean annual temperature (deg C)
date_range,model,scenario,season,variable,value
1950_2009,CRU-TS40,historical,DJF,tas,-25.3
2040_2069,GFDL-CM3,rcp85,DJF,tas,-17.9
";

    #[test]
    fn parses_with_comments() {
        let t = ZonalTable::from_csv(TEMPERATURE_CSV).unwrap();
        assert_eq!(t.columns.len(), 6);
        assert_eq!(t.len(), 2);
        assert_eq!(
            t.column("value").unwrap().collect::<Vec<_>>(),
            vec!["-25.3", "-17.9"]
        );
    }

    #[test]
    fn area_columns_come_first() {
        let t = ZonalTable::from_csv(TEMPERATURE_CSV)
            .unwrap()
            .with_area("FWS11", "Yukon Flats");
        assert_eq!(&t.columns[..3], &["id", "name", "date_range"]);
        assert_eq!(&t.rows[1][..2], &["FWS11", "Yukon Flats"]);
    }

    #[test]
    fn concat_unions_columns() {
        let a = ZonalTable::from_csv("a,b\n1,2\n").unwrap();
        let b = ZonalTable::from_csv("b,c\n3,4\n").unwrap();
        let t = ZonalTable::concat([a, b]);
        assert_eq!(t.columns, vec!["a", "b", "c"]);
        assert_eq!(t.rows, vec![vec!["1", "2", ""], vec!["", "3", "4"]]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(matches!(ZonalTable::from_csv("a,b\n1,2,3\n"), Err(Error::Csv(_))));
    }

    #[test]
    fn empty_body_has_no_data() {
        assert!(matches!(ZonalTable::from_csv("# nothing here\n"), Err(Error::NoData(_))));
    }

    #[test]
    fn writes_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zonal.csv");
        let t = ZonalTable::from_csv("a,b\n1,\"x, y\"\n").unwrap().with_area("AK1", "Anchorage");
        t.to_path(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "id,name,a,b\nAK1,Anchorage,1,\"x, y\"\n");
    }
}
