//! Rectangular datasets and their delimited-text encoding.
//!
//! ## Encoding contract
//!
//! | Aspect        | Rule                                                       |
//! |---------------|------------------------------------------------------------|
//! | Layout        | comma-separated, one header row, every row same width      |
//! | Null on write | `na`                                                       |
//! | Null on read  | `na`, empty field, and the usual spellings (`NA`, `NaN`, `null`, ...) |
//! | Floats        | shortest round-trip form, always with a `.` or exponent    |
//! | Types         | declared via schema, else inferred per column: Int ⊂ Float ⊂ Text |
//!
//! Boundary cases: a text cell spelled like a null token reads back as null,
//! and a NaN float is written as `na`.
//!
//! Header-only CSV cannot carry column types, an all-null column, or a table
//! without columns. [`TableSchema`] records those next to the text, and
//! [`TabularBatch::from_csv_bytes_exact`] restores the table from both.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Field values read as null.
const NULL_TOKENS: &[&str] = &[
    "", "na", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None",
];

/// Field value written for null.
pub const NULL_TOKEN: &str = "na";

// ---------------------------------------------------------------------------
// Cells and columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// `None` is a missing value.
pub type Cell = Option<CellValue>;

impl CellValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            CellValue::Int(_) => ColumnType::Int,
            CellValue::Float(_) => ColumnType::Float,
            CellValue::Text(_) => ColumnType::Text,
        }
    }

    /// Numeric view; text is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Text(_) => None,
        }
    }

    fn parse_as(raw: &str, ty: ColumnType) -> Option<CellValue> {
        match ty {
            ColumnType::Int => raw.trim().parse::<i64>().ok().map(CellValue::Int),
            ColumnType::Float => raw.trim().parse::<f64>().ok().map(CellValue::Float),
            ColumnType::Text => Some(CellValue::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(v) => write!(f, "{v}"),
            // Debug keeps a trailing ".0" so integral floats stay floats on re-read.
            CellValue::Float(v) => write!(f, "{v:?}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Declared shape of a stored table: ordered columns and the row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    pub rows: usize,
}

fn is_null_token(raw: &str) -> bool {
    NULL_TOKENS.contains(&raw.trim())
}

// ---------------------------------------------------------------------------
// TabularBatch
// ---------------------------------------------------------------------------

/// Typed, rectangular table. Every row has one cell per column and every
/// non-null cell matches its column type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TabularBatch {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl TabularBatch {
    /// Validates shape and cell types. Int cells in a Float column are
    /// widened; any other mismatch is an error.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Result<Self, RegistryError> {
        let mut seen = std::collections::BTreeSet::new();
        for c in &columns {
            if !seen.insert(c.name.as_str()) {
                return Err(RegistryError::table(format!("duplicate column '{}'", c.name)));
            }
        }

        let mut checked = Vec::with_capacity(rows.len());
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(RegistryError::table(format!(
                    "row {r} has {} cells, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
            let mut out = Vec::with_capacity(row.len());
            for (cell, col) in row.into_iter().zip(&columns) {
                let cell = match (cell, col.ty) {
                    (None, _) => None,
                    (Some(CellValue::Int(v)), ColumnType::Float) => Some(CellValue::Float(v as f64)),
                    (Some(v), ty) if v.column_type() == ty => Some(v),
                    (Some(v), ty) => {
                        return Err(RegistryError::table(format!(
                            "row {r} column '{}': {} value in {} column",
                            col.name,
                            v.column_type().as_str(),
                            ty.as_str()
                        )))
                    }
                };
                out.push(cell);
            }
            checked.push(out);
        }

        Ok(Self {
            columns,
            rows: checked,
        })
    }

    pub fn schema(&self) -> TableSchema {
        TableSchema {
            columns: self.columns.clone(),
            rows: self.rows.len(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<Cell>, RegistryError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| RegistryError::table(format!("missing column '{name}'")))?;
        Ok(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Remove column `target` and return it alongside the remaining features.
    pub fn split_target(&self, target: &str) -> Result<(TabularBatch, Vec<Cell>), RegistryError> {
        let idx = self
            .column_index(target)
            .ok_or_else(|| RegistryError::table(format!("missing target column '{target}'")))?;

        let mut columns = self.columns.clone();
        columns.remove(idx);

        let mut labels = Vec::with_capacity(self.rows.len());
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let mut row = row.clone();
            labels.push(row.remove(idx));
            rows.push(row);
        }
        Ok((TabularBatch { columns, rows }, labels))
    }

    // -----------------------------------------------------------------------
    // Delimited text
    // -----------------------------------------------------------------------

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(|e| RegistryError::table(format!("write header: {e}")))?;
        for row in &self.rows {
            let fields = row.iter().map(|cell| match cell {
                None => NULL_TOKEN.to_string(),
                Some(CellValue::Float(v)) if v.is_nan() => NULL_TOKEN.to_string(),
                Some(v) => v.to_string(),
            });
            wtr.write_record(fields)
                .map_err(|e| RegistryError::table(format!("write row: {e}")))?;
        }
        wtr.into_inner()
            .map_err(|e| RegistryError::table(format!("flush: {e}")))
    }

    /// Parse with every column type inferred.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
        Self::from_csv_bytes_with_schema(bytes, &[])
    }

    /// Parse against a recorded [`TableSchema`]: the header must list exactly
    /// the schema's columns in order, every column takes its declared type,
    /// and the row count must match.
    pub fn from_csv_bytes_exact(
        bytes: &[u8],
        schema: &TableSchema,
    ) -> Result<Self, RegistryError> {
        if schema.columns.is_empty() {
            return Self::new(Vec::new(), vec![Vec::new(); schema.rows]);
        }

        let table = Self::from_csv_bytes_with_schema(bytes, &schema.columns)?;
        let expected: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        if table.column_names() != expected {
            return Err(RegistryError::table(format!(
                "header {:?} does not match schema {:?}",
                table.column_names(),
                expected
            )));
        }
        if table.n_rows() != schema.rows {
            return Err(RegistryError::table(format!(
                "{} rows, schema records {}",
                table.n_rows(),
                schema.rows
            )));
        }
        Ok(table)
    }

    /// Parse, applying declared types for the columns in `schema` and
    /// inferring the rest. Every schema column must be present in the header.
    pub fn from_csv_bytes_with_schema(
        bytes: &[u8],
        schema: &[Column],
    ) -> Result<Self, RegistryError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| RegistryError::table(format!("read header: {e}")))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for declared in schema {
            if !headers.iter().any(|h| *h == declared.name) {
                return Err(RegistryError::table(format!(
                    "schema column '{}' not in header",
                    declared.name
                )));
            }
        }

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for (i, rec) in rdr.records().enumerate() {
            let rec = rec.map_err(|e| RegistryError::table(format!("row {i}: {e}")))?;
            raw_rows.push(rec.iter().map(str::to_string).collect());
        }

        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let ty = schema
                    .iter()
                    .find(|c| c.name == *name)
                    .map(|c| c.ty)
                    .unwrap_or_else(|| infer_type(raw_rows.iter().map(|r| r[i].as_str())));
                Column::new(name.clone(), ty)
            })
            .collect();

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (r, raw) in raw_rows.iter().enumerate() {
            let mut row = Vec::with_capacity(raw.len());
            for (field, col) in raw.iter().zip(&columns) {
                if is_null_token(field) {
                    row.push(None);
                    continue;
                }
                let cell = CellValue::parse_as(field, col.ty).ok_or_else(|| {
                    RegistryError::table(format!(
                        "row {r} column '{}': cannot parse '{field}' as {}",
                        col.name,
                        col.ty.as_str()
                    ))
                })?;
                row.push(Some(cell));
            }
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }
}

/// Narrowest type every non-null field parses as. An all-null column is Float.
fn infer_type<'a>(fields: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut ty = ColumnType::Int;
    let mut any = false;
    for f in fields.filter(|f| !is_null_token(f)) {
        any = true;
        let t = f.trim();
        if ty == ColumnType::Int && t.parse::<i64>().is_err() {
            ty = ColumnType::Float;
        }
        if ty == ColumnType::Float && t.parse::<f64>().is_err() {
            return ColumnType::Text;
        }
    }
    if any {
        ty
    } else {
        ColumnType::Float
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_widens_int_float_text() {
        let csv = b"a,b,c,d\n1,1,x,na\n2,2.5,3,\n";
        let t = TabularBatch::from_csv_bytes(csv).unwrap();
        let types: Vec<ColumnType> = t.columns().iter().map(|c| c.ty).collect();
        assert_eq!(
            types,
            vec![ColumnType::Int, ColumnType::Float, ColumnType::Text, ColumnType::Float]
        );
        assert_eq!(t.rows()[0][1], Some(CellValue::Float(1.0)));
        assert_eq!(t.rows()[1][2], Some(CellValue::Text("3".into())));
        assert_eq!(t.rows()[0][3], None);
        assert_eq!(t.rows()[1][3], None);
    }

    #[test]
    fn integral_floats_keep_their_type_through_text() {
        let t = TabularBatch::new(
            vec![Column::new("x", ColumnType::Float)],
            vec![vec![Some(CellValue::Float(2.0))], vec![None]],
        )
        .unwrap();
        let bytes = t.to_csv_bytes().unwrap();
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "x\n2.0\nna\n");
        assert_eq!(TabularBatch::from_csv_bytes(&bytes).unwrap(), t);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = TabularBatch::from_csv_bytes(b"a,b\n1,2\n3\n").unwrap_err();
        assert!(err.to_string().contains("table error"));

        let err = TabularBatch::new(
            vec![Column::new("a", ColumnType::Int)],
            vec![vec![None, None]],
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected 1"));
    }

    #[test]
    fn schema_overrides_inference_and_must_match_header() {
        let schema = [Column::new("Result", ColumnType::Text)];
        let t = TabularBatch::from_csv_bytes_with_schema(b"Age,Result\n63,1\n", &schema).unwrap();
        assert_eq!(t.rows()[0][1], Some(CellValue::Text("1".into())));

        let missing = [Column::new("Outcome", ColumnType::Text)];
        assert!(TabularBatch::from_csv_bytes_with_schema(b"Age\n63\n", &missing).is_err());

        let bad = [Column::new("Age", ColumnType::Int)];
        let err = TabularBatch::from_csv_bytes_with_schema(b"Age\nold\n", &bad).unwrap_err();
        assert!(err.to_string().contains("cannot parse 'old' as int"));
    }

    #[test]
    fn split_target_removes_column() {
        let t = TabularBatch::from_csv_bytes(b"Age,Result,Sex\n63,positive,1\n40,negative,0\n")
            .unwrap();
        let (features, labels) = t.split_target("Result").unwrap();
        assert_eq!(features.column_names(), vec!["Age", "Sex"]);
        assert_eq!(features.rows()[1], vec![Some(CellValue::Int(40)), Some(CellValue::Int(0))]);
        assert_eq!(labels[0], Some(CellValue::Text("positive".into())));
        assert!(t.split_target("Outcome").is_err());
    }

    #[test]
    fn exact_parse_keeps_declared_types_and_rejects_drift() {
        let schema = TableSchema {
            columns: vec![
                Column::new("Id", ColumnType::Text),
                Column::new("Note", ColumnType::Int),
            ],
            rows: 2,
        };
        let t = TabularBatch::from_csv_bytes_exact(b"Id,Note\n007,na\n12,na\n", &schema).unwrap();
        assert_eq!(t.columns(), schema.columns.as_slice());
        assert_eq!(t.rows()[0][0], Some(CellValue::Text("007".into())));

        let short = TableSchema { rows: 3, ..schema.clone() };
        assert!(TabularBatch::from_csv_bytes_exact(b"Id,Note\n007,na\n12,na\n", &short).is_err());
        assert!(TabularBatch::from_csv_bytes_exact(b"Note,Id\n1,a\n2,b\n", &schema).is_err());

        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains(r#"{"name":"Id","type":"text"}"#));
    }

    #[test]
    fn int_cells_widen_in_float_columns_but_text_does_not() {
        let t = TabularBatch::new(
            vec![Column::new("x", ColumnType::Float)],
            vec![vec![Some(CellValue::Int(3))]],
        )
        .unwrap();
        assert_eq!(t.rows()[0][0], Some(CellValue::Float(3.0)));

        assert!(TabularBatch::new(
            vec![Column::new("x", ColumnType::Int)],
            vec![vec![Some(CellValue::Text("a".into()))]],
        )
        .is_err());
    }
}
