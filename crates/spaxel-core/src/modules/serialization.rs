//! CSV boundary of the table model.
//!
//! The only place where column names exist as strings. Every row must carry
//! `galaxy` and `bin` identity cells; all other headers are parsed into
//! [`ColumnKey`]s. Empty cells and `nan` read as NaN, and NaN is written back
//! as an empty cell.

use crate::domain::{BinId, Column, ColumnKey, SpaxelError, SpaxelResult, Table};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

pub const GALAXY_COLUMN: &str = "galaxy";
pub const BIN_COLUMN: &str = "bin";

fn parse_error(message: impl Into<String>) -> SpaxelError {
    SpaxelError::input_validation("INPUT.TABLE_PARSE", message)
}

fn read_error(error: csv::Error) -> SpaxelError {
    if error.is_io_error() {
        SpaxelError::io_system("IO.TABLE_READ", error.to_string())
    } else {
        parse_error(error.to_string())
    }
}

fn write_error(error: impl std::fmt::Display) -> SpaxelError {
    SpaxelError::io_system("IO.TABLE_WRITE", error.to_string())
}

pub fn read_table(path: &Path) -> SpaxelResult<Table> {
    let file = File::open(path).map_err(|error| {
        SpaxelError::io_system(
            "IO.TABLE_READ",
            format!("failed to open table '{}': {error}", path.display()),
        )
    })?;
    let table = read_table_from(file)?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.column_count(),
        "read table"
    );
    Ok(table)
}

pub fn read_table_from<R: Read>(source: R) -> SpaxelResult<Table> {
    let mut reader = csv::Reader::from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let position = |name: &str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| parse_error(format!("table is missing the '{name}' column")))
    };
    let galaxy_index = position(GALAXY_COLUMN)?;
    let bin_index = position(BIN_COLUMN)?;

    let mut keys = Vec::with_capacity(headers.len());
    let mut seen = HashSet::new();
    for (index, header) in headers.iter().enumerate() {
        if index == galaxy_index || index == bin_index {
            continue;
        }
        let key = ColumnKey::parse(header).map_err(|error| parse_error(error.to_string()))?;
        if !seen.insert(key.clone()) {
            return Err(parse_error(format!("duplicate column '{header}'")));
        }
        keys.push((index, key));
    }

    let mut ids = Vec::new();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); keys.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(read_error)?;
        let galaxy = record.get(galaxy_index).unwrap_or_default().trim();
        let bin = record.get(bin_index).unwrap_or_default().trim();
        let bin = bin.parse::<u32>().map_err(|_| {
            parse_error(format!("row {}: '{bin}' is not a valid bin number", row + 1))
        })?;
        ids.push(BinId::new(galaxy, bin));
        for ((index, _), column) in keys.iter().zip(cells.iter_mut()) {
            column.push(record.get(*index).unwrap_or_default().trim().to_string());
        }
    }

    let mut table = Table::new(ids);
    for ((_, key), raw) in keys.into_iter().zip(cells) {
        table.insert_if_absent(key, infer_column(raw))?;
    }
    Ok(table)
}

fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        Some(f64::NAN)
    } else {
        cell.parse().ok()
    }
}

fn parse_flag(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Numeric if every cell parses as a float, flag if every cell is a boolean,
/// category otherwise.
fn infer_column(raw: Vec<String>) -> Column {
    if let Some(values) = raw.iter().map(|cell| parse_cell(cell)).collect::<Option<Vec<_>>>() {
        return Column::Numeric(values);
    }
    if let Some(values) = raw.iter().map(|cell| parse_flag(cell)).collect::<Option<Vec<_>>>() {
        return Column::Flag(values);
    }
    Column::Category(raw)
}

pub fn write_table(path: &Path, table: &Table) -> SpaxelResult<()> {
    let file = File::create(path).map_err(|error| {
        SpaxelError::io_system(
            "IO.TABLE_WRITE",
            format!("failed to create table '{}': {error}", path.display()),
        )
    })?;
    write_table_to(file, table)?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.column_count(),
        "wrote table"
    );
    Ok(())
}

pub fn write_table_to<W: Write>(sink: W, table: &Table) -> SpaxelResult<()> {
    let mut writer = csv::Writer::from_writer(sink);
    let keys: Vec<&ColumnKey> = table.keys().collect();

    let mut header = vec![GALAXY_COLUMN.to_string(), BIN_COLUMN.to_string()];
    header.extend(keys.iter().map(|key| key.to_string()));
    writer.write_record(&header).map_err(write_error)?;

    let columns: Vec<&Column> = keys.iter().filter_map(|key| table.column(key)).collect();
    for (row, id) in table.ids().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(id.galaxy.clone());
        record.push(id.bin.to_string());
        record.extend(columns.iter().map(|column| format_cell(column, row)));
        writer.write_record(&record).map_err(write_error)?;
    }
    writer.flush().map_err(write_error)
}

fn format_cell(column: &Column, row: usize) -> String {
    match column {
        Column::Numeric(values) if values[row].is_nan() => String::new(),
        Column::Numeric(values) => values[row].to_string(),
        Column::Flag(values) => values[row].to_string(),
        Column::Category(values) => values[row].clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{read_table, read_table_from, write_table, write_table_to};
    use crate::domain::{BinId, Column, ColumnKey, SpaxelErrorCategory, Table};
    use std::fs;
    use tempfile::TempDir;

    const INPUT: &str = "\
galaxy,bin,D_L (Mpc),HALPHA (total),HALPHA error (component 1),BPT (total),flagged (total)
572402,0,100.5,3.25,,SF,true
572402,1,100.5,nan,0.5,Composite,false
";

    #[test]
    fn reader_infers_column_kinds_and_component_keys() {
        let table = read_table_from(INPUT.as_bytes()).expect("table should parse");
        assert_eq!(
            table.ids(),
            &[BinId::new("572402", 0), BinId::new("572402", 1)]
        );
        assert_eq!(
            table.numeric(&ColumnKey::bare("D_L (Mpc)")),
            Some(&[100.5, 100.5][..])
        );

        let halpha = table
            .numeric(&ColumnKey::total("HALPHA"))
            .expect("HALPHA should be numeric");
        assert_eq!(halpha[0], 3.25);
        assert!(halpha[1].is_nan());
        let error = table
            .numeric(&ColumnKey::component("HALPHA error", 1))
            .expect("error column should be numeric");
        assert!(error[0].is_nan());

        assert_eq!(
            table.category(&ColumnKey::total("BPT")),
            Some(&["SF".to_string(), "Composite".to_string()][..])
        );
        assert_eq!(
            table.flag(&ColumnKey::total("flagged")),
            Some(&[true, false][..])
        );
    }

    #[test]
    fn writer_preserves_column_order_and_blanks_nan() {
        let table = read_table_from(INPUT.as_bytes()).expect("table should parse");
        let mut bytes = Vec::new();
        write_table_to(&mut bytes, &table).expect("table should serialize");
        let written = String::from_utf8(bytes).expect("csv should be utf-8");

        let expected = "\
galaxy,bin,D_L (Mpc),HALPHA (total),HALPHA error (component 1),BPT (total),flagged (total)
572402,0,100.5,3.25,,SF,true
572402,1,100.5,,0.5,Composite,false
";
        assert_eq!(written, expected);
    }

    #[test]
    fn files_round_trip_through_disk() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("bins.csv");
        let table = Table::new(vec![BinId::new("G", 3)])
            .with_numeric(ColumnKey::component("log N2", 2), vec![-0.25])
            .expect("column should insert");

        write_table(&path, &table).expect("table should be written");
        let contents = fs::read_to_string(&path).expect("file should be readable");
        assert_eq!(contents, "galaxy,bin,log N2 (component 2)\nG,3,-0.25\n");

        let reread = read_table(&path).expect("table should be read back");
        assert_eq!(reread, table);
        assert!(matches!(
            reread.column(&ColumnKey::component("log N2", 2)),
            Some(Column::Numeric(_))
        ));
    }

    #[test]
    fn identity_columns_are_required() {
        let error = read_table_from("galaxy,HALPHA (total)\nG,1.0\n".as_bytes())
            .expect_err("bin column is missing");
        assert_eq!(error.category(), SpaxelErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.TABLE_PARSE");
        assert!(error.message().contains("'bin'"));

        let error = read_table_from("galaxy,bin\nG,first\n".as_bytes())
            .expect_err("bin must be an integer");
        assert!(error.message().contains("row 1"));
    }

    #[test]
    fn duplicate_headers_and_missing_files_are_rejected() {
        let error = read_table_from("galaxy,bin,z,z\nG,0,0.1,0.1\n".as_bytes())
            .expect_err("duplicate column should fail");
        assert!(error.message().contains("duplicate column 'z'"));

        let temp = TempDir::new().expect("tempdir should be created");
        let error = read_table(&temp.path().join("absent.csv")).expect_err("file is absent");
        assert_eq!(error.category(), SpaxelErrorCategory::IoSystemError);
        assert_eq!(error.placeholder(), "IO.TABLE_READ");
    }
}
