use crate::domain::model::{OutputFormat, PassengerRecord};
use crate::utils::error::{GeocodeError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, Worksheet};
use std::io::Cursor;
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 4] = ["id", "name", "address", "city"];
pub const EXPORT_COLUMNS: [&str; 6] = ["id", "name", "address", "city", "latitude", "longitude"];
pub const EXPORT_SHEET_NAME: &str = "Geocoded Data";
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Workbook,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Workbook),
            _ => Err(GeocodeError::UnsupportedFormat { extension }),
        }
    }
}

/// 讀取試算表的第一個工作表，轉成乘客資料
///
/// 標題列必須包含 `id, name, address, city` (去除空白、不分大小寫)；
/// 其他欄位忽略，空白列略過。驗證失敗時不匯入任何資料。
pub fn parse_records(path: &str, data: &[u8]) -> Result<Vec<PassengerRecord>> {
    let rows = match InputFormat::from_path(path)? {
        InputFormat::Workbook => workbook_rows(data)?,
        InputFormat::Csv => csv_rows(data)?,
    };
    records_from_rows(rows)
}

fn workbook_rows(data: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(GeocodeError::EmptyFile),
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn csv_rows(data: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // 1.0 -> "1"
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

struct ColumnIndex {
    id: usize,
    name: usize,
    address: usize,
    city: usize,
}

impl ColumnIndex {
    fn from_header(header: &[String]) -> Result<Self> {
        let normalized: Vec<String> = header
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();
        let position = |column: &str| normalized.iter().position(|h| h == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| position(**column).is_none())
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(GeocodeError::MissingColumns { missing });
        }

        Ok(Self {
            id: position("id").unwrap_or_default(),
            name: position("name").unwrap_or_default(),
            address: position("address").unwrap_or_default(),
            city: position("city").unwrap_or_default(),
        })
    }

    fn record(&self, row: &[String]) -> PassengerRecord {
        let cell = |index: usize| row.get(index).cloned().unwrap_or_default();
        PassengerRecord::new(
            cell(self.id),
            cell(self.name),
            cell(self.address),
            cell(self.city),
        )
    }
}

fn records_from_rows(rows: Vec<Vec<String>>) -> Result<Vec<PassengerRecord>> {
    let mut rows = rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));

    let header = rows.next().ok_or(GeocodeError::EmptyFile)?;
    let columns = ColumnIndex::from_header(&header)?;

    let records: Vec<PassengerRecord> = rows.map(|row| columns.record(&row)).collect();
    if records.is_empty() {
        return Err(GeocodeError::EmptyFile);
    }
    Ok(records)
}

/// 輸出檔名 `geocoded_<YYYY-MM-DD>.<ext>`
pub fn export_file_name(format: OutputFormat, date: NaiveDate) -> String {
    format!("geocoded_{}.{}", date.format("%Y-%m-%d"), format.extension())
}

/// 沒有座標的資料，經緯度欄位留空
pub fn write_records(records: &[PassengerRecord], format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Xlsx => write_xlsx(records),
        OutputFormat::Csv => write_csv(records),
    }
}

fn write_csv(records: &[PassengerRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| GeocodeError::IoError(e.into_error()))
}

fn write_xlsx(records: &[PassengerRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, header) in EXPORT_COLUMNS.iter().enumerate() {
        write_text(worksheet, 0, col as u16, header)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| GeocodeError::ProcessingError {
            message: format!("too many rows for a worksheet: {}", records.len()),
        })?;

        write_text(worksheet, row, 0, &record.id)?;
        write_text(worksheet, row, 1, &record.name)?;
        write_text(worksheet, row, 2, &record.address)?;
        write_text(worksheet, row, 3, &record.city)?;
        if let Some(latitude) = record.latitude {
            worksheet.write_number(row, 4, latitude)?;
        }
        if let Some(longitude) = record.longitude {
            worksheet.write_number(row, 5, longitude)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

// 空字串不寫入，讀回時即為空白儲存格
fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<()> {
    if !value.is_empty() {
        worksheet.write_string(row, col, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_input(content: &str) -> Result<Vec<PassengerRecord>> {
        parse_records("passengers.csv", content.as_bytes())
    }

    #[test]
    fn test_parse_csv_with_extra_columns() {
        let records = csv_input(
            "group,id,name,address,city,notes\n\
             A,1,Ana,\"Calle 5, Apt 2\",Bogotá,vip\n\
             B,2,Beto,Carrera 7,Medellín,\n",
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], PassengerRecord::new("1", "Ana", "Calle 5, Apt 2", "Bogotá"));
        assert_eq!(records[1].city, "Medellín");
        assert!(records.iter().all(|r| r.latitude.is_none()));
    }

    #[test]
    fn test_header_match_is_case_insensitive_and_trimmed() {
        let records = csv_input("\u{feff}ID, Name ,ADDRESS,City\n9,Zoe,Main St 1,Austin\n").unwrap();
        assert_eq!(records[0].id, "9");
        assert_eq!(records[0].name, "Zoe");
    }

    #[test]
    fn test_missing_columns_abort_import() {
        let err = csv_input("id,name,street\n1,Ana,Calle 5\n").unwrap_err();
        match err {
            GeocodeError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["address".to_string(), "city".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_files_are_rejected() {
        assert!(matches!(csv_input(""), Err(GeocodeError::EmptyFile)));
        assert!(matches!(
            csv_input("id,name,address,city\n"),
            Err(GeocodeError::EmptyFile)
        ));
        assert!(matches!(
            csv_input("id,name,address,city\n,,,\n"),
            Err(GeocodeError::EmptyFile)
        ));
    }

    #[test]
    fn test_short_rows_fill_missing_cells_with_empty_strings() {
        let records = csv_input("id,name,address,city\n3,Caro\n").unwrap();
        assert_eq!(records[0], PassengerRecord::new("3", "Caro", "", ""));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_records("passengers.txt", b"id,name,address,city\n").unwrap_err();
        assert!(matches!(err, GeocodeError::UnsupportedFormat { extension } if extension == "txt"));
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(export_file_name(OutputFormat::Xlsx, date), "geocoded_2026-03-09.xlsx");
        assert_eq!(export_file_name(OutputFormat::Csv, date), "geocoded_2026-03-09.csv");
    }

    #[test]
    fn test_csv_export_leaves_ungeocoded_cells_empty() {
        let mut geocoded = PassengerRecord::new("1", "Ana", "Calle 5", "Bogotá");
        geocoded.latitude = Some(4.5);
        geocoded.longitude = Some(-74.25);
        let records = vec![
            geocoded,
            PassengerRecord::new("2", "Beto", "Calle 6", "Bogotá"),
            PassengerRecord::new("3", "Caro", "", "Bogotá"),
        ];

        let bytes = write_records(&records, OutputFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "id,name,address,city,latitude,longitude");
        assert_eq!(lines[1], "1,Ana,Calle 5,Bogotá,4.5,-74.25");
        assert_eq!(lines[2], "2,Beto,Calle 6,Bogotá,,");
        assert_eq!(lines[3], "3,Caro,,Bogotá,,");
    }

    #[test]
    fn test_xlsx_export_has_one_row_per_record() {
        let mut geocoded = PassengerRecord::new("1", "Ana", "Calle 5", "Bogotá");
        geocoded.latitude = Some(4.5);
        geocoded.longitude = Some(-74.25);
        let records = vec![
            geocoded,
            PassengerRecord::new("2", "Beto", "Calle 6", "Bogotá"),
            PassengerRecord::new("3", "Caro", "Calle 7", "Bogotá"),
        ];

        let bytes = write_records(&records, OutputFormat::Xlsx).unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![EXPORT_SHEET_NAME.to_string()]);

        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], EXPORT_COLUMNS.map(String::from).to_vec());
        assert_eq!(rows[1][4], "4.5");
        assert_eq!(rows[1][5], "-74.25");
        assert_eq!(rows[2][4], "");
        assert_eq!(rows[2][5], "");
    }

    #[test]
    fn test_xlsx_import_renders_numeric_ids_as_text() {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, header) in REQUIRED_COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        worksheet.write_number(1, 0, 42.0).unwrap();
        worksheet.write_string(1, 1, "Ana").unwrap();
        worksheet.write_string(1, 2, "Av. Reforma 123").unwrap();
        worksheet.write_string(1, 3, "CDMX").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let records = parse_records("upload.xlsx", &bytes).unwrap();

        assert_eq!(records, vec![PassengerRecord::new("42", "Ana", "Av. Reforma 123", "CDMX")]);
    }
}
