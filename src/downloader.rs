use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;

use crate::error::AppError;
use crate::models::Reel;

/// File name offered for the stock export
pub const STOCK_EXPORT_FILE: &str = "ReelsInStock.xlsx";

/// Internal identifier fields never exported
const HIDDEN_FIELDS: &[&str] = &["_id", "id"];

/// Rows of the stock export: a header row of field names plus one row per reel
///
/// Cells come from each reel's record as the backend sent it, so columns
/// and cell types follow the backend. Columns follow the order fields first
/// appear in across all reels; fields only some records carry still get a
/// column.
pub fn stock_rows(reels: &[Reel]) -> (Vec<String>, Vec<Vec<Value>>) {
    let mut headers: Vec<String> = Vec::new();
    for reel in reels {
        for key in reel.raw.keys() {
            if !HIDDEN_FIELDS.contains(&key.as_str()) && !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = reels
        .iter()
        .map(|reel| {
            headers
                .iter()
                .map(|h| reel.raw.get(h).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    (headers, rows)
}

/// Convert the filtered reel set to XLSX format
///
/// # Arguments
/// * `reels` - The reels currently shown in the stock table
///
/// # Returns
/// * `Result<Vec<u8>, AppError>` - XLSX file content as bytes or an error
pub fn to_xlsx(reels: &[Reel]) -> Result<Vec<u8>, AppError> {
    let (headers, rows) = stock_rows(reels);

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Reels")?;

    for (c, header) in headers.iter().enumerate() {
        worksheet.write_string(0, c as u16, header)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let row_num = (r + 1) as u32;
        for (c, value) in row.iter().enumerate() {
            let col = c as u16;
            match value {
                Value::Null => {}
                Value::Number(n) => {
                    if let Some(n) = n.as_f64() {
                        worksheet.write_number(row_num, col, n)?;
                    }
                }
                Value::String(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Value::Bool(b) => {
                    worksheet.write_boolean(row_num, col, *b)?;
                }
                other => {
                    worksheet.write_string(row_num, col, &other.to_string())?;
                }
            }
        }
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reel(value: Value) -> Reel {
        Reel::from_json(value).unwrap()
    }

    #[test]
    fn identifier_is_not_exported() {
        let reels = [
            reel(json!({ "_id": "x1", "barcodeId": "R1", "currentWeight": 10.25 })),
            reel(json!({ "barcodeId": "R2", "currentWeight": 3 })),
        ];
        let (headers, rows) = stock_rows(&reels);
        assert_eq!(headers, vec!["barcodeId", "currentWeight"]);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn cells_keep_backend_types_and_columns() {
        let reels = [reel(json!({ "barcodeId": "R1", "gsm": 120, "deckle": "30", "inStock": true }))];
        let (headers, rows) = stock_rows(&reels);
        // nothing the backend did not send
        assert!(!headers.iter().any(|h| h == "reelNo"));
        let gsm = headers.iter().position(|h| h == "gsm").unwrap();
        let deckle = headers.iter().position(|h| h == "deckle").unwrap();
        assert_eq!(rows[0][gsm], Value::from(120));
        assert_eq!(rows[0][deckle], Value::from("30"));
    }

    #[test]
    fn extra_fields_get_their_own_column() {
        let reels = [
            reel(json!({ "barcodeId": "R0" })),
            reel(json!({ "barcodeId": "R1", "location": "Bay 4" })),
        ];
        let (headers, rows) = stock_rows(&reels);
        let col = headers.iter().position(|h| h == "location").unwrap();
        assert_eq!(rows[0][col], Value::Null);
        assert_eq!(rows[1][col], Value::from("Bay 4"));
    }

    #[test]
    fn xlsx_is_a_zip_container() {
        let bytes = to_xlsx(&[reel(json!({ "_id": "x", "barcodeId": "R1", "gsm": 120 }))]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn empty_set_still_exports() {
        let (headers, rows) = stock_rows(&[]);
        assert!(headers.is_empty() && rows.is_empty());
        assert!(to_xlsx(&[]).is_ok());
    }
}
