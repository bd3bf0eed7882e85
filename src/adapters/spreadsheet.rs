use crate::domain::model::{CellValue, ProductRecord};
use crate::utils::error::Result;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};

pub fn spreadsheet_filename(label: &str) -> String {
    format!("{}.xlsx", label)
}

/// 第一欄是產品在回應中的位置（表頭空白），接著是依字母排序的欄位
pub fn write_products(records: &[ProductRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Sheet1")?;

    for (col, column) in ProductRecord::COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16 + 1, *column, &header)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_number_with_format(row, 0, record.index as f64, &header)?;

        for (col, cell) in record.cells().iter().enumerate() {
            let col = col as u16 + 1;
            match cell {
                CellValue::Text(text) => {
                    worksheet.write_string(row, col, *text)?;
                }
                CellValue::Number(value) => {
                    worksheet.write_number(row, col, *value)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
