//! Printable sticker sheet: one fixed-size label per usage record.

use serde::Serialize;

use crate::config::LabelConfig;
use crate::error::AppError;
use crate::history::PrintRecord;
use crate::templates;

const MM_PER_INCH: f64 = 25.4;
const CSS_PX_PER_INCH: f64 = 96.0;

#[derive(Debug, Serialize)]
struct Sticker<'a> {
    entry: usize,
    total: usize,
    record: &'a PrintRecord,
}

#[derive(Debug, Serialize)]
struct StickerSheet<'a> {
    barcode: &'a str,
    width_mm: u32,
    height_mm: u32,
    close_delay_ms: u32,
    stickers: Vec<Sticker<'a>>,
}

/// Render the print document for `records`
///
/// The document sizes its page to the label, breaks the page after every
/// sticker, opens the print dialog on load and closes itself afterwards.
pub fn render(barcode: &str, records: &[PrintRecord], label: &LabelConfig) -> Result<String, AppError> {
    if records.is_empty() {
        return Err(AppError::validation(format!(
            "Reel {} has no usage entries to print.",
            barcode
        )));
    }

    let total = records.len();
    let sheet = StickerSheet {
        barcode,
        width_mm: label.width_mm,
        height_mm: label.height_mm,
        close_delay_ms: label.close_delay_ms,
        stickers: records
            .iter()
            .enumerate()
            .map(|(i, record)| Sticker {
                entry: i + 1,
                total,
                record,
            })
            .collect(),
    };
    templates::render("stickers", &sheet)
}

/// Browser window size in CSS pixels for a label of `mm` millimetres
pub fn window_px(mm: u32) -> u32 {
    (mm as f64 / MM_PER_INCH * CSS_PX_PER_INCH).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format;

    fn record(client: &str, date_out: &str) -> PrintRecord {
        PrintRecord {
            client: client.to_string(),
            product_type: "RSC box".to_string(),
            quantity: "500".to_string(),
            size: "12x10x8".to_string(),
            unit: "pcs".to_string(),
            box_count: "500".to_string(),
            weight_consumed: "42.00".to_string(),
            previous_weight: "300.00".to_string(),
            usage_type: "FULL".to_string(),
            date_in: "March 5, 2024 at 9:00 AM".to_string(),
            date_out: date_out.to_string(),
        }
    }

    #[test]
    fn one_block_per_record_with_entry_markers() {
        let records = vec![record("Acme", format::ACTIVE), record("Globex", "March 6, 2024 at 1:00 PM")];
        let html = render("B123", &records, &LabelConfig::default()).unwrap();

        assert_eq!(html.matches("<div class=\"sticker\">").count(), 2);
        assert!(html.contains("Entry 1 of 2"));
        assert!(html.contains("Entry 2 of 2"));
        assert_eq!(html.matches(">B123<").count(), 2);
        assert!(html.contains("<td>Active</td>"));
    }

    #[test]
    fn page_matches_label_and_prints_itself() {
        let label = LabelConfig {
            width_mm: 80,
            height_mm: 50,
            close_delay_ms: 750,
        };
        let html = render("B1", &[record("Acme", format::ACTIVE)], &label).unwrap();
        assert!(html.contains("size: 80mm 50mm"));
        assert!(html.contains("page-break-after: always"));
        assert!(html.contains("window.print()"));
        assert!(html.contains("window.close(); }, 750"));
    }

    #[test]
    fn last_sticker_does_not_force_a_blank_page() {
        let records = vec![record("Acme", format::ACTIVE), record("Globex", format::ACTIVE)];
        let html = render("B123", &records, &LabelConfig::default()).unwrap();

        assert!(html.contains(".sticker:last-of-type { page-break-after: auto;"));
        // nothing but the closing tags may follow the last block
        let last = html.rfind("<div class=\"sticker\">").unwrap();
        let end = last + html[last..].find("</table>\n</div>").unwrap() + "</table>\n</div>".len();
        assert_eq!(html[end..].trim(), "</body>\n</html>");
    }

    #[test]
    fn nothing_to_print_is_rejected() {
        let err = render("B1", &[], &LabelConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn window_size() {
        assert_eq!(window_px(100), 378);
        assert_eq!(window_px(75), 283);
    }
}
