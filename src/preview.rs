//! Terminal preview of a freshly fetched series.

use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_BORDERS_ONLY, Attribute, Cell, CellAlignment,
    ContentArrangement, Table,
};

use crate::model::PriceSample;

/// Rows shown after a fetch.
pub const PREVIEW_ROWS: usize = 5;

/// Renders the first `limit` samples as a bordered two-column table.
pub fn head_table(series: &[PriceSample], limit: usize) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_BORDERS_ONLY)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Timestamp (UTC)").add_attribute(Attribute::Bold),
            Cell::new("Price (USDT)")
                .add_attribute(Attribute::Bold)
                .set_alignment(CellAlignment::Right),
        ]);

    for sample in series.iter().take(limit) {
        table.add_row(vec![
            Cell::new(sample.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format!("{:.2}", sample.price)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn series(n: usize) -> Vec<PriceSample> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| PriceSample {
                timestamp: t0 + Duration::minutes(i as i64),
                price: 64100.25 + i as f64,
            })
            .collect()
    }

    #[test]
    fn caps_rows_at_limit() {
        let rendered = head_table(&series(8), PREVIEW_ROWS).to_string();
        assert!(rendered.contains("64100.25"));
        assert!(rendered.contains("64104.25"));
        assert!(!rendered.contains("64105.25"));
    }

    #[test]
    fn shorter_series_renders_fully() {
        let rendered = head_table(&series(2), PREVIEW_ROWS).to_string();
        assert!(rendered.contains("64100.25"));
        assert!(rendered.contains("64101.25"));
    }

    #[test]
    fn header_names_both_units() {
        let rendered = head_table(&series(1), PREVIEW_ROWS).to_string();
        assert!(rendered.contains("Timestamp (UTC)"));
        assert!(rendered.contains("Price (USDT)"));
        assert!(rendered.contains("2024-05-01 00:00:00"));
    }
}
