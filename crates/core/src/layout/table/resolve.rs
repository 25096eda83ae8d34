//! Table region to table content.
//!
//! Regions crossed by rulings are resolved into a [`Grid`]. Without rulings the
//! region is handed to an external [`TableExtractor`]; when that finds
//! nothing either, the table renders empty.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::layout::elements::PageElems;
use crate::utils::Rect;

use super::grid::{Grid, GridSettings};

/// A table found by an external extractor. Cells carry only their areas;
/// their text is taken from the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTable {
    pub bbox: Rect,
    /// Cell areas row by row. An empty area marks a cell with no text.
    pub rows: Vec<Vec<Rect>>,
}

/// External table recognition, keyed by page and area.
pub trait TableExtractor: Send + Sync {
    /// Recognizes the table inside `area` of page `page_num` (1-based).
    fn extract(&self, page_num: usize, area: Rect) -> Result<Option<ExtractedTable>>;
}

/// What a table region resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum TableContent {
    Grid(Grid),
    Extracted(ExtractedTable),
    Empty,
}

/// Resolves the structure of the table at `region`.
pub fn resolve_table(
    page: &PageElems,
    region: Rect,
    settings: &GridSettings,
    extractor: Option<&dyn TableExtractor>,
) -> TableContent {
    let rulings = page.rulings_clipped_to(region, settings.min_cell_size);
    if !rulings.is_empty() {
        let grid = Grid::build(page, region, &rulings, settings);
        if !grid.is_empty() {
            return TableContent::Grid(grid);
        }
    }
    let Some(extractor) = extractor else {
        return TableContent::Empty;
    };
    debug!(page = page.page_num, area = ?region, "falling back to external table extraction");
    match extractor.extract(page.page_num, region) {
        Ok(Some(table)) => TableContent::Extracted(table),
        Ok(None) => TableContent::Empty,
        Err(e) => {
            warn!(page = page.page_num, error = %e, "table extraction failed");
            TableContent::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LayoutError;
    use crate::layout::elements::{Segment, TextLine};

    struct Fixed(Option<ExtractedTable>);

    impl TableExtractor for Fixed {
        fn extract(&self, _page_num: usize, _area: Rect) -> Result<Option<ExtractedTable>> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl TableExtractor for Failing {
        fn extract(&self, page_num: usize, _area: Rect) -> Result<Option<ExtractedTable>> {
            Err(LayoutError::TableExtraction {
                page: page_num,
                message: "no backend".into(),
            })
        }
    }

    fn page(segments: Vec<Segment>) -> PageElems {
        let mentions = vec![TextLine::new((120.0, 60.0, 140.0, 70.0), "a")];
        PageElems::new(1, 600.0, 800.0, mentions, segments, vec![], vec![])
    }

    const REGION: Rect = (100.0, 50.0, 300.0, 100.0);

    #[test]
    fn test_ruled_region_builds_grid() {
        let p = page(vec![
            Segment::new(1.0, (200.0, 50.0), (200.0, 100.0)),
            Segment::new(1.0, (100.0, 50.0), (300.0, 50.0)),
        ]);
        match resolve_table(&p, REGION, &GridSettings::default(), Some(&Fixed(None))) {
            TableContent::Grid(g) => assert_eq!(g.cells().len(), 2),
            other => panic!("expected a grid, got {other:?}"),
        }
    }

    #[test]
    fn test_rulings_running_past_region_are_clipped() {
        let p = page(vec![
            Segment::new(1.0, (200.0, 20.0), (200.0, 130.0)),
            Segment::new(1.0, (60.0, 75.0), (340.0, 75.0)),
        ]);
        match resolve_table(&p, REGION, &GridSettings::default(), None) {
            TableContent::Grid(g) => {
                assert_eq!((g.num_rows(), g.num_cols()), (2, 2));
                assert_eq!(g.cells().len(), 4);
            }
            other => panic!("expected a grid, got {other:?}"),
        }
    }

    #[test]
    fn test_unruled_region_falls_back() {
        let p = page(vec![]);
        let table = ExtractedTable {
            bbox: REGION,
            rows: vec![vec![(100.0, 50.0, 300.0, 100.0)]],
        };
        let got = resolve_table(&p, REGION, &GridSettings::default(), Some(&Fixed(Some(table.clone()))));
        assert_eq!(got, TableContent::Extracted(table));
        let got = resolve_table(&p, REGION, &GridSettings::default(), Some(&Fixed(None)));
        assert_eq!(got, TableContent::Empty);
        assert_eq!(resolve_table(&p, REGION, &GridSettings::default(), None), TableContent::Empty);
    }

    #[test]
    fn test_extractor_failure_degrades_to_empty() {
        let got = resolve_table(&page(vec![]), REGION, &GridSettings::default(), Some(&Failing));
        assert_eq!(got, TableContent::Empty);
    }
}
