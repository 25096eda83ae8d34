//! hOCR rendering of layout trees.
//!
//! Each page becomes an `ocr_page` div holding its regions in reading
//! order. Text regions carry their type in a `pdftotree` attribute and are
//! broken down into `ocrx_line` and `ocrx_word` spans with page-unit boxes,
//! so the output can be laid over a rendering of the page.

use std::io::Write;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::layout::elements::PageElems;
use crate::layout::node::NodeType;
use crate::layout::table::{ExtractedTable, Grid, TableContent};
use crate::tree::{DocumentTree, TreeExtractor};
use crate::utils::{HasBBox, Rect, area, bbox_repr, enc, reading_order, round_px};

static CONTROL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]+").unwrap());

const CAPABILITIES: &str = "ocr_page ocr_table ocrx_block ocrx_line ocrx_word";

/// Escapes `text` for HTML after dropping control characters.
fn clean(text: &str) -> String {
    enc(&CONTROL_RE.replace_all(text, "")).into_owned()
}

/// Writes hOCR documents.
pub struct HocrRenderer<W: Write> {
    out: W,
}

impl<W: Write> HocrRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Renders the trees built by `extractor` as one HTML document.
    pub fn render(&mut self, extractor: &TreeExtractor, trees: &DocumentTree) -> Result<()> {
        self.write_header(extractor.pages().len())?;
        for (&page_num, tree) in trees {
            let page = extractor.page(page_num)?;
            self.begin_page(page)?;
            let mut regions: Vec<(NodeType, Rect)> = tree.regions().collect();
            regions.sort_by(|a, b| reading_order(a.1, b.1));
            for (kind, bbox) in regions {
                match kind {
                    NodeType::Table => {
                        let content = extractor.resolve_table(page_num, bbox)?;
                        self.write_table(page, bbox, &content)?;
                    }
                    NodeType::Figure => {
                        writeln!(self.out, "<figure title=\"{}\"></figure>", bbox_repr(bbox))?;
                    }
                    _ => self.write_block(page, kind, bbox)?,
                }
            }
            writeln!(self.out, "</div>")?;
        }
        writeln!(self.out, "</body>\n</html>")?;
        self.out.flush()?;
        Ok(())
    }

    fn write_header(&mut self, num_pages: usize) -> Result<()> {
        writeln!(self.out, "<html>\n<head>")?;
        writeln!(
            self.out,
            "<meta name=\"ocr-system\" content=\"Converted from PDF by pdftotree {}\">",
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.out, "<meta name=\"ocr-capabilities\" content=\"{CAPABILITIES}\">")?;
        writeln!(self.out, "<meta name=\"ocr-number-of-pages\" content=\"{num_pages}\">")?;
        writeln!(self.out, "</head>\n<body>")?;
        Ok(())
    }

    fn begin_page(&mut self, page: &PageElems) -> Result<()> {
        writeln!(
            self.out,
            "<div class=\"ocr_page\" id=\"page_{}\" title=\"bbox 0 0 {} {}; ppageno {}\">",
            page.page_num,
            round_px(page.width),
            round_px(page.height),
            page.page_num.saturating_sub(1)
        )?;
        Ok(())
    }

    fn write_block(&mut self, page: &PageElems, kind: NodeType, bbox: Rect) -> Result<()> {
        writeln!(
            self.out,
            "<div class=\"ocrx_block\" pdftotree=\"{kind}\" title=\"{}\">",
            bbox_repr(bbox)
        )?;
        let mut lines = page.mentions_within(bbox);
        lines.sort_by(|&a, &b| reading_order(page.mentions[a].bbox(), page.mentions[b].bbox()));
        self.write_lines(page, &lines)?;
        writeln!(self.out, "</div>")?;
        Ok(())
    }

    fn write_lines(&mut self, page: &PageElems, lines: &[usize]) -> Result<()> {
        for &i in lines {
            let line = &page.mentions[i];
            write!(self.out, "<span class=\"ocrx_line\" title=\"{}\">", bbox_repr(line.bbox()))?;
            for (word, wbox) in line.words() {
                write!(
                    self.out,
                    "<span class=\"ocrx_word\" title=\"{}\">{}</span>",
                    bbox_repr(wbox),
                    clean(&word)
                )?;
            }
            writeln!(self.out, "</span>")?;
        }
        Ok(())
    }

    fn write_table(&mut self, page: &PageElems, bbox: Rect, content: &TableContent) -> Result<()> {
        writeln!(self.out, "<table class=\"ocr_table\" title=\"{}\">", bbox_repr(bbox))?;
        match content {
            TableContent::Grid(grid) => self.write_grid(page, grid)?,
            TableContent::Extracted(table) => self.write_extracted(page, table)?,
            TableContent::Empty => {}
        }
        writeln!(self.out, "</table>")?;
        Ok(())
    }

    fn write_grid(&mut self, page: &PageElems, grid: &Grid) -> Result<()> {
        for row in grid.rows() {
            writeln!(self.out, "<tr>")?;
            for cell in row {
                write!(self.out, "<td title=\"{}\"", bbox_repr(grid.cell_bbox(cell)))?;
                if cell.rowspan() > 1 {
                    write!(self.out, " rowspan=\"{}\"", cell.rowspan())?;
                }
                if cell.colspan() > 1 {
                    write!(self.out, " colspan=\"{}\"", cell.colspan())?;
                }
                writeln!(self.out, ">")?;
                self.write_lines(page, &cell.texts)?;
                writeln!(self.out, "</td>")?;
            }
            writeln!(self.out, "</tr>")?;
        }
        Ok(())
    }

    fn write_extracted(&mut self, page: &PageElems, table: &ExtractedTable) -> Result<()> {
        for row in &table.rows {
            writeln!(self.out, "<tr>")?;
            for &cell in row {
                if area(cell) <= 0.0 {
                    writeln!(self.out, "<td></td>")?;
                    continue;
                }
                writeln!(self.out, "<td title=\"{}\">", bbox_repr(cell))?;
                let mut lines = page.mentions_within(cell);
                lines.sort_by(|&a, &b| reading_order(page.mentions[a].bbox(), page.mentions[b].bbox()));
                self.write_lines(page, &lines)?;
                writeln!(self.out, "</td>")?;
            }
            writeln!(self.out, "</tr>")?;
        }
        Ok(())
    }
}

/// Renders the trees built by `extractor` into a string.
pub fn render_hocr(extractor: &TreeExtractor, trees: &DocumentTree) -> Result<String> {
    let mut renderer = HocrRenderer::new(Vec::new());
    renderer.render(extractor, trees)?;
    Ok(String::from_utf8_lossy(&renderer.into_inner()).into_owned())
}
