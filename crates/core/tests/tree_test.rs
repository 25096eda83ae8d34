//! End-to-end tree building over hand-built pages.

use pdftree_core::layout::{Figure, PageElems, PageStats, Segment, TableContent, TextLine};
use pdftree_core::predict::TableDetection;
use pdftree_core::tree::{TreeExtractor, TreeOptions, build_page_tree};
use pdftree_core::utils::{Rect, intersect};
use pdftree_core::NodeType;

fn line(x0: f64, y0: f64, x1: f64, text: &str) -> TextLine {
    TextLine::new((x0, y0, x1, y0 + 10.0), text).with_font("Times", 10.0)
}

fn paragraph(top: f64) -> Vec<TextLine> {
    vec![
        line(100.0, top, 500.0, "The results below were collected over three"),
        line(100.0, top + 12.0, 500.0, "separate runs of the experiment on the same"),
        line(100.0, top + 24.0, 320.0, "hardware and are averaged."),
    ]
}

const XS: [f64; 5] = [100.0, 200.0, 300.0, 400.0, 500.0];
const YS: [f64; 4] = [300.0, 330.0, 360.0, 390.0];

/// A paragraph above a fully ruled table of three rows and four columns.
fn report_page() -> PageElems {
    let mut mentions = paragraph(200.0);
    for w in YS.windows(2) {
        for v in XS.windows(2) {
            mentions.push(line(v[0] + 20.0, w[0] + 10.0, v[0] + 60.0, "12.5"));
        }
    }
    let mut segments: Vec<Segment> = XS.iter().map(|&x| Segment::new(1.0, (x, YS[0]), (x, YS[3]))).collect();
    segments.extend(YS.iter().map(|&y| Segment::new(1.0, (XS[0], y), (XS[4], y))));
    PageElems::new(1, 612.0, 792.0, mentions, segments, vec![], vec![])
}

fn rulings_extractor(pages: Vec<PageElems>) -> TreeExtractor {
    TreeExtractor::new(pages, TreeOptions::default()).with_detection(TableDetection::Rulings)
}

#[test]
fn test_ruled_table_below_paragraph() {
    let extractor = rulings_extractor(vec![report_page()]);
    let trees = extractor.build().unwrap();
    let tree = &trees[&1];

    let tables = tree.get(NodeType::Table);
    assert_eq!(tables.len(), 1);
    let (page, w, h, top, left, bottom, right) = tables[0];
    assert_eq!((page, w, h), (1, 612.0, 792.0));
    assert_eq!((top, left, bottom, right), (300.0, 100.0, 390.0, 500.0));

    let paragraphs = tree.get(NodeType::Paragraph);
    assert!(!paragraphs.is_empty());
    assert!(paragraphs.iter().all(|p| p.5 < top));

    let content = extractor.resolve_table(1, (left, top, right, bottom)).unwrap();
    match content {
        TableContent::Grid(grid) => {
            assert_eq!(grid.cells().len(), 12);
            assert!(grid.cells().iter().all(|c| c.texts.len() == 1));
        }
        other => panic!("expected a grid, got {other:?}"),
    }
}

#[test]
fn test_default_detection_takes_ruled_extent() {
    let extractor = TreeExtractor::new(vec![report_page()], TreeOptions::default());
    let trees = extractor.build().unwrap();
    let tree = &trees[&1];

    let tables = tree.get(NodeType::Table);
    assert_eq!(tables.len(), 1);
    let (_, _, _, top, left, bottom, right) = tables[0];
    assert_eq!((top, left, bottom, right), (300.0, 100.0, 390.0, 500.0));
    assert!(tree.get(NodeType::Paragraph).iter().all(|p| p.5 < top));

    match extractor.resolve_table(1, (left, top, right, bottom)).unwrap() {
        TableContent::Grid(grid) => {
            assert_eq!((grid.num_rows(), grid.num_cols()), (3, 4));
            assert_eq!(grid.cells().len(), 12);
            assert!(grid.cells().iter().all(|c| c.texts.len() == 1));
        }
        other => panic!("expected a grid, got {other:?}"),
    }
}

#[test]
fn test_sequential_and_parallel_agree() {
    let pages = vec![report_page(), {
        let mut p = report_page();
        p.page_num = 2;
        p
    }];
    let parallel = rulings_extractor(pages.clone()).build().unwrap();
    let options = TreeOptions {
        parallel: false,
        ..TreeOptions::default()
    };
    let sequential = TreeExtractor::new(pages, options)
        .with_detection(TableDetection::Rulings)
        .build()
        .unwrap();
    assert_eq!(parallel, sequential);
    assert_eq!(parallel.len(), 2);
}

fn references_page() -> PageElems {
    let mut mentions = vec![line(100.0, 100.0, 180.0, "References")];
    let entries = [
        "[1] A. Author. On layouts. 2001.",
        "[2] B. Author. Parsing pages. 2004.",
        "[3] C. Author. Columns and rows. 2008.",
        "[4] D. Author. Documents at scale. 2012.",
        "[5] E. Author. Trees of regions. 2016.",
    ];
    for (i, text) in entries.iter().enumerate() {
        mentions.push(line(100.0, 130.0 + i as f64 * 12.0, 420.0, text));
    }
    let segments = vec![Segment::new(1.0, (100.0, 760.0), (500.0, 760.0))];
    PageElems::new(1, 612.0, 792.0, mentions, segments, vec![], vec![])
}

#[test]
fn test_references_become_a_list() {
    let page = references_page();
    let stats = PageStats::of_page(&page);
    let (tree, ref_seen) = build_page_tree(&page, &stats, false, &[], &TreeOptions::default());
    assert!(ref_seen);
    assert_eq!(tree.get(NodeType::SectionHeader).len(), 1);
    assert_eq!(tree.get(NodeType::SectionHeader)[0].3, 100.0);
    let lists = tree.get(NodeType::List);
    assert_eq!(lists.len(), 1);
    assert_eq!((lists[0].3, lists[0].5), (130.0, 188.0));
    assert!(tree.get(NodeType::Paragraph).is_empty());
}

#[test]
fn test_references_carry_to_the_next_page() {
    let mut next = PageElems::new(2, 612.0, 792.0, paragraph(100.0), vec![], vec![], vec![]);
    next.segments.push(Segment::new(1.0, (100.0, 760.0), (500.0, 760.0)));
    let trees = rulings_extractor(vec![references_page(), next]).build().unwrap();
    assert!(trees[&2].get(NodeType::Paragraph).is_empty());
    assert_eq!(trees[&2].get(NodeType::List).len(), 1);
}

#[test]
fn test_favor_figures_keeps_regions_apart() {
    let mut page = report_page();
    page.figures.push(Figure::new((80.0, 180.0, 520.0, 320.0)));
    let stats = PageStats::of_page(&page);
    let table: [Rect; 1] = [(100.0, 300.0, 500.0, 390.0)];
    let (tree, _) = build_page_tree(&page, &stats, false, &table, &TreeOptions::default());
    let figures: Vec<Rect> = tree.get(NodeType::Figure).iter().map(|b| (b.4, b.3, b.6, b.5)).collect();
    assert_eq!(figures.len(), 1);
    assert!(tree.get(NodeType::Table).is_empty());
    for (kind, bbox) in tree.regions() {
        if kind != NodeType::Figure {
            assert!(figures.iter().all(|&f| !intersect(f, bbox)), "{kind} overlaps a figure");
        }
    }
}
