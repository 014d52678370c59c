//! Integration tests for pdf-outline

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use pdf_outline::{
    extract_outline, extract_outline_mem, load_document_mem, outline_document, run_batch, BBox,
    BatchConfig, HeadingLevel, Line, OutlineEntry, OutlineOptions, Page, PdfDocument, Span,
};
use std::fs;

// Helper to create a span whose box starts at `top`
fn make_span(text: &str, top: f32, font_size: f32, font: &str) -> Span {
    Span {
        text: text.to_string(),
        font_size,
        font: font.to_string(),
        bbox: BBox::new(72.0, top, 72.0 + text.len() as f32 * font_size * 0.5, top + font_size),
    }
}

fn make_line(text: &str, top: f32, font_size: f32, font: &str) -> Line {
    Line::from_spans(vec![make_span(text, top, font_size, font)])
}

fn make_page(lines: Vec<Line>) -> Page {
    Page {
        width: 600.0,
        height: 800.0,
        lines,
    }
}

fn body_lines(start_top: f32, count: usize) -> Vec<Line> {
    (0..count)
        .map(|i| {
            make_line(
                "Plain body text that keeps going across the page.",
                start_top + i as f32 * 14.0,
                10.0,
                "Times-Roman",
            )
        })
        .collect()
}

fn entry(level: HeadingLevel, text: &str, page: u32) -> OutlineEntry {
    OutlineEntry {
        level,
        text: text.to_string(),
        page,
    }
}

/// One shown string: (font resource, text, size, x, baseline y)
type Shown<'a> = (&'a str, &'a str, i64, i64, i64);

/// Build a PDF with Helvetica (F1) and Helvetica-Bold (F2) on US Letter pages
fn build_pdf(pages: &[Vec<Shown<'_>>], title: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let mut kids: Vec<Object> = Vec::new();
    for shown in pages {
        let mut operations = Vec::new();
        for &(font, text, size, x, y) in shown {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => regular, "F2" => bold },
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! { "Title" => Object::string_literal(title) });
        doc.trailer.set("Info", info_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

const BODY: &str = "This is ordinary body text for the report.";

/// Title, numbered headings, a wrapped heading, a page number and a footer
fn report_pages() -> Vec<Vec<Shown<'static>>> {
    vec![
        vec![
            ("F2", "Annual Report", 24, 72, 740),
            ("F2", "1 Introduction", 14, 72, 560),
            ("F1", BODY, 10, 72, 540),
            ("F1", BODY, 10, 72, 528),
            ("F1", BODY, 10, 72, 516),
            ("F1", BODY, 10, 72, 504),
            ("F2", "1.1 Background", 12, 72, 480),
            ("F1", BODY, 10, 72, 460),
            ("F1", BODY, 10, 72, 448),
            ("F1", BODY, 10, 72, 436),
            ("F1", BODY, 10, 72, 424),
            ("F1", "   7   ", 10, 300, 400),
            ("F2", "A Heading Split Across", 18, 72, 360),
            ("F2", "Two Lines", 18, 72, 338),
            ("F1", BODY, 10, 72, 310),
            ("F1", BODY, 10, 72, 298),
            ("F2", "Confidential draft", 16, 72, 50),
        ],
        vec![
            ("F1", "Appendix A: Notes", 10, 72, 700),
            ("F1", BODY, 10, 72, 680),
            ("F1", BODY, 10, 72, 668),
        ],
    ]
}

// ============================================================================
// End-to-end tests on generated PDFs
// ============================================================================

#[test]
fn test_generated_pdf_outline() {
    let pdf = build_pdf(&report_pages(), None);
    let result = extract_outline_mem(&pdf, "report.pdf", &OutlineOptions::default()).unwrap();

    assert_eq!(result.title, "Annual Report");
    assert_eq!(
        result.outline,
        vec![
            entry(HeadingLevel::H1, "Annual Report", 1),
            entry(HeadingLevel::H1, "1 Introduction", 1),
            entry(HeadingLevel::H2, "1.1 Background", 1),
            entry(HeadingLevel::H1, "A Heading Split Across Two Lines", 1),
            entry(HeadingLevel::H1, "Appendix A: Notes", 2),
        ]
    );
}

#[test]
fn test_generated_pdf_layout() {
    let pdf = build_pdf(&report_pages(), Some("Report 2024"));
    let doc = load_document_mem(&pdf).unwrap();

    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.title.as_deref(), Some("Report 2024"));
    assert_eq!(doc.pages[0].width, 612.0);
    assert_eq!(doc.pages[0].height, 792.0);

    let first = &doc.pages[0].lines[0];
    assert_eq!(first.text(), "Annual Report");
    assert_eq!(first.spans[0].font, "Helvetica-Bold");
    assert_eq!(first.spans[0].font_size, 24.0);
    // Baseline 740 in PDF space is 52 from the top of the page
    assert!(first.bbox.top < 52.0 && first.bbox.bottom > 52.0);
}

#[test]
fn test_metadata_title_preferred() {
    let pdf = build_pdf(&report_pages(), Some("  Official Title "));
    let result = extract_outline_mem(&pdf, "report.pdf", &OutlineOptions::default()).unwrap();
    assert_eq!(result.title, "Official Title");
}

#[test]
fn test_metadata_title_latin1_bytes() {
    let mut doc = Document::load_mem(&build_pdf(&report_pages(), None)).unwrap();
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(b"R\xe9sum\xe9".to_vec(), StringFormat::Literal),
    });
    doc.trailer.set("Info", info_id);
    let mut pdf = Vec::new();
    doc.save_to(&mut pdf).unwrap();

    let result = extract_outline_mem(&pdf, "cv.pdf", &OutlineOptions::default()).unwrap();
    assert_eq!(result.title, "R\u{e9}sum\u{e9}");
    assert!(result.to_json().unwrap().contains("\"title\": \"R\u{e9}sum\u{e9}\""));
}

#[test]
fn test_body_only_document_has_empty_outline() {
    let pages = vec![vec![
        ("F1", BODY, 10, 72, 700),
        ("F1", BODY, 10, 72, 688),
        ("F1", BODY, 10, 72, 676),
    ]];
    let pdf = build_pdf(&pages, Some("Plain Memo"));
    let result = extract_outline_mem(&pdf, "memo.pdf", &OutlineOptions::default()).unwrap();

    assert!(result.outline.is_empty());
    assert_eq!(
        result.to_json().unwrap(),
        "{\n    \"title\": \"Plain Memo\",\n    \"outline\": []\n}"
    );
}

#[test]
fn test_pipeline_is_deterministic() {
    let pdf = build_pdf(&report_pages(), None);
    let options = OutlineOptions::default();
    let first = extract_outline_mem(&pdf, "r.pdf", &options).unwrap().to_json().unwrap();
    let second = extract_outline_mem(&pdf, "r.pdf", &options).unwrap().to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_page_numbers_in_range() {
    let pdf = build_pdf(&report_pages(), None);
    let page_count = load_document_mem(&pdf).unwrap().page_count() as u32;
    let result = extract_outline_mem(&pdf, "r.pdf", &OutlineOptions::default()).unwrap();

    assert!(!result.outline.is_empty());
    assert!(result.outline.iter().all(|e| e.page >= 1 && e.page <= page_count));
}

#[test]
fn test_garbage_input_is_parse_error() {
    assert!(extract_outline_mem(b"not a pdf at all", "x.pdf", &OutlineOptions::default()).is_err());
}

#[test]
fn test_extract_outline_nonexistent_file() {
    assert!(extract_outline("/nonexistent/file.pdf", &OutlineOptions::default()).is_err());
}

// ============================================================================
// Batch tests
// ============================================================================

#[test]
fn test_batch_writes_json_and_skips_failures() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let out_dir = output.path().join("nested/out");

    fs::write(input.path().join("report.pdf"), build_pdf(&report_pages(), None)).unwrap();
    fs::write(input.path().join("broken.pdf"), b"%PDF-1.4 garbage").unwrap();
    fs::write(input.path().join("readme.txt"), b"ignored").unwrap();

    let summary = run_batch(&BatchConfig::new(input.path(), &out_dir)).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);

    let json = fs::read_to_string(out_dir.join("report.json")).unwrap();
    assert!(json.starts_with("{\n    \"title\": \"Annual Report\",\n    \"outline\": ["));
    assert!(json.contains("\"text\": \"A Heading Split Across Two Lines\""));
    assert!(!out_dir.join("broken.json").exists());
    assert!(!out_dir.join("readme.json").exists());
}

#[test]
fn test_batch_uses_pdfs_subdirectory() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let nested = input.path().join("pdfs");
    fs::create_dir(&nested).unwrap();
    let pdf = build_pdf(&[vec![("F1", BODY, 10, 72, 700)]], None);
    fs::write(nested.join("memo.pdf"), pdf).unwrap();

    let summary = run_batch(&BatchConfig::new(input.path(), output.path())).unwrap();
    assert_eq!(summary.processed, 1);

    let json = fs::read_to_string(output.path().join("memo.json")).unwrap();
    assert!(json.contains("\"outline\": []"));
}

// ============================================================================
// Pipeline tests on hand-built layouts
// ============================================================================

#[test]
fn test_wrapped_heading_gap_threshold() {
    // Lines are 16 tall: gap 10 merges, gap 20 does not
    let mut lines = body_lines(400.0, 8);
    lines.push(make_line("Results Of The", 100.0, 16.0, "Arial-Bold"));
    lines.push(make_line("Study", 126.0, 16.0, "Arial-Bold"));
    lines.push(make_line("Separate", 162.0, 16.0, "Arial-Bold"));
    let doc = PdfDocument {
        pages: vec![make_page(lines)],
        title: None,
    };

    let result = outline_document(&doc, "a.pdf", &OutlineOptions::default());
    assert_eq!(
        result.outline,
        vec![
            entry(HeadingLevel::H1, "Results Of The Study", 1),
            entry(HeadingLevel::H1, "Separate", 1),
        ]
    );
}

#[test]
fn test_outline_sorted_by_top_within_page() {
    let mut lines = body_lines(300.0, 8);
    lines.push(make_line("2 Later", 200.0, 10.0, "Times-Roman"));
    lines.push(make_line("1 Earlier", 100.0, 10.0, "Times-Roman"));
    let doc = PdfDocument {
        pages: vec![make_page(lines)],
        title: None,
    };

    let result = outline_document(&doc, "a.pdf", &OutlineOptions::default());
    let texts: Vec<&str> = result.outline.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["1 Earlier", "2 Later"]);
}

#[test]
fn test_footer_and_page_number_lines_ignored() {
    let mut lines = body_lines(300.0, 8);
    lines.push(make_line("Footer Heading", 760.0, 20.0, "Arial-Bold"));
    lines.push(make_line("Kept Heading", 640.0, 20.0, "Arial-Bold"));
    lines.push(make_line("   7   ", 700.0, 20.0, "Arial-Bold"));
    let doc = PdfDocument {
        pages: vec![make_page(lines)],
        title: None,
    };

    let result = outline_document(&doc, "a.pdf", &OutlineOptions::default());
    assert_eq!(result.outline, vec![entry(HeadingLevel::H1, "Kept Heading", 1)]);
}

#[test]
fn test_long_bold_line_is_not_heading() {
    let sentence = vec!["emphasis"; 20].join(" ");
    let mut lines = body_lines(300.0, 8);
    lines.push(make_line(&sentence, 100.0, 16.0, "Arial-Bold"));
    let doc = PdfDocument {
        pages: vec![make_page(lines)],
        title: Some("Doc".into()),
    };

    let result = outline_document(&doc, "a.pdf", &OutlineOptions::default());
    assert!(result.outline.is_empty());
}

#[test]
fn test_custom_merge_gap() {
    let mut lines = body_lines(400.0, 8);
    lines.push(make_line("Results Of The", 100.0, 16.0, "Arial-Bold"));
    lines.push(make_line("Study", 136.0, 16.0, "Arial-Bold"));
    let doc = PdfDocument {
        pages: vec![make_page(lines)],
        title: None,
    };

    let options = OutlineOptions {
        merge_gap: 25.0,
        ..OutlineOptions::default()
    };
    let result = outline_document(&doc, "a.pdf", &options);
    assert_eq!(result.outline.len(), 1);
}

#[test]
fn test_empty_document() {
    let result = outline_document(&PdfDocument::default(), "empty.pdf", &OutlineOptions::default());
    assert_eq!(result.title, "empty.pdf");
    assert!(result.outline.is_empty());
}

#[test]
fn test_options_default() {
    let options = OutlineOptions::default();
    assert_eq!(options.max_line_chars, 250);
    assert_eq!(options.max_heading_words, 15);
    assert!((options.merge_gap - 15.0).abs() < 0.001);
    assert!((options.h1_ratio - 1.4).abs() < 0.001);
    assert!((options.h2_ratio - 1.15).abs() < 0.001);
}
