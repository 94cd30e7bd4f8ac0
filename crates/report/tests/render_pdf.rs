use cmc_protocol::{ReasoningRow, Table};
use cmc_report::{LayoutStrategy, ReportRenderer, DEFAULT_REPORT_TITLE};
use lopdf::Document;

fn all_text(doc: &Document) -> String {
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).unwrap()
}

fn row(cqa: &str, methods: &str) -> ReasoningRow {
    ReasoningRow {
        cqa: cqa.into(),
        test_methods: methods.into(),
        control_action: "Specification".into(),
        justification: "AI Extracted".into(),
        reference: "PDF-LLM".into(),
    }
}

#[test]
fn empty_table_renders_header_on_a_single_page() {
    let table = Table::from_reasoning(&[]);
    let bytes = ReportRenderer::default()
        .render(&table, DEFAULT_REPORT_TITLE)
        .unwrap();

    let doc = Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
    let text = all_text(&doc);
    assert!(text.contains("Reasoning Results"), "{text:?}");
    assert!(text.contains("Test Methods"), "{text:?}");
    assert!(text.contains("Reference"), "{text:?}");
}

#[test]
fn sentinel_row_is_rendered() {
    let bytes = ReportRenderer::default()
        .render_reasoning(&[ReasoningRow::no_data()], "Results")
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    assert!(all_text(&doc).contains("No data found"));
}

#[test]
fn long_content_flows_onto_further_pages() {
    let mut methods = "HPLC, SEC-HPLC, CE-SDS, ".repeat(300);
    methods.push_str("Terminus");
    let rows: Vec<ReasoningRow> = (0..3).map(|i| row(&format!("CQA {i}"), &methods)).collect();

    let bytes = ReportRenderer::new(LayoutStrategy::Wrapped)
        .render_reasoning(&rows, "Results")
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert!(doc.get_pages().len() > 1);
    assert!(all_text(&doc).contains("Terminus"));
}

#[test]
fn fixed_width_layout_renders_every_row() {
    let rows: Vec<ReasoningRow> = (0..60).map(|i| row(&format!("Attribute{i}"), "Bioassay")).collect();
    let bytes = ReportRenderer::new(LayoutStrategy::FixedWidth)
        .render_reasoning(&rows, "Results")
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert!(doc.get_pages().len() > 1);
    let text = all_text(&doc);
    assert!(text.contains("Attribute0"));
    assert!(text.contains("Attribute59"));
}

#[test]
fn characters_outside_win_ansi_are_drawn_as_question_marks() {
    let rows = [row("α-Gal content", "HPLC"), row("純度", "CE")];
    let bytes = ReportRenderer::default()
        .render_reasoning(&rows, "Résultats")
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    let text = all_text(&doc);
    assert!(text.contains("?-Gal content"), "{text:?}");
    assert!(text.contains("??"), "{text:?}");
}

#[test]
fn long_title_is_wrapped_not_clipped() {
    let title = "Reasoning results for the antibody drug conjugate programme, \
                 Phase 3 comparability and stability protocol review";
    let bytes = ReportRenderer::default()
        .render_reasoning(&[ReasoningRow::no_data()], title)
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();

    assert_eq!(doc.get_pages().len(), 1);
    let text = all_text(&doc);
    for word in ["Reasoning", "conjugate", "comparability", "review"] {
        assert!(text.contains(word), "{word} missing from {text:?}");
    }
    assert!(text.contains("No data found"), "{text:?}");
}
