use crate::error::Result;
use crate::layout::{column_widths, LayoutSpec, LayoutStrategy};
use crate::metrics::{encode_win_ansi, text_width, unencodable_chars, Font};
use crate::wrap::wrap_text;
use cmc_protocol::{ReasoningRow, Table};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, StringFormat, Stream};

/// US Letter, in points.
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const PAGE_MARGIN: f32 = 54.0;

const LINE_WIDTH: f32 = 0.5;
const TITLE_GAP: f32 = 12.0;
const TITLE_LEADING: f32 = 1.2;

/// Renders a [`Table`] into a paginated PDF document.
///
/// Both layouts share the same page model: a centred bold title on the first
/// page, bordered cells, and rows that continue on the next page when they
/// do not fit in the space left on the current one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportRenderer {
    strategy: LayoutStrategy,
}

impl ReportRenderer {
    pub fn new(strategy: LayoutStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    pub fn render_reasoning(&self, rows: &[ReasoningRow], title: &str) -> Result<Vec<u8>> {
        self.render(&Table::from_reasoning(rows), title)
    }

    pub fn render(&self, table: &Table, title: &str) -> Result<Vec<u8>> {
        let replaced = unencodable_in(table, title);
        if replaced > 0 {
            log::warn!(
                "report {title:?}: {replaced} characters outside WinAnsiEncoding are drawn as '?'"
            );
        }

        let spec = self.strategy.spec();
        let widths = column_widths(table, &spec, PAGE_WIDTH - 2.0 * PAGE_MARGIN);
        let mut pages = PageCursor::new(spec, widths);

        pages.title(title);
        pages.header(&table.columns);
        for row in &table.rows {
            pages.row(row);
        }

        let page_ops = pages.finish();
        log::debug!(
            "rendered report: {} rows on {} pages ({} layout)",
            table.rows.len(),
            page_ops.len(),
            self.strategy.as_str()
        );
        write_document(page_ops, title)
    }
}

/// Characters in the title and cells that the report fonts cannot encode.
fn unencodable_in(table: &Table, title: &str) -> usize {
    unencodable_chars(title)
        + table
            .columns
            .iter()
            .chain(table.rows.iter().flatten())
            .map(|cell| unencodable_chars(cell))
            .sum::<usize>()
}

/// Drawing state while laying out pages top to bottom.
struct PageCursor {
    spec: LayoutSpec,
    widths: Vec<f32>,
    header: Vec<Vec<String>>,
    pages: Vec<Vec<Operation>>,
    ops: Vec<Operation>,
    y: f32,
    fresh: bool,
}

impl PageCursor {
    fn new(spec: LayoutSpec, widths: Vec<f32>) -> Self {
        Self {
            spec,
            widths,
            header: Vec::new(),
            pages: Vec::new(),
            ops: page_prelude(),
            y: PAGE_HEIGHT - PAGE_MARGIN,
            fresh: true,
        }
    }

    /// Centred bold title, wrapped to the printable width.
    fn title(&mut self, title: &str) {
        let size = self.spec.title_size;
        let available = PAGE_WIDTH - 2.0 * PAGE_MARGIN;
        for (idx, line) in wrap_text(title, available, Font::Bold, size).iter().enumerate() {
            self.y -= if idx == 0 { size } else { size * TITLE_LEADING };
            if line.is_empty() {
                continue;
            }
            let x = PAGE_MARGIN + (available - text_width(line, Font::Bold, size)).max(0.0) / 2.0;
            push_text(&mut self.ops, Font::Bold, size, x, self.y, line);
        }
        self.y -= TITLE_GAP;
    }

    fn header(&mut self, columns: &[String]) {
        self.header = self.wrap_cells(columns, Font::Bold, self.spec.header_size);
        let cells = self.header.clone();
        self.draw_band(&cells, Font::Bold, true);
    }

    fn row(&mut self, cells: &[String]) {
        let wrapped = self.wrap_cells(cells, Font::Regular, self.spec.body_size);
        let line_height = self.spec.body_line_height;
        let mut offset = 0;

        loop {
            let needed = wrapped
                .iter()
                .map(|lines| lines.len().saturating_sub(offset))
                .max()
                .unwrap_or(0)
                .max(1);
            let usable = self.y - PAGE_MARGIN - 2.0 * self.spec.cell_padding;
            let capacity = if usable >= line_height {
                (usable / line_height).floor() as usize
            } else {
                0
            };
            if capacity == 0 && !self.fresh {
                self.new_page();
                continue;
            }

            let take = needed.min(capacity.max(1));
            let chunk: Vec<Vec<String>> = wrapped
                .iter()
                .map(|lines| lines.iter().skip(offset).take(take).cloned().collect())
                .collect();
            self.draw_band_with_lines(&chunk, Font::Regular, false, take);
            offset += take;

            if take >= needed {
                break;
            }
            self.new_page();
        }
    }

    fn wrap_cells(&self, cells: &[String], font: Font, size: f32) -> Vec<Vec<String>> {
        self.widths
            .iter()
            .enumerate()
            .map(|(col, width)| {
                let text = cells.get(col).map(String::as_str).unwrap_or("");
                wrap_text(text, width - 2.0 * self.spec.cell_padding, font, size)
            })
            .collect()
    }

    fn draw_band(&mut self, cells: &[Vec<String>], font: Font, is_header: bool) {
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        self.draw_band_with_lines(cells, font, is_header, lines);
    }

    fn draw_band_with_lines(
        &mut self,
        cells: &[Vec<String>],
        font: Font,
        is_header: bool,
        lines: usize,
    ) {
        let (size, line_height) = if is_header {
            (self.spec.header_size, self.spec.header_line_height)
        } else {
            (self.spec.body_size, self.spec.body_line_height)
        };
        let padding = self.spec.cell_padding;
        let height = lines as f32 * line_height + 2.0 * padding;
        let top = self.y;
        let bottom = top - height;

        let mut x = PAGE_MARGIN;
        for (col, width) in self.widths.iter().copied().enumerate() {
            if is_header {
                if let Some(gray) = self.spec.header_fill_gray {
                    self.ops.push(Operation::new("q", vec![]));
                    self.ops.push(Operation::new("g", vec![real(gray)]));
                    self.ops.push(rect(x, bottom, width, height));
                    self.ops.push(Operation::new("f", vec![]));
                    self.ops.push(Operation::new("Q", vec![]));
                }
            }
            self.ops.push(rect(x, bottom, width, height));
            self.ops.push(Operation::new("S", vec![]));

            // Baseline sits in the middle of each line slot.
            let first_baseline = top - padding - (line_height + size * 0.7) / 2.0;
            for (idx, line) in cells[col].iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline = first_baseline - idx as f32 * line_height;
                push_text(&mut self.ops, font, size, x + padding, baseline, line);
            }
            x += width;
        }

        self.y = bottom;
        self.fresh = false;
    }

    fn new_page(&mut self) {
        let finished = std::mem::replace(&mut self.ops, page_prelude());
        self.pages.push(finished);
        self.y = PAGE_HEIGHT - PAGE_MARGIN;
        self.fresh = true;
        if self.spec.repeat_header && !self.header.is_empty() {
            let cells = self.header.clone();
            self.draw_band(&cells, Font::Bold, true);
            // A repeated header alone does not make the page used.
            self.fresh = true;
        }
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        self.pages.push(self.ops);
        self.pages
    }
}

fn page_prelude() -> Vec<Operation> {
    vec![Operation::new("w", vec![real(LINE_WIDTH)])]
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> Operation {
    Operation::new("re", vec![real(x), real(y), real(width), real(height)])
}

fn push_text(ops: &mut Vec<Operation>, font: Font, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.resource_name().to_vec()), real(size)],
    ));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// PDF text string in UTF-16BE with a byte order mark, for document metadata.
fn utf16_text_string(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xfe, 0xff];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

fn write_document(pages: Vec<Vec<Operation>>, title: &str) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name().to_vec(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(utf16_text_string(title), StringFormat::Hexadecimal),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize, cell: &str) -> Table {
        Table::new(
            vec!["CQA".into(), "Test Methods".into()],
            (0..rows).map(|i| vec![format!("CQA {i}"), cell.to_string()]).collect(),
        )
    }

    fn page_count(spec: LayoutSpec, table: &Table) -> usize {
        let widths = column_widths(table, &spec, PAGE_WIDTH - 2.0 * PAGE_MARGIN);
        let mut cursor = PageCursor::new(spec, widths);
        cursor.title("t");
        cursor.header(&table.columns);
        for row in &table.rows {
            cursor.row(row);
        }
        cursor.finish().len()
    }

    #[test]
    fn header_only_table_fits_one_page() {
        let spec = LayoutStrategy::Wrapped.spec();
        assert_eq!(page_count(spec, &table(0, "")), 1);
    }

    #[test]
    fn many_rows_spill_onto_more_pages() {
        let spec = LayoutStrategy::Wrapped.spec();
        assert!(page_count(spec, &table(200, "HPLC")) > 1);
    }

    #[test]
    fn a_tall_row_is_split_across_pages() {
        let spec = LayoutStrategy::FixedWidth.spec();
        let long = "Bioassay ".repeat(600);
        assert!(page_count(spec, &table(1, &long)) > 1);
    }

    fn drawn_text(ops: &[Operation]) -> Vec<(f32, String)> {
        let mut x = 0.0;
        let mut lines = Vec::new();
        for op in ops {
            match (op.operator.as_str(), op.operands.first()) {
                ("Td", Some(Object::Real(value))) => x = *value,
                ("Tj", Some(Object::String(bytes, _))) => {
                    lines.push((x, String::from_utf8_lossy(bytes).into_owned()))
                }
                _ => {}
            }
        }
        lines
    }

    #[test]
    fn long_title_wraps_inside_the_margins() {
        let spec = LayoutStrategy::Wrapped.spec();
        let title = "Reasoning results for the antibody drug conjugate programme, \
                     Phase 3 comparability and stability protocol review";
        let mut cursor = PageCursor::new(spec, vec![100.0]);
        cursor.title(title);

        let lines = drawn_text(&cursor.ops);
        assert!(lines.len() > 1, "{lines:?}");
        for (x, line) in &lines {
            let width = text_width(line, Font::Bold, spec.title_size);
            assert!(*x >= PAGE_MARGIN, "{line:?} starts at {x}");
            assert!(x + width <= PAGE_WIDTH - PAGE_MARGIN + 0.01, "{line:?} ends at {}", x + width);
        }
        let joined: Vec<&str> = lines.iter().map(|(_, line)| line.as_str()).collect();
        assert_eq!(joined.join(" "), title.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn short_title_stays_on_one_centred_line() {
        let spec = LayoutStrategy::Wrapped.spec();
        let mut cursor = PageCursor::new(spec, vec![100.0]);
        cursor.title("Reasoning Results");

        let lines = drawn_text(&cursor.ops);
        assert_eq!(lines.len(), 1);
        let width = text_width("Reasoning Results", Font::Bold, spec.title_size);
        assert!((lines[0].0 - (PAGE_WIDTH - width) / 2.0).abs() < 0.01);
    }

    #[test]
    fn unencodable_characters_are_counted_across_title_and_cells() {
        let t = Table::new(
            vec!["CQA".into(), "Test Methods".into()],
            vec![vec!["α-Gal content".into(), "HPLC".into()], vec!["純度".into(), "".into()]],
        );
        assert_eq!(unencodable_in(&t, "Résultats"), 3);
        assert_eq!(unencodable_in(&table(3, "HPLC"), "Results"), 0);
    }

    #[test]
    fn repeated_header_is_drawn_on_continuation_pages() {
        let spec = LayoutStrategy::Wrapped.spec();
        let t = table(200, "HPLC");
        let widths = column_widths(&t, &spec, PAGE_WIDTH - 2.0 * PAGE_MARGIN);
        let mut cursor = PageCursor::new(spec, widths);
        cursor.header(&t.columns);
        for row in &t.rows {
            cursor.row(row);
        }
        let pages = cursor.finish();
        let header_fills = |ops: &Vec<Operation>| ops.iter().filter(|op| op.operator == "f").count();
        assert!(pages.iter().all(|ops| header_fills(ops) == 2));
    }
}
