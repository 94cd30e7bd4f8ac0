use cmc_protocol::Table;
use serde::{Deserialize, Serialize};

/// How table columns are sized and decorated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutStrategy {
    /// Flow layout: widths stretched to the printable width, shaded header
    /// repeated on every page.
    #[default]
    Wrapped,

    /// Cell layout: widths clamped per column and left unstretched, plain
    /// header on the first page only.
    FixedWidth,
}

impl LayoutStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wrapped => "wrapped",
            Self::FixedWidth => "fixed_width",
        }
    }

    pub fn spec(self) -> LayoutSpec {
        match self {
            Self::Wrapped => LayoutSpec {
                title_size: 18.0,
                header_size: 12.0,
                body_size: 10.0,
                header_line_height: 14.0,
                body_line_height: 12.0,
                cell_padding: 4.0,
                min_column_width: 60.0,
                max_column_width: 200.0,
                points_per_char: 6.0,
                stretch_to_width: true,
                header_fill_gray: Some(0.83),
                repeat_header: true,
            },
            // 30 mm / 55 mm clamp, 2.2 mm per character, 8 mm lines.
            Self::FixedWidth => LayoutSpec {
                title_size: 12.0,
                header_size: 12.0,
                body_size: 11.0,
                header_line_height: 28.35,
                body_line_height: 22.68,
                cell_padding: 2.0,
                min_column_width: 85.04,
                max_column_width: 155.91,
                points_per_char: 6.236,
                stretch_to_width: false,
                header_fill_gray: None,
                repeat_header: false,
            },
        }
    }
}

impl std::str::FromStr for LayoutStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "wrapped" => Ok(Self::Wrapped),
            "fixed_width" | "fixed" => Ok(Self::FixedWidth),
            other => Err(format!("unknown report layout: {other}")),
        }
    }
}

/// Concrete sizes for one strategy, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSpec {
    pub title_size: f32,
    pub header_size: f32,
    pub body_size: f32,
    pub header_line_height: f32,
    pub body_line_height: f32,
    pub cell_padding: f32,
    pub min_column_width: f32,
    pub max_column_width: f32,
    pub points_per_char: f32,
    pub stretch_to_width: bool,
    pub header_fill_gray: Option<f32>,
    pub repeat_header: bool,
}

/// Column widths from the longest content per column (header included),
/// clamped to the layout's bounds, then fitted to `available` points.
pub fn column_widths(table: &Table, spec: &LayoutSpec, available: f32) -> Vec<f32> {
    let mut widths: Vec<f32> = (0..table.column_count())
        .map(|col| {
            let longest = table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .chain(std::iter::once(&table.columns[col]))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0);
            (longest as f32 * spec.points_per_char)
                .clamp(spec.min_column_width, spec.max_column_width)
        })
        .collect();

    let total: f32 = widths.iter().sum();
    if total > 0.0 && (spec.stretch_to_width || total > available) {
        let scale = available / total;
        for width in &mut widths {
            *width *= scale;
        }
    }
    widths
}
