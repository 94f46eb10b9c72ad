use crate::directory::Directory;
use crate::error::Result;
use crate::model::{AttendanceEntry, PersonRecord};
use crate::registry::Classification;
use chrono::NaiveDate;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::path::{Path, PathBuf};

const UNKNOWN: &str = "desconhecido";

pub fn output_path(date: NaiveDate, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| PathBuf::from(format!("chamada-{}.xlsx", date.format("%Y-%m-%d"))))
}

/// Banner, header cells, body cells, and the left-aligned justification column.
struct ReportFormats {
    title: Format,
    header: Format,
    cell: Format,
    reason: Format,
}

impl ReportFormats {
    fn new() -> Self {
        let bordered = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap();
        Self {
            title: Format::new()
                .set_bold()
                .set_font_size(16)
                .set_align(FormatAlign::Center),
            header: bordered
                .clone()
                .set_bold()
                .set_background_color(Color::Silver)
                .set_align(FormatAlign::Center),
            cell: bordered.clone().set_align(FormatAlign::Center),
            reason: bordered.set_align(FormatAlign::Left),
        }
    }
}

/// The three admin tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Confirmed,
    Justified,
    Absent,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Confirmed, Category::Justified, Category::Absent];

    pub fn title(self) -> &'static str {
        match self {
            Category::Confirmed => "Confirmados",
            Category::Justified => "Justificados",
            Category::Absent => "Ausentes",
        }
    }

    fn headers(self) -> &'static [&'static str] {
        match self {
            Category::Confirmed => &["Nome", "Patente", "Data e Hora"],
            Category::Justified => &["Nome", "Patente", "Justificativa", "Hora Enviada"],
            Category::Absent => &["Nome", "Patente"],
        }
    }
}

/// Name and rank for an entry, or a placeholder when the id is not in the
/// directory.
pub fn name_and_rank<'a>(directory: &'a Directory, entry: &AttendanceEntry) -> (&'a str, &'a str) {
    directory
        .get(&entry.person_id)
        .map(|p| (p.name.as_str(), p.rank.as_str()))
        .unwrap_or((UNKNOWN, UNKNOWN))
}

fn write_sheet_header(
    ws: &mut Worksheet,
    category: Category,
    total: usize,
    date: NaiveDate,
    reporter: &str,
    fmt: &ReportFormats,
) -> Result<u32> {
    let last_col = category.headers().len() as u16 - 1;
    ws.set_row_height(0, 30)?;
    ws.merge_range(0, 0, 0, last_col, "Tiragem de Falta", &fmt.title)?;
    ws.merge_range(
        1,
        0,
        1,
        last_col,
        &format!("Data: {}    Emitido por: {}", date.format("%d/%m/%Y"), reporter),
        &fmt.header,
    )?;
    ws.merge_range(
        2,
        0,
        2,
        last_col,
        &format!("Total de {}: {}", category.title(), total),
        &fmt.header,
    )?;
    for (i, h) in category.headers().iter().enumerate() {
        ws.write_string_with_format(3, i as u16, *h, &fmt.header)?;
    }
    Ok(4)
}

fn write_entry_rows(
    ws: &mut Worksheet,
    mut row: u32,
    entries: &[&AttendanceEntry],
    directory: &Directory,
    with_reason: bool,
    fmt: &ReportFormats,
) -> Result<()> {
    for entry in entries {
        let (name, rank) = name_and_rank(directory, entry);
        ws.write_string_with_format(row, 0, name, &fmt.cell)?;
        ws.write_string_with_format(row, 1, rank, &fmt.cell)?;
        let mut col = 2;
        if with_reason {
            ws.write_string_with_format(row, col, &entry.justification, &fmt.reason)?;
            col += 1;
        }
        ws.write_string_with_format(row, col, entry.timestamp_string(), &fmt.cell)?;
        row += 1;
    }
    Ok(())
}

fn write_absent_rows(
    ws: &mut Worksheet,
    mut row: u32,
    people: &[&PersonRecord],
    fmt: &ReportFormats,
) -> Result<()> {
    for p in people {
        ws.write_string_with_format(row, 0, &p.name, &fmt.cell)?;
        ws.write_string_with_format(row, 1, &p.rank, &fmt.cell)?;
        row += 1;
    }
    Ok(())
}

fn set_column_widths(ws: &mut Worksheet, category: Category) -> Result<()> {
    let widths: &[f64] = match category {
        Category::Confirmed => &[16.0, 14.0, 22.0],
        Category::Justified => &[16.0, 14.0, 30.0, 22.0],
        Category::Absent => &[20.0, 16.0],
    };
    for (col, w) in widths.iter().enumerate() {
        ws.set_column_width(col as u16, *w)?;
    }
    Ok(())
}

/// One worksheet per category, each with its own total.
pub fn generate_report(
    output: &Path,
    classification: &Classification<'_>,
    directory: &Directory,
    date: NaiveDate,
    reporter: &str,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let fmt = ReportFormats::new();

    for category in Category::ALL {
        let ws = workbook.add_worksheet();
        ws.set_name(category.title())?;
        let total = match category {
            Category::Confirmed => classification.confirmed.len(),
            Category::Justified => classification.justified.len(),
            Category::Absent => classification.absent.len(),
        };
        let row = write_sheet_header(ws, category, total, date, reporter, &fmt)?;
        match category {
            Category::Confirmed => {
                write_entry_rows(ws, row, &classification.confirmed, directory, false, &fmt)?
            }
            Category::Justified => {
                write_entry_rows(ws, row, &classification.justified, directory, true, &fmt)?
            }
            Category::Absent => write_absent_rows(ws, row, &classification.absent, &fmt)?,
        }
        set_column_widths(ws, category)?;
    }

    workbook.save(output)?;
    tracing::info!(path = %output.display(), "report written");
    Ok(())
}
