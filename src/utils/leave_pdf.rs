use chrono::{NaiveDate, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::AppError;
use crate::model::{leave_request::LeaveType, request::RequestStatus};

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 60;
const TEXT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN;
const VALUE_INDENT: i64 = 110;
const VALUE_WIDTH: i64 = TEXT_WIDTH - VALUE_INDENT;

const FIELD_SIZE: i64 = 11;
const FIELD_LEADING: i64 = 14;
const REASON_MAX_LINES: usize = 12;
const FIELD_MAX_LINES: usize = 2;

/// Everything printed on a leave approval document.
#[derive(Debug, Clone)]
pub struct LeaveDocument {
    pub leave_id: u64,
    pub company_name: String,
    pub employee_name: String,
    pub employee_email: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub reason: String,
    pub status: RequestStatus,
    pub verification_url: String,
}

impl LeaveDocument {
    /// Name used by the download endpoint.
    pub fn filename(&self) -> String {
        format!("leave-request-{}.pdf", self.leave_id)
    }

    /// Name of the file attached to the approval email.
    pub fn attachment_filename(&self) -> String {
        format!("LeaveApproval_{}.pdf", self.leave_id)
    }

    /// Label/value rows of the document body, in print order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Reference", format!("LR-{:06}", self.leave_id)),
            ("Employee", self.employee_name.clone()),
            ("Email", self.employee_email.clone()),
            ("Leave type", self.leave_type.label().to_string()),
            ("From", self.start_date.format("%d %B %Y").to_string()),
            ("To", self.end_date.format("%d %B %Y").to_string()),
            ("Duration", format!("{} day(s)", self.duration_days)),
            ("Reason", self.reason.clone()),
            ("Status", self.status.as_ref().to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

// Helvetica advance widths (1/1000 em) for 0x20..=0x7E.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// Unaccented letter for each WinAnsi code in 0xC0..=0xFF, '\0' where there is none.
const LATIN1_BASE: &[u8; 64] =
    b"AAAAAA\0CEEEEIIIIDNOOOOO\0OUUUUY\0\0aaaaaa\0ceeeeiiii\0nooooo\0ouuuuy\0y";

/// Maps a character onto WinAnsiEncoding, `?` when it has no code.
fn win_ansi(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        '\t' | '\n' | '\r' => b' ',
        _ => b'?',
    }
}

fn encode(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi).collect()
}

/// Advance width of one encoded byte in 1/1000 em. Accented letters take
/// their base letter's width; anything else outside ASCII is counted as a
/// full em so lines never run long.
fn glyph_width(font: Font, byte: u8) -> u32 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    match byte {
        0x20..=0x7E => u32::from(table[usize::from(byte - 0x20)]),
        0xC0..=0xFF => match LATIN1_BASE[usize::from(byte - 0xC0)] {
            0 => 1000,
            base => u32::from(table[usize::from(base - 0x20)]),
        },
        _ => 1000,
    }
}

/// Width of encoded text in thousandths of a point.
fn text_width(font: Font, size: i64, text: &[u8]) -> i64 {
    let units: u32 = text.iter().map(|&b| glyph_width(font, b)).sum();
    i64::from(units) * size
}

/// Greedy word wrap of encoded text to `max_width` points. Words wider than a
/// line are split by character. At most `max_lines` lines come back; a cut
/// last line ends in "...".
fn wrap(font: Font, size: i64, max_width: i64, text: &[u8], max_lines: usize) -> Vec<Vec<u8>> {
    let limit = max_width * 1000;
    let fits = |line: &[u8]| text_width(font, size, line) <= limit;

    let mut lines: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for word in text.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
        let mut candidate = current.clone();
        if !candidate.is_empty() {
            candidate.push(b' ');
        }
        candidate.extend_from_slice(word);

        if fits(&candidate) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for &byte in word {
            current.push(byte);
            if !fits(&current) {
                current.pop();
                lines.push(std::mem::replace(&mut current, vec![byte]));
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            while !last.is_empty() && !fits(&[last.as_slice(), b"...".as_slice()].concat()) {
                last.pop();
            }
            last.extend_from_slice(b"...");
        }
    }

    lines
}

fn text(font: Font, size: i64, x: i64, y: i64, body: Vec<u8>) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.resource().into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(body)]),
        Operation::new("ET", vec![]),
    ]
}

/// Full-width wrapped paragraph starting at `y`. Returns the baseline below the last line.
fn paragraph(
    ops: &mut Vec<Operation>,
    font: Font,
    size: i64,
    mut y: i64,
    body: &str,
    max_lines: usize,
) -> i64 {
    for line in wrap(font, size, TEXT_WIDTH, &encode(body), max_lines) {
        ops.extend(text(font, size, MARGIN, y, line));
        y -= size + 3;
    }
    y
}

fn rule(y: i64) -> Vec<Operation> {
    vec![
        Operation::new("m", vec![MARGIN.into(), y.into()]),
        Operation::new("l", vec![(PAGE_WIDTH - MARGIN).into(), y.into()]),
        Operation::new("S", vec![]),
    ]
}

fn layout(doc: &LeaveDocument) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT - MARGIN;

    y = paragraph(&mut ops, Font::Bold, 18, y, &doc.company_name, 1);
    y -= 7;
    ops.extend(text(Font::Bold, 14, MARGIN, y, encode("Leave Approval")));
    y -= 14;
    ops.extend(rule(y));
    y -= 30;

    for (label, value) in doc.fields() {
        let max_lines = if label == "Reason" {
            REASON_MAX_LINES
        } else {
            FIELD_MAX_LINES
        };
        ops.extend(text(Font::Bold, FIELD_SIZE, MARGIN, y, encode(label)));
        let lines = wrap(
            Font::Regular,
            FIELD_SIZE,
            VALUE_WIDTH,
            &encode(&value),
            max_lines,
        );
        let count = lines.len() as i64;
        for (i, line) in lines.into_iter().enumerate() {
            let line_y = y - i as i64 * FIELD_LEADING;
            ops.extend(text(Font::Regular, FIELD_SIZE, MARGIN + VALUE_INDENT, line_y, line));
        }
        y -= 22 + (count - 1) * FIELD_LEADING;
    }

    y -= 10;
    ops.extend(rule(y));
    y -= 24;
    ops.extend(text(
        Font::Regular,
        9,
        MARGIN,
        y,
        encode("Verify the authenticity of this document at:"),
    ));
    y -= 14;
    y = paragraph(&mut ops, Font::Regular, 9, y, &doc.verification_url, 3);
    y -= 12;
    ops.extend(text(
        Font::Regular,
        8,
        MARGIN,
        y,
        encode(&format!("Generated {}", Utc::now().format("%Y-%m-%d %H:%M UTC"))),
    ));

    ops
}

/// Renders the single-page approval document.
pub fn render_leave_pdf(doc: &LeaveDocument) -> Result<Vec<u8>, AppError> {
    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let regular_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let content = Content {
        operations: layout(doc),
    };
    let encoded = content.encode().map_err(AppError::internal)?;
    let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = pdf.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    pdf.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes).map_err(AppError::internal)?;
    Ok(bytes)
}
