mod common;

use rx_sheets::{CopyCount, DocumentComposer, Page, PageKind, PrintOptions};

const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 56.69;

/// A string shown on a sheet and its baseline origin.
#[derive(Debug)]
struct Shown {
    text: Vec<u8>,
    x: f32,
    y: f32,
}

impl Shown {
    fn is(&self, s: &str) -> bool {
        self.text == s.as_bytes()
    }
}

enum Token {
    Number(f32),
    Str(Vec<u8>),
    Operator(String),
}

/// Inflate every Flate stream in the file and keep the ones that draw text,
/// in the order they were written (one per sheet).
fn content_streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    let mut streams = Vec::new();
    let mut rest = pdf;
    while let Some(start) = find(rest, b"stream\n") {
        let body = &rest[start + b"stream\n".len()..];
        let Some(end) = find(body, b"\nendstream") else {
            break;
        };
        if let Ok(data) = miniz_oxide::inflate::decompress_to_vec_zlib(&body[..end])
            && find(&data, b"BT\n").is_some()
            && find(&data, b"ET\n").is_some()
        {
            streams.push(data);
        }
        rest = &body[end + b"\nendstream".len()..];
    }
    streams
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let b = data[i];
        match b {
            b if b.is_ascii_whitespace() => i += 1,
            b'(' => {
                let mut text = Vec::new();
                let mut depth = 1;
                i += 1;
                while i < data.len() {
                    let c = data[i];
                    i += 1;
                    match c {
                        b'\\' => {
                            let Some(&next) = data.get(i) else { break };
                            if next.is_ascii_digit() {
                                let digits = data[i..]
                                    .iter()
                                    .take(3)
                                    .take_while(|d| (b'0'..=b'7').contains(d))
                                    .count();
                                let octal = std::str::from_utf8(&data[i..i + digits]).unwrap_or("0");
                                text.push(u8::from_str_radix(octal, 8).unwrap_or(0));
                                i += digits;
                            } else {
                                text.push(match next {
                                    b'n' => b'\n',
                                    b'r' => b'\r',
                                    b't' => b'\t',
                                    other => other,
                                });
                                i += 1;
                            }
                        }
                        b'(' => {
                            depth += 1;
                            text.push(c);
                        }
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                            text.push(c);
                        }
                        _ => text.push(c),
                    }
                }
                tokens.push(Token::Str(text));
            }
            b'<' => {
                let end = data[i..].iter().position(|&c| c == b'>').map_or(data.len(), |p| i + p);
                let hex: Vec<u8> = data[i + 1..end].iter().copied().filter(u8::is_ascii_hexdigit).collect();
                let text = hex
                    .chunks(2)
                    .filter_map(|pair| u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok())
                    .collect();
                tokens.push(Token::Str(text));
                i = end + 1;
            }
            b'[' | b']' => i += 1,
            _ => {
                let start = i;
                while i < data.len() && !data[i].is_ascii_whitespace() && !b"()<>[]".contains(&data[i]) {
                    i += 1;
                }
                let word = String::from_utf8_lossy(&data[start..i]).into_owned();
                match word.parse::<f32>() {
                    Ok(n) => tokens.push(Token::Number(n)),
                    Err(_) => tokens.push(Token::Operator(word)),
                }
            }
        }
    }
    tokens
}

/// Every `Tj` on a sheet with its absolute position. Text placement only
/// uses `Td`, so positions accumulate from the origin within each text object.
fn shown_text(stream: &[u8]) -> Vec<Shown> {
    let mut shown = Vec::new();
    let mut operands: Vec<Token> = Vec::new();
    let (mut x, mut y) = (0.0f32, 0.0f32);
    for token in tokenize(stream) {
        let Token::Operator(op) = token else {
            operands.push(token);
            continue;
        };
        match (op.as_str(), operands.as_slice()) {
            ("BT", _) => (x, y) = (0.0, 0.0),
            ("Td", [.., Token::Number(dx), Token::Number(dy)]) => {
                x += dx;
                y += dy;
            }
            ("Tj", [.., Token::Str(text)]) => shown.push(Shown { text: text.clone(), x, y }),
            _ => {}
        }
        operands.clear();
    }
    shown
}

fn render_sheets(pages: &[Page]) -> Vec<Vec<Shown>> {
    let bytes = rx_sheets::render_pages(pages).expect("render");
    let sheets: Vec<Vec<Shown>> = content_streams(&bytes).iter().map(|s| shown_text(s)).collect();
    assert_eq!(sheets.len(), pages.len());
    sheets
}

fn baseline_of(sheet: &[Shown], text: &str) -> f32 {
    sheet
        .iter()
        .find(|s| s.is(text))
        .unwrap_or_else(|| panic!("{text:?} not drawn"))
        .y
}

/// 22 paragraphs of 95 characters: a full page at the default capacity.
fn full_instruction_page() -> String {
    (0..22)
        .map(|i| format!("p{i:02} {}", "a".repeat(91)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn full_instruction_page_stays_above_footer() {
    let dir = common::scratch_dir();
    let logo = dir.path().join("tall.png");
    image::RgbImage::from_pixel(100, 400, image::Rgb([10, 10, 10]))
        .save(&logo)
        .expect("write png");

    // Tallest header: image, institution with address, doctor text, ID and address rows
    let mut header = common::header();
    header.header_image = Some(logo);
    let mut doc = common::document(0, &full_instruction_page());
    doc.include_address = true;

    let pages = DocumentComposer::default().compose(&doc, &header, &PrintOptions::default());
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].kind(), PageKind::Instructions);

    let sheets = render_sheets(&pages);
    let sheet = &sheets[1];

    let mut baselines = Vec::new();
    for i in 0..22 {
        let marker = format!("p{i:02}");
        let hits: Vec<&Shown> = sheet.iter().filter(|s| s.is(&marker)).collect();
        assert_eq!(hits.len(), 1, "{marker} drawn {} times", hits.len());
        baselines.push(hits[0].y);
    }
    assert!(baselines.windows(2).all(|w| w[1] < w[0]), "lines out of order: {baselines:?}");

    // Each paragraph stays on one drawn line
    let fill = "a".repeat(91);
    let fill_baselines: Vec<f32> = sheet.iter().filter(|s| s.is(&fill)).map(|s| s.y).collect();
    assert_eq!(fill_baselines.len(), 22);
    for (a, b) in fill_baselines.iter().zip(&baselines) {
        assert!((a - b).abs() < 0.01);
    }

    let date_y = baseline_of(sheet, "Friday, October 16, 2026");
    let footer_rule_y = date_y + 16.0;
    let lowest = baselines[21];
    assert!(
        lowest - 3.0 > footer_rule_y,
        "last line at {lowest} reaches the footer rule at {footer_rule_y}"
    );
    // The doctor's name appears twice: header block and signature
    let signature_y = sheet
        .iter()
        .filter(|s| s.is("DR. ANA SOUZA"))
        .map(|s| s.y)
        .fold(f32::INFINITY, f32::min);
    assert!(signature_y < date_y);
}

#[test]
fn five_medications_stay_above_footer() {
    let dir = common::scratch_dir();
    let logo = dir.path().join("tall.png");
    image::RgbImage::from_pixel(100, 400, image::Rgb([10, 10, 10]))
        .save(&logo)
        .expect("write png");

    let mut header = common::header();
    header.header_image = Some(logo);
    let mut doc = common::document(5, "");
    doc.include_address = true;
    for item in &mut doc.medications {
        item.note = "after meals".into();
    }

    let pages = DocumentComposer::default().compose(&doc, &header, &PrintOptions::default());
    assert_eq!(pages.len(), 1);
    let sheets = render_sheets(&pages);
    let sheet = &sheets[0];

    let date_y = baseline_of(sheet, "Friday, October 16, 2026");
    let last_note_y = sheet
        .iter()
        .filter(|s| s.is("meals"))
        .map(|s| s.y)
        .fold(f32::INFINITY, f32::min);
    assert!(last_note_y.is_finite());
    assert!(last_note_y - 3.0 > date_y + 16.0, "last note at {last_note_y}");
    assert!(baseline_of(sheet, "5.") > last_note_y);
}

#[test]
fn footer_counter_only_on_multi_page_sections() {
    let doc = common::document(6, "Rest.");
    let pages = DocumentComposer::default().compose(
        &doc,
        &common::header(),
        &PrintOptions::default(),
    );
    assert_eq!(pages.len(), 3);
    let sheets = render_sheets(&pages);

    let date_y = baseline_of(&sheets[0], "Friday, October 16, 2026");
    assert!((baseline_of(&sheets[0], "PAGE 1 OF 2") - date_y).abs() < 0.01);
    assert!((baseline_of(&sheets[1], "PAGE 2 OF 2") - date_y).abs() < 0.01);
    assert!(!sheets[2].iter().any(|s| s.text.starts_with(b"PAGE ")));
}

#[test]
fn floating_badge_sits_at_the_top_margin() {
    let mut header = common::header();
    header.header_image = Some("does/not/exist.png".into());
    header.hide_text_header = true;
    header.institution.name.clear();

    let doc = common::document(1, "");
    let pages = DocumentComposer::default().compose(
        &doc,
        &header,
        &PrintOptions { copies: CopyCount::Duplicate },
    );
    let sheets = render_sheets(&pages);

    for (sheet, label) in sheets.iter().zip(["1ST COPY", "2ND COPY"]) {
        let badge_y = baseline_of(sheet, label);
        assert!(badge_y > PAGE_HEIGHT - MARGIN - 20.0, "{label} at {badge_y}");
        assert!(sheet.iter().all(|s| s.y <= badge_y), "{label} is not the topmost text");
    }
}

#[test]
fn header_block_badge_sits_beside_the_doctor() {
    let doc = common::document(1, "");
    let pages = DocumentComposer::default().compose(
        &doc,
        &common::header(),
        &PrintOptions { copies: CopyCount::Duplicate },
    );
    let sheets = render_sheets(&pages);

    let badge = sheets[0].iter().find(|s| s.is("1ST COPY")).expect("badge drawn");
    let institution_y = baseline_of(&sheets[0], "CLINICA CENTRAL");
    let doctor = sheets[0].iter().find(|s| s.is("DR. ANA SOUZA")).expect("doctor drawn");
    assert!(badge.y < institution_y);
    assert!(badge.y > doctor.y);
    assert!(badge.x > doctor.x);
}

#[test]
fn control_characters_are_not_drawn() {
    let doc = common::document(0, "Take\u{7F} daily");
    let pages = DocumentComposer::default().compose(
        &doc,
        &common::header(),
        &PrintOptions::default(),
    );
    let sheets = render_sheets(&pages);

    assert!(sheets[1].iter().any(|s| s.is("Take")));
    assert!(sheets.iter().flatten().all(|s| s.text.iter().all(|&b| b >= 0x20 && b != 0x7F)));
}
