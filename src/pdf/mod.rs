mod layout;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::error::Error;
use crate::fonts::{BuiltinFont, register_fonts};
use crate::model::MedicationItem;
use crate::paginate::{BadgePlacement, Page, PageContent, SheetFrame};

use layout::{
    Align, LineStyle, Span, build_lines, classify_line, draw_aligned, draw_rule, draw_text,
    render_lines,
};

pub use layout::MeasuredEstimator;

// A4 in points, 2cm margins
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 56.69;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const HEADER_IMAGE_MAX_HEIGHT: f32 = 80.0;
const PX_TO_PT: f32 = 0.75;

// 95 average-width characters fit CONTENT_WIDTH at this size, and 22 lines at
// this pitch fit above the footer under the tallest header.
const INSTRUCTION_FONT_SIZE: f32 = 9.0;
const INSTRUCTION_PITCH: f32 = 12.0;
const BULLET_INDENT: f32 = 18.0;
const ITEM_INDENT: f32 = 26.0;
const FOOTER_TOP: f32 = MARGIN + 100.0;

struct PlacedImage {
    pdf_name: String,
    pixel_width: u32,
    pixel_height: u32,
}

/// Render one A4 sheet per page descriptor.
pub fn render(pages: &[Page]) -> Result<Vec<u8>, Error> {
    if pages.is_empty() {
        return Err(Error::Pdf("no pages to render".into()));
    }

    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    let fonts = register_fonts(&mut pdf, &mut alloc);

    // Every distinct header image is embedded once and shared by all sheets
    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    let mut placed_images: HashMap<PathBuf, Option<PlacedImage>> = HashMap::new();
    for page in pages {
        let frame = &page.frame;
        if !frame.header.show_image {
            continue;
        }
        if let Some(path) = &frame.header_image
            && !placed_images.contains_key(path)
        {
            let placed = embed_header_image(path, &mut pdf, &mut alloc, &mut image_xobjects);
            placed_images.insert(path.clone(), placed);
        }
    }
    let t_images = t0.elapsed();

    let contents: Vec<Content> = pages
        .iter()
        .map(|page| {
            let image = page
                .frame
                .header_image
                .as_ref()
                .and_then(|p| placed_images.get(p))
                .and_then(|p| p.as_ref());
            draw_sheet(page, image)
        })
        .collect();
    let t_layout = t0.elapsed();

    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);
    pdf.document_info(info_id).producer(TextStr("rx-sheets"));

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for (font, font_ref) in &fonts {
                font_dict.pair(Name(font.pdf_name().as_bytes()), *font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    log::debug!(
        "Render phases: images={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} sheets)",
        t_images.as_secs_f64() * 1000.0,
        (t_layout - t_images).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_layout).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}

/// Embed a PNG or JPEG header image. Failures are logged and the sheets are
/// drawn without it.
fn embed_header_image(
    path: &Path,
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    image_xobjects: &mut Vec<(String, Ref)>,
) -> Option<PlacedImage> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Header image {}: {e}, skipping", path.display());
            return None;
        }
    };
    let format = match image::guess_format(&data) {
        Ok(f) => f,
        Err(e) => {
            log::warn!("Header image {}: {e}, skipping", path.display());
            return None;
        }
    };

    let pdf_name = format!("Im{}", image_xobjects.len() + 1);

    let (xobj_ref, w, h) = match format {
        image::ImageFormat::Jpeg => {
            let (w, h, color) = match jpeg_info(&data) {
                Ok(info) => info,
                Err(e) => {
                    log::warn!("Header image {}: {e}, skipping", path.display());
                    return None;
                }
            };
            let xobj_ref = alloc();
            let mut xobj = pdf.image_xobject(xobj_ref, &data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            match color {
                JpegColor::Gray => xobj.color_space().device_gray(),
                JpegColor::Rgb => xobj.color_space().device_rgb(),
                JpegColor::Cmyk => xobj.color_space().device_cmyk(),
            };
            xobj.bits_per_component(8);
            (xobj_ref, w, h)
        }
        _ => {
            let decoded = match image::load_from_memory_with_format(&data, format) {
                Ok(img) => img,
                Err(e) => {
                    log::warn!("Header image {}: {e}, skipping", path.display());
                    return None;
                }
            };
            let rgba: image::RgbaImage = decoded.to_rgba8();
            let (w, h) = (rgba.width(), rgba.height());
            let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
            let xobj_ref = alloc();

            let rgb_data: Vec<u8> = rgba
                .pixels()
                .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
                .collect();
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

            let smask_ref = if has_alpha {
                let alpha_data: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w as i32);
                mask.height(h as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                Some(mask_ref)
            } else {
                None
            };

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w as i32);
            xobj.height(h as i32);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
            (xobj_ref, w, h)
        }
    };

    image_xobjects.push((pdf_name.clone(), xobj_ref));
    Some(PlacedImage {
        pdf_name,
        pixel_width: w,
        pixel_height: h,
    })
}

enum JpegColor {
    Gray,
    Rgb,
    Cmyk,
}

/// Dimensions and source colour space of a JPEG, read from its header.
fn jpeg_info(data: &[u8]) -> Result<(u32, u32, JpegColor), String> {
    use image::ImageDecoder;
    use image::codecs::jpeg::JpegDecoder;

    let decoder = JpegDecoder::new(std::io::Cursor::new(data)).map_err(|e| e.to_string())?;
    let (w, h) = decoder.dimensions();
    let color = match decoder.original_color_type() {
        image::ExtendedColorType::L8 => JpegColor::Gray,
        image::ExtendedColorType::Rgb8 => JpegColor::Rgb,
        image::ExtendedColorType::Cmyk8 => JpegColor::Cmyk,
        other => return Err(format!("unsupported JPEG colour type {other:?}")),
    };
    Ok((w, h, color))
}

fn draw_sheet(page: &Page, image: Option<&PlacedImage>) -> Content {
    let mut content = Content::new();
    let frame = &page.frame;

    let y = draw_header(&mut content, page, image);
    let y = draw_patient(&mut content, frame, y);
    match &page.content {
        PageContent::Medication { items, start_index } => {
            draw_medications(&mut content, frame, items, *start_index, y)
        }
        PageContent::Instructions { text } => draw_instructions(&mut content, frame, text, y),
    }
    draw_footer(&mut content, page);
    content
}

fn draw_header(content: &mut Content, page: &Page, image: Option<&PlacedImage>) -> f32 {
    let frame = &page.frame;
    let layout = frame.header;
    let locale = frame.locale;
    let mut y = PAGE_HEIGHT - MARGIN;
    let right = PAGE_WIDTH - MARGIN;

    if layout.show_image
        && let Some(img) = image
    {
        let w = img.pixel_width as f32 * PX_TO_PT;
        let h = img.pixel_height as f32 * PX_TO_PT;
        let scale = (CONTENT_WIDTH / w).min(HEADER_IMAGE_MAX_HEIGHT / h).min(1.0);
        let (w, h) = (w * scale, h * scale);
        let x = MARGIN + (CONTENT_WIDTH - w) / 2.0;
        content.save_state();
        content.transform([w, 0.0, 0.0, h, x, y - h]);
        content.x_object(Name(img.pdf_name.as_bytes()));
        content.restore_state();
        y -= h + 12.0;
    }

    let mut badge_top = PAGE_HEIGHT - MARGIN;
    if layout.show_header_block() {
        if layout.show_institution {
            let inst = &frame.institution;
            y -= 14.0;
            draw_aligned(content, BuiltinFont::Bold, 14.0, Align::Center, MARGIN, CONTENT_WIDTH, y, &inst.name.to_uppercase());
            let address = inst.address_line();
            if !address.is_empty() {
                y -= 12.0;
                content.set_fill_gray(0.35);
                draw_aligned(content, BuiltinFont::Regular, 8.0, Align::Center, MARGIN, CONTENT_WIDTH, y, &address);
                content.set_fill_gray(0.0);
            }
            y -= 14.0;
        }

        badge_top = y;
        if layout.show_doctor_text {
            let doctor = &frame.doctor;
            y -= 20.0;
            draw_text(content, BuiltinFont::Bold, 20.0, MARGIN, y, &format!("DR. {}", doctor.name.to_uppercase()));
            y -= 17.0;
            draw_text(content, BuiltinFont::Bold, 12.0, MARGIN, y, &doctor.specialty);
            y -= 13.0;
            draw_text(content, BuiltinFont::Regular, 9.0, MARGIN, y, &format!("{}: {}", locale.license_label(), doctor.license_id));
        } else {
            y -= 48.0;
        }
        y -= 12.0;
        draw_rule(content, MARGIN, right, y, 3.0);
        y -= 22.0;
    } else {
        y -= 10.0;
    }

    if let Some((label, placement)) = page.copy_badge() {
        let top = match placement {
            BadgePlacement::HeaderBlock => badge_top,
            BadgePlacement::Floating => PAGE_HEIGHT - MARGIN,
        };
        draw_badge(content, &label, right, top);
    }
    y
}

fn draw_badge(content: &mut Content, label: &str, right: f32, top: f32) {
    let text = label.to_uppercase();
    let size = 8.0;
    let w = BuiltinFont::Bold.text_width(&text, size) + 14.0;
    let h = 17.0;
    content.save_state();
    content.set_fill_gray(0.97);
    content.rect(right - w, top - h, w, h).fill_nonzero();
    content.set_line_width(1.5);
    content.rect(right - w, top - h, w, h).stroke();
    content.set_fill_gray(0.0);
    draw_text(content, BuiltinFont::Bold, size, right - w + 7.0, top - h + 5.5, &text);
    content.restore_state();
}

fn draw_patient(content: &mut Content, frame: &SheetFrame, top: f32) -> f32 {
    let locale = frame.locale;
    let patient = &frame.patient;

    let mut markers: Vec<String> = Vec::new();
    if patient.pregnant {
        markers.push(locale.pregnant_marker().to_string());
    }
    if patient.pediatric {
        match patient.pediatric_detail.as_deref().filter(|d| !d.is_empty()) {
            Some(detail) => markers.push(format!("{} ({detail})", locale.pediatric_marker())),
            None => markers.push(locale.pediatric_marker().to_string()),
        }
    }
    let has_second_line = !patient.document_id.is_empty() || !markers.is_empty();
    let address = frame.show_address.then(|| patient.address.as_deref()).flatten();

    let mut height = 38.0;
    if has_second_line {
        height += 15.0;
    }
    if address.is_some() {
        height += 15.0;
    }

    content.save_state();
    content.set_fill_gray(0.97);
    content.rect(MARGIN, top - height, CONTENT_WIDTH, height).fill_nonzero();
    content.set_stroke_gray(0.85);
    content.set_line_width(0.75);
    content.rect(MARGIN, top - height, CONTENT_WIDTH, height).stroke();
    content.restore_state();

    let x = MARGIN + 12.0;
    let mut y = top - 24.0;
    let label = locale.patient_label().to_uppercase();
    draw_text(content, BuiltinFont::Bold, 9.0, x, y, &label);
    let name_x = x + BuiltinFont::Bold.text_width(&label, 9.0) + 8.0;
    if patient.name.is_empty() {
        draw_text(content, BuiltinFont::Regular, 13.0, name_x, y, &"_".repeat(48));
    } else {
        draw_text(content, BuiltinFont::Bold, 13.0, name_x, y, &patient.name);
    }

    if has_second_line {
        y -= 15.0;
        if !patient.document_id.is_empty() {
            let doc_label = locale.document_label();
            draw_text(content, BuiltinFont::Bold, 8.0, x, y, doc_label);
            let doc_x = x + BuiltinFont::Bold.text_width(doc_label, 8.0) + 6.0;
            draw_text(content, BuiltinFont::Regular, 9.0, doc_x, y, &patient.document_id);
        }
        if !markers.is_empty() {
            draw_aligned(content, BuiltinFont::Bold, 8.0, Align::Right, x, CONTENT_WIDTH - 24.0, y, &markers.join(" \u{2022} ").to_uppercase());
        }
    }
    if let Some(address) = address {
        y -= 15.0;
        let addr_label = locale.address_label().to_uppercase();
        draw_text(content, BuiltinFont::Bold, 8.0, x, y, &addr_label);
        let addr_x = x + BuiltinFont::Bold.text_width(&addr_label, 8.0) + 6.0;
        draw_text(content, BuiltinFont::Regular, 9.0, addr_x, y, address);
    }

    top - height - 20.0
}

fn draw_medications(
    content: &mut Content,
    frame: &SheetFrame,
    items: &[MedicationItem],
    start_index: usize,
    top: f32,
) {
    let locale = frame.locale;

    if items.is_empty() {
        let h = 100.0;
        let box_top = top - 40.0;
        content.save_state();
        content.set_stroke_gray(0.85);
        content.set_line_width(1.5);
        content.set_dash_pattern([6.0, 4.0], 0.0);
        content.rect(MARGIN, box_top - h, CONTENT_WIDTH, h).stroke();
        content.restore_state();
        content.set_fill_gray(0.75);
        draw_aligned(content, BuiltinFont::Oblique, 14.0, Align::Center, MARGIN, CONTENT_WIDTH, box_top - h / 2.0 - 5.0, locale.empty_prescription());
        content.set_fill_gray(0.0);
        return;
    }

    let text_x = MARGIN + ITEM_INDENT;
    let text_width = CONTENT_WIDTH - ITEM_INDENT;
    let mut y = top;
    for (i, item) in items.iter().enumerate() {
        y -= 14.0;
        draw_text(content, BuiltinFont::Bold, 14.0, MARGIN, y, &format!("{}.", start_index + i + 1));

        let name = if item.name.is_empty() {
            locale.medication_placeholder()
        } else {
            item.name.as_str()
        };
        draw_text(content, BuiltinFont::Bold, 12.0, text_x, y, name);
        let strength_x = text_x + BuiltinFont::Bold.text_width(name, 12.0) + 8.0;
        draw_text(content, BuiltinFont::Regular, 11.0, strength_x, y, &item.strength);

        if !item.quantity.is_empty() || !item.unit.is_empty() {
            let amount = format!("{} {}", item.quantity, item.unit.to_uppercase());
            draw_aligned(content, BuiltinFont::Bold, 11.0, Align::Right, text_x, text_width, y, amount.trim());
        }

        y -= 5.0;
        content.save_state();
        content.set_stroke_gray(0.8);
        draw_rule(content, text_x, PAGE_WIDTH - MARGIN, y, 0.5);
        content.restore_state();

        let schedule = match (item.frequency.is_empty(), item.duration.is_empty()) {
            (false, false) => format!("{} - {}", item.frequency, item.duration),
            (false, true) => item.frequency.clone(),
            (true, false) => item.duration.clone(),
            (true, true) => String::new(),
        };
        if !schedule.is_empty() {
            y -= 14.0;
            draw_text(content, BuiltinFont::Bold, 10.0, text_x, y, &schedule.to_uppercase());
        }

        if !item.note.is_empty() {
            let spans = [
                Span::new(format!("{} ", locale.note_label().to_uppercase()), BuiltinFont::Bold),
                Span::new(item.note.as_str(), BuiltinFont::Regular),
            ];
            let lines = build_lines(&spans, 9.0, text_width);
            y = render_lines(content, &lines, Align::Left, text_x, text_width, y - 13.0, 9.0, 11.0, false) + 11.0;
        }

        y -= 14.0;
    }
}

fn draw_instructions(content: &mut Content, frame: &SheetFrame, text: &str, top: f32) {
    let title = frame.locale.instructions_title().to_uppercase();
    let title_w = BuiltinFont::Bold.text_width(&title, 10.0) + 40.0;
    let title_x = MARGIN + (CONTENT_WIDTH - title_w) / 2.0;
    content.set_line_width(1.5);
    content.rect(title_x, top - 20.0, title_w, 20.0).stroke();
    draw_aligned(content, BuiltinFont::Bold, 10.0, Align::Center, MARGIN, CONTENT_WIDTH, top - 13.5, &title);

    // One estimated line per pitch, with no extra leading between paragraphs
    let size = INSTRUCTION_FONT_SIZE;
    let mut y = top - 20.0 - 18.0;
    for line in text.split(crate::paginate::PARAGRAPH_SEPARATOR) {
        match classify_line(line) {
            LineStyle::Blank => y -= INSTRUCTION_PITCH,
            LineStyle::Bullet => {
                let width = CONTENT_WIDTH - BULLET_INDENT;
                let lines = build_lines(&[Span::new(line.trim(), BuiltinFont::Regular)], size, width);
                y = render_lines(content, &lines, Align::Left, MARGIN + BULLET_INDENT, width, y, size, INSTRUCTION_PITCH, false);
            }
            LineStyle::Emphasis(spans) => {
                let lines = build_lines(&spans, size, CONTENT_WIDTH);
                y = render_lines(content, &lines, Align::Left, MARGIN, CONTENT_WIDTH, y, size, INSTRUCTION_PITCH, false);
            }
            LineStyle::Heading => {
                let lines = build_lines(&[Span::new(line, BuiltinFont::Bold)], size, CONTENT_WIDTH);
                y = render_lines(content, &lines, Align::Left, MARGIN, CONTENT_WIDTH, y, size, INSTRUCTION_PITCH, true);
            }
            LineStyle::Plain => {
                let lines = build_lines(&[Span::new(line, BuiltinFont::Regular)], size, CONTENT_WIDTH);
                y = render_lines(content, &lines, Align::Left, MARGIN, CONTENT_WIDTH, y, size, INSTRUCTION_PITCH, false);
            }
        }
    }
}

fn draw_footer(content: &mut Content, page: &Page) {
    let frame = &page.frame;
    let right = PAGE_WIDTH - MARGIN;

    content.save_state();
    content.set_stroke_gray(0.85);
    draw_rule(content, MARGIN, right, FOOTER_TOP, 1.5);
    content.set_fill_gray(0.4);
    draw_text(content, BuiltinFont::Regular, 9.0, MARGIN, FOOTER_TOP - 16.0, &frame.date_label);
    if let Some(counter) = page.page_counter() {
        draw_aligned(content, BuiltinFont::Bold, 8.0, Align::Right, MARGIN, CONTENT_WIDTH, FOOTER_TOP - 16.0, &counter.to_uppercase());
    }
    content.restore_state();

    let sig_width = 220.0;
    let sig_left = right - sig_width;
    let doctor = &frame.doctor;
    draw_rule(content, sig_left, right, MARGIN + 36.0, 0.75);
    draw_aligned(content, BuiltinFont::Bold, 9.0, Align::Center, sig_left, sig_width, MARGIN + 24.0, &format!("DR. {}", doctor.name.to_uppercase()));
    let credentials = format!(
        "{} - {} {}",
        doctor.specialty,
        frame.locale.license_label(),
        doctor.license_id
    );
    content.set_fill_gray(0.35);
    draw_aligned(content, BuiltinFont::Regular, 8.0, Align::Center, sig_left, sig_width, MARGIN + 13.0, &credentials.to_uppercase());
    content.set_fill_gray(0.0);
}
