//! PDF access via pdfium.
//!
//! This is the only module that touches pdfium types. Each call flattens
//! what the pipeline needs into the plain structs of [`crate::types::page`],
//! with every coordinate flipped once from pdfium's bottom-left page space
//! to the top-left origin used everywhere else.
//!
//! Pdfium itself is not thread-safe: all calls serialise on a process-wide
//! lock, and each thread lazily binds its own `Pdfium` instance. The
//! heavyweight raster analysis runs outside the lock, so document-level
//! parallelism still pays off.

use std::cell::RefCell;
use std::path::Path;

use image::GrayImage;
use parking_lot::Mutex;
use pdfium_render::prelude::*;

use crate::error::{BlackbarError, Result};
use crate::geometry::PointRect;
use crate::types::{
    AnnotationKind, AnnotationRecord, FilledPath, PageSnapshot, TextChar, TextSpan, luminance,
};

static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static PDFIUM: RefCell<Option<Pdfium>> = const { RefCell::new(None) };
}

fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| BlackbarError::Pdf(format!("cannot bind pdfium library: {e}")))?;
    Ok(Pdfium::new(bindings))
}

/// Run `f` with the thread's pdfium instance while holding the global
/// pdfium lock.
fn with_pdfium<R>(f: impl FnOnce(&Pdfium) -> Result<R>) -> Result<R> {
    let _guard = PDFIUM_LOCK.lock();
    PDFIUM.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(bind_pdfium()?);
        }
        f(slot.as_ref().expect("pdfium bound above"))
    })
}

/// True when a pdfium library can be bound in this process. Used by tests
/// to skip gracefully on machines without the native library.
pub fn pdfium_available() -> bool {
    with_pdfium(|_| Ok(())).is_ok()
}

fn open<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>> {
    pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| BlackbarError::Pdf(format!("cannot open {}: {e}", path.display())))
}

/// Number of pages in the document.
pub fn document_page_count(path: &Path) -> Result<u32> {
    with_pdfium(|pdfium| Ok(open(pdfium, path)?.pages().len() as u32))
}

/// Flip a pdfium rectangle (bottom-left origin, y up) into top-left space.
fn flip_rect(left: f32, bottom: f32, right: f32, top: f32, page_height: f64) -> PointRect {
    PointRect::new(
        left as f64,
        page_height - top as f64,
        right as f64,
        page_height - bottom as f64,
    )
}

fn annotation_kind(annotation: &PdfPageAnnotation<'_>) -> AnnotationKind {
    match annotation.annotation_type() {
        PdfPageAnnotationType::Redacted => AnnotationKind::Redaction,
        PdfPageAnnotationType::Square => AnnotationKind::Square,
        PdfPageAnnotationType::Polygon => AnnotationKind::Polygon,
        PdfPageAnnotationType::Highlight => AnnotationKind::Highlight,
        _ => AnnotationKind::Other,
    }
}

fn color_luminance(color: PdfColor) -> f64 {
    luminance(color.red(), color.green(), color.blue())
}

/// Fill and stroke luminance of an annotation, read from the path objects
/// of its appearance stream. Square/polygon interiors are painted there.
fn annotation_luminances(annotation: &PdfPageAnnotation<'_>) -> (Option<f64>, Option<f64>) {
    let mut fill = None;
    let mut stroke = None;
    for object in annotation.objects().iter() {
        let Some(path) = object.as_path_object() else {
            continue;
        };
        if fill.is_none() {
            if let Ok(color) = path.fill_color() {
                if color.alpha() > 0 {
                    fill = Some(color_luminance(color));
                }
            }
        }
        if stroke.is_none() {
            if let Ok(color) = path.stroke_color() {
                if color.alpha() > 0 {
                    stroke = Some(color_luminance(color));
                }
            }
        }
    }
    (fill, stroke)
}

fn extract_annotations(page: &PdfPage<'_>, page_height: f64) -> Vec<AnnotationRecord> {
    let mut records = Vec::new();
    for annotation in page.annotations().iter() {
        let kind = annotation_kind(&annotation);
        if kind == AnnotationKind::Other {
            continue;
        }
        let Ok(bounds) = annotation.bounds() else {
            continue;
        };
        let bbox = flip_rect(
            bounds.left.value,
            bounds.bottom.value,
            bounds.right.value,
            bounds.top.value,
            page_height,
        );
        let (fill_luminance, stroke_luminance) = annotation_luminances(&annotation);
        records.push(AnnotationRecord {
            kind,
            bbox,
            fill_luminance,
            stroke_luminance,
            subtype: format!("{:?}", annotation.annotation_type()).to_lowercase(),
        });
    }
    records
}

fn extract_objects(
    page: &PdfPage<'_>,
    page_height: f64,
) -> (Vec<TextSpan>, Vec<FilledPath>) {
    let mut spans = Vec::new();
    let mut paths = Vec::new();

    for object in page.objects().iter() {
        if let Some(text_obj) = object.as_text_object() {
            let text = text_obj.text();
            if text.trim().is_empty() {
                continue;
            }
            let Ok(bounds) = text_obj.bounds() else {
                continue;
            };
            let bbox = flip_rect(
                bounds.left().value,
                bounds.bottom().value,
                bounds.right().value,
                bounds.top().value,
                page_height,
            );
            let font_size = text_obj.scaled_font_size().value as f64;
            let font_name = text_obj.font().name();
            spans.push(TextSpan::new(text, bbox, font_size, &font_name));
        } else if let Some(path_obj) = object.as_path_object() {
            let filled = path_obj
                .fill_mode()
                .is_ok_and(|mode| mode != PdfPathFillMode::None);
            if !filled {
                continue;
            }
            let Ok(fill) = path_obj.fill_color() else {
                continue;
            };
            if fill.alpha() == 0 {
                continue;
            }
            let Ok(bounds) = object.bounds() else {
                continue;
            };
            let bbox = flip_rect(
                bounds.left().value,
                bounds.bottom().value,
                bounds.right().value,
                bounds.top().value,
                page_height,
            );
            paths.push(FilledPath {
                bbox,
                fill_luminance: color_luminance(fill),
            });
        }
    }

    (spans, paths)
}

fn extract_chars(page: &PdfPage<'_>, page_height: f64) -> Result<Vec<TextChar>> {
    let text = page
        .text()
        .map_err(|e| BlackbarError::Pdf(format!("text extraction failed: {e}")))?;

    let mut chars = Vec::new();
    for ch in text.chars().iter() {
        let Some(unicode) = ch.unicode_char() else {
            continue;
        };
        let Ok(bounds) = ch.loose_bounds() else {
            continue;
        };
        let bbox = flip_rect(
            bounds.left.value,
            bounds.bottom.value,
            bounds.right.value,
            bounds.top.value,
            page_height,
        );
        let (Ok(origin_x), Ok(origin_y)) = (ch.origin_x(), ch.origin_y()) else {
            continue;
        };
        chars.push(TextChar {
            ch: unicode,
            origin: (origin_x.value as f64, page_height - origin_y.value as f64),
            bbox,
            font_size: ch.scaled_font_size().value as f64,
        });
    }
    Ok(chars)
}

fn render_gray(page: &PdfPage<'_>, dpi: u32) -> Result<GrayImage> {
    let config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
    let bitmap = page
        .render_with_config(&config)
        .map_err(|e| BlackbarError::Pdf(format!("render failed: {e}")))?;
    Ok(bitmap.as_image().into_luma8())
}

/// Extract everything the pipeline needs from one page.
///
/// `page_index` is 0-based; the returned snapshot carries the 1-indexed
/// page number.
pub fn page_snapshot(path: &Path, page_index: u32, dpi: u32) -> Result<PageSnapshot> {
    with_pdfium(|pdfium| {
        let document = open(pdfium, path)?;
        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(|e| BlackbarError::Pdf(format!("page {} unavailable: {e}", page_index + 1)))?;

        let width_pt = page.width().value as f64;
        let height_pt = page.height().value as f64;

        let raster = render_gray(&page, dpi)?;
        let (spans, filled_paths) = extract_objects(&page, height_pt);
        let annotations = extract_annotations(&page, height_pt);
        let chars = extract_chars(&page, height_pt)?;

        Ok(PageSnapshot {
            page_num: page_index + 1,
            width_pt,
            height_pt,
            raster,
            spans,
            chars,
            annotations,
            filled_paths,
        })
    })
}

/// Extract only the text layer of a page (0-based index): spans for
/// context work and per-character records for fingerprinting. No render.
pub fn page_text(path: &Path, page_index: u32) -> Result<(Vec<TextSpan>, Vec<TextChar>)> {
    with_pdfium(|pdfium| {
        let document = open(pdfium, path)?;
        let page = document
            .pages()
            .get(page_index as u16)
            .map_err(|e| BlackbarError::Pdf(format!("page {} unavailable: {e}", page_index + 1)))?;
        let height_pt = page.height().value as f64;
        let (spans, _) = extract_objects(&page, height_pt);
        let chars = extract_chars(&page, height_pt)?;
        Ok((spans, chars))
    })
}

/// Render one page (1-indexed) to a grayscale raster at `dpi`.
pub fn render_page_gray(path: &Path, page_num: u32, dpi: u32) -> Result<GrayImage> {
    with_pdfium(|pdfium| {
        let document = open(pdfium, path)?;
        let page = document
            .pages()
            .get((page_num - 1) as u16)
            .map_err(|e| BlackbarError::Pdf(format!("page {page_num} unavailable: {e}")))?;
        render_gray(&page, dpi)
    })
}
