use chrono::Utc;
use log::debug;
use printpdf::image_crate::{self, DynamicImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference,
};
use thiserror::Error;

use crate::paginator::{CaptionFontSize, LayoutConfig, Orientation, Page, PaperSize};
use crate::photo_store::strip_extension;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unrenderable layout: {0}")]
    Layout(String),
    #[error("failed to decode image '{name}': {source}")]
    Decode {
        name: String,
        source: image_crate::ImageError,
    },
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Page margin, matches the print stylesheet of the report this replaces.
const MARGIN_MM: f32 = 15.0;
/// Band reserved at the top of each page for title and page numbering.
const HEADER_HEIGHT_MM: f32 = 20.0;
/// Gap between grid cells.
const CELL_GAP_MM: f32 = 8.0;
/// Gap between an image and its caption.
const CAPTION_GAP_MM: f32 = 2.0;

const PT_TO_MM: f32 = 25.4 / 72.0;
/// Helvetica's average glyph width as a fraction of the point size, used for
/// caption wrapping and right-alignment estimates.
const AVG_CHAR_WIDTH: f32 = 0.5;
/// Images are embedded at this resolution.
const IMAGE_DPI: f32 = 300.0;
/// Cap on upscaling: small images are never stretched below ~96 dpi
/// effective resolution.
const MAX_UPSCALE: f32 = IMAGE_DPI / 96.0;

const TITLE_FONT_PT: f32 = 14.0;
const META_FONT_PT: f32 = 9.0;
const CAPTION_LINES: usize = 2;

fn caption_points(size: CaptionFontSize) -> f32 {
    match size {
        CaptionFontSize::Small => 7.0,
        CaptionFontSize::Medium => 9.0,
        CaptionFontSize::Large => 11.0,
    }
}

fn paper_dimensions_mm(paper: PaperSize, orientation: Orientation) -> (f32, f32) {
    let (w, h) = match paper {
        PaperSize::A4 => (210.0, 297.0),
        PaperSize::Letter => (215.9, 279.4),
    };
    match orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    }
}

/// Grid geometry for one report, all in mm with the PDF's bottom-left origin.
struct ReportGeometry {
    page_w: f32,
    page_h: f32,
    columns: usize,
    cell_w: f32,
    row_h: f32,
    image_h: f32,
    caption_pt: f32,
    include_captions: bool,
}

impl ReportGeometry {
    fn from_config(config: &LayoutConfig) -> Result<Self, RenderError> {
        // Callers normally paginate first, which validates; render_pdf is
        // public, so a zero grid must still fail cleanly here.
        if config.columns == 0 || config.photos_per_page == 0 {
            return Err(RenderError::Layout(
                "columns and photosPerPage must be at least 1".to_string(),
            ));
        }

        let (page_w, page_h) = paper_dimensions_mm(config.paper_size, config.orientation);
        let columns = config.columns;
        let rows = config.rows_per_page();

        let usable_w = page_w - MARGIN_MM * 2.0;
        let grid_h = page_h - MARGIN_MM * 2.0 - HEADER_HEIGHT_MM;
        let cell_w = (usable_w - CELL_GAP_MM * (columns - 1) as f32) / columns as f32;
        let row_h = (grid_h - CELL_GAP_MM * (rows - 1) as f32) / rows as f32;

        let caption_pt = caption_points(config.caption_font_size);
        let caption_band = if config.include_captions {
            CAPTION_GAP_MM + caption_line_height_mm(caption_pt) * CAPTION_LINES as f32
        } else {
            0.0
        };
        let image_h = row_h - caption_band;

        if cell_w < 10.0 || image_h < 10.0 {
            return Err(RenderError::Layout(format!(
                "grid of {} columns x {} rows does not fit the selected paper size",
                columns, rows
            )));
        }

        Ok(ReportGeometry {
            page_w,
            page_h,
            columns,
            cell_w,
            row_h,
            image_h,
            caption_pt,
            include_captions: config.include_captions,
        })
    }

    fn cell_x(&self, column: usize) -> f32 {
        MARGIN_MM + column as f32 * (self.cell_w + CELL_GAP_MM)
    }

    /// Y of the top edge of a cell row.
    fn cell_top_y(&self, row: usize) -> f32 {
        self.page_h - MARGIN_MM - HEADER_HEIGHT_MM - row as f32 * (self.row_h + CELL_GAP_MM)
    }
}

fn caption_line_height_mm(pt: f32) -> f32 {
    pt * PT_TO_MM * 1.3
}

fn estimated_text_width_mm(text: &str, pt: f32) -> f32 {
    text.chars().count() as f32 * pt * PT_TO_MM * AVG_CHAR_WIDTH
}

/// Renders an already-paginated report to PDF bytes. The paginator owns page
/// breaks and cell positions; this sink only turns them into geometry.
pub fn render_pdf(
    pages: &[Page],
    config: &LayoutConfig,
    title: &str,
) -> Result<Vec<u8>, RenderError> {
    if pages.is_empty() {
        return Err(RenderError::Layout("nothing to render".to_string()));
    }

    let geometry = ReportGeometry::from_config(config)?;
    let total_pages = pages.len();

    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm(geometry.page_w),
        Mm(geometry.page_h),
        "Page 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;

    let generated_on = Utc::now().format("%Y-%m-%d").to_string();

    for page in pages {
        let layer = if page.page_number == 1 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_idx, layer_idx) = doc.add_page(
                Mm(geometry.page_w),
                Mm(geometry.page_h),
                format!("Page {}", page.page_number),
            );
            doc.get_page(page_idx).get_layer(layer_idx)
        };

        draw_header(
            &layer,
            &geometry,
            &font,
            &bold,
            title,
            page.page_number,
            total_pages,
            &generated_on,
        );

        for cell in &page.cells {
            let x = geometry.cell_x(cell.column);
            let cell_top = geometry.cell_top_y(cell.row);

            place_image(&layer, &geometry, cell.photo.name.as_str(), &cell.photo.bytes, x, cell_top)?;

            if geometry.include_captions {
                draw_caption(&layer, &geometry, &font, cell.photo.name.as_str(), x, cell_top);
            }
        }

        debug!(
            "Rendered page {}/{} with {} cells",
            page.page_number,
            total_pages,
            page.cells.len()
        );
    }

    doc.save_to_bytes().map_err(|e| RenderError::Pdf(e.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn draw_header(
    layer: &PdfLayerReference,
    geometry: &ReportGeometry,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
    title: &str,
    page_number: usize,
    total_pages: usize,
    generated_on: &str,
) {
    let title_y = geometry.page_h - MARGIN_MM - TITLE_FONT_PT * PT_TO_MM;
    layer.use_text(title, TITLE_FONT_PT, Mm(MARGIN_MM), Mm(title_y), bold);

    let page_info = format!("Page {} of {}", page_number, total_pages);
    let page_info_x =
        geometry.page_w - MARGIN_MM - estimated_text_width_mm(&page_info, META_FONT_PT);
    layer.use_text(page_info, META_FONT_PT, Mm(page_info_x), Mm(title_y), font);

    let meta_y = title_y - META_FONT_PT * PT_TO_MM * 1.6;
    layer.use_text(
        format!("Generated on {}", generated_on),
        META_FONT_PT,
        Mm(MARGIN_MM),
        Mm(meta_y),
        font,
    );
}

/// Fit-within placement of one image in a cell's image box. All lengths mm.
struct FittedImage {
    scale: f32,
    drawn_w: f32,
    drawn_h: f32,
}

/// Scales a px_w x px_h image to fit inside box_w x box_h without cropping,
/// never upscaled past MAX_UPSCALE.
fn fit_in_cell(px_w: u32, px_h: u32, box_w: f32, box_h: f32) -> FittedImage {
    // Natural print size at the embedding resolution.
    let natural_w = px_w as f32 * 25.4 / IMAGE_DPI;
    let natural_h = px_h as f32 * 25.4 / IMAGE_DPI;

    let scale = (box_w / natural_w).min(box_h / natural_h).min(MAX_UPSCALE);

    FittedImage {
        scale,
        drawn_w: natural_w * scale,
        drawn_h: natural_h * scale,
    }
}

/// Decodes the photo and places it fit-within its cell box.
fn place_image(
    layer: &PdfLayerReference,
    geometry: &ReportGeometry,
    name: &str,
    bytes: &[u8],
    cell_x: f32,
    cell_top: f32,
) -> Result<(), RenderError> {
    let decoded = image_crate::load_from_memory(bytes).map_err(|source| RenderError::Decode {
        name: name.to_string(),
        source,
    })?;
    let rgb = decoded.to_rgb8();
    let (px_w, px_h) = (rgb.width(), rgb.height());
    if px_w == 0 || px_h == 0 {
        return Err(RenderError::Layout(format!("image '{}' has zero size", name)));
    }

    let fitted = fit_in_cell(px_w, px_h, geometry.cell_w, geometry.image_h);
    let x = cell_x + (geometry.cell_w - fitted.drawn_w) / 2.0;
    let y = cell_top - geometry.image_h + (geometry.image_h - fitted.drawn_h) / 2.0;

    let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb));
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            scale_x: Some(fitted.scale),
            scale_y: Some(fitted.scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );

    Ok(())
}

fn draw_caption(
    layer: &PdfLayerReference,
    geometry: &ReportGeometry,
    font: &IndirectFontRef,
    name: &str,
    cell_x: f32,
    cell_top: f32,
) {
    let caption = strip_extension(name);
    let lines = wrap_caption(caption, geometry.cell_w, geometry.caption_pt);

    let line_height = caption_line_height_mm(geometry.caption_pt);
    let first_baseline = cell_top - geometry.image_h - CAPTION_GAP_MM - geometry.caption_pt * PT_TO_MM;

    for (i, line) in lines.iter().enumerate() {
        let line_x = cell_x
            + ((geometry.cell_w - estimated_text_width_mm(line, geometry.caption_pt)) / 2.0).max(0.0);
        layer.use_text(
            line.as_str(),
            geometry.caption_pt,
            Mm(line_x),
            Mm(first_baseline - i as f32 * line_height),
            font,
        );
    }
}

/// Word-wraps a caption to the cell width, at most CAPTION_LINES lines. Words
/// longer than a line are hard-broken; overflow past the last line is
/// dropped.
fn wrap_caption(text: &str, cell_w_mm: f32, pt: f32) -> Vec<String> {
    let chars_per_line =
        ((cell_w_mm / (pt * PT_TO_MM * AVG_CHAR_WIDTH)).floor() as usize).max(1);

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        loop {
            let candidate_len = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };

            if candidate_len <= chars_per_line {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                break;
            }

            if current.is_empty() {
                // Hard-break a word that can't fit on its own line.
                let split: usize = word
                    .char_indices()
                    .nth(chars_per_line)
                    .map(|(idx, _)| idx)
                    .unwrap_or(word.len());
                current.push_str(&word[..split]);
                word = &word[split..];
            }

            lines.push(std::mem::take(&mut current));
            if lines.len() == CAPTION_LINES {
                return lines;
            }
            if word.is_empty() {
                break;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.truncate(CAPTION_LINES);
    lines
}
