//! MuPDF-backed document backend

use std::path::Path;

use mupdf::text_page::TextBlockType;
use mupdf::{Colorspace, Document, Matrix, TextPageFlags};

use crate::viewer::geometry::Rect;
use crate::viewer::glyphs::Glyph;
use crate::viewer::zoom::ZoomLevel;

use super::{BackendError, DocumentBackend, DocumentHandle, PageImage};

/// Document backend rasterizing through MuPDF.
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfBackend;

impl DocumentBackend for MupdfBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError> {
        let doc = Document::open(path.to_string_lossy().as_ref()).map_err(engine)?;
        let page_count = doc.page_count().map_err(engine)? as usize;
        if page_count == 0 {
            return Err(BackendError::EmptyDocument);
        }
        Ok(Box::new(MupdfDocument { doc, page_count }))
    }
}

struct MupdfDocument {
    doc: Document,
    page_count: usize,
}

impl MupdfDocument {
    fn load_page(&self, page: usize) -> Result<mupdf::Page, BackendError> {
        if page >= self.page_count {
            return Err(BackendError::PageOutOfRange(page));
        }
        self.doc.load_page(page as i32).map_err(engine)
    }
}

impl DocumentHandle for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page: usize, zoom: ZoomLevel) -> Result<(u32, u32), BackendError> {
        let bounds = self.load_page(page)?.bounds().map_err(engine)?;
        let scale = f32::from(zoom) / 100.0;
        Ok((
            ((bounds.x1 - bounds.x0) * scale) as u32,
            ((bounds.y1 - bounds.y0) * scale) as u32,
        ))
    }

    fn render_page(&self, page: usize, zoom: ZoomLevel) -> Result<PageImage, BackendError> {
        let page = self.load_page(page)?;
        let scale = f32::from(zoom) / 100.0;
        let matrix = Matrix::new_scale(scale, scale);
        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)
            .map_err(engine)?;
        pixmap_to_rgb(&pixmap)
    }

    fn glyphs_for_page(&self, page: usize) -> Result<Vec<Glyph>, BackendError> {
        let page = self.load_page(page)?;
        let text_page = page.to_text_page(TextPageFlags::empty()).map_err(engine)?;

        let mut glyphs = Vec::new();
        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                let bounds = line.bounds();
                let chars: Vec<(char, f32)> = line
                    .chars()
                    .filter_map(|ch| ch.char().map(|c| (c, ch.origin().x)))
                    .collect();
                // Character boxes span the line vertically; each one's
                // right edge is the next character's origin.
                for (i, (c, x)) in chars.iter().enumerate() {
                    let x1 = if i + 1 < chars.len() {
                        chars[i + 1].1
                    } else {
                        bounds.x1
                    };
                    glyphs.push(Glyph {
                        c: *c,
                        bbox: Rect::new(*x, bounds.y0, x1.max(*x), bounds.y1),
                    });
                }
            }
        }
        Ok(glyphs)
    }

    fn page_text(&self, page: usize) -> Result<String, BackendError> {
        let page = self.load_page(page)?;
        let text_page = page.to_text_page(TextPageFlags::empty()).map_err(engine)?;

        let mut text = String::new();
        for block in text_page.blocks() {
            if block.r#type() != TextBlockType::Text {
                continue;
            }
            for line in block.lines() {
                for ch in line.chars() {
                    if let Some(c) = ch.char() {
                        text.push(c);
                    }
                }
                text.push('\n');
            }
        }
        Ok(text)
    }
}

fn engine(e: mupdf::error::Error) -> BackendError {
    BackendError::Engine(e.to_string())
}

fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> Result<PageImage, BackendError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(BackendError::Engine(format!(
            "unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(BackendError::Engine("pixmap buffer size mismatch".into()));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(PageImage {
        pixels: out,
        width: pixmap.width(),
        height: pixmap.height(),
    })
}
