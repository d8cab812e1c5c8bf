//! PDF persistence backend
//!
//! The only crate that touches PDF bytes. Built on lopdf: it opens a
//! document from a path or raw bytes, exposes page media boxes, imports
//! the overlay annotations (covers and free text) into the in-memory
//! model, and writes the model back into the page `/Annots` arrays on
//! save. The page content stream is never rewritten.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use overtype_core::annotation::{Annotation, AnnotationKind, FontSpec};
use overtype_core::document::{DocumentModel, PageModel};
use overtype_core::geometry::{Color, PageRect};
use std::path::Path;

/// Errors from the persistence backend
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),

    #[error("malformed PDF structure: {0}")]
    Malformed(String),

    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u16, page_count: u16 },
}

/// An open PDF document plus its resolved page object IDs
pub struct PdfBackend {
    doc: Document,
    page_ids: Vec<ObjectId>,
}

impl PdfBackend {
    /// Open a document from a file-system path
    pub fn open_path(path: &Path) -> Result<Self, EngineError> {
        log::info!("opening PDF from {}", path.display());
        Self::from_document(Document::load(path)?)
    }

    /// Open a document from raw in-memory bytes
    pub fn open_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        log::info!("opening PDF from memory ({} bytes)", bytes.len());
        Self::from_document(Document::load_mem(bytes)?)
    }

    fn from_document(doc: Document) -> Result<Self, EngineError> {
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(EngineError::Malformed("document has no pages".to_owned()));
        }
        Ok(Self { doc, page_ids })
    }

    /// Number of pages
    pub fn page_count(&self) -> u16 {
        self.page_ids.len() as u16
    }

    /// Media box for a page, defaulting to US Letter when absent
    pub fn media_box(&self, page_index: u16) -> Result<PageRect, EngineError> {
        let page_id = *self.page_ids.get(page_index as usize).ok_or(
            EngineError::PageOutOfRange {
                page: page_index,
                page_count: self.page_count(),
            },
        )?;

        let dict = self.doc.get_dictionary(page_id)?;
        let rect = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| obj.as_array().ok())
            .and_then(|array| {
                if array.len() != 4 {
                    return None;
                }
                let x0 = array[0].as_float().ok()?;
                let y0 = array[1].as_float().ok()?;
                let x1 = array[2].as_float().ok()?;
                let y1 = array[3].as_float().ok()?;
                Some(PageRect::new(
                    x0.min(x1),
                    y0.min(y1),
                    (x1 - x0).abs(),
                    (y1 - y0).abs(),
                ))
            })
            .unwrap_or(PageRect::new(0.0, 0.0, 612.0, 792.0));

        Ok(rect)
    }

    /// Build the in-memory model: page media boxes plus any overlay
    /// annotations already present in the file.
    ///
    /// Imported annotations are stripped from the underlying document;
    /// the model owns them from here on and [`PdfBackend::save`] writes
    /// them back. Foreign annotation kinds (links, highlights, ...) stay
    /// in the file untouched.
    pub fn load_model(&mut self) -> Result<DocumentModel, EngineError> {
        let mut pages = Vec::with_capacity(self.page_ids.len());
        for index in 0..self.page_count() {
            pages.push(PageModel::new(self.media_box(index)?));
        }

        let mut model = DocumentModel::with_pages(pages);
        for page_index in 0..self.page_count() {
            for annotation in self.import_page_annotations(page_index)? {
                model.add_annotation(annotation);
            }
        }
        Ok(model)
    }

    /// Pull overlay annotations out of one page's `/Annots` array
    fn import_page_annotations(&mut self, page_index: u16) -> Result<Vec<Annotation>, EngineError> {
        let page_id = self.page_ids[page_index as usize];
        let entries = self.annots_array(page_id)?;

        let mut imported = Vec::new();
        let mut remaining = Vec::new();

        for entry in entries {
            let dict = match self.resolve_dict(&entry) {
                Some(dict) => dict.clone(),
                None => {
                    remaining.push(entry);
                    continue;
                }
            };
            match annotation_from_dict(&dict, page_index) {
                Some(annotation) => imported.push(annotation),
                None => remaining.push(entry),
            }
        }

        if !imported.is_empty() {
            let page = self
                .doc
                .get_object_mut(page_id)?
                .as_dict_mut()
                .map_err(|_| EngineError::Malformed("page is not a dictionary".to_owned()))?;
            if remaining.is_empty() {
                page.remove(b"Annots");
            } else {
                page.set("Annots", Object::Array(remaining));
            }
        }

        Ok(imported)
    }

    /// Current `/Annots` entries for a page, resolving one level of
    /// indirection (the array itself may be a reference)
    fn annots_array(&self, page_id: ObjectId) -> Result<Vec<Object>, EngineError> {
        let dict = self.doc.get_dictionary(page_id)?;
        let Ok(annots_obj) = dict.get(b"Annots") else {
            return Ok(Vec::new());
        };

        let entries = match annots_obj {
            Object::Array(entries) => entries.clone(),
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(entries)
    }

    fn resolve_dict<'a>(&'a self, entry: &'a Object) -> Option<&'a Dictionary> {
        match entry {
            Object::Dictionary(dict) => Some(dict),
            Object::Reference(id) => self.doc.get_object(*id).ok()?.as_dict().ok(),
            _ => None,
        }
    }

    /// Write the model's annotations into a copy of the document and
    /// save it to `path`. The backend itself stays unchanged, so
    /// repeated saves never duplicate annotations.
    pub fn save(&self, model: &DocumentModel, path: &Path) -> Result<(), EngineError> {
        let mut doc = self.export_document(model)?;
        doc.save(path)?;
        log::info!("saved PDF to {}", path.display());
        Ok(())
    }

    /// As [`PdfBackend::save`], returning the bytes instead
    pub fn save_bytes(&self, model: &DocumentModel) -> Result<Vec<u8>, EngineError> {
        let mut doc = self.export_document(model)?;
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn export_document(&self, model: &DocumentModel) -> Result<Document, EngineError> {
        let mut doc = self.doc.clone();

        for page_index in 0..self.page_count() {
            let annotations = model.annotations().page_annotations(page_index);
            if annotations.is_empty() {
                continue;
            }

            let refs: Vec<Object> = annotations
                .iter()
                .map(|a| Object::Reference(doc.add_object(annotation_to_dict(a))))
                .collect();

            let page_id = self.page_ids[page_index as usize];
            let page = doc
                .get_object_mut(page_id)?
                .as_dict_mut()
                .map_err(|_| EngineError::Malformed("page is not a dictionary".to_owned()))?;

            let mut entries = match page.get(b"Annots") {
                Ok(Object::Array(existing)) => existing.clone(),
                _ => Vec::new(),
            };
            entries.extend(refs);
            page.set("Annots", Object::Array(entries));
        }

        Ok(doc)
    }
}

/// PDF name used in the `/DA` string for a font family
fn da_font_name(family: &str) -> &'static str {
    match family {
        "Courier" => "Cour",
        "Times-Roman" => "TiRo",
        _ => "Helv",
    }
}

/// Font family for a `/DA` font name
fn family_from_da_name(name: &str) -> &'static str {
    match name {
        "Cour" => "Courier",
        "TiRo" => "Times-Roman",
        _ => "Helvetica",
    }
}

/// Parse "/Helv 12 Tf 0 0 0 rg" into a font spec
fn font_from_da(da: &str) -> FontSpec {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    if let Some(tf) = tokens.iter().position(|t| *t == "Tf") {
        let size = tf
            .checked_sub(1)
            .and_then(|i| tokens[i].parse::<f32>().ok())
            .unwrap_or(12.0);
        let family = tf
            .checked_sub(2)
            .map(|i| family_from_da_name(tokens[i].trim_start_matches('/')))
            .unwrap_or("Helvetica");
        FontSpec::new(family, size)
    } else {
        FontSpec::default_font()
    }
}

fn rect_to_object(rect: &PageRect) -> Object {
    Object::Array(vec![
        Object::Real(rect.x),
        Object::Real(rect.y),
        Object::Real(rect.max_x()),
        Object::Real(rect.max_y()),
    ])
}

fn rect_from_object(obj: &Object) -> Option<PageRect> {
    let array = obj.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let x0 = array[0].as_float().ok()?;
    let y0 = array[1].as_float().ok()?;
    let x1 = array[2].as_float().ok()?;
    let y1 = array[3].as_float().ok()?;
    Some(PageRect::new(
        x0.min(x1),
        y0.min(y1),
        (x1 - x0).abs(),
        (y1 - y0).abs(),
    ))
}

fn color_components(color: Color) -> Vec<Object> {
    let (r, g, b, _) = color.to_normalized();
    vec![Object::Real(r), Object::Real(g), Object::Real(b)]
}

fn color_from_components(obj: &Object) -> Option<Color> {
    let array = obj.as_array().ok()?;
    if array.len() != 3 {
        return None;
    }
    let r = array[0].as_float().ok()?;
    let g = array[1].as_float().ok()?;
    let b = array[2].as_float().ok()?;
    Some(Color::rgb(
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ))
}

/// Map a model annotation to a PDF annotation dictionary
fn annotation_to_dict(annotation: &Annotation) -> Dictionary {
    match &annotation.kind {
        AnnotationKind::Cover { bounds, fill } => dictionary! {
            "Type" => "Annot",
            "Subtype" => "Square",
            "Rect" => rect_to_object(bounds),
            "IC" => Object::Array(color_components(*fill)),
            "F" => 4,
            "BS" => dictionary! { "W" => 0 },
        },
        AnnotationKind::FreeText {
            bounds,
            contents,
            font,
            color,
            read_only,
        } => {
            let (r, g, b, _) = color.to_normalized();
            let da = format!("/{} {} Tf {} {} {} rg", da_font_name(&font.family), font.size, r, g, b);
            // Flag 4 = print; bit 7 (64) = read-only
            let flags: i64 = if *read_only { 4 | 64 } else { 4 };
            dictionary! {
                "Type" => "Annot",
                "Subtype" => "FreeText",
                "Rect" => rect_to_object(bounds),
                "Contents" => Object::String(contents.as_bytes().to_vec(), StringFormat::Literal),
                "DA" => Object::String(da.into_bytes(), StringFormat::Literal),
                "F" => flags,
            }
        }
    }
}

/// Map a PDF annotation dictionary back to a model annotation.
///
/// Returns `None` for kinds this editor does not own.
fn annotation_from_dict(dict: &Dictionary, page_index: u16) -> Option<Annotation> {
    let subtype = match dict.get(b"Subtype") {
        Ok(Object::Name(name)) => name.as_slice(),
        _ => return None,
    };
    let bounds = dict.get(b"Rect").ok().and_then(rect_from_object)?;

    match subtype {
        b"Square" => {
            // Only filled, borderless squares are covers
            let fill = dict.get(b"IC").ok().and_then(color_from_components)?;
            Some(Annotation::new(
                page_index,
                AnnotationKind::Cover { bounds, fill },
            ))
        }
        b"FreeText" => {
            let contents = dict
                .get(b"Contents")
                .ok()
                .and_then(|obj| match obj {
                    Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    _ => None,
                })
                .unwrap_or_default();
            let font = dict
                .get(b"DA")
                .ok()
                .and_then(|obj| match obj {
                    Object::String(bytes, _) => Some(font_from_da(&String::from_utf8_lossy(bytes))),
                    _ => None,
                })
                .unwrap_or_default();
            let flags = dict
                .get(b"F")
                .ok()
                .and_then(|obj| obj.as_i64().ok())
                .unwrap_or(4);

            Some(Annotation::new(
                page_index,
                AnnotationKind::FreeText {
                    bounds,
                    contents,
                    font,
                    color: Color::BLACK,
                    read_only: flags & 64 != 0,
                },
            ))
        }
        _ => None,
    }
}

/// Generate a minimal blank document with `page_count` US Letter pages.
///
/// Used as a fixture by tests and demos; real documents come from disk.
pub fn blank_pdf_bytes(page_count: u16) -> Result<Vec<u8>, EngineError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(page_count as usize);
    for _ in 0..page_count {
        let content_id = doc.add_object(Object::Stream(lopdf::Stream::new(
            dictionary! {},
            Vec::new(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use overtype_core::geometry::PageRect;

    #[test]
    fn test_open_blank_document() {
        let bytes = blank_pdf_bytes(3).unwrap();
        let backend = PdfBackend::open_bytes(&bytes).unwrap();
        assert_eq!(backend.page_count(), 3);

        let media = backend.media_box(0).unwrap();
        assert_eq!(media, PageRect::new(0.0, 0.0, 612.0, 792.0));
        assert!(backend.media_box(3).is_err());
    }

    #[test]
    fn test_open_garbage_fails() {
        assert!(PdfBackend::open_bytes(b"not a pdf").is_err());
        assert!(PdfBackend::open_path(Path::new("/nonexistent/file.pdf")).is_err());
    }

    #[test]
    fn test_load_model_page_shapes() {
        let bytes = blank_pdf_bytes(2).unwrap();
        let mut backend = PdfBackend::open_bytes(&bytes).unwrap();
        let model = backend.load_model().unwrap();
        assert_eq!(model.page_count(), 2);
        assert_eq!(model.annotation_count(), 0);
    }

    #[test]
    fn test_annotation_dict_mapping() {
        let annotation = Annotation::free_text(
            1,
            PageRect::new(50.0, 700.0, 100.0, 20.0),
            "Hi there",
            FontSpec::new("Courier", 14.0),
        );
        let dict = annotation_to_dict(&annotation);
        let back = annotation_from_dict(&dict, 1).unwrap();

        assert_eq!(back.page_index(), 1);
        assert_eq!(back.contents(), Some("Hi there"));
        assert_eq!(back.bounds(), PageRect::new(50.0, 700.0, 100.0, 20.0));
        let font = back.font().unwrap();
        assert_eq!(font.family, "Courier");
        assert_eq!(font.size, 14.0);
    }

    #[test]
    fn test_cover_dict_mapping() {
        let cover = Annotation::cover(0, PageRect::new(10.0, 20.0, 30.0, 40.0));
        let dict = annotation_to_dict(&cover);
        let back = annotation_from_dict(&dict, 0).unwrap();
        match back.kind {
            AnnotationKind::Cover { bounds, fill } => {
                assert_eq!(bounds, PageRect::new(10.0, 20.0, 30.0, 40.0));
                assert_eq!(fill, Color::WHITE);
            }
            _ => panic!("expected cover"),
        }
    }

    #[test]
    fn test_foreign_annotations_ignored() {
        let dict = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
        };
        assert!(annotation_from_dict(&dict, 0).is_none());
    }

    #[test]
    fn test_save_and_reopen_round_trip() {
        let bytes = blank_pdf_bytes(2).unwrap();
        let mut backend = PdfBackend::open_bytes(&bytes).unwrap();
        let mut model = backend.load_model().unwrap();

        model.add_annotation(Annotation::cover(0, PageRect::new(50.0, 700.0, 100.0, 20.0)));
        model.add_annotation(Annotation::free_text(
            0,
            PageRect::new(50.0, 697.0, 120.0, 24.0),
            "Hi",
            FontSpec::default_font(),
        ));
        model.add_annotation(Annotation::free_text(
            1,
            PageRect::new(10.0, 10.0, 80.0, 15.0),
            "second page",
            FontSpec::new("Times-Roman", 10.0),
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round_trip.pdf");
        backend.save(&model, &path).unwrap();

        let mut reopened = PdfBackend::open_path(&path).unwrap();
        let reloaded = reopened.load_model().unwrap();
        assert_eq!(reloaded.page_count(), model.page_count());
        assert_eq!(reloaded.annotation_count(), model.annotation_count());

        let page1: Vec<_> = reloaded.annotations().page_annotations(1);
        assert_eq!(page1.len(), 1);
        assert_eq!(page1[0].contents(), Some("second page"));
        assert_eq!(page1[0].font().unwrap().family, "Times-Roman");
    }

    #[test]
    fn test_repeated_save_does_not_duplicate() {
        let bytes = blank_pdf_bytes(1).unwrap();
        let mut backend = PdfBackend::open_bytes(&bytes).unwrap();
        let mut model = backend.load_model().unwrap();
        model.add_annotation(Annotation::free_text(
            0,
            PageRect::new(0.0, 0.0, 50.0, 20.0),
            "once",
            FontSpec::default_font(),
        ));

        let first = backend.save_bytes(&model).unwrap();
        let second = backend.save_bytes(&model).unwrap();

        let mut a = PdfBackend::open_bytes(&first).unwrap();
        let mut b = PdfBackend::open_bytes(&second).unwrap();
        assert_eq!(
            a.load_model().unwrap().annotation_count(),
            b.load_model().unwrap().annotation_count()
        );
    }

    #[test]
    fn test_da_font_parsing() {
        let font = font_from_da("/Helv 12 Tf 0 0 0 rg");
        assert_eq!(font.family, "Helvetica");
        assert_eq!(font.size, 12.0);

        let font = font_from_da("/Cour 9.5 Tf 0 0 0 rg");
        assert_eq!(font.family, "Courier");
        assert_eq!(font.size, 9.5);

        let font = font_from_da("garbage");
        assert_eq!(font.family, "Helvetica");
        assert_eq!(font.size, 12.0);
    }
}
