// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open a document with `lopdf` and report its page geometry.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};
use quire_core::error::{QuireError, Result};
use quire_core::{DocumentInfo, PageDimensions};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

/// Hex characters of the content hash used as the document id.
const DOCUMENT_ID_LEN: usize = 12;
/// Guard against cyclic /Parent chains.
const MAX_TREE_DEPTH: usize = 64;
/// MediaBox of a page that declares none, anywhere in its ancestry (Letter).
const FALLBACK_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Reads page geometry from an existing PDF.
pub struct PdfReader {
    document: Document,
    id: String,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = std::fs::read(path_ref)?;
        info!(bytes = data.len(), "Opening PDF: {}", path_ref.display());
        Self::from_bytes(&data)
    }

    /// Load a PDF already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| QuireError::Pdf(format!("failed to load PDF from memory: {err}")))?;
        let id = document_id(data);
        debug!(id, pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document, id })
    }

    // -- Inspection -----------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Id, page count, and per-page dimensions in page order.
    pub fn document_info(&self) -> Result<DocumentInfo> {
        let pages = self
            .document
            .get_pages()
            .into_iter()
            .map(|(number, page_id)| self.page_dimensions(number, page_id))
            .collect::<Result<Vec<_>>>()?;
        Ok(DocumentInfo {
            id: self.id.clone(),
            page_count: pages.len(),
            pages,
        })
    }

    /// Size of one page in points, as displayed: /Rotate 90 or 270 swaps
    /// width and height.
    fn page_dimensions(&self, number: u32, page_id: ObjectId) -> Result<PageDimensions> {
        let media_box = match self.inherited(page_id, b"MediaBox")? {
            Some(object) => self.rectangle(object).ok_or_else(|| {
                QuireError::Pdf(format!("page {number} has a malformed /MediaBox"))
            })?,
            None => {
                warn!(page = number, "Page has no /MediaBox; assuming Letter");
                FALLBACK_MEDIA_BOX
            }
        };
        let width = (media_box[2] - media_box[0]).abs();
        let height = (media_box[3] - media_box[1]).abs();

        let rotate = self
            .inherited(page_id, b"Rotate")?
            .and_then(|object| self.resolve(object).as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360);

        Ok(if rotate == 90 || rotate == 270 {
            PageDimensions {
                width_pt: height,
                height_pt: width,
            }
        } else {
            PageDimensions {
                width_pt: width,
                height_pt: height,
            }
        })
    }

    // -- Helpers --------------------------------------------------------------

    /// Look `key` up on the page, then on each ancestor in the page tree.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Result<Option<&Object>> {
        let mut dict = self.dictionary(page_id)?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value));
            }
            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => dict = self.dictionary(parent)?,
                Err(_) => return Ok(None),
            }
        }
        Err(QuireError::Pdf("page tree too deep or cyclic".to_string()))
    }

    fn dictionary(&self, id: ObjectId) -> Result<&Dictionary> {
        self.document
            .get_dictionary(id)
            .map_err(|err| QuireError::Pdf(format!("cannot read object {id:?}: {err}")))
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    fn rectangle(&self, object: &Object) -> Option<[f64; 4]> {
        let values = self.resolve(object).as_array().ok()?;
        if values.len() != 4 {
            return None;
        }
        let mut rect = [0.0; 4];
        for (slot, value) in rect.iter_mut().zip(values) {
            *slot = number(self.resolve(value))?;
        }
        Some(rect)
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Stable id derived from the file contents: identical bytes, identical id.
pub fn document_id(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = hex::encode(digest);
    hex.truncate(DOCUMENT_ID_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use lopdf::dictionary;

    use super::*;

    fn rect(w: i64, h: i64) -> Object {
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(w),
            Object::Integer(h),
        ])
    }

    /// Three pages: one inheriting Letter from the tree, one A4 rotated 90,
    /// one with a real-valued box.
    fn sample_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let inherited = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        let rotated = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => rect(595, 842),
            "Rotate" => Object::Integer(90),
        });
        let real = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(419.5),
                Object::Real(595.5),
            ]),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![
                    Object::Reference(inherited),
                    Object::Reference(rotated),
                    Object::Reference(real),
                ],
                "Count" => Object::Integer(3),
                "MediaBox" => rect(612, 792),
            }),
        );
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn reports_inherited_and_rotated_dimensions() {
        let reader = PdfReader::from_bytes(&sample_pdf()).unwrap();
        let info = reader.document_info().unwrap();
        assert_eq!(info.page_count, 3);
        assert_eq!(
            info.pages[0],
            PageDimensions {
                width_pt: 612.0,
                height_pt: 792.0
            }
        );
        assert_eq!(
            info.pages[1],
            PageDimensions {
                width_pt: 842.0,
                height_pt: 595.0
            }
        );
        assert_eq!(info.pages[2].width_pt, 419.5);
        assert_eq!(info.pages[2].height_pt, 595.5);
    }

    #[test]
    fn identical_bytes_share_an_id() {
        let bytes = sample_pdf();
        let a = PdfReader::from_bytes(&bytes).unwrap();
        let b = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().len(), 12);
        assert_ne!(document_id(b"other"), a.id());
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        assert!(matches!(
            PdfReader::from_bytes(b"%PDF-nope"),
            Err(QuireError::Pdf(_))
        ));
    }
}
