//! PDF collaborators used by indexing and the query layer.
//!
//! [`PdfEngine`] opens documents, counts pages and concatenates documents;
//! [`LopdfEngine`] implements it on top of `lopdf`. [`PageRenderer`] turns a
//! short chart into image bytes and is supplied by the embedding viewer.

use crate::error::{EaipError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Attributes a page may inherit from its parent `Pages` node
const INHERITABLE_KEYS: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// An opened PDF document
#[derive(Debug)]
pub struct PdfHandle {
    path: PathBuf,
    document: Document,
}

impl PdfHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Document operations needed by the pipeline
pub trait PdfEngine: Send + Sync {
    /// Open a document, failing with [`EaipError::Pdf`] when unreadable
    fn open_document(&self, path: &Path) -> Result<PdfHandle>;

    /// Number of pages in an opened document
    fn page_count(&self, handle: &PdfHandle) -> usize;

    /// Concatenate the pages of `handles`, in the given order, into one document
    fn merge_pages(&self, handles: Vec<PdfHandle>) -> Result<Vec<u8>>;
}

/// Renders a chart to image bytes (PNG) for display
pub trait PageRenderer: Send + Sync {
    fn render(&self, path: &Path) -> Result<Vec<u8>>;
}

/// [`PdfEngine`] backed by `lopdf`
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for LopdfEngine {
    fn open_document(&self, path: &Path) -> Result<PdfHandle> {
        let document = Document::load(path).map_err(|e| EaipError::Pdf {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(PdfHandle {
            path: path.to_path_buf(),
            document,
        })
    }

    fn page_count(&self, handle: &PdfHandle) -> usize {
        handle.document.get_pages().len()
    }

    fn merge_pages(&self, handles: Vec<PdfHandle>) -> Result<Vec<u8>> {
        let first_path = handles
            .first()
            .map(|h| h.path.clone())
            .unwrap_or_default();

        let mut merged = Document::with_version("1.5");
        let mut next_id = 1;
        let mut page_ids: Vec<ObjectId> = Vec::new();

        for handle in handles {
            let PdfHandle { path, mut document } = handle;
            document.renumber_objects_with(next_id);
            next_id = document.max_id + 1;

            let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
            for page_id in &pages {
                inherit_page_attributes(&mut document, *page_id);
            }
            debug!("Merging {} pages from {}", pages.len(), path.display());

            for (id, object) in document.objects {
                if is_node_of_type(&object, b"Catalog") || is_node_of_type(&object, b"Pages") {
                    continue;
                }
                merged.objects.insert(id, object);
            }
            page_ids.extend(pages);
        }

        if page_ids.is_empty() {
            return Err(EaipError::Pdf {
                path: first_path,
                reason: "no pages to merge".to_string(),
            });
        }

        merged.max_id = next_id - 1;
        let pages_id = merged.new_object_id();

        for page_id in &page_ids {
            if let Some(Object::Dictionary(page)) = merged.objects.get_mut(page_id) {
                page.set("Parent", Object::Reference(pages_id));
            }
        }

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set(
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        pages.set("Count", Object::Integer(page_ids.len() as i64));
        merged.objects.insert(pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = merged.add_object(Object::Dictionary(catalog));
        merged.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        merged.save_to(&mut bytes).map_err(|e| EaipError::Pdf {
            path: first_path,
            reason: e.to_string(),
        })?;
        Ok(bytes)
    }
}

fn is_node_of_type(object: &Object, type_name: &[u8]) -> bool {
    match object {
        Object::Dictionary(dict) => dict
            .get(b"Type")
            .and_then(Object::as_name)
            .is_ok_and(|name| name == type_name),
        _ => false,
    }
}

/// Copy attributes a page inherits from its `Pages` ancestors onto the page,
/// since the ancestors are dropped when merging
fn inherit_page_attributes(document: &mut Document, page_id: ObjectId) {
    let mut inherited: Vec<(Vec<u8>, Object)> = Vec::new();

    if let Ok(Object::Dictionary(page)) = document.get_object(page_id) {
        let missing: Vec<&[u8]> = INHERITABLE_KEYS
            .iter()
            .copied()
            .filter(|key| !page.has(key))
            .collect();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;
        while let Some(parent_id) = parent {
            // guard against cyclic parent chains in damaged files
            if depth > 32 {
                break;
            }
            depth += 1;

            let Ok(Object::Dictionary(node)) = document.get_object(parent_id) else {
                break;
            };
            for key in &missing {
                if inherited.iter().any(|(k, _)| k.as_slice() == *key) {
                    continue;
                }
                if let Ok(value) = node.get(key) {
                    inherited.push((key.to_vec(), value.clone()));
                }
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }
    }

    if inherited.is_empty() {
        return;
    }
    if let Ok(Object::Dictionary(page)) = document.get_object_mut(page_id) {
        for (key, value) in inherited {
            page.set(key, value);
        }
    }
}
