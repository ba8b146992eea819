//! Shared helpers for integration tests: synthetic EAIP archives built with
//! real ZIP and PDF encoders

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::unstable::write::FileOptionsExt;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const ROOT: &str = "EAIP2025-11";
pub const VENDOR: &str = "EAIP2025-11";

/// Minimal PDF document with `pages` empty pages
pub fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set("Contents", Object::Reference(content_id));
            Object::Reference(doc.add_object(Object::Dictionary(page)))
        })
        .collect();

    let mut pages_dict = Dictionary::new();
    pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ]),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Builder for vendor-shaped archives
pub struct ArchiveBuilder {
    root: String,
    files: Vec<(String, Vec<u8>)>,
    airport_records: Vec<String>,
    enroute_records: Vec<String>,
    password: Option<String>,
}

impl ArchiveBuilder {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            files: Vec::new(),
            airport_records: Vec::new(),
            enroute_records: Vec::new(),
            password: None,
        }
    }

    /// Airport chart stored under an opaque name, listed in `AD.JSON`
    pub fn airport_chart(mut self, icao: &str, file: &str, name: &str, pages: usize) -> Self {
        let path = format!("Data/{}/Terminal/{}/{}", VENDOR, icao, file);
        self.airport_records
            .push(format!(r#"{{"name": "{}", "pdfPath": "/{}"}}"#, name, path));
        self.files.push((path, blank_pdf(pages)));
        self
    }

    /// En-route chart listed in `ENR.JSON`
    pub fn enroute_chart(mut self, file: &str, name: &str) -> Self {
        let path = format!("Data/{}/ENROUTE/{}", VENDOR, file);
        self.enroute_records
            .push(format!(r#"{{"name": "{}", "pdfPath": "/{}"}}"#, name, path));
        self.files.push((path, blank_pdf(1)));
        self
    }

    /// Arbitrary extra file relative to the root folder
    pub fn extra_file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.push((path.to_string(), data.to_vec()));
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        if let Some(password) = &self.password {
            options = options.with_deprecated_encryption(password.as_bytes());
        }

        writer
            .add_directory(format!("{}/", self.root), SimpleFileOptions::default())
            .unwrap();

        let manifests = [
            ("Data/JsonPath/AD.JSON", &self.airport_records),
            ("Data/JsonPath/ENR.JSON", &self.enroute_records),
        ];
        for (path, records) in manifests {
            let json = format!("[{}]", records.join(","));
            writer
                .start_file(format!("{}/{}", self.root, path), options)
                .unwrap();
            writer.write_all(json.as_bytes()).unwrap();
        }

        for (path, data) in &self.files {
            writer
                .start_file(format!("{}/{}", self.root, path), options)
                .unwrap();
            writer.write_all(data).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }

    pub fn write_to(self, path: &Path) -> PathBuf {
        fs::write(path, self.build()).unwrap();
        path.to_path_buf()
    }
}

/// Archive holding only the given root-level files, no folder at all
pub fn flat_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// The standard test cycle: ZBAA with three charts and one en-route chart
pub fn standard_archive() -> ArchiveBuilder {
    ArchiveBuilder::new(ROOT)
        .airport_chart("ZBAA", "a1.pdf", "ZBAA AD 2.1", 1)
        .airport_chart("ZBAA", "a2.pdf", "ZBAA-7A SID RWY36R", 1)
        .airport_chart("ZBAA", "a3.pdf", "ZBAA-1 IAC ILS RWY36R", 4)
        .enroute_chart("e1.pdf", "ENR 6.1: Routes")
}

/// Names of the direct children of `dir`, sorted
pub fn child_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
