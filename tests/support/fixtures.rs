// ABOUTME: Builders for release archives used as test artifacts.
// ABOUTME: Uncompressed gzip members keep even tiny trees above the artifact size floor.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Write a `.tar.gz` containing `files` (path, contents) to `dest`.
pub fn tar_gz(dest: &Path, files: &[(&str, &str)]) -> PathBuf {
    let file = File::create(dest).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::none()));

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
    dest.to_path_buf()
}

/// A typical forge tarball: everything wrapped in one top-level directory.
pub fn wrapped_release(dest: &Path, version: &str) -> PathBuf {
    tar_gz(
        dest,
        &[
            ("demo-abc123/index.js", &format!("console.log('{version}')")),
            (
                "demo-abc123/package.json",
                r#"{"name":"demo","main":"index.js"}"#,
            ),
        ],
    )
}

/// Release whose package.json declares build and migrate scripts.
pub fn release_with_scripts(dest: &Path, migrate: bool) -> PathBuf {
    let manifest = if migrate {
        r#"{"name":"demo","scripts":{"build":"tsc","migrate":"knex migrate:latest"}}"#
    } else {
        r#"{"name":"demo","scripts":{"build":"tsc"}}"#
    };
    tar_gz(dest, &[("index.js", "x"), ("package.json", manifest)])
}

/// An HTML error page that is comfortably above the size floor.
pub fn html_error_page(dest: &Path) -> PathBuf {
    let body = format!(
        "<!DOCTYPE html><html><body><h1>404 Not Found</h1>{}</body></html>",
        "<p>The requested release does not exist.</p>".repeat(40)
    );
    fs::write(dest, body).unwrap();
    dest.to_path_buf()
}

/// A valid gzip archive with its tail cut off.
pub fn truncated_archive(dest: &Path) -> PathBuf {
    let full = dest.with_extension("full");
    tar_gz(&full, &[("index.js", &"x".repeat(4096))]);
    let bytes = fs::read(&full).unwrap();
    fs::write(dest, &bytes[..bytes.len() - 600]).unwrap();
    fs::remove_file(full).unwrap();
    dest.to_path_buf()
}

/// Entries directly under `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
