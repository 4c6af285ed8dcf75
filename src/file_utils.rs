use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Chunk size used when streaming a file through the hasher
pub const HASH_CHUNK_SIZE: usize = 4096;

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a translated document
    // @params: input_file, target_language
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, target_language: &str) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let output_filename = format!("{}_{}.xml", stem, target_language);

        match input_file.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        }
    }

    /// Whether `path` looks like output written for `target_language`
    pub fn is_translated_output<P: AsRef<Path>>(path: P, target_language: &str) -> bool {
        let suffix = format!("_{}", target_language).to_lowercase();
        path.as_ref()
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase().ends_with(&suffix))
            .unwrap_or(false)
    }

    /// Find files with a specific extension in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let wanted = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(wanted) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// SHA-256 of a file's content as lowercase hex, streamed in fixed-size chunks
    pub fn hash_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
        let mut file = File::open(path.as_ref())?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; HASH_CHUNK_SIZE];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// SHA-256 of an in-memory buffer, same encoding as [`FileManager::hash_file`]
    pub fn hash_bytes(bytes: &[u8]) -> String {
        format!("{:x}", Sha256::digest(bytes))
    }

    /// [`FileManager::hash_file`] on the blocking thread pool
    pub async fn hash_file_async<P: AsRef<Path>>(path: P) -> io::Result<String> {
        let path = path.as_ref().to_path_buf();

        tokio::task::spawn_blocking(move || Self::hash_file(&path))
            .await
            .map_err(|e| io::Error::other(format!("File hashing task panicked: {}", e)))?
    }

    /// Remove a file, treating an already missing file as success
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> io::Result<()> {
        match fs::remove_file(path.as_ref()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
