//! CSAR loading
//!
//! A CSAR is read either from an unpacked directory or from a gzip tarball
//! (`.tar.gz`, `.tgz`). All files are held in memory by their
//! archive path, with `/` separators.

use flate2::read::GzDecoder;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CoreError, Result};
use crate::model::{Metadata, CSAR_META, TOSCA_META};
use crate::value::RawValue;

/// Location of the TOSCA metadata file
pub const TOSCA_META_PATH: &str = "TOSCA-Metadata/TOSCA.meta";
/// Location of the SDC metadata file
pub const CSAR_META_PATH: &str = "csar.meta";

/// `TOSCA.meta` key naming the entry definitions document
pub const ENTRY_DEFINITIONS: &str = "Entry-Definitions";
/// `csar.meta` key declaring the conformance level
pub const CONFORMANCE_LEVEL_KEY: &str = "SDC-TOSCA-Definitions-Version";

/// Directory of deployment artifacts, never read as definitions
const ARTIFACTS_DIR: &str = "Artifacts/";

/// ZIP packaged CSARs must be unpacked first
const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz"];

/// The files of a CSAR
#[derive(Debug, Clone, Default)]
pub struct Csar {
    source: Option<PathBuf>,
    files: BTreeMap<String, Vec<u8>>,
}

impl Csar {
    /// Open a CSAR directory or tarball
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::PathNotValid {
                path: path.display().to_string(),
            });
        }

        let files = if path.is_dir() {
            read_dir_files(path)?
        } else if is_archive_name(path) {
            read_archive_files(path)?
        } else {
            return Err(CoreError::PathNotValid {
                path: path.display().to_string(),
            });
        };

        debug!(path = %path.display(), files = files.len(), "opened CSAR");
        Ok(Self {
            source: Some(path.to_path_buf()),
            files: strip_common_root(files),
        })
    }

    /// A CSAR held in memory
    pub fn from_files<I, K, V>(files: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let files = files
            .into_iter()
            .map(|(k, v)| (normalize(&k.into()), v.into()))
            .collect();
        Self {
            source: None,
            files: strip_common_root(files),
        }
    }

    /// Where the CSAR was read from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    /// A file as UTF-8 text
    pub fn file_text(&self, path: &str) -> Result<Option<&str>> {
        match self.files.get(path) {
            None => Ok(None),
            Some(bytes) => std::str::from_utf8(bytes)
                .map(Some)
                .map_err(|e| CoreError::InvalidCsarFormat {
                    message: format!("{} is not valid UTF-8: {}", path, e),
                }),
        }
    }

    /// A `Key: value` meta file
    pub fn meta_file(&self, path: &str) -> Option<Metadata> {
        match self.file_text(path) {
            Ok(Some(text)) => Some(Metadata::from_meta_text(text)),
            Ok(None) => None,
            Err(e) => {
                warn!("unreadable meta file: {}", e);
                None
            }
        }
    }

    /// `TOSCA.meta` and `csar.meta`, keyed by file name
    pub fn meta_files(&self) -> IndexMap<String, Metadata> {
        [(TOSCA_META, TOSCA_META_PATH), (CSAR_META, CSAR_META_PATH)]
            .into_iter()
            .filter_map(|(name, path)| self.meta_file(path).map(|m| (name.to_string(), m)))
            .collect()
    }

    /// Archive path of the entry definitions document
    pub fn entry_definitions(&self) -> Result<String> {
        if let Some(meta) = self.meta_file(TOSCA_META_PATH) {
            let entry = meta
                .get_value(ENTRY_DEFINITIONS)
                .ok_or_else(|| CoreError::InvalidCsarFormat {
                    message: format!("{} has no {} entry", TOSCA_META_PATH, ENTRY_DEFINITIONS),
                })?;
            let entry = normalize(&entry);
            if !self.contains(&entry) {
                return Err(CoreError::EntryDefinitionsNotFound { path: entry });
            }
            return Ok(entry);
        }

        // Without metadata the entry is the only YAML file at the root
        let root_yaml: Vec<&str> = self
            .file_names()
            .filter(|name| !name.contains('/') && is_yaml_name(name))
            .collect();
        match root_yaml.as_slice() {
            [entry] => Ok(entry.to_string()),
            [] => Err(CoreError::InvalidCsarFormat {
                message: format!("no {} and no YAML file at the root", TOSCA_META_PATH),
            }),
            _ => Err(CoreError::InvalidCsarFormat {
                message: format!(
                    "no {} and several YAML files at the root: {}",
                    TOSCA_META_PATH,
                    root_yaml.join(", ")
                ),
            }),
        }
    }

    /// Parse one document of the archive
    pub fn document(&self, path: &str) -> Result<RawValue> {
        let text = self
            .file_text(path)?
            .ok_or_else(|| CoreError::EntryDefinitionsNotFound {
                path: path.to_string(),
            })?;
        RawValue::from_yaml_str(text)
    }

    /// The entry definitions document, which must be a mapping
    pub fn entry_document(&self) -> Result<(String, RawValue)> {
        let path = self.entry_definitions()?;
        let document = self.document(&path)?;
        if document.as_mapping().is_none() {
            return Err(CoreError::InvalidTemplate {
                message: format!("{} is not a YAML mapping", path),
            });
        }
        Ok((path, document))
    }

    /// Declared conformance level from `csar.meta`
    pub fn conformance_level(&self) -> Option<String> {
        let level = self
            .meta_file(CSAR_META_PATH)
            .and_then(|meta| meta.get_value(CONFORMANCE_LEVEL_KEY));
        if level.is_none() {
            warn!("{} does not declare {}", CSAR_META_PATH, CONFORMANCE_LEVEL_KEY);
        }
        level
    }

    /// Every YAML document besides the entry, outside `Artifacts/`
    ///
    /// Documents that fail to parse are skipped with a warning.
    pub fn definitions(&self) -> Result<Vec<(String, RawValue)>> {
        let entry = self.entry_definitions()?;
        let mut documents = Vec::new();

        for name in self.file_names() {
            if name == entry || name.starts_with(ARTIFACTS_DIR) || !is_yaml_name(name) {
                continue;
            }
            match self.document(name) {
                Ok(document) => documents.push((name.to_string(), document)),
                Err(e) => warn!(file = name, "skipping unparsable definitions: {}", e),
            }
        }

        Ok(documents)
    }
}

fn is_archive_name(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    ARCHIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

fn is_yaml_name(name: &str) -> bool {
    name.ends_with(".yaml") || name.ends_with(".yml")
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches("./").trim_start_matches('/').to_string()
}

/// Drop a single top-level directory wrapping the whole CSAR
fn strip_common_root(files: BTreeMap<String, Vec<u8>>) -> BTreeMap<String, Vec<u8>> {
    if files.contains_key(TOSCA_META_PATH) {
        return files;
    }

    let roots: Vec<&str> = files
        .keys()
        .map(|k| k.split_once('/').map(|(root, _)| root).unwrap_or(""))
        .collect();
    let single_root = match roots.first() {
        Some(first) if !first.is_empty() && roots.iter().all(|r| r == first) => first.to_string(),
        _ => return files,
    };

    let prefix = format!("{}/", single_root);
    let nested_meta = format!("{}{}", prefix, TOSCA_META_PATH);
    if !files.contains_key(&nested_meta) {
        return files;
    }

    files
        .into_iter()
        .map(|(k, v)| (k[prefix.len()..].to_string(), v))
        .collect()
}

fn read_dir_files(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| CoreError::InvalidCsarFormat {
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();
        files.insert(normalize(&rel_path), std::fs::read(entry.path())?);
    }

    Ok(files)
}

/// Read every file of a tarball in a single pass
fn read_archive_files(archive_path: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);
    let mut contents = BTreeMap::new();

    let entries = archive.entries().map_err(|e| CoreError::InvalidCsarFormat {
        message: format!("{}: {}", archive_path.display(), e),
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| CoreError::InvalidCsarFormat {
            message: format!("{}: {}", archive_path.display(), e),
        })?;
        if entry.header().entry_type().is_dir() {
            continue;
        }

        let path = entry.path()?.to_string_lossy().to_string();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        contents.insert(normalize(&path), data);
    }

    Ok(contents)
}
