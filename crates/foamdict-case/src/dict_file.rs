use std::path::{Path, PathBuf};

use foamdict_format::{Banner, FormatOptions, render_file};
use foamdict_parse::{
    EtcDirs, EtcResolver, FileSystem, NoEtc, OsFileSystem, expand_includes, parse, parse_header,
};
use foamdict_tree::{Dict, Value};
use tracing::{debug, info, warn};

use crate::schema::{FieldSpec, Schema, schema_for};
use crate::{CaseError, LoadOptions, SchemaError};

/// How a [`DictFile`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The whole file was parsed.
    Parsed,
    /// The file was over the size limit; only its header was read.
    HeaderOnly,
    /// The file did not exist; the contents are new.
    New,
}

/// One dictionary file of a case: its path, `FoamFile` header and entries.
#[derive(Debug, Clone)]
pub struct DictFile {
    path: PathBuf,
    header: Option<Dict>,
    data: Dict,
    status: LoadStatus,
}

impl DictFile {
    /// A new, empty file with the default header for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            header: Some(default_header(&path)),
            path,
            data: Dict::new(),
            status: LoadStatus::New,
        }
    }

    /// Fill in the schema defaults for fields that are not set.
    pub fn with_defaults(mut self) -> Self {
        let Some(schema) = self.schema() else {
            return self;
        };
        for spec in schema.fields {
            if let Some(default) = spec.default
                && !self.data.contains_key(spec.name)
            {
                self.assign(spec, default.to_value());
            }
        }
        self
    }

    /// Load a file from disk. `#includeEtc` resolves against `FOAM_ETC`.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, CaseError> {
        Self::load_with(path, options, &OsFileSystem, &EtcDirs::from_env())
    }

    /// Load a file through the given filesystem.
    pub fn load_with(
        path: impl AsRef<Path>,
        options: &LoadOptions,
        fs: &dyn FileSystem,
        etc: &dyn EtcResolver,
    ) -> Result<Self, CaseError> {
        let path = path.as_ref();
        if !fs.exists(path) {
            return Err(CaseError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let name = path.display().to_string();
        let size = fs.size(path).map_err(|source| io_error(path, source))?;

        if size > options.size_limit {
            warn!(
                "{name} is {size} bytes, over the {} byte limit; reading the header only",
                options.size_limit
            );
            let prefix = fs
                .read_prefix(path, options.header_probe_bytes)
                .map_err(|source| io_error(path, source))?;
            let header = parse_header(&prefix, &name)?.unwrap_or_else(|| default_header(path));
            return Ok(Self {
                path: path.to_path_buf(),
                header: Some(header),
                data: Dict::new(),
                status: LoadStatus::HeaderOnly,
            });
        }

        let text = fs
            .read_text(path)
            .map_err(|source| io_error(path, source))?;
        let mut data = parse(&text, &name)?;
        if options.expand_includes {
            expand_includes(&mut data, path, fs, etc)?;
        }
        let header = match data.pop("FoamFile") {
            Some(Value::Dict(header)) => Some(header),
            _ => None,
        };
        if let Some(policy) = options.expand_macros {
            data.expand_macros(policy)?;
        }
        debug!("loaded {name}: {} entries", data.len());
        Ok(Self {
            path: path.to_path_buf(),
            header,
            data,
            status: LoadStatus::Parsed,
        })
    }

    /// Load the file if it exists, otherwise start a new one with defaults.
    pub fn read_if_present(
        path: impl AsRef<Path>,
        options: &LoadOptions,
    ) -> Result<Self, CaseError> {
        Self::read_if_present_with(path, options, &OsFileSystem, &EtcDirs::from_env())
    }

    pub fn read_if_present_with(
        path: impl AsRef<Path>,
        options: &LoadOptions,
        fs: &dyn FileSystem,
        etc: &dyn EtcResolver,
    ) -> Result<Self, CaseError> {
        let path = path.as_ref();
        if fs.exists(path) {
            Self::load_with(path, options, fs, etc)
        } else {
            debug!("{} not found, using defaults", path.display());
            Ok(Self::new(path).with_defaults())
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `FoamFile` header, if the file had one.
    pub fn header(&self) -> Option<&Dict> {
        self.header.as_ref()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// The field table for this file, if it is a standard case file.
    pub fn schema(&self) -> Option<&'static Schema> {
        schema_for(&self.path)
    }

    pub fn data(&self) -> &Dict {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Dict {
        &mut self.data
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys()
    }

    /// Set an entry without any schema check.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key, value);
    }

    /// Set a field known to this file's schema, checking its options.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), SchemaError> {
        let schema = self.schema().ok_or_else(|| SchemaError::UnknownField {
            file: self.file_name(),
            field: name.to_string(),
        })?;
        schema.validate(name, &value)?;
        let spec = schema.spec(name)?;
        self.assign(spec, value);
        Ok(())
    }

    /// Merge entries into the file, recursively for sub-dictionaries.
    pub fn merge(&mut self, other: &Dict) {
        self.data.merge(other);
    }

    /// For `turbulenceProperties`, the model file its `simulationType`
    /// selects: `RASProperties` or `LESProperties` next to it, read if
    /// present. `None` for laminar flow or any other file.
    pub fn turbulence_model_file(
        &self,
        fs: &dyn FileSystem,
    ) -> Result<Option<DictFile>, CaseError> {
        if !self.path.ends_with("turbulenceProperties") {
            return Ok(None);
        }
        let sibling = match self.get("simulationType").and_then(Value::as_unquoted) {
            Some("RASModel") => "RASProperties",
            Some("LESModel") => "LESProperties",
            _ => return Ok(None),
        };
        let path = self.path.with_file_name(sibling);
        Self::read_if_present_with(path, &LoadOptions::default(), fs, &NoEtc).map(Some)
    }

    /// The header that is written: the file's own, or the default one, with
    /// `object` set to the file name.
    pub fn write_header(&self) -> Dict {
        let mut header = self
            .header
            .clone()
            .unwrap_or_else(|| default_header(&self.path));
        header.insert("object", Value::word(self.file_name()));
        header
    }

    /// Render the complete file.
    pub fn render(&self, banner: &Banner, options: &FormatOptions) -> String {
        render_file(&self.data, Some(&self.write_header()), banner, options)
    }

    /// Write the file to disk.
    pub fn write(&self) -> Result<(), CaseError> {
        self.write_with(&OsFileSystem, &FormatOptions::default())
    }

    /// Write the file through the given filesystem.
    pub fn write_with(
        &self,
        fs: &dyn FileSystem,
        options: &FormatOptions,
    ) -> Result<(), CaseError> {
        if self.status == LoadStatus::HeaderOnly {
            return Err(CaseError::HeaderOnly {
                path: self.path.clone(),
            });
        }
        info!("writing {}", self.path.display());
        let text = self.render(&Banner::now(), options);
        fs.write_text(&self.path, &text)
            .map_err(|source| io_error(&self.path, source))
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn assign(&mut self, spec: &FieldSpec, value: Value) {
        let coeffs = spec
            .coeffs
            .then(|| value.as_unquoted().map(str::to_string))
            .flatten();
        self.data.insert(spec.name, value);
        if let Some(model) = coeffs {
            let key = format!("{model}Coeffs");
            if !self.data.contains_key(&key) {
                let mut dict = Dict::new();
                if model == "cubeRootVol" {
                    dict.insert("deltaCoeff", Value::Int(1));
                }
                self.data.insert(key, Value::Dict(dict));
            }
        }
    }
}

/// `version 2.0; format ascii; class dictionary; location "<dir>"; object <name>;`
pub fn default_header(path: &Path) -> Dict {
    let mut header = Dict::new();
    header.insert("version", Value::Float(2.0));
    header.insert("format", Value::word("ascii"));
    header.insert("class", Value::word("dictionary"));
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        header.insert("location", Value::string(&dir.to_string_lossy()));
    }
    if let Some(name) = path.file_name() {
        header.insert("object", Value::word(name.to_string_lossy()));
    }
    header
}

fn io_error(path: &Path, source: std::io::Error) -> CaseError {
    CaseError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests;
