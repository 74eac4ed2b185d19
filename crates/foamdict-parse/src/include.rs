//! `#include` expansion and the filesystem boundary it goes through.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use foamdict_tree::{Dict, Directive, Value};
use tracing::debug;

use crate::{ParseError, parse};

/// Filesystem access used by the engine.
pub trait FileSystem {
    fn exists(&self, path: &Path) -> bool;
    fn read_text(&self, path: &Path) -> io::Result<String>;
    fn write_text(&self, path: &Path, text: &str) -> io::Result<()>;
    /// Size of a file in bytes.
    fn size(&self, path: &Path) -> io::Result<u64>;

    /// At most `limit` bytes from the start of a file, cut back to a char
    /// boundary.
    fn read_prefix(&self, path: &Path, limit: usize) -> io::Result<String> {
        let text = self.read_text(path)?;
        Ok(truncate_at_boundary(&text, limit).to_string())
    }
}

fn truncate_at_boundary(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, text)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn read_prefix(&self, path: &Path, limit: usize) -> io::Result<String> {
        use std::io::Read;

        let mut bytes = Vec::with_capacity(limit);
        std::fs::File::open(path)?
            .take(limit as u64)
            .read_to_end(&mut bytes)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                let valid = e.utf8_error().valid_up_to();
                let mut bytes = e.into_bytes();
                bytes.truncate(valid);
                String::from_utf8_lossy(&bytes).into_owned()
            }
        };
        Ok(text)
    }
}

/// An in-memory filesystem, for tests and for dictionaries assembled in
/// memory.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RefCell<HashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style.
    pub fn with_file(self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.files.borrow_mut().insert(path.into(), text.into());
        self
    }

    /// Contents of a file, if present.
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.contents(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write_text(&self, path: &Path, text: &str) -> io::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        self.contents(path)
            .map(|text| text.len() as u64)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// Resolves `#includeEtc` names against an installation's etc directories.
pub trait EtcResolver {
    fn resolve_etc(&self, name: &str) -> Option<PathBuf>;
}

/// An ordered list of etc directories; the first one holding the file wins.
#[derive(Debug, Clone, Default)]
pub struct EtcDirs {
    dirs: Vec<PathBuf>,
}

impl EtcDirs {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Directories listed in the `FOAM_ETC` environment variable.
    pub fn from_env() -> Self {
        let dirs = std::env::var_os("FOAM_ETC")
            .map(|v| std::env::split_paths(&v).collect())
            .unwrap_or_default();
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl EtcResolver for EtcDirs {
    fn resolve_etc(&self, name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// A resolver that knows no etc directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEtc;

impl EtcResolver for NoEtc {
    fn resolve_etc(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// Errors raised while expanding includes.
#[derive(Debug)]
pub enum IncludeError {
    /// A non-optional `#include` target does not exist.
    NotFound { path: PathBuf },
    /// No etc directory holds an `#includeEtc` target.
    EtcNotFound { name: String },
    /// An include target could not be read.
    Io { path: PathBuf, source: io::Error },
    /// An included file failed to parse.
    Parse(ParseError),
    /// An include chain re-entered a file it is already including.
    Cycle { path: PathBuf },
}

impl std::fmt::Display for IncludeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncludeError::NotFound { path } => {
                write!(f, "included file not found: {}", path.display())
            }
            IncludeError::EtcNotFound { name } => {
                write!(f, "#includeEtc file not found in etc directories: {name}")
            }
            IncludeError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            IncludeError::Parse(e) => write!(f, "{e}"),
            IncludeError::Cycle { path } => {
                write!(f, "recursive include of {}", path.display())
            }
        }
    }
}

impl std::error::Error for IncludeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IncludeError::Io { source, .. } => Some(source),
            IncludeError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for IncludeError {
    fn from(e: ParseError) -> Self {
        IncludeError::Parse(e)
    }
}

/// Expands include directives, depth first.
pub struct Includer<'a> {
    fs: &'a dyn FileSystem,
    etc: &'a dyn EtcResolver,
    /// Files currently being included, outermost first.
    stack: Vec<PathBuf>,
}

impl<'a> Includer<'a> {
    pub fn new(fs: &'a dyn FileSystem, etc: &'a dyn EtcResolver) -> Self {
        Self {
            fs,
            etc,
            stack: Vec::new(),
        }
    }

    /// Expand every include directive in `doc`, which was read from `path`.
    ///
    /// Relative include paths resolve against the directory of `path`.
    pub fn expand(&mut self, doc: &mut Dict, path: &Path) -> Result<(), IncludeError> {
        self.stack.push(path.to_path_buf());
        let result = self.expand_dict(doc, parent_dir(path));
        self.stack.pop();
        result
    }

    /// Read, parse and fully expand one file, dropping its `FoamFile` header.
    pub fn load(&mut self, path: &Path) -> Result<Dict, IncludeError> {
        if self.stack.iter().any(|p| p == path) {
            return Err(IncludeError::Cycle {
                path: path.to_path_buf(),
            });
        }
        debug!("including {}", path.display());
        let text = self.fs.read_text(path).map_err(|source| IncludeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = parse(&text, &path.display().to_string())?;
        doc.pop("FoamFile");
        self.expand(&mut doc, path)?;
        Ok(doc)
    }

    fn expand_dict(&mut self, dict: &mut Dict, base_dir: &Path) -> Result<(), IncludeError> {
        let mut index = 0;
        while let Some((_, value)) = dict.get_index_mut(index) {
            match value {
                Value::Dict(sub) => {
                    self.expand_dict(sub, base_dir)?;
                    index += 1;
                }
                Value::Directive(d) if d.standalone && d.is_include() => {
                    let directive = d.clone();
                    dict.pop_index(index);
                    if let Some(target) = self.resolve_target(&directive, base_dir)? {
                        let included = self.load(&target)?;
                        debug!(
                            "splicing {} entries from {}",
                            included.len(),
                            target.display()
                        );
                        index += dict.splice_at(index, included);
                    }
                }
                _ => index += 1,
            }
        }
        Ok(())
    }

    /// Path an include directive refers to, or `None` for a missing optional
    /// include.
    fn resolve_target(
        &self,
        directive: &Directive,
        base_dir: &Path,
    ) -> Result<Option<PathBuf>, IncludeError> {
        let name = directive.payload.as_unquoted().unwrap_or_default();
        match directive.name.as_str() {
            "#includeEtc" => match self.etc.resolve_etc(name) {
                Some(path) => Ok(Some(path)),
                None => Err(IncludeError::EtcNotFound {
                    name: name.to_string(),
                }),
            },
            "#includeIfPresent" => {
                let path = normalize(&base_dir.join(name));
                if self.fs.exists(&path) {
                    Ok(Some(path))
                } else {
                    debug!("optional include {} not present", path.display());
                    Ok(None)
                }
            }
            _ => {
                let path = normalize(&base_dir.join(name));
                if self.fs.exists(&path) {
                    Ok(Some(path))
                } else {
                    Err(IncludeError::NotFound { path })
                }
            }
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new(""))
}

/// Remove `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expand the includes of a document read from `path`.
pub fn expand_includes(
    doc: &mut Dict,
    path: &Path,
    fs: &dyn FileSystem,
    etc: &dyn EtcResolver,
) -> Result<(), IncludeError> {
    Includer::new(fs, etc).expand(doc, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_fs() -> MemoryFileSystem {
        MemoryFileSystem::new()
            .with_file(
                "case/system/controlDict",
                "FoamFile { version 2.0; object controlDict; }\n\
                 application simpleFoam;\n\
                 #include \"common\"\n\
                 endTime 100;\n",
            )
            .with_file(
                "case/system/common",
                "FoamFile { version 2.0; object common; }\n\
                 startTime 0;\n\
                 endTime 50;\n\
                 writeControl timeStep;\n",
            )
    }

    fn load(fs: &MemoryFileSystem, path: &str) -> Result<Dict, IncludeError> {
        let path = Path::new(path);
        let text = fs.read_text(path).unwrap();
        let mut doc = parse(&text, &path.display().to_string()).unwrap();
        expand_includes(&mut doc, path, fs, &NoEtc)?;
        Ok(doc)
    }

    #[test]
    fn test_include_splices_in_place() {
        let fs = case_fs();
        let doc = load(&fs, "case/system/controlDict").unwrap();
        assert_eq!(
            doc.keys().collect::<Vec<_>>(),
            vec!["FoamFile", "application", "startTime", "writeControl", "endTime"]
        );
        // The including file's own later definition wins.
        assert_eq!(doc["endTime"], Value::Int(100));
        assert_eq!(doc.get_path("FoamFile.object"), Some(&Value::word("controlDict")));
    }

    #[test]
    fn test_include_is_idempotent() {
        let fs = case_fs();
        let mut doc = load(&fs, "case/system/controlDict").unwrap();
        let once = doc.clone();
        expand_includes(&mut doc, Path::new("case/system/controlDict"), &fs, &NoEtc).unwrap();
        assert_eq!(doc, once);
    }

    #[test]
    fn test_nested_dict_includes() {
        let fs = MemoryFileSystem::new()
            .with_file("c/fvSolution", "solvers { p { #include \"../shared/pSolver\" } }")
            .with_file("shared/pSolver", "solver GAMG; tolerance 1e-06;");
        let doc = load(&fs, "c/fvSolution").unwrap();
        assert_eq!(doc.get_path("solvers.p.solver"), Some(&Value::word("GAMG")));
        assert_eq!(doc.get_path("solvers.p.tolerance"), Some(&Value::Float(1e-6)));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("c/../shared/p")), PathBuf::from("shared/p"));
        assert_eq!(normalize(Path::new("./a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn test_include_if_present() {
        let fs = MemoryFileSystem::new().with_file("d", "#includeIfPresent \"missing\"\na 1;");
        let doc = load(&fs, "d").unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_missing_include_is_an_error() {
        let fs = MemoryFileSystem::new().with_file("d", "#include \"missing\"\na 1;");
        let err = load(&fs, "d").unwrap_err();
        assert!(matches!(err, IncludeError::NotFound { .. }));
    }

    #[test]
    fn test_include_etc() {
        struct FixedEtc;
        impl EtcResolver for FixedEtc {
            fn resolve_etc(&self, name: &str) -> Option<PathBuf> {
                (name == "caseDicts/setConstraintTypes")
                    .then(|| PathBuf::from("/etc/foam/caseDicts/setConstraintTypes"))
            }
        }

        let fs = MemoryFileSystem::new()
            .with_file(
                "0/U",
                "boundaryField { #includeEtc \"caseDicts/setConstraintTypes\" inlet { type fixedValue; } }",
            )
            .with_file(
                "/etc/foam/caseDicts/setConstraintTypes",
                "cyclic { type cyclic; } empty { type empty; }",
            );
        let path = Path::new("0/U");
        let mut doc = parse(&fs.read_text(path).unwrap(), "0/U").unwrap();
        expand_includes(&mut doc, path, &fs, &FixedEtc).unwrap();
        let bf = doc["boundaryField"].as_dict().unwrap();
        assert_eq!(bf.keys().collect::<Vec<_>>(), vec!["cyclic", "empty", "inlet"]);

        let mut doc = parse("#includeEtc \"nope\"", "x").unwrap();
        let err = expand_includes(&mut doc, Path::new("x"), &fs, &FixedEtc).unwrap_err();
        assert!(matches!(err, IncludeError::EtcNotFound { .. }));
    }

    #[test]
    fn test_include_cycle() {
        let fs = MemoryFileSystem::new()
            .with_file("a", "#include \"b\"")
            .with_file("b", "#include \"a\"");
        let err = load(&fs, "a").unwrap_err();
        assert!(matches!(err, IncludeError::Cycle { .. }), "{err}");
    }

    #[test]
    fn test_parse_error_in_included_file() {
        let fs = MemoryFileSystem::new()
            .with_file("a", "#include \"b\"")
            .with_file("b", "x 1\n}");
        let err = load(&fs, "a").unwrap_err();
        assert_eq!(err.to_string(), "b:2:1: expected ';', found '}'");
    }

    #[test]
    fn test_read_prefix_stops_at_char_boundary() {
        let fs = MemoryFileSystem::new().with_file("u", "ab\u{e9}cd");
        let path = Path::new("u");
        assert_eq!(fs.size(path).unwrap(), 6);
        assert_eq!(fs.read_prefix(path, 3).unwrap(), "ab");
        assert_eq!(fs.read_prefix(path, 4).unwrap(), "ab\u{e9}");
        assert_eq!(fs.read_prefix(path, 100).unwrap(), "ab\u{e9}cd");
    }
}
