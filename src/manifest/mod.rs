//! DEPS manifest model, reader and writer
//!
//! A gclient `DEPS` file is a restricted Python literal file. deps2git
//! understands the sections it needs to carry through a conversion:
//!
//! ```python
//! vars = {
//!     'ffmpeg_hash': '@abc123',
//! }
//!
//! deps = {
//!     'src/third_party/libfoo': '/trunk/deps/third_party/libfoo@1234',
//!     'src/third_party/gone': None,
//! }
//!
//! deps_os = {
//!     'win': {
//!         'src/third_party/cygwin': Var('svn_url') + '/trunk/deps/cygwin@66',
//!     },
//! }
//!
//! include_rules = ['+base']
//! skip_child_includes = ['breakpad']
//! hooks = [{'pattern': '.', 'action': ['python', 'gyp_chromium']}]
//! ```
//!
//! [`parser`] evaluates that subset into a [`DepsFile`]; [`writer`] renders a
//! [`DepsFile`] back with the generated-file banner and variable references
//! in place of the Git host. Dependency maps are [`BTreeMap`]s, so output is
//! always sorted by path.

pub mod parser;
pub mod variables;
pub mod writer;


use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

pub use parser::parse_deps;
pub use variables::VariableSet;
pub use writer::{render_deps, write_deps};

/// `dependency path → location` (`None` drops an inherited dependency).
pub type DepsMap = BTreeMap<String, Option<String>>;

/// A Python literal as found in DEPS files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `'text'` or `"text"`
    Str(String),
    /// Integer literal
    Int(i64),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,
    /// List or tuple
    List(Vec<Value>),
    /// Dict with string keys, in source order
    Dict(Vec<(String, Value)>),
}

impl Value {
    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Python type name used in error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::None => "NoneType",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
        }
    }
}

/// The sections of a DEPS file deps2git reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepsFile {
    /// `vars`
    pub vars: VariableSet,
    /// `deps`
    pub deps: DepsMap,
    /// `deps_os`, keyed by OS name
    pub deps_os: BTreeMap<String, DepsMap>,
    /// `include_rules`, carried through untouched
    pub include_rules: Vec<Value>,
    /// `skip_child_includes`, carried through untouched
    pub skip_child_includes: Vec<Value>,
    /// `hooks`, carried through untouched
    pub hooks: Vec<Value>,
}

impl DepsFile {
    /// Reads and parses the DEPS file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read DEPS file: {}", path.display()))?;
        Ok(parse_deps(&content, &path.display().to_string())?)
    }

    /// Renders and atomically writes this file to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_deps(path, self)
    }

    /// Number of entries across `deps` and every `deps_os` partition.
    pub fn entry_count(&self) -> usize {
        self.deps.len() + self.deps_os.values().map(BTreeMap::len).sum::<usize>()
    }
}
