//! Field tables for the standard case files.
//!
//! Each known file has a static list of fields. A field may carry a default,
//! written by [`DictFile::with_defaults`](crate::DictFile::with_defaults),
//! and a closed set of allowed options checked by
//! [`DictFile::set_field`](crate::DictFile::set_field).

use std::path::Path;

use foamdict_tree::Value;

use crate::SchemaError;

/// Default value of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Word(&'static str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Word(w) => Value::word(w),
            DefaultValue::Int(i) => Value::Int(i),
            DefaultValue::Float(x) => Value::Float(x),
            DefaultValue::Bool(b) => Value::Bool(b),
        }
    }
}

/// One known field of a case file.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub default: Option<DefaultValue>,
    /// Allowed options; empty means any value.
    pub allowed: &'static [&'static str],
    /// Setting the field creates a `<value>Coeffs` sub-dictionary if absent.
    pub coeffs: bool,
}

const fn field(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        default: None,
        allowed: &[],
        coeffs: false,
    }
}

const fn with_default(name: &'static str, default: DefaultValue) -> FieldSpec {
    FieldSpec {
        name,
        default: Some(default),
        allowed: &[],
        coeffs: false,
    }
}

const fn choice(
    name: &'static str,
    default: &'static str,
    allowed: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        name,
        default: Some(DefaultValue::Word(default)),
        allowed,
        coeffs: false,
    }
}

const fn model(name: &'static str, default: Option<DefaultValue>) -> FieldSpec {
    FieldSpec {
        name,
        default,
        allowed: &[],
        coeffs: true,
    }
}

/// The field table of one standard file.
#[derive(Debug)]
pub struct Schema {
    /// Trailing path that identifies the file, e.g. `controlDict` or
    /// `polyMesh/boundary`.
    pub file: &'static str,
    /// Where the file lives inside a case directory.
    pub default_path: &'static str,
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Look up a field.
    pub fn spec(&self, name: &str) -> Result<&FieldSpec, SchemaError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SchemaError::UnknownField {
                file: self.file.to_string(),
                field: name.to_string(),
            })
    }

    /// Check a value against a field's options.
    pub fn validate(&self, name: &str, value: &Value) -> Result<(), SchemaError> {
        let spec = self.spec(name)?;
        if spec.allowed.is_empty() {
            return Ok(());
        }
        let text = option_text(value);
        if text.as_deref().is_some_and(|t| spec.allowed.contains(&t)) {
            return Ok(());
        }
        Err(SchemaError::InvalidOption {
            file: self.file.to_string(),
            field: name.to_string(),
            value: text.unwrap_or_else(|| value.kind_name().to_string()),
            allowed: spec.allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

fn option_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        v => v.as_unquoted().map(str::to_string),
    }
}

const ON_OFF: &[&str] = &["on", "off", "yes", "no", "true", "false"];

const TURBULENCE: FieldSpec = choice("turbulence", "on", ON_OFF);
const PRINT_COEFFS: FieldSpec = choice("printCoeffs", "on", ON_OFF);

static SCHEMAS: &[Schema] = &[
    Schema {
        file: "controlDict",
        default_path: "system/controlDict",
        fields: &[
            field("application"),
            choice("startFrom", "latestTime", &["firstTime", "startTime", "latestTime"]),
            with_default("startTime", DefaultValue::Int(0)),
            choice("stopAt", "endTime", &["endTime", "writeNow", "noWriteNow", "nextWrite"]),
            field("endTime"),
            field("deltaT"),
            choice(
                "writeControl",
                "timeStep",
                &["timeStep", "runTime", "adjustableRunTime", "cpuTime", "clockTime"],
            ),
            field("writeInterval"),
            with_default("purgeWrite", DefaultValue::Int(0)),
            choice("writeFormat", "ascii", &["ascii", "binary"]),
            with_default("writePrecision", DefaultValue::Int(6)),
            with_default("writeCompression", DefaultValue::Bool(true)),
            choice("timeFormat", "general", &["fixed", "scientific", "general"]),
            with_default("timePrecision", DefaultValue::Int(6)),
            field("graphFormat"),
            field("adjustTimeStep"),
            field("maxCo"),
            with_default("runTimeModifiable", DefaultValue::Bool(true)),
            field("functions"),
        ],
    },
    Schema {
        file: "fvSchemes",
        default_path: "system/fvSchemes",
        fields: &[
            field("ddtSchemes"),
            field("gradSchemes"),
            field("divSchemes"),
            field("laplacianSchemes"),
            field("interpolationSchemes"),
            field("snGradSchemes"),
            field("fluxRequired"),
        ],
    },
    Schema {
        file: "fvSolution",
        default_path: "system/fvSolution",
        fields: &[
            field("solvers"),
            field("SIMPLE"),
            field("PIMPLE"),
            field("PISO"),
            field("potentialFlow"),
            field("relaxationFactors"),
        ],
    },
    Schema {
        file: "decomposeParDict",
        default_path: "system/decomposeParDict",
        fields: &[
            with_default("numberOfSubdomains", DefaultValue::Int(4)),
            choice(
                "method",
                "scotch",
                &["scotch", "metis", "simple", "hierarchical", "manual"],
            ),
        ],
    },
    Schema {
        file: "transportProperties",
        default_path: "constant/transportProperties",
        fields: &[with_default("transportModel", DefaultValue::Word("Newtonian"))],
    },
    Schema {
        file: "turbulenceProperties",
        default_path: "constant/turbulenceProperties",
        fields: &[choice(
            "simulationType",
            "laminar",
            &["laminar", "RASModel", "LESModel"],
        )],
    },
    Schema {
        file: "RASProperties",
        default_path: "constant/RASProperties",
        fields: &[
            TURBULENCE,
            PRINT_COEFFS,
            model("RASModel", None),
        ],
    },
    Schema {
        file: "LESProperties",
        default_path: "constant/LESProperties",
        fields: &[
            TURBULENCE,
            PRINT_COEFFS,
            model("LESModel", Some(DefaultValue::Word("Smagorinsky"))),
            model("delta", Some(DefaultValue::Word("cubeRootVol"))),
        ],
    },
    Schema {
        file: "blockMeshDict",
        default_path: "constant/polyMesh/blockMeshDict",
        fields: &[
            with_default("convertToMeters", DefaultValue::Float(1.0)),
            field("vertices"),
            field("blocks"),
            field("edges"),
            field("boundary"),
            field("mergePatchPairs"),
        ],
    },
    Schema {
        file: "changeDictionaryDict",
        default_path: "system/changeDictionaryDict",
        fields: &[field("dictionaryReplacement")],
    },
    Schema {
        file: "cmlControls",
        default_path: "cmlControls",
        fields: &[],
    },
    Schema {
        file: "polyMesh/boundary",
        default_path: "constant/polyMesh/boundary",
        fields: &[],
    },
];

/// The schema for a file, matched on the trailing components of its path.
pub fn schema_for(path: &Path) -> Option<&'static Schema> {
    SCHEMAS.iter().find(|s| path.ends_with(s.file))
}

/// All known standard files.
pub fn schemas() -> &'static [Schema] {
    SCHEMAS
}
