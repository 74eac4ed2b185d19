use foamdict_format::Banner;
use foamdict_parse::MemoryFileSystem;
use foamdict_tree::{MacroPolicy, MacroRef};

use super::*;

const CONTROL_DICT: &str = "\
FoamFile
{
    version 2.0;
    format ascii;
    class dictionary;
    object controlDict;
}

application pisoSolver;
startFrom startTime;
writeFormat ascii;
";

fn banner() -> Banner {
    Banner::new("0.1.0", "2024-01-01 00:00:00")
}

#[test]
fn test_load_splits_header_from_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("controlDict");
    std::fs::write(&path, CONTROL_DICT).unwrap();

    let file = DictFile::load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(file.status(), LoadStatus::Parsed);
    assert_eq!(
        file.header().unwrap().get("object"),
        Some(&Value::word("controlDict"))
    );
    assert!(!file.data().contains_key("FoamFile"));
    assert_eq!(
        file.keys().collect::<Vec<_>>(),
        vec!["application", "startFrom", "writeFormat"]
    );
    assert_eq!(
        file.get("application").and_then(Value::as_unquoted),
        Some("pisoSolver")
    );
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system").join("fvSchemes");
    let err = DictFile::load(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, CaseError::NotFound { .. }), "{err}");
}

#[test]
fn test_read_if_present_creates_defaults() {
    let fs = MemoryFileSystem::new();
    let file =
        DictFile::read_if_present_with("system/controlDict", &LoadOptions::default(), &fs, &NoEtc)
            .unwrap();
    assert_eq!(file.status(), LoadStatus::New);
    assert_eq!(file.get("startFrom"), Some(&Value::word("latestTime")));
    assert_eq!(file.get("writeCompression"), Some(&Value::Bool(true)));
    assert!(file.get("application").is_none());

    let header = file.header().unwrap();
    assert_eq!(header.get("location"), Some(&Value::string("system")));
    assert_eq!(header.get("object"), Some(&Value::word("controlDict")));
}

#[test]
fn test_oversized_file_reads_header_only() {
    let mut text = CONTROL_DICT.to_string();
    for i in 0..200 {
        text.push_str(&format!("entry{i} {i};\n"));
    }
    let fs = MemoryFileSystem::new().with_file("big/controlDict", text);
    let options = LoadOptions::default()
        .size_limit(1024)
        .header_probe_bytes(256);

    let file = DictFile::load_with("big/controlDict", &options, &fs, &NoEtc).unwrap();
    assert_eq!(file.status(), LoadStatus::HeaderOnly);
    assert!(file.data().is_empty());
    assert_eq!(
        file.header().unwrap().get("class"),
        Some(&Value::word("dictionary"))
    );

    let err = file
        .write_with(&fs, &FormatOptions::default())
        .unwrap_err();
    assert!(matches!(err, CaseError::HeaderOnly { .. }), "{err}");
}

#[test]
fn test_oversized_file_without_header_gets_default_header() {
    let body: String = (0..100).map(|i| format!("v{i} {i};\n")).collect();
    let fs = MemoryFileSystem::new().with_file("0/U", body);
    let options = LoadOptions::default().size_limit(100);

    let file = DictFile::load_with("0/U", &options, &fs, &NoEtc).unwrap();
    assert_eq!(file.status(), LoadStatus::HeaderOnly);
    assert_eq!(file.header(), Some(&default_header(Path::new("0/U"))));
}

#[test]
fn test_load_reports_parse_errors() {
    let fs = MemoryFileSystem::new().with_file("system/fvSchemes", "ddtSchemes\n{\n    default Euler\n}\n");
    let err = DictFile::load_with("system/fvSchemes", &LoadOptions::default(), &fs, &NoEtc)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "system/fvSchemes:4:1: expected ';', found '}'"
    );
}

#[test]
fn test_load_with_expansion() {
    let fs = MemoryFileSystem::new()
        .with_file(
            "case/system/fvSolution",
            "#include \"solverDefaults\"\n\
             solvers\n{\n    p { $pDefaults; tolerance 1e-8; }\n}\n",
        )
        .with_file(
            "case/system/solverDefaults",
            "FoamFile { object solverDefaults; }\n\
             pDefaults { solver GAMG; tolerance 1e-6; }\n",
        );

    let raw = DictFile::load_with(
        "case/system/fvSolution",
        &LoadOptions::default(),
        &fs,
        &NoEtc,
    )
    .unwrap();
    assert!(raw.get("pDefaults").is_none());

    let options = LoadOptions::expanded(MacroPolicy::Fail);
    let file = DictFile::load_with("case/system/fvSolution", &options, &fs, &NoEtc).unwrap();
    assert!(file.header().is_none());
    let p = file.data().get_path("solvers/p").and_then(Value::as_dict).unwrap();
    assert_eq!(p.get("solver"), Some(&Value::word("GAMG")));
    assert_eq!(p.get("tolerance"), Some(&Value::Float(1e-8)));
}

#[test]
fn test_macro_scopes_from_file_text() {
    let fs = MemoryFileSystem::new()
        .with_file("case/constant/plain", "a 10;\nb $a;\n")
        .with_file(
            "case/constant/scoped",
            "subdict1 { b $..a; subsubdict { c $:a; } }\na 5;\n",
        );

    let raw = DictFile::load_with("case/constant/plain", &LoadOptions::default(), &fs, &NoEtc)
        .unwrap();
    assert_eq!(raw.get("b"), Some(&Value::Macro(MacroRef::new("$a"))));

    let options = LoadOptions::expanded(MacroPolicy::Fail);
    let plain = DictFile::load_with("case/constant/plain", &options, &fs, &NoEtc).unwrap();
    assert_eq!(plain.get("b"), Some(&Value::Int(10)));

    let scoped = DictFile::load_with("case/constant/scoped", &options, &fs, &NoEtc).unwrap();
    assert_eq!(scoped.data().get_path("subdict1.b"), Some(&Value::Int(5)));
    assert_eq!(
        scoped.data().get_path("subdict1.subsubdict.c"),
        Some(&Value::Int(5))
    );
}

#[test]
fn test_set_field_checks_options() {
    let mut file = DictFile::new("system/controlDict");
    file.set_field("writeControl", Value::word("runTime")).unwrap();
    assert_eq!(file.get("writeControl"), Some(&Value::word("runTime")));

    let err = file
        .set_field("writeControl", Value::word("onEnd"))
        .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidOption { .. }), "{err}");
    assert_eq!(file.get("writeControl"), Some(&Value::word("runTime")));

    let err = file.set_field("libs", Value::List(vec![])).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownField { .. }), "{err}");
    file.insert("libs", Value::List(vec![]));
    assert!(file.get("libs").is_some());

    let mut other = DictFile::new("system/myDict");
    assert!(matches!(
        other.set_field("a", Value::Int(1)),
        Err(SchemaError::UnknownField { .. })
    ));
}

#[test]
fn test_model_fields_create_coeffs() {
    let les = DictFile::new("constant/LESProperties").with_defaults();
    assert_eq!(
        les.keys().collect::<Vec<_>>(),
        vec![
            "turbulence",
            "printCoeffs",
            "LESModel",
            "SmagorinskyCoeffs",
            "delta",
            "cubeRootVolCoeffs",
        ]
    );
    let delta = les.get("cubeRootVolCoeffs").and_then(Value::as_dict).unwrap();
    assert_eq!(delta.get("deltaCoeff"), Some(&Value::Int(1)));

    let mut ras = DictFile::new("constant/RASProperties").with_defaults();
    assert!(ras.get("RASModel").is_none());
    ras.set_field("RASModel", Value::word("kOmegaSST")).unwrap();
    assert!(ras.get("kOmegaSSTCoeffs").and_then(Value::as_dict).is_some());
}

#[test]
fn test_turbulence_model_file() {
    let fs = MemoryFileSystem::new()
        .with_file(
            "constant/turbulenceProperties",
            "simulationType RASModel;\n",
        )
        .with_file("constant/RASProperties", "RASModel realizableKE;\n");
    let mut turb = DictFile::load_with(
        "constant/turbulenceProperties",
        &LoadOptions::default(),
        &fs,
        &NoEtc,
    )
    .unwrap();

    let ras = turb.turbulence_model_file(&fs).unwrap().unwrap();
    assert_eq!(ras.status(), LoadStatus::Parsed);
    assert_eq!(ras.get("RASModel"), Some(&Value::word("realizableKE")));

    turb.set_field("simulationType", Value::word("LESModel"))
        .unwrap();
    let les = turb.turbulence_model_file(&fs).unwrap().unwrap();
    assert_eq!(les.status(), LoadStatus::New);
    assert_eq!(les.get("LESModel"), Some(&Value::word("Smagorinsky")));
    assert_eq!(les.get("delta"), Some(&Value::word("cubeRootVol")));

    turb.set_field("simulationType", Value::word("laminar"))
        .unwrap();
    assert!(turb.turbulence_model_file(&fs).unwrap().is_none());
}

#[test]
fn test_render_new_file() {
    let mut file = DictFile::new("system/controlDict").with_defaults();
    file.set_field("application", Value::word("simpleFoam"))
        .unwrap();
    insta::assert_snapshot!(file.render(&banner(), &FormatOptions::default()), @r#"
/*---------------------------------------------------------------------------*\
 * foamdict 0.1.0
 *
 * Auto-generated on: 2024-01-01 00:00:00
\*---------------------------------------------------------------------------*/

FoamFile
{
    version     2.0;
    format      ascii;
    class       dictionary;
    location    "system";
    object      controlDict;
}

// * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * * //

startFrom            latestTime;

startTime            0;

stopAt               endTime;

writeControl         timeStep;

purgeWrite           0;

writeFormat          ascii;

writePrecision       6;

writeCompression     on;

timeFormat           general;

timePrecision        6;

runTimeModifiable    on;

application          simpleFoam;

// ************************************************************************* //
"#);
}

#[test]
fn test_write_updates_object_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("controlDict");
    std::fs::write(&source, CONTROL_DICT).unwrap();
    let mut file = DictFile::load(&source, &LoadOptions::default()).unwrap();
    file.set_field("writeFormat", Value::word("binary")).unwrap();

    let copy = DictFile {
        path: dir.path().join("system").join("controlDict.orig"),
        ..file.clone()
    };
    copy.write().unwrap();

    let reloaded = DictFile::load(copy.path(), &LoadOptions::default()).unwrap();
    assert_eq!(reloaded.data(), file.data());
    assert_eq!(
        reloaded.header().and_then(|h| h.get("object")),
        Some(&Value::word("controlDict.orig"))
    );
    assert_eq!(
        reloaded.header().and_then(|h| h.get("class")),
        Some(&Value::word("dictionary"))
    );
}
