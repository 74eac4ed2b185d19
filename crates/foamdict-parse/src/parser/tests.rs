use foamdict_tree::{Array, ArrayData};

use super::*;

fn parse(source: &str) -> Dict {
    match Parser::new(source, "<input>").parse() {
        Ok(dict) => dict,
        Err(e) => panic!("{e}"),
    }
}

fn parse_err(source: &str) -> ParseError {
    match Parser::new(source, "<input>").parse() {
        Ok(dict) => panic!("expected an error, parsed {dict:?}"),
        Err(e) => e,
    }
}

fn ints(v: &[i64]) -> Value {
    Value::Array(Array::from_ints(v.to_vec()))
}

fn floats(v: &[f64]) -> Value {
    Value::Array(Array::from_floats(v.to_vec()))
}

#[test]
fn test_scalars_and_order() {
    let doc = parse("application simpleFoam;\nstartTime 0;\ndeltaT 0.5;\nwriteFormat \"ascii\";\n");
    assert_eq!(
        doc.keys().collect::<Vec<_>>(),
        vec!["application", "startTime", "deltaT", "writeFormat"]
    );
    assert_eq!(doc["application"], Value::word("simpleFoam"));
    assert_eq!(doc["startTime"], Value::Int(0));
    assert_eq!(doc["deltaT"], Value::Float(0.5));
    assert_eq!(doc["writeFormat"], Value::string("ascii"));
}

#[test]
fn test_macro_is_not_resolved_at_parse_time() {
    let doc = parse("a 10;\nb $a;\n");
    assert_eq!(doc["a"], Value::Int(10));
    assert_eq!(doc["b"], Value::Macro(MacroRef::new("$a")));
    assert_eq!(doc["b"].as_str(), Some("$a"));
}

#[test]
fn test_nested_dicts() {
    let doc = parse(
        "solvers\n{\n    p\n    {\n        solver GAMG;\n        tolerance 1e-06;\n    }\n}\nPISO { nCorrectors 2; };\n",
    );
    assert_eq!(doc.get_path("solvers.p.solver"), Some(&Value::word("GAMG")));
    assert_eq!(doc.get_path("solvers/p/tolerance"), Some(&Value::Float(1e-6)));
    assert_eq!(doc.get_path("PISO.nCorrectors"), Some(&Value::Int(2)));
}

#[test]
fn test_empty_entry() {
    let doc = parse("p;\nU;\n");
    assert_eq!(doc["p"], Value::Empty);
    assert_eq!(doc["U"], Value::Empty);
}

#[test]
fn test_quoted_and_parenthesised_keys() {
    let doc = parse("\"(U|k|epsilon)\" { solver smoothSolver; }\ndiv(phi,U) Gauss linearUpwind grad(U);\n");
    assert!(doc.contains_key("\"(U|k|epsilon)\""));
    assert_eq!(
        doc["div(phi,U)"],
        Value::Multi(vec![
            Value::word("Gauss"),
            Value::word("linearUpwind"),
            Value::word("grad(U)"),
        ])
    );
}

#[test]
fn test_multi_value_ending_in_dict() {
    let doc = parse("solver PCG { tolerance 1e-6; }\nnext 1;\n");
    let Value::Multi(items) = &doc["solver"] else {
        panic!("expected a multi value, got {:?}", doc["solver"]);
    };
    assert_eq!(items[0], Value::word("PCG"));
    assert_eq!(items[1].as_dict().and_then(|d| d.get("tolerance")), Some(&Value::Float(1e-6)));
    assert_eq!(doc["next"], Value::Int(1));

    let doc = parse("next 1;\nsolver PCG { tolerance 1e-6; }");
    let Value::Multi(items) = &doc["solver"] else {
        panic!("expected a multi value, got {:?}", doc["solver"]);
    };
    assert_eq!(items[0], Value::word("PCG"));
    assert_eq!(items.len(), 2);
}

#[test]
fn test_list_type_inference() {
    let doc = parse("a (1 2 3);\nb (1 2.5);\nc (1 two);\nd ((1 2) (3 4));\ne ();\nf ((1 2) (3.5 4));\n");
    assert_eq!(doc["a"], ints(&[1, 2, 3]));
    assert_eq!(doc["b"], floats(&[1.0, 2.5]));
    assert_eq!(
        doc["c"],
        Value::List(vec![Value::Int(1), Value::word("two")])
    );
    let d = doc["d"].as_array().unwrap();
    assert_eq!(d.shape(), &[2, 2]);
    assert_eq!(d.data(), &ArrayData::Int(vec![1, 2, 3, 4]));
    assert_eq!(doc["e"], Value::List(vec![]));
    let f = doc["f"].as_array().unwrap();
    assert_eq!(f.shape(), &[2, 2]);
    assert!(!f.is_int());
}

#[test]
fn test_counted_lists() {
    let doc = parse("points 3(1 2 3);\nfaces 2(4(0 1 2 3) 4(4 5 6 7));\n");
    assert_eq!(doc["points"], ints(&[1, 2, 3]));
    let faces = doc["faces"].as_array().unwrap();
    assert_eq!(faces.shape(), &[2, 4]);
    assert_eq!(faces.row(1), Some(Array::from_ints(vec![4, 5, 6, 7])));
}

#[test]
fn test_counted_list_count_is_advisory() {
    let doc = parse("a 5(1 2);\n");
    assert_eq!(doc["a"], ints(&[1, 2]));
}

#[test]
fn test_boundary_list() {
    let doc = parse("3\n(\n    1 2 3\n)\n");
    assert_eq!(doc["boundary"], Value::Boundary(Box::new(ints(&[1, 2, 3]))));

    let doc = parse(
        "FoamFile { class polyBoundaryMesh; }\n2\n(\n    inlet { type patch; nFaces 10; }\n    walls { type wall; }\n)\n",
    );
    let Value::Boundary(inner) = &doc["boundary"] else {
        panic!("expected a boundary list");
    };
    let patches = inner.as_list().unwrap();
    assert_eq!(patches.len(), 2);
    assert_eq!(
        patches[0].as_dict().and_then(|d| d.get_path("inlet.nFaces")),
        Some(&Value::Int(10))
    );
    assert!(doc["boundary"].is_keyless());
}

#[test]
fn test_dimensions() {
    let doc = parse(
        "dimensions [0 1 -1 0 0 0 0];\nnu nu [0 2 -1 0 0 0 0] 1e-05;\nk [W/m/K] 0.5;\nrho [1 -3 0 0 0] $rhoIn;\n",
    );
    assert_eq!(
        doc["dimensions"],
        Value::Dimension(Dimension::Units([0, 1, -1, 0, 0, 0, 0]))
    );
    assert_eq!(
        doc["nu"],
        Value::Dimensioned(Dimensioned {
            name: "nu".into(),
            dims: Dimension::Units([0, 2, -1, 0, 0, 0, 0]),
            value: Box::new(Value::Float(1e-5)),
        })
    );
    assert_eq!(
        doc["k"],
        Value::Dimensioned(Dimensioned {
            name: String::new(),
            dims: Dimension::Alias("W/m/K".into()),
            value: Box::new(Value::Float(0.5)),
        })
    );
    let Value::Dimensioned(rho) = &doc["rho"] else {
        panic!("expected a dimensioned value");
    };
    assert_eq!(rho.dims, Dimension::Units([1, -3, 0, 0, 0, 0, 0]));
    assert_eq!(*rho.value, Value::Macro(MacroRef::new("$rhoIn")));
}

#[test]
fn test_bad_dimension_arity() {
    let err = parse_err("dimensions [1 2 3];");
    assert_eq!(err.message, "dimension set must have 5 or 7 exponents, found 3");
    assert_eq!((err.line, err.column), (1, Column::At(12)));
}

#[test]
fn test_uniform_fields() {
    let doc = parse("a uniform 0;\nb uniform (0 0 0);\nc uniform (1 0 0 1 0 1);\nd uniform $U0;\n");
    let field = |v: Value| {
        Value::Field(Field {
            kind: FieldKind::Uniform,
            value: Box::new(v),
        })
    };
    assert_eq!(doc["a"], field(Value::Int(0)));
    assert_eq!(doc["b"], field(ints(&[0, 0, 0])));
    assert_eq!(doc["c"], field(ints(&[1, 0, 0, 1, 0, 1])));
    assert_eq!(doc["d"], field(Value::Macro(MacroRef::new("$U0"))));

    let err = parse_err("a uniform (1 2);");
    assert_eq!(
        err.message,
        "uniform value must be a scalar or have 3, 6 or 9 components"
    );
}

#[test]
fn test_nonuniform_fields() {
    let doc = parse("internalField nonuniform List<scalar> 3(1.0 2.0 3.5);\nv nonuniform 2((1 0 0) (0 1 0));\n");
    assert_eq!(
        doc["internalField"],
        Value::Field(Field {
            kind: FieldKind::NonUniform,
            value: Box::new(Value::TypedList(TypedList {
                tag: "List<scalar>".into(),
                value: Box::new(floats(&[1.0, 2.0, 3.5])),
            })),
        })
    );
    let Value::Field(v) = &doc["v"] else {
        panic!("expected a field");
    };
    assert_eq!(v.kind, FieldKind::NonUniform);
    assert_eq!(v.value.as_array().map(|a| a.shape().to_vec()), Some(vec![2, 3]));

    let err = parse_err("a nonuniform (1 2);");
    assert_eq!(err.message, "expected List<T> or a counted list, found '('");
}

#[test]
fn test_directives_get_synthetic_keys() {
    let source = "#include \"common\"\n$defaults;\n#remove (a \"b.*\");\nc 1;\n";
    for _ in 0..2 {
        let doc = parse(source);
        assert_eq!(
            doc.keys().collect::<Vec<_>>(),
            vec!["directive_000", "macro_000", "directive_001", "c"]
        );
        assert_eq!(
            doc["directive_000"],
            Value::Directive(Directive::new("#include", Value::string("common")))
        );
        assert_eq!(
            doc["macro_000"],
            Value::Macro(MacroRef::standalone("$defaults"))
        );
        assert_eq!(
            doc["directive_001"],
            Value::Directive(Directive::new(
                "#remove",
                Value::List(vec![Value::word("a"), Value::string("b.*")])
            ))
        );
    }
}

#[test]
fn test_directive_as_keyword_value() {
    let doc = parse("inputMode #inputMode merge;\n#inputMode overwrite\n");
    assert_eq!(
        doc.keys().collect::<Vec<_>>(),
        vec!["inputMode", "directive_000"]
    );
    assert_eq!(
        doc["inputMode"],
        Value::Directive(Directive::keyed("#inputMode", Value::word("merge")))
    );
    assert!(!doc["inputMode"].is_keyless());
    assert!(doc["directive_000"].is_keyless());
}

#[test]
fn test_numbers_out_of_range() {
    let err = parse_err("a 99999999999999999999;");
    assert_eq!(err.to_string(), "<input>:1:3: number out of range");

    let err = parse_err("b (1 99999999999999999999);");
    assert_eq!(err.message, "number out of range");
    assert_eq!(err.column, Column::At(6));

    let err = parse_err("c 1e400;");
    assert_eq!(err.to_string(), "<input>:1:3: number out of range");

    let doc = parse("d 9223372036854775807;\ne 1e300;\n");
    assert_eq!(doc["d"], Value::Int(i64::MAX));
    assert_eq!(doc["e"], Value::Float(1e300));
}

#[test]
fn test_calc_and_eval() {
    let doc = parse("x #calc \"$a * 2\";\ny #eval{ $a * 2 };\nz #eval \"1 + 2\";\n");
    assert_eq!(doc["x"], Value::Calc("\"$a * 2\"".into()));
    assert_eq!(doc["y"], Value::Eval("{ $a * 2 }".into()));
    assert_eq!(doc["z"], Value::Eval("\"1 + 2\"".into()));
}

#[test]
fn test_code_stream() {
    let source = "code #codeStream\n{\n    codeInclude\n    #{\n        #include \"fvCFD.H\"\n    #};\n    code\n    #{\n        os << 1;\n    #};\n};\n";
    let doc = parse(source);
    let Value::CodeStream(blocks) = &doc["code"] else {
        panic!("expected a code stream, got {:?}", doc["code"]);
    };
    let labels: Vec<_> = blocks.iter().map(|(label, _)| label.as_str()).collect();
    assert_eq!(labels, vec!["codeInclude", "code"]);
    let (_, block) = &blocks[0];
    assert_eq!(block.indent, 4);
    assert!(block.text.starts_with("#{"));
    assert!(block.text.ends_with("#}"));
    assert!(block.text.contains("#include \"fvCFD.H\""));
}

#[test]
fn test_code_statement() {
    let doc = parse("code #{ return 1; #};\n");
    assert_eq!(
        doc["code"],
        Value::Code(CodeBlock {
            text: "#{ return 1; #}".into(),
            indent: 0,
        })
    );
}

#[test]
fn test_missing_semicolon_position() {
    let err = parse_err("solver\n{\n    tolerance 1e-06\n}\n");
    assert_eq!(err.message, "expected ';', found '}'");
    assert_eq!(err.line, 4);
    assert_eq!(err.column, Column::At(1));
    assert_eq!(err.to_string(), "<input>:4:1: expected ';', found '}'");
}

#[test]
fn test_premature_end_of_input() {
    let err = parse_err("a 1;\nb 2");
    assert_eq!(err.to_string(), "<input>:2:EOF: expected ';'");
    assert!(err.is_eof());

    let err = parse_err("a\n{\n    b 1;\n");
    assert_eq!(err.to_string(), "<input>:3:EOF: expected '}'");
}

#[test]
fn test_unexpected_token() {
    let err = parse_err("a 1;\n) b;");
    assert_eq!(err.message, "expected a keyword, found ')'");
    assert_eq!((err.line, err.column), (2, Column::At(1)));
}

#[test]
fn test_lex_errors_propagate() {
    let err = parse_err("a 1;\nb @;");
    assert_eq!(err.to_string(), "<input>:2:3: Illegal character '@'");

    let err = parse_err("a 1;\n/* open");
    assert_eq!(err.message, "Unmatched multi-line comment");
    assert_eq!(err.line, 2);
}

#[test]
fn test_header_only() {
    let header = Parser::new("FoamFile\n{\n    version 2.0;\n    object U;\n}\ninternalField nonuniform List<vector> 1000000(", "0/U")
        .parse_header()
        .unwrap()
        .unwrap();
    assert_eq!(header["object"], Value::word("U"));

    assert_eq!(Parser::new("a 1;", "x").parse_header().unwrap(), None);
}
