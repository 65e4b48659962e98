use crate::*;

fn run_with(options: Options, src: &str) -> (String, Preprocessor, TokenBuffer) {
    let mut cpp = Preprocessor::new(options);
    let mut reader = cpp
        .parse(vec![Box::new(StringSource::new("test.c", src))])
        .expect("parse succeeds");

    let mut writer = TokenBuffer::new();
    cpp.preprocess(&mut reader, &mut writer)
        .expect("preprocess succeeds");

    assert!(cpp.hide_set_is_clear(), "hide-set counters must drain");

    let rendered = writer
        .tokens()
        .map(|t| t.spelling(cpp.interner()).into_owned())
        .collect();
    (rendered, cpp, writer)
}

fn run(src: &str) -> (String, Preprocessor, TokenBuffer) {
    run_with(Options::default(), src)
}

fn output_of(src: &str) -> String {
    let (rendered, cpp, _) = run(src);
    assert!(
        cpp.diagnostics().is_empty(),
        "unexpected diagnostics:\n{}",
        cpp.diagnostics().show_all(cpp.source_map())
    );
    rendered
}

#[test]
fn expansion_with_empty_macro_table_is_identity() {
    assert_eq!(output_of("a b\nc\n"), "a b\nc\n");
    assert_eq!(output_of("x + y == z\n"), "x + y == z\n");
}

#[test]
fn object_macros_chain() {
    // S4.
    assert_eq!(output_of("#define A 1\n#define B A+A\nB\n"), "\n\n1+1\n");
}

#[test]
fn function_macro_with_variadic_tail() {
    // S5.
    assert_eq!(
        output_of("#define F(x, ...) x=__VA_ARGS__\nF(a, 1, 2)\n"),
        "\na=1, 2\n"
    );
}

#[test]
fn conditional_compilation_with_defined() {
    // S6.
    assert_eq!(
        output_of("#define N 3\n#if defined(N) && N > 2\nyes\n#else\nno\n#endif\n"),
        "\n\nyes\n\n\n"
    );
}

#[test]
fn defined_without_parentheses() {
    assert_eq!(
        output_of("#define N 1\n#if defined N\ny\n#endif\n"),
        "\n\ny\n\n"
    );
}

#[test]
fn define_then_undef_has_no_effect() {
    assert_eq!(output_of("#define X 42\n#undef X\nX\n"), "\n\nX\n");
}

#[test]
fn self_referential_macro_freezes() {
    let (rendered, _, writer) = run("#define X X\nX\n");
    assert_eq!(rendered, "\nX\n");

    let tokens: Vec<Token> = writer.into_tokens();
    let xs: Vec<&Token> = tokens
        .iter()
        .filter(|t| !t.is_newline())
        .collect();
    assert_eq!(xs.len(), 1);
    assert_eq!(xs[0].rune, Rune::NonRepl);
}

#[test]
fn mutually_recursive_macros_freeze() {
    assert_eq!(output_of("#define A B\n#define B A\nA\n"), "\n\nA\n");
}

#[test]
fn macros_in_actuals_are_prescanned() {
    assert_eq!(
        output_of("#define twice(x) x x\n#define a b\ntwice(a)\n"),
        "\n\nb b\n"
    );
}

#[test]
fn function_macro_without_call_stays_verbatim() {
    assert_eq!(output_of("#define F(x) x\nF;\n"), "\nF;\n");
}

#[test]
fn stringize_and_paste() {
    assert_eq!(output_of("#define S(x) #x\nS(a b)\n"), "\n\"a b\"\n");
    assert_eq!(
        output_of("#define S(x) #x\nS(\"q\")\n"),
        "\n\"\\\"q\\\"\"\n"
    );
    assert_eq!(
        output_of("#define P(a,b) a##b\nP(x,1)\nP(,2)\n"),
        "\nx1\n2\n"
    );
    assert_eq!(
        output_of("#define GLUE(a, b) a ## b\nGLUE(do, uble)\n"),
        "\ndouble\n"
    );
}

#[test]
fn elif_chains_take_the_first_true_branch() {
    assert_eq!(
        output_of("#if 0\na\n#elif 1\nb\n#elif 1\nc\n#else\nd\n#endif\n"),
        "\n\nb\n\n\n\n"
    );
}

#[test]
fn skipped_regions_keep_their_conditional_structure() {
    assert_eq!(
        output_of("#if 0\n#if 1\nx\n#endif\n#endif\ny\n"),
        "\n\n\n\ny\n"
    );
}

#[test]
fn usual_arithmetic_conversions_reach_if() {
    // (unsigned)-1 is huge, so the signed branch is dead.
    assert_eq!(
        output_of("#if -1 < 0u\nsigned\n#else\nuns\n#endif\n"),
        "\n\nuns\n\n"
    );
    assert_eq!(output_of("#if 1 ? 'a' == 97 : 0\nch\n#endif\n"), "\nch\n\n");
    assert_eq!(output_of("#if (1 << 4) == 0x10\nhex\n#endif\n"), "\nhex\n\n");
}

#[test]
fn identifiers_in_if_evaluate_to_zero() {
    assert_eq!(output_of("#if mystery\nno\n#else\nyes\n#endif\n"), "\n\nyes\n\n");
}

#[test]
fn null_directive_and_line_markers_are_inert() {
    assert_eq!(output_of("#\nx\n"), "\nx\n");
    assert_eq!(output_of("# 1 test.c\nx\n"), "\nx\n");
}

#[test]
fn identical_redefinition_is_allowed() {
    assert_eq!(output_of("#define A 1\n#define A 1\nA\n"), "\n\n1\n");
    assert_eq!(
        output_of("#define F(x) x+1\n#define F(x) x+1\nF(2)\n"),
        "\n\n2+1\n"
    );
}

#[test]
fn conflicting_redefinition_diagnoses_and_keeps_the_first() {
    let (rendered, cpp, _) = run("#define A 1\n#define A 2\nA\n");
    assert_eq!(rendered, "\n\n1\n");
    assert_eq!(cpp.diagnostics().len(), 1);
    assert!(matches!(
        &cpp.diagnostics().iter().next().unwrap().kind,
        ErrorKind::MacroRedefinition(_)
    ));
}

#[test]
fn unbalanced_conditionals_diagnose_at_eof() {
    let (_, cpp, _) = run("#if 1\nx\n");
    assert!(cpp
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::UnbalancedConditional));

    let (_, cpp, _) = run("#endif\n");
    assert!(cpp
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::UnmatchedEndif));

    let (_, cpp, _) = run("#if 1\nx\n#endif\ny\n");
    assert!(cpp.diagnostics().is_empty());
}

#[test]
fn error_directive_is_fatal() {
    let mut cpp = Preprocessor::new(Options::default());
    let mut reader = cpp
        .parse(vec![Box::new(StringSource::new(
            "test.c",
            "#error bad things\n",
        ))])
        .unwrap();

    let mut writer = TokenBuffer::new();
    let error = cpp.preprocess(&mut reader, &mut writer).unwrap_err();
    assert_eq!(error.kind, ErrorKind::ErrorDirective("bad things".into()));
}

#[test]
fn error_directive_in_dead_branch_is_inert() {
    assert_eq!(output_of("#if 0\n#error never\n#endif\nok\n"), "\n\n\nok\n");
}

#[test]
fn warning_directive_continues() {
    let (rendered, cpp, _) = run("#warning careful\nx\n");
    assert_eq!(rendered, "\nx\n");
    assert_eq!(cpp.diagnostics().len(), 1);
    assert!(cpp.diagnostics().iter().next().unwrap().kind.is_warning());
}

#[test]
fn include_expansion_test_mode_writes_the_operand() {
    let options = Options {
        emit_include_filenames: true,
        ..Options::default()
    };
    let (rendered, cpp, _) = run_with(options, "#define H <foo.h>\n#include H\n");
    assert!(cpp.diagnostics().is_empty());
    assert_eq!(rendered, "\n<foo.h>\n");
}

#[test]
fn angled_include_without_closing_bracket_diagnoses() {
    let options = Options {
        emit_include_filenames: false,
        ..Options::default()
    };
    let (rendered, cpp, _) = run_with(options, "#include <foo\n");
    assert_eq!(rendered, "\n");
    assert!(cpp
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::BadIncludeName));
}

#[test]
fn missing_final_newline_diagnoses_unless_injected() {
    let (rendered, cpp, _) = run("x");
    assert_eq!(rendered, "x");
    assert!(cpp
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::MissingFinalNewline));

    // A trailing backslash with no newline to splice counts too.
    let (rendered, cpp, _) = run("0\\");
    assert_eq!(rendered, "0\\");
    assert!(cpp
        .diagnostics()
        .iter()
        .any(|d| d.kind == ErrorKind::MissingFinalNewline));

    let options = Options {
        inject_final_newline: true,
        ..Options::default()
    };
    let (rendered, cpp, _) = run_with(options, "x");
    assert_eq!(rendered, "x");
    assert!(cpp.diagnostics().is_empty());
}

#[test]
fn trigraphs_reach_the_directive_layer() {
    let options = Options {
        enable_trigraphs: true,
        ..Options::default()
    };
    let (rendered, cpp, _) = run_with(options, "??=define A 1\nA\n");
    assert!(cpp.diagnostics().is_empty());
    assert_eq!(rendered, "\n1\n");
}

#[test]
fn includes_resolve_search_paths_and_cache() {
    let dir = std::env::temp_dir().join(format!("c99pp-include-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("header.h"), "#define FROM_HEADER 7\n").unwrap();
    std::fs::write(
        dir.join("main.c"),
        "#include \"header.h\"\n#include \"header.h\"\nFROM_HEADER\n",
    )
    .unwrap();

    let mut cpp = Preprocessor::new(Options::default());
    cpp.include_paths = vec!["@".into()];

    let source = FileSource::new(dir.join("main.c"), cpp.include_cache());
    let mut reader = cpp.parse(vec![Box::new(source)]).unwrap();
    let mut writer = TokenBuffer::new();
    cpp.preprocess(&mut reader, &mut writer).unwrap();

    assert!(
        cpp.diagnostics().is_empty(),
        "{}",
        cpp.diagnostics().show_all(cpp.source_map())
    );

    let rendered: String = writer
        .tokens()
        .map(|t| t.spelling(cpp.interner()).into_owned())
        .collect();
    assert_eq!(rendered, "\n\n\n\n7\n");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_include_is_fatal() {
    let mut cpp = Preprocessor::new(Options::default());
    let mut reader = cpp
        .parse(vec![Box::new(StringSource::new(
            "test.c",
            "#include \"no-such-file-anywhere.h\"\n",
        ))])
        .unwrap();

    let mut writer = TokenBuffer::new();
    let error = cpp.preprocess(&mut reader, &mut writer).unwrap_err();
    assert!(error.kind.is_include_not_found());
}

#[test]
fn canonical_output_reprocesses_to_the_same_tokens() {
    let strip = |tokens: Vec<Token>, cpp: &Preprocessor| -> Vec<String> {
        tokens
            .iter()
            .filter(|t| !t.is_newline())
            .map(|t| t.spelling(cpp.interner()).into_owned())
            .collect()
    };

    let src = "#define A 1\n#define B A+A\nB\n";
    let (_, first_cpp, first_writer) = run(src);
    let first_tokens = strip(first_writer.into_tokens(), &first_cpp);
    assert_eq!(first_tokens, ["1", "+", "1"]);

    let (_, cpp, mut writer) = run(src);
    let mut canonical = String::new();
    write_canonical(&mut writer, cpp.interner(), cpp.source_map(), &mut canonical).unwrap();
    assert!(canonical.starts_with("# 1 test.c\n"));

    let (_, second_cpp, second_writer) = run(&canonical);
    assert!(second_cpp.diagnostics().is_empty());
    let second_tokens = strip(second_writer.into_tokens(), &second_cpp);

    assert_eq!(first_tokens, second_tokens);
}

#[test]
fn multiple_sources_form_one_stream() {
    let mut cpp = Preprocessor::new(Options::default());
    let mut reader = cpp
        .parse(vec![
            Box::new(StringSource::new("<predef>", "#define ONE 1\n")),
            Box::new(StringSource::new("test.c", "ONE\n")),
        ])
        .unwrap();

    let mut writer = TokenBuffer::new();
    cpp.preprocess(&mut reader, &mut writer).unwrap();

    let rendered: String = writer
        .tokens()
        .map(|t| t.spelling(cpp.interner()).into_owned())
        .collect();
    assert_eq!(rendered, "\n1\n");
}

#[test]
fn pragma_is_recognised_and_ignored() {
    assert_eq!(output_of("#pragma once\nx\n"), "\nx\n");
}

#[test]
fn comments_separate_tokens() {
    assert_eq!(output_of("a/*x*/b\n"), "a b\n");
    assert_eq!(output_of("one // trailing\n"), "one\n");
}
