use blocks::block::TokenKind;
use blocks::scanner::{BodyOutcome, Delimiter};
use blocks::sink::Sinks;
use blocks::{BlockScanner, ScanConfig, ScanSummary};

type MemScanner<'p> = BlockScanner<'p, &'static [u8], Vec<u8>, Vec<u8>>;

fn config(name: &str, open: &str, close: &str) -> ScanConfig {
    ScanConfig {
        block_name: name.to_string(),
        block_start: open.to_string(),
        block_end: close.to_string(),
        ..ScanConfig::default()
    }
}

fn main_braces() -> ScanConfig {
    config("main", r"\{", r"\}")
}

/// Scan `input` and return stdout, stderr and the summary.
fn run(config: &ScanConfig, input: &'static str, file: Option<&str>) -> (String, String, ScanSummary) {
    let (patterns, options) = config.compile().expect("config should compile");
    let mut scanner: MemScanner<'_> = BlockScanner::new(
        input.as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    let summary = scanner.scan(file).expect("scan failed");
    let (out, err) = scanner.into_sinks().into_inner();
    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
        summary,
    )
}

fn output(config: &ScanConfig, input: &'static str) -> String {
    run(config, input, None).0
}

#[test]
fn trivial_block() {
    let (patterns, options) = main_braces().compile().unwrap();
    let mut scanner: MemScanner<'_> = BlockScanner::new(
        "main{}\n".as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    let summary = scanner.scan(None).unwrap();
    assert!(summary.matched);
    assert!(!summary.fatal);
    assert_eq!(scanner.cursor().position(), 6);

    let (out, err) = scanner.into_sinks().into_inner();
    assert_eq!(String::from_utf8(out).unwrap(), "main{}\n");
    assert!(err.is_empty());
}

#[test]
fn depth_resolves_at_the_last_close() {
    for k in 1..=5usize {
        let mut input = String::from("main\n");
        input.push_str(&"{\n".repeat(k));
        input.push_str(&"}\n".repeat(k));
        input.push_str("}\n");
        let input: &'static str = Box::leak(input.into_boxed_str());

        let (patterns, options) = main_braces().compile().unwrap();
        let mut scanner: MemScanner<'_> = BlockScanner::new(
            input.as_bytes(),
            Sinks::new(Vec::new(), Vec::new()),
            &patterns,
            options,
        );
        scanner.cursor_mut().load_next_line().unwrap();
        assert!(scanner.seek_name().unwrap());
        assert_eq!(scanner.scan_body().unwrap(), BodyOutcome::Balanced);

        let lines = scanner.block().lines();
        assert_eq!(lines.len(), 1 + 2 * k);
        assert_eq!(lines.last().unwrap().line_no, 1 + 2 * k);
        assert!(lines.last().unwrap().kinds.contains(TokenKind::Close));
    }
}

#[test]
fn delimiters_come_one_per_call() {
    let (patterns, options) = main_braces().compile().unwrap();
    let mut scanner: MemScanner<'_> = BlockScanner::new(
        "foo main } { { }\n".as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    // Nothing loaded yet.
    assert!(!scanner.seek_name().unwrap());
    assert_eq!(scanner.next_delimiter().unwrap(), None);

    scanner.cursor_mut().load_next_line().unwrap();
    assert_eq!(scanner.next_delimiter().unwrap(), Some(Delimiter::Close));
    assert_eq!(scanner.next_delimiter().unwrap(), Some(Delimiter::Open));
    assert_eq!(scanner.next_delimiter().unwrap(), Some(Delimiter::Open));
    assert_eq!(scanner.next_delimiter().unwrap(), Some(Delimiter::Close));
    assert_eq!(scanner.block().len(), 1);
}

#[test]
fn lines_are_recorded_once_with_merged_kinds() {
    let (patterns, options) = main_braces().compile().unwrap();
    let mut scanner: MemScanner<'_> = BlockScanner::new(
        "foo {\n{ bar\n}\nmain {   \nsomething\t\n}\nsomething  ".as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    scanner.cursor_mut().load_next_line().unwrap();
    assert!(scanner.seek_name().unwrap());
    assert_eq!(scanner.block().len(), 1);
    assert_eq!(scanner.block().lines()[0].text, "main {   ");
    assert_eq!(scanner.block().lines()[0].line_no, 4);

    assert_eq!(scanner.next_delimiter().unwrap(), Some(Delimiter::Open));
    assert_eq!(scanner.block().len(), 1);
    let first = &scanner.block().lines()[0];
    assert!(first.kinds.contains(TokenKind::Name));
    assert!(first.kinds.contains(TokenKind::Open));

    assert_eq!(scanner.next_delimiter().unwrap(), Some(Delimiter::Close));
    let lines = scanner.block().lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1].text, "something\t");
    assert!(lines[1].kinds.is_empty());
    assert_eq!(lines[2].text, "}");

    assert!(!scanner.seek_name().unwrap());
    assert!(scanner.block().is_empty());
}

#[test]
fn premature_close_is_reported_at_the_close() {
    let (out, err, summary) = run(&main_braces(), "foo main } { { }\n", Some("t.c"));
    assert!(out.is_empty());
    assert!(!summary.matched);
    assert!(!summary.fatal);
    assert_eq!(
        err,
        "blocks error: file t.c, line 1, col 10: improper nesting from line 1\n\
         blocks error: foo main } { { }\n\
         blocks error:          ^\n"
    );
}

#[test]
fn dangling_close_after_a_balanced_block() {
    // The second close belongs to no block: the name search never gets to it.
    let (out, err, summary) = run(&main_braces(), "main{\n}\n}\n", None);
    assert_eq!(out, "main{\n}\n");
    assert!(err.is_empty());
    assert!(summary.matched);
}

#[test]
fn unterminated_block_is_reported_at_end_of_input() {
    let (out, err, summary) = run(&main_braces(), "main {\n{\n}\n", None);
    assert!(out.is_empty());
    assert!(!summary.matched);
    assert_eq!(
        err,
        "blocks error: line 3, col 1: improper nesting from line 1\n\
         blocks error: }\n\
         blocks error: ^\n"
    );
}

#[test]
fn scanning_resumes_after_an_error() {
    let input = "main }\nmain {\n  ok\n}\n";
    let (out, err, summary) = run(&main_braces(), input, None);
    assert_eq!(out, "main {\n  ok\n}\n");
    assert_eq!(err.lines().count(), 3);
    assert!(summary.matched);
}

#[test]
fn fatal_error_stops_the_scan() {
    let config = ScanConfig {
        fatal_error: true,
        ..main_braces()
    };
    let input = "main }\nmain }\nmain {}\n";
    let (out, err, summary) = run(&config, input, None);
    assert!(out.is_empty());
    assert_eq!(err.lines().count(), 3);
    assert!(summary.fatal);
    assert!(!summary.matched);
}

#[test]
fn comment_hides_the_rest_of_its_line() {
    let config = ScanConfig {
        comment: Some("//".to_string()),
        ..main_braces()
    };
    let input = "// main {\n}\nmain {\n// {\n} //";
    assert_eq!(output(&config, input), "main {\n// {\n} //\n");

    let (patterns, options) = config.compile().unwrap();
    let mut scanner: MemScanner<'_> = BlockScanner::new(
        input.as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    scanner.cursor_mut().load_next_line().unwrap();
    assert!(scanner.seek_name().unwrap());
    assert_eq!(scanner.cursor().line_number(), 3);
    assert_eq!(scanner.scan_body().unwrap(), BodyOutcome::Balanced);
    assert!(scanner.block().lines()[1].kinds.contains(TokenKind::Comment));
    assert!(!scanner.block().lines()[1].kinds.contains(TokenKind::Open));
}

#[test]
fn without_comment_pattern_commented_code_counts() {
    let input = "// main {\n}\n";
    assert_eq!(output(&main_braces(), input), "// main {\n}\n");
}

#[test]
fn name_equal_to_open_finds_every_top_level_block() {
    let input = "{\n {\n }\n}\n{ x }\n";
    assert_eq!(
        output(&ScanConfig::default(), input),
        "{\n {\n }\n}\n{ x }\n"
    );
}

#[test]
fn open_may_precede_the_name() {
    let config = config(r"\(define", r"\(", r"\)");
    let input = "(define (f x)\n  (+ x 1))\n(other)\n(define y 2)\n";
    assert_eq!(
        output(&config, input),
        "(define (f x)\n  (+ x 1))\n(define y 2)\n"
    );
}

#[test]
fn two_blocks_on_one_line() {
    let (out, _, _) = run(&main_braces(), "main{} main{}\n", None);
    assert_eq!(out, "main{} main{}\nmain{} main{}\n");
}

#[test]
fn name_without_open_runs_to_end_of_input() {
    assert_eq!(output(&main_braces(), "x\nmain\nfoo\n"), "main\nfoo\n");
}

#[test]
fn empty_input_matches_nothing() {
    let (out, err, summary) = run(&ScanConfig::default(), "", Some("empty"));
    assert!(out.is_empty());
    assert!(err.is_empty());
    assert_eq!(summary, ScanSummary::default());
}

#[test]
fn skip_then_count() {
    let input = "{1}\n{2}\n{3}\n{4}\n{5}\n";
    let config = ScanConfig {
        skip: 1,
        block_count: Some(2),
        ..ScanConfig::default()
    };
    assert_eq!(output(&config, input), "{2}\n{3}\n");

    let all_out = output(&ScanConfig::default(), input);
    let all: Vec<&str> = all_out.lines().collect();
    let expected: String = all.iter().skip(1).take(2).map(|l| format!("{l}\n")).collect();
    assert_eq!(output(&config, input), expected);
}

#[test]
fn same_input_same_output() {
    let input = "{a\n {b}\n}\n} {c}\n{ {d} }\n";
    let config = ScanConfig {
        line_numbers: true,
        mark_start: Some("@S".to_string()),
        ..ScanConfig::default()
    };
    assert_eq!(run(&config, input, Some("f")), run(&config, input, Some("f")));
}

#[test]
fn block_count_zero_prints_nothing() {
    let config = ScanConfig {
        block_count: Some(0),
        ..ScanConfig::default()
    };
    let (out, _, summary) = run(&config, "{}\n", None);
    assert!(out.is_empty());
    assert!(!summary.matched);
}

#[test]
fn content_filters_do_not_use_up_the_budget() {
    let input = "{a}\n{x}\n{y}\n{x2}\n";
    let must = ScanConfig {
        regex_match: Some("x".to_string()),
        block_count: Some(1),
        ..ScanConfig::default()
    };
    assert_eq!(output(&must, input), "{x}\n");

    let must_not = ScanConfig {
        regex_no_match: Some("x".to_string()),
        skip: 1,
        ..ScanConfig::default()
    };
    assert_eq!(output(&must_not, input), "{y}\n");
}

#[test]
fn filtered_out_blocks_do_not_count_as_matched() {
    let config = ScanConfig {
        regex_match: Some("nothing".to_string()),
        ..ScanConfig::default()
    };
    let (out, _, summary) = run(&config, "{a}\n", None);
    assert!(out.is_empty());
    assert!(!summary.matched);
}

#[test]
fn ignore_top_prints_only_the_body() {
    let config = ScanConfig {
        ignore_top: true,
        ..main_braces()
    };
    let input = "int main(void)\n{\n  a();\n  b();\n}\n";
    assert_eq!(output(&config, input), "  a();\n  b();\n");

    // One line blocks have no body.
    assert_eq!(output(&config, "main{}\n"), "");
}

#[test]
fn ignore_top_then_nested_blocks() {
    let config = ScanConfig {
        ignore_top: true,
        ..ScanConfig::default()
    };
    assert_eq!(output(&config, "{\n\t{}\n\t{}\n}\n"), "\t{}\n\t{}\n");
}

#[test]
fn line_numbers_and_marks() {
    let config = ScanConfig {
        line_numbers: true,
        mark_start: Some("@S".to_string()),
        mark_end: Some("@E".to_string()),
        ..main_braces()
    };
    let input = "x\nmain {\n}\n";
    assert_eq!(
        output(&config, input),
        "@S\n       2 main {\n       3 }\n@E\n"
    );
}

#[test]
fn file_name_is_printed_once_before_the_first_block() {
    let config = ScanConfig {
        print_file_names: true,
        ..ScanConfig::default()
    };
    let (out, _, _) = run(&config, "{1}\n{2}\n", Some("a.c"));
    assert_eq!(out, "a.c:\n{1}\n{2}\n");

    let (out, _, _) = run(&config, "nothing here\n", Some("b.c"));
    assert!(out.is_empty());
}

#[test]
fn quiet_prints_nothing_but_errors() {
    let config = ScanConfig {
        quiet: true,
        print_file_names: true,
        ..main_braces()
    };
    let (out, err, summary) = run(&config, "main {}\nmain }\n", Some("q"));
    assert!(out.is_empty());
    assert_eq!(err.lines().count(), 3);
    assert!(summary.matched);
}

#[test]
fn budget_carries_over_between_inputs() {
    let config = ScanConfig {
        block_count: Some(1),
        print_file_names: true,
        ..ScanConfig::default()
    };
    let (patterns, options) = config.compile().unwrap();
    let mut scanner: MemScanner<'_> = BlockScanner::new(
        "{1}\n{2}\n".as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    assert!(scanner.scan(Some("a")).unwrap().matched);
    scanner.reset("{3}\n".as_bytes());
    assert!(!scanner.scan(Some("b")).unwrap().matched);

    let (out, _) = scanner.into_sinks().into_inner();
    assert_eq!(String::from_utf8(out).unwrap(), "a:\n{1}\n");
}

#[test]
fn reset_starts_line_numbers_over() {
    let config = ScanConfig {
        line_numbers: true,
        print_file_names: true,
        ..ScanConfig::default()
    };
    let (patterns, options) = config.compile().unwrap();
    let mut scanner: MemScanner<'_> = BlockScanner::new(
        "\n{1}\n".as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    assert!(scanner.scan(Some("a")).unwrap().matched);
    scanner.reset("{2}\n".as_bytes());
    assert!(scanner.scan(Some("b")).unwrap().matched);

    let (out, _) = scanner.into_sinks().into_inner();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "a:\n       2 {1}\nb:\n       1 {2}\n"
    );
}

#[test]
fn config_from_toml() {
    let config: ScanConfig = toml::from_str(
        r##"
        block_name = "main"
        comment = "#"
        block_count = 2
        ignore_top = true
        "##,
    )
    .unwrap();
    assert_eq!(config.block_name, "main");
    assert_eq!(config.block_start, r"\{");
    assert_eq!(config.comment.as_deref(), Some("#"));
    assert_eq!(config.block_count, Some(2));
    assert!(config.ignore_top);
    assert!(!config.quiet);
}
