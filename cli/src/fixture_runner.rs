use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use blocks::sink::Sinks;
use blocks::{BlockScanner, ScanConfig};

const FIXTURE_EXTENSION: &str = ".blocks-test";

#[derive(Debug, Deserialize)]
pub struct FixtureConfig {
    /// Human-readable fixture description.
    #[serde(default)]
    pub description: Option<String>,

    /// Label the input is scanned under. Defaults to "-".
    #[serde(default = "default_label")]
    pub label: String,

    /// Patterns and options, same names as the long command line flags.
    #[serde(flatten)]
    pub scan: ScanConfig,

    /// Expected exact output, compared without trailing newlines.
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected nesting errors. If present (even empty), the number of
    /// reports is checked and each location line must contain its entry.
    #[serde(default)]
    pub expect_errors: Option<Vec<String>>,

    /// Expected value of the "some block matched" result.
    #[serde(default)]
    pub expect_match: Option<bool>,

    /// Expected configuration error: the message must contain this substring.
    #[serde(default)]
    pub expect_config_error: Option<String>,
}

fn default_label() -> String {
    "-".to_string()
}

/// Split a fixture file into its TOML config and the input to scan.
pub fn parse_fixture_file(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    if !content.starts_with("---") {
        return Err("missing opening --- front matter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- front matter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let input = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, input))
}

pub enum FixtureOutcome {
    Pass,
    Fail(String),
}

pub struct FixtureResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: FixtureOutcome,
}

impl FixtureResult {
    fn fail(path: &Path, description: Option<String>, reason: String) -> Self {
        FixtureResult {
            path: path.to_path_buf(),
            description,
            outcome: FixtureOutcome::Fail(reason),
        }
    }
}

fn run_single_fixture(path: &Path) -> FixtureResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return FixtureResult::fail(path, None, format!("cannot read file: {}", e)),
    };

    let (config, input) = match parse_fixture_file(&content) {
        Ok(pair) => pair,
        Err(e) => return FixtureResult::fail(path, None, format!("front matter error: {}", e)),
    };
    let description = config.description.clone();

    match (check_fixture(&config, input), description) {
        (None, description) => FixtureResult {
            path: path.to_path_buf(),
            description,
            outcome: FixtureOutcome::Pass,
        },
        (Some(reason), description) => FixtureResult::fail(path, description, reason),
    }
}

/// Run one fixture's input through a scanner. Returns `Some(reason)` on
/// mismatch.
fn check_fixture(config: &FixtureConfig, input: &str) -> Option<String> {
    let compiled = config.scan.compile();

    let (patterns, options) = match (&config.expect_config_error, compiled) {
        (Some(expected), Err(e)) => {
            let msg = e.to_string();
            return if msg.contains(expected.as_str()) {
                None
            } else {
                Some(format!(
                    "expected config error containing \"{}\", got: {}",
                    expected, msg
                ))
            };
        }
        (Some(expected), Ok(_)) => {
            return Some(format!(
                "expected config error containing \"{}\", but the config compiled",
                expected
            ));
        }
        (None, Err(e)) => return Some(format!("unexpected config error: {}", e)),
        (None, Ok(compiled)) => compiled,
    };

    let mut scanner = BlockScanner::new(
        input.as_bytes(),
        Sinks::new(Vec::new(), Vec::new()),
        &patterns,
        options,
    );
    let summary = match scanner.scan(Some(config.label.as_str())) {
        Ok(s) => s,
        Err(e) => return Some(format!("scan failed: {}", e)),
    };
    let (out, err) = scanner.into_sinks().into_inner();
    let out = String::from_utf8_lossy(&out);
    let err = String::from_utf8_lossy(&err);

    if let Some(expected) = &config.expect_output {
        let actual = out.trim_end_matches('\n');
        let expected = expected.trim_end_matches('\n');
        if actual != expected {
            return Some(format!(
                "output mismatch\n  expected:\n{}\n  actual:\n{}",
                indent(expected),
                indent(actual)
            ));
        }
    }

    if let Some(expected) = &config.expect_errors {
        if let Some(reason) = check_errors(&err, expected) {
            return Some(reason);
        }
    }

    if let Some(expected) = config.expect_match {
        if summary.matched != expected {
            return Some(format!(
                "expected match = {}, got {}",
                expected, summary.matched
            ));
        }
    }

    None
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    |{}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compare reported nesting errors with expectations. Each report starts
/// with a location line; the caret and excerpt lines that follow are not
/// checked.
fn check_errors(stderr: &str, expected: &[String]) -> Option<String> {
    let locations: Vec<&str> = stderr
        .lines()
        .filter(|l| l.contains("improper nesting"))
        .collect();

    if locations.len() != expected.len() {
        return Some(format!(
            "expected {} error(s), got {}\n  actual errors:\n{}",
            expected.len(),
            locations.len(),
            if locations.is_empty() {
                "    (none)".to_string()
            } else {
                locations
                    .iter()
                    .map(|l| format!("    - {}", l))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in locations.iter().zip(expected).enumerate() {
        if !actual.contains(expected.as_str()) {
            return Some(format!(
                "error[{}]: expected message containing \"{}\", got: {}",
                i, expected, actual
            ));
        }
    }

    None
}

/// Discover fixture files grouped by subfolder relative to root.
/// Files directly in `root` get group "".
fn discover_grouped(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_fixtures(root, root, &mut groups);
    for files in groups.values_mut() {
        files.sort();
    }
    groups
}

fn collect_fixtures(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(FIXTURE_EXTENSION) {
                let group = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(group).or_default().push(path);
            }
        }
    }
}

/// List available groups for the given fixture path.
pub fn list_groups(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no groups)");
        return;
    }

    let groups = discover_grouped(path);
    if groups.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_EXTENSION, path.display());
        return;
    }

    eprintln!("available groups:");
    for (group, files) in &groups {
        let label = if group.is_empty() { "(root)" } else { group.as_str() };
        eprintln!("  {} ({} fixtures)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn ok_label(no_color: bool) -> &'static str {
    if no_color { "ok" } else { "\x1b[32mok\x1b[0m" }
}

fn failed_label(no_color: bool) -> &'static str {
    if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn display_name(result: &FixtureResult) -> &str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_suffix(FIXTURE_EXTENSION))
            .unwrap_or("?")
    })
}

fn print_failure(result: &FixtureResult) {
    eprintln!();
    eprintln!("  --- {} ---", result.path.display());
    if let FixtureOutcome::Fail(reason) = &result.outcome {
        for line in reason.lines() {
            eprintln!("  {}", line);
        }
    }
}

/// Run every fixture under `path` (or a single file).
/// If `groups` is non-empty, only fixtures in those groups run.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_fixtures(path: &Path, no_color: bool, groups: &[String]) -> i32 {
    if path.is_file() {
        let result = run_single_fixture(path);
        return match &result.outcome {
            FixtureOutcome::Pass => {
                eprintln!("  {}  {}", pass_label(no_color), display_name(&result));
                eprintln!();
                eprintln!("test result: {}. 1 passed, 0 failed", ok_label(no_color));
                0
            }
            FixtureOutcome::Fail(_) => {
                eprintln!("  {}  {}", fail_label(no_color), display_name(&result));
                eprintln!();
                eprintln!("failures:");
                print_failure(&result);
                eprintln!();
                eprintln!(
                    "test result: {}. 0 passed, 1 failed (of 1)",
                    failed_label(no_color)
                );
                1
            }
        };
    }

    let all_groups = discover_grouped(path);

    if all_groups.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_EXTENSION, path.display());
        return 1;
    }

    let run_groups: BTreeMap<&str, &Vec<PathBuf>> = if groups.is_empty() {
        all_groups.iter().map(|(k, v)| (k.as_str(), v)).collect()
    } else {
        let mut filtered = BTreeMap::new();
        for requested in groups {
            let req = requested.trim_matches('/');
            let mut found = false;
            for (group, files) in &all_groups {
                if group == req || group.starts_with(&format!("{}/", req)) {
                    filtered.insert(group.as_str(), files);
                    found = true;
                }
            }
            if !found {
                log::warn!(
                    "group '{}' not found (available: {})",
                    req,
                    all_groups
                        .keys()
                        .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        filtered
    };

    if run_groups.is_empty() {
        eprintln!("no matching groups found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<FixtureResult> = Vec::new();

    for (group, files) in &run_groups {
        let header = if group.is_empty() { "(root)" } else { *group };
        eprintln!();
        eprintln!("{}", bold(header, no_color));

        for file in *files {
            let result = run_single_fixture(file);
            match &result.outcome {
                FixtureOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), display_name(&result));
                }
                FixtureOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), display_name(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            print_failure(f);
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", ok_label(no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            failed_label(no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}
