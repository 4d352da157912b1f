use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;

use awl::{Encoding, ParseError, ParseTree, ParserOptions};

const TEST_SUFFIX: &str = ".test.awl";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Source encoding; defaults to the project setting.
    #[serde(default)]
    pub encoding: Option<Encoding>,

    /// Overrides the project's `require-block-end` setting.
    #[serde(default)]
    pub require_block_end: Option<bool>,

    /// Substring that must appear in the parse error's message.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Expected error kind, e.g. "duplicate descriptor" or "duplicate-descriptor".
    #[serde(default)]
    pub expect_error_kind: Option<String>,

    /// 1-based line (within the AWL source) the error must be reported on.
    #[serde(default)]
    pub expect_line: Option<usize>,

    /// Expected total number of blocks.
    #[serde(default)]
    pub expect_blocks: Option<usize>,

    /// Expected total number of instructions across all code blocks.
    #[serde(default)]
    pub expect_instructions: Option<usize>,
}

impl TestConfig {
    fn expects_error(&self) -> bool {
        self.expect_error.is_some() || self.expect_error_kind.is_some() || self.expect_line.is_some()
    }

    fn options(&self, base: &ParserOptions) -> ParserOptions {
        ParserOptions {
            encoding: self.encoding.unwrap_or(base.encoding),
            require_block_end: self.require_block_end.unwrap_or(base.require_block_end),
        }
    }
}

/// Split a `.test.awl` file into its TOML config and raw AWL source bytes.
/// The source stays undecoded so the fixture's encoding applies to it.
fn parse_test_file(content: &[u8]) -> Result<(TestConfig, &[u8]), String> {
    let content = content.strip_prefix(b"\xef\xbb\xbf").unwrap_or(content);

    let Some(after_open) = content.strip_prefix(b"---") else {
        return Err("missing opening --- frontmatter delimiter".into());
    };
    let after_open = after_open
        .strip_prefix(b"\n")
        .or_else(|| after_open.strip_prefix(b"\r\n"))
        .unwrap_or(after_open);

    let (toml_bytes, rest) = match after_open.strip_prefix(b"---") {
        Some(rest) => (&after_open[..0], rest),
        None => {
            let close_pos =
                find(after_open, b"\n---").ok_or("missing closing --- frontmatter delimiter")?;
            (&after_open[..close_pos], &after_open[close_pos + 4..])
        }
    };

    let toml_str = std::str::from_utf8(toml_bytes)
        .map_err(|_| "frontmatter is not valid UTF-8".to_string())?
        .trim_end_matches('\r');

    let source = rest
        .strip_prefix(b"\r\n")
        .or_else(|| rest.strip_prefix(b"\n"))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path, base: &ParserOptions) -> TestResult {
    let content = match std::fs::read(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let name = path.display().to_string();
    let parser = awl::Parser::new(0, name).with_options(config.options(base));
    let result = parser.parse(source);

    let outcome = match check_outcome(&config, result) {
        None => TestOutcome::Pass,
        Some(reason) => TestOutcome::Fail(reason),
    };

    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Compare a parse result against the fixture's expectations.
/// Returns `Some(reason)` on mismatch.
fn check_outcome(config: &TestConfig, result: Result<ParseTree, ParseError>) -> Option<String> {
    match (config.expects_error(), result) {
        (true, Ok(_)) => Some("expected a parse error, but parsing succeeded".into()),
        (true, Err(error)) => check_error(config, &error),
        (false, Err(error)) => Some(format!("unexpected parse error: {}", error)),
        (false, Ok(tree)) => check_tree(config, &tree),
    }
}

fn check_error(config: &TestConfig, error: &ParseError) -> Option<String> {
    if let Some(expected) = &config.expect_error {
        let actual = error.to_string();
        if !actual.contains(expected.as_str()) {
            return Some(format!(
                "expected error containing \"{}\", got: {}",
                expected, actual
            ));
        }
    }

    if let Some(expected) = &config.expect_error_kind {
        let actual = error.kind.to_string();
        if normalize_kind(expected) != normalize_kind(&actual) {
            return Some(format!(
                "expected error kind \"{}\", got \"{}\" ({})",
                expected, actual, error
            ));
        }
    }

    if let Some(expected) = config.expect_line {
        if error.line != expected {
            return Some(format!(
                "expected error on line {}, got line {} ({})",
                expected, error.line, error
            ));
        }
    }

    None
}

/// "Duplicate-Descriptor", "duplicate descriptor" and "DuplicateDescriptorError"
/// all compare equal.
fn normalize_kind(kind: &str) -> String {
    let flat: String = kind
        .chars()
        .filter(|c| !matches!(*c, '-' | '_' | ' '))
        .collect::<String>()
        .to_ascii_lowercase();
    flat.strip_suffix("error").unwrap_or(&flat).to_string()
}

fn check_tree(config: &TestConfig, tree: &ParseTree) -> Option<String> {
    if let Some(expected) = config.expect_blocks {
        let actual = tree.block_count();
        if actual != expected {
            let names: Vec<String> = tree.iter().map(|b| b.block_ref().to_string()).collect();
            return Some(format!(
                "expected {} block(s), got {}\n  blocks: {}",
                expected,
                actual,
                if names.is_empty() {
                    "(none)".to_string()
                } else {
                    names.join(", ")
                }
            ));
        }
    }

    if let Some(expected) = config.expect_instructions {
        let actual = tree.instruction_count();
        if actual != expected {
            return Some(format!(
                "expected {} instruction(s), got {}",
                expected, actual
            ));
        }
    }

    None
}

/// Fixture files keyed by category: the subfolder relative to the test
/// root, "" for files directly in it.
struct Suite {
    categories: BTreeMap<String, Vec<PathBuf>>,
}

impl Suite {
    fn single(path: &Path) -> Self {
        Suite {
            categories: BTreeMap::from([(String::new(), vec![path.to_path_buf()])]),
        }
    }

    fn discover(root: &Path) -> Self {
        let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                tracing::warn!(dir = %dir.display(), "cannot read fixture directory");
                continue;
            };
            for path in entries.flatten().map(|entry| entry.path()) {
                if path.is_dir() {
                    pending.push(path);
                } else if path.to_string_lossy().ends_with(TEST_SUFFIX) {
                    let category = dir
                        .strip_prefix(root)
                        .map(|p| p.to_string_lossy().replace('\\', "/"))
                        .unwrap_or_default();
                    categories.entry(category).or_default().push(path);
                }
            }
        }
        categories.values_mut().for_each(|files| files.sort());
        Suite { categories }
    }

    fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories matching any requested name or one of its subfolders;
    /// everything when nothing is requested.
    fn select(&self, requested: &[String]) -> Vec<(&str, &[PathBuf])> {
        for req in requested {
            if !self.categories.keys().any(|cat| in_category(cat, req)) {
                tracing::warn!(category = %req, "no fixtures in category");
            }
        }
        self.categories
            .iter()
            .filter(|(cat, _)| requested.is_empty() || requested.iter().any(|req| in_category(cat, req)))
            .map(|(cat, files)| (cat.as_str(), files.as_slice()))
            .collect()
    }
}

/// `blocks` covers `blocks` and `blocks/nested`, not `blocks2`.
fn in_category(cat: &str, requested: &str) -> bool {
    let requested = requested.trim_matches('/');
    cat.strip_prefix(requested)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn category_label(cat: &str) -> &str {
    if cat.is_empty() { "(root)" } else { cat }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let suite = Suite::discover(path);
    if suite.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (cat, files) in &suite.categories {
        eprintln!("  {} ({} fixtures)", category_label(cat), files.len());
    }
}

/// Colored PASS/FAIL lines and the final tally on stderr.
struct Report {
    out: StandardStream,
    passed: usize,
    failures: Vec<TestResult>,
}

impl Report {
    fn new(no_color: bool) -> Self {
        let choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Report {
            out: StandardStream::stderr(choice),
            passed: 0,
            failures: Vec::new(),
        }
    }

    fn styled(&mut self, text: &str, color: Option<Color>) -> io::Result<()> {
        let bold = color.is_none();
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        self.out.set_color(&spec)?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    fn category(&mut self, cat: &str) -> io::Result<()> {
        writeln!(self.out)?;
        self.styled(category_label(cat), None)?;
        writeln!(self.out)
    }

    fn record(&mut self, result: TestResult) -> io::Result<()> {
        let label = result.description.clone().unwrap_or_else(|| {
            result
                .path
                .file_name()
                .map(|s| s.to_string_lossy().trim_end_matches(TEST_SUFFIX).to_string())
                .unwrap_or_default()
        });
        write!(self.out, "  ")?;
        if matches!(result.outcome, TestOutcome::Pass) {
            self.passed += 1;
            self.styled("PASS", Some(Color::Green))?;
        } else {
            self.styled("FAIL", Some(Color::Red))?;
            self.failures.push(result);
        }
        writeln!(self.out, "  {}", label)
    }

    /// Print failure details and the summary; returns the exit code.
    fn finish(mut self) -> io::Result<i32> {
        if !self.failures.is_empty() {
            writeln!(self.out, "\nfailures:")?;
            for f in &self.failures {
                writeln!(self.out, "\n  --- {} ---", f.path.display())?;
                if let TestOutcome::Fail(reason) = &f.outcome {
                    for line in reason.lines() {
                        writeln!(self.out, "  {}", line)?;
                    }
                }
            }
        }

        let failed = self.failures.len();
        write!(self.out, "\ntest result: ")?;
        if failed == 0 {
            self.styled("ok", Some(Color::Green))?;
            writeln!(self.out, ". {} passed, 0 failed", self.passed)?;
            Ok(0)
        } else {
            self.styled("FAILED", Some(Color::Red))?;
            writeln!(
                self.out,
                ". {} passed, {} failed (of {})",
                self.passed,
                failed,
                self.passed + failed
            )?;
            Ok(1)
        }
    }
}

/// Run all `.test.awl` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, base: &ParserOptions, no_color: bool, categories: &[String]) -> i32 {
    let single = path.is_file();
    let suite = if single {
        Suite::single(path)
    } else {
        Suite::discover(path)
    };
    if suite.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return 1;
    }

    let selected = suite.select(categories);
    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    run_selected(&selected, !single, base, Report::new(no_color)).unwrap_or_else(|e| {
        eprintln!("error: cannot write test report: {}", e);
        1
    })
}

fn run_selected(
    selected: &[(&str, &[PathBuf])],
    with_headers: bool,
    base: &ParserOptions,
    mut report: Report,
) -> io::Result<i32> {
    for (cat, files) in selected {
        if with_headers {
            report.category(cat)?;
        }
        for file in files.iter() {
            report.record(run_single_test(file, base))?;
        }
    }
    report.finish()
}
