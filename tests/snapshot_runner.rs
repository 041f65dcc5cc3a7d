use anyhow::{anyhow, Result};
use diffy::{DiffOptions, PatchFormatter};
use std::fs;
use std::path::{Path, PathBuf};

use yaml_splice::{EditOperation, Editor};

pub struct SnapshotRunner {
    update_mode: bool,
    test_filter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SnapshotTest {
    pub name: String,
    pub input_path: PathBuf,
    pub args_path: PathBuf,
    pub output_path: PathBuf,
    pub error_path: PathBuf,
}

/// What running the edit script produced: the rendered document, or the error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Error(String),
}

impl Outcome {
    fn text(&self) -> &str {
        match self {
            Outcome::Output(text) | Outcome::Error(text) => text,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Outcome::Output(_) => "output",
            Outcome::Error(_) => "error",
        }
    }
}

#[derive(Debug)]
pub struct SnapshotResult {
    pub test: SnapshotTest,
    pub actual: Option<Outcome>,
    pub expected: Option<Outcome>,
    pub error: Option<String>,
    pub matches: bool,
}

impl SnapshotRunner {
    pub fn new(update_mode: bool, test_filter: Option<String>) -> Self {
        Self {
            update_mode,
            test_filter,
        }
    }

    /// Discover all snapshot tests in the tests/snapshots directory
    pub fn discover_tests(&self) -> Result<Vec<SnapshotTest>> {
        let snapshots_dir = Path::new("tests/snapshots");
        let mut tests = Vec::new();

        Self::discover_tests_recursive(snapshots_dir, &mut tests)?;

        tests.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tests)
    }

    /// Filter tests based on the TEST_FILTER environment variable
    /// Supports patterns like:
    /// - "block_operations" (matches all tests starting with this)
    /// - "block_operations::delete_key" (exact match)
    /// - "flow_operations,errors" (multiple patterns separated by commas)
    fn filter_tests(&self, tests: Vec<SnapshotTest>) -> Vec<SnapshotTest> {
        let Some(filter) = &self.test_filter else {
            return tests;
        };
        let patterns: Vec<&str> = filter.split(',').map(|s| s.trim()).collect();

        tests
            .into_iter()
            .filter(|test| {
                patterns.iter().any(|pattern| {
                    if pattern.is_empty() {
                        false
                    } else if pattern.contains("::") {
                        test.name == *pattern
                    } else {
                        test.name.starts_with(pattern)
                    }
                })
            })
            .collect()
    }

    fn discover_tests_recursive(dir: &Path, tests: &mut Vec<SnapshotTest>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            let args_path = path.join("args.json");
            if !args_path.exists() {
                Self::discover_tests_recursive(&path, tests)?;
                continue;
            }

            let name = path
                .strip_prefix("tests/snapshots")
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('/', "::");

            tests.push(SnapshotTest {
                name,
                input_path: path.join("input.yaml"),
                args_path,
                output_path: path.join("output.yaml"),
                error_path: path.join("error.txt"),
            });
        }

        Ok(())
    }

    /// Run a single snapshot test
    pub fn run_test(&self, test: SnapshotTest) -> SnapshotResult {
        let outcome = match self.execute_test(&test) {
            Ok(outcome) => outcome,
            Err(e) => {
                return SnapshotResult {
                    test,
                    actual: None,
                    expected: None,
                    error: Some(format!("{e:#}")),
                    matches: false,
                };
            }
        };

        if self.update_mode {
            self.update_snapshot(outcome, test)
        } else {
            self.compare_snapshot(outcome, test)
        }
    }

    fn update_snapshot(&self, outcome: Outcome, test: SnapshotTest) -> SnapshotResult {
        let (write, stale) = match &outcome {
            Outcome::Output(_) => (&test.output_path, &test.error_path),
            Outcome::Error(_) => (&test.error_path, &test.output_path),
        };

        let error = fs::write(write, outcome.text())
            .map_err(|e| format!("Failed to write expected {}: {e}", outcome.label()))
            .and_then(|()| match stale.try_exists() {
                Ok(true) => fs::remove_file(stale)
                    .map_err(|e| format!("Unable to delete stale {}: {e}", stale.display())),
                _ => Ok(()),
            })
            .err();

        SnapshotResult {
            matches: error.is_none(),
            test,
            actual: Some(outcome),
            expected: None,
            error,
        }
    }

    fn compare_snapshot(&self, outcome: Outcome, test: SnapshotTest) -> SnapshotResult {
        let expected = fs::read_to_string(&test.output_path)
            .map(Outcome::Output)
            .or_else(|_| fs::read_to_string(&test.error_path).map(Outcome::Error))
            .ok();

        let error = expected.is_none().then(|| {
            "Neither output.yaml nor error.txt found. Run with UPDATE_SNAPSHOTS=1 to create one."
                .to_string()
        });

        // rendered documents must match byte for byte; error text may differ in trailing space
        let matches = match (&outcome, &expected) {
            (Outcome::Output(actual), Some(Outcome::Output(expected))) => actual == expected,
            (Outcome::Error(actual), Some(Outcome::Error(expected))) => {
                actual.trim() == expected.trim()
            }
            _ => false,
        };

        SnapshotResult {
            test,
            actual: Some(outcome),
            expected,
            error,
            matches,
        }
    }

    /// Load the input, queue every operation in args.json and render
    fn execute_test(&self, test: &SnapshotTest) -> Result<Outcome> {
        let input = fs::read_to_string(&test.input_path)
            .map_err(|e| anyhow!("reading {}: {e}", test.input_path.display()))?;
        let args = fs::read_to_string(&test.args_path)?;
        let operations: Vec<EditOperation> = serde_json::from_str(&args)
            .map_err(|e| anyhow!("args.json must be an array of edit operations: {e}"))?;

        let mut editor = match Editor::new(input) {
            Ok(editor) => editor,
            Err(e) => return Ok(Outcome::Error(e.to_string())),
        };
        for operation in operations {
            editor.enqueue(operation);
        }

        Ok(match editor.render() {
            Ok(output) => Outcome::Output(output),
            Err(e) => Outcome::Error(e.to_string()),
        })
    }

    /// Run all discovered tests (filtered if TEST_FILTER is set)
    pub fn run_all_tests(&self) -> Result<Vec<SnapshotResult>> {
        let all_tests = self.discover_tests()?;
        let tests = self.filter_tests(all_tests);
        assert_ne!(tests.len(), 0);

        if let Some(filter) = &self.test_filter {
            println!("🔍 Running filtered tests: {filter}");
            println!("   Found {} matching test(s)", tests.len());
        }

        Ok(tests.into_iter().map(|test| self.run_test(test)).collect())
    }

    /// Print a summary of test results
    pub fn print_summary(&self, results: &[SnapshotResult]) {
        let total = results.len();
        let passed = results.iter().filter(|r| r.matches).count();
        let failed = total - passed;

        let mut diff_options = DiffOptions::new();
        diff_options.set_original_filename("expected");
        diff_options.set_modified_filename("actual");
        let f = PatchFormatter::new()
            .with_color()
            .missing_newline_message(false);

        println!("\n===📊 Snapshot Test Summary===");
        println!("  Total:  {total}");
        println!("  Passed: {passed}");
        println!("  Failed: {failed}");

        if self.update_mode {
            println!("  Mode:   UPDATE (expected outputs written)");
        } else {
            println!("  Mode:   VERIFY");
        }

        if let Some(filter) = &self.test_filter {
            println!("  Filter: {filter}");
        }

        if passed > 0 {
            println!("\n✅ Passed tests:");
            for result in results.iter().filter(|r| r.matches) {
                println!("  • {}", result.test.name);
            }
        }

        if failed == 0 {
            return;
        }

        println!("\n❌ Failed tests:");
        for result in results.iter().filter(|r| !r.matches) {
            println!("  • {}", result.test.name);
        }

        println!("\n\n=== Failed tests details ===\n");

        for result in results.iter().filter(|r| !r.matches) {
            println!("❌ {}", result.test.name);
            println!(
                "To target just this test, run `TEST_FILTER={} cargo test`",
                result.test.name
            );
            println!(
                "To update snapshot for just this test, run `UPDATE_SNAPSHOTS=1 TEST_FILTER={} cargo test`",
                result.test.name
            );

            if let Some(error) = &result.error {
                println!("Error:\n{error}");
            } else if let (Some(actual), Some(expected)) = (&result.actual, &result.expected) {
                if actual.label() != expected.label() {
                    println!(
                        "Expected {} but the edit produced {}",
                        expected.label(),
                        actual.label()
                    );
                }
                let patch = diff_options.create_patch(expected.text(), actual.text());
                println!("\n***{} DIFF***\n\n{}", actual.label().to_uppercase(), f.fmt_patch(&patch));
            }

            println!("\n\n");
        }
    }
}
