//! The canonical single-file scenarios.

use super::{bindings_only, obfuscate_with, project_with, read};
use pyscramble::driver::FileState;
use pyscramble::rename::{LexicalRenamer, Project, RenameError, RenameRequest, RenameService};
use std::cell::RefCell;
use std::path::Path;

/// Records every resolved rename request before delegating.
#[derive(Default)]
struct RecordingRenamer {
    inner: LexicalRenamer,
    requested: RefCell<Vec<String>>,
}

impl RenameService for RecordingRenamer {
    fn prepare_rename(
        &self,
        project: &Project,
        file: &Path,
        offset: Option<usize>,
    ) -> Result<RenameRequest, RenameError> {
        let request = self.inner.prepare_rename(project, file, offset)?;
        self.requested.borrow_mut().push(request.old_name.clone());
        Ok(request)
    }
}

#[test]
fn function_and_parameter() {
    let dir = project_with(&[("m.py", "def foo(x): return x + 1\n")]);
    let report = obfuscate_with(dir.path(), &LexicalRenamer::default(), bindings_only());

    assert_eq!(read(dir.path(), "m.py"), "def b(a): return a + 1\n");
    let renames: Vec<(&str, &str)> = report.files[0]
        .renames
        .iter()
        .map(|r| (r.old.as_str(), r.new.as_str()))
        .collect();
    assert_eq!(renames, [("x", "a"), ("foo", "b")]);
}

#[test]
fn repeated_name_gets_one_rename_request() {
    let source = "def first(x):\n    return x\n\n\ndef second(x):\n    return x * 2\n";
    let dir = project_with(&[("m.py", source)]);
    let renamer = RecordingRenamer::default();
    obfuscate_with(dir.path(), &renamer, bindings_only());

    let requested = renamer.requested.borrow();
    assert_eq!(requested.iter().filter(|n| *n == "x").count(), 1);
    assert_eq!(
        read(dir.path(), "m.py"),
        "def b(a):\n    return a\n\n\ndef c(a):\n    return a * 2\n"
    );
}

#[test]
fn lambdas_and_comprehensions_are_not_fatal() {
    let source =
        "square = lambda value: value * value\nevens = [n for n in range(10) if n % 2 == 0]\n";
    let dir = project_with(&[("m.py", source)]);
    let report = obfuscate_with(dir.path(), &LexicalRenamer::default(), bindings_only());

    assert_eq!(report.files[0].state, FileState::Done);
    assert_eq!(
        read(dir.path(), "m.py"),
        "a = lambda value: value * value\nb = [n for n in range(10) if n % 2 == 0]\n"
    );
}

#[test]
fn zero_renames_leave_file_identical() {
    let source = "print('hello')  # nothing bound here\n";
    let dir = project_with(&[("m.py", source)]);
    let report = obfuscate_with(dir.path(), &LexicalRenamer::default(), bindings_only());

    assert_eq!(report.renames(), 0);
    assert_eq!(read(dir.path(), "m.py"), source);
}

#[test]
fn each_rename_replaces_the_targeted_occurrence() {
    let source = "total = 0\nfor item in range(3):\n    total = total + item\n";
    let dir = project_with(&[("m.py", source)]);
    let report = obfuscate_with(dir.path(), &LexicalRenamer::default(), bindings_only());

    let result = read(dir.path(), "m.py");
    for rename in &report.files[0].renames {
        assert!(!result.contains(&rename.old));
        assert!(result.contains(&rename.new));
    }
    assert_eq!(result, "a = 0\nfor b in range(3):\n    a = a + b\n");
}

#[test]
fn names_shared_with_foreign_members_are_left_alone() {
    let source = r#"import os


def save(path, items):
    for key, value in items.items():
        print(key, value)
    return os.path.join(path, 'x')
"#;
    let dir = project_with(&[("m.py", source)]);
    let report = obfuscate_with(dir.path(), &LexicalRenamer::default(), bindings_only());

    let result = read(dir.path(), "m.py");
    assert!(result.contains("os.path.join(path, 'x')"));
    assert!(result.contains("items.items()"));
    assert_eq!(
        result,
        r#"import os


def e(path, items):
    for a, b in items.items():
        print(a, b)
    return os.path.join(path, 'x')
"#
    );

    let skipped: Vec<&str> = report.files[0].skips.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(skipped, ["path", "items"]);
    assert!(report.files[0].skips[0].reason.contains("attribute"));
    assert_eq!(report.files[0].state, FileState::Done);
}
