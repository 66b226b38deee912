//! Jump-to-definition over a small on-disk workspace.

use bzlnav_config::DefinitionConfig;
use bzlnav_core::{
    BufferSnapshot, BuildFileFinder, Cursor, DefinitionError, DefinitionFinder,
    DefinitionLocation, WorkspaceLocator,
};
use bzlnav_test_utils::TestWorkspace;
use pretty_assertions::assert_eq;

const PKG_BUILD: &str = r#"load("//tools:defs.bzl", "my_macro", cc = "custom_cc")

cc_library(
    name = "foolib",
    srcs = ["foo.cc"],
    deps = [":util", "//lib:core", "@abseil//absl:strings"],
)

cc_library(
    name = "util",
)

my_macro(name = "gen")

LOCAL = 1
x = LOCAL
"#;

const DEFS_BZL: &str = r#""""Helpers."""

def my_macro(name):
    pass

custom_cc = rule()
"#;

fn workspace() -> TestWorkspace {
    let ws = TestWorkspace::new();
    ws.write("pkg/BUILD", PKG_BUILD);
    ws.write("pkg/foo.cc", "int main() {}\n");
    ws.write("tools/BUILD", "");
    ws.write("tools/defs.bzl", DEFS_BZL);
    ws.write("lib/BUILD.bazel", "filegroup(\n    name = \"core\",\n)\n");
    ws
}

fn finder() -> BuildFileFinder {
    BuildFileFinder::from_config(WorkspaceLocator::default(), &DefinitionConfig::default())
}

async fn lookup(ws: &TestWorkspace, needle: &str) -> Option<DefinitionLocation> {
    let snapshot = ws.snapshot_at("pkg/BUILD", needle).await;
    finder().find_definition(&snapshot).await.unwrap()
}

#[tokio::test]
async fn test_relative_label_jumps_to_rule() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "\":util\"").await,
        Some(DefinitionLocation::new(ws.path("pkg/BUILD"), 9))
    );
}

#[tokio::test]
async fn test_absolute_label_in_other_package() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "//lib:core").await,
        Some(DefinitionLocation::new(ws.path("lib/BUILD.bazel"), 1))
    );
}

#[tokio::test]
async fn test_file_target_jumps_to_file() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "\"foo.cc\"").await,
        Some(DefinitionLocation::new(ws.path("pkg/foo.cc"), 1))
    );
}

#[tokio::test]
async fn test_name_attribute_points_at_its_own_rule() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "\"foolib\"").await,
        Some(DefinitionLocation::new(ws.path("pkg/BUILD"), 3))
    );
}

#[tokio::test]
async fn test_external_repository_is_not_found() {
    let ws = workspace();
    assert_eq!(lookup(&ws, "@abseil").await, None);
}

#[tokio::test]
async fn test_load_module_opens_bzl_file() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "//tools:defs.bzl").await,
        Some(DefinitionLocation::new(ws.path("tools/defs.bzl"), 1))
    );
}

#[tokio::test]
async fn test_loaded_symbol_jumps_to_def() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "\"my_macro\"").await,
        Some(DefinitionLocation::new(ws.path("tools/defs.bzl"), 3))
    );
}

#[tokio::test]
async fn test_load_alias_follows_exported_name() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "cc = ").await,
        Some(DefinitionLocation::new(ws.path("tools/defs.bzl"), 6))
    );
}

#[tokio::test]
async fn test_identifier_resolved_through_load() {
    let ws = workspace();
    assert_eq!(
        lookup(&ws, "my_macro(name").await,
        Some(DefinitionLocation::new(ws.path("tools/defs.bzl"), 3))
    );
}

#[tokio::test]
async fn test_identifier_defined_in_buffer() {
    let ws = workspace();
    let snapshot = ws.snapshot("pkg/BUILD", 16, 4).await;
    assert_eq!(
        finder().find_definition(&snapshot).await.unwrap(),
        Some(DefinitionLocation::new(ws.path("pkg/BUILD"), 15))
    );
}

#[tokio::test]
async fn test_unknown_identifier_and_whitespace() {
    let ws = workspace();
    assert_eq!(lookup(&ws, "cc_library").await, None);

    let blank = ws.snapshot("pkg/BUILD", 2, 0).await;
    assert_eq!(finder().find_definition(&blank).await.unwrap(), None);
}

#[tokio::test]
async fn test_missing_loaded_file_is_not_found() {
    let ws = TestWorkspace::new();
    ws.write("pkg/BUILD", "load(\"//nowhere:x.bzl\", \"thing\")\n");
    let snapshot = ws.snapshot_at("pkg/BUILD", "\"thing\"").await;
    assert_eq!(finder().find_definition(&snapshot).await.unwrap(), None);
}

#[tokio::test]
async fn test_build_file_names_are_tried_in_order() {
    let ws = TestWorkspace::new();
    ws.write("a/BUILD.bazel", "genrule(\n    name = \"gen\",\n)\n");
    ws.write("a/BUILD", "\n\ngenrule(name = \"gen\")\n");
    ws.write("b/BUILD", "x = \"//a:gen\"\n");
    let snapshot = ws.snapshot_at("b/BUILD", "//a:gen").await;

    let preferred = finder().find_definition(&snapshot).await.unwrap();
    assert_eq!(preferred, Some(DefinitionLocation::new(ws.path("a/BUILD.bazel"), 1)));

    let plain = BuildFileFinder::new(WorkspaceLocator::default(), vec!["BUILD".into()]);
    assert_eq!(
        plain.find_definition(&snapshot).await.unwrap(),
        Some(DefinitionLocation::new(ws.path("a/BUILD"), 3))
    );
}

#[tokio::test]
async fn test_bzl_below_package_resolves_against_enclosing_package() {
    let ws = TestWorkspace::new();
    ws.write("pkg/BUILD", "filegroup(\n    name = \"data\",\n)\n");
    ws.write("pkg/other.bzl", "\"\"\"Other.\"\"\"\ndef helper():\n    pass\n");
    ws.write(
        "pkg/sub/defs.bzl",
        "load(\":other.bzl\", \"helper\")\n\nDATA = \":data\"\n",
    );

    let snapshot = ws.snapshot_at("pkg/sub/defs.bzl", "\"helper\"").await;
    assert_eq!(
        finder().find_definition(&snapshot).await.unwrap(),
        Some(DefinitionLocation::new(ws.path("pkg/other.bzl"), 2))
    );

    let snapshot = ws.snapshot_at("pkg/sub/defs.bzl", "\":data\"").await;
    assert_eq!(
        finder().find_definition(&snapshot).await.unwrap(),
        Some(DefinitionLocation::new(ws.path("pkg/BUILD"), 1))
    );
}

#[tokio::test]
async fn test_file_without_any_build_file_is_in_root_package() {
    let ws = TestWorkspace::new();
    ws.write("common.bzl", "def shared():\n    pass\n");
    ws.write("scripts/gen.bzl", "load(\":common.bzl\", \"shared\")\n");

    let snapshot = ws.snapshot("scripts/gen.bzl", 1, 6).await;
    assert_eq!(
        finder().find_definition(&snapshot).await.unwrap(),
        Some(DefinitionLocation::new(ws.path("common.bzl"), 1))
    );
}

#[test_log::test(tokio::test)]
async fn test_malformed_label_is_an_error() {
    let ws = TestWorkspace::new();
    let path = ws.write("pkg/BUILD", "deps = [\"//bad:\"]\n");
    let snapshot = BufferSnapshot::from_text(&path, "deps = [\"//bad:\"]", Cursor::new(1, 9));

    let err = finder().find_definition(&snapshot).await.unwrap_err();
    assert!(matches!(err, DefinitionError::MalformedLabel { .. }), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn test_unterminated_string_is_a_syntax_error() {
    let ws = TestWorkspace::new();
    let path = ws.path("pkg/BUILD");
    let snapshot = BufferSnapshot::from_text(&path, "srcs = [\"foo.cc],", Cursor::new(1, 10));

    let err = finder().find_definition(&snapshot).await.unwrap_err();
    assert!(matches!(err, DefinitionError::Syntax { row: 1, .. }), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn test_cursor_outside_buffer() {
    let ws = TestWorkspace::new();
    let snapshot = BufferSnapshot::from_text(ws.path("BUILD"), "x = 1", Cursor::new(5, 0));

    let err = finder().find_definition(&snapshot).await.unwrap_err();
    assert!(matches!(
        err,
        DefinitionError::CursorOutOfRange { row: 5, lines: 1 }
    ));
}

#[test_log::test(tokio::test)]
async fn test_outside_workspace() {
    let tmp = tempfile::TempDir::new().unwrap();
    let snapshot = BufferSnapshot::from_text(
        tmp.path().join("BUILD"),
        "deps = [\":a\"]",
        Cursor::new(1, 9),
    );
    let finder = BuildFileFinder::new(
        WorkspaceLocator::new(["bzlnav-test-no-such-marker"]),
        vec!["BUILD".into()],
    );

    let err = finder.find_definition(&snapshot).await.unwrap_err();
    assert!(matches!(err, DefinitionError::NotInWorkspace(_)), "{err:?}");
}
