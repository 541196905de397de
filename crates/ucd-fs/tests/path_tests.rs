use rstest::rstest;
use ucd_fs::path::relative_to;
use ucd_fs::{is_within_base, resolve_safe_path};

const BASE: &str = "/srv/ucd";

#[rstest]
#[case("UnicodeData.txt", "/srv/ucd/UnicodeData.txt")]
#[case("16.0.0/ucd/Blocks.txt", "/srv/ucd/16.0.0/ucd/Blocks.txt")]
#[case("foo\\bar\\baz", "/srv/ucd/foo/bar/baz")]
#[case("foo/bar\\baz", "/srv/ucd/foo/bar/baz")]
#[case("subdir/../file.txt", "/srv/ucd/file.txt")]
#[case("./a/./b", "/srv/ucd/a/b")]
#[case("a//b///c", "/srv/ucd/a/b/c")]
#[case("a/..", "/srv/ucd")]
#[case("file%20name.txt", "/srv/ucd/file name.txt")]
fn resolves_relative_paths(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(resolve_safe_path(BASE, input).unwrap(), expected);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\u{3000}")]
#[case("/")]
#[case(".")]
fn empty_like_input_is_the_base(#[case] input: &str) {
    assert_eq!(resolve_safe_path(BASE, input).unwrap(), BASE);
}

#[rstest]
// Already inside the base
#[case("/srv/ucd/16.0.0/A.txt", "/srv/ucd/16.0.0/A.txt")]
// Absolute paths elsewhere are folded into the root
#[case("/etc/passwd", "/srv/ucd/etc/passwd")]
#[case("//evil.example/share/x", "/srv/ucd/evil.example/share/x")]
#[case("C:\\Windows\\win.ini", "/srv/ucd/Windows/win.ini")]
#[case("@evil.example/file", "/srv/ucd/evil.example/file")]
#[case(":8080/file", "/srv/ucd/8080/file")]
#[case("%2Fetc%2Fpasswd", "/srv/ucd/etc/passwd")]
#[case("/srv/ucdx/file", "/srv/ucd/srv/ucdx/file")]
fn folds_absolute_looking_prefixes(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(resolve_safe_path(BASE, input).unwrap(), expected);
}

#[test]
fn trailing_slash_on_base_is_ignored() {
    assert_eq!(
        resolve_safe_path("/srv/ucd/", "A.txt").unwrap(),
        "/srv/ucd/A.txt"
    );
}

#[test]
fn root_base_resolves_to_absolute_paths() {
    assert_eq!(resolve_safe_path("/", "a/b").unwrap(), "/a/b");
    assert_eq!(resolve_safe_path("/", "/a/b").unwrap(), "/a/b");
    assert_eq!(resolve_safe_path("/", "").unwrap(), "/");
}

#[test]
fn windows_style_base() {
    assert_eq!(
        resolve_safe_path("C:\\ucd", "16.0.0\\A.txt").unwrap(),
        "C:/ucd/16.0.0/A.txt"
    );
}

#[test]
fn within_base_checks_segment_boundaries() {
    assert!(is_within_base(BASE, "/srv/ucd"));
    assert!(is_within_base(BASE, "/srv/ucd/a"));
    assert!(!is_within_base(BASE, "/srv/ucdx"));
    assert!(!is_within_base(BASE, "/srv"));
    assert!(is_within_base("/", "/anything"));
}

#[test]
fn relative_to_round_trips_resolved_paths() {
    let resolved = resolve_safe_path(BASE, "nested/C.txt").unwrap();
    assert_eq!(relative_to(BASE, &resolved).as_deref(), Some("nested/C.txt"));
}

#[test]
fn resolution_is_deterministic() {
    let a = resolve_safe_path(BASE, "x/./y/../z").unwrap();
    let b = resolve_safe_path(BASE, "x/./y/../z").unwrap();
    assert_eq!(a, b);
}
