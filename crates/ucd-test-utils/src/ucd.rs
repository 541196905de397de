//! Realistic UCD file contents.
//!
//! Real UCD data files open with a release header naming the file, its date
//! and the copyright notice. Tests that care about content hashing need that
//! header to look right.

use ucd_fs::MemoryBackend;

/// Version used by the canned fixtures.
pub const SAMPLE_VERSION: &str = "16.0.0";

/// The release header of `file_name` (`Blocks.txt`) in `version`.
pub fn header(file_name: &str, version: &str, date: &str) -> String {
    let stem = file_name.strip_suffix(".txt").unwrap_or(file_name);
    format!(
        "# {stem}-{version}.txt\n\
         # Date: {date}\n\
         # © 2024 Unicode®, Inc.\n\
         # Unicode and the Unicode Logo are registered trademarks of Unicode, Inc. in the U.S. and other countries.\n\
         # For terms of use and license, see https://www.unicode.org/terms_of_use.html\n\
         #\n"
    )
}

/// A complete data file: release header followed by `body`.
pub fn ucd_file(file_name: &str, version: &str, body: &str) -> String {
    format!("{}{body}", header(file_name, version, "2024-02-02"))
}

/// Version-relative paths and contents of a small release.
pub fn sample_files(version: &str) -> Vec<(&'static str, String)> {
    vec![
        (
            "A.txt",
            ucd_file("A.txt", version, "0041;LATIN CAPITAL LETTER A;Lu\n"),
        ),
        (
            "B.txt",
            ucd_file("B.txt", version, "0042;LATIN CAPITAL LETTER B;Lu\n"),
        ),
        (
            "nested/C.txt",
            ucd_file("C.txt", version, "0043;LATIN CAPITAL LETTER C;Lu\n"),
        ),
    ]
}

/// A memory backend holding `files` under `<version>/`.
pub fn seeded_backend(version: &str, files: &[(&str, &str)]) -> MemoryBackend {
    files.iter().fold(MemoryBackend::new(), |backend, (path, content)| {
        backend.with_file(&format!("{version}/{path}"), content)
    })
}
