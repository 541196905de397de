use proptest::prelude::*;
use ucd_fs::{Error, is_within_base, resolve_safe_path};

const BASE: &str = "/srv/ucd";

proptest! {
    #[test]
    fn resolved_paths_never_leave_the_base(s in "\\PC*") {
        if let Ok(resolved) = resolve_safe_path(BASE, &s) {
            // Invariant 1: stays under the base
            prop_assert!(is_within_base(BASE, &resolved));

            // Invariant 2: fully normalized
            prop_assert!(!resolved.contains('\\'));
            prop_assert!(!resolved.contains("//"));
            prop_assert!(!resolved.split('/').any(|seg| seg == ".." || seg == "."));
        }
    }

    #[test]
    fn control_characters_always_fail(prefix in "[a-z/]{0,8}", c in 0u8..0x20, suffix in "[a-z/]{0,8}") {
        let input = format!("{prefix}{}{suffix}", c as char);
        prop_assert!(
            matches!(
                resolve_safe_path(BASE, &input),
                Err(Error::IllegalCharacterInPath { .. })
            ),
            "input {:?} was accepted",
            input
        );
    }

    #[test]
    fn percent_encoded_control_characters_always_fail(c in 0u8..0x20) {
        let input = format!("x%{c:02X}y");
        prop_assert!(
            matches!(
                resolve_safe_path(BASE, &input),
                Err(Error::IllegalCharacterInPath { .. })
            ),
            "encoded input {:?} was accepted",
            input
        );
    }

    #[test]
    fn excess_parent_segments_always_fail(depth in 0usize..20, extra in 1usize..50) {
        let input = format!("{}{}", "d/".repeat(depth), "../".repeat(depth + extra));
        prop_assert!(
            matches!(
                resolve_safe_path(BASE, &input),
                Err(Error::PathTraversal { .. })
            ),
            "input {:?} escaped",
            input
        );
    }

    #[test]
    fn resolution_is_idempotent(s in "[a-zA-Z0-9_./-]{0,40}") {
        if let Ok(first) = resolve_safe_path(BASE, &s) {
            let second = resolve_safe_path(BASE, &first).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
