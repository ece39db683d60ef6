//! File-name sanitizing and collision-free output path derivation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::spec::{SpecFileNamePolicy, TUP_FILE_NAME_ILLEGAL};

static RE_FILE_NAME_ILLEGAL: LazyLock<Regex> = LazyLock::new(|| {
    let c_class: String = TUP_FILE_NAME_ILLEGAL
        .iter()
        .map(|chr| regex::escape(&chr.to_string()))
        .collect();
    Regex::new(&format!("[{c_class}]")).expect("illegal file-name class must compile")
});

/// Convert an arbitrary grouping-key text into a filesystem-safe file stem.
///
/// Steps: trim surrounding whitespace, replace each illegal character with
/// `policy.replace_to`, fall back to `policy.placeholder_empty` when nothing
/// is left, then cut to `policy.len_stem_max` characters.
///
/// The cut counts characters, not bytes: 150 CJK characters take 450 UTF-8
/// bytes and exceed the 255-byte name limit of ext4 and APFS, so lower
/// `len_stem_max` when outputs land on such filesystems.
pub fn sanitize_file_name(key: &str, policy: &SpecFileNamePolicy) -> String {
    let c_trimmed = key.trim();
    let c_stem = RE_FILE_NAME_ILLEGAL.replace_all(c_trimmed, policy.replace_to.as_str());
    let c_stem = if c_stem.is_empty() {
        policy.placeholder_empty.as_str()
    } else {
        c_stem.as_ref()
    };

    c_stem.chars().take(policy.len_stem_max).collect()
}

/// Case-folded file name of `path`, the key used for reserved outputs.
///
/// Windows and macOS treat `Beijing.xlsx` and `beijing.xlsx` as the same file.
pub fn derive_reserved_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Resolve `dir/stem.ext` to a path that is neither on disk nor reserved.
///
/// Tries `stem.ext`, then `stem_1.ext`, `stem_2.ext`, ... in order. A
/// candidate whose [`derive_reserved_key`] is in `set_names_reserved` counts
/// as occupied, which covers outputs planned in the current run but not yet
/// flushed. No locking: callers own `dir`.
pub fn derive_unique_path(
    dir: &Path,
    stem: &str,
    extension: &str,
    set_names_reserved: &HashSet<String>,
) -> PathBuf {
    let is_occupied = |path: &Path| -> bool {
        set_names_reserved.contains(&derive_reserved_key(path)) || path.exists()
    };

    let path_candidate = dir.join(format!("{stem}.{extension}"));
    if !is_occupied(&path_candidate) {
        return path_candidate;
    }

    let mut n_idx = 1usize;
    loop {
        let path_alt = dir.join(format!("{stem}_{n_idx}.{extension}"));
        if !is_occupied(&path_alt) {
            return path_alt;
        }
        n_idx += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name_replaces_every_illegal_char() {
        let policy = SpecFileNamePolicy::default();
        let c_name = sanitize_file_name(r#"a\b/c:d*e?f"g<h>i|j"#, &policy);

        assert_eq!(c_name, "a_b_c_d_e_f_g_h_i_j");
        assert!(!c_name.contains(TUP_FILE_NAME_ILLEGAL));
    }

    #[test]
    fn test_sanitize_file_name_placeholder_for_blank_keys() {
        let policy = SpecFileNamePolicy::default();

        assert_eq!(sanitize_file_name("", &policy), "空值");
        assert_eq!(sanitize_file_name("   \t ", &policy), "空值");
        assert_eq!(sanitize_file_name("  北京  ", &policy), "北京");
    }

    #[test]
    fn test_sanitize_file_name_truncates_by_chars() {
        let policy = SpecFileNamePolicy::default();
        let c_key = "城".repeat(200);

        let c_name = sanitize_file_name(&c_key, &policy);
        assert_eq!(c_name.chars().count(), 150);
        assert_eq!(c_name.len(), 450);
    }

    #[test]
    fn test_derive_unique_path_tries_suffixes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path();

        let mut set_reserved = HashSet::new();
        let path_first = derive_unique_path(dir, "a_b", "xlsx", &set_reserved);
        assert_eq!(path_first, dir.join("a_b.xlsx"));
        set_reserved.insert(derive_reserved_key(&path_first));

        let path_second = derive_unique_path(dir, "a_b", "xlsx", &set_reserved);
        assert_eq!(path_second, dir.join("a_b_1.xlsx"));

        std::fs::write(dir.join("a_b_2.xlsx"), b"x").expect("write");
        set_reserved.insert(derive_reserved_key(&path_second));
        assert_eq!(
            derive_unique_path(dir, "a_b", "xlsx", &set_reserved),
            dir.join("a_b_3.xlsx")
        );
    }

    #[test]
    fn test_derive_unique_path_reserves_case_insensitively() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path();

        let mut set_reserved = HashSet::new();
        set_reserved.insert(derive_reserved_key(&dir.join("Beijing.xlsx")));

        assert_eq!(
            derive_unique_path(dir, "beijing", "xlsx", &set_reserved),
            dir.join("beijing_1.xlsx")
        );
        assert_eq!(
            derive_unique_path(dir, "Shanghai", "xlsx", &set_reserved),
            dir.join("Shanghai.xlsx")
        );
    }
}
