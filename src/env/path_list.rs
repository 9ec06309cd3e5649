//! Search-path list rewriting
//!
//! [`PathListRewriter::rewrite`] produces the search path that should accompany a
//! new `JAVA_HOME`: the symbolic `bin` reference first, followed by every
//! unrelated segment in its original order. Segments that point into the old or
//! new JDK (by literal `bin` path or by substring) and any existing reference to
//! the home variable are dropped, so the result always contains exactly one home
//! reference and rewriting twice with the same home changes nothing.
//!
//! Comparisons ignore case, surrounding whitespace and quotes, and trailing
//! directory separators.

use super::PathFlavor;
use crate::constants::BIN_DIR;
use crate::utils::fs::path_key;
use tracing::debug;

/// Rewrites a search-path list around a home-directory variable.
#[derive(Debug, Clone)]
pub struct PathListRewriter {
    flavor: PathFlavor,
    home_var: String,
}

impl PathListRewriter {
    pub fn new(flavor: PathFlavor, home_var: impl Into<String>) -> Self {
        Self {
            flavor,
            home_var: home_var.into(),
        }
    }

    #[must_use]
    pub const fn flavor(&self) -> PathFlavor {
        self.flavor
    }

    /// The symbolic reference placed first, e.g. `%JAVA_HOME%\bin`.
    #[must_use]
    pub fn home_bin_reference(&self) -> String {
        self.flavor.bin_reference(&self.home_var)
    }

    /// Split a list into trimmed, non-blank segments.
    #[must_use]
    pub fn split(&self, list: &str) -> Vec<String> {
        list.split(self.flavor.list_separator())
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Rewrite `current` for a switch from `old_home` to `new_home`.
    #[must_use]
    pub fn rewrite(&self, current: &str, old_home: Option<&str>, new_home: &str) -> String {
        let homes: Vec<String> = [old_home, Some(new_home)]
            .into_iter()
            .flatten()
            .map(path_key)
            .filter(|home| !home.is_empty())
            .collect();

        let mut segments = vec![self.home_bin_reference()];
        for segment in self.split(current) {
            if self.is_home_entry(&segment, &homes) {
                debug!("Dropping search path entry '{segment}'");
                continue;
            }
            segments.push(segment);
        }

        segments.join(&self.flavor.list_separator().to_string())
    }

    /// Count segments that reach `home`'s `bin` directory, symbolically or literally.
    #[must_use]
    pub fn count_home_references(&self, list: &str, home: Option<&str>) -> usize {
        let home_bin = home
            .map(path_key)
            .filter(|home| !home.is_empty())
            .map(|home| path_key(&self.flavor.join(&home, BIN_DIR)));

        self.split(list)
            .iter()
            .map(|segment| path_key(segment))
            .filter(|segment| {
                self.is_variable_reference(segment) || home_bin.as_deref() == Some(segment.as_str())
            })
            .count()
    }

    fn is_home_entry(&self, segment: &str, homes: &[String]) -> bool {
        let key = path_key(segment);
        if self.is_variable_reference(&key) {
            return true;
        }
        homes.iter().any(|home| {
            let bin = path_key(&self.flavor.join(home, BIN_DIR));
            key == bin || key.contains(home.as_str())
        })
    }

    /// Whether a lowercased segment mentions the home variable in any syntax.
    fn is_variable_reference(&self, key: &str) -> bool {
        let var = self.home_var.to_lowercase();
        if key.contains(&format!("%{var}%")) || key.contains(&format!("${{{var}}}")) {
            return true;
        }

        let bare = format!("${var}");
        key.match_indices(&bare).any(|(index, _)| {
            key[index + bare.len()..]
                .chars()
                .next()
                .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows() -> PathListRewriter {
        PathListRewriter::new(PathFlavor::Windows, "JAVA_HOME")
    }

    fn posix() -> PathListRewriter {
        PathListRewriter::new(PathFlavor::Posix, "JAVA_HOME")
    }

    #[test]
    fn test_rewrite_replaces_literal_bin() {
        let rewriter = PathListRewriter::new(PathFlavor::Windows, "HOME");
        let result = rewriter.rewrite(r"C:\X\bin;OTHER", Some(r"C:\X"), r"C:\Y");
        assert_eq!(result, r"%HOME%\bin;OTHER");
    }

    #[test]
    fn test_rewrite_empty_list() {
        assert_eq!(windows().rewrite("", None, r"C:\jdk"), r"%JAVA_HOME%\bin");
        assert_eq!(posix().rewrite("", None, "/opt/jdk"), "$JAVA_HOME/bin");
    }

    #[test]
    fn test_rewrite_drops_existing_references_and_blanks() {
        let current = r" C:\Windows ;;%java_home%\bin; %JAVA_HOME%\BIN\ ;C:\Tools";
        let result = windows().rewrite(current, None, r"C:\jdk-21");
        assert_eq!(result, r"%JAVA_HOME%\bin;C:\Windows;C:\Tools");
    }

    #[test]
    fn test_rewrite_drops_entries_inside_old_home() {
        let current = r#"C:\Windows;"C:\Program Files\Java\jdk-17\bin\";C:\Program Files\Java\jdk-17\jre\bin"#;
        let result = windows().rewrite(current, Some(r"C:\Program Files\Java\jdk-17"), r"C:\jdk-21");
        assert_eq!(result, r"%JAVA_HOME%\bin;C:\Windows");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let rewriter = windows();
        let current = r"C:\Windows;C:\jdk-17\bin;C:\jdk-21\bin;C:\Tools";
        let once = rewriter.rewrite(current, Some(r"C:\jdk-17"), r"C:\jdk-21");
        let twice = rewriter.rewrite(&once, Some(r"C:\jdk-21"), r"C:\jdk-21");

        assert_eq!(once, twice);
        assert_eq!(once, r"%JAVA_HOME%\bin;C:\Windows;C:\Tools");
    }

    #[test]
    fn test_rewrite_posix_variable_syntaxes() {
        let current = "/usr/bin:$JAVA_HOME/bin:${JAVA_HOME}/bin:$JAVA_HOME_OLD/bin:/opt/jdk-17/bin";
        let result = posix().rewrite(current, Some("/opt/jdk-17"), "/opt/jdk-21");
        assert_eq!(result, "$JAVA_HOME/bin:/usr/bin:$JAVA_HOME_OLD/bin");
    }

    #[test]
    fn test_count_home_references() {
        let rewriter = windows();
        assert_eq!(rewriter.count_home_references(r"%JAVA_HOME%\bin;C:\x", None), 1);
        assert_eq!(
            rewriter.count_home_references(r"%JAVA_HOME%\bin;C:\jdk\bin\", Some(r"C:\jdk")),
            2
        );
        assert_eq!(rewriter.count_home_references(r"C:\Windows", Some(r"C:\jdk")), 0);
    }

    #[test]
    fn test_result_has_single_reference() {
        let rewriter = posix();
        let messy = "$JAVA_HOME/bin:/a:$JAVA_HOME/bin:/b:/opt/jdk/bin";
        let result = rewriter.rewrite(messy, Some("/opt/jdk"), "/opt/jdk");
        assert_eq!(rewriter.count_home_references(&result, Some("/opt/jdk")), 1);
        assert!(result.starts_with("$JAVA_HOME/bin"));
    }
}
