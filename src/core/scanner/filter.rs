//! Extension filtering for the file enumerator.
//!
//! Patterns are matched against the file extension case-insensitively and
//! may use `?` (any one character) and `*` (any run of characters), so
//! `cr?` matches both `.cr2` and `.cr3`.

use std::path::Path;

/// Decides which files the enumerator yields
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    /// Lowercased extension patterns; empty accepts every extension
    patterns: Vec<String>,
    include_hidden: bool,
}

impl ExtensionFilter {
    /// Accept every file
    pub fn any() -> Self {
        Self {
            patterns: Vec::new(),
            include_hidden: false,
        }
    }

    /// Accept files whose extension matches one of `patterns`.
    ///
    /// Leading `.` and `*` are stripped, so `*.jpg`, `.jpg` and `jpg` are
    /// equivalent; a bare `*` accepts everything.
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| normalize_pattern(p.as_ref()))
            .collect();

        if patterns.iter().any(|p| p.is_empty() || p == "*") {
            patterns.clear();
        }

        Self {
            patterns,
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Whether this filter accepts every extension
    pub fn accepts_all(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }

        if self.accepts_all() {
            return true;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.patterns.iter().any(|p| wildcard_match(p, &ext))
            }
            None => false,
        }
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::any()
    }
}

/// Strip leading `.`/`*` noise and lowercase
pub fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim();
    let stripped = trimmed.trim_start_matches(['.', '*']);
    if stripped.is_empty() && trimmed.contains('*') {
        return "*".to_string();
    }
    stripped.to_lowercase()
}

/// Glob match supporting `?` and `*`
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((star_pi, star_ti)) = star {
            pi = star_pi + 1;
            ti = star_ti + 1;
            star = Some((star_pi, star_ti + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|c| *c == '*')
}
