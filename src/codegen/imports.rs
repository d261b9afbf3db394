use std::collections::BTreeSet;

/// Collects and renders Dart import directives.
///
/// Sorted for deterministic output and grouped the way `dart format` users
/// expect: `dart:` libraries, then `package:` libraries, then relative paths.
#[derive(Debug, Default)]
pub struct ImportCollector {
    imports: BTreeSet<String>,
}

impl ImportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an import: `import '{uri}';`.
    pub fn add(&mut self, uri: &str) {
        self.imports.insert(uri.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Render all import directives, one blank line between groups.
    pub fn render(&self) -> String {
        let mut dart = Vec::new();
        let mut package = Vec::new();
        let mut relative = Vec::new();

        for uri in &self.imports {
            let line = format!("import '{uri}';");
            if uri.starts_with("dart:") {
                dart.push(line);
            } else if uri.starts_with("package:") {
                package.push(line);
            } else {
                relative.push(line);
            }
        }

        [dart, package, relative]
            .into_iter()
            .filter(|group| !group.is_empty())
            .map(|group| group.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
