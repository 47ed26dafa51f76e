//! Resolution of a referenced component name to the files implementing it

use std::path::PathBuf;

use tracing::debug;

use super::files::{ComponentContext, TapestryFile, find_file_case_insensitive};
use super::ProjectModel;

/// Sub-packages searched below an application or library root package, in order.
const COMPONENT_PACKAGES: [&str; 3] = ["components", "pages", "mixins"];

/// Prefix of the built-in Tapestry component library, which ships in a jar.
const CORE_LIBRARY_PREFIX: &str = "core";

const SIBLING_EXTENSIONS: [&str; 5] = ["tml", "properties", "js", "css", "less"];

impl ProjectModel {
    /// Resolves a component reference such as `layout`, `layout/header`,
    /// `widgets.datePicker` or `widgets/datePicker`.
    ///
    /// A leading segment naming a library mapping prefix selects that library;
    /// an unmapped `core` prefix resolves to nothing. Everything else is looked
    /// up in the application package.
    pub fn resolve_component(&self, name: &str) -> Option<ComponentContext> {
        let segments: Vec<&str> = name
            .split(['/', '.'])
            .filter(|segment| !segment.is_empty())
            .collect();
        if segments.is_empty() {
            return None;
        }

        if segments.len() > 1 {
            if let Some(mapping) = self
                .library_mappings
                .iter()
                .find(|mapping| mapping.prefix.eq_ignore_ascii_case(segments[0]))
            {
                debug!("Resolving {} in library {}", name, mapping.root_package);
                return self.resolve_in_root_package(name, &mapping.root_package, &segments[1..]);
            }
            if segments[0].eq_ignore_ascii_case(CORE_LIBRARY_PREFIX) {
                debug!("{} names the core library, which is not in the workspace", name);
                return None;
            }
        }

        self.resolve_in_root_package(name, &self.app_package, &segments)
    }

    fn resolve_in_root_package(
        &self,
        name: &str,
        root_package: &str,
        segments: &[&str],
    ) -> Option<ComponentContext> {
        COMPONENT_PACKAGES.iter().find_map(|sub_package| {
            let files = self.find_component_files(root_package, sub_package, segments);
            if files.is_empty() {
                None
            } else {
                Some(ComponentContext::new(name, files))
            }
        })
    }

    fn find_component_files(
        &self,
        root_package: &str,
        sub_package: &str,
        segments: &[&str],
    ) -> Vec<TapestryFile> {
        let relative = format!(
            "{}/{}/{}",
            root_package.replace('.', "/"),
            sub_package,
            segments.join("/")
        );

        let mut paths: Vec<PathBuf> = Vec::new();
        for root in &self.java_roots {
            paths.extend(find_file_case_insensitive(root, &format!("{}.java", relative)));
        }
        for root in self.java_roots.iter().chain(&self.resource_roots) {
            for extension in SIBLING_EXTENSIONS {
                paths.extend(find_file_case_insensitive(root, &format!("{}.{}", relative, extension)));
            }
        }
        if sub_package == "pages" {
            if let Some(web_root) = &self.web_root {
                paths.extend(find_file_case_insensitive(web_root, &format!("{}.tml", segments.join("/"))));
            }
        }

        paths.into_iter().map(TapestryFile::new).collect()
    }
}
