//! Discovery of the project layout, IoC modules and library mappings
//!
//! Java sources are read line-pattern style, not parsed: only `package`,
//! `import`, `@ImportModule`/`@SubModule` class literals and
//! `new LibraryMapping("prefix", "package")` expressions are recognised.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use super::files::find_file_case_insensitive;
use super::{DiscoveryConfig, LibraryMapping, ModuleReference, ProjectError, ProjectModel, TapestryModule};

const WEB_XML: &str = "src/main/webapp/WEB-INF/web.xml";
const DEFAULT_FILTER_NAME: &str = "app";

static APP_PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<param-name>\s*tapestry\.app-package\s*</param-name>\s*<param-value>\s*([\w.]+)\s*</param-value>",
    )
    .expect("invalid source pattern")
});

static TAPESTRY_FILTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<filter>\s*<filter-name>\s*(\w+)\s*</filter-name>\s*<filter-class>\s*org\.apache\.tapestry5\.\w*TapestryFilter\s*</filter-class>",
    )
    .expect("invalid source pattern")
});

static PACKAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").expect("invalid source pattern"));

static IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*import\s+([\w.]+)\s*;").expect("invalid source pattern"));

static MODULE_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(ImportModule|SubModule)\s*\(([^)]*)\)").expect("invalid source pattern"));

static CLASS_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\w.]+)\s*\.\s*class\b").expect("invalid source pattern"));

static LIBRARY_MAPPING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"new\s+LibraryMapping\s*\(\s*"([^"]*)"\s*,\s*"([^"]*)"\s*\)"#).expect("invalid source pattern")
});

/// What a module's source declares about other modules and libraries.
#[derive(Debug, Default, PartialEq, Eq)]
struct ModuleSource {
    /// (annotation, fully qualified class name)
    imports: Vec<(String, String)>,
    library_mappings: Vec<LibraryMapping>,
}

impl ProjectModel {
    /// Discovers the project rooted at `root`.
    pub fn discover(root: &Path, config: &DiscoveryConfig) -> Result<Self, ProjectError> {
        if !root.is_dir() {
            return Err(ProjectError::RootNotFound(root.to_path_buf()));
        }

        let existing = |relative: &str| Some(root.join(relative)).filter(|p| p.is_dir());
        let mut java_roots: Vec<PathBuf> = existing("src/main/java").into_iter().collect();
        let mut resource_roots: Vec<PathBuf> = existing("src/main/resources").into_iter().collect();
        let web_root = existing("src/main/webapp");
        if java_roots.is_empty() && resource_roots.is_empty() && web_root.is_none() {
            debug!("No Maven layout under {:?}, using the root as source root", root);
            java_roots.push(root.to_path_buf());
            resource_roots.push(root.to_path_buf());
        }

        let web_xml = read_optional(&root.join(WEB_XML))?;
        let app_package = config
            .app_package
            .clone()
            .or_else(|| web_xml.as_deref().and_then(app_package_from_web_xml))
            .ok_or_else(|| ProjectError::AppPackageNotFound(root.to_path_buf()))?;
        let filter_name = web_xml
            .as_deref()
            .and_then(filter_name_from_web_xml)
            .unwrap_or_else(|| DEFAULT_FILTER_NAME.to_string());

        let mut project = Self {
            root: root.to_path_buf(),
            app_package,
            java_roots,
            resource_roots,
            web_root,
            modules: Vec::new(),
            library_mappings: Vec::new(),
        };
        project.collect_modules(&filter_name);

        info!(
            "Discovered Tapestry project {:?}: app package {}, {} modules, {} library mappings",
            project.root,
            project.app_package,
            project.modules.len(),
            project.library_mappings.len()
        );
        Ok(project)
    }

    /// Breadth-first walk from the app module through module imports.
    fn collect_modules(&mut self, filter_name: &str) {
        let app_module = format!("{}.services.{}Module", self.app_package, capitalize(filter_name));
        let mut queue = VecDeque::from([(
            app_module,
            ModuleReference::AppModule {
                filter_name: filter_name.to_string(),
            },
        )]);
        let mut seen = HashSet::new();

        while let Some((class_name, reference)) = queue.pop_front() {
            if !seen.insert(class_name.clone()) {
                continue;
            }

            let path = self.find_java_source(&class_name);
            let module = TapestryModule {
                class_name,
                path: path.clone(),
                reference,
            };

            if let Some(path) = path {
                match fs::read_to_string(&path) {
                    Ok(source) => {
                        let parsed = parse_module_source(&source);
                        for (annotation, imported) in parsed.imports {
                            queue.push_back((
                                imported,
                                ModuleReference::Imported {
                                    annotation,
                                    by: module.simple_name().to_string(),
                                },
                            ));
                        }
                        for mapping in parsed.library_mappings {
                            if !self.library_mappings.contains(&mapping) {
                                self.library_mappings.push(mapping);
                            }
                        }
                    }
                    Err(e) => warn!("Failed to read module source {:?}: {}", path, e),
                }
            } else {
                debug!("No source for module {}", module.class_name);
            }

            self.modules.push(module);
        }
    }

    fn find_java_source(&self, class_name: &str) -> Option<PathBuf> {
        let relative = format!("{}.java", class_name.replace('.', "/"));
        self.java_roots
            .iter()
            .find_map(|root| find_file_case_insensitive(root, &relative))
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ProjectError> {
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(path).map(Some).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn app_package_from_web_xml(web_xml: &str) -> Option<String> {
    APP_PACKAGE.captures(web_xml).map(|c| c[1].to_string())
}

fn filter_name_from_web_xml(web_xml: &str) -> Option<String> {
    TAPESTRY_FILTER.captures(web_xml).map(|c| c[1].to_string())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_module_source(source: &str) -> ModuleSource {
    let package = PACKAGE.captures(source).map(|c| c[1].to_string());
    let imports: HashMap<&str, &str> = IMPORT
        .captures_iter(source)
        .filter_map(|c| {
            let fqcn = c.get(1)?.as_str();
            let simple = fqcn.rsplit('.').next()?;
            Some((simple, fqcn))
        })
        .collect();

    let resolve = |name: &str| -> String {
        if name.contains('.') {
            name.to_string()
        } else if let Some(fqcn) = imports.get(name) {
            fqcn.to_string()
        } else if let Some(package) = &package {
            format!("{}.{}", package, name)
        } else {
            name.to_string()
        }
    };

    let mut parsed = ModuleSource::default();
    for annotation in MODULE_ANNOTATION.captures_iter(source) {
        for literal in CLASS_LITERAL.captures_iter(&annotation[2]) {
            parsed
                .imports
                .push((annotation[1].to_string(), resolve(&literal[1])));
        }
    }
    for mapping in LIBRARY_MAPPING.captures_iter(source) {
        parsed.library_mappings.push(LibraryMapping {
            prefix: mapping[1].to_string(),
            root_package: mapping[2].to_string(),
        });
    }
    parsed
}
