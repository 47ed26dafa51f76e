//! Project outline: the modules and component libraries of a project as a tree
//!
//! Each node carries a label and, depending on what it represents, a
//! decoration suffix rendered after the label.

use std::fmt;

use super::{LibraryMapping, ProjectModel, SOURCE_NOT_FOUND, TapestryModule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineData {
    Group,
    Module(TapestryModule),
    Library(LibraryMapping),
    Error(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub label: String,
    pub data: OutlineData,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(label: impl Into<String>, data: OutlineData) -> Self {
        Self {
            label: label.into(),
            data,
            children: Vec::new(),
        }
    }

    /// Suffix shown after the label.
    pub fn decoration(&self) -> Option<String> {
        match &self.data {
            OutlineData::Module(module) => Some(module.reference.label()),
            OutlineData::Library(mapping) => Some(mapping.root_package.clone()),
            OutlineData::Error(message) | OutlineData::Text(message) => Some(message.clone()),
            OutlineData::Group => None,
        }
    }

    fn sort(&mut self) {
        self.children.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
        for child in &mut self.children {
            child.sort();
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.label, indent = depth * 2)?;
        if let Some(decoration) = self.decoration() {
            write!(f, " {}", decoration)?;
        }
        writeln!(f)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOutline {
    pub root: OutlineNode,
}

impl ProjectOutline {
    pub fn build(project: &ProjectModel) -> Self {
        let mut root = OutlineNode::new(project.name(), OutlineData::Text(project.app_package.clone()));

        let mut modules = OutlineNode::new("Modules", OutlineData::Group);
        for module in &project.modules {
            let mut node = OutlineNode::new(module.simple_name(), OutlineData::Module(module.clone()));
            if module.path.is_none() {
                node.children.push(OutlineNode::new(
                    module.class_name.clone(),
                    OutlineData::Error(SOURCE_NOT_FOUND.to_string()),
                ));
            }
            modules.children.push(node);
        }

        let mut libraries = OutlineNode::new("Libraries", OutlineData::Group);
        for mapping in &project.library_mappings {
            libraries
                .children
                .push(OutlineNode::new(mapping.prefix.clone(), OutlineData::Library(mapping.clone())));
        }

        root.children.push(modules);
        root.children.push(libraries);
        root.sort();
        Self { root }
    }
}

impl fmt::Display for ProjectOutline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ModuleReference;
    use indoc::indoc;
    use std::path::PathBuf;

    fn sample_project() -> ProjectModel {
        ProjectModel {
            root: PathBuf::from("/work/shop"),
            app_package: "com.example.shop".to_string(),
            java_roots: Vec::new(),
            resource_roots: Vec::new(),
            web_root: None,
            modules: vec![
                TapestryModule {
                    class_name: "com.example.shop.services.ShopModule".to_string(),
                    path: Some(PathBuf::from("/work/shop/ShopModule.java")),
                    reference: ModuleReference::AppModule {
                        filter_name: "shop".to_string(),
                    },
                },
                TapestryModule {
                    class_name: "com.example.audit.AuditModule".to_string(),
                    path: None,
                    reference: ModuleReference::Imported {
                        annotation: "ImportModule".to_string(),
                        by: "ShopModule".to_string(),
                    },
                },
            ],
            library_mappings: vec![
                LibraryMapping {
                    prefix: "widgets".to_string(),
                    root_package: "com.example.widgets".to_string(),
                },
                LibraryMapping {
                    prefix: "charts".to_string(),
                    root_package: "com.example.charts".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_outline_rendering() {
        let outline = ProjectOutline::build(&sample_project());
        let expected = indoc! {"
            shop com.example.shop
              Libraries
                charts com.example.charts
                widgets com.example.widgets
              Modules
                AuditModule (via @ImportModule of ShopModule)
                  com.example.audit.AuditModule source not found
                ShopModule (filter 'shop' in web.xml)
        "};
        assert_eq!(outline.to_string(), expected);
    }

    #[test]
    fn test_group_has_no_decoration() {
        let node = OutlineNode::new("Modules", OutlineData::Group);
        assert_eq!(node.decoration(), None);
    }
}
