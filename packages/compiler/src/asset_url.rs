//! Relative asset URL rewriting.
//!
//! A plain `<img src="./logo.png">` would ship the literal path to the
//! browser and bypass the bundler. The rewrite turns such attributes
//! into bound attributes referencing a generated import, so the bundler
//! resolves, hashes, and inlines the asset like any other module. The
//! generated expression is constant per render but unknowable at compile
//! time, which keeps the element hoistable while blocking string
//! flattening.

use willow_common::visitor::{walk_element_mut, VisitorMut};
use willow_parser::ast::{
    ConstantKind, DirectiveNode, ElementNode, Expression, Prop, RootNode, SimpleExpression,
};

/// One generated module import backing a rewritten URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetImport {
    /// Local identifier the bound attribute references, e.g. `_imports_0`.
    pub identifier: String,
    /// The module path as written in the template.
    pub path: String,
}

/// Which attributes carry asset URLs, per tag.
#[derive(Debug, Clone)]
pub struct AssetUrlOptions {
    tags: Vec<(&'static str, &'static [&'static str])>,
}

impl Default for AssetUrlOptions {
    fn default() -> Self {
        Self {
            tags: vec![
                ("img", &["src", "srcset"]),
                ("video", &["src", "poster"]),
                ("audio", &["src"]),
                ("source", &["src", "srcset"]),
                ("image", &["href"]),
                ("use", &["href"]),
                ("link", &["href"]),
            ],
        }
    }
}

impl AssetUrlOptions {
    fn applies(&self, tag: &str, attribute: &str) -> bool {
        self.tags
            .iter()
            .any(|(t, attrs)| *t == tag && attrs.contains(&attribute))
    }
}

/// Only paths the bundler can resolve as modules are rewritten: explicit
/// relative paths and `~`/`@` alias paths. Absolute URLs, fragments, and
/// data URIs pass through untouched.
fn is_rewritable_url(url: &str) -> bool {
    url.starts_with("./") || url.starts_with("../") || url.starts_with('~') || url.starts_with('@')
}

/// Rewrite relative asset URLs across the tree, returning the imports
/// the generated module must declare.
pub fn rewrite_asset_urls(root: &mut RootNode, options: &AssetUrlOptions) -> Vec<AssetImport> {
    let mut rewriter = AssetRewriter {
        options,
        imports: Vec::new(),
    };
    rewriter.visit_root_mut(root);
    rewriter.imports
}

struct AssetRewriter<'a> {
    options: &'a AssetUrlOptions,
    imports: Vec<AssetImport>,
}

impl VisitorMut for AssetRewriter<'_> {
    fn visit_element_mut(&mut self, element: &mut ElementNode) {
        self.rewrite_props(element);
        walk_element_mut(self, element);
    }
}

impl AssetRewriter<'_> {
    fn rewrite_props(&mut self, el: &mut ElementNode) {
        let tag = el.tag.clone();
        for prop in &mut el.props {
            let Prop::Attribute(attr) = prop else { continue };
            let Some(value) = attr.value.clone() else { continue };
            if !self.options.applies(&tag, &attr.name) || !is_rewritable_url(&value) {
                continue;
            }
            let name = attr.name.clone();
            let span = attr.span.clone();

            let identifier = match self.imports.iter().find(|i| i.path == value) {
                Some(existing) => existing.identifier.clone(),
                None => {
                    let identifier = format!("_imports_{}", self.imports.len());
                    self.imports.push(AssetImport {
                        identifier: identifier.clone(),
                        path: value.clone(),
                    });
                    identifier
                }
            };

            tracing::debug!(tag = %tag, attr = %name, path = %value, "rewrote asset url");

            *prop = Prop::Directive(DirectiveNode {
                name: "bind".to_string(),
                arg: Some(Expression::Simple(SimpleExpression::static_str(
                    name,
                    span.clone(),
                ))),
                exp: Some(Expression::Simple(SimpleExpression::dynamic(
                    identifier,
                    ConstantKind::RuntimeConstant,
                    span.clone(),
                ))),
                span,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use willow_parser::parse;

    fn first_img(root: &RootNode) -> &ElementNode {
        root.children[0].as_element().unwrap().children[0]
            .as_element()
            .unwrap()
    }

    #[test]
    fn test_relative_src_becomes_bound_import() {
        let mut root = parse(r#"<div><img src="./logo.png"/></div>"#).unwrap();
        let imports = rewrite_asset_urls(&mut root, &AssetUrlOptions::default());

        assert_eq!(
            imports,
            vec![AssetImport {
                identifier: "_imports_0".to_string(),
                path: "./logo.png".to_string(),
            }]
        );
        let img = first_img(&root);
        let directive = img.directives().next().unwrap();
        assert!(directive.is_bind());
        assert_eq!(directive.static_arg(), Some("src"));
        let Some(Expression::Simple(exp)) = &directive.exp else {
            panic!("expected simple expression");
        };
        assert_eq!(exp.content, "_imports_0");
        assert_eq!(exp.constant, ConstantKind::RuntimeConstant);
    }

    #[test]
    fn test_absolute_and_external_urls_untouched() {
        let mut root = parse(
            r#"<div><img src="https://example.com/a.png"/><img src="/static/b.png"/><img src="data:image/png;base64,xyz"/></div>"#,
        )
        .unwrap();
        let imports = rewrite_asset_urls(&mut root, &AssetUrlOptions::default());
        assert!(imports.is_empty());
        let div = root.children[0].as_element().unwrap();
        for child in &div.children {
            let el = child.as_element().unwrap();
            assert_eq!(el.directives().count(), 0);
        }
    }

    #[test]
    fn test_duplicate_paths_share_one_import() {
        let mut root =
            parse(r#"<div><img src="./a.png"/><img src="./a.png"/><img src="./b.png"/></div>"#)
                .unwrap();
        let imports = rewrite_asset_urls(&mut root, &AssetUrlOptions::default());
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].identifier, "_imports_0");
        assert_eq!(imports[1].identifier, "_imports_1");
    }

    #[test]
    fn test_non_asset_attributes_untouched() {
        let mut root = parse(r#"<div><a href="./page.html">x</a></div>"#).unwrap();
        let imports = rewrite_asset_urls(&mut root, &AssetUrlOptions::default());
        // Anchors navigate; their hrefs are not module imports.
        assert!(imports.is_empty());
    }

    #[test]
    fn test_alias_path_rewritten() {
        let mut root = parse(r#"<div><img src="@/assets/logo.svg"/></div>"#).unwrap();
        let imports = rewrite_asset_urls(&mut root, &AssetUrlOptions::default());
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].path, "@/assets/logo.svg");
    }
}
