use serde::Serialize;

use crate::element::{Element, ElementKind};
use crate::style::Paint;

pub const DEFAULT_PRIMARY_THRESHOLD: f32 = 50.0;

/// Semantic category derived from an element's shape, size and paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PrimaryNode,
    SecondaryNode,
    Connector,
    Text,
    Decoration,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::PrimaryNode,
        Role::SecondaryNode,
        Role::Connector,
        Role::Text,
        Role::Decoration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::PrimaryNode => "primary_node",
            Role::SecondaryNode => "secondary_node",
            Role::Connector => "connector",
            Role::Text => "text",
            Role::Decoration => "decoration",
        }
    }
}

/// First match wins: text, then connectors, then area shapes by size.
pub fn classify(element: &Element, threshold: f32) -> Role {
    match &element.kind {
        ElementKind::Text { .. } => Role::Text,
        ElementKind::Line { .. } | ElementKind::Polyline { .. } => Role::Connector,
        ElementKind::Path { .. } if element.style.fill == Paint::None => Role::Connector,
        ElementKind::Rect { .. }
        | ElementKind::Circle { .. }
        | ElementKind::Ellipse { .. }
        | ElementKind::Polygon { .. } => {
            let (w, h) = element.extent();
            if w > threshold || h > threshold {
                Role::PrimaryNode
            } else {
                Role::SecondaryNode
            }
        }
        ElementKind::Path { .. } | ElementKind::Group { .. } => Role::Decoration,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified<'a> {
    pub element: &'a Element,
    pub role: Role,
    /// Position in drawing order among the flattened leaves.
    pub depth_index: usize,
}

/// Flattens the group tree in drawing order and classifies every leaf.
pub fn classify_document(elements: &[Element], threshold: f32) -> Vec<Classified<'_>> {
    let mut out = Vec::new();
    let mut stack: Vec<std::slice::Iter<'_, Element>> = vec![elements.iter()];
    while let Some(top) = stack.last_mut() {
        let Some(element) = top.next() else {
            stack.pop();
            continue;
        };
        match &element.kind {
            ElementKind::Group { children } => stack.push(children.iter()),
            _ => {
                let depth_index = out.len();
                out.push(Classified {
                    element,
                    role: classify(element, threshold),
                    depth_index,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::parse_document;

    fn roles(svg: &str) -> Vec<Role> {
        let doc = parse_document(svg).unwrap();
        classify_document(&doc.elements, DEFAULT_PRIMARY_THRESHOLD)
            .into_iter()
            .map(|c| c.role)
            .collect()
    }

    #[test]
    fn area_shapes_split_on_threshold() {
        assert_eq!(
            roles(
                r#"<svg><rect width="20" height="20"/><rect width="51" height="10"/>
                <circle r="30"/><circle r="20"/></svg>"#
            ),
            vec![
                Role::SecondaryNode,
                Role::PrimaryNode,
                Role::PrimaryNode,
                Role::SecondaryNode,
            ]
        );
    }

    #[test]
    fn threshold_uses_document_space_size() {
        assert_eq!(
            roles(r#"<svg><g transform="scale(4)"><rect width="20" height="20"/></g></svg>"#),
            vec![Role::PrimaryNode]
        );
    }

    #[test]
    fn unfilled_paths_are_connectors_and_filled_paths_decorate() {
        assert_eq!(
            roles(
                r#"<svg><path d="M0 0 L10 10" fill="none"/><path d="M0 0 L10 10 Z"/>
                <line x2="5"/><polyline points="0,0 1,1"/><text>hi</text></svg>"#
            ),
            vec![
                Role::Connector,
                Role::Decoration,
                Role::Connector,
                Role::Connector,
                Role::Text,
            ]
        );
    }

    #[test]
    fn flattening_preserves_drawing_order() {
        let doc = parse_document(
            r#"<svg><circle id="a" r="1"/><g><rect id="b" width="1" height="1"/>
               <g><line id="c" x2="4"/></g></g><text id="d">x</text></svg>"#,
        )
        .unwrap();
        let flat = classify_document(&doc.elements, DEFAULT_PRIMARY_THRESHOLD);
        let ids: Vec<_> = flat
            .iter()
            .map(|c| c.element.id.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(
            flat.iter().map(|c| c.depth_index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn groups_classify_as_decoration() {
        let doc = parse_document(r#"<svg><g/></svg>"#).unwrap();
        assert_eq!(classify(&doc.elements[0], 50.0), Role::Decoration);
    }
}
