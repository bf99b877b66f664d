use crate::config::CellMarkers;
use crate::dom::HtmlNode;
use crate::notebook::CellKind;

/// Lazily walks a tree in document order, yielding cell containers.
///
/// A container's subtree belongs to its cell, so the walk does not descend
/// into it. Build a new locator to restart the scan.
pub struct CellLocator<'a, N> {
    stack: Vec<N>,
    markers: &'a CellMarkers,
}

impl<'a, N: HtmlNode> CellLocator<'a, N> {
    pub fn new(root: N, markers: &'a CellMarkers) -> Self {
        CellLocator {
            stack: vec![root],
            markers,
        }
    }

    pub fn is_container(&self, node: &N) -> bool {
        node.is_element() && node.has_any_class(&self.markers.container)
    }
}

impl<N: HtmlNode> Iterator for CellLocator<'_, N> {
    type Item = N;

    fn next(&mut self) -> Option<N> {
        while let Some(node) = self.stack.pop() {
            if self.is_container(&node) {
                return Some(node);
            }
            let mut children = node.children();
            children.reverse();
            self.stack.extend(children);
        }
        None
    }
}

/// Markdown or code from the container's own class markers, `None` for
/// anything else (raw cells, prompt or toolbar chrome).
pub fn classify<N: HtmlNode>(cell: &N, markers: &CellMarkers) -> Option<CellKind> {
    if cell.has_class(&markers.markdown) {
        Some(CellKind::Markdown)
    } else if cell.has_class(&markers.code) {
        Some(CellKind::Code)
    } else {
        None
    }
}
