//! Block layout for the memory document, computed with Taffy.
//!
//! Every in-flow element becomes a flex column: leaves take their declared
//! height, containers grow to fit their children, vertical margins stack
//! (no collapsing). Fixed elements are laid out as separate roots pinned to
//! the viewport top and take no space in the page.

use taffy::{
    AvailableSpace, Dimension, Display, FlexDirection, LengthPercentageAuto, NodeId,
    Rect as TaffyRect, Size, Style, TaffyTree,
};

use crate::error::{Error, Result};
use crate::types::{ElementId, Rect};

/// Box model of one element, as far as vertical layout cares.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Block {
    /// Explicit height; `None` sizes the element to its children.
    pub height: Option<f64>,
    pub margin_top: f64,
    pub margin_bottom: f64,
    /// Out of flow, pinned to the viewport (like `position: fixed`).
    pub fixed: bool,
}

/// Result of laying out a page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    /// Rect per element index. Fixed subtrees are relative to the viewport top.
    pub rects: Vec<Rect>,
    /// Scrollable height: in-flow content, at least one viewport.
    pub document_height: f64,
}

impl PageLayout {
    pub fn rect(&self, element: ElementId) -> Option<Rect> {
        self.rects.get(element.index()).copied()
    }
}

fn block_style(block: &Block, width: Option<f32>) -> Style {
    Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        flex_shrink: 0.0,
        size: Size {
            width: width.map_or(Dimension::Auto, Dimension::Length),
            height: block
                .height
                .map_or(Dimension::Auto, |h| Dimension::Length(h as f32)),
        },
        margin: TaffyRect {
            top: LengthPercentageAuto::Length(block.margin_top as f32),
            right: LengthPercentageAuto::Length(0.0),
            bottom: LengthPercentageAuto::Length(block.margin_bottom as f32),
            left: LengthPercentageAuto::Length(0.0),
        },
        ..Default::default()
    }
}

/// Compute rects for a tree described by `blocks` and `children`.
///
/// `blocks[i]` and `children[i]` describe element `i`; `root` is the page
/// body and is never treated as fixed.
///
/// # Errors
///
/// Returns [`Error::Layout`] if Taffy rejects the tree.
pub fn compute_page_layout(
    root: ElementId,
    blocks: &[Block],
    children: &[Vec<ElementId>],
    viewport_width: f64,
    viewport_height: f64,
) -> Result<PageLayout> {
    let mut tree: TaffyTree<()> = TaffyTree::new();
    let mut nodes: Vec<Option<NodeId>> = vec![None; blocks.len()];
    let mut fixed_roots = Vec::new();

    let root_node = build(
        &mut tree,
        root,
        blocks,
        children,
        &mut nodes,
        &mut fixed_roots,
        Some(viewport_width as f32),
    )?;

    let available = Size {
        width: AvailableSpace::Definite(viewport_width as f32),
        height: AvailableSpace::MaxContent,
    };
    tree.compute_layout(root_node, available).map_err(layout_error)?;

    let mut rects = vec![Rect::default(); blocks.len()];
    place(&tree, root, 0.0, blocks, children, &nodes, &mut rects)?;

    let content_height = rects
        .get(root.index())
        .map_or(0.0, |rect| rect.bottom().max(0.0));

    // Fixed subtrees (and fixed elements nested inside them) are separate roots.
    let mut pending = fixed_roots;
    while let Some(fixed) = pending.pop() {
        let mut nested = Vec::new();
        let node = build(
            &mut tree,
            fixed,
            blocks,
            children,
            &mut nodes,
            &mut nested,
            Some(viewport_width as f32),
        )?;
        tree.compute_layout(node, available).map_err(layout_error)?;
        place(&tree, fixed, 0.0, blocks, children, &nodes, &mut rects)?;
        pending.extend(nested);
    }

    Ok(PageLayout {
        rects,
        document_height: content_height.max(viewport_height),
    })
}

fn build(
    tree: &mut TaffyTree<()>,
    element: ElementId,
    blocks: &[Block],
    children: &[Vec<ElementId>],
    nodes: &mut [Option<NodeId>],
    fixed_roots: &mut Vec<ElementId>,
    width: Option<f32>,
) -> Result<NodeId> {
    let index = element.index();
    let block = blocks.get(index).ok_or(Error::UnknownElement(element))?;

    let mut child_nodes = Vec::new();
    for &child in children.get(index).map(Vec::as_slice).unwrap_or(&[]) {
        let child_block = blocks.get(child.index()).ok_or(Error::UnknownElement(child))?;
        if child_block.fixed {
            fixed_roots.push(child);
            continue;
        }
        child_nodes.push(build(tree, child, blocks, children, nodes, fixed_roots, None)?);
    }

    let node = tree
        .new_with_children(block_style(block, width), &child_nodes)
        .map_err(layout_error)?;
    nodes[index] = Some(node);
    Ok(node)
}

fn place(
    tree: &TaffyTree<()>,
    element: ElementId,
    parent_top: f64,
    blocks: &[Block],
    children: &[Vec<ElementId>],
    nodes: &[Option<NodeId>],
    rects: &mut [Rect],
) -> Result<()> {
    let Some(node) = nodes.get(element.index()).copied().flatten() else {
        return Ok(());
    };
    let layout = tree.layout(node).map_err(layout_error)?;
    let top = parent_top + f64::from(layout.location.y);
    rects[element.index()] = Rect::new(top, f64::from(layout.size.height));

    for &child in children.get(element.index()).map(Vec::as_slice).unwrap_or(&[]) {
        let in_flow = blocks.get(child.index()).is_some_and(|block| !block.fixed);
        if in_flow {
            place(tree, child, top, blocks, children, nodes, rects)?;
        }
    }
    Ok(())
}

fn layout_error(err: taffy::TaffyError) -> Error {
    Error::Layout(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: usize) -> ElementId {
        ElementId::new(i)
    }

    fn leaf(height: f64) -> Block {
        Block {
            height: Some(height),
            ..Block::default()
        }
    }

    #[test]
    fn test_sections_stack_in_order() {
        // body > [section 600, section 400 (margin-top 20), section 300]
        let blocks = vec![Block::default(), leaf(600.0), Block { margin_top: 20.0, ..leaf(400.0) }, leaf(300.0)];
        let children = vec![vec![id(1), id(2), id(3)], vec![], vec![], vec![]];

        let layout = compute_page_layout(id(0), &blocks, &children, 1280.0, 800.0).unwrap();

        assert_eq!(layout.rect(id(1)), Some(Rect::new(0.0, 600.0)));
        assert_eq!(layout.rect(id(2)), Some(Rect::new(620.0, 400.0)));
        assert_eq!(layout.rect(id(3)), Some(Rect::new(1020.0, 300.0)));
        assert_eq!(layout.document_height, 1320.0);
    }

    #[test]
    fn test_container_grows_to_children() {
        // body > section(auto) > [card 100, card 150]
        let blocks = vec![Block::default(), Block::default(), leaf(100.0), leaf(150.0)];
        let children = vec![vec![id(1)], vec![id(2), id(3)], vec![], vec![]];

        let layout = compute_page_layout(id(0), &blocks, &children, 1280.0, 100.0).unwrap();

        assert_eq!(layout.rect(id(1)), Some(Rect::new(0.0, 250.0)));
        assert_eq!(layout.rect(id(3)), Some(Rect::new(100.0, 150.0)));
    }

    #[test]
    fn test_fixed_header_takes_no_space() {
        // body > [header fixed 70, section 500]
        let blocks = vec![
            Block::default(),
            Block { fixed: true, ..leaf(70.0) },
            leaf(500.0),
        ];
        let children = vec![vec![id(1), id(2)], vec![], vec![]];

        let layout = compute_page_layout(id(0), &blocks, &children, 1280.0, 800.0).unwrap();

        assert_eq!(layout.rect(id(1)), Some(Rect::new(0.0, 70.0)));
        assert_eq!(layout.rect(id(2)), Some(Rect::new(0.0, 500.0)));
        // Short page: still one viewport tall.
        assert_eq!(layout.document_height, 800.0);
    }
}
