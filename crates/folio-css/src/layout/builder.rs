//! Box generation: markup tree to box tree.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)

use std::sync::Arc;

use folio_dom::{DomTree, ElementData, NodeId, NodeType};

use super::context::LayoutContext;
use super::tree::{BoxId, BoxKind, BoxTree};
use crate::error::{LayoutError, LayoutResult};
use crate::style::properties::IdentValue;
use crate::style::CalculatedStyle;

/// Object size used for replaced content with no known dimensions.
///
/// [§ 10.3.2](https://www.w3.org/TR/CSS2/visudet.html#inline-replaced-width)
const DEFAULT_REPLACED_SIZE: (f32, f32) = (300.0, 150.0);

const PSEUDO_ELEMENTS: [&str; 2] = ["before", "after"];

/// Build the box tree for the document element of `ctx.dom`.
///
/// The root box is always a block. `display: none` subtrees generate no
/// boxes; mixed block and inline content is normalized with anonymous
/// block boxes, and blocks nested inside inlines are hoisted into the
/// enclosing block flow with the inline recorded as their wrapper.
///
/// # Errors
///
/// [`LayoutError::InternalConsistency`] when the document has no element,
/// [`LayoutError::Style`] for fatal style errors, and
/// [`LayoutError::Cancelled`].
pub fn build_box_tree(ctx: &LayoutContext<'_>) -> LayoutResult<BoxTree> {
    let mut tree = BoxTree::new();
    let Some(root) = ctx.dom.document_element() else {
        return Err(LayoutError::InternalConsistency {
            context: "document".to_string(),
            message: "no document element".to_string(),
        });
    };
    let tag = tag_of(ctx.dom, root);
    let style = ctx.session.style_for_element(None, tag, ctx.styles, root)?;
    let root_box = tree.create_box(BoxKind::Block, Arc::clone(&style), Some(root));
    let children = element_children(&mut tree, ctx, &style, root)?;
    attach_block_children(&mut tree, ctx, root_box, children)?;
    tree.set_root(root_box);
    log::debug!("built box tree: {} boxes", tree.len());
    Ok(tree)
}

fn tag_of(dom: &DomTree, node: NodeId) -> &str {
    dom.as_element(node).map(|e| e.tag_name.as_str()).unwrap_or_default()
}

/// Unattached boxes for the children of `element`, with its `::before`
/// and `::after` boxes around them.
fn element_children(
    tree: &mut BoxTree,
    ctx: &LayoutContext<'_>,
    style: &Arc<CalculatedStyle>,
    element: NodeId,
) -> LayoutResult<Vec<BoxId>> {
    let mut boxes = Vec::new();
    if let Some(before) = pseudo_box(tree, ctx, style, element, PSEUDO_ELEMENTS[0])? {
        boxes.push(before);
    }
    for &child in ctx.dom.children(element) {
        ctx.checkpoint()?;
        boxes.extend(generate(tree, ctx, style, child)?);
    }
    if let Some(after) = pseudo_box(tree, ctx, style, element, PSEUDO_ELEMENTS[1])? {
        boxes.push(after);
    }
    Ok(boxes)
}

fn generate(
    tree: &mut BoxTree,
    ctx: &LayoutContext<'_>,
    parent_style: &Arc<CalculatedStyle>,
    node: NodeId,
) -> LayoutResult<Vec<BoxId>> {
    let Some(data) = ctx.dom.get(node) else {
        return Ok(Vec::new());
    };
    match &data.node_type {
        NodeType::Text(text) => {
            let collapsed = collapse_whitespace(text);
            if collapsed.is_empty() {
                return Ok(Vec::new());
            }
            let style = ctx.session.create_anonymous_style(parent_style, &IdentValue::Inline);
            Ok(vec![tree.create_anonymous(
                BoxKind::Text {
                    text: collapsed,
                    fragments: Vec::new(),
                },
                style,
            )])
        }
        NodeType::Element(element) => generate_element(tree, ctx, parent_style, node, element),
        _ => Ok(Vec::new()),
    }
}

fn generate_element(
    tree: &mut BoxTree,
    ctx: &LayoutContext<'_>,
    parent_style: &Arc<CalculatedStyle>,
    node: NodeId,
    element: &ElementData,
) -> LayoutResult<Vec<BoxId>> {
    let style = ctx
        .session
        .style_for_element(Some(parent_style), &element.tag_name, ctx.styles, node)?;
    if style.is_display_none() {
        return Ok(Vec::new());
    }

    if ctx.namespace.is_replaced(element) {
        let (width, height) = intrinsic_size(ctx, element);
        return Ok(vec![tree.create_box(BoxKind::Replaced { width, height }, style, Some(node))]);
    }

    let children = element_children(tree, ctx, &style, node)?;
    // [§ 9.7](https://www.w3.org/TR/CSS2/visuren.html#dis-pos-flo)
    //
    // "if 'position' has the value 'absolute' or 'fixed', the box is
    // absolutely positioned ... and display is set according to the table."
    if style.is_block_level() || style.is_absolute() || style.display() == IdentValue::InlineBlock {
        let id = tree.create_box(BoxKind::Block, style, Some(node));
        attach_block_children(tree, ctx, id, children)?;
        return Ok(vec![id]);
    }

    let id = tree.create_box(
        BoxKind::Inline {
            wrapped_content: Vec::new(),
        },
        style,
        Some(node),
    );
    tree.add_all_children(id, &children, &ctx.cancel)?;
    split_inline(tree, ctx, id)
}

/// The `::before` or `::after` box of `element`: an inline box holding an
/// anonymous text box with the generated content.
fn pseudo_box(
    tree: &mut BoxTree,
    ctx: &LayoutContext<'_>,
    element_style: &Arc<CalculatedStyle>,
    element: NodeId,
    pseudo: &str,
) -> LayoutResult<Option<BoxId>> {
    let Some(content) = ctx.styles.pseudo_content(element, pseudo) else {
        return Ok(None);
    };
    let style = ctx
        .session
        .derive_pseudo_style(element_style, ctx.styles, element, pseudo)?;
    if style.is_display_none() {
        return Ok(None);
    }
    let kind = if style.is_block_level() {
        BoxKind::Block
    } else {
        BoxKind::Inline {
            wrapped_content: Vec::new(),
        }
    };
    let text_style = ctx.session.create_anonymous_style(&style, &IdentValue::Inline);
    let id = tree.create_box(kind, style, Some(element));
    tree[id].pseudo_element = Some(pseudo.to_string());

    let text = tree.create_anonymous(
        BoxKind::Text {
            text: content,
            fragments: Vec::new(),
        },
        text_style,
    );
    tree[text].pseudo_element = Some(pseudo.to_string());
    tree.add_child(id, text)?;
    Ok(Some(id))
}

/// [§ 9.2.1.1](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
///
/// "When an inline box contains an in-flow block-level box, the inline box
/// (and its inline ancestors within the same line box) are broken around
/// the block-level box."
///
/// Returns the boxes that replace `inline` in its parent's child list. The
/// first is always `inline` itself, which wraps every hoisted block.
fn split_inline(tree: &mut BoxTree, ctx: &LayoutContext<'_>, inline: BoxId) -> LayoutResult<Vec<BoxId>> {
    let children = tree.children(inline).to_vec();
    if children.iter().all(|&c| tree[c].is_inline_level()) {
        return Ok(vec![inline]);
    }

    tree.remove_all_children(inline)?;
    let mut result = vec![inline];
    let mut run_owner = Some(inline);
    let mut wrapped = Vec::new();
    for child in children {
        ctx.checkpoint()?;
        if tree[child].is_inline_level() {
            let owner = match run_owner {
                Some(owner) => owner,
                None => {
                    let continuation = continuation_of(tree, inline);
                    result.push(continuation);
                    run_owner = Some(continuation);
                    continuation
                }
            };
            tree.add_child(owner, child)?;
        } else {
            if tree[child].wrapper.is_none() {
                tree[child].wrapper = Some(inline);
            }
            wrapped.push(child);
            result.push(child);
            run_owner = None;
        }
    }
    if let BoxKind::Inline { wrapped_content } = &mut tree[inline].kind {
        *wrapped_content = wrapped;
    }
    Ok(result)
}

fn continuation_of(tree: &mut BoxTree, inline: BoxId) -> BoxId {
    let style = Arc::clone(&tree[inline].style);
    let element = tree[inline].element;
    tree.create_box(
        BoxKind::Inline {
            wrapped_content: Vec::new(),
        },
        style,
        element,
    )
}

/// [§ 9.2.1.1](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
///
/// "if a block container box has a block-level box inside it, then we
/// force it to have only block-level boxes inside it."
fn attach_block_children(
    tree: &mut BoxTree,
    ctx: &LayoutContext<'_>,
    parent: BoxId,
    children: Vec<BoxId>,
) -> LayoutResult<()> {
    if children.iter().all(|&c| tree[c].is_inline_level()) {
        return tree.add_all_children(parent, &children, &ctx.cancel);
    }

    let mut run: Vec<BoxId> = Vec::new();
    for child in children {
        ctx.checkpoint()?;
        if tree[child].is_inline_level() {
            run.push(child);
        } else {
            flush_inline_run(tree, ctx, parent, &mut run)?;
            tree.add_child(parent, child)?;
        }
    }
    flush_inline_run(tree, ctx, parent, &mut run)
}

fn flush_inline_run(
    tree: &mut BoxTree,
    ctx: &LayoutContext<'_>,
    parent: BoxId,
    run: &mut Vec<BoxId>,
) -> LayoutResult<()> {
    let inlines = std::mem::take(run);
    // Whitespace between blocks generates no anonymous box.
    let blank = inlines
        .iter()
        .all(|&c| matches!(&tree[c].kind, BoxKind::Text { text, .. } if text.trim().is_empty()));
    if inlines.is_empty() || blank {
        return Ok(());
    }
    let style = ctx
        .session
        .create_anonymous_style(&tree[parent].style, &IdentValue::Block);
    let anonymous = tree.create_anonymous(BoxKind::Block, style);
    tree.add_all_children(anonymous, &inlines, &ctx.cancel)?;
    tree.add_child(parent, anonymous)
}

/// Intrinsic size of a replaced element: its `width`/`height` attributes,
/// then the known size of its image, then the default object size.
fn intrinsic_size(ctx: &LayoutContext<'_>, element: &ElementData) -> (f32, f32) {
    let known = ctx
        .namespace
        .image_uri(element)
        .and_then(|uri| ctx.image_sizes.get(uri).copied());
    let (default_width, default_height) = known.unwrap_or(DEFAULT_REPLACED_SIZE);
    let attr = |name: &str| {
        element
            .attr(name)
            .and_then(|v| v.trim().trim_end_matches("px").parse::<f32>().ok())
    };
    match (attr("width"), attr("height")) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) if default_width > 0.0 => (w, w * default_height / default_width),
        (None, Some(h)) if default_height > 0.0 => (h * default_width / default_height, h),
        (w, h) => (w.unwrap_or(default_width), h.unwrap_or(default_height)),
    }
}

/// [§ 16.6.1 The 'white-space' processing model](https://www.w3.org/TR/CSS2/text.html#white-space-model)
///
/// Runs of whitespace collapse to one space; leading and trailing runs are
/// kept as a single space so adjacent inline content stays separated.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), " a b ");
        assert_eq!(collapse_whitespace("\n\n"), " ");
        assert_eq!(collapse_whitespace(""), "");
    }
}
