//! Integration tests for style value resolution.

use std::sync::Arc;

use folio_css::style::builders::builder_for;
use folio_css::style::properties::{CssName, IdentValue};
use folio_css::style::values::{CssOrigin, PropertyValue, RawDeclaration};
use folio_css::style::RgbColor;
use folio_css::{CalculatedStyle, ColorValue, StyleError, StyleSession};

fn style(session: &StyleSession, parent: Option<&Arc<CalculatedStyle>>, pairs: &[(&str, &str)]) -> Arc<CalculatedStyle> {
    let raw: Vec<RawDeclaration> = pairs
        .iter()
        .map(|(name, value)| RawDeclaration::author(name, value))
        .collect();
    let resolved = session.resolve_declarations(&raw);
    session.compute(parent, &resolved).unwrap()
}

// ---------------------------------------------------------------------------
// Color interning
// ---------------------------------------------------------------------------

#[test]
fn test_same_color_text_shares_one_instance() {
    let session = StyleSession::new().unwrap();
    let a = style(&session, None, &[("color", "red")]);
    let b = style(&session, None, &[("color", "red")]);
    assert!(Arc::ptr_eq(&a.value(CssName::Color), &b.value(CssName::Color)));
}

#[test]
fn test_equivalent_color_texts_are_distinct_instances() {
    let session = StyleSession::new().unwrap();
    let named = style(&session, None, &[("color", "red")]);
    let hex = style(&session, None, &[("color", "#ff0000")]);
    assert!(!Arc::ptr_eq(&named.value(CssName::Color), &hex.value(CssName::Color)));
    assert_eq!(named.color().to_rgb(), hex.color().to_rgb());
}

#[test]
fn test_color_shared_across_properties() {
    let session = StyleSession::new().unwrap();
    let before = session.factory().colors().len();
    let s = style(&session, None, &[("color", "#336699"), ("background-color", "#336699")]);
    assert!(Arc::ptr_eq(
        &s.value(CssName::Color),
        &s.value(CssName::BackgroundColor)
    ));
    assert_eq!(session.factory().colors().len(), before + 1);
}

#[test]
fn test_cmyk_color_keeps_device_values() {
    let session = StyleSession::new().unwrap();
    let s = style(&session, None, &[("color", "cmyk(0, 1, 1, 0)")]);
    assert!(matches!(s.color(), ColorValue::Cmyk(_)));
    assert_eq!(s.color().to_rgb(), RgbColor::opaque(255, 0, 0));
}

// ---------------------------------------------------------------------------
// Inheritance
//
// [§ 6.2.1 The 'inherit' value](https://www.w3.org/TR/CSS2/cascade.html#value-def-inherit)
// ---------------------------------------------------------------------------

#[test]
fn test_inherited_property_shares_parent_instance() {
    let session = StyleSession::new().unwrap();
    let parent = style(&session, None, &[("color", "blue"), ("font-size", "20px")]);
    let child = style(&session, Some(&parent), &[]);
    assert!(Arc::ptr_eq(&parent.value(CssName::Color), &child.value(CssName::Color)));
    assert!((child.font_size() - 20.0).abs() < f32::EPSILON);
}

#[test]
fn test_explicit_inherit_is_identity() {
    let session = StyleSession::new().unwrap();
    let parent = style(&session, None, &[("margin-top", "12px")]);
    let child = style(&session, Some(&parent), &[("margin-top", "inherit")]);
    assert!(Arc::ptr_eq(
        &parent.value(CssName::MarginTop),
        &child.value(CssName::MarginTop)
    ));
}

#[test]
fn test_inherit_is_transitive() {
    let session = StyleSession::new().unwrap();
    let root = style(&session, None, &[("border-top-style", "dashed")]);
    let middle = style(&session, Some(&root), &[("border-top-style", "inherit")]);
    let leaf = style(&session, Some(&middle), &[("border-top-style", "inherit")]);
    assert!(Arc::ptr_eq(
        &root.value(CssName::BorderTopStyle),
        &leaf.value(CssName::BorderTopStyle)
    ));
    assert!(leaf.is_ident(CssName::BorderTopStyle, &IdentValue::Dashed));
}

#[test]
fn test_non_inherited_property_takes_initial_value() {
    let session = StyleSession::new().unwrap();
    let parent = style(&session, None, &[("padding-left", "30px")]);
    let child = style(&session, Some(&parent), &[]);
    assert_eq!(child.length_px(CssName::PaddingLeft, 100.0), Some(0.0));
}

#[test]
fn test_anonymous_style_inherits_only_inherited_properties() {
    let session = StyleSession::new().unwrap();
    let parent = style(&session, None, &[("color", "green"), ("margin-left", "10px")]);
    let anonymous = session.create_anonymous_style(&parent, &IdentValue::Block);
    assert!(anonymous.is_anonymous());
    assert_eq!(anonymous.display(), IdentValue::Block);
    assert!(Arc::ptr_eq(&parent.value(CssName::Color), &anonymous.value(CssName::Color)));
    assert_eq!(anonymous.length_px(CssName::MarginLeft, 100.0), Some(0.0));
}

// ---------------------------------------------------------------------------
// Declaration building
// ---------------------------------------------------------------------------

#[test]
fn test_shorthand_expands_to_longhands() {
    let session = StyleSession::new().unwrap();
    let s = style(&session, None, &[("margin", "1px 2px 3px 4px")]);
    let margin = s.margin_rect(100.0);
    assert_eq!((margin.top, margin.right, margin.bottom, margin.left), (1.0, 2.0, 3.0, 4.0));
}

#[test]
fn test_inherit_mixed_with_other_values_is_rejected() {
    let builder = builder_for("margin").unwrap();
    let values = vec![PropertyValue::Inherit, PropertyValue::px(4.0)];
    let result = builder.build_declarations("margin", &values, CssOrigin::Author, false, true);
    assert!(matches!(result, Err(StyleError::InheritNotAllowed { .. })));
}

#[test]
fn test_inherit_refused_when_not_allowed() {
    let builder = builder_for("color").unwrap();
    let result = builder.build_declarations("color", &[PropertyValue::Inherit], CssOrigin::Author, false, false);
    assert!(matches!(result, Err(StyleError::InheritNotAllowed { .. })));
}

#[test]
fn test_invalid_declaration_is_skipped() {
    let session = StyleSession::new().unwrap();
    let raw = vec![
        RawDeclaration::author("border-top-style", "solidd"),
        RawDeclaration::author("no-such-property", "1px"),
        RawDeclaration::author("padding-top", "5px"),
    ];
    let resolved = session.resolve_declarations(&raw);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].name, CssName::PaddingTop);

    let s = session.compute(None, &resolved).unwrap();
    assert!(s.is_ident(CssName::BorderTopStyle, &IdentValue::None));
}

#[test]
fn test_important_user_agent_beats_author() {
    let session = StyleSession::new().unwrap();
    let raw = vec![
        RawDeclaration::author("display", "none").with_origin(CssOrigin::UserAgent, true),
        RawDeclaration::author("display", "block"),
    ];
    let resolved = session.resolve_declarations(&raw);
    let s = session.compute(None, &resolved).unwrap();
    assert!(s.is_display_none());
}

#[test]
fn test_later_declaration_wins_within_origin() {
    let session = StyleSession::new().unwrap();
    let s = style(&session, None, &[("width", "10px"), ("width", "20px")]);
    assert_eq!(s.length_px(CssName::Width, 100.0), Some(20.0));
}

#[test]
fn test_em_lengths_use_element_font_size() {
    let session = StyleSession::new().unwrap();
    let parent = style(&session, None, &[("font-size", "10px")]);
    let child = style(&session, Some(&parent), &[("font-size", "2em"), ("margin-top", "1em")]);
    assert!((child.font_size() - 20.0).abs() < f32::EPSILON);
    assert_eq!(child.length_px(CssName::MarginTop, 0.0), Some(20.0));
}

#[test]
fn test_transparent_background_has_no_color() {
    let session = StyleSession::new().unwrap();
    let plain = style(&session, None, &[]);
    assert!(plain.background_color().is_none());
    let filled = style(&session, None, &[("background", "#00ff00")]);
    assert_eq!(
        filled.background_color().map(|c| c.to_rgb()),
        Some(RgbColor::opaque(0, 255, 0))
    );
}

#[test]
fn test_inherit_refused_by_declaration_flag() {
    let session = StyleSession::new().unwrap();
    let refused = RawDeclaration::author("margin-top", "inherit").with_inherit_allowed(false);
    assert!(session.resolve_declarations(&[refused]).is_empty());

    let accepted = session.resolve_declarations(&[RawDeclaration::author("margin-top", "inherit")]);
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].value, PropertyValue::Inherit);

    // A refused `inherit` on an inherited property still leaves the parent's
    // value in place through ordinary inheritance.
    let parent = style(&session, None, &[("color", "red")]);
    let raw = [RawDeclaration::author("color", "inherit").with_inherit_allowed(false)];
    let child = session.compute(Some(&parent), &session.resolve_declarations(&raw)).unwrap();
    assert!(Arc::ptr_eq(&child.value(CssName::Color), &parent.value(CssName::Color)));
}

#[test]
fn test_declarations_allow_inherit_unless_told_otherwise() {
    let decoded: RawDeclaration =
        serde_json::from_str(r#"{ "name": "color", "values": [], "origin": "author" }"#).unwrap();
    assert!(decoded.inherit_allowed);
    assert!(!decoded.important);
}

#[test]
fn test_names_keep_case_and_keywords_fold() {
    let session = StyleSession::new().unwrap();
    let s = style(
        &session,
        None,
        &[("page", "Chapter"), ("display", "BLOCK"), ("font-family", "Times New Roman")],
    );
    assert_eq!(s.page_name(), Some("Chapter"));
    assert_eq!(s.display(), IdentValue::Block);
    assert_eq!(s.font_family(), "Times New Roman");

    let decls = session.resolve_declarations(&[RawDeclaration::author("border-top-style", "Dashed")]);
    assert_eq!(decls[0].value, PropertyValue::ident("dashed"));
}

#[test]
fn test_height_defaults_to_auto() {
    let session = StyleSession::new().unwrap();
    assert!(style(&session, None, &[]).is_auto_height());
    let fixed = style(&session, None, &[("height", "40px")]);
    assert!(!fixed.is_auto_height());
    assert_eq!(fixed.length_px(CssName::Height, 0.0), Some(40.0));
}
