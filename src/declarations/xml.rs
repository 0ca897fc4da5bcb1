//! Loading item and test definitions from QTI fragments
//!
//! The loader walks `assessmentItem` and `assessmentTest` documents and
//! builds the declaration model, ignoring everything it does not model
//! (item bodies, processing rules, presentation markup). Recoverable
//! modeling problems, a declaration with an unknown cardinality for
//! instance, are reported once each through a [`LoadingContext`] and the
//! offending element is dropped; malformed XML, malformed embedded values
//! and identifier collisions abort the load.

use std::fmt;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::declarations::error::DeclarationError;
use crate::declarations::item::ItemDef;
use crate::declarations::mapping::{MapEntry, Mapping};
use crate::declarations::test::{ItemRef, TestDef};
use crate::declarations::variable::VariableDeclaration;
use crate::declarations::VariableKind;
use crate::identifier::Identifier;
use crate::marshal::values::{RawScalar, assemble_value};
use crate::marshal::xml::{parse_identifier, FragmentReader};
use crate::marshal::MarshalError;
use crate::plan::{NodeId, TestPlan, TestPlanBuilder};
use crate::value::{BaseType, Cardinality, SingleValue, Value};

/// One recoverable modeling problem found while loading declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadNotice {
    element: String,
    message: String,
}

impl LoadNotice {
    /// Record a problem against the element it was found on.
    pub fn new(element: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            message: message.into(),
        }
    }

    /// The element the problem was found on.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// What was wrong with it.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoadNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.element, self.message)
    }
}

/// Receives one call per recoverable modeling problem during loading.
///
/// Loading never aborts through this channel; the callback collects, the
/// loader drops the offending element and continues.
pub trait LoadingContext {
    /// Record one problem.
    fn notice(&mut self, notice: LoadNotice);
}

/// A [`LoadingContext`] that simply accumulates notices
#[derive(Debug, Default)]
pub struct CollectingContext {
    notices: Vec<LoadNotice>,
}

impl CollectingContext {
    /// Start with no notices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything collected so far, in discovery order.
    pub fn notices(&self) -> &[LoadNotice] {
        &self.notices
    }

    /// Whether loading finished without a single problem.
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    /// Consume the context, keeping the notices.
    pub fn into_notices(self) -> Vec<LoadNotice> {
        self.notices
    }
}

impl LoadingContext for CollectingContext {
    fn notice(&mut self, notice: LoadNotice) {
        log::debug!("declaration loading: {notice}");
        self.notices.push(notice);
    }
}

/// Errors that abort declaration loading outright
///
/// Recoverable modeling problems go through [`LoadingContext`] instead; only
/// malformed XML, malformed embedded values and identifier collisions end
/// the load.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The fragment's XML structure or an embedded value was malformed
    #[error(transparent)]
    Xml(#[from] MarshalError),

    /// Declarations collided or misused a reserved name
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

/// A loaded test definition together with its default plan
///
/// The plan lists every referenced item once, in document order. Selection
/// and ordering rules belong to the session-orchestration layer, which
/// builds its own plan when they apply.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTest {
    /// The test's declarations and item references
    pub test: TestDef,
    /// The document-order navigation tree
    pub plan: TestPlan,
}

/// Load an item definition from an `assessmentItem` fragment.
pub fn load_item(xml: &str, context: &mut dyn LoadingContext) -> Result<ItemDef, LoadError> {
    let mut reader = FragmentReader::new(xml);
    let (root, empty) = named_root(&mut reader, "assessmentItem")?;
    let identifier_text = require_attr(&root, "assessmentItem", "identifier")?;
    let identifier = parse_identifier("assessmentItem", "identifier", &identifier_text)?;
    let title = attr_value(&root, "title")?;

    let mut declarations = Vec::new();
    if !empty {
        loop {
            let (child, child_empty) = match next_child(&mut reader, "assessmentItem")? {
                Child::Element(child, child_empty) => (child, child_empty),
                Child::End => break,
            };
            let name = local_name(&child);
            match VariableKind::from_declaration_element(&name) {
                Some(kind) => {
                    let loaded =
                        load_declaration(&mut reader, &child, child_empty, kind, context)?;
                    if let Some(declaration) = loaded {
                        declarations.push(declaration);
                    }
                }
                // Bodies, processing rules and any other markup are out of
                // scope for the declaration model.
                None => {
                    if !child_empty {
                        skip_subtree(&mut reader, &name)?;
                    }
                }
            }
        }
    }
    reader.expect_eof()?;

    let item = ItemDef::new(identifier, declarations)?;
    Ok(match title {
        Some(title) => item.with_title(title),
        None => item,
    })
}

/// Load a test definition and its document-order plan from an
/// `assessmentTest` fragment.
///
/// `items` supplies the referenced item definitions, matched by identifier
/// against each `assessmentItemRef`. A reference with no matching definition
/// is reported and dropped from both the test and the plan.
pub fn load_test(
    xml: &str,
    items: &[Arc<ItemDef>],
    context: &mut dyn LoadingContext,
) -> Result<LoadedTest, LoadError> {
    let by_identifier: FxHashMap<&Identifier, Arc<ItemDef>> = items
        .iter()
        .map(|item| (item.identifier(), Arc::clone(item)))
        .collect();

    let mut reader = FragmentReader::new(xml);
    let (root, empty) = named_root(&mut reader, "assessmentTest")?;
    let identifier_text = require_attr(&root, "assessmentTest", "identifier")?;
    let identifier = parse_identifier("assessmentTest", "identifier", &identifier_text)?;
    let title = attr_value(&root, "title")?;

    let mut outcomes = Vec::new();
    let mut item_refs = Vec::new();
    let mut builder = TestPlanBuilder::new();
    if !empty {
        loop {
            let (child, child_empty) = match next_child(&mut reader, "assessmentTest")? {
                Child::Element(child, child_empty) => (child, child_empty),
                Child::End => break,
            };
            let name = local_name(&child);
            match name.as_str() {
                "outcomeDeclaration" => {
                    let loaded = load_declaration(
                        &mut reader,
                        &child,
                        child_empty,
                        VariableKind::Outcome,
                        context,
                    )?;
                    if let Some(declaration) = loaded {
                        outcomes.push(declaration);
                    }
                }
                "testPart" => load_test_part(
                    &mut reader,
                    &child,
                    child_empty,
                    &by_identifier,
                    &mut builder,
                    &mut item_refs,
                    context,
                )?,
                _ => {
                    if !child_empty {
                        skip_subtree(&mut reader, &name)?;
                    }
                }
            }
        }
    }
    reader.expect_eof()?;

    let test = TestDef::new(identifier, outcomes, item_refs)?;
    let test = match title {
        Some(title) => test.with_title(title),
        None => test,
    };
    Ok(LoadedTest {
        test,
        plan: builder.build(),
    })
}

fn load_test_part(
    reader: &mut FragmentReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    items: &FxHashMap<&Identifier, Arc<ItemDef>>,
    builder: &mut TestPlanBuilder,
    item_refs: &mut Vec<ItemRef>,
    context: &mut dyn LoadingContext,
) -> Result<(), LoadError> {
    let Some(identifier) = checked_identifier(e, "testPart", context)? else {
        if !empty {
            skip_subtree(reader, "testPart")?;
        }
        return Ok(());
    };
    let part = builder.add_test_part(identifier);
    if empty {
        return Ok(());
    }
    loop {
        let (child, child_empty) = match next_child(reader, "testPart")? {
            Child::Element(child, child_empty) => (child, child_empty),
            Child::End => return Ok(()),
        };
        let name = local_name(&child);
        if name == "assessmentSection" {
            load_section(
                reader, &child, child_empty, part, items, builder, item_refs, context,
            )?;
        } else if !child_empty {
            skip_subtree(reader, &name)?;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn load_section(
    reader: &mut FragmentReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    parent: NodeId,
    items: &FxHashMap<&Identifier, Arc<ItemDef>>,
    builder: &mut TestPlanBuilder,
    item_refs: &mut Vec<ItemRef>,
    context: &mut dyn LoadingContext,
) -> Result<(), LoadError> {
    let Some(identifier) = checked_identifier(e, "assessmentSection", context)? else {
        if !empty {
            skip_subtree(reader, "assessmentSection")?;
        }
        return Ok(());
    };
    let section = builder
        .add_section(parent, identifier)
        .map_err(MarshalError::Plan)?;
    if empty {
        return Ok(());
    }
    loop {
        let (child, child_empty) = match next_child(reader, "assessmentSection")? {
            Child::Element(child, child_empty) => (child, child_empty),
            Child::End => return Ok(()),
        };
        let name = local_name(&child);
        match name.as_str() {
            "assessmentSection" => load_section(
                reader, &child, child_empty, section, items, builder, item_refs, context,
            )?,
            "assessmentItemRef" => load_item_ref(
                reader, &child, child_empty, section, items, builder, item_refs, context,
            )?,
            _ => {
                if !child_empty {
                    skip_subtree(reader, &name)?;
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn load_item_ref(
    reader: &mut FragmentReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    section: NodeId,
    items: &FxHashMap<&Identifier, Arc<ItemDef>>,
    builder: &mut TestPlanBuilder,
    item_refs: &mut Vec<ItemRef>,
    context: &mut dyn LoadingContext,
) -> Result<(), LoadError> {
    let Some(identifier) = checked_identifier(e, "assessmentItemRef", context)? else {
        if !empty {
            skip_subtree(reader, "assessmentItemRef")?;
        }
        return Ok(());
    };
    let Some(item) = items.get(&identifier) else {
        context.notice(LoadNotice::new(
            "assessmentItemRef",
            format!("no item definition supplied for reference '{identifier}'"),
        ));
        if !empty {
            skip_subtree(reader, "assessmentItemRef")?;
        }
        return Ok(());
    };

    let mut reference = ItemRef::new(identifier.clone(), Arc::clone(item));
    if !empty {
        loop {
            let (child, child_empty) = match next_child(reader, "assessmentItemRef")? {
                Child::Element(child, child_empty) => (child, child_empty),
                Child::End => break,
            };
            let name = local_name(&child);
            if name == "weight" {
                if let Some((weight_identifier, value)) = read_weight(&child, context)? {
                    reference = reference.with_weight(weight_identifier, value)?;
                }
                if !child_empty {
                    skip_subtree(reader, "weight")?;
                }
            } else if !child_empty {
                skip_subtree(reader, &name)?;
            }
        }
    }
    builder
        .add_item_ref(section, identifier)
        .map_err(MarshalError::Plan)?;
    item_refs.push(reference);
    Ok(())
}

fn read_weight(
    e: &BytesStart<'_>,
    context: &mut dyn LoadingContext,
) -> Result<Option<(Identifier, f64)>, LoadError> {
    let Some(identifier) = checked_identifier(e, "weight", context)? else {
        return Ok(None);
    };
    let Some(value_text) = attr_value(e, "value")? else {
        context.notice(LoadNotice::new(
            "weight",
            format!("weight '{identifier}' is missing required attribute 'value'"),
        ));
        return Ok(None);
    };
    let Ok(value) = value_text.parse::<f64>() else {
        context.notice(LoadNotice::new(
            "weight",
            format!("weight '{identifier}' has non-numeric value '{value_text}'"),
        ));
        return Ok(None);
    };
    Ok(Some((identifier, value)))
}

fn load_declaration(
    reader: &mut FragmentReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    kind: VariableKind,
    context: &mut dyn LoadingContext,
) -> Result<Option<VariableDeclaration>, LoadError> {
    let element = kind.declaration_element();
    let Some(identifier) = checked_identifier(e, element, context)? else {
        if !empty {
            skip_subtree(reader, element)?;
        }
        return Ok(None);
    };

    let shape = declared_shape(e, element, &identifier, context)?;
    let Some((cardinality, base_type)) = shape else {
        if !empty {
            skip_subtree(reader, element)?;
        }
        return Ok(None);
    };
    let mut declaration =
        match VariableDeclaration::new(identifier, kind, cardinality, base_type) {
            Ok(declaration) => declaration,
            Err(error) => {
                context.notice(LoadNotice::new(element, error.to_string()));
                if !empty {
                    skip_subtree(reader, element)?;
                }
                return Ok(None);
            }
        };
    if empty {
        return Ok(Some(declaration));
    }

    let mut default_seen = false;
    let mut correct_seen = false;
    let mut mapping_seen = false;
    loop {
        let (child, child_empty) = match next_child(reader, element)? {
            Child::Element(child, child_empty) => (child, child_empty),
            Child::End => break,
        };
        let name = local_name(&child);
        match name.as_str() {
            "defaultValue" => {
                if default_seen {
                    context.notice(LoadNotice::new(element, "more than one defaultValue"));
                    if !child_empty {
                        skip_subtree(reader, "defaultValue")?;
                    }
                    continue;
                }
                default_seen = true;
                let value =
                    read_declared_value(reader, "defaultValue", cardinality, base_type, child_empty)?;
                declaration = declaration.with_default_value(value);
            }
            "correctResponse" => {
                if kind != VariableKind::Response {
                    context.notice(LoadNotice::new(
                        element,
                        format!("{kind} declarations cannot carry a correctResponse"),
                    ));
                    if !child_empty {
                        skip_subtree(reader, "correctResponse")?;
                    }
                    continue;
                }
                if correct_seen {
                    context.notice(LoadNotice::new(element, "more than one correctResponse"));
                    if !child_empty {
                        skip_subtree(reader, "correctResponse")?;
                    }
                    continue;
                }
                correct_seen = true;
                let value = read_declared_value(
                    reader,
                    "correctResponse",
                    cardinality,
                    base_type,
                    child_empty,
                )?;
                declaration = declaration.with_correct_response(value)?;
            }
            "mapping" => {
                if kind != VariableKind::Response {
                    context.notice(LoadNotice::new(
                        element,
                        format!("{kind} declarations cannot carry a mapping"),
                    ));
                    if !child_empty {
                        skip_subtree(reader, "mapping")?;
                    }
                    continue;
                }
                if mapping_seen {
                    context.notice(LoadNotice::new(element, "more than one mapping"));
                    if !child_empty {
                        skip_subtree(reader, "mapping")?;
                    }
                    continue;
                }
                mapping_seen = true;
                let loaded = load_mapping(reader, &child, child_empty, base_type, context)?;
                if let Some(mapping) = loaded {
                    declaration = declaration.with_mapping(mapping)?;
                }
            }
            _ => {
                if !child_empty {
                    skip_subtree(reader, &name)?;
                }
            }
        }
    }
    Ok(Some(declaration))
}

/// Read `cardinality` and optional `baseType`; `None` means the shape was
/// unusable and has been reported.
fn declared_shape(
    e: &BytesStart<'_>,
    element: &'static str,
    identifier: &Identifier,
    context: &mut dyn LoadingContext,
) -> Result<Option<(Cardinality, Option<BaseType>)>, LoadError> {
    let Some(cardinality_text) = attr_value(e, "cardinality")? else {
        context.notice(LoadNotice::new(
            element,
            format!("'{identifier}' is missing required attribute 'cardinality'"),
        ));
        return Ok(None);
    };
    let Some(cardinality) = Cardinality::from_qti_name(&cardinality_text) else {
        context.notice(LoadNotice::new(
            element,
            format!("'{identifier}' has unknown cardinality '{cardinality_text}'"),
        ));
        return Ok(None);
    };
    let base_type = match attr_value(e, "baseType")? {
        None => None,
        Some(text) => match BaseType::from_qti_name(&text) {
            Some(base_type) => Some(base_type),
            None => {
                context.notice(LoadNotice::new(
                    element,
                    format!("'{identifier}' has unknown baseType '{text}'"),
                ));
                return Ok(None);
            }
        },
    };
    Ok(Some((cardinality, base_type)))
}

/// Read the `value` children of a `defaultValue` or `correctResponse`.
///
/// Unlike serialized state fragments, declaration documents keep their
/// namespace prefixes, so children are matched by local name and foreign
/// attributes are ignored. A malformed embedded value is still fatal.
fn read_declared_value(
    reader: &mut FragmentReader<'_>,
    element: &str,
    cardinality: Cardinality,
    base_type: Option<BaseType>,
    empty: bool,
) -> Result<Value, MarshalError> {
    let mut children = Vec::new();
    if !empty {
        loop {
            let (child, child_empty) = match next_child(reader, element)? {
                Child::Element(child, child_empty) => (child, child_empty),
                Child::End => break,
            };
            let name = local_name(&child);
            if name != "value" {
                return Err(MarshalError::UnexpectedElement {
                    element: name,
                    inside: element.to_string(),
                });
            }
            let child_base_type = match attr_value(&child, "baseType")? {
                None => None,
                Some(text) => Some(BaseType::from_qti_name(&text).ok_or_else(|| {
                    MarshalError::BadAttribute {
                        element: "value".to_string(),
                        attribute: "baseType",
                        value: text.clone(),
                    }
                })?),
            };
            let field = match attr_value(&child, "fieldIdentifier")? {
                None => None,
                Some(text) => Some(parse_identifier("value", "fieldIdentifier", &text)?),
            };
            let text = if child_empty {
                String::new()
            } else {
                reader.read_text_until_end("value")?
            };
            children.push(RawScalar::new(child_base_type, field, text));
        }
    }
    assemble_value(element, Some(cardinality), base_type, children)
}

fn load_mapping(
    reader: &mut FragmentReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
    base_type: Option<BaseType>,
    context: &mut dyn LoadingContext,
) -> Result<Option<Mapping>, LoadError> {
    let Some(base_type) = base_type else {
        context.notice(LoadNotice::new(
            "mapping",
            "record declarations cannot carry a mapping; map keys have no base type",
        ));
        if !empty {
            skip_subtree(reader, "mapping")?;
        }
        return Ok(None);
    };
    let Some(default_value) = float_attr(e, "mapping", "defaultValue", 0.0, context)? else {
        if !empty {
            skip_subtree(reader, "mapping")?;
        }
        return Ok(None);
    };
    let lower_bound = match attr_value(e, "lowerBound")? {
        None => None,
        Some(text) => match text.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                context.notice(LoadNotice::new(
                    "mapping",
                    format!("non-numeric lowerBound '{text}'"),
                ));
                if !empty {
                    skip_subtree(reader, "mapping")?;
                }
                return Ok(None);
            }
        },
    };
    let upper_bound = match attr_value(e, "upperBound")? {
        None => None,
        Some(text) => match text.parse::<f64>() {
            Ok(value) => Some(value),
            Err(_) => {
                context.notice(LoadNotice::new(
                    "mapping",
                    format!("non-numeric upperBound '{text}'"),
                ));
                if !empty {
                    skip_subtree(reader, "mapping")?;
                }
                return Ok(None);
            }
        },
    };

    let mut entries = Vec::new();
    if !empty {
        loop {
            let (child, child_empty) = match next_child(reader, "mapping")? {
                Child::Element(child, child_empty) => (child, child_empty),
                Child::End => break,
            };
            let name = local_name(&child);
            if name == "mapEntry" {
                if let Some(entry) = read_map_entry(&child, base_type, context)? {
                    entries.push(entry);
                }
                if !child_empty {
                    skip_subtree(reader, "mapEntry")?;
                }
            } else if !child_empty {
                skip_subtree(reader, &name)?;
            }
        }
    }

    match Mapping::new(default_value, lower_bound, upper_bound, entries) {
        Ok(mapping) => Ok(Some(mapping)),
        Err(error) => {
            context.notice(LoadNotice::new("mapping", error.to_string()));
            Ok(None)
        }
    }
}

fn read_map_entry(
    e: &BytesStart<'_>,
    base_type: BaseType,
    context: &mut dyn LoadingContext,
) -> Result<Option<MapEntry>, LoadError> {
    let Some(key_text) = attr_value(e, "mapKey")? else {
        context.notice(LoadNotice::new(
            "mapEntry",
            "missing required attribute 'mapKey'",
        ));
        return Ok(None);
    };
    let map_key = match SingleValue::parse(base_type, &key_text) {
        Ok(scalar) => scalar,
        Err(error) => {
            context.notice(LoadNotice::new(
                "mapEntry",
                format!("mapKey '{key_text}' does not parse as {base_type}: {error}"),
            ));
            return Ok(None);
        }
    };
    let Some(mapped_text) = attr_value(e, "mappedValue")? else {
        context.notice(LoadNotice::new(
            "mapEntry",
            "missing required attribute 'mappedValue'",
        ));
        return Ok(None);
    };
    let Ok(mapped) = mapped_text.parse::<f64>() else {
        context.notice(LoadNotice::new(
            "mapEntry",
            format!("non-numeric mappedValue '{mapped_text}'"),
        ));
        return Ok(None);
    };

    let mut entry = MapEntry::new(map_key, mapped);
    match attr_value(e, "caseSensitive")?.as_deref() {
        None | Some("true") => {}
        Some("false") => entry = entry.case_insensitive(),
        Some(other) => {
            context.notice(LoadNotice::new(
                "mapEntry",
                format!("caseSensitive must be 'true' or 'false', not '{other}'"),
            ));
            return Ok(None);
        }
    }
    Ok(Some(entry))
}

/// Parse an optional float attribute, substituting `missing` when absent;
/// `None` means a present-but-non-numeric value was reported.
fn float_attr(
    e: &BytesStart<'_>,
    element: &'static str,
    attribute: &'static str,
    missing: f64,
    context: &mut dyn LoadingContext,
) -> Result<Option<f64>, LoadError> {
    match attr_value(e, attribute)? {
        None => Ok(Some(missing)),
        Some(text) => match text.parse::<f64>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                context.notice(LoadNotice::new(
                    element,
                    format!("non-numeric {attribute} '{text}'"),
                ));
                Ok(None)
            }
        },
    }
}

enum Child<'a> {
    Element(BytesStart<'a>, bool),
    End,
}

/// Next child element of `inside`, tolerating interleaved character data.
fn next_child<'a>(
    reader: &mut FragmentReader<'a>,
    inside: &str,
) -> Result<Child<'a>, MarshalError> {
    loop {
        match reader.next(inside)? {
            Event::Start(e) => return Ok(Child::Element(e, false)),
            Event::Empty(e) => return Ok(Child::Element(e, true)),
            Event::End(_) => return Ok(Child::End),
            // Mixed content such as rubric text is not modelled.
            _ => {}
        }
    }
}

/// Consume everything up to and including the end tag of an already-opened
/// element.
fn skip_subtree(reader: &mut FragmentReader<'_>, inside: &str) -> Result<(), MarshalError> {
    let mut depth = 0usize;
    loop {
        match reader.next(inside)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            _ => {}
        }
    }
}

/// Consume the root element, comparing by local name so namespace prefixes
/// on the document do not matter.
fn named_root<'a>(
    reader: &mut FragmentReader<'a>,
    expected: &'static str,
) -> Result<(BytesStart<'a>, bool), MarshalError> {
    let (e, empty) = match reader.next("document")? {
        Event::Start(e) => (e, false),
        Event::Empty(e) => (e, true),
        _ => {
            return Err(MarshalError::UnexpectedRoot {
                expected,
                found: "text".to_string(),
            });
        }
    };
    let name = local_name(&e);
    if name != expected {
        return Err(MarshalError::UnexpectedRoot {
            expected,
            found: name,
        });
    }
    Ok((e, empty))
}

fn local_name(e: &BytesStart<'_>) -> String {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name,
    }
}

/// Look one attribute up by name, ignoring everything else on the element.
///
/// Declaration documents carry schema locations, namespace declarations and
/// tool-specific attributes; the loader reads what it models and leaves the
/// rest alone.
fn attr_value(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, MarshalError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn require_attr(
    e: &BytesStart<'_>,
    element: &str,
    attribute: &'static str,
) -> Result<String, MarshalError> {
    attr_value(e, attribute)?.ok_or_else(|| MarshalError::MissingAttribute {
        element: element.to_string(),
        attribute,
    })
}

/// Read the `identifier` attribute; `None` means it was missing or malformed
/// and has been reported.
fn checked_identifier(
    e: &BytesStart<'_>,
    element: &'static str,
    context: &mut dyn LoadingContext,
) -> Result<Option<Identifier>, LoadError> {
    let Some(text) = attr_value(e, "identifier")? else {
        context.notice(LoadNotice::new(
            element,
            "missing required attribute 'identifier'",
        ));
        return Ok(None);
    };
    match Identifier::parse(&text) {
        Ok(identifier) => Ok(Some(identifier)),
        Err(error) => {
            context.notice(LoadNotice::new(
                element,
                format!("invalid identifier '{text}': {error}"),
            ));
            Ok(None)
        }
    }
}
