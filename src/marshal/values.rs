//! Reading and writing typed values as `value` children

use indexmap::IndexMap;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::identifier::Identifier;
use crate::marshal::xml::{element_name, parse_identifier, Attrs, FragmentReader};
use crate::marshal::MarshalError;
use crate::value::{BaseType, Cardinality, SingleValue, Value};

/// Write one value-carrying element: shape attributes on the element itself,
/// one `value` child per scalar.
///
/// Null writes a bare self-closing element with no shape attributes and no
/// children. Record children carry their own `baseType` and a
/// `fieldIdentifier`; all other children are attribute-free.
pub(crate) fn write_value_element(
    writer: &mut Writer<Vec<u8>>,
    element: &str,
    attrs: &[(&str, &str)],
    value: &Value,
) -> Result<(), MarshalError> {
    let mut start = BytesStart::new(element);
    for (key, attr_value) in attrs {
        start.push_attribute((*key, *attr_value));
    }
    match value {
        Value::Null => {
            writer.write_event(Event::Empty(start))?;
        }
        // Empty containers are not representable; construction folds them to
        // null, so a directly built empty vector serializes the same way.
        Value::Multiple(elements) | Value::Ordered(elements) if elements.is_empty() => {
            writer.write_event(Event::Empty(start))?;
        }
        Value::Record(fields) if fields.is_empty() => {
            writer.write_event(Event::Empty(start))?;
        }
        Value::Single(scalar) => {
            start.push_attribute(("cardinality", Cardinality::Single.qti_name()));
            start.push_attribute(("baseType", scalar.base_type().qti_name()));
            writer.write_event(Event::Start(start))?;
            write_scalar(writer, None, scalar)?;
            writer.write_event(Event::End(BytesEnd::new(element)))?;
        }
        Value::Multiple(elements) | Value::Ordered(elements) => {
            let cardinality = match value {
                Value::Multiple(_) => Cardinality::Multiple,
                _ => Cardinality::Ordered,
            };
            start.push_attribute(("cardinality", cardinality.qti_name()));
            start.push_attribute(("baseType", elements[0].base_type().qti_name()));
            writer.write_event(Event::Start(start))?;
            for scalar in elements {
                write_scalar(writer, None, scalar)?;
            }
            writer.write_event(Event::End(BytesEnd::new(element)))?;
        }
        Value::Record(fields) => {
            start.push_attribute(("cardinality", Cardinality::Record.qti_name()));
            writer.write_event(Event::Start(start))?;
            for (field, scalar) in fields {
                write_scalar(writer, Some(field), scalar)?;
            }
            writer.write_event(Event::End(BytesEnd::new(element)))?;
        }
    }
    Ok(())
}

fn write_scalar(
    writer: &mut Writer<Vec<u8>>,
    field: Option<&Identifier>,
    scalar: &SingleValue,
) -> Result<(), MarshalError> {
    let mut start = BytesStart::new("value");
    if let Some(field) = field {
        start.push_attribute(("baseType", scalar.base_type().qti_name()));
        start.push_attribute(("fieldIdentifier", field.as_str()));
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(&scalar.to_string())))?;
    writer.write_event(Event::End(BytesEnd::new("value")))?;
    Ok(())
}

/// One `value` child as read from the document, shape still unchecked.
pub(crate) struct RawScalar {
    base_type: Option<BaseType>,
    field: Option<Identifier>,
    text: String,
}

impl RawScalar {
    /// A scalar read by another syntax layer, ready for shape checking.
    pub(crate) fn new(base_type: Option<BaseType>, field: Option<Identifier>, text: String) -> Self {
        Self {
            base_type,
            field,
            text,
        }
    }
}

/// Read all `value` children of `element`, consuming its end tag.
pub(crate) fn read_value_children(
    reader: &mut FragmentReader<'_>,
    element: &str,
) -> Result<Vec<RawScalar>, MarshalError> {
    let mut children = Vec::new();
    loop {
        match reader.next(element)? {
            Event::Start(e) => {
                let child = read_scalar_attrs(&e, element)?;
                let text = reader.read_text_until_end("value")?;
                children.push(RawScalar { text, ..child });
            }
            Event::Empty(e) => {
                children.push(read_scalar_attrs(&e, element)?);
            }
            Event::End(_) => return Ok(children),
            _ => {
                return Err(MarshalError::UnexpectedText {
                    inside: element.to_string(),
                });
            }
        }
    }
}

/// Combine a shape and raw `value` children into a [`Value`].
///
/// A `cardinality` of `None` is the null shape, which permits neither a base
/// type nor children. The shape rules are all-or-nothing: any mismatch
/// rejects the whole element.
pub(crate) fn assemble_value(
    element: &str,
    cardinality: Option<Cardinality>,
    base_type: Option<BaseType>,
    mut children: Vec<RawScalar>,
) -> Result<Value, MarshalError> {
    let Some(cardinality) = cardinality else {
        if base_type.is_some() {
            return Err(MarshalError::UnexpectedAttribute {
                element: element.to_string(),
                attribute: "baseType".to_string(),
            });
        }
        if !children.is_empty() {
            return Err(MarshalError::NullWithChildren {
                element: element.to_string(),
            });
        }
        return Ok(Value::Null);
    };

    match cardinality {
        Cardinality::Single => {
            let base_type = required_base_type(element, base_type)?;
            if children.len() != 1 {
                return Err(MarshalError::WrongValueCount {
                    element: element.to_string(),
                    cardinality,
                    count: children.len(),
                });
            }
            let child = children.remove(0);
            let scalar = parse_plain_scalar(element, base_type, child)?;
            Ok(Value::Single(scalar))
        }
        Cardinality::Multiple | Cardinality::Ordered => {
            let base_type = required_base_type(element, base_type)?;
            if children.is_empty() {
                return Err(MarshalError::WrongValueCount {
                    element: element.to_string(),
                    cardinality,
                    count: 0,
                });
            }
            let mut scalars = Vec::with_capacity(children.len());
            for child in children {
                scalars.push(parse_plain_scalar(element, base_type, child)?);
            }
            // All elements parsed under one base type and the vector is
            // non-empty, which is exactly the container invariant.
            Ok(match cardinality {
                Cardinality::Multiple => Value::Multiple(scalars),
                _ => Value::Ordered(scalars),
            })
        }
        Cardinality::Record => {
            if base_type.is_some() {
                return Err(MarshalError::UnexpectedAttribute {
                    element: element.to_string(),
                    attribute: "baseType".to_string(),
                });
            }
            if children.is_empty() {
                return Err(MarshalError::WrongValueCount {
                    element: element.to_string(),
                    cardinality,
                    count: 0,
                });
            }
            let mut fields: IndexMap<Identifier, SingleValue> = IndexMap::new();
            for child in children {
                let Some(base_type) = child.base_type else {
                    return Err(MarshalError::MissingAttribute {
                        element: "value".to_string(),
                        attribute: "baseType",
                    });
                };
                let Some(field) = child.field else {
                    return Err(MarshalError::MissingAttribute {
                        element: "value".to_string(),
                        attribute: "fieldIdentifier",
                    });
                };
                let scalar =
                    SingleValue::parse(base_type, &child.text).map_err(|source| {
                        MarshalError::BadScalar {
                            element: element.to_string(),
                            text: child.text.clone(),
                            source,
                        }
                    })?;
                if fields.insert(field.clone(), scalar).is_some() {
                    return Err(MarshalError::DuplicateField {
                        element: element.to_string(),
                        field: field.to_string(),
                    });
                }
            }
            Ok(Value::Record(fields))
        }
    }
}

/// Read the body of a value-carrying element whose start event has already
/// been consumed, taking the shape from its `cardinality` and `baseType`
/// attributes. `empty` marks a self-closing element.
pub(crate) fn read_value_body(
    reader: &mut FragmentReader<'_>,
    element: &str,
    attrs: &mut Attrs,
    empty: bool,
) -> Result<Value, MarshalError> {
    let cardinality = match attrs.take("cardinality") {
        None => None,
        Some(text) => Some(Cardinality::from_qti_name(&text).ok_or_else(|| {
            MarshalError::BadAttribute {
                element: element.to_string(),
                attribute: "cardinality",
                value: text.clone(),
            }
        })?),
    };
    let base_type = match attrs.take("baseType") {
        None => None,
        Some(text) => Some(BaseType::from_qti_name(&text).ok_or_else(|| {
            MarshalError::BadAttribute {
                element: element.to_string(),
                attribute: "baseType",
                value: text.clone(),
            }
        })?),
    };
    let children = if empty {
        Vec::new()
    } else {
        read_value_children(reader, element)?
    };
    assemble_value(element, cardinality, base_type, children)
}

fn read_scalar_attrs(e: &BytesStart<'_>, inside: &str) -> Result<RawScalar, MarshalError> {
    let name = element_name(e, inside)?;
    if name != "value" {
        return Err(MarshalError::UnexpectedElement {
            element: name,
            inside: inside.to_string(),
        });
    }
    let mut attrs = Attrs::read(e, "value")?;
    let base_type = match attrs.take("baseType") {
        None => None,
        Some(text) => Some(BaseType::from_qti_name(&text).ok_or_else(|| {
            MarshalError::BadAttribute {
                element: "value".to_string(),
                attribute: "baseType",
                value: text.clone(),
            }
        })?),
    };
    let field = match attrs.take("fieldIdentifier") {
        None => None,
        Some(text) => Some(parse_identifier("value", "fieldIdentifier", &text)?),
    };
    attrs.finish()?;
    Ok(RawScalar {
        base_type,
        field,
        text: String::new(),
    })
}

fn required_base_type(
    element: &str,
    base_type: Option<BaseType>,
) -> Result<BaseType, MarshalError> {
    base_type.ok_or_else(|| MarshalError::MissingAttribute {
        element: element.to_string(),
        attribute: "baseType",
    })
}

fn parse_plain_scalar(
    element: &str,
    base_type: BaseType,
    child: RawScalar,
) -> Result<SingleValue, MarshalError> {
    if child.base_type.is_some() {
        return Err(MarshalError::UnexpectedAttribute {
            element: "value".to_string(),
            attribute: "baseType".to_string(),
        });
    }
    if child.field.is_some() {
        return Err(MarshalError::UnexpectedAttribute {
            element: "value".to_string(),
            attribute: "fieldIdentifier".to_string(),
        });
    }
    SingleValue::parse(base_type, &child.text).map_err(|source| MarshalError::BadScalar {
        element: element.to_string(),
        text: child.text,
        source,
    })
}

/// Write one element per map entry, each carrying its identifier.
pub(crate) fn write_variables(
    writer: &mut Writer<Vec<u8>>,
    element: &str,
    values: &IndexMap<Identifier, Value>,
) -> Result<(), MarshalError> {
    for (identifier, value) in values {
        write_value_element(writer, element, &[("identifier", identifier.as_str())], value)?;
    }
    Ok(())
}

/// Read one variable element into its identifier and value.
pub(crate) fn read_variable(
    reader: &mut FragmentReader<'_>,
    element: &str,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<(Identifier, Value), MarshalError> {
    let mut attrs = Attrs::read(e, element)?;
    let identifier_text = attrs.require("identifier")?;
    let identifier = parse_identifier(element, "identifier", &identifier_text)?;
    let value = read_value_body(reader, element, &mut attrs, empty)?;
    attrs.finish()?;
    Ok((identifier, value))
}
