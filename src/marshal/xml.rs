//! Event-level plumbing shared by the marshalling code

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::identifier::Identifier;
use crate::marshal::MarshalError;

/// Pull-reader over a fragment that skips insignificant events.
pub(crate) struct FragmentReader<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> FragmentReader<'a> {
    pub(crate) fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    /// The next significant event.
    ///
    /// Whitespace-only text, comments, processing instructions and the XML
    /// declaration are skipped; end of input is an error while an element is
    /// still being read.
    pub(crate) fn next(&mut self, inside: &str) -> Result<Event<'a>, MarshalError> {
        loop {
            match self.reader.read_event()? {
                Event::Text(text) => {
                    if text.unescape()?.trim().is_empty() {
                        continue;
                    }
                    return Ok(Event::Text(text));
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Eof => {
                    return Err(MarshalError::UnexpectedEof {
                        inside: inside.to_string(),
                    });
                }
                event => return Ok(event),
            }
        }
    }

    /// Consume the closing tag of `element`, rejecting anything else.
    pub(crate) fn expect_end(&mut self, element: &str) -> Result<(), MarshalError> {
        match self.next(element)? {
            Event::End(_) => Ok(()),
            Event::Start(e) | Event::Empty(e) => Err(MarshalError::UnexpectedElement {
                element: element_name(&e, element)?,
                inside: element.to_string(),
            }),
            _ => Err(MarshalError::UnexpectedText {
                inside: element.to_string(),
            }),
        }
    }

    /// Accumulate character data up to the closing tag of `element`.
    pub(crate) fn read_text_until_end(&mut self, element: &str) -> Result<String, MarshalError> {
        let mut text = String::new();
        loop {
            match self.reader.read_event()? {
                Event::Text(chunk) => text.push_str(&chunk.unescape()?),
                Event::CData(chunk) => {
                    text.push_str(&String::from_utf8_lossy(&chunk.into_inner()));
                }
                Event::Comment(_) => continue,
                Event::End(_) => return Ok(text),
                Event::Start(e) | Event::Empty(e) => {
                    return Err(MarshalError::UnexpectedElement {
                        element: element_name(&e, element)?,
                        inside: element.to_string(),
                    });
                }
                Event::Eof => {
                    return Err(MarshalError::UnexpectedEof {
                        inside: element.to_string(),
                    });
                }
                _ => continue,
            }
        }
    }

    /// Check that nothing but insignificant events remains.
    pub(crate) fn expect_eof(&mut self) -> Result<(), MarshalError> {
        loop {
            match self.reader.read_event()? {
                Event::Text(text) => {
                    if text.unescape()?.trim().is_empty() {
                        continue;
                    }
                    return Err(MarshalError::UnexpectedText {
                        inside: "document".to_string(),
                    });
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Eof => return Ok(()),
                Event::Start(e) | Event::Empty(e) => {
                    return Err(MarshalError::UnexpectedElement {
                        element: element_name(&e, "document")?,
                        inside: "document".to_string(),
                    });
                }
                _ => {
                    return Err(MarshalError::UnexpectedText {
                        inside: "document".to_string(),
                    });
                }
            }
        }
    }
}

/// Consume the root element, which must be named `expected`.
///
/// Returns the start event and whether it was self-closing.
pub(crate) fn expect_root<'a>(
    reader: &mut FragmentReader<'a>,
    expected: &'static str,
) -> Result<(BytesStart<'a>, bool), MarshalError> {
    match reader.next("document")? {
        Event::Start(e) => {
            let name = element_name(&e, "document")?;
            if name != expected {
                return Err(MarshalError::UnexpectedRoot {
                    expected,
                    found: name,
                });
            }
            Ok((e, false))
        }
        Event::Empty(e) => {
            let name = element_name(&e, "document")?;
            if name != expected {
                return Err(MarshalError::UnexpectedRoot {
                    expected,
                    found: name,
                });
            }
            Ok((e, true))
        }
        Event::Text(_) | Event::CData(_) => Err(MarshalError::UnexpectedRoot {
            expected,
            found: "text".to_string(),
        }),
        _ => Err(MarshalError::UnexpectedRoot {
            expected,
            found: "end of element".to_string(),
        }),
    }
}

/// The element's local name.
///
/// Serialized fragments carry no namespace prefixes, so a prefixed name is
/// out-of-namespace content and rejected outright.
pub(crate) fn element_name(e: &BytesStart<'_>, inside: &str) -> Result<String, MarshalError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    if name.contains(':') {
        return Err(MarshalError::UnexpectedElement {
            element: name,
            inside: inside.to_string(),
        });
    }
    Ok(name)
}

/// An element's attributes, consumed by name so leftovers can be rejected.
pub(crate) struct Attrs {
    element: String,
    pairs: Vec<(String, String)>,
}

impl Attrs {
    pub(crate) fn read(e: &BytesStart<'_>, element: &str) -> Result<Self, MarshalError> {
        let mut pairs = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if key == "xmlns" || key.contains(':') {
                return Err(MarshalError::UnexpectedAttribute {
                    element: element.to_string(),
                    attribute: key,
                });
            }
            let value = attr.unescape_value()?.into_owned();
            pairs.push((key, value));
        }
        Ok(Self {
            element: element.to_string(),
            pairs,
        })
    }

    /// Remove and return an optional attribute.
    pub(crate) fn take(&mut self, name: &str) -> Option<String> {
        let index = self.pairs.iter().position(|(key, _)| key == name)?;
        Some(self.pairs.remove(index).1)
    }

    /// Remove and return a required attribute.
    pub(crate) fn require(&mut self, name: &'static str) -> Result<String, MarshalError> {
        self.take(name).ok_or_else(|| MarshalError::MissingAttribute {
            element: self.element.clone(),
            attribute: name,
        })
    }

    /// Reject any attribute that was not consumed.
    pub(crate) fn finish(self) -> Result<(), MarshalError> {
        match self.pairs.into_iter().next() {
            None => Ok(()),
            Some((key, _)) => Err(MarshalError::UnexpectedAttribute {
                element: self.element,
                attribute: key,
            }),
        }
    }
}

pub(crate) fn parse_bool(
    element: &str,
    attribute: &'static str,
    value: &str,
) -> Result<bool, MarshalError> {
    // Only the literal strings are accepted; "1"/"True" are format errors.
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(MarshalError::BadAttribute {
            element: element.to_string(),
            attribute,
            value: value.to_string(),
        }),
    }
}

pub(crate) fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

pub(crate) fn parse_u64(
    element: &str,
    attribute: &'static str,
    value: &str,
) -> Result<u64, MarshalError> {
    value.parse().map_err(|_| MarshalError::BadAttribute {
        element: element.to_string(),
        attribute,
        value: value.to_string(),
    })
}

pub(crate) fn parse_duration(
    element: &str,
    attribute: &'static str,
    value: &str,
) -> Result<f64, MarshalError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| MarshalError::BadAttribute {
            element: element.to_string(),
            attribute,
            value: value.to_string(),
        })
}

pub(crate) fn parse_identifier(
    element: &str,
    attribute: &'static str,
    value: &str,
) -> Result<Identifier, MarshalError> {
    Identifier::parse(value).map_err(|_| MarshalError::BadAttribute {
        element: element.to_string(),
        attribute,
        value: value.to_string(),
    })
}

/// Parse a space-separated identifier list attribute.
pub(crate) fn parse_identifier_list(
    element: &str,
    attribute: &'static str,
    value: &str,
) -> Result<Vec<Identifier>, MarshalError> {
    value
        .split_whitespace()
        .map(|token| parse_identifier(element, attribute, token))
        .collect()
}

/// Join identifiers into a space-separated attribute value.
pub(crate) fn join_identifiers<'i>(identifiers: impl IntoIterator<Item = &'i Identifier>) -> String {
    let mut out = String::new();
    for identifier in identifiers {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(identifier.as_str());
    }
    out
}

pub(crate) fn new_writer() -> Writer<Vec<u8>> {
    Writer::new(Vec::new())
}

pub(crate) fn into_string(writer: Writer<Vec<u8>>) -> Result<String, MarshalError> {
    Ok(String::from_utf8(writer.into_inner())?)
}
