//! Marshalling of item session state

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::declarations::VariableKind;
use crate::marshal::values::{read_variable, write_variables};
use crate::marshal::xml::{
    bool_text, element_name, expect_root, into_string, join_identifiers, new_writer, parse_bool,
    parse_duration, parse_identifier, parse_identifier_list, parse_u64, Attrs, FragmentReader,
};
use crate::marshal::MarshalError;
use crate::session::{ItemSessionState, SessionStatus};

const ELEMENT: &str = "itemSessionState";

/// Serialize one item session state to an XML fragment.
pub fn marshal_item_session_state(state: &ItemSessionState) -> Result<String, MarshalError> {
    let mut writer = new_writer();
    write_item_state(&mut writer, state)?;
    into_string(writer)
}

/// Rebuild an item session state from [`marshal_item_session_state`] output.
pub fn unmarshal_item_session_state(xml: &str) -> Result<ItemSessionState, MarshalError> {
    let mut reader = FragmentReader::new(xml);
    let (root, empty) = expect_root(&mut reader, ELEMENT)?;
    let state = read_item_state(&mut reader, &root, empty)?;
    reader.expect_eof()?;
    Ok(state)
}

pub(crate) fn write_item_state(
    writer: &mut Writer<Vec<u8>>,
    state: &ItemSessionState,
) -> Result<(), MarshalError> {
    let mut start = BytesStart::new(ELEMENT);
    start.push_attribute(("initialized", bool_text(state.is_initialized())));
    start.push_attribute(("presented", bool_text(state.is_presented())));
    start.push_attribute(("responded", bool_text(state.is_responded())));
    start.push_attribute(("closed", bool_text(state.is_closed())));
    if let Some(status) = state.session_status() {
        start.push_attribute(("sessionStatus", status.qti_name()));
    }
    if let Some(sequence) = state.entry_sequence() {
        start.push_attribute(("entrySequence", sequence.to_string().as_str()));
    }
    start.push_attribute(("numAttempts", state.num_attempts().to_string().as_str()));
    start.push_attribute(("duration", state.duration_accumulated().to_string().as_str()));
    if !state.bad_responses().is_empty() {
        let joined = join_identifiers(state.bad_responses());
        start.push_attribute(("badResponseIdentifiers", joined.as_str()));
    }
    if !state.invalid_responses().is_empty() {
        let joined = join_identifiers(state.invalid_responses());
        start.push_attribute(("invalidResponseIdentifiers", joined.as_str()));
    }

    let has_children = !state.shuffled_orders().is_empty()
        || !state.template_values().is_empty()
        || !state.response_values().is_empty()
        || !state.outcome_values().is_empty()
        || !state.overridden_template_defaults().is_empty()
        || !state.overridden_response_defaults().is_empty()
        || !state.overridden_outcome_defaults().is_empty()
        || !state.overridden_correct_responses().is_empty()
        || state.candidate_comment().is_some();
    if !has_children {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;

    for (response, order) in state.shuffled_orders() {
        let mut choice = BytesStart::new("shuffledInteractionChoiceOrder");
        choice.push_attribute(("responseIdentifier", response.as_str()));
        let sequence = join_identifiers(order);
        choice.push_attribute(("choiceSequence", sequence.as_str()));
        writer.write_event(Event::Empty(choice))?;
    }
    write_variables(writer, "templateVariable", state.template_values())?;
    write_variables(writer, "responseVariable", state.response_values())?;
    write_variables(writer, "outcomeVariable", state.outcome_values())?;
    write_variables(
        writer,
        "overriddenTemplateDefault",
        state.overridden_template_defaults(),
    )?;
    write_variables(
        writer,
        "overriddenResponseDefault",
        state.overridden_response_defaults(),
    )?;
    write_variables(
        writer,
        "overriddenOutcomeDefault",
        state.overridden_outcome_defaults(),
    )?;
    write_variables(
        writer,
        "overriddenCorrectResponse",
        state.overridden_correct_responses(),
    )?;
    if let Some(comment) = state.candidate_comment() {
        writer.write_event(Event::Start(BytesStart::new("candidateComment")))?;
        writer.write_event(Event::Text(BytesText::new(comment)))?;
        writer.write_event(Event::End(BytesEnd::new("candidateComment")))?;
    }
    writer.write_event(Event::End(BytesEnd::new(ELEMENT)))?;
    Ok(())
}

pub(crate) fn read_item_state(
    reader: &mut FragmentReader<'_>,
    root: &BytesStart<'_>,
    empty: bool,
) -> Result<ItemSessionState, MarshalError> {
    let mut attrs = Attrs::read(root, ELEMENT)?;
    let mut state = ItemSessionState::new();

    // Absent flags read as false, so hand-written minimal fragments load.
    if let Some(text) = attrs.take("initialized") {
        state.set_initialized(parse_bool(ELEMENT, "initialized", &text)?);
    }
    if let Some(text) = attrs.take("presented") {
        state.set_presented(parse_bool(ELEMENT, "presented", &text)?);
    }
    if let Some(text) = attrs.take("responded") {
        state.set_responded(parse_bool(ELEMENT, "responded", &text)?);
    }
    if let Some(text) = attrs.take("closed") {
        state.set_closed(parse_bool(ELEMENT, "closed", &text)?);
    }
    if let Some(text) = attrs.take("sessionStatus") {
        let status =
            SessionStatus::from_qti_name(&text).ok_or_else(|| MarshalError::BadAttribute {
                element: ELEMENT.to_string(),
                attribute: "sessionStatus",
                value: text,
            })?;
        state.set_session_status(Some(status));
    }
    if let Some(text) = attrs.take("entrySequence") {
        state.set_entry_sequence(Some(parse_u64(ELEMENT, "entrySequence", &text)?));
    }
    if let Some(text) = attrs.take("numAttempts") {
        state.set_num_attempts(parse_u64(ELEMENT, "numAttempts", &text)?);
    }
    if let Some(text) = attrs.take("duration") {
        state.set_duration_accumulated(parse_duration(ELEMENT, "duration", &text)?);
    }
    if let Some(text) = attrs.take("badResponseIdentifiers") {
        let identifiers = parse_identifier_list(ELEMENT, "badResponseIdentifiers", &text)?;
        state.set_bad_responses(identifiers.into_iter().collect());
    }
    if let Some(text) = attrs.take("invalidResponseIdentifiers") {
        let identifiers = parse_identifier_list(ELEMENT, "invalidResponseIdentifiers", &text)?;
        state.set_invalid_responses(identifiers.into_iter().collect());
    }
    attrs.finish()?;

    if empty {
        return Ok(state);
    }
    loop {
        let (element, element_empty) = match reader.next(ELEMENT)? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => break,
            _ => {
                return Err(MarshalError::UnexpectedText {
                    inside: ELEMENT.to_string(),
                });
            }
        };
        read_child(reader, &mut state, &element, element_empty)?;
    }
    Ok(state)
}

fn read_child(
    reader: &mut FragmentReader<'_>,
    state: &mut ItemSessionState,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<(), MarshalError> {
    let name = element_name(e, ELEMENT)?;

    let slot = match name.as_str() {
        "templateVariable" => Some((VariableKind::Template, false)),
        "responseVariable" => Some((VariableKind::Response, false)),
        "outcomeVariable" => Some((VariableKind::Outcome, false)),
        "overriddenTemplateDefault" => Some((VariableKind::Template, true)),
        "overriddenResponseDefault" => Some((VariableKind::Response, true)),
        "overriddenOutcomeDefault" => Some((VariableKind::Outcome, true)),
        _ => None,
    };
    if let Some((kind, overridden)) = slot {
        let (identifier, value) = read_variable(reader, &name, e, empty)?;
        let duplicate = if overridden {
            state.overridden_default(kind, &identifier).is_some()
        } else {
            state.variable_value(kind, &identifier).is_some()
        };
        if duplicate {
            return Err(MarshalError::DuplicateEntry {
                element: name,
                identifier: identifier.to_string(),
            });
        }
        if overridden {
            state.set_overridden_default(kind, identifier, value);
        } else {
            state.set_variable_value(kind, identifier, value);
        }
        return Ok(());
    }

    match name.as_str() {
        "overriddenCorrectResponse" => {
            let (identifier, value) = read_variable(reader, &name, e, empty)?;
            if state.overridden_correct_response(&identifier).is_some() {
                return Err(MarshalError::DuplicateEntry {
                    element: name,
                    identifier: identifier.to_string(),
                });
            }
            state.set_overridden_correct_response(identifier, value);
        }
        "shuffledInteractionChoiceOrder" => {
            let mut attrs = Attrs::read(e, &name)?;
            let response_text = attrs.require("responseIdentifier")?;
            let response = parse_identifier(&name, "responseIdentifier", &response_text)?;
            let sequence_text = attrs.require("choiceSequence")?;
            let order = parse_identifier_list(&name, "choiceSequence", &sequence_text)?;
            attrs.finish()?;
            if !empty {
                reader.expect_end(&name)?;
            }
            if state.shuffled_order(&response).is_some() {
                return Err(MarshalError::DuplicateEntry {
                    element: name,
                    identifier: response.to_string(),
                });
            }
            state.set_shuffled_order(response, order);
        }
        "candidateComment" => {
            Attrs::read(e, &name)?.finish()?;
            let text = if empty {
                String::new()
            } else {
                reader.read_text_until_end(&name)?
            };
            if state.candidate_comment().is_some() {
                return Err(MarshalError::DuplicateEntry {
                    element: ELEMENT.to_string(),
                    identifier: name,
                });
            }
            state.set_candidate_comment(Some(text));
        }
        _ => {
            return Err(MarshalError::UnexpectedElement {
                element: name,
                inside: ELEMENT.to_string(),
            });
        }
    }
    Ok(())
}
