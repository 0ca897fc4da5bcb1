//! Marshalling of test plans

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::marshal::xml::{element_name, expect_root, into_string, new_writer, Attrs, FragmentReader};
use crate::marshal::MarshalError;
use crate::plan::{NodeId, PlanError, TestNodeType, TestPlan, TestPlanBuilder, TestPlanNodeKey};

const ELEMENT: &str = "testPlan";

/// Serialize a test plan to an XML fragment.
pub fn marshal_test_plan(plan: &TestPlan) -> Result<String, MarshalError> {
    let mut writer = new_writer();
    write_plan(&mut writer, plan)?;
    into_string(writer)
}

/// Rebuild a test plan from [`marshal_test_plan`] output.
///
/// Keys are not trusted: the tree is rebuilt from nesting order and each
/// node's recomputed key must match the stored one.
pub fn unmarshal_test_plan(xml: &str) -> Result<TestPlan, MarshalError> {
    let mut reader = FragmentReader::new(xml);
    let (root, empty) = expect_root(&mut reader, ELEMENT)?;
    let plan = read_plan(&mut reader, &root, empty)?;
    reader.expect_eof()?;
    Ok(plan)
}

pub(crate) fn write_plan(writer: &mut Writer<Vec<u8>>, plan: &TestPlan) -> Result<(), MarshalError> {
    if plan.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(ELEMENT)))?;
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new(ELEMENT)))?;
    for part in plan.test_parts() {
        write_node(writer, plan, *part)?;
    }
    writer.write_event(Event::End(BytesEnd::new(ELEMENT)))?;
    Ok(())
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    plan: &TestPlan,
    id: NodeId,
) -> Result<(), MarshalError> {
    let node = plan.node(id);
    let mut start = BytesStart::new("node");
    start.push_attribute(("type", node.node_type().qti_name()));
    let key = node.key().to_string();
    start.push_attribute(("key", key.as_str()));
    if node.children().is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in node.children() {
        write_node(writer, plan, *child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("node")))?;
    Ok(())
}

pub(crate) fn read_plan(
    reader: &mut FragmentReader<'_>,
    root: &BytesStart<'_>,
    empty: bool,
) -> Result<TestPlan, MarshalError> {
    Attrs::read(root, ELEMENT)?.finish()?;
    let mut builder = TestPlanBuilder::new();
    if !empty {
        read_children(reader, &mut builder, None, ELEMENT)?;
    }
    Ok(builder.build())
}

fn read_children(
    reader: &mut FragmentReader<'_>,
    builder: &mut TestPlanBuilder,
    parent: Option<(NodeId, TestNodeType)>,
    inside: &str,
) -> Result<(), MarshalError> {
    loop {
        let (e, element_empty) = match reader.next(inside)? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(_) => return Ok(()),
            _ => {
                return Err(MarshalError::UnexpectedText {
                    inside: inside.to_string(),
                });
            }
        };
        let name = element_name(&e, inside)?;
        if name != "node" {
            return Err(MarshalError::UnexpectedElement {
                element: name,
                inside: inside.to_string(),
            });
        }
        let mut attrs = Attrs::read(&e, "node")?;
        let type_text = attrs.require("type")?;
        let node_type =
            TestNodeType::from_qti_name(&type_text).ok_or_else(|| MarshalError::BadAttribute {
                element: "node".to_string(),
                attribute: "type",
                value: type_text,
            })?;
        let key_text = attrs.require("key")?;
        let stored: TestPlanNodeKey = key_text.parse().map_err(MarshalError::Plan)?;
        attrs.finish()?;

        let identifier = stored.identifier().clone();
        let id = match (node_type, parent) {
            (TestNodeType::TestPart, None) => builder.add_test_part(identifier),
            (TestNodeType::TestPart, Some((_, parent_type))) => {
                return Err(MarshalError::Plan(PlanError::BadParent {
                    parent: parent_type.qti_name(),
                    child: TestNodeType::TestPart.qti_name(),
                }));
            }
            (TestNodeType::AssessmentSection, Some((parent_id, _))) => {
                builder.add_section(parent_id, identifier)?
            }
            (TestNodeType::AssessmentItemRef, Some((parent_id, _))) => {
                builder.add_item_ref(parent_id, identifier)?
            }
            (child_type, None) => {
                return Err(MarshalError::Plan(PlanError::BadParent {
                    parent: ELEMENT,
                    child: child_type.qti_name(),
                }));
            }
        };
        let computed = builder.node_key(id);
        if *computed != stored {
            return Err(MarshalError::KeyMismatch {
                stored: stored.to_string(),
                computed: computed.to_string(),
            });
        }
        if !element_empty {
            read_children(reader, builder, Some((id, node_type)), "node")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;

    fn ident(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    fn sample_plan() -> TestPlan {
        let mut builder = TestPlanBuilder::new();
        let part = builder.add_test_part(ident("P1"));
        let first = builder.add_section(part, ident("S1")).unwrap();
        builder.add_item_ref(first, ident("Q1")).unwrap();
        builder.add_item_ref(first, ident("Q1")).unwrap();
        let second = builder.add_section(part, ident("S2")).unwrap();
        builder.add_item_ref(second, ident("Q2")).unwrap();
        builder.build()
    }

    #[test]
    fn round_trips_nested_plan() {
        let plan = sample_plan();
        let xml = marshal_test_plan(&plan).unwrap();
        let restored = unmarshal_test_plan(&xml).unwrap();
        assert_eq!(restored, plan);
    }

    #[test]
    fn writes_keys_with_instance_numbers() {
        let xml = marshal_test_plan(&sample_plan()).unwrap();
        assert!(xml.contains("key=\"P1.S1.Q1:1\""));
        assert!(xml.contains("key=\"P1.S1.Q1:2\""));
        assert!(xml.contains("type=\"assessmentItemRef\""));
    }

    #[test]
    fn round_trips_empty_plan() {
        let plan = TestPlanBuilder::new().build();
        let xml = marshal_test_plan(&plan).unwrap();
        assert_eq!(xml, "<testPlan/>");
        assert!(unmarshal_test_plan(&xml).unwrap().is_empty());
    }

    #[test]
    fn rejects_key_not_matching_position() {
        let xml = "<testPlan>\
             <node type=\"testPart\" key=\"P1:1\">\
             <node type=\"assessmentSection\" key=\"P2.S1:1\"/>\
             </node>\
             </testPlan>";
        let error = unmarshal_test_plan(xml).unwrap_err();
        assert!(matches!(
            error,
            MarshalError::KeyMismatch { stored, computed }
                if stored == "P2.S1:1" && computed == "P1.S1:1"
        ));
    }

    #[test]
    fn rejects_wrong_instance_number() {
        let xml = "<testPlan>\
             <node type=\"testPart\" key=\"P1:2\"/>\
             </testPlan>";
        let error = unmarshal_test_plan(xml).unwrap_err();
        assert!(matches!(error, MarshalError::KeyMismatch { .. }));
    }

    #[test]
    fn rejects_section_at_top_level() {
        let xml = "<testPlan><node type=\"assessmentSection\" key=\"S1:1\"/></testPlan>";
        let error = unmarshal_test_plan(xml).unwrap_err();
        assert!(matches!(error, MarshalError::Plan(PlanError::BadParent { .. })));
    }

    #[test]
    fn rejects_item_directly_under_test_part() {
        let xml = "<testPlan>\
             <node type=\"testPart\" key=\"P1:1\">\
             <node type=\"assessmentItemRef\" key=\"P1.Q1:1\"/>\
             </node>\
             </testPlan>";
        let error = unmarshal_test_plan(xml).unwrap_err();
        assert!(matches!(error, MarshalError::Plan(PlanError::BadParent { .. })));
    }

    #[test]
    fn rejects_key_without_instance() {
        let xml = "<testPlan><node type=\"testPart\" key=\"P1\"/></testPlan>";
        let error = unmarshal_test_plan(xml).unwrap_err();
        assert!(matches!(
            error,
            MarshalError::Plan(PlanError::MissingInstance { .. })
        ));
    }
}
