//! Arena-backed test plan built once per test session

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::identifier::Identifier;
use crate::plan::key::{IdentifierChain, PlanError, TestPlanNodeKey};

/// The kind of a navigable test plan node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestNodeType {
    /// Top-level grouping directly under the plan root
    TestPart,
    /// Grouping of items and nested sections
    AssessmentSection,
    /// One concrete instance of an item reference
    AssessmentItemRef,
}

impl TestNodeType {
    /// Every node type, in document-nesting order.
    pub const ALL: [TestNodeType; 3] = [
        TestNodeType::TestPart,
        TestNodeType::AssessmentSection,
        TestNodeType::AssessmentItemRef,
    ];

    /// The QTI element name for this node type.
    pub fn qti_name(self) -> &'static str {
        match self {
            TestNodeType::TestPart => "testPart",
            TestNodeType::AssessmentSection => "assessmentSection",
            TestNodeType::AssessmentItemRef => "assessmentItemRef",
        }
    }

    /// Look a node type up by its QTI name.
    pub fn from_qti_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.qti_name() == name)
    }
}

impl fmt::Display for TestNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qti_name())
    }
}

/// Index of a node inside one [`TestPlan`]'s arena
///
/// Ids are minted by [`TestPlanBuilder`] and are only meaningful for the plan
/// that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One node of a built [`TestPlan`]
#[derive(Debug, Clone, PartialEq)]
pub struct TestPlanNode {
    node_type: TestNodeType,
    key: TestPlanNodeKey,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TestPlanNode {
    /// The node's kind.
    pub fn node_type(&self) -> TestNodeType {
        self.node_type
    }

    /// The node's unique position key.
    pub fn key(&self) -> &TestPlanNodeKey {
        &self.key
    }

    /// The parent node, or `None` for a top-level test part.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in presentation order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this node is an item instance.
    pub fn is_item(&self) -> bool {
        self.node_type == TestNodeType::AssessmentItemRef
    }
}

/// The ordered tree of navigable positions in one test session
///
/// Built once by [`TestPlanBuilder`] when the session starts and never
/// structurally modified afterwards, so it can be read from many evaluation
/// calls without synchronization. Child order is presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct TestPlan {
    nodes: Vec<TestPlanNode>,
    test_parts: Vec<NodeId>,
    by_key: FxHashMap<TestPlanNodeKey, NodeId>,
    item_instances: FxHashMap<Identifier, Vec<NodeId>>,
}

impl TestPlan {
    /// The node behind an id minted by this plan's builder.
    pub fn node(&self, id: NodeId) -> &TestPlanNode {
        &self.nodes[id.0]
    }

    /// Look a node up by its position key.
    pub fn find(&self, key: &TestPlanNodeKey) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    /// Top-level test parts in presentation order.
    pub fn test_parts(&self) -> &[NodeId] {
        &self.test_parts
    }

    /// All item instances whose originating item reference has the given
    /// identifier, in the order they were added.
    ///
    /// More than one entry means the reference was instantiated repeatedly,
    /// which is what makes dotted lookups ambiguous.
    pub fn item_instances(&self, item: &Identifier) -> &[NodeId] {
        self.item_instances.get(item).map_or(&[], Vec::as_slice)
    }

    /// Walk every node depth first, children in presentation order.
    pub fn depth_first(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.test_parts.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.node(id).children.iter().rev().copied());
            Some(id)
        })
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the plan holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Single-use builder for a [`TestPlan`]
///
/// Nodes are appended in presentation order; the builder derives each node's
/// key from its ancestor chain and counts repeated instantiations of the same
/// chain to assign 1-based instance numbers.
#[derive(Debug, Default)]
pub struct TestPlanBuilder {
    nodes: Vec<TestPlanNode>,
    test_parts: Vec<NodeId>,
    occurrences: FxHashMap<IdentifierChain, u32>,
}

impl TestPlanBuilder {
    /// Start an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(
        &mut self,
        parent: Option<NodeId>,
        node_type: TestNodeType,
        identifier: Identifier,
    ) -> NodeId {
        let mut chain: IdentifierChain = match parent {
            None => SmallVec::new(),
            Some(parent_id) => self.nodes[parent_id.0].key.chain().iter().cloned().collect(),
        };
        chain.push(identifier);
        let instance = self.occurrences.entry(chain.clone()).or_insert(0);
        *instance += 1;
        let key = TestPlanNodeKey::from_chain(chain, *instance);

        let id = NodeId(self.nodes.len());
        self.nodes.push(TestPlanNode {
            node_type,
            key,
            parent,
            children: Vec::new(),
        });
        match parent {
            None => self.test_parts.push(id),
            Some(parent_id) => self.nodes[parent_id.0].children.push(id),
        }
        id
    }

    /// Append a test part under the plan root.
    pub fn add_test_part(&mut self, identifier: Identifier) -> NodeId {
        self.allocate(None, TestNodeType::TestPart, identifier)
    }

    /// Append a section under a test part or another section.
    pub fn add_section(
        &mut self,
        parent: NodeId,
        identifier: Identifier,
    ) -> Result<NodeId, PlanError> {
        let parent_type = self.nodes[parent.0].node_type;
        if parent_type == TestNodeType::AssessmentItemRef {
            return Err(PlanError::BadParent {
                parent: parent_type.qti_name(),
                child: TestNodeType::AssessmentSection.qti_name(),
            });
        }
        Ok(self.allocate(Some(parent), TestNodeType::AssessmentSection, identifier))
    }

    /// Append an item instance under a section.
    pub fn add_item_ref(
        &mut self,
        parent: NodeId,
        identifier: Identifier,
    ) -> Result<NodeId, PlanError> {
        let parent_type = self.nodes[parent.0].node_type;
        if parent_type != TestNodeType::AssessmentSection {
            return Err(PlanError::BadParent {
                parent: parent_type.qti_name(),
                child: TestNodeType::AssessmentItemRef.qti_name(),
            });
        }
        Ok(self.allocate(Some(parent), TestNodeType::AssessmentItemRef, identifier))
    }

    pub(crate) fn node_key(&self, id: NodeId) -> &TestPlanNodeKey {
        &self.nodes[id.0].key
    }

    /// Freeze the plan and build its lookup indexes.
    pub fn build(self) -> TestPlan {
        let mut by_key = FxHashMap::default();
        let mut item_instances: FxHashMap<Identifier, Vec<NodeId>> = FxHashMap::default();
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId(index);
            by_key.insert(node.key.clone(), id);
            if node.is_item() {
                item_instances
                    .entry(node.key.identifier().clone())
                    .or_default()
                    .push(id);
            }
        }
        TestPlan {
            nodes: self.nodes,
            test_parts: self.test_parts,
            by_key,
            item_instances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(text: &str) -> Identifier {
        Identifier::parse(text).unwrap()
    }

    fn sample_plan() -> TestPlan {
        // P1 { S1 { Q1, Q1 }, S2 { Q2 } }
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
    fn keys_encode_chain_and_occurrence() {
        let plan = sample_plan();
        let keys: Vec<String> = plan
            .depth_first()
            .map(|id| plan.node(id).key().to_string())
            .collect();
        assert_eq!(
            keys,
            vec![
                "P1:1",
                "P1.S1:1",
                "P1.S1.Q1:1",
                "P1.S1.Q1:2",
                "P1.S2:1",
                "P1.S2.Q2:1",
            ]
        );
    }

    #[test]
    fn find_locates_nodes_by_key() {
        let plan = sample_plan();
        let key = TestPlanNodeKey::parse("P1.S1.Q1:2").unwrap();
        let id = plan.find(&key).unwrap();
        assert_eq!(plan.node(id).node_type(), TestNodeType::AssessmentItemRef);
        assert_eq!(plan.node(id).key(), &key);

        let missing = TestPlanNodeKey::parse("P1.S1.Q9:1").unwrap();
        assert_eq!(plan.find(&missing), None);
    }

    #[test]
    fn item_instances_collects_repeated_instantiations() {
        let plan = sample_plan();
        let instances = plan.item_instances(&ident("Q1"));
        assert_eq!(instances.len(), 2);
        assert_eq!(plan.node(instances[0]).key().instance(), 1);
        assert_eq!(plan.node(instances[1]).key().instance(), 2);
        assert_eq!(plan.item_instances(&ident("Q2")).len(), 1);
        assert!(plan.item_instances(&ident("Q9")).is_empty());
    }

    #[test]
    fn children_preserve_insertion_order() {
        let plan = sample_plan();
        let part = plan.test_parts()[0];
        let sections: Vec<&str> = plan
            .node(part)
            .children()
            .iter()
            .map(|id| plan.node(*id).key().identifier().as_str())
            .collect();
        assert_eq!(sections, vec!["S1", "S2"]);
    }

    #[test]
    fn items_are_leaves_and_sections_need_section_or_part_parents() {
        let mut builder = TestPlanBuilder::new();
        let part = builder.add_test_part(ident("P1"));
        let section = builder.add_section(part, ident("S1")).unwrap();
        let item = builder.add_item_ref(section, ident("Q1")).unwrap();

        assert!(matches!(
            builder.add_section(item, ident("S2")),
            Err(PlanError::BadParent { .. })
        ));
        assert!(matches!(
            builder.add_item_ref(part, ident("Q2")),
            Err(PlanError::BadParent { .. })
        ));
    }

    #[test]
    fn sections_nest() {
        let mut builder = TestPlanBuilder::new();
        let part = builder.add_test_part(ident("P1"));
        let outer = builder.add_section(part, ident("OUTER")).unwrap();
        let inner = builder.add_section(outer, ident("INNER")).unwrap();
        let item = builder.add_item_ref(inner, ident("Q1")).unwrap();
        let plan = builder.build();
        assert_eq!(plan.node(item).key().to_string(), "P1.OUTER.INNER.Q1:1");
        assert_eq!(plan.node(item).parent(), Some(inner));
        assert_eq!(plan.node(plan.test_parts()[0]).parent(), None);
    }

    #[test]
    fn same_identifier_under_different_parents_keeps_separate_counts() {
        let mut builder = TestPlanBuilder::new();
        let part = builder.add_test_part(ident("P1"));
        let first = builder.add_section(part, ident("S1")).unwrap();
        let second = builder.add_section(part, ident("S2")).unwrap();
        builder.add_item_ref(first, ident("Q1")).unwrap();
        builder.add_item_ref(second, ident("Q1")).unwrap();
        let plan = builder.build();

        let keys: Vec<String> = plan
            .item_instances(&ident("Q1"))
            .iter()
            .map(|id| plan.node(*id).key().to_string())
            .collect();
        assert_eq!(keys, vec!["P1.S1.Q1:1", "P1.S2.Q1:1"]);
    }
}
