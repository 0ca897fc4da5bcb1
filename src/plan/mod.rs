//! Test plan: the navigation tree built once per test session
//!
//! A [`TestPlan`] is an arena of nodes addressed by [`NodeId`], assembled in
//! presentation order by [`TestPlanBuilder`] and immutable afterwards. Every
//! node carries a [`TestPlanNodeKey`] that round-trips through its string
//! form, which is how serialized state names item instances.

pub mod key;
pub mod tree;

pub use key::{PlanError, TestPlanNodeKey};
pub use tree::{NodeId, TestNodeType, TestPlan, TestPlanBuilder, TestPlanNode};
