//! Node predicates
//!
//! Small building blocks for the filters passed to
//! [`ComputeService::list_nodes_matching`](crate::ComputeService::list_nodes_matching)
//! and the load balancer service.

use crate::node::{NodeMetadata, NodeState};
use std::collections::HashSet;

/// A filter over nodes, usable behind a reference in async trait methods
pub type NodeFilter = dyn for<'n> Fn(&'n NodeMetadata) -> bool + Send + Sync;

/// Accept every node
pub fn all() -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone {
    |_| true
}

/// Nodes that are terminated
pub fn terminated() -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone {
    |node| node.state == NodeState::Terminated
}

/// Nodes belonging to `group`
pub fn in_group(group: impl Into<String>) -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone {
    let group = group.into();
    move |node| node.group.as_deref() == Some(group.as_str())
}

/// Running nodes belonging to `group`
pub fn running_in_group(
    group: impl Into<String>,
) -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone {
    and(in_group(group), |node: &NodeMetadata| {
        node.state == NodeState::Running
    })
}

/// Nodes carrying `tag`
pub fn with_tag(tag: impl Into<String>) -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone {
    let tag = tag.into();
    move |node| node.tags.iter().any(|t| *t == tag)
}

/// Nodes whose directory id is one of `ids`
pub fn with_ids<I, S>(ids: I) -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ids: HashSet<String> = ids.into_iter().map(Into::into).collect();
    move |node| ids.contains(&node.id)
}

pub fn and<A, B>(a: A, b: B) -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone
where
    A: Fn(&NodeMetadata) -> bool + Send + Sync + Clone,
    B: Fn(&NodeMetadata) -> bool + Send + Sync + Clone,
{
    move |node| a(node) && b(node)
}

pub fn not<A>(a: A) -> impl Fn(&NodeMetadata) -> bool + Send + Sync + Clone
where
    A: Fn(&NodeMetadata) -> bool + Send + Sync + Clone,
{
    move |node| !a(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Location;

    fn node(id: &str, state: NodeState) -> NodeMetadata {
        NodeMetadata::new(id, id, Location::zone("is1a"), state)
    }

    #[test]
    fn test_group_and_tag() {
        let web = node("a", NodeState::Running).with_group("web").with_tag("prod");
        let db = node("b", NodeState::Suspended).with_group("db");

        assert!(in_group("web")(&web));
        assert!(!in_group("web")(&db));
        assert!(with_tag("prod")(&web));
        assert!(!with_tag("prod")(&db));
        assert!(running_in_group("web")(&web));
        assert!(!running_in_group("db")(&db));
    }

    #[test]
    fn test_combinators() {
        let live = node("a", NodeState::Running);
        let gone = node("b", NodeState::Terminated);

        let alive = and(all(), not(terminated()));
        assert!(alive(&live));
        assert!(!alive(&gone));

        let only_b = with_ids(["b"]);
        assert!(only_b(&gone));
        assert!(!only_b(&live));
    }
}
