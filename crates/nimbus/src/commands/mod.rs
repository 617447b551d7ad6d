pub mod auth;
pub mod lb;
pub mod nodes;

use nimbus_cloud::{NodeFilter, predicates};

/// --group / --tag からノードフィルタを組み立てる
pub fn node_filter(group: Option<String>, tag: Option<String>) -> Box<NodeFilter> {
    match (group, tag) {
        (Some(group), Some(tag)) => Box::new(predicates::and(
            predicates::in_group(group),
            predicates::with_tag(tag),
        )),
        (Some(group), None) => Box::new(predicates::in_group(group)),
        (None, Some(tag)) => Box::new(predicates::with_tag(tag)),
        (None, None) => Box::new(predicates::all()),
    }
}
