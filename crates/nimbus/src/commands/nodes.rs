use crate::commands::node_filter;
use colored::Colorize;
use nimbus_cloud::{ComputeService, NodeState};

pub async fn handle(
    compute: &dyn ComputeService,
    group: Option<String>,
    tag: Option<String>,
    all: bool,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("{} のノード一覧を取得中...", compute.display_name()).blue()
    );

    let filter = node_filter(group, tag);
    let mut nodes = compute.list_nodes_matching(&*filter).await?;
    if !all {
        nodes.retain(|node| !node.is_terminated());
    }
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    println!();
    if nodes.is_empty() {
        println!("{}", "該当するノードはありません".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<24} {:<20} {:<10} {:<12} {:<8} {:<16}",
            "ID", "NAME", "GROUP", "STATE", "ZONE", "ADDRESS"
        )
        .bold()
    );
    println!("{}", "─".repeat(95).dimmed());

    for node in &nodes {
        let state = node.state.to_string();
        let state_colored = match node.state {
            NodeState::Running => state.green(),
            NodeState::Pending | NodeState::Suspended => state.yellow(),
            _ => state.red(),
        };
        let address = node
            .primary_address()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        println!(
            "{:<24} {:<20} {:<10} {:<12} {:<8} {:<16}",
            node.id.cyan(),
            node.name,
            node.group.as_deref().unwrap_or("-"),
            state_colored,
            node.location.id,
            address.dimmed()
        );
    }

    println!();
    println!("{} 件", nodes.len());
    Ok(())
}
