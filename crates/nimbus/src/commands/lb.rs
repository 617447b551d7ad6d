use crate::commands::node_filter;
use crate::providers::Providers;
use colored::Colorize;
use nimbus_cloud::{
    CloudError, LoadBalancerRecord, LoadBalancerReport, LoadBalancerService, LoadBalancerSpec,
    LocationOutcome, Protocol, StateManager,
};
use std::net::IpAddr;
use std::path::Path;

pub struct CreateArgs {
    pub name: String,
    pub protocol: String,
    pub port: u16,
    pub instance_port: u16,
    pub group: Option<String>,
    pub tag: Option<String>,
}

pub async fn create(
    providers: &Providers,
    project_root: &Path,
    args: CreateArgs,
) -> anyhow::Result<()> {
    let protocol: Protocol = args.protocol.parse()?;
    let spec = LoadBalancerSpec {
        name: args.name,
        protocol,
        load_balancer_port: args.port,
        instance_port: args.instance_port,
    };

    println!(
        "{}",
        format!("ロードバランサー '{}' を作成中...", spec.name).blue()
    );

    let state_manager = StateManager::new(project_root);
    let lock = state_manager
        .acquire_lock(&format!("lb create {}", spec.name))
        .await?;

    let filter = node_filter(args.group, args.tag);
    let result = providers
        .service
        .load_balance_nodes_matching_report(
            &*filter,
            &spec.name,
            &protocol.to_string(),
            spec.load_balancer_port,
            spec.instance_port,
        )
        .await;

    let report = match result {
        Ok(report) => report,
        Err(CloudError::CreateAborted {
            location,
            created,
            source,
        }) => {
            // 失敗前に作成済みのロケーションは記録する
            if !created.locations.is_empty() {
                println!();
                print_outcomes(&created);
                save_records(&state_manager, providers.load_balancer_provider, &spec, &created)
                    .await?;
                println!(
                    "{}",
                    format!(
                        "⚠ {} で失敗しました。作成済みの {} 件は state に記録しました",
                        location,
                        created.locations.len()
                    )
                    .yellow()
                );
            }
            lock.release().await?;
            return Err(CloudError::CreateAborted {
                location,
                created,
                source,
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    if report.locations.is_empty() {
        lock.release().await?;
        println!();
        println!("{}", "対象のノードがないため何も作成しませんでした".yellow());
        return Ok(());
    }

    println!();
    print_outcomes(&report);
    save_records(&state_manager, providers.load_balancer_provider, &spec, &report).await?;
    lock.release().await?;

    println!();
    let unresolved = report.unresolved().len();
    if unresolved > 0 {
        println!(
            "{}",
            format!(
                "ℹ {} 件のロケーションはアドレスが取得できず、結果に含まれていません",
                unresolved
            )
            .dimmed()
        );
    }
    println!(
        "{}",
        format!(
            "✓ {} 件のアドレスでロードバランサーが利用できます",
            report.addresses().len()
        )
        .green()
        .bold()
    );
    Ok(())
}

/// ロケーションごとの結果を表示
fn print_outcomes(report: &LoadBalancerReport) {
    let mut locations: Vec<_> = report.locations.iter().collect();
    locations.sort_by(|a, b| a.0.id.cmp(&b.0.id));

    for (location, outcome) in locations {
        match outcome {
            LocationOutcome::Resolved {
                dns_name,
                addresses,
            } => {
                let addresses: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
                println!(
                    "  {} {} {} → {}",
                    "✓".green(),
                    location.id.cyan(),
                    dns_name,
                    addresses.join(", ").green()
                );
            }
            LocationOutcome::Unresolved { dns_name } => {
                println!(
                    "  {} {} {} {}",
                    "⚠".yellow(),
                    location.id.cyan(),
                    dns_name,
                    "(名前解決できませんでした)".yellow()
                );
            }
        }
    }
}

/// report の全ロケーションを state に記録
async fn save_records(
    state_manager: &StateManager,
    provider: &str,
    spec: &LoadBalancerSpec,
    report: &LoadBalancerReport,
) -> nimbus_cloud::Result<()> {
    let mut state = state_manager.load().await?;
    for (location, outcome) in &report.locations {
        state.insert(LoadBalancerRecord::new(
            provider,
            location.clone(),
            spec.clone(),
            outcome,
        ));
    }
    state_manager.save(&state).await
}

pub async fn destroy(
    providers: &Providers,
    project_root: &Path,
    address: IpAddr,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("{} のロードバランサーを削除中...", address).yellow()
    );

    let state_manager = StateManager::new(project_root);
    let lock = state_manager
        .acquire_lock(&format!("lb destroy {}", address))
        .await?;

    providers.service.destroy_load_balancer(address).await?;

    let mut state = state_manager.load().await?;
    match state.remove_by_address(address) {
        Some(record) => {
            state_manager.save(&state).await?;
            println!();
            println!(
                "{}",
                format!("✓ '{}' ({}) を削除しました", record.name, record.location.id)
                    .green()
                    .bold()
            );
        }
        None => {
            println!();
            println!(
                "{}",
                format!("ℹ {} は state に記録されていません", address).dimmed()
            );
        }
    }

    lock.release().await?;
    Ok(())
}

pub async fn list(project_root: &Path) -> anyhow::Result<()> {
    let state = StateManager::new(project_root).load().await?;
    let records = state.records();

    if records.is_empty() {
        println!("{}", "作成済みのロードバランサーはありません".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<16} {:<14} {:<8} {:<6} {:<12} {:<40} {:<20}",
            "NAME", "PROVIDER", "ZONE", "PROTO", "PORTS", "DNS", "ADDRESSES"
        )
        .bold()
    );
    println!("{}", "─".repeat(120).dimmed());

    for record in records {
        let addresses = if record.addresses.is_empty() {
            "unresolved".red()
        } else {
            record
                .addresses
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ")
                .green()
        };
        println!(
            "{:<16} {:<14} {:<8} {:<6} {:<12} {:<40} {}",
            record.name.cyan(),
            record.provider,
            record.location.id,
            record.spec.protocol.to_string(),
            format!(
                "{}→{}",
                record.spec.load_balancer_port, record.spec.instance_port
            ),
            record.dns_name,
            addresses
        );
    }
    Ok(())
}
