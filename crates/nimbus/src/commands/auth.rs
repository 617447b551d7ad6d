use crate::providers::Providers;
use colored::Colorize;
use nimbus_cloud::CloudProvider;

pub async fn handle(providers: &Providers) -> anyhow::Result<()> {
    println!("{}", "認証状態を確認中...".blue());
    println!();

    let mut all_ok = report(providers.compute.as_ref()).await?;
    if let Some(load_balancer) = &providers.load_balancer_auth {
        all_ok &= report(load_balancer.as_ref()).await?;
    }

    println!();
    if !all_ok {
        anyhow::bail!("認証されていないプロバイダーがあります");
    }
    println!("{}", "✓ すべてのプロバイダーで認証済みです".green().bold());
    Ok(())
}

async fn report<P: CloudProvider + ?Sized>(provider: &P) -> anyhow::Result<bool> {
    let status = provider.check_auth().await?;
    if status.authenticated {
        println!(
            "  {} {} ({})",
            "✓".green(),
            provider.display_name().bold(),
            status.account_info.as_deref().unwrap_or("-").dimmed()
        );
    } else {
        println!(
            "  {} {}: {}",
            "✗".red(),
            provider.display_name().bold(),
            status.error.as_deref().unwrap_or("unknown error").red()
        );
    }
    Ok(status.authenticated)
}
