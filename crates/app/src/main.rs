use anyhow::Context;

use stockroom_app::{ActionOutcome, build_app};
use stockroom_infra::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    stockroom_observability::init(&settings.log);

    let app = build_app(settings)?;
    let admin = app
        .directory()
        .find_by_email(&app.settings().admin_email)?
        .context("admin account missing after seeding")?;

    let dashboard: ActionOutcome<_> = app.dashboard(&admin).await.into();
    tracing::info!(
        admin = %admin.email,
        low_stock_threshold = app.settings().low_stock_threshold,
        "stockroom ready"
    );
    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}
