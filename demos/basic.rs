//! Basic example demonstrating the Drycc controller client.
//!
//! Run with:
//! ```
//! DRYCC_CONTROLLER_URL=https://drycc.example.com DRYCC_TOKEN=your-token \
//!     cargo run --example basic -- example-go myvolume
//! ```

use drycc_client::{filer, DryccClient, API_VERSION};

#[tokio::main]
async fn main() -> drycc_client::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let app = args.next().unwrap_or_else(|| "example-go".to_string());
    let volume = args.next().unwrap_or_else(|| "myvolume".to_string());

    // Create client from environment variables
    println!("Creating Drycc client...");
    let client = DryccClient::from_env()?;
    println!("Controller: {}", client.base_url());

    // Make sure the URL is a controller before sending credentials to it
    let checked = client.check_connection().await?;
    let versions = client.controller_versions();
    println!(
        "API version {} (client {}), platform {}",
        versions.api_version, API_VERSION, versions.platform_version
    );
    if let Some(mismatch) = checked.mismatch() {
        println!("warning: {mismatch}");
    }

    println!("\n--- Listing {app}/{volume} ---");
    let page = filer::list_dir(&client, &app, &volume, "/", 10)
        .await?
        .into_inner();
    println!("Showing {} of {} entries", page.len(), page.total);

    for entry in &page {
        let name = entry.name.as_deref().unwrap_or("?");
        if entry.is_dir() {
            println!("  {name}/");
        } else {
            let size = entry.size.as_deref().unwrap_or("-");
            let modified = entry
                .modified()?
                .map(|t| t.to_string())
                .unwrap_or_default();
            println!("  {name}  {size}  {modified}");
        }
    }

    println!("\nDone!");
    Ok(())
}
