use aws::AwsProvider;
use tfplug::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tfplug::logging::init_from_env()?;

    tfplug::serve(AwsProvider::new(), ServerConfig::from_env()).await?;

    Ok(())
}
