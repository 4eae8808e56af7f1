use std::path::PathBuf ;
use anyhow::Context ;
use clap::Parser ;
use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt, EnvFilter };

use component_host::{ CacheMode, ComponentRegistry, Engine, HostExtensionPoints, RegistryConfig };



/// Builds the component registry for a crates directory and instantiates one named component.
#[derive( Parser, Debug )]
#[command( name = "component-host", version, about )]
struct Cli {
    /// Directory with one subdirectory per plugin bundle
    crates_dir: PathBuf,

    /// TOML file with registry settings; the crates directory argument overrides its `crates_dir`
    #[arg( long )]
    config: Option<PathBuf>,

    /// Host API artifact or directory of artifacts; the built-in analysis API when absent
    #[arg( long )]
    api: Vec<PathBuf>,

    /// Cache mode: use, refresh or disabled
    #[arg( long )]
    cache: Option<CacheMode>,

    /// Load bundles in parallel
    #[arg( long )]
    parallel: bool,

    /// Name of the component to instantiate
    #[arg( long, default_value = "example-tokenizer" )]
    name: String,

    /// Extension point the component implements
    #[arg( long, default_value = "host.analysis.TokenizerFactory" )]
    extension_point: String,
}

fn main() -> anyhow::Result<()> {

    tracing_subscriber::registry()
        .with( tracing_subscriber::fmt::layer() )
        .with( EnvFilter::try_from_default_env().unwrap_or_else(| _ | EnvFilter::new( "info" )))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some( path ) => RegistryConfig::load( path )?,
        None => RegistryConfig::default(),
    }.with_crates_dir( &cli.crates_dir );
    if let Some( cache ) = cli.cache { config = config.with_cache( cache ); }
    if cli.parallel { config = config.with_parallel( true ); }

    let host = match cli.api.is_empty() {
        true => HostExtensionPoints::analysis(),
        false => {
            let ( host, warnings ) = HostExtensionPoints::scan( &cli.api, &config.artifact_extension )?;
            warnings.iter().for_each(|( path, err )| tracing::warn!( artifact = %path.display(), error = %err, "Skipping malformed host API data" ));
            host
        }
    };

    let engine = Engine::default();
    let registry = ComponentRegistry::build( &config, &host, &engine )
        .with_context(|| format!( "Failed to load plugins from {}", config.crates_dir.display() ))?;

    let component = registry.get_named_component( &cli.name, &cli.extension_point.as_str().into() )?;
    println!(
        "{} [{}] -> {} from bundle {}: {:?}",
        cli.extension_point, cli.name, component.implementation(), component.bundle(), component.constructor_results(),
    );

    Ok(())

}
