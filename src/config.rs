use std::path::{ Path, PathBuf };
use serde::Deserialize ;
use thiserror::Error ;

use crate::cache::CACHE_FILE ;



/// How the registry uses each bundle's discovery cache.
#[derive( Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq )]
#[serde( rename_all = "lowercase" )]
pub enum CacheMode {
    /// Read the cache when it is usable, scan and write it otherwise.
    #[default] Use,
    /// Ignore any existing cache, scan, and overwrite it.
    Refresh,
    /// Never read nor write a cache.
    Disabled,
}

impl std::str::FromStr for CacheMode {
    type Err = ConfigError ;
    fn from_str( mode: &str ) -> Result<Self, Self::Err> { match mode {
        "use" => Ok( Self::Use ),
        "refresh" => Ok( Self::Refresh ),
        "disabled" => Ok( Self::Disabled ),
        other => Err( ConfigError::UnknownCacheMode( other.to_string() )),
    }}
}

#[derive( Error, Debug )]
pub enum ConfigError {
    #[error( "Failed to read config {}: {source}", path.display() )]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error( "Invalid config: {0}" )] Parse( #[from] toml::de::Error ),
    #[error( "Unknown cache mode '{0}', expected use, refresh or disabled" )] UnknownCacheMode( String ),
}

/// Settings for [`ComponentRegistry::build`]( crate::ComponentRegistry::build ).
///
/// Every field is optional in TOML:
///
/// ```toml
/// crates_dir = "crates"
/// cache = "refresh"
/// cache_file = "component-info.txt"
/// artifact_extension = "wasm"
/// parallel = true
/// ```
#[derive( Clone, Debug, Deserialize, Eq, PartialEq )]
#[serde( default, deny_unknown_fields )]
pub struct RegistryConfig {
    pub crates_dir: PathBuf,
    pub cache: CacheMode,
    pub cache_file: String,
    pub artifact_extension: String,
    pub parallel: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            crates_dir: PathBuf::from( "crates" ),
            cache: CacheMode::default(),
            cache_file: CACHE_FILE.to_string(),
            artifact_extension: "wasm".to_string(),
            parallel: false,
        }
    }
}

impl RegistryConfig {

    pub fn new( crates_dir: impl Into<PathBuf> ) -> Self {
        Self { crates_dir: crates_dir.into(), ..Self::default() }
    }

    /// # Errors
    /// [`ConfigError::Parse`] if `content` isn't a valid config.
    pub fn from_toml( content: &str ) -> Result<Self, ConfigError> {
        Ok( toml::from_str( content )? )
    }

    /// # Errors
    /// [`ConfigError::Io`] if the file can't be read, [`ConfigError::Parse`] if it isn't a valid config.
    pub fn load( path: &Path ) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string( path )
            .map_err(| source | ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml( &content )
    }

    pub fn with_crates_dir( mut self, crates_dir: impl Into<PathBuf> ) -> Self {
        self.crates_dir = crates_dir.into();
        self
    }

    pub fn with_cache( mut self, cache: CacheMode ) -> Self {
        self.cache = cache ;
        self
    }

    pub fn with_cache_file( mut self, cache_file: impl Into<String> ) -> Self {
        self.cache_file = cache_file.into();
        self
    }

    pub fn with_artifact_extension( mut self, extension: impl Into<String> ) -> Self {
        self.artifact_extension = extension.into();
        self
    }

    pub fn with_parallel( mut self, parallel: bool ) -> Self {
        self.parallel = parallel ;
        self
    }

}



#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn empty_toml_is_the_default() {
        assert_eq!( RegistryConfig::from_toml( "" ).unwrap(), RegistryConfig::default() );
    }

    #[test]
    fn toml_overrides_fields() {
        let config = RegistryConfig::from_toml( "crates_dir = \"plugins\"\ncache = \"refresh\"\nparallel = true\n" ).unwrap();
        assert_eq!( config, RegistryConfig::new( "plugins" ).with_cache( CacheMode::Refresh ).with_parallel( true ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!( matches!( RegistryConfig::from_toml( "crate_dir = \"typo\"" ), Err( ConfigError::Parse( _ ))));
    }

    #[test]
    fn cache_mode_parses_from_cli_text() {
        assert_eq!( "disabled".parse::<CacheMode>().unwrap(), CacheMode::Disabled );
        assert!( matches!( "sometimes".parse::<CacheMode>(), Err( ConfigError::UnknownCacheMode( _ ))));
    }

}
