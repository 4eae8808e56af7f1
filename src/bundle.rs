//! One bundle directory: its load context and the components it declares.

use std::path::{ Path, PathBuf };
use thiserror::Error ;
use wasmtime::{ Engine, Linker };

use crate::{
    BundleName, CacheMode, ComponentState, ComponentTable, DiscoveryCache, HostExtensionPoints,
    LoadContext, LoadContextError, MalformedArtifact, RegistryConfig, ScanError, TypeIdentifier,
};
use crate::utils::PartialSuccess ;



/// Failure to load one bundle. Fatal to the whole registry build.
#[derive( Error, Debug )]
pub enum BundleError {
    #[error( "Failed to list {}: {source}", path.display() )]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error( transparent )] LoadContext( #[from] LoadContextError ),
    #[error( transparent )] Scan( #[from] ScanError ),
    #[error( "Cached component {name} ({implementation}) is registered under {extension_point}, which the host doesn't declare" )]
    UndeclaredExtensionPoint { extension_point: TypeIdentifier, name: String, implementation: TypeIdentifier },
}

/// A loaded bundle whose declared implementations all resolve in its own load context.
#[derive( Debug )]
pub struct Bundle {
    dir: PathBuf,
    context: LoadContext,
    table: ComponentTable,
}

impl Bundle {

    /// Opens the bundle in `dir`, takes its component table from the cache or a
    /// fresh scan, and resolves every implementation.
    ///
    /// # Partial Success
    /// Malformed artifacts and descriptor entries are skipped and returned with their path.
    ///
    /// # Errors
    /// - [`BundleError::Io`] if the directory can't be listed
    /// - [`BundleError::LoadContext`] if an artifact can't be read or an implementation isn't exported,
    /// 	which is how a stale cache shows up
    /// - [`BundleError::Scan`] if a named type implements no extension point
    /// - [`BundleError::UndeclaredExtensionPoint`] if a cached entry names a type the host doesn't declare extensible
    pub fn load(
        name: BundleName,
        dir: PathBuf,
        config: &RegistryConfig,
        host: &HostExtensionPoints,
        engine: &Engine,
        linker: &Linker<ComponentState>,
    ) -> Result<PartialSuccess<Self, ( PathBuf, MalformedArtifact )>, BundleError> {

        let artifacts = list_artifacts( &dir, &config.artifact_extension )
            .map_err(| source | BundleError::Io { path: dir.clone(), source })?;
        tracing::debug!( bundle = %name, artifacts = artifacts.len(), "Opening bundle" );

        let ( context, mut warnings ) = LoadContext::open( name, engine, linker, artifacts )?;

        let cache = DiscoveryCache::new( &dir, &config.cache_file );
        let cached = match config.cache {
            CacheMode::Use => cache.load(),
            CacheMode::Refresh | CacheMode::Disabled => None,
        };

        let table = match cached {
            Some( table ) => {
                tracing::debug!( bundle = %context.identity(), path = %cache.path().display(), "Component cache hit" );
                if let Some( entry ) = table.entries().find(| entry | host.root_of( &entry.extension_point ) != Some( &entry.extension_point )) {
                    return Err( BundleError::UndeclaredExtensionPoint {
                        extension_point: entry.extension_point,
                        name: entry.name,
                        implementation: entry.implementation,
                    });
                }
                table
            }
            None => {
                let ( table, scan_warnings ) = scan( &context, host )?;
                warnings.extend( scan_warnings );
                if config.cache != CacheMode::Disabled {
                    match cache.store( &table ) {
                        Ok(()) => tracing::debug!( bundle = %context.identity(), path = %cache.path().display(), "Component cache written" ),
                        Err( err ) => tracing::warn!( bundle = %context.identity(), error = %err, "Continuing without a component cache" ),
                    }
                }
                table
            }
        };

        for entry in table.entries() {
            context.resolve( &entry.implementation )?;
        }

        Ok(( Self { dir, context, table }, warnings ))

    }

    #[inline] pub fn name( &self ) -> &BundleName { self.context.identity() }
    #[inline] pub fn dir( &self ) -> &Path { &self.dir }
    #[inline] pub fn context( &self ) -> &LoadContext { &self.context }
    #[inline] pub fn table( &self ) -> &ComponentTable { &self.table }

}

/// Reads every artifact of the context and discovers its named components.
fn scan(
    context: &LoadContext,
    host: &HostExtensionPoints,
) -> Result<PartialSuccess<ComponentTable, ( PathBuf, MalformedArtifact )>, ScanError> {

    let mut descriptors = Vec::new();
    let mut warnings = Vec::new();
    for ( path, bytes ) in context.artifacts() {
        let ( found, errors ) = crate::read_artifact( bytes );
        descriptors.extend( found );
        warnings.extend( errors.into_iter().map(| error | ( path.to_path_buf(), error )));
    }
    tracing::debug!( bundle = %context.identity(), types = descriptors.len(), "Scanned bundle" );

    Ok(( crate::discover_components( &descriptors, host.points() )?, warnings ))

}

/// Subdirectories of `crates_dir`, sorted by name. Anything else is skipped.
///
/// # Errors
/// Any IO error from listing the directory.
pub fn list_bundles( crates_dir: &Path ) -> std::io::Result<Vec<( BundleName, PathBuf )>> {
    let mut bundles = Vec::new();
    for entry in std::fs::read_dir( crates_dir )? {
        let path = entry?.path();
        match path.is_dir() {
            true => match path.file_name() {
                Some( name ) => bundles.push(( BundleName::new( name.to_string_lossy() ), path )),
                None => tracing::debug!( path = %path.display(), "Skipping unnamed directory" ),
            },
            false => tracing::debug!( path = %path.display(), "Skipping non-directory in crates directory" ),
        }
    }
    bundles.sort();
    Ok( bundles )
}

/// Files in `dir` ending in `.{extension}`, sorted by name.
///
/// # Errors
/// Any IO error from listing the directory.
pub fn list_artifacts( dir: &Path, extension: &str ) -> std::io::Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();
    for entry in std::fs::read_dir( dir )? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(| found | found == extension ) {
            artifacts.push( path );
        }
    }
    artifacts.sort();
    Ok( artifacts )
}



#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn lists_only_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        for file in [ "b.wasm", "a.wasm", "component-info.txt", "c.wat" ] {
            std::fs::write( dir.path().join( file ), b"" ).unwrap();
        }
        std::fs::create_dir( dir.path().join( "nested.wasm" )).unwrap();
        let names = list_artifacts( dir.path(), "wasm" ).unwrap()
            .into_iter()
            .map(| path | path.file_name().unwrap().to_string_lossy().into_owned() )
            .collect::<Vec<_>>();
        assert_eq!( names, vec![ "a.wasm", "b.wasm" ]);
    }

    #[test]
    fn lists_only_directories_as_bundles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir( dir.path().join( "zeta" )).unwrap();
        std::fs::create_dir( dir.path().join( "alpha" )).unwrap();
        std::fs::write( dir.path().join( "README" ), b"" ).unwrap();
        let names = list_bundles( dir.path() ).unwrap()
            .into_iter()
            .map(|( name, _ )| name.as_str().to_string() )
            .collect::<Vec<_>>();
        assert_eq!( names, vec![ "alpha", "zeta" ]);
    }

}
