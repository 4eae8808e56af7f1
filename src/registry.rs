use std::collections::BTreeMap ;
use std::collections::btree_map::Entry ;
use std::path::PathBuf ;
use rayon::prelude::* ;
use thiserror::Error ;
use wasmtime::Engine ;

use crate::{
    Bundle, BundleError, BundleName, Component, HostExtensionPoints, InstantiateError,
    LoadContextError, NamedComponentEntry, RegistryConfig, TypeIdentifier,
};
use crate::bundle::list_bundles ;
use crate::host_exports::host_linker ;



/// Errors that abort [`ComponentRegistry::build`]. No partial registry is returned.
#[derive( Error, Debug )]
pub enum BuildError {
    #[error( "Failed to list crates directory {}: {source}", path.display() )]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error( "Bundle {bundle}: {source}" )]
    Bundle { bundle: BundleName, #[source] source: BundleError },
    #[error( "Component '{name}' of {extension_point} is declared by both {first} and {second}" )]
    DuplicateComponent { extension_point: TypeIdentifier, name: String, first: BundleName, second: BundleName },
}

/// Errors returned by [`ComponentRegistry::get_named_component`].
#[derive( Error, Debug )]
pub enum LookupError {
    /// No bundle implements this extension point.
    #[error( "Unknown extension point: {0}" )] UnknownExtensionPoint( TypeIdentifier ),
    /// The extension point is known, but nothing is registered under this name.
    #[error( "No component named '{name}' implements {extension_point}" )]
    UnknownComponent { extension_point: TypeIdentifier, name: String },
    #[error( transparent )] Resolve( #[from] LoadContextError ),
    #[error( transparent )] Instantiate( #[from] InstantiateError ),
}

#[derive( Debug )]
struct Registered {
    bundle: usize,
    implementation: TypeIdentifier,
}

/// Every bundle's named components, merged and keyed by extension point.
///
/// Built once by [`build`]( Self::build ), read-only afterwards. Lookups take
/// `&self` and may run from any number of threads.
pub struct ComponentRegistry {
    bundles: Vec<Bundle>,
    components: BTreeMap<TypeIdentifier, BTreeMap<String, Registered>>,
}

impl ComponentRegistry {

    /// Loads every bundle in `config.crates_dir` and merges their components.
    ///
    /// Bundles are loaded in name order, or all at once when `config.parallel`
    /// is set; merging is always in name order, so both produce the same registry.
    ///
    /// # Errors
    /// - [`BuildError::Io`] if the crates directory can't be listed
    /// - [`BuildError::Bundle`] if any bundle fails to load
    /// - [`BuildError::DuplicateComponent`] if two bundles register the same name for one extension point
    pub fn build( config: &RegistryConfig, host: &HostExtensionPoints, engine: &Engine ) -> Result<Self, BuildError> {

        let bundle_dirs = list_bundles( &config.crates_dir )
            .map_err(| source | BuildError::Io { path: config.crates_dir.clone(), source })?;
        tracing::info!( crates_dir = %config.crates_dir.display(), bundles = bundle_dirs.len(), "Loading bundles" );

        let ( linker, linker_errors ) = host_linker( engine );
        linker_errors.iter().for_each(| err | tracing::warn!( error = %err, "Failed to register host export" ));

        let load = |( name, dir ): ( BundleName, PathBuf )| Bundle::load( name.clone(), dir, config, host, engine, &linker )
            .map_err(| source | BuildError::Bundle { bundle: name, source });
        let loaded = match config.parallel {
            true => bundle_dirs.into_par_iter().map( load ).collect::<Vec<_>>().into_iter().collect::<Result<Vec<_>, _>>()?,
            false => bundle_dirs.into_iter().map( load ).collect::<Result<Vec<_>, _>>()?,
        };

        let mut bundles: Vec<Bundle> = Vec::with_capacity( loaded.len() );
        let mut components = BTreeMap::<TypeIdentifier, BTreeMap<String, Registered>>::new();
        for ( bundle, warnings ) in loaded {
            warnings.iter().for_each(|( path, err )| tracing::warn!(
                bundle = %bundle.name(), artifact = %path.display(), error = %err, "Skipping malformed artifact data",
            ));
            for entry in bundle.table().entries() {
                match components.entry( entry.extension_point.clone() ).or_default().entry( entry.name.clone() ) {
                    Entry::Occupied( existing ) => return Err( BuildError::DuplicateComponent {
                        extension_point: entry.extension_point,
                        name: entry.name,
                        first: bundles[ existing.get().bundle ].name().clone(),
                        second: bundle.name().clone(),
                    }),
                    Entry::Vacant( slot ) => { slot.insert( Registered { bundle: bundles.len(), implementation: entry.implementation }); }
                }
            }
            bundles.push( bundle );
        }

        let registry = Self { bundles, components };
        registry.log_listing();
        Ok( registry )

    }

    /// Creates a new instance of the component registered as `name` for `extension_point`.
    ///
    /// The implementation is resolved and instantiated through its own bundle's load context.
    ///
    /// # Errors
    /// - [`LookupError::UnknownExtensionPoint`] if no bundle implements `extension_point`
    /// - [`LookupError::UnknownComponent`] if none registered `name` for it
    /// - [`LookupError::Resolve`] / [`LookupError::Instantiate`] if the component can't be created
    pub fn get_named_component( &self, name: &str, extension_point: &TypeIdentifier ) -> Result<Component, LookupError> {

        let registered = self.components.get( extension_point )
            .ok_or_else(|| LookupError::UnknownExtensionPoint( extension_point.clone() ))?
            .get( name )
            .ok_or_else(|| LookupError::UnknownComponent { extension_point: extension_point.clone(), name: name.to_string() })?;

        let context = self.bundles[ registered.bundle ].context();
        let runtime_type = context.resolve( &registered.implementation )?;
        Ok( context.instantiate( &runtime_type )?.named( name ))

    }

    /// Every registered component, sorted by extension point then name.
    pub fn entries( &self ) -> impl Iterator<Item = NamedComponentEntry> + '_ {
        self.components.iter().flat_map(|( extension_point, names )| names.iter().map(|( name, registered )|
            NamedComponentEntry::new( extension_point.clone(), name.clone(), registered.implementation.clone() )
        ))
    }

    /// Extension points with at least one registered component.
    pub fn extension_points( &self ) -> impl Iterator<Item = &TypeIdentifier> {
        self.components.keys()
    }

    /// The loaded bundles, in name order.
    #[inline] pub fn bundles( &self ) -> &[Bundle] { &self.bundles }

    /// The bundle that registered `name` for `extension_point`.
    pub fn bundle_for( &self, extension_point: &TypeIdentifier, name: &str ) -> Option<&BundleName> {
        self.components.get( extension_point )
            .and_then(| names | names.get( name ))
            .map(| registered | self.bundles[ registered.bundle ].name() )
    }

    pub fn len( &self ) -> usize { self.components.values().map( BTreeMap::len ).sum() }
    #[inline] pub fn is_empty( &self ) -> bool { self.components.is_empty() }

    fn log_listing( &self ) {
        tracing::info!( bundles = self.bundles.len(), components = self.len(), "COMPONENTS" );
        for ( extension_point, names ) in &self.components {
            for ( name, registered ) in names {
                tracing::info!( "  {extension_point} [{name}] -> {} ({})", registered.implementation, self.bundles[ registered.bundle ].name() );
            }
        }
    }

}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "ComponentRegistry" )
            .field( "bundles", &self.bundles.iter().map( Bundle::name ).collect::<Vec<_>>() )
            .field( "components", &self.entries().map(| entry | entry.to_string() ).collect::<Vec<_>>() )
            .finish()
    }
}
