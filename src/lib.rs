//! Discovery and loading of named plugin components.
//!
//! A host application declares **extension points**, types plugins may implement.
//! Plugins ship as **bundles**, one directory each inside a crates directory,
//! holding WebAssembly artifacts. `component_host` finds out which types in a
//! bundle implement which extension point without running any plugin code,
//! caches the result next to the bundle, and instantiates a component by name on
//! demand inside the bundle's own isolated load context.
//!
//! # Core Concepts
//!
//! - [`TypeDescriptor`]: What an artifact declares about one of its types: the
//! 	supertype, the interfaces, and tags such as `extensible` or `named( "..." )`.
//! 	Descriptors live in the artifact's `component-types` custom sections and are
//! 	read with [`read_artifact`] without compiling the module.
//!
//! - [`HostExtensionPoints`]: The host's own API, closed over once. Every type tagged
//! 	`extensible` is a root; every host type descending from a root is eligible too.
//!
//! - [`ExtensionPoints`] and [`HierarchyIndex`]: Each bundle copies the host's points
//! 	and closes them over its own hierarchy, so a plugin can subtype an extension
//! 	point and have its subtypes implement it as well.
//!
//! - [`LoadContext`]: One per bundle. Resolves type identifiers to the artifact
//! 	exporting them and instantiates them through their default constructor, each
//! 	instance in its own store.
//!
//! - [`DiscoveryCache`]: The bundle's `component-info.txt`, so later starts skip scanning.
//!
//! - [`ComponentRegistry`]: Loads every bundle, merges their components, and serves
//! 	[`get_named_component`]( ComponentRegistry::get_named_component ).
//!
//! # Artifacts
//!
//! A type is instantiable if its artifact exports a function without parameters
//! under the type's full identifier. Plugin tooling attaches the descriptors with
//! [`embed_descriptors`].
//!
//! # Example
//!
//! ```
//! use component_host::{
//! 	ComponentRegistry, Engine, HostExtensionPoints, RegistryConfig, TypeDescriptor, embed_descriptors,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let crates = tempfile::tempdir()?;
//! std::fs::create_dir( crates.path().join( "example" ))?;
//!
//! // The plugin exports a default constructor under the type's full name
//! // and describes the type in a custom section.
//! let module = wat::parse_str( r#"(module (func (export "example.ExampleTokenizerFactory")))"# )?;
//! let artifact = embed_descriptors( &module, &[
//! 	TypeDescriptor::new( "example.ExampleTokenizerFactory" )
//! 		.with_interface( "host.analysis.TokenizerFactory" )
//! 		.named( "example-tokenizer" ),
//! ]);
//! std::fs::write( crates.path().join( "example" ).join( "plugin.wasm" ), artifact )?;
//!
//! let engine = Engine::default();
//! let host = HostExtensionPoints::analysis();
//! let registry = ComponentRegistry::build( &RegistryConfig::new( crates.path() ), &host, &engine )?;
//!
//! let tokenizer = registry.get_named_component( "example-tokenizer", &"host.analysis.TokenizerFactory".into() )?;
//! assert_eq!( tokenizer.bundle().as_str(), "example" );
//! assert_eq!( tokenizer.implementation().as_str(), "example.ExampleTokenizerFactory" );
//! # Ok(())
//! # }
//! ```
//!
//! # Failure Policy
//!
//! Building is all or nothing: a bundle that can't be read, a named type that
//! implements no extension point, or two bundles registering the same name for
//! the same extension point fail [`ComponentRegistry::build`]. Malformed
//! descriptor entries only skip themselves and are logged. Lookups never retry.

mod type_id ;
mod artifact ;
mod hierarchy ;
mod extensibility ;
mod component_table ;
mod scanner ;
mod cache ;
mod load_context ;
mod component ;
mod host ;
mod host_exports ;
mod bundle ;
mod config ;
mod registry ;
mod utils ;

#[doc( no_inline )]
pub use wasmtime::{ Engine, Val };

pub use type_id::{ TypeIdentifier, BundleName };
pub use artifact::{ TypeDescriptor, DeclaredTag, MalformedArtifact, TYPE_SECTION, EXTENSIBLE_TAG, NAMED_TAG };
pub use artifact::{ read_artifact, parse_descriptor, embed_descriptors };
pub use hierarchy::HierarchyIndex ;
pub use extensibility::{ ExtensionPoints, RootConflict };
pub use component_table::{ ComponentTable, NamedComponentEntry };
pub use scanner::{ NamedComponentScanner, ScanError, discover_components };
pub use cache::{ DiscoveryCache, CacheError, CACHE_FILE };
pub use load_context::{ LoadContext, LoadContextError, InstantiateError, RuntimeType, ComponentState };
pub use component::{ Component, CallError };
pub use host::{ HostExtensionPoints, HostApiError, analysis_api };
pub use host_exports::host_linker ;
pub use bundle::{ Bundle, BundleError, list_bundles, list_artifacts };
pub use config::{ RegistryConfig, CacheMode, ConfigError };
pub use registry::{ ComponentRegistry, BuildError, LookupError };
pub use utils::PartialSuccess ;
