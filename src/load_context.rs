//! Per-bundle isolated resolution and instantiation scope.
//!
//! Every bundle gets its own [`LoadContext`]. It owns the bundle's artifact bytes
//! for the lifetime of the process, compiles each artifact at most once, and
//! creates a fresh wasmtime [`Store`] for every instance, so nothing one bundle
//! instantiates can observe another bundle's state.

use std::collections::HashMap ;
use std::collections::hash_map::Entry ;
use std::path::{ Path, PathBuf };
use std::sync::atomic::{ AtomicU64, Ordering };
use once_cell::sync::OnceCell ;
use thiserror::Error ;
use wasmparser::{ Parser, Payload };
use wasmtime::{ Engine, ExternType, Linker, Module, Store, Val };

use crate::{ BundleName, Component, MalformedArtifact, TypeIdentifier };
use crate::utils::PartialSuccess ;



static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new( 0 );

/// Store data for every component instance.
#[derive( Debug, Clone )]
pub struct ComponentState {
    bundle: BundleName,
}

impl ComponentState {
    /// The bundle the running component was loaded from.
    #[inline] pub fn bundle( &self ) -> &BundleName { &self.bundle }
}

/// A type resolved inside one [`LoadContext`].
///
/// Two runtime types are equal only if they were resolved by the same context,
/// whatever their identifiers.
#[derive( Clone, Debug, Eq, Hash, PartialEq )]
pub struct RuntimeType {
    context: u64,
    artifact: usize,
    bundle: BundleName,
    type_id: TypeIdentifier,
}

impl RuntimeType {
    #[inline] pub fn type_id( &self ) -> &TypeIdentifier { &self.type_id }
    #[inline] pub fn bundle( &self ) -> &BundleName { &self.bundle }
}

#[derive( Error, Debug )]
pub enum LoadContextError {
    #[error( "Failed to read artifact {}: {source}", path.display() )]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error( "Type {type_id} is not exported by any artifact of bundle {bundle}" )]
    UnresolvedType { bundle: BundleName, type_id: TypeIdentifier },
}

/// Failure to construct a component. Never retried.
#[derive( Error, Debug )]
pub enum InstantiateError {
    /// The runtime type was resolved by a different load context.
    #[error( "{0} was resolved by another bundle's load context" )] ForeignType( TypeIdentifier ),
    /// The type's export is not a function taking no arguments.
    #[error( "{0} has no default constructor" )] NoDefaultConstructor( TypeIdentifier ),
    /// Compiling, linking, or running the constructor failed.
    #[error( "Failed to instantiate {type_id}: {error}" )]
    InstantiationFailure { type_id: TypeIdentifier, error: wasmtime::Error },
}

struct Artifact {
    path: PathBuf,
    bytes: Vec<u8>,
    module: OnceCell<Module>,
}

/// The isolated scope owned by one bundle.
pub struct LoadContext {
    id: u64,
    bundle: BundleName,
    engine: Engine,
    linker: Linker<ComponentState>,
    artifacts: Vec<Artifact>,
    exports: HashMap<String, usize>,
}

impl LoadContext {

    /// Reads every artifact of a bundle and indexes its exports without compiling anything.
    ///
    /// The `linker` provides the host functions plugins may import; each context
    /// keeps its own copy.
    ///
    /// # Partial Success
    /// An artifact whose export section can't be parsed stays in the context, but
    /// none of its types resolve. The parse error is returned next to the context.
    ///
    /// # Errors
    /// [`LoadContextError::Io`] if an artifact can't be read.
    pub fn open(
        bundle: BundleName,
        engine: &Engine,
        linker: &Linker<ComponentState>,
        artifact_paths: impl IntoIterator<Item = PathBuf>,
    ) -> Result<PartialSuccess<Self, ( PathBuf, MalformedArtifact )>, LoadContextError> {

        let artifacts = artifact_paths.into_iter()
            .map(| path | match std::fs::read( &path ) {
                Ok( bytes ) => Ok( Artifact { path, bytes, module: OnceCell::new() }),
                Err( source ) => Err( LoadContextError::Io { path, source }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut exports = HashMap::<String, usize>::new();
        let mut errors = Vec::new();
        for ( index, artifact ) in artifacts.iter().enumerate() {
            match export_names( &artifact.bytes ) {
                Ok( names ) => names.into_iter().for_each(| name | match exports.entry( name ) {
                    Entry::Occupied( first ) => {
                        tracing::debug!( %bundle, export = %first.key(), first = %artifacts[ *first.get() ].path.display(), "Export shadowed by an earlier artifact" );
                    }
                    Entry::Vacant( slot ) => { slot.insert( index ); }
                }),
                Err( err ) => errors.push(( artifact.path.clone(), err )),
            }
        }

        Ok(( Self {
            id: NEXT_CONTEXT_ID.fetch_add( 1, Ordering::Relaxed ),
            bundle,
            engine: engine.clone(),
            linker: linker.clone(),
            artifacts,
            exports,
        }, errors ))

    }

    /// The bundle this context belongs to.
    #[inline] pub fn identity( &self ) -> &BundleName { &self.bundle }

    /// Every artifact path with its raw bytes, in the order they were opened.
    pub fn artifacts( &self ) -> impl Iterator<Item = ( &Path, &[u8] )> {
        self.artifacts.iter().map(| artifact | ( artifact.path.as_path(), artifact.bytes.as_slice() ))
    }

    /// Locates the artifact exporting `type_id`.
    ///
    /// # Errors
    /// [`LoadContextError::UnresolvedType`] if no artifact of this bundle exports it.
    pub fn resolve( &self, type_id: &TypeIdentifier ) -> Result<RuntimeType, LoadContextError> {
        self.exports.get( type_id.as_str() )
            .map(| artifact | RuntimeType {
                context: self.id,
                artifact: *artifact,
                bundle: self.bundle.clone(),
                type_id: type_id.clone(),
            })
            .ok_or_else(|| LoadContextError::UnresolvedType { bundle: self.bundle.clone(), type_id: type_id.clone() })
    }

    /// Creates a new instance of `runtime_type` by calling its default constructor.
    ///
    /// The artifact is compiled on first use. Each call gets its own [`Store`].
    ///
    /// # Errors
    /// - [`InstantiateError::ForeignType`] if `runtime_type` came from another context
    /// - [`InstantiateError::NoDefaultConstructor`] if the type's export isn't a function without parameters
    /// - [`InstantiateError::InstantiationFailure`] if compiling, linking, or the constructor itself fails
    pub fn instantiate( &self, runtime_type: &RuntimeType ) -> Result<Component, InstantiateError> {

        let type_id = &runtime_type.type_id ;
        let failure = | error: wasmtime::Error | InstantiateError::InstantiationFailure { type_id: type_id.clone(), error };

        let artifact = match runtime_type.context == self.id {
            true => &self.artifacts[ runtime_type.artifact ],
            false => return Err( InstantiateError::ForeignType( type_id.clone() )),
        };
        let module = artifact.module.get_or_try_init(|| {
            tracing::debug!( bundle = %self.bundle, artifact = %artifact.path.display(), "Compiling artifact" );
            Module::new( &self.engine, &artifact.bytes )
        }).map_err( failure )?;

        let result_count = match module.get_export( type_id.as_str() ) {
            Some( ExternType::Func( constructor )) if constructor.params().len() == 0 => constructor.results().len(),
            _ => return Err( InstantiateError::NoDefaultConstructor( type_id.clone() )),
        };

        let mut store = Store::new( &self.engine, ComponentState { bundle: self.bundle.clone() });
        let instance = self.linker.instantiate( &mut store, module ).map_err( failure )?;
        let constructor = instance.get_func( &mut store, type_id.as_str() )
            .ok_or_else(|| InstantiateError::NoDefaultConstructor( type_id.clone() ))?;

        let mut results = vec![ Val::I32( 0 ); result_count ];
        constructor.call( &mut store, &[], &mut results ).map_err( failure )?;

        Ok( Component::new( self.bundle.clone(), type_id.clone(), store, instance, results ))

    }

}

impl std::fmt::Debug for LoadContext {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "LoadContext" )
            .field( "id", &self.id )
            .field( "bundle", &self.bundle )
            .field( "artifacts", &self.artifacts.iter().map(| artifact | &artifact.path ).collect::<Vec<_>>() )
            .field( "exports", &self.exports.len() )
            .finish_non_exhaustive()
    }
}

fn export_names( bytes: &[u8] ) -> Result<Vec<String>, MalformedArtifact> {
    let mut names = Vec::new();
    for payload in Parser::new( 0 ).parse_all( bytes ) {
        if let Payload::ExportSection( reader ) = payload.map_err( MalformedArtifact::Module )? {
            for export in reader {
                names.push( export.map_err( MalformedArtifact::Module )?.name.to_string() );
            }
        }
    }
    Ok( names )
}



#[cfg( test )]
mod tests {

    use super::* ;

    fn context( bundle: &str, wat: &str ) -> ( tempfile::TempDir, LoadContext ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "plugin.wasm" );
        std::fs::write( &path, wat::parse_str( wat ).unwrap() ).unwrap();
        let engine = Engine::default();
        let ( context, errors ) = LoadContext::open( bundle.into(), &engine, &Linker::new( &engine ), [ path ]).unwrap();
        assert!( errors.is_empty() );
        ( dir, context )
    }

    const COUNTER: &str = r#"(module
        (global $count (mut i32) (i32.const 0))
        (func (export "p.Counter") (result i32)
            (global.set $count (i32.add (global.get $count) (i32.const 1)))
            (global.get $count))
        (func (export "p.NeedsArgs") (param i32))
        (func (export "p.Trap") unreachable)
        (global (export "p.Marker") i32 (i32.const 0))
    )"# ;

    #[test]
    fn resolves_exported_types_only() {
        let ( _dir, context ) = context( "example", COUNTER );
        assert_eq!( context.resolve( &"p.Counter".into() ).unwrap().bundle().as_str(), "example" );
        assert!( matches!(
            context.resolve( &"p.Missing".into() ),
            Err( LoadContextError::UnresolvedType { .. }),
        ));
    }

    #[test]
    fn each_instance_gets_its_own_store() {
        let ( _dir, context ) = context( "example", COUNTER );
        let counter = context.resolve( &"p.Counter".into() ).unwrap();
        let first = context.instantiate( &counter ).unwrap();
        let second = context.instantiate( &counter ).unwrap();
        assert!( matches!( first.constructor_results(), [ Val::I32( 1 )]));
        assert!( matches!( second.constructor_results(), [ Val::I32( 1 )]));
        assert_eq!( second.bundle().as_str(), "example" );
    }

    #[test]
    fn same_identifier_in_two_contexts_is_two_types() {
        let ( _a, first ) = context( "first", COUNTER );
        let ( _b, second ) = context( "second", COUNTER );
        let from_first = first.resolve( &"p.Counter".into() ).unwrap();
        let from_second = second.resolve( &"p.Counter".into() ).unwrap();
        assert_ne!( from_first, from_second );
        assert!( matches!( second.instantiate( &from_first ), Err( InstantiateError::ForeignType( _ ))));
    }

    #[test]
    fn constructor_must_take_no_arguments() {
        let ( _dir, context ) = context( "example", COUNTER );
        for type_id in [ "p.NeedsArgs", "p.Marker" ] {
            let runtime_type = context.resolve( &type_id.into() ).unwrap();
            assert!( matches!(
                context.instantiate( &runtime_type ),
                Err( InstantiateError::NoDefaultConstructor( _ )),
            ), "{type_id}" );
        }
    }

    #[test]
    fn trapping_constructor_is_an_instantiation_failure() {
        let ( _dir, context ) = context( "example", COUNTER );
        let runtime_type = context.resolve( &"p.Trap".into() ).unwrap();
        assert!( matches!(
            context.instantiate( &runtime_type ),
            Err( InstantiateError::InstantiationFailure { .. }),
        ));
    }

    #[test]
    fn unreadable_export_section_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "broken.wasm" );
        std::fs::write( &path, b"not wasm" ).unwrap();
        let engine = Engine::default();
        let ( context, errors ) = LoadContext::open( "broken".into(), &engine, &Linker::new( &engine ), [ path ]).unwrap();
        assert_eq!( errors.len(), 1 );
        assert_eq!( context.artifacts().count(), 1 );
    }

    #[test]
    fn earlier_artifact_shadows_later_export() {
        let dir = tempfile::tempdir().unwrap();
        let paths = [ ( "a.wasm", 1 ), ( "b.wasm", 2 ) ].map(|( file, value )| {
            let path = dir.path().join( file );
            let wat = format!( r#"(module (func (export "p.Shared") (result i32) i32.const {value}))"# );
            std::fs::write( &path, wat::parse_str( wat ).unwrap() ).unwrap();
            path
        });
        let engine = Engine::default();
        let ( context, errors ) = LoadContext::open( "shadowed".into(), &engine, &Linker::new( &engine ), paths ).unwrap();
        assert!( errors.is_empty() );

        let shared = context.resolve( &"p.Shared".into() ).unwrap();
        let component = context.instantiate( &shared ).unwrap();
        assert!( matches!( component.constructor_results(), [ Val::I32( 1 )]));
    }

    #[test]
    fn missing_artifact_is_an_error() {
        let engine = Engine::default();
        let result = LoadContext::open( "gone".into(), &engine, &Linker::new( &engine ), [ PathBuf::from( "/nonexistent/plugin.wasm" )]);
        assert!( matches!( result, Err( LoadContextError::Io { .. })));
    }

}
