use thiserror::Error ;
use wasmtime::{ Instance, Store, Val };

use crate::{ BundleName, ComponentState, TypeIdentifier };



/// A live instance of a named component.
///
/// Created by [`LoadContext::instantiate`]( crate::LoadContext::instantiate ) or
/// [`ComponentRegistry::get_named_component`]( crate::ComponentRegistry::get_named_component ).
/// Owns its own [`Store`], so it shares no state with other instances of the same type.
pub struct Component {
    bundle: BundleName,
    implementation: TypeIdentifier,
    name: Option<String>,
    store: Store<ComponentState>,
    instance: Instance,
    constructor_results: Vec<Val>,
}

/// Errors from calling into a live component.
#[derive( Error, Debug )]
pub enum CallError {
    /// The component has no function export with this name.
    #[error( "Missing export: {0}" )] MissingExport( String ),
    /// The function trapped or the arguments didn't match its signature.
    #[error( "Runtime exception: {0}" )] Trap( wasmtime::Error ),
}

impl Component {

    pub(crate) fn new(
        bundle: BundleName,
        implementation: TypeIdentifier,
        store: Store<ComponentState>,
        instance: Instance,
        constructor_results: Vec<Val>,
    ) -> Self {
        Self { bundle, implementation, name: None, store, instance, constructor_results }
    }

    pub(crate) fn named( mut self, name: impl Into<String> ) -> Self {
        self.name = Some( name.into() );
        self
    }

    /// The bundle whose load context created this instance.
    #[inline] pub fn bundle( &self ) -> &BundleName { &self.bundle }
    /// The implementation type this is an instance of.
    #[inline] pub fn implementation( &self ) -> &TypeIdentifier { &self.implementation }
    /// The name it was requested under, if it came from the registry.
    #[inline] pub fn name( &self ) -> Option<&str> { self.name.as_deref() }
    /// Whatever the default constructor returned.
    #[inline] pub fn constructor_results( &self ) -> &[Val] { &self.constructor_results }

    /// Calls the exported function `export` on this instance.
    ///
    /// # Errors
    /// - [`CallError::MissingExport`] if there is no function export called `export`
    /// - [`CallError::Trap`] if the call itself fails
    pub fn call( &mut self, export: &str, args: &[Val] ) -> Result<Vec<Val>, CallError> {
        let func = self.instance
            .get_func( &mut self.store, export )
            .ok_or_else(|| CallError::MissingExport( export.to_string() ))?;
        let mut results = vec![ Val::I32( 0 ); func.ty( &self.store ).results().len() ];
        func.call( &mut self.store, args, &mut results ).map_err( CallError::Trap )?;
        Ok( results )
    }

}

impl std::fmt::Debug for Component {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        f.debug_struct( "Component" )
            .field( "bundle", &self.bundle )
            .field( "implementation", &self.implementation )
            .field( "name", &self.name )
            .field( "data", self.store.data() )
            .finish_non_exhaustive()
    }
}



#[cfg( test )]
mod tests {

    use wasmtime::{ Engine, Linker };
    use crate::LoadContext ;

    use super::* ;

    fn component( wat: &str, type_id: &str ) -> ( tempfile::TempDir, Component ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "plugin.wasm" );
        std::fs::write( &path, wat::parse_str( wat ).unwrap() ).unwrap();
        let engine = Engine::default();
        let ( context, _ ) = LoadContext::open( "example".into(), &engine, &Linker::new( &engine ), [ path ]).unwrap();
        let runtime_type = context.resolve( &type_id.into() ).unwrap();
        let component = context.instantiate( &runtime_type ).unwrap();
        ( dir, component )
    }

    const ACCUMULATOR: &str = r#"(module
        (global $total (mut i32) (i32.const 0))
        (func (export "p.Accumulator"))
        (func (export "add") (param i32) (result i32)
            (global.set $total (i32.add (global.get $total) (local.get 0)))
            (global.get $total))
        (func (export "fail") unreachable)
    )"# ;

    #[test]
    fn calls_keep_instance_state() {
        let ( _dir, mut component ) = component( ACCUMULATOR, "p.Accumulator" );
        component.call( "add", &[ Val::I32( 2 )]).unwrap();
        let results = component.call( "add", &[ Val::I32( 3 )]).unwrap();
        assert!( matches!( results.as_slice(), [ Val::I32( 5 )]));
        assert_eq!( component.implementation().as_str(), "p.Accumulator" );
        assert_eq!( component.name(), None );
    }

    #[test]
    fn missing_export_is_reported() {
        let ( _dir, mut component ) = component( ACCUMULATOR, "p.Accumulator" );
        assert!( matches!( component.call( "nope", &[] ), Err( CallError::MissingExport( name )) if name == "nope" ));
    }

    #[test]
    fn trap_is_reported() {
        let ( _dir, mut component ) = component( ACCUMULATOR, "p.Accumulator" );
        assert!( matches!( component.call( "fail", &[] ), Err( CallError::Trap( _ ))));
    }

    #[test]
    fn named_records_request_name() {
        let ( _dir, component ) = component( ACCUMULATOR, "p.Accumulator" );
        assert_eq!( component.named( "acc" ).name(), Some( "acc" ));
    }

}
