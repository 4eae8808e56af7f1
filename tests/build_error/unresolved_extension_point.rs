use component_host::{ BuildError, BundleError, ComponentRegistry, Engine, HostExtensionPoints, ScanError, TypeDescriptor };

use crate::{ Crates, TOKENIZER_FACTORY };



#[test]
fn build_error_unresolved_extension_point() {

    let crates = Crates::new();
    crates.artifact( "good", "good.wasm", &[
        TypeDescriptor::new( "good.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "good" ),
    ]);
    crates.artifact( "orphaned", "orphaned.wasm", &[
        TypeDescriptor::new( "orphaned.Helper" ),
        TypeDescriptor::new( "orphaned.Orphan" ).with_supertype( "orphaned.Helper" ).named( "orphan" ),
    ]);

    match ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ) {
        Err( BuildError::Bundle { bundle, source: BundleError::Scan( ScanError::UnresolvedExtensionPoint { name, type_id })}) => {
            assert_eq!( bundle.as_str(), "orphaned" );
            assert_eq!( name, "orphan" );
            assert_eq!( type_id.as_str(), "orphaned.Orphan" );
        }
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }
    assert!( !crates.cache_file( "orphaned" ).exists() );

}

#[test]
fn bundle_cannot_declare_its_own_extension_point() {

    let crates = Crates::new();
    crates.artifact( "rogue", "rogue.wasm", &[
        TypeDescriptor::new( "rogue.Point" ).extensible(),
        TypeDescriptor::new( "rogue.Impl" ).with_interface( "rogue.Point" ).named( "rogue" ),
    ]);

    assert!( matches!(
        ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ),
        Err( BuildError::Bundle { source: BundleError::Scan( ScanError::UnresolvedExtensionPoint { .. }), .. }),
    ));

}
