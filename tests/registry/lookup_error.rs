use component_host::{ ComponentRegistry, Engine, HostExtensionPoints, InstantiateError, LookupError, TypeDescriptor };

use crate::{ Crates, TOKENIZER_FACTORY, TOKEN_FILTER_FACTORY };



fn registry( crates: &Crates ) -> ComponentRegistry {
    ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap()
}

#[test]
fn lookup_error_unknown_component() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);

    match registry( &crates ).get_named_component( "nonexistent", &TOKENIZER_FACTORY.into() ) {
        Err( LookupError::UnknownComponent { extension_point, name }) => {
            assert_eq!( extension_point.as_str(), TOKENIZER_FACTORY );
            assert_eq!( name, "nonexistent" );
        }
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

}

#[test]
fn lookup_error_unknown_extension_point() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    let registry = registry( &crates );

    for extension_point in [ TOKEN_FILTER_FACTORY, "host.analysis.Nothing" ] {
        match registry.get_named_component( "example-tokenizer", &extension_point.into() ) {
            Err( LookupError::UnknownExtensionPoint( found )) => assert_eq!( found.as_str(), extension_point ),
            Err( err ) => panic!( "Unexpected error: {}", err ),
            Ok( _ ) => panic!( "Expected failure" ),
        }
    }

}

#[test]
fn lookup_error_no_default_constructor() {

    let crates = Crates::new();
    crates.artifact_from_wat( "example", "example.wasm", r#"(module
        (func (export "example.NeedsConfig") (param i32))
    )"#, &[ TypeDescriptor::new( "example.NeedsConfig" ).with_interface( TOKENIZER_FACTORY ).named( "needs-config" ) ]);

    match registry( &crates ).get_named_component( "needs-config", &TOKENIZER_FACTORY.into() ) {
        Err( LookupError::Instantiate( InstantiateError::NoDefaultConstructor( type_id ))) => assert_eq!( type_id.as_str(), "example.NeedsConfig" ),
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

}

#[test]
fn lookup_error_constructor_trap() {

    let crates = Crates::new();
    crates.artifact_from_wat( "example", "example.wasm", r#"(module
        (func (export "example.Broken") unreachable)
    )"#, &[ TypeDescriptor::new( "example.Broken" ).with_interface( TOKENIZER_FACTORY ).named( "broken" ) ]);

    let registry = registry( &crates );
    for _ in 0..2 {
        assert!( matches!(
            registry.get_named_component( "broken", &TOKENIZER_FACTORY.into() ),
            Err( LookupError::Instantiate( InstantiateError::InstantiationFailure { .. })),
        ));
    }

}
