use component_host::{
    BuildError, BundleError, CacheMode, ComponentRegistry, Engine, HostExtensionPoints, LoadContextError, TypeDescriptor,
};

use crate::{ Crates, TOKENIZER_FACTORY };



fn crates_with_stale_cache() -> Crates {
    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    std::fs::write( crates.cache_file( "example" ), "host.analysis.TokenizerFactory vanished example.Vanished\n" ).unwrap();
    crates
}

#[test]
fn build_error_stale_cache() {

    let crates = crates_with_stale_cache();

    match ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ) {
        Err( BuildError::Bundle { bundle, source: BundleError::LoadContext( LoadContextError::UnresolvedType { type_id, .. })}) => {
            assert_eq!( bundle.as_str(), "example" );
            assert_eq!( type_id.as_str(), "example.Vanished" );
        }
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

}

#[test]
fn build_error_cached_undeclared_extension_point() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    std::fs::write( crates.cache_file( "example" ), "bogus.NotAnExtensionPoint foo example.Tokenizer\n" ).unwrap();

    match ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ) {
        Err( BuildError::Bundle { bundle, source: BundleError::UndeclaredExtensionPoint { extension_point, name, implementation }}) => {
            assert_eq!( bundle.as_str(), "example" );
            assert_eq!( extension_point.as_str(), "bogus.NotAnExtensionPoint" );
            assert_eq!( name, "foo" );
            assert_eq!( implementation.as_str(), "example.Tokenizer" );
        }
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

}

#[test]
fn cached_entry_under_eligible_subtype_is_rejected() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Base" ).with_interface( TOKENIZER_FACTORY ),
        TypeDescriptor::new( "example.Tokenizer" ).with_supertype( "example.Base" ).named( "example-tokenizer" ),
    ]);
    std::fs::write( crates.cache_file( "example" ), "example.Base example-tokenizer example.Tokenizer\n" ).unwrap();

    match ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ) {
        Err( BuildError::Bundle { source: BundleError::UndeclaredExtensionPoint { extension_point, .. }, .. }) => {
            assert_eq!( extension_point.as_str(), "example.Base" );
        }
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

    let registry = ComponentRegistry::build(
        &crates.config().with_cache( CacheMode::Refresh ),
        &HostExtensionPoints::analysis(),
        &Engine::default(),
    ).unwrap();
    assert!( registry.get_named_component( "example-tokenizer", &TOKENIZER_FACTORY.into() ).is_ok() );

}

#[test]
fn refresh_replaces_stale_cache() {

    let crates = crates_with_stale_cache();
    let config = crates.config().with_cache( CacheMode::Refresh );

    let registry = ComponentRegistry::build( &config, &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    assert!( registry.get_named_component( "example-tokenizer", &TOKENIZER_FACTORY.into() ).is_ok() );
    assert_eq!(
        std::fs::read_to_string( crates.cache_file( "example" )).unwrap(),
        "host.analysis.TokenizerFactory example-tokenizer example.Tokenizer\n",
    );

}

#[test]
fn malformed_cache_is_regenerated() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    std::fs::write( crates.cache_file( "example" ), "not a cache line\nat all\n" ).unwrap();

    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    assert_eq!( registry.len(), 1 );
    assert_eq!(
        std::fs::read_to_string( crates.cache_file( "example" )).unwrap(),
        "host.analysis.TokenizerFactory example-tokenizer example.Tokenizer\n",
    );

}
