use wasm_encoder::{ CustomSection, Section };
use component_host::{
    BuildError, Bundle, BundleError, ComponentRegistry, Engine, HostExtensionPoints, MalformedArtifact, RegistryConfig,
    ScanError, TypeDescriptor, host_linker, TYPE_SECTION,
};

use crate::{ Crates, TOKENIZER_FACTORY };



/// An artifact with one good descriptor followed by an entry whose name length overruns it.
fn crates_with_malformed_entry() -> Crates {
    let crates = Crates::new();
    let path = crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    let mut bytes = std::fs::read( &path ).unwrap();
    CustomSection { name: TYPE_SECTION.into(), data: vec![ 2, 0x7f, b'x' ].into() }.append_to( &mut bytes );
    std::fs::write( &path, bytes ).unwrap();
    crates
}

#[test]
fn malformed_entry_is_skipped() {

    let crates = crates_with_malformed_entry();
    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    assert_eq!( registry.len(), 1 );
    assert!( registry.get_named_component( "example-tokenizer", &TOKENIZER_FACTORY.into() ).is_ok() );

}

#[test]
fn malformed_entry_is_reported_by_bundle() {

    let crates = crates_with_malformed_entry();
    let engine = Engine::default();
    let ( linker, linker_errors ) = host_linker( &engine );
    assert_no_warnings!( linker_errors );

    let ( bundle, warnings ) = Bundle::load(
        "example".into(),
        crates.path().join( "example" ),
        &RegistryConfig::new( crates.path() ),
        &HostExtensionPoints::analysis(),
        &engine,
        &linker,
    ).unwrap();

    assert_eq!( bundle.table().len(), 1 );
    assert_eq!( warnings.len(), 1 );
    assert!( matches!( warnings[ 0 ].1, MalformedArtifact::Entry( _ )));

}

#[test]
fn clean_bundle_has_no_warnings() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    let engine = Engine::default();
    let ( linker, _ ) = host_linker( &engine );

    let ( _, warnings ) = Bundle::load(
        "example".into(),
        crates.path().join( "example" ),
        &RegistryConfig::new( crates.path() ),
        &HostExtensionPoints::analysis(),
        &engine,
        &linker,
    ).unwrap();
    assert_no_warnings!( warnings );

}

#[test]
fn build_error_malformed_ancestor() {

    let crates = Crates::new();
    let path = crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_supertype( "example.Base" ).named( "example-tokenizer" ),
    ]);

    // The name length of the base entry overruns its body.
    let mut base = Vec::new();
    TypeDescriptor::new( "example.Base" ).with_interface( TOKENIZER_FACTORY ).encode( &mut base );
    base[ 1 ] = 0x7f ;
    let mut bytes = std::fs::read( &path ).unwrap();
    CustomSection { name: TYPE_SECTION.into(), data: base.into() }.append_to( &mut bytes );
    std::fs::write( &path, bytes ).unwrap();

    match ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ) {
        Err( BuildError::Bundle { bundle, source: BundleError::Scan( ScanError::UnresolvedExtensionPoint { name, type_id })}) => {
            assert_eq!( bundle.as_str(), "example" );
            assert_eq!( name, "example-tokenizer" );
            assert_eq!( type_id.as_str(), "example.Tokenizer" );
        }
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

}
