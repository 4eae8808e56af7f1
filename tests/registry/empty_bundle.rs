use component_host::{ ComponentRegistry, Engine, HostExtensionPoints, TypeDescriptor };

use crate::{ Crates, TOKENIZER_FACTORY };



#[test]
fn empty_bundle_registers_nothing() {

    let crates = Crates::new();
    crates.bundle( "empty" );
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    std::fs::write( crates.path().join( "README.md" ), "not a bundle" ).unwrap();

    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    let bundles = registry.bundles().iter().map(| bundle | bundle.name().as_str() ).collect::<Vec<_>>();
    assert_eq!( bundles, vec![ "empty", "example" ]);
    assert!( registry.bundles()[ 0 ].table().is_empty() );
    assert_eq!( registry.len(), 1 );
    assert!( registry.get_named_component( "example-tokenizer", &TOKENIZER_FACTORY.into() ).is_ok() );

}

#[test]
fn empty_crates_directory_builds_empty_registry() {
    let crates = Crates::new();
    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    assert!( registry.is_empty() );
    assert!( registry.bundles().is_empty() );
}

#[test]
fn bundle_without_named_types_registers_nothing() {

    let crates = Crates::new();
    crates.artifact( "helpers", "helpers.wasm", &[
        TypeDescriptor::new( "helpers.Util" ),
        TypeDescriptor::new( "helpers.AbstractTokenizer" ).with_interface( TOKENIZER_FACTORY ),
    ]);

    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    assert!( registry.is_empty() );
    assert_eq!( registry.bundles().len(), 1 );

}
