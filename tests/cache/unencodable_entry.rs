use component_host::{ ComponentRegistry, Engine, HostExtensionPoints, TypeDescriptor };

use crate::{ Crates, TOKENIZER_FACTORY };



#[test]
fn name_with_whitespace_skips_the_cache() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "white space" ),
    ]);

    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    assert!( !crates.cache_file( "example" ).exists() );
    let component = registry.get_named_component( "white space", &TOKENIZER_FACTORY.into() ).unwrap();
    assert_eq!( component.name(), Some( "white space" ));

}
