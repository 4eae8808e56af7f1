use component_host::{ BuildError, BundleError, ComponentRegistry, Engine, HostExtensionPoints, LoadContextError, TypeDescriptor };

use crate::{ Crates, TOKENIZER_FACTORY };



#[test]
fn build_error_implementation_not_exported() {

    let crates = Crates::new();
    crates.artifact_from_wat( "example", "example.wasm", "(module)", &[
        TypeDescriptor::new( "example.Ghost" ).with_interface( TOKENIZER_FACTORY ).named( "ghost" ),
    ]);

    assert!( matches!(
        ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ),
        Err( BuildError::Bundle { source: BundleError::LoadContext( LoadContextError::UnresolvedType { .. }), .. }),
    ));

}

#[test]
fn implementation_in_another_artifact_resolves() {

    let crates = Crates::new();
    crates.artifact_from_wat( "example", "a-descriptors.wasm", "(module)", &[
        TypeDescriptor::new( "example.Split" ).with_interface( TOKENIZER_FACTORY ).named( "split" ),
    ]);
    crates.artifact_from_wat( "example", "b-code.wasm", r#"(module (func (export "example.Split")))"#, &[] );

    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    assert!( registry.get_named_component( "split", &TOKENIZER_FACTORY.into() ).is_ok() );

}
