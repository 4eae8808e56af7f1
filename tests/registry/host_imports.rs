use component_host::{ ComponentRegistry, Engine, HostExtensionPoints, TypeDescriptor, Val };

use crate::{ Crates, TOKENIZER_FACTORY };



#[test]
fn components_can_log_through_the_host() {

    let crates = Crates::new();
    crates.artifact_from_wat( "chatty", "chatty.wasm", r#"(module
        (import "host" "log" (func $log (param i32 i32 i32)))
        (import "host" "bundle-name-len" (func $bundle_name_len (result i32)))
        (memory (export "memory") 1)
        (data (i32.const 0) "constructed")
        (func (export "chatty.Tokenizer") (result i32)
            (call $log (i32.const 2) (i32.const 0) (i32.const 11))
            (call $bundle_name_len))
        (func (export "tokenize") (param i32) (result i32)
            (i32.mul (local.get 0) (i32.const 2)))
    )"#, &[ TypeDescriptor::new( "chatty.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "chatty" ) ]);

    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();
    let mut chatty = registry.get_named_component( "chatty", &TOKENIZER_FACTORY.into() ).unwrap();
    assert!( matches!( chatty.constructor_results(), [ Val::I32( 6 )]));
    assert!( matches!( chatty.call( "tokenize", &[ Val::I32( 21 )]).unwrap().as_slice(), [ Val::I32( 42 )]));

}
