use pretty_assertions::assert_eq ;
use component_host::{ ComponentRegistry, Engine, HostExtensionPoints, TypeDescriptor };

use crate::{ Crates, TOKENIZER_FACTORY, TOKEN_FILTER_FACTORY };



#[test]
fn parallel_build_matches_sequential_build() {

    let crates = Crates::new();
    for index in 0..6 {
        let bundle = format!( "bundle-{index}" );
        crates.artifact( &bundle, "plugin.wasm", &[
            TypeDescriptor::new( format!( "b{index}.Tokenizer" )).with_interface( TOKENIZER_FACTORY ).named( format!( "tokenizer-{index}" )),
            TypeDescriptor::new( format!( "b{index}.Filter" )).with_interface( TOKEN_FILTER_FACTORY ).named( format!( "filter-{index}" )),
        ]);
    }

    let engine = Engine::default();
    let host = HostExtensionPoints::analysis();
    let sequential = ComponentRegistry::build( &crates.config().with_parallel( false ), &host, &engine ).unwrap();
    let parallel = ComponentRegistry::build( &crates.config().with_parallel( true ), &host, &engine ).unwrap();

    assert_eq!( parallel.entries().collect::<Vec<_>>(), sequential.entries().collect::<Vec<_>>() );
    assert_eq!( parallel.len(), 12 );
    assert_eq!(
        parallel.bundles().iter().map(| bundle | bundle.name().clone() ).collect::<Vec<_>>(),
        sequential.bundles().iter().map(| bundle | bundle.name().clone() ).collect::<Vec<_>>(),
    );

    let component = parallel.get_named_component( "filter-3", &TOKEN_FILTER_FACTORY.into() ).unwrap();
    assert_eq!( component.bundle().as_str(), "bundle-3" );

}

#[test]
fn registry_is_shared_across_threads() {

    let crates = Crates::new();
    crates.artifact( "example", "example.wasm", &[
        TypeDescriptor::new( "example.Tokenizer" ).with_interface( TOKENIZER_FACTORY ).named( "example-tokenizer" ),
    ]);
    let registry = ComponentRegistry::build( &crates.config(), &HostExtensionPoints::analysis(), &Engine::default() ).unwrap();

    std::thread::scope(| scope | {
        for _ in 0..4 {
            scope.spawn(|| {
                let component = registry.get_named_component( "example-tokenizer", &TOKENIZER_FACTORY.into() ).unwrap();
                assert_eq!( component.bundle().as_str(), "example" );
            });
        }
    });

}
