use component_host::{ ComponentRegistry, Engine, HostExtensionPoints, TypeDescriptor, embed_descriptors };

use crate::Crates ;



#[test]
fn host_api_artifacts_declare_extension_points() {

    let api = tempfile::tempdir().unwrap();
    let module = wat::parse_str( "(module)" ).unwrap();
    std::fs::write( api.path().join( "codecs.wasm" ), embed_descriptors( &module, &[
        TypeDescriptor::new( "host.codec.Codec" ).extensible(),
        TypeDescriptor::new( "host.codec.StreamingCodec" ).with_supertype( "host.codec.Codec" ),
    ])).unwrap();

    let ( host, warnings ) = HostExtensionPoints::scan([ api.path() ], "wasm" ).unwrap();
    assert_no_warnings!( warnings );

    let crates = Crates::new();
    crates.artifact( "codecs", "codecs.wasm", &[
        TypeDescriptor::new( "codecs.Gzip" ).with_interface( "host.codec.StreamingCodec" ).named( "gzip" ),
    ]);

    let registry = ComponentRegistry::build( &crates.config(), &host, &Engine::default() ).unwrap();
    let gzip = registry.get_named_component( "gzip", &"host.codec.Codec".into() ).unwrap();
    assert_eq!( gzip.implementation().as_str(), "codecs.Gzip" );

}
