use component_host::{ BuildError, ComponentRegistry, Engine, HostExtensionPoints, RegistryConfig };



#[test]
fn build_error_missing_crates_dir() {

    let dir = tempfile::tempdir().unwrap();
    let config = RegistryConfig::new( dir.path().join( "missing" ));

    match ComponentRegistry::build( &config, &HostExtensionPoints::analysis(), &Engine::default() ) {
        Err( BuildError::Io { path, .. }) => assert_eq!( path, dir.path().join( "missing" )),
        Err( err ) => panic!( "Unexpected error: {}", err ),
        Ok( _ ) => panic!( "Expected failure" ),
    }

}
