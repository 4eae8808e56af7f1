#[allow( dead_code )]
const TOKENIZER_FACTORY: &str = "host.analysis.TokenizerFactory" ;
#[allow( dead_code )]
const TOKEN_FILTER_FACTORY: &str = "host.analysis.TokenFilterFactory" ;

/// A crates directory inside a temporary directory.
#[allow( dead_code )]
struct Crates { dir: tempfile::TempDir }

#[allow( dead_code )]
impl Crates {

    fn new() -> Self { Self { dir: tempfile::tempdir().unwrap() }}

    fn path( &self ) -> &std::path::Path { self.dir.path() }

    fn config( &self ) -> component_host::RegistryConfig {
        component_host::RegistryConfig::new( self.path() )
    }

    fn bundle( &self, name: &str ) -> std::path::PathBuf {
        let path = self.path().join( name );
        std::fs::create_dir_all( &path ).unwrap();
        path
    }

    /// Writes an artifact exporting a default constructor for each described type.
    /// Each constructor returns the type's position in `descriptors`.
    fn artifact( &self, bundle: &str, file: &str, descriptors: &[component_host::TypeDescriptor] ) -> std::path::PathBuf {
        let exports = descriptors.iter()
            .enumerate()
            .map(|( index, descriptor )| format!( r#"(func (export "{}") (result i32) i32.const {})"#, descriptor.name(), index ))
            .collect::<Vec<_>>()
            .join( "\n" );
        self.artifact_from_wat( bundle, file, &format!( "(module\n{exports}\n)" ), descriptors )
    }

    fn artifact_from_wat( &self, bundle: &str, file: &str, wat: &str, descriptors: &[component_host::TypeDescriptor] ) -> std::path::PathBuf {
        let path = self.bundle( bundle ).join( file );
        let module = wat::parse_str( wat ).unwrap();
        std::fs::write( &path, component_host::embed_descriptors( &module, descriptors )).unwrap();
        path
    }

    fn cache_file( &self, bundle: &str ) -> std::path::PathBuf {
        self.path().join( bundle ).join( component_host::CACHE_FILE )
    }

}
