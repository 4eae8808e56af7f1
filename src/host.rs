//! Extension points declared by the host application itself.
//!
//! These are computed once, over the host's whole API, before any bundle is
//! looked at. Each bundle scan starts from a copy of them and never writes back.

use std::path::{ Path, PathBuf };
use pipe_trait::Pipe ;
use thiserror::Error ;

use crate::{ ExtensionPoints, HierarchyIndex, MalformedArtifact, TypeDescriptor, TypeIdentifier };
use crate::bundle::list_artifacts ;
use crate::utils::PartialSuccess ;



#[derive( Error, Debug )]
pub enum HostApiError {
    #[error( "Failed to read host API {}: {source}", path.display() )]
    Io { path: PathBuf, #[source] source: std::io::Error },
}

/// Every host type eligible as an extension point, mapped to its declared root.
#[derive( Clone, Debug, Default, PartialEq, Eq )]
pub struct HostExtensionPoints {
    points: ExtensionPoints,
}

impl HostExtensionPoints {

    /// Indexes `descriptors` as one hierarchy, seeds it with every type tagged
    /// `extensible`, and closes over it.
    pub fn from_descriptors( descriptors: &[TypeDescriptor] ) -> Self {

        let mut index = HierarchyIndex::new();
        index.extend( descriptors );

        let mut points = descriptors.iter()
            .filter(| descriptor | descriptor.is_extensible() )
            .map(| descriptor | descriptor.name().clone() )
            .pipe( ExtensionPoints::from_roots );
        points.close_over( &index );

        let host = Self { points };
        host.log_listing();
        host
    }

    /// Reads the descriptors of every host API artifact under `paths`.
    ///
    /// A path may be an artifact file or a directory; directories contribute
    /// their files ending in `.{extension}`, in name order.
    ///
    /// # Partial Success
    /// Malformed descriptor entries are skipped and returned with the artifact they came from.
    ///
    /// # Errors
    /// [`HostApiError::Io`] if a path can't be listed or read.
    pub fn scan(
        paths: impl IntoIterator<Item = impl AsRef<Path>>,
        extension: &str,
    ) -> Result<PartialSuccess<Self, ( PathBuf, MalformedArtifact )>, HostApiError> {

        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match path.is_dir() {
                true => files.extend( list_artifacts( path, extension )
                    .map_err(| source | HostApiError::Io { path: path.to_path_buf(), source })? ),
                false => files.push( path.to_path_buf() ),
            }
        }

        let mut descriptors = Vec::new();
        let mut warnings = Vec::new();
        for file in files {
            let bytes = match std::fs::read( &file ) {
                Ok( bytes ) => bytes,
                Err( source ) => return Err( HostApiError::Io { path: file, source }),
            };
            let ( found, errors ) = crate::read_artifact( &bytes );
            tracing::debug!( artifact = %file.display(), types = found.len(), "Read host API artifact" );
            descriptors.extend( found );
            warnings.extend( errors.into_iter().map(| error | ( file.clone(), error )));
        }

        Ok(( Self::from_descriptors( &descriptors ), warnings ))

    }

    /// The built-in text analysis API.
    pub fn analysis() -> Self {
        Self::from_descriptors( &analysis_api() )
    }

    #[inline] pub fn points( &self ) -> &ExtensionPoints { &self.points }

    #[inline] pub fn root_of( &self, type_id: &TypeIdentifier ) -> Option<&TypeIdentifier> {
        self.points.root_of( type_id )
    }

    fn log_listing( &self ) {
        tracing::info!( roots = self.points.roots().len(), eligible = self.points.len(), "EXTENSIBLE" );
        self.points.iter().for_each(|( type_id, root )| tracing::info!( "  {type_id} -> {root}" ));
    }

}

/// Descriptors of the built-in text analysis API.
///
/// Plugins are compiled against these; embedding them into a host API artifact
/// reproduces [`HostExtensionPoints::analysis`].
pub fn analysis_api() -> Vec<TypeDescriptor> {
    vec![
        TypeDescriptor::new( "host.component.Nameable" ),
        TypeDescriptor::new( "host.analysis.AnalysisBase" ).with_interface( "host.component.Nameable" ),
        TypeDescriptor::new( "host.analysis.Tokenizer" ),
        TypeDescriptor::new( "host.analysis.TokenizerFactory" )
            .with_interface( "host.analysis.AnalysisBase" )
            .extensible(),
        TypeDescriptor::new( "host.analysis.TokenFilterFactory" )
            .with_interface( "host.analysis.AnalysisBase" )
            .extensible(),
    ]
}



#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn analysis_roots_are_the_factories() {
        let host = HostExtensionPoints::analysis();
        let roots = host.points().roots().into_iter().map( TypeIdentifier::as_str ).collect::<Vec<_>>();
        assert_eq!( roots, vec![ "host.analysis.TokenFilterFactory", "host.analysis.TokenizerFactory" ]);
        assert_eq!( host.root_of( &"host.analysis.AnalysisBase".into() ), None );
        assert_eq!( host.root_of( &"host.component.Nameable".into() ), None );
    }

    #[test]
    fn host_descendants_of_roots_are_eligible() {
        let host = HostExtensionPoints::from_descriptors( &[
            TypeDescriptor::new( "host.Base" ).extensible(),
            TypeDescriptor::new( "host.Special" ).with_supertype( "host.Base" ),
        ]);
        assert_eq!( host.root_of( &"host.Special".into() ).map( TypeIdentifier::as_str ), Some( "host.Base" ));
    }

    #[test]
    fn scans_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let module = wat::parse_str( "(module)" ).unwrap();
        std::fs::write( dir.path().join( "api.wasm" ), crate::embed_descriptors( &module, &analysis_api() )).unwrap();
        std::fs::write( dir.path().join( "notes.txt" ), "ignored" ).unwrap();

        let ( from_dir, warnings ) = HostExtensionPoints::scan([ dir.path() ], "wasm" ).unwrap();
        assert!( warnings.is_empty() );
        assert_eq!( from_dir, HostExtensionPoints::analysis() );

        let ( from_file, _ ) = HostExtensionPoints::scan([ dir.path().join( "api.wasm" )], "wasm" ).unwrap();
        assert_eq!( from_file, from_dir );
    }

    #[test]
    fn missing_host_api_is_an_error() {
        assert!( matches!(
            HostExtensionPoints::scan([ "/nonexistent/api.wasm" ], "wasm" ),
            Err( HostApiError::Io { .. }),
        ));
    }

}
