//! Per-bundle discovery cache.
//!
//! The cache is a text file next to the bundle's artifacts holding one
//! `<extension point> <name> <implementation>` line per component. It stores
//! identifiers only; the registry resolves them through the bundle's
//! [`LoadContext`]( crate::LoadContext ) when it is read back.
//!
//! The format carries no version and no escaping. Entries containing whitespace
//! are refused on write rather than written ambiguously.

use std::path::{ Path, PathBuf };
use thiserror::Error ;

use crate::{ ComponentTable, NamedComponentEntry };



/// Default cache file name inside a bundle directory.
pub const CACHE_FILE: &str = "component-info.txt" ;

#[derive( Error, Debug )]
pub enum CacheError {
    #[error( "IO error: {0}" )] Io( #[from] std::io::Error ),
    #[error( "Line {line} is not '<extension point> <name> <implementation>': {content:?}" )]
    MalformedLine { line: usize, content: String },
    #[error( "Entry cannot be cached without escaping: {0}" )] Unencodable( NamedComponentEntry ),
}

/// Handle on one bundle's cache file.
#[derive( Clone, Debug )]
pub struct DiscoveryCache {
    path: PathBuf,
}

impl DiscoveryCache {

    /// Cache file `file_name` inside `bundle_dir`.
    pub fn new( bundle_dir: &Path, file_name: &str ) -> Self {
        Self { path: bundle_dir.join( file_name ) }
    }

    #[inline] pub fn path( &self ) -> &Path { &self.path }

    /// Returns the cached table, or `None` if there is no usable cache.
    ///
    /// A missing file is a plain miss. An unreadable or malformed file is logged
    /// and also treated as a miss, so the bundle gets rescanned and the file rewritten.
    pub fn load( &self ) -> Option<ComponentTable> {
        match self.read() {
            Ok( table ) => table,
            Err( err ) => {
                tracing::warn!( path = %self.path.display(), error = %err, "Ignoring unusable component cache" );
                None
            }
        }
    }

    /// Strict form of [`load`]( Self::load ).
    ///
    /// # Errors
    /// [`CacheError::Io`] if the file exists but can't be read as UTF-8 text,
    /// [`CacheError::MalformedLine`] for a non-blank line without exactly three fields.
    pub fn read( &self ) -> Result<Option<ComponentTable>, CacheError> {
        let content = match std::fs::read_to_string( &self.path ) {
            Ok( content ) => content,
            Err( err ) if err.kind() == std::io::ErrorKind::NotFound => return Ok( None ),
            Err( err ) => return Err( err.into() ),
        };
        content.lines()
            .enumerate()
            .filter(|( _, line )| !line.trim().is_empty() )
            .map(|( index, line )| parse_line( index + 1, line ))
            .collect::<Result<ComponentTable, _>>()
            .map( Some )
    }

    /// Writes `table`, replacing any previous cache file.
    ///
    /// # Errors
    /// [`CacheError::Unencodable`] if an entry contains whitespace (nothing is written),
    /// [`CacheError::Io`] if the file can't be written.
    pub fn store( &self, table: &ComponentTable ) -> Result<(), CacheError> {
        let mut content = String::new();
        for entry in table.entries() {
            if [ entry.extension_point.as_str(), entry.name.as_str(), entry.implementation.as_str() ].iter().any(| field | !is_encodable( field )) {
                return Err( CacheError::Unencodable( entry ));
            }
            content.push_str( &format!( "{} {} {}\n", entry.extension_point, entry.name, entry.implementation ));
        }
        let staging = self.path.with_extension( "tmp" );
        std::fs::write( &staging, content )?;
        std::fs::rename( &staging, &self.path )?;
        Ok(())
    }

    /// Removes the cache file so the next load rescans. A missing file is not an error.
    ///
    /// # Errors
    /// [`CacheError::Io`] if the file exists but can't be removed.
    pub fn invalidate( &self ) -> Result<(), CacheError> {
        match std::fs::remove_file( &self.path ) {
            Err( err ) if err.kind() != std::io::ErrorKind::NotFound => Err( err.into() ),
            _ => Ok(()),
        }
    }

}

fn is_encodable( field: &str ) -> bool {
    !field.is_empty() && !field.chars().any( char::is_whitespace )
}

fn parse_line( line: usize, content: &str ) -> Result<NamedComponentEntry, CacheError> {
    match content.split_whitespace().collect::<Vec<_>>().as_slice() {
        [ extension_point, name, implementation ] => Ok( NamedComponentEntry::new( *extension_point, *name, *implementation )),
        _ => Err( CacheError::MalformedLine { line, content: content.to_string() }),
    }
}



#[cfg( test )]
mod tests {

    use super::* ;

    fn table() -> ComponentTable {
        [
            NamedComponentEntry::new( "host.TokenizerFactory", "example-tokenizer", "p.Example" ),
            NamedComponentEntry::new( "host.TokenFilterFactory", "example-token-filter", "p.Filter" ),
        ].into_iter().collect()
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new( dir.path(), CACHE_FILE );
        assert!( matches!( cache.read(), Ok( None )));
        assert_eq!( cache.load(), None );
    }

    #[test]
    fn stored_table_reads_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new( dir.path(), CACHE_FILE );
        cache.store( &table() ).unwrap();
        assert_eq!( cache.load(), Some( table() ));
        assert!( !dir.path().join( "component-info.tmp" ).exists() );
    }

    #[test]
    fn file_uses_one_sorted_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new( dir.path(), CACHE_FILE );
        cache.store( &table() ).unwrap();
        let content = std::fs::read_to_string( cache.path() ).unwrap();
        assert_eq!( content, "host.TokenFilterFactory example-token-filter p.Filter\nhost.TokenizerFactory example-tokenizer p.Example\n" );
    }

    #[test]
    fn malformed_line_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write( dir.path().join( CACHE_FILE ), "host.E name\n" ).unwrap();
        let cache = DiscoveryCache::new( dir.path(), CACHE_FILE );
        assert!( matches!( cache.read(), Err( CacheError::MalformedLine { line: 1, .. })));
        assert_eq!( cache.load(), None );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write( dir.path().join( CACHE_FILE ), "\nhost.E a p.A\n\n" ).unwrap();
        let cache = DiscoveryCache::new( dir.path(), CACHE_FILE );
        assert_eq!( cache.load().map(| table | table.len() ), Some( 1 ));
    }

    #[test]
    fn whitespace_in_entry_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new( dir.path(), CACHE_FILE );
        let table = [ NamedComponentEntry::new( "host.E", "two words", "p.A" ) ].into_iter().collect();
        assert!( matches!( cache.store( &table ), Err( CacheError::Unencodable( _ ))));
        assert!( !cache.path().exists() );
    }

    #[test]
    fn invalidate_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiscoveryCache::new( dir.path(), CACHE_FILE );
        cache.store( &table() ).unwrap();
        cache.invalidate().unwrap();
        assert!( !cache.path().exists() );
        cache.invalidate().unwrap();
    }

}
