//! Identifier newtypes shared by every stage of discovery.

use std::borrow::Borrow ;



/// Fully-qualified name of a compiled type, e.g. `host.analysis.TokenizerFactory`.
///
/// Identifiers are compared by value; the same identifier may name distinct
/// runtime types in different bundles (see [`RuntimeType`]( crate::RuntimeType )).
#[derive( Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd )]
pub struct TypeIdentifier( String );

impl TypeIdentifier {
    /// Creates a new type identifier.
    pub fn new( id: impl Into<String> ) -> Self { Self( id.into() )}
    /// The identifier as a string slice.
    #[inline] pub fn as_str( &self ) -> &str { &self.0 }
}

impl std::fmt::Display for TypeIdentifier {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> Result<(), std::fmt::Error> {
        std::fmt::Display::fmt( &self.0, f )
    }
}

impl From<&str> for TypeIdentifier {
    fn from( id: &str ) -> Self { Self( id.to_string() )}
}

impl From<String> for TypeIdentifier {
    fn from( id: String ) -> Self { Self( id )}
}

impl Borrow<str> for TypeIdentifier {
    fn borrow( &self ) -> &str { &self.0 }
}

impl AsRef<str> for TypeIdentifier {
    fn as_ref( &self ) -> &str { &self.0 }
}

/// Name of a bundle, taken from its directory name inside the crates directory.
#[derive( Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd )]
pub struct BundleName( String );

impl BundleName {
    /// Creates a new bundle name.
    pub fn new( name: impl Into<String> ) -> Self { Self( name.into() )}
    #[inline] pub fn as_str( &self ) -> &str { &self.0 }
}

impl std::fmt::Display for BundleName {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> Result<(), std::fmt::Error> {
        std::fmt::Display::fmt( &self.0, f )
    }
}

impl From<&str> for BundleName {
    fn from( name: &str ) -> Self { Self( name.to_string() )}
}

impl Borrow<str> for BundleName {
    fn borrow( &self ) -> &str { &self.0 }
}
