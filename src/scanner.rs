//! Matches named components to the extension points they implement.

use thiserror::Error ;

use crate::{ ComponentTable, ExtensionPoints, HierarchyIndex, NamedComponentEntry, TypeDescriptor, TypeIdentifier };



/// A bundle declaration that makes the whole bundle unusable.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
pub enum ScanError {
    /// A named type does not descend from any known extension point.
    #[error( "Named component '{name}' ({type_id}) does not descend from an extension point" )]
    UnresolvedExtensionPoint { name: String, type_id: TypeIdentifier },
}

/// Collects the types carrying a `named` tag while a bundle is read.
#[derive( Debug, Default )]
pub struct NamedComponentScanner {
    named: Vec<( String, TypeIdentifier )>,
}

impl NamedComponentScanner {

    pub fn new() -> Self { Self::default() }

    pub fn visit( &mut self, descriptor: &TypeDescriptor ) {
        if let Some( name ) = descriptor.component_name() {
            self.named.push(( name.to_string(), descriptor.name().clone() ));
        }
    }

    /// Pairs every named type with the root of its extension-point ancestry.
    ///
    /// A repeated `(extension point, name)` pair replaces the earlier one and is
    /// logged; rejecting it would change what existing bundles register.
    ///
    /// # Errors
    /// [`ScanError::UnresolvedExtensionPoint`] for the first named type that is not
    /// an extension-point descendant.
    pub fn resolve( self, points: &ExtensionPoints ) -> Result<ComponentTable, ScanError> {
        let mut table = ComponentTable::new();
        for ( name, type_id ) in self.named {
            let Some( extension_point ) = points.root_of( &type_id ) else {
                return Err( ScanError::UnresolvedExtensionPoint { name, type_id });
            };
            let entry = NamedComponentEntry::new( extension_point.clone(), name, type_id );
            if let Some( replaced ) = table.insert( entry.clone() ) {
                tracing::warn!( %entry, %replaced, "Duplicate component name within one bundle, keeping the later declaration" );
            }
        }
        Ok( table )
    }

}

/// Runs hierarchy indexing, closure, and named-component matching over one
/// bundle's descriptors, starting from the host's extension points.
///
/// # Errors
/// See [`NamedComponentScanner::resolve`].
pub fn discover_components( descriptors: &[TypeDescriptor], host: &ExtensionPoints ) -> Result<ComponentTable, ScanError> {

    let mut index = HierarchyIndex::new();
    let mut scanner = NamedComponentScanner::new();
    for descriptor in descriptors {
        index.add_type( descriptor );
        scanner.visit( descriptor );
        if descriptor.is_extensible() && !host.contains( descriptor.name() ) {
            tracing::debug!( type_id = %descriptor.name(), "Ignoring extensible tag declared outside the host" );
        }
    }

    let mut local = host.clone();
    local.close_over( &index );
    scanner.resolve( &local )

}



#[cfg( test )]
mod tests {

    use super::* ;

    fn host() -> ExtensionPoints {
        ExtensionPoints::from_roots([ "host.TokenizerFactory".into(), "host.TokenFilterFactory".into() ])
    }

    #[test]
    fn named_descendant_is_registered_under_its_root() {
        let table = discover_components( &[
            TypeDescriptor::new( "p.Intermediate" ).with_interface( "host.TokenizerFactory" ),
            TypeDescriptor::new( "p.Example" ).with_supertype( "p.Intermediate" ).named( "example-tokenizer" ),
            TypeDescriptor::new( "p.Filter" ).with_supertype( "host.TokenFilterFactory" ).named( "example-token-filter" ),
        ], &host() ).unwrap();

        assert_eq!( table.entries().collect::<Vec<_>>(), vec![
            NamedComponentEntry::new( "host.TokenFilterFactory", "example-token-filter", "p.Filter" ),
            NamedComponentEntry::new( "host.TokenizerFactory", "example-tokenizer", "p.Example" ),
        ]);
    }

    #[test]
    fn named_type_outside_hierarchy_is_rejected() {
        let result = discover_components( &[
            TypeDescriptor::new( "p.Orphan" ).with_supertype( "p.Nothing" ).named( "orphan" ),
        ], &host() );
        assert_eq!( result, Err( ScanError::UnresolvedExtensionPoint {
            name: "orphan".to_string(),
            type_id: "p.Orphan".into(),
        }));
    }

    #[test]
    fn bundle_declared_extensible_is_not_a_root() {
        let result = discover_components( &[
            TypeDescriptor::new( "p.OwnPoint" ).extensible(),
            TypeDescriptor::new( "p.Impl" ).with_interface( "p.OwnPoint" ).named( "impl" ),
        ], &host() );
        assert!( matches!( result, Err( ScanError::UnresolvedExtensionPoint { .. })));
    }

    #[test]
    fn duplicate_name_within_bundle_keeps_last() {
        let table = discover_components( &[
            TypeDescriptor::new( "p.First" ).with_interface( "host.TokenizerFactory" ).named( "dup" ),
            TypeDescriptor::new( "p.Second" ).with_interface( "host.TokenizerFactory" ).named( "dup" ),
        ], &host() ).unwrap();
        assert_eq!( table.len(), 1 );
        assert_eq!( table.get( &"host.TokenizerFactory".into(), "dup" ), Some( &"p.Second".into() ));
    }

    #[test]
    fn host_points_are_not_modified() {
        let host = host();
        discover_components( &[ TypeDescriptor::new( "p.A" ).with_interface( "host.TokenizerFactory" ) ], &host ).unwrap();
        assert_eq!( host.len(), 2 );
    }

}
