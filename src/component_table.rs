use std::collections::BTreeMap ;

use crate::TypeIdentifier ;



/// One named implementation of an extension point.
#[derive( Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd )]
pub struct NamedComponentEntry {
    pub extension_point: TypeIdentifier,
    pub name: String,
    pub implementation: TypeIdentifier,
}

impl NamedComponentEntry {
    pub fn new(
        extension_point: impl Into<TypeIdentifier>,
        name: impl Into<String>,
        implementation: impl Into<TypeIdentifier>,
    ) -> Self {
        Self { extension_point: extension_point.into(), name: name.into(), implementation: implementation.into() }
    }
}

impl std::fmt::Display for NamedComponentEntry {
    fn fmt( &self, f: &mut std::fmt::Formatter ) -> std::fmt::Result {
        write!( f, "{} [{}] -> {}", self.extension_point, self.name, self.implementation )
    }
}

/// A bundle's discovered components: extension point -> name -> implementation.
///
/// Ordered, so listings and cache files come out the same on every run.
#[derive( Clone, Debug, Default, Eq, PartialEq )]
pub struct ComponentTable {
    components: BTreeMap<TypeIdentifier, BTreeMap<String, TypeIdentifier>>,
}

impl ComponentTable {

    pub fn new() -> Self { Self::default() }

    /// Adds an entry, returning the implementation it replaced, if any.
    pub fn insert( &mut self, entry: NamedComponentEntry ) -> Option<TypeIdentifier> {
        self.components
            .entry( entry.extension_point )
            .or_default()
            .insert( entry.name, entry.implementation )
    }

    pub fn get( &self, extension_point: &TypeIdentifier, name: &str ) -> Option<&TypeIdentifier> {
        self.components.get( extension_point ).and_then(| names | names.get( name ))
    }

    pub fn extension_points( &self ) -> impl Iterator<Item = &TypeIdentifier> {
        self.components.keys()
    }

    /// All entries, sorted by extension point then name.
    pub fn entries( &self ) -> impl Iterator<Item = NamedComponentEntry> + '_ {
        self.components.iter().flat_map(|( extension_point, names )| names.iter().map(|( name, implementation )|
            NamedComponentEntry::new( extension_point.clone(), name.clone(), implementation.clone() )
        ))
    }

    pub fn len( &self ) -> usize { self.components.values().map( BTreeMap::len ).sum() }
    #[inline] pub fn is_empty( &self ) -> bool { self.components.is_empty() }

}

impl FromIterator<NamedComponentEntry> for ComponentTable {
    fn from_iter<T: IntoIterator<Item = NamedComponentEntry>>( iter: T ) -> Self {
        iter.into_iter().fold( Self::new(), | mut table, entry | {
            table.insert( entry );
            table
        })
    }
}



#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn later_insert_replaces_earlier() {
        let mut table = ComponentTable::new();
        assert_eq!( table.insert( NamedComponentEntry::new( "host.E", "dup", "p.First" )), None );
        assert_eq!(
            table.insert( NamedComponentEntry::new( "host.E", "dup", "p.Second" )),
            Some( "p.First".into() ),
        );
        assert_eq!( table.get( &"host.E".into(), "dup" ).map( TypeIdentifier::as_str ), Some( "p.Second" ));
        assert_eq!( table.len(), 1 );
    }

    #[test]
    fn entries_are_sorted() {
        let table = [
            NamedComponentEntry::new( "host.F", "b", "p.B" ),
            NamedComponentEntry::new( "host.E", "z", "p.Z" ),
            NamedComponentEntry::new( "host.E", "a", "p.A" ),
        ].into_iter().collect::<ComponentTable>();
        let names = table.entries().map(| entry | entry.name ).collect::<Vec<_>>();
        assert_eq!( names, vec![ "a", "z", "b" ]);
        assert_eq!( table.extension_points().count(), 2 );
    }

}
