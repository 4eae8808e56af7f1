//! Inverse inheritance graph built while scanning.

use std::collections::{ BTreeSet, HashMap };

use crate::{ TypeDescriptor, TypeIdentifier };



/// Maps a type to every type that directly names it as supertype or interface.
///
/// Purely additive. The same index type serves the whole-host scan that finds the
/// host's own extension points and the per-bundle scans that extend them.
#[derive( Clone, Debug, Default )]
pub struct HierarchyIndex {
    children: HashMap<TypeIdentifier, BTreeSet<TypeIdentifier>>,
}

impl HierarchyIndex {

    pub fn new() -> Self { Self::default() }

    /// Records a `child -> parent` edge.
    pub fn add_edge( &mut self, child: TypeIdentifier, parent: TypeIdentifier ) {
        self.children.entry( parent ).or_default().insert( child );
    }

    /// Records an edge from the descriptor to each of its parents.
    pub fn add_type( &mut self, descriptor: &TypeDescriptor ) {
        descriptor.parents().for_each(| parent | self.add_edge( descriptor.name().clone(), parent.clone() ));
    }

    /// Direct children of `parent`, in sorted order. Unknown parents have none.
    pub fn children( &self, parent: &TypeIdentifier ) -> impl Iterator<Item = &TypeIdentifier> {
        self.children.get( parent ).into_iter().flatten()
    }

    /// Number of distinct parents with at least one child.
    #[inline] pub fn len( &self ) -> usize { self.children.len() }
    #[inline] pub fn is_empty( &self ) -> bool { self.children.is_empty() }

}

impl<'a> Extend<&'a TypeDescriptor> for HierarchyIndex {
    fn extend<T: IntoIterator<Item = &'a TypeDescriptor>>( &mut self, iter: T ) {
        iter.into_iter().for_each(| descriptor | self.add_type( descriptor ));
    }
}



#[cfg( test )]
mod tests {

    use super::* ;

    #[test]
    fn records_supertype_and_interfaces() {
        let mut index = HierarchyIndex::new();
        index.add_type( &TypeDescriptor::new( "a.Child" )
            .with_supertype( "a.Base" )
            .with_interface( "a.Marker" ));
        index.add_type( &TypeDescriptor::new( "a.Sibling" ).with_supertype( "a.Base" ));

        let base = index.children( &"a.Base".into() ).map( TypeIdentifier::as_str ).collect::<Vec<_>>();
        assert_eq!( base, vec![ "a.Child", "a.Sibling" ]);
        assert_eq!( index.children( &"a.Marker".into() ).count(), 1 );
        assert_eq!( index.len(), 2 );
    }

    #[test]
    fn unknown_parent_has_no_children() {
        let index = HierarchyIndex::new();
        assert!( index.is_empty() );
        assert_eq!( index.children( &"nowhere.Type".into() ).count(), 0 );
    }

    #[test]
    fn repeated_edges_are_kept_once() {
        let mut index = HierarchyIndex::new();
        index.add_edge( "a.Child".into(), "a.Base".into() );
        index.add_edge( "a.Child".into(), "a.Base".into() );
        assert_eq!( index.children( &"a.Base".into() ).count(), 1 );
    }

}
