//! Transitive closure of extension-point eligibility.

use std::collections::{ BTreeMap, BTreeSet, HashMap, HashSet, VecDeque };

use crate::{ HierarchyIndex, TypeIdentifier };



/// A type reachable from two different roots. The first root reached is kept.
#[derive( Clone, Debug, Eq, PartialEq )]
pub struct RootConflict {
    pub type_id: TypeIdentifier,
    pub kept: TypeIdentifier,
    pub ignored: TypeIdentifier,
}

/// Every type eligible to serve as an extension point, mapped to the declared
/// root it descends from.
///
/// Starts from the declared roots, which map to themselves, and only ever grows.
#[derive( Clone, Debug, Default, PartialEq, Eq )]
pub struct ExtensionPoints {
    roots: HashMap<TypeIdentifier, TypeIdentifier>,
}

impl ExtensionPoints {

    pub fn new() -> Self { Self::default() }

    /// Declares each of `roots` as an extension point of its own.
    pub fn from_roots( roots: impl IntoIterator<Item = TypeIdentifier> ) -> Self {
        let mut points = Self::new();
        roots.into_iter().for_each(| root | points.declare( root ));
        points
    }

    /// Declares `root` as an extension point. Already eligible types keep their root.
    pub fn declare( &mut self, root: TypeIdentifier ) {
        self.roots.entry( root.clone() ).or_insert( root );
    }

    /// The declared root `type_id` descends from, if it is eligible at all.
    pub fn root_of( &self, type_id: &TypeIdentifier ) -> Option<&TypeIdentifier> {
        self.roots.get( type_id )
    }

    #[inline] pub fn contains( &self, type_id: &TypeIdentifier ) -> bool { self.roots.contains_key( type_id )}
    #[inline] pub fn len( &self ) -> usize { self.roots.len() }
    #[inline] pub fn is_empty( &self ) -> bool { self.roots.is_empty() }

    /// The distinct declared roots.
    pub fn roots( &self ) -> BTreeSet<&TypeIdentifier> {
        self.roots.values().collect()
    }

    /// Every eligible type with its root, sorted by type.
    pub fn iter( &self ) -> impl Iterator<Item = ( &TypeIdentifier, &TypeIdentifier )> {
        self.roots.iter().collect::<BTreeMap<_, _>>().into_iter()
    }

    /// Marks every descendant of an eligible type as eligible, at any depth.
    ///
    /// Breadth-first from the currently eligible types, visiting each type once,
    /// so cycles and diamonds terminate. Traversal order is sorted, which makes the
    /// winner of a [`RootConflict`] deterministic.
    pub fn close_over( &mut self, index: &HierarchyIndex ) -> Vec<RootConflict> {

        let mut frontier = self.iter()
            .map(|( type_id, root )| ( type_id.clone(), root.clone() ))
            .collect::<VecDeque<_>>();
        let mut visited = HashSet::new();
        let mut conflicts = Vec::new();

        while let Some(( type_id, root )) = frontier.pop_front() {
            if !visited.insert( type_id.clone() ) { continue }
            for child in index.children( &type_id ) {
                match self.roots.get( child ) {
                    None => {
                        self.roots.insert( child.clone(), root.clone() );
                        frontier.push_back(( child.clone(), root.clone() ));
                    }
                    Some( kept ) if *kept != root && kept != child => {
                        tracing::warn!( type_id = %child, kept = %kept, ignored = %root, "Type descends from more than one extension point" );
                        conflicts.push( RootConflict { type_id: child.clone(), kept: kept.clone(), ignored: root.clone() });
                    }
                    Some( _ ) => {}
                }
            }
        }

        conflicts

    }

}



#[cfg( test )]
mod tests {

    use super::* ;
    use crate::TypeDescriptor ;

    fn index( descriptors: &[TypeDescriptor] ) -> HierarchyIndex {
        let mut index = HierarchyIndex::new();
        index.extend( descriptors );
        index
    }

    #[test]
    fn chain_of_descendants_is_eligible() {
        let index = index( &[
            TypeDescriptor::new( "p.A" ).with_interface( "host.E" ),
            TypeDescriptor::new( "p.B" ).with_supertype( "p.A" ),
            TypeDescriptor::new( "p.C" ).with_supertype( "p.B" ),
        ]);
        let mut points = ExtensionPoints::from_roots([ "host.E".into() ]);
        assert!( points.close_over( &index ).is_empty() );

        for type_id in [ "host.E", "p.A", "p.B", "p.C" ] {
            assert_eq!( points.root_of( &type_id.into() ).map( TypeIdentifier::as_str ), Some( "host.E" ), "{type_id}" );
        }
        assert_eq!( points.len(), 4 );
    }

    #[test]
    fn unrelated_types_stay_ineligible() {
        let index = index( &[ TypeDescriptor::new( "p.Loose" ).with_supertype( "p.Other" ) ]);
        let mut points = ExtensionPoints::from_roots([ "host.E".into() ]);
        points.close_over( &index );
        assert!( !points.contains( &"p.Loose".into() ));
    }

    #[test]
    fn cycles_terminate() {
        let mut index = HierarchyIndex::new();
        index.add_edge( "p.A".into(), "host.E".into() );
        index.add_edge( "p.B".into(), "p.A".into() );
        index.add_edge( "p.A".into(), "p.B".into() );
        let mut points = ExtensionPoints::from_roots([ "host.E".into() ]);
        points.close_over( &index );
        assert_eq!( points.len(), 3 );
    }

    #[test]
    fn diamond_under_one_root_is_not_a_conflict() {
        let index = index( &[
            TypeDescriptor::new( "p.Left" ).with_interface( "host.E" ),
            TypeDescriptor::new( "p.Right" ).with_interface( "host.E" ),
            TypeDescriptor::new( "p.Bottom" ).with_supertype( "p.Left" ).with_interface( "p.Right" ),
        ]);
        let mut points = ExtensionPoints::from_roots([ "host.E".into() ]);
        assert!( points.close_over( &index ).is_empty() );
        assert!( points.contains( &"p.Bottom".into() ));
    }

    #[test]
    fn first_root_wins_on_conflict() {
        let index = index( &[ TypeDescriptor::new( "p.Both" ).with_interface( "host.A" ).with_interface( "host.B" ) ]);
        let mut points = ExtensionPoints::from_roots([ "host.B".into(), "host.A".into() ]);
        let conflicts = points.close_over( &index );
        assert_eq!( points.root_of( &"p.Both".into() ).map( TypeIdentifier::as_str ), Some( "host.A" ));
        assert_eq!( conflicts, vec![ RootConflict {
            type_id: "p.Both".into(),
            kept: "host.A".into(),
            ignored: "host.B".into(),
        }]);
    }

    #[test]
    fn nested_root_keeps_itself_without_conflict() {
        let index = index( &[
            TypeDescriptor::new( "host.B" ).with_supertype( "host.A" ),
            TypeDescriptor::new( "p.Impl" ).with_interface( "host.B" ),
        ]);
        let mut points = ExtensionPoints::from_roots([ "host.A".into(), "host.B".into() ]);
        assert!( points.close_over( &index ).is_empty() );
        assert_eq!( points.root_of( &"host.B".into() ).map( TypeIdentifier::as_str ), Some( "host.B" ));
        assert_eq!( points.root_of( &"p.Impl".into() ).map( TypeIdentifier::as_str ), Some( "host.B" ));
    }

    #[test]
    fn closing_twice_changes_nothing() {
        let index = index( &[ TypeDescriptor::new( "p.A" ).with_interface( "host.E" ) ]);
        let mut points = ExtensionPoints::from_roots([ "host.E".into() ]);
        points.close_over( &index );
        let once = points.clone();
        points.close_over( &index );
        assert_eq!( points, once );
    }

}
