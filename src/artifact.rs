//! Static reader for the type descriptors embedded in plugin artifacts.
//!
//! A plugin artifact is a WebAssembly module. Every public type the module
//! defines is described by an entry in a `component-types` custom section:
//!
//! ```text
//! section  := entry*
//! entry    := size:u32 body              ; size counts the bytes of body
//! body     := name:string supertype:string interfaces:vec(string) tags:vec(tag)
//! tag      := name:string args:vec(string)
//! ```
//!
//! `u32` is LEB128, `string` and `vec` follow the WebAssembly binary conventions,
//! and an empty `supertype` means the type declares none. Linkers concatenate
//! same-named custom sections, which is why a section holds a sequence of entries.
//!
//! Reading never compiles or runs the module. A broken entry is reported and
//! skipped; only a broken size prefix loses the rest of its section.

use itertools::Itertools ;
use thiserror::Error ;
use wasm_encoder::{ CustomSection, Encode, Section };
use wasmparser::{ BinaryReader, BinaryReaderError, Parser, Payload };

use crate::TypeIdentifier ;
use crate::utils::PartialSuccess ;



/// Name of the custom section carrying type descriptors.
pub const TYPE_SECTION: &str = "component-types" ;

/// Tag marking a type as an extension point.
pub const EXTENSIBLE_TAG: &str = "extensible" ;

/// Tag marking a type as a named component. Takes the display name as its only argument.
pub const NAMED_TAG: &str = "named" ;

/// Failure to read one descriptor (or the remainder of one section/module).
#[derive( Error, Debug )]
pub enum MalformedArtifact {
    /// The file is not a WebAssembly module, or its section framing is broken.
    #[error( "Malformed module: {0}" )] Module( BinaryReaderError ),
    /// An entry size prefix could not be read; the rest of the section is lost.
    #[error( "Corrupted type section: {0}" )] Section( BinaryReaderError ),
    /// A single entry body could not be decoded.
    #[error( "Malformed type entry: {0}" )] Entry( BinaryReaderError ),
    /// The entry at this offset declares an empty type name.
    #[error( "Type entry at offset {0} has an empty name" )] EmptyName( usize ),
    /// The entry decoded cleanly but did not consume its whole body.
    #[error( "Type entry {0} has {1} trailing bytes" )] TrailingBytes( TypeIdentifier, usize ),
    /// A known tag was declared with the wrong number of arguments.
    #[error( "Tag '{tag}' on {type_id} takes {expected} argument(s), found {found}" )]
    TagArity { type_id: TypeIdentifier, tag: String, expected: usize, found: usize },
}

/// A metadata tag attached to a type at compile time.
#[derive( Clone, Debug, Eq, PartialEq )]
pub struct DeclaredTag {
    name: String,
    args: Vec<String>,
}

impl DeclaredTag {
    pub fn new( name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>> ) -> Self {
        Self { name: name.into(), args: args.into_iter().map( Into::into ).collect() }
    }
    #[inline] pub fn name( &self ) -> &str { &self.name }
    #[inline] pub fn args( &self ) -> &[String] { &self.args }
}

/// Everything the reader reports about one compiled type.
#[derive( Clone, Debug, Eq, PartialEq )]
pub struct TypeDescriptor {
    name: TypeIdentifier,
    supertype: Option<TypeIdentifier>,
    interfaces: Vec<TypeIdentifier>,
    tags: Vec<DeclaredTag>,
}

impl TypeDescriptor {

    /// Creates a descriptor with no supertype, interfaces or tags.
    pub fn new( name: impl Into<TypeIdentifier> ) -> Self {
        Self { name: name.into(), supertype: None, interfaces: Vec::with_capacity( 0 ), tags: Vec::with_capacity( 0 ) }
    }

    pub fn with_supertype( mut self, supertype: impl Into<TypeIdentifier> ) -> Self {
        self.supertype = Some( supertype.into() );
        self
    }

    pub fn with_interface( mut self, interface: impl Into<TypeIdentifier> ) -> Self {
        self.interfaces.push( interface.into() );
        self
    }

    pub fn with_tag( mut self, tag: DeclaredTag ) -> Self {
        self.tags.push( tag );
        self
    }

    /// Shorthand for attaching the [`EXTENSIBLE_TAG`].
    pub fn extensible( self ) -> Self {
        self.with_tag( DeclaredTag::new( EXTENSIBLE_TAG, std::iter::empty::<String>() ))
    }

    /// Shorthand for attaching the [`NAMED_TAG`] with the given display name.
    pub fn named( self, name: impl Into<String> ) -> Self {
        self.with_tag( DeclaredTag::new( NAMED_TAG, [ name.into() ]))
    }

    #[inline] pub fn name( &self ) -> &TypeIdentifier { &self.name }
    #[inline] pub fn supertype( &self ) -> Option<&TypeIdentifier> { self.supertype.as_ref() }
    #[inline] pub fn interfaces( &self ) -> &[TypeIdentifier] { &self.interfaces }
    #[inline] pub fn tags( &self ) -> &[DeclaredTag] { &self.tags }

    /// The supertype followed by every declared interface.
    pub fn parents( &self ) -> impl Iterator<Item = &TypeIdentifier> {
        self.supertype.iter().chain( self.interfaces.iter() )
    }

    pub fn tag( &self, name: &str ) -> Option<&DeclaredTag> {
        self.tags.iter().find(| tag | tag.name == name )
    }

    #[inline] pub fn is_extensible( &self ) -> bool { self.tag( EXTENSIBLE_TAG ).is_some() }

    /// The display name from the [`NAMED_TAG`], if present.
    pub fn component_name( &self ) -> Option<&str> {
        self.tag( NAMED_TAG ).and_then(| tag | tag.args.first() ).map( String::as_str )
    }

    /// Appends this descriptor as one size-prefixed section entry.
    pub fn encode( &self, sink: &mut Vec<u8> ) {
        let mut body = Vec::new();
        self.name.as_str().encode( &mut body );
        self.supertype.as_ref().map_or( "", TypeIdentifier::as_str ).encode( &mut body );
        self.interfaces.len().encode( &mut body );
        self.interfaces.iter().for_each(| interface | interface.as_str().encode( &mut body ));
        self.tags.len().encode( &mut body );
        self.tags.iter().for_each(| tag | {
            tag.name.as_str().encode( &mut body );
            tag.args.len().encode( &mut body );
            tag.args.iter().for_each(| arg | arg.as_str().encode( &mut body ));
        });
        body.len().encode( sink );
        sink.extend_from_slice( &body );
    }

}

/// Appends a `component-types` section describing `descriptors` to a compiled module.
///
/// Custom sections may appear anywhere in a module, so the module itself is left untouched.
pub fn embed_descriptors( module: &[u8], descriptors: &[TypeDescriptor] ) -> Vec<u8> {
    let mut data = Vec::new();
    descriptors.iter().for_each(| descriptor | descriptor.encode( &mut data ));
    let mut bytes = module.to_vec();
    CustomSection { name: TYPE_SECTION.into(), data: data.into() }.append_to( &mut bytes );
    bytes
}

/// Reads every type descriptor from one artifact.
///
/// # Partial Success
/// Entries that fail to decode are returned as errors next to the ones that did.
/// A module whose framing breaks part way still yields the descriptors read so far.
pub fn read_artifact( bytes: &[u8] ) -> PartialSuccess<Vec<TypeDescriptor>, MalformedArtifact> {

    let mut entries = Vec::new();
    for payload in Parser::new( 0 ).parse_all( bytes ) {
        match payload {
            Ok( Payload::CustomSection( reader )) if reader.name() == TYPE_SECTION => {
                read_section( reader.data(), reader.data_offset(), &mut entries );
            }
            Ok( _ ) => {}
            Err( err ) => {
                entries.push( Err( MalformedArtifact::Module( err )));
                break ;
            }
        }
    }

    entries.into_iter().partition_result()

}

fn read_section( data: &[u8], offset: usize, entries: &mut Vec<Result<TypeDescriptor, MalformedArtifact>> ) {
    let mut reader = BinaryReader::new( data, offset );
    while !reader.eof() {
        let entry = reader.read_var_u32().and_then(| size | {
            let start = reader.original_position();
            reader.read_bytes( size as usize ).map(| body | ( body, start ))
        });
        match entry {
            Ok(( body, start )) => entries.push( parse_descriptor( body, start )),
            Err( err ) => {
                entries.push( Err( MalformedArtifact::Section( err )));
                return ;
            }
        }
    }
}

/// Decodes one entry body. `offset` is the body's position in the artifact, for diagnostics.
pub fn parse_descriptor( body: &[u8], offset: usize ) -> Result<TypeDescriptor, MalformedArtifact> {

    let mut reader = BinaryReader::new( body, offset );

    let name = reader.read_string().map_err( MalformedArtifact::Entry )?;
    if name.is_empty() { return Err( MalformedArtifact::EmptyName( offset )) }
    let name = TypeIdentifier::from( name );

    let supertype = match reader.read_string().map_err( MalformedArtifact::Entry )? {
        "" => None,
        supertype => Some( TypeIdentifier::from( supertype )),
    };

    let interfaces = read_strings( &mut reader )?.into_iter().map( TypeIdentifier::from ).collect();

    let tag_count = reader.read_var_u32().map_err( MalformedArtifact::Entry )?;
    let tags = ( 0..tag_count )
        .map(| _ | {
            let tag = reader.read_string().map_err( MalformedArtifact::Entry )?;
            let args = read_strings( &mut reader )?;
            Ok( DeclaredTag::new( tag, args ))
        })
        .collect::<Result<Vec<_>, MalformedArtifact>>()?;

    if !reader.eof() {
        return Err( MalformedArtifact::TrailingBytes( name, reader.bytes_remaining() ));
    }

    if let Some( tag ) = tags.iter().find(| tag | tag.name == NAMED_TAG && tag.args.len() != 1 ) {
        return Err( MalformedArtifact::TagArity {
            type_id: name,
            tag: NAMED_TAG.to_string(),
            expected: 1,
            found: tag.args.len(),
        });
    }

    Ok( TypeDescriptor { name, supertype, interfaces, tags })

}

fn read_strings<'a>( reader: &mut BinaryReader<'a> ) -> Result<Vec<&'a str>, MalformedArtifact> {
    let count = reader.read_var_u32().map_err( MalformedArtifact::Entry )?;
    ( 0..count ).map(| _ | reader.read_string().map_err( MalformedArtifact::Entry )).collect()
}



#[cfg( test )]
mod tests {

    use super::* ;

    const EMPTY_MODULE: &[u8] = b"\0asm\x01\0\0\0" ;

    fn tokenizer() -> TypeDescriptor {
        TypeDescriptor::new( "plugin.ExampleTokenizerFactory" )
            .with_supertype( "plugin.IntermediateTokenizerFactory" )
            .with_interface( "host.component.Nameable" )
            .named( "example-tokenizer" )
    }

    #[test]
    fn reads_embedded_descriptors() {
        let base = TypeDescriptor::new( "plugin.IntermediateTokenizerFactory" )
            .with_interface( "host.analysis.TokenizerFactory" );
        let bytes = embed_descriptors( EMPTY_MODULE, &[ base.clone(), tokenizer() ]);

        let ( descriptors, errors ) = read_artifact( &bytes );
        assert!( errors.is_empty(), "{errors:?}" );
        assert_eq!( descriptors, vec![ base, tokenizer() ]);
        assert_eq!( descriptors[1].component_name(), Some( "example-tokenizer" ));
        assert_eq!( descriptors[1].parents().count(), 2 );
    }

    #[test]
    fn module_without_type_section_yields_nothing() {
        let ( descriptors, errors ) = read_artifact( EMPTY_MODULE );
        assert!( descriptors.is_empty() );
        assert!( errors.is_empty() );
    }

    #[test]
    fn malformed_entry_does_not_hide_its_neighbours() {
        let mut data = Vec::new();
        tokenizer().encode( &mut data );
        // An entry whose body is a string length pointing past its end.
        data.extend_from_slice( &[ 2, 0x7f, b'x' ]);
        TypeDescriptor::new( "plugin.Other" ).encode( &mut data );

        let mut bytes = EMPTY_MODULE.to_vec();
        CustomSection { name: TYPE_SECTION.into(), data: data.into() }.append_to( &mut bytes );

        let ( descriptors, errors ) = read_artifact( &bytes );
        assert_eq!( descriptors.len(), 2 );
        assert_eq!( descriptors[1].name().as_str(), "plugin.Other" );
        assert_eq!( errors.len(), 1 );
        assert!( matches!( errors[0], MalformedArtifact::Entry( _ )));
    }

    #[test]
    fn truncated_size_prefix_loses_rest_of_section() {
        let mut data = Vec::new();
        tokenizer().encode( &mut data );
        data.push( 0x80 );

        let mut bytes = EMPTY_MODULE.to_vec();
        CustomSection { name: TYPE_SECTION.into(), data: data.into() }.append_to( &mut bytes );

        let ( descriptors, errors ) = read_artifact( &bytes );
        assert_eq!( descriptors, vec![ tokenizer() ]);
        assert!( matches!( errors.as_slice(), [ MalformedArtifact::Section( _ )]));
    }

    #[test]
    fn non_wasm_payload_is_reported() {
        let ( descriptors, errors ) = read_artifact( b"definitely not a module" );
        assert!( descriptors.is_empty() );
        assert!( matches!( errors.as_slice(), [ MalformedArtifact::Module( _ )]));
    }

    #[test]
    fn named_tag_requires_one_argument() {
        let mut body = Vec::new();
        TypeDescriptor::new( "plugin.Broken" )
            .with_tag( DeclaredTag::new( NAMED_TAG, std::iter::empty::<String>() ))
            .encode( &mut body );
        // Skip the size prefix, a single byte for a body this small.
        match parse_descriptor( &body[1..], 0 ) {
            Err( MalformedArtifact::TagArity { found: 0, .. }) => {}
            other => panic!( "Expected TagArity, found: {other:?}" ),
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut body = Vec::new();
        TypeDescriptor::new( "plugin.Padded" ).encode( &mut body );
        let mut body = body[1..].to_vec();
        body.push( 0 );
        assert!( matches!( parse_descriptor( &body, 0 ), Err( MalformedArtifact::TrailingBytes( _, 1 ))));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut body = Vec::new();
        TypeDescriptor::new( "" ).encode( &mut body );
        assert!( matches!( parse_descriptor( &body[1..], 7 ), Err( MalformedArtifact::EmptyName( 7 ))));
    }

}
