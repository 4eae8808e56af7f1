//! Host functions every component may import.

use wasmtime::{ Caller, Engine, Linker };

use crate::ComponentState ;



const EXPORTED_MEM_NAME: &str = "memory" ;

macro_rules! declare_exports {
    (
        $linker_instance:expr,
        [
            $(( $module:literal, $name:literal, $function:expr )),*
            $(,)?
        ]
    ) => {
        vec![ $( $linker_instance.func_wrap( $module, $name, $function ).err() ),* ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
    };
}

/// Builds the linker every load context clones.
///
/// # Partial Success
/// Exports that fail to register are left out; their errors are returned next to the linker.
pub fn host_linker( engine: &Engine ) -> ( Linker<ComponentState>, Vec<wasmtime::Error> ) {

    let mut linker = Linker::new( engine );
    let linker_errors = declare_exports!( linker, [
        ( "host", "log", log ),
        ( "host", "bundle-name-len", bundle_name_len ),
    ]);

    ( linker, linker_errors )

}

/// `host.log( level, ptr, len )`: logs a UTF-8 message from the caller's memory.
///
/// Levels are 0 trace, 1 debug, 2 info, 3 warn, anything else error.
fn log( mut caller: Caller<'_, ComponentState>, level: i32, ptr: u32, len: u32 ) -> wasmtime::Result<()> {

    let memory = caller.get_export( EXPORTED_MEM_NAME )
        .and_then(| export | export.into_memory() )
        .ok_or_else(|| wasmtime::Error::msg( "host.log requires an exported memory" ))?;

    let start = ptr as usize ;
    let message = start.checked_add( len as usize )
        .and_then(| end | memory.data( &caller ).get( start..end ))
        .map(| bytes | String::from_utf8_lossy( bytes ).into_owned() )
        .ok_or_else(|| wasmtime::Error::msg( format!( "host.log message at {ptr}+{len} is out of bounds" )))?;
    let bundle = caller.data().bundle();

    match level {
        0 => tracing::trace!( %bundle, "{message}" ),
        1 => tracing::debug!( %bundle, "{message}" ),
        2 => tracing::info!( %bundle, "{message}" ),
        3 => tracing::warn!( %bundle, "{message}" ),
        _ => tracing::error!( %bundle, "{message}" ),
    }

    Ok(())

}

fn bundle_name_len( caller: Caller<'_, ComponentState> ) -> u32 {
    u32::try_from( caller.data().bundle().as_str().len() ).unwrap_or( u32::MAX )
}



#[cfg( test )]
mod tests {

    use super::* ;
    use crate::LoadContext ;

    const LOGGER: &str = r#"(module
        (import "host" "log" (func $log (param i32 i32 i32)))
        (import "host" "bundle-name-len" (func $len (result i32)))
        (memory (export "memory") 1)
        (data (i32.const 0) "hello")
        (func (export "p.Logger") (result i32)
            (call $log (i32.const 2) (i32.const 0) (i32.const 5))
            (call $len))
        (func (export "out-of-bounds")
            (call $log (i32.const 2) (i32.const 65535) (i32.const 16)))
        (func (export "oversized")
            (call $log (i32.const 2) (i32.const 0) (i32.const -1)))
    )"# ;

    #[test]
    fn components_can_import_host_functions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "logger.wasm" );
        std::fs::write( &path, wat::parse_str( LOGGER ).unwrap() ).unwrap();

        let engine = Engine::default();
        let ( linker, errors ) = host_linker( &engine );
        assert!( errors.is_empty() );

        let ( context, _ ) = LoadContext::open( "logging".into(), &engine, &linker, [ path ]).unwrap();
        let runtime_type = context.resolve( &"p.Logger".into() ).unwrap();
        let mut component = context.instantiate( &runtime_type ).unwrap();
        assert!( matches!( component.constructor_results(), [ wasmtime::Val::I32( 7 )]));
        assert!( component.call( "out-of-bounds", &[] ).is_err() );
    }

    #[test]
    fn oversized_log_message_traps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join( "logger.wasm" );
        std::fs::write( &path, wat::parse_str( LOGGER ).unwrap() ).unwrap();

        let engine = Engine::default();
        let ( linker, _ ) = host_linker( &engine );
        let ( context, _ ) = LoadContext::open( "logging".into(), &engine, &linker, [ path ]).unwrap();
        let runtime_type = context.resolve( &"p.Logger".into() ).unwrap();
        let mut component = context.instantiate( &runtime_type ).unwrap();

        let err = component.call( "oversized", &[] ).unwrap_err();
        assert!( format!( "{err:?}" ).contains( "out of bounds" ), "{err:?}" );
        assert!( matches!( component.call( "p.Logger", &[] ).unwrap().as_slice(), [ wasmtime::Val::I32( 7 )]));
    }

}
