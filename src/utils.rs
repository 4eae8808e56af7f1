//! Type alias for operations that succeed while skipping some of their input.

/// A successful result plus the errors of the parts that were skipped.
/// Those errors didn't prevent the operation from completing and are usually logged as warnings.
pub type PartialSuccess<T, E> = ( T, Vec<E> );
