//! Macros for working with `std` locks
//!
//! Only the status board uses a blocking lock. A poisoned lock still holds a
//! usable map, so the guard is recovered instead of propagating the panic.


/// Recovers the guard of a possibly poisoned lock
///
/// Clients should prefer `do_read` or `do_write`.
#[macro_export]
macro_rules! _recover_guard {
    ($lock:expr, $op:ident) => ({
        use log::warn;
        $lock.$op()
            .unwrap_or_else(|err| {
                warn!("recovering guard from poisoned lock");
                err.into_inner()
            })
    })
}


/// Retrieves a read guard from a `RwLock`, recovering it if poisoned
#[macro_export]
macro_rules! do_read {
    ($lock:expr) => ({
        use $crate::_recover_guard;
        _recover_guard!($lock, read)
    })
}


/// Retrieves the write guard from a `RwLock`, recovering it if poisoned
#[macro_export]
macro_rules! do_write {
    ($lock:expr) => ({
        use $crate::_recover_guard;
        _recover_guard!($lock, write)
    })
}
