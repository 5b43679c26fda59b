//! Logging utilities


use env_logger::Env;


#[cfg(debug_assertions)]
const DEFAULT_FILTER: &str = "info,camviewer=debug";
#[cfg(not(debug_assertions))]
const DEFAULT_FILTER: &str = "info";


/// Initializes environment-based logging provider
///
/// The filter is read from `CV_LOG` and the write style from `CV_LOG_STYLE`.
pub fn init() {

    let env = Env::default()
        .filter_or("CV_LOG", DEFAULT_FILTER)
        .write_style("CV_LOG_STYLE");

    env_logger::init_from_env(env);
}


/// Logs an error if the given `Result` is `Err`, then carries on
#[macro_export]
macro_rules! allow_err {
    ($res:expr, $fmt:expr $(, $args:expr)*) => ({
        use log::error;
        if let Err(err) = $res {
            let msg = format!($fmt, $($args),*);
            error!("{}: {}", msg, err);
        }
    })
}
