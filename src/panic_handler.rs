use log::error;
use std::io::{self, Write};
use std::panic;

/// Debug builds get `better_panic` backtraces, release builds the
/// `human_panic` crash report. Either way the panic is logged and whatever
/// was already written to stdout is flushed first.
pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();

    #[cfg(not(debug_assertions))]
    human_panic::setup_panic!(
        Metadata::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            .authors(env!("CARGO_PKG_AUTHORS"))
    );

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            error!("Panic: {}", msg);
        } else if let Some(msg) = panic_info.payload().downcast_ref::<String>() {
            error!("Panic: {}", msg);
        } else {
            error!("Panic with unknown payload");
        }

        let _ = io::stdout().flush();
        default_hook(panic_info);
        std::process::exit(101);
    }));
}

#[cfg(not(debug_assertions))]
use human_panic::Metadata;
