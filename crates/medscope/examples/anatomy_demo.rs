//! Opens the standard anatomy scene.
//!
//! Pass a JSON options file to override tunables:
//!
//! ```text
//! cargo run --example anatomy_demo -- options.json
//! ```

use medscope::{init_logging, show, Options};

fn main() {
    init_logging();

    let options = match std::env::args().nth(1) {
        Some(path) => match Options::load(&path) {
            Ok(options) => options,
            Err(err) => {
                eprintln!("failed to load {path}: {err}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    if let Err(err) = show(options) {
        eprintln!("medscope: {err}");
        std::process::exit(1);
    }
}
