use log::{debug, error, warn};

use crate::shell::Shell;
use crate::utils::config::Config;
use crate::utils::log::init_logger;

mod shell;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    if let Err(e) = init_logger(&config) {
        eprintln!("dsh: logging disabled: {}", e);
    }
    debug!("config loaded from {}", config.rc_file.display());
    for diagnostic in &config.diagnostics {
        warn!("{}", diagnostic);
        eprintln!("dsh: {}", diagnostic);
    }

    let mut shell = Shell::new(config)?;
    if let Err(e) = shell.run() {
        error!("dsh terminated: {}", e);
        eprintln!("dsh: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
