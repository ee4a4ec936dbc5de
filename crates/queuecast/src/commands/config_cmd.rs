//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = super::config_file(global);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Show => {
            let config = super::load_config(global)?;
            let rendered = queuecast_config::render_toml(&config)?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }
    }
}
