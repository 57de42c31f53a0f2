//! `fgfsctl check`: validate a configuration and its protocol descriptor

use fgfs_generic::{BridgeConfig, FieldMap};
use tracing::info;

use super::ConfigArgs;
use crate::error::CliError;
use crate::output;

pub fn execute(args: &ConfigArgs, json: bool) -> Result<(), CliError> {
    let config = BridgeConfig::load(&args.config)?;
    let path = config.descriptor_path();
    let fields = FieldMap::load(&path)?;
    info!(path = %path.display(), properties = fields.len(), "descriptor is valid");

    let separator = fields.separator().unwrap_or(config.separator);
    output::print_field_map(&path, &fields, separator, json);
    Ok(())
}
