use cfy_auth::{FormData, validate_form};

use crate::cli::{CredentialArgs, GlobalFlags};
use crate::output::output;

pub fn handle(args: &CredentialArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = validate_form(&FormData::new(args.email.as_str(), args.password.as_str()));
    output(&report, flags.format)?;
    anyhow::ensure!(report.valid, "credentials failed validation");
    Ok(())
}
