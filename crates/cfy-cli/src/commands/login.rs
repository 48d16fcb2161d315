use std::sync::Arc;

use cfy_auth::{AuthActions, FirebaseCredentialProvider, FormData, SignInForm, SubmitOutcome};
use cfy_config::CompiflyConfig;
use cfy_store::FirestoreProfileStore;

use crate::cli::{CredentialArgs, GlobalFlags};
use crate::commands::session::resolve_session;
use crate::output::output;
use crate::progress::Progress;

pub async fn handle(args: &CredentialArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = CompiflyConfig::load_with_dotenv()?;
    let firebase = config.require_firebase()?;

    let provider = Arc::new(FirebaseCredentialProvider::new(firebase));
    let form = SignInForm::new(AuthActions::new(provider.clone()));

    let spinner = Progress::spinner(flags, "Signing in");
    let data = FormData::new(args.email.as_str(), args.password.as_str());
    match form.submit_password(&data).await {
        SubmitOutcome::SignedIn => spinner.finish_clear(),
        SubmitOutcome::Invalid(error) => {
            spinner.finish_err("invalid input");
            anyhow::bail!("login: {error}");
        }
        SubmitOutcome::Failed(error) => {
            spinner.finish_err("sign-in failed");
            anyhow::bail!("login: {error}");
        }
        SubmitOutcome::Ignored => {
            spinner.finish_err("ignored");
            anyhow::bail!("login: a sign-in is already in progress");
        }
    }

    let tokens = Arc::clone(&provider);
    let store = FirestoreProfileStore::new(firebase)
        .with_token_source(Arc::new(move || tokens.id_token()));

    let report = resolve_session(provider.as_ref(), Arc::new(store), &config.session, flags).await?;
    output(&report, flags.format)
}
