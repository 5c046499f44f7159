//! Supportflow - social support application wizard.
//!
//! Drives the wizard core from the command line: each invocation rehydrates
//! the persisted draft, applies one transition, and persists the result, so
//! a session spans as many invocations as the citizen needs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use supportflow::ai::GENERATION_KEY_ENV;
use supportflow::form::{schema, validation};
use supportflow::{
    Config, CredentialChain, FieldValue, GenerationClient, HttpBackend, JsonFileStorage, Language,
    SecretValue, SubmissionPipeline, SubmissionResult, SuggestionState, SuggestionWorkflow,
    WizardStore,
};

/// Social support application wizard
#[derive(Parser)]
#[command(name = "supportflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the draft storage path
    #[arg(long, global = true)]
    storage_path: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the draft's progress and any validation errors on the current step
    Show,

    /// Set a field's value
    Set {
        /// Field id (e.g. name, email, monthlyIncome)
        field: String,

        /// The value to store
        value: String,
    },

    /// Advance to the next step (requires the current step to be complete)
    Next,

    /// Go back one step
    Back,

    /// Switch the interface language
    Language {
        /// Language tag (en, ar)
        lang: String,
    },

    /// Ask the AI assistant to draft a free-text field
    Suggest {
        /// Field id to draft (e.g. reasonForApplying)
        field: String,

        /// Commit the suggestion into the draft instead of discarding it
        #[arg(long)]
        apply: bool,
    },

    /// Validate the whole draft and submit it
    Submit,

    /// Discard the draft and any persisted snapshot
    Reset,

    /// Manage the text-generation credential
    Credential {
        #[command(subcommand)]
        operation: CredentialOperation,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Subcommand)]
enum CredentialOperation {
    /// Verify and store an API key in the system keychain
    Set {
        /// The API key to store
        key: String,
    },

    /// Check whether the configured credential is accepted by the service
    Check,

    /// Remove the stored API key
    Remove,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    let config = Config::load()?;
    let storage = match cli.storage_path.or_else(|| config.storage.path.clone()) {
        Some(path) => JsonFileStorage::with_path(path),
        None => JsonFileStorage::new()?,
    };
    tracing::debug!(path = %storage.path().display(), "Draft storage");
    let mut store = WizardStore::new(Box::new(storage));

    match cli.command {
        Commands::Show => cmd_show(&mut store),
        Commands::Set { field, value } => cmd_set(&mut store, &field, &value),
        Commands::Next => cmd_next(&mut store),
        Commands::Back => cmd_back(&mut store),
        Commands::Language { lang } => cmd_language(&mut store, &lang),
        Commands::Suggest { field, apply } => cmd_suggest(&mut store, &config, &field, apply),
        Commands::Submit => cmd_submit(&mut store, &config),
        Commands::Reset => cmd_reset(&mut store),
        Commands::Credential { operation } => cmd_credential(&config, operation),
        Commands::Config { path } => cmd_config(&config, path),
    }
}

fn cmd_show(store: &mut WizardStore) -> Result<()> {
    println!("Application draft (language: {})", store.language().as_str());

    for step in schema::FORM_STEPS {
        let marker = if store.step_complete(step.position) { "✓" } else { " " };
        let current = if step.position == store.current_step() { "->" } else { "  " };
        println!("{current} [{marker}] step {} - {}", step.position, step.title_key);
    }
    println!();

    let Some(step) = schema::step(store.current_step()) else {
        return Ok(());
    };
    let errors = store.validate_current_step().clone();
    for field in step.fields {
        let value = store.draft().display(field.id);
        match errors.get(field.id) {
            Some(key) => println!("  {}: {}  ({})", field.id, value, key.as_str()),
            None => println!("  {}: {}", field.id, value),
        }
    }

    Ok(())
}

fn cmd_set(store: &mut WizardStore, field: &str, value: &str) -> Result<()> {
    if schema::field(field).is_none() {
        anyhow::bail!("Unknown field: {field}");
    }

    store.update_field(field, FieldValue::Text(value.to_string()));
    match validation::validate_field(field, &FieldValue::Text(value.to_string()), store.draft()) {
        Some(key) => println!("{field} set ({})", key.as_str()),
        None => println!("{field} set"),
    }
    Ok(())
}

fn cmd_next(store: &mut WizardStore) -> Result<()> {
    let before = store.current_step();
    store.advance();
    if store.current_step() == before {
        let errors = store.validate_current_step();
        println!("Step {before} is not complete yet:");
        for (field, key) in errors {
            println!("  {field}: {}", key.as_str());
        }
    } else {
        println!("Now on step {} of {}", store.current_step(), store.total_steps());
    }
    Ok(())
}

fn cmd_back(store: &mut WizardStore) -> Result<()> {
    store.retreat();
    println!("Now on step {} of {}", store.current_step(), store.total_steps());
    Ok(())
}

fn cmd_language(store: &mut WizardStore, lang: &str) -> Result<()> {
    let language = Language::parse(lang)
        .ok_or_else(|| anyhow::anyhow!("Unsupported language: {lang} (expected en or ar)"))?;
    store.set_language(language);
    println!("Language set to {}", language.as_str());
    Ok(())
}

fn cmd_suggest(store: &mut WizardStore, config: &Config, field: &str, apply: bool) -> Result<()> {
    if schema::field(field).is_none() {
        anyhow::bail!("Unknown field: {field}");
    }
    if !CredentialChain::generation().is_configured() {
        anyhow::bail!(
            "No text-generation API key configured. Set {GENERATION_KEY_ENV} or run \
             `supportflow credential set <key>`."
        );
    }

    let generator = GenerationClient::new()
        .with_model(config.ai.model.clone())
        .with_base_url(config.ai.base_url.clone());
    let mut workflow = SuggestionWorkflow::new();
    let snapshot = store.snapshot();

    // Create tokio runtime for the collaborator call
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        workflow.run_request(&generator, field, &snapshot).await;
    });

    match workflow.state().clone() {
        SuggestionState::Ready { text } => {
            println!("{text}");
            if apply {
                workflow.commit(store);
                println!("\nSuggestion committed to {field}.");
            } else {
                workflow.discard();
                println!("\nDiscarded. Re-run with --apply to commit it.");
            }
        }
        SuggestionState::Failed { error } => {
            workflow.discard();
            anyhow::bail!("{error}");
        }
        SuggestionState::Idle | SuggestionState::Requesting => {
            anyhow::bail!("No suggestion was produced.")
        }
    }
    Ok(())
}

fn cmd_submit(store: &mut WizardStore, config: &Config) -> Result<()> {
    let backend = HttpBackend::new().with_base_url(config.submission.base_url.clone());
    let pipeline = SubmissionPipeline::new(Box::new(backend));

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(pipeline.submit(store));

    match result {
        SubmissionResult::Accepted { application_id, submitted_at } => {
            println!("Application submitted successfully.");
            println!("  id: {application_id}");
            println!("  at: {submitted_at}");
            Ok(())
        }
        SubmissionResult::InvalidDraft(errors) => {
            println!("The application is not complete:");
            for (field, key) in &errors {
                println!("  {field}: {}", key.as_str());
            }
            anyhow::bail!("{} field(s) need attention", errors.len());
        }
        SubmissionResult::Rejected { reason } => {
            anyhow::bail!("Submission failed: {reason}. Your draft was kept; try again later.");
        }
    }
}

fn cmd_reset(store: &mut WizardStore) -> Result<()> {
    store.reset_after_submit();
    println!("Draft cleared.");
    Ok(())
}

fn cmd_credential(config: &Config, operation: CredentialOperation) -> Result<()> {
    let chain = CredentialChain::generation();
    let client = GenerationClient::new()
        .with_model(config.ai.model.clone())
        .with_base_url(config.ai.base_url.clone());
    let rt = tokio::runtime::Runtime::new()?;

    match operation {
        CredentialOperation::Set { key } => {
            let candidate = SecretValue::new(key);
            if !rt.block_on(client.check_credential(&candidate)) {
                anyhow::bail!("The service rejected this API key; not storing it.");
            }
            chain.store(&candidate)?;
            println!("API key verified and stored.");
        }
        CredentialOperation::Check => {
            let credential = chain.resolve()?;
            if rt.block_on(client.check_credential(&credential)) {
                println!("Credential accepted.");
            } else {
                anyhow::bail!("The configured credential was rejected.");
            }
        }
        CredentialOperation::Remove => {
            chain.remove()?;
            println!("Stored API key removed.");
        }
    }
    Ok(())
}

fn cmd_config(config: &Config, path: bool) -> Result<()> {
    if path {
        match Config::config_dir() {
            Some(dir) => println!("{}", dir.join("config.toml").display()),
            None => println!("Could not determine config directory"),
        }
        return Ok(());
    }
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
