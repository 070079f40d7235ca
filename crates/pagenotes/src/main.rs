//! `pagenotes` - CLI for page-based notes
//!
//! This binary opens the local page store and drives the same list and
//! editor controllers an interactive host would.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;

use pagenotes::cli::{
    AttachCommand, Cli, Command, ConfigCommand, DeleteCommand, EditCommand, ShowCommand,
    TerminalInteraction,
};
use pagenotes::store::{FsObjectStore, LocalSession, SqlitePageStore};
use pagenotes::{
    init_logging, Config, Dashboard, EditorSettings, FormatCommand, ImageFile, Page, PageId,
    Services,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config validate` reports bad configuration instead of failing on it
    if let Command::Config(ConfigCommand::Validate { file }) = cli.command {
        handle_validate(file.or(cli.config));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, &config_cmd),
        command => {
            let mut dashboard = open_dashboard(&config, &command)?;
            dashboard.start().await;
            let result = handle_page_command(&mut dashboard, command).await;
            // Nothing may be left unsaved when the process exits.
            dashboard.wait_idle().await;
            result
        }
    }
}

fn open_dashboard(config: &Config, command: &Command) -> anyhow::Result<Dashboard> {
    let database_path = config.database_path();
    let store = SqlitePageStore::open(&database_path)
        .with_context(|| format!("opening page store at {}", database_path.display()))?;
    let objects = FsObjectStore::new(config.objects_dir(), config.public_base_url());
    let session = LocalSession::from_config(&config.account);
    let assume_yes = matches!(command, Command::Delete(DeleteCommand { yes: true, .. }));

    let services = Services {
        store: Arc::new(store),
        objects: Arc::new(objects),
        auth: Arc::new(session),
        interaction: Arc::new(TerminalInteraction::new(assume_yes)),
    };

    Ok(Dashboard::new(
        services,
        EditorSettings::from_config(config),
        config.editor.new_page_title.clone(),
    )?)
}

async fn handle_page_command(dashboard: &mut Dashboard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List(list_cmd) => handle_list(dashboard, list_cmd.json),
        Command::New => {
            let id = dashboard
                .create_page()
                .await
                .ok_or_else(|| anyhow!("page was not created"))?;
            println!("{id}");
            Ok(())
        }
        Command::Show(show_cmd) => handle_show(dashboard, &show_cmd),
        Command::Edit(edit_cmd) => handle_edit(dashboard, edit_cmd).await,
        Command::Attach(attach_cmd) => handle_attach(dashboard, attach_cmd).await,
        Command::Delete(delete_cmd) => handle_delete(dashboard, &delete_cmd).await,
        Command::SignOut => {
            let email = dashboard.list().user().email.clone();
            if !dashboard.sign_out().await {
                bail!("sign-out failed");
            }
            println!("Signed out {email}");
            Ok(())
        }
        // Handled before the store is opened.
        Command::Config(_) => Ok(()),
    }
}

fn handle_list(dashboard: &Dashboard, json: bool) -> anyhow::Result<()> {
    let pages = dashboard.list().pages();
    if json {
        println!("{}", serde_json::to_string_pretty(pages)?);
        return Ok(());
    }

    if pages.is_empty() {
        println!("No pages yet. Create one with `pagenotes new`.");
        return Ok(());
    }
    for page in pages {
        println!(
            "{:<8}  {:<12}  {}",
            short_id(&page.id),
            page.display_date(),
            page.display_title()
        );
    }
    Ok(())
}

fn handle_show(dashboard: &Dashboard, cmd: &ShowCommand) -> anyhow::Result<()> {
    let page = find_page(dashboard, &cmd.id)?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(page)?);
    } else {
        println!("{}", page.display_title());
        println!("id:      {}", page.id);
        println!("updated: {}", page.display_date());
        println!();
        println!("{}", page.content);
    }
    Ok(())
}

async fn handle_edit(dashboard: &mut Dashboard, cmd: EditCommand) -> anyhow::Result<()> {
    if !cmd.has_changes() {
        bail!("nothing to change; pass --title, --content, --content-file or --format");
    }

    // Reject unknown commands before touching the page.
    let formats = cmd
        .formats
        .iter()
        .map(|name| {
            FormatCommand::parse(name).ok_or_else(|| anyhow!("unknown formatting command: {name}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let content = match (&cmd.content, &cmd.content_file) {
        (Some(content), _) => Some(content.clone()),
        (None, Some(path)) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let editor = open_editor(dashboard, &cmd.id)?;
    if let Some(title) = cmd.title {
        editor.set_title(title);
    }
    if let Some(content) = content {
        editor.set_content(content);
    }
    for format in formats {
        editor.surface_mut().select_all();
        editor.format(format);
    }

    if !editor.flush().await {
        bail!("page was not saved");
    }
    println!("Saved {}", short_id(editor.page_id()));
    Ok(())
}

async fn handle_attach(dashboard: &mut Dashboard, cmd: AttachCommand) -> anyhow::Result<()> {
    let file = ImageFile::read(&cmd.image)
        .await
        .with_context(|| format!("reading {}", cmd.image.display()))?;

    let editor = open_editor(dashboard, &cmd.id)?;
    if !editor.upload_image(file).await {
        bail!("image was not attached");
    }
    println!("Attached {} to {}", cmd.image.display(), short_id(editor.page_id()));
    Ok(())
}

async fn handle_delete(dashboard: &mut Dashboard, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let id = find_page(dashboard, &cmd.id)?.id.clone();
    if dashboard.delete_page(&id).await {
        println!("Deleted {}", short_id(&id));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Objects directory:  {}", config.objects_dir().display());
                println!("  Public base URL:    {}", config.public_base_url());
                println!();
                println!("[Editor]");
                println!("  Autosave delay:     {:?}", config.autosave_delay());
                println!("  New page title:     {}", config.editor.new_page_title);
                match config.max_image_bytes() {
                    Some(limit) => println!("  Max image bytes:    {limit}"),
                    None => println!("  Max image bytes:    unlimited"),
                }
                println!();
                println!("[Account]");
                println!("  User id:            {}", config.account.user_id);
                println!("  Email:              {}", config.account.email);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        // Runs before configuration is loaded; see `handle_validate`.
        ConfigCommand::Validate { .. } => {}
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}

fn find_page<'a>(dashboard: &'a Dashboard, id_or_prefix: &str) -> anyhow::Result<&'a Page> {
    dashboard
        .list()
        .resolve(id_or_prefix)
        .ok_or_else(|| anyhow!("no single page matches \"{id_or_prefix}\""))
}

fn open_editor<'a>(
    dashboard: &'a mut Dashboard,
    id_or_prefix: &str,
) -> anyhow::Result<&'a mut pagenotes::PageEditor> {
    let id = find_page(dashboard, id_or_prefix)?.id.clone();
    dashboard.select(&id);
    dashboard
        .editor_mut()
        .ok_or_else(|| anyhow!("page {id} could not be opened"))
}

fn short_id(id: &PageId) -> &str {
    id.as_str().get(..8).unwrap_or(id.as_str())
}
