use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notekeeper::api::{ApiClient, ApiError};
use notekeeper::config::{Config, Overrides};
use notekeeper::models::{CreateNoteInput, RegisterInput, UpdateNoteInput};
use notekeeper::render;
use notekeeper::router::{guard, Navigation, Route};
use notekeeper::session::SessionContext;
use notekeeper::storage::SqliteStore;
use notekeeper::stores::{AuthStore, NotesStore};
use notekeeper::view::{SortBy, SortOrder};

#[derive(Parser)]
#[command(name = "nk")]
#[command(about = "Manage your notes from the terminal")]
struct Cli {
    /// Base URL of the notes API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session database path
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
    /// Forget the saved session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List notes
    List {
        /// Case-insensitive filter on title and content
        #[arg(short, long)]
        search: Option<String>,

        /// title, created or updated
        #[arg(long)]
        sort: Option<SortBy>,

        /// asc or desc
        #[arg(long)]
        order: Option<SortOrder>,

        /// Let the server filter instead of filtering locally
        #[arg(long)]
        server_search: bool,
    },
    /// Show one note
    Show { id: i64 },
    /// Create a note
    New {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Change a note's title and/or content
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Delete { id: i64 },
}

impl Commands {
    /// The screen this command stands in for, if it is guarded.
    fn route(&self) -> Option<Route> {
        match self {
            Self::Login { .. } => Some(Route::Login),
            Self::Register { .. } => Some(Route::Register),
            Self::Logout | Self::Whoami => None,
            Self::List { .. }
            | Self::Show { .. }
            | Self::New { .. }
            | Self::Edit { .. }
            | Self::Delete { .. } => Some(Route::Notes),
        }
    }
}

/// Logs go to stderr so stdout only carries command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "notekeeper=warn".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load(Overrides {
        api_url: cli.api_url,
        store_path: cli.store,
    });
    tracing::debug!(api_url = %config.api_url, "resolved configuration");

    let storage = match &config.store_path {
        Some(path) => SqliteStore::open(path.clone()),
        None => SqliteStore::open_default(),
    }
    .context("Failed to open session store")?;
    storage.migrate().context("Failed to prepare session store")?;

    let session = SessionContext::new(Arc::new(storage));
    let api = ApiClient::new(config.api_url.clone(), session.clone());
    let auth = AuthStore::new(api.clone());
    let notes = NotesStore::new(api);
    notes.set_sorting(config.default_sort, config.default_order);

    auth.initialize();

    if let Some(route) = cli.command.route() {
        match guard(route.meta(), auth.state()) {
            Navigation::Allow => {}
            Navigation::RedirectToLogin => bail!("Not logged in. Run `nk login` first."),
            Navigation::RedirectToHome => bail!(
                "Already logged in as {}. Run `nk logout` first.",
                auth.user_full_name()
            ),
        }
    }

    // A rejected login also answers 401; that is not an expired session.
    let had_session = auth.is_authenticated();
    let result = run(cli.command, &auth, &notes).await;

    if session.take_login_redirect() && had_session {
        eprintln!("Your session has expired. Run `nk login` to sign in again.");
    }
    result
}

async fn run(command: Commands, auth: &AuthStore, notes: &NotesStore) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            let response = auth
                .login(&email, &password)
                .await
                .map_err(|e| failure(auth.error(), e))?;
            println!("Logged in as {}", response.user.full_name());
        }
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let input = RegisterInput {
                email,
                password,
                first_name,
                last_name,
            };
            let response = auth
                .register(&input)
                .await
                .map_err(|e| failure(auth.error(), e))?;
            println!("Welcome, {}", response.user.full_name());
        }
        Commands::Logout => {
            auth.logout();
            println!("Logged out");
        }
        Commands::Whoami => match auth.user() {
            Some(user) => println!("{} <{}>", user.full_name(), user.email),
            None => println!("Not logged in"),
        },
        Commands::List {
            search,
            sort,
            order,
            server_search,
        } => {
            let current = notes.query();
            notes.set_sorting(
                sort.unwrap_or(current.sort_by),
                order.unwrap_or(current.order),
            );

            let fetched = match search.as_deref() {
                Some(term) if server_search => notes.fetch_search(term).await,
                _ => notes.fetch_all().await,
            };
            fetched.map_err(|e| failure(notes.error(), e))?;

            if !server_search {
                notes.set_search_term(search.unwrap_or_default());
            }
            print!("{}", render::render_list(&notes.view()));
        }
        Commands::Show { id } => {
            let note = notes
                .fetch_one(id)
                .await
                .map_err(|e| failure(notes.error(), e))?;
            print!("{}", render::render_note(&note));
        }
        Commands::New { title, content } => {
            let note = notes
                .create(&CreateNoteInput { title, content })
                .await
                .map_err(|e| failure(notes.error(), e))?;
            println!("Created note #{}", note.id);
        }
        Commands::Edit { id, title, content } => {
            if title.is_none() && content.is_none() {
                bail!("Nothing to change. Pass --title and/or --content.");
            }
            // The API replaces both fields, so fill in whichever was omitted.
            let (title, content) = match (title, content) {
                (Some(title), Some(content)) => (title, content),
                (title, content) => {
                    let current = notes
                        .fetch_one(id)
                        .await
                        .map_err(|e| failure(notes.error(), e))?;
                    (
                        title.unwrap_or(current.title),
                        content.unwrap_or(current.content),
                    )
                }
            };
            let note = notes
                .update(id, &UpdateNoteInput { title, content })
                .await
                .map_err(|e| failure(notes.error(), e))?;
            println!("Updated note #{}", note.id);
        }
        Commands::Delete { id } => {
            notes
                .remove(id)
                .await
                .map_err(|e| failure(notes.error(), e))?;
            println!("Deleted note #{}", id);
        }
    }

    Ok(())
}

/// Wrap an API error in the store's user-facing message.
fn failure(message: Option<String>, error: ApiError) -> anyhow::Error {
    match message {
        Some(message) => anyhow::Error::new(error).context(message),
        None => error.into(),
    }
}
