//! Marketstall CLI - front end for the mock storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! mstall items list --category kitchen --sort oldest --page 2
//! mstall items show 3
//!
//! # Log in and shop
//! mstall auth login -e buyer@example.com -p buyerpass
//! mstall cart add 3
//! mstall cart check 3
//! mstall cart checkout
//! mstall orders
//! ```
//!
//! # Commands
//!
//! - `items` - Browse, list and manage products
//! - `cart` - Add, select, remove and buy cart items
//! - `auth` - Log in, log out, register
//! - `profile` - Edit the logged-in user's profile
//! - `orders` - Purchase history
//! - `carousel` - Home page banners
//!
//! Every invocation restores the persisted session from the local store, so
//! a login stays in effect until `auth logout`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use marketstall_core::ProductId;
use marketstall_storefront::listing::SortOrder;
use marketstall_storefront::{AppError, AppState, StorefrontConfig};

mod commands;

#[derive(Parser)]
#[command(name = "mstall")]
#[command(author, version, about = "Marketstall mock storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage products
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Log in, log out and register
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Edit the logged-in user's profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show purchase history
    Orders,
    /// Show home page banners
    Carousel,
}

#[derive(Subcommand)]
enum ItemsAction {
    /// List products
    List {
        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order (`newest` or `oldest`)
        #[arg(short, long, default_value = "newest")]
        sort: SortOrder,

        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Show pages 1 through `page` as one accumulated list
        #[arg(long)]
        accumulate: bool,
    },
    /// Show one product
    Show { id: ProductId },
    /// List a new product as the logged-in seller
    Add(ProductForm),
    /// Edit one of your products
    Edit {
        id: ProductId,
        #[command(flatten)]
        form: ProductForm,
    },
    /// Delete one of your products
    Delete { id: ProductId },
    /// List your own products
    Mine {
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
}

#[derive(Args)]
struct ProductForm {
    /// Product name
    #[arg(short, long)]
    name: String,

    /// Price in won
    #[arg(long)]
    price: i64,

    /// Category name
    #[arg(short, long)]
    category: String,

    /// Description
    #[arg(short, long, default_value = "")]
    description: String,

    /// Image file to embed
    #[arg(short, long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product
    Add { id: ProductId },
    /// Show the cart grouped by seller
    Show,
    /// Select items for checkout
    Check {
        /// Products to select (all when omitted)
        ids: Vec<ProductId>,

        /// Deselect instead
        #[arg(long)]
        off: bool,
    },
    /// Remove products
    Remove {
        #[arg(required = true)]
        ids: Vec<ProductId>,
    },
    /// Remove everything
    Clear,
    /// Buy the selected items
    Checkout,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Log in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Log out and clear the cart
    Logout,
    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Display nickname
        #[arg(long)]
        nickname: String,

        /// Real name
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        postal_code: String,

        #[arg(long, default_value = "")]
        basic_address: String,

        #[arg(long, default_value = "")]
        detail_address: String,
    },
    /// Show the logged-in user
    Whoami,
    /// Verify the logged-in user's password
    CheckPassword {
        #[arg(short, long)]
        password: String,
    },
    /// Check whether an email is free
    CheckEmail { email: String },
    /// Check whether a nickname is free
    CheckNickname { nickname: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Update profile fields
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        postal_code: Option<String>,

        #[arg(long)]
        basic_address: Option<String>,

        #[arg(long)]
        detail_address: Option<String>,

        /// Profile image file to embed
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marketstall_storefront=info,marketstall_cli=info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            println!("{}", e.notice());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = StorefrontConfig::from_env()?;
    let state = AppState::new(config)?;

    let result = dispatch(&state, cli.command).await;
    state.shutdown().await;
    result
}

async fn dispatch(state: &AppState, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Items { action } => match action {
            ItemsAction::List {
                category,
                sort,
                page,
                accumulate,
            } => commands::items::list(state, category, sort, page, accumulate).await?,
            ItemsAction::Show { id } => commands::items::show(state, id).await?,
            ItemsAction::Add(form) => {
                let form = commands::items::read_form(state, form).await?;
                commands::items::add(state, &form).await?;
            }
            ItemsAction::Edit { id, form } => {
                let form = commands::items::read_form(state, form).await?;
                commands::items::edit(state, id, &form).await?;
            }
            ItemsAction::Delete { id } => commands::items::delete(state, id).await?,
            ItemsAction::Mine { page } => commands::items::mine(state, page).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Add { id } => commands::cart::add(state, id).await?,
            CartAction::Show => commands::cart::show(state).await,
            CartAction::Check { ids, off } => commands::cart::check(state, &ids, !off).await?,
            CartAction::Remove { ids } => commands::cart::remove(state, &ids).await?,
            CartAction::Clear => commands::cart::clear(state).await?,
            CartAction::Checkout => commands::cart::checkout(state).await?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(state, &email, &password.into()).await?;
            }
            AuthAction::Logout => commands::auth::logout(state).await,
            AuthAction::Register {
                email,
                password,
                nickname,
                name,
                phone,
                postal_code,
                basic_address,
                detail_address,
            } => {
                let registration = marketstall_storefront::models::Registration {
                    email,
                    password: password.into(),
                    name,
                    nickname,
                    phone,
                    postal_code,
                    basic_address,
                    detail_address,
                };
                commands::auth::register(state, &registration).await?;
            }
            AuthAction::Whoami => commands::auth::whoami(state).await,
            AuthAction::CheckPassword { password } => {
                commands::auth::check_password(state, &password.into()).await;
            }
            AuthAction::CheckEmail { email } => commands::auth::check_email(state, &email).await,
            AuthAction::CheckNickname { nickname } => {
                commands::auth::check_nickname(state, &nickname).await;
            }
        },
        Commands::Profile { action } => match action {
            ProfileAction::Update {
                name,
                phone,
                postal_code,
                basic_address,
                detail_address,
                image,
            } => {
                let image = match image {
                    Some(path) => Some(commands::read_image(state, &path).await?),
                    None => None,
                };
                let patch = marketstall_storefront::models::ProfilePatch {
                    name,
                    phone,
                    postal_code,
                    basic_address,
                    detail_address,
                    image,
                };
                commands::auth::update_profile(state, &patch).await?;
            }
        },
        Commands::Orders => commands::orders::history(state).await?,
        Commands::Carousel => commands::orders::carousel(state).await,
    }
    Ok(())
}
