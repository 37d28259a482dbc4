//! Mercato CLI - Cart management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Store a session token (switches the cart to the remote branch)
//! mercato login --token "$MERCATO_TOKEN"
//!
//! # Add two units of a product with attributes
//! mercato cart add prod-42 -q 2 -a size=M -a color=blue --name "Linen Shirt"
//!
//! # Push anonymously accumulated items into the remote cart
//! mercato cart sync
//!
//! # Show the current cart
//! mercato cart show
//! ```
//!
//! # Commands
//!
//! - `cart` - Show, add, update, remove, clear, and sync the cart
//! - `login` / `logout` - Manage the stored session token

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mercato")]
#[command(author, version, about = "Mercato marketplace CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Store a session token
    Login {
        /// Session token issued by the commerce API
        #[arg(short, long)]
        token: String,
    },
    /// Remove the stored session token
    Logout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the current cart
    Show,
    /// Add a product to the cart
    Add {
        /// Product reference
        product: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Selected attribute as key=value (repeatable)
        #[arg(short, long = "attr")]
        attributes: Vec<String>,

        /// Free-form note for the vendor
        #[arg(long)]
        note: Option<String>,

        /// Display name used in the confirmation message
        #[arg(long)]
        name: Option<String>,
    },
    /// Set an item's quantity (0 removes the item)
    Update {
        /// Cart item ID
        item: String,

        /// New quantity
        #[arg(short, long)]
        quantity: u32,
    },
    /// Remove an item from the cart
    Remove {
        /// Cart item ID
        item: String,
    },
    /// Empty the cart
    Clear,
    /// Migrate locally saved items into the remote cart
    Sync,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show().await?,
            CartAction::Add {
                product,
                quantity,
                attributes,
                note,
                name,
            } => {
                commands::cart::add(&product, quantity, &attributes, note, name.as_deref()).await?;
            }
            CartAction::Update { item, quantity } => {
                commands::cart::set_quantity(&item, quantity).await?;
            }
            CartAction::Remove { item } => commands::cart::remove(&item).await?,
            CartAction::Clear => commands::cart::clear().await?,
            CartAction::Sync => commands::cart::sync().await?,
        },
        Commands::Login { token } => commands::auth::login(&token)?,
        Commands::Logout => commands::auth::logout()?,
    }
    Ok(())
}
