use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "binder",
    bin_name = "binder",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Arrange collectible cards into binders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $BINDER_DATA, then the OS data dir)
    #[arg(long, global = true, help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Act as this user instead of the configured one
    #[arg(long, short = 'u', global = true, help_heading = "Options")]
    pub user: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

/// Selects a binder by UUID or by one of your binder names.
#[derive(Args, Debug, Clone)]
pub struct BinderArg {
    /// Binder name or id
    pub binder: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty binder
    #[command(alias = "n", display_order = 1)]
    New {
        name: String,

        /// Page layout: 2x2, 3x3 or 4x3
        #[arg(long, short = 'l')]
        layout: Option<String>,
    },

    /// List your binders
    #[command(alias = "ls", display_order = 2)]
    List,

    /// Show a binder page by page
    #[command(alias = "v", display_order = 3)]
    Show {
        #[command(flatten)]
        target: BinderArg,

        /// One page per row instead of two-page spreads
        #[arg(long)]
        single: bool,
    },

    /// Place a catalog card into a slot
    #[command(display_order = 10)]
    Add {
        #[command(flatten)]
        target: BinderArg,
        catalog_id: String,
        slot: String,

        /// Push the occupant and everything after it up one slot
        #[arg(long, short = 's')]
        shift: bool,
    },

    /// Place catalog cards into the next free slots
    #[command(display_order = 11)]
    Fill {
        #[command(flatten)]
        target: BinderArg,

        #[arg(required = true)]
        catalog_ids: Vec<String>,

        /// First slot to consider
        #[arg(long, default_value = "0")]
        from: String,
    },

    /// Take the card out of a slot
    #[command(alias = "rm", display_order = 12)]
    Remove {
        #[command(flatten)]
        target: BinderArg,
        slot: String,

        /// Pull every later card back one slot
        #[arg(long, short = 's')]
        shift: bool,
    },

    /// Swap two slots (or move into an empty one)
    #[command(display_order = 13)]
    Swap {
        #[command(flatten)]
        target: BinderArg,
        from: String,
        to: String,
    },

    /// Move a card and slide the cards in between
    #[command(display_order = 14)]
    Insert {
        #[command(flatten)]
        target: BinderArg,
        from: String,
        to: String,
    },

    /// Open an empty slot, pushing later cards up one
    #[command(name = "make-room", display_order = 15)]
    MakeRoom {
        #[command(flatten)]
        target: BinderArg,
        slot: String,
    },

    /// Toggle or set the purchased flag of a card
    #[command(display_order = 20)]
    Purchase {
        #[command(flatten)]
        target: BinderArg,
        slot: String,

        #[arg(long, conflicts_with = "no")]
        yes: bool,

        #[arg(long)]
        no: bool,
    },

    /// Set or clear a card's purchase link
    #[command(display_order = 21)]
    Link {
        #[command(flatten)]
        target: BinderArg,
        slot: String,

        /// http(s) URL; omit to clear
        url: Option<String>,
    },

    /// Refresh prices from the catalog
    #[command(display_order = 22)]
    Price {
        #[command(flatten)]
        target: BinderArg,

        /// Only this slot
        slot: Option<String>,
    },

    /// Rename a binder
    #[command(display_order = 30)]
    Rename {
        #[command(flatten)]
        target: BinderArg,
        name: String,
    },

    /// Change a binder's page layout
    #[command(display_order = 31)]
    Layout {
        #[command(flatten)]
        target: BinderArg,
        layout: String,
    },

    /// Gray out unpurchased cards when showing a binder
    #[command(name = "gray-out", display_order = 32)]
    GrayOut {
        #[command(flatten)]
        target: BinderArg,

        /// Turn it off again
        #[arg(long)]
        off: bool,
    },

    /// Delete a binder and all its cards
    #[command(display_order = 33)]
    Delete {
        #[command(flatten)]
        target: BinderArg,
    },

    /// Show or set the layout used for new binders
    #[command(name = "default-layout", display_order = 40)]
    DefaultLayout { layout: Option<String> },
}
