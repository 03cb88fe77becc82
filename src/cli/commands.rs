use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notehub")]
#[command(version, about = "Browse, create and prefetch NoteHub notes")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Notes API base URL (overrides NOTEHUB_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Use built-in sample notes instead of the remote API
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the prefetch server
    Serve {
        /// Listen address (overrides NOTEHUB_BIND)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// List one page of notes
    List {
        /// Tag filter (Todo, Work, Personal, Meeting, Shopping or All)
        #[arg(long, short = 't')]
        tag: Option<String>,

        /// Page number, starting at 1
        #[arg(long, short = 'p', default_value_t = 1)]
        page: u32,

        /// Text to search for in titles and content
        #[arg(long, short = 's')]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single note
    Show {
        /// Note ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a note
    Create {
        /// Note title (3 to 50 characters)
        title: String,

        /// Note body (up to 500 characters)
        #[arg(long, short = 'c', default_value = "")]
        content: String,

        /// Note tag
        #[arg(long, short = 't', default_value = "Todo")]
        tag: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the dehydrated query snapshot for a location
    Prefetch {
        /// Location such as "/notes/filter/Work?page=2"
        location: String,
    },
}
