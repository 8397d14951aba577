use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Natural-language developer search", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the web interface
    Serve {
        /// Bind address (defaults to web.host from config)
        #[clap(long)]
        host: Option<String>,

        /// Port (defaults to web.port from config)
        #[clap(short, long)]
        port: Option<u16>,
    },

    /// Search developers with a free-text query
    Search {
        query: String,

        /// comprehensive or profile_only
        #[clap(short = 't', long, default_value = "comprehensive")]
        search_type: String,

        /// Filter profile: default, strict, flexible or one from config
        #[clap(short = 'm', long, default_value = "default")]
        filter_mode: String,

        /// Maximum number of results
        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// Show the filters a query would produce without searching
    Extract {
        query: String,

        #[clap(short = 'm', long, default_value = "default")]
        filter_mode: String,
    },

    /// Browse developers by exact attributes
    Filter {
        #[clap(long)]
        seniority: Option<String>,

        #[clap(long)]
        primary_role: Option<String>,

        #[clap(long)]
        availability: Option<String>,

        #[clap(long)]
        location: Option<String>,

        /// Minimum years of experience
        #[clap(long)]
        min_years: Option<i64>,

        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// Generate and index synthetic developers
    InitData {
        /// Number of developers (defaults to search.sample_count)
        #[clap(short, long)]
        count: Option<usize>,

        /// Seed for reproducible data
        #[clap(long)]
        seed: Option<u64>,
    },

    /// Record counts per collection
    Stats {},

    /// Print one developer
    Profile { developer_id: String },
}
