use anyhow::Result;
use clap::Parser;
use dnfcache::runtime::RealRuntime;
use dnfcache::{CacheOptions, CommandSession, Conf, PackageCache, commands};
use std::io::{self, Write};
use std::path::PathBuf;

/// dnfcache - query the dnf package universe by name
///
/// Loads the configured repositories, refreshes their metadata and joins
/// available and installed packages into one entry per package name.
///
/// Examples:
///   dnfcache show curl          # Candidate and installed versions of curl
///   dnfcache search 'lib*'      # Installed packages matching a glob
#[derive(Parser, Debug)]
#[command(author, version = env!("DNFCACHE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install root to query (also via DNFCACHE_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "DNFCACHE_ROOT",
        value_name = "PATH",
        default_value = "/",
        global = true
    )]
    install_root: PathBuf,

    /// Release version to use instead of detecting it
    #[arg(long, value_name = "VERSION", global = true)]
    releasever: Option<String>,

    /// Metadata cache directory (defaults to the standard dnf location)
    #[arg(long, value_name = "PATH", global = true)]
    cachedir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Report metadata download progress on stderr
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List known packages
    List {
        /// Only list installed packages
        #[arg(long)]
        installed: bool,
    },

    /// Show candidate and installed details of a package
    Show {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Search installed packages with a shell glob
    Search {
        #[arg(value_name = "PATTERN")]
        pattern: String,
    },

    /// Print whether a package is installed
    Installed {
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Print cache totals
    Stats,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let options = CacheOptions {
        releasever: cli.releasever,
        cachedir: cli.cachedir,
        progress: cli.progress.then(|| {
            Box::new(|name: &str, fraction: f64| {
                eprintln!("{}: {:.0}%", name, fraction * 100.0);
            }) as dnfcache::progress::ProgressFn
        }),
    };

    let session = CommandSession::new(RealRuntime, Conf::new(cli.install_root));
    let cache = PackageCache::new(&RealRuntime, session, options)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::List { installed } => commands::list(&cache, installed, cli.json, &mut out)?,
        Commands::Show { name } => commands::show(&cache, &name, cli.json, &mut out)?,
        Commands::Search { pattern } => commands::search(&cache, &pattern, cli.json, &mut out)?,
        Commands::Installed { name } => commands::installed(&cache, &name, &mut out)?,
        Commands::Stats => commands::stats(&cache, cli.json, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_show_parsing() {
        let cli = Cli::try_parse_from(["dnfcache", "show", "curl"]).unwrap();
        match cli.command {
            Commands::Show { name } => assert_eq!(name, "curl"),
            _ => panic!("Expected Show command"),
        }
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "dnfcache",
            "--root",
            "/mnt/sysimage",
            "search",
            "lib*",
            "--releasever",
            "40",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.install_root, PathBuf::from("/mnt/sysimage"));
        assert_eq!(cli.releasever.as_deref(), Some("40"));
        assert!(cli.json);
        match cli.command {
            Commands::Search { pattern } => assert_eq!(pattern, "lib*"),
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_list_installed_flag() {
        let cli = Cli::try_parse_from(["dnfcache", "list", "--installed"]).unwrap();
        assert!(matches!(cli.command, Commands::List { installed: true }));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["dnfcache"]).is_err());
        assert!(Cli::try_parse_from(["dnfcache", "show"]).is_err());
    }
}
