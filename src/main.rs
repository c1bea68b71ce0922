use anyhow::{Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use theme_pref::services::appearance::{
    default_detector, spawn_appearance_poller, AppearanceDetector, AppearanceSignal,
    FixedAppearance,
};
use theme_pref::services::tracing_setup;
use theme_pref::settings::settings_schema;
use theme_pref::{
    DirectoryContext, StoreOptions, SystemAppearance, ThemeMode, ThemePreferenceStore,
    ThemeSnapshot,
};

const APP_NAME: &str = "theme-pref";

/// Inspect and change the stored light/dark/system theme preference
#[derive(Parser, Debug)]
#[command(name = "theme-pref")]
#[command(about = "Inspect and change the stored theme preference", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Data directory holding the settings file (default: platform data dir)
    #[arg(long, value_name = "PATH", global = true)]
    data_dir: Option<PathBuf>,

    /// Pretend the OS reports this appearance instead of detecting it
    #[arg(long, value_name = "light|dark|unspecified", global = true)]
    appearance: Option<SystemAppearance>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// OS appearance polling interval for `watch`, in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    poll_interval_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current mode and resolved theme
    Show {
        /// Print the full snapshot, including palette, as JSON
        #[arg(long)]
        json: bool,

        /// Also list every palette role as a CSS color
        #[arg(long)]
        colors: bool,
    },
    /// Store a new mode
    Set {
        #[arg(value_name = "light|dark|system")]
        mode: ThemeMode,
    },
    /// Pin dark (true) or light (false)
    DarkMode {
        #[arg(action = clap::ArgAction::Set, value_name = "true|false")]
        enabled: bool,
    },
    /// Flip the displayed theme and pin the result
    Toggle,
    /// Print every theme change until interrupted
    Watch,
    /// Print the settings file location
    Path,
    /// Print the JSON schema of the settings file
    Schema,
}

fn print_snapshot(snapshot: &ThemeSnapshot) {
    println!(
        "mode={} theme={} ready={}",
        snapshot.mode, snapshot.theme, snapshot.is_ready
    );
}

fn print_palette(snapshot: &ThemeSnapshot) {
    for (role, color) in snapshot.colors.roles() {
        println!("  {:<12} {:<10} {}", role, color.to_string(), color.to_css());
    }
}

async fn run(args: Args) -> AnyhowResult<()> {
    let dir_context = match &args.data_dir {
        Some(dir) => DirectoryContext::with_data_dir(dir),
        None => DirectoryContext::from_system(APP_NAME)
            .context("Failed to determine data directory")?,
    };

    let options = StoreOptions {
        appearance_poll_interval_ms: args
            .poll_interval_ms
            .unwrap_or(StoreOptions::default().appearance_poll_interval_ms),
    };

    let detector: Arc<dyn AppearanceDetector> = match args.appearance {
        Some(appearance) => Arc::new(FixedAppearance(appearance)),
        None => default_detector(),
    };
    let initial = {
        let detector = Arc::clone(&detector);
        tokio::task::spawn_blocking(move || detector.detect())
            .await
            .context("Appearance detection panicked")?
    };
    let signal = AppearanceSignal::new(initial);

    let store = ThemePreferenceStore::open(&dir_context, signal.clone());
    store.initialize().await;

    match args.command {
        Command::Show { json, colors } => {
            let snapshot = store.snapshot();
            if json {
                let output = serde_json::to_string_pretty(&snapshot)
                    .context("Failed to serialize snapshot")?;
                println!("{}", output);
            } else {
                print_snapshot(&snapshot);
                println!("appearance={}", store.appearance());
                if colors {
                    print_palette(&snapshot);
                }
            }
        }
        Command::Set { mode } => {
            store.set_mode(mode);
            store.flush().await;
            print_snapshot(&store.snapshot());
        }
        Command::DarkMode { enabled } => {
            store.set_dark_mode(enabled);
            store.flush().await;
            print_snapshot(&store.snapshot());
        }
        Command::Toggle => {
            store.toggle_theme();
            store.flush().await;
            print_snapshot(&store.snapshot());
        }
        Command::Watch => {
            let poller = spawn_appearance_poller(
                signal.clone(),
                detector,
                options.appearance_poll_interval(),
            );
            let mut subscription = store.subscribe();
            print_snapshot(&subscription.current());

            loop {
                tokio::select! {
                    changed = subscription.changed() => match changed {
                        Some(snapshot) => print_snapshot(&snapshot),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            poller.abort();
        }
        Command::Path => match store.settings_path() {
            Some(path) => println!("{}", path.display()),
            None => anyhow::bail!("Settings storage has no file location"),
        },
        Command::Schema => {
            let output = serde_json::to_string_pretty(&settings_schema())
                .context("Failed to serialize schema")?;
            println!("{}", output);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    let logging = match &args.log_file {
        Some(path) => tracing_setup::init_global(path),
        None => tracing_setup::init_stderr(),
    };
    if !logging {
        eprintln!("Warning: failed to initialize logging");
    }

    run(args).await
}
