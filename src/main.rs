//! Nuvia Dialer CLI
//!
//! Usage:
//!   nuvia-dialer --stdin                          # Progress events as JSON lines on stdin
//!   nuvia-dialer --watch ws://host:3000/ws        # Live agent feed
//!   nuvia-dialer --serve                          # Agent feed server
//!   nuvia-dialer --console                        # Console host: keypad + call lifecycle
//!   nuvia-dialer --stdin --json                   # JSON output

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use nuvia_dialer::config::DialerConfig;
use nuvia_dialer::core::{
    consume_lines, consume_websocket, run_server, ApplicationApi, ComponentBundle, ComponentsApi,
    CrmApi, CrmSdk, DialerApp, Discovery, InteractionApi, LifecycleCallbacks, LogNavigator,
    PresenceApi, ProgressSynchronizer,
};
use nuvia_dialer::types::{
    DialRequest, DigitSymbol, LifecycleEvent, PresenceStatus, ProgressView, SessionView, Severity,
};
use nuvia_dialer::{DialerError, Result, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "nuvia-dialer",
    version = VERSION,
    about = "Nuvia Dialer - call-session synchronization core",
    long_about = "Keeps a CRM desktop dialer plugin in sync with the agent's line.\n\n\
                  Modes:\n  \
                  --stdin    Reduce progress events read as JSON lines\n  \
                  --watch    Reduce progress events from a live websocket feed\n  \
                  --serve    Run the agent feed server\n  \
                  --console  Discover a console host and drive the keypad from stdin"
)]
struct Args {
    /// Read progress events from stdin (one JSON object per line)
    #[arg(long)]
    stdin: bool,

    /// Agent feed websocket URL to watch
    #[arg(short, long)]
    watch: Option<String>,

    /// Run the agent feed server
    #[arg(short, long)]
    serve: bool,

    /// Console host mode
    #[arg(short, long)]
    console: bool,

    /// Server address (overrides config)
    #[arg(long)]
    addr: Option<String>,

    /// TOML config file
    #[arg(long, default_value = "nuvia-dialer.toml")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nuvia_dialer=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match DialerConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    let result = if args.serve {
        let addr = args
            .addr
            .clone()
            .unwrap_or_else(|| config.feed.listen_addr.clone());
        run_server(&addr)
            .await
            .map_err(|e| DialerError::Feed(e.to_string()))
    } else if args.console {
        run_console(&config, &args).await
    } else if args.stdin {
        run_stdin(&args).await
    } else if let Some(url) = args.watch.clone().or_else(|| config.feed.url.clone()) {
        run_watch(&url, &args).await
    } else {
        run_stdin(&args).await
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Progress events from stdin
async fn run_stdin(args: &Args) -> Result<()> {
    let mut sync = ProgressSynchronizer::new(Arc::new(LogNavigator));
    let printer = spawn_progress_printer(sync.subscribe(), args.json);
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let applied = consume_lines(reader, &mut sync).await?;
    drop(sync);
    let _ = printer.await;
    tracing::info!(applied, "Input ended");
    Ok(())
}

/// Progress events from a live websocket feed
async fn run_watch(url: &str, args: &Args) -> Result<()> {
    let mut sync = ProgressSynchronizer::new(Arc::new(LogNavigator));
    let printer = spawn_progress_printer(sync.subscribe(), args.json);
    consume_websocket(url, &mut sync).await?;
    drop(sync);
    let _ = printer.await;
    Ok(())
}

fn spawn_progress_printer(
    mut rx: watch::Receiver<ProgressView>,
    json: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let view = rx.borrow_and_update().clone();
            if json {
                println!("{}", serde_json::to_string(&view).unwrap_or_default());
            } else {
                println!("{}", view.to_terminal_string());
            }
        }
    })
}

fn spawn_session_printer(
    mut rx: watch::Receiver<SessionView>,
    json: bool,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let view = rx.borrow_and_update().clone();
            if json {
                println!("{}", serde_json::to_string(&view).unwrap_or_default());
            } else {
                println!(
                    "[{}] number={} | {} | {}",
                    if view.call_active { "in-call" } else { "idle" },
                    view.dial_number,
                    view.indicator.text,
                    view.default_campaign_label
                );
            }
        }
    })
}

// =============================================================================
// CONSOLE HOST
// =============================================================================

/// Host stand-in: logs every call and keeps what the plugin registered
#[derive(Default)]
struct ConsoleHost {
    lifecycle: Mutex<Option<LifecycleCallbacks>>,
    bundles: Mutex<Vec<ComponentBundle>>,
}

struct ConsoleSdk(Arc<ConsoleHost>);

impl CrmSdk for ConsoleSdk {
    fn interaction(&self) -> Option<Arc<dyn InteractionApi>> {
        Some(self.0.clone())
    }

    fn presence(&self) -> Option<Arc<dyn PresenceApi>> {
        Some(self.0.clone())
    }

    fn crm(&self) -> Option<Arc<dyn CrmApi>> {
        Some(self.0.clone())
    }

    fn application(&self) -> Option<Arc<dyn ApplicationApi>> {
        Some(self.0.clone())
    }

    fn components(&self) -> Result<Option<Arc<dyn ComponentsApi>>> {
        Ok(Some(self.0.clone()))
    }
}

#[async_trait]
impl InteractionApi for ConsoleHost {
    fn subscribe(&self, callbacks: LifecycleCallbacks) -> Result<()> {
        *self.lifecycle.lock().map_err(|e| DialerError::Subscription(e.to_string()))? =
            Some(callbacks);
        Ok(())
    }

    async fn send_dtmf(&self, digit: DigitSymbol) -> Result<()> {
        tracing::info!(%digit, "host: sendDtmf");
        Ok(())
    }
}

#[async_trait]
impl PresenceApi for ConsoleHost {
    async fn set_status(&self, status: PresenceStatus) -> Result<()> {
        tracing::info!(%status, "host: setStatus");
        Ok(())
    }
}

impl CrmApi for ConsoleHost {
    fn click_to_dial(&self, request: DialRequest) -> Result<()> {
        tracing::info!(?request, "host: click2dial");
        Ok(())
    }
}

impl ApplicationApi for ConsoleHost {
    fn bring_to_front(&self) {
        tracing::info!("host: bringAppToFront");
    }

    fn notify(&self, message: &str, severity: Severity) {
        println!("[{:?}] {}", severity, message);
    }
}

impl ComponentsApi for ConsoleHost {
    fn register_components(&self, bundle: ComponentBundle) -> Result<()> {
        tracing::info!(location = %bundle.template().location, "host: registerCustomComponents");
        self.bundles
            .lock()
            .map_err(|e| DialerError::Registration(e.to_string()))?
            .push(bundle);
        Ok(())
    }
}

impl ConsoleHost {
    fn fire(&self, event: LifecycleEvent) -> Result<()> {
        let guard = self
            .lifecycle
            .lock()
            .map_err(|e| DialerError::Subscription(e.to_string()))?;
        match guard.as_ref() {
            Some(callbacks) => {
                callbacks.fire(event);
                Ok(())
            }
            None => Err(DialerError::Subscription("no lifecycle subscriber".into())),
        }
    }

    /// Invoke a command by host key on the first bundle that knows it
    fn invoke(&self, key: &str) -> Result<()> {
        let bundles = self
            .bundles
            .lock()
            .map_err(|e| DialerError::Registration(e.to_string()))?;
        let mut last_err = DialerError::UnknownCommand(key.to_string());
        for bundle in bundles.iter() {
            match bundle.callbacks().invoke_key(key) {
                Ok(()) => return Ok(()),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

/// Discover the console host, then drive the plugin from stdin lines
async fn run_console(config: &DialerConfig, args: &Args) -> Result<()> {
    let host = Arc::new(ConsoleHost::default());

    // The SDK shows up after a few polls, like a slow desktop load
    let polls = Arc::new(AtomicU32::new(0));
    let lookup_host = host.clone();
    let mut discovery = Discovery::new(config.discovery.clone())
        .with_lookup(|| Ok(None))
        .with_lookup(move || {
            if polls.fetch_add(1, Ordering::SeqCst) < 3 {
                return Err(DialerError::CapabilityUnavailable("CrmSdk".into()));
            }
            Ok(Some(Arc::new(ConsoleSdk(lookup_host.clone())) as Arc<dyn CrmSdk>))
        })
        .with_globals(|| vec!["Five9".to_string(), "document".to_string()]);

    let mut app = None;
    let outcome = discovery
        .run(|sdk, components| app = Some(DialerApp::init(sdk, components, config)))
        .await;
    let Some(app) = app else {
        return Err(DialerError::CapabilityUnavailable(outcome.to_string()));
    };

    let printer = spawn_session_printer(app.session().view(), args.json);

    println!("Console host ready. Commands:");
    println!("  start | accept | end | finish      call lifecycle");
    println!("  0-9 * # (any run of them)          keypad keys");
    println!("  dial | clear | toggle | front      dialer buttons");
    println!("  working | notready | logout        presence");
    println!("  number <text> | campaign <text>    edit fields");
    println!("  quit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let outcome = match word {
            "start" => host.fire(LifecycleEvent::Started),
            "accept" => host.fire(LifecycleEvent::Accepted),
            "end" => host.fire(LifecycleEvent::Ended),
            "finish" => host.fire(LifecycleEvent::Finished),
            "dial" => host.invoke("nv_onDial"),
            "clear" => host.invoke("nv_onClear"),
            "toggle" => host.invoke("nv_toggleDefault"),
            "front" => host.invoke("nv_bringToFront"),
            "working" => host.invoke("nv_setWorking"),
            "notready" => host.invoke("nv_setNotReady"),
            "logout" => host.invoke("nv_setLogout"),
            "number" => app.session().set_dial_number(rest),
            "campaign" => app.session().set_campaign(rest),
            keys => {
                for key in keys.chars() {
                    if !app.key_pressed(&key.to_string()).stop_propagation() {
                        println!("(ignored key {:?})", key);
                    }
                }
                Ok(())
            }
        };
        if let Err(e) = outcome {
            println!("{}", e);
        }
    }

    drop(app);
    printer.abort();
    Ok(())
}
