use std::time::Duration;

use chrono::Utc;
use clap::Args;
use timekeep_core::timer::TimerKind;
use timekeep_core::view::render_timer;
use timekeep_core::{Command, Config, Input, Runtime};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Args)]
pub struct WatchArgs {
    /// Start this timer before watching
    #[arg(long)]
    start: Option<TimerKind>,
    /// Exit once no timer is running
    #[arg(long)]
    until_idle: bool,
    /// Redraw period in milliseconds
    #[arg(long, default_value = "1000")]
    refresh: u64,
    /// Run without the background notification worker
    #[arg(long)]
    no_worker: bool,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(watch(args))
}

async fn watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut runtime = Runtime::open(&config)?;
    runtime.load(Utc::now());
    let page = if args.no_worker {
        None
    } else {
        Some(runtime.spawn_worker(&config))
    };
    if let Some(kind) = args.start {
        runtime.apply(Command::Start(kind));
    }

    let mut observer = runtime.subscribe();
    let (inputs, rx) = mpsc::channel(16);
    let driver = tokio::spawn(runtime.run(rx, page));

    let mut redraw = tokio::time::interval(Duration::from_millis(args.refresh.max(10)));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            _ = redraw.tick() => {
                let engine = observer.borrow_and_update().clone();
                match engine.running_kind().and_then(|kind| engine.get(kind)) {
                    Some(timer) => {
                        let view = render_timer(timer);
                        let clock = view.lines().next().unwrap_or_default();
                        println!("{}: {clock}", timer.kind().label());
                    }
                    None if args.until_idle => break,
                    None => {}
                }
            }
        }
    }

    // The driver may already be gone if its channel closed.
    let _ = inputs.send(Input::Shutdown).await;
    let runtime = driver.await?;
    info!(history = runtime.store().history().len(), "watch finished");
    Ok(())
}
