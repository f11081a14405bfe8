mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mail_relay::HttpMailRelay;
use page_core::{
    ActiveSection, ContactSubmissionController, GeometryObserver, MessageSender,
    MissingMessageSender, MountedReveal, ObserveConfig, MountedRotator, PeriodicTextRotator,
    ScrollActiveSectionTracker, SectionLayout, SubmitOutcome, TracingNotifier, Viewport,
    ViewportRevealController,
};
use shared::domain::ContactField;
use tokio::time::timeout;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings};

const REVEAL_SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(about = "Drives the profile page state machines from the terminal")]
struct Cli {
    /// Settings file; defaults to ./site.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the active navigation section for each scroll offset.
    Scroll {
        #[arg(required = true, allow_negative_numbers = true)]
        offsets: Vec<f64>,
    },
    /// Scroll through the offsets and report which sections have revealed.
    Reveal {
        #[arg(required = true, allow_negative_numbers = true)]
        offsets: Vec<f64>,
    },
    /// Run the role rotator for a number of ticks.
    Rotate {
        #[arg(long, default_value_t = 4)]
        ticks: usize,
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Submit one contact message through the configured relay.
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Scroll { offsets } => scroll(&settings, &offsets)?,
        Command::Reveal { offsets } => reveal(&settings, &offsets).await?,
        Command::Rotate { ticks, interval_ms } => rotate(&settings, ticks, interval_ms).await?,
        Command::Contact {
            name,
            email,
            message,
        } => contact(&settings, name, email, message).await?,
    }

    Ok(())
}

fn scroll(settings: &Settings, offsets: &[f64]) -> Result<()> {
    let config = settings.page_config()?;
    let layout = settings.layout()?;
    let mut tracker = ScrollActiveSectionTracker::new(config.registry, config.tracker);

    for &offset in offsets {
        tracker.evaluate(offset.max(0.0), &layout);
        let active = match tracker.active() {
            ActiveSection::Top => "top".to_string(),
            ActiveSection::Section(id) => id.to_string(),
        };
        println!(
            "scroll_y={offset} active={active} scrolled={}",
            tracker.is_scrolled()
        );
    }
    Ok(())
}

async fn reveal(settings: &Settings, offsets: &[f64]) -> Result<()> {
    let config = settings.page_config()?;
    let viewport = Viewport::new(settings.viewport_height);
    let layout = Arc::new(settings.layout()?);
    let observer = GeometryObserver::new(Arc::clone(&viewport), layout.clone());

    let mut reveals = config
        .registry
        .iter()
        .map(|id| {
            let controller = ViewportRevealController::new(id.clone())
                .with_config(config.observe)
                .with_timings(config.stagger, config.counter);
            MountedReveal::mount(controller, &observer)
        })
        .collect::<Vec<_>>();

    for &offset in offsets {
        let revealed =
            scroll_and_collect_reveals(&viewport, layout.as_ref(), config.observe, &mut reveals, offset)
                .await?;
        println!("scroll_y={offset} revealed=[{}]", revealed.join(", "));
    }

    for reveal in reveals {
        reveal.unmount().await;
    }
    Ok(())
}

/// Scrolls to `offset` and returns the revealed sections once every section
/// brought into view by that offset has latched.
async fn scroll_and_collect_reveals(
    viewport: &Viewport,
    layout: &dyn SectionLayout,
    observe: ObserveConfig,
    reveals: &mut [MountedReveal],
    offset: f64,
) -> Result<Vec<String>> {
    viewport.scroll_to(offset);
    let position = viewport.position();
    for reveal in reveals.iter_mut() {
        let visible = layout
            .bounds(&reveal.element(), position.scroll_y)
            .is_some_and(|bounds| {
                observe.is_satisfied(bounds.visible_fraction(position.viewport_height))
            });
        if visible {
            timeout(REVEAL_SETTLE_TIMEOUT, reveal.triggered())
                .await
                .with_context(|| format!("{} did not reveal in time", reveal.element()))?;
        }
    }
    Ok(reveals
        .iter()
        .filter(|reveal| reveal.current().triggered_at().is_some())
        .map(|reveal| reveal.element().to_string())
        .collect())
}

async fn rotate(settings: &Settings, ticks: usize, interval_ms: Option<u64>) -> Result<()> {
    let period = Duration::from_millis(interval_ms.unwrap_or(settings.rotation_interval_ms));
    let rotator = PeriodicTextRotator::new(settings.roles.clone())?;
    let mounted = MountedRotator::mount(rotator, period)?;
    let mut rx = mounted.subscribe();

    println!("role={}", rx.borrow_and_update().label);
    for _ in 0..ticks {
        rx.changed().await.context("rotator stopped unexpectedly")?;
        println!("role={}", rx.borrow_and_update().label);
    }

    mounted.unmount().await;
    Ok(())
}

async fn contact(settings: &Settings, name: String, email: String, message: String) -> Result<()> {
    let sender: Arc<dyn MessageSender> = match settings.relay_credentials() {
        Some(credentials) => Arc::new(
            HttpMailRelay::with_endpoint(&settings.relay_endpoint, credentials)?
                .with_timeout(settings.relay_timeout())?,
        ),
        None => {
            warn!("relay credentials are not configured; delivery will fail");
            Arc::new(MissingMessageSender)
        }
    };
    let controller = ContactSubmissionController::new(sender, Arc::new(TracingNotifier));

    controller.set_field(ContactField::Name, name).await;
    controller.set_field(ContactField::Email, email).await;
    controller.set_field(ContactField::Message, message).await;

    match controller.submit().await {
        SubmitOutcome::Sent => {
            info!("contact message delivered");
            println!("sent");
        }
        SubmitOutcome::Rejected(err) => anyhow::bail!("form rejected: {err}"),
        SubmitOutcome::Failed(reason) => anyhow::bail!("delivery failed: {reason}"),
        SubmitOutcome::AlreadySubmitting => anyhow::bail!("a submission is already in flight"),
    }
    Ok(())
}
