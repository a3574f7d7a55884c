//! zimview - Main Entry Point
//!
//! `zimview <archive-dir> <title> [config.json]`
//!
//! Opens an article from an unpacked archive directory and scrolls through
//! it page by page while the image scheduler runs.

use std::path::Path;

use anyhow::{Context, bail};
use tracing_subscriber::EnvFilter;
use zimview::archive::MemoryArchive;
use zimview::images::{PageView, SessionStatus, ViewAdapter, Viewport};
use zimview::relay::RelayMessage;
use zimview::{DeliveryMode, Reader, ReaderConfig};

const VIEWPORT_WIDTH: f32 = 800.0;
const VIEWPORT_HEIGHT: f32 = 600.0;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(dir), Some(title)) = (args.next(), args.next()) else {
        bail!("usage: zimview <archive-dir> <title> [config.json]");
    };
    let config = match args.next() {
        Some(path) => ReaderConfig::from_path(Path::new(&path))
            .with_context(|| format!("Cannot load configuration {}", path))?,
        None => ReaderConfig::default(),
    };

    let archive = MemoryArchive::from_dir(Path::new(&dir))
        .with_context(|| format!("Cannot load archive from {}", dir))?;
    tracing::info!("Starting zimview {} with {} entries", zimview::VERSION, archive.len());

    let reader = Reader::new(archive, config);
    smol::block_on(run(&reader, &title))
}

async fn run(reader: &Reader<MemoryArchive>, title: &str) -> anyhow::Result<()> {
    let article = reader.open_article(title).await?;
    println!("{}: {} image(s)", article.title, article.image_count);
    for sheet in &article.stylesheets {
        println!("  stylesheet {}", sheet.href());
    }

    let viewport = Viewport::new(0.0, 0.0, VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
    let view = PageView::from_html(&article.title, &article.html, viewport).with_typesetting();

    match reader.config().delivery {
        DeliveryMode::DirectInjection => inject(reader, view).await,
        DeliveryMode::Relay => relay(reader, view).await,
    }
}

async fn inject(reader: &Reader<MemoryArchive>, view: PageView) -> anyhow::Result<()> {
    let height = view.content_height();
    let mut session = reader.image_session(view)?;

    let mut status = session.start().await;
    if status == SessionStatus::Manual {
        if let Some(first) = session.view().list_placeholders().first() {
            if let Err(err) = session.load_on_demand(first.id).await {
                println!("  could not load {}: {}", first.source_title, err);
            }
        }
    }

    while status == SessionStatus::Idle {
        let viewport = session.view().viewport();
        if viewport.bottom() >= height {
            break;
        }
        session.view_mut().scroll_by(viewport.height);
        status = session.on_scroll_settled().await;
    }

    let stats = session.stats();
    println!(
        "{}/{} image(s) handled in {} round(s), {} failed, {} typeset, {} abandoned",
        session.loaded_count(),
        session.total(),
        stats.rounds,
        stats.failed,
        stats.typeset,
        stats.abandoned_rounds
    );
    Ok(())
}

async fn relay(reader: &Reader<MemoryArchive>, view: PageView) -> anyhow::Result<()> {
    let Some(resolver) = reader.relay() else {
        bail!("relay delivery is not enabled");
    };

    for image in view.list_placeholders() {
        let request = RelayMessage::ask(&image.source_title).encode()?;
        let reply = RelayMessage::decode(&resolver.handle(&request).await?)?;
        if let RelayMessage::GiveContent { title, content, .. } = reply {
            println!("  relayed {} ({} bytes)", title, content.len());
        }
    }

    let stats = resolver.stats();
    println!("{} served, {} not found", stats.served, stats.not_found);
    Ok(())
}
