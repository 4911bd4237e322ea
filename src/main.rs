use anyhow::Result;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, Semaphore},
    time::Instant,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use vahanscraper::{config::Config, export, extract::Record, navigate};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) load config ──────────────────────────────────────────────
    let config = Arc::new(Config::from_env()?);
    info!(
        workers = config.workers,
        output = %config.output.display(),
        "configured"
    );

    // ─── 3) enumerate selectable states ──────────────────────────────
    let states = navigate::list_states(&config).await?;
    info!(count = states.len(), "states discovered");
    for state in &states {
        info!(state = %state, "queued");
    }

    // ─── 4) scrape each state under the worker pool ──────────────────
    let (tx, mut rx) = mpsc::channel::<(String, Vec<Record>, Vec<Record>)>(states.len().max(1));
    let pool = Arc::new(Semaphore::new(config.workers));
    let mut handles = Vec::with_capacity(states.len());

    for state in states.clone() {
        let config = Arc::clone(&config);
        let pool = Arc::clone(&pool);
        let tx = tx.clone();

        handles.push(tokio::spawn(async move {
            let _permit = pool.acquire().await.unwrap();
            info!(state = %state, "scraping");
            let start = Instant::now();
            let (class_records, category_records) = navigate::scrape_state(&config, &state).await;
            info!(
                state = %state,
                class = class_records.len(),
                category = category_records.len(),
                elapsed = ?start.elapsed(),
                "state done"
            );
            let _ = tx.send((state, class_records, category_records)).await;
        }));
    }
    // drop the original sender so `rx.recv()` ends once all states finish
    drop(tx);

    // ─── 5) aggregate results in completion order ────────────────────
    let mut all_class: Vec<Record> = Vec::new();
    let mut all_category: Vec<Record> = Vec::new();
    while let Some((state, class_records, category_records)) = rx.recv().await {
        if class_records.is_empty() && category_records.is_empty() {
            warn!(state = %state, "no records collected");
        }
        all_class.extend(class_records);
        all_category.extend(category_records);
    }
    for handle in handles {
        if let Err(err) = handle.await {
            error!("scrape task panicked: {}", err);
        }
    }

    // ─── 6) write the workbook, partial failures included ────────────
    export::write_workbook(&config.output, &states, &all_class, &all_category)?;
    info!(
        class = all_class.len(),
        category = all_category.len(),
        "all done"
    );
    Ok(())
}
