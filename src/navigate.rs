// src/navigate.rs
//
// Drives the dashboard UI for one state: select the Vehicle Registration
// view, pick the state, then walk every year link and month block, handing
// each rendered data panel to the table parser. Selecting a month re-renders
// the page, so month blocks are re-located by index on every iteration and
// no element handle is held across a mutating click.
use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::element::Element;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{Session, WaitOutcome};
use crate::config::Config;
use crate::extract::{self, Record, TableKind};
use crate::normalize;

const TAB_XPATH: &str = "//span[contains(text(),'Vehicle Registration')]";
const STATE_DROPDOWN_XPATH: &str = "//*[@id='j_idt44_label']";
const STATE_ITEMS_XPATH: &str = "//ul[@id='j_idt44_items']/li";
const REFRESH_XPATH: &str = "//*[@id='j_idt49']";
const YEAR_LINKS_XPATH: &str = "//a[contains(@id,'j_idt') and contains(text(),':')]";
const MONTH_BLOCKS_XPATH: &str = "//div[contains(@class,'link_month')]";
const CLASS_PANEL_XPATH: &str = "//div[@id='panel_vhClass']//table";
const CLASS_PANEL_CSS: &str = "#panel_vhClass table";
const CATEGORY_PANEL_CSS: &str = "#panel_vhCatg table";

/// Dropdown entry that selects every state at once; not a real state.
const ALL_STATES_SENTINEL: &str = "All Vahan4";

const CONTROL_TIMEOUT: Duration = Duration::from_secs(20);
const YEAR_LINKS_TIMEOUT: Duration = Duration::from_secs(8);
const LIST_TIMEOUT: Duration = Duration::from_secs(6);
const FALLBACK_CLICK_TIMEOUT: Duration = Duration::from_secs(2);

// The dashboard re-renders asynchronously after most clicks; these settles
// match its observed behavior.
const TAB_SETTLE: Duration = Duration::from_millis(1000);
const DROPDOWN_SETTLE: Duration = Duration::from_millis(800);
const REFRESH_SETTLE: Duration = Duration::from_millis(2500);
const YEAR_SETTLE: Duration = Duration::from_millis(1600);
const EMPTY_PANEL_SETTLE: Duration = Duration::from_millis(1000);
const POST_LOAD_SETTLE: Duration = Duration::from_millis(800);

/// Scrape every year and month for one state. Owns its browser session for
/// the whole call and closes it on every path; never fails the caller. Any
/// error inside aborts only the remaining work for this state, and whatever
/// was already collected is returned.
pub async fn scrape_state(config: &Config, state_name: &str) -> (Vec<Record>, Vec<Record>) {
    let mut class_records = Vec::new();
    let mut category_records = Vec::new();

    let session = match Session::launch(config).await {
        Ok(session) => session,
        Err(err) => {
            warn!(state = %state_name, error = %err, "browser launch failed");
            return (class_records, category_records);
        }
    };

    if let Err(err) = drive_state(
        &session,
        state_name,
        &mut class_records,
        &mut category_records,
    )
    .await
    {
        warn!(state = %state_name, error = %err, "state aborted");
    }
    session.close().await;

    (class_records, category_records)
}

/// Read the selectable state roster from the dropdown, dropping the
/// all-states sentinel entry. Uses its own short-lived session.
pub async fn list_states(config: &Config) -> Result<Vec<String>> {
    let session = Session::launch(config).await?;
    let roster = read_state_roster(&session).await;
    session.close().await;
    roster
}

async fn read_state_roster(session: &Session) -> Result<Vec<String>> {
    open_registration_tab(session).await?;
    open_state_dropdown(session).await?;

    let mut states = Vec::new();
    for item in session.wait_all(STATE_ITEMS_XPATH, LIST_TIMEOUT).await {
        let text = element_text(&item).await;
        if is_state_entry(&text) {
            states.push(text);
        }
    }
    Ok(states)
}

async fn drive_state(
    session: &Session,
    state_name: &str,
    class_records: &mut Vec<Record>,
    category_records: &mut Vec<Record>,
) -> Result<()> {
    open_registration_tab(session).await?;

    if !select_state(session, state_name).await? {
        warn!(state = %state_name, "not found in dropdown, skipping");
        return Ok(());
    }

    let refresh = session
        .find_first(REFRESH_XPATH, CONTROL_TIMEOUT)
        .await
        .context("locating refresh control")?;
    session.forced_click(&refresh).await?;
    sleep(REFRESH_SETTLE).await;

    let years = discover_years(session).await;
    info!(state = %state_name, ?years, "years discovered");

    for year in years {
        if let Err(err) =
            scrape_year(session, state_name, year, class_records, category_records).await
        {
            warn!(state = %state_name, year, error = %err, "year failed");
        }
    }
    Ok(())
}

async fn open_registration_tab(session: &Session) -> Result<()> {
    let tab = session
        .find_first(TAB_XPATH, CONTROL_TIMEOUT)
        .await
        .context("locating Vehicle Registration tab")?;
    tab.click().await.context("opening Vehicle Registration tab")?;
    sleep(TAB_SETTLE).await;
    Ok(())
}

async fn open_state_dropdown(session: &Session) -> Result<()> {
    let dropdown = session
        .find_first(STATE_DROPDOWN_XPATH, CONTROL_TIMEOUT)
        .await
        .context("locating state dropdown")?;
    dropdown.click().await.context("opening state dropdown")?;
    sleep(DROPDOWN_SETTLE).await;
    Ok(())
}

/// Pick the dropdown entry whose text starts with the requested state name.
/// Returns false when no entry matches.
async fn select_state(session: &Session, state_name: &str) -> Result<bool> {
    open_state_dropdown(session).await?;

    let wanted = selection_prefix(state_name);
    for item in session.wait_all(STATE_ITEMS_XPATH, LIST_TIMEOUT).await {
        let text = element_text(&item).await;
        if text.starts_with(wanted) {
            session.forced_click(&item).await?;
            return Ok(true);
        }
    }
    Ok(false)
}

async fn discover_years(session: &Session) -> Vec<i32> {
    let mut texts = Vec::new();
    for link in session.wait_all(YEAR_LINKS_XPATH, YEAR_LINKS_TIMEOUT).await {
        texts.push(element_text(&link).await);
    }
    years_from_texts(texts)
}

async fn scrape_year(
    session: &Session,
    state_name: &str,
    year: i32,
    class_records: &mut Vec<Record>,
    category_records: &mut Vec<Record>,
) -> Result<()> {
    // Re-locate the year link fresh; earlier handles are stale by now.
    let link_xpath = format!("//a[contains(text(),'{year}:')]");
    let link = session
        .find_first(&link_xpath, CONTROL_TIMEOUT)
        .await
        .with_context(|| format!("locating year link {year}"))?;
    session.forced_click(&link).await?;
    sleep(YEAR_SETTLE).await;

    let month_count = session.wait_all(MONTH_BLOCKS_XPATH, LIST_TIMEOUT).await.len();
    debug!(state = %state_name, year, month_count, "month blocks found");

    for index in 0..month_count {
        match scrape_month(
            session,
            state_name,
            year,
            index,
            class_records,
            category_records,
        )
        .await
        {
            Ok(true) => {}
            // The re-render dropped the block at this index; nothing left.
            Ok(false) => break,
            Err(err) => {
                warn!(state = %state_name, year, index, error = %err, "month failed");
            }
        }
    }
    Ok(())
}

/// Process the month block at `index`. Returns `Ok(false)` when re-discovery
/// no longer finds a block there, which ends the month loop.
async fn scrape_month(
    session: &Session,
    state_name: &str,
    year: i32,
    index: usize,
    class_records: &mut Vec<Record>,
    category_records: &mut Vec<Record>,
) -> Result<bool> {
    let blocks = session.wait_all(MONTH_BLOCKS_XPATH, LIST_TIMEOUT).await;
    let Some(block) = blocks.get(index) else {
        return Ok(false);
    };

    let month_label = match block.find_element("a").await {
        Ok(anchor) => element_text(&anchor).await,
        Err(_) => String::new(),
    };
    let month_total = match block.find_element("label").await {
        Ok(label) => {
            let raw = element_text(&label).await;
            normalize::to_integer(Some(&raw))
        }
        Err(_) => None,
    };

    let clicked = match block.find_element("a").await {
        Ok(anchor) => session.forced_click(&anchor).await.is_ok(),
        Err(_) => false,
    };
    if !clicked {
        // Retry through a global lookup by label text.
        let fallback_xpath = format!(
            "//div[contains(@class,'link_month')]//a[normalize-space(text())='{month_label}']"
        );
        match session.find_first(&fallback_xpath, FALLBACK_CLICK_TIMEOUT).await {
            Ok(anchor) => session
                .forced_click(&anchor)
                .await
                .with_context(|| format!("clicking month {month_label}"))?,
            Err(err) => {
                warn!(state = %state_name, year, month = %month_label, error = %err, "month link unclickable");
                return Ok(true);
            }
        }
    }

    // Months with no renderable data are expected; after the timeout give
    // the page a moment and parse whatever is there.
    if session.wait_for(CLASS_PANEL_XPATH, CONTROL_TIMEOUT).await == WaitOutcome::TimedOut {
        sleep(EMPTY_PANEL_SETTLE).await;
    }
    sleep(POST_LOAD_SETTLE).await;

    class_records.extend(
        parse_panel(
            session,
            CLASS_PANEL_CSS,
            state_name,
            year,
            &month_label,
            month_total,
            TableKind::VehicleClass,
        )
        .await?,
    );
    category_records.extend(
        parse_panel(
            session,
            CATEGORY_PANEL_CSS,
            state_name,
            year,
            &month_label,
            month_total,
            TableKind::VehicleCategory,
        )
        .await?,
    );

    Ok(true)
}

async fn parse_panel(
    session: &Session,
    panel_css: &str,
    state_name: &str,
    year: i32,
    month_label: &str,
    month_total: Option<i64>,
    kind: TableKind,
) -> Result<Vec<Record>> {
    let Some(html) = session.element_html(panel_css).await? else {
        return Ok(Vec::new());
    };
    let rows = extract::table::table_rows(&html);
    Ok(extract::records_for_month(
        state_name,
        year,
        month_label,
        month_total,
        kind,
        &rows,
    ))
}

async fn element_text(element: &Element) -> String {
    element
        .inner_text()
        .await
        .ok()
        .flatten()
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Comparison prefix for dropdown matching: the state name with any
/// parenthetical suffix removed.
fn selection_prefix(state_name: &str) -> &str {
    state_name.split('(').next().unwrap_or(state_name).trim()
}

fn is_state_entry(text: &str) -> bool {
    !text.is_empty() && !text.contains(ALL_STATES_SENTINEL)
}

/// Year values from the discovered link texts: trailing colon stripped,
/// numeric-only, deduplicated, ascending.
fn years_from_texts(texts: Vec<String>) -> Vec<i32> {
    let mut years = BTreeSet::new();
    for text in texts {
        let cleaned = text.replace(':', "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(year) = cleaned.parse::<i32>() {
            years.insert(year);
        }
    }
    years.into_iter().collect()
}
