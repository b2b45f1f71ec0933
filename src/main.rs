//! Top quark event selection
//!
//!
//! # Introduction (for the physicist)
//!
//! This program selects collision events which are compatible with the
//! production of top quarks decaying into one lepton, missing transverse
//! momentum and jets. Two selections are available:
//!
//! * t-channel single top production, which requires exactly two jets, one of
//!   them b-tagged, and a forward light jet.
//! * Semi-leptonic top pair production, which requires at least four jets, two
//!   of them b-tagged, and reconstructs the hadronically decaying top quark
//!   and W boson by trying jet combinations.
//!
//! Each selection records a weighted cut flow and histograms of the
//! kinematics of the selected events.
//!
//!
//! # Introduction (for the computer guy)
//!
//! * read in parameters and events
//! * run every event through an ordered list of gates, then through the
//!   analysis-specific cuts, accumulating counters and histograms per batch
//!   of events
//! * merge the batches, then display / store the result.

#![warn(missing_docs)]

mod analysis;
mod config;
mod cutflow;
mod event;
mod helpers;
mod histogram;
mod momentum;
mod numeric;
mod output;
mod reader;
mod reconstruct;
mod resacc;
mod scheduling;

use crate::{
    analysis::{single_top::SingleTop, ttbar::TopPair, Analysis},
    config::{AnalysisKind, Configuration},
    cutflow::EventSelector,
    event::Event,
    resacc::AnalysisResults,
};

use eyre::WrapErr;
use log::info;
use std::time::Instant;

/// We'll use eyre's type-erased result type throughout the application
type Result<T> = eyre::Result<T>;

/// Default location of the configuration file
const DEFAULT_CONFIG: &str = "analysis.cfg";

/// This will act as our main function, with suitable error handling
fn main() -> Result<()> {
    env_logger::init();

    // ### CONFIGURATION READOUT ###

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_owned());
    let cfg = Configuration::load(&config_path).wrap_err("Failed to load the configuration")?;

    // ### EVENT LOADING ###

    let events = reader::read_events(&cfg.input_file).wrap_err("Failed to read the events")?;
    info!("Loaded {} events from {}", events.len(), cfg.input_file);

    // We start the clock after I/O, to avoid IO-induced timing fluctuations
    let saved_time = Instant::now();

    // ### ANALYSIS EXECUTION ###

    let results = match cfg.analysis {
        AnalysisKind::SingleTop => {
            let selector = EventSelector::new(SingleTop::book, cfg.is_data)?;
            run_selection(&events, &selector)
        }
        AnalysisKind::TopPair => {
            let selector = EventSelector::new(
                |histograms| TopPair::book(histograms, cfg.search_mode, cfg.mass_window),
                cfg.is_data,
            )?;
            run_selection(&events, &selector)
        }
    };
    info!(
        "Selected {} out of {} events",
        results.accepted_events,
        results.processed_events()
    );

    // ### RESULTS DISPLAY AND STORAGE ###

    let elapsed_time = saved_time.elapsed();
    output::dump_results(&cfg, &results, elapsed_time).wrap_err("Failed to output the results")?;
    Ok(())
}

/// Run an event selection over all events, batch by batch
fn run_selection<A: Analysis>(events: &[Event], selector: &EventSelector<A>) -> AnalysisResults {
    scheduling::run_analysis(events, |batch| {
        let mut results = selector.new_results();
        for event in batch {
            // Rejected events only show up in the cut flow
            let _ = selector.select(event, &mut results);
        }
        results
    })
}
