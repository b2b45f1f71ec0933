//! This module is in charge of outputting the final analysis results to the
//! standard output and various files

use crate::{
    config::Configuration,
    cutflow::{CutFlowCounter, StageCount},
    histogram::{Histogram, HistogramSet},
    numeric::{reals, Float},
    resacc::AnalysisResults,
};

use eyre::WrapErr;
use log::info;
use std::{
    fs::File,
    io::{BufWriter, Result, Write},
    time::Duration,
};
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

// Number of significant digits in file output
const SIG_DIGITS: usize = (reals::DIGITS - 1) as usize;

// Layout of the end-of-run timestamp
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day]-[month repr:short]-[year repr:last_two]   [hour]:[minute]:[second]");

/// Output the analysis results to the console and to disk
pub fn dump_results(
    cfg: &Configuration,
    results: &AnalysisResults,
    elapsed_time: Duration,
) -> crate::Result<()> {
    // Print out the cut flow on stdout
    println!();
    println!("Cut flow of the {} analysis", cfg.analysis);
    print_cut_flow(&results.cut_flow);
    println!("Accepted events: {}", results.accepted_events);

    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc()
        .format(TIMESTAMP_FORMAT)
        .wrap_err("Failed to format the timestamp")?;

    // Write the cut flow and run statistics
    let cut_flow_path = format!("{}.cutflow", cfg.output_prefix);
    {
        let mut cut_flow_file = BufWriter::new(
            File::create(&cut_flow_path)
                .wrap_err_with(|| format!("Could not create {}", cut_flow_path))?,
        );
        write_cut_flow(&mut cut_flow_file, &timestamp, cfg, results, elapsed_time)?;
        cut_flow_file.flush()?;
    }

    // Write the histograms
    let hists_path = format!("{}.hists", cfg.output_prefix);
    {
        let mut hists_file = BufWriter::new(
            File::create(&hists_path).wrap_err_with(|| format!("Could not create {}", hists_path))?,
        );
        write_histograms(&mut hists_file, &results.histograms)?;
        hists_file.flush()?;
    }

    info!("Results written to {} and {}", cut_flow_path, hists_path);
    Ok(())
}

/// Display the cut flow as a table
fn print_cut_flow(cut_flow: &CutFlowCounter) {
    println!("{:<12}{:>16}{:>12}", "Stage", "Weighted", "Events");
    for (stage, count) in cut_flow.iter() {
        println!("{:<12}{:>16.3}{:>12}", stage, count.weighted, count.raw);
    }
}

/// Write down the cut flow and run statistics
fn write_cut_flow(
    writer: &mut impl Write,
    timestamp: &str,
    cfg: &Configuration,
    results: &AnalysisResults,
    elapsed_time: Duration,
) -> Result<()> {
    writeln_3p(writer, timestamp)?;
    writeln_3p(writer, ("Analysis", cfg.analysis.to_string().as_str()))?;
    writeln_3p(writer, ("Input events", cfg.input_file.as_str()))?;
    writeln_3p(writer, "---------------------------------------------")?;
    for (stage, count) in results.cut_flow.iter() {
        writeln_3p(writer, (stage, count))?;
    }
    writeln_3p(writer, ("Accepted events", results.accepted_events))?;
    writeln_3p(writer, "---------------------------------------------")?;

    let elapsed_secs = elapsed_time.as_secs_f64() as Float;
    writeln_3p(writer, ("Elapsed time (s)", elapsed_secs))?;
    let processed_events = results.processed_events();
    if processed_events > 0 {
        let secs_per_ev = elapsed_secs / (processed_events as Float);
        writeln_3p(writer, ("Elapsed time per event (s)", secs_per_ev))?;
    }
    Ok(())
}

/// Write down the contents of every histogram, in booking order
fn write_histograms(writer: &mut impl Write, histograms: &HistogramSet) -> Result<()> {
    for hist in histograms.iter() {
        write_histogram(writer, hist)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Write down one histogram, one bin per line with its lower edge, content
/// and statistical error
fn write_histogram(writer: &mut impl Write, hist: &Histogram) -> Result<()> {
    writeln!(writer, "# {}: {}", hist.name, hist.title)?;
    writeln_3p(writer, ("Entries", hist.entries as usize))?;
    writeln_3p(writer, ("Underflow", hist.underflow))?;
    writeln_3p(writer, ("Overflow", hist.overflow))?;
    for bin in 0..hist.n_bins() {
        write!(writer, "{:>4} ", bin)?;
        write_engineering(writer, hist.bin_low_edge(bin), SIG_DIGITS)?;
        write!(writer, " ")?;
        write_engineering(writer, hist.bin_content[bin], SIG_DIGITS)?;
        write!(writer, " ")?;
        write_engineering(writer, hist.bin_error(bin), SIG_DIGITS)?;
        writeln!(writer)?;
    }
    Ok(())
}

/// Text output facility with fixed key columns
fn writeln_3p(writer: &mut impl Write, data: impl Write3p) -> Result<()> {
    write!(writer, " ")?;
    data.write(writer)?;
    writeln!(writer)
}

/// Trait implemented by things which can be printed in results files
trait Write3p: Sized {
    /// Write down `self` to the output using the results file styling
    fn write(self, writer: &mut impl Write) -> Result<()>;
}

impl Write3p for &str {
    fn write(self, writer: &mut impl Write) -> Result<()> {
        write!(writer, "{}", self)
    }
}

impl Write3p for usize {
    fn write(self, writer: &mut impl Write) -> Result<()> {
        write!(writer, "{}", self)
    }
}

impl Write3p for Float {
    // %g-like formatting
    fn write(self, writer: &mut impl Write) -> Result<()> {
        write_engineering(writer, self, SIG_DIGITS)
    }
}

impl Write3p for &StageCount {
    // Weighted count followed by the raw event count
    fn write(self, writer: &mut impl Write) -> Result<()> {
        write_engineering(writer, self.weighted, SIG_DIGITS)?;
        write!(writer, " ({} events)", self.raw)
    }
}

impl<T: Write3p> Write3p for (&str, T) {
    // Key-value output that uses fixed-size columns for better readability
    fn write(self, writer: &mut impl Write) -> Result<()> {
        write!(writer, "{:<31}: ", self.0)?;
        self.1.write(writer)
    }
}

/// Write a floating-point number using "engineering" notation
///
/// Analogous to the %g format of the C printf function, this method switches
/// between naive and scientific notation for floating-point numbers when the
/// number being printed becomes so small that printing leading zeroes could end
/// up larger than the scientific notation, or so large that we would be forced
/// to print more significant digits than requested.
///
fn write_engineering(writer: &mut impl Write, x: Float, sig_digits: usize) -> Result<()> {
    let mut precision = sig_digits - 1;
    if x == 0. {
        // Zero is special because you can't take its log
        write!(writer, "0")
    } else if !x.is_finite() {
        write!(writer, "{}", x)
    } else {
        // Otherwise, use log to evaluate order of magnitude
        let log_x = x.abs().log10();
        if log_x >= -3. && log_x <= (sig_digits as Float) {
            // Rust's precision is a number of digits after the decimal point,
            // so it must be adjusted to the magnitude of the number.
            precision = (precision as isize - log_x.trunc() as isize).max(0) as usize;

            // The leading zero of numbers below 1 is not significant
            if log_x < 0. {
                precision += 1
            }

            // Trailing zeros and decimal points are dropped, but integer
            // numbers must keep all of their digits
            let str_with_zeros = format!("{:.1$}", x, precision);
            if str_with_zeros.contains('.') {
                write!(
                    writer,
                    "{}",
                    str_with_zeros.trim_end_matches('0').trim_end_matches('.')
                )
            } else {
                write!(writer, "{}", str_with_zeros)
            }
        } else {
            // Print using scientific notation
            write!(writer, "{:.1$e}", x, precision)
        }
    }
}
