//! Majority command implementation.

use anyhow::Result;
use console::style;

use bitflip_qec::MajorityVote;

use super::common::{OutputFormat, print_json};

/// Decode each readout with the majority vote.
pub fn execute(readouts: &[String], format: OutputFormat) -> Result<()> {
    let votes = readouts
        .iter()
        .map(|bits| MajorityVote::from_bits(bits))
        .collect::<Result<Vec<_>, _>>()?;

    if format == OutputFormat::Json {
        return print_json(&votes);
    }

    println!(
        "{:<8} {:<9} {:<7} {:<9} {}",
        "Readout", "Majority", "Error", "Position", "Corrected"
    );
    for vote in &votes {
        let position = vote
            .error_position()
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        let error = if vote.error_detected() {
            style("yes").red()
        } else {
            style("no").green()
        };
        println!(
            "{:<8} {:<9} {:<7} {:<9} {}",
            vote.bits(),
            vote.majority(),
            error,
            position,
            vote.corrected().bits
        );
    }
    Ok(())
}
