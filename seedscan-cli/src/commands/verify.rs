//! Verify command - check caller-supplied phrases

use std::io::{self, Read};

use anyhow::Result;

use super::check::print_report;
use super::{cancel_on_ctrl_c, get_context};

pub fn run(phrases: Vec<String>, simulate: bool, json: bool) -> Result<()> {
    // Get phrases from arguments or stdin, one per line
    let phrases: Vec<String> = if phrases.is_empty() && atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        split_phrases(&buffer)
    } else {
        phrases
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    };

    if phrases.is_empty() {
        anyhow::bail!("No phrases provided. Pass them as arguments or pipe them one per line.");
    }

    let ctx = get_context(|config| config.simulate |= simulate)?;
    let _ = ctx.logger.log_command("verify");

    let enabled = ctx.scan_service.aggregator().enabled_kinds();
    let report = ctx.scan_service.check_phrases(&phrases, &cancel_on_ctrl_c());

    print_report(report, &enabled, json)
}

fn split_phrases(input: &str) -> Vec<String> {
    input
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}
