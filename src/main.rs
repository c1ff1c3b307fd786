// Entry point and high-level CLI flow.
//
// - Without `--interactive`, the flags describe one filter state; the
//   dashboard is rendered once, written to the output directory and the
//   summary tables are previewed on the console.
// - With `--interactive`, a numbered menu lets the user load the file, adjust
//   filters and re-render as often as they like.
mod aggregate;
mod charts;
mod colormap;
mod config;
mod dashboard;
mod error;
mod filter;
mod html;
mod interactive;
mod loader;
mod map;
mod output;
#[cfg(test)]
mod test_support;
mod tooltip;
mod types;
mod util;

use chrono::Local;
use clap::Parser;
use config::Args;
use std::error::Error;

/// Load, render once, write outputs and print previews.
fn run_once(args: &Args) -> Result<(), Box<dyn Error>> {
    // The tool cannot do anything without its input, so a load failure ends the run.
    let (data, report) = loader::load_dataset(&args.input)?;
    let loaded_at = Local::now();
    println!(
        "Processing dataset... ({} features read, {} projects kept, {} skipped)\n",
        util::format_int(report.total_features),
        util::format_int(report.kept_rows),
        util::format_int(report.skipped_rows)
    );

    let state = args.filter_state(&data)?;
    let view = dashboard::render(&data, &state)?;

    println!("{}", view.title);
    for pill in &view.pills {
        println!("  - {}", pill);
    }
    println!(
        "{} of {} projects match.\n",
        util::format_int(view.matching_projects),
        util::format_int(view.total_projects)
    );

    output::preview_table("Projects by Start Year", None, &view.yearly_table, args.preview_rows);
    output::preview_table(
        "Top 20 Contractors by Contract Cost",
        Some(&view.contractors_by_cost_text),
        &view.contractors_by_cost_table,
        args.preview_rows,
    );
    output::preview_table(
        "Top 20 Contractors by Number of Projects",
        Some(&view.contractors_by_count_text),
        &view.contractors_by_count_table,
        args.preview_rows,
    );

    let page = output::write_dashboard(&args.out_dir, &view, loaded_at)?;
    println!("(Dashboard written to {})", page.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();
    let args = Args::parse();

    if args.interactive {
        interactive::run(&args);
        return Ok(());
    }
    run_once(&args)
}
