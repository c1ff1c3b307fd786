// Menu-driven session.
//
// Each menu pick edits the filter state; "Render dashboard" re-runs the whole
// pipeline from the loaded dataset, the same way a widget change would.
use crate::config::Args;
use crate::dashboard::{render, threshold_options, FilterOptions, FilterState};
use crate::loader::{load_dataset, Dataset};
use crate::output;
use crate::util::format_int;
use chrono::Local;
use log::error;
use std::io::{self, BufRead, Write};

struct AppState {
    data: Option<Dataset>,
    filters: FilterState,
}

/// Read a single line of input after printing `prompt`. `None` once the
/// input is exhausted or unreadable.
fn read_line(input: &mut impl BufRead, prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_choice(input: &mut impl BufRead) -> Option<String> {
    read_line(input, "Enter choice: ")
}

/// Print numbered options and return the picked one. `0` clears the
/// selection; an empty list or invalid entry returns `None`.
fn pick(input: &mut impl BufRead, title: &str, options: &[String]) -> Option<String> {
    if options.is_empty() {
        println!("No {} options for the current selection.\n", title);
        return None;
    }
    println!("\n{}:", title);
    println!("[0] (any)");
    for (i, o) in options.iter().enumerate() {
        println!("[{}] {}", i + 1, o);
    }
    loop {
        match read_choice(input)?.parse::<usize>() {
            Ok(0) => return None,
            Ok(n) if n <= options.len() => return Some(options[n - 1].clone()),
            _ => println!("Invalid choice. Please enter a number between 0 and {}.", options.len()),
        }
    }
}

fn pick_years(input: &mut impl BufRead, title: &str, bounds: Option<(i32, i32)>) -> Option<(i32, i32)> {
    let (lo, hi) = bounds?;
    println!("\n{} ({} to {}). Leave blank to keep the full span.", title, lo, hi);
    let mut read = |label: &str, default: i32| loop {
        let s = match read_line(input, &format!("{} [{}]: ", label, default)) {
            Some(s) if !s.is_empty() => s,
            _ => return default,
        };
        match s.parse::<i32>() {
            Ok(y) if (lo..=hi).contains(&y) => return y,
            _ => println!("Please enter a year between {} and {}.", lo, hi),
        }
    };
    let from = read("From", lo);
    let to = read("To", hi);
    Some((from.min(to), from.max(to)))
}

fn handle_load(state: &mut AppState, args: &Args) {
    match load_dataset(&args.input) {
        Ok((data, report)) => {
            println!(
                "Processing dataset... ({} features read, {} projects kept)",
                format_int(report.total_features),
                format_int(report.kept_rows)
            );
            if report.skipped_rows > 0 {
                println!(
                    "Note: {} features skipped due to missing or invalid ContractCost.",
                    format_int(report.skipped_rows)
                );
            }
            if report.missing_coords > 0 {
                println!(
                    "Info: {} projects have no coordinates and will not appear on the map.",
                    format_int(report.missing_coords)
                );
            }
            println!();
            state.filters = FilterState {
                threshold: state.filters.threshold,
                color_scope: state.filters.color_scope,
                ..FilterState::for_dataset(&data)
            };
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn handle_set_filter(state: &mut AppState, input: &mut impl BufRead) {
    let Some(data) = &state.data else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };
    println!("\nFilter:");
    println!("[1] Region");
    println!("[2] Province");
    println!("[3] Municipality");
    println!("[4] Type of Work");
    println!("[5] Contractor");
    println!("[6] Start Year");
    println!("[7] Completion Year");
    let opts = FilterOptions::for_state(data, &state.filters);
    let f = &mut state.filters;
    let Some(choice) = read_choice(input) else { return };
    match choice.as_str() {
        "1" => {
            f.region = pick(input, "Region", &opts.regions);
            f.province = None;
            f.municipality = None;
        }
        "2" => {
            f.province = pick(input, "Province", &opts.provinces);
            f.municipality = None;
        }
        "3" => f.municipality = pick(input, "Municipality", &opts.municipalities),
        "4" => f.type_of_work = pick(input, "Type of Work", &opts.types_of_work),
        "5" => f.contractor = pick(input, "Contractor", &opts.contractors),
        "6" => f.start_years = pick_years(input, "Start Year", opts.start_year_bounds),
        "7" => f.completion_years = pick_years(input, "Completion Year", opts.completion_year_bounds),
        _ => println!("Invalid choice.\n"),
    }
}

fn handle_threshold(state: &mut AppState, input: &mut impl BufRead) {
    let labels: Vec<String> = threshold_options().iter().map(|(l, _)| l.clone()).collect();
    loop {
        let prompt = format!("Threshold ({} to {}): ", labels[0], labels[labels.len() - 1]);
        let Some(s) = read_line(input, &prompt) else { return };
        match threshold_options().iter().find(|(l, _)| l.eq_ignore_ascii_case(&s)) {
            Some((_, v)) => {
                state.filters.threshold = *v;
                println!();
                return;
            }
            None => println!("Invalid threshold. Use a label such as 100M."),
        }
    }
}

fn handle_render(state: &AppState, args: &Args) {
    let Some(data) = &state.data else {
        println!("Error: No data loaded. Please load the file first (option 1).\n");
        return;
    };
    let view = match render(data, &state.filters) {
        Ok(v) => v,
        Err(e) => {
            error!("Render failed: {}", e);
            return;
        }
    };
    println!("Rendering dashboard...");
    for pill in &view.pills {
        println!("  - {}", pill);
    }
    println!(
        "{} of {} projects match.\n",
        format_int(view.matching_projects),
        format_int(view.total_projects)
    );
    output::preview_table("Projects by Start Year", None, &view.yearly_table, args.preview_rows);
    output::preview_table(
        "Top Contractors by Contract Cost",
        Some(&view.contractors_by_cost_text),
        &view.contractors_by_cost_table,
        args.preview_rows,
    );
    match output::write_dashboard(&args.out_dir, &view, Local::now()) {
        Ok(page) => println!("(Dashboard written to {})\n", page.display()),
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

pub fn run(args: &Args) {
    run_with(args, &mut io::stdin().lock());
}

/// The menu loop over any line source. Ends on "Exit" or end of input.
fn run_with(args: &Args, input: &mut impl BufRead) {
    let mut state = AppState {
        data: None,
        filters: FilterState { color_scope: args.color_scope, ..FilterState::default() },
    };
    loop {
        println!("Select an action:");
        println!("[1] Load the file");
        println!("[2] Set a filter");
        println!("[3] Clear filters");
        println!("[4] Set cost threshold");
        println!("[5] Render dashboard");
        println!("[6] Exit\n");
        let Some(choice) = read_choice(input) else {
            println!("\nEnd of input. Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut state, args),
            "2" => handle_set_filter(&mut state, input),
            "3" => {
                let keep = (state.filters.threshold, state.filters.color_scope);
                state.filters = match &state.data {
                    Some(data) => FilterState::for_dataset(data),
                    None => FilterState::default(),
                };
                (state.filters.threshold, state.filters.color_scope) = keep;
                println!("Filters cleared.\n");
            }
            "4" => handle_threshold(&mut state, input),
            "5" => handle_render(&state, args),
            "6" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number from 1 to 6.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use crate::test_support::sample_records;
    use clap::Parser;
    use std::io::Cursor;

    fn loaded_state() -> AppState {
        let data = Dataset::new(sample_records());
        AppState { filters: FilterState::for_dataset(&data), data: Some(data) }
    }

    #[test]
    fn read_line_reports_end_of_input() {
        let mut input = Cursor::new("  3 \n");
        assert_eq!(read_line(&mut input, ""), Some("3".to_string()));
        assert_eq!(read_line(&mut input, ""), None);
    }

    #[test]
    fn menu_exits_when_input_runs_out() {
        let args = Args::parse_from(["ph_flood_tracker", "--input", "missing.geojson"]);
        run_with(&args, &mut Cursor::new("2\n9\n"));
        run_with(&args, &mut Cursor::new(""));
    }

    #[test]
    fn pickers_stop_at_end_of_input() {
        let options = vec!["Bulacan".to_string(), "Pampanga".to_string()];
        assert_eq!(pick(&mut Cursor::new("x\n"), "Province", &options), None);
        assert_eq!(pick(&mut Cursor::new("2\n"), "Province", &options), Some("Pampanga".to_string()));
        assert_eq!(pick_years(&mut Cursor::new(""), "Start Year", Some((2020, 2023))), Some((2020, 2023)));

        let mut state = loaded_state();
        handle_threshold(&mut state, &mut Cursor::new("abc\n"));
        assert_eq!(state.filters.threshold, crate::dashboard::DEFAULT_THRESHOLD);
        handle_threshold(&mut state, &mut Cursor::new("50m\n"));
        assert_eq!(state.filters.threshold, 50_000_000);

        handle_set_filter(&mut state, &mut Cursor::new("1\n5\n"));
        assert_eq!(state.filters.region.as_deref(), Some("Region III"));
        handle_set_filter(&mut state, &mut Cursor::new(""));
        assert_eq!(state.filters.region.as_deref(), Some("Region III"));
    }
}
